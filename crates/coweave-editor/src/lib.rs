//! coweave-editor: editor-side collaborator for coweave bindings.
//!
//! This crate provides:
//! - `TextBuffer` trait for text storage abstraction
//! - `EditorRope` - ropey-backed implementation
//! - `TextModel` - shared buffer with batched, validated edits and change events
//! - `EditorView` - selections and decorations over a swappable model
//! - `Subscription` - disposable listener handle returned by every `on_*` method

pub mod decoration;
pub mod error;
pub mod event;
pub mod model;
pub mod text;
pub mod types;
pub mod view;

pub use decoration::{Decoration, DecorationId, DecorationOptions};
pub use error::EditorError;
pub use event::{EventEmitter, Subscription};
pub use model::{ModelId, TextModel};
pub use smol_str::SmolStr;
pub use text::{EditorRope, TextBuffer};
pub use types::{
    ContentChange, ContentChangedEvent, CursorSelectionChangedEvent, EditOperation, Position,
    Selection, SelectionDirection, TextRange,
};
pub use view::{EditorView, ViewId};
