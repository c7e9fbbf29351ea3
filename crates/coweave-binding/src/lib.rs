//! Loro-backed collaborative binding for coweave editor models.
//!
//! This crate provides:
//! - `SharedDoc` / `SharedText`: Loro document and text with transaction scoping
//! - `TextBinding`: keeps a `TextModel` in sync with a `SharedText`
//! - `RelativePosition`: offsets that survive concurrent edits
//! - `Awareness`: per-client presence state, rendered as remote selection decorations
//! - The delta applier and change translator used by the binding, for direct use

use std::sync::{Mutex, MutexGuard, PoisonError};

mod awareness;
mod binding;
mod config;
mod decorations;
mod delta;
mod doc;
mod error;
mod guard;
mod position;
mod publish;
mod selection;
mod translate;

pub use awareness::{Awareness, AwarenessChange, AwarenessState, ChangeOrigin, LocalField};
pub use binding::TextBinding;
pub use config::BindingConfig;
pub use decorations::{DecorationSet, render_remote_selections};
pub use delta::{DeltaOp, apply_delta, delta_from_diff};
pub use doc::{ClientId, IMPORT_ORIGIN, SharedDoc, SharedText, TextEvent, TransactionInfo};
pub use error::BindingError;
pub use guard::ReentrancyGuard;
pub use position::{RelativePosition, RelativeSelection};
pub use publish::publish_selections;
pub use selection::{SelectionSnapshot, SelectionSnapshots};
pub use translate::apply_content_changes;

// Re-export Loro types that consumers need
pub use loro::{LoroDoc, LoroText, VersionVector};

/// Lock a mutex, recovering the data if a listener panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
