//! Error types for editor model operations.

use std::ops::Range;

use thiserror::Error;

/// Errors that can occur when editing a text model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditorError {
    /// The model was disposed and no longer accepts edits.
    #[error("text model has been disposed")]
    Disposed,

    /// Two edits in one batch touch the same span.
    #[error("overlapping edit ranges {first:?} and {second:?}")]
    OverlappingEdits {
        first: Range<usize>,
        second: Range<usize>,
    },
}
