//! Error types for binding operations.

use coweave_editor::EditorError;
use thiserror::Error;

/// Errors that can occur while syncing a text model with a shared text.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BindingError {
    /// The CRDT reported a change for the text container that is not a text delta.
    #[error("unexpected {kind} delta for text container {container}")]
    UnexpectedDelta {
        container: String,
        kind: &'static str,
    },

    /// Loro CRDT error.
    #[error("loro error: {0}")]
    Loro(String),

    /// Failed to import CRDT data.
    #[error("failed to import CRDT data: {0}")]
    Import(String),

    /// Failed to export CRDT data.
    #[error("failed to export CRDT data: {0}")]
    Export(String),

    /// The editor model rejected an edit.
    #[error(transparent)]
    Editor(#[from] EditorError),

    /// Invalid binding configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Awareness update could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<loro::LoroError> for BindingError {
    fn from(e: loro::LoroError) -> Self {
        BindingError::Loro(e.to_string())
    }
}

impl From<loro::LoroEncodeError> for BindingError {
    fn from(e: loro::LoroEncodeError) -> Self {
        BindingError::Export(e.to_string())
    }
}

impl From<serde_json::Error> for BindingError {
    fn from(e: serde_json::Error) -> Self {
        BindingError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for BindingError {
    fn from(e: toml::de::Error) -> Self {
        BindingError::Config(e.to_string())
    }
}
