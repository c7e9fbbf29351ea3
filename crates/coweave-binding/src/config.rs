//! Binding configuration.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::BindingError;
use crate::doc::ClientId;

/// Presentation and behavior settings for a [`TextBinding`](crate::TextBinding).
///
/// Every field has a default, so a TOML document only needs the keys it
/// overrides:
///
/// ```toml
/// selection_class_name = "peer-selection"
/// restore_selections = false
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Class applied to the span of a remote primary selection.
    pub selection_class_name: SmolStr,
    /// Class of the marker drawn at a remote selection's head.
    pub head_class_name: SmolStr,
    /// Class applied to the span of a remote secondary selection.
    pub secondary_class_name: SmolStr,
    /// Also emit `{class}-{client_id}` so each participant can be styled.
    pub client_class_suffix: bool,
    /// Put local selections back where they were after a remote change.
    pub restore_selections: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            selection_class_name: SmolStr::new_static("coweave-remote-selection"),
            head_class_name: SmolStr::new_static("coweave-remote-selection-head"),
            secondary_class_name: SmolStr::new_static("coweave-remote-secondary-selection"),
            client_class_suffix: true,
            restore_selections: true,
        }
    }
}

impl BindingConfig {
    /// Parse from TOML. Class names must be non-empty and free of whitespace.
    pub fn from_toml_str(source: &str) -> Result<Self, BindingError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BindingError> {
        for (field, value) in [
            ("selection_class_name", &self.selection_class_name),
            ("head_class_name", &self.head_class_name),
            ("secondary_class_name", &self.secondary_class_name),
        ] {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(BindingError::Config(format!(
                    "{field} must be a single non-empty class name, got {value:?}"
                )));
            }
        }
        Ok(())
    }

    pub fn with_selection_class_name(mut self, class_name: impl Into<SmolStr>) -> Self {
        self.selection_class_name = class_name.into();
        self
    }

    pub fn with_head_class_name(mut self, class_name: impl Into<SmolStr>) -> Self {
        self.head_class_name = class_name.into();
        self
    }

    pub fn with_secondary_class_name(mut self, class_name: impl Into<SmolStr>) -> Self {
        self.secondary_class_name = class_name.into();
        self
    }

    pub fn with_client_class_suffix(mut self, enabled: bool) -> Self {
        self.client_class_suffix = enabled;
        self
    }

    pub fn with_restore_selections(mut self, enabled: bool) -> Self {
        self.restore_selections = enabled;
        self
    }

    /// Class string for `base`, with the per-client variant when enabled.
    pub(crate) fn class_for(&self, base: &str, client: ClientId) -> SmolStr {
        if self.client_class_suffix {
            smol_str::format_smolstr!("{base} {base}-{client}")
        } else {
            SmolStr::new(base)
        }
    }
}
