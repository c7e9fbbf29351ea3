//! Range decorations owned by an editor view.

use std::fmt;
use std::ops::Range;

use smol_str::SmolStr;

use crate::types::TextRange;

/// Identifier returned by [`EditorView::delta_decorations`](crate::EditorView::delta_decorations).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecorationId(pub(crate) u64);

impl fmt::Display for DecorationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decoration-{}", self.0)
    }
}

/// Visual annotation of a text span. Class names are opaque style tags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecorationOptions {
    pub range: TextRange,
    /// Char offsets of `range` at the time the decoration was set.
    pub offsets: Range<usize>,
    /// Applied to the whole range.
    pub class_name: Option<SmolStr>,
    /// Marker rendered before the range start.
    pub before_content_class_name: Option<SmolStr>,
    /// Marker rendered after the range end.
    pub after_content_class_name: Option<SmolStr>,
}

impl DecorationOptions {
    pub fn new(range: TextRange, offsets: Range<usize>) -> Self {
        Self {
            range,
            offsets,
            ..Default::default()
        }
    }

    pub fn with_class_name(mut self, class_name: impl Into<SmolStr>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_before_content_class_name(mut self, class_name: impl Into<SmolStr>) -> Self {
        self.before_content_class_name = Some(class_name.into());
        self
    }

    pub fn with_after_content_class_name(mut self, class_name: impl Into<SmolStr>) -> Self {
        self.after_content_class_name = Some(class_name.into());
        self
    }
}

/// A decoration currently held by a view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoration {
    pub id: DecorationId,
    pub options: DecorationOptions,
}
