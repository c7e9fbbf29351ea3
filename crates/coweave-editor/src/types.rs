//! Core editor types: positions, ranges, selections and edit descriptions.
//!
//! These types are framework-agnostic and can be used with any text buffer implementation.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Line/column position in a text model.
///
/// Both fields are 0-based; `column` counts chars (Unicode scalar values).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A range between two positions. `start` is expected to be <= `end`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-width range at a position.
    pub fn collapsed(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Which end of a selection is the moving cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionDirection {
    /// Head at or after the anchor.
    #[default]
    Ltr,
    /// Head before the anchor.
    Rtl,
}

/// Text selection with anchor and head positions.
///
/// The anchor is where the selection started, the head is where the cursor is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where cursor is now
    pub head: usize,
}

impl Selection {
    /// Create a new selection.
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (cursor position).
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// Build a selection from ordered bounds and a direction.
    pub fn from_bounds(start: usize, end: usize, direction: SelectionDirection) -> Self {
        match direction {
            SelectionDirection::Ltr => Self::new(start, end),
            SelectionDirection::Rtl => Self::new(end, start),
        }
    }

    /// Get the start (lower bound) of the selection.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Get the end (upper bound) of the selection.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Check if the selection is collapsed (empty, cursor only).
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Get the selection length.
    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    /// Check if empty (same as is_collapsed).
    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    /// Convert to a Range<usize> (ordered).
    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// Check if the selection is backwards (head before anchor).
    pub fn is_backwards(&self) -> bool {
        self.head < self.anchor
    }

    pub fn direction(&self) -> SelectionDirection {
        if self.is_backwards() {
            SelectionDirection::Rtl
        } else {
            SelectionDirection::Ltr
        }
    }

    /// Clamp both ends to a buffer length.
    pub fn clamp(&self, len: usize) -> Self {
        Self {
            anchor: self.anchor.min(len),
            head: self.head.min(len),
        }
    }
}

/// A single edit: replace `range` with `text`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditOperation {
    pub range: TextRange,
    pub text: String,
}

impl EditOperation {
    pub fn new(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    /// Zero-width insertion at a position.
    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self::new(TextRange::collapsed(at), text)
    }

    /// Removal of a range.
    pub fn delete(range: TextRange) -> Self {
        Self::new(range, String::new())
    }
}

/// One replaced span reported by a content change event.
///
/// `range`, `range_offset` and `range_length` describe the replaced span in
/// the coordinates of the text *before* the whole edit batch was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentChange {
    pub range: TextRange,
    pub range_offset: usize,
    pub range_length: usize,
    pub text: String,
}

/// Emitted by a text model after its content changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentChangedEvent {
    /// Replaced spans, listed in the order they were applied (right to left).
    pub changes: Vec<ContentChange>,
    /// Model version after the change.
    pub version_id: u64,
    /// True when the whole content was replaced with `set_value`.
    pub is_flush: bool,
}

/// Emitted by an editor view when its selections were set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorSelectionChangedEvent {
    /// Primary selection, if the view has any.
    pub selection: Option<Selection>,
    pub secondary_selections: Vec<Selection>,
}
