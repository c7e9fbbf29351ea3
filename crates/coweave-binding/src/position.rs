//! Index-independent positions in a shared text.
//!
//! A `RelativePosition` anchors to a character of the CRDT text rather than
//! to a numeric offset, so it keeps pointing at the same place while other
//! replicas insert and delete around it.

use coweave_editor::Selection;
use loro::cursor::{Cursor, Side};
use serde::{Deserialize, Serialize};

use crate::doc::SharedText;

/// Position anchored to the structure of a shared text.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "EncodedPosition", into = "EncodedPosition")]
pub struct RelativePosition {
    cursor: Cursor,
}

impl RelativePosition {
    /// Anchor a char offset. Offsets past the end clamp to the end.
    pub fn from_offset(text: &SharedText, offset: usize) -> Option<Self> {
        let offset = offset.min(text.len());
        text.loro_text()
            .get_cursor(offset, Side::default())
            .map(|cursor| Self { cursor })
    }

    /// Resolve to a char offset in `text`.
    ///
    /// Returns `None` when the position belongs to another text or its anchor
    /// can no longer be found.
    pub fn to_offset(&self, text: &SharedText) -> Option<usize> {
        if self.cursor.container != text.id() {
            return None;
        }
        let result = text.doc().loro_doc().get_cursor_pos(&self.cursor).ok()?;
        Some(result.current.pos.min(text.len()))
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }
}

impl PartialEq for RelativePosition {
    fn eq(&self, other: &Self) -> bool {
        self.cursor.encode() == other.cursor.encode()
    }
}

impl Eq for RelativePosition {}

#[derive(Serialize, Deserialize)]
struct EncodedPosition(Vec<u8>);

impl From<RelativePosition> for EncodedPosition {
    fn from(position: RelativePosition) -> Self {
        EncodedPosition(position.cursor.encode())
    }
}

impl TryFrom<EncodedPosition> for RelativePosition {
    type Error = String;

    fn try_from(encoded: EncodedPosition) -> Result<Self, Self::Error> {
        Cursor::decode(&encoded.0)
            .map(|cursor| Self { cursor })
            .map_err(|e| format!("invalid relative position: {e}"))
    }
}

/// A selection with both ends anchored. `anchor` is where it started, `head`
/// is the moving end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeSelection {
    pub anchor: RelativePosition,
    pub head: RelativePosition,
}

impl RelativeSelection {
    pub fn from_selection(text: &SharedText, selection: Selection) -> Option<Self> {
        Some(Self {
            anchor: RelativePosition::from_offset(text, selection.anchor)?,
            head: RelativePosition::from_offset(text, selection.head)?,
        })
    }

    /// Resolve both ends. `None` if either cannot be resolved.
    pub fn to_selection(&self, text: &SharedText) -> Option<Selection> {
        Some(Selection::new(
            self.anchor.to_offset(text)?,
            self.head.to_offset(text)?,
        ))
    }
}
