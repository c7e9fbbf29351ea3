//! Shared text model with change notification.
//!
//! `TextModel` is a cloneable handle to one rope-backed buffer. Edits are
//! validated, applied right to left, and reported to listeners as a single
//! `ContentChangedEvent` per batch.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::EditorError;
use crate::event::{EventEmitter, Subscription, lock};
use crate::text::{EditorRope, TextBuffer};
use crate::types::{ContentChange, ContentChangedEvent, EditOperation, Position, TextRange};

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a text model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(u64);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model-{}", self.0)
    }
}

/// Cloneable handle to an editable text buffer.
///
/// Clones share the same buffer and listeners.
#[derive(Clone)]
pub struct TextModel {
    inner: Arc<ModelInner>,
}

struct ModelInner {
    id: ModelId,
    state: Mutex<ModelState>,
    content_changed: EventEmitter<ContentChangedEvent>,
    will_dispose: EventEmitter<ModelId>,
}

struct ModelState {
    buffer: EditorRope,
    version_id: u64,
    disposed: bool,
}

/// An edit resolved to char offsets against the pre-edit buffer.
struct ResolvedEdit {
    index: usize,
    start: usize,
    end: usize,
    range: TextRange,
    text: String,
}

impl TextModel {
    pub fn new(text: &str) -> Self {
        Self {
            inner: Arc::new(ModelInner {
                id: ModelId(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed)),
                state: Mutex::new(ModelState {
                    buffer: EditorRope::from_str(text),
                    version_id: 1,
                    disposed: false,
                }),
                content_changed: EventEmitter::new(),
                will_dispose: EventEmitter::new(),
            }),
        }
    }

    pub fn id(&self) -> ModelId {
        self.inner.id
    }

    /// Full text content.
    pub fn value(&self) -> String {
        lock(&self.inner.state).buffer.to_string()
    }

    pub fn len_chars(&self) -> usize {
        lock(&self.inner.state).buffer.len_chars()
    }

    pub fn line_count(&self) -> usize {
        lock(&self.inner.state).buffer.len_lines()
    }

    /// Incremented on every content change.
    pub fn version_id(&self) -> u64 {
        lock(&self.inner.state).version_id
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.inner.state).disposed
    }

    /// Line/column of a char offset. Offsets past the end clamp to the end.
    pub fn position_at(&self, offset: usize) -> Position {
        position_in(&lock(&self.inner.state).buffer, offset)
    }

    /// Char offset of a position. Columns clamp to the line length and lines
    /// past the end map to the end of the text.
    pub fn offset_at(&self, position: Position) -> usize {
        offset_in(&lock(&self.inner.state).buffer, position)
    }

    /// Replace the whole content. Listeners receive a flush event.
    pub fn set_value(&self, text: &str) -> Result<(), EditorError> {
        let event = {
            let mut state = lock(&self.inner.state);
            if state.disposed {
                return Err(EditorError::Disposed);
            }
            let old_len = state.buffer.len_chars();
            let range = TextRange::new(Position::default(), position_in(&state.buffer, old_len));
            state.buffer = EditorRope::from_str(text);
            state.version_id += 1;
            ContentChangedEvent {
                changes: vec![ContentChange {
                    range,
                    range_offset: 0,
                    range_length: old_len,
                    text: text.to_owned(),
                }],
                version_id: state.version_id,
                is_flush: true,
            }
        };

        self.inner.content_changed.emit(&event);
        Ok(())
    }

    /// Apply a batch of edits addressed in pre-edit coordinates.
    ///
    /// Positions are clamped to the buffer. Edits may share a boundary but
    /// must not overlap; inserts at the same position keep their batch order.
    /// No-op edits are dropped, and a batch with nothing left emits no event.
    pub fn apply_edits(&self, edits: Vec<EditOperation>) -> Result<(), EditorError> {
        let event = {
            let mut state = lock(&self.inner.state);
            if state.disposed {
                return Err(EditorError::Disposed);
            }

            let mut resolved: Vec<ResolvedEdit> = edits
                .into_iter()
                .enumerate()
                .filter_map(|(index, edit)| {
                    let a = offset_in(&state.buffer, edit.range.start);
                    let b = offset_in(&state.buffer, edit.range.end);
                    let (start, end) = if a <= b { (a, b) } else { (b, a) };
                    if start == end && edit.text.is_empty() {
                        return None;
                    }
                    Some(ResolvedEdit {
                        index,
                        start,
                        end,
                        range: TextRange::new(
                            position_in(&state.buffer, start),
                            position_in(&state.buffer, end),
                        ),
                        text: edit.text,
                    })
                })
                .collect();

            if resolved.is_empty() {
                return Ok(());
            }

            resolved.sort_by_key(|edit| (edit.start, edit.end, edit.index));
            for pair in resolved.windows(2) {
                if pair[0].end > pair[1].start {
                    return Err(EditorError::OverlappingEdits {
                        first: pair[0].start..pair[0].end,
                        second: pair[1].start..pair[1].end,
                    });
                }
            }

            // Right to left, so earlier offsets stay valid.
            let mut changes = Vec::with_capacity(resolved.len());
            for edit in resolved.into_iter().rev() {
                state.buffer.replace(edit.start..edit.end, &edit.text);
                changes.push(ContentChange {
                    range: edit.range,
                    range_offset: edit.start,
                    range_length: edit.end - edit.start,
                    text: edit.text,
                });
            }
            state.version_id += 1;

            ContentChangedEvent {
                changes,
                version_id: state.version_id,
                is_flush: false,
            }
        };

        tracing::trace!(
            model = %self.inner.id,
            changes = event.changes.len(),
            version = event.version_id,
            "content changed"
        );
        self.inner.content_changed.emit(&event);
        Ok(())
    }

    /// Listen for content changes.
    pub fn on_did_change_content<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ContentChangedEvent) + Send + Sync + 'static,
    {
        self.inner.content_changed.subscribe(listener)
    }

    /// Listen for disposal. Fires once, before listeners are released.
    pub fn on_will_dispose<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ModelId) + Send + Sync + 'static,
    {
        self.inner.will_dispose.subscribe(listener)
    }

    /// Number of registered content and disposal listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.content_changed.listener_count() + self.inner.will_dispose.listener_count()
    }

    /// Dispose the model. Further edits fail with [`EditorError::Disposed`].
    pub fn dispose(&self) {
        {
            let mut state = lock(&self.inner.state);
            if state.disposed {
                return;
            }
            state.disposed = true;
        }

        tracing::debug!(model = %self.inner.id, "disposing text model");
        self.inner.will_dispose.emit(&self.inner.id);
        self.inner.content_changed.clear();
        self.inner.will_dispose.clear();
    }
}

impl Default for TextModel {
    fn default() -> Self {
        Self::new("")
    }
}

impl PartialEq for TextModel {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for TextModel {}

impl fmt::Debug for TextModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextModel")
            .field("id", &self.inner.id)
            .field("len_chars", &self.len_chars())
            .finish()
    }
}

fn position_in(buffer: &EditorRope, offset: usize) -> Position {
    let offset = offset.min(buffer.len_chars());
    let line = buffer.char_to_line(offset);
    Position::new(line, offset - buffer.line_to_char(line))
}

fn offset_in(buffer: &EditorRope, position: Position) -> usize {
    if position.line >= buffer.len_lines() {
        return buffer.len_chars();
    }
    buffer.line_to_char(position.line) + position.column.min(buffer.line_max_column(position.line))
}
