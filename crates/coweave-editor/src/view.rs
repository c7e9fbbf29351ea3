//! Editor view: selections and decorations over a swappable text model.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::decoration::{Decoration, DecorationId, DecorationOptions};
use crate::event::{EventEmitter, Subscription, lock};
use crate::model::TextModel;
use crate::types::{CursorSelectionChangedEvent, Selection};

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// Cloneable handle to a presentation surface over a [`TextModel`].
///
/// Selections are stored as char offsets; the first one is primary. Model
/// edits do not move them, they are clamped to the model length when read.
#[derive(Clone)]
pub struct EditorView {
    inner: Arc<ViewInner>,
}

struct ViewInner {
    id: ViewId,
    state: Mutex<ViewState>,
    selection_changed: EventEmitter<CursorSelectionChangedEvent>,
}

struct ViewState {
    model: TextModel,
    selections: Vec<Selection>,
    decorations: BTreeMap<DecorationId, Decoration>,
    next_decoration: u64,
}

impl EditorView {
    pub fn new(model: TextModel) -> Self {
        Self {
            inner: Arc::new(ViewInner {
                id: ViewId(NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed)),
                state: Mutex::new(ViewState {
                    model,
                    selections: vec![Selection::collapsed(0)],
                    decorations: BTreeMap::new(),
                    next_decoration: 1,
                }),
                selection_changed: EventEmitter::new(),
            }),
        }
    }

    pub fn id(&self) -> ViewId {
        self.inner.id
    }

    pub fn model(&self) -> TextModel {
        lock(&self.inner.state).model.clone()
    }

    /// Attach a different model. Selections reset and decorations are dropped.
    pub fn set_model(&self, model: TextModel) {
        let mut state = lock(&self.inner.state);
        tracing::debug!(view = %self.inner.id, from = %state.model.id(), to = %model.id(), "swapping model");
        state.model = model;
        state.selections = vec![Selection::collapsed(0)];
        state.decorations.clear();
    }

    /// Primary selection, if any.
    pub fn selection(&self) -> Option<Selection> {
        self.selections().into_iter().next()
    }

    /// All selections, primary first, clamped to the current model length.
    pub fn selections(&self) -> Vec<Selection> {
        let state = lock(&self.inner.state);
        let len = state.model.len_chars();
        state.selections.iter().map(|sel| sel.clamp(len)).collect()
    }

    pub fn set_selection(&self, selection: Selection) {
        self.set_selections(vec![selection]);
    }

    /// Replace all selections and notify cursor listeners.
    ///
    /// An empty list leaves the view without a selection.
    pub fn set_selections(&self, selections: Vec<Selection>) {
        let event = {
            let mut state = lock(&self.inner.state);
            let len = state.model.len_chars();
            state.selections = selections.into_iter().map(|sel| sel.clamp(len)).collect();
            let mut iter = state.selections.iter().copied();
            CursorSelectionChangedEvent {
                selection: iter.next(),
                secondary_selections: iter.collect(),
            }
        };
        self.inner.selection_changed.emit(&event);
    }

    pub fn on_did_change_cursor_selection<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CursorSelectionChangedEvent) + Send + Sync + 'static,
    {
        self.inner.selection_changed.subscribe(listener)
    }

    pub fn cursor_listener_count(&self) -> usize {
        self.inner.selection_changed.listener_count()
    }

    /// Remove the decorations in `old` and add `new`, returning the new ids in order.
    ///
    /// Unknown ids in `old` are ignored.
    pub fn delta_decorations(
        &self,
        old: &[DecorationId],
        new: Vec<DecorationOptions>,
    ) -> Vec<DecorationId> {
        let mut state = lock(&self.inner.state);
        for id in old {
            state.decorations.remove(id);
        }

        let mut ids = Vec::with_capacity(new.len());
        for options in new {
            let id = DecorationId(state.next_decoration);
            state.next_decoration += 1;
            state.decorations.insert(id, Decoration { id, options });
            ids.push(id);
        }
        ids
    }

    /// Decorations currently on the view, in creation order.
    pub fn decorations(&self) -> Vec<Decoration> {
        lock(&self.inner.state).decorations.values().cloned().collect()
    }
}

impl PartialEq for EditorView {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for EditorView {}

impl fmt::Debug for EditorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("EditorView")
            .field("id", &self.inner.id)
            .field("model", &state.model.id())
            .field("selections", &state.selections)
            .field("decorations", &state.decorations.len())
            .finish()
    }
}
