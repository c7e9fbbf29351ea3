//! Local selection snapshots taken across remote changes.

use std::collections::BTreeMap;

use coweave_editor::{EditorView, Selection, SelectionDirection, TextModel, ViewId};

use crate::doc::SharedText;
use crate::position::RelativePosition;

/// One selection stored as anchored bounds plus direction.
#[derive(Clone, Debug)]
pub struct SelectionSnapshot {
    pub start: RelativePosition,
    pub end: RelativePosition,
    pub direction: SelectionDirection,
}

impl SelectionSnapshot {
    pub fn capture(text: &SharedText, selection: Selection) -> Option<Self> {
        Some(Self {
            start: RelativePosition::from_offset(text, selection.start())?,
            end: RelativePosition::from_offset(text, selection.end())?,
            direction: selection.direction(),
        })
    }

    pub fn resolve(&self, text: &SharedText) -> Option<Selection> {
        let start = self.start.to_offset(text)?;
        let end = self.end.to_offset(text)?;
        Some(Selection::from_bounds(start.min(end), start.max(end), self.direction))
    }
}

struct ViewSnapshot {
    view: EditorView,
    selections: Vec<SelectionSnapshot>,
}

/// Pending snapshots keyed by view, consumed by the next restore.
#[derive(Default)]
pub struct SelectionSnapshots {
    views: BTreeMap<ViewId, ViewSnapshot>,
}

impl SelectionSnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every selection of `view`, replacing an earlier snapshot of it.
    pub fn capture(&mut self, text: &SharedText, view: &EditorView) {
        let selections = view
            .selections()
            .into_iter()
            .filter_map(|selection| SelectionSnapshot::capture(text, selection))
            .collect();
        self.views.insert(
            view.id(),
            ViewSnapshot {
                view: view.clone(),
                selections,
            },
        );
    }

    /// Put the recorded selections back, skipping views whose model changed.
    ///
    /// Entries that no longer resolve are dropped. Returns the number of views
    /// that were updated.
    pub fn restore(&mut self, text: &SharedText, model: &TextModel) -> usize {
        let mut restored = 0;
        for (_, snapshot) in std::mem::take(&mut self.views) {
            if snapshot.view.model() != *model {
                continue;
            }
            let selections: Vec<Selection> = snapshot
                .selections
                .iter()
                .filter_map(|selection| selection.resolve(text))
                .collect();
            snapshot.view.set_selections(selections);
            restored += 1;
        }
        restored
    }

    pub fn clear(&mut self) {
        self.views.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
