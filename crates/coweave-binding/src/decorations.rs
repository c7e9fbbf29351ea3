//! Remote selections rendered as view decorations.

use std::collections::BTreeMap;

use coweave_editor::{DecorationId, DecorationOptions, EditorView, TextModel, TextRange, ViewId};
use smol_str::SmolStr;

use crate::awareness::AwarenessState;
use crate::config::BindingConfig;
use crate::doc::{ClientId, SharedText};
use crate::position::RelativeSelection;

/// Build decorations for every remote participant's selections.
///
/// The local client is skipped, as is any selection with an end that no
/// longer resolves. The head marker goes after the range when the head is
/// ahead of the anchor, before it otherwise.
pub fn render_remote_selections(
    text: &SharedText,
    model: &TextModel,
    states: &BTreeMap<ClientId, AwarenessState>,
    local_client: ClientId,
    config: &BindingConfig,
) -> Vec<DecorationOptions> {
    let mut decorations = Vec::new();
    for (client, state) in states {
        if *client == local_client {
            continue;
        }
        if let Some(selection) = &state.selection {
            decorations.extend(decorate(
                text,
                model,
                selection,
                config.class_for(&config.selection_class_name, *client),
                config.class_for(&config.head_class_name, *client),
            ));
        }
        for selection in state.secondary_selections.iter().flatten() {
            decorations.extend(decorate(
                text,
                model,
                selection,
                config.class_for(&config.secondary_class_name, *client),
                config.class_for(&config.head_class_name, *client),
            ));
        }
    }
    decorations
}

fn decorate(
    text: &SharedText,
    model: &TextModel,
    selection: &RelativeSelection,
    class_name: SmolStr,
    head_class_name: SmolStr,
) -> Option<DecorationOptions> {
    let anchor = selection.anchor.to_offset(text)?;
    let head = selection.head.to_offset(text)?;
    let (start, end) = (anchor.min(head), anchor.max(head));
    let range = TextRange::new(model.position_at(start), model.position_at(end));

    let options = DecorationOptions::new(range, start..end).with_class_name(class_name);
    Some(if anchor < head {
        options.with_after_content_class_name(head_class_name)
    } else {
        options.with_before_content_class_name(head_class_name)
    })
}

/// Decoration ids this binding added, per view.
#[derive(Default)]
pub struct DecorationSet {
    views: BTreeMap<ViewId, (EditorView, Vec<DecorationId>)>,
}

impl DecorationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything previously set on `view` with `decorations`.
    pub fn replace(&mut self, view: &EditorView, decorations: Vec<DecorationOptions>) {
        let old = self
            .views
            .remove(&view.id())
            .map(|(_, ids)| ids)
            .unwrap_or_default();
        let ids = view.delta_decorations(&old, decorations);
        self.views.insert(view.id(), (view.clone(), ids));
    }

    /// Remove every decoration this set added.
    pub fn clear(&mut self) {
        for (_, (view, ids)) in std::mem::take(&mut self.views) {
            view.delta_decorations(&ids, Vec::new());
        }
    }

    pub fn len(&self) -> usize {
        self.views.values().map(|(_, ids)| ids.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
