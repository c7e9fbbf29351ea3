//! Local selections published to awareness.

use coweave_editor::CursorSelectionChangedEvent;

use crate::awareness::{Awareness, LocalField};
use crate::doc::SharedText;
use crate::position::RelativeSelection;

/// Encode a view's selections and store them in the local awareness state.
///
/// Without a primary selection both `selection` and the secondaries are
/// cleared. Otherwise the primary is published as anchor/head and the
/// secondaries as a list, empty when there are none.
pub fn publish_selections(
    text: &SharedText,
    awareness: &Awareness,
    event: &CursorSelectionChangedEvent,
) {
    let Some(primary) = event.selection else {
        awareness.set_local_state_field(LocalField::Selection(None));
        awareness.set_local_state_field(LocalField::SecondarySelections(Vec::new()));
        return;
    };

    let selection = RelativeSelection::from_selection(text, primary);
    let secondary = event
        .secondary_selections
        .iter()
        .filter_map(|selection| RelativeSelection::from_selection(text, *selection))
        .collect();

    awareness.set_local_state_field(LocalField::Selection(selection));
    awareness.set_local_state_field(LocalField::SecondarySelections(secondary));
}
