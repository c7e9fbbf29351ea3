//! Editor content changes to shared text operations.

use coweave_editor::ContentChange;

use crate::BindingError;
use crate::doc::SharedText;

/// Replay editor changes on the shared text in one transaction.
///
/// Changes are addressed in pre-batch coordinates, so they are applied from
/// the highest offset down. Changes at the same offset keep their order.
pub fn apply_content_changes(
    text: &SharedText,
    origin: &str,
    changes: &[ContentChange],
) -> Result<(), BindingError> {
    let mut ordered: Vec<&ContentChange> = changes.iter().collect();
    ordered.sort_by(|a, b| b.range_offset.cmp(&a.range_offset));

    text.doc().transact(origin, || {
        for change in ordered {
            text.delete(change.range_offset, change.range_length)?;
            text.insert(change.range_offset, &change.text)?;
        }
        Ok(())
    })
}
