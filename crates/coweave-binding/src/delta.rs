//! Text deltas and their replay against an editor model.

use coweave_editor::{EditOperation, TextModel, TextRange};
use loro::ContainerID;
use loro::TextDelta;
use loro::event::Diff;

use crate::BindingError;

/// One step of a text delta, in chars.
///
/// A delta is replayed left to right against a single running index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeltaOp {
    /// Skip over `n` unchanged chars.
    Retain(usize),
    /// Insert text at the running index.
    Insert(String),
    /// Remove `n` chars at the running index.
    Delete(usize),
}

/// Convert a Loro container diff into delta ops.
///
/// Anything other than a text diff means the container is not the text the
/// caller thinks it is, and is reported as [`BindingError::UnexpectedDelta`].
pub fn delta_from_diff(container: &ContainerID, diff: &Diff<'_>) -> Result<Vec<DeltaOp>, BindingError> {
    let kind = match diff {
        Diff::Text(deltas) => {
            return Ok(deltas
                .iter()
                .filter_map(|delta| match delta {
                    TextDelta::Retain { retain, .. } => (*retain > 0).then_some(DeltaOp::Retain(*retain)),
                    TextDelta::Insert { insert, .. } => {
                        (!insert.is_empty()).then(|| DeltaOp::Insert(insert.clone()))
                    }
                    TextDelta::Delete { delete, .. } => (*delete > 0).then_some(DeltaOp::Delete(*delete)),
                })
                .collect());
        }
        Diff::List(_) => "list",
        Diff::Map(_) => "map",
        Diff::Tree(_) => "tree",
        _ => "unknown",
    };

    Err(BindingError::UnexpectedDelta {
        container: container.to_string(),
        kind,
    })
}

/// Replay a delta against a model as one edit batch.
///
/// Each op is positioned by the running index over the pre-edit text, so the
/// whole delta lands as a single content change event.
pub fn apply_delta(model: &TextModel, delta: &[DeltaOp]) -> Result<(), BindingError> {
    // Index into the text before the delta was applied.
    let mut index = 0;
    let mut edits = Vec::with_capacity(delta.len());

    for op in delta {
        match op {
            DeltaOp::Retain(n) => index += n,
            DeltaOp::Insert(text) => {
                edits.push(EditOperation::insert(model.position_at(index), text.as_str()));
            }
            DeltaOp::Delete(n) => {
                let range = TextRange::new(model.position_at(index), model.position_at(index + n));
                edits.push(EditOperation::delete(range));
                index += n;
            }
        }
    }

    if edits.is_empty() {
        return Ok(());
    }
    tracing::trace!(model = %model.id(), ops = delta.len(), "replaying delta");
    model.apply_edits(edits)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_after_retain() {
        let model = TextModel::new("hello");
        apply_delta(&model, &[DeltaOp::Retain(5), DeltaOp::Insert(" world".into())]).unwrap();
        assert_eq!(model.value(), "hello world");
    }

    #[test]
    fn test_mixed_delta() {
        // "abcdef" -> keep "ab", drop "cd", insert "XY", keep "ef", append "!"
        let model = TextModel::new("abcdef");
        apply_delta(
            &model,
            &[
                DeltaOp::Retain(2),
                DeltaOp::Delete(2),
                DeltaOp::Insert("XY".into()),
                DeltaOp::Retain(2),
                DeltaOp::Insert("!".into()),
            ],
        )
        .unwrap();
        assert_eq!(model.value(), "abXYef!");
    }

    #[test]
    fn test_insert_before_delete_at_same_index() {
        let model = TextModel::new("abcdef");
        apply_delta(
            &model,
            &[DeltaOp::Retain(1), DeltaOp::Insert("Z".into()), DeltaOp::Delete(3)],
        )
        .unwrap();
        assert_eq!(model.value(), "aZef");
    }

    #[test]
    fn test_multiline_positions() {
        let model = TextModel::new("one\ntwo\nthree");
        apply_delta(
            &model,
            &[DeltaOp::Retain(4), DeltaOp::Delete(4), DeltaOp::Insert("2\n".into())],
        )
        .unwrap();
        assert_eq!(model.value(), "one\n2\nthree");
    }

    #[test]
    fn test_offsets_count_chars() {
        let model = TextModel::new("日本語");
        apply_delta(&model, &[DeltaOp::Retain(1), DeltaOp::Insert("🌍".into())]).unwrap();
        assert_eq!(model.value(), "日🌍本語");
    }

    #[test]
    fn test_empty_delta_is_noop() {
        let model = TextModel::new("same");
        apply_delta(&model, &[]).unwrap();
        assert_eq!(model.version_id(), 1);
    }

    #[test]
    fn test_non_text_diff_is_rejected() {
        let container = ContainerID::new_root("content", loro::ContainerType::Text);
        let err = delta_from_diff(&container, &Diff::List(Vec::new())).unwrap_err();
        match err {
            BindingError::UnexpectedDelta { kind, container } => {
                assert_eq!(kind, "list");
                assert!(container.contains("content"), "{container}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_ops_are_dropped() {
        let container = ContainerID::new_root("content", loro::ContainerType::Text);
        let diff = Diff::Text(vec![
            TextDelta::Retain { retain: 0, attributes: None },
            TextDelta::Insert { insert: "hi".into(), attributes: None },
            TextDelta::Delete { delete: 0 },
        ]);
        assert_eq!(
            delta_from_diff(&container, &diff).unwrap(),
            vec![DeltaOp::Insert("hi".into())]
        );
    }
}
