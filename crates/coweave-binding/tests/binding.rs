mod common;

use common::{Editor, Replica, init_tracing, sync_docs};
use coweave_binding::{Awareness, BindingConfig, SharedDoc, TextBinding};
use coweave_editor::{EditOperation, EditorView, Selection, TextModel, TextRange};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_insert_reaches_other_binding_on_same_doc() {
    init_tracing();
    let doc = SharedDoc::new();
    let text = doc.get_text("content");
    let s1 = Editor::bind(&text, None);
    let s2 = Editor::bind(&text, None);

    s1.insert(0, "some content");

    assert_eq!(s1.model.value(), "some content");
    assert_eq!(text.to_string(), "some content");
    assert_eq!(s2.model.value(), "some content");
}

#[test]
fn test_sequential_inserts_on_same_doc() {
    let doc = SharedDoc::new();
    let text = doc.get_text("content");
    let s1 = Editor::bind(&text, None);
    let s2 = Editor::bind(&text, None);

    s1.insert(0, "A");
    s2.insert(0, "B");

    assert_eq!(s1.model.value(), "BA");
    assert_eq!(s2.model.value(), "BA");
    assert_eq!(text.to_string(), "BA");
}

#[test]
fn test_concurrent_inserts_converge_across_replicas() {
    init_tracing();
    let a = Replica::new(1);
    let b = Replica::new(2);

    a.editor.insert(0, "A");
    b.editor.insert(0, "B");
    sync_docs(&a.doc, &b.doc);

    let value = a.editor.model.value();
    assert_eq!(value.chars().count(), 2);
    assert!(value.contains('A') && value.contains('B'));
    assert_eq!(b.editor.model.value(), value);
    assert_eq!(a.text.to_string(), value);
    assert_eq!(b.text.to_string(), value);
}

#[test]
fn test_batch_edits_apply_right_to_left() {
    let doc = SharedDoc::new();
    let text = doc.get_text("content");
    let editor = Editor::bind(&text, None);
    editor.insert(0, "0123456789");

    let model = &editor.model;
    model
        .apply_edits(vec![
            EditOperation::new(TextRange::new(model.position_at(1), model.position_at(3)), "X"),
            EditOperation::new(TextRange::new(model.position_at(5), model.position_at(6)), "YY"),
        ])
        .unwrap();

    assert_eq!(model.value(), "0X34YY6789");
    assert_eq!(text.to_string(), "0X34YY6789");
}

#[test]
fn test_remote_delta_is_not_echoed() {
    let a = Replica::new(1);
    let b = Replica::new(2);
    a.editor.insert(0, "hello");

    let update = a.doc.export_updates_since(&b.doc.version()).unwrap().unwrap();
    let before = b.doc.transaction_count();
    b.doc.import(&update).unwrap();

    assert_eq!(b.doc.transaction_count(), before + 1);
    assert_eq!(b.editor.model.value(), "hello");
    // Nothing new was produced on b, so a has nothing to receive.
    assert!(b.doc.export_updates_since(&a.doc.version()).unwrap().is_none());
}

#[test]
fn test_local_edit_is_one_transaction() {
    let doc = SharedDoc::new();
    let text = doc.get_text("content");
    let editor = Editor::bind(&text, None);
    let before = doc.transaction_count();

    let model = &editor.model;
    model
        .apply_edits(vec![
            EditOperation::insert(model.position_at(0), "ab"),
            EditOperation::insert(model.position_at(0), "cd"),
        ])
        .unwrap();

    assert_eq!(doc.transaction_count(), before + 1);
    assert_eq!(text.to_string(), "abcd");
}

#[test]
fn test_selection_survives_remote_insert() {
    let a = Replica::new(1);
    let b = Replica::new(2);
    a.editor.insert(0, "hello world");
    sync_docs(&a.doc, &b.doc);

    b.editor.select(2, 5);
    a.editor.insert(0, "abc");
    sync_docs(&a.doc, &b.doc);

    assert_eq!(b.editor.model.value(), "abchello world");
    assert_eq!(b.editor.view.selections(), vec![Selection::new(5, 8)]);
}

#[test]
fn test_selection_inside_remote_deletion_collapses() {
    let a = Replica::new(1);
    let b = Replica::new(2);
    a.editor.insert(0, "hello world");
    sync_docs(&a.doc, &b.doc);

    b.editor.select(2, 5);
    a.editor.delete(1, 5);
    sync_docs(&a.doc, &b.doc);

    assert_eq!(b.editor.model.value(), "hworld");
    assert_eq!(b.editor.view.selections(), vec![Selection::collapsed(1)]);
}

#[test]
fn test_remote_edit_inside_crlf_keeps_model_in_sync() {
    let a = Replica::new(1);
    let b = Replica::new(2);
    a.editor.insert(0, "a\r\nb");
    sync_docs(&a.doc, &b.doc);

    // Split the break from the shared text side, then type between its halves.
    a.text.delete(2, 1).unwrap();
    sync_docs(&a.doc, &b.doc);
    assert_eq!(b.text.to_string(), "a\rb");
    assert_eq!(b.editor.model.value(), "a\rb");

    b.text.insert(2, "\n").unwrap();
    a.text.insert(2, "X").unwrap();
    sync_docs(&a.doc, &b.doc);

    let expected = a.text.to_string();
    assert_eq!(b.text.to_string(), expected);
    for replica in [&a, &b] {
        assert_eq!(replica.editor.model.value(), expected);
    }
}

#[test]
fn test_backward_and_secondary_selections_survive_on_same_doc() {
    let doc = SharedDoc::new();
    let text = doc.get_text("content");
    let s1 = Editor::bind(&text, None);
    let s2 = Editor::bind(&text, None);
    s1.insert(0, "one two three");

    s2.view
        .set_selections(vec![Selection::new(7, 4), Selection::collapsed(10)]);
    s1.insert(0, ">> ");

    assert_eq!(
        s2.view.selections(),
        vec![Selection::new(10, 7), Selection::collapsed(13)]
    );
}

#[test]
fn test_restore_can_be_disabled() {
    let doc = SharedDoc::new();
    let text = doc.get_text("content");
    let s1 = Editor::bind(&text, None);
    let s2 = Editor::bind_with_config(
        &text,
        None,
        BindingConfig::default().with_restore_selections(false),
    );
    s1.insert(0, "hello world");

    s2.select(2, 5);
    s1.insert(0, "abc");

    assert_eq!(s2.view.selections(), vec![Selection::new(2, 5)]);
}

#[test]
fn test_initial_sync_takes_shared_content() {
    let doc = SharedDoc::new();
    let text = doc.get_text("content");
    text.insert(0, "existing").unwrap();

    let model = TextModel::new("stale");
    let _binding = TextBinding::new(text.clone(), model.clone(), Vec::new(), None).unwrap();

    assert_eq!(model.value(), "existing");
    assert_eq!(text.to_string(), "existing");
}

#[test]
fn test_initial_sync_skips_equal_content() {
    let doc = SharedDoc::new();
    let text = doc.get_text("content");
    text.insert(0, "same").unwrap();
    let model = TextModel::new("same");

    let _binding = TextBinding::new(text, model.clone(), Vec::new(), None).unwrap();
    assert_eq!(model.version_id(), 1);
}

#[test]
fn test_set_value_replaces_shared_text() {
    let doc = SharedDoc::new();
    let text = doc.get_text("content");
    let editor = Editor::bind(&text, None);
    editor.insert(0, "first draft");

    editor.model.set_value("second\ndraft").unwrap();
    assert_eq!(text.to_string(), "second\ndraft");
}

#[test]
fn test_multibyte_text_round_trips() {
    let a = Replica::new(1);
    let b = Replica::new(2);

    a.editor.insert(0, "日本語\nテキスト");
    sync_docs(&a.doc, &b.doc);
    b.editor.insert(2, "🌍");
    b.editor.delete(5, 2);
    sync_docs(&a.doc, &b.doc);

    assert_eq!(b.editor.model.value(), "日本🌍語\nスト");
    assert_eq!(a.editor.model.value(), b.editor.model.value());
    assert_eq!(a.text.to_string(), a.editor.model.value());
}

#[test]
fn test_for_view_binds_view_model() {
    let doc = SharedDoc::new();
    let text = doc.get_text("content");
    text.insert(0, "from doc").unwrap();
    let view = EditorView::new(TextModel::new(""));

    let binding = TextBinding::for_view(text.clone(), view.clone(), None).unwrap();
    assert_eq!(view.model().value(), "from doc");
    assert_eq!(binding.model(), &view.model());
}

#[test]
fn test_destroy_is_idempotent_and_releases_listeners() {
    let doc = SharedDoc::new();
    let text = doc.get_text("content");
    let model = TextModel::new("");
    let view = EditorView::new(model.clone());
    let awareness = Awareness::for_doc(&doc);
    let baseline = (
        model.listener_count(),
        doc.listener_count(),
        view.cursor_listener_count(),
        awareness.listener_count(),
    );

    let binding =
        TextBinding::new(text.clone(), model.clone(), vec![view.clone()], Some(awareness.clone()))
            .unwrap();
    assert!(model.listener_count() > baseline.0);
    assert!(view.cursor_listener_count() > baseline.2);

    binding.destroy();
    binding.destroy();
    assert!(binding.is_destroyed());
    assert_eq!(
        (
            model.listener_count(),
            doc.listener_count(),
            view.cursor_listener_count(),
            awareness.listener_count(),
        ),
        baseline
    );

    // No effect in either direction afterwards.
    model
        .apply_edits(vec![EditOperation::insert(model.position_at(0), "local")])
        .unwrap();
    text.insert(0, "remote").unwrap();
    assert_eq!(text.to_string(), "remote");
    assert_eq!(model.value(), "local");
}

#[test]
fn test_drop_tears_down() {
    let doc = SharedDoc::new();
    let text = doc.get_text("content");
    let model = TextModel::new("");
    let baseline = model.listener_count();

    let binding = TextBinding::new(text.clone(), model.clone(), Vec::new(), None).unwrap();
    drop(binding);

    assert_eq!(model.listener_count(), baseline);
    text.insert(0, "ignored").unwrap();
    assert_eq!(model.value(), "");
}

#[test]
fn test_model_dispose_destroys_binding() {
    let doc = SharedDoc::new();
    let text = doc.get_text("content");
    let editor = Editor::bind(&text, None);
    let hooks = doc.listener_count();

    editor.model.dispose();

    assert!(editor.binding.is_destroyed());
    assert_eq!(doc.listener_count(), hooks - 1);
    text.insert(0, "after dispose").unwrap();
    assert_eq!(text.to_string(), "after dispose");
}

#[test]
fn test_binding_disposed_model_fails() {
    let doc = SharedDoc::new();
    let model = TextModel::new("");
    model.dispose();
    let err = TextBinding::new(doc.get_text("content"), model, Vec::new(), None).unwrap_err();
    assert!(matches!(err, coweave_binding::BindingError::Editor(_)));
}

fn random_text(rng: &mut StdRng) -> String {
    const ALPHABET: &[char] = &['a', 'b', 'c', ' ', '\r', '\n', 'é', '日', '本', '🌍'];
    let len = rng.random_range(1..=4);
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())])
        .collect()
}

fn random_edit(rng: &mut StdRng, editor: &Editor) {
    let len = editor.model.len_chars();
    let offset = rng.random_range(0..=len);
    if len > 0 && rng.random_bool(0.4) {
        let delete = rng.random_range(1..=(len - offset).max(1)).min(len - offset);
        if delete > 0 {
            editor.delete(offset, delete);
            return;
        }
    }
    if len > 2 && rng.random_bool(0.2) {
        // Two cursors typing at once.
        let model = &editor.model;
        let other = rng.random_range(0..=len);
        model
            .apply_edits(vec![
                EditOperation::insert(model.position_at(offset), random_text(rng)),
                EditOperation::insert(model.position_at(other), random_text(rng)),
            ])
            .unwrap();
        return;
    }
    editor.insert(offset, &random_text(rng));
}

#[test]
fn test_random_edits_converge_across_replicas() {
    init_tracing();
    for seed in 0..8u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let replicas = [Replica::new(1), Replica::new(2), Replica::new(3)];

        for _ in 0..60 {
            let target = &replicas[rng.random_range(0..replicas.len())];
            random_edit(&mut rng, &target.editor);
            if rng.random_bool(0.25) {
                let i = rng.random_range(0..replicas.len());
                let j = (i + 1) % replicas.len();
                sync_docs(&replicas[i].doc, &replicas[j].doc);
            }
        }

        for _ in 0..2 {
            sync_docs(&replicas[0].doc, &replicas[1].doc);
            sync_docs(&replicas[1].doc, &replicas[2].doc);
            sync_docs(&replicas[0].doc, &replicas[2].doc);
        }

        let expected = replicas[0].text.to_string();
        for replica in &replicas {
            assert_eq!(replica.text.to_string(), expected, "seed {seed}");
            assert_eq!(replica.editor.model.value(), expected, "seed {seed}");
        }
    }
}

#[test]
fn test_random_edits_converge_on_same_doc() {
    let mut rng = StdRng::seed_from_u64(42);
    let doc = SharedDoc::new();
    let text = doc.get_text("content");
    let editors = [Editor::bind(&text, None), Editor::bind(&text, None)];

    for _ in 0..200 {
        let editor = &editors[rng.random_range(0..editors.len())];
        random_edit(&mut rng, editor);
        let expected = text.to_string();
        for editor in &editors {
            assert_eq!(editor.model.value(), expected);
        }
    }
}
