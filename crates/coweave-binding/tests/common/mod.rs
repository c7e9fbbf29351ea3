#![allow(dead_code)]

use coweave_binding::{Awareness, BindingConfig, SharedDoc, SharedText, TextBinding};
use coweave_editor::{EditOperation, EditorView, Selection, TextModel, TextRange};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A model, one view on it and the binding that ties it to a text.
pub struct Editor {
    pub model: TextModel,
    pub view: EditorView,
    pub binding: TextBinding,
}

impl Editor {
    pub fn bind(text: &SharedText, awareness: Option<Awareness>) -> Self {
        Self::bind_with_config(text, awareness, BindingConfig::default())
    }

    pub fn bind_with_config(
        text: &SharedText,
        awareness: Option<Awareness>,
        config: BindingConfig,
    ) -> Self {
        let model = TextModel::new("");
        let view = EditorView::new(model.clone());
        let binding =
            TextBinding::with_config(text.clone(), model.clone(), vec![view.clone()], awareness, config)
                .unwrap();
        Self {
            model,
            view,
            binding,
        }
    }

    pub fn insert(&self, offset: usize, text: &str) {
        self.model
            .apply_edits(vec![EditOperation::insert(self.model.position_at(offset), text)])
            .unwrap();
    }

    pub fn delete(&self, offset: usize, len: usize) {
        let range = TextRange::new(
            self.model.position_at(offset),
            self.model.position_at(offset + len),
        );
        self.model.apply_edits(vec![EditOperation::delete(range)]).unwrap();
    }

    pub fn select(&self, anchor: usize, head: usize) {
        self.view.set_selection(Selection::new(anchor, head));
    }
}

/// A replica: its own document, text and bound editor.
pub struct Replica {
    pub doc: SharedDoc,
    pub text: SharedText,
    pub editor: Editor,
    pub awareness: Option<Awareness>,
}

impl Replica {
    pub fn new(client_id: u64) -> Self {
        let doc = SharedDoc::with_client_id(client_id).unwrap();
        let text = doc.get_text("content");
        let editor = Editor::bind(&text, None);
        Self {
            doc,
            text,
            editor,
            awareness: None,
        }
    }

    pub fn with_awareness(client_id: u64) -> Self {
        let doc = SharedDoc::with_client_id(client_id).unwrap();
        let text = doc.get_text("content");
        let awareness = Awareness::for_doc(&doc);
        let editor = Editor::bind(&text, Some(awareness.clone()));
        Self {
            doc,
            text,
            editor,
            awareness: Some(awareness),
        }
    }

    pub fn awareness(&self) -> &Awareness {
        self.awareness.as_ref().unwrap()
    }
}

/// Exchange document updates in both directions.
pub fn sync_docs(a: &SharedDoc, b: &SharedDoc) {
    let to_b = a.export_updates_since(&b.version()).unwrap();
    let to_a = b.export_updates_since(&a.version()).unwrap();
    if let Some(update) = to_b {
        b.import(&update).unwrap();
    }
    if let Some(update) = to_a {
        a.import(&update).unwrap();
    }
}

/// Forward `from`'s local presence to `to`.
pub fn sync_awareness(from: &Awareness, to: &Awareness) {
    let update = from.encode_update(&[from.client_id()]).unwrap();
    to.apply_update(&update).unwrap();
}
