//! Two-way binding between a shared text and an editor model.
//!
//! A `TextBinding` wires four listeners together:
//! - shared text changes are replayed on the model, then local selections are
//!   restored and remote selections repainted;
//! - model changes are replayed on the shared text in one transaction;
//! - before every transaction on the document, local selections are
//!   snapshotted as relative positions;
//! - with awareness, local cursor moves are published and remote presence
//!   changes repainted.
//!
//! Both replay directions run through one [`ReentrancyGuard`], so a change
//! applied on one side is never echoed back to the other.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use coweave_editor::{
    ContentChangedEvent, CursorSelectionChangedEvent, EditorError, EditorView, Subscription,
    TextModel, ViewId,
};
use smol_str::{SmolStr, format_smolstr};

use crate::BindingError;
use crate::awareness::Awareness;
use crate::config::BindingConfig;
use crate::decorations::{DecorationSet, render_remote_selections};
use crate::delta::apply_delta;
use crate::doc::{SharedText, TextEvent, TransactionInfo};
use crate::guard::ReentrancyGuard;
use crate::lock;
use crate::publish::publish_selections;
use crate::selection::SelectionSnapshots;
use crate::translate::apply_content_changes;

static NEXT_BINDING: AtomicU64 = AtomicU64::new(1);

/// Keeps a [`TextModel`] consistent with a [`SharedText`].
///
/// The binding tears itself down when the model is disposed, when
/// [`destroy`](Self::destroy) is called, or when it is dropped.
pub struct TextBinding {
    inner: Arc<BindingInner>,
}

struct BindingInner {
    text: SharedText,
    model: TextModel,
    views: Vec<EditorView>,
    awareness: Option<Awareness>,
    config: BindingConfig,
    /// Commit origin of this binding's own transactions.
    origin: SmolStr,
    guard: ReentrancyGuard,
    destroyed: AtomicBool,
    snapshots: Mutex<SelectionSnapshots>,
    decorations: Mutex<DecorationSet>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl TextBinding {
    /// Bind `text` to `model` with the default configuration.
    ///
    /// `views` are the views whose selections are preserved and decorated.
    /// The model takes the shared text's content if the two differ.
    pub fn new(
        text: SharedText,
        model: TextModel,
        views: Vec<EditorView>,
        awareness: Option<Awareness>,
    ) -> Result<Self, BindingError> {
        Self::with_config(text, model, views, awareness, BindingConfig::default())
    }

    /// Bind to the model currently shown by `view`.
    pub fn for_view(
        text: SharedText,
        view: EditorView,
        awareness: Option<Awareness>,
    ) -> Result<Self, BindingError> {
        let model = view.model();
        Self::new(text, model, vec![view], awareness)
    }

    pub fn with_config(
        text: SharedText,
        model: TextModel,
        views: Vec<EditorView>,
        awareness: Option<Awareness>,
        config: BindingConfig,
    ) -> Result<Self, BindingError> {
        config.validate()?;
        if model.is_disposed() {
            return Err(EditorError::Disposed.into());
        }

        let origin = format_smolstr!(
            "coweave-binding-{}-{}",
            text.doc().client_id(),
            NEXT_BINDING.fetch_add(1, Ordering::Relaxed)
        );
        let inner = Arc::new(BindingInner {
            text,
            model,
            views,
            awareness,
            config,
            origin,
            guard: ReentrancyGuard::new(),
            destroyed: AtomicBool::new(false),
            snapshots: Mutex::new(SelectionSnapshots::new()),
            decorations: Mutex::new(DecorationSet::new()),
            subscriptions: Mutex::new(Vec::new()),
        });

        let subscriptions = BindingInner::subscribe(&inner);
        *lock(&inner.subscriptions) = subscriptions;

        inner.initial_sync()?;
        inner.render_decorations();

        tracing::debug!(
            origin = %inner.origin,
            model = %inner.model.id(),
            views = inner.views.len(),
            awareness = inner.awareness.is_some(),
            "text binding created"
        );
        Ok(Self { inner })
    }

    /// Unregister every listener and remove this binding's decorations.
    ///
    /// Idempotent; after the first call the binding has no further effects.
    pub fn destroy(&self) {
        self.inner.teardown();
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }

    pub fn text(&self) -> &SharedText {
        &self.inner.text
    }

    pub fn model(&self) -> &TextModel {
        &self.inner.model
    }

    pub fn awareness(&self) -> Option<&Awareness> {
        self.inner.awareness.as_ref()
    }

    pub fn config(&self) -> &BindingConfig {
        &self.inner.config
    }

    /// Origin tag attached to this binding's transactions.
    pub fn origin(&self) -> &str {
        &self.inner.origin
    }
}

impl Drop for TextBinding {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

impl fmt::Debug for TextBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextBinding")
            .field("origin", &self.inner.origin)
            .field("model", &self.inner.model.id())
            .field("views", &self.inner.views.len())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl BindingInner {
    fn subscribe(this: &Arc<Self>) -> Vec<Subscription> {
        let mut subscriptions = Vec::new();

        let weak = Arc::downgrade(this);
        subscriptions.push(this.text.observe(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.on_text_event(event);
            }
        }));

        let weak = Arc::downgrade(this);
        subscriptions.push(this.text.doc().on_before_transaction(move |info| {
            if let Some(inner) = weak.upgrade() {
                inner.on_before_transaction(info);
            }
        }));

        let weak = Arc::downgrade(this);
        subscriptions.push(this.model.on_did_change_content(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.on_content_changed(event);
            }
        }));

        let weak: Weak<Self> = Arc::downgrade(this);
        subscriptions.push(this.model.on_will_dispose(move |_| {
            if let Some(inner) = weak.upgrade() {
                tracing::debug!(origin = %inner.origin, "model disposed, tearing down binding");
                inner.teardown();
            }
        }));

        if let Some(awareness) = &this.awareness {
            let weak = Arc::downgrade(this);
            subscriptions.push(awareness.on_change(move |_| {
                if let Some(inner) = weak.upgrade() {
                    if !inner.is_destroyed() {
                        inner.render_decorations();
                    }
                }
            }));

            for view in &this.views {
                let weak = Arc::downgrade(this);
                let source = view.id();
                subscriptions.push(view.on_did_change_cursor_selection(move |event| {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_cursor_changed(source, event);
                    }
                }));
            }
        }

        subscriptions
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    fn initial_sync(&self) -> Result<(), BindingError> {
        self.guard
            .run(|| -> Result<(), BindingError> {
                let value = self.text.to_string();
                if self.model.value() != value {
                    self.model.set_value(&value)?;
                }
                Ok(())
            })
            .unwrap_or(Ok(()))
    }

    fn on_text_event(&self, event: Result<TextEvent, BindingError>) {
        if self.is_destroyed() {
            return;
        }
        let event = match event {
            Ok(event) => event,
            Err(err) => {
                tracing::error!(origin = %self.origin, error = %err, "shared text and editor model disagree on delta format");
                panic!("text binding received an unusable change: {err}");
            }
        };
        if event.origin == self.origin {
            return;
        }

        self.guard.run(|| {
            if let Err(err) = apply_delta(&self.model, &event.delta) {
                tracing::error!(origin = %self.origin, error = %err, "failed to apply shared text change to model");
            }
            self.restore_selections();
            self.render_decorations();
        });
    }

    fn on_before_transaction(&self, info: &TransactionInfo) {
        if self.is_destroyed() || !self.config.restore_selections {
            return;
        }
        self.guard.run(|| {
            tracing::trace!(origin = %info.origin, remote = info.remote, "snapshotting selections");
            let mut snapshots = lock(&self.snapshots);
            for view in self.bound_views() {
                snapshots.capture(&self.text, view);
            }
        });
    }

    fn on_content_changed(&self, event: &ContentChangedEvent) {
        if self.is_destroyed() {
            return;
        }
        self.guard.run(|| {
            if let Err(err) = apply_content_changes(&self.text, &self.origin, &event.changes) {
                tracing::error!(origin = %self.origin, error = %err, "failed to apply model change to shared text");
            }
            // Views do not move decorations on edits, so repaint against the new text.
            self.render_decorations();
        });
    }

    fn on_cursor_changed(&self, source: ViewId, event: &CursorSelectionChangedEvent) {
        if self.is_destroyed() || !self.bound_views().any(|view| view.id() == source) {
            return;
        }
        if let Some(awareness) = &self.awareness {
            publish_selections(&self.text, awareness, event);
        }
    }

    fn restore_selections(&self) {
        if !self.config.restore_selections {
            return;
        }
        // Taken out first: restoring moves cursors, which notifies listeners.
        let mut pending = std::mem::take(&mut *lock(&self.snapshots));
        pending.restore(&self.text, &self.model);
    }

    fn render_decorations(&self) {
        let Some(awareness) = &self.awareness else {
            return;
        };
        let states = awareness.states();
        let mut decorations = lock(&self.decorations);
        for view in &self.views {
            let options = if view.model() == self.model {
                render_remote_selections(
                    &self.text,
                    &self.model,
                    &states,
                    awareness.client_id(),
                    &self.config,
                )
            } else {
                Vec::new()
            };
            decorations.replace(view, options);
        }
    }

    fn bound_views(&self) -> impl Iterator<Item = &EditorView> {
        self.views.iter().filter(|view| view.model() == self.model)
    }

    fn teardown(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        let subscriptions = std::mem::take(&mut *lock(&self.subscriptions));
        let count = subscriptions.len();
        drop(subscriptions);

        lock(&self.decorations).clear();
        lock(&self.snapshots).clear();
        tracing::debug!(origin = %self.origin, subscriptions = count, "text binding destroyed");
    }
}
