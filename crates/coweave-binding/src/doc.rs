//! Loro-backed shared document and text.
//!
//! `SharedDoc` wraps a `LoroDoc` with transaction scoping and a
//! before-transaction hook; `SharedText` is one text container inside it.
//! Every mutation runs in a transaction, and observers receive the resulting
//! delta once the outermost transaction has committed.
//!
//! Loro emits events while it still holds its internal locks, so observers are
//! not called from inside Loro. Events are queued and delivered after `commit`
//! or `import` returns, when handlers are free to read the document again.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use coweave_editor::{EventEmitter, Subscription};
use loro::event::DiffEvent;
use loro::{ContainerID, ContainerTrait, ExportMode, LoroDoc, LoroText, VersionVector};
use smol_str::SmolStr;

use crate::BindingError;
use crate::delta::{DeltaOp, delta_from_diff};
use crate::lock;

/// Replica identity. Equal to the Loro peer id of the document.
pub type ClientId = u64;

/// Origin tag attached to imported changes.
pub const IMPORT_ORIGIN: &str = "import";

/// Passed to before-transaction listeners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionInfo {
    pub origin: SmolStr,
    /// True for imports of remote updates.
    pub remote: bool,
}

/// A change observed on a shared text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEvent {
    /// Commit origin, empty when none was set.
    pub origin: SmolStr,
    pub delta: Vec<DeltaOp>,
}

/// Cloneable handle to a replicated document.
#[derive(Clone)]
pub struct SharedDoc {
    inner: Arc<DocInner>,
}

type PendingEvent = Box<dyn FnOnce() + Send>;

struct DocInner {
    doc: LoroDoc,
    depth: AtomicUsize,
    transactions: AtomicU64,
    before_transaction: EventEmitter<TransactionInfo>,
    /// Observer calls recorded during Loro's event emission.
    pending: Arc<Mutex<VecDeque<PendingEvent>>>,
}

impl DocInner {
    /// Deliver queued observer events in commit order.
    ///
    /// Handlers may start transactions of their own, which deliver their
    /// events through the same queue.
    fn flush_events(&self) {
        loop {
            let Some(event) = lock(&self.pending).pop_front() else {
                break;
            };
            event();
        }
    }
}

/// Decrements the transaction depth on drop and commits the outermost one.
struct TransactionScope<'a> {
    inner: &'a DocInner,
    origin: &'a str,
}

impl Drop for TransactionScope<'_> {
    fn drop(&mut self) {
        if self.inner.depth.fetch_sub(1, Ordering::AcqRel) == 1 {
            if !self.origin.is_empty() {
                self.inner.doc.set_next_commit_origin(self.origin);
            }
            self.inner.doc.commit();
        }
    }
}

impl SharedDoc {
    /// Create an empty document with a random client id.
    pub fn new() -> Self {
        Self::from_loro(LoroDoc::new())
    }

    /// Create an empty document with a fixed client id.
    pub fn with_client_id(client_id: ClientId) -> Result<Self, BindingError> {
        let doc = LoroDoc::new();
        doc.set_peer_id(client_id)?;
        Ok(Self::from_loro(doc))
    }

    /// Create a document from an existing Loro snapshot.
    pub fn from_snapshot(snapshot: &[u8]) -> Result<Self, BindingError> {
        let doc = LoroDoc::new();
        doc.import(snapshot)
            .map_err(|e| BindingError::Import(e.to_string()))?;
        Ok(Self::from_loro(doc))
    }

    fn from_loro(doc: LoroDoc) -> Self {
        Self {
            inner: Arc::new(DocInner {
                doc,
                depth: AtomicUsize::new(0),
                transactions: AtomicU64::new(0),
                before_transaction: EventEmitter::new(),
                pending: Arc::new(Mutex::new(VecDeque::new())),
            }),
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.inner.doc.peer_id()
    }

    /// Get the underlying Loro document.
    ///
    /// Commits made through this handle bypass [`transact`](Self::transact):
    /// before-transaction listeners do not run, so bound views keep their
    /// offsets unadjusted, and observers wait for [`flush_events`](Self::flush_events).
    pub fn loro_doc(&self) -> &LoroDoc {
        &self.inner.doc
    }

    /// Get or create a root text container.
    pub fn get_text(&self, name: &str) -> SharedText {
        SharedText {
            doc: self.clone(),
            text: self.inner.doc.get_text(name),
        }
    }

    /// Run `f` as one transaction tagged with `origin`.
    ///
    /// Nested calls join the outermost transaction. Before-transaction
    /// listeners run before `f` on the outermost call only; observers see the
    /// combined change after it commits, before this call returns.
    pub fn transact<R>(&self, origin: &str, f: impl FnOnce() -> R) -> R {
        let outermost = self.inner.depth.load(Ordering::Acquire) == 0;
        if outermost {
            self.inner.transactions.fetch_add(1, Ordering::Relaxed);
            self.inner.before_transaction.emit(&TransactionInfo {
                origin: SmolStr::new(origin),
                remote: false,
            });
        }

        self.inner.depth.fetch_add(1, Ordering::AcqRel);
        let result = {
            let _scope = TransactionScope {
                inner: &self.inner,
                origin,
            };
            f()
        };
        if outermost {
            self.inner.flush_events();
        }
        result
    }

    /// Deliver observer events of commits made directly on [`loro_doc`](Self::loro_doc).
    ///
    /// Transactions and imports deliver their own events; this is only needed
    /// after committing through the raw Loro handles.
    pub fn flush_events(&self) {
        self.inner.flush_events();
    }

    /// Number of transactions and imports run on this document.
    pub fn transaction_count(&self) -> u64 {
        self.inner.transactions.load(Ordering::Relaxed)
    }

    pub fn on_before_transaction<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&TransactionInfo) + Send + Sync + 'static,
    {
        self.inner.before_transaction.subscribe(listener)
    }

    /// Number of registered before-transaction listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.before_transaction.listener_count()
    }

    /// Import remote changes. Counts as one transaction with origin [`IMPORT_ORIGIN`].
    pub fn import(&self, data: &[u8]) -> Result<(), BindingError> {
        self.inner.transactions.fetch_add(1, Ordering::Relaxed);
        self.inner.before_transaction.emit(&TransactionInfo {
            origin: SmolStr::new_static(IMPORT_ORIGIN),
            remote: true,
        });
        self.inner
            .doc
            .import_with(data, IMPORT_ORIGIN)
            .map_err(|e| BindingError::Import(e.to_string()))?;
        tracing::trace!(bytes = data.len(), "imported remote changes");
        self.inner.flush_events();
        Ok(())
    }

    /// Export full snapshot.
    pub fn export_snapshot(&self) -> Result<Vec<u8>, BindingError> {
        Ok(self.inner.doc.export(ExportMode::Snapshot)?)
    }

    /// Export updates since given version. `None` when there is nothing new.
    pub fn export_updates_since(
        &self,
        version: &VersionVector,
    ) -> Result<Option<Vec<u8>>, BindingError> {
        if *version == self.inner.doc.oplog_vv() {
            return Ok(None);
        }

        let updates = self.inner.doc.export(ExportMode::Updates {
            from: Cow::Owned(version.clone()),
        })?;

        if updates.is_empty() {
            return Ok(None);
        }
        Ok(Some(updates))
    }

    /// Get current version vector.
    pub fn version(&self) -> VersionVector {
        self.inner.doc.oplog_vv()
    }

    /// Listen for encoded updates produced by local commits.
    pub fn on_local_update<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        let sub = self
            .inner
            .doc
            .subscribe_local_update(Box::new(move |update| {
                listener(update);
                true
            }));
        Subscription::new(move || sub.unsubscribe())
    }
}

impl Default for SharedDoc {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for SharedDoc {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SharedDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedDoc")
            .field("client_id", &self.client_id())
            .field("transactions", &self.transaction_count())
            .finish()
    }
}

/// A text container inside a [`SharedDoc`]. Offsets are chars.
#[derive(Clone)]
pub struct SharedText {
    doc: SharedDoc,
    text: LoroText,
}

impl SharedText {
    /// The document that owns this text.
    pub fn doc(&self) -> &SharedDoc {
        &self.doc
    }

    /// Get the text container.
    ///
    /// Edits made through it skip transaction hooks; see [`SharedDoc::loro_doc`].
    pub fn loro_text(&self) -> &LoroText {
        &self.text
    }

    pub fn id(&self) -> ContainerID {
        self.text.id()
    }

    pub fn len(&self) -> usize {
        self.text.len_unicode()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert text at a char offset, committing unless inside a transaction.
    pub fn insert(&self, offset: usize, text: &str) -> Result<(), BindingError> {
        if text.is_empty() {
            return Ok(());
        }
        self.doc.transact("", || self.text.insert(offset, text))?;
        Ok(())
    }

    /// Delete `len` chars at `offset`, committing unless inside a transaction.
    pub fn delete(&self, offset: usize, len: usize) -> Result<(), BindingError> {
        if len == 0 {
            return Ok(());
        }
        self.doc.transact("", || self.text.delete(offset, len))?;
        Ok(())
    }

    /// Observe committed changes to this text.
    ///
    /// Changes to other containers are filtered out. A change that cannot be
    /// expressed as a text delta is passed to the handler as an error. The
    /// handler runs after the commit or import that produced the change has
    /// returned, never from inside Loro.
    pub fn observe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(Result<TextEvent, BindingError>) + Send + Sync + 'static,
    {
        let target = self.text.id();
        let watched = target.clone();
        let handler = Arc::new(handler);
        let pending = Arc::clone(&self.doc.inner.pending);
        let sub = self.doc.inner.doc.subscribe(
            &target,
            Arc::new(move |event: DiffEvent<'_>| {
                let mut queue = lock(&pending);
                for container in event.events.iter().filter(|c| *c.target == watched) {
                    let result = delta_from_diff(&watched, &container.diff).map(|delta| TextEvent {
                        origin: SmolStr::new(event.origin),
                        delta,
                    });
                    let handler = Arc::clone(&handler);
                    queue.push_back(Box::new(move || handler(result)));
                }
            }),
        );
        Subscription::new(move || sub.unsubscribe())
    }
}

impl fmt::Display for SharedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text.to_string())
    }
}

impl fmt::Debug for SharedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedText")
            .field("id", &self.text.id())
            .field("len", &self.len())
            .finish()
    }
}
