//! Presence state for collaborative editing sessions.
//!
//! Tracks every participant's selection as relative positions, keyed by
//! client id. The local client writes its own entry; remote entries arrive
//! through [`Awareness::apply_update`] or [`Awareness::apply_remote_state`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use coweave_editor::{EventEmitter, Subscription};
use serde::{Deserialize, Serialize};

use crate::BindingError;
use crate::doc::{ClientId, SharedDoc};
use crate::lock;
use crate::position::RelativeSelection;

/// One participant's presence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwarenessState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<RelativeSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_selections: Option<Vec<RelativeSelection>>,
}

/// A single field of the local state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocalField {
    Selection(Option<RelativeSelection>),
    SecondarySelections(Vec<RelativeSelection>),
}

/// Where a change came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOrigin {
    Local,
    Remote,
}

/// Clients whose state changed in one update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AwarenessChange {
    pub added: Vec<ClientId>,
    pub updated: Vec<ClientId>,
    pub removed: Vec<ClientId>,
    pub origin: ChangeOrigin,
}

impl AwarenessChange {
    fn new(origin: ChangeOrigin) -> Self {
        Self {
            added: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
            origin,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Wire form of one client entry. A `None` state marks a departed client.
#[derive(Serialize, Deserialize)]
struct EncodedEntry {
    client: ClientId,
    clock: u64,
    state: Option<AwarenessState>,
}

#[derive(Serialize, Deserialize)]
struct EncodedUpdate {
    entries: Vec<EncodedEntry>,
}

struct Entry {
    clock: u64,
    state: Option<AwarenessState>,
}

/// Cloneable handle to the presence store of one client.
#[derive(Clone)]
pub struct Awareness {
    inner: Arc<AwarenessInner>,
}

struct AwarenessInner {
    client_id: ClientId,
    entries: Mutex<BTreeMap<ClientId, Entry>>,
    changed: EventEmitter<AwarenessChange>,
}

impl Awareness {
    /// Create a store for `client_id` with an empty local state.
    pub fn new(client_id: ClientId) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            client_id,
            Entry {
                clock: 0,
                state: Some(AwarenessState::default()),
            },
        );
        Self {
            inner: Arc::new(AwarenessInner {
                client_id,
                entries: Mutex::new(entries),
                changed: EventEmitter::new(),
            }),
        }
    }

    /// Create a store keyed by the document's client id.
    pub fn for_doc(doc: &SharedDoc) -> Self {
        Self::new(doc.client_id())
    }

    pub fn client_id(&self) -> ClientId {
        self.inner.client_id
    }

    pub fn local_state(&self) -> Option<AwarenessState> {
        self.state(self.inner.client_id)
    }

    pub fn state(&self, client: ClientId) -> Option<AwarenessState> {
        lock(&self.inner.entries)
            .get(&client)
            .and_then(|entry| entry.state.clone())
    }

    /// States of every present client, including the local one.
    pub fn states(&self) -> BTreeMap<ClientId, AwarenessState> {
        lock(&self.inner.entries)
            .iter()
            .filter_map(|(client, entry)| entry.state.clone().map(|state| (*client, state)))
            .collect()
    }

    /// Replace the local state. `None` marks the local client as gone.
    pub fn set_local_state(&self, state: Option<AwarenessState>) {
        let client = self.inner.client_id;
        let change = {
            let mut entries = lock(&self.inner.entries);
            let entry = entries.entry(client).or_insert(Entry {
                clock: 0,
                state: None,
            });
            let mut change = AwarenessChange::new(ChangeOrigin::Local);
            match (&entry.state, &state) {
                (None, None) => {}
                (None, Some(_)) => change.added.push(client),
                (Some(_), None) => change.removed.push(client),
                (Some(old), Some(new)) if old != new => change.updated.push(client),
                (Some(_), Some(_)) => {}
            }
            entry.clock += 1;
            entry.state = state;
            change
        };
        self.notify(change);
    }

    /// Update one field of the local state, creating the state if needed.
    pub fn set_local_state_field(&self, field: LocalField) {
        let mut state = self.local_state().unwrap_or_default();
        match field {
            LocalField::Selection(selection) => state.selection = selection,
            LocalField::SecondarySelections(secondary) => {
                state.secondary_selections = Some(secondary)
            }
        }
        self.set_local_state(Some(state));
    }

    /// Set or remove a remote client's state directly.
    pub fn apply_remote_state(&self, client: ClientId, state: Option<AwarenessState>) {
        if client == self.inner.client_id {
            tracing::warn!(client, "ignoring remote state for the local client");
            return;
        }
        let change = {
            let mut entries = lock(&self.inner.entries);
            let clock = entries.get(&client).map_or(0, |entry| entry.clock + 1);
            Self::store_remote(&mut entries, client, clock, state)
        };
        self.notify(change);
    }

    /// Remove remote clients, for example after they disconnected.
    ///
    /// The client's clock is kept, so replayed updates older than the removal
    /// do not bring it back.
    pub fn remove_states(&self, clients: &[ClientId]) {
        let change = {
            let mut entries = lock(&self.inner.entries);
            let mut change = AwarenessChange::new(ChangeOrigin::Remote);
            for client in clients {
                if *client == self.inner.client_id {
                    continue;
                }
                if let Some(entry) = entries.get_mut(client) {
                    entry.clock += 1;
                    if entry.state.take().is_some() {
                        change.removed.push(*client);
                    }
                }
            }
            change
        };
        self.notify(change);
    }

    /// Encode the given clients' entries for transport.
    pub fn encode_update(&self, clients: &[ClientId]) -> Result<Vec<u8>, BindingError> {
        let update = {
            let entries = lock(&self.inner.entries);
            EncodedUpdate {
                entries: clients
                    .iter()
                    .filter_map(|client| {
                        entries.get(client).map(|entry| EncodedEntry {
                            client: *client,
                            clock: entry.clock,
                            state: entry.state.clone(),
                        })
                    })
                    .collect(),
            }
        };
        Ok(serde_json::to_vec(&update)?)
    }

    /// Apply an update produced by [`encode_update`](Self::encode_update).
    ///
    /// Entries older than what is already known are ignored, as are entries
    /// for the local client.
    pub fn apply_update(&self, data: &[u8]) -> Result<AwarenessChange, BindingError> {
        let update: EncodedUpdate = serde_json::from_slice(data)?;
        let change = {
            let mut entries = lock(&self.inner.entries);
            let mut change = AwarenessChange::new(ChangeOrigin::Remote);
            for entry in update.entries {
                if entry.client == self.inner.client_id {
                    continue;
                }
                let known = entries.get(&entry.client).map(|e| e.clock);
                if known.is_some_and(|clock| clock >= entry.clock) {
                    continue;
                }
                let single = Self::store_remote(&mut entries, entry.client, entry.clock, entry.state);
                change.added.extend(single.added);
                change.updated.extend(single.updated);
                change.removed.extend(single.removed);
            }
            change
        };
        self.notify(change.clone());
        Ok(change)
    }

    fn store_remote(
        entries: &mut BTreeMap<ClientId, Entry>,
        client: ClientId,
        clock: u64,
        state: Option<AwarenessState>,
    ) -> AwarenessChange {
        let mut change = AwarenessChange::new(ChangeOrigin::Remote);
        let previous = entries.insert(client, Entry { clock, state: state.clone() });
        match (previous.and_then(|entry| entry.state), state) {
            (None, Some(_)) => change.added.push(client),
            (Some(_), None) => change.removed.push(client),
            (Some(old), Some(new)) if old != new => change.updated.push(client),
            _ => {}
        }
        change
    }

    fn notify(&self, change: AwarenessChange) {
        if change.is_empty() {
            return;
        }
        tracing::trace!(
            added = change.added.len(),
            updated = change.updated.len(),
            removed = change.removed.len(),
            "awareness changed"
        );
        self.inner.changed.emit(&change);
    }

    /// Listen for state changes of any client.
    pub fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AwarenessChange) + Send + Sync + 'static,
    {
        self.inner.changed.subscribe(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.changed.listener_count()
    }
}

impl fmt::Debug for Awareness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Awareness")
            .field("client_id", &self.inner.client_id)
            .field("clients", &lock(&self.inner.entries).len())
            .finish()
    }
}
