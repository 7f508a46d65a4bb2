use crate::models::{Record, Value};
use crate::state::{DEFAULT_CHANGE_BUFFER, Owner, StateChange};
use crate::utils::update_state;
use tokio::sync::broadcast;

/// Reactive keyed container, updated by reconciliation rather than replacement
pub struct ReactiveRecord {
    record: Record,
    change_tx: broadcast::Sender<StateChange>,
}

impl ReactiveRecord {
    pub fn new(initial: Record) -> Self {
        Self::with_capacity(initial, DEFAULT_CHANGE_BUFFER)
    }

    pub fn with_capacity(initial: Record, buffer: usize) -> Self {
        let (change_tx, _) = broadcast::channel(buffer.max(1));
        Self {
            record: initial.reactive(),
            change_tx,
        }
    }

    /// Reconcile the held record with `update` (see [`update_state`]).
    ///
    /// Emits one [`StateChange::FieldsChanged`] naming the written-with-a-new-value and
    /// removed keys, or nothing when the update changes no field.
    pub fn reconcile(&self, update: &Record) -> Vec<String> {
        let before = self.record.fields();
        update_state(&self.record, update);
        let after = self.record.fields();

        let mut keys: Vec<String> = after
            .iter()
            .filter(|(key, value)| before.get(*key).is_none_or(|old| !old.same(value)))
            .map(|(key, _)| key.clone())
            .collect();
        keys.extend(before.keys().filter(|key| !after.contains_key(*key)).cloned());

        if !keys.is_empty() {
            let _ = self.change_tx.send(StateChange::FieldsChanged { keys: keys.clone() });
        }
        keys
    }

    pub fn readonly(&self) -> ReadonlyRecord {
        ReadonlyRecord {
            record: self.record.clone(),
            change_tx: self.change_tx.clone(),
            owner: None,
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.record.get(key)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.change_tx.subscribe()
    }
}

/// Read-only view over a [`ReactiveRecord`]
#[derive(Clone)]
pub struct ReadonlyRecord {
    record: Record,
    change_tx: broadcast::Sender<StateChange>,
    owner: Option<Owner>,
}

impl ReadonlyRecord {
    pub(crate) fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.record.get(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.record.keys()
    }

    pub fn len(&self) -> usize {
        self.record.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// Detached copy of the current fields
    pub fn snapshot(&self) -> Record {
        Record::from_fields(self.record.fields())
    }

    /// True if this view reads the same storage as `record`
    pub fn ptr_eq(&self, record: &Record) -> bool {
        self.record.ptr_eq(record)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.change_tx.subscribe()
    }
}

impl std::fmt::Debug for ReadonlyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.record.fmt(f)
    }
}
