// State management module
//
// Host-side reactive primitives the bridges bind observer results into:
// - ReactiveList / ReadonlyList: index-addressable container with an element setter
// - ReactiveRecord / ReadonlyRecord: keyed container reconciled field by field
// - Scope: lifecycle owner for deep watchers and teardown hooks
//
// Every mutation emits a StateChange on a tokio broadcast channel.

pub mod record;
pub mod scope;

pub use record::{ReactiveRecord, ReadonlyRecord};
pub use scope::{Scope, WatchHandle};

use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Strong handle a read-only view keeps on whatever feeds its container
pub(crate) type Owner = Arc<dyn Any + Send + Sync>;

/// Default capacity of a container's change-event channel
pub const DEFAULT_CHANGE_BUFFER: usize = 100;

/// Change events emitted when a reactive container is modified
///
/// Subscribers receive the location of the change and read the new contents from the
/// container itself.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// One element was written by the element setter
    ElementSet { index: usize },

    /// The whole sequence was replaced
    Rebuilt { len: usize },

    /// Fields of a record were written or removed
    FieldsChanged { keys: Vec<String> },
}

/// Mutable, index-addressable reactive container
///
/// Owned by exactly one writer. Consumers get a [`ReadonlyList`] through
/// [`readonly()`](Self::readonly), which shares the storage and the change channel.
pub struct ReactiveList<T> {
    items: Arc<RwLock<Vec<T>>>,
    change_tx: broadcast::Sender<StateChange>,
}

impl<T: Clone> ReactiveList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self::with_capacity(items, DEFAULT_CHANGE_BUFFER)
    }

    /// Create a container whose change channel buffers `buffer` events
    pub fn with_capacity(items: Vec<T>, buffer: usize) -> Self {
        let (change_tx, _) = broadcast::channel(buffer.max(1));
        Self {
            items: Arc::new(RwLock::new(items)),
            change_tx,
        }
    }

    /// Element setter: replace the element at `index`.
    ///
    /// Writing at `len()` appends. Writing past the end would leave a gap, so it is
    /// ignored and reported as `false`.
    pub fn set(&self, index: usize, item: T) -> bool {
        {
            let mut items = self.items.write();
            match index.cmp(&items.len()) {
                std::cmp::Ordering::Less => items[index] = item,
                std::cmp::Ordering::Equal => items.push(item),
                std::cmp::Ordering::Greater => {
                    tracing::warn!(
                        "Ignoring element write at index {} past end of list (len {})",
                        index,
                        items.len()
                    );
                    return false;
                }
            }
        }

        // Ignore send errors - it's OK if no one is listening
        let _ = self.change_tx.send(StateChange::ElementSet { index });
        true
    }

    /// Replace the whole sequence
    pub fn replace_all(&self, items: Vec<T>) {
        let len = items.len();
        *self.items.write() = items;
        let _ = self.change_tx.send(StateChange::Rebuilt { len });
    }

    pub fn readonly(&self) -> ReadonlyList<T> {
        ReadonlyList {
            items: Arc::clone(&self.items),
            change_tx: self.change_tx.clone(),
            owner: None,
        }
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.items.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.items.read().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.change_tx.subscribe()
    }
}

/// Read-only view over a [`ReactiveList`]
///
/// A view handed out by a bridge keeps that bridge alive, so the container keeps
/// receiving updates for as long as any clone of the view exists.
pub struct ReadonlyList<T> {
    items: Arc<RwLock<Vec<T>>>,
    change_tx: broadcast::Sender<StateChange>,
    owner: Option<Owner>,
}

impl<T> ReadonlyList<T> {
    pub(crate) fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = Some(owner);
        self
    }
}

impl<T: Clone> ReadonlyList<T> {
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Clone the current contents
    pub fn snapshot(&self) -> Vec<T> {
        self.items.read().clone()
    }

    /// Execute a function with read access to the elements
    ///
    /// # Example
    /// ```ignore
    /// let loading = results.read(|items| items.iter().any(|r| r.is_loading()));
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[T]) -> R,
    {
        let items = self.items.read();
        f(&items)
    }

    /// Subscribe to change events of the underlying container
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.change_tx.subscribe()
    }
}

// Manual Clone implementation to avoid requiring T: Clone
impl<T> Clone for ReadonlyList<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            change_tx: self.change_tx.clone(),
            owner: self.owner.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ReadonlyList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items.read().iter()).finish()
    }
}
