// Bridge module - observer subscriptions bound into reactive state
//
// This module contains:
// - use_queries: multi-query bridge producing a read-only list of results
// - use_query: single-query bridge producing a read-only record
//
// Both follow the same lifecycle: Mounting -> Subscribed -> TornDown. Teardown is
// driven by the owning Scope and releases the observer subscription exactly once.

pub mod queries;
pub mod query;

pub use queries::{QueriesInput, normalize_queries, use_queries};
pub use query::{QueryInput, use_query};

use crate::client::Unsubscribe;
use crate::models::Record;
use parking_lot::Mutex;

/// Option field selecting which registered client serves a query
pub const QUERY_CLIENT_KEY: &str = "queryClientKey";

/// Client key carried by a normalized options record, if any
pub(crate) fn client_key_of(options: Option<&Record>) -> Option<String> {
    options
        .and_then(|options| options.get(QUERY_CLIENT_KEY))
        .and_then(|key| key.as_str().map(str::to_string))
}

enum Lifecycle {
    Mounting,
    Subscribed(Unsubscribe),
    TornDown,
}

/// Lifecycle of one bridge's observer subscription
pub(crate) struct Subscription {
    lifecycle: Mutex<Lifecycle>,
}

impl Subscription {
    pub(crate) fn new() -> Self {
        Self {
            lifecycle: Mutex::new(Lifecycle::Mounting),
        }
    }

    /// Store the handle returned by `subscribe`.
    ///
    /// If teardown already happened the handle is released immediately.
    pub(crate) fn attach(&self, unsubscribe: Unsubscribe) {
        let mut lifecycle = self.lifecycle.lock();
        if matches!(*lifecycle, Lifecycle::Mounting) {
            *lifecycle = Lifecycle::Subscribed(unsubscribe);
            return;
        }

        let attached_twice = matches!(*lifecycle, Lifecycle::Subscribed(_));
        drop(lifecycle);

        if attached_twice {
            tracing::warn!("Subscription attached twice, releasing the new handle");
        }
        unsubscribe.call();
    }

    pub(crate) fn is_torn_down(&self) -> bool {
        matches!(*self.lifecycle.lock(), Lifecycle::TornDown)
    }

    /// Move to `TornDown`, releasing the handle. Returns false if already torn down.
    pub(crate) fn tear_down(&self) -> bool {
        let previous = std::mem::replace(&mut *self.lifecycle.lock(), Lifecycle::TornDown);
        match previous {
            Lifecycle::Subscribed(unsubscribe) => {
                unsubscribe.call();
                true
            }
            Lifecycle::Mounting => true,
            Lifecycle::TornDown => false,
        }
    }
}
