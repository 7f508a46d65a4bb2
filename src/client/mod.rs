//! Boundary to the query-cache engine.
//!
//! The engine itself (cache storage, fetching, retries, invalidation) is external. This
//! module fixes the interface the bridges consume:
//!
//! - [`QueryClient`]: applies default options and constructs observers
//! - [`QueriesObserver`] / [`QueryObserver`]: live subscriptions over one or many queries
//! - [`Unsubscribe`]: the one-shot cancellation handle returned by `subscribe`
//! - [`QueryContext`]: explicit registry resolving a client by optional key

use crate::metrics::BridgeMetrics;
use crate::models::{AdapterConfig, QueryResult, Record};
use crate::state::DEFAULT_CHANGE_BUFFER;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Registry key of the default client
pub const QUERY_CLIENT: &str = "QUERY_CLIENT";

/// Listener receiving every result sequence a [`QueriesObserver`] emits
pub type ResultsListener = Arc<dyn Fn(&[QueryResult]) + Send + Sync>;

/// Listener receiving every result a [`QueryObserver`] emits
pub type ResultListener = Arc<dyn Fn(&QueryResult) + Send + Sync>;

/// Errors that can occur while resolving a client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("No query client registered under {0}")]
    ClientNotFound(String),
}

/// One-shot handle that ends a subscription.
///
/// Consumed by [`call`](Self::call), so a subscription is cancelled at most once.
pub struct Unsubscribe(Box<dyn FnOnce() + Send>);

impl Unsubscribe {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(unsubscribe))
    }

    /// A handle that does nothing
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    pub fn call(self) {
        (self.0)()
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Unsubscribe")
    }
}

/// The cache client as seen by the bridges
#[cfg_attr(test, mockall::automock)]
pub trait QueryClient: Send + Sync {
    /// Merge client-wide defaults into `options`
    fn default_query_observer_options(&self, options: &Record) -> Record;

    /// Construct an observer tracking every query in `queries`
    fn queries_observer(&self, queries: Vec<Record>) -> Arc<dyn QueriesObserver>;

    /// Construct an observer tracking a single query
    fn query_observer(&self, options: Record) -> Arc<dyn QueryObserver>;
}

/// Observer over an ordered set of queries
pub trait QueriesObserver: Send + Sync {
    /// Results index-aligned with the tracked queries
    fn get_current_result(&self) -> Vec<QueryResult>;

    fn subscribe(&self, listener: ResultsListener) -> Unsubscribe;

    /// Replace the tracked queries
    fn set_queries(&self, queries: Vec<Record>);
}

/// Observer over one query
pub trait QueryObserver: Send + Sync {
    fn get_current_result(&self) -> QueryResult;

    fn subscribe(&self, listener: ResultListener) -> Unsubscribe;

    fn set_options(&self, options: Record);
}

/// Registry key for a client selected by `key`
pub fn client_key(key: Option<&str>) -> String {
    match key {
        Some(key) if !key.is_empty() => format!("{}:{}", QUERY_CLIENT, key),
        _ => QUERY_CLIENT.to_string(),
    }
}

/// Explicit context handed to every bridge
///
/// Holds the client registry, the change-buffer size for bridge state, and the shared
/// [`BridgeMetrics`]. Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct QueryContext {
    clients: Arc<RwLock<IndexMap<String, Arc<dyn QueryClient>>>>,
    default_client_key: Option<String>,
    change_buffer: usize,
    metrics: Arc<BridgeMetrics>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(RwLock::new(IndexMap::new())),
            default_client_key: None,
            change_buffer: DEFAULT_CHANGE_BUFFER,
            metrics: Arc::new(BridgeMetrics::new()),
        }
    }

    /// Create a context using the settings of an [`AdapterConfig`]
    pub fn from_config(config: &AdapterConfig) -> Self {
        Self {
            default_client_key: config.default_client_key.clone(),
            change_buffer: config.change_buffer,
            ..Self::new()
        }
    }

    /// Register `client` under `key` (or as the default client), replacing any previous
    pub fn provide(&self, key: Option<&str>, client: Arc<dyn QueryClient>) {
        let registry_key = client_key(key);
        tracing::debug!("Providing query client {}", registry_key);
        self.clients.write().insert(registry_key, client);
    }

    /// Look up the client for `key`, falling back to the configured default key
    pub fn resolve(&self, key: Option<&str>) -> Result<Arc<dyn QueryClient>, ClientError> {
        let key = key.or(self.default_client_key.as_deref());
        let registry_key = client_key(key);

        self.clients
            .read()
            .get(&registry_key)
            .cloned()
            .ok_or(ClientError::ClientNotFound(registry_key))
    }

    pub fn change_buffer(&self) -> usize {
        self.change_buffer
    }

    pub fn metrics(&self) -> &Arc<BridgeMetrics> {
        &self.metrics
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new()
    }
}
