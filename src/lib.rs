// reactive-query - Reactive state bindings for query-cache observers
//
// This library binds observers of an external query cache into reactive state
// containers owned by a component Scope, together with the value utilities the
// bindings are built on (argument normalization, deep cloning, reconciliation).

pub mod bridge;
pub mod client;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod state;
pub mod utils;

// Re-export commonly used types for convenience
pub use bridge::{QueriesInput, QueryInput, use_queries, use_query};
pub use client::{
    ClientError, QueriesObserver, QueryClient, QueryContext, QueryObserver, Unsubscribe,
};
pub use config::ConfigManager;
pub use metrics::BridgeMetrics;
pub use models::{AdapterConfig, Callback, QueryKey, QueryResult, QueryStatus, Record, Ref, Value};
pub use state::{ReadonlyList, ReadonlyRecord, Scope, StateChange};
pub use utils::{
    FilterArgs, MutationArgs, QueryArgs, clone_deep, clone_deep_unref, clone_deep_with,
    parse_filter_args, parse_mutation_args, parse_mutation_filter_args, parse_query_args,
    update_state,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
