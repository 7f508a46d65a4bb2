//! Data models for the adapter.
//!
//! - [`Value`]: dynamic value tree used for options, filters and result payloads
//! - [`Record`]: keyed record, optionally tagged as reactive
//! - [`QueryKey`], [`QueryResult`], [`QueryStatus`]: query-level shapes
//! - [`AdapterConfig`]: settings loaded by [`ConfigManager`](crate::config::ConfigManager)

pub mod config;
pub mod query;
pub mod value;

pub use config::{AdapterConfig, LoggingSettings};
pub use query::{QueryKey, QueryResult, QueryStatus};
pub use value::{Callback, Fields, Record, Ref, Shared, Value};
