//! Pure helpers shared by the bridges.
//!
//! - [`clone_deep`], [`clone_deep_with`], [`clone_deep_unref`]: structural copies of
//!   [`Value`](crate::models::Value) trees that keep maps and sets by reference
//! - `parse_*` and [`is_query_key`]: call-shape normalization
//! - [`update_state`]: in-place record reconciliation
//!
//! Nothing here touches reactive state or the cache engine.

pub mod args;
pub mod clone;
pub mod reconcile;

pub use args::{
    FilterArgs, MutationArgs, QueryArgs, is_query_key, parse_filter_args, parse_mutation_args,
    parse_mutation_filter_args, parse_query_args,
};
pub use clone::{clone_deep, clone_deep_unref, clone_deep_with};
pub use reconcile::update_state;
