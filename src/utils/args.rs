//! Normalization of the accepted call shapes into canonical option and filter records.
//!
//! Query and mutation entry points accept three shapes (options only, key + options,
//! key + function + options). Each shape is a variant of a tagged union here, and every
//! `parse_*` function maps one union onto a single [`Record`]. All of them are total:
//! missing options default to an empty record.
//!
//! Callers holding untyped [`Value`]s can build the unions with `from_values`, which is
//! the single place that inspects argument shapes.

use crate::models::{Callback, QueryKey, Record, Value};

pub const QUERY_KEY: &str = "queryKey";
pub const QUERY_FN: &str = "queryFn";
pub const MUTATION_KEY: &str = "mutationKey";
pub const MUTATION_FN: &str = "mutationFn";

/// Call shapes accepted by query entry points
#[derive(Debug, Clone)]
pub enum QueryArgs {
    /// Complete options record, used as-is
    Options(Record),
    Key {
        key: QueryKey,
        options: Option<Record>,
    },
    KeyFn {
        key: QueryKey,
        query_fn: Callback,
        options: Option<Record>,
    },
}

impl QueryArgs {
    /// Resolve untyped positional arguments.
    ///
    /// A key-shaped `arg1` selects a key variant; `arg2` is the query function when it
    /// is callable, and the options are `arg3`, else `arg2`. Any other `arg1` is taken
    /// as the options record (non-records become an empty record).
    pub fn from_values(arg1: Value, arg2: Option<Value>, arg3: Option<Value>) -> Self {
        let Some(key) = QueryKey::from_value(&arg1) else {
            return QueryArgs::Options(into_record(arg1).unwrap_or_default());
        };

        match arg2 {
            Some(Value::Function(query_fn)) => QueryArgs::KeyFn {
                key,
                query_fn,
                options: arg3.and_then(into_record),
            },
            arg2 => QueryArgs::Key {
                key,
                options: present(arg3).or(arg2).and_then(into_record),
            },
        }
    }
}

impl From<Record> for QueryArgs {
    fn from(options: Record) -> Self {
        QueryArgs::Options(options)
    }
}

/// Call shapes accepted by mutation entry points
#[derive(Debug, Clone)]
pub enum MutationArgs {
    Options(Record),
    Key {
        key: QueryKey,
        options: Option<Record>,
    },
    KeyFn {
        key: QueryKey,
        mutation_fn: Callback,
        options: Option<Record>,
    },
    Fn {
        mutation_fn: Callback,
        options: Option<Record>,
    },
}

impl MutationArgs {
    /// Resolve untyped positional arguments. Same rules as [`QueryArgs::from_values`],
    /// plus a callable `arg1` selects the function-only shape with `arg2` as options.
    pub fn from_values(arg1: Value, arg2: Option<Value>, arg3: Option<Value>) -> Self {
        let arg1 = match arg1 {
            Value::Function(mutation_fn) => {
                return MutationArgs::Fn {
                    mutation_fn,
                    options: arg2.and_then(into_record),
                };
            }
            other => other,
        };

        let Some(key) = QueryKey::from_value(&arg1) else {
            return MutationArgs::Options(into_record(arg1).unwrap_or_default());
        };

        match arg2 {
            Some(Value::Function(mutation_fn)) => MutationArgs::KeyFn {
                key,
                mutation_fn,
                options: arg3.and_then(into_record),
            },
            arg2 => MutationArgs::Key {
                key,
                options: present(arg3).or(arg2).and_then(into_record),
            },
        }
    }
}

impl From<Record> for MutationArgs {
    fn from(options: Record) -> Self {
        MutationArgs::Options(options)
    }
}

/// Call shapes accepted by filter-taking operations
#[derive(Debug, Clone, Default)]
pub enum FilterArgs {
    #[default]
    Absent,
    Filters(Record),
    Key {
        key: QueryKey,
        filters: Option<Record>,
    },
}

impl FilterArgs {
    pub fn from_values(arg1: Option<Value>, arg2: Option<Value>) -> Self {
        let Some(arg1) = arg1 else {
            return FilterArgs::Absent;
        };

        match QueryKey::from_value(&arg1) {
            Some(key) => FilterArgs::Key {
                key,
                filters: arg2.and_then(into_record),
            },
            None => into_record(arg1).map_or(FilterArgs::Absent, FilterArgs::Filters),
        }
    }
}

impl From<Record> for FilterArgs {
    fn from(filters: Record) -> Self {
        FilterArgs::Filters(filters)
    }
}

/// True for values usable as a cache key: strings and arrays (including empty ones)
pub fn is_query_key(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Array(_))
}

/// Normalize query call arguments into an options record.
///
/// `QueryArgs::Options` returns the caller's record itself, so identity comparisons on
/// options keep working; every other shape builds a fresh record.
pub fn parse_query_args(args: QueryArgs) -> Record {
    match args {
        QueryArgs::Options(options) => options,
        QueryArgs::Key { key, options } => spread(options.as_ref()).with(QUERY_KEY, key.to_value()),
        QueryArgs::KeyFn {
            key,
            query_fn,
            options,
        } => spread(options.as_ref())
            .with(QUERY_KEY, key.to_value())
            .with(QUERY_FN, query_fn),
    }
}

/// Normalize mutation call arguments into an options record. Always a fresh record.
pub fn parse_mutation_args(args: MutationArgs) -> Record {
    match args {
        MutationArgs::Options(options) => spread(Some(&options)),
        MutationArgs::Key { key, options } => {
            spread(options.as_ref()).with(MUTATION_KEY, key.to_value())
        }
        MutationArgs::KeyFn {
            key,
            mutation_fn,
            options,
        } => spread(options.as_ref())
            .with(MUTATION_KEY, key.to_value())
            .with(MUTATION_FN, mutation_fn),
        MutationArgs::Fn {
            mutation_fn,
            options,
        } => spread(options.as_ref()).with(MUTATION_FN, mutation_fn),
    }
}

/// Normalize query filter arguments. Absent filters become an empty record.
pub fn parse_filter_args(args: FilterArgs) -> Record {
    match args {
        FilterArgs::Absent => Record::new(),
        FilterArgs::Filters(filters) => filters,
        FilterArgs::Key { key, filters } => spread(filters.as_ref()).with(QUERY_KEY, key.to_value()),
    }
}

/// Normalize mutation filter arguments. Unlike [`parse_filter_args`], absent filters
/// stay absent.
pub fn parse_mutation_filter_args(args: FilterArgs) -> Option<Record> {
    match args {
        FilterArgs::Absent => None,
        FilterArgs::Filters(filters) => Some(filters),
        FilterArgs::Key { key, filters } => {
            Some(spread(filters.as_ref()).with(MUTATION_KEY, key.to_value()))
        }
    }
}

/// Fresh record holding a shallow copy of `source`'s own fields
fn spread(source: Option<&Record>) -> Record {
    source
        .map(|record| Record::from_fields(record.to_raw().fields()))
        .unwrap_or_default()
}

/// `None` for an absent, undefined or null argument
fn present(value: Option<Value>) -> Option<Value> {
    value.filter(|value| !value.is_undefined() && !value.is_null())
}

fn into_record(value: Value) -> Option<Record> {
    match value {
        Value::Record(record) => Some(record),
        Value::Ref(reference) => into_record(reference.get()),
        _ => None,
    }
}
