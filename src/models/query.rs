use crate::models::value::{Record, Shared, Value};
use crate::utils::clone_deep;

/// A cache key: a single string, or an ordered sequence of segments
///
/// A sequence keeps the caller's array handle, so normalized options carry the same
/// key array the caller passed in.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryKey {
    Single(String),
    Sequence(Shared<Vec<Value>>),
}

impl QueryKey {
    /// Interpret a dynamic value as a key, if it has a key shape
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(QueryKey::Single(s.clone())),
            Value::Array(items) => Some(QueryKey::Sequence(items.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            QueryKey::Single(s) => Value::String(s.clone()),
            QueryKey::Sequence(segments) => Value::Array(segments.clone()),
        }
    }
}

impl From<&str> for QueryKey {
    fn from(value: &str) -> Self {
        QueryKey::Single(value.to_string())
    }
}

impl From<String> for QueryKey {
    fn from(value: String) -> Self {
        QueryKey::Single(value)
    }
}

impl From<Vec<Value>> for QueryKey {
    fn from(value: Vec<Value>) -> Self {
        QueryKey::Sequence(Shared::new(value))
    }
}

/// Lifecycle status of a query, as reported by the cache engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    #[default]
    Idle,
    Loading,
    Error,
    Success,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Idle => "idle",
            QueryStatus::Loading => "loading",
            QueryStatus::Error => "error",
            QueryStatus::Success => "success",
        }
    }
}

/// Point-in-time result of one query, produced by an observer.
///
/// The payload fields are dynamic values owned by the cache engine. Before a snapshot is
/// stored in reactive state it is [`detached`](Self::detached) so that later mutation of
/// the engine's copy is not visible through the state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResult {
    pub status: QueryStatus,
    pub data: Value,
    pub error: Value,
    pub data_updated_at: u64,
    pub error_updated_at: u64,
    pub failure_count: u32,
    pub is_fetching: bool,
    pub is_stale: bool,
}

impl QueryResult {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn loading() -> Self {
        Self {
            status: QueryStatus::Loading,
            is_fetching: true,
            ..Self::default()
        }
    }

    pub fn success(data: impl Into<Value>) -> Self {
        Self {
            status: QueryStatus::Success,
            data: data.into(),
            ..Self::default()
        }
    }

    pub fn error(error: impl Into<Value>) -> Self {
        Self {
            status: QueryStatus::Error,
            error: error.into(),
            failure_count: 1,
            ..Self::default()
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == QueryStatus::Idle
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Copy with deep-cloned payload values
    pub fn detached(&self) -> Self {
        Self {
            data: clone_deep(&self.data),
            error: clone_deep(&self.error),
            ..self.clone()
        }
    }

    /// Record form, with the engine's camelCase field names
    pub fn to_record(&self) -> Record {
        Record::new()
            .with("status", self.status.as_str())
            .with("data", clone_deep(&self.data))
            .with("error", clone_deep(&self.error))
            .with("dataUpdatedAt", self.data_updated_at)
            .with("errorUpdatedAt", self.error_updated_at)
            .with("failureCount", self.failure_count)
            .with("isFetching", self.is_fetching)
            .with("isStale", self.is_stale)
            .with("isIdle", self.is_idle())
            .with("isLoading", self.is_loading())
            .with("isSuccess", self.is_success())
            .with("isError", self.is_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_key_from_value() {
        assert_eq!(
            QueryKey::from_value(&Value::from("todos")),
            Some(QueryKey::Single("todos".to_string()))
        );
        assert_eq!(
            QueryKey::from_value(&Value::array([Value::from("todo"), Value::from(5)])),
            Some(QueryKey::from(vec![Value::from("todo"), Value::from(5)]))
        );
        assert_eq!(QueryKey::from_value(&Value::from(5)), None);
        assert_eq!(QueryKey::from_value(&Value::record([("a", 1)])), None);
    }

    #[test]
    fn test_sequence_key_keeps_caller_array() {
        let segments = Value::array(["todo", "list"]);
        let key = QueryKey::from_value(&segments).unwrap();

        assert!(key.to_value().same(&segments));
    }

    #[test]
    fn test_detached_copies_payload() {
        let data = Value::record([("title", "first")]);
        let result = QueryResult::success(data.clone());
        let detached = result.detached();

        assert_eq!(detached, result);
        assert!(!detached.data.same(&data));
    }

    #[test]
    fn test_to_record_flags() {
        let record = QueryResult::error("boom").to_record();

        assert_eq!(record.get("status"), Some(Value::from("error")));
        assert_eq!(record.get("isError"), Some(Value::Bool(true)));
        assert_eq!(record.get("isSuccess"), Some(Value::Bool(false)));
        assert_eq!(record.get("error"), Some(Value::from("boom")));
        assert_eq!(record.get("failureCount"), Some(Value::from(1)));
    }
}
