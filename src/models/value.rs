//! Dynamic value tree with reference semantics.
//!
//! Query options, filters and result payloads are open-ended records whose fields are
//! supplied by callers and by the cache engine, so they are modelled as a [`Value`] tree
//! rather than fixed structs. Composite variants are shared handles: cloning a `Value`
//! clones the handle, not the contents. Use [`crate::utils::clone_deep`] for a structural
//! copy.
//!
//! Two notions of equality exist:
//! - [`Value::same`] is identity (same handle, or equal primitive)
//! - `PartialEq` is deep structural equality (functions still compare by identity)

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;

/// Shared, interior-mutable storage used by every composite value.
pub struct Shared<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write()
    }

    /// True if both handles point at the same storage
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> Shared<T> {
    /// Clone the current contents out of the lock
    pub fn get(&self) -> T {
        self.inner.read().clone()
    }
}

// Manual Clone implementation to avoid requiring T: Clone
impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Same storage, or equal contents
impl<T: PartialEq> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.read() == *other.read()
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.read().fmt(f)
    }
}

/// Ordered field storage of a [`Record`]
pub type Fields = IndexMap<String, Value>;

/// A keyed record (the options/filter/result shape).
///
/// A record may carry the reactive tag, which marks a handle produced by
/// [`Record::reactive`]. Tagged and untagged handles can share the same field storage;
/// [`Record::to_raw`] strips the tag without copying.
#[derive(Clone, Default)]
pub struct Record {
    fields: Shared<Fields>,
    reactive: bool,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Fields) -> Self {
        Self {
            fields: Shared::new(fields),
            reactive: false,
        }
    }

    /// Reactive view over the same field storage
    pub fn reactive(&self) -> Record {
        Record {
            fields: self.fields.clone(),
            reactive: true,
        }
    }

    pub fn is_reactive(&self) -> bool {
        self.reactive
    }

    /// Untagged view over the same field storage
    pub fn to_raw(&self) -> Record {
        Record {
            fields: self.fields.clone(),
            reactive: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.fields.read().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.write().insert(key.into(), value.into())
    }

    /// Builder-style insert
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.fields.write().shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.fields.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.fields.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.read().is_empty()
    }

    /// Shallow copy of the own fields (the `{...record}` spread)
    pub fn fields(&self) -> Fields {
        self.fields.read().clone()
    }

    pub fn fields_mut(&self) -> RwLockWriteGuard<'_, Fields> {
        self.fields.write()
    }

    /// True if both records share field storage, regardless of the reactive tag
    pub fn ptr_eq(&self, other: &Record) -> bool {
        self.fields.ptr_eq(&other.fields)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        // IndexMap equality ignores insertion order
        *self.fields.read() == *other.fields.read()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields.read().iter()).finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record::from_fields(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

type CallbackFn = dyn Fn(&[Value]) -> Value + Send + Sync;

/// A callable value (query or mutation function). Compared by identity.
#[derive(Clone)]
pub struct Callback {
    func: Arc<CallbackFn>,
}

impl Callback {
    pub fn new(func: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> Self {
        Self {
            func: Arc::new(func),
        }
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.func)(args)
    }

    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Arc::as_ptr(&self.func) as *const ())
    }
}

/// A reactive single-value reference
#[derive(Clone, Default)]
pub struct Ref {
    cell: Shared<Value>,
}

impl Ref {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            cell: Shared::new(value.into()),
        }
    }

    /// Current value held by the reference
    pub fn get(&self) -> Value {
        self.cell.get()
    }

    pub fn set(&self, value: impl Into<Value>) {
        *self.cell.write() = value.into();
    }

    pub fn ptr_eq(&self, other: &Ref) -> bool {
        self.cell.ptr_eq(&other.cell)
    }
}

impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.cell.read() == *other.cell.read()
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&*self.cell.read()).finish()
    }
}

/// A dynamically typed value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Function(Callback),
    Array(Shared<Vec<Value>>),
    Record(Record),
    /// Keyed collection, never traversed by the clone engines
    Map(Shared<Vec<(Value, Value)>>),
    /// Unique-value collection, never traversed by the clone engines
    Set(Shared<Vec<Value>>),
    Ref(Ref),
}

impl Value {
    pub fn array(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Value::Array(Shared::new(items.into_iter().map(Into::into).collect()))
    }

    pub fn record<K: Into<String>, V: Into<Value>>(fields: impl IntoIterator<Item = (K, V)>) -> Self {
        Value::Record(fields.into_iter().collect())
    }

    /// Build a keyed collection; a repeated key overwrites the earlier entry
    pub fn map<K: Into<Value>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut out: Vec<(Value, Value)> = Vec::new();
        for (key, value) in entries {
            let key = key.into();
            let value = value.into();
            match out.iter_mut().find(|(existing, _)| *existing == key) {
                Some(slot) => slot.1 = value,
                None => out.push((key, value)),
            }
        }
        Value::Map(Shared::new(out))
    }

    /// Build a unique-value collection; duplicates are dropped
    pub fn set(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        let mut out: Vec<Value> = Vec::new();
        for item in items {
            let item = item.into();
            if !out.contains(&item) {
                out.push(item);
            }
        }
        Value::Set(Shared::new(out))
    }

    pub fn function(func: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> Self {
        Value::Function(Callback::new(func))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
        )
    }

    /// True for containers that are shared rather than copied during cloning
    pub fn is_opaque(&self) -> bool {
        matches!(self, Value::Map(_) | Value::Set(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Value::Function(callback) => Some(callback),
            _ => None,
        }
    }

    /// Snapshot of the elements of an array value
    pub fn to_vec(&self) -> Option<Vec<Value>> {
        match self {
            Value::Array(items) => Some(items.get()),
            _ => None,
        }
    }

    /// Identity comparison: equal primitives, or the same underlying handle
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Record(a), Value::Record(b)) => a.ptr_eq(b),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::Set(a), Value::Set(b)) => a.ptr_eq(b),
            (Value::Ref(a), Value::Ref(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// True if no `Ref` is reachable from this value outside of opaque containers
    pub fn is_unwrapped(&self) -> bool {
        match self {
            Value::Ref(_) => false,
            Value::Array(items) => items.read().iter().all(Value::is_unwrapped),
            Value::Record(record) => record.fields.read().values().all(Value::is_unwrapped),
            _ => true,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.same(other) {
            return true;
        }
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => *a.read() == *b.read(),
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => {
                let (a, b) = (a.read(), b.read());
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter().any(|(other_key, other_value)| key == other_key && value == other_value)
                    })
            }
            (Value::Set(a), Value::Set(b)) => {
                let (a, b) = (a.read(), b.read());
                a.len() == b.len() && a.iter().all(|item| b.contains(item))
            }
            (Value::Ref(a), Value::Ref(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Function(callback) => callback.fmt(f),
            Value::Array(items) => f.debug_list().entries(items.read().iter()).finish(),
            Value::Record(record) => record.fmt(f),
            Value::Map(entries) => {
                write!(f, "Map")?;
                f.debug_map()
                    .entries(entries.read().iter().map(|(key, value)| (key, value)))
                    .finish()
            }
            Value::Set(items) => {
                write!(f, "Set")?;
                f.debug_set().entries(items.read().iter()).finish()
            }
            Value::Ref(reference) => reference.fmt(f),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

impl From<Callback> for Value {
    fn from(value: Callback) -> Self {
        Value::Function(value)
    }
}

impl From<Ref> for Value {
    fn from(value: Ref) -> Self {
        Value::Ref(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(Shared::new(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_storage() {
        let record = Record::new().with("a", 1);
        let alias = record.clone();
        alias.insert("b", 2);

        assert!(record.ptr_eq(&alias));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_reactive_view_shares_fields() {
        let raw = Record::new().with("count", 1);
        let proxy = raw.reactive();

        assert!(proxy.is_reactive());
        assert!(!proxy.to_raw().is_reactive());
        assert!(proxy.ptr_eq(&raw));

        proxy.insert("count", 2);
        assert_eq!(raw.get("count"), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_structural_equality_vs_identity() {
        let a = Value::array([Value::from(1), Value::record([("x", "y")])]);
        let b = Value::array([Value::from(1), Value::record([("x", "y")])]);

        assert_eq!(a, b);
        assert!(!a.same(&b));
        assert!(a.same(&a.clone()));
    }

    #[test]
    fn test_record_equality_ignores_field_order() {
        let a = Record::new().with("a", 1).with("b", 2);
        let b = Record::new().with("b", 2).with("a", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_functions_compare_by_identity() {
        let f = Callback::new(|_| Value::Null);
        let g = Callback::new(|_| Value::Null);

        assert_eq!(Value::from(f.clone()), Value::from(f.clone()));
        assert_ne!(Value::from(f), Value::from(g));
    }

    #[test]
    fn test_set_and_map_deduplicate() {
        let set = Value::set([3, 4, 3]);
        let Value::Set(items) = &set else {
            panic!("expected set");
        };
        assert_eq!(items.read().len(), 2);

        let map = Value::map([("a", 1), ("a", 2)]);
        let Value::Map(entries) = &map else {
            panic!("expected map");
        };
        assert_eq!(entries.read().len(), 1);
        assert_eq!(entries.read()[0].1, Value::from(2));
    }

    #[test]
    fn test_ref_get_set() {
        let reference = Ref::new(34);
        assert_eq!(reference.get(), Value::from(34));

        reference.set("changed");
        assert_eq!(reference.get(), Value::from("changed"));
        assert!(!Value::from(reference).is_unwrapped());
    }

    #[test]
    fn test_typed_accessors() {
        let options = Record::new()
            .with("staleTime", 500)
            .with("enabled", false)
            .with("queryFn", Callback::new(|args| Value::from(args.len() as u32)));

        assert_eq!(options.get("staleTime").and_then(|v| v.as_f64()), Some(500.0));
        assert_eq!(options.get("enabled").and_then(|v| v.as_bool()), Some(false));
        assert_eq!(options.get("enabled").and_then(|v| v.as_f64()), None);

        let query_fn = options.get("queryFn").unwrap();
        let callback = query_fn.as_callback().unwrap();
        assert_eq!(callback.call(&[Value::Null, Value::Null]), Value::from(2));
        assert!(Value::from("fn").as_callback().is_none());
    }

    #[test]
    fn test_record_remove_keeps_order() {
        let record = Record::new().with("a", 1).with("b", 2).with("c", 3);
        record.remove("b");
        assert_eq!(record.keys(), vec!["a".to_string(), "c".to_string()]);
    }
}
