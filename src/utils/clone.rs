//! Deep clone and deep unwrap of [`Value`] trees.
//!
//! Traversal rules:
//! - primitives, functions and refs are returned as-is
//! - maps and sets are opaque: returned by the same handle, entries untouched
//! - arrays and records are rebuilt, each element or field cloned recursively
//! - a reactive record is read through its raw view; the copy is a plain record
//!
//! There is no cycle detection. Options and filters are acyclic; a cyclic input
//! recurses until the stack overflows.

use crate::models::{Record, Value};

/// Clone `value` deeply. See the module docs for which variants are copied.
pub fn clone_deep(value: &Value) -> Value {
    clone_deep_with(value, &|_| None)
}

/// Clone `value` deeply, consulting `customizer` first at every node.
///
/// When the customizer returns `Some`, that value replaces the node and its children
/// are not visited.
pub fn clone_deep_with<F>(value: &Value, customizer: &F) -> Value
where
    F: Fn(&Value) -> Option<Value>,
{
    if let Some(replacement) = customizer(value) {
        return replacement;
    }

    match value {
        Value::Array(items) => Value::array(
            items
                .read()
                .iter()
                .map(|item| clone_deep_with(item, customizer)),
        ),
        Value::Record(record) => Value::Record(clone_record_with(record, customizer)),
        _ => value.clone(),
    }
}

/// Clone `value` deeply, replacing every [`Ref`](crate::models::Ref) with its current
/// value at any depth outside of opaque containers.
pub fn clone_deep_unref(value: &Value) -> Value {
    clone_deep_with(value, &|node| match node {
        Value::Ref(reference) => Some(clone_deep_unref(&reference.get())),
        _ => None,
    })
}

fn clone_record_with<F>(record: &Record, customizer: &F) -> Record
where
    F: Fn(&Value) -> Option<Value>,
{
    let raw = if record.is_reactive() {
        record.to_raw()
    } else {
        record.clone()
    };

    // Snapshot the fields first so no lock is held while the customizer runs
    raw.fields()
        .iter()
        .map(|(key, field)| (key.clone(), clone_deep_with(field, customizer)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ref;

    #[test]
    fn test_copies_primitives_and_functions_as_is() {
        assert_eq!(clone_deep(&Value::from(3456)), Value::from(3456));
        assert_eq!(clone_deep(&Value::from("theString")), Value::from("theString"));
        assert!(clone_deep(&Value::Null).is_null());
        assert!(clone_deep(&Value::Undefined).is_undefined());

        let func = Value::function(|_| Value::Null);
        assert!(clone_deep(&func).same(&func));
    }

    #[test]
    fn test_copies_maps_and_sets_as_is() {
        let set_val = Value::set([3, 4, 5]);
        let set_copy = clone_deep(&set_val);
        assert!(set_copy.same(&set_val));
        assert_eq!(set_copy, Value::set([3, 4, 5]));

        let map_val = Value::map([("a", "aVal"), ("b", "bVal")]);
        let map_copy = clone_deep(&map_val);
        assert!(map_copy.same(&map_val));
        assert_eq!(map_copy, Value::map([("a", "aVal"), ("b", "bVal")]));
    }

    #[test]
    fn test_deeply_copies_arrays() {
        let inner_record = Value::record([("a", 1)]);
        let inner_array = Value::array([Value::from(5), Value::from(6), inner_record.clone()]);
        let set = Value::set([3, 4]);
        let val = Value::array([
            Value::from(25),
            Value::from("str"),
            Value::Null,
            set.clone(),
            inner_array.clone(),
            Value::Undefined,
        ]);

        let cp = clone_deep(&val);
        assert_eq!(
            cp,
            Value::array([
                Value::from(25),
                Value::from("str"),
                Value::Null,
                Value::set([3, 4]),
                Value::array([Value::from(5), Value::from(6), Value::record([("a", 1)])]),
                Value::Undefined,
            ])
        );
        assert!(!cp.same(&val));

        let items = cp.to_vec().unwrap();
        assert!(items[3].same(&set));
        assert!(!items[4].same(&inner_array));
        assert!(!items[4].to_vec().unwrap()[2].same(&inner_record));
    }

    #[test]
    fn test_deeply_copies_reactive_record() {
        let set = Value::set([5, 6]);
        let list = Value::array([3, 4]);
        let nested = Value::record([("fa", 26)]);
        let val = Record::new()
            .with("a", 25)
            .with("b", "str")
            .with("c", Value::Null)
            .with("d", Value::Undefined)
            .with("e", set.clone())
            .with("f", list.clone())
            .with("g", nested.clone())
            .reactive();

        let cp = clone_deep(&Value::Record(val.clone()));
        let Value::Record(cp) = cp else {
            panic!("expected a record");
        };

        assert_eq!(cp, val);
        assert!(!cp.is_reactive());
        assert!(!cp.ptr_eq(&val));
        assert!(cp.get("e").unwrap().same(&set));
        assert!(!cp.get("f").unwrap().same(&list));
        assert!(!cp.get("g").unwrap().same(&nested));
    }

    #[test]
    fn test_clone_deep_keeps_refs() {
        let reference = Value::Ref(Ref::new(1));
        assert!(clone_deep(&reference).same(&reference));
    }

    #[test]
    fn test_unrefs_primitives() {
        assert_eq!(clone_deep_unref(&Ref::new(34).into()), Value::from(34));
        assert_eq!(clone_deep_unref(&Ref::new("mystr").into()), Value::from("mystr"));
    }

    #[test]
    fn test_deeply_unrefs_arrays() {
        let val = Ref::new(Value::array([
            Value::from(2),
            Value::from(3),
            Ref::new(4).into(),
            Ref::new("5").into(),
            Value::record([("a", Value::from(Ref::new(6)))]),
            Value::array([Value::from(Ref::new(7))]),
        ]));

        let cp = clone_deep_unref(&val.into());
        assert_eq!(
            cp,
            Value::array([
                Value::from(2),
                Value::from(3),
                Value::from(4),
                Value::from("5"),
                Value::record([("a", 6)]),
                Value::array([7]),
            ])
        );
        assert!(cp.is_unwrapped());
    }

    #[test]
    fn test_deeply_unrefs_records() {
        let val = Ref::new(Value::record([
            ("a", Value::from(1)),
            ("b", Ref::new(2).into()),
            (
                "c",
                Value::array([
                    Value::from(Ref::new("c1")),
                    Value::from(Ref::new(Value::array(["c2"]))),
                ]),
            ),
            ("d", Value::record([("e", Value::from(Ref::new("e")))])),
        ]));

        let cp = clone_deep_unref(&val.into());
        assert_eq!(
            cp,
            Value::record([
                ("a", Value::from(1)),
                ("b", Value::from(2)),
                ("c", Value::array([Value::from("c1"), Value::array(["c2"])])),
                ("d", Value::record([("e", "e")])),
            ])
        );
        assert!(cp.is_unwrapped());
    }

    #[test]
    fn test_unref_of_nested_refs() {
        let val = Ref::new(Ref::new(Ref::new(9)));
        assert_eq!(clone_deep_unref(&val.into()), Value::from(9));
    }

    #[test]
    fn test_unref_leaves_opaque_entries_alone() {
        let set = Value::set([Value::from(Ref::new(1))]);
        let cp = clone_deep_unref(&Value::array([set.clone()]));
        assert!(cp.to_vec().unwrap()[0].same(&set));
    }

    #[test]
    fn test_customizer_replaces_node() {
        let val = Value::array([Value::from(1), Value::from("secret")]);
        let cp = clone_deep_with(&val, &|node| match node {
            Value::String(_) => Some(Value::from("***")),
            _ => None,
        });
        assert_eq!(cp, Value::array([Value::from(1), Value::from("***")]));
    }
}
