//! Property-based test generators using proptest.
//!
//! Provides strategies for generating domain values the server accepts:
//! JSON objects whose keys never collide with the version field.

use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for generating object keys.
///
/// Keys come from a small alphabet so that successive values share fields
/// and diffs mix add, remove and replace.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-e]{1,2}").expect("Invalid regex")
}

/// Strategy for generating JSON leaves.
pub fn leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-1000i64..1000).prop_map(Value::from),
        prop::string::string_regex("[a-z/~ ]{0,6}")
            .expect("Invalid regex")
            .prop_map(Value::from),
    ]
}

/// Strategy for generating nested JSON values.
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(key_strategy(), inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Strategy for generating top-level domain values (always objects).
pub fn domain_value_strategy() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(key_strategy(), json_value_strategy(), 0..5)
        .prop_map(|m| Value::Object(m.into_iter().collect()))
}

/// Strategy for generating a sequence of domain values, with repeats.
///
/// Roughly a third of the steps repeat the previous value, exercising the
/// no-op path of the server.
pub fn domain_history_strategy(len: usize) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec((domain_value_strategy(), 0u8..3), 1..=len).prop_map(|steps| {
        let mut history: Vec<Value> = Vec::with_capacity(steps.len());
        for (value, repeat) in steps {
            match history.last() {
                Some(last) if repeat == 0 => history.push(last.clone()),
                _ => history.push(value),
            }
        }
        history
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::test_runner::TestRunner;
    use syncer_protocol::VERSION_KEY;

    #[test]
    fn domain_values_are_objects_without_version_key() {
        let mut runner = TestRunner::default();
        runner
            .run(&domain_value_strategy(), |value| {
                let object = value.as_object().expect("object");
                prop_assert!(!object.contains_key(VERSION_KEY));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn histories_are_never_empty() {
        let mut runner = TestRunner::default();
        runner
            .run(&domain_history_strategy(6), |history| {
                prop_assert!(!history.is_empty());
                prop_assert!(history.len() <= 6);
                Ok(())
            })
            .unwrap();
    }
}
