//! Property-based tests for mlr-lang scoping and record access.
use mlr_lang::{Ident, Record, ScopeError, Stack, TypeGate, Value};
use proptest::prelude::*;

mod strategies {
    use super::*;

    /// Generates local variable names
    pub fn name() -> impl Strategy<Value = String> {
        "[a-z_][a-z0-9_]{0,10}"
    }

    /// Generates scalar values of every present, non-error type
    pub fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::Int),
            (-1000.0f64..1000.0f64).prop_map(Value::Float),
            any::<bool>().prop_map(Value::Boolean),
            "[a-zA-Z ]{1,12}".prop_map(Value::from),
        ]
    }

    /// Generates records with distinct field names
    pub fn record() -> impl Strategy<Value = Record> {
        prop::collection::btree_map(name(), any::<i64>(), 0..8).prop_map(|fields| {
            fields
                .into_iter()
                .map(|(k, v)| (k, Value::Int(v)))
                .collect()
        })
    }
}

proptest! {
    #[test]
    fn test_frames_balance(pushes in 0usize..32) {
        let mut stack = Stack::new();
        for _ in 0..pushes {
            stack.push_frame();
        }
        prop_assert_eq!(stack.frame_depth(), pushes + 1);
        for _ in 0..pushes {
            stack.pop_frame();
        }
        prop_assert_eq!(stack.frame_depth(), 1);
        stack.pop_frame();
        prop_assert_eq!(stack.frame_depth(), 1);
    }

    #[test]
    fn test_plain_assignment_reaches_outer_binding(
        name in strategies::name(),
        outer in strategies::scalar(),
        inner in strategies::scalar(),
        depth in 1usize..8,
    ) {
        let mut stack = Stack::new();
        let ident = Ident::new(&name);
        stack.assign_or_reuse(ident, outer).unwrap();
        for _ in 0..depth {
            stack.push_frame();
        }
        stack.assign_or_reuse(ident, inner.clone()).unwrap();
        for _ in 0..depth {
            stack.pop_frame();
        }
        prop_assert_eq!(stack.get(ident), Some(&inner));
    }

    #[test]
    fn test_declaration_shadows_until_frame_pops(
        name in strategies::name(),
        outer in strategies::scalar(),
        inner in strategies::scalar(),
    ) {
        let mut stack = Stack::new();
        let ident = Ident::new(&name);
        stack.assign_or_reuse(ident, outer.clone()).unwrap();
        stack.push_frame();
        stack.declare_local(ident, TypeGate::Any, inner.clone()).unwrap();
        prop_assert_eq!(stack.get(ident), Some(&inner));
        stack.pop_frame();
        prop_assert_eq!(stack.get(ident), Some(&outer));
    }

    #[test]
    fn test_redeclaration_in_same_frame_fails(
        name in strategies::name(),
        first in strategies::scalar(),
        second in strategies::scalar(),
    ) {
        let mut stack = Stack::new();
        let ident = Ident::new(&name);
        stack.declare_local(ident, TypeGate::Any, first.clone()).unwrap();
        prop_assert_eq!(
            stack.declare_local(ident, TypeGate::Any, second),
            Err(ScopeError::Redeclared(ident))
        );
        prop_assert_eq!(stack.get(ident), Some(&first));
    }

    #[test]
    fn test_type_gate_keeps_old_value_on_rejection(
        name in strategies::name(),
        i in any::<i64>(),
        s in "[a-z]{1,8}",
    ) {
        let mut stack = Stack::new();
        let ident = Ident::new(&name);
        stack.declare_local(ident, TypeGate::Int, Value::Int(i)).unwrap();
        let rejected = stack.assign_or_reuse(ident, Value::from(s));
        let is_type_gate_error = matches!(rejected, Err(ScopeError::TypeGate { .. }));
        prop_assert!(is_type_gate_error);
        prop_assert_eq!(stack.get(ident), Some(&Value::Int(i)));
    }

    #[test]
    fn test_function_frame_set_hides_caller(
        name in strategies::name(),
        value in strategies::scalar(),
    ) {
        let mut stack = Stack::new();
        let ident = Ident::new(&name);
        stack.assign_or_reuse(ident, value.clone()).unwrap();
        stack.push_frame_set();
        prop_assert_eq!(stack.get(ident), None);
        stack.assign_or_reuse(ident, Value::Int(0)).unwrap();
        stack.pop_frame_set();
        prop_assert_eq!(stack.get(ident), Some(&value));
    }

    #[test]
    fn test_unset_is_idempotent(
        name in strategies::name(),
        value in strategies::scalar(),
        times in 1usize..4,
    ) {
        let mut stack = Stack::new();
        let ident = Ident::new(&name);
        stack.assign_or_reuse(ident, value).unwrap();
        for _ in 0..times {
            stack.unset(ident);
            prop_assert_eq!(stack.get(ident), Some(&Value::Absent));
        }
    }

    #[test]
    fn test_positional_access_matches_field_order(
        record in strategies::record(),
        position in -2i64..12,
    ) {
        let expected = usize::try_from(position)
            .ok()
            .and_then(|p| p.checked_sub(1))
            .and_then(|i| record.iter().nth(i))
            .map(|(_, v)| v);
        prop_assert_eq!(
            record.get_with_value_index(&Value::Int(position)).unwrap(),
            expected
        );
    }

    #[test]
    fn test_named_access_finds_every_field(record in strategies::record()) {
        for (name, value) in record.iter() {
            prop_assert_eq!(
                record.get_with_value_index(&Value::from(name.as_str())).unwrap(),
                Some(value)
            );
        }
    }

    #[test]
    fn test_infer_reads_back_ints(i in any::<i64>()) {
        prop_assert_eq!(Value::infer(&i.to_string()), Value::Int(i));
    }
}
