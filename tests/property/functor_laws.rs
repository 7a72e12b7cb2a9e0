// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Functor Laws
//!
//! For both Result and Deferred:
//! - Identity: `x.map(id) == x`
//! - Composition: `x.map(f).map(g) == x.map(|v| g(f(v)))`

use crate::common::outcome;
use cim_conduit::{ConduitError, Deferred};
use proptest::prelude::*;

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Generate successes and failures
fn result_strategy() -> impl Strategy<Value = Result<i64, ConduitError>> {
    prop_oneof![
        any::<i64>().prop_map(Ok),
        "[a-z]{1,8}".prop_map(|reason| Err(ConduitError::Transport(reason))),
    ]
}

fn add(offset: i64) -> impl Fn(i64) -> i64 + Clone + Send + Sync + 'static {
    move |x| x.wrapping_add(offset)
}

fn scale(factor: i64) -> impl Fn(i64) -> i64 + Clone + Send + Sync + 'static {
    move |x| x.wrapping_mul(factor)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: mapping the identity leaves a Result unchanged
    #[test]
    fn prop_result_identity(result in result_strategy()) {
        prop_assert_eq!(result.clone().map(|x| x), result);
    }

    /// Property: mapping twice equals mapping the composition
    #[test]
    fn prop_result_composition(
        result in result_strategy(),
        offset in any::<i64>(),
        factor in any::<i64>(),
    ) {
        let (f, g) = (add(offset), scale(factor));
        let stepwise = result.clone().map(&f).map(&g);
        let composed = result.map(|x| g(f(x)));
        prop_assert_eq!(stepwise, composed);
    }

    /// Property: mapping the identity leaves a Deferred's outcome unchanged
    #[test]
    fn prop_deferred_identity(result in result_strategy()) {
        let deferred = Deferred::from_result(result.clone()).map(|x| x);
        prop_assert_eq!(outcome(&deferred), result);
    }

    /// Property: Deferred map composition matches Result map composition
    #[test]
    fn prop_deferred_composition(
        result in result_strategy(),
        offset in any::<i64>(),
        factor in any::<i64>(),
    ) {
        let (f, g) = (add(offset), scale(factor));
        let composed_fn = {
            let (f, g) = (f.clone(), g.clone());
            move |x| g(f(x))
        };

        let stepwise = Deferred::from_result(result.clone()).map(f).map(g);
        let composed = Deferred::from_result(result).map(composed_fn);
        prop_assert_eq!(outcome(&stepwise), outcome(&composed));
    }

    /// Property: a Deferred built from a value completes exactly once with it
    #[test]
    fn prop_value_completes_once(value in any::<i64>()) {
        let deferred = Deferred::<i64>::value(value);
        prop_assert_eq!(crate::common::outcomes(&deferred), vec![Ok(value)]);
    }
}
