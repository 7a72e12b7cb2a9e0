// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Flat-Map and Composition Laws
//!
//! - Left identity: `value(a).flat_map(f) == f(a)`
//! - Right identity: `m.flat_map(value) == m`
//! - Associativity: `m.flat_map(f).flat_map(g) == m.flat_map(|x| f(x).flat_map(g))`
//! - Stage composition is associative and `chain` agrees with `compose`

use crate::common::outcome;
use cim_conduit::fp::{chain, compose};
use cim_conduit::{ConduitError, Deferred};
use proptest::prelude::*;

// ============================================================================
// Test Stages
// ============================================================================

/// A stage that fails on multiples of `divisor` and otherwise adds `offset`
fn step(
    divisor: i64,
    offset: i64,
) -> impl Fn(i64) -> Result<i64, ConduitError> + Clone + Send + Sync + 'static {
    move |x| {
        if x.rem_euclid(divisor) == 0 {
            Err(ConduitError::DomainObjectBuild(format!(
                "{} is divisible by {}",
                x, divisor
            )))
        } else {
            Ok(x.wrapping_add(offset))
        }
    }
}

/// Asynchronous form of [`step`]
fn deferred_step(
    divisor: i64,
    offset: i64,
) -> impl Fn(i64) -> Deferred<i64> + Clone + Send + Sync + 'static {
    let stage = step(divisor, offset);
    move |x| Deferred::from_result(stage(x))
}

// ============================================================================
// Property Test Strategies
// ============================================================================

fn result_strategy() -> impl Strategy<Value = Result<i64, ConduitError>> {
    prop_oneof![
        (-1_000i64..1_000).prop_map(Ok),
        "[a-z]{1,8}".prop_map(|reason| Err(ConduitError::Transport(reason))),
    ]
}

fn stage_params() -> impl Strategy<Value = (i64, i64)> {
    (2i64..7, -50i64..50)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: lifting a value and flat-mapping equals calling the stage
    #[test]
    fn prop_left_identity(value in -1_000i64..1_000, (d, o) in stage_params()) {
        let f = deferred_step(d, o);
        let lifted = Deferred::value(value).flat_map(f.clone());
        prop_assert_eq!(outcome(&lifted), outcome(&f(value)));
    }

    /// Property: flat-mapping into value is a no-op
    #[test]
    fn prop_right_identity(result in result_strategy()) {
        let deferred = Deferred::from_result(result.clone()).flat_map(Deferred::value);
        prop_assert_eq!(outcome(&deferred), result);
    }

    /// Property: flat_map is associative for Deferred
    #[test]
    fn prop_deferred_associativity(
        result in result_strategy(),
        (d1, o1) in stage_params(),
        (d2, o2) in stage_params(),
    ) {
        let (f, g) = (deferred_step(d1, o1), deferred_step(d2, o2));

        let left = Deferred::from_result(result.clone())
            .flat_map(f.clone())
            .flat_map(g.clone());
        let right = Deferred::from_result(result)
            .flat_map(move |x| f(x).flat_map(g.clone()));

        prop_assert_eq!(outcome(&left), outcome(&right));
    }

    /// Property: and_then is associative for Result
    #[test]
    fn prop_result_associativity(
        result in result_strategy(),
        (d1, o1) in stage_params(),
        (d2, o2) in stage_params(),
    ) {
        let (f, g) = (step(d1, o1), step(d2, o2));
        let left = result.clone().and_then(&f).and_then(&g);
        let right = result.and_then(|x| f(x).and_then(&g));
        prop_assert_eq!(left, right);
    }

    /// Property: stage composition is associative
    #[test]
    fn prop_compose_associativity(
        input in -1_000i64..1_000,
        (d1, o1) in stage_params(),
        (d2, o2) in stage_params(),
        (d3, o3) in stage_params(),
    ) {
        let (f, g, h) = (step(d1, o1), step(d2, o2), step(d3, o3));
        let left = compose(compose(f.clone(), g.clone()), h.clone());
        let right = compose(f, compose(g, h));
        prop_assert_eq!(left(input), right(input));
    }

    /// Property: asynchronous chaining agrees with synchronous composition
    #[test]
    fn prop_chain_matches_compose(
        input in -1_000i64..1_000,
        (d1, o1) in stage_params(),
        (d2, o2) in stage_params(),
    ) {
        let sync = compose(step(d1, o1), step(d2, o2));
        let mixed = chain(step(d1, o1), deferred_step(d2, o2));
        prop_assert_eq!(outcome(&mixed(input)), sync(input));
    }
}
