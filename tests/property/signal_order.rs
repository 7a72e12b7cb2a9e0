// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Signal Delivery Order
//!
//! A subscriber that joins after `k` publishes receives the latest of those
//! `k` events (if any), followed by every later event in publish order.

use cim_conduit::{ConduitError, Signal};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;

proptest! {
    /// Property: replay-latest followed by publish order
    #[test]
    fn prop_replay_then_publish_order(
        events in prop::collection::vec(any::<i32>(), 0..40),
        split in any::<prop::sample::Index>(),
    ) {
        let k = split.index(events.len() + 1);
        let (before, after) = events.split_at(k);

        let signal = Signal::<i32>::new();
        for value in before {
            signal.publish_value(*value);
        }

        let seen: Arc<Mutex<Vec<Result<i32, ConduitError>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = signal.subscribe(move |event| sink.lock().push(event));

        for value in after {
            signal.publish_value(*value);
        }

        let mut expected: Vec<Result<i32, ConduitError>> = before.last().map(|v| Ok(*v)).into_iter().collect();
        expected.extend(after.iter().map(|v| Ok(*v)));

        prop_assert_eq!(seen.lock().clone(), expected);
        prop_assert_eq!(signal.last_event(), events.last().map(|v| Ok(*v)));
    }

    /// Property: every live subscriber receives every event exactly once
    #[test]
    fn prop_fan_out(
        events in prop::collection::vec(any::<u16>(), 1..20),
        subscribers in 1usize..6,
    ) {
        let signal = Signal::<u16>::new();
        let counts: Vec<Arc<Mutex<usize>>> = (0..subscribers).map(|_| Arc::new(Mutex::new(0))).collect();
        let _subscriptions: Vec<_> = counts
            .iter()
            .map(|count| {
                let count = Arc::clone(count);
                signal.subscribe(move |_| *count.lock() += 1)
            })
            .collect();

        for value in &events {
            signal.publish_value(*value);
        }

        for count in &counts {
            prop_assert_eq!(*count.lock(), events.len());
        }
    }
}
