// Copyright (c) 2025 - Cowboy AI, Inc.
//! Functional Asynchrony Abstractions
//!
//! This module provides the small set of types every conduit pipeline is built
//! from. Each one is a functor over its success value, and the combinators
//! follow the classical laws so that stages can be rearranged safely.
//!
//! # Core Concepts
//!
//! ## Result<T, E>
//!
//! The standard library `Result`, extended by [`ResultExt`] with `apply` and the
//! `success_value` / `failure_value` accessors. A synchronous stage is a
//! function `A -> Result<B, E>`.
//!
//! ## Deferred<T, E>
//!
//! A lazy computation that eventually hands a `Result<T, E>` to a completion
//! callback. Nothing happens until [`Deferred::run`] is called, and every call
//! runs the operation again.
//!
//! ```text
//! Deferred::run(completion)
//!     │
//!     ▼
//! operation ──(any thread, any time)──> completion(Result<T, E>)
//! ```
//!
//! ## Signal<T, E>
//!
//! A replay-latest broadcaster. Subscribers receive the most recent event
//! immediately and every later event in publish order.
//!
//! ```text
//! publish:     ●1      ●2            ●3
//! early sub:   ●1      ●2            ●3
//! late sub:                ●2(replay) ●3
//! ```
//!
//! ## Stages and Pipelines
//!
//! Stages returning either `Result` or `Deferred` compose left to right with
//! [`compose`], [`chain`] or [`Pipeline::then`]. The first failure
//! short-circuits the rest of the pipeline.
//!
//! # Laws
//!
//! ## Functor Laws
//!
//! ```text
//! map id = id
//! map (g . f) = map g . map f
//! ```
//!
//! ## Monad Associativity
//!
//! ```text
//! (m >>= f) >>= g = m >>= (\x -> f x >>= g)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_conduit::fp::*;
//!
//! let pipeline = Pipeline::start(|n: i32| Ok::<_, ConduitError>(n + 1))
//!     .then(|n: i32| Deferred::value(n * 2));
//!
//! pipeline.call(20).run(|result| assert_eq!(result, Ok(42)));
//! ```

pub mod deferred;
pub mod result;
pub mod signal;
pub mod stage;

pub use deferred::{CancelToken, Completion, Deferred};
pub use result::{compose, lift, pure, ResultExt};
pub use signal::{Signal, Subscription, SubscriptionId};
pub use stage::{chain, IntoDeferred, Pipeline};
