// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stage Composition
//!
//! A stage is any function `A -> Result<B, E>` (synchronous) or
//! `A -> Deferred<B, E>` (asynchronous). This module composes stages left to
//! right into a single `A -> Deferred<C, E>` function.
//!
//! # Available Combinators
//!
//! - [`compose`](super::compose) - two synchronous stages, result stays synchronous
//! - [`chain`] - any two stages, result is asynchronous
//! - [`Pipeline`] - builder for chaining many stages
//!
//! # Lifting
//!
//! When either side is asynchronous, the synchronous side is lifted into a
//! Deferred that resolves immediately ([`IntoDeferred`]). Composition then
//! flat-maps, so the first failing stage short-circuits everything after it.
//!
//! ```text
//! A ──stage1──> Result<B>  ─┐
//!                           ├─ lift + flat_map ─> Deferred<C>
//! B ──stage2──> Deferred<C> ┘
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use cim_conduit::fp::{Deferred, Pipeline};
//!
//! let pipeline = Pipeline::start(|raw: String| raw.parse::<i32>().map_err(|_| ConduitError::NoPayload))
//!     .then(|n: i32| Deferred::value(n + 1))
//!     .then(|n: i32| Ok::<_, ConduitError>(n * 2));
//!
//! pipeline.call("20".to_string()).run(|result| assert_eq!(result, Ok(42)));
//! ```

use super::deferred::{Completion, Deferred};
use crate::errors::ConduitError;
use std::any::type_name;
use std::sync::Arc;

/// Conversion of a stage's output into a Deferred
pub trait IntoDeferred {
    /// Success type
    type Output: Send + 'static;
    /// Failure type
    type Error: Send + 'static;

    /// Lift into a Deferred
    fn into_deferred(self) -> Deferred<Self::Output, Self::Error>;
}

impl<T, E> IntoDeferred for Result<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = T;
    type Error = E;

    fn into_deferred(self) -> Deferred<T, E> {
        Deferred::from_result(self)
    }
}

impl<T: Send + 'static, E: Send + 'static> IntoDeferred for Deferred<T, E> {
    type Output = T;
    type Error = E;

    fn into_deferred(self) -> Deferred<T, E> {
        self
    }
}

/// Compose two stages left to right into one asynchronous stage
///
/// `right` is only invoked when `left` succeeded.
pub fn chain<A, L, R, LR, RR>(
    left: L,
    right: R,
) -> impl Fn(A) -> Deferred<RR::Output, RR::Error> + Clone + Send + Sync + 'static
where
    A: 'static,
    L: Fn(A) -> LR + Clone + Send + Sync + 'static,
    LR: IntoDeferred,
    R: Fn(LR::Output) -> RR + Send + Sync + 'static,
    RR: IntoDeferred<Error = LR::Error>,
{
    let right = Arc::new(right);
    move |input| {
        let right = Arc::clone(&right);
        left(input)
            .into_deferred()
            .flat_map(move |value| right(value).into_deferred())
    }
}

type StageFn<In, Out, E> = Arc<dyn Fn(In) -> Deferred<Out, E> + Send + Sync>;

/// Readable label for a stage type
///
/// Strips module paths, generic arguments and closure markers, so
/// `crate::rest::request::add_method::{{closure}}` becomes `add_method`.
fn stage_label<F: ?Sized>() -> String {
    let full = type_name::<F>();
    let base = full.split('<').next().unwrap_or(full);
    let base = base.trim_end_matches("::{{closure}}");
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// A chain of stages from `In` to `Out`
///
/// Each call of [`Pipeline::call`] produces a fresh Deferred. No stage runs
/// until that Deferred is run, and every run executes every stage once, left
/// to right, starting again from the captured input.
pub struct Pipeline<In, Out, E = ConduitError> {
    stage: StageFn<In, Out, E>,
    stages: Vec<String>,
}

impl<In, Out, E> Clone for Pipeline<In, Out, E> {
    fn clone(&self) -> Self {
        Self {
            stage: Arc::clone(&self.stage),
            stages: self.stages.clone(),
        }
    }
}

impl<In, Out, E> std::fmt::Debug for Pipeline<In, Out, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages)
            .finish()
    }
}

impl<In, Out, E> Pipeline<In, Out, E>
where
    In: Clone + Send + Sync + 'static,
    Out: Send + 'static,
    E: Send + 'static,
{
    /// Start a pipeline with its first stage
    pub fn start<F, R>(stage: F) -> Self
    where
        F: Fn(In) -> R + Send + Sync + 'static,
        R: IntoDeferred<Output = Out, Error = E>,
    {
        let stages = vec![stage_label::<F>()];
        let stage = Arc::new(stage);
        Self {
            stage: Arc::new(move |input: In| {
                let stage = Arc::clone(&stage);
                Deferred::new(move |completion: Completion<Out, E>| {
                    stage(input.clone()).into_deferred().run(completion)
                })
            }),
            stages,
        }
    }

    /// Append a stage
    pub fn then<F, R>(self, stage: F) -> Pipeline<In, R::Output, E>
    where
        F: Fn(Out) -> R + Send + Sync + 'static,
        R: IntoDeferred<Error = E>,
    {
        let Pipeline {
            stage: previous,
            mut stages,
        } = self;
        stages.push(stage_label::<F>());

        let next = Arc::new(stage);
        Pipeline {
            stage: Arc::new(move |input| {
                let next = Arc::clone(&next);
                previous(input).flat_map(move |value| next(value).into_deferred())
            }),
            stages,
        }
    }

    /// Invoke the pipeline, producing one Deferred
    pub fn call(&self, input: In) -> Deferred<Out, E> {
        (self.stage)(input)
    }

    /// Labels of the composed stages, in execution order
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    /// Turn the pipeline back into a plain stage function
    pub fn into_stage(self) -> impl Fn(In) -> Deferred<Out, E> + Clone + Send + Sync + 'static {
        let stage = self.stage;
        move |input| stage(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn parse(raw: String) -> Result<i32, ConduitError> {
        raw.parse::<i32>()
            .map_err(|e| ConduitError::PayloadDecode(e.to_string()))
    }

    fn outcome<T: Send + 'static>(deferred: Deferred<T>) -> Vec<Result<T, ConduitError>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        deferred.run(move |result| sink.lock().push(result));
        let results = std::mem::take(&mut *seen.lock());
        results
    }

    #[test]
    fn test_chain_sync_then_async() {
        let stage = chain(parse, |n: i32| Deferred::value(n + 1));
        assert_eq!(outcome(stage("41".to_string())), vec![Ok(42)]);
    }

    #[test]
    fn test_chain_async_then_sync() {
        let stage = chain(
            |n: i32| Deferred::<i32>::value(n * 2),
            |n: i32| Ok::<_, ConduitError>(n.to_string()),
        );
        assert_eq!(outcome(stage(21)), vec![Ok("42".to_string())]);
    }

    #[test]
    fn test_pipeline_short_circuits_on_first_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let pipeline = Pipeline::start(parse).then(move |n: i32| {
            counter.fetch_add(1, Ordering::SeqCst);
            Deferred::value(n)
        });

        let results = outcome(pipeline.call("not a number".to_string()));
        assert!(matches!(results.as_slice(), [Err(ConduitError::PayloadDecode(_))]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_pipeline_runs_each_stage_once_per_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let pipeline = Pipeline::start(move |n: i32| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ConduitError>(n)
        })
        .then(|n: i32| Deferred::value(n + 1));

        let deferred = pipeline.call(1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(outcome(deferred), vec![Ok(2)]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rerun_repeats_first_stage() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let (first_counter, second_counter) = (Arc::clone(&first), Arc::clone(&second));

        let pipeline = Pipeline::start(move |n: i32| {
            first_counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ConduitError>(n)
        })
        .then(move |n: i32| {
            second_counter.fetch_add(1, Ordering::SeqCst);
            Deferred::value(n * 10)
        });

        let deferred = pipeline.call(4);
        assert_eq!(outcome(deferred.clone()), vec![Ok(40)]);
        assert_eq!(outcome(deferred), vec![Ok(40)]);

        assert_eq!(first.load(Ordering::SeqCst), 2);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_pipeline_stage_labels() {
        let pipeline = Pipeline::start(parse).then(|n: i32| Ok::<_, ConduitError>(n));
        assert_eq!(pipeline.stages()[0], "parse");
        assert_eq!(pipeline.stages().len(), 2);
    }

    #[test]
    fn test_into_stage_composes_further() {
        let inner = Pipeline::start(parse).into_stage();
        let outer = chain(inner, |n: i32| Ok::<_, ConduitError>(n * 2));
        assert_eq!(outcome(outer("4".to_string())), vec![Ok(8)]);
    }
}
