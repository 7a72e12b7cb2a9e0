// Copyright (c) 2025 - Cowboy AI, Inc.
//! Result combinators
//!
//! `std::result::Result` already provides `map` and `and_then` (flat-map).
//! This module adds the applicative `apply`, the optional accessors used by
//! signal subscribers, and synchronous stage composition.
//!
//! # Failure Precedence
//!
//! `apply` inspects the wrapped function first. When both the function and the
//! value are failures, the function's failure is returned.
//!
//! ```rust,ignore
//! use cim_conduit::fp::{compose, ResultExt};
//!
//! let parse = |s: &str| s.parse::<i32>().map_err(|e| e.to_string());
//! let positive = |n: i32| if n > 0 { Ok(n) } else { Err("not positive".to_string()) };
//!
//! let stage = compose(parse, positive);
//! assert_eq!(stage("7"), Ok(7));
//! assert!(stage("-7").failure_value().is_some());
//! ```

/// Extension combinators for `Result`
pub trait ResultExt<T, E> {
    /// The success value, if this result is a success
    fn success_value(&self) -> Option<&T>;

    /// The failure reason, if this result is a failure
    fn failure_value(&self) -> Option<&E>;

    /// Apply a wrapped function to this wrapped value
    ///
    /// Fails if either side failed; the function side is checked first.
    fn apply<U, F>(self, f: Result<F, E>) -> Result<U, E>
    where
        F: FnOnce(T) -> U;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn success_value(&self) -> Option<&T> {
        self.as_ref().ok()
    }

    fn failure_value(&self) -> Option<&E> {
        self.as_ref().err()
    }

    fn apply<U, F>(self, f: Result<F, E>) -> Result<U, E>
    where
        F: FnOnce(T) -> U,
    {
        f.and_then(|func| self.map(func))
    }
}

/// Wrap a value in a successful result
pub fn pure<T, E>(value: T) -> Result<T, E> {
    Ok(value)
}

/// Lift a plain value into a successful result
///
/// Alias of [`pure`], used when promoting the output of an infallible
/// function into a stage.
pub fn lift<T, E>(value: T) -> Result<T, E> {
    Ok(value)
}

/// Compose two synchronous stages left to right
///
/// The returned stage runs `left`, and only on success feeds its output into
/// `right`. A failure from `left` is returned without invoking `right`.
pub fn compose<A, B, C, E, L, R>(left: L, right: R) -> impl Fn(A) -> Result<C, E> + Clone
where
    L: Fn(A) -> Result<B, E> + Clone,
    R: Fn(B) -> Result<C, E> + Clone,
{
    move |input| left(input).and_then(&right)
}
