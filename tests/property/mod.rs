// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! - `functor_laws` - identity and composition for `map`
//! - `monad_laws` - `flat_map` associativity and unit laws, composition
//! - `signal_order` - replay and delivery order for arbitrary publish sequences

mod functor_laws;
mod monad_laws;
mod signal_order;
