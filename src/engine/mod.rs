// SPDX-License-Identifier: MIT

//! The rule engine: field registry, condition trees, typed values and the
//! evaluator. Everything here is synchronous and free of shared state.

pub mod condition;
pub mod error;
pub mod event;
pub mod registry;
pub mod value;
