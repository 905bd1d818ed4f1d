// SPDX-License-Identifier: MIT

//! Condition trees for stakeholder rules
//!
//! This module provides the persisted tree shapes, their validation and
//! lowering to typed predicates, and the evaluator. A rule reads like:
//! - `location equals 'Heffner Alumni House'`
//! - `expectedAttendance greaterThanOrEqual 100`
//! - `(location equals 'Union' AND catering equals true) OR expectedAttendance greaterThan 50`

mod ast;
mod evaluator;
mod parser;

pub use ast::{Condition, ConditionGroup, LogicalOperator, StakeholderRule};
pub use evaluator::{
    evaluate, evaluate_rule, explain, ConditionEvaluation, Evaluation, GroupEvaluation, Outcome,
};
pub use parser::{
    compile, validate, CompiledCondition, CompiledGroup, CompiledRule, Predicate,
};
