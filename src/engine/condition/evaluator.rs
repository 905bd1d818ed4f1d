//! Condition tree evaluator
//!
//! Evaluation is total: a missing or uncoercible event value makes the
//! condition false, never an error. Conditions and groups fold strictly left
//! to right, so `[C1, C2, C3]` with `[AND, OR]` is `(C1 AND C2) OR C3`.

use serde::Serialize;
use std::cmp::Ordering;

use super::ast::{LogicalOperator, StakeholderRule};
use super::parser::{compile, CompiledCondition, CompiledGroup, CompiledRule, Predicate};
use crate::engine::error::ValidationError;
use crate::engine::event::{EventRecord, Slot, TypedEvent};
use crate::engine::registry::{FieldRegistry, Operator};
use crate::engine::value::TypedValue;

/// Result of checking one condition against one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Met,
    NotMet,
    /// The event does not carry the field
    Missing,
    /// The event value does not coerce to the field's type
    Uncoercible,
    /// The configured value does not coerce to the field's type
    InvalidValue,
}

impl Outcome {
    pub fn holds(self) -> bool {
        self == Outcome::Met
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionEvaluation {
    pub field: String,
    pub operator: Operator,
    pub label: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupEvaluation {
    pub result: bool,
    pub conditions: Vec<ConditionEvaluation>,
}

/// Why a stakeholder is or is not required for an event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub role: String,
    pub required: bool,
    pub groups: Vec<GroupEvaluation>,
}

/// Decide whether the rule's stakeholder must act on `event`
pub fn evaluate(event: &TypedEvent, rule: &CompiledRule) -> bool {
    if rule.is_unconditional() {
        return true;
    }
    let required = fold_left(
        rule.groups.iter().map(|group| evaluate_group(event, group)),
        &rule.joiners,
    );
    log::debug!("Rule for '{}' evaluated to {}", rule.role, required);
    required
}

/// Validate, ingest and evaluate in one call
pub fn evaluate_rule(
    record: &EventRecord,
    rule: &StakeholderRule,
    registry: &FieldRegistry,
) -> Result<bool, ValidationError> {
    let compiled = compile(rule, registry)?;
    let event = TypedEvent::ingest(record, registry);
    Ok(evaluate(&event, &compiled))
}

/// Evaluate and keep every condition's outcome
pub fn explain(event: &TypedEvent, rule: &CompiledRule) -> Evaluation {
    let groups: Vec<GroupEvaluation> = rule
        .groups
        .iter()
        .map(|group| explain_group(event, group))
        .collect();

    let results = groups.iter().map(|g| g.result);
    let required = rule.is_unconditional() || fold_left(results, &rule.joiners);

    Evaluation {
        role: rule.role.clone(),
        required,
        groups,
    }
}

fn explain_group(event: &TypedEvent, group: &CompiledGroup) -> GroupEvaluation {
    let conditions: Vec<ConditionEvaluation> = group
        .conditions
        .iter()
        .map(|condition| ConditionEvaluation {
            field: condition.field.clone(),
            operator: condition.operator,
            label: format!("{} {}", condition.field, condition.operator.label()),
            outcome: check_condition(event, condition),
        })
        .collect();

    let holds = conditions.iter().map(|c| c.outcome.holds());
    let result = fold_left(holds, &group.joiners);
    GroupEvaluation { result, conditions }
}

fn evaluate_group(event: &TypedEvent, group: &CompiledGroup) -> bool {
    let holds = group
        .conditions
        .iter()
        .map(|condition| check_condition(event, condition).holds());
    fold_left(holds, &group.joiners)
}

fn fold_left(results: impl IntoIterator<Item = bool>, joiners: &[LogicalOperator]) -> bool {
    let mut results = results.into_iter();
    let Some(first) = results.next() else {
        return false;
    };
    results
        .zip(joiners)
        .fold(first, |acc, (next, joiner)| joiner.apply(acc, next))
}

fn check_condition(event: &TypedEvent, condition: &CompiledCondition) -> Outcome {
    let value = match event.slot(&condition.field) {
        None => return Outcome::Missing,
        Some(Slot::Uncoercible(_)) => return Outcome::Uncoercible,
        Some(Slot::Value(value)) => value,
    };
    match &condition.predicate {
        None => Outcome::InvalidValue,
        Some(predicate) if holds(predicate, value) => Outcome::Met,
        Some(_) => Outcome::NotMet,
    }
}

fn holds(predicate: &Predicate, value: &TypedValue) -> bool {
    let above = |bound: &TypedValue| value.compare(bound).is_some_and(Ordering::is_gt);
    let below = |bound: &TypedValue| value.compare(bound).is_some_and(Ordering::is_lt);
    let at_least = |bound: &TypedValue| value.compare(bound).is_some_and(Ordering::is_ge);
    let at_most = |bound: &TypedValue| value.compare(bound).is_some_and(Ordering::is_le);

    match predicate {
        Predicate::Equals(expected) => value.matches(expected),
        Predicate::NotEquals(expected) => !value.matches(expected),
        Predicate::Contains(needle) => value.contains(needle).unwrap_or(false),
        Predicate::NotContains(needle) => value.contains(needle).map(|c| !c).unwrap_or(false),
        Predicate::In(options) => options.iter().any(|o| value.matches(o)),
        Predicate::NotIn(options) => !options.iter().any(|o| value.matches(o)),
        Predicate::GreaterThan(bound) | Predicate::After(bound) => above(bound),
        Predicate::LessThan(bound) | Predicate::Before(bound) => below(bound),
        Predicate::GreaterThanOrEqual(bound) => at_least(bound),
        Predicate::LessThanOrEqual(bound) => at_most(bound),
        Predicate::Between(low, high) => at_least(low) && at_most(high),
    }
}
