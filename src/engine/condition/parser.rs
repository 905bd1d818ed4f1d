// SPDX-License-Identifier: MIT

//! Parse persisted condition trees into validated, typed rules
//!
//! Structural problems are reported as `ValidationError`s. Values that merely
//! fail to coerce to the field's type are not errors: the condition compiles
//! to one that never holds.

use serde_json::Value;

use super::ast::{ConditionGroup, LogicalOperator, StakeholderRule};
use crate::engine::error::{Arity, OperatorScope, ValidationError};
use crate::engine::registry::{FieldRegistry, FieldType, Operator};
use crate::engine::value::TypedValue;

/// One comparison with its operand already coerced to the field's type
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(TypedValue),
    NotEquals(TypedValue),
    Contains(TypedValue),
    NotContains(TypedValue),
    In(Vec<TypedValue>),
    NotIn(Vec<TypedValue>),
    GreaterThan(TypedValue),
    LessThan(TypedValue),
    GreaterThanOrEqual(TypedValue),
    LessThanOrEqual(TypedValue),
    Before(TypedValue),
    After(TypedValue),
    Between(TypedValue, TypedValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCondition {
    pub field: String,
    pub field_type: FieldType,
    pub operator: Operator,
    /// `None` when the configured value did not coerce; never satisfied
    pub predicate: Option<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledGroup {
    pub conditions: Vec<CompiledCondition>,
    pub joiners: Vec<LogicalOperator>,
}

/// A stakeholder rule that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub role: String,
    pub groups: Vec<CompiledGroup>,
    pub joiners: Vec<LogicalOperator>,
}

impl CompiledRule {
    pub fn is_unconditional(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Check a rule against the registry without keeping the compiled form
pub fn validate(rule: &StakeholderRule, registry: &FieldRegistry) -> Result<(), ValidationError> {
    compile(rule, registry).map(|_| ())
}

/// Validate a rule and lower it to typed predicates
pub fn compile(
    rule: &StakeholderRule,
    registry: &FieldRegistry,
) -> Result<CompiledRule, ValidationError> {
    check_joiner_count(
        OperatorScope::Rule,
        rule.condition_groups.len(),
        rule.group_logical_operators.len(),
    )?;

    let groups = rule
        .condition_groups
        .iter()
        .enumerate()
        .map(|(i, group)| compile_group(i, group, registry))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CompiledRule {
        role: rule.role.clone(),
        groups,
        joiners: rule.group_logical_operators.clone(),
    })
}

fn check_joiner_count(
    scope: OperatorScope,
    items: usize,
    found: usize,
) -> Result<(), ValidationError> {
    let expected = items.saturating_sub(1);
    if expected != found {
        return Err(ValidationError::OperatorCountMismatch {
            scope,
            expected,
            found,
        });
    }
    Ok(())
}

fn compile_group(
    index: usize,
    group: &ConditionGroup,
    registry: &FieldRegistry,
) -> Result<CompiledGroup, ValidationError> {
    if group.conditions.is_empty() {
        return Err(ValidationError::EmptyConditionsInNonEmptyGroup { group: index });
    }
    check_joiner_count(
        OperatorScope::Group(index),
        group.conditions.len(),
        group.condition_logical_operators.len(),
    )?;

    let mut conditions = Vec::with_capacity(group.conditions.len());
    for (c, condition) in group.conditions.iter().enumerate() {
        let Ok(field) = registry.resolve_field(&condition.field) else {
            return Err(ValidationError::UnknownField {
                group: index,
                condition: c,
                field: condition.field.clone(),
            });
        };
        let Ok(allowed) = registry.operators_for(field.field_type) else {
            return Err(ValidationError::UnknownType {
                group: index,
                condition: c,
                field_type: field.field_type,
            });
        };
        let Some(operator) = parse_allowed(&condition.operator, allowed) else {
            return Err(ValidationError::OperatorNotAllowedForType {
                group: index,
                condition: c,
                operator: condition.operator.clone(),
                field_type: field.field_type,
            });
        };
        if !arity_matches(operator.arity(), &condition.value) {
            return Err(ValidationError::ValueArityMismatch {
                group: index,
                condition: c,
                operator,
                expected: operator.arity(),
            });
        }

        let predicate = build_predicate(operator, &condition.value, field.field_type);
        if predicate.is_none() {
            log::warn!(
                "Condition {}.{} on '{}': value {} does not coerce to {}; it will never hold",
                index,
                c,
                field.name,
                condition.value,
                field.field_type
            );
        }
        conditions.push(CompiledCondition {
            field: field.name.clone(),
            field_type: field.field_type,
            operator,
            predicate,
        });
    }

    Ok(CompiledGroup {
        conditions,
        joiners: group.condition_logical_operators.clone(),
    })
}

fn parse_allowed(token: &str, allowed: &[Operator]) -> Option<Operator> {
    token.parse().ok().filter(|op| allowed.contains(op))
}

/// A missing value (`null`) never satisfies a single-value operator
fn arity_matches(arity: Arity, value: &Value) -> bool {
    match (arity, value) {
        (Arity::Single, Value::Null | Value::Array(_) | Value::Object(_)) => false,
        (Arity::Single, _) => true,
        (Arity::Set, Value::Array(items)) => !items.is_empty(),
        (Arity::Range, Value::Array(items)) => items.len() == 2,
        _ => false,
    }
}

fn build_predicate(operator: Operator, value: &Value, field_type: FieldType) -> Option<Predicate> {
    let single = || TypedValue::coerce(value, field_type);
    let set = || -> Option<Vec<TypedValue>> {
        value
            .as_array()?
            .iter()
            .map(|item| TypedValue::coerce(item, field_type))
            .collect()
    };

    let predicate = match operator {
        Operator::Equals => Predicate::Equals(single()?),
        Operator::NotEquals => Predicate::NotEquals(single()?),
        Operator::Contains => Predicate::Contains(single()?),
        Operator::NotContains => Predicate::NotContains(single()?),
        Operator::In => Predicate::In(set()?),
        Operator::NotIn => Predicate::NotIn(set()?),
        Operator::GreaterThan => Predicate::GreaterThan(single()?),
        Operator::LessThan => Predicate::LessThan(single()?),
        Operator::GreaterThanOrEqual => Predicate::GreaterThanOrEqual(single()?),
        Operator::LessThanOrEqual => Predicate::LessThanOrEqual(single()?),
        Operator::Before => Predicate::Before(single()?),
        Operator::After => Predicate::After(single()?),
        Operator::Between => {
            let mut bounds = set()?.into_iter();
            let low = bounds.next()?;
            let high = bounds.next()?;
            Predicate::Between(low, high)
        }
    };
    Some(predicate)
}
