// SPDX-License-Identifier: MIT

//! Condition trees as persisted by the admin UI
//!
//! A rule is a list of condition groups; a group is a list of conditions.
//! Both lists are joined by per-pair logical operators, so the operator list
//! is always one shorter than the list it joins. The editing methods below
//! keep that invariant.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::engine::error::RegistryError;
use crate::engine::registry::{FieldDefinition, FieldRegistry, Operator};

/// Joiner between two adjacent conditions or groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
pub enum LogicalOperator {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl LogicalOperator {
    pub fn apply(self, left: bool, right: bool) -> bool {
        match self {
            LogicalOperator::And => left && right,
            LogicalOperator::Or => left || right,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "AND"),
            LogicalOperator::Or => write!(f, "OR"),
        }
    }
}

/// A single field/operator/value comparison
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Condition {
    pub field: String,
    /// Operator token; checked against the field's type during validation
    pub operator: String,
    /// Scalar, or an array for `in`/`notIn`/`between`
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator: operator.token().to_string(),
            value,
        }
    }

    /// Fresh condition for `field`: first allowed operator, empty value
    pub fn default_for(
        field: &FieldDefinition,
        registry: &FieldRegistry,
    ) -> Result<Self, RegistryError> {
        let operator = registry
            .operators_for(field.field_type)?
            .first()
            .copied()
            .unwrap_or(Operator::Equals);
        let value = Value::String(String::new());
        Ok(Self::new(field.name.clone(), operator, value))
    }
}

/// Conditions joined left to right by `condition_logical_operators`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub condition_logical_operators: Vec<LogicalOperator>,
}

impl ConditionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(condition: Condition) -> Self {
        Self {
            conditions: vec![condition],
            condition_logical_operators: vec![],
        }
    }

    /// Builder form of `push_condition`
    pub fn then(mut self, joiner: LogicalOperator, condition: Condition) -> Self {
        self.push_condition(condition, joiner);
        self
    }

    /// Append a condition; `joiner` links it to the previous one and is
    /// ignored for the first condition.
    pub fn push_condition(&mut self, condition: Condition, joiner: LogicalOperator) {
        if !self.conditions.is_empty() {
            self.condition_logical_operators.push(joiner);
        }
        self.conditions.push(condition);
    }

    /// Remove a condition together with the joiner in front of it (or the
    /// one after it, for the first condition).
    pub fn remove_condition(&mut self, index: usize) -> Option<Condition> {
        if index >= self.conditions.len() {
            return None;
        }
        remove_joiner(&mut self.condition_logical_operators, index);
        Some(self.conditions.remove(index))
    }

    /// Replace the joiner between condition `index` and `index + 1`
    pub fn set_joiner(&mut self, index: usize, joiner: LogicalOperator) -> bool {
        match self.condition_logical_operators.get_mut(index) {
            Some(slot) => {
                *slot = joiner;
                true
            }
            None => false,
        }
    }
}

/// The condition tree deciding whether one stakeholder role participates
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StakeholderRule {
    pub role: String,
    #[serde(default)]
    pub condition_groups: Vec<ConditionGroup>,
    #[serde(default)]
    pub group_logical_operators: Vec<LogicalOperator>,
}

impl StakeholderRule {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            ..Default::default()
        }
    }

    /// Builder form of `push_group`
    pub fn with_group(mut self, joiner: LogicalOperator, group: ConditionGroup) -> Self {
        self.push_group(group, joiner);
        self
    }

    pub fn push_group(&mut self, group: ConditionGroup, joiner: LogicalOperator) {
        if !self.condition_groups.is_empty() {
            self.group_logical_operators.push(joiner);
        }
        self.condition_groups.push(group);
    }

    pub fn remove_group(&mut self, index: usize) -> Option<ConditionGroup> {
        if index >= self.condition_groups.len() {
            return None;
        }
        remove_joiner(&mut self.group_logical_operators, index);
        Some(self.condition_groups.remove(index))
    }

    pub fn set_group_joiner(&mut self, index: usize, joiner: LogicalOperator) -> bool {
        match self.group_logical_operators.get_mut(index) {
            Some(slot) => {
                *slot = joiner;
                true
            }
            None => false,
        }
    }

    /// No groups: the role always participates
    pub fn is_unconditional(&self) -> bool {
        self.condition_groups.is_empty()
    }
}

fn remove_joiner(joiners: &mut Vec<LogicalOperator>, removed_index: usize) {
    if joiners.is_empty() {
        return;
    }
    let at = removed_index.saturating_sub(1).min(joiners.len() - 1);
    joiners.remove(at);
}

#[cfg(test)]
mod tests {
    use super::LogicalOperator::{And, Or};
    use super::*;
    use crate::engine::registry::FieldType;
    use serde_json::json;

    fn cond(field: &str) -> Condition {
        Condition::new(field, Operator::Equals, json!("x"))
    }

    #[test]
    fn test_logical_operator_display_and_apply() {
        assert_eq!(format!("{}", And), "AND");
        assert_eq!(format!("{}", Or), "OR");
        assert!(!And.apply(true, false));
        assert!(Or.apply(false, true));
    }

    #[test]
    fn test_deserialize_persisted_rule() {
        let json = json!({
            "role": "AlumniHouseAdmin",
            "conditionGroups": [{
                "conditions": [
                    {"field": "location", "operator": "equals", "value": "AlumniHouse"},
                    {"field": "expectedAttendance", "operator": "greaterThan", "value": 50}
                ],
                "conditionLogicalOperators": ["OR"]
            }],
            "groupLogicalOperators": []
        });
        let rule: StakeholderRule = serde_json::from_value(json).unwrap();
        let group = &rule.condition_groups[0];
        assert_eq!(rule.role, "AlumniHouseAdmin");
        assert_eq!(group.conditions.len(), 2);
        assert_eq!(group.condition_logical_operators, vec![Or]);
        assert_eq!(group.conditions[1].value, json!(50));
    }

    #[test]
    fn test_push_condition_adds_joiner_after_first() {
        let mut group = ConditionGroup::new();
        group.push_condition(cond("a"), Or);
        assert!(group.condition_logical_operators.is_empty());

        group.push_condition(cond("b"), Or);
        group.push_condition(cond("c"), And);
        assert_eq!(group.condition_logical_operators, vec![Or, And]);
    }

    #[test]
    fn test_remove_condition_keeps_counts_in_step() {
        let mut group = ConditionGroup::single(cond("a"))
            .then(Or, cond("b"))
            .then(And, cond("c"));

        // Removing the middle condition drops the joiner in front of it
        let removed = group.remove_condition(1).unwrap();
        assert_eq!(removed.field, "b");
        assert_eq!(group.condition_logical_operators, vec![And]);

        // Removing the first condition drops the joiner after it
        group.remove_condition(0);
        assert_eq!(group.conditions.len(), 1);
        assert!(group.condition_logical_operators.is_empty());

        group.remove_condition(0);
        assert!(group.conditions.is_empty());
        assert!(group.remove_condition(0).is_none());
    }

    #[test]
    fn test_set_joiner() {
        let mut group = ConditionGroup::single(cond("a")).then(And, cond("b"));
        assert!(group.set_joiner(0, Or));
        assert_eq!(group.condition_logical_operators, vec![Or]);
        assert!(!group.set_joiner(1, Or));
    }

    #[test]
    fn test_group_editing() {
        let mut rule = StakeholderRule::new("OIE");
        assert!(rule.is_unconditional());

        rule.push_group(ConditionGroup::single(cond("a")), And);
        rule.push_group(ConditionGroup::single(cond("b")), Or);
        rule.push_group(ConditionGroup::single(cond("c")), And);
        assert_eq!(rule.group_logical_operators, vec![Or, And]);

        rule.remove_group(2);
        assert_eq!(rule.group_logical_operators, vec![Or]);
        assert!(rule.set_group_joiner(0, And));
        assert_eq!(rule.group_logical_operators, vec![And]);
        assert!(rule.remove_group(5).is_none());
    }

    #[test]
    fn test_default_condition_for_field() {
        let definition = FieldDefinition::new("expectedAttendance", FieldType::Number);
        let registry = FieldRegistry::with_fields(vec![definition]).unwrap();
        let field = registry.resolve_field("expectedAttendance").unwrap();
        let condition = Condition::default_for(field, &registry).unwrap();

        assert_eq!(condition.field, "expectedAttendance");
        assert_eq!(condition.operator, "equals");
        assert_eq!(condition.value, json!(""));
    }
}
