// SPDX-License-Identifier: MIT

//! Schema types for approval flow definitions
//!
//! This module contains the data structures an approval flow is persisted
//! as: the fields conditions may reference, the operator table, and the
//! ordered stakeholder steps.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::engine::condition::StakeholderRule;
use crate::engine::registry::{AllowedOperators, FieldDefinition};

/// Top-level approval flow definition
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalFlowDefinition {
    /// Stakeholder steps, in routing order
    #[serde(default)]
    pub steps: Vec<ApprovalStep>,
    #[serde(default)]
    pub field_definitions: Vec<FieldDefinition>,
    /// Operator table; the standard table is used when empty
    #[serde(default)]
    pub allowed_operators: Vec<AllowedOperators>,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    1
}

/// A stakeholder role's rule plus how its approval is handled
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalStep {
    #[serde(flatten)]
    pub rule: StakeholderRule,
    #[serde(default = "default_required")]
    pub is_required: bool,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default)]
    pub settings: StepSettings,
    /// Items the approver is asked to confirm
    #[serde(default)]
    pub check_items: Vec<String>,
    #[serde(default)]
    pub action: StepAction,
}

fn default_required() -> bool {
    true
}

fn default_priority() -> u32 {
    1
}

impl ApprovalStep {
    pub fn new(rule: StakeholderRule) -> Self {
        Self {
            rule,
            is_required: true,
            priority: 1,
            settings: StepSettings::default(),
            check_items: vec![],
            action: StepAction::default(),
        }
    }
}

/// Escalation and notification settings for a step
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepSettings {
    /// Hours before an unanswered approval is escalated
    #[serde(default = "default_escalation_timeout")]
    pub escalation_timeout: u32,
    #[serde(default)]
    pub allow_delegation: bool,
    #[serde(default)]
    pub notification_channels: Vec<NotificationChannel>,
}

fn default_escalation_timeout() -> u32 {
    72
}

impl Default for StepSettings {
    fn default() -> Self {
        Self {
            escalation_timeout: default_escalation_timeout(),
            allow_delegation: false,
            notification_channels: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Push,
    Sms,
    InApp,
}

/// What happens when the step applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum StepAction {
    #[default]
    RequireApproval,
    /// Ask the organizer to fill in the step's form instead
    InsertForm,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::condition::LogicalOperator;

    #[test]
    fn test_step_defaults() {
        let yaml = r#"
role: EventsOfficeAdmin
"#;
        let step: ApprovalStep = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(step.rule.role, "EventsOfficeAdmin");
        assert!(step.rule.condition_groups.is_empty());
        assert!(step.is_required);
        assert_eq!(step.priority, 1);
        assert_eq!(step.settings.escalation_timeout, 72);
        assert!(!step.settings.allow_delegation);
        assert_eq!(step.action, StepAction::RequireApproval);
    }

    #[test]
    fn test_step_flattens_rule() {
        let yaml = r#"
role: AlumniHouseAdmin
priority: 2
action: insertForm
conditionGroups:
  - conditions:
      - field: location
        operator: equals
        value: Heffner Alumni House
groupLogicalOperators: []
settings:
  escalationTimeout: 24
  allowDelegation: true
  notificationChannels: [email, in_app]
checkItems:
  - Room setup confirmed
"#;
        let step: ApprovalStep = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(step.rule.condition_groups.len(), 1);
        assert_eq!(step.priority, 2);
        assert_eq!(step.action, StepAction::InsertForm);
        assert_eq!(step.settings.escalation_timeout, 24);
        assert_eq!(
            step.settings.notification_channels,
            vec![NotificationChannel::Email, NotificationChannel::InApp]
        );
        assert_eq!(step.check_items, vec!["Room setup confirmed"]);
    }

    #[test]
    fn test_flow_serializes_camel_case() {
        let mut rule = StakeholderRule::new("OIE");
        rule.push_group(Default::default(), LogicalOperator::And);
        let flow = ApprovalFlowDefinition {
            steps: vec![ApprovalStep::new(rule)],
            field_definitions: vec![],
            allowed_operators: vec![],
            version: 3,
        };
        let json = serde_json::to_value(&flow).unwrap();
        assert_eq!(json["version"], 3);
        assert_eq!(json["steps"][0]["role"], "OIE");
        assert!(json["steps"][0]["conditionGroups"].is_array());
        assert_eq!(json["steps"][0]["isRequired"], true);
        assert!(json.get("fieldDefinitions").is_some());
    }
}
