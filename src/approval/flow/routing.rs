// SPDX-License-Identifier: MIT

//! Approval routing: which stakeholders must act on an event
//!
//! A flow definition is compiled once (registry plus every step's rule).
//! Routing an event walks the steps in declaration order and keeps each role
//! whose rule holds; a role listed by several steps is kept once, with the
//! settings of its first applicable step.

use serde::Serialize;
use std::collections::HashSet;

use super::types::{ApprovalFlowDefinition, ApprovalStep, NotificationChannel, StepAction};
use crate::engine::condition::{compile, evaluate, explain, CompiledRule, Evaluation};
use crate::engine::error::{FlowError, ValidationError};
use crate::engine::event::{EventRecord, TypedEvent};
use crate::engine::registry::{FieldRegistry, OperatorSet};

/// A role that must act on an event, with its step settings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredApproval {
    pub role: String,
    pub step_index: usize,
    pub is_required: bool,
    pub priority: u32,
    pub action: StepAction,
    pub escalation_timeout_hours: u32,
    pub allow_delegation: bool,
    pub notification_channels: Vec<NotificationChannel>,
    pub check_items: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanStatus {
    /// At least one stakeholder must act
    Pending,
    /// No step applies; the event needs no approval
    NotApplicable,
}

/// Routing result for one event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalPlan {
    pub status: PlanStatus,
    pub approvals: Vec<RequiredApproval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanations: Option<Vec<Evaluation>>,
}

impl ApprovalPlan {
    pub fn roles(&self) -> Vec<&str> {
        self.approvals.iter().map(|a| a.role.as_str()).collect()
    }
}

/// A validated flow, ready to route events
#[derive(Debug, Clone)]
pub struct ApprovalFlow {
    definition: ApprovalFlowDefinition,
    registry: FieldRegistry,
    rules: Vec<CompiledRule>,
}

impl ApprovalFlow {
    /// Build the registry and compile every step, stopping at the first error
    pub fn compile(definition: ApprovalFlowDefinition) -> Result<Self, FlowError> {
        let registry = build_registry(&definition)?;
        let mut rules = Vec::with_capacity(definition.steps.len());
        for (index, step) in definition.steps.iter().enumerate() {
            match compile(&step.rule, &registry) {
                Ok(rule) => rules.push(rule),
                Err(source) => return Err(step_error(index, step, source)),
            }
        }

        log::info!(
            "Compiled approval flow v{} with {} steps and {} fields",
            definition.version,
            rules.len(),
            registry.active_fields().count()
        );
        Ok(Self {
            definition,
            registry,
            rules,
        })
    }

    /// Every configuration error in the definition, for reporting to admins.
    /// An empty list means `compile` will succeed.
    pub fn check(definition: &ApprovalFlowDefinition) -> Vec<FlowError> {
        let registry = match build_registry(definition) {
            Ok(registry) => registry,
            Err(err) => return vec![err],
        };
        definition
            .steps
            .iter()
            .enumerate()
            .filter_map(|(index, step)| {
                let source = compile(&step.rule, &registry).err()?;
                Some(step_error(index, step, source))
            })
            .collect()
    }

    pub fn definition(&self) -> &ApprovalFlowDefinition {
        &self.definition
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Coerce a raw event against this flow's registry
    pub fn ingest(&self, record: &EventRecord) -> TypedEvent {
        TypedEvent::ingest(record, &self.registry)
    }

    /// Roles that must act on `event`, in step order, each role once
    pub fn required_approvals(&self, event: &TypedEvent) -> Vec<RequiredApproval> {
        let mut seen = HashSet::new();
        let mut approvals = Vec::new();

        for (index, (step, rule)) in self.definition.steps.iter().zip(&self.rules).enumerate() {
            if seen.contains(rule.role.as_str()) || !evaluate(event, rule) {
                continue;
            }
            seen.insert(rule.role.as_str());
            approvals.push(RequiredApproval {
                role: rule.role.clone(),
                step_index: index,
                is_required: step.is_required,
                priority: step.priority,
                action: step.action,
                escalation_timeout_hours: step.settings.escalation_timeout,
                allow_delegation: step.settings.allow_delegation,
                notification_channels: step.settings.notification_channels.clone(),
                check_items: step.check_items.clone(),
            });
        }
        approvals
    }

    /// Route a raw event, optionally explaining every step's outcome
    pub fn route(&self, record: &EventRecord, with_explanations: bool) -> ApprovalPlan {
        let event = self.ingest(record);
        let approvals = self.required_approvals(&event);
        let status = if approvals.is_empty() {
            PlanStatus::NotApplicable
        } else {
            PlanStatus::Pending
        };
        let explanations = with_explanations.then(|| self.explain_all(&event));

        log::debug!(
            "Routed event to {} stakeholder(s): {:?}",
            approvals.len(),
            approvals.iter().map(|a| &a.role).collect::<Vec<_>>()
        );
        ApprovalPlan {
            status,
            approvals,
            explanations,
        }
    }

    /// Per-condition outcomes of every step, in step order
    pub fn explain_all(&self, event: &TypedEvent) -> Vec<Evaluation> {
        self.rules
            .iter()
            .map(|rule| explain(event, rule))
            .collect()
    }
}

fn step_error(index: usize, step: &ApprovalStep, source: ValidationError) -> FlowError {
    FlowError::Step {
        index,
        role: step.rule.role.clone(),
        source,
    }
}

fn build_registry(definition: &ApprovalFlowDefinition) -> Result<FieldRegistry, FlowError> {
    let operators = if definition.allowed_operators.is_empty() {
        OperatorSet::standard()
    } else {
        OperatorSet::from_entries(&definition.allowed_operators)?
    };
    let fields = definition.field_definitions.iter().cloned();
    Ok(FieldRegistry::new(fields, operators)?)
}
