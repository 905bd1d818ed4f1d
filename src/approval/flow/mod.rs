// SPDX-License-Identifier: MIT

//! Approval flows: definitions, loading, and routing events to stakeholders

pub mod loader;
pub mod routing;
pub mod types;

pub use loader::FlowLoader;
pub use routing::{ApprovalFlow, ApprovalPlan, PlanStatus, RequiredApproval};
pub use types::{
    ApprovalFlowDefinition, ApprovalStep, NotificationChannel, StepAction, StepSettings,
};
