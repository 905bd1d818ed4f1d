// SPDX-License-Identifier: MIT

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::approval::flow::{ApprovalFlow, ApprovalFlowDefinition};
use crate::engine::error::FlowError;

/// Holds the active approval flow. Readers get an immutable snapshot;
/// activation swaps in a new one only if it compiles.
#[derive(Clone)]
pub struct FlowStore {
    active: Arc<RwLock<Arc<ApprovalFlow>>>,
}

impl FlowStore {
    pub fn new(flow: ApprovalFlow) -> Self {
        Self {
            active: Arc::new(RwLock::new(Arc::new(flow))),
        }
    }

    /// Store with an empty flow: no fields, no steps
    pub fn empty() -> Result<Self, FlowError> {
        let flow = ApprovalFlow::compile(ApprovalFlowDefinition {
            steps: vec![],
            field_definitions: vec![],
            allowed_operators: vec![],
            version: 1,
        })?;
        Ok(Self::new(flow))
    }

    pub async fn current(&self) -> Arc<ApprovalFlow> {
        let active = self.active.read().await;
        Arc::clone(&active)
    }

    /// Validate and activate a definition. On error the previous flow stays
    /// active and every problem found is returned.
    pub async fn activate(
        &self,
        definition: ApprovalFlowDefinition,
    ) -> Result<(), Vec<FlowError>> {
        let errors = ApprovalFlow::check(&definition);
        if !errors.is_empty() {
            log::warn!(
                "Rejected approval flow v{}: {} error(s)",
                definition.version,
                errors.len()
            );
            return Err(errors);
        }
        let flow = ApprovalFlow::compile(definition).map_err(|e| vec![e])?;

        let mut active = self.active.write().await;
        *active = Arc::new(flow);
        log::info!("Activated approval flow v{}", active.definition().version);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::flow::ApprovalStep;
    use crate::engine::condition::LogicalOperator::And;
    use crate::engine::condition::{Condition, ConditionGroup, StakeholderRule};
    use crate::engine::registry::{FieldDefinition, FieldType, Operator};
    use serde_json::json;

    fn definition(version: u32, field: &str) -> ApprovalFlowDefinition {
        let condition = Condition::new(field, Operator::Equals, json!("Union"));
        let group = ConditionGroup::single(condition);
        let rule = StakeholderRule::new("OIE").with_group(And, group);
        ApprovalFlowDefinition {
            steps: vec![ApprovalStep::new(rule)],
            field_definitions: vec![FieldDefinition::new("location", FieldType::String)],
            allowed_operators: vec![],
            version,
        }
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = FlowStore::empty().unwrap();
        let flow = store.current().await;
        assert!(flow.definition().steps.is_empty());
    }

    #[tokio::test]
    async fn test_activate_replaces_flow() {
        let store = FlowStore::empty().unwrap();
        store.activate(definition(2, "location")).await.unwrap();
        assert_eq!(store.current().await.definition().version, 2);
    }

    #[tokio::test]
    async fn test_invalid_flow_keeps_previous() {
        let store = FlowStore::empty().unwrap();
        store.activate(definition(2, "location")).await.unwrap();

        let errors = store.activate(definition(3, "room")).await.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(store.current().await.definition().version, 2);
    }

    #[tokio::test]
    async fn test_store_is_clone() {
        let store = FlowStore::empty().unwrap();
        let cloned = store.clone();

        // Activating through the clone is visible to the original
        cloned.activate(definition(5, "location")).await.unwrap();
        assert_eq!(store.current().await.definition().version, 5);
    }

    #[tokio::test]
    async fn test_snapshot_survives_activation() {
        let store = FlowStore::empty().unwrap();
        let before = store.current().await;
        store.activate(definition(2, "location")).await.unwrap();
        assert_eq!(before.definition().version, 1);
    }
}
