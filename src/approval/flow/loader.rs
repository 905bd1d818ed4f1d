//! Flow loader - YAML/JSON file loading and parsing
//!
//! This module handles loading approval flow definitions and event records
//! from disk. Files ending in `.json` are read as JSON, anything else as YAML.

use std::fs;
use std::path::Path;

use super::routing::ApprovalFlow;
use super::types::ApprovalFlowDefinition;
use crate::engine::error::ApprovalError;
use crate::engine::event::EventRecord;

/// Loads approval flows and events from files
pub struct FlowLoader;

impl FlowLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a flow definition from a YAML or JSON file
    pub fn load_flow<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<ApprovalFlowDefinition, ApprovalError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        if is_json(path) {
            Self::parse_json(&content)
        } else {
            Self::parse_yaml(&content)
        }
    }

    /// Load a flow definition and compile it, ready for routing
    pub fn load_compiled<P: AsRef<Path>>(&self, path: P) -> Result<ApprovalFlow, ApprovalError> {
        let definition = self.load_flow(path)?;
        Ok(ApprovalFlow::compile(definition)?)
    }

    /// Parse a flow definition from a YAML string
    pub fn parse_yaml(content: &str) -> Result<ApprovalFlowDefinition, ApprovalError> {
        let def: ApprovalFlowDefinition = serde_yaml::from_str(content)?;
        Ok(def)
    }

    /// Parse a flow definition from a JSON string
    pub fn parse_json(content: &str) -> Result<ApprovalFlowDefinition, ApprovalError> {
        let def: ApprovalFlowDefinition = serde_json::from_str(content)?;
        Ok(def)
    }

    /// Load an event record (a JSON or YAML object)
    pub fn load_event<P: AsRef<Path>>(&self, path: P) -> Result<EventRecord, ApprovalError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let value: serde_json::Value = if is_json(path) {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        EventRecord::from_json(value).ok_or_else(|| {
            ApprovalError::other(format!("{} does not contain an object", path.display()))
        })
    }
}

impl Default for FlowLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::{FlowError, ValidationReason};
    use crate::engine::registry::FieldType;
    use serde_json::json;
    use std::path::PathBuf;

    fn demo_flow() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("demos")
            .join("flows/campus.yaml")
    }

    #[test]
    fn test_parse_yaml_flow() {
        let yaml = r#"
version: 2
fieldDefinitions:
  - name: location
    type: string
    label: Event Location
    inputType: text
  - name: expectedAttendance
    type: number
    label: Expected Attendance
    inputType: number
steps:
  - role: AlumniHouseAdmin
    conditionGroups:
      - conditions:
          - field: location
            operator: equals
            value: Heffner Alumni House
          - field: expectedAttendance
            operator: greaterThan
            value: 50
        conditionLogicalOperators: [AND]
"#;
        let def = FlowLoader::parse_yaml(yaml).unwrap();
        assert_eq!(def.version, 2);
        assert_eq!(def.field_definitions.len(), 2);
        assert_eq!(def.field_definitions[1].field_type, FieldType::Number);
        assert_eq!(def.steps.len(), 1);
        assert!(def.allowed_operators.is_empty());

        let group = &def.steps[0].rule.condition_groups[0];
        assert_eq!(group.conditions[1].value, json!(50));
    }

    #[test]
    fn test_parse_json_flow() {
        let json = r#"{
            "steps": [{"role": "OIE", "conditionGroups": [], "groupLogicalOperators": []}],
            "fieldDefinitions": [],
            "allowedOperators": [{"type": "string", "operators": ["equals"]}]
        }"#;
        let def = FlowLoader::parse_json(json).unwrap();
        assert_eq!(def.version, 1);
        assert_eq!(def.allowed_operators[0].operators, vec!["equals"]);
    }

    #[test]
    fn test_invalid_yaml_returns_error() {
        let yaml = r#"
steps:
  role: [not, a, step]
"#;
        assert!(matches!(
            FlowLoader::parse_yaml(yaml),
            Err(ApprovalError::Yaml(_))
        ));
    }

    #[test]
    fn test_unknown_field_type_is_a_parse_error() {
        let yaml = r#"
fieldDefinitions:
  - name: budget
    type: currency
    label: Budget
"#;
        assert!(FlowLoader::parse_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let loader = FlowLoader::new();
        assert!(matches!(
            loader.load_flow("does/not/exist.yaml"),
            Err(ApprovalError::Io(_))
        ));
    }

    #[test]
    fn test_load_compiled_demo_flow() {
        let flow = FlowLoader::new().load_compiled(demo_flow()).unwrap();
        assert_eq!(flow.definition().version, 3);
    }

    #[test]
    fn test_load_compiled_reports_flow_error() {
        let path = std::env::temp_dir().join("approval-rules-flow-error.yaml");
        let yaml = r#"
fieldDefinitions:
  - name: location
    type: string
    label: Event Location
steps:
  - role: OIE
    conditionGroups:
      - conditions:
          - field: headcount
            operator: greaterThan
            value: 100
"#;
        fs::write(&path, yaml).unwrap();

        let result = FlowLoader::new().load_compiled(&path);
        fs::remove_file(&path).unwrap();
        match result {
            Err(ApprovalError::Flow(FlowError::Step { index, source, .. })) => {
                assert_eq!(index, 0);
                assert_eq!(source.reason(), ValidationReason::UnknownField);
            }
            other => panic!("Expected flow error, got {:?}", other),
        }
    }
}
