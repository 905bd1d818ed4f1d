// SPDX-License-Identifier: MIT

//! Typed error handling for approval-rules
//!
//! Configuration problems (registry construction, rule validation, flow
//! compilation) are errors. Evaluation never produces one: anomalies found
//! while evaluating an event resolve to `false` for the offending condition.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::registry::{FieldType, Operator};

/// Top-level error type for approval-rules
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// Configuration errors (missing env vars, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A loaded flow definition failed to compile
    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(String),
}

/// Field registry errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Field '{0}' is defined more than once")]
    DuplicateField(String),

    /// Field absent or inactive
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown field type: {0}")]
    UnknownType(String),

    #[error("Unknown operator '{operator}' for type {field_type}")]
    UnknownOperator {
        field_type: String,
        operator: String,
    },
}

/// Why a rule was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationReason {
    EmptyConditionsInNonEmptyGroup,
    OperatorCountMismatch,
    UnknownField,
    UnknownType,
    OperatorNotAllowedForType,
    ValueArityMismatch,
}

/// Which level of the tree a logical operator list belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorScope {
    /// `conditionLogicalOperators` of the given group
    Group(usize),
    /// `groupLogicalOperators` of the rule
    Rule,
}

impl fmt::Display for OperatorScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorScope::Group(i) => write!(f, "group {}", i),
            OperatorScope::Rule => write!(f, "rule"),
        }
    }
}

/// Expected value shape for an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// A single non-array value
    Single,
    /// A non-empty array
    Set,
    /// An array of exactly two bounds
    Range,
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Single => write!(f, "a single value"),
            Arity::Set => write!(f, "a non-empty list"),
            Arity::Range => write!(f, "a [low, high] pair"),
        }
    }
}

/// Structural rule errors, positioned by group and condition index
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("group {group} has no conditions")]
    EmptyConditionsInNonEmptyGroup { group: usize },

    #[error("{scope} needs {expected} logical operators, found {found}")]
    OperatorCountMismatch {
        scope: OperatorScope,
        expected: usize,
        found: usize,
    },

    #[error("group {group}, condition {condition}: unknown field '{field}'")]
    UnknownField {
        group: usize,
        condition: usize,
        field: String,
    },

    #[error("group {group}, condition {condition}: no operators for type '{field_type}'")]
    UnknownType {
        group: usize,
        condition: usize,
        field_type: FieldType,
    },

    #[error("group {group}, condition {condition}: '{operator}' not allowed for '{field_type}'")]
    OperatorNotAllowedForType {
        group: usize,
        condition: usize,
        operator: String,
        field_type: FieldType,
    },

    #[error("group {group}, condition {condition}: '{operator}' expects {expected}")]
    ValueArityMismatch {
        group: usize,
        condition: usize,
        operator: Operator,
        expected: Arity,
    },
}

impl ValidationError {
    pub fn reason(&self) -> ValidationReason {
        match self {
            Self::EmptyConditionsInNonEmptyGroup { .. } => {
                ValidationReason::EmptyConditionsInNonEmptyGroup
            }
            Self::OperatorCountMismatch { .. } => ValidationReason::OperatorCountMismatch,
            Self::UnknownField { .. } => ValidationReason::UnknownField,
            Self::UnknownType { .. } => ValidationReason::UnknownType,
            Self::OperatorNotAllowedForType { .. } => ValidationReason::OperatorNotAllowedForType,
            Self::ValueArityMismatch { .. } => ValidationReason::ValueArityMismatch,
        }
    }
}

/// Errors raised while compiling an approval flow definition
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FlowError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("step {index} ({role}): {source}")]
    Step {
        index: usize,
        role: String,
        #[source]
        source: ValidationError,
    },
}

impl ApprovalError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_matches_variant() {
        let err = ValidationError::OperatorCountMismatch {
            scope: OperatorScope::Group(0),
            expected: 1,
            found: 0,
        };
        assert_eq!(err.reason(), ValidationReason::OperatorCountMismatch);

        let err = ValidationError::ValueArityMismatch {
            group: 0,
            condition: 1,
            operator: Operator::Between,
            expected: Arity::Range,
        };
        assert_eq!(err.reason(), ValidationReason::ValueArityMismatch);
    }

    #[test]
    fn test_error_messages() {
        let err = ValidationError::OperatorCountMismatch {
            scope: OperatorScope::Rule,
            expected: 2,
            found: 1,
        };
        assert_eq!(err.to_string(), "rule needs 2 logical operators, found 1");

        let err = FlowError::Step {
            index: 3,
            role: "OIE".to_string(),
            source: ValidationError::EmptyConditionsInNonEmptyGroup { group: 0 },
        };
        assert_eq!(err.to_string(), "step 3 (OIE): group 0 has no conditions");
    }
}
