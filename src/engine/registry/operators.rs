// SPDX-License-Identifier: MIT

//! Comparison operators and the per-type operator table

use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::field::FieldType;
use crate::engine::error::{Arity, RegistryError};

/// Operator tokens as persisted by the admin UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    In,
    NotIn,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Before,
    After,
    Between,
}

impl Operator {
    pub const ALL: [Operator; 13] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::Contains,
        Operator::NotContains,
        Operator::In,
        Operator::NotIn,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThanOrEqual,
        Operator::Before,
        Operator::After,
        Operator::Between,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "notEquals",
            Operator::Contains => "contains",
            Operator::NotContains => "notContains",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::GreaterThan => "greaterThan",
            Operator::LessThan => "lessThan",
            Operator::GreaterThanOrEqual => "greaterThanOrEqual",
            Operator::LessThanOrEqual => "lessThanOrEqual",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::Between => "between",
        }
    }

    /// Phrase shown to admins, e.g. "expected attendance is greater than 100"
    pub fn label(&self) -> &'static str {
        match self {
            Operator::Equals => "is",
            Operator::NotEquals => "is not",
            Operator::Contains => "contains",
            Operator::NotContains => "does not contain",
            Operator::In => "is one of",
            Operator::NotIn => "is not one of",
            Operator::GreaterThan => "is greater than",
            Operator::LessThan => "is less than",
            Operator::GreaterThanOrEqual => "is greater than or equal to",
            Operator::LessThanOrEqual => "is less than or equal to",
            Operator::Before => "is before",
            Operator::After => "is after",
            Operator::Between => "is between",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Operator::In | Operator::NotIn => Arity::Set,
            Operator::Between => Arity::Range,
            _ => Arity::Single,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .find(|op| op.token() == s)
            .copied()
            .ok_or_else(|| format!("unknown operator: {}", s))
    }
}

/// One `allowedOperators` entry as persisted: a type name and its tokens
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct AllowedOperators {
    #[serde(rename = "type")]
    pub field_type: String,
    pub operators: Vec<String>,
}

/// Ordered operator lists keyed by field type
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorSet {
    by_type: HashMap<FieldType, Vec<Operator>>,
}

static DEFAULT_OPERATORS: Lazy<OperatorSet> = Lazy::new(|| {
    use Operator::*;

    let mut by_type = HashMap::new();
    by_type.insert(
        FieldType::String,
        vec![Equals, NotEquals, Contains, NotContains, In, NotIn],
    );
    by_type.insert(
        FieldType::Number,
        vec![
            Equals,
            NotEquals,
            GreaterThan,
            LessThan,
            GreaterThanOrEqual,
            LessThanOrEqual,
            In,
            NotIn,
        ],
    );
    by_type.insert(FieldType::Boolean, vec![Equals, NotEquals]);
    by_type.insert(
        FieldType::Date,
        vec![Equals, NotEquals, Before, After, Between],
    );
    OperatorSet { by_type }
});

impl OperatorSet {
    /// The table shipped with the platform
    pub fn standard() -> Self {
        DEFAULT_OPERATORS.clone()
    }

    /// Build a table from persisted entries. Later entries for the same type
    /// replace earlier ones.
    pub fn from_entries(entries: &[AllowedOperators]) -> Result<Self, RegistryError> {
        let mut by_type = HashMap::new();
        for entry in entries {
            let field_type: FieldType = entry.field_type.parse()?;
            let operators = entry
                .operators
                .iter()
                .map(|token| parse_operator(&entry.field_type, token))
                .collect::<Result<Vec<_>, _>>()?;
            by_type.insert(field_type, operators);
        }
        Ok(Self { by_type })
    }

    pub fn get(&self, field_type: FieldType) -> Option<&[Operator]> {
        self.by_type.get(&field_type).map(Vec::as_slice)
    }
}

fn parse_operator(field_type: &str, token: &str) -> Result<Operator, RegistryError> {
    match token.parse::<Operator>() {
        Ok(op) => Ok(op),
        Err(_) => Err(RegistryError::UnknownOperator {
            field_type: field_type.to_string(),
            operator: token.to_string(),
        }),
    }
}

impl Default for OperatorSet {
    fn default() -> Self {
        Self::standard()
    }
}
