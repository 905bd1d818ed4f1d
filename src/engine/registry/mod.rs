// SPDX-License-Identifier: MIT

//! Field registry: which fields exist, their types, and the operators each
//! type allows. A registry is an immutable snapshot passed explicitly to
//! validation and ingestion.

mod field;
mod operators;

pub use field::{FieldDefinition, FieldType, InputType};
pub use operators::{AllowedOperators, Operator, OperatorSet};

use std::collections::HashMap;

use crate::engine::error::RegistryError;

#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: HashMap<String, FieldDefinition>,
    /// Declaration order, for listing
    order: Vec<String>,
    operators: OperatorSet,
}

impl FieldRegistry {
    pub fn new(
        definitions: impl IntoIterator<Item = FieldDefinition>,
        operators: OperatorSet,
    ) -> Result<Self, RegistryError> {
        let mut fields = HashMap::new();
        let mut order = Vec::new();
        for def in definitions {
            if fields.contains_key(&def.name) {
                return Err(RegistryError::DuplicateField(def.name));
            }
            order.push(def.name.clone());
            fields.insert(def.name.clone(), def);
        }
        Ok(Self {
            fields,
            order,
            operators,
        })
    }

    /// Registry with the standard operator table
    pub fn with_fields(
        definitions: impl IntoIterator<Item = FieldDefinition>,
    ) -> Result<Self, RegistryError> {
        Self::new(definitions, OperatorSet::standard())
    }

    /// Look up an active field
    pub fn resolve_field(&self, name: &str) -> Result<&FieldDefinition, RegistryError> {
        self.fields
            .get(name)
            .filter(|def| def.is_active)
            .ok_or_else(|| RegistryError::UnknownField(name.to_string()))
    }

    pub fn operators_for(&self, field_type: FieldType) -> Result<&[Operator], RegistryError> {
        self.operators
            .get(field_type)
            .ok_or_else(|| RegistryError::UnknownType(field_type.to_string()))
    }

    /// Same as `operators_for` for a type name that has not been parsed yet
    pub fn operators_for_name(&self, field_type: &str) -> Result<&[Operator], RegistryError> {
        self.operators_for(field_type.parse()?)
    }

    /// Active fields in declaration order
    pub fn active_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.fields.get(name))
            .filter(|def| def.is_active)
    }

    pub fn operator_set(&self) -> &OperatorSet {
        &self.operators
    }
}
