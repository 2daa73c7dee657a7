use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tempora_core::{Entity, TemplateId};

use crate::error::{CatalogError, CatalogResult};
use crate::rules::params::{ParamSchema, ParamValue};

/// Reusable, parameterized rule definition (reference data).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRuleTemplate {
    id: TemplateId,
    name: String,
    description: String,
    /// Names the validator that interprets instances of this template.
    execution_kind: String,
    parameter_schema: ParamSchema,
}

impl BusinessRuleTemplate {
    pub fn new(
        id: TemplateId,
        name: impl Into<String>,
        execution_kind: impl Into<String>,
        parameter_schema: ParamSchema,
    ) -> CatalogResult<Self> {
        let name = name.into();
        let execution_kind = execution_kind.into();

        if name.trim().is_empty() {
            return Err(CatalogError::validation("template name cannot be empty"));
        }
        if execution_kind.trim().is_empty() {
            return Err(CatalogError::validation(format!(
                "template {name}: execution kind cannot be empty"
            )));
        }

        Ok(Self {
            id,
            name,
            description: String::new(),
            execution_kind,
            parameter_schema,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id_typed(&self) -> TemplateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn execution_kind(&self) -> &str {
        &self.execution_kind
    }

    pub fn parameter_schema(&self) -> &ParamSchema {
        &self.parameter_schema
    }

    pub fn validate_parameters(&self, parameters: &BTreeMap<String, ParamValue>) -> CatalogResult<()> {
        self.parameter_schema
            .validate(parameters)
            .map_err(|violations| CatalogError::BusinessRuleValidation {
                template: self.name.clone(),
                violations,
            })
    }
}

impl Entity for BusinessRuleTemplate {
    type Id = TemplateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
