use serde::{Deserialize, Serialize};

use tempora_core::{Entity, FieldId};

use crate::error::{CatalogError, CatalogResult};

/// Role of a field within a version's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldClassification {
    Required,
    Optional,
    Computed,
    Reference,
    Descriptive,
}

/// One attribute of a product version. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogField {
    id: FieldId,
    name: String,
    label: String,
    description: String,
    classification: FieldClassification,
    data_type: String, // e.g. "string", "decimal", "date"
    is_nullable: bool,
    is_confidential: bool,
}

impl CatalogField {
    /// Non-nullable, non-confidential field; `label` defaults to `name`.
    pub fn new(
        id: FieldId,
        name: impl Into<String>,
        classification: FieldClassification,
        data_type: impl Into<String>,
    ) -> CatalogResult<Self> {
        let name = name.into();
        let data_type = data_type.into();

        if name.trim().is_empty() {
            return Err(CatalogError::validation("field name cannot be empty"));
        }
        if data_type.trim().is_empty() {
            return Err(CatalogError::validation(format!(
                "field {name}: data type cannot be empty"
            )));
        }

        Ok(Self {
            id,
            label: name.clone(),
            name,
            description: String::new(),
            classification,
            data_type,
            is_nullable: false,
            is_confidential: false,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn confidential(mut self) -> Self {
        self.is_confidential = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn classification(&self) -> FieldClassification {
        self.classification
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.is_nullable
    }

    pub fn is_confidential(&self) -> bool {
        self.is_confidential
    }
}

impl Entity for CatalogField {
    type Id = FieldId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
