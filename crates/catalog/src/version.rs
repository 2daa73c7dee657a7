use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use tempora_core::{Entity, VersionId};

use crate::date_range::DateRange;
use crate::error::{CatalogError, CatalogResult};
use crate::field::CatalogField;

/// A date-ranged schema of a product.
///
/// Versions only enter a product through [`crate::Product::add_version`] and
/// are never edited afterwards; a correction is a new version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVersion {
    id: VersionId,
    label: String,
    caption: String,
    description: String,
    date_range: DateRange,
    fields: Vec<CatalogField>,
}

impl ProductVersion {
    /// Build a version. Field names must be unique; field order is kept.
    pub fn new(
        id: VersionId,
        label: impl Into<String>,
        date_range: DateRange,
        fields: Vec<CatalogField>,
    ) -> CatalogResult<Self> {
        let label = label.into();

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name()) {
                return Err(CatalogError::validation(format!(
                    "version {label}: duplicate field name {}",
                    field.name()
                )));
            }
        }

        Ok(Self {
            id,
            label,
            caption: String::new(),
            description: String::new(),
            date_range,
            fields,
        })
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id_typed(&self) -> VersionId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date_range(&self) -> &DateRange {
        &self.date_range
    }

    pub fn fields(&self) -> &[CatalogField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&CatalogField> {
        self.fields.iter().find(|f| f.name() == name)
    }
}

impl Entity for ProductVersion {
    type Id = VersionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
