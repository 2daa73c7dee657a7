//! Catalog error taxonomy.

use chrono::NaiveDate;
use thiserror::Error;

use tempora_core::{DomainError, ProductId, TemplateId};

use crate::date_range::DateRange;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Deterministic catalog failures.
///
/// None of these are transient except a stale write surfaced through
/// [`CatalogError::Domain`]; see [`CatalogError::is_stale_write`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    #[error("invalid date range: end {end} precedes start {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("version range {candidate} of product {product_code} overlaps existing range {existing}")]
    OverlappingDateRange {
        product_code: String,
        candidate: DateRange,
        existing: DateRange,
    },

    #[error("product {product_code} has no version covering {date}")]
    NoVersionForDate { product_code: String, date: NaiveDate },

    /// Rule parameters do not satisfy the template's schema.
    #[error("parameters rejected by template {template}: {}", .violations.join("; "))]
    BusinessRuleValidation {
        template: String,
        violations: Vec<String>,
    },

    /// Stored state breaks an invariant the aggregate normally enforces.
    #[error("business rule violated: {0}")]
    BusinessRuleViolation(String),

    #[error("product not found: {0}")]
    ProductNotFound(String),

    #[error("business rule template not found: {0}")]
    TemplateNotFound(TemplateId),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl CatalogError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn product_not_found_by_id(id: ProductId) -> Self {
        Self::ProductNotFound(id.to_string())
    }

    /// True when the persistence collaborator rejected a write against a stale
    /// snapshot. Callers may reload and retry; every other variant is final.
    pub fn is_stale_write(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_conflict())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_domain_conflicts_are_stale_writes() {
        assert!(CatalogError::from(DomainError::conflict("revision 2 != 3")).is_stale_write());
        assert!(!CatalogError::from(DomainError::not_found()).is_stale_write());
        assert!(!CatalogError::validation("blank code").is_stale_write());
    }

    #[test]
    fn validation_error_lists_every_violation() {
        let err = CatalogError::BusinessRuleValidation {
            template: "max_length".to_string(),
            violations: vec!["missing `limit`".to_string(), "unknown `lim`".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "parameters rejected by template max_length: missing `limit`; unknown `lim`"
        );
    }
}
