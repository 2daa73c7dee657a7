//! As-of resolution of a product's effective catalog.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use tempora_core::ProductId;

use crate::error::{CatalogError, CatalogResult};
use crate::field::CatalogField;
use crate::product::Product;
use crate::repository::{ProductRepository, RuleLookup};
use crate::rules::BusinessRuleInstance;
use crate::version::ProductVersion;

/// Fields and active rules that apply to a product on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveCatalog {
    product_id: ProductId,
    product_code: String,
    as_of: NaiveDate,
    version: ProductVersion,
    rule_instances: Vec<BusinessRuleInstance>,
}

impl EffectiveCatalog {
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn version(&self) -> &ProductVersion {
        &self.version
    }

    pub fn fields(&self) -> &[CatalogField] {
        self.version.fields()
    }

    /// Every matching instance, in lookup order. No precedence is implied.
    pub fn rule_instances(&self) -> &[BusinessRuleInstance] {
        &self.rule_instances
    }
}

/// Combines a product's version history with its rule instances.
#[derive(Debug, Clone)]
pub struct CatalogResolutionService<R> {
    rules: R,
}

impl<R> CatalogResolutionService<R>
where
    R: RuleLookup,
{
    pub fn new(rules: R) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Resolve `product` as of `date`.
    ///
    /// Rules are only looked up once a version is known to cover the date.
    pub fn resolve(&self, product: &Product, date: NaiveDate) -> CatalogResult<EffectiveCatalog> {
        let version = product
            .get_version_for_date(date)?
            .ok_or_else(|| CatalogError::NoVersionForDate {
                product_code: product.code().to_string(),
                date,
            })?
            .clone();

        let rule_instances = self.rules.find_active_instances(product.id_typed(), date)?;

        debug!(
            product = %product.code(),
            as_of = %date,
            version = %version.label(),
            fields = version.fields().len(),
            rules = rule_instances.len(),
            "resolved effective catalog"
        );

        Ok(EffectiveCatalog {
            product_id: product.id_typed(),
            product_code: product.code().to_string(),
            as_of: date,
            version,
            rule_instances,
        })
    }

    pub fn resolve_by_code<P>(&self, products: &P, code: &str, date: NaiveDate) -> CatalogResult<EffectiveCatalog>
    where
        P: ProductRepository + ?Sized,
    {
        let product = products
            .find_by_code(code)?
            .ok_or_else(|| CatalogError::ProductNotFound(code.to_string()))?;
        self.resolve(&product, date)
    }

    pub fn resolve_by_id<P>(&self, products: &P, id: ProductId, date: NaiveDate) -> CatalogResult<EffectiveCatalog>
    where
        P: ProductRepository + ?Sized,
    {
        let product = products
            .find_by_id(id)?
            .ok_or_else(|| CatalogError::product_not_found_by_id(id))?;
        self.resolve(&product, date)
    }
}
