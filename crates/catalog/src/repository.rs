//! Persistence ports consumed by the catalog.
//!
//! Implementations live outside this crate (see `tempora-infra` for in-memory
//! adapters). Products are always read and written as whole aggregates.

use std::sync::Arc;

use chrono::NaiveDate;

use tempora_core::{ExpectedVersion, ProductId, TemplateId};

use crate::error::CatalogResult;
use crate::product::Product;
use crate::rules::{BusinessRuleInstance, BusinessRuleTemplate, select_active};

/// Whole-aggregate product storage with optimistic concurrency.
pub trait ProductRepository: Send + Sync {
    fn find_by_id(&self, id: ProductId) -> CatalogResult<Option<Product>>;

    fn find_by_code(&self, code: &str) -> CatalogResult<Option<Product>>;

    /// Replace the stored aggregate atomically.
    ///
    /// `expected` is compared against the stored revision (0 when absent); a
    /// mismatch is a `DomainError::Conflict` and nothing is written. Returns
    /// the stored product with its pending events drained.
    fn save(&self, product: Product, expected: ExpectedVersion) -> CatalogResult<Product>;
}

/// Date-scoped read access to rule instances.
pub trait RuleLookup {
    /// Active instances of the product covering `date`, in insertion order.
    fn find_active_instances(
        &self,
        product_id: ProductId,
        date: NaiveDate,
    ) -> CatalogResult<Vec<BusinessRuleInstance>>;
}

/// Rule authoring storage.
pub trait RuleRepository: RuleLookup + Send + Sync {
    /// Template names are unique.
    fn save_template(&self, template: BusinessRuleTemplate) -> CatalogResult<BusinessRuleTemplate>;

    fn find_template(&self, id: TemplateId) -> CatalogResult<Option<BusinessRuleTemplate>>;

    /// Re-validates the instance against its stored template before accepting it.
    fn save_instance(&self, instance: BusinessRuleInstance) -> CatalogResult<BusinessRuleInstance>;
}

impl RuleLookup for [BusinessRuleInstance] {
    fn find_active_instances(
        &self,
        product_id: ProductId,
        date: NaiveDate,
    ) -> CatalogResult<Vec<BusinessRuleInstance>> {
        Ok(select_active(self, product_id, date))
    }
}

impl RuleLookup for Vec<BusinessRuleInstance> {
    fn find_active_instances(
        &self,
        product_id: ProductId,
        date: NaiveDate,
    ) -> CatalogResult<Vec<BusinessRuleInstance>> {
        self.as_slice().find_active_instances(product_id, date)
    }
}

impl<T> RuleLookup for Arc<T>
where
    T: RuleLookup + ?Sized,
{
    fn find_active_instances(
        &self,
        product_id: ProductId,
        date: NaiveDate,
    ) -> CatalogResult<Vec<BusinessRuleInstance>> {
        (**self).find_active_instances(product_id, date)
    }
}

impl<T> ProductRepository for Arc<T>
where
    T: ProductRepository + ?Sized,
{
    fn find_by_id(&self, id: ProductId) -> CatalogResult<Option<Product>> {
        (**self).find_by_id(id)
    }

    fn find_by_code(&self, code: &str) -> CatalogResult<Option<Product>> {
        (**self).find_by_code(code)
    }

    fn save(&self, product: Product, expected: ExpectedVersion) -> CatalogResult<Product> {
        (**self).save(product, expected)
    }
}

impl<T> RuleRepository for Arc<T>
where
    T: RuleRepository + ?Sized,
{
    fn save_template(&self, template: BusinessRuleTemplate) -> CatalogResult<BusinessRuleTemplate> {
        (**self).save_template(template)
    }

    fn find_template(&self, id: TemplateId) -> CatalogResult<Option<BusinessRuleTemplate>> {
        (**self).find_template(id)
    }

    fn save_instance(&self, instance: BusinessRuleInstance) -> CatalogResult<BusinessRuleInstance> {
        (**self).save_instance(instance)
    }
}
