use std::sync::RwLock;

use chrono::NaiveDate;
use tracing::debug;

use tempora_catalog::rules::select_active;
use tempora_catalog::{
    BusinessRuleInstance, BusinessRuleTemplate, CatalogError, CatalogResult, RuleLookup,
    RuleRepository,
};
use tempora_core::{DomainError, ProductId, TemplateId};

#[derive(Debug, Default)]
struct Tables {
    templates: Vec<BusinessRuleTemplate>,
    /// Insertion order is lookup order.
    instances: Vec<BusinessRuleInstance>,
}

/// In-memory rule template/instance store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRuleRepository {
    tables: RwLock<Tables>,
}

fn poisoned() -> CatalogError {
    DomainError::invariant("rule store lock poisoned").into()
}

impl InMemoryRuleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RuleLookup for InMemoryRuleRepository {
    fn find_active_instances(
        &self,
        product_id: ProductId,
        date: NaiveDate,
    ) -> CatalogResult<Vec<BusinessRuleInstance>> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(select_active(&tables.instances, product_id, date))
    }
}

impl RuleRepository for InMemoryRuleRepository {
    /// Templates are reference data: re-saving an identical template is a
    /// no-op, changing a stored one is rejected.
    fn save_template(&self, template: BusinessRuleTemplate) -> CatalogResult<BusinessRuleTemplate> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;

        if let Some(existing) = tables.templates.iter().find(|t| t.id_typed() == template.id_typed()) {
            if *existing != template {
                return Err(CatalogError::validation(format!(
                    "template {} is immutable",
                    existing.name()
                )));
            }
            return Ok(template);
        }
        if tables.templates.iter().any(|t| t.name() == template.name()) {
            return Err(CatalogError::validation(format!(
                "template name {} already registered",
                template.name()
            )));
        }

        debug!(template = %template.name(), kind = %template.execution_kind(), "saved rule template");
        tables.templates.push(template.clone());
        Ok(template)
    }

    fn find_template(&self, id: TemplateId) -> CatalogResult<Option<BusinessRuleTemplate>> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.templates.iter().find(|t| t.id_typed() == id).cloned())
    }

    /// Upsert by id; an updated instance keeps its original position.
    fn save_instance(&self, instance: BusinessRuleInstance) -> CatalogResult<BusinessRuleInstance> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;

        let template = tables
            .templates
            .iter()
            .find(|t| t.id_typed() == instance.template_id())
            .ok_or(CatalogError::TemplateNotFound(instance.template_id()))?;
        instance.revalidate(template)?;

        debug!(
            instance = %instance.id_typed(),
            template = %template.name(),
            product = %instance.product_id(),
            range = %instance.date_range(),
            active = instance.is_active(),
            "saved rule instance"
        );

        match tables.instances.iter_mut().find(|i| i.id_typed() == instance.id_typed()) {
            Some(slot) => *slot = instance.clone(),
            None => tables.instances.push(instance.clone()),
        }
        Ok(instance)
    }
}
