use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tempora_core::{Entity, ProductId, RuleInstanceId, TemplateId};

use crate::date_range::DateRange;
use crate::error::{CatalogError, CatalogResult};
use crate::rules::params::ParamValue;
use crate::rules::template::BusinessRuleTemplate;

/// A template bound to one product, a date range and concrete parameters.
///
/// Unlike product versions, instances for the same product may overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRuleInstance {
    id: RuleInstanceId,
    template_id: TemplateId,
    product_id: ProductId,
    date_range: DateRange,
    parameters: BTreeMap<String, ParamValue>,
    is_active: bool,
}

impl BusinessRuleInstance {
    /// Bind `template` to a product. Parameters are checked against the
    /// template's schema; on failure no instance exists.
    pub fn new(
        id: RuleInstanceId,
        template: &BusinessRuleTemplate,
        product_id: ProductId,
        date_range: DateRange,
        parameters: BTreeMap<String, ParamValue>,
        is_active: bool,
    ) -> CatalogResult<Self> {
        template.validate_parameters(&parameters)?;

        Ok(Self {
            id,
            template_id: template.id_typed(),
            product_id,
            date_range,
            parameters,
            is_active,
        })
    }

    /// Re-check stored parameters against `template` (e.g. before persisting).
    pub fn revalidate(&self, template: &BusinessRuleTemplate) -> CatalogResult<()> {
        if template.id_typed() != self.template_id {
            return Err(CatalogError::validation(format!(
                "rule instance {} references template {}, checked against {}",
                self.id,
                self.template_id,
                template.id_typed()
            )));
        }
        template.validate_parameters(&self.parameters)
    }

    pub fn id_typed(&self) -> RuleInstanceId {
        self.id
    }

    pub fn template_id(&self) -> TemplateId {
        self.template_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn date_range(&self) -> &DateRange {
        &self.date_range
    }

    pub fn parameters(&self) -> &BTreeMap<String, ParamValue> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.is_active && self.date_range.contains(date)
    }

    pub fn deactivated(&self) -> Self {
        Self {
            is_active: false,
            ..self.clone()
        }
    }

    pub fn activated(&self) -> Self {
        Self {
            is_active: true,
            ..self.clone()
        }
    }
}

impl Entity for BusinessRuleInstance {
    type Id = RuleInstanceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Active instances of `product_id` covering `date`, in input order.
///
/// No precedence is applied between matches.
pub fn select_active<'a, I>(instances: I, product_id: ProductId, date: NaiveDate) -> Vec<BusinessRuleInstance>
where
    I: IntoIterator<Item = &'a BusinessRuleInstance>,
{
    instances
        .into_iter()
        .filter(|i| i.product_id == product_id && i.applies_on(date))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::params::{ParamKind, ParamSchema, ParamSpec};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn max_amount() -> BusinessRuleTemplate {
        BusinessRuleTemplate::new(
            TemplateId::new(),
            "max_amount",
            "range_check",
            ParamSchema::new()
                .with("max", ParamSpec::required(ParamKind::Number))
                .with("currency", ParamSpec::optional(ParamKind::String)),
        )
        .unwrap()
    }

    fn params(max: f64) -> BTreeMap<String, ParamValue> {
        BTreeMap::from([("max".to_string(), ParamValue::Number(max))])
    }

    fn year_2024() -> DateRange {
        DateRange::bounded(d(2024, 1, 1), d(2024, 12, 31)).unwrap()
    }

    #[test]
    fn scenario_c_active_window_and_deactivation() {
        let product_id = ProductId::new();
        let instance =
            BusinessRuleInstance::new(RuleInstanceId::new(), &max_amount(), product_id, year_2024(), params(500.0), true)
                .unwrap();

        assert_eq!(instance.parameter("max"), Some(&ParamValue::Number(500.0)));
        assert!(instance.parameter("currency").is_none());

        let all = vec![instance.clone()];
        assert_eq!(select_active(&all, product_id, d(2024, 6, 1)), vec![instance.clone()]);
        assert!(select_active(&all, product_id, d(2025, 1, 1)).is_empty());

        let inactive = vec![instance.deactivated()];
        for date in [d(2023, 6, 1), d(2024, 6, 1), d(2025, 1, 1)] {
            assert!(select_active(&inactive, product_id, date).is_empty());
        }
        assert!(inactive[0].activated().applies_on(d(2024, 6, 1)));
    }

    #[test]
    fn overlapping_instances_are_all_returned_in_order() {
        let product_id = ProductId::new();
        let template = max_amount();
        let a = BusinessRuleInstance::new(RuleInstanceId::new(), &template, product_id, year_2024(), params(1.0), true)
            .unwrap();
        let b = BusinessRuleInstance::new(
            RuleInstanceId::new(),
            &template,
            product_id,
            DateRange::open(d(2024, 3, 1)),
            params(2.0),
            true,
        )
        .unwrap();
        let other_product =
            BusinessRuleInstance::new(RuleInstanceId::new(), &template, ProductId::new(), year_2024(), params(3.0), true)
                .unwrap();

        let all = vec![a.clone(), other_product, b.clone()];
        let ids: Vec<_> = select_active(&all, product_id, d(2024, 6, 1))
            .iter()
            .map(|i| i.id_typed())
            .collect();
        assert_eq!(ids, vec![a.id_typed(), b.id_typed()]);
    }

    #[test]
    fn invalid_parameters_prevent_creation() {
        let mut bad = params(1.0);
        bad.insert("max".to_string(), ParamValue::String("lots".to_string()));

        let err = BusinessRuleInstance::new(RuleInstanceId::new(), &max_amount(), ProductId::new(), year_2024(), bad, true)
            .unwrap_err();
        match err {
            CatalogError::BusinessRuleValidation { template, violations } => {
                assert_eq!(template, "max_amount");
                assert_eq!(violations, vec!["`max` expected number, got string".to_string()]);
            }
            other => panic!("expected BusinessRuleValidation, got {other:?}"),
        }
    }

    #[test]
    fn revalidate_rejects_foreign_template() {
        let instance = BusinessRuleInstance::new(
            RuleInstanceId::new(),
            &max_amount(),
            ProductId::new(),
            year_2024(),
            params(1.0),
            true,
        )
        .unwrap();
        assert!(matches!(instance.revalidate(&max_amount()), Err(CatalogError::Validation(_))));
    }
}
