//! Temporal product catalog (pure domain logic).
//!
//! A [`Product`] owns a history of date-ranged [`ProductVersion`]s that never
//! overlap. Business rule instances are scoped by their own date ranges and
//! resolved together with the matching version into an [`EffectiveCatalog`].
//!
//! Nothing here performs IO; persistence is reached through the traits in
//! [`repository`].

pub mod date_range;
pub mod error;
pub mod field;
pub mod product;
pub mod repository;
pub mod resolution;
pub mod rules;
pub mod version;

pub use date_range::DateRange;
pub use error::{CatalogError, CatalogResult};
pub use field::{CatalogField, FieldClassification};
pub use product::{
    AddVersion, CatalogEvent, CreateProduct, Product, ProductCommand, ProductCreated, ProductSnapshot,
    VersionAdded,
};
pub use repository::{ProductRepository, RuleLookup, RuleRepository};
pub use resolution::{CatalogResolutionService, EffectiveCatalog};
pub use rules::{
    BusinessRuleInstance, BusinessRuleTemplate, ParamKind, ParamSchema, ParamSpec, ParamValue,
};
pub use version::ProductVersion;
