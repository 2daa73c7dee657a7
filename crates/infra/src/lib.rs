//! Infrastructure layer: in-memory persistence adapters, configuration, and
//! the version authoring workflow built on top of them.

pub mod authoring;
pub mod config;
pub mod product_store;
pub mod rule_store;


pub use authoring::VersionAuthoring;
pub use config::InfraConfig;
pub use product_store::InMemoryProductRepository;
pub use rule_store::InMemoryRuleRepository;
