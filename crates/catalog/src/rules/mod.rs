//! Business rule templates, their date-scoped instances, and parameter schemas.

pub mod instance;
pub mod params;
pub mod template;

pub use instance::{BusinessRuleInstance, select_active};
pub use params::{ParamKind, ParamSchema, ParamSpec, ParamValue};
pub use template::BusinessRuleTemplate;
