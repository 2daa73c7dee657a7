//! Tracing/logging setup shared by binaries and tests.

/// Tracing configuration (filters, formatter).
pub mod tracing;

pub use self::tracing::{DEFAULT_FILTER, LogFormat};

/// Initialize process-wide logging with JSON output.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    self::tracing::init(LogFormat::Json);
}
