//! Read-validate-write workflow for appending product versions.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use tempora_catalog::{CatalogError, CatalogResult, Product, ProductRepository, ProductVersion};
use tempora_core::{AggregateRoot, ExpectedVersion};

use crate::config::InfraConfig;

/// Appends versions on top of a [`ProductRepository`].
///
/// Each attempt validates against a freshly loaded snapshot and saves with an
/// exact revision expectation, so two writers can never both commit
/// overlapping versions. Only stale writes are retried.
#[derive(Debug, Clone)]
pub struct VersionAuthoring<P> {
    products: P,
    config: InfraConfig,
}

impl<P> VersionAuthoring<P>
where
    P: ProductRepository,
{
    pub fn new(products: P, config: InfraConfig) -> Self {
        Self { products, config }
    }

    pub fn products(&self) -> &P {
        &self.products
    }

    /// Persist a newly created product; fails if its id is already stored.
    pub fn register_product(&self, product: Product) -> CatalogResult<Product> {
        self.products.save(product, ExpectedVersion::Exact(0))
    }

    pub fn add_version(&self, code: &str, candidate: ProductVersion, at: DateTime<Utc>) -> CatalogResult<Product> {
        let max_attempts = self.config.max_save_attempts.max(1);
        let mut attempt = 1;

        loop {
            let product = self
                .products
                .find_by_code(code)?
                .ok_or_else(|| CatalogError::ProductNotFound(code.to_string()))?;
            let expected = ExpectedVersion::Exact(product.revision());
            let next = product.add_version(candidate.clone(), at)?;

            match self.products.save(next, expected) {
                Ok(saved) => {
                    debug!(
                        product = %code,
                        version = %candidate.label(),
                        range = %candidate.date_range(),
                        attempt,
                        "version added"
                    );
                    return Ok(saved);
                }
                Err(e) if e.is_stale_write() && attempt < max_attempts => {
                    warn!(product = %code, attempt, max_attempts, error = %e, "stale product snapshot, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
