use std::collections::HashMap;
use std::sync::RwLock;

use tracing::{debug, warn};

use tempora_catalog::{CatalogError, CatalogResult, Product, ProductRepository, ProductSnapshot};
use tempora_core::{AggregateRoot, DomainError, ExpectedVersion, ProductId};
use tempora_events::EventRecord;

const AGGREGATE_TYPE: &str = "catalog.product";

#[derive(Debug, Default)]
struct Tables {
    products: HashMap<ProductId, ProductSnapshot>,
    codes: HashMap<String, ProductId>,
    outbox: Vec<EventRecord>,
}

/// In-memory whole-aggregate product store.
///
/// Intended for tests/dev. Stores snapshots, so callers never share state with
/// the store, and records committed events in an outbox.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    tables: RwLock<Tables>,
}

fn poisoned() -> CatalogError {
    DomainError::invariant("product store lock poisoned").into()
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events committed so far, in commit order.
    pub fn recorded_events(&self) -> CatalogResult<Vec<EventRecord>> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.outbox.clone())
    }
}

impl ProductRepository for InMemoryProductRepository {
    fn find_by_id(&self, id: ProductId) -> CatalogResult<Option<Product>> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.products.get(&id).cloned().map(Product::from_snapshot))
    }

    fn find_by_code(&self, code: &str) -> CatalogResult<Option<Product>> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables
            .codes
            .get(code)
            .and_then(|id| tables.products.get(id))
            .cloned()
            .map(Product::from_snapshot))
    }

    fn save(&self, mut product: Product, expected: ExpectedVersion) -> CatalogResult<Product> {
        product.check_invariants()?;

        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let id = product.id_typed();
        let stored = tables.products.get(&id);
        let current = stored.map(|s| s.revision).unwrap_or(0);

        if let Err(e) = expected.check(current) {
            warn!(product = %product.code(), %current, ?expected, "rejected stale product write");
            return Err(e.into());
        }

        if let Some(stored) = stored {
            if stored.code != product.code() {
                return Err(CatalogError::validation(format!(
                    "product {id}: code is immutable ({} -> {})",
                    stored.code,
                    product.code()
                )));
            }
        }
        if let Some(owner) = tables.codes.get(product.code()) {
            if *owner != id {
                return Err(CatalogError::validation(format!(
                    "product code {} already registered",
                    product.code()
                )));
            }
        }

        let events = product.take_pending_events();
        let first_revision = product.revision() + 1 - events.len() as u64;
        let mut records = Vec::with_capacity(events.len());
        for (offset, event) in events.iter().enumerate() {
            let record = EventRecord::from_typed(event, AGGREGATE_TYPE, first_revision + offset as u64)
                .map_err(|e| DomainError::invariant(format!("event encoding failed: {e}")))?;
            records.push(record);
        }

        let snapshot = product.to_snapshot();
        tables.codes.insert(snapshot.code.clone(), id);
        tables.products.insert(id, snapshot);
        tables.outbox.extend(records);

        debug!(
            product = %product.code(),
            revision = product.revision(),
            events = events.len(),
            "saved product"
        );

        Ok(product)
    }
}
