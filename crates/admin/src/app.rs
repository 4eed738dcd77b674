//! Wiring of the catalog services over one shared storage.

use std::sync::Arc;

use pim_infra::catalog_store::{InMemoryCatalogDatabase, StoreError};
use pim_infra::{CatalogConfig, ProductAbstractLookup, ProductAggregateWriter};
use pim_products::{Locale, TaxSet};

pub type Db = Arc<InMemoryCatalogDatabase>;
pub type Writer = ProductAggregateWriter<Db, Db, Db, Db>;
pub type Lookup = ProductAbstractLookup<Db, Db, Db, Db, Db>;

/// Writer and lookup sharing one database, so every collaborator write joins
/// the writer's transaction.
pub struct Catalog {
    pub db: Db,
    pub writer: Writer,
    pub lookup: Lookup,
}

impl Catalog {
    pub fn build(config: CatalogConfig) -> Self {
        let db: Db = Arc::new(InMemoryCatalogDatabase::new());
        let writer = ProductAggregateWriter::new(db.clone(), db.clone(), db.clone(), db.clone(), config);
        let lookup = ProductAbstractLookup::new(db.clone(), db.clone(), db.clone(), db.clone(), db.clone());
        Self { db, writer, lookup }
    }

    /// Register reference data the products point at.
    pub fn seed(&self, locales: &[Locale], tax_sets: &[TaxSet]) -> Result<(), StoreError> {
        for locale in locales {
            self.db.add_locale(locale.clone())?;
        }
        for tax_set in tax_sets {
            self.db.add_tax_set(tax_set.clone())?;
        }
        tracing::debug!(locales = locales.len(), tax_sets = tax_sets.len(), "reference data seeded");
        Ok(())
    }
}
