//! Catalog storage boundary.
//!
//! This module defines the storage contract for product abstract rows and
//! their localized attributes, plus connection-level transaction control.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryCatalogDatabase;
pub use r#trait::{
    ProductAbstractStore, SKU_UNIQUE_CONSTRAINT, StoreError, TransactionManager, transactional,
};
