use std::fmt::Display;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, warn};

use pim_core::ProductAbstractId;
use pim_products::{
    LocalizedAttributesRow, NewProductAbstractRow, ProductAbstractRow, QueryCriteria, TaxSet,
};

/// Catalog storage operation error.
///
/// These are **infrastructure errors** (constraints, transactions, backend
/// failures) as opposed to domain errors (validation, malformed data).
///
/// ## Error Categories
///
/// - **UniqueViolation**: a unique index rejected the write (e.g. SKU)
/// - **ForeignKeyViolation**: a row references a parent that does not exist
/// - **RowNotFound**: an update targeted a row that does not exist
/// - **TransactionActive / NoTransaction**: transaction misuse by the caller
/// - **Backend**: anything else (poisoned locks, connection failures)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint '{constraint}' violated by value '{value}'")]
    UniqueViolation {
        constraint: &'static str,
        value: String,
    },

    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("row not found: {0}")]
    RowNotFound(String),

    #[error("a transaction is already active on this thread")]
    TransactionActive,

    #[error("no active transaction on this thread")]
    NoTransaction,

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Name of the unique index on `product_abstract.sku`.
pub const SKU_UNIQUE_CONSTRAINT: &str = "product_abstract_sku_unique";

/// Storage for product abstract base rows and their localized attribute rows.
///
/// ## Write Semantics
///
/// - `insert` assigns the id; ids are never reused or changed
/// - `insert`/`update` enforce SKU uniqueness at the storage level
///   (`StoreError::UniqueViolation`), independently of any application check
/// - `upsert_localized_attributes` replaces the row for the same
///   `(product_abstract_id, locale_id)` and rejects rows whose product abstract
///   does not exist
///
/// ## Read Semantics
///
/// Reads return `Ok(None)` / empty collections for missing records; `Err` is
/// reserved for storage failures.
pub trait ProductAbstractStore: Send + Sync {
    fn insert(&self, row: NewProductAbstractRow) -> Result<ProductAbstractRow, StoreError>;

    fn update(
        &self,
        id: ProductAbstractId,
        row: NewProductAbstractRow,
    ) -> Result<ProductAbstractRow, StoreError>;

    fn find_by_id(&self, id: ProductAbstractId) -> Result<Option<ProductAbstractRow>, StoreError>;

    fn find_by_sku(&self, sku: &str) -> Result<Option<ProductAbstractRow>, StoreError>;

    fn upsert_localized_attributes(&self, row: LocalizedAttributesRow) -> Result<(), StoreError>;

    /// Localized rows of a product abstract, ordered by locale id.
    fn localized_attributes(
        &self,
        id: ProductAbstractId,
    ) -> Result<Vec<LocalizedAttributesRow>, StoreError>;

    /// Tax set joined through the product abstract's `tax_set_id`.
    fn tax_set_for(&self, id: ProductAbstractId) -> Result<Option<TaxSet>, StoreError>;

    /// Product abstracts matching `criteria`, ordered by id.
    fn query(&self, criteria: &QueryCriteria) -> Result<Vec<ProductAbstractRow>, StoreError>;
}

/// Connection-level transaction control shared by every collaborator that
/// writes through the same storage.
///
/// One transaction per thread of control; nesting is not supported.
pub trait TransactionManager: Send + Sync {
    fn begin(&self) -> Result<(), StoreError>;
    fn commit(&self) -> Result<(), StoreError>;
    fn rollback(&self) -> Result<(), StoreError>;
}

impl<S> ProductAbstractStore for Arc<S>
where
    S: ProductAbstractStore + ?Sized,
{
    fn insert(&self, row: NewProductAbstractRow) -> Result<ProductAbstractRow, StoreError> {
        (**self).insert(row)
    }

    fn update(
        &self,
        id: ProductAbstractId,
        row: NewProductAbstractRow,
    ) -> Result<ProductAbstractRow, StoreError> {
        (**self).update(id, row)
    }

    fn find_by_id(&self, id: ProductAbstractId) -> Result<Option<ProductAbstractRow>, StoreError> {
        (**self).find_by_id(id)
    }

    fn find_by_sku(&self, sku: &str) -> Result<Option<ProductAbstractRow>, StoreError> {
        (**self).find_by_sku(sku)
    }

    fn upsert_localized_attributes(&self, row: LocalizedAttributesRow) -> Result<(), StoreError> {
        (**self).upsert_localized_attributes(row)
    }

    fn localized_attributes(
        &self,
        id: ProductAbstractId,
    ) -> Result<Vec<LocalizedAttributesRow>, StoreError> {
        (**self).localized_attributes(id)
    }

    fn tax_set_for(&self, id: ProductAbstractId) -> Result<Option<TaxSet>, StoreError> {
        (**self).tax_set_for(id)
    }

    fn query(&self, criteria: &QueryCriteria) -> Result<Vec<ProductAbstractRow>, StoreError> {
        (**self).query(criteria)
    }
}

impl<S> TransactionManager for Arc<S>
where
    S: TransactionManager + ?Sized,
{
    fn begin(&self) -> Result<(), StoreError> {
        (**self).begin()
    }

    fn commit(&self) -> Result<(), StoreError> {
        (**self).commit()
    }

    fn rollback(&self) -> Result<(), StoreError> {
        (**self).rollback()
    }
}

/// An open transaction that rolls back on drop unless it was closed explicitly.
///
/// Drop runs while unwinding too, so a panicking `work` leaves nothing behind.
struct TransactionGuard<'a, M: TransactionManager + ?Sized> {
    manager: &'a M,
    open: bool,
}

impl<'a, M: TransactionManager + ?Sized> TransactionGuard<'a, M> {
    fn begin(manager: &'a M) -> Result<Self, StoreError> {
        manager.begin()?;
        Ok(Self { manager, open: true })
    }

    fn commit(mut self) -> Result<(), StoreError> {
        self.open = false;
        if let Err(commit_err) = self.manager.commit() {
            if let Err(rollback_err) = self.manager.rollback() {
                error!(error = %rollback_err, "rollback after failed commit failed");
            }
            return Err(commit_err);
        }
        Ok(())
    }

    fn rollback(mut self) -> Result<(), StoreError> {
        self.open = false;
        self.manager.rollback()
    }
}

impl<M: TransactionManager + ?Sized> Drop for TransactionGuard<'_, M> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        match self.manager.rollback() {
            Ok(()) => warn!("transaction rolled back after panic"),
            Err(err) => error!(error = %err, "rollback after panic failed"),
        }
    }
}

/// Run `work` inside a transaction.
///
/// Commits when `work` succeeds. When it fails the transaction is rolled back
/// and the original error is returned as-is; a failing rollback is logged and
/// does not replace that error. When it panics the transaction is rolled back
/// before the panic continues.
pub fn transactional<M, T, E, F>(manager: &M, work: F) -> Result<T, E>
where
    M: TransactionManager + ?Sized,
    E: From<StoreError> + Display,
    F: FnOnce() -> Result<T, E>,
{
    let transaction = TransactionGuard::begin(manager)?;

    match work() {
        Ok(value) => {
            transaction.commit()?;
            Ok(value)
        }
        Err(err) => {
            match transaction.rollback() {
                Ok(()) => warn!(error = %err, "transaction rolled back"),
                Err(rollback_err) => {
                    error!(error = %err, rollback_error = %rollback_err, "rollback failed")
                }
            }
            Err(err)
        }
    }
}
