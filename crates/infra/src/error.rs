//! Errors surfaced by the catalog writer and lookup.

use thiserror::Error;

use pim_core::{DomainError, ProductAbstractId};

use crate::catalog_store::{SKU_UNIQUE_CONSTRAINT, StoreError};
use crate::external::ServiceError;

/// Catalog operation error.
///
/// Collaborator failures are carried unchanged in `Store` / `Service`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// SKU collision on create, or with a different product abstract on update.
    #[error("product abstract with sku '{sku}' already exists")]
    DuplicateSku { sku: String },

    /// The product abstract targeted by an update does not exist.
    #[error("product abstract not found: {0}")]
    NotFound(String),

    /// A stored attribute blob could not be decoded.
    #[error("failed to decode attributes: {0}")]
    Decode(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl CatalogError {
    pub fn duplicate_sku(sku: impl Into<String>) -> Self {
        Self::DuplicateSku { sku: sku.into() }
    }

    pub fn missing(id: ProductAbstractId) -> Self {
        Self::NotFound(format!(
            "tried to retrieve product abstract with id {id}, but it does not exist"
        ))
    }

    /// Map a storage-level SKU unique violation onto `DuplicateSku`.
    pub(crate) fn from_write(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { constraint, value } if constraint == SKU_UNIQUE_CONSTRAINT => {
                Self::DuplicateSku { sku: value }
            }
            other => Self::Store(other),
        }
    }
}

impl From<DomainError> for CatalogError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => CatalogError::Validation(msg),
            DomainError::InvalidId(msg) => CatalogError::Validation(msg),
            DomainError::Decode(msg) => CatalogError::Decode(msg),
        }
    }
}
