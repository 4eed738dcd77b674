//! Contracts of the catalog's external collaborators.
//!
//! Price, image, locale and product lookups are owned by sibling subsystems.
//! The writer and lookup only see these traits; an implementation that shares
//! the catalog's storage (see [`crate::catalog_store::InMemoryCatalogDatabase`])
//! takes part in the writer's transaction.

pub mod in_memory;

use std::sync::Arc;

use thiserror::Error;

use pim_core::{LocaleId, ProductAbstractId, ProductImageSetId};
use pim_products::{Locale, Price, ProductConcrete, ProductImageSet};

use crate::catalog_store::StoreError;

/// Failure reported by an external collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The requested record does not exist (lookups treat this as "absent").
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The collaborator refused the request.
    #[error("{service} rejected the request: {message}")]
    Rejected {
        service: &'static str,
        message: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn rejected(service: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            service,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Abstract product prices.
pub trait PriceService: Send + Sync {
    /// Create or replace the price of `price.product_abstract_id`.
    fn persist_abstract_price(&self, price: &Price) -> Result<(), ServiceError>;

    fn abstract_price(&self, id: ProductAbstractId) -> Result<Option<Price>, ServiceError>;
}

/// Product image sets.
pub trait ImageService: Send + Sync {
    /// Create (no id) or replace (with id) an image set; returns its id.
    ///
    /// Replacing a set that belongs to a different product abstract is rejected.
    fn persist_image_set(&self, image_set: ProductImageSet) -> Result<ProductImageSetId, ServiceError>;

    fn image_sets_by_abstract_id(
        &self,
        id: ProductAbstractId,
    ) -> Result<Vec<ProductImageSet>, ServiceError>;

    /// Delete the product abstract's image sets whose id is not in `keep`;
    /// returns how many were deleted.
    fn remove_image_sets_except(
        &self,
        id: ProductAbstractId,
        keep: &[ProductImageSetId],
    ) -> Result<usize, ServiceError>;
}

pub trait LocaleService: Send + Sync {
    /// Fails with `ServiceError::NotFound` for an unknown id.
    fn locale_by_id(&self, id: LocaleId) -> Result<Locale, ServiceError>;
}

/// Product-level lookups used by the SKU uniqueness checks.
pub trait ProductService: Send + Sync {
    fn has_product_abstract(&self, sku: &str) -> Result<bool, ServiceError>;

    fn product_abstract_id_by_sku(&self, sku: &str) -> Result<Option<ProductAbstractId>, ServiceError>;
}

pub trait ConcreteProductService: Send + Sync {
    fn concrete_products_by_abstract_id(
        &self,
        id: ProductAbstractId,
    ) -> Result<Vec<ProductConcrete>, ServiceError>;
}

impl<S: PriceService + ?Sized> PriceService for Arc<S> {
    fn persist_abstract_price(&self, price: &Price) -> Result<(), ServiceError> {
        (**self).persist_abstract_price(price)
    }

    fn abstract_price(&self, id: ProductAbstractId) -> Result<Option<Price>, ServiceError> {
        (**self).abstract_price(id)
    }
}

impl<S: ImageService + ?Sized> ImageService for Arc<S> {
    fn persist_image_set(&self, image_set: ProductImageSet) -> Result<ProductImageSetId, ServiceError> {
        (**self).persist_image_set(image_set)
    }

    fn image_sets_by_abstract_id(
        &self,
        id: ProductAbstractId,
    ) -> Result<Vec<ProductImageSet>, ServiceError> {
        (**self).image_sets_by_abstract_id(id)
    }

    fn remove_image_sets_except(
        &self,
        id: ProductAbstractId,
        keep: &[ProductImageSetId],
    ) -> Result<usize, ServiceError> {
        (**self).remove_image_sets_except(id, keep)
    }
}

impl<S: LocaleService + ?Sized> LocaleService for Arc<S> {
    fn locale_by_id(&self, id: LocaleId) -> Result<Locale, ServiceError> {
        (**self).locale_by_id(id)
    }
}

impl<S: ProductService + ?Sized> ProductService for Arc<S> {
    fn has_product_abstract(&self, sku: &str) -> Result<bool, ServiceError> {
        (**self).has_product_abstract(sku)
    }

    fn product_abstract_id_by_sku(&self, sku: &str) -> Result<Option<ProductAbstractId>, ServiceError> {
        (**self).product_abstract_id_by_sku(sku)
    }
}

impl<S: ConcreteProductService + ?Sized> ConcreteProductService for Arc<S> {
    fn concrete_products_by_abstract_id(
        &self,
        id: ProductAbstractId,
    ) -> Result<Vec<ProductConcrete>, ServiceError> {
        (**self).concrete_products_by_abstract_id(id)
    }
}
