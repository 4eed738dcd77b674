//! Transactional writes of the product abstract aggregate.
//!
//! ## Create
//!
//! ```text
//! begin
//!   ↓ SKU uniqueness check
//!   ↓ encode attributes, insert base row → id
//!   ↓ localized attributes (one row per locale)
//!   ↓ price (id attached)
//!   ↓ image sets (id attached)
//! commit / rollback
//! ```
//!
//! Update runs the same sequence against an existing row. Sub-aggregate writes
//! always follow the base row write, so nothing references a row that the
//! transaction did not persist.

use tracing::{debug, info, instrument};

use pim_core::ProductAbstractId;
use pim_products::{NewProductAbstractRow, Price, ProductAbstract, codec, validate_sku};

use crate::catalog_store::{ProductAbstractStore, TransactionManager, transactional};
use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::external::{ImageService, PriceService, ProductService};
use crate::uniqueness::UniquenessGuard;

/// Persists complete product abstract aggregates atomically.
///
/// ## Generic Parameters
///
/// - `S`: product abstract storage + its transaction control
/// - `P`: price service
/// - `I`: image service
/// - `Q`: product service used for SKU uniqueness checks
///
/// Collaborators must write through the storage behind `S` for their writes to
/// be rolled back together with the base row.
///
/// ## Error Semantics
///
/// Any failure inside the transaction rolls it back and is returned unchanged.
#[derive(Debug)]
pub struct ProductAggregateWriter<S, P, I, Q> {
    store: S,
    prices: P,
    images: I,
    guard: UniquenessGuard<Q>,
    config: CatalogConfig,
}

impl<S, P, I, Q> ProductAggregateWriter<S, P, I, Q> {
    pub fn new(store: S, prices: P, images: I, products: Q, config: CatalogConfig) -> Self {
        Self {
            store,
            prices,
            images,
            guard: UniquenessGuard::new(products),
            config,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }
}

impl<S, P, I, Q> ProductAggregateWriter<S, P, I, Q>
where
    S: ProductAbstractStore + TransactionManager,
    P: PriceService,
    I: ImageService,
    Q: ProductService,
{
    /// Create a new product abstract with its sub-aggregates; returns the assigned id.
    ///
    /// `product.id` is ignored: ids are assigned by storage.
    #[instrument(skip(self, product), fields(sku = %product.sku), err)]
    pub fn create(&self, product: &ProductAbstract) -> Result<ProductAbstractId, CatalogError> {
        validate_sku(&product.sku, self.config.max_sku_length)?;

        let id = transactional(&self.store, || self.create_in_transaction(product))?;

        info!(product_abstract_id = %id, "product abstract created");
        Ok(id)
    }

    /// Update an existing product abstract and replace its sub-aggregates.
    #[instrument(
        skip(self, product),
        fields(sku = %product.sku, product_abstract_id = ?product.id),
        err
    )]
    pub fn update(&self, product: &ProductAbstract) -> Result<ProductAbstractId, CatalogError> {
        let id = product
            .id
            .ok_or_else(|| CatalogError::NotFound("product abstract id is not set".to_string()))?;
        validate_sku(&product.sku, self.config.max_sku_length)?;

        transactional(&self.store, || self.update_in_transaction(id, product))?;

        info!(product_abstract_id = %id, "product abstract updated");
        Ok(id)
    }

    fn create_in_transaction(&self, product: &ProductAbstract) -> Result<ProductAbstractId, CatalogError> {
        self.guard.assert_sku_unique(&product.sku, None)?;

        let row = self
            .store
            .insert(NewProductAbstractRow {
                sku: product.sku.clone(),
                attributes: codec::encode(&product.attributes)?,
                tax_set_id: product.tax_set_id,
            })
            .map_err(CatalogError::from_write)?;
        let id = row.id;

        self.write_localized_attributes(id, product)?;
        self.write_price(id, product.price.as_ref())?;
        self.write_image_sets(id, product, false)?;

        Ok(id)
    }

    fn update_in_transaction(&self, id: ProductAbstractId, product: &ProductAbstract) -> Result<(), CatalogError> {
        let existing = self
            .store
            .find_by_id(id)?
            .ok_or_else(|| CatalogError::missing(id))?;

        self.guard.assert_sku_unique(&product.sku, Some(id))?;

        if existing.sku != product.sku {
            debug!(previous_sku = %existing.sku, "sku changed");
        }

        self.store
            .update(
                id,
                NewProductAbstractRow {
                    sku: product.sku.clone(),
                    attributes: codec::encode(&product.attributes)?,
                    tax_set_id: product.tax_set_id,
                },
            )
            .map_err(CatalogError::from_write)?;

        self.write_localized_attributes(id, product)?;
        self.write_price(id, product.price.as_ref())?;
        self.write_image_sets(id, product, true)?;

        Ok(())
    }

    fn write_localized_attributes(&self, id: ProductAbstractId, product: &ProductAbstract) -> Result<(), CatalogError> {
        for row in codec::build_localized_attributes(id, product)? {
            self.store.upsert_localized_attributes(row)?;
        }
        Ok(())
    }

    fn write_price(&self, id: ProductAbstractId, price: Option<&Price>) -> Result<(), CatalogError> {
        let Some(price) = price else {
            return Ok(());
        };

        let mut price = price.clone();
        price.product_abstract_id = Some(id);
        if price.price_type.trim().is_empty() {
            price.price_type = self.config.default_price_type.clone();
        }

        self.prices.persist_abstract_price(&price)?;
        Ok(())
    }

    /// Persist the submitted image sets under `id`.
    ///
    /// With `replace`, a set without an id takes over the stored set with the
    /// same name and locale, and stored sets that were not submitted are removed.
    fn write_image_sets(&self, id: ProductAbstractId, product: &ProductAbstract, replace: bool) -> Result<(), CatalogError> {
        let mut unclaimed = if replace {
            self.images.image_sets_by_abstract_id(id)?
        } else {
            Vec::new()
        };
        let mut kept = Vec::with_capacity(product.image_sets.len());

        for image_set in &product.image_sets {
            if let Some(other) = image_set.product_abstract_id.filter(|other| *other != id) {
                debug!(image_set = %image_set.name, submitted_id = %other, "re-attaching image set");
            }

            let mut image_set = image_set.clone();
            image_set.product_abstract_id = Some(id);

            let claimed = match image_set.id {
                Some(set_id) => unclaimed.iter().position(|stored| stored.id == Some(set_id)),
                None => unclaimed
                    .iter()
                    .position(|stored| stored.name == image_set.name && stored.locale_id == image_set.locale_id),
            };
            if let Some(index) = claimed {
                let stored = unclaimed.swap_remove(index);
                image_set.id = image_set.id.or(stored.id);
            }

            kept.push(self.images.persist_image_set(image_set)?);
        }

        if replace {
            let removed = self.images.remove_image_sets_except(id, &kept)?;
            if removed > 0 {
                debug!(removed, "stale image sets removed");
            }
        }
        Ok(())
    }
}
