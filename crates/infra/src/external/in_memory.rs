//! Collaborator implementations backed by the in-memory catalog database.
//!
//! Because they write to the same tables, their writes are covered by the
//! database's transactions.

use pim_core::{LocaleId, ProductAbstractId, ProductImageSetId};
use pim_products::{Locale, Price, ProductConcrete, ProductImageSet};

use crate::catalog_store::{InMemoryCatalogDatabase, StoreError};

use super::{
    ConcreteProductService, ImageService, LocaleService, PriceService, ProductService,
    ServiceError,
};

impl PriceService for InMemoryCatalogDatabase {
    fn persist_abstract_price(&self, price: &Price) -> Result<(), ServiceError> {
        let id = price
            .product_abstract_id
            .ok_or_else(|| ServiceError::rejected("price", "price has no product abstract id"))?;

        let mut tables = self.write_tables()?;
        tables.require_product_abstract(id)?;
        tables.prices.insert(id, price.clone());
        Ok(())
    }

    fn abstract_price(&self, id: ProductAbstractId) -> Result<Option<Price>, ServiceError> {
        Ok(self.read_tables()?.prices.get(&id).cloned())
    }
}

impl ImageService for InMemoryCatalogDatabase {
    fn persist_image_set(&self, mut image_set: ProductImageSet) -> Result<ProductImageSetId, ServiceError> {
        let abstract_id = image_set
            .product_abstract_id
            .ok_or_else(|| ServiceError::rejected("image", "image set has no product abstract id"))?;

        let mut tables = self.write_tables()?;
        tables.require_product_abstract(abstract_id)?;

        let id = match image_set.id {
            Some(id) => match tables.image_sets.get(&id) {
                Some(stored) if stored.product_abstract_id == Some(abstract_id) => id,
                Some(stored) => {
                    return Err(ServiceError::rejected(
                        "image",
                        format!(
                            "image set {id} belongs to product abstract {}",
                            stored
                                .product_abstract_id
                                .map_or_else(|| "none".to_string(), |owner| owner.to_string())
                        ),
                    ));
                }
                None => {
                    return Err(StoreError::RowNotFound(format!("product image set {id}")).into());
                }
            },
            None => tables.next_image_set_id(),
        };

        image_set.id = Some(id);
        tables.image_sets.insert(id, image_set);
        Ok(id)
    }

    fn image_sets_by_abstract_id(
        &self,
        id: ProductAbstractId,
    ) -> Result<Vec<ProductImageSet>, ServiceError> {
        Ok(self
            .read_tables()?
            .image_sets
            .values()
            .filter(|set| set.product_abstract_id == Some(id))
            .cloned()
            .collect())
    }

    fn remove_image_sets_except(
        &self,
        id: ProductAbstractId,
        keep: &[ProductImageSetId],
    ) -> Result<usize, ServiceError> {
        let mut tables = self.write_tables()?;
        let before = tables.image_sets.len();
        tables
            .image_sets
            .retain(|set_id, set| set.product_abstract_id != Some(id) || keep.contains(set_id));
        Ok(before - tables.image_sets.len())
    }
}

impl LocaleService for InMemoryCatalogDatabase {
    fn locale_by_id(&self, id: LocaleId) -> Result<Locale, ServiceError> {
        self.read_tables()?
            .locales
            .get(&id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("locale", id))
    }
}

impl ProductService for InMemoryCatalogDatabase {
    fn has_product_abstract(&self, sku: &str) -> Result<bool, ServiceError> {
        Ok(self
            .read_tables()?
            .product_abstracts
            .values()
            .any(|row| row.sku == sku))
    }

    fn product_abstract_id_by_sku(&self, sku: &str) -> Result<Option<ProductAbstractId>, ServiceError> {
        Ok(self
            .read_tables()?
            .product_abstracts
            .values()
            .find(|row| row.sku == sku)
            .map(|row| row.id))
    }
}

impl ConcreteProductService for InMemoryCatalogDatabase {
    fn concrete_products_by_abstract_id(
        &self,
        id: ProductAbstractId,
    ) -> Result<Vec<ProductConcrete>, ServiceError> {
        Ok(self
            .read_tables()?
            .concrete_products
            .values()
            .filter(|concrete| concrete.product_abstract_id == id)
            .cloned()
            .collect())
    }
}
