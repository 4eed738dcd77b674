//! SKU uniqueness checks for the write paths.
//!
//! This is the application-level check. It cannot close the race between check
//! and insert on its own; the storage unique index on SKU does that.

use tracing::debug;

use pim_core::ProductAbstractId;

use crate::error::CatalogError;
use crate::external::ProductService;

#[derive(Debug, Clone)]
pub struct UniquenessGuard<Q> {
    products: Q,
}

impl<Q> UniquenessGuard<Q> {
    pub fn new(products: Q) -> Self {
        Self { products }
    }
}

impl<Q: ProductService> UniquenessGuard<Q> {
    /// Fail with `DuplicateSku` when `sku` is held by a product abstract other
    /// than `exclude_id` (any product abstract when `exclude_id` is `None`).
    pub fn assert_sku_unique(
        &self,
        sku: &str,
        exclude_id: Option<ProductAbstractId>,
    ) -> Result<(), CatalogError> {
        let taken = match exclude_id {
            None => self.products.has_product_abstract(sku)?,
            Some(own_id) => matches!(
                self.products.product_abstract_id_by_sku(sku)?,
                Some(holder) if holder != own_id
            ),
        };

        if taken {
            debug!(sku, exclude_id = ?exclude_id, "sku already taken");
            return Err(CatalogError::duplicate_sku(sku));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::{InMemoryCatalogDatabase, ProductAbstractStore};
    use pim_products::NewProductAbstractRow;
    use std::sync::Arc;

    fn setup() -> (UniquenessGuard<Arc<InMemoryCatalogDatabase>>, ProductAbstractId) {
        let db = Arc::new(InMemoryCatalogDatabase::new());
        let row = db
            .insert(NewProductAbstractRow {
                sku: "ABC-1".to_string(),
                attributes: "{}".to_string(),
                tax_set_id: None,
            })
            .unwrap();
        (UniquenessGuard::new(db), row.id)
    }

    #[test]
    fn unused_sku_passes() {
        let (guard, id) = setup();
        assert!(guard.assert_sku_unique("ABC-2", None).is_ok());
        assert!(guard.assert_sku_unique("ABC-2", Some(id)).is_ok());
    }

    #[test]
    fn taken_sku_fails_without_exclusion() {
        let (guard, _) = setup();
        let err = guard.assert_sku_unique("ABC-1", None).unwrap_err();
        assert_eq!(err, CatalogError::duplicate_sku("ABC-1"));
        assert!(err.to_string().contains("ABC-1"));
    }

    #[test]
    fn own_sku_passes_when_excluded() {
        let (guard, id) = setup();
        assert!(guard.assert_sku_unique("ABC-1", Some(id)).is_ok());
    }

    #[test]
    fn sku_held_by_other_id_fails() {
        let (guard, id) = setup();
        let other = ProductAbstractId::new(id.get() + 1);
        assert!(matches!(
            guard.assert_sku_unique("ABC-1", Some(other)),
            Err(CatalogError::DuplicateSku { .. })
        ));
    }
}
