//! Storage-shaped records: what the product abstract tables actually hold.
//!
//! Attribute maps are stored encoded (see [`crate::codec`]); the aggregate in
//! [`crate::product`] is what callers see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pim_core::{Entity, LocaleId, ProductAbstractId, TaxSetId};

/// Base row of a product abstract before it has been assigned an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProductAbstractRow {
    pub sku: String,
    /// Encoded attribute blob.
    pub attributes: String,
    pub tax_set_id: Option<TaxSetId>,
}

/// Persisted base row of a product abstract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAbstractRow {
    pub id: ProductAbstractId,
    pub sku: String,
    /// Encoded attribute blob.
    pub attributes: String,
    pub tax_set_id: Option<TaxSetId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for ProductAbstractRow {
    type Id = ProductAbstractId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Localized attribute row, keyed by `(product_abstract_id, locale_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedAttributesRow {
    pub product_abstract_id: ProductAbstractId,
    pub locale_id: LocaleId,
    pub name: String,
    pub description: Option<String>,
    /// Encoded attribute blob.
    pub attributes: String,
}
