use serde::{Deserialize, Serialize};

use pim_core::{
    DomainError, DomainResult, LocaleId, ProductAbstractId, ProductImageSetId, TaxSetId,
    ValueObject,
};

use crate::attributes::Attributes;

/// Price type used when a caller submits a price without one.
pub const DEFAULT_PRICE_TYPE: &str = "DEFAULT";

/// Locale record as resolved by the locale service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    pub id: LocaleId,
    /// Locale name, e.g. `de_DE`.
    pub name: String,
}

impl Locale {
    pub fn new(id: LocaleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Attribute values of a product for one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedAttributes {
    pub locale: Locale,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl LocalizedAttributes {
    pub fn new(locale: Locale, name: impl Into<String>) -> Self {
        Self {
            locale,
            name: name.into(),
            description: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Abstract product price (owned by the price subsystem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    #[serde(default)]
    pub product_abstract_id: Option<ProductAbstractId>,
    /// Amount in the smallest currency unit (e.g. cents).
    pub amount: u64,
    #[serde(default)]
    pub price_type: String,
}

impl Price {
    pub fn new(amount: u64) -> Self {
        Self {
            product_abstract_id: None,
            amount,
            price_type: String::new(),
        }
    }

    pub fn with_price_type(mut self, price_type: impl Into<String>) -> Self {
        self.price_type = price_type.into();
        self
    }
}

impl ValueObject for Price {}

/// One image within an image set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub external_url_small: String,
    pub external_url_large: String,
    #[serde(default)]
    pub sort_order: u32,
}

impl ProductImage {
    pub fn new(small: impl Into<String>, large: impl Into<String>) -> Self {
        Self {
            external_url_small: small.into(),
            external_url_large: large.into(),
            sort_order: 0,
        }
    }
}

/// Image group attached to a product abstract (owned by the image subsystem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImageSet {
    #[serde(default)]
    pub id: Option<ProductImageSetId>,
    #[serde(default)]
    pub product_abstract_id: Option<ProductAbstractId>,
    pub name: String,
    /// `None` means the set applies to every locale.
    #[serde(default)]
    pub locale_id: Option<LocaleId>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

impl ProductImageSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            product_abstract_id: None,
            name: name.into(),
            locale_id: None,
            images: Vec::new(),
        }
    }

    pub fn with_locale(mut self, locale_id: LocaleId) -> Self {
        self.locale_id = Some(locale_id);
        self
    }

    pub fn with_image(mut self, image: ProductImage) -> Self {
        self.images.push(image);
        self
    }
}

/// Tax set record (joined to product abstracts through `tax_set_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSet {
    pub id: TaxSetId,
    pub name: String,
}

/// Aggregate: product abstract with its localized attributes, price and image sets.
///
/// `id` is `None` until the aggregate has been persisted for the first time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAbstract {
    #[serde(default)]
    pub id: Option<ProductAbstractId>,
    pub sku: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub tax_set_id: Option<TaxSetId>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub localized_attributes: Vec<LocalizedAttributes>,
    #[serde(default)]
    pub image_sets: Vec<ProductImageSet>,
}

impl ProductAbstract {
    pub fn new(sku: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: ProductAbstractId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    pub fn with_tax_set(mut self, tax_set_id: TaxSetId) -> Self {
        self.tax_set_id = Some(tax_set_id);
        self
    }

    pub fn with_price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_localized_attributes(mut self, localized: LocalizedAttributes) -> Self {
        self.localized_attributes.push(localized);
        self
    }

    pub fn with_image_set(mut self, image_set: ProductImageSet) -> Self {
        self.image_sets.push(image_set);
        self
    }

    /// Localized attributes for a locale name, if the product has been localized into it.
    pub fn localized_for(&self, locale_name: &str) -> Option<&LocalizedAttributes> {
        self.localized_attributes
            .iter()
            .find(|l| l.locale.name == locale_name)
    }
}

/// Concrete product (sellable variant); read-only input for attribute merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductConcrete {
    pub sku: String,
    pub product_abstract_id: ProductAbstractId,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub localized_attributes: Vec<LocalizedAttributes>,
}

/// Check that a SKU is writable: non-blank and within the storage column width.
pub fn validate_sku(sku: &str, max_length: usize) -> DomainResult<()> {
    if sku.trim().is_empty() {
        return Err(DomainError::validation("SKU cannot be empty"));
    }

    let length = sku.chars().count();
    if length > max_length {
        return Err(DomainError::validation(format!(
            "SKU is {length} characters long, maximum is {max_length}"
        )));
    }

    Ok(())
}
