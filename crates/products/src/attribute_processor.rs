//! Merged attribute view over an abstract product and its concrete variants.

use std::collections::{BTreeMap, BTreeSet};

use crate::attributes::Attributes;
use crate::product::{ProductAbstract, ProductConcrete};

/// Layered attribute view used by admin tooling to show which attributes a
/// product family defines and where each value comes from.
///
/// Layers, from lowest to highest precedence:
/// abstract → abstract localized → concrete → concrete localized.
/// Concrete layers are merged across all variants in the order given, later
/// variants overriding earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeProcessor {
    abstract_attributes: Attributes,
    abstract_localized_attributes: BTreeMap<String, Attributes>,
    concrete_attributes: Attributes,
    concrete_localized_attributes: BTreeMap<String, Attributes>,
}

impl AttributeProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_products(product: &ProductAbstract, concretes: &[ProductConcrete]) -> Self {
        let mut processor = Self {
            abstract_attributes: product.attributes.clone(),
            ..Self::default()
        };

        for localized in &product.localized_attributes {
            processor
                .abstract_localized_attributes
                .entry(localized.locale.name.clone())
                .or_default()
                .merge(&localized.attributes);
        }

        for concrete in concretes {
            processor.concrete_attributes.merge(&concrete.attributes);
            for localized in &concrete.localized_attributes {
                processor
                    .concrete_localized_attributes
                    .entry(localized.locale.name.clone())
                    .or_default()
                    .merge(&localized.attributes);
            }
        }

        processor
    }

    pub fn abstract_attributes(&self) -> &Attributes {
        &self.abstract_attributes
    }

    pub fn abstract_localized_attributes(&self, locale_name: &str) -> Option<&Attributes> {
        self.abstract_localized_attributes.get(locale_name)
    }

    pub fn concrete_attributes(&self) -> &Attributes {
        &self.concrete_attributes
    }

    pub fn concrete_localized_attributes(&self, locale_name: &str) -> Option<&Attributes> {
        self.concrete_localized_attributes.get(locale_name)
    }

    /// Locale names that carry localized attributes on either level.
    pub fn locales(&self) -> BTreeSet<String> {
        self.abstract_localized_attributes
            .keys()
            .chain(self.concrete_localized_attributes.keys())
            .cloned()
            .collect()
    }

    /// All attribute keys across every layer and locale.
    pub fn keys(&self) -> BTreeSet<String> {
        let mut keys: BTreeSet<String> = self.abstract_attributes.keys().cloned().collect();
        keys.extend(self.concrete_attributes.keys().cloned());
        for attrs in self
            .abstract_localized_attributes
            .values()
            .chain(self.concrete_localized_attributes.values())
        {
            keys.extend(attrs.keys().cloned());
        }
        keys
    }

    /// Effective attributes for `locale_name` (or the unlocalized layers only).
    pub fn merged(&self, locale_name: Option<&str>) -> Attributes {
        let mut merged = self.abstract_attributes.clone();

        if let Some(attrs) = locale_name.and_then(|l| self.abstract_localized_attributes.get(l)) {
            merged.merge(attrs);
        }

        merged.merge(&self.concrete_attributes);

        if let Some(attrs) = locale_name.and_then(|l| self.concrete_localized_attributes.get(l)) {
            merged.merge(attrs);
        }

        merged
    }

    pub fn is_empty(&self) -> bool {
        self.abstract_attributes.is_empty()
            && self.concrete_attributes.is_empty()
            && self.abstract_localized_attributes.values().all(Attributes::is_empty)
            && self.concrete_localized_attributes.values().all(Attributes::is_empty)
    }
}
