//! Read path: reconstitutes product abstract aggregates from storage and the
//! external collaborators.

use tracing::{instrument, warn};

use pim_core::ProductAbstractId;
use pim_products::{
    AttributeProcessor, LocalizedAttributes, ProductAbstract, ProductAbstractRow,
    QueryCriteriaExpander, codec,
};

use crate::catalog_store::ProductAbstractStore;
use crate::error::CatalogError;
use crate::external::{ConcreteProductService, ImageService, LocaleService, PriceService};

/// Product abstract queries.
///
/// Missing dependent records (price, tax set, images, localized rows whose
/// locale is gone) leave the corresponding fields unset: partial aggregates are
/// valid results.
#[derive(Debug)]
pub struct ProductAbstractLookup<S, P, I, L, C> {
    store: S,
    prices: P,
    images: I,
    locales: L,
    concretes: C,
}

impl<S, P, I, L, C> ProductAbstractLookup<S, P, I, L, C> {
    pub fn new(store: S, prices: P, images: I, locales: L, concretes: C) -> Self {
        Self {
            store,
            prices,
            images,
            locales,
            concretes,
        }
    }
}

impl<S, P, I, L, C> ProductAbstractLookup<S, P, I, L, C>
where
    S: ProductAbstractStore,
    P: PriceService,
    I: ImageService,
    L: LocaleService,
    C: ConcreteProductService,
{
    pub fn find_by_sku(&self, sku: &str) -> Result<Option<ProductAbstractId>, CatalogError> {
        Ok(self.store.find_by_sku(sku)?.map(|row| row.id))
    }

    #[instrument(skip(self), err)]
    pub fn find_by_id(&self, id: ProductAbstractId) -> Result<Option<ProductAbstract>, CatalogError> {
        match self.store.find_by_id(id)? {
            Some(row) => self.hydrate(row).map(Some),
            None => Ok(None),
        }
    }

    /// Full aggregate for a SKU.
    pub fn find_by_sku_full(&self, sku: &str) -> Result<Option<ProductAbstract>, CatalogError> {
        match self.store.find_by_sku(sku)? {
            Some(row) => self.hydrate(row).map(Some),
            None => Ok(None),
        }
    }

    /// Ids of the product abstracts matching the expanded criteria, ordered by id.
    pub fn list(&self, expander: &QueryCriteriaExpander) -> Result<Vec<ProductAbstractId>, CatalogError> {
        let criteria = expander.build();
        Ok(self
            .store
            .query(&criteria)?
            .into_iter()
            .map(|row| row.id)
            .collect())
    }

    /// Layered attribute view of a product abstract and its concrete products.
    pub fn attribute_processor(&self, id: ProductAbstractId) -> Result<AttributeProcessor, CatalogError> {
        let Some(product) = self.find_by_id(id)? else {
            return Ok(AttributeProcessor::new());
        };
        let concretes = self.concretes.concrete_products_by_abstract_id(id)?;
        Ok(AttributeProcessor::from_products(&product, &concretes))
    }

    fn hydrate(&self, row: ProductAbstractRow) -> Result<ProductAbstract, CatalogError> {
        let id = row.id;
        let attributes = codec::decode(&row.attributes)?;
        let localized_attributes = self.localized_attributes(id)?;
        let price = self.prices.abstract_price(id)?;
        let tax_set_id = self.store.tax_set_for(id)?.map(|tax_set| tax_set.id);
        let image_sets = self.images.image_sets_by_abstract_id(id)?;

        Ok(ProductAbstract {
            id: Some(id),
            sku: row.sku,
            attributes,
            tax_set_id,
            price,
            localized_attributes,
            image_sets,
        })
    }

    fn localized_attributes(&self, id: ProductAbstractId) -> Result<Vec<LocalizedAttributes>, CatalogError> {
        let mut localized = Vec::new();

        for row in self.store.localized_attributes(id)? {
            let locale = match self.locales.locale_by_id(row.locale_id) {
                Ok(locale) => locale,
                Err(err) if err.is_not_found() => {
                    warn!(product_abstract_id = %id, locale_id = %row.locale_id, "skipping localized attributes of unknown locale");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            localized.push(codec::localized_attributes_from_row(&row, locale)?);
        }

        Ok(localized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use pim_core::{LocaleId, TaxSetId};
    use pim_products::{
        Attributes, Locale, NewProductAbstractRow, Price, ProductConcrete, ProductImageSet, QueryJoin,
        Relation, TaxSet,
    };
    use serde_json::json;

    use crate::catalog_store::InMemoryCatalogDatabase;
    use crate::config::CatalogConfig;
    use crate::external::ServiceError;
    use crate::writer::ProductAggregateWriter;

    type Db = Arc<InMemoryCatalogDatabase>;

    fn de() -> Locale {
        Locale::new(LocaleId::new(46), "de_DE")
    }

    fn setup() -> Db {
        let db = Arc::new(InMemoryCatalogDatabase::new());
        db.add_locale(de()).unwrap();
        db.add_tax_set(TaxSet {
            id: TaxSetId::new(1),
            name: "Standard".to_string(),
        })
        .unwrap();
        db
    }

    fn lookup(db: &Db) -> ProductAbstractLookup<Db, Db, Db, Db, Db> {
        ProductAbstractLookup::new(db.clone(), db.clone(), db.clone(), db.clone(), db.clone())
    }

    fn writer(db: &Db) -> ProductAggregateWriter<Db, Db, Db, Db> {
        ProductAggregateWriter::new(db.clone(), db.clone(), db.clone(), db.clone(), CatalogConfig::default())
    }

    fn raw_insert(db: &Db, sku: &str, attributes: &str, tax_set_id: Option<TaxSetId>) -> ProductAbstractId {
        db.insert(NewProductAbstractRow {
            sku: sku.to_string(),
            attributes: attributes.to_string(),
            tax_set_id,
        })
        .unwrap()
        .id
    }

    #[test]
    fn unknown_id_and_sku_are_absent() {
        let db = setup();
        let lookup = lookup(&db);
        assert_eq!(lookup.find_by_id(ProductAbstractId::new(7)).unwrap(), None);
        assert_eq!(lookup.find_by_sku("NOPE").unwrap(), None);
        assert_eq!(lookup.find_by_sku_full("NOPE").unwrap(), None);
    }

    #[test]
    fn reconstitutes_full_aggregate() {
        let db = setup();
        let product = ProductAbstract::new("ABC-1")
            .with_attribute("color", "red")
            .with_tax_set(TaxSetId::new(1))
            .with_price(Price::new(999))
            .with_localized_attributes(LocalizedAttributes::new(de(), "Rot").with_description("Ein rotes Ding"))
            .with_image_set(ProductImageSet::new("default").with_locale(LocaleId::new(46)));
        let id = writer(&db).create(&product).unwrap();

        let found = lookup(&db).find_by_id(id).unwrap().unwrap();

        assert_eq!(found.id, Some(id));
        assert_eq!(found.sku, "ABC-1");
        assert_eq!(found.attributes.get("color"), Some(&json!("red")));
        assert_eq!(found.tax_set_id, Some(TaxSetId::new(1)));
        assert_eq!(found.price.as_ref().map(|p| p.amount), Some(999));
        assert_eq!(found.localized_attributes.len(), 1);
        assert_eq!(found.localized_attributes[0].locale, de());
        assert_eq!(found.localized_attributes[0].description.as_deref(), Some("Ein rotes Ding"));
        assert_eq!(found.image_sets.len(), 1);
        assert_eq!(lookup(&db).find_by_sku_full("ABC-1").unwrap(), Some(found));
    }

    #[test]
    fn bare_row_yields_partial_aggregate() {
        let db = setup();
        let id = raw_insert(&db, "BARE", "{}", None);

        let found = lookup(&db).find_by_id(id).unwrap().unwrap();

        assert!(found.attributes.is_empty());
        assert_eq!(found.price, None);
        assert_eq!(found.tax_set_id, None);
        assert!(found.localized_attributes.is_empty());
        assert!(found.image_sets.is_empty());
    }

    #[test]
    fn dangling_tax_set_reads_as_unset() {
        let db = setup();
        let id = raw_insert(&db, "DANGLING", "{}", Some(TaxSetId::new(99)));

        let found = lookup(&db).find_by_id(id).unwrap().unwrap();
        assert_eq!(found.tax_set_id, None);
    }

    #[test]
    fn legacy_empty_array_blob_decodes_as_empty() {
        let db = setup();
        let id = raw_insert(&db, "LEGACY", "[]", None);

        assert!(lookup(&db).find_by_id(id).unwrap().unwrap().attributes.is_empty());
    }

    #[test]
    fn corrupt_blob_surfaces_decode_error() {
        let db = setup();
        let id = raw_insert(&db, "CORRUPT", "{not json", None);

        assert!(matches!(lookup(&db).find_by_id(id), Err(CatalogError::Decode(_))));
    }

    #[test]
    fn localized_rows_of_unknown_locales_are_skipped() {
        struct ForgetfulLocales;

        impl LocaleService for ForgetfulLocales {
            fn locale_by_id(&self, id: LocaleId) -> Result<Locale, ServiceError> {
                Err(ServiceError::not_found("locale", id))
            }
        }

        let db = setup();
        let id = writer(&db)
            .create(&ProductAbstract::new("ABC-1").with_localized_attributes(LocalizedAttributes::new(de(), "Rot")))
            .unwrap();

        let lookup = ProductAbstractLookup::new(db.clone(), db.clone(), db.clone(), ForgetfulLocales, db.clone());
        let found = lookup.find_by_id(id).unwrap().unwrap();

        assert!(found.localized_attributes.is_empty());
        assert_eq!(found.sku, "ABC-1");
    }

    #[test]
    fn list_applies_expanded_criteria() {
        let db = setup();
        let writer = writer(&db);
        let a = writer
            .create(&ProductAbstract::new("SHIRT-1").with_localized_attributes(LocalizedAttributes::new(de(), "Hemd")))
            .unwrap();
        let b = writer.create(&ProductAbstract::new("SHIRT-2")).unwrap();
        writer.create(&ProductAbstract::new("SHOE-1")).unwrap();

        let lookup = lookup(&db);
        let prefixed = QueryCriteriaExpander::new().with(|c| c.with_sku_prefix("SHIRT"));
        assert_eq!(lookup.list(&prefixed).unwrap(), vec![a, b]);

        let localized = prefixed.with(|c| c.with_join(QueryJoin::inner(Relation::LocalizedAttributes)));
        assert_eq!(lookup.list(&localized).unwrap(), vec![a]);
    }

    #[test]
    fn attribute_processor_merges_concrete_layers() {
        let db = setup();
        let id = writer(&db)
            .create(
                &ProductAbstract::new("ABC-1")
                    .with_attribute("color", "red")
                    .with_attribute("material", "cotton"),
            )
            .unwrap();
        db.add_concrete_product(ProductConcrete {
            sku: "ABC-1-M".to_string(),
            product_abstract_id: id,
            attributes: Attributes::new().with("size", "M").with("color", "blue"),
            localized_attributes: Vec::new(),
        })
        .unwrap();

        let processor = lookup(&db).attribute_processor(id).unwrap();
        let merged = processor.merged(None);

        assert_eq!(merged.get("color"), Some(&json!("blue")));
        assert_eq!(merged.get("material"), Some(&json!("cotton")));
        assert_eq!(merged.get("size"), Some(&json!("M")));
    }

    #[test]
    fn attribute_processor_of_missing_abstract_is_empty() {
        let db = setup();
        assert!(lookup(&db).attribute_processor(ProductAbstractId::new(1)).unwrap().is_empty());
    }
}
