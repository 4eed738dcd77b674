//! Bulk import of product abstracts from a JSON document.
//!
//! ```json
//! {
//!   "locales": [{ "id": 46, "name": "de_DE" }],
//!   "tax_sets": [{ "id": 1, "name": "Standard" }],
//!   "products": [{ "sku": "ABC-1", "attributes": { "color": "red" } }]
//! }
//! ```
//!
//! A bare array of products is accepted too; its locales are then taken from
//! the products' localized attributes.
//!
//! Products whose SKU already exists are updated in place; the rest are
//! created. A failing product is reported and does not stop the import.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pim_core::ProductAbstractId;
use pim_infra::CatalogError;
use pim_products::{Locale, ProductAbstract, TaxSet};

use crate::app::Catalog;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawImportFile")]
pub struct ImportFile {
    pub locales: Vec<Locale>,
    pub tax_sets: Vec<TaxSet>,
    pub products: Vec<ProductAbstract>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawImportFile {
    Products(Vec<ProductAbstract>),
    Full {
        #[serde(default)]
        locales: Vec<Locale>,
        #[serde(default)]
        tax_sets: Vec<TaxSet>,
        #[serde(default)]
        products: Vec<ProductAbstract>,
    },
}

impl From<RawImportFile> for ImportFile {
    fn from(raw: RawImportFile) -> Self {
        match raw {
            RawImportFile::Products(products) => {
                let locales: BTreeMap<_, _> = products
                    .iter()
                    .flat_map(|product| &product.localized_attributes)
                    .map(|localized| (localized.locale.id, localized.locale.clone()))
                    .collect();
                Self {
                    locales: locales.into_values().collect(),
                    tax_sets: Vec::new(),
                    products,
                }
            }
            RawImportFile::Full {
                locales,
                tax_sets,
                products,
            } => Self {
                locales,
                tax_sets,
                products,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    Created { sku: String, id: ProductAbstractId },
    Updated { sku: String, id: ProductAbstractId },
    Failed { sku: String, error: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub outcomes: Vec<ImportOutcome>,
}

impl ImportReport {
    fn record(&mut self, outcome: ImportOutcome) {
        match &outcome {
            ImportOutcome::Created { .. } => self.created += 1,
            ImportOutcome::Updated { .. } => self.updated += 1,
            ImportOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

pub fn run_import(catalog: &Catalog, file: ImportFile) -> anyhow::Result<ImportReport> {
    catalog.seed(&file.locales, &file.tax_sets)?;

    let mut report = ImportReport::default();
    for product in file.products {
        let sku = product.sku.clone();
        let outcome = match import_one(catalog, product) {
            Ok((id, true)) => ImportOutcome::Created { sku, id },
            Ok((id, false)) => ImportOutcome::Updated { sku, id },
            Err(err) => {
                warn!(sku = %sku, error = %err, "product import failed");
                ImportOutcome::Failed {
                    sku,
                    error: err.to_string(),
                }
            }
        };
        report.record(outcome);
    }

    info!(
        created = report.created,
        updated = report.updated,
        failed = report.failed,
        "import finished"
    );
    Ok(report)
}

/// Returns the product's id and whether it was newly created.
fn import_one(catalog: &Catalog, mut product: ProductAbstract) -> Result<(ProductAbstractId, bool), CatalogError> {
    match catalog.lookup.find_by_sku(&product.sku)? {
        Some(id) => {
            product.id = Some(id);
            catalog.writer.update(&product).map(|id| (id, false))
        }
        None => catalog.writer.create(&product).map(|id| (id, true)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pim_infra::CatalogConfig;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> ImportFile {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn creates_then_updates_by_sku() {
        let catalog = Catalog::build(CatalogConfig::default());
        let file = parse(json!({
            "locales": [{ "id": 46, "name": "de_DE" }],
            "tax_sets": [{ "id": 1, "name": "Standard" }],
            "products": [
                { "sku": "ABC-1", "attributes": { "color": "red" }, "tax_set_id": 1 },
                { "sku": "ABC-2", "price": { "amount": 999 } },
                { "sku": "ABC-1", "attributes": { "color": "blue" } }
            ]
        }));

        let report = run_import(&catalog, file).unwrap();

        assert_eq!((report.created, report.updated, report.failed), (2, 1, 0));
        let first = catalog.lookup.find_by_sku_full("ABC-1").unwrap().unwrap();
        assert_eq!(first.attributes.get("color"), Some(&json!("blue")));
        assert_eq!(first.tax_set_id, None);
        let second = catalog.lookup.find_by_sku_full("ABC-2").unwrap().unwrap();
        assert_eq!(second.price.map(|p| p.price_type), Some("DEFAULT".to_string()));
    }

    #[test]
    fn failures_are_reported_and_do_not_stop_the_import() {
        let catalog = Catalog::build(CatalogConfig::default());
        let file = parse(json!({
            "products": [
                { "sku": "  " },
                { "sku": "OK-1" }
            ]
        }));

        let report = run_import(&catalog, file).unwrap();

        assert_eq!((report.created, report.failed), (1, 1));
        assert!(matches!(&report.outcomes[0], ImportOutcome::Failed { sku, .. } if sku == "  "));
        assert!(catalog.lookup.find_by_sku("OK-1").unwrap().is_some());
    }

    #[test]
    fn bare_product_array_brings_its_own_locales() {
        let catalog = Catalog::build(CatalogConfig::default());
        let file = parse(json!([
            {
                "sku": "ABC-1",
                "localized_attributes": [
                    { "locale": { "id": 46, "name": "de_DE" }, "name": "Rot" }
                ]
            }
        ]));
        assert_eq!(file.locales.len(), 1);

        let report = run_import(&catalog, file).unwrap();

        assert_eq!(report.created, 1);
        let product = catalog.lookup.find_by_sku_full("ABC-1").unwrap().unwrap();
        assert_eq!(product.localized_for("de_DE").map(|l| l.name.as_str()), Some("Rot"));
    }

    #[test]
    fn rerunning_an_import_keeps_image_sets_stable() {
        let catalog = Catalog::build(CatalogConfig::default());
        let value = json!({
            "locales": [{ "id": 46, "name": "de_DE" }],
            "products": [{
                "sku": "ABC-1",
                "image_sets": [
                    { "name": "default", "images": [{ "external_url_small": "s.jpg", "external_url_large": "l.jpg" }] },
                    { "name": "default", "locale_id": 46 }
                ]
            }]
        });

        run_import(&catalog, parse(value.clone())).unwrap();
        let report = run_import(&catalog, parse(value)).unwrap();

        assert_eq!(report.updated, 1);
        let product = catalog.lookup.find_by_sku_full("ABC-1").unwrap().unwrap();
        assert_eq!(product.image_sets.len(), 2);
        assert_eq!(catalog.db.image_set_count().unwrap(), 2);
    }

    #[test]
    fn report_serializes_with_outcome_tags() {
        let mut report = ImportReport::default();
        report.record(ImportOutcome::Created {
            sku: "ABC-1".to_string(),
            id: ProductAbstractId::new(1),
        });

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["created"], json!(1));
        assert_eq!(value["outcomes"][0]["outcome"], json!("created"));
        assert_eq!(value["outcomes"][0]["sku"], json!("ABC-1"));
    }
}
