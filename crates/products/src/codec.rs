//! Attribute codec: attribute maps ↔ storage blobs.
//!
//! Blobs are JSON object documents. The empty JSON array `[]` is also accepted
//! on decode as the empty mapping, since array-based encoders write empty
//! attribute sets that way.

use std::collections::BTreeSet;

use serde_json::Value as JsonValue;

use pim_core::{DomainError, DomainResult, ProductAbstractId};

use crate::attributes::Attributes;
use crate::product::{Locale, LocalizedAttributes, ProductAbstract};
use crate::record::LocalizedAttributesRow;

/// Encode an attribute map into its storage blob.
pub fn encode(attributes: &Attributes) -> DomainResult<String> {
    serde_json::to_string(attributes)
        .map_err(|e| DomainError::validation(format!("attribute encoding failed: {e}")))
}

/// Decode a storage blob back into an attribute map.
pub fn decode(blob: &str) -> DomainResult<Attributes> {
    let value: JsonValue =
        serde_json::from_str(blob).map_err(|e| DomainError::decode(e.to_string()))?;

    match value {
        JsonValue::Object(map) => Ok(map.into_iter().collect()),
        JsonValue::Array(items) if items.is_empty() => Ok(Attributes::new()),
        other => Err(DomainError::decode(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a non-empty array",
        JsonValue::Object(_) => "an object",
    }
}

/// Build one localized attribute row per locale the product is localized into.
///
/// Used on both create and update; on update each row replaces the stored row
/// for the same locale. A product may carry at most one entry per locale.
pub fn build_localized_attributes(
    product_abstract_id: ProductAbstractId,
    product: &ProductAbstract,
) -> DomainResult<Vec<LocalizedAttributesRow>> {
    let mut seen = BTreeSet::new();
    let mut rows = Vec::with_capacity(product.localized_attributes.len());

    for localized in &product.localized_attributes {
        if !seen.insert(localized.locale.id) {
            return Err(DomainError::validation(format!(
                "duplicate localized attributes for locale '{}'",
                localized.locale.name
            )));
        }

        rows.push(LocalizedAttributesRow {
            product_abstract_id,
            locale_id: localized.locale.id,
            name: localized.name.clone(),
            description: localized.description.clone(),
            attributes: encode(&localized.attributes)?,
        });
    }

    Ok(rows)
}

/// Rebuild localized attributes from a stored row and its resolved locale.
pub fn localized_attributes_from_row(
    row: &LocalizedAttributesRow,
    locale: Locale,
) -> DomainResult<LocalizedAttributes> {
    Ok(LocalizedAttributes {
        locale,
        name: row.name.clone(),
        description: row.description.clone(),
        attributes: decode(&row.attributes)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pim_core::LocaleId;
    use serde_json::json;

    fn de() -> Locale {
        Locale::new(LocaleId::new(46), "de_DE")
    }

    fn en() -> Locale {
        Locale::new(LocaleId::new(66), "en_US")
    }

    #[test]
    fn encodes_sorted_json_object() {
        let attrs = Attributes::new().with("size", "M").with("color", "red");
        assert_eq!(encode(&attrs).unwrap(), r#"{"color":"red","size":"M"}"#);
    }

    #[test]
    fn empty_mapping_round_trips() {
        let blob = encode(&Attributes::new()).unwrap();
        assert_eq!(blob, "{}");
        assert_eq!(decode(&blob).unwrap(), Attributes::new());
    }

    #[test]
    fn nested_values_round_trip() {
        let attrs = Attributes::new()
            .with("dimensions", json!({"w": 10, "h": 20, "unit": "cm"}))
            .with("tags", json!(["a", "b", null, true]))
            .with("weight", json!(1.25));
        assert_eq!(decode(&encode(&attrs).unwrap()).unwrap(), attrs);
    }

    #[test]
    fn legacy_empty_array_decodes_to_empty_mapping() {
        assert_eq!(decode("[]").unwrap(), Attributes::new());
    }

    #[test]
    fn malformed_blob_is_a_decode_error() {
        assert!(matches!(decode("{\"color\":"), Err(DomainError::Decode(_))));
        assert!(matches!(decode(""), Err(DomainError::Decode(_))));
    }

    #[test]
    fn non_object_documents_are_decode_errors() {
        for blob in ["null", "42", "\"red\"", "[1,2]", "true"] {
            match decode(blob) {
                Err(DomainError::Decode(_)) => {}
                other => panic!("expected Decode error for {blob}, got {other:?}"),
            }
        }
    }

    #[test]
    fn builds_one_row_per_locale() {
        let id = ProductAbstractId::new(42);
        let product = ProductAbstract::new("ABC-1")
            .with_localized_attributes(
                LocalizedAttributes::new(de(), "Rot")
                    .with_attributes(Attributes::new().with("color", "rot")),
            )
            .with_localized_attributes(LocalizedAttributes::new(en(), "Red").with_description("A red thing"));

        let rows = build_localized_attributes(id, &product).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_abstract_id, id);
        assert_eq!(rows[0].locale_id, LocaleId::new(46));
        assert_eq!(rows[0].attributes, r#"{"color":"rot"}"#);
        assert_eq!(rows[1].locale_id, LocaleId::new(66));
        assert_eq!(rows[1].description.as_deref(), Some("A red thing"));
        assert_eq!(rows[1].attributes, "{}");
    }

    #[test]
    fn rejects_duplicate_locales() {
        let product = ProductAbstract::new("ABC-1")
            .with_localized_attributes(LocalizedAttributes::new(de(), "Rot"))
            .with_localized_attributes(LocalizedAttributes::new(de(), "Blau"));

        let err = build_localized_attributes(ProductAbstractId::new(1), &product).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn row_converts_back_with_resolved_locale() {
        let row = LocalizedAttributesRow {
            product_abstract_id: ProductAbstractId::new(1),
            locale_id: LocaleId::new(46),
            name: "Rot".to_string(),
            description: None,
            attributes: r#"{"color":"rot"}"#.to_string(),
        };

        let localized = localized_attributes_from_row(&row, de()).unwrap();
        assert_eq!(localized.locale, de());
        assert_eq!(localized.attributes.get("color"), Some(&json!("rot")));
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn leaf() -> impl Strategy<Value = JsonValue> {
            prop_oneof![
                Just(JsonValue::Null),
                any::<bool>().prop_map(JsonValue::from),
                any::<i64>().prop_map(JsonValue::from),
                any::<f64>()
                    .prop_filter("finite", |f| f.is_finite())
                    .prop_map(JsonValue::from),
                "[\\PC]{0,16}".prop_map(JsonValue::from),
            ]
        }

        fn json_value() -> impl Strategy<Value = JsonValue> {
            leaf().prop_recursive(3, 32, 6, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..6).prop_map(JsonValue::Array),
                    prop::collection::btree_map("[a-z_]{1,8}", inner, 0..6)
                        .prop_map(|m| JsonValue::Object(m.into_iter().collect())),
                ]
            })
        }

        fn attributes() -> impl Strategy<Value = Attributes> {
            prop::collection::btree_map("[\\PC]{0,12}", json_value(), 0..8).prop_map(Attributes::from)
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: decode(encode(m)) == m for every attribute map.
            #[test]
            fn decode_inverts_encode(attrs in attributes()) {
                let blob = encode(&attrs).unwrap();
                prop_assert_eq!(decode(&blob).unwrap(), attrs);
            }

            /// Property: encoding is deterministic.
            #[test]
            fn encode_is_deterministic(attrs in attributes()) {
                prop_assert_eq!(encode(&attrs).unwrap(), encode(&attrs.clone()).unwrap());
            }
        }
    }
}
