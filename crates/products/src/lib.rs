//! Products domain module (product abstracts and their sub-aggregates).
//!
//! This crate contains the catalog's data model and the pure pieces of its
//! business rules: attribute encoding, SKU validation, attribute merging and
//! query criteria composition. No IO, no storage.

pub mod attribute_processor;
pub mod attributes;
pub mod codec;
pub mod product;
pub mod query;
pub mod record;

pub use attribute_processor::AttributeProcessor;
pub use attributes::Attributes;
pub use product::{
    DEFAULT_PRICE_TYPE, Locale, LocalizedAttributes, Price, ProductAbstract, ProductConcrete,
    ProductImage, ProductImageSet, TaxSet, validate_sku,
};
pub use query::{JoinCondition, JoinType, QueryCriteria, QueryCriteriaExpander, QueryJoin, Relation};
pub use record::{LocalizedAttributesRow, NewProductAbstractRow, ProductAbstractRow};
