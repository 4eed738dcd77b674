//! Infrastructure layer: storage, transactions, external collaborators, and the
//! catalog write/read paths built on them.

pub mod catalog_store;
pub mod config;
pub mod error;
pub mod external;
pub mod lookup;
pub mod uniqueness;
pub mod writer;

pub use config::{CatalogConfig, ConfigError};
pub use error::CatalogError;
pub use lookup::ProductAbstractLookup;
pub use uniqueness::UniquenessGuard;
pub use writer::ProductAggregateWriter;
