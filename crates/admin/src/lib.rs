//! Catalog admin tooling: service wiring and bulk import.

pub mod app;
pub mod import;
