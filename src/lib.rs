// RetailStore - product catalog with case-insensitive name uniqueness, on SQLite

pub mod catalog;
pub mod error;
pub mod export;
pub mod models;
pub mod store;

// Re-export main types for convenience
pub use catalog::Catalog;
pub use error::CatalogError;
pub use export::{ImportSummary, export_jsonl, import_jsonl};
pub use models::{NewProduct, Product, ProductPatch, now_ms};
pub use store::ProductStore;
