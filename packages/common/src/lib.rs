pub mod catalog;
pub mod config;
#[cfg(feature = "sea-orm")]
pub mod entity;
pub mod error;
pub mod file_ref;
pub mod filter;
pub mod object_id;
pub mod retry;
pub mod sky;
pub mod store;

pub use catalog::{
    CatalogRow, CatalogStats, DecodedCatalog, IngestRecord, QuadrantHeader, SourceRecord,
    Validators,
};
pub use error::{CatalogError, StoreError};
pub use file_ref::FileRef;
pub use filter::Filter;
pub use object_id::SourceKey;
pub use sky::{ConeQuery, SkyPoint};
