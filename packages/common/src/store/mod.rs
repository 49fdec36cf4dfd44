//! Storage ports for the catalog.
//!
//! The ingest pipeline reads validators through [`MetadataStore`] and writes
//! through [`CatalogWriter`]; the query API only sees [`CatalogReader`].

mod memory;
#[cfg(feature = "sea-orm")]
pub mod postgres;

use async_trait::async_trait;

use crate::catalog::{CatalogStats, DecodedCatalog, SourceRecord, Validators};
use crate::error::StoreError;
use crate::file_ref::FileRef;
use crate::object_id::SourceKey;
use crate::sky::ConeQuery;

pub use memory::MemoryCatalog;

/// Read access to per-file fetch metadata.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Validators recorded by the last successful ingest of `file`, if any.
    async fn stored_validators(&self, file: &FileRef) -> Result<Option<Validators>, StoreError>;
}

/// Transactional replacement of one quadrant.
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    /// Upsert the quadrant header, replace every source row of `file` with
    /// `catalog.rows`, and record `validators`, all in one atomic unit.
    ///
    /// Returns the number of rows inserted. On error nothing is changed.
    async fn replace_quadrant(
        &self,
        file: &FileRef,
        catalog: &DecodedCatalog,
        validators: &Validators,
    ) -> Result<u64, StoreError>;
}

/// Read-only catalog queries.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Confirm the backend is reachable without touching catalog data.
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn find_source(&self, key: &SourceKey) -> Result<Option<SourceRecord>, StoreError>;

    /// Sources inside the cone, nearest first, at most
    /// [`MAX_CONE_RESULTS`](crate::sky::MAX_CONE_RESULTS).
    async fn cone_search(&self, cone: &ConeQuery) -> Result<Vec<SourceRecord>, StoreError>;

    async fn approximate_counts(&self) -> Result<CatalogStats, StoreError>;
}
