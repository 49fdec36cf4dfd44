use std::collections::{BTreeMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{CatalogReader, CatalogWriter, MetadataStore};
use crate::catalog::{
    CatalogRow, CatalogStats, DecodedCatalog, IngestRecord, QuadrantHeader, SourceRecord,
    Validators,
};
use crate::error::StoreError;
use crate::file_ref::FileRef;
use crate::object_id::SourceKey;
use crate::sky::{ConeQuery, MAX_CONE_RESULTS};

#[derive(Default)]
struct State {
    quadrants: BTreeMap<FileRef, QuadrantHeader>,
    sources: BTreeMap<FileRef, Vec<CatalogRow>>,
    metadata: BTreeMap<FileRef, IngestRecord>,
    unavailable: bool,
}

/// In-process catalog store.
///
/// A single lock guards all tables, so a quadrant replacement is visible to
/// readers either completely or not at all. Duplicate source IDs within one
/// catalog are refused the way a primary key would refuse them.
#[derive(Default)]
pub struct MemoryCatalog {
    state: RwLock<State>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing the backend: every call fails with `Unavailable`.
    pub fn set_available(&self, available: bool) {
        if let Ok(mut state) = self.state.write() {
            state.unavailable = !available;
        }
    }

    pub fn ingest_record(&self, file: &FileRef) -> Option<IngestRecord> {
        self.read().ok()?.metadata.get(file).cloned()
    }

    pub fn source_ids(&self, file: &FileRef) -> Vec<u32> {
        self.read()
            .map(|state| {
                state
                    .sources
                    .get(file)
                    .map(|rows| rows.iter().map(|r| r.sourceid).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))?;
        if state.unavailable {
            return Err(StoreError::Unavailable("memory catalog is offline".into()));
        }
        Ok(state)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        let state = self
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))?;
        if state.unavailable {
            return Err(StoreError::Unavailable("memory catalog is offline".into()));
        }
        Ok(state)
    }
}

#[async_trait]
impl MetadataStore for MemoryCatalog {
    async fn stored_validators(&self, file: &FileRef) -> Result<Option<Validators>, StoreError> {
        Ok(self
            .read()?
            .metadata
            .get(file)
            .map(|record| record.validators.clone()))
    }
}

#[async_trait]
impl CatalogWriter for MemoryCatalog {
    async fn replace_quadrant(
        &self,
        file: &FileRef,
        catalog: &DecodedCatalog,
        validators: &Validators,
    ) -> Result<u64, StoreError> {
        let mut seen = HashSet::with_capacity(catalog.rows.len());
        if let Some(dup) = catalog.rows.iter().find(|row| !seen.insert(row.sourceid)) {
            return Err(StoreError::Rejected(format!(
                "duplicate sourceid {} in {}",
                dup.sourceid,
                file.key()
            )));
        }

        let mut state = self.write()?;
        state.quadrants.insert(*file, catalog.header.clone());
        state.sources.insert(*file, catalog.rows.clone());
        state.metadata.insert(
            *file,
            IngestRecord {
                validators: validators.clone(),
                ingested_at: Utc::now(),
            },
        );
        Ok(catalog.rows.len() as u64)
    }
}

#[async_trait]
impl CatalogReader for MemoryCatalog {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }

    async fn find_source(&self, key: &SourceKey) -> Result<Option<SourceRecord>, StoreError> {
        let state = self.read()?;
        let Some(header) = state.quadrants.get(&key.file) else {
            return Ok(None);
        };
        Ok(state
            .sources
            .get(&key.file)
            .and_then(|rows| rows.iter().find(|row| row.sourceid == key.sourceid))
            .map(|row| SourceRecord::new(&key.file, row, header)))
    }

    async fn cone_search(&self, cone: &ConeQuery) -> Result<Vec<SourceRecord>, StoreError> {
        let state = self.read()?;
        let mut hits: Vec<(f64, SourceRecord)> = Vec::new();

        for (file, rows) in &state.sources {
            if cone.filter.is_some_and(|f| f != file.filter())
                || cone.fieldid.is_some_and(|id| id != file.fieldid())
            {
                continue;
            }
            let Some(header) = state.quadrants.get(file) else {
                continue;
            };
            for row in rows {
                let distance = cone.center.angular_distance(&row.position());
                if distance <= cone.radius_rad() {
                    hits.push((distance, SourceRecord::new(file, row, header)));
                }
            }
        }

        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.truncate(MAX_CONE_RESULTS);
        Ok(hits.into_iter().map(|(_, record)| record).collect())
    }

    async fn approximate_counts(&self) -> Result<CatalogStats, StoreError> {
        let state = self.read()?;
        Ok(CatalogStats {
            approximate_source_count: state.sources.values().map(|rows| rows.len() as i64).sum(),
            approximate_quadrant_count: state.quadrants.len() as i64,
        })
    }
}
