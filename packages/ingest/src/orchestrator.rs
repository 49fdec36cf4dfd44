//! Fan catalog files out over a fixed pool of ingest workers.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use common::store::postgres::PgCatalogStore;
use common::store::{CatalogWriter, MetadataStore};
use common::{DecodedCatalog, FileRef, StoreError, Validators};
use reqwest::Client;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{DatabaseConfig, SourceConfig};
use crate::error::IngestError;
use crate::fetch::{ConditionalFetcher, FetchOutcome};
use crate::fits::CatalogDecoder;

/// Everything a worker needs from storage.
pub trait IngestStore: MetadataStore + CatalogWriter {}

impl<T: MetadataStore + CatalogWriter + ?Sized> IngestStore for T {}

/// Opens the storage handle a worker keeps for its lifetime.
#[async_trait]
pub trait StoreFactory: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn IngestStore>, StoreError>;
}

/// Every worker gets its own single-connection Postgres pool.
pub struct PgStoreFactory {
    config: DatabaseConfig,
}

impl PgStoreFactory {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StoreFactory for PgStoreFactory {
    async fn open(&self) -> Result<Arc<dyn IngestStore>, StoreError> {
        let store = PgCatalogStore::connect_with_pool_size(&self.config, 1).await?;
        Ok(Arc::new(store))
    }
}

/// Hands the same store to every worker.
pub struct SharedStore(pub Arc<dyn IngestStore>);

#[async_trait]
impl StoreFactory for SharedStore {
    async fn open(&self) -> Result<Arc<dyn IngestStore>, StoreError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub ingested: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rows: u64,
}

impl IngestSummary {
    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Ingested(rows) => {
                self.ingested += 1;
                self.rows += rows;
            }
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Failed => self.failed += 1,
        }
    }

    fn merge(&mut self, other: IngestSummary) {
        self.ingested += other.ingested;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.rows += other.rows;
    }

    pub fn processed(&self) -> usize {
        self.ingested + self.skipped + self.failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Ingested(u64),
    Skipped,
    Failed,
}

pub struct Orchestrator {
    source: SourceConfig,
    workers: usize,
    stores: Arc<dyn StoreFactory>,
    decoder: Arc<dyn CatalogDecoder>,
}

impl Orchestrator {
    pub fn new(
        source: SourceConfig,
        workers: usize,
        stores: Arc<dyn StoreFactory>,
        decoder: Arc<dyn CatalogDecoder>,
    ) -> Self {
        Self {
            source,
            workers: workers.max(1),
            stores,
            decoder,
        }
    }

    /// Process every file once. Per-item failures are counted, never
    /// propagated. Cancelling `cancel` stops new items from starting; items
    /// already in flight run to completion.
    pub async fn run(&self, files: Vec<FileRef>, cancel: CancellationToken) -> IngestSummary {
        let total = files.len();
        let (tx, rx) = mpsc::channel::<FileRef>(self.workers);
        let rx = Arc::new(Mutex::new(rx));

        let producer_cancel = cancel.clone();
        let producer = tokio::spawn(async move {
            for file in files {
                tokio::select! {
                    _ = producer_cancel.cancelled() => break,
                    sent = tx.send(file) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let mut handles = Vec::with_capacity(self.workers);
        for worker_id in 0..self.workers {
            let worker = Worker {
                id: worker_id,
                fetcher: ConditionalFetcher::new(Client::new(), &self.source),
                stores: self.stores.clone(),
                decoder: self.decoder.clone(),
                store: None,
            };
            handles.push(tokio::spawn(worker.run(rx.clone(), cancel.clone())));
        }

        let mut summary = IngestSummary::default();
        for handle in handles {
            match handle.await {
                Ok(partial) => summary.merge(partial),
                Err(e) => error!(error = %e, "Ingest worker panicked"),
            }
        }
        if let Err(e) = producer.await {
            error!(error = %e, "Ingest scheduler panicked");
        }

        if cancel.is_cancelled() {
            warn!(
                processed = summary.processed(),
                total, "Run cancelled before all files were processed"
            );
        }
        summary
    }
}

struct Worker {
    id: usize,
    fetcher: ConditionalFetcher,
    stores: Arc<dyn StoreFactory>,
    decoder: Arc<dyn CatalogDecoder>,
    store: Option<Arc<dyn IngestStore>>,
}

impl Worker {
    async fn run(
        mut self,
        queue: Arc<Mutex<mpsc::Receiver<FileRef>>>,
        cancel: CancellationToken,
    ) -> IngestSummary {
        let mut summary = IngestSummary::default();
        loop {
            if cancel.is_cancelled() {
                break;
            }
            let next = queue.lock().await.recv().await;
            let Some(file) = next else {
                break;
            };
            if cancel.is_cancelled() {
                break;
            }
            let outcome = self.process(&file).await;
            summary.record(outcome);
        }
        debug!(worker = self.id, ?summary, "Worker finished");
        summary
    }

    /// The worker's store, opened on first use and retried on the next item
    /// if opening fails.
    async fn store(&mut self) -> Result<Arc<dyn IngestStore>, StoreError> {
        if let Some(store) = &self.store {
            return Ok(store.clone());
        }
        let store = self.stores.open().await?;
        self.store = Some(store.clone());
        Ok(store)
    }

    async fn process(&mut self, file: &FileRef) -> ItemOutcome {
        let store = match self.store().await {
            Ok(store) => store,
            Err(e) => {
                error!(worker = self.id, file = %file, error = %e, "Failed to open store");
                return ItemOutcome::Failed;
            }
        };

        let stored = match store.stored_validators(file).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(file = %file, error = %e, "Failed to read ingest metadata");
                return ItemOutcome::Failed;
            }
        };

        let download = match self.fetcher.fetch_if_changed(file, stored.as_ref()).await {
            FetchOutcome::Fetched(download) => download,
            FetchOutcome::Unchanged | FetchOutcome::Gone => return ItemOutcome::Skipped,
            FetchOutcome::TransientFailure(reason) => {
                warn!(file = %file, reason = %reason, "Fetch failed");
                return ItemOutcome::Failed;
            }
        };

        let decoder = self.decoder.clone();
        let payload = download.payload;
        let decoded = tokio::task::spawn_blocking(move || decoder.decode(&payload)).await;
        let catalog = match decoded {
            Ok(Ok(catalog)) => catalog,
            Ok(Err(e)) => {
                warn!(file = %file, error = %e, "Decode failed");
                return ItemOutcome::Failed;
            }
            Err(e) => {
                error!(file = %file, error = %e, "Decoder task panicked");
                return ItemOutcome::Failed;
            }
        };

        match store_catalog(store.as_ref(), file, &catalog, &download.validators).await {
            Ok(rows) => ItemOutcome::Ingested(rows),
            Err(e) => {
                warn!(file = %file, error = %e, "Ingest failed");
                ItemOutcome::Failed
            }
        }
    }
}

/// Replace `file` with `catalog`. A header identity that disagrees with the
/// requested file is logged; the rows are stored under `file`.
async fn store_catalog(
    store: &dyn IngestStore,
    file: &FileRef,
    catalog: &DecodedCatalog,
    validators: &Validators,
) -> Result<u64, StoreError> {
    if catalog.file != *file {
        warn!(
            file = %file,
            header = %catalog.file,
            "Header identity differs from requested file"
        );
    }
    let rows = store.replace_quadrant(file, catalog, validators).await?;
    info!(file = %file, rows, "Ingested");
    Ok(rows)
}

/// Decode a local file and replace the quadrant named in its header.
/// No validators are recorded, so the next remote run re-fetches it.
pub async fn ingest_local_file(
    path: &Path,
    store: &dyn IngestStore,
    decoder: &dyn CatalogDecoder,
) -> Result<u64, IngestError> {
    let payload = tokio::fs::read(path)
        .await
        .map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let catalog = decoder.decode(&payload)?;
    let file = catalog.file;
    Ok(store_catalog(store, &file, &catalog, &Validators::default()).await?)
}
