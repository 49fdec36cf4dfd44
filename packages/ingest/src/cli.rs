use std::path::PathBuf;

use clap::Parser;
use common::Filter;

use crate::config::IngestAppConfig;
use crate::discover::Selection;

/// Ingest ZTF reference PSF catalogs into the catalog database.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "ztfref-ingest")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Only process these field IDs. Discovered from the file server when omitted.
    #[arg(long, env = "INGEST_FIELDID", value_delimiter = ',')]
    pub fieldid: Vec<u32>,

    /// Only process these filters (zg, zr, zi).
    #[arg(long = "filter", env = "INGEST_FILTER", value_delimiter = ',')]
    pub filters: Vec<Filter>,

    /// Only process these CCD IDs (1-16).
    #[arg(
        long,
        env = "INGEST_CCDID",
        value_delimiter = ',',
        value_parser = clap::value_parser!(u8).range(1..=16)
    )]
    pub ccdid: Vec<u8>,

    /// Only process these quadrant IDs (1-4).
    #[arg(
        long,
        env = "INGEST_QID",
        value_delimiter = ',',
        value_parser = clap::value_parser!(u8).range(1..=4)
    )]
    pub qid: Vec<u8>,

    /// Number of parallel workers. Overrides `ingest.workers`.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Root URL of the reference product tree. Overrides `source.base_url`.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Print the URLs that would be processed and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Ingest local catalog file(s) instead of downloading.
    #[arg(long = "from-file")]
    pub from_files: Vec<PathBuf>,
}

impl Args {
    pub fn selection(&self) -> Selection {
        Selection {
            fieldids: self.fieldid.clone(),
            filters: self.filters.clone(),
            ccdids: self.ccdid.clone(),
            qids: self.qid.clone(),
        }
    }

    /// Fold command-line overrides into the loaded configuration.
    pub fn apply(&self, config: &mut IngestAppConfig) {
        if let Some(workers) = self.workers {
            config.ingest.workers = workers;
        }
        if let Some(base_url) = &self.base_url {
            config.source.base_url = base_url.clone();
        }
    }
}
