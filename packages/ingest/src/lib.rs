pub mod cli;
pub mod config;
pub mod discover;
pub mod error;
pub mod fetch;
pub mod fits;
pub mod orchestrator;

pub use error::{DecodeError, IngestError};
pub use fetch::{ConditionalFetcher, Download, FetchOutcome};
pub use fits::{CatalogDecoder, FitsDecoder};
pub use orchestrator::{IngestSummary, Orchestrator};
