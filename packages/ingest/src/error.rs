use std::path::PathBuf;

use common::{CatalogError, StoreError};
use thiserror::Error;

/// Why a catalog payload could not be decoded.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("unreadable FITS: {0}")]
    Fits(String),

    #[error("payload truncated: {0}")]
    Truncated(String),

    #[error("malformed header: {0}")]
    Header(String),

    #[error("missing keyword {0}")]
    MissingKeyword(&'static str),

    #[error("unrecognized FILTERID {0}")]
    UnknownFilter(i64),

    #[error("invalid quadrant identity: {0}")]
    Identity(#[from] CatalogError),

    #[error("missing column {0}")]
    MissingColumn(&'static str),

    #[error("unsupported column format {format:?} for {column}")]
    UnsupportedFormat { column: String, format: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("storage failed: {0}")]
    Store(#[from] StoreError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid selection: {0}")]
    Selection(#[from] CatalogError),
}
