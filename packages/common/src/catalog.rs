use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::file_ref::FileRef;
use crate::filter::Filter;
use crate::object_id::SourceKey;
use crate::sky::SkyPoint;

/// HTTP cache validators captured from the HEAD response for a catalog file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub content_length: Option<u64>,
}

impl Validators {
    /// Whether `self` (stored) still describes the resource seen by `current`.
    ///
    /// An equal etag settles it. Without one, last-modified and
    /// content-length must both be present on `current` and both equal.
    pub fn matches_current(&self, current: &Validators) -> bool {
        if let Some(etag) = current.etag.as_deref()
            && self.etag.as_deref() == Some(etag)
        {
            return true;
        }
        match (current.last_modified.as_deref(), current.content_length) {
            (Some(last_modified), Some(length)) => {
                self.last_modified.as_deref() == Some(last_modified)
                    && self.content_length == Some(length)
            }
            _ => false,
        }
    }
}

/// What the store remembers about the last successful ingest of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRecord {
    pub validators: Validators,
    pub ingested_at: DateTime<Utc>,
}

/// Quadrant-level photometric calibration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuadrantHeader {
    pub magzp: Option<f64>,
    pub magzp_rms: Option<f64>,
    pub magzp_unc: Option<f64>,
    pub infobits: i64,
}

/// One detected source as decoded from a catalog file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub sourceid: u32,
    pub xpos: Option<f64>,
    pub ypos: Option<f64>,
    pub ra: f64,
    pub dec: f64,
    pub flux: Option<f64>,
    pub sigflux: Option<f64>,
    pub mag: Option<f64>,
    pub sigmag: Option<f64>,
    pub snr: Option<f64>,
    pub chi: Option<f64>,
    pub sharp: Option<f64>,
    pub flags: i64,
}

impl CatalogRow {
    pub fn position(&self) -> SkyPoint {
        SkyPoint {
            ra: self.ra,
            dec: self.dec,
        }
    }
}

/// A fully decoded quadrant catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCatalog {
    /// Identity recorded in the file's own header.
    pub file: FileRef,
    pub header: QuadrantHeader,
    pub rows: Vec<CatalogRow>,
}

/// A source joined with its quadrant header, as served by the query API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SourceRecord {
    pub fieldid: u32,
    pub filter: Filter,
    pub ccdid: u8,
    pub qid: u8,
    pub sourceid: u32,
    pub xpos: Option<f64>,
    pub ypos: Option<f64>,
    pub ra: f64,
    pub dec: f64,
    pub flux: Option<f64>,
    pub sigflux: Option<f64>,
    pub mag: Option<f64>,
    pub sigmag: Option<f64>,
    pub snr: Option<f64>,
    pub chi: Option<f64>,
    pub sharp: Option<f64>,
    pub flags: i64,
    pub magzp: Option<f64>,
    pub magzp_rms: Option<f64>,
    pub magzp_unc: Option<f64>,
    pub infobits: i64,
    /// ZTF DR object ID.
    #[schema(example = "202110100000005")]
    pub oid: String,
}

impl SourceRecord {
    /// Join a row with its header. NaN floats become `None`.
    pub fn new(file: &FileRef, row: &CatalogRow, header: &QuadrantHeader) -> Self {
        let key = SourceKey::new(*file, row.sourceid);
        Self {
            fieldid: file.fieldid(),
            filter: file.filter(),
            ccdid: file.ccdid(),
            qid: file.qid(),
            sourceid: row.sourceid,
            xpos: finite(row.xpos),
            ypos: finite(row.ypos),
            ra: row.ra,
            dec: row.dec,
            flux: finite(row.flux),
            sigflux: finite(row.sigflux),
            mag: finite(row.mag),
            sigmag: finite(row.sigmag),
            snr: finite(row.snr),
            chi: finite(row.chi),
            sharp: finite(row.sharp),
            flags: row.flags,
            magzp: finite(header.magzp),
            magzp_rms: finite(header.magzp_rms),
            magzp_unc: finite(header.magzp_unc),
            infobits: header.infobits,
            oid: key.object_id(),
        }
    }
}

/// Planner-level row counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CatalogStats {
    pub approximate_source_count: i64,
    pub approximate_quadrant_count: i64,
}

/// Collapse NaN into "no value".
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}
