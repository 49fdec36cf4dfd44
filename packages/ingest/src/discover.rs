//! Enumerate the catalog files to process.

use std::sync::LazyLock;
use std::time::Duration;

use common::file_ref::{CCD_IDS, QUADRANT_IDS};
use common::{FileRef, Filter};
use regex::Regex;
use reqwest::Client;
use tracing::{info, warn};

use crate::error::IngestError;

static FIELD_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="field(\d{6})/""#).expect("field directory pattern is valid")
});

/// Which quadrants to process. Empty lists mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub fieldids: Vec<u32>,
    pub filters: Vec<Filter>,
    pub ccdids: Vec<u8>,
    pub qids: Vec<u8>,
}

/// Cartesian product of `fieldids` with the selected filters, CCDs and
/// quadrants, in field, filter, CCD, quadrant order.
pub fn generate_refs(fieldids: &[u32], selection: &Selection) -> Result<Vec<FileRef>, IngestError> {
    let filters = if selection.filters.is_empty() {
        Filter::ALL.to_vec()
    } else {
        selection.filters.clone()
    };
    let ccdids: Vec<u8> = if selection.ccdids.is_empty() {
        CCD_IDS.collect()
    } else {
        selection.ccdids.clone()
    };
    let qids: Vec<u8> = if selection.qids.is_empty() {
        QUADRANT_IDS.collect()
    } else {
        selection.qids.clone()
    };

    let mut refs = Vec::with_capacity(fieldids.len() * filters.len() * ccdids.len() * qids.len());
    for &fieldid in fieldids {
        for &filter in &filters {
            for &ccdid in &ccdids {
                for &qid in &qids {
                    refs.push(FileRef::new(fieldid, filter, ccdid, qid)?);
                }
            }
        }
    }
    Ok(refs)
}

/// Field IDs named in a directory listing page.
pub fn parse_field_listing(html: &str) -> Vec<u32> {
    FIELD_DIR
        .captures_iter(html)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// Crawl the `000/` and `001/` listings under `base_url`.
///
/// A listing that cannot be fetched is logged and skipped. The result is
/// sorted and deduplicated.
pub async fn discover_fieldids(client: &Client, base_url: &str, timeout: Duration) -> Vec<u32> {
    let base = base_url.trim_end_matches('/');
    let mut fieldids = Vec::new();

    for root in ["000", "001"] {
        let url = format!("{base}/{root}/");
        info!(url = %url, "Discovering fields");

        let body = match fetch_listing(client, &url, timeout).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to list fields");
                continue;
            }
        };
        fieldids.extend(parse_field_listing(&body));
    }

    fieldids.sort_unstable();
    fieldids.dedup();
    info!(count = fieldids.len(), "Discovered fields");
    fieldids
}

async fn fetch_listing(client: &Client, url: &str, timeout: Duration) -> Result<String, IngestError> {
    let body = client
        .get(url)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(body)
}
