//! Conditional download of catalog files.
//!
//! One HEAD request per file; the body is only downloaded when its
//! validators differ from what the last successful ingest recorded.

use std::time::Duration;

use common::{FileRef, Validators};
use reqwest::header::{CONTENT_LENGTH, ETAG, HeaderMap, HeaderName, LAST_MODIFIED};
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::config::SourceConfig;

/// A downloaded file and the validators seen on its HEAD response.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub payload: Vec<u8>,
    pub validators: Validators,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Stored validators still describe the remote file. Nothing downloaded.
    Unchanged,
    Fetched(Download),
    /// HEAD returned 404.
    Gone,
    /// Network error, timeout, or an unexpected status. Retry next run.
    TransientFailure(String),
}

pub struct ConditionalFetcher {
    client: Client,
    base_url: String,
    head_timeout: Duration,
    download_timeout: Duration,
}

impl ConditionalFetcher {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            head_timeout: Duration::from_secs(config.head_timeout_secs),
            download_timeout: Duration::from_secs(config.download_timeout_secs),
        }
    }

    pub fn url(&self, file: &FileRef) -> String {
        file.url(&self.base_url)
    }

    pub async fn fetch_if_changed(
        &self,
        file: &FileRef,
        stored: Option<&Validators>,
    ) -> FetchOutcome {
        let url = self.url(file);

        let head = match self.client.head(&url).timeout(self.head_timeout).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::TransientFailure(format!("HEAD {url}: {e}")),
        };
        match head.status() {
            StatusCode::NOT_FOUND => {
                debug!(file = %file, "File not found");
                return FetchOutcome::Gone;
            }
            status if !status.is_success() => {
                return FetchOutcome::TransientFailure(format!("HEAD {url}: status {status}"));
            }
            _ => {}
        }

        let validators = validators_from_headers(head.headers());
        if let Some(stored) = stored
            && stored.matches_current(&validators)
        {
            debug!(file = %file, "Unchanged");
            return FetchOutcome::Unchanged;
        }

        info!(file = %file, "Downloading");
        let response = match self
            .client
            .get(&url)
            .timeout(self.download_timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(response) => response,
            Err(e) => return FetchOutcome::TransientFailure(format!("GET {url}: {e}")),
        };
        let payload = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => return FetchOutcome::TransientFailure(format!("GET {url}: {e}")),
        };

        if let Some(expected) = validators.content_length
            && payload.len() as u64 != expected
        {
            return FetchOutcome::TransientFailure(format!(
                "GET {url}: received {} of {expected} bytes",
                payload.len()
            ));
        }

        FetchOutcome::Fetched(Download {
            payload,
            validators,
        })
    }
}

/// Extract etag, last-modified and content-length; unparseable values are
/// treated as absent.
pub fn validators_from_headers(headers: &HeaderMap) -> Validators {
    let text = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Validators {
        etag: text(ETAG),
        last_modified: text(LAST_MODIFIED),
        content_length: text(CONTENT_LENGTH).and_then(|v| v.trim().parse().ok()),
    }
}
