use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use common::StoreError;
use common::store::CatalogReader;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogReader>,
    pub query_timeout: Duration,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CatalogReader>, query_timeout: Duration) -> Self {
        Self {
            catalog,
            query_timeout,
        }
    }

    /// Run a store call under the configured query timeout.
    pub async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.query_timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout(self.query_timeout))?
    }
}
