use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use common::store::{CatalogWriter, MemoryCatalog};
use common::{CatalogRow, DecodedCatalog, FileRef, Filter, QuadrantHeader, Validators};
use reqwest::Client;
use serde_json::Value;

use server::config::CorsConfig;
use server::state::AppState;

pub mod routes {
    pub const HEALTH: &str = "/api/v1/health";
    pub const STATS: &str = "/api/v1/stats";
    pub const OPENAPI: &str = "/api-docs/openapi.json";

    pub fn source(fieldid: u32, filter: &str, ccdid: u8, qid: u8, sourceid: u32) -> String {
        format!(
            "/api/v1/source?fieldid={fieldid}&filter={filter}&ccdid={ccdid}&qid={qid}&sourceid={sourceid}"
        )
    }

    pub fn object(oid: &str) -> String {
        format!("/api/v1/object?oid={oid}")
    }

    pub fn cone(ra: f64, dec: f64, radius_arcsec: f64) -> String {
        format!("/api/v1/cone?ra={ra}&dec={dec}&radius_arcsec={radius_arcsec}")
    }
}

/// A running test server backed by an in-memory catalog.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub catalog: Arc<MemoryCatalog>,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let catalog = Arc::new(MemoryCatalog::new());
        let state = AppState::new(catalog.clone(), Duration::from_secs(5));
        let cors = CorsConfig {
            allow_origins: vec![],
            max_age: 3600,
        };
        let app = server::build_router(state, &cors);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            catalog,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    /// Replace one quadrant directly in the backing store.
    pub async fn ingest(&self, file: FileRef, header: QuadrantHeader, rows: Vec<CatalogRow>) {
        let catalog = DecodedCatalog { file, header, rows };
        self.catalog
            .replace_quadrant(&file, &catalog, &Validators::default())
            .await
            .expect("replace_quadrant");
    }

    /// Quadrant 202/zg/c10/q1 with sources 0 and 1.
    pub async fn seed_reference_quadrant(&self) -> FileRef {
        let file = FileRef::new(202, Filter::Zg, 10, 1).unwrap();
        self.ingest(
            file,
            reference_header(),
            vec![
                source_row(0, 24.98, -29.60),
                CatalogRow {
                    mag: Some(f64::NAN),
                    ..source_row(1, 25.38, -29.60)
                },
            ],
        )
        .await;
        file
    }
}

pub fn reference_header() -> QuadrantHeader {
    QuadrantHeader {
        magzp: Some(26.325),
        magzp_rms: Some(0.087),
        magzp_unc: Some(0.0),
        infobits: 16,
    }
}

pub fn source_row(sourceid: u32, ra: f64, dec: f64) -> CatalogRow {
    CatalogRow {
        sourceid,
        xpos: Some(100.5),
        ypos: Some(200.25),
        ra,
        dec,
        flux: Some(1523.0),
        sigflux: Some(12.5),
        mag: Some(18.42),
        sigmag: Some(0.01),
        snr: Some(121.8),
        chi: Some(1.02),
        sharp: Some(-0.03),
        flags: 0,
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn code(&self) -> &str {
        self.body["code"]
            .as_str()
            .expect("error body should contain 'code'")
    }
}
