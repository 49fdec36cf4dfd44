use crate::common::{TestApp, routes};

#[tokio::test]
async fn openapi_document_lists_catalog_paths() {
    let app = TestApp::spawn().await;
    let res = app.get(routes::OPENAPI).await;
    assert_eq!(res.status, 200);

    let paths = res.body["paths"].as_object().expect("paths object");
    for path in [
        "/api/v1/health",
        "/api/v1/source",
        "/api/v1/object",
        "/api/v1/cone",
        "/api/v1/stats",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
}
