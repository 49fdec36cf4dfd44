use crate::common::{TestApp, routes};

mod health_check {
    use super::*;

    #[tokio::test]
    async fn reports_ok_when_store_is_reachable() {
        let app = TestApp::spawn().await;
        let res = app.get(routes::HEALTH).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body, serde_json::json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn fails_when_store_is_unreachable() {
        let app = TestApp::spawn().await;
        app.catalog.set_available(false);

        let res = app.get(routes::HEALTH).await;
        assert_eq!(res.status, 503);
        assert_eq!(res.code(), "UNAVAILABLE");
    }
}
