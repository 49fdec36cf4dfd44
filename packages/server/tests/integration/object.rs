use crate::common::{TestApp, routes};

mod lookup {
    use super::*;

    #[tokio::test]
    async fn decodes_object_id_and_returns_source() {
        let app = TestApp::spawn().await;
        app.seed_reference_quadrant().await;

        let res = app.get(&routes::object("202110100000000")).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["fieldid"], 202);
        assert_eq!(res.body["filter"], "zg");
        assert_eq!(res.body["sourceid"], 0);
        assert_eq!(res.body["oid"], "202110100000000");
    }

    #[tokio::test]
    async fn object_and_source_endpoints_agree() {
        let app = TestApp::spawn().await;
        app.seed_reference_quadrant().await;

        let by_oid = app.get(&routes::object("202110100000001")).await;
        let by_parts = app.get(&routes::source(202, "zg", 10, 1, 1)).await;
        assert_eq!(by_oid.status, 200);
        assert_eq!(by_oid.body, by_parts.body);
    }

    #[tokio::test]
    async fn well_formed_but_absent_is_not_found() {
        let app = TestApp::spawn().await;
        app.seed_reference_quadrant().await;

        let res = app.get(&routes::object("202110100000002")).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }
}

mod malformed {
    use super::*;

    #[tokio::test]
    async fn rejects_malformed_object_ids() {
        let app = TestApp::spawn().await;
        for oid in ["12345", "20211010000000x", "202410100000000", "202117100000000"] {
            let res = app.get(&routes::object(oid)).await;
            assert_eq!(res.status, 400, "oid {oid}: {}", res.text);
            assert_eq!(res.code(), "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn rejects_missing_oid() {
        let app = TestApp::spawn().await;
        let res = app.get("/api/v1/object").await;
        assert_eq!(res.status, 400);
    }
}
