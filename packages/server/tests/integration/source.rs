use crate::common::{TestApp, routes};

mod lookup {
    use super::*;

    #[tokio::test]
    async fn returns_row_joined_with_quadrant_header() {
        let app = TestApp::spawn().await;
        app.seed_reference_quadrant().await;

        let res = app.get(&routes::source(202, "zg", 10, 1, 0)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["fieldid"], 202);
        assert_eq!(res.body["filter"], "zg");
        assert_eq!(res.body["ccdid"], 10);
        assert_eq!(res.body["qid"], 1);
        assert_eq!(res.body["sourceid"], 0);
        assert_eq!(res.body["magzp"], 26.325);
        assert_eq!(res.body["infobits"], 16);
        assert_eq!(res.body["oid"], "202110100000000");
    }

    #[tokio::test]
    async fn fields_are_serialized_in_api_order() {
        let app = TestApp::spawn().await;
        app.seed_reference_quadrant().await;

        let res = app.get(&routes::source(202, "zg", 10, 1, 0)).await;
        assert_eq!(res.status, 200);

        let expected = [
            "fieldid", "filter", "ccdid", "qid", "sourceid", "xpos", "ypos", "ra", "dec", "flux",
            "sigflux", "mag", "sigmag", "snr", "chi", "sharp", "flags", "magzp", "magzp_rms",
            "magzp_unc", "infobits", "oid",
        ];
        let mut last = 0;
        for field in expected {
            let needle = format!("\"{field}\":");
            let pos = res.text.find(&needle).unwrap_or_else(|| panic!("missing {field}"));
            assert!(pos >= last, "{field} out of order in {}", res.text);
            last = pos;
        }
    }

    #[tokio::test]
    async fn nan_is_returned_as_null() {
        let app = TestApp::spawn().await;
        app.seed_reference_quadrant().await;

        let res = app.get(&routes::source(202, "zg", 10, 1, 1)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["mag"].is_null());
        assert_eq!(res.body["flux"], 1523.0);
    }
}

mod not_found {
    use super::*;

    #[tokio::test]
    async fn unknown_sourceid() {
        let app = TestApp::spawn().await;
        app.seed_reference_quadrant().await;

        let res = app.get(&routes::source(202, "zg", 10, 1, 2)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn other_quadrant_of_same_field() {
        let app = TestApp::spawn().await;
        app.seed_reference_quadrant().await;

        let res = app.get(&routes::source(202, "zr", 10, 1, 0)).await;
        assert_eq!(res.status, 404);
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn rejects_unknown_filter() {
        let app = TestApp::spawn().await;
        let res = app.get(&routes::source(202, "zz", 10, 1, 0)).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
        assert!(res.body["message"].as_str().unwrap().contains("filter"));
    }

    #[tokio::test]
    async fn rejects_out_of_range_ccd_and_quadrant() {
        let app = TestApp::spawn().await;
        assert_eq!(app.get(&routes::source(202, "zg", 17, 1, 0)).await.status, 400);
        assert_eq!(app.get(&routes::source(202, "zg", 0, 1, 0)).await.status, 400);
        assert_eq!(app.get(&routes::source(202, "zg", 10, 5, 0)).await.status, 400);
    }

    #[tokio::test]
    async fn rejects_missing_and_non_numeric_parameters() {
        let app = TestApp::spawn().await;

        let res = app.get("/api/v1/source?fieldid=202&filter=zg&ccdid=10&qid=1").await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");

        let res = app
            .get("/api/v1/source?fieldid=abc&filter=zg&ccdid=10&qid=1&sourceid=0")
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }
}
