use ::common::{FileRef, Filter};

use crate::common::{TestApp, reference_header, routes, source_row};

mod approximate_counts {
    use super::*;

    #[tokio::test]
    async fn empty_catalog() {
        let app = TestApp::spawn().await;
        let res = app.get(routes::STATS).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            res.body,
            serde_json::json!({"approximate_source_count": 0, "approximate_quadrant_count": 0})
        );
    }

    #[tokio::test]
    async fn counts_sources_and_quadrants() {
        let app = TestApp::spawn().await;
        app.seed_reference_quadrant().await;
        let file = FileRef::new(203, Filter::Zr, 1, 4).unwrap();
        app.ingest(file, reference_header(), vec![source_row(5, 1.0, 1.0)])
            .await;

        let res = app.get(routes::STATS).await;
        assert_eq!(res.body["approximate_source_count"], 3);
        assert_eq!(res.body["approximate_quadrant_count"], 2);
    }
}
