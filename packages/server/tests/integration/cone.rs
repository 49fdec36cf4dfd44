use ::common::{FileRef, Filter};

use crate::common::{TestApp, reference_header, routes, source_row};

const ARCSEC: f64 = 1.0 / 3600.0;

/// Two quadrants of field 202 (zg, zr) and one of field 203, all around (100, 40).
async fn seed_cluster(app: &TestApp) {
    let zg = FileRef::new(202, Filter::Zg, 10, 1).unwrap();
    let zr = FileRef::new(202, Filter::Zr, 10, 1).unwrap();
    let other = FileRef::new(203, Filter::Zg, 4, 2).unwrap();

    app.ingest(
        zg,
        reference_header(),
        vec![
            source_row(0, 100.0, 40.0 + 30.0 * ARCSEC),
            source_row(1, 100.0, 40.0 + 5.0 * ARCSEC),
            source_row(2, 100.0, 41.0),
        ],
    )
    .await;
    app.ingest(zr, reference_header(), vec![source_row(0, 100.0, 40.0 + 10.0 * ARCSEC)])
        .await;
    app.ingest(other, reference_header(), vec![source_row(9, 100.0, 40.0)])
        .await;
}

fn sourceids(body: &serde_json::Value) -> Vec<(String, u64, u64)> {
    body.as_array()
        .expect("cone response should be an array")
        .iter()
        .map(|row| {
            (
                row["filter"].as_str().unwrap().to_string(),
                row["fieldid"].as_u64().unwrap(),
                row["sourceid"].as_u64().unwrap(),
            )
        })
        .collect()
}

mod results {
    use super::*;

    #[tokio::test]
    async fn ordered_by_distance_across_quadrants() {
        let app = TestApp::spawn().await;
        seed_cluster(&app).await;

        let res = app.get(&routes::cone(100.0, 40.0, 60.0)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            sourceids(&res.body),
            vec![
                ("zg".into(), 203, 9),
                ("zg".into(), 202, 1),
                ("zr".into(), 202, 0),
                ("zg".into(), 202, 0),
            ]
        );
    }

    #[tokio::test]
    async fn radius_excludes_farther_sources() {
        let app = TestApp::spawn().await;
        seed_cluster(&app).await;

        let res = app.get(&routes::cone(100.0, 40.0, 7.0)).await;
        assert_eq!(res.status, 200);
        assert_eq!(sourceids(&res.body).len(), 2);
    }

    #[tokio::test]
    async fn filter_and_field_restrictions() {
        let app = TestApp::spawn().await;
        seed_cluster(&app).await;

        let path = format!("{}&filter=zr", routes::cone(100.0, 40.0, 60.0));
        let res = app.get(&path).await;
        assert_eq!(sourceids(&res.body), vec![("zr".into(), 202, 0)]);

        let path = format!("{}&fieldid=202&filter=zg", routes::cone(100.0, 40.0, 60.0));
        let res = app.get(&path).await;
        assert_eq!(
            sourceids(&res.body),
            vec![("zg".into(), 202, 1), ("zg".into(), 202, 0)]
        );
    }

    #[tokio::test]
    async fn empty_region_returns_empty_array() {
        let app = TestApp::spawn().await;
        seed_cluster(&app).await;

        let res = app.get(&routes::cone(200.0, -10.0, 60.0)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn capped_at_one_thousand_rows() {
        let app = TestApp::spawn().await;
        let file = FileRef::new(500, Filter::Zi, 1, 1).unwrap();
        let rows = (0..1200)
            .map(|i| source_row(i, 10.0, 10.0 + f64::from(i) * 0.02 * ARCSEC))
            .collect();
        app.ingest(file, reference_header(), rows).await;

        let res = app.get(&routes::cone(10.0, 10.0, 60.0)).await;
        assert_eq!(res.status, 200);
        let rows = res.body.as_array().unwrap();
        assert_eq!(rows.len(), 1000);
        assert_eq!(rows[0]["sourceid"], 0);
        assert_eq!(rows[999]["sourceid"], 999);
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn radius_bounds() {
        let app = TestApp::spawn().await;

        for radius in [0.0, -1.0, 61.0] {
            let res = app.get(&routes::cone(100.0, 40.0, radius)).await;
            assert_eq!(res.status, 400, "radius {radius}");
            assert_eq!(res.code(), "VALIDATION_ERROR");
        }
        assert_eq!(app.get(&routes::cone(100.0, 40.0, 60.0)).await.status, 200);
    }

    #[tokio::test]
    async fn rejects_bad_coordinates_and_filter() {
        let app = TestApp::spawn().await;

        assert_eq!(app.get(&routes::cone(100.0, 91.0, 5.0)).await.status, 400);
        assert_eq!(app.get("/api/v1/cone?ra=NaN&dec=0&radius_arcsec=5").await.status, 400);
        assert_eq!(app.get("/api/v1/cone?ra=1&radius_arcsec=5").await.status, 400);

        let path = format!("{}&filter=g", routes::cone(100.0, 40.0, 5.0));
        assert_eq!(app.get(&path).await.status, 400);
    }
}
