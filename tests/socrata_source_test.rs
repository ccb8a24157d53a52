use httpmock::prelude::*;
use poi_sync::adapters::SocrataPoiSource;
use poi_sync::config::SourceConfig;
use poi_sync::domain::model::PoiDetails;
use poi_sync::domain::ports::PoiSource;
use poi_sync::{Coordinate, PoiCategory, SyncError, Viewport};
use tokio_test::{assert_err, assert_ok};

fn midtown() -> Viewport {
    Viewport::around(Coordinate::new(40.7580, -73.9855), 0.02, 0.04, 14.0)
}

#[tokio::test]
async fn test_restroom_query_sends_bbox_and_limit() {
    let server = MockServer::start();
    let source = assert_ok!(SocrataPoiSource::new(SourceConfig {
        app_token: Some("test-token".to_string()),
        ..SourceConfig::new(server.url("/resource/i7jb-7jku.json"))
    }));
    let where_clause = source.where_clause(&midtown());

    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/resource/i7jb-7jku.json")
            .query_param("$where", where_clause.as_str())
            .query_param("$limit", "50")
            .header("X-App-Token", "test-token");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([
                {
                    "facility_name": "Bryant Park",
                    "latitude": "40.7536",
                    "longitude": "-73.9832",
                    "handicap_accessible": "Yes",
                    "open_year_round": "Yes",
                    "borough": "Manhattan"
                },
                {"facility_name": "Not geocoded", "latitude": "0", "longitude": "0"},
                {"facility_name": "No coordinates"}
            ]));
    });

    let points = assert_ok!(source.query(PoiCategory::Restroom, &midtown(), 50).await);

    api_mock.assert();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].display_name(), "Bryant Park");
    assert!(matches!(
        points[0].details,
        PoiDetails::Restroom { accessible: true, year_round: true, .. }
    ));
}

#[tokio::test]
async fn test_restaurant_filter_reaches_server() {
    let server = MockServer::start();
    let source = assert_ok!(SocrataPoiSource::new(SourceConfig {
        filter: Some("grade = 'A'".to_string()),
        ..SourceConfig::new(server.url("/resource/43nn-pn8j.json"))
    }));
    let where_clause = source.where_clause(&midtown());
    assert!(where_clause.ends_with("AND (grade = 'A')"));

    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/resource/43nn-pn8j.json")
            .query_param("$where", where_clause.as_str());
        then.status(200).json_body(serde_json::json!([
            {
                "dba": "GRAND CENTRAL DELI",
                "latitude": 40.7527,
                "longitude": -73.9772,
                "cuisine_description": "Sandwiches",
                "grade": "A",
                "boro": "Manhattan"
            }
        ]));
    });

    let points = assert_ok!(source.query(PoiCategory::Restaurant, &midtown(), 500).await);

    api_mock.assert();
    assert_eq!(points[0].category(), PoiCategory::Restaurant);
    assert_eq!(points[0].coordinate(), Coordinate::new(40.7527, -73.9772));
}

#[tokio::test]
async fn test_server_error_is_fetch_failure() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/failed.json");
        then.status(500);
    });
    let source = assert_ok!(SocrataPoiSource::new(SourceConfig::new(server.url("/failed.json"))));

    let err = assert_err!(source.query(PoiCategory::Restroom, &midtown(), 500).await);

    api_mock.assert();
    assert!(matches!(
        err,
        SyncError::FetchFailure { category: PoiCategory::Restroom, ref details } if details.contains("500")
    ));
}

#[tokio::test]
async fn test_non_array_payload_is_fetch_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/odd.json");
        then.status(200)
            .json_body(serde_json::json!({"error": true, "message": "query timeout"}));
    });
    let source = assert_ok!(SocrataPoiSource::new(SourceConfig::new(server.url("/odd.json"))));

    let err = assert_err!(source.query(PoiCategory::Restaurant, &midtown(), 500).await);

    assert!(matches!(err, SyncError::FetchFailure { .. }));
    assert!(err.is_recoverable());
}
