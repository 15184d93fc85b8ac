//! End-to-end entry lifecycle over HTTP.

mod common;

use airly::{Airly, AirlyError, LatLon, LocationConfig, NotReadyReason};
use common::{CannedResponse, CannedServer, NO_COVERAGE_JSON, POINT_JSON};

fn airly(server: &CannedServer) -> Airly {
    Airly::with_client(reqwest::Client::new(), server.base_url())
}

#[tokio::test]
async fn test_validate_then_setup_nearest_entry() {
    let server = CannedServer::start(vec![
        CannedResponse::json(200, NO_COVERAGE_JSON),
        CannedResponse::json(200, POINT_JSON),
    ])
    .await;
    let airly = airly(&server);
    let location = LatLon(49.2992, 19.9496);

    let check = airly
        .validate_location()
        .api_key("test-key")
        .location(location)
        .call()
        .await
        .unwrap();
    assert!(check.use_nearest);

    let mut config = LocationConfig::new("test-key", location);
    config.use_nearest = check.use_nearest;
    let coordinator = airly
        .setup_entry()
        .entry_id("zakopane")
        .config(config)
        .call()
        .await
        .unwrap();

    let snapshot = coordinator.current_snapshot().unwrap();
    assert_eq!(snapshot.value("PM10"), Some(19.61));
    assert_eq!(snapshot.standard("PM25").unwrap().limit, 15.0);

    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].starts_with("get /v2/measurements/point?"));
    assert!(requests[1].starts_with("get /v2/measurements/nearest?"));
    assert!(requests[2].starts_with("get /v2/measurements/nearest?"));

    airly.shutdown().await;
    assert!(coordinator.is_closed());
}

#[tokio::test]
async fn test_invalid_key_fails_validation() {
    let server = CannedServer::start(vec![CannedResponse::json(
        401,
        r#"{"errorCode": "INVALID_API_KEY"}"#,
    )])
    .await;

    let result = airly(&server)
        .validate_location()
        .api_key("wrong")
        .location(LatLon(50.0614, 19.9366))
        .call()
        .await;

    assert!(matches!(result, Err(AirlyError::Fetch(ref e)) if e.is_unauthorized()));
}

#[tokio::test]
async fn test_setup_without_coverage_is_not_ready() {
    let server = CannedServer::start(vec![CannedResponse::json(200, NO_COVERAGE_JSON)]).await;
    let airly = airly(&server);

    let result = airly
        .setup_entry()
        .entry_id("nowhere")
        .config(LocationConfig::new("test-key", LatLon(49.2992, 19.9496)))
        .call()
        .await;

    assert!(matches!(
        result,
        Err(AirlyError::NotReady {
            reason: NotReadyReason::NoCoverage(_),
            ..
        })
    ));
    assert!(airly.entry_ids().await.is_empty());
}
