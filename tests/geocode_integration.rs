use std::time::Duration;

use dotenvy::dotenv;
use geolocatable::{GeoPoint, GeoQueryConfig, GeocodeClient, GeocodeErrorKind};
use url::Url;

mod geocode_test_utils;
use geocode_test_utils::shared::{unreachable_base_url, StubGeocoder};

fn client_for(base_url: &str) -> GeocodeClient {
    let config = GeoQueryConfig::new(["city", "state"])
        .expect("valid fields")
        .with_base_url(base_url)
        .expect("valid base url");
    GeocodeClient::new(&config).expect("Failed to build geocode client")
}

#[tokio::test]
async fn test_resolve_successful_answer() {
    let stub = StubGeocoder::start(200, "200,OK,42.3601,-71.0589").await;
    let client = client_for(&stub.base_url());

    let url = client.request_url("Boston, MA");
    let point = client.resolve(&url).await.expect("resolve should succeed");

    assert_eq!(point, Some(GeoPoint::new(42.3601, -71.0589)));
    assert_eq!(
        stub.requests(),
        vec!["/maps/geo?q=Boston%2C+MA&output=csv".to_string()]
    );
}

#[tokio::test]
async fn test_geocode_builds_query_from_values() {
    let stub = StubGeocoder::start(200, "200,8,48.7755,9.1827\n").await;
    let client = client_for(&stub.base_url());

    let point = client
        .geocode([Some("Stuttgart"), None, Some(""), Some("Germany")])
        .await
        .expect("geocode should succeed");

    assert_eq!(point, Some(GeoPoint::new(48.7755, 9.1827)));
    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].contains("q=Stuttgart%2C+Germany"), "{}", requests[0]);
}

#[tokio::test]
async fn test_short_answer_is_no_result() {
    let stub = StubGeocoder::start(200, "200,OK").await;
    let client = client_for(&stub.base_url());

    let url = client.request_url("Nowhere");
    let response = client.fetch(&url).await.expect("fetch should succeed");
    assert_eq!(response.status, 200);
    assert_eq!(response.point, None);

    assert_eq!(client.resolve(&url).await.expect("resolve should succeed"), None);
}

#[tokio::test]
async fn test_unknown_address_is_no_result() {
    let stub = StubGeocoder::start(200, "602,0,0,0").await;
    let client = client_for(&stub.base_url());

    let url = client.request_url("Atlantis");
    let response = client.fetch(&url).await.expect("fetch should succeed");
    assert_eq!(response.status, 602);
    assert!(!response.is_success());
    assert_eq!(client.resolve(&url).await.expect("resolve should succeed"), None);
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let stub = StubGeocoder::start(200, "<html>maintenance</html>").await;
    let client = client_for(&stub.base_url());

    let err = client
        .resolve(&client.request_url("Boston"))
        .await
        .expect_err("garbage must not resolve");
    assert_eq!(err.kind(), GeocodeErrorKind::InvalidResponse);
}

#[tokio::test]
async fn test_empty_body_is_invalid_response() {
    let stub = StubGeocoder::start(200, "").await;
    let client = client_for(&stub.base_url());

    let err = client
        .resolve(&client.request_url("Boston"))
        .await
        .expect_err("empty body must not resolve");
    assert_eq!(err.kind(), GeocodeErrorKind::InvalidResponse);
}

#[tokio::test]
async fn test_http_error_status_is_invalid_response() {
    let stub = StubGeocoder::start(500, "internal error").await;
    let client = client_for(&stub.base_url());

    let err = client
        .resolve(&client.request_url("Boston"))
        .await
        .expect_err("HTTP 500 must not resolve");
    assert_eq!(err.kind(), GeocodeErrorKind::InvalidResponse);
    assert!(err.to_string().contains("HTTP 500"), "{}", err);
}

#[tokio::test]
async fn test_connection_refused_is_network_failure() {
    let base = unreachable_base_url().await;
    let client = client_for(&base);

    let err = client
        .resolve(&client.request_url("Boston"))
        .await
        .expect_err("nobody is listening");
    assert_eq!(err.kind(), GeocodeErrorKind::NetworkFailure);
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn test_slow_geocoder_times_out() {
    let stub =
        StubGeocoder::start_with_delay(200, "200,OK,1.0,2.0", Duration::from_secs(3)).await;
    let config = GeoQueryConfig::new(["city"])
        .unwrap()
        .with_base_url(&stub.base_url())
        .unwrap()
        .with_timeout(Duration::from_millis(200))
        .unwrap();
    let client = GeocodeClient::new(&config).unwrap();

    let err = client
        .resolve(&client.request_url("Boston"))
        .await
        .expect_err("request should time out");
    assert_eq!(err.kind(), GeocodeErrorKind::NetworkFailure);
    assert!(err.is_timeout(), "expected a timeout, got {:?}", err);
}

#[tokio::test]
async fn test_cancelled_request() {
    let stub =
        StubGeocoder::start_with_delay(200, "200,OK,1.0,2.0", Duration::from_secs(3)).await;
    let client = client_for(&stub.base_url());

    let url = client.request_url("Boston");
    let err = client
        .resolve_with_cancel(&url, tokio::time::sleep(Duration::from_millis(50)))
        .await
        .expect_err("request should be cancelled");
    assert_eq!(err.kind(), GeocodeErrorKind::Cancelled);
}

#[tokio::test]
async fn test_cancel_signal_that_never_fires() {
    let stub = StubGeocoder::start(200, "200,OK,1.0,2.0").await;
    let client = client_for(&stub.base_url());

    let url = client.request_url("Boston");
    let point = client
        .resolve_with_cancel(&url, std::future::pending::<()>())
        .await
        .expect("resolve should succeed");
    assert_eq!(point, Some(GeoPoint::new(1.0, 2.0)));
}

#[tokio::test]
async fn test_range_validation_rejects_points_off_the_globe() {
    let stub = StubGeocoder::start(200, "200,OK,123.0,-71.0").await;

    let lenient = client_for(&stub.base_url());
    let url = lenient.request_url("Boston");
    assert_eq!(
        lenient.resolve(&url).await.unwrap(),
        Some(GeoPoint::new(123.0, -71.0))
    );

    let config = GeoQueryConfig::new(["city"])
        .unwrap()
        .with_base_url(&stub.base_url())
        .unwrap()
        .with_range_validation(true);
    let strict = GeocodeClient::new(&config).unwrap();
    let err = strict.resolve(&url).await.expect_err("latitude 123 is off the globe");
    assert_eq!(err.kind(), GeocodeErrorKind::InvalidResponse);
}

// Runs against a real geocoder only when GEOCODER_URL is set (e.g. in a .env file).
#[tokio::test]
async fn test_live_geocoder_when_configured() {
    dotenv().ok();
    let Ok(base_url) = std::env::var("GEOCODER_URL") else {
        return;
    };
    let client = client_for(&base_url);
    let url: Url = client.request_url("Boston, MA");

    match client.resolve(&url).await {
        Ok(Some(point)) => assert!(point.is_in_range(), "{:?}", point),
        Ok(None) => println!("Live geocoder found no result for {}", url),
        Err(e) => panic!("Live geocoder request failed: {}", e),
    }
}
