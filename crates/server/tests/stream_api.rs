//! In-process tests of the stream-discovery surface.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestFixture};
use rdflix_core::{
    config::{DebridConfig, RateLimitConfig},
    testing::MockDebridClient,
    Config,
};

#[tokio::test]
async fn test_manifest() {
    let fixture = TestFixture::new();

    let response = fixture.get("/manifest.json").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["id"], "org.community.realdebrid");
    assert_eq!(response.body["name"], "Real-Debrid Community");
    assert_eq!(response.body["resources"], json!(["stream"]));
    assert_eq!(response.body["types"], json!(["movie", "series"]));
    assert_eq!(response.body["catalogs"], json!([]));
}

#[tokio::test]
async fn test_movie_stream() {
    let fixture = TestFixture::new();
    fixture
        .indexer
        .add_record(fixtures::record("Movie.2020.1080p.BluRay", 'a', 25))
        .await;

    let response = fixture.get("/stream/movie/tt0111161.json").await;

    assert_status!(response, StatusCode::OK);
    let streams = response.body["streams"].as_array().unwrap();
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0]["url"], MockDebridClient::download_url(1));
    assert_eq!(streams[0]["behaviorHints"]["bingeGroup"], "rdflix|1080p|BluRay");
    assert!(streams[0]["behaviorHints"]["videoSize"].as_u64().unwrap() > 0);

    let searches = fixture.indexer.recorded_searches().await;
    assert_eq!(searches[0].title_id, "tt0111161");
}

#[tokio::test]
async fn test_series_stream_by_colon_id() {
    let fixture = TestFixture::new();
    fixture
        .debrid
        .set_files(vec![
            fixtures::file(1, "Show.S01E01.mkv", 700),
            fixtures::file(2, "Show.S01E02.mkv", 800),
        ])
        .await;
    fixture
        .indexer
        .add_record(fixtures::record("Show.S01.1080p.WEB", 'b', 40))
        .await;

    let response = fixture.get("/stream/series/tt0944947:1:2.json").await;

    assert_status!(response, StatusCode::OK);
    let streams = response.body["streams"].as_array().unwrap();
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0]["behaviorHints"]["filename"], "Show.S01E02.mkv");

    let searches = fixture.indexer.recorded_searches().await;
    assert_eq!(searches[0].season, Some(1));
    assert_eq!(searches[0].episode, Some(2));
}

#[tokio::test]
async fn test_series_stream_by_extra_segment() {
    let fixture = TestFixture::new();
    fixture
        .indexer
        .add_record(fixtures::record("Show.S02E03.720p.HDTV", 'c', 5))
        .await;
    fixture
        .debrid
        .set_files(vec![fixtures::file(9, "Show.S02E03.mkv", 500)])
        .await;

    let response = fixture.get("/stream/series/tt0944947/2:3.json").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["streams"].as_array().unwrap().len(), 1);
    let searches = fixture.indexer.recorded_searches().await;
    assert_eq!(searches[0].stremio_id(), "tt0944947:2:3");
}

#[tokio::test]
async fn test_nothing_resolved_is_empty_200() {
    let fixture = TestFixture::new();
    fixture.debrid.set_files(vec![fixtures::file(1, "readme.txt", 1)]).await;
    fixture
        .indexer
        .add_record(fixtures::record("Movie.1080p", 'a', 5))
        .await;

    let response = fixture.get("/stream/movie/tt1.json").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body, json!({ "streams": [] }));
}

#[tokio::test]
async fn test_missing_key_is_empty_200() {
    let fixture = TestFixture::with_config(Config::default());
    fixture
        .indexer
        .add_record(fixtures::record("Movie.1080p", 'a', 5))
        .await;

    let response = fixture.get("/stream/movie/tt1.json").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body, json!({ "streams": [] }));
    assert_eq!(fixture.indexer.search_count().await, 0);
}

#[tokio::test]
async fn test_unknown_type_is_400() {
    let fixture = TestFixture::new();

    let response = fixture.get("/stream/channel/tt1.json").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_malformed_id_is_400() {
    let fixture = TestFixture::new();

    assert_status!(
        fixture.get("/stream/movie/tt1:1:2.json").await,
        StatusCode::BAD_REQUEST
    );
    assert_status!(
        fixture.get("/stream/series/tt1:x:2.json").await,
        StatusCode::BAD_REQUEST
    );
    assert_status!(
        fixture.get("/stream/series/.json").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(fixture.indexer.search_count().await, 0);
}

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/health").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["debrid_configured"], true);
    assert_eq!(response.body["indexers"], json!(["mock"]));
}

#[tokio::test]
async fn test_config_hides_api_key() {
    let fixture = TestFixture::with_config(Config {
        debrid: DebridConfig {
            api_key: "super-secret".to_string(),
            ..Default::default()
        },
        ..Default::default()
    });

    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["debrid"]["api_key_configured"], true);
    assert!(!response.text.contains("super-secret"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/manifest.json").await;

    let response = fixture.get("/metrics").await;

    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("rdflix_http_requests_total"));
    assert!(response
        .content_type
        .unwrap_or_default()
        .starts_with("text/plain"));
}

#[tokio::test]
async fn test_cors_header() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let fixture = TestFixture::new();
    let request = Request::builder()
        .uri("/manifest.json")
        .header("Origin", "https://web.stremio.com")
        .body(Body::empty())
        .unwrap();

    let response = fixture.router.clone().oneshot(request).await.unwrap();

    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}

fn rate_limited_fixture(enabled: bool) -> TestFixture {
    TestFixture::with_config(Config {
        debrid: DebridConfig {
            api_key: "test-key".to_string(),
            ..Default::default()
        },
        rate_limit: RateLimitConfig {
            enabled,
            max_requests: 3,
            window_secs: 900,
        },
        ..Default::default()
    })
}

#[tokio::test]
async fn test_burst_is_rate_limited() {
    let fixture = rate_limited_fixture(true);
    let client = "192.0.2.10:40000".parse().unwrap();

    for _ in 0..3 {
        let response = fixture.get_from("/manifest.json", client).await;
        assert_status!(response, StatusCode::OK);
    }

    let response = fixture
        .get_from("/stream/movie/tt0111161.json", client)
        .await;
    assert_status!(response, StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers.contains_key("retry-after"));
    assert_eq!(
        response.body["error"],
        "Too many requests, please try again later."
    );
    assert_eq!(fixture.indexer.search_count().await, 0);
}

#[tokio::test]
async fn test_rate_limit_is_per_client() {
    let fixture = rate_limited_fixture(true);
    let first = "192.0.2.10:40000".parse().unwrap();
    let second = "192.0.2.11:40000".parse().unwrap();

    for _ in 0..3 {
        fixture.get_from("/manifest.json", first).await;
    }

    let response = fixture.get_from("/manifest.json", first).await;
    assert_status!(response, StatusCode::TOO_MANY_REQUESTS);
    let response = fixture.get_from("/manifest.json", second).await;
    assert_status!(response, StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_metrics_are_not_rate_limited() {
    let fixture = rate_limited_fixture(true);
    let client = "192.0.2.10:40000".parse().unwrap();

    for _ in 0..4 {
        fixture.get_from("/manifest.json", client).await;
    }

    let response = fixture.get_from("/api/v1/health", client).await;
    assert_status!(response, StatusCode::OK);
    let response = fixture.get_from("/metrics", client).await;
    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("rdflix_rate_limited_total"));
}

#[tokio::test]
async fn test_disabled_rate_limit_allows_bursts() {
    let fixture = rate_limited_fixture(false);
    let client = "192.0.2.10:40000".parse().unwrap();

    for _ in 0..10 {
        let response = fixture.get_from("/manifest.json", client).await;
        assert_status!(response, StatusCode::OK);
    }
}
