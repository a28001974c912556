//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint, with a manual clock
//! driving TTL expiry and rate limit windows.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response, StatusCode},
    Router,
};
use clinic_core::{
    api::create_router, cache::CacheStore, clock::ManualClock, ratelimit::RateLimiter, AppState,
    Config,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    create_router(AppState::from_config(&Config::default()))
}

/// App whose cache and limiter read `clock`.
fn create_clocked_app(clock: Arc<ManualClock>, config: &Config) -> Router {
    let state = AppState::new(
        CacheStore::with_clock(clock.clone()),
        RateLimiter::with_clock(clock),
        config,
    );
    create_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "198.51.100.10");
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn put(app: &Router, key: &str, value: Value) {
    let response = send(app, "PUT", "/cache", Some(json!({"key": key, "value": value}))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// == SET / GET Endpoint Tests ==

#[tokio::test]
async fn test_set_and_get_json_value() {
    let app = create_test_app();

    let response = send(
        &app,
        "PUT",
        "/cache",
        Some(json!({"key": "doctor:7", "value": {"name": "Dr. Moss", "slots": [9, 10]}})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("doctor:7"));

    let response = send(&app, "GET", "/cache/doctor:7", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "doctor:7");
    assert_eq!(json["value"]["slots"], json!([9, 10]));
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let response = send(&app, "GET", "/cache/nonexistent_key", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("nonexistent_key"));
}

#[tokio::test]
async fn test_overwrite_via_api() {
    let app = create_test_app();

    put(&app, "user:1", json!("v1")).await;
    put(&app, "user:1", json!("v2")).await;

    let response = send(&app, "GET", "/cache/user:1", None).await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["value"], "v2");
}

// == TTL Expiration via API Tests ==

#[tokio::test]
async fn test_ttl_expiration_via_api() {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let app = create_clocked_app(clock.clone(), &Config::default());

    let response = send(
        &app,
        "PUT",
        "/cache",
        Some(json!({"key": "ttl_test", "value": "expires_soon", "ttl": 1})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/cache/ttl_test", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    clock.advance(Duration::from_millis(1_001));

    let response = send(&app, "GET", "/cache/ttl_test", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_default_ttl_applies() {
    let clock = Arc::new(ManualClock::new(0));
    let config = Config {
        default_ttl: 10,
        ..Config::default()
    };
    let app = create_clocked_app(clock.clone(), &config);

    put(&app, "groups:list:all", json!([])).await;
    clock.advance(Duration::from_secs(9));
    assert_eq!(
        send(&app, "GET", "/cache/groups:list:all", None).await.status(),
        StatusCode::OK
    );

    clock.advance(Duration::from_secs(1));
    assert_eq!(
        send(&app, "GET", "/cache/groups:list:all", None).await.status(),
        StatusCode::NOT_FOUND
    );
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint() {
    let app = create_test_app();
    put(&app, "delete_key", json!("delete_value")).await;

    let response = send(&app, "DELETE", "/cache/delete_key", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["deleted"], true);

    let response = send(&app, "GET", "/cache/delete_key", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_missing_key_is_noop() {
    let app = create_test_app();

    let response = send(&app, "DELETE", "/cache/nonexistent_key", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["deleted"], false);
}

#[tokio::test]
async fn test_delete_by_prefix_endpoint() {
    let app = create_test_app();
    for key in ["a:1", "a:2", "b:1"] {
        put(&app, key, json!(key)).await;
    }

    let response = send(&app, "DELETE", "/cache/prefix/a:", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 2);

    assert_eq!(send(&app, "GET", "/cache/a:1", None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(send(&app, "GET", "/cache/b:1", None).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_clear_endpoint() {
    let app = create_test_app();
    put(&app, "x", json!(1)).await;
    put(&app, "y", json!(2)).await;

    let response = send(&app, "DELETE", "/cache", None).await;
    assert_eq!(body_to_json(response.into_body()).await["removed"], 2);

    let stats = body_to_json(send(&app, "GET", "/stats", None).await.into_body()).await;
    assert_eq!(stats["total_entries"], 0);
}

// == INVALIDATE Endpoint Tests ==

#[tokio::test]
async fn test_invalidate_group_fan_out() {
    let app = create_test_app();
    let keys = [
        "group:G",
        "group:G:details",
        "groups:list:all",
        "sessions:G:upcoming",
        "attendance:S1:all",
        "user:U",
    ];
    for key in keys {
        put(&app, key, json!(key)).await;
    }

    let response = send(&app, "POST", "/invalidate", Some(json!({"entity": "group", "id": "G"}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["removed"], 5);

    for key in &keys[..5] {
        let uri = format!("/cache/{key}");
        assert_eq!(send(&app, "GET", &uri, None).await.status(), StatusCode::NOT_FOUND);
    }
    assert_eq!(send(&app, "GET", "/cache/user:U", None).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalidate_appointment_drops_availability() {
    let app = create_test_app();
    put(&app, "availability:D:2024-05-01", json!(["09:00", "09:30"])).await;
    put(&app, "availability:E:2024-05-01", json!(["10:00"])).await;

    let response = send(
        &app,
        "POST",
        "/invalidate",
        Some(json!({"entity": "appointment", "doctor_id": "D", "id": "A1"})),
    )
    .await;
    assert_eq!(body_to_json(response.into_body()).await["removed"], 1);

    assert_eq!(
        send(&app, "GET", "/cache/availability:E:2024-05-01", None).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_invalidate_unknown_entity_rejected() {
    let app = create_test_app();

    let response = send(&app, "POST", "/invalidate", Some(json!({"entity": "invoice", "id": "1"}))).await;

    assert!(response.status().is_client_error());
}

// == STATS Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app();

    put(&app, "stats_key", json!("stats_value")).await;
    send(&app, "GET", "/cache/stats_key", None).await;
    send(&app, "GET", "/cache/nonexistent", None).await;

    let response = send(&app, "GET", "/stats", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;

    assert_eq!(json["hits"].as_u64().unwrap(), 1);
    assert_eq!(json["misses"].as_u64().unwrap(), 1);
    assert_eq!(json["total_entries"].as_u64().unwrap(), 1);
    assert_eq!(json["rate_limited_clients"].as_u64().unwrap(), 1);
    assert!(json.get("hit_rate").is_some());
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = send(&app, "GET", "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"].as_str().unwrap(), "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Rate Limiting Tests ==

#[tokio::test]
async fn test_rate_limit_window_via_api() {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let config = Config {
        rate_limit_max_requests: 3,
        rate_limit_window_secs: 60,
        ..Config::default()
    };
    let app = create_clocked_app(clock.clone(), &config);

    for expected_remaining in ["2", "1", "0"] {
        let response = send(&app, "GET", "/stats", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-remaining"], expected_remaining);
    }

    let response = send(&app, "GET", "/stats", None).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "60");
    let json = body_to_json(response.into_body()).await;
    assert!(json["reset_at"].as_str().is_some());

    // Health checks are never limited
    assert_eq!(send(&app, "GET", "/health", None).await.status(), StatusCode::OK);

    clock.advance(Duration::from_secs(61));

    let response = send(&app, "GET", "/stats", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "2");
}

#[tokio::test]
async fn test_rate_limit_isolated_per_client() {
    let config = Config {
        rate_limit_max_requests: 1,
        ..Config::default()
    };
    let app = create_router(AppState::from_config(&config));

    let request = |ip: &'static str| {
        Request::builder()
            .uri("/stats")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    let first = app.clone().oneshot(request("203.0.113.1")).await.unwrap();
    let again = app.clone().oneshot(request("203.0.113.1")).await.unwrap();
    let other = app.oneshot(request("203.0.113.2")).await.unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(again.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_keys_direct_clients_by_peer_ip() {
    let config = Config {
        rate_limit_max_requests: 1,
        ..Config::default()
    };
    let app = create_router(AppState::from_config(&config));

    // No proxy headers, only the accepted connection's address
    let request = |peer: &str| {
        let mut request = Request::builder().uri("/stats").body(Body::empty()).unwrap();
        let addr: SocketAddr = peer.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    };

    let client_a = app.clone().oneshot(request("192.0.2.1:40000")).await.unwrap();
    let client_b = app.clone().oneshot(request("192.0.2.2:40000")).await.unwrap();
    let client_a_again = app.oneshot(request("192.0.2.1:40001")).await.unwrap();

    assert_eq!(client_a.status(), StatusCode::OK);
    assert_eq!(client_b.status(), StatusCode::OK);
    assert_eq!(client_a_again.status(), StatusCode::TOO_MANY_REQUESTS);
}

// == Error Response Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/cache")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"invalid json"#))
                .unwrap(),
        )
        .await
        .unwrap();

    // Axum returns 400 or 422 for JSON parsing errors
    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_empty_key_request() {
    let app = create_test_app();

    let response = send(&app, "PUT", "/cache", Some(json!({"key": "", "value": "test"}))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}
