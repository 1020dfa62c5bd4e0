//! Tests for `AdminClient` against a fake Caddy admin server.
//!
//! The fake is a small `axum` router that serves canned responses for each
//! admin endpoint and records what it received, so the tests can check both
//! sides of every exchange.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use url::Url;

use console_admin::application::{AdminApi, AdminError, PkiService};
use console_admin::domain::Upstream;
use console_admin::infrastructure::AdminClient;

/// One request as seen by the fake server.
#[derive(Debug, Clone, PartialEq)]
struct Received {
    path: String,
    content_type: Option<String>,
    body: String,
}

type Journal = Arc<Mutex<Vec<Received>>>;

const METRICS: &str = "\
# HELP caddy_admin_http_requests_total Counter of requests made to the Admin API's HTTP endpoints.
# TYPE caddy_admin_http_requests_total counter
caddy_admin_http_requests_total{code=\"200\",handler=\"metrics\",method=\"GET\",path=\"/metrics\"} 4
";

async fn serve(router: Router) -> AdminClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    AdminClient::new(Url::parse(&format!("http://{addr}")).unwrap()).unwrap()
}

fn record(journal: &Journal, path: &str, headers: &HeaderMap, body: String) {
    journal.lock().unwrap().push(Received {
        path: path.to_string(),
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
}

async fn load(State(journal): State<Journal>, headers: HeaderMap, body: String) -> StatusCode {
    record(&journal, "/load", &headers, body);
    StatusCode::OK
}

async fn adapt(State(journal): State<Journal>, headers: HeaderMap, body: String) -> Json<Value> {
    record(&journal, "/adapt", &headers, body);
    Json(json!({
        "result": { "apps": { "http": { "servers": {} } } },
        "warnings": [
            { "file": "Caddyfile", "line": 2, "directive": "encode", "message": "unused" }
        ]
    }))
}

async fn certificate_authority(
    State(journal): State<Journal>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    record(&journal, "/pki/ca", &HeaderMap::new(), id.clone());
    match id.as_str() {
        "local" | "corp" | "my ca" => Ok(Json(json!({
            "id": id,
            "name": format!("{id} authority"),
            "root_common_name": format!("{id} root"),
            "intermediate_common_name": format!("{id} intermediate"),
            "root_certificate": "-----BEGIN CERTIFICATE-----\nR\n-----END CERTIFICATE-----\n",
            "intermediate_certificate": "-----BEGIN CERTIFICATE-----\nI\n-----END CERTIFICATE-----\n"
        }))),
        _ => Err((
            StatusCode::NOT_FOUND,
            "{\"error\":\"no certificate authority configured with id: nope\"}".to_string(),
        )),
    }
}

/// A well-behaved admin server.
fn fake_caddy(journal: Journal) -> Router {
    Router::new()
        .route(
            "/config/",
            get(|| async { Json(json!({ "admin": { "listen": "localhost:2019" } })) }),
        )
        .route("/load", post(load))
        .route("/adapt", post(adapt))
        .route(
            "/reverse_proxy/upstreams",
            get(|| async {
                Json(json!([
                    { "address": "10.0.0.5:8080", "num_requests": 2, "fails": 0 },
                    { "address": "10.0.0.6:8080", "healthy": false, "num_requests": 0, "fails": 3 }
                ]))
            }),
        )
        .route("/metrics", get(|| async { METRICS }))
        .route(
            "/config/apps/pki/certificate_authorities",
            get(|| async { Json(json!({ "local": {}, "corp": { "name": "Corp" } })) }),
        )
        .route("/pki/ca/:id", get(certificate_authority))
        .with_state(journal)
}

/// A server whose every endpoint misbehaves in one way or another.
fn broken_caddy() -> Router {
    Router::new()
        .route(
            "/config/",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "{\"error\":\"loading config: boom\"}\n",
                )
            }),
        )
        .route("/reverse_proxy/upstreams", get(|| async { "<html>not json</html>" }))
        .route(
            "/config/apps/pki/certificate_authorities",
            get(|| async { Json(Value::Null) }),
        )
        .route(
            "/adapt",
            post(|| async { (StatusCode::BAD_REQUEST, "{\"error\":\"Caddyfile:1: unknown directive\"}") }),
        )
}

async fn fake_client() -> (AdminClient, Journal) {
    let journal = Journal::default();
    (serve(fake_caddy(journal.clone())).await, journal)
}

// ── Happy paths ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_config_returns_json_tree() {
    let (client, _) = fake_client().await;

    let config = client.config().await.unwrap();

    assert_eq!(config, json!({ "admin": { "listen": "localhost:2019" } }));
}

#[tokio::test]
async fn test_load_posts_json_body() {
    // Arrange
    let (client, journal) = fake_client().await;
    let config = json!({ "apps": { "http": {} } });

    // Act
    let response = client.load(&config).await;

    // Assert
    tokio_test::assert_ok!(response);
    let received = journal.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(serde_json::from_str::<Value>(&received[0].body).unwrap(), config);
}

#[tokio::test]
async fn test_adapt_posts_caddyfile_and_decodes_warnings() {
    // Arrange
    let (client, journal) = fake_client().await;
    let caddyfile = "localhost\nencode gzip\n";

    // Act
    let response = client.adapt(caddyfile).await.unwrap();

    // Assert
    let received = journal.lock().unwrap().clone();
    assert_eq!(
        received,
        vec![Received {
            path: "/adapt".to_string(),
            content_type: Some("text/caddyfile".to_string()),
            body: caddyfile.to_string(),
        }]
    );
    assert_eq!(response.result["apps"]["http"], json!({ "servers": {} }));
    assert_eq!(response.warnings[0].to_string(), "Caddyfile:2: encode: unused");
}

#[tokio::test]
async fn test_upstreams_decode_with_optional_health() {
    let (client, _) = fake_client().await;

    let upstreams = client.upstreams().await.unwrap();

    assert_eq!(
        upstreams,
        vec![
            Upstream {
                address: "10.0.0.5:8080".to_string(),
                healthy: None,
                num_requests: 2,
                fails: 0,
            },
            Upstream {
                address: "10.0.0.6:8080".to_string(),
                healthy: Some(false),
                num_requests: 0,
                fails: 3,
            },
        ]
    );
}

#[tokio::test]
async fn test_metrics_returns_exposition_verbatim() {
    let (client, _) = fake_client().await;

    assert_eq!(client.metrics().await.unwrap(), METRICS);
}

#[tokio::test]
async fn test_pki_service_fetches_each_configured_authority() {
    // Arrange
    let (client, journal) = fake_client().await;

    // Act
    let authorities = PkiService::new(&client).certificate_authorities().await.unwrap();

    // Assert
    let ids: Vec<_> = authorities.iter().map(|ca| ca.id.as_str()).collect();
    assert_eq!(ids, vec!["corp", "local"]);
    assert_eq!(authorities[1].root_common_name, "local root");
    let requested: Vec<_> = journal.lock().unwrap().iter().map(|r| r.body.clone()).collect();
    assert_eq!(requested, vec!["corp", "local"]);
}

#[tokio::test]
async fn test_certificate_authority_id_is_percent_encoded() {
    let (client, journal) = fake_client().await;

    let ca = client.certificate_authority("my ca").await.unwrap();

    assert_eq!(ca.name, "my ca authority");
    assert_eq!(journal.lock().unwrap()[0].body, "my ca");
}

// ── Failures ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_error_status_keeps_endpoint_and_body() {
    let client = serve(broken_caddy()).await;

    let result = client.config().await;

    match result {
        Err(AdminError::Status {
            endpoint,
            status,
            body,
        }) => {
            assert_eq!(endpoint, "/config/");
            assert_eq!(status, 500);
            assert_eq!(body, "{\"error\":\"loading config: boom\"}");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_adapt_rejection_is_status_error() {
    let client = serve(broken_caddy()).await;

    let result = client.adapt("bogus").await;

    assert!(matches!(result, Err(AdminError::Status { status: 400, .. })));
}

#[tokio::test]
async fn test_unknown_authority_is_not_found() {
    let (client, _) = fake_client().await;

    let result = client.certificate_authority("nope").await;

    match result {
        Err(AdminError::Status { endpoint, status, .. }) => {
            assert_eq!(endpoint, "/pki/ca/nope");
            assert_eq!(status, 404);
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_json_is_decode_error() {
    let client = serve(broken_caddy()).await;

    let result = client.upstreams().await;

    assert!(matches!(
        result,
        Err(AdminError::Decode { ref endpoint, .. }) if endpoint == "/reverse_proxy/upstreams"
    ));
}

#[tokio::test]
async fn test_missing_pki_app_means_no_authorities() {
    let client = serve(broken_caddy()).await;

    let authorities = PkiService::new(&client).certificate_authorities().await.unwrap();

    assert!(authorities.is_empty());
}

#[tokio::test]
async fn test_unreachable_server_is_request_error() {
    // Arrange: grab a free port and release it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = AdminClient::new(Url::parse(&format!("http://{addr}")).unwrap()).unwrap();

    // Act
    let result = client.metrics().await;

    // Assert
    let error = result.unwrap_err();
    assert!(matches!(error, AdminError::Request { .. }));
    assert!(error.to_string().starts_with("request to /metrics failed"));
}

#[tokio::test]
async fn test_hung_server_hits_request_timeout() {
    // Arrange: the server accepts the request and never answers in time.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = Router::new().route(
        "/metrics",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            "late 1\n"
        }),
    );
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    let client = AdminClient::with_timeouts(
        Url::parse(&format!("http://{addr}")).unwrap(),
        Duration::from_secs(1),
        Duration::from_millis(200),
    )
    .unwrap();

    // Act
    let result = tokio::time::timeout(Duration::from_secs(5), client.metrics())
        .await
        .expect("request timeout should fire before the test timeout");

    // Assert
    match result {
        Err(AdminError::Request { endpoint, source }) => {
            assert_eq!(endpoint, "/metrics");
            assert!(source.is_timeout());
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}
