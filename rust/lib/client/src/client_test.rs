//! Client tests against a real HTTP server.
//!
//! Starts an in-process axum server that records every request and answers
//! with canned replies, then drives `NmsClient` through actual HTTP.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};

use nms_core::{ClientSettings, LocationCreateRoute, NewDevice, NewLocation, Protocol, TypeOption, Worker};

use crate::{ApiError, CookieToken, NmsClient, NoAuth, PasswordLogin, SharedCookies, StaticToken, TokenSource};

// =====================================================================
// Recording server
// =====================================================================

#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    path: String,
    authorization: Option<String>,
    content_type: Option<String>,
    body: String,
}

impl Seen {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Clone, Default)]
struct Mock {
    seen: Arc<Mutex<Vec<Seen>>>,
    replies: Arc<Mutex<HashMap<String, (StatusCode, String)>>>,
}

impl Mock {
    fn reply(&self, path: &str, status: StatusCode, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    fn last(&self) -> Seen {
        self.seen().pop().expect("no request recorded")
    }
}

async fn record(
    State(mock): State<Mock>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    };
    let path = uri.path().to_string();
    mock.seen.lock().unwrap().push(Seen {
        method,
        path: path.clone(),
        authorization: header("authorization"),
        content_type: header("content-type"),
        body,
    });

    let (status, body) = mock
        .replies
        .lock()
        .unwrap()
        .get(&path)
        .cloned()
        .unwrap_or((StatusCode::OK, "{}".to_string()));
    (status, body).into_response()
}

async fn start_mock() -> (Mock, String) {
    let mock = Mock::default();
    let app = Router::new().fallback(record).with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (mock, format!("http://{}/api/v1", addr))
}

fn client_for(base_url: &str, ts: Arc<dyn TokenSource>) -> NmsClient {
    let settings = ClientSettings {
        api_source: base_url.to_string(),
        ..Default::default()
    };
    NmsClient::new(&settings, ts).unwrap()
}

fn camera() -> NewDevice {
    NewDevice::new(Protocol::Icmp, "192.168.29.35", 3, "Gate camera", "cam-gate", "worker-1")
}

// =====================================================================
// Authorization header
// =====================================================================

#[tokio::test]
async fn authorization_header_follows_token_cookie() {
    let (mock, base) = start_mock().await;
    let jar = Arc::new(SharedCookies::new("theme=dark; token=jwt-abc"));
    let client = client_for(&base, Arc::new(CookieToken::new(jar.clone(), "token")));

    client.delete_device(42).await.unwrap();
    assert_eq!(mock.last().authorization.as_deref(), Some("Bearer jwt-abc"));

    // Cookie gone: the header must be absent, not empty.
    jar.set("theme=dark");
    client.delete_device(42).await.unwrap();
    assert_eq!(mock.last().authorization, None);

    jar.set("theme=dark; token=jwt-def");
    client.delete_device(42).await.unwrap();
    assert_eq!(mock.last().authorization.as_deref(), Some("Bearer jwt-def"));
}

#[tokio::test]
async fn no_token_means_no_authorization_on_any_mutation() {
    let (mock, base) = start_mock().await;
    let client = client_for(&base, Arc::new(NoAuth));

    client.create_device(&camera()).await.unwrap();
    client.create_device_type("Router").await.unwrap();
    client.edit_device(1, "display", "Core").await.unwrap();
    client.delete_device(1).await.unwrap();
    client.create_location(&NewLocation::new("Gate", 2, 23.7, 86.4)).await.unwrap();
    client.create_location_type("Checkpost").await.unwrap();
    client.edit_location(7, "name", "East Wing").await.unwrap();
    client.delete_location(7).await.unwrap();

    let seen = mock.seen();
    assert_eq!(seen.len(), 8);
    for req in seen {
        assert_eq!(req.authorization, None, "{} {}", req.method, req.path);
        assert_eq!(req.content_type.as_deref(), Some("application/json"));
    }
}

// =====================================================================
// Routing
// =====================================================================

#[tokio::test]
async fn mutations_hit_expected_endpoints() {
    let (mock, base) = start_mock().await;
    let client = client_for(&base, Arc::new(StaticToken::new("t")));

    client.create_device(&camera()).await.unwrap();
    let req = mock.last();
    assert_eq!((&req.method, req.path.as_str()), (&Method::POST, "/api/v1/devices"));
    assert_eq!(req.json()["hostname"], json!("cam-gate"));
    assert_eq!(req.json()["device_type_id"], json!(3));

    client.create_device_type("Router").await.unwrap();
    let req = mock.last();
    assert_eq!((&req.method, req.path.as_str()), (&Method::POST, "/api/v1/devices/types"));
    assert_eq!(req.json(), json!({"name": "Router"}));

    client.edit_device(12, "display", "Core switch").await.unwrap();
    let req = mock.last();
    assert_eq!((&req.method, req.path.as_str()), (&Method::PUT, "/api/v1/devices/12"));
    assert_eq!(req.json(), json!({"display": "Core switch"}));

    client.delete_device(12).await.unwrap();
    let req = mock.last();
    assert_eq!((&req.method, req.path.as_str()), (&Method::DELETE, "/api/v1/devices/12"));
    assert!(req.body.is_empty());

    client.create_location_type("Checkpost").await.unwrap();
    let req = mock.last();
    assert_eq!((&req.method, req.path.as_str()), (&Method::POST, "/api/v1/locations/types"));
    assert_eq!(req.json(), json!({"name": "Checkpost"}));

    client.edit_location(7, "name", "East Wing").await.unwrap();
    let req = mock.last();
    assert_eq!((&req.method, req.path.as_str()), (&Method::PUT, "/api/v1/locations/7"));
    assert_eq!(req.json(), json!({"field": "name", "data": "East Wing"}));

    client.delete_location(7).await.unwrap();
    let req = mock.last();
    assert_eq!((&req.method, req.path.as_str()), (&Method::DELETE, "/api/v1/locations/7"));
}

#[tokio::test]
async fn location_creation_route_follows_setting() {
    let (mock, base) = start_mock().await;
    let location = NewLocation::new("Lodna Area Checkpost 1", 2, 23.72, 86.41);

    let client = client_for(&base, Arc::new(NoAuth));
    client.create_location(&location).await.unwrap();
    assert_eq!(mock.last().path, "/api/v1/devices");
    assert_eq!(mock.last().json()["name"], json!("Lodna Area Checkpost 1"));

    let settings = ClientSettings {
        api_source: base.clone(),
        location_create_route: LocationCreateRoute::Locations,
        ..Default::default()
    };
    let client = NmsClient::new(&settings, Arc::new(NoAuth)).unwrap();
    client.create_location(&location).await.unwrap();
    assert_eq!(mock.last().path, "/api/v1/locations");
}

// =====================================================================
// Response classification
// =====================================================================

#[tokio::test]
async fn success_body_passes_through_unchanged() {
    let (mock, base) = start_mock().await;
    let upstream = json!({
        "id": 51,
        "hostname": "cam-gate",
        "status": {"up": true, "latency_ms": [3, 4, 5]},
        "tags": null
    });
    mock.reply("/api/v1/devices", StatusCode::CREATED, &upstream.to_string());

    let client = client_for(&base, Arc::new(NoAuth));
    let result = client.create_device(&camera()).await.unwrap();
    assert_eq!(result, upstream);
}

#[tokio::test]
async fn no_content_resolves_to_null() {
    let (mock, base) = start_mock().await;
    mock.reply("/api/v1/devices/42", StatusCode::NO_CONTENT, "");

    let client = client_for(&base, Arc::new(NoAuth));
    assert_eq!(client.delete_device(42).await.unwrap(), Value::Null);
}

#[tokio::test]
async fn rejection_carries_body_text() {
    let (mock, base) = start_mock().await;
    mock.reply("/api/v1/locations/7", StatusCode::FORBIDDEN, "forbidden");

    let client = client_for(&base, Arc::new(NoAuth));
    let err = client.edit_location(7, "name", "East Wing").await.unwrap_err();
    match err {
        ApiError::RemoteRejection { status, ref message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "forbidden");
        }
        other => panic!("expected RemoteRejection, got {:?}", other),
    }
}

#[tokio::test]
async fn rejection_without_body_uses_status_text() {
    let (mock, base) = start_mock().await;
    mock.reply("/api/v1/devices/9", StatusCode::NOT_FOUND, "");

    let client = client_for(&base, Arc::new(NoAuth));
    let err = client.delete_device(9).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.user_message(), Some("Not Found"));
}

#[tokio::test]
async fn every_error_status_rejects() {
    let (mock, base) = start_mock().await;
    let client = client_for(&base, Arc::new(NoAuth));

    for code in [400u16, 401, 409, 422, 500, 502, 503] {
        // A JSON body must not be mistaken for a result.
        mock.reply(
            "/api/v1/devices/types",
            StatusCode::from_u16(code).unwrap(),
            r#"{"error":"nope"}"#,
        );
        let err = client.create_device_type("Router").await.unwrap_err();
        assert_eq!(err.status(), Some(code));
    }
}

#[tokio::test]
async fn invalid_json_is_malformed() {
    let (mock, base) = start_mock().await;
    mock.reply("/api/v1/devices", StatusCode::OK, "<html>proxy error</html>");

    let client = client_for(&base, Arc::new(NoAuth));
    let err = client.create_device(&camera()).await.unwrap_err();
    assert!(matches!(err, ApiError::MalformedResponse(_)), "got {:?}", err);
}

#[tokio::test]
async fn validation_failures_send_nothing() {
    let (mock, base) = start_mock().await;
    let client = client_for(&base, Arc::new(NoAuth));

    assert!(matches!(client.delete_location(0).await, Err(ApiError::Validation(_))));
    assert!(matches!(client.create_device_type(" ").await, Err(ApiError::Validation(_))));

    let mut bad = camera();
    bad.ip = "not-an-ip".into();
    assert!(matches!(client.create_device(&bad).await, Err(ApiError::Validation(_))));

    assert!(mock.seen().is_empty());
}

#[tokio::test]
async fn unreachable_host_is_transport_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{}", addr), Arc::new(NoAuth));
    let err = client.delete_device(42).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {:?}", err);
    assert_eq!(err.user_message(), None);
}

// =====================================================================
// Reads
// =====================================================================

#[tokio::test]
async fn picker_reads_unwrap_envelopes() {
    let (mock, base) = start_mock().await;
    mock.reply(
        "/api/v1/devices/types",
        StatusCode::OK,
        r#"{"device_types":[{"id":1,"name":"Camera","icon":"cam"},{"id":2,"name":"Router"}]}"#,
    );
    mock.reply(
        "/api/v1/locations/types",
        StatusCode::OK,
        r#"[{"id":4,"name":"Checkpost"}]"#,
    );
    mock.reply(
        "/api/v1/workers",
        StatusCode::OK,
        r#"{"workers":[{"id":"w-1","hostname":"probe-east"}]}"#,
    );

    let client = client_for(&base, Arc::new(StaticToken::new("t")));
    assert_eq!(
        client.device_types().await.unwrap(),
        vec![
            TypeOption { id: 1, name: "Camera".into() },
            TypeOption { id: 2, name: "Router".into() },
        ]
    );
    assert_eq!(
        client.location_types().await.unwrap(),
        vec![TypeOption { id: 4, name: "Checkpost".into() }]
    );
    assert_eq!(
        client.workers().await.unwrap(),
        vec![Worker { id: "w-1".into(), hostname: "probe-east".into() }]
    );

    for req in mock.seen() {
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.authorization.as_deref(), Some("Bearer t"));
        assert!(req.body.is_empty());
    }
}

#[tokio::test]
async fn read_shape_mismatch_is_malformed() {
    let (mock, base) = start_mock().await;
    mock.reply("/api/v1/devices/types", StatusCode::OK, r#"[{"id":1,"name":"Camera"}]"#);

    let client = client_for(&base, Arc::new(NoAuth));
    let err = client.device_types().await.unwrap_err();
    assert!(matches!(err, ApiError::MalformedResponse(_)), "got {:?}", err);
}

#[tokio::test]
async fn report_reads_pass_through() {
    let (mock, base) = start_mock().await;
    let stats = json!({"total": 120, "up": 111, "down": 9});
    mock.reply("/api/v1/devices/statistics", StatusCode::OK, &stats.to_string());
    mock.reply("/api/v1/devices/5", StatusCode::OK, r#"{"id":5,"hostname":"sw-core"}"#);

    let client = client_for(&base, Arc::new(NoAuth));
    assert_eq!(client.device_statistics().await.unwrap(), stats);
    assert_eq!(client.device(5).await.unwrap()["hostname"], json!("sw-core"));
}

// =====================================================================
// PasswordLogin token source
// =====================================================================

const LOGIN_OK: &str = r#"{
    "token": "jwt-login-1",
    "user": {"id": 1, "username": "admin", "role": "admin", "is_active": true,
             "has_api_key": false, "token_expiry": "2999-01-01T00:00:00Z"}
}"#;

#[tokio::test]
async fn password_login_caches_token() {
    let (mock, base) = start_mock().await;
    mock.reply("/api/v1/auth/login", StatusCode::OK, LOGIN_OK);

    let ts = Arc::new(PasswordLogin::new(&base, "admin", "secret"));
    let client = client_for(&base, ts.clone());

    client.delete_device(1).await.unwrap();
    client.delete_device(2).await.unwrap();

    let seen = mock.seen();
    let logins: Vec<&Seen> = seen.iter().filter(|s| s.path == "/api/v1/auth/login").collect();
    assert_eq!(logins.len(), 1, "token should be cached");
    assert_eq!(logins[0].json(), json!({"username": "admin", "password": "secret"}));
    assert_eq!(logins[0].authorization, None);

    assert_eq!(mock.last().authorization.as_deref(), Some("Bearer jwt-login-1"));
}

#[tokio::test]
async fn password_login_without_expiry_is_not_cached() {
    let (mock, base) = start_mock().await;
    mock.reply("/api/v1/auth/login", StatusCode::OK, r#"{"token":"jwt-x","user":{}}"#);

    let ts = PasswordLogin::new(&base, "admin", "secret");
    assert_eq!(ts.token().await.unwrap().as_deref(), Some("jwt-x"));
    assert_eq!(ts.token().await.unwrap().as_deref(), Some("jwt-x"));
    assert_eq!(mock.seen().len(), 2);
}

#[tokio::test]
async fn password_login_bad_credentials() {
    let (mock, base) = start_mock().await;
    mock.reply("/api/v1/auth/login", StatusCode::UNAUTHORIZED, "invalid credentials");

    let ts = Arc::new(PasswordLogin::new(&base, "admin", "wrong"));
    let client = client_for(&base, ts);

    let err = client.delete_device(1).await.unwrap_err();
    match err {
        ApiError::RemoteRejection { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid credentials");
        }
        other => panic!("expected RemoteRejection, got {:?}", other),
    }
    // The delete itself was never attempted.
    assert_eq!(mock.seen().len(), 1);
}
