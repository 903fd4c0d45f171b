//! End-to-end form flows: controller + client + an in-process HTTP server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, put};
use axum::Router;
use serde_json::json;

use nms_client::{ApiError, CookieToken, NmsClient, SharedCookies};
use nms_core::{ClientSettings, ResourceKind, Verb};

use crate::{FormAction, FormController, FormOptions, FormPhase, FormStatus};

#[derive(Clone, Default)]
struct Hits {
    count: Arc<AtomicUsize>,
    authorization: Arc<Mutex<Vec<Option<String>>>>,
}

impl Hits {
    fn note(&self, headers: &HeaderMap) {
        self.count.fetch_add(1, Ordering::SeqCst);
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        self.authorization.lock().unwrap().push(auth);
    }
}

async fn deleted(State(hits): State<Hits>, headers: HeaderMap) -> StatusCode {
    hits.note(&headers);
    tokio::time::sleep(Duration::from_millis(50)).await;
    StatusCode::NO_CONTENT
}

async fn forbidden(State(hits): State<Hits>, headers: HeaderMap) -> (StatusCode, &'static str) {
    hits.note(&headers);
    (StatusCode::FORBIDDEN, "forbidden")
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/v1", addr)
}

async fn mock() -> (Hits, String) {
    let hits = Hits::default();
    let app = Router::new()
        .route("/api/v1/devices/{id}", delete(deleted))
        .route("/api/v1/locations/{id}", put(forbidden))
        .with_state(hits.clone());
    (hits, serve(app).await)
}

fn client(base_url: &str, cookies: &str) -> NmsClient {
    let settings = ClientSettings {
        api_source: base_url.to_string(),
        ..Default::default()
    };
    let jar = Arc::new(SharedCookies::new(cookies));
    NmsClient::new(&settings, Arc::new(CookieToken::new(jar, "token"))).unwrap()
}

fn record(form: &FormController) -> Arc<Mutex<Vec<FormStatus>>> {
    let seen = Arc::new(Mutex::new(vec![form.status()]));
    let sink = seen.clone();
    form.subscribe(move |s| sink.lock().unwrap().push(s.clone()));
    seen
}

#[tokio::test]
async fn delete_device_succeeds_and_closes() {
    let (hits, base) = mock().await;
    let api = client(&base, "theme=dark; token=abc123");
    let closed = Arc::new(AtomicUsize::new(0));
    let on_close = {
        let closed = closed.clone();
        move || {
            closed.fetch_add(1, Ordering::SeqCst);
        }
    };
    let form = FormController::with_options(
        FormAction::new(ResourceKind::Device, Verb::Delete),
        FormOptions::default().on_close(on_close),
    );
    let seen = record(&form);

    let out = form.submit(|| api.delete_device(42)).await;
    assert_eq!(out.unwrap().unwrap(), serde_json::Value::Null);
    assert_eq!(
        *hits.authorization.lock().unwrap(),
        vec![Some("Bearer abc123".to_string())]
    );

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(form.is_open());

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert!(!form.is_open());
    assert_eq!(closed.load(Ordering::SeqCst), 1);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            FormStatus::idle(),
            FormStatus::submitting("Deleting..."),
            FormStatus::success("Device deleted successfully!"),
            FormStatus::idle(),
        ]
    );
}

#[tokio::test]
async fn edit_location_forbidden_shows_body() {
    let (_, base) = mock().await;
    let api = client(&base, "token=abc123");
    let form = FormController::new(FormAction::new(ResourceKind::Location, Verb::Edit));

    let out = form
        .submit(|| api.edit_location(7, "name", json!("HQ")))
        .await
        .unwrap();
    match out {
        Err(ApiError::RemoteRejection { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "forbidden");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(form.status(), FormStatus::error("forbidden"));
    assert!(form.is_open());
}

#[tokio::test]
async fn missing_cookie_sends_no_authorization() {
    let (hits, base) = mock().await;
    let api = client(&base, "theme=dark");
    let form = FormController::new(FormAction::new(ResourceKind::Device, Verb::Delete));

    form.submit(|| api.delete_device(1)).await;
    assert_eq!(*hits.authorization.lock().unwrap(), vec![None::<String>]);
    assert_eq!(form.status().phase, FormPhase::Success);
}

#[tokio::test]
async fn offline_uses_fallback_message() {
    // Grab a free port, then close it so nothing is listening.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let api = client(&format!("http://{}/api/v1", addr), "token=abc123");
    let form = FormController::new(FormAction::new(ResourceKind::Device, Verb::Delete));

    let out = form.submit(|| api.delete_device(42)).await.unwrap();
    assert!(matches!(out, Err(ApiError::Transport(_))));
    assert_eq!(form.status(), FormStatus::error("Failed to delete device."));
}

#[tokio::test]
async fn double_submit_sends_one_request() {
    let (hits, base) = mock().await;
    let api = client(&base, "token=abc123");
    let form = FormController::new(FormAction::new(ResourceKind::Device, Verb::Delete));

    let (first, second) = tokio::join!(
        form.submit(|| api.delete_device(42)),
        form.submit(|| api.delete_device(42)),
    );
    assert_eq!(first.is_some() as u8 + second.is_some() as u8, 1);
    assert_eq!(hits.count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalid_id_fails_without_request() {
    let (hits, base) = mock().await;
    let api = client(&base, "token=abc123");
    let form = FormController::new(FormAction::new(ResourceKind::Device, Verb::Delete));

    let out = form.submit(|| api.delete_device(0)).await.unwrap();
    assert!(matches!(out, Err(ApiError::Validation(_))));
    assert_eq!(form.status().phase, FormPhase::Error);
    assert_eq!(hits.count.load(Ordering::SeqCst), 0);
}
