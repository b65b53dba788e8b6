#![allow(dead_code)]

pub mod logs;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use base64::Engine as _;
use http_body_util::BodyExt;
use tower::ServiceExt;

use costguard_cloud::executor::ShutdownExecutor;
use costguard_cloud::provider::{ComputeError, ComputeProvider};
use costguard_core::outcome::OperationStatus;
use costguard_core::target::{ResourceTarget, TargetConfig};
use costguard_function::app::build_router;
use costguard_function::state::AppState;

/// How the fake control plane answers stop requests.
#[derive(Clone, Copy)]
pub enum Reply {
    Accepted(&'static str),
    AlreadyStopped,
    PermissionDenied,
}

/// Control plane double that records each stop request.
pub struct FakeCompute {
    calls: AtomicUsize,
    request_ids: Mutex<Vec<Option<String>>>,
    reply: Reply,
}

impl FakeCompute {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            request_ids: Mutex::new(Vec::new()),
            reply,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn request_ids(&self) -> Vec<Option<String>> {
        self.request_ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl ComputeProvider for FakeCompute {
    async fn stop_instance(
        &self,
        _target: &ResourceTarget,
        request_id: Option<&str>,
    ) -> Result<OperationStatus, ComputeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.request_ids
            .lock()
            .unwrap()
            .push(request_id.map(str::to_string));

        match self.reply {
            Reply::Accepted(status) => Ok(OperationStatus {
                operation: Some("operation-1700000000000-abc".into()),
                status: status.into(),
            }),
            Reply::AlreadyStopped => Err(ComputeError::Api {
                status: 400,
                reason: Some("resourceNotReady".into()),
                message: "The resource 'projects/acme-dev/zones/us-central1-a/instances/build-box' is not ready".into(),
            }),
            Reply::PermissionDenied => Err(ComputeError::Api {
                status: 403,
                reason: Some("forbidden".into()),
                message: "Required 'compute.instances.stop' permission".into(),
            }),
        }
    }
}

pub fn full_target() -> TargetConfig {
    TargetConfig {
        project_id: Some("acme-dev".into()),
        zone: Some("us-central1-a".into()),
        instance_name: Some("build-box".into()),
    }
}

/// Build the application router around the given fake and target.
///
/// This mirrors the construction in `main.rs` so tests exercise the same
/// middleware stack that production uses.
pub fn build_test_app(compute: &Arc<FakeCompute>, target: TargetConfig) -> Router {
    let state = AppState {
        executor: Arc::new(ShutdownExecutor::from_shared(
            Arc::clone(compute) as Arc<dyn ComputeProvider>
        )),
        target: Arc::new(target),
    };
    build_router(state)
}

/// Wrap a budget notification JSON string in a Pub/Sub push envelope.
pub fn push_body(notification: &str, message_id: &str) -> serde_json::Value {
    serde_json::json!({
        "message": {
            "data": base64::engine::general_purpose::STANDARD.encode(notification),
            "attributes": {
                "billingAccountId": "01D4EE-079462-DFD6EC",
                "budgetId": "de72f49d-779b-4945-a127-4d6ce8def0bb",
                "schemaVersion": "1.0"
            },
            "messageId": message_id,
            "publishTime": "2026-10-15T09:30:00.000Z"
        },
        "subscription": "projects/acme-dev/subscriptions/budget-alerts"
    })
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, serde_json::to_vec(&body).unwrap()).await
}

pub async fn post_raw(app: Router, uri: &str, body: Vec<u8>) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
