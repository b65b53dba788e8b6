//! Compute Engine REST client.
//!
//! Wraps `instances.stop` of the Compute Engine v1 API using [`reqwest`].
//! The returned operation is reported as-is; it is not polled.

use async_trait::async_trait;
use costguard_core::outcome::OperationStatus;
use costguard_core::target::ResourceTarget;
use serde::Deserialize;

use crate::provider::{ComputeError, ComputeProvider};
use crate::token::TokenSource;

/// Public Compute Engine endpoint.
pub const DEFAULT_COMPUTE_API_BASE_URL: &str = "https://compute.googleapis.com";

/// Reported when the control plane omits an operation status.
const UNKNOWN_STATUS: &str = "UNKNOWN";

/// HTTP client for the Compute Engine API.
pub struct GceComputeClient {
    client: reqwest::Client,
    base_url: String,
    tokens: TokenSource,
}

/// The subset of a Compute Engine `Operation` resource we report.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Operation {
    name: Option<String>,
    status: Option<String>,
}

/// Google API error envelope: `{"error": {"code", "message", "errors"}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    reason: Option<String>,
}

impl GceComputeClient {
    /// Create a client with its own connection pool.
    ///
    /// * `base_url` - API root, e.g. `https://compute.googleapis.com`.
    pub fn new(base_url: impl Into<String>, tokens: TokenSource) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, tokens)
    }

    /// Create a client reusing an existing [`reqwest::Client`] (e.g. one
    /// configured with a request timeout).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        tokens: TokenSource,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn stop_url(&self, target: &ResourceTarget) -> String {
        format!(
            "{}/compute/v1/projects/{}/zones/{}/instances/{}/stop",
            self.base_url,
            target.project_id(),
            target.zone(),
            target.instance_name(),
        )
    }

    // ---- private helpers ----

    /// Turn a non-2xx response into [`ComputeError::Api`], extracting the
    /// message and first reason from the Google error envelope when the
    /// body has one.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ComputeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        let (reason, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => {
                let reason = envelope.error.errors.into_iter().find_map(|e| e.reason);
                (reason, envelope.error.message)
            }
            Err(_) => (None, body),
        };

        Err(ComputeError::Api {
            status: status.as_u16(),
            reason,
            message,
        })
    }
}

#[async_trait]
impl ComputeProvider for GceComputeClient {
    async fn stop_instance(
        &self,
        target: &ResourceTarget,
        request_id: Option<&str>,
    ) -> Result<OperationStatus, ComputeError> {
        let token = self.tokens.access_token(&self.client).await?;

        let mut request = self
            .client
            .post(self.stop_url(target))
            .bearer_auth(token)
            .body(Vec::new());
        if let Some(request_id) = request_id {
            request = request.query(&[("requestId", request_id)]);
        }

        let response = Self::ensure_success(request.send().await?).await?;
        let operation: Operation = response.json().await?;

        Ok(OperationStatus {
            operation: operation.name,
            status: operation.status.unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use assert_matches::assert_matches;
    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use costguard_core::outcome::FailureKind;

    use super::*;

    /// What the fake control plane saw.
    #[derive(Debug, Clone)]
    struct SeenRequest {
        path: (String, String, String),
        authorization: Option<String>,
        request_id: Option<String>,
    }

    #[derive(Clone)]
    struct FakeState {
        seen: Arc<Mutex<Vec<SeenRequest>>>,
        reply: (StatusCode, serde_json::Value),
    }

    async fn stop(
        State(state): State<FakeState>,
        Path(path): Path<(String, String, String)>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> impl IntoResponse {
        state.seen.lock().unwrap().push(SeenRequest {
            path,
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            request_id: query.get("requestId").cloned(),
        });
        (state.reply.0, Json(state.reply.1.clone()))
    }

    async fn token(headers: HeaderMap) -> impl IntoResponse {
        if headers.get("metadata-flavor").and_then(|v| v.to_str().ok()) != Some("Google") {
            return (StatusCode::FORBIDDEN, Json(serde_json::json!({}))).into_response();
        }
        Json(serde_json::json!({
            "access_token": "ya29.metadata",
            "expires_in": 3599,
            "token_type": "Bearer"
        }))
        .into_response()
    }

    /// Spawn a fake control plane on an ephemeral port and return its base
    /// URL plus the request log.
    async fn spawn_fake(
        status: StatusCode,
        body: serde_json::Value,
    ) -> (String, Arc<Mutex<Vec<SeenRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            seen: Arc::clone(&seen),
            reply: (status, body),
        };
        let app = Router::new()
            .route(
                "/compute/v1/projects/{project}/zones/{zone}/instances/{instance}/stop",
                post(stop),
            )
            .route("/token", get(token))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    fn target() -> ResourceTarget {
        ResourceTarget::new("acme-dev", "us-central1-a", "build-box").unwrap()
    }

    #[tokio::test]
    async fn stop_reports_operation_status() {
        let (base, seen) = spawn_fake(
            StatusCode::OK,
            serde_json::json!({
                "kind": "compute#operation",
                "name": "operation-1700000000000-abc",
                "operationType": "stop",
                "status": "RUNNING"
            }),
        )
        .await;
        let client = GceComputeClient::new(&base, TokenSource::Static("ya29.static".into()));

        let status = client.stop_instance(&target(), Some("req-1")).await.unwrap();
        assert_eq!(status.status, "RUNNING");
        assert_eq!(status.operation.as_deref(), Some("operation-1700000000000-abc"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].path,
            ("acme-dev".into(), "us-central1-a".into(), "build-box".into())
        );
        assert_eq!(seen[0].authorization.as_deref(), Some("Bearer ya29.static"));
        assert_eq!(seen[0].request_id.as_deref(), Some("req-1"));
    }

    #[tokio::test]
    async fn missing_status_is_unknown() {
        let (base, _) = spawn_fake(StatusCode::OK, serde_json::json!({})).await;
        let client = GceComputeClient::new(&base, TokenSource::Static("t".into()));

        let status = client.stop_instance(&target(), None).await.unwrap();
        assert_eq!(status.status, "UNKNOWN");
        assert_eq!(status.operation, None);
    }

    #[tokio::test]
    async fn token_is_fetched_from_metadata_server() {
        let (base, seen) =
            spawn_fake(StatusCode::OK, serde_json::json!({"status": "PENDING"})).await;
        let tokens = TokenSource::MetadataServer {
            url: format!("{base}/token"),
        };
        let client = GceComputeClient::new(format!("{base}/"), tokens);

        client.stop_instance(&target(), None).await.unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].authorization.as_deref(), Some("Bearer ya29.metadata"));
        assert_eq!(seen[0].request_id, None);
    }

    #[tokio::test]
    async fn google_error_envelope_is_parsed() {
        let (base, _) = spawn_fake(
            StatusCode::NOT_FOUND,
            serde_json::json!({
                "error": {
                    "code": 404,
                    "message": "The resource 'projects/acme-dev/zones/us-central1-a/instances/build-box' was not found",
                    "errors": [{"reason": "notFound", "domain": "global"}]
                }
            }),
        )
        .await;
        let client = GceComputeClient::new(&base, TokenSource::Static("t".into()));

        let err = client.stop_instance(&target(), None).await.unwrap_err();
        assert_matches!(&err, ComputeError::Api { status: 404, reason: Some(r), .. } if r == "notFound");
        assert_eq!(err.kind(), FailureKind::NotFound);
    }

    #[tokio::test]
    async fn not_ready_error_is_benign() {
        let (base, _) = spawn_fake(
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": {
                    "code": 400,
                    "message": "The resource 'projects/acme-dev/zones/us-central1-a/instances/build-box' is not ready",
                    "errors": [{"reason": "resourceNotReady"}]
                }
            }),
        )
        .await;
        let client = GceComputeClient::new(&base, TokenSource::Static("t".into()));

        let err = client.stop_instance(&target(), None).await.unwrap_err();
        assert!(err.kind().is_benign());
    }

    #[tokio::test]
    async fn unreachable_control_plane_is_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = GceComputeClient::new(format!("http://{addr}"), TokenSource::Static("t".into()));
        let err = client.stop_instance(&target(), None).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
    }

    #[tokio::test]
    async fn metadata_token_failure_is_token_error() {
        let (base, seen) = spawn_fake(StatusCode::OK, serde_json::json!({})).await;
        let tokens = TokenSource::MetadataServer {
            url: format!("{base}/no-such-token-endpoint"),
        };
        let client = GceComputeClient::new(&base, tokens);

        let err = client.stop_instance(&target(), None).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Token);
        assert!(seen.lock().unwrap().is_empty(), "no stop request without a token");
    }
}
