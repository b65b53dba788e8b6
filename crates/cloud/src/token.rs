//! OAuth access tokens for the control plane.
//!
//! Inside Google Cloud the instance metadata server hands out tokens for
//! the attached service account. Outside it, a token can be supplied
//! directly (e.g. `gcloud auth print-access-token`).

use serde::Deserialize;

/// Default token endpoint of the metadata server.
pub const DEFAULT_METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Header the metadata server requires on every request.
const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";

#[derive(Debug, Clone)]
pub enum TokenSource {
    /// A fixed bearer token.
    Static(String),
    /// Fetch a fresh token from the metadata server on each request.
    MetadataServer { url: String },
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Token endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Token endpoint returned an empty token")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

impl TokenSource {
    /// Use `token` when provided, otherwise the metadata server at `url`.
    pub fn from_parts(token: Option<String>, url: String) -> Self {
        match token {
            Some(token) => TokenSource::Static(token),
            None => TokenSource::MetadataServer { url },
        }
    }

    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String, TokenError> {
        let url = match self {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::MetadataServer { url } => url,
        };

        let response = client
            .get(url)
            .header(METADATA_FLAVOR_HEADER, "Google")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TokenError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let token: MetadataToken = response.json().await?;
        if token.access_token.is_empty() {
            return Err(TokenError::Empty);
        }

        tracing::debug!("Fetched access token from metadata server");
        Ok(token.access_token)
    }
}
