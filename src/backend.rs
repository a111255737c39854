// Access to the advert backend (the /api/sent-adverts endpoint)

use async_trait::async_trait;
use reqwest::{
    header::{ACCEPT, AUTHORIZATION},
    Client, StatusCode,
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::session::Credential;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    // 401 from the backend; callers turn this into a session transition
    #[error("Unauthorized")]
    Unauthorized,
    #[error("HTTP {0}")]
    Status(u16),
    #[error("{0}")]
    Network(String),
    #[error("Invalid JSON response: {0}")]
    Decode(String),
}

/// Where advert records come from. The HTTP implementation is used by the server;
/// tests script their own.
#[async_trait]
pub trait AdvertSource: Send + Sync {
    async fn get_json(&self, path: &str, credential: Option<&Credential>) -> Result<Value, TransportError>;
}

pub struct HttpAdvertSource {
    http_client: Arc<Client>,
    base_url: String,
}

impl HttpAdvertSource {
    pub fn new(http_client: Arc<Client>, base_url: impl Into<String>) -> Self {
        HttpAdvertSource { http_client, base_url: base_url.into() }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[async_trait]
impl AdvertSource for HttpAdvertSource {
    async fn get_json(&self, path: &str, credential: Option<&Credential>) -> Result<Value, TransportError> {
        let url = self.url_for(path);
        tracing::debug!(url = %url, authenticated = credential.is_some(), "Requesting backend");

        let mut request = self
            .http_client
            .get(&url)
            .header(ACCEPT, "application/json");
        if let Some(credential) = credential {
            request = request.header(AUTHORIZATION, credential.header_value());
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Network error during backend request");
            TransportError::Network(e.to_string())
        })?;

        let status = response.status();
        tracing::debug!(url = %url, status = %status, "Received backend response");
        if status == StatusCode::UNAUTHORIZED {
            return Err(TransportError::Unauthorized);
        }
        if !status.is_success() {
            tracing::warn!(url = %url, status = %status, "Backend returned an error status");
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        serde_json::from_slice::<Value>(&body).map_err(|e| {
            // Full body only at debug level, it can be large
            tracing::debug!(url = %url, error = %e, response_body = %String::from_utf8_lossy(&body), "JSON parse error details");
            TransportError::Decode(e.to_string())
        })
    }
}
