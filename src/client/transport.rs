use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::config::KibanaConfig;
use crate::version::ServerVersion;

/// A single REST call against Kibana
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Absolute path, already percent-encoded
    pub path: String,
    /// JSON body
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// What the alert client needs from a connection to Kibana
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a request and return the raw response body.
    /// Non-2xx responses are reported as [`TransportError::Status`].
    async fn perform_request(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, TransportError>;

    /// Discover the server's version. Never cached.
    async fn server_version(&self, cancel: &CancellationToken) -> Result<ServerVersion, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn perform_request(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, TransportError> {
        (**self).perform_request(request, cancel).await
    }

    async fn server_version(&self, cancel: &CancellationToken) -> Result<ServerVersion, TransportError> {
        (**self).server_version(cancel).await
    }
}

/// HTTP transport to a Kibana instance
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    version: StatusVersion,
}

#[derive(Debug, Deserialize)]
struct StatusVersion {
    number: String,
}

impl HttpTransport {
    pub fn new(config: &KibanaConfig) -> Result<Self, TransportError> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", config.url, e)))?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, TransportError> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    async fn execute(&self, request: Request) -> Result<Vec<u8>, TransportError> {
        let Request { method, path, body } = request;
        let url = self.url(&path)?;

        // Kibana rejects mutating requests without this header
        let mut builder = self
            .http_client
            .request(method.clone(), url)
            .header("kbn-xsrf", "true");

        if let Some(username) = &self.username {
            builder = builder.basic_auth(username, self.password.as_ref());
        }
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        tracing::debug!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            "Kibana request"
        );

        if !status.is_success() {
            return Err(TransportError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn perform_request(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, TransportError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            result = self.execute(request) => result,
        }
    }

    async fn server_version(&self, cancel: &CancellationToken) -> Result<ServerVersion, TransportError> {
        let body = self
            .perform_request(Request::new(Method::GET, "/api/status"), cancel)
            .await?;

        let status: StatusResponse = serde_json::from_slice(&body).map_err(|e| {
            TransportError::Version(format!("{}: {}", e, String::from_utf8_lossy(&body)))
        })?;

        status
            .version
            .number
            .parse()
            .map_err(|e: crate::version::VersionError| TransportError::Version(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid Kibana URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Kibana returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Unexpected version response: {0}")]
    Version(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl TransportError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}
