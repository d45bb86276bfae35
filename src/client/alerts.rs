//! Kibana alerting REST endpoints
//!
//! | Method | Path                           |
//! |--------|--------------------------------|
//! | GET    | `/api/alerts/alert/{id}`       |
//! | POST   | `/api/alerts/alert`            |
//! | PUT    | `/api/alerts/alert/{id}`       |
//! | DELETE | `/api/alerts/alert/{id}`       |
//! | POST   | `/api/alerts/alert/{id}/_enable`, `/_disable` |
//!
//! Paths are prefixed with `/s/{space}` when a space is configured.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Method;
use tokio_util::sync::CancellationToken;

use super::transport::{Request, Transport, TransportError};
use crate::alert::{Alert, AlertUpdate};

/// Characters escaped when interpolating an id into a path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Client for the alerting API of one Kibana space
#[derive(Debug, Clone)]
pub struct AlertRestClient<T> {
    transport: T,
    space_id: Option<String>,
}

impl<T: Transport> AlertRestClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            space_id: None,
        }
    }

    pub fn with_space(mut self, space_id: Option<String>) -> Self {
        self.space_id = space_id.filter(|s| !s.is_empty());
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Ids that would resolve as dot-segments, or name the collection
    /// itself, are refused.
    fn alert_path(&self, id: Option<&str>, suffix: &str) -> Result<String, ApiError> {
        if let Some(id @ ("" | "." | "..")) = id {
            return Err(ApiError::InvalidId(id.to_string()));
        }

        let mut path = String::new();
        if let Some(space) = &self.space_id {
            path.push_str("/s/");
            path.extend(utf8_percent_encode(space, PATH_SEGMENT));
        }
        path.push_str("/api/alerts/alert");
        if let Some(id) = id {
            path.push('/');
            path.extend(utf8_percent_encode(id, PATH_SEGMENT));
        }
        path.push_str(suffix);
        Ok(path)
    }

    /// Fetch an alert. A 404 is reported as [`ApiError::NotFound`].
    pub async fn get(&self, id: &str, cancel: &CancellationToken) -> Result<Alert, ApiError> {
        let request = Request::new(Method::GET, self.alert_path(Some(id), "")?);
        let body = self
            .transport
            .perform_request(request, cancel)
            .await
            .map_err(|e| not_found_or(e, id))?;
        decode(&body)
    }

    /// Create an alert, returning the id Kibana assigned
    pub async fn create(&self, alert: &Alert, cancel: &CancellationToken) -> Result<String, ApiError> {
        let body = serde_json::to_vec(alert).map_err(ApiError::Encode)?;
        let request = Request::new(Method::POST, self.alert_path(None, "")?).with_body(body);

        let response = self.transport.perform_request(request, cancel).await?;
        let created = decode(&response)?;
        if created.id.is_empty() {
            return Err(ApiError::MissingId);
        }
        Ok(created.id)
    }

    /// Replace the mutable fields of an existing alert
    pub async fn update(
        &self,
        id: &str,
        alert: &Alert,
        cancel: &CancellationToken,
    ) -> Result<Alert, ApiError> {
        let body = serde_json::to_vec(&AlertUpdate::from(alert)).map_err(ApiError::Encode)?;
        let request = Request::new(Method::PUT, self.alert_path(Some(id), "")?).with_body(body);

        let response = self
            .transport
            .perform_request(request, cancel)
            .await
            .map_err(|e| not_found_or(e, id))?;
        decode(&response)
    }

    pub async fn delete(&self, id: &str, cancel: &CancellationToken) -> Result<(), ApiError> {
        let request = Request::new(Method::DELETE, self.alert_path(Some(id), "")?);
        self.transport.perform_request(request, cancel).await?;
        Ok(())
    }

    /// Enable or disable an alert; the update endpoint cannot change this
    pub async fn set_enabled(
        &self,
        id: &str,
        enabled: bool,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let suffix = if enabled { "/_enable" } else { "/_disable" };
        let request = Request::new(Method::POST, self.alert_path(Some(id), suffix)?);
        self.transport
            .perform_request(request, cancel)
            .await
            .map_err(|e| not_found_or(e, id))?;
        Ok(())
    }
}

fn not_found_or(err: TransportError, id: &str) -> ApiError {
    if err.is_not_found() {
        ApiError::NotFound(id.to_string())
    } else {
        ApiError::Transport(err)
    }
}

fn decode(body: &[u8]) -> Result<Alert, ApiError> {
    serde_json::from_slice(body).map_err(|source| ApiError::Decode {
        source,
        body: String::from_utf8_lossy(body).into_owned(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Kibana alert {0} not found")]
    NotFound(String),

    #[error("Error encoding alert body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Error unmarshalling alert body: {source}: {body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("Invalid Kibana alert id {0:?}")]
    InvalidId(String),

    #[error("Kibana response did not include an alert id")]
    MissingId,

    #[error(transparent)]
    Transport(#[from] TransportError),
}
