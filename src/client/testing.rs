//! In-memory transport for tests

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::transport::{Request, Transport, TransportError};
use crate::version::ServerVersion;

/// Transport answering from a queue of canned responses and recording every
/// request it sees
pub struct FakeTransport {
    version: ServerVersion,
    responses: Mutex<VecDeque<Result<Vec<u8>, TransportError>>>,
    requests: Mutex<Vec<Request>>,
    version_calls: Mutex<usize>,
}

impl FakeTransport {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.parse().unwrap(),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            version_calls: Mutex::new(0),
        }
    }

    pub fn respond_raw(self, body: Vec<u8>) -> Self {
        self.responses.lock().push_back(Ok(body));
        self
    }

    pub fn respond_json(self, body: Value) -> Self {
        self.respond_raw(serde_json::to_vec(&body).unwrap())
    }

    pub fn respond_status(self, status: u16, body: &str) -> Self {
        self.responses.lock().push_back(Err(TransportError::Status {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
        }));
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    pub fn version_calls(&self) -> usize {
        *self.version_calls.lock()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn perform_request(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no response queued".to_string())))
    }

    async fn server_version(&self, cancel: &CancellationToken) -> Result<ServerVersion, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        *self.version_calls.lock() += 1;
        Ok(self.version.clone())
    }
}

/// Alert body as Kibana returns it
pub fn alert_json(id: &str) -> Value {
    serde_json::json!({
        "id": id,
        "name": "cpu-high",
        "tags": ["prod"],
        "alertTypeId": ".index-threshold",
        "consumer": "alerts",
        "schedule": {"interval": "1m"},
        "enabled": true,
        "throttle": null,
        "params": {
            "thresholdComparator": ">",
            "timeWindowSize": 5,
            "timeWindowUnit": "m",
            "timeField": "@timestamp",
            "index": ["metrics-*"],
            "threshold": [80]
        },
        "actions": [{
            "group": "threshold met",
            "id": "action-1",
            "actionTypeId": ".slack",
            "params": {"message": "hi"}
        }],
        "createdBy": "elastic",
        "muteAll": false
    })
}
