//! Create / read / update / delete for one declarative Kibana alert
//!
//! Every operation first discovers the server version and checks it against
//! the gate; nothing else is sent to a server that fails the check.

use tokio_util::sync::CancellationToken;

use super::state::{requires_replacement, ResourceState, ResourceStatus};
use crate::alert::{expand_alert, flatten_alert, MappingError};
use crate::client::{
    AlertRestClient, ApiError, HttpTransport, KibanaConfig, Transport, TransportError,
};
use crate::version::{ServerVersion, VersionError, VersionGate};

/// Result of a read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Alert exists; the state holds its current configuration
    Present,
    /// Alert no longer exists; the identity has been cleared
    Gone,
}

pub struct AlertResourceHandler<T> {
    client: AlertRestClient<T>,
    gate: VersionGate,
}

impl AlertResourceHandler<HttpTransport> {
    /// Handler talking HTTP to the Kibana described by `config`
    pub fn from_config(config: &KibanaConfig) -> Result<Self, AlertError> {
        let transport = HttpTransport::new(config)?;
        let client = AlertRestClient::new(transport).with_space(config.space_id.clone());
        Ok(Self::new(client, config.version_gate()))
    }
}

impl<T: Transport> AlertResourceHandler<T> {
    pub fn new(client: AlertRestClient<T>, gate: VersionGate) -> Self {
        Self { client, gate }
    }

    pub fn client(&self) -> &AlertRestClient<T> {
        &self.client
    }

    pub fn gate(&self) -> &VersionGate {
        &self.gate
    }

    async fn check_version(&self, cancel: &CancellationToken) -> Result<ServerVersion, AlertError> {
        let version = self.client.transport().server_version(cancel).await?;
        self.gate.check(&version)?;
        Ok(version)
    }

    /// Create the alert described by the state's configuration and record
    /// the id Kibana assigns. On failure the identity stays unset.
    pub async fn create(
        &self,
        state: &mut ResourceState,
        cancel: &CancellationToken,
    ) -> Result<(), AlertError> {
        let version = self.check_version(cancel).await?;
        let config = state.config().ok_or(AlertError::MissingConfig)?;
        let alert = expand_alert(config, self.gate.supports_notify_when(&version))?;

        state.set_status(ResourceStatus::PendingCreate);
        match self.client.create(&alert, cancel).await {
            Ok(id) => {
                tracing::info!(alert_id = %id, alert_name = %alert.name, "Kibana alert created");
                state.set_id(Some(id));
                Ok(())
            }
            Err(e) => {
                state.set_id(None);
                Err(e.into())
            }
        }
    }

    /// Refresh the state's configuration from Kibana.
    ///
    /// A missing alert is not an error: the identity is cleared and
    /// [`ReadOutcome::Gone`] returned so the caller can recreate it.
    pub async fn read(
        &self,
        state: &mut ResourceState,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome, AlertError> {
        self.check_version(cancel).await?;
        let id = state.id().ok_or(AlertError::MissingId)?.to_string();

        match self.client.get(&id, cancel).await {
            Ok(alert) => {
                state.set_config(flatten_alert(&alert)?);
                state.set_status(ResourceStatus::Present);
                Ok(ReadOutcome::Present)
            }
            Err(ApiError::NotFound(_)) => {
                tracing::warn!(alert_id = %id, "Kibana alert not found, removing from state");
                state.set_id(None);
                Ok(ReadOutcome::Gone)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Push the state's configuration to the existing alert.
    ///
    /// The alert name cannot change in place: if the remote alert carries a
    /// different name, [`AlertError::RequiresReplacement`] is returned and
    /// nothing is written.
    pub async fn update(
        &self,
        state: &mut ResourceState,
        cancel: &CancellationToken,
    ) -> Result<(), AlertError> {
        let version = self.check_version(cancel).await?;
        let id = state.id().ok_or(AlertError::MissingId)?;
        let config = state.config().ok_or(AlertError::MissingConfig)?;
        let alert = expand_alert(config, self.gate.supports_notify_when(&version))?;

        let current = flatten_alert(&self.client.get(id, cancel).await?)?;
        if requires_replacement(&current, config) {
            return Err(AlertError::RequiresReplacement {
                id: id.to_string(),
                current: current.name,
                desired: config.name.clone(),
            });
        }

        let updated = self.client.update(id, &alert, cancel).await?;
        if updated.enabled != alert.enabled {
            self.client.set_enabled(id, alert.enabled, cancel).await?;
        }

        tracing::info!(alert_id = %id, alert_name = %alert.name, "Kibana alert updated");
        Ok(())
    }

    /// Delete the alert. The identity is cleared only once Kibana confirms.
    pub async fn delete(
        &self,
        state: &mut ResourceState,
        cancel: &CancellationToken,
    ) -> Result<(), AlertError> {
        self.check_version(cancel).await?;
        let id = state.id().ok_or(AlertError::MissingId)?.to_string();

        state.set_status(ResourceStatus::PendingDelete);
        if let Err(e) = self.client.delete(&id, cancel).await {
            state.set_status(ResourceStatus::Present);
            return Err(e.into());
        }

        tracing::info!(alert_id = %id, "Kibana alert deleted");
        state.set_id(None);
        Ok(())
    }

    /// Adopt an existing alert by id
    pub async fn import(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<ResourceState, AlertError> {
        let mut state = ResourceState::existing(id, None);
        match self.read(&mut state, cancel).await? {
            ReadOutcome::Present => Ok(state),
            ReadOutcome::Gone => Err(AlertError::ImportNotFound(id.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Resource has no Kibana alert id")]
    MissingId,

    #[error("Resource has no alert configuration")]
    MissingConfig,

    #[error("Cannot import Kibana alert {0}: not found")]
    ImportNotFound(String),

    #[error("Kibana alert {id} cannot be renamed from {current:?} to {desired:?} in place; it must be replaced")]
    RequiresReplacement {
        id: String,
        current: String,
        desired: String,
    },
}

impl AlertError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AlertError::Api(ApiError::NotFound(_)) | AlertError::ImportNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertConfig, NotifyWhen};
    use crate::client::testing::{alert_json, FakeTransport};
    use reqwest::Method;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn handler(transport: &Arc<FakeTransport>) -> AlertResourceHandler<Arc<FakeTransport>> {
        AlertResourceHandler::new(
            AlertRestClient::new(Arc::clone(transport)),
            VersionGate::default(),
        )
    }

    fn cpu_high() -> AlertConfig {
        AlertConfig::from_json(json!({
            "name": "cpu-high",
            "schedule": {"interval": "1m"},
            "alert_type_id": ".index-threshold",
            "notify_when": "onActiveAlert",
            "conditions": {
                "threshold_comparator": ">",
                "time_window_size": 5,
                "time_window_unit": "m",
                "time_field": "@timestamp",
                "index": ["metrics-*"],
                "threshold": [80]
            }
        }))
        .unwrap()
    }

    fn sent_body(transport: &FakeTransport, n: usize) -> Value {
        serde_json::from_slice(transport.requests()[n].body.as_ref().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_create_on_7_8() {
        let transport = Arc::new(FakeTransport::new("7.8.0").respond_json(alert_json("a-1")));
        let mut state = ResourceState::new(cpu_high());

        handler(&transport)
            .create(&mut state, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(state.id(), Some("a-1"));
        assert_eq!(state.status(), ResourceStatus::Present);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].path, "/api/alerts/alert");

        let body = sent_body(&transport, 0);
        assert!(body.get("notifyWhen").is_none());
        assert_eq!(body["params"]["thresholdComparator"], ">");
        assert_eq!(body["params"]["index"], json!(["metrics-*"]));
        assert_eq!(body["params"]["threshold"], json!([80]));
    }

    #[tokio::test]
    async fn test_create_sends_notify_when_on_7_11() {
        let transport = Arc::new(FakeTransport::new("7.11.0").respond_json(alert_json("a-1")));
        let mut state = ResourceState::new(cpu_high());

        handler(&transport)
            .create(&mut state, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(sent_body(&transport, 0)["notifyWhen"], "onActiveAlert");
        assert_eq!(transport.version_calls(), 1);
    }

    #[tokio::test]
    async fn test_create_failure_leaves_identity_unset() {
        let transport = Arc::new(FakeTransport::new("7.10.0").respond_status(400, "bad params"));
        let mut state = ResourceState::new(cpu_high());

        let err = handler(&transport)
            .create(&mut state, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AlertError::Api(ApiError::Transport(_))));
        assert_eq!(state.id(), None);
        assert_eq!(state.status(), ResourceStatus::Absent);
    }

    #[tokio::test]
    async fn test_read_gone_clears_identity() {
        let transport = Arc::new(FakeTransport::new("7.10.0").respond_status(404, "{}"));
        let mut state = ResourceState::existing("missing", Some(cpu_high()));

        let outcome = handler(&transport)
            .read(&mut state, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, ReadOutcome::Gone);
        assert_eq!(state.id(), None);
        assert_eq!(state.status(), ResourceStatus::Absent);
    }

    #[tokio::test]
    async fn test_read_populates_config() {
        let transport = Arc::new(FakeTransport::new("7.10.0").respond_json(alert_json("a-1")));
        let mut state = ResourceState::existing("a-1", None);

        let outcome = handler(&transport)
            .read(&mut state, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, ReadOutcome::Present);

        let config = state.config().unwrap();
        assert_eq!(config.name, "cpu-high");
        assert_eq!(config.schedule.as_ref().unwrap().interval, "1m");
        assert_eq!(config.conditions.threshold_comparator, ">");
        assert_eq!(config.conditions.threshold, vec![80.0]);
        assert!(config.tags.contains("prod"));
        assert_eq!(config.actions.len(), 1);
        assert_eq!(config.actions[0].action_type_id, ".slack");
    }

    #[tokio::test]
    async fn test_old_server_blocks_every_operation() {
        let transport = Arc::new(FakeTransport::new("7.5.0"));
        let handler = handler(&transport);
        let cancel = CancellationToken::new();
        let mut state = ResourceState::existing("a-1", Some(cpu_high()));

        let errors = vec![
            handler.create(&mut state, &cancel).await.unwrap_err(),
            handler.read(&mut state, &cancel).await.unwrap_err(),
            handler.update(&mut state, &cancel).await.unwrap_err(),
            handler.delete(&mut state, &cancel).await.unwrap_err(),
        ];

        for err in errors {
            assert!(matches!(err, AlertError::Version(VersionError::Unsupported { .. })));
            let msg = err.to_string();
            assert!(msg.contains("7.7.0"), "{}", msg);
            assert!(msg.contains("7.5.0"), "{}", msg);
        }
        assert!(transport.requests().is_empty());
        assert_eq!(transport.version_calls(), 4);
        assert_eq!(state.id(), Some("a-1"));
    }

    #[tokio::test]
    async fn test_update_issues_put() {
        let transport = Arc::new(
            FakeTransport::new("7.10.0")
                .respond_json(alert_json("a-1"))
                .respond_json(alert_json("a-1")),
        );
        let mut state = ResourceState::existing("a-1", Some(cpu_high()));

        handler(&transport)
            .update(&mut state, &CancellationToken::new())
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[1].method, Method::PUT);
        assert_eq!(requests[1].path, "/api/alerts/alert/a-1");

        let body = sent_body(&transport, 1);
        assert!(body.get("alertTypeId").is_none());
        assert!(body.get("enabled").is_none());
        assert!(body.get("notifyWhen").is_none());
        assert_eq!(body["schedule"]["interval"], "1m");
    }

    #[tokio::test]
    async fn test_update_toggles_enabled() {
        let transport = Arc::new(
            FakeTransport::new("7.10.0")
                .respond_json(alert_json("a-1"))
                .respond_json(alert_json("a-1"))
                .respond_raw(Vec::new()),
        );
        let mut config = cpu_high();
        config.enabled = false;
        let mut state = ResourceState::existing("a-1", Some(config));

        handler(&transport)
            .update(&mut state, &CancellationToken::new())
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].method, Method::POST);
        assert_eq!(requests[2].path, "/api/alerts/alert/a-1/_disable");
    }

    #[tokio::test]
    async fn test_update_refuses_rename() {
        let transport = Arc::new(FakeTransport::new("7.10.0").respond_json(alert_json("a-1")));
        let mut config = cpu_high();
        config.name = "cpu-very-high".to_string();
        let mut state = ResourceState::existing("a-1", Some(config));

        let err = handler(&transport)
            .update(&mut state, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AlertError::RequiresReplacement { ref current, ref desired, .. }
                if current == "cpu-high" && desired == "cpu-very-high"
        ));
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(state.id(), Some("a-1"));
    }

    #[tokio::test]
    async fn test_update_of_missing_alert() {
        let transport = Arc::new(FakeTransport::new("7.10.0").respond_status(404, "{}"));
        let mut state = ResourceState::existing("gone", Some(cpu_high()));

        let err = handler(&transport)
            .update(&mut state, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_clears_identity() {
        let transport = Arc::new(FakeTransport::new("7.10.0").respond_raw(Vec::new()));
        let mut state = ResourceState::existing("a-1", None);

        handler(&transport)
            .delete(&mut state, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(transport.requests()[0].method, Method::DELETE);
        assert_eq!(state.id(), None);
        assert_eq!(state.status(), ResourceStatus::Absent);
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_identity() {
        let transport = Arc::new(FakeTransport::new("7.10.0").respond_status(503, "unavailable"));
        let mut state = ResourceState::existing("a-1", None);

        assert!(handler(&transport)
            .delete(&mut state, &CancellationToken::new())
            .await
            .is_err());
        assert_eq!(state.id(), Some("a-1"));
        assert_eq!(state.status(), ResourceStatus::Present);
    }

    #[tokio::test]
    async fn test_import() {
        let transport = Arc::new(
            FakeTransport::new("7.10.0")
                .respond_json(alert_json("a-1"))
                .respond_status(404, "{}"),
        );
        let handler = handler(&transport);
        let cancel = CancellationToken::new();

        let state = handler.import("a-1", &cancel).await.unwrap();
        assert_eq!(state.config().unwrap().name, "cpu-high");

        let err = handler.import("nope", &cancel).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_cancellation_reaches_transport() {
        let transport = Arc::new(FakeTransport::new("7.10.0"));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut state = ResourceState::new(cpu_high());

        let err = handler(&transport).create(&mut state, &cancel).await.unwrap_err();
        assert!(matches!(err, AlertError::Transport(TransportError::Cancelled)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_schedule_is_rejected_before_sending() {
        let transport = Arc::new(FakeTransport::new("7.10.0"));
        let mut config = cpu_high();
        config.schedule = None;
        config.notify_when = Some(NotifyWhen::OnThrottleInterval);
        let mut state = ResourceState::new(config);

        let err = handler(&transport)
            .create(&mut state, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AlertError::Mapping(MappingError::MissingSchedule)));
        assert!(transport.requests().is_empty());
    }
}
