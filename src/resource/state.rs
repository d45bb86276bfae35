use serde::Serialize;

use crate::alert::AlertConfig;

/// Lifecycle position of one declarative alert resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceStatus {
    #[default]
    Absent,
    PendingCreate,
    Present,
    PendingDelete,
}

/// Identity and configuration of one resource instance, owned by the caller
/// driving the lifecycle
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceState {
    id: Option<String>,
    status: ResourceStatus,
    config: Option<AlertConfig>,
}

impl ResourceState {
    /// A resource not yet created
    pub fn new(config: AlertConfig) -> Self {
        Self {
            id: None,
            status: ResourceStatus::Absent,
            config: Some(config),
        }
    }

    /// A resource already known by id, e.g. loaded from saved state. An
    /// empty id leaves the resource absent.
    pub fn existing(id: impl Into<String>, config: Option<AlertConfig>) -> Self {
        let mut state = Self {
            id: None,
            status: ResourceStatus::Absent,
            config,
        };
        state.set_id(Some(id.into()));
        state
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Set or clear the identity; the status follows
    pub fn set_id(&mut self, id: Option<String>) {
        self.id = id.filter(|id| !id.is_empty());
        self.status = if self.id.is_some() {
            ResourceStatus::Present
        } else {
            ResourceStatus::Absent
        };
    }

    pub fn status(&self) -> ResourceStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: ResourceStatus) {
        self.status = status;
    }

    pub fn config(&self) -> Option<&AlertConfig> {
        self.config.as_ref()
    }

    pub fn set_config(&mut self, config: AlertConfig) {
        self.config = Some(config);
    }
}

/// Whether moving from `current` to `desired` needs a new alert rather than
/// an update. The alert name is immutable once created.
pub fn requires_replacement(current: &AlertConfig, desired: &AlertConfig) -> bool {
    current.name != desired.name
}
