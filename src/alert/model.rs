//! Alert types as exchanged with the Kibana alerting API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Alert type used when the configuration does not name one
pub const DEFAULT_ALERT_TYPE_ID: &str = ".index-threshold";

/// Owning application used when the configuration does not name one
pub const DEFAULT_CONSUMER: &str = "alerts";

/// Action group used when an action does not name one
pub const DEFAULT_ACTION_GROUP: &str = "default";

/// Alert definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Server-assigned ID, empty until created
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_alert_type_id")]
    pub alert_type_id: String,
    pub schedule: AlertSchedule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<String>,
    /// Only sent to servers that understand it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_when: Option<NotifyWhen>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_consumer")]
    pub consumer: String,
    /// Alert-type specific parameters, camel-cased
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub actions: Vec<AlertAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSchedule {
    pub interval: String,
}

/// Action invoked when the alert fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertAction {
    #[serde(default = "default_action_group")]
    pub group: String,
    pub id: String,
    pub action_type_id: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Notification throttling policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotifyWhen {
    OnActionGroupChange,
    OnActiveAlert,
    OnThrottleInterval,
}

impl NotifyWhen {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyWhen::OnActionGroupChange => "onActionGroupChange",
            NotifyWhen::OnActiveAlert => "onActiveAlert",
            NotifyWhen::OnThrottleInterval => "onThrottleInterval",
        }
    }
}

/// Body accepted by the update endpoint.
///
/// Kibana rejects `alertTypeId`, `consumer` and `enabled` on update, so only
/// the mutable subset of [`Alert`] is sent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertUpdate<'a> {
    pub name: &'a str,
    pub tags: &'a [String],
    pub schedule: &'a AlertSchedule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throttle: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_when: Option<NotifyWhen>,
    pub params: &'a Map<String, Value>,
    pub actions: &'a [AlertAction],
}

impl<'a> From<&'a Alert> for AlertUpdate<'a> {
    fn from(alert: &'a Alert) -> Self {
        Self {
            name: &alert.name,
            tags: &alert.tags,
            schedule: &alert.schedule,
            throttle: alert.throttle.as_deref(),
            notify_when: alert.notify_when,
            params: &alert.params,
            actions: &alert.actions,
        }
    }
}

fn default_alert_type_id() -> String {
    DEFAULT_ALERT_TYPE_ID.to_string()
}

fn default_consumer() -> String {
    DEFAULT_CONSUMER.to_string()
}

fn default_action_group() -> String {
    DEFAULT_ACTION_GROUP.to_string()
}

fn default_true() -> bool {
    true
}
