//! Declarative alert configuration
//!
//! This is the shape the reconciliation side reads and writes: underscore
//! names, set-like collections, and single-entry lists for `schedule` and
//! `conditions`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::{NotifyWhen, DEFAULT_ACTION_GROUP, DEFAULT_ALERT_TYPE_ID, DEFAULT_CONSUMER};
use crate::convert::{config_name, json_type_name, wire_name};

/// Desired (or observed) state of one Kibana alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Changing the name replaces the alert
    pub name: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default = "default_alert_type_id")]
    pub alert_type_id: String,
    #[serde(default, with = "optional_single_entry")]
    pub schedule: Option<ScheduleConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<String>,
    /// Ignored by servers older than the notify-when threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_when: Option<NotifyWhen>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_consumer")]
    pub consumer: String,
    #[serde(with = "single_entry")]
    pub conditions: Conditions,
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub interval: String,
}

/// Parameters evaluated by the alert type executor.
///
/// The documented index-threshold fields are typed; anything else an alert
/// type accepts is carried through `extra` under its underscore name. Keys
/// in `extra` must survive the trip to the wire name and back unchanged, so
/// `es_query` is accepted while `esQuery` or `agg_field` are not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub threshold_comparator: String,
    pub time_window_size: i64,
    pub time_window_unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_size: Option<i64>,
    pub time_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_field: Option<String>,
    pub index: BTreeSet<String>,
    pub threshold: Vec<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Conditions {
    /// Reject conditions Kibana would refuse or that could not be read back
    pub fn validate(&self) -> Result<(), MappingError> {
        if self.index.is_empty() {
            return Err(MappingError::InvalidField {
                field: "index".to_string(),
                value: Value::Array(Vec::new()),
                kind: "empty array",
            });
        }
        if self.threshold.is_empty() {
            return Err(MappingError::InvalidField {
                field: "threshold".to_string(),
                value: Value::Array(Vec::new()),
                kind: "empty array",
            });
        }
        if let Some(key) = self.extra.keys().find(|key| config_name(&wire_name(key)) != **key) {
            return Err(MappingError::ConditionKey(key.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    #[serde(default = "default_action_group")]
    pub group: String,
    pub id: String,
    pub action_type_id: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl AlertConfig {
    /// Parse a configuration document, checking the shape of list-typed
    /// blocks before decoding so malformed entries are reported with their
    /// value and type.
    pub fn from_json(value: Value) -> Result<Self, MappingError> {
        let obj = value.as_object().ok_or_else(|| MappingError::Invalid(format!(
            "expected an object, got {}",
            json_type_name(&value)
        )))?;

        if let Some(actions) = obj.get("actions").filter(|v| !v.is_null()) {
            let items = actions.as_array().ok_or_else(|| MappingError::InvalidAction {
                value: actions.clone(),
                kind: json_type_name(actions),
            })?;
            if let Some(bad) = items.iter().find(|item| !item.is_object()) {
                return Err(MappingError::InvalidAction {
                    value: bad.clone(),
                    kind: json_type_name(bad),
                });
            }
        }

        match obj.get("conditions") {
            None | Some(Value::Null) => return Err(MappingError::ConditionsCount(0)),
            Some(Value::Array(items)) => {
                if items.len() != 1 {
                    return Err(MappingError::ConditionsCount(items.len()));
                }
                if !items[0].is_object() {
                    return Err(MappingError::InvalidConditions {
                        value: items[0].clone(),
                        kind: json_type_name(&items[0]),
                    });
                }
            }
            Some(Value::Object(_)) => {}
            Some(other) => {
                return Err(MappingError::InvalidConditions {
                    value: other.clone(),
                    kind: json_type_name(other),
                })
            }
        }

        if let Some(Value::Array(items)) = obj.get("schedule") {
            if items.len() > 1 {
                return Err(MappingError::ScheduleCount(items.len()));
            }
        }

        let config: Self =
            serde_json::from_value(value).map_err(|e| MappingError::Invalid(e.to_string()))?;
        config.conditions.validate()?;
        Ok(config)
    }

    /// Render as a configuration document
    pub fn to_json(&self) -> Result<Value, MappingError> {
        serde_json::to_value(self).map_err(|e| MappingError::Invalid(e.to_string()))
    }
}

/// Read and parse a JSON alert configuration file
pub fn load_config(path: impl AsRef<Path>) -> Result<AlertConfig, MappingError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| MappingError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| MappingError::Invalid(format!("{}: {}", path.display(), e)))?;
    AlertConfig::from_json(value)
}

#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("Invalid alert configuration: {0}")]
    Invalid(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error asserting action data: {value}, {kind}")]
    InvalidAction { value: Value, kind: &'static str },

    #[error("Error asserting conditions data: {value}, {kind}")]
    InvalidConditions { value: Value, kind: &'static str },

    #[error("Expected exactly one conditions entry, got {0}")]
    ConditionsCount(usize),

    #[error("Expected at most one schedule entry, got {0}")]
    ScheduleCount(usize),

    #[error("Alert schedule interval is required")]
    MissingSchedule,

    #[error("Condition field {0} is not in underscore form or shadows a documented field")]
    ConditionKey(String),

    #[error("Invalid value for condition field {field}: {value}, {kind}")]
    InvalidField {
        field: String,
        value: Value,
        kind: &'static str,
    },
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

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrList<T> {
    One(T),
    List(Vec<T>),
}

/// A required block written as a one-element list
mod single_entry {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::OneOrList;

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        [value].serialize(serializer)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        match OneOrList::<T>::deserialize(deserializer)? {
            OneOrList::One(value) => Ok(value),
            OneOrList::List(mut items) if items.len() == 1 => Ok(items.remove(0)),
            OneOrList::List(items) => Err(D::Error::custom(format!(
                "expected exactly one entry, got {}",
                items.len()
            ))),
        }
    }
}

/// An optional block written as a list of at most one element
mod optional_single_entry {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::OneOrList;

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        value.iter().collect::<Vec<_>>().serialize(serializer)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        match Option::<OneOrList<T>>::deserialize(deserializer)? {
            None => Ok(None),
            Some(OneOrList::One(value)) => Ok(Some(value)),
            Some(OneOrList::List(mut items)) if items.len() <= 1 => Ok(items.pop()),
            Some(OneOrList::List(items)) => Err(D::Error::custom(format!(
                "expected at most one entry, got {}",
                items.len()
            ))),
        }
    }
}
