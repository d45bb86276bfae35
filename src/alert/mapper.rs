//! Translation between [`AlertConfig`] and the wire [`Alert`]
//!
//! `expand_*` builds the API payload from configuration (create and update),
//! `flatten_*` turns an API response back into configuration (read).

use serde_json::{Map, Number, Value};

use super::config::{ActionConfig, AlertConfig, Conditions, MappingError, ScheduleConfig};
use super::model::{Alert, AlertAction, AlertSchedule};
use crate::convert::{
    config_name, flatten_float_list, flatten_string_list, json_type_name, wire_name,
};

/// Build the wire alert for a configuration.
///
/// `notify_when_supported` reflects the target server's version; when false
/// the configured `notify_when` is dropped.
pub fn expand_alert(config: &AlertConfig, notify_when_supported: bool) -> Result<Alert, MappingError> {
    let schedule = config
        .schedule
        .as_ref()
        .filter(|s| !s.interval.is_empty())
        .ok_or(MappingError::MissingSchedule)?;

    let notify_when = if notify_when_supported {
        config.notify_when
    } else {
        if let Some(value) = config.notify_when {
            tracing::debug!(
                alert_name = %config.name,
                notify_when = value.as_str(),
                "Server does not support notify_when, omitting it"
            );
        }
        None
    };

    Ok(Alert {
        id: String::new(),
        name: config.name.clone(),
        tags: config.tags.iter().cloned().collect(),
        alert_type_id: config.alert_type_id.clone(),
        schedule: AlertSchedule {
            interval: schedule.interval.clone(),
        },
        throttle: config.throttle.clone().filter(|t| !t.is_empty()),
        notify_when,
        enabled: config.enabled,
        consumer: config.consumer.clone(),
        params: expand_conditions(&config.conditions)?,
        actions: expand_actions(&config.actions),
    })
}

/// Build the camel-cased `params` object from configuration conditions
pub fn expand_conditions(conditions: &Conditions) -> Result<Map<String, Value>, MappingError> {
    conditions.validate()?;

    let raw = match serde_json::to_value(conditions) {
        Ok(Value::Object(raw)) => raw,
        Ok(other) => {
            return Err(MappingError::InvalidConditions {
                kind: json_type_name(&other),
                value: other,
            })
        }
        Err(e) => return Err(MappingError::Invalid(e.to_string())),
    };

    let mut params: Map<String, Value> = raw
        .into_iter()
        .map(|(key, value)| (wire_name(&key), value))
        .collect();

    // Sets in configuration, ordered lists on the wire
    params.insert(
        "index".to_string(),
        Value::Array(conditions.index.iter().cloned().map(Value::String).collect()),
    );

    let mut thresholds: Vec<f64> = Vec::with_capacity(conditions.threshold.len());
    for t in &conditions.threshold {
        if !thresholds.contains(t) {
            thresholds.push(*t);
        }
    }
    let thresholds = thresholds
        .into_iter()
        .map(threshold_value)
        .collect::<Result<Vec<_>, _>>()?;
    params.insert("threshold".to_string(), Value::Array(thresholds));

    Ok(params)
}

/// Integral thresholds are sent as integers
fn threshold_value(t: f64) -> Result<Value, MappingError> {
    if t.fract() == 0.0 && t.abs() < i64::MAX as f64 {
        return Ok(Value::from(t as i64));
    }
    Number::from_f64(t)
        .map(Value::Number)
        .ok_or_else(|| MappingError::InvalidField {
            field: "threshold".to_string(),
            value: Value::String(t.to_string()),
            kind: "number",
        })
}

pub fn expand_actions(actions: &[ActionConfig]) -> Vec<AlertAction> {
    actions
        .iter()
        .map(|action| AlertAction {
            group: action.group.clone(),
            id: action.id.clone(),
            action_type_id: action.action_type_id.clone(),
            params: action.params.clone(),
        })
        .collect()
}

/// Rebuild configuration from an alert returned by the server
pub fn flatten_alert(alert: &Alert) -> Result<AlertConfig, MappingError> {
    let schedule = Some(&alert.schedule.interval)
        .filter(|interval| !interval.is_empty())
        .map(|interval| ScheduleConfig {
            interval: interval.clone(),
        });

    Ok(AlertConfig {
        name: alert.name.clone(),
        tags: alert.tags.iter().cloned().collect(),
        alert_type_id: alert.alert_type_id.clone(),
        schedule,
        throttle: alert.throttle.clone().filter(|t| !t.is_empty()),
        notify_when: alert.notify_when,
        enabled: alert.enabled,
        consumer: alert.consumer.clone(),
        conditions: flatten_conditions(&alert.params)?,
        actions: flatten_actions(&alert.actions),
    })
}

/// Convert camel-cased `params` back to configuration conditions.
///
/// `index` is coerced to strings and `threshold` to floats whatever element
/// types the server answered with.
pub fn flatten_conditions(params: &Map<String, Value>) -> Result<Conditions, MappingError> {
    let mut raw: Map<String, Value> = params
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (config_name(key), value.clone()))
        .collect();

    let index = raw
        .get("index")
        .map(flatten_string_list)
        .unwrap_or_default();
    raw.insert(
        "index".to_string(),
        Value::Array(index.into_iter().map(Value::String).collect()),
    );

    let threshold = match raw.get("threshold") {
        Some(value) => flatten_float_list(value).map_err(|bad| MappingError::InvalidField {
            field: "threshold".to_string(),
            kind: json_type_name(&bad),
            value: bad,
        })?,
        None => Vec::new(),
    };
    raw.insert(
        "threshold".to_string(),
        Value::Array(threshold.into_iter().map(Value::from).collect()),
    );

    serde_json::from_value(Value::Object(raw))
        .map_err(|e| MappingError::Invalid(format!("conditions: {}", e)))
}

pub fn flatten_actions(actions: &[AlertAction]) -> Vec<ActionConfig> {
    actions
        .iter()
        .map(|action| ActionConfig {
            group: action.group.clone(),
            id: action.id.clone(),
            action_type_id: action.action_type_id.clone(),
            params: action.params.clone(),
        })
        .collect()
}
