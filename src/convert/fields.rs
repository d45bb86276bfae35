//! Condition field name table and list coercion helpers

use serde_json::Value;

use super::case::{to_camel_case, to_underscore};

/// Configuration name and wire name of every documented condition field.
///
/// Each wire name is the camel-cased configuration name, except for the two
/// aggregation fields which Kibana abbreviates.
pub const CONDITION_FIELDS: &[(&str, &str)] = &[
    ("threshold_comparator", "thresholdComparator"),
    ("time_window_size", "timeWindowSize"),
    ("time_window_unit", "timeWindowUnit"),
    ("term_size", "termSize"),
    ("time_field", "timeField"),
    ("group_by", "groupBy"),
    ("aggregation_field", "aggField"),
    ("aggregation_type", "aggType"),
    ("term_field", "termField"),
    ("index", "index"),
    ("threshold", "threshold"),
];

/// Camel-cased long names and their wire abbreviations.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("aggregationField", "aggField"),
    ("aggregationType", "aggType"),
];

/// Wire name for a configuration condition field.
///
/// Documented fields resolve through [`CONDITION_FIELDS`]; anything else an
/// alert type accepts is camel-cased and then abbreviated if applicable.
pub fn wire_name(config_name: &str) -> String {
    if let Some((_, wire)) = CONDITION_FIELDS.iter().find(|(c, _)| *c == config_name) {
        return (*wire).to_string();
    }

    let camel = to_camel_case(config_name, false);
    match ABBREVIATIONS.iter().find(|(long, _)| *long == camel) {
        Some((_, short)) => (*short).to_string(),
        None => camel,
    }
}

/// Configuration name for a wire condition field. Inverse of [`wire_name`].
pub fn config_name(wire_name: &str) -> String {
    if let Some((config, _)) = CONDITION_FIELDS.iter().find(|(_, w)| *w == wire_name) {
        return (*config).to_string();
    }

    match ABBREVIATIONS.iter().find(|(_, short)| *short == wire_name) {
        Some((long, _)) => to_underscore(long),
        None => to_underscore(wire_name),
    }
}

/// Coerce a JSON list of arbitrary scalars to strings.
///
/// Kibana may also answer with a bare string where a list was sent; that is
/// treated as a one-element list. Nulls are dropped.
pub fn flatten_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Coerce a JSON list to floating point numbers.
///
/// Numeric strings are accepted. Returns the first element that is not a
/// number as the error.
pub fn flatten_float_list(value: &Value) -> Result<Vec<f64>, Value> {
    let items = match value {
        Value::Array(items) => items.as_slice(),
        other => std::slice::from_ref(other),
    };

    items
        .iter()
        .map(|item| match item {
            Value::Number(n) => n.as_f64().ok_or_else(|| item.clone()),
            Value::String(s) => s.trim().parse::<f64>().map_err(|_| item.clone()),
            _ => Err(item.clone()),
        })
        .collect()
}

/// Name of a JSON value's type, for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
