//! Naming and value conversions between configuration and wire representations
//!
//! Configuration uses underscore names (`threshold_comparator`), the Kibana API
//! uses camel-cased names (`thresholdComparator`). A couple of condition fields
//! are additionally abbreviated on the wire.

pub mod case;
pub mod fields;

pub use case::{to_camel_case, to_underscore};
pub use fields::{
    config_name, flatten_float_list, flatten_string_list, json_type_name, wire_name,
    CONDITION_FIELDS,
};
