//! Kibana alert model, declarative configuration, and the mapping between them

pub mod config;
pub mod mapper;
pub mod model;

pub use config::{load_config, ActionConfig, AlertConfig, Conditions, MappingError, ScheduleConfig};
pub use mapper::{expand_alert, flatten_alert};
pub use model::{Alert, AlertAction, AlertSchedule, AlertUpdate, NotifyWhen};
