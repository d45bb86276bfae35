//! Lifecycle of a declarative Kibana alert resource

pub mod handler;
pub mod state;

pub use handler::{AlertError, AlertResourceHandler, ReadOutcome};
pub use state::{requires_replacement, ResourceState, ResourceStatus};
