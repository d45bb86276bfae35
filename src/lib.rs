//! Kibana Alert resource
//!
//! Maps a declarative alert configuration onto Kibana's alerting REST API.
//!
//! # Features
//!
//! - **Mapping**: underscore configuration names to camel-cased API params,
//!   including the `aggField` / `aggType` abbreviations
//! - **Version gating**: every operation requires Kibana >= 7.7.0;
//!   `notify_when` is only sent to Kibana >= 7.11.0
//! - **REST client**: create, read, update, delete, enable and disable alerts,
//!   optionally inside a Kibana space
//! - **Cancellation**: every operation takes a cancellation token that is
//!   passed through to the transport
//!
//! # Example
//!
//! ```no_run
//! use kibana_alert::{load_config, AlertResourceHandler, KibanaConfig, ResourceState};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = AlertResourceHandler::from_config(&KibanaConfig::from_env())?;
//! let mut state = ResourceState::new(load_config("alert.json")?);
//!
//! handler.create(&mut state, &CancellationToken::new()).await?;
//! println!("Created alert {:?}", state.id());
//! # Ok(())
//! # }
//! ```

pub mod alert;
pub mod client;
pub mod convert;
pub mod resource;
pub mod version;

// Re-export commonly used types
pub use alert::{load_config, Alert, AlertConfig, Conditions, MappingError, NotifyWhen};
pub use client::{AlertRestClient, ApiError, HttpTransport, KibanaConfig, Transport, TransportError};
pub use resource::{AlertError, AlertResourceHandler, ReadOutcome, ResourceState, ResourceStatus};
pub use version::{ServerVersion, VersionError, VersionGate};
