pub mod alerts;
pub mod config;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use alerts::{AlertRestClient, ApiError};
pub use config::KibanaConfig;
pub use transport::{HttpTransport, Request, Transport, TransportError};
