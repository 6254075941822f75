// SSL/TLS support: AUTH TLS on the control channel, PROT P on data channels.

pub mod error;
pub mod tls_config;
pub mod tls_connection;

pub use error::TlsError;
pub use tls_config::TlsConfig;
pub use tls_connection::{ControlTlsUpgrade, TlsConnection};
