use crate::core_file::FileProvider;
use crate::core_network::data_connection::PROTOCOL_IPV4;
use crate::core_network::line_reader::TextEncoding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Default port of an active data connection (RFC 959 §3.2).
pub const DEFAULT_ACTIVE_DATA_PORT: u16 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransmissionMode {
    #[default]
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    #[default]
    Ascii,
    Image,
}

/// Rendering of `LIST` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFormat {
    #[default]
    Unix,
    MsDos,
}

/// How the next transfer obtains its data channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataConnectionMode {
    #[default]
    Active,
    Passive,
    ExtendedActive,
    ExtendedPassive,
}

/// Target of an active-mode connect (PORT/EPRT).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveEndpoint {
    pub ip: IpAddr,
    pub port: u16,
    pub protocol: u8,
}

/// Per-connection state owned by one control connection.
///
/// A file provider is bound exactly while the user is authenticated; `log_in`
/// and `log_out` are the only ways to change either.
pub struct Session {
    pub remote_endpoint: SocketAddr,
    pub local_endpoint: SocketAddr,
    pub user_name: String,
    pub encoding: TextEncoding,
    pub transmission_mode: TransmissionMode,
    pub data_type: DataType,
    pub list_format: ListFormat,
    pub data_connection_mode: DataConnectionMode,
    pub user_active_endpoint: ActiveEndpoint,
    pub use_secure_data_connection: bool,
    authenticated: bool,
    file_provider: Option<Box<dyn FileProvider>>,
}

impl Session {
    pub fn new(remote_endpoint: SocketAddr, local_endpoint: SocketAddr, list_format: ListFormat) -> Self {
        Self {
            remote_endpoint,
            local_endpoint,
            user_name: String::new(),
            encoding: TextEncoding::default(),
            transmission_mode: TransmissionMode::default(),
            data_type: DataType::default(),
            list_format,
            data_connection_mode: DataConnectionMode::default(),
            user_active_endpoint: ActiveEndpoint {
                ip: remote_endpoint.ip(),
                port: DEFAULT_ACTIVE_DATA_PORT,
                protocol: PROTOCOL_IPV4,
            },
            use_secure_data_connection: false,
            authenticated: false,
            file_provider: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn log_in(&mut self, provider: Box<dyn FileProvider>) {
        self.authenticated = true;
        self.file_provider = Some(provider);
    }

    pub fn log_out(&mut self) {
        self.authenticated = false;
        self.file_provider = None;
    }

    pub fn file_provider(&self) -> Option<&dyn FileProvider> {
        self.file_provider.as_deref()
    }

    pub fn file_provider_mut(&mut self) -> Option<&mut (dyn FileProvider + 'static)> {
        self.file_provider.as_deref_mut()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("remote_endpoint", &self.remote_endpoint)
            .field("user_name", &self.user_name)
            .field("authenticated", &self.authenticated)
            .field("data_connection_mode", &self.data_connection_mode)
            .field("list_format", &self.list_format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_file::LocalFileProvider;
    use tempfile::TempDir;

    fn session() -> Session {
        Session::new(
            "192.0.2.7:50000".parse().unwrap(),
            "192.0.2.1:21".parse().unwrap(),
            ListFormat::Unix,
        )
    }

    #[test]
    fn test_defaults() {
        let session = session();
        assert!(!session.is_authenticated());
        assert!(session.file_provider().is_none());
        assert_eq!(session.encoding, TextEncoding::Utf8);
        assert_eq!(session.data_type, DataType::Ascii);
        assert_eq!(
            session.user_active_endpoint,
            ActiveEndpoint {
                ip: "192.0.2.7".parse().unwrap(),
                port: 20,
                protocol: PROTOCOL_IPV4
            }
        );
    }

    #[test]
    fn test_provider_bound_only_while_authenticated() {
        let root = TempDir::new().unwrap();
        let mut session = session();
        session.log_in(Box::new(LocalFileProvider::new(root.path()).unwrap()));
        assert!(session.is_authenticated());
        assert!(session.file_provider().is_some());
        session.log_out();
        assert!(!session.is_authenticated());
        assert!(session.file_provider().is_none());
    }

    #[test]
    fn test_list_format_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: ListFormat,
        }
        let parsed: Wrapper = toml::from_str("format = \"msdos\"").unwrap();
        assert_eq!(parsed.format, ListFormat::MsDos);
    }
}
