use crate::core_reply::{sanitize_reply_text, ReplyCode};
use crate::core_tls::TlsError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataConnectionError {
    /// Protocol id (1 = IPv4, 2 = IPv6) outside the supported set.
    #[error("Protocol {requested} not supported")]
    ProtocolNotSupported { requested: u8, supported: Vec<u8> },

    #[error("There are no ports available")]
    NoAvailablePort,

    #[error("Failed to establish data connection: {0}")]
    Connect(#[source] io::Error),

    #[error("No data connection is listening")]
    NotListening,

    #[error("Data connection is not open")]
    NotConnected,

    #[error("Data connection does not support TLS")]
    TlsUnavailable,

    #[error("Data connection TLS failure: {0}")]
    Tls(#[from] TlsError),

    #[error("Data connection I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DataConnectionError {
    pub fn reply_code(&self) -> ReplyCode {
        match self {
            DataConnectionError::ProtocolNotSupported { .. } => ReplyCode::ProtocolNotSupported,
            DataConnectionError::Io(_) => ReplyCode::ConnectionClosed,
            _ => ReplyCode::CantOpenDataConnection,
        }
    }

    pub fn reply_text(&self) -> String {
        let text = match self {
            DataConnectionError::ProtocolNotSupported { supported, .. } => format!(
                "Protocol not supported, use {}",
                format_protocol_list(supported)
            ),
            DataConnectionError::Io(e) => format!("Connection closed; transfer aborted: {}", e),
            other => format!("Can't open data connection: {}", other),
        };
        sanitize_reply_text(&text)
    }
}

/// Renders protocol ids the way RFC 2428 suggests: `(1,2)`.
pub fn format_protocol_list(protocols: &[u8]) -> String {
    let ids: Vec<String> = protocols.iter().map(u8::to_string).collect();
    format!("({})", ids.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_protocol_lists_alternatives() {
        let err = DataConnectionError::ProtocolNotSupported {
            requested: 7,
            supported: vec![1],
        };
        assert_eq!(err.reply_code(), ReplyCode::ProtocolNotSupported);
        assert_eq!(err.reply_text(), "Protocol not supported, use (1)");
    }

    #[test]
    fn test_setup_and_transfer_failures() {
        assert_eq!(
            DataConnectionError::NoAvailablePort.reply_code().code(),
            425
        );
        let refused = DataConnectionError::Connect(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert_eq!(refused.reply_code().code(), 425);
        assert!(refused.reply_text().starts_with("Can't open data connection: "));
        let broken = DataConnectionError::Io(io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(broken.reply_code().code(), 426);
    }
}
