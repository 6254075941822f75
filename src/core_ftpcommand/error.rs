use crate::core_file::FileError;
use crate::core_network::error::DataConnectionError;
use crate::core_network::line_reader::LineError;
use crate::core_reply::{sanitize_reply_text, ReplyCode};
use crate::core_tls::TlsError;
use std::io;
use thiserror::Error;

/// Failure while processing one command on a control connection.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("client closed the control connection")]
    Disconnected,

    #[error("control connection I/O error: {0}")]
    ControlIo(#[source] io::Error),

    #[error("control connection TLS negotiation failed: {0}")]
    ControlTls(#[source] TlsError),

    #[error("command line longer than {0} bytes")]
    LineTooLong(usize),

    /// Raised by QUIT to end the session loop.
    #[error("quit requested")]
    QuitRequested,

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    DataConnection(#[from] DataConnectionError),

    #[error("{0}")]
    Internal(String),
}

impl SessionError {
    /// Transport faults end the session without a reply.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::Disconnected
                | SessionError::ControlIo(_)
                | SessionError::ControlTls(_)
                | SessionError::LineTooLong(_)
        )
    }

    /// Reply sent to the client when the error escapes a command handler.
    pub fn reply(&self) -> (ReplyCode, String) {
        match self {
            SessionError::File(e) => (e.reply_code(), sanitize_reply_text(&e.to_string())),
            SessionError::DataConnection(e) => (e.reply_code(), e.reply_text()),
            other => (
                ReplyCode::LocalError,
                sanitize_reply_text(&format!("Exception thrown, message: {}", other)),
            ),
        }
    }
}

impl From<LineError> for SessionError {
    fn from(e: LineError) -> Self {
        match e {
            LineError::UnexpectedEof => SessionError::Disconnected,
            LineError::TooLong(limit) => SessionError::LineTooLong(limit),
            LineError::Io(e) => SessionError::ControlIo(e),
        }
    }
}
