use std::fmt;

/// Reply codes used by the control connection (RFC 959 §4.2, RFC 2428, RFC 4217).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyCode {
    DataConnectionAlreadyOpen,
    AboutToOpenDataConnection,
    CommandOkay,
    SystemStatus,
    SystemType,
    ServiceReady,
    ClosingControlConnection,
    ClosingDataConnection,
    EnteringPassiveMode,
    EnteringExtendedPassiveMode,
    UserLoggedIn,
    AuthOkay,
    FileActionOkay,
    PathCreated,
    NeedPassword,
    FileActionPending,
    CantOpenDataConnection,
    ConnectionClosed,
    FileUnavailable,
    LocalError,
    InsufficientStorage,
    SyntaxError,
    ArgumentSyntaxError,
    CommandNotImplemented,
    BadSequence,
    ParameterNotImplemented,
    ProtocolNotSupported,
    NotLoggedIn,
    ActionNotTaken,
}

impl ReplyCode {
    pub fn code(self) -> u16 {
        match self {
            ReplyCode::DataConnectionAlreadyOpen => 125,
            ReplyCode::AboutToOpenDataConnection => 150,
            ReplyCode::CommandOkay => 200,
            ReplyCode::SystemStatus => 211,
            ReplyCode::SystemType => 215,
            ReplyCode::ServiceReady => 220,
            ReplyCode::ClosingControlConnection => 221,
            ReplyCode::ClosingDataConnection => 226,
            ReplyCode::EnteringPassiveMode => 227,
            ReplyCode::EnteringExtendedPassiveMode => 229,
            ReplyCode::UserLoggedIn => 230,
            ReplyCode::AuthOkay => 234,
            ReplyCode::FileActionOkay => 250,
            ReplyCode::PathCreated => 257,
            ReplyCode::NeedPassword => 331,
            ReplyCode::FileActionPending => 350,
            ReplyCode::CantOpenDataConnection => 425,
            ReplyCode::ConnectionClosed => 426,
            ReplyCode::FileUnavailable => 450,
            ReplyCode::LocalError => 451,
            ReplyCode::InsufficientStorage => 452,
            ReplyCode::SyntaxError => 500,
            ReplyCode::ArgumentSyntaxError => 501,
            ReplyCode::CommandNotImplemented => 502,
            ReplyCode::BadSequence => 503,
            ReplyCode::ParameterNotImplemented => 504,
            ReplyCode::ProtocolNotSupported => 522,
            ReplyCode::NotLoggedIn => 530,
            ReplyCode::ActionNotTaken => 550,
        }
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Formats a single-line reply: `"<code> <text>\r\n"`.
pub fn format_reply(code: ReplyCode, text: &str) -> String {
    format!("{} {}\r\n", code, text)
}

/// Formats a multi-line reply.
///
/// Carriage returns in `text` are dropped and every remaining `\n` starts a
/// continuation line (`"\r\n "`). The reply is closed by `"<code> End"`.
pub fn format_multiline_reply(code: ReplyCode, text: &str) -> String {
    let body = text.replace('\r', "").replace('\n', "\r\n ");
    format!("{}-{}\r\n{} End\r\n", code, body, code)
}

/// Replaces control characters with spaces so arbitrary error text fits on one reply line.
pub fn sanitize_reply_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Quotes an FTP path for 257 replies, doubling embedded quotes (RFC 959 appendix II).
pub fn quote_path(path: &str) -> String {
    format!("\"{}\"", path.replace('"', "\"\""))
}
