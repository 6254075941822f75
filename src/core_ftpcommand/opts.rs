use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_network::line_reader::TextEncoding;
use crate::core_reply::ReplyCode;
use log::debug;

/// Handles the OPTS FTP command. Only `UTF8 ON` and `UTF8 OFF` are understood.
///
/// The reply is sent in the new encoding, and the next command line is
/// decoded with it.
pub async fn handle_opts_command(
    conn: &mut ControlConnection,
    arg: &str,
) -> Result<(), SessionError> {
    let (encoding, text) = match arg.to_ascii_uppercase().as_str() {
        "UTF8 ON" => (TextEncoding::Utf8, "UTF-8 is on"),
        "UTF8 OFF" => (TextEncoding::Ascii, "UTF-8 is off"),
        _ => {
            return conn
                .reply(ReplyCode::SyntaxError, "Can't recognize this command.")
                .await
        }
    };
    debug!("Switching {} to {:?}", conn.session.remote_endpoint, encoding);
    conn.session.encoding = encoding;
    conn.reply(ReplyCode::CommandOkay, text).await
}
