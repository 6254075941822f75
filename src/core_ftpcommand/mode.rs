use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_reply::ReplyCode;
use crate::session::TransmissionMode;

/// Handles the MODE FTP command. Only stream mode is supported.
pub async fn handle_mode_command(
    conn: &mut ControlConnection,
    arg: &str,
) -> Result<(), SessionError> {
    if arg.eq_ignore_ascii_case("S") {
        conn.session.transmission_mode = TransmissionMode::Stream;
        conn.reply(ReplyCode::CommandOkay, "In stream mode").await
    } else {
        conn.reply(ReplyCode::ParameterNotImplemented, "Unknown mode")
            .await
    }
}
