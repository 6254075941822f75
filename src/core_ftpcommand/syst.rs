use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_reply::ReplyCode;

/// Handles the SYST FTP command.
pub async fn handle_syst_command(
    conn: &mut ControlConnection,
    _arg: &str,
) -> Result<(), SessionError> {
    conn.reply(ReplyCode::SystemType, "UNIX Type: L8").await
}
