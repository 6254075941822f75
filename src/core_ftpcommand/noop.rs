use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_reply::ReplyCode;

pub async fn handle_noop_command(
    conn: &mut ControlConnection,
    _arg: &str,
) -> Result<(), SessionError> {
    conn.reply(ReplyCode::CommandOkay, "OK").await
}
