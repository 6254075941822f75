use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_ftpcommand::utils::file_provider;
use crate::core_reply::{quote_path, ReplyCode};

/// Handles the PWD FTP command.
pub async fn handle_pwd_command(
    conn: &mut ControlConnection,
    _arg: &str,
) -> Result<(), SessionError> {
    let working_directory = file_provider(&conn.session)?.working_directory();
    conn.reply(ReplyCode::PathCreated, &quote_path(&working_directory))
        .await
}
