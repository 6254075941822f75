use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_ftpcommand::utils::file_provider;
use crate::core_reply::ReplyCode;
use log::info;

/// Handles the DELE FTP command.
pub async fn handle_dele_command(
    conn: &mut ControlConnection,
    path: &str,
) -> Result<(), SessionError> {
    file_provider(&conn.session)?.delete(path).await?;
    info!("File deleted: {}", path);
    conn.reply(ReplyCode::FileActionOkay, "Delete succeeded")
        .await
}
