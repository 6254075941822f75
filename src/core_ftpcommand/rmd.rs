use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_ftpcommand::utils::file_provider;
use crate::core_reply::ReplyCode;
use log::info;

/// Handles the RMD FTP command. The directory is removed with its content.
pub async fn handle_rmd_command(
    conn: &mut ControlConnection,
    path: &str,
) -> Result<(), SessionError> {
    file_provider(&conn.session)?.delete_directory(path).await?;
    info!("Directory deleted: {}", path);
    conn.reply(ReplyCode::FileActionOkay, "Directory deleted")
        .await
}
