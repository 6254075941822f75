use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_ftpcommand::utils::file_provider;
use crate::core_reply::{quote_path, ReplyCode};
use log::info;

/// Handles the MKD FTP command.
///
/// Replies 257 with the quoted absolute path of the new directory.
pub async fn handle_mkd_command(
    conn: &mut ControlConnection,
    path: &str,
) -> Result<(), SessionError> {
    let created = file_provider(&conn.session)?.create_directory(path).await?;
    info!("Directory created: {}", created);
    conn.reply(ReplyCode::PathCreated, &quote_path(&created))
        .await
}
