use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_ftpcommand::utils::file_provider_mut;
use crate::core_reply::{sanitize_reply_text, ReplyCode};
use log::{info, warn};

/// Handles the CWD FTP command.
///
/// Replies 250 with the new working directory, or 550 when the directory
/// cannot be entered.
pub async fn handle_cwd_command(
    conn: &mut ControlConnection,
    path: &str,
) -> Result<(), SessionError> {
    change_directory(conn, path).await
}

/// Handles the CDUP FTP command, a CWD to the parent directory.
pub async fn handle_cdup_command(
    conn: &mut ControlConnection,
    _arg: &str,
) -> Result<(), SessionError> {
    change_directory(conn, "..").await
}

async fn change_directory(conn: &mut ControlConnection, path: &str) -> Result<(), SessionError> {
    let provider = file_provider_mut(&mut conn.session)?;
    let result = provider.set_working_directory(path).await;
    match result {
        Ok(()) => {
            let working_directory = provider.working_directory();
            info!("Changed working directory to {}", working_directory);
            conn.reply(ReplyCode::FileActionOkay, &working_directory)
                .await
        }
        Err(e) => {
            warn!("Failed to change directory to {}: {}", path, e);
            conn.reply(ReplyCode::ActionNotTaken, &sanitize_reply_text(&e.to_string()))
                .await
        }
    }
}
