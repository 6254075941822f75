use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_reply::ReplyCode;
use log::info;

/// Handles the USER FTP command.
///
/// Records the user name and drops any previous login, so a new PASS is
/// required before file commands are accepted again.
///
/// # Arguments
///
/// * `conn` - The control connection issuing the command.
/// * `username` - The user name provided by the client.
///
/// # Returns
///
/// Result<(), SessionError> indicating the success or failure of the operation.
pub async fn handle_user_command(
    conn: &mut ControlConnection,
    username: &str,
) -> Result<(), SessionError> {
    info!(
        "Received USER command with username: {} from {}",
        username, conn.session.remote_endpoint
    );
    conn.session.user_name = username.to_string();
    conn.session.log_out();
    conn.reply(ReplyCode::NeedPassword, "Please input password")
        .await
}
