use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_reply::ReplyCode;
use log::{info, warn};
use std::sync::Arc;

/// Handles the PASS FTP command.
///
/// Checks the credentials against the configured authenticator. On success a
/// file provider is bound to the session; on failure the session stays logged out.
///
/// # Arguments
///
/// * `conn` - The control connection issuing the command.
/// * `password` - The password provided by the client.
///
/// # Returns
///
/// Result<(), SessionError> indicating the success or failure of the operation.
pub async fn handle_pass_command(
    conn: &mut ControlConnection,
    password: &str,
) -> Result<(), SessionError> {
    conn.session.log_out();

    let authenticator = Arc::clone(&conn.context.authenticator);
    let user_name = conn.session.user_name.clone();
    let password = password.to_string();
    // bcrypt verification is CPU bound.
    let accepted = tokio::task::spawn_blocking(move || {
        authenticator.authenticate(&user_name, &password)
    })
    .await
    .map_err(|e| SessionError::Internal(format!("Authentication task failed: {}", e)))?;

    if !accepted {
        warn!(
            "Failed login for user {} from {}",
            conn.session.user_name, conn.session.remote_endpoint
        );
        return conn.reply(ReplyCode::NotLoggedIn, "Failed to log in").await;
    }

    let provider = conn
        .context
        .file_provider_factory
        .get_provider(&conn.session.user_name)?;
    conn.session.log_in(provider);
    info!(
        "User {} logged in from {}",
        conn.session.user_name, conn.session.remote_endpoint
    );
    conn.reply(ReplyCode::UserLoggedIn, "Logged in").await
}
