use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_reply::ReplyCode;
use log::info;

/// Handles the QUIT FTP command: says goodbye, closes TLS on the control
/// channel if it was negotiated and ends the session loop.
pub async fn handle_quit_command(
    conn: &mut ControlConnection,
    _arg: &str,
) -> Result<(), SessionError> {
    info!("Client {} sent QUIT", conn.session.remote_endpoint);
    conn.reply(ReplyCode::ClosingControlConnection, "Goodbye")
        .await?;
    conn.shutdown_control_tls().await?;
    Err(SessionError::QuitRequested)
}
