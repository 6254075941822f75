use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_reply::ReplyCode;

/// Handles the FEAT FTP command.
///
/// TLS related features are advertised only when the server has a certificate.
pub async fn handle_feat_command(
    conn: &mut ControlConnection,
    _arg: &str,
) -> Result<(), SessionError> {
    let mut features = String::from("Supports:\nUTF8\nEPRT\nEPSV");
    if conn.context.control_tls.is_some() {
        features.push_str("\nAUTH TLS\nPBSZ\nPROT");
    }
    conn.reply_multiline(ReplyCode::SystemStatus, &features)
        .await
}
