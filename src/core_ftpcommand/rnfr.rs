use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_ftpcommand::utils::{file_provider, split_command_line};
use crate::core_reply::ReplyCode;
use log::{info, warn};

/// Handles the RNFR FTP command.
///
/// The rename source is never stored in the session: after the 350 reply the
/// very next line must be RNTO, otherwise the rename is aborted with 503.
///
/// # Arguments
///
/// * `conn` - The control connection issuing the command.
/// * `from` - The path to rename.
///
/// # Returns
///
/// Result<(), SessionError> indicating the success or failure of the operation.
pub async fn handle_rnfr_command(
    conn: &mut ControlConnection,
    from: &str,
) -> Result<(), SessionError> {
    conn.reply(ReplyCode::FileActionPending, "Waiting for RNTO")
        .await?;

    let line = conn.read_line().await?;
    let (verb, to) = split_command_line(&line);
    conn.context
        .tracer
        .trace_command(verb, conn.session.remote_endpoint);
    if !verb.eq_ignore_ascii_case("RNTO") || line.len() == verb.len() {
        warn!("RNFR not followed by RNTO, got {}", verb);
        return conn
            .reply(ReplyCode::BadSequence, "Wrong sequence, renaming aborted")
            .await;
    }

    file_provider(&conn.session)?.rename(from, to).await?;
    info!("Renamed {} to {}", from, to);
    conn.reply(ReplyCode::FileActionOkay, "Rename succeeded")
        .await
}

/// Handles a RNTO that does not directly follow RNFR.
pub async fn handle_rnto_command(
    conn: &mut ControlConnection,
    _arg: &str,
) -> Result<(), SessionError> {
    conn.reply(ReplyCode::BadSequence, "Should use RNFR first")
        .await
}
