use crate::core_file::FileReader;
use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_ftpcommand::utils::file_provider;
use crate::core_reply::ReplyCode;
use log::{info, warn};

/// Handles the RETR (Retrieve) FTP command.
///
/// Opens the file through the session's file provider before touching the
/// data channel, so a missing or locked file is answered with 550/450 and no
/// connection is attempted. Bytes are streamed unchanged whatever the TYPE.
///
/// # Arguments
///
/// * `conn` - The control connection issuing the command.
/// * `path` - The file to retrieve.
///
/// # Returns
///
/// Result<(), SessionError> indicating the success or failure of the operation.
pub async fn handle_retr_command(
    conn: &mut ControlConnection,
    path: &str,
) -> Result<(), SessionError> {
    if path.is_empty() {
        warn!("RETR command received with no arguments");
        return conn
            .reply(ReplyCode::ArgumentSyntaxError, "Syntax error, path is missing")
            .await;
    }

    let mut reader = file_provider(&conn.session)?.open_for_read(path).await?;
    let result = send_file(conn, &mut reader).await;
    let sent = conn.finish_transfer(result).await?;

    info!("Sent {} bytes of {}", sent, path);
    conn.reply(ReplyCode::ClosingDataConnection, "File has been sent")
        .await
}

async fn send_file(conn: &mut ControlConnection, reader: &mut FileReader) -> Result<u64, SessionError> {
    conn.open_data_connection().await?;
    let sent = conn.data_connection.send(&mut **reader).await?;
    Ok(sent)
}
