use crate::core_file::{FileError, FileWriter};
use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_ftpcommand::utils::file_provider;
use crate::core_reply::ReplyCode;
use log::{info, warn};
use tokio::io::AsyncWriteExt;

/// Handles the STOR (Store) FTP command, creating or truncating the target.
pub async fn handle_stor_command(
    conn: &mut ControlConnection,
    path: &str,
) -> Result<(), SessionError> {
    if path.is_empty() {
        warn!("STOR command received with no arguments");
        return missing_path(conn).await;
    }
    let writer = file_provider(&conn.session)?.create_for_write(path).await?;
    store(conn, path, writer).await
}

/// Handles the APPE (Append) FTP command; received bytes go after the existing content.
pub async fn handle_appe_command(
    conn: &mut ControlConnection,
    path: &str,
) -> Result<(), SessionError> {
    if path.is_empty() {
        warn!("APPE command received with no arguments");
        return missing_path(conn).await;
    }
    let writer = file_provider(&conn.session)?.open_for_write(path).await?;
    store(conn, path, writer).await
}

async fn missing_path(conn: &mut ControlConnection) -> Result<(), SessionError> {
    conn.reply(ReplyCode::ArgumentSyntaxError, "Syntax error, path is missing")
        .await
}

async fn store(
    conn: &mut ControlConnection,
    path: &str,
    mut writer: FileWriter,
) -> Result<(), SessionError> {
    let result = receive_file(conn, &mut writer).await;
    let received = conn.finish_transfer(result).await?;

    info!("Received {} bytes into {}", received, path);
    conn.reply(ReplyCode::ClosingDataConnection, "File has been received")
        .await
}

async fn receive_file(
    conn: &mut ControlConnection,
    writer: &mut FileWriter,
) -> Result<u64, SessionError> {
    conn.open_data_connection().await?;
    let received = conn.data_connection.receive(&mut **writer).await?;
    writer.flush().await.map_err(FileError::Io)?;
    writer.shutdown().await.map_err(FileError::Io)?;
    Ok(received)
}
