use crate::core_file::FileSystemEntry;
use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_ftpcommand::utils::{file_provider, listing_argument};
use crate::core_reply::ReplyCode;
use crate::session::ListFormat;
use chrono::{DateTime, Datelike, Local};
use log::info;

/// Handles the LIST FTP command.
///
/// The listing is built in memory before the data channel is opened, so a
/// provider failure is answered without any connection attempt. `ls` style
/// flags such as `-l` or `-la` are ignored.
pub async fn handle_list_command(
    conn: &mut ControlConnection,
    arg: &str,
) -> Result<(), SessionError> {
    let path = listing_argument(arg);
    let entries = file_provider(&conn.session)?.listing(path).await?;
    let text = render_listing(&entries, conn.session.list_format, Local::now());
    send_listing(conn, text).await?;
    info!("Sent listing of {} entries", entries.len());
    conn.reply(ReplyCode::ClosingDataConnection, "Listing has been sent")
        .await
}

/// Handles the NLST FTP command: bare names, one per line.
pub async fn handle_nlst_command(
    conn: &mut ControlConnection,
    arg: &str,
) -> Result<(), SessionError> {
    let path = listing_argument(arg);
    let names = file_provider(&conn.session)?.name_listing(path).await?;
    let text = render_name_listing(&names);
    send_listing(conn, text).await?;
    conn.reply(ReplyCode::ClosingDataConnection, "Listing has been sent")
        .await
}

async fn send_listing(conn: &mut ControlConnection, text: String) -> Result<(), SessionError> {
    let bytes = conn.session.encoding.encode(&text);
    let result = async {
        conn.open_data_connection().await?;
        let mut source: &[u8] = &bytes;
        conn.data_connection.send(&mut source).await?;
        Ok::<(), SessionError>(())
    }
    .await;
    conn.finish_transfer(result).await
}

/// Renders a LIST body. It always starts with an empty line.
pub fn render_listing(entries: &[FileSystemEntry], format: ListFormat, now: DateTime<Local>) -> String {
    let mut text = String::from("\r\n");
    for entry in entries {
        let line = match format {
            ListFormat::Unix => format_unix_entry(entry, now),
            ListFormat::MsDos => format_msdos_entry(entry),
        };
        text.push_str(&line);
        text.push_str("\r\n");
    }
    text
}

pub fn render_name_listing(names: &[String]) -> String {
    names.iter().map(|name| format!("{}\r\n", name)).collect()
}

/// `ls -l` style line. Entries from the current year show the time, older ones the year.
pub fn format_unix_entry(entry: &FileSystemEntry, now: DateTime<Local>) -> String {
    let kind = if entry.is_directory { 'd' } else { '-' };
    let permission = if entry.is_read_only { "r-x" } else { "rwx" };
    let date = if entry.last_write_time.year() == now.year() {
        entry.last_write_time.format("%b %d %H:%M")
    } else {
        entry.last_write_time.format("%b %d  %Y")
    };
    format!(
        "{}{}{}{}   1 owner   group {:>15} {} {}",
        kind, permission, permission, permission, entry.length, date, entry.name
    )
}

pub fn format_msdos_entry(entry: &FileSystemEntry) -> String {
    let date = entry.last_write_time.format("%m-%d-%y  %I:%M%p");
    if entry.is_directory {
        format!("{}       {:<14} {}", date, "<DIR>", entry.name)
    } else {
        format!("{} {:>20} {}", date, entry.length, entry.name)
    }
}
