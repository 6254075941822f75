//! Passive mode: PASV (RFC 959) and EPSV (RFC 2428).

use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_network::error::format_protocol_list;
use crate::core_reply::ReplyCode;
use crate::session::DataConnectionMode;
use log::{debug, warn};
use std::net::{IpAddr, Ipv4Addr};

/// Formats the 227 reply text for an IPv4 listening endpoint.
pub fn format_pasv_reply(ip: Ipv4Addr, port: u16) -> String {
    let [a, b, c, d] = ip.octets();
    let [p1, p2] = port.to_be_bytes();
    format!("Enter Passive Mode ({},{},{},{},{},{})", a, b, c, d, p1, p2)
}

pub fn format_epsv_reply(port: u16) -> String {
    format!("Entering extended passive mode (|||{}|).", port)
}

/// Handles the PASV FTP command.
///
/// The advertised address is the configured `pasv_address` when set,
/// otherwise the address the listener is bound to.
pub async fn handle_pasv_command(
    conn: &mut ControlConnection,
    _arg: &str,
) -> Result<(), SessionError> {
    let addr = conn.data_connection.listen()?;
    let ip = match addr.ip() {
        IpAddr::V4(ip) => conn.context.pasv_address.unwrap_or(ip),
        IpAddr::V6(ip) => {
            return Err(SessionError::Internal(format!(
                "PASV needs an IPv4 listening address, got {}",
                ip
            )))
        }
    };

    debug!("Passive listener ready on {}", addr);
    conn.session.data_connection_mode = DataConnectionMode::Passive;
    conn.reply(
        ReplyCode::EnteringPassiveMode,
        &format_pasv_reply(ip, addr.port()),
    )
    .await
}

/// Handles the EPSV FTP command, with or without a protocol id.
pub async fn handle_epsv_command(
    conn: &mut ControlConnection,
    arg: &str,
) -> Result<(), SessionError> {
    let port = if arg.is_empty() {
        conn.data_connection.listen()?.port()
    } else {
        let protocol: i64 = match arg.parse() {
            Ok(protocol) => protocol,
            Err(_) => {
                warn!("EPSV with invalid protocol id {:?}", arg);
                return conn
                    .reply(ReplyCode::ArgumentSyntaxError, "Protocol ID incorrect.")
                    .await;
            }
        };
        match u8::try_from(protocol) {
            Ok(protocol) => conn.data_connection.extended_listen(protocol)?,
            Err(_) => {
                let supported = conn.data_connection.supported_passive_protocols();
                let text = format!(
                    "Protocol not supported, use {}",
                    format_protocol_list(&supported)
                );
                return conn.reply(ReplyCode::ProtocolNotSupported, &text).await;
            }
        }
    };

    conn.session.data_connection_mode = DataConnectionMode::ExtendedPassive;
    conn.reply(ReplyCode::EnteringExtendedPassiveMode, &format_epsv_reply(port))
        .await
}
