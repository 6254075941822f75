//! Active mode: PORT (RFC 959) and EPRT (RFC 2428).

use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_network::data_connection::{PROTOCOL_IPV4, PROTOCOL_IPV6};
use crate::core_network::error::format_protocol_list;
use crate::core_reply::ReplyCode;
use crate::session::{ActiveEndpoint, DataConnectionMode};
use log::{info, warn};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Rejected PORT/EPRT argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    Syntax(&'static str),
    ProtocolNotSupported(Vec<u8>),
}

impl ArgumentError {
    pub fn reply(&self) -> (ReplyCode, String) {
        match self {
            ArgumentError::Syntax(text) => (ReplyCode::ArgumentSyntaxError, text.to_string()),
            ArgumentError::ProtocolNotSupported(supported) => (
                ReplyCode::ProtocolNotSupported,
                format!("Protocol not supported, use {}", format_protocol_list(supported)),
            ),
        }
    }
}

/// Parses `h1,h2,h3,h4,p1,p2` into an IPv4 endpoint.
pub fn parse_port_argument(arg: &str) -> Result<ActiveEndpoint, ArgumentError> {
    let parts: Vec<&str> = arg.split(',').collect();
    if parts.len() != 6 {
        return Err(ArgumentError::Syntax("Syntax error, count of comma incorrect"));
    }

    let mut numbers = [0u8; 6];
    for (number, part) in numbers.iter_mut().zip(&parts) {
        *number = part
            .trim()
            .parse()
            .map_err(|_| ArgumentError::Syntax("Syntax error, number format incorrect"))?;
    }

    Ok(ActiveEndpoint {
        ip: IpAddr::V4(Ipv4Addr::new(numbers[0], numbers[1], numbers[2], numbers[3])),
        port: u16::from_be_bytes([numbers[4], numbers[5]]),
        protocol: PROTOCOL_IPV4,
    })
}

/// Parses `<d>proto<d>addr<d>port<d>` where `<d>` is the first character of `arg`.
///
/// `supported` lists the protocol ids the data connection can connect with.
pub fn parse_eprt_argument(arg: &str, supported: &[u8]) -> Result<ActiveEndpoint, ArgumentError> {
    let delimiter = arg
        .chars()
        .next()
        .ok_or(ArgumentError::Syntax("Syntax error, parameter is missing"))?;
    let fields: Vec<&str> = arg.split(delimiter).collect();
    if fields.len() != 5 {
        return Err(ArgumentError::Syntax("Syntax error, count of delimiter incorrect"));
    }

    let protocol: i64 = fields[1]
        .parse()
        .map_err(|_| ArgumentError::Syntax("Syntax error, protocol id incorrect"))?;
    let protocol = u8::try_from(protocol)
        .ok()
        .filter(|protocol| supported.contains(protocol))
        .ok_or_else(|| ArgumentError::ProtocolNotSupported(supported.to_vec()))?;

    let ip = match protocol {
        PROTOCOL_IPV4 => fields[2].parse::<Ipv4Addr>().map(IpAddr::V4),
        PROTOCOL_IPV6 => fields[2].parse::<Ipv6Addr>().map(IpAddr::V6),
        _ => return Err(ArgumentError::ProtocolNotSupported(supported.to_vec())),
    }
    .map_err(|_| ArgumentError::Syntax("Syntax error, address incorrect"))?;

    let port = fields[3]
        .parse()
        .map_err(|_| ArgumentError::Syntax("Syntax error, port incorrect"))?;

    Ok(ActiveEndpoint { ip, port, protocol })
}

/// Handles the PORT (Active Mode) FTP command.
pub async fn handle_port_command(
    conn: &mut ControlConnection,
    arg: &str,
) -> Result<(), SessionError> {
    match parse_port_argument(arg) {
        Ok(endpoint) => connect(conn, endpoint, DataConnectionMode::Active).await,
        Err(e) => reject(conn, arg, e).await,
    }
}

/// Handles the EPRT (Extended Active Mode) FTP command.
pub async fn handle_eprt_command(
    conn: &mut ControlConnection,
    arg: &str,
) -> Result<(), SessionError> {
    let supported = conn.data_connection.supported_active_protocols();
    match parse_eprt_argument(arg, &supported) {
        Ok(endpoint) => connect(conn, endpoint, DataConnectionMode::ExtendedActive).await,
        Err(e) => reject(conn, arg, e).await,
    }
}

async fn reject(
    conn: &mut ControlConnection,
    arg: &str,
    error: ArgumentError,
) -> Result<(), SessionError> {
    warn!("Rejected active mode argument {:?}: {:?}", arg, error);
    let (code, text) = error.reply();
    conn.reply(code, &text).await
}

/// Connects right away; the session only records the endpoint once the connect succeeded.
async fn connect(
    conn: &mut ControlConnection,
    endpoint: ActiveEndpoint,
    mode: DataConnectionMode,
) -> Result<(), SessionError> {
    info!(
        "Connecting active data channel to {}:{}",
        endpoint.ip, endpoint.port
    );
    conn.data_connection
        .connect_active(endpoint.ip, endpoint.port, endpoint.protocol)
        .await?;
    conn.session.user_active_endpoint = endpoint;
    conn.session.data_connection_mode = mode;
    conn.reply(ReplyCode::CommandOkay, "Data connection established")
        .await
}
