//! RFC 4217 commands: AUTH, PROT and PBSZ.

use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_reply::ReplyCode;
use log::info;

/// Handles the AUTH FTP command.
///
/// `AUTH TLS` and `AUTH SSL` reply 234 in clear text, then the TLS handshake
/// runs on the control channel. A failed handshake ends the session.
pub async fn handle_auth_command(
    conn: &mut ControlConnection,
    arg: &str,
) -> Result<(), SessionError> {
    let mechanism_supported = arg.eq_ignore_ascii_case("TLS") || arg.eq_ignore_ascii_case("SSL");
    let tls = match conn.context.control_tls.clone() {
        Some(tls) if mechanism_supported => tls,
        _ => {
            return conn
                .reply(ReplyCode::CommandNotImplemented, "Not supported")
                .await
        }
    };

    conn.reply(ReplyCode::AuthOkay, "Authenticating").await?;
    info!("Starting TLS on control connection of {}", conn.session.remote_endpoint);
    conn.upgrade_control_stream(tls).await
}

/// Handles the PROT FTP command.
///
/// `C` keeps data channels in clear text. `S`, `E` and `P` turn on TLS for
/// following transfers when data connections can be secured.
pub async fn handle_prot_command(
    conn: &mut ControlConnection,
    arg: &str,
) -> Result<(), SessionError> {
    let secure = match arg.to_ascii_uppercase().as_str() {
        "C" => false,
        "S" | "E" | "P" if conn.data_connection.supports_tls() => true,
        _ => {
            return conn
                .reply(ReplyCode::ParameterNotImplemented, "Parameter not implemented")
                .await
        }
    };
    conn.session.use_secure_data_connection = secure;
    conn.reply(ReplyCode::CommandOkay, "Secure level set").await
}

/// Handles the PBSZ FTP command. Only a zero buffer size is meaningful for TLS.
pub async fn handle_pbsz_command(
    conn: &mut ControlConnection,
    arg: &str,
) -> Result<(), SessionError> {
    if arg == "0" {
        conn.reply(ReplyCode::CommandOkay, "PBSZ=0").await
    } else {
        conn.reply(ReplyCode::ArgumentSyntaxError, "Only PBSZ 0 is supported")
            .await
    }
}
