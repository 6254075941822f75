use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_reply::ReplyCode;
use crate::session::DataType;

/// Handles the TYPE FTP command.
///
/// The representation type is recorded but transfers are always binary-safe.
pub async fn handle_type_command(
    conn: &mut ControlConnection,
    arg: &str,
) -> Result<(), SessionError> {
    match arg.to_ascii_uppercase().as_str() {
        "A" => {
            conn.session.data_type = DataType::Ascii;
            conn.reply(ReplyCode::CommandOkay, "In ASCII type").await
        }
        "I" => {
            conn.session.data_type = DataType::Image;
            conn.reply(ReplyCode::CommandOkay, "In IMAGE type").await
        }
        _ => {
            conn.reply(ReplyCode::ParameterNotImplemented, "Unknown type")
                .await
        }
    }
}
