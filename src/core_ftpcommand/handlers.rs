use crate::core_ftpcommand::control::ControlConnection;
use crate::core_ftpcommand::error::SessionError;
use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::core_ftpcommand::utils::split_command_line;
use crate::core_ftpcommand::{
    auth, cwd, dele, feat, list, mkd, mode, noop, opts, pass, pwd, quit, retr, rmd, rnfr, stor,
    syst, type_, user,
};
use crate::core_network::{pasv, port};
use crate::core_reply::ReplyCode;

/// Parses one command line and runs its handler.
///
/// Unknown verbs get 500 and commands touching files get 530 before login.
/// Errors a handler does not answer itself are returned to the caller.
pub async fn process_command(
    conn: &mut ControlConnection,
    line: &str,
) -> Result<(), SessionError> {
    let (verb, arg) = split_command_line(line);
    conn.context
        .tracer
        .trace_command(verb, conn.session.remote_endpoint);

    let command = match FtpCommand::from_str(verb) {
        Some(command) => command,
        None => {
            return conn
                .reply(ReplyCode::SyntaxError, "Can't recognize this command.")
                .await
        }
    };

    if command.requires_auth() && !conn.session.is_authenticated() {
        return conn.reply(ReplyCode::NotLoggedIn, "Not logged in").await;
    }

    match command {
        FtpCommand::USER => user::handle_user_command(conn, arg).await,
        FtpCommand::PASS => pass::handle_pass_command(conn, arg).await,
        FtpCommand::QUIT => quit::handle_quit_command(conn, arg).await,
        FtpCommand::PWD => pwd::handle_pwd_command(conn, arg).await,
        FtpCommand::CWD => cwd::handle_cwd_command(conn, arg).await,
        FtpCommand::CDUP => cwd::handle_cdup_command(conn, arg).await,
        FtpCommand::MKD => mkd::handle_mkd_command(conn, arg).await,
        FtpCommand::RMD => rmd::handle_rmd_command(conn, arg).await,
        FtpCommand::DELE => dele::handle_dele_command(conn, arg).await,
        FtpCommand::RNFR => rnfr::handle_rnfr_command(conn, arg).await,
        FtpCommand::RNTO => rnfr::handle_rnto_command(conn, arg).await,
        FtpCommand::RETR => retr::handle_retr_command(conn, arg).await,
        FtpCommand::STOR => stor::handle_stor_command(conn, arg).await,
        FtpCommand::APPE => stor::handle_appe_command(conn, arg).await,
        FtpCommand::LIST => list::handle_list_command(conn, arg).await,
        FtpCommand::NLST => list::handle_nlst_command(conn, arg).await,
        FtpCommand::TYPE => type_::handle_type_command(conn, arg).await,
        FtpCommand::MODE => mode::handle_mode_command(conn, arg).await,
        FtpCommand::PORT => port::handle_port_command(conn, arg).await,
        FtpCommand::EPRT => port::handle_eprt_command(conn, arg).await,
        FtpCommand::PASV => pasv::handle_pasv_command(conn, arg).await,
        FtpCommand::EPSV => pasv::handle_epsv_command(conn, arg).await,
        FtpCommand::FEAT => feat::handle_feat_command(conn, arg).await,
        FtpCommand::SYST => syst::handle_syst_command(conn, arg).await,
        FtpCommand::NOOP => noop::handle_noop_command(conn, arg).await,
        FtpCommand::OPTS => opts::handle_opts_command(conn, arg).await,
        FtpCommand::AUTH => auth::handle_auth_command(conn, arg).await,
        FtpCommand::PROT => auth::handle_prot_command(conn, arg).await,
        FtpCommand::PBSZ => auth::handle_pbsz_command(conn, arg).await,
    }
}
