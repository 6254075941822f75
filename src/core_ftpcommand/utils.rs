use crate::core_file::FileProvider;
use crate::core_ftpcommand::error::SessionError;
use crate::session::Session;

/// Splits a command line into its verb and argument at the first space.
pub fn split_command_line(line: &str) -> (&str, &str) {
    match line.split_once(' ') {
        Some((verb, arg)) => (verb, arg),
        None => (line, ""),
    }
}

/// Drops leading `ls`-style option tokens (`-l`, `-a`, `-la`) from a LIST/NLST argument.
///
/// Returns `None` when no path remains.
pub fn listing_argument(arg: &str) -> Option<&str> {
    let mut rest = arg.trim_start();
    while rest.starts_with('-') {
        rest = match rest.split_once(' ') {
            Some((_, tail)) => tail.trim_start(),
            None => "",
        };
    }
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// Provider bound to the logged-in user.
pub fn file_provider(session: &Session) -> Result<&dyn FileProvider, SessionError> {
    session
        .file_provider()
        .ok_or_else(|| SessionError::Internal("No file provider bound to session".into()))
}

pub fn file_provider_mut(session: &mut Session) -> Result<&mut (dyn FileProvider + 'static), SessionError> {
    session
        .file_provider_mut()
        .ok_or_else(|| SessionError::Internal("No file provider bound to session".into()))
}
