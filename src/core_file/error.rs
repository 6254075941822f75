use crate::core_reply::ReplyCode;
use std::io;
use thiserror::Error;

#[cfg(unix)]
const ENOSPC: i32 = 28;

#[derive(Error, Debug)]
pub enum FileError {
    /// Transient failure; the client may retry.
    #[error("File temporarily unavailable: {0}")]
    Busy(String),

    /// Permanent failure: missing path, permission denied, invalid path.
    #[error("File access denied: {0}")]
    NoAccess(String),

    #[error("Not enough space: {0}")]
    SpaceInsufficient(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FileError {
    pub fn reply_code(&self) -> ReplyCode {
        match self {
            FileError::Busy(_) => ReplyCode::FileUnavailable,
            FileError::NoAccess(_) => ReplyCode::ActionNotTaken,
            FileError::SpaceInsufficient(_) => ReplyCode::InsufficientStorage,
            FileError::Io(_) => ReplyCode::LocalError,
        }
    }

    /// Classifies an I/O error raised while reading, listing or changing a path.
    pub fn from_access(path: &str, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::InvalidInput
            | io::ErrorKind::InvalidData
            | io::ErrorKind::AlreadyExists
            | io::ErrorKind::Unsupported => FileError::NoAccess(format!("{}: {}", path, e)),
            _ => FileError::Busy(format!("{}: {}", path, e)),
        }
    }

    /// Classifies an I/O error raised while creating a file.
    pub fn from_create(path: &str, e: io::Error) -> Self {
        if is_storage_full(&e) {
            return FileError::SpaceInsufficient(format!("{}: {}", path, e));
        }
        Self::from_access(path, e)
    }
}

#[cfg(unix)]
fn is_storage_full(e: &io::Error) -> bool {
    e.raw_os_error() == Some(ENOSPC)
}

#[cfg(not(unix))]
fn is_storage_full(_e: &io::Error) -> bool {
    false
}
