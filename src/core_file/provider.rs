use crate::core_file::error::FileError;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::io::{AsyncRead, AsyncWrite};

pub type FileReader = Box<dyn AsyncRead + Unpin + Send>;
pub type FileWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// One line of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemEntry {
    pub name: String,
    pub last_write_time: DateTime<Local>,
    pub length: u64,
    pub is_directory: bool,
    pub is_read_only: bool,
}

/// Storage backend bound to one authenticated session.
///
/// Paths are FTP paths: absolute when they start with `/`, otherwise relative
/// to the working directory.
#[async_trait]
pub trait FileProvider: Send + Sync {
    /// Current working directory as an absolute FTP path.
    fn working_directory(&self) -> String;

    async fn set_working_directory(&mut self, path: &str) -> Result<(), FileError>;

    /// Creates a directory and returns its absolute FTP path.
    async fn create_directory(&self, path: &str) -> Result<String, FileError>;

    async fn delete_directory(&self, path: &str) -> Result<(), FileError>;

    async fn delete(&self, path: &str) -> Result<(), FileError>;

    async fn rename(&self, from: &str, to: &str) -> Result<(), FileError>;

    async fn open_for_read(&self, path: &str) -> Result<FileReader, FileError>;

    /// Opens an existing file for writing, appending to its content.
    async fn open_for_write(&self, path: &str) -> Result<FileWriter, FileError>;

    /// Creates or truncates a file for writing.
    async fn create_for_write(&self, path: &str) -> Result<FileWriter, FileError>;

    /// Bare entry names; `None` lists the working directory.
    async fn name_listing(&self, path: Option<&str>) -> Result<Vec<String>, FileError>;

    async fn listing(&self, path: Option<&str>) -> Result<Vec<FileSystemEntry>, FileError>;
}

/// Hands out one provider per authenticated session.
pub trait FileProviderFactory: Send + Sync {
    fn get_provider(&self, user_name: &str) -> Result<Box<dyn FileProvider>, FileError>;
}
