pub mod error;
pub mod local;
pub mod provider;

pub use error::FileError;
pub use local::{LocalFileProvider, LocalFileProviderFactory};
pub use provider::{FileProvider, FileProviderFactory, FileReader, FileSystemEntry, FileWriter};
