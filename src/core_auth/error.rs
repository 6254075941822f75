use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to read passwd file {path}: {source}")]
    PasswdFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to hash password: {0}")]
    Hash(String),
}
