// Control connection, command dispatch and one handler module per command group
pub mod control;
pub mod error;
pub mod ftpcommand;
pub mod handlers;

pub mod auth;
pub mod cwd;
pub mod dele;
pub mod feat;
pub mod list;
pub mod mkd;
pub mod mode;
pub mod noop;
pub mod opts;
pub mod pass;
pub mod pwd;
pub mod quit;
pub mod retr;
pub mod rmd;
pub mod rnfr;
pub mod stor;
pub mod syst;
pub mod type_;
pub mod user;

// The utils and common functions are here
pub mod utils;

pub use control::ControlConnection;
pub use error::SessionError;
