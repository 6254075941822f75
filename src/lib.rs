//! ferrftpd: an asynchronous FTP server library.
//!
//! Implements RFC 959 with the RFC 2428 extensions (EPRT/EPSV), `OPTS UTF8`
//! and explicit TLS from RFC 4217 (AUTH TLS, PBSZ, PROT). Authentication and
//! storage are pluggable through [`core_auth::Authenticator`] and
//! [`core_file::FileProviderFactory`].

pub mod config;
pub mod constants;
pub mod core_auth;
pub mod core_cli;
pub mod core_file;
pub mod core_ftpcommand;
pub mod core_log;
pub mod core_network;
pub mod core_reply;
pub mod core_tls;
pub mod core_trace;
pub mod session;

pub use config::Config;
pub use core_network::network::{FtpServer, FtpServerBuilder};
