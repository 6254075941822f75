#[allow(clippy::module_inception)]
pub mod core_auth;
pub mod error;
pub mod helper;

pub use core_auth::{
    AnonymousAuthenticator, Authenticator, PasswdAuthenticator, PasswdEntry, SimpleAuthenticator,
};
pub use error::AuthError;
