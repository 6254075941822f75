use crate::core_auth::error::AuthError;
use crate::core_auth::helper::{load_passwd_file, verify_password};
use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;

/// Decides whether a USER/PASS pair may log in.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, user_name: &str, password: &str) -> bool;
}

/// Accepts the `anonymous` user with any password.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousAuthenticator;

impl Authenticator for AnonymousAuthenticator {
    fn authenticate(&self, user_name: &str, _password: &str) -> bool {
        user_name.eq_ignore_ascii_case("anonymous")
    }
}

/// A single fixed account.
#[derive(Debug, Clone)]
pub struct SimpleAuthenticator {
    user_name: String,
    password: String,
}

impl SimpleAuthenticator {
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
        }
    }
}

impl Authenticator for SimpleAuthenticator {
    fn authenticate(&self, user_name: &str, password: &str) -> bool {
        self.user_name == user_name && self.password == password
    }
}

/// One `user:bcrypt-hash` line of a passwd file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswdEntry {
    username: String,
    hashed_password: String,
}

impl PasswdEntry {
    pub fn new(username: impl Into<String>, hashed_password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            hashed_password: hashed_password.into(),
        }
    }

    /// Parses a line; blank lines and `#` comments yield `None`.
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        // bcrypt hashes never contain ':'.
        let (username, hashed_password) = line.split_once(':')?;
        if username.is_empty() || hashed_password.is_empty() || hashed_password.contains(':') {
            return None;
        }
        Some(Self::new(username, hashed_password))
    }

    pub fn get_hashed_password(&self) -> &str {
        &self.hashed_password
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }
}

/// Accounts read from a passwd file, checked with bcrypt.
#[derive(Debug, Clone, Default)]
pub struct PasswdAuthenticator {
    entries: HashMap<String, PasswdEntry>,
}

impl PasswdAuthenticator {
    pub fn from_entries(entries: impl IntoIterator<Item = PasswdEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.get_username().to_string(), e))
                .collect(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let entries = load_passwd_file(path.as_ref())?;
        debug!("Loaded {} passwd entries", entries.len());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Authenticator for PasswdAuthenticator {
    fn authenticate(&self, user_name: &str, password: &str) -> bool {
        match self.entries.get(user_name) {
            Some(entry) => verify_password(password, entry.get_hashed_password()),
            None => {
                warn!("Login attempt for unknown user {:?}", user_name);
                false
            }
        }
    }
}
