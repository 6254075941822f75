use crate::core_auth::core_auth::PasswdEntry;
use crate::core_auth::error::AuthError;
use bcrypt::{hash, verify, DEFAULT_COST};
use log::{error, info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AuthError> {
    hash(password, cost).map_err(|e| AuthError::Hash(e.to_string()))
}

/// Malformed hashes count as a failed match.
pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    verify(password, hashed_password).unwrap_or_else(|e| {
        error!("Failed to verify password hash: {}", e);
        false
    })
}

/// Reads a passwd file of `user:hash` lines. Malformed lines are skipped with a warning.
pub fn load_passwd_file(path: &Path) -> Result<HashMap<String, PasswdEntry>, AuthError> {
    let content = fs::read_to_string(path).map_err(|source| AuthError::PasswdFile {
        path: path.display().to_string(),
        source,
    })?;

    let mut passwd_map = HashMap::new();
    for (number, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match PasswdEntry::from_line(trimmed) {
            Some(entry) => {
                passwd_map.insert(entry.get_username().to_string(), entry);
            }
            None => warn!("Skipping malformed passwd line {} in {:?}", number + 1, path),
        }
    }
    info!("Passwd file loaded: {:?}", path);
    Ok(passwd_map)
}
