use crate::constants::{DEFAULT_GREETING, DEFAULT_LISTEN_ADDRESS, DEFAULT_LISTEN_PORT, DEFAULT_ROOT_DIR};
use crate::core_network::line_reader::DEFAULT_READ_BUFFER_SIZE;
use crate::core_network::port_allocator::{DEFAULT_MAX_PORT, DEFAULT_MIN_PORT};
use crate::core_tls::TlsConfig;
use crate::session::ListFormat;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: IpAddr,
    pub listen_port: u16,
    pub root_dir: PathBuf,
    pub greeting: String,
    pub list_format: ListFormat,
    pub pasv_port_min: u16,
    pub pasv_port_max: u16,
    /// Public IPv4 address announced in PASV replies (NAT setups).
    pub pasv_address: Option<Ipv4Addr>,
    pub command_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS,
            listen_port: DEFAULT_LISTEN_PORT,
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            greeting: String::from(DEFAULT_GREETING),
            list_format: ListFormat::Unix,
            pasv_port_min: DEFAULT_MIN_PORT,
            pasv_port_max: DEFAULT_MAX_PORT,
            pasv_address: None,
            command_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Anonymous,
    Simple,
    Passwd,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub username: String,
    pub password: String,
    pub passwd_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub tls: TlsConfig,
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        Self::from_toml(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))
    }

    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)?;
        Ok(config)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.listen_address, self.server.listen_port)
    }

    /// Checks what serde cannot: ranges, existing paths and mode-specific fields.
    pub fn validate(&self) -> Result<()> {
        let server = &self.server;
        if server.pasv_port_min == 0 || server.pasv_port_min > server.pasv_port_max {
            bail!(
                "Invalid passive port range {}-{}",
                server.pasv_port_min,
                server.pasv_port_max
            );
        }
        if !server.root_dir.is_dir() {
            bail!("Root directory {} does not exist", server.root_dir.display());
        }
        if server.command_buffer_size == 0 {
            bail!("command_buffer_size must be positive");
        }
        match self.auth.mode {
            AuthMode::Simple if self.auth.username.is_empty() => {
                bail!("auth.username is required when auth.mode = \"simple\"")
            }
            AuthMode::Passwd if self.auth.passwd_file.is_none() => {
                bail!("auth.passwd_file is required when auth.mode = \"passwd\"")
            }
            _ => {}
        }
        if self.tls.enabled {
            self.tls.validate().context("Invalid [tls] section")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.listen_port, 21);
        assert_eq!(config.server.pasv_port_min, 1024);
        assert_eq!(config.server.pasv_port_max, 65535);
        assert_eq!(config.server.command_buffer_size, 64);
        assert_eq!(config.auth.mode, AuthMode::Anonymous);
        assert!(!config.tls.enabled);
    }

    #[test]
    fn test_full_file() {
        let config = Config::from_toml(
            r#"
            [server]
            listen_address = "127.0.0.1"
            listen_port = 2121
            root_dir = "/srv/ftp"
            list_format = "msdos"
            pasv_port_min = 40000
            pasv_port_max = 40100
            pasv_address = "203.0.113.5"

            [auth]
            mode = "simple"
            username = "alice"
            password = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:2121".parse().unwrap());
        assert_eq!(config.server.list_format, ListFormat::MsDos);
        assert_eq!(config.server.pasv_address, Some(Ipv4Addr::new(203, 0, 113, 5)));
        assert_eq!(config.auth.mode, AuthMode::Simple);
        assert_eq!(config.auth.username, "alice");
    }

    #[test]
    fn test_unknown_auth_mode_is_rejected() {
        assert!(Config::from_toml("[auth]\nmode = \"ldap\"").is_err());
    }

    #[test]
    fn test_validate() {
        let root = TempDir::new().unwrap();
        let mut config = Config::default();
        config.server.root_dir = root.path().to_path_buf();
        assert!(config.validate().is_ok());

        config.server.pasv_port_min = 5000;
        config.server.pasv_port_max = 4000;
        assert!(config.validate().is_err());

        config.server.pasv_port_max = 6000;
        config.auth.mode = AuthMode::Passwd;
        assert!(config.validate().is_err());

        config.auth.mode = AuthMode::Anonymous;
        config.server.root_dir = root.path().join("missing");
        assert!(config.validate().is_err());
    }
}
