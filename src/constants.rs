// src/constants.rs

use std::net::{IpAddr, Ipv4Addr};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/ferrftpd.conf";
pub const DEFAULT_LISTEN_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
pub const DEFAULT_LISTEN_PORT: u16 = 21;
pub const DEFAULT_ROOT_DIR: &str = "/var/ftp";
pub const DEFAULT_GREETING: &str = "ferrftpd is now ready";
