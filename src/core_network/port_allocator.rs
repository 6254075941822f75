use crate::core_network::error::DataConnectionError;
use log::{debug, trace};
use rand::Rng;
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use tokio::net::TcpListener;

pub const DEFAULT_MIN_PORT: u16 = 1024;
pub const DEFAULT_MAX_PORT: u16 = 65535;

/// Hands out passive listening ports from a fixed range.
///
/// One allocator is shared by every session. It remembers the last port it
/// handed out and scans forward from there, wrapping at the end of the range,
/// so sessions started back to back do not race for the same port.
#[derive(Debug)]
pub struct PassivePortAllocator {
    min_port: u16,
    max_port: u16,
    last_used: Mutex<u16>,
}

impl Default for PassivePortAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_PORT, DEFAULT_MAX_PORT)
    }
}

impl PassivePortAllocator {
    /// Starts the rotation at a random port of `min_port..=max_port`.
    pub fn new(min_port: u16, max_port: u16) -> Self {
        let (min_port, max_port) = (min_port.min(max_port), min_port.max(max_port));
        let start = rand::thread_rng().gen_range(min_port..=max_port);
        Self::with_last_used(min_port, max_port, start)
    }

    pub fn with_last_used(min_port: u16, max_port: u16, last_used: u16) -> Self {
        Self {
            min_port,
            max_port,
            last_used: Mutex::new(last_used),
        }
    }

    fn next_port(&self, port: u16) -> u16 {
        if port >= self.max_port || port < self.min_port {
            self.min_port
        } else {
            port + 1
        }
    }

    /// Binds a listener on `ip`, trying every port of the range once.
    pub fn bind(&self, ip: IpAddr) -> Result<TcpListener, DataConnectionError> {
        let start = {
            let last_used = self
                .last_used
                .lock()
                .map(|guard| *guard)
                .unwrap_or(self.max_port);
            self.next_port(last_used)
        };

        let mut port = start;
        loop {
            match bind_listener(SocketAddr::new(ip, port)) {
                Ok(listener) => {
                    if let Ok(mut last_used) = self.last_used.lock() {
                        *last_used = port;
                    }
                    debug!("Passive listener bound on {}:{}", ip, port);
                    return Ok(listener);
                }
                Err(e) => trace!("Port {} unavailable: {}", port, e),
            }
            port = self.next_port(port);
            if port == start {
                return Err(DataConnectionError::NoAvailablePort);
            }
        }
    }
}

fn bind_listener(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let listener = std::net::TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    TcpListener::from_std(listener)
}
