//! TCP reachability probe for hosts without an OS connectivity API.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use portal_platform::{ConnectivityProbe, NetworkCapabilities, Transport};
use portal_types::config::ProbeConfig;

/// Reports a wired transport when a TCP connect to the probe host succeeds.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            port,
            timeout,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(&config.host, config.port, config.timeout())
    }

    fn reachable(&self) -> bool {
        let addrs = match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                log::debug!("Probe lookup of {} failed: {e}", self.host);
                return false;
            },
        };
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(_) => return true,
                Err(e) => log::debug!("Probe connect to {addr} failed: {e}"),
            }
        }
        false
    }
}

impl ConnectivityProbe for TcpProbe {
    fn active_capabilities(&self) -> Option<NetworkCapabilities> {
        self.reachable()
            .then(|| NetworkCapabilities::with_transports(&[Transport::Ethernet]))
    }
}
