use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// TFTP client configuration
///
/// # Example
///
/// ```rust
/// use tftpc::tftp::client::ClientConfig;
///
/// let config = ClientConfig::new("192.168.1.100".parse().unwrap(), 69);
/// ```
pub struct ClientConfig {
    /// Server IP address
    pub server_ip: IpAddr,
    /// Server port number
    pub server_port: u16,
    /// Socket receive/send timeout. `None` blocks indefinitely on a silent
    /// server, which is plain RFC 1350 stop-and-wait behavior; a timeout
    /// aborts the transfer when it fires, it never triggers a retry.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create new client configuration
    ///
    /// # Arguments
    ///
    /// * `server_ip` - Server IP address
    /// * `server_port` - Server port number (usually 69)
    pub fn new(server_ip: IpAddr, server_port: u16) -> Self {
        Self {
            server_ip,
            server_port,
            timeout: None,
        }
    }

    /// Set the socket timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 69)
    }
}
