use std::cell::Cell;
use std::fs::File;
use std::net::{SocketAddr, UdpSocket};
use std::path::Path;

use super::config::ClientConfig;
use super::driver;
use super::session::{GetSession, PutSession, Session};

/// TFTP client
///
/// Supports file download (GET) and upload (PUT) operations.
///
/// # Example
///
/// ```rust,no_run
/// use tftpc::tftp::client::{Client, ClientConfig};
/// use std::path::Path;
///
/// let config = ClientConfig::new("192.168.1.100".parse().unwrap(), 69);
/// let client = Client::new(config).unwrap();
///
/// // Download file
/// client.get("remote.txt", Path::new("local.txt")).unwrap();
///
/// // Upload file
/// client.put(Path::new("local.txt"), "remote.txt").unwrap();
/// ```
pub struct Client {
    config: ClientConfig,
}

impl Client {
    /// Create a new TFTP client
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        Ok(Self { config })
    }

    /// Download a file from the server (RRQ - Read Request)
    ///
    /// # Arguments
    ///
    /// * `remote_file` - File name on the server
    /// * `local_file` - Local save path
    pub fn get(&self, remote_file: &str, local_file: &Path) -> anyhow::Result<()> {
        log::info!("Downloading {} to {}", remote_file, local_file.display());

        let socket = self.open_socket()?;
        let file = File::create(local_file)?;
        let mut session = GetSession::new(remote_file, file);
        self.transfer(&socket, &mut session)?;

        log::info!(
            "Download complete: {} ({} bytes)",
            local_file.display(),
            session.bytes_transferred()
        );
        Ok(())
    }

    /// Upload a file to the server (WRQ - Write Request)
    ///
    /// # Arguments
    ///
    /// * `local_file` - Local file path
    /// * `remote_file` - File name on the server
    pub fn put(&self, local_file: &Path, remote_file: &str) -> anyhow::Result<()> {
        log::info!("Uploading {} to {}", local_file.display(), remote_file);

        if !local_file.exists() {
            anyhow::bail!("Local file does not exist: {}", local_file.display());
        }

        let socket = self.open_socket()?;
        let file = File::open(local_file)?;
        let mut session = PutSession::new(remote_file, file);
        self.transfer(&socket, &mut session)?;

        log::info!(
            "Upload complete: {} ({} bytes)",
            remote_file,
            session.bytes_transferred()
        );
        Ok(())
    }

    fn open_socket(&self) -> anyhow::Result<UdpSocket> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_read_timeout(self.config.timeout)?;
        socket.set_write_timeout(self.config.timeout)?;
        log::debug!("Client socket bound to {}", socket.local_addr()?);
        Ok(socket)
    }

    fn transfer<S: Session>(&self, socket: &UdpSocket, session: &mut S) -> anyhow::Result<()> {
        let server_addr = SocketAddr::new(self.config.server_ip, self.config.server_port);
        // The request goes to the well-known port, but the server answers
        // from a fresh per-transfer port; keep sending to whichever address
        // the last datagram came from.
        let peer = Cell::new(server_addr);

        driver::run(
            session,
            |bytes| socket.send_to(bytes, peer.get()),
            |buf| {
                let (received, from) = socket.recv_from(buf)?;
                peer.set(from);
                Ok(received)
            },
        )?;
        Ok(())
    }
}
