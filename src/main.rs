use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use tftpc::tftp::client::{Client, ClientConfig};

/// Minimal TFTP client (RFC 1350, octet mode).
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// TFTP server host name or IP address.
    host: String,

    /// File name on the server.
    file: String,

    /// Transfer direction.
    #[arg(value_enum, default_value_t = Action::Get)]
    action: Action,

    /// Server UDP port.
    #[arg(short, long, default_value_t = 69)]
    port: u16,

    /// Local path; defaults to the remote file name in the current directory.
    #[arg(short, long)]
    local: Option<PathBuf>,

    /// Socket timeout in seconds; waits forever when unset.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Action {
    /// Download the file from the server.
    Get,
    /// Upload the file to the server.
    Put,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let server = resolve(&cli.host, cli.port)?;
    log::debug!("Resolved {} to {}", cli.host, server);

    let mut config = ClientConfig::new(server.ip(), server.port());
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    let local = cli.local.clone().unwrap_or_else(|| PathBuf::from(&cli.file));
    let client = Client::new(config)?;

    match cli.action {
        Action::Get => client.get(&cli.file, &local),
        Action::Put => client.put(&local, &cli.file),
    }
}

/// Resolve a host name and port, preferring IPv4 addresses.
fn resolve(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .with_context(|| format!("failed to resolve '{host}'"))?
        .collect();

    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| anyhow::anyhow!("no address found for '{host}'"))
}
