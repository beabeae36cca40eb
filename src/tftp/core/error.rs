use std::io;

use thiserror::Error;

/// Errors that abort a TFTP transfer.
///
/// The first error of any kind ends the transfer: nothing is retried, and a
/// partially written download is left on disk.
#[derive(Debug, Error)]
pub enum TransferError {
    /// A received datagram was too short for its opcode, or carried an opcode
    /// that does not fit the current protocol state. Inbound ERROR packets
    /// also land here: this client does not interpret them.
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// A DATA or ACK block number did not match the expected next value.
    /// There is no recovery or reordering.
    #[error("unexpected block number {got}, expected {expected}")]
    Sequence { expected: u16, got: u16 },

    /// Local file read/write failure.
    #[error("local file error: {0}")]
    Storage(#[source] io::Error),

    /// Datagram send/receive failure.
    #[error("network error: {0}")]
    Network(#[source] io::Error),

    /// A filename or mode string cannot be put on the wire.
    #[error("encoding error: {0}")]
    Encoding(String),
}
