//! TFTP packet serialization and deserialization.
//!
//! Wire formats per RFC 1350, all multi-byte integers big-endian:
//!
//! ```text
//! RRQ/WRQ: | opcode(2) | filename | 0 | mode | 0 |
//! DATA:    | opcode(2) | block(2) | payload (0..=512 bytes) |
//! ACK:     | opcode(2) | block(2) |
//! ```

use super::error::TransferError;

/// Protocol-mandated data block size.
///
/// A DATA payload shorter than this marks the final block of a transfer, so
/// the last-block comparison must use this constant and never the capacity of
/// whatever receive buffer happens to be allocated.
pub const BLOCK_SIZE: usize = 512;

/// Largest datagram a transfer produces: a DATA header plus a full block.
pub const MAX_PACKET_SIZE: usize = 4 + BLOCK_SIZE;

/// The only transfer mode this client speaks.
pub const OCTET: &str = "octet";

/// TFTP packet opcodes (RFC 1350).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Read Request
    Rrq = 1,
    /// Write Request
    Wrq = 2,
    /// Data block
    Data = 3,
    /// Acknowledgment
    Ack = 4,
    /// Recognized on the wire but never emitted or interpreted by this
    /// client; an inbound ERROR packet fails decoding as malformed.
    Error = 5,
}

impl Opcode {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::Rrq),
            2 => Some(Self::Wrq),
            3 => Some(Self::Data),
            4 => Some(Self::Ack),
            5 => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// A TFTP packet in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Rrq { filename: String, mode: String },
    Wrq { filename: String, mode: String },
    Data { block_num: u16, data: Vec<u8> },
    Ack(u16),
}

impl Packet {
    /// Serialize the packet to wire bytes.
    ///
    /// Fails with [`TransferError::Encoding`] if a request filename or mode
    /// contains an embedded NUL, since both are NUL-terminated on the wire.
    pub fn serialize(&self) -> Result<Vec<u8>, TransferError> {
        match self {
            Packet::Rrq { filename, mode } => serialize_request(Opcode::Rrq, filename, mode),
            Packet::Wrq { filename, mode } => serialize_request(Opcode::Wrq, filename, mode),
            Packet::Data { block_num, data } => {
                let mut buf = Vec::with_capacity(4 + data.len());
                buf.extend_from_slice(&Opcode::Data.as_u16().to_be_bytes());
                buf.extend_from_slice(&block_num.to_be_bytes());
                buf.extend_from_slice(data);
                Ok(buf)
            }
            Packet::Ack(block_num) => {
                let mut buf = Vec::with_capacity(4);
                buf.extend_from_slice(&Opcode::Ack.as_u16().to_be_bytes());
                buf.extend_from_slice(&block_num.to_be_bytes());
                Ok(buf)
            }
        }
    }

    /// Deserialize a received datagram.
    ///
    /// DATA requires at least the 4-byte opcode + block header (the payload
    /// may be empty); ACK must be exactly 4 bytes. ERROR and unknown opcodes
    /// fail with [`TransferError::MalformedPacket`].
    pub fn deserialize(buf: &[u8]) -> Result<Packet, TransferError> {
        if buf.len() < 2 {
            return Err(malformed("datagram shorter than an opcode"));
        }

        let raw_opcode = u16::from_be_bytes([buf[0], buf[1]]);
        match Opcode::from_u16(raw_opcode) {
            Some(Opcode::Rrq) => {
                let (filename, mode) = parse_request_body(&buf[2..])?;
                Ok(Packet::Rrq { filename, mode })
            }
            Some(Opcode::Wrq) => {
                let (filename, mode) = parse_request_body(&buf[2..])?;
                Ok(Packet::Wrq { filename, mode })
            }
            Some(Opcode::Data) => {
                if buf.len() < 4 {
                    return Err(malformed("DATA packet shorter than its header"));
                }
                Ok(Packet::Data {
                    block_num: u16::from_be_bytes([buf[2], buf[3]]),
                    data: buf[4..].to_vec(),
                })
            }
            Some(Opcode::Ack) => {
                if buf.len() != 4 {
                    return Err(TransferError::MalformedPacket(format!(
                        "ACK packet of {} bytes, expected 4",
                        buf.len()
                    )));
                }
                Ok(Packet::Ack(u16::from_be_bytes([buf[2], buf[3]])))
            }
            Some(Opcode::Error) => Err(malformed("ERROR packets are not supported")),
            None => Err(TransferError::MalformedPacket(format!(
                "unknown opcode {raw_opcode}"
            ))),
        }
    }

    /// Short packet name for log and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Packet::Rrq { .. } => "RRQ",
            Packet::Wrq { .. } => "WRQ",
            Packet::Data { .. } => "DATA",
            Packet::Ack(_) => "ACK",
        }
    }
}

fn serialize_request(
    opcode: Opcode,
    filename: &str,
    mode: &str,
) -> Result<Vec<u8>, TransferError> {
    for (label, value) in [("filename", filename), ("mode", mode)] {
        if value.as_bytes().contains(&0) {
            return Err(TransferError::Encoding(format!(
                "{label} contains an embedded NUL byte"
            )));
        }
    }

    let mut buf = Vec::with_capacity(2 + filename.len() + 1 + mode.len() + 1);
    buf.extend_from_slice(&opcode.as_u16().to_be_bytes());
    buf.extend_from_slice(filename.as_bytes());
    buf.push(0);
    buf.extend_from_slice(mode.as_bytes());
    buf.push(0);
    Ok(buf)
}

/// Parse the `filename \0 mode \0` body of a request packet.
fn parse_request_body(body: &[u8]) -> Result<(String, String), TransferError> {
    let fname_end = find_zero(body, 0).ok_or_else(|| malformed("filename not terminated"))?;
    let filename = parse_utf8(&body[..fname_end], "filename")?;

    let mode_start = fname_end + 1;
    let mode_end =
        find_zero(body, mode_start).ok_or_else(|| malformed("mode not terminated"))?;
    let mode = parse_utf8(&body[mode_start..mode_end], "mode")?;

    Ok((filename, mode))
}

/// Find the next NUL byte in a buffer starting from a given position.
fn find_zero(buf: &[u8], start: usize) -> Option<usize> {
    buf.get(start..)?.iter().position(|&b| b == 0).map(|pos| start + pos)
}

fn parse_utf8(bytes: &[u8], label: &str) -> Result<String, TransferError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| malformed(&format!("{label} is not valid UTF-8")))
}

fn malformed(msg: &str) -> TransferError {
    TransferError::MalformedPacket(msg.to_string())
}
