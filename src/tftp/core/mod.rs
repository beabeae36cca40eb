//! TFTP core protocol implementation
//!
//! This module contains the protocol-level pieces of the client:
//! - `packet`: Packet serialization and deserialization
//! - `error`: The transfer error taxonomy

mod error;
mod packet;

// Public core types
pub use error::TransferError;
pub use packet::{BLOCK_SIZE, MAX_PACKET_SIZE, OCTET, Opcode, Packet};
