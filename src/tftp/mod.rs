//! TFTP (Trivial File Transfer Protocol) client implementation
//!
//! This module implements the client side of the TFTP protocol as defined in
//! [RFC 1350](https://www.rfc-editor.org/rfc/rfc1350) TFTP Protocol version 2.
//! Only octet (binary) mode is supported, and transfers run strict
//! stop-and-wait: one datagram in flight, one blocking receive per step.
//! Option negotiation (RFC 2347 and friends) is not implemented.
//!
//! ## Module Structure
//!
//! ```text
//! tftp/
//! ├── core/           # Core protocol implementation
//! │   ├── packet      # Packet serialization/deserialization
//! │   └── error       # Transfer error taxonomy
//! │
//! └── client/         # TFTP client
//!     ├── client      # Socket setup and GET/PUT entry points
//!     ├── session     # Per-transfer state machines
//!     ├── driver      # Send/receive loop
//!     └── config      # Client configuration
//! ```
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use tftpc::tftp::client::{Client, ClientConfig};
//! use std::path::Path;
//!
//! let config = ClientConfig::new("192.168.1.100".parse().unwrap(), 69);
//! let client = Client::new(config).unwrap();
//!
//! // Download file
//! client.get("remote.txt", Path::new("local.txt")).unwrap();
//!
//! // Upload file
//! client.put(Path::new("local.txt"), "remote.txt").unwrap();
//! ```

// Submodules
pub mod client;
pub mod core;
