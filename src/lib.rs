//! Minimal TFTP client library (RFC 1350, octet mode).
//!
//! See the [`tftp`] module for the protocol implementation and the
//! [`tftp::client`] module for the high-level GET/PUT entry points.

pub mod tftp;
