//! TFTP client implementation
//!
//! This module provides the client side of a transfer:
//! - `client`: Socket setup and the GET/PUT entry points
//! - `session`: Per-transfer state machines (one GET or one PUT)
//! - `driver`: The stop-and-wait send/receive loop
//! - `config`: Client configuration

mod client;
mod config;
mod driver;
mod session;

// Public client types
pub use client::Client;
pub use config::ClientConfig;
pub use driver::run;
pub use session::{GetSession, PutSession, Session};
