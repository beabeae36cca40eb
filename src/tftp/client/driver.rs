//! The stop-and-wait transfer loop.
//!
//! The driver owns the send/receive exchange but not the socket: the caller
//! supplies closures bound to an already-open socket and an already-resolved
//! endpoint. One datagram is in flight at a time, per RFC 1350's lock-step
//! ordering; there are no timers and no retransmission here.

use std::io;

use crate::tftp::core::{MAX_PACKET_SIZE, TransferError};

use super::session::Session;

/// Drive `session` to completion over the given send/receive functions.
///
/// Each iteration sends the session's pending packet (request, ACK, or DATA
/// depending on state), then blocks for one inbound datagram and feeds it to
/// the session. A failed send or receive is fatal and surfaces as
/// [`TransferError::Network`]; the first session error of any kind also ends
/// the loop immediately.
pub fn run<S, SendFn, RecvFn>(
    session: &mut S,
    mut send: SendFn,
    mut recv: RecvFn,
) -> Result<(), TransferError>
where
    S: Session,
    SendFn: FnMut(&[u8]) -> io::Result<usize>,
    RecvFn: FnMut(&mut [u8]) -> io::Result<usize>,
{
    let mut buf = [0u8; MAX_PACKET_SIZE];

    while !session.is_done() {
        if let Some(outbound) = session.next_packet()? {
            send(&outbound).map_err(TransferError::Network)?;
        }

        // Emitting the final ACK of a download completes the session with
        // nothing left to receive.
        if session.is_done() {
            break;
        }

        let received = recv(&mut buf).map_err(TransferError::Network)?;
        session.process(&buf[..received])?;
    }

    Ok(())
}
