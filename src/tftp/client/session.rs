//! Per-transfer state machines.
//!
//! A session holds the mutable state of one GET or one PUT: the running block
//! counter and the local byte sink or source. It never touches the network
//! itself; the [driver](super::driver) feeds it received datagrams and sends
//! whatever it emits.

use std::io::{ErrorKind, Read, Write};

use crate::tftp::core::{BLOCK_SIZE, OCTET, Packet, TransferError};

/// The seam between a transfer session and the driver loop.
pub trait Session {
    /// Serialize the outbound packet for the current state, if the state has
    /// one pending, and advance past the send.
    fn next_packet(&mut self) -> Result<Option<Vec<u8>>, TransferError>;

    /// Decode one received datagram and validate it against the expected
    /// state. An `Err` is terminal: the transfer is over and nothing further
    /// is sent, including the ACK a valid packet would have earned.
    fn process(&mut self, datagram: &[u8]) -> Result<(), TransferError>;

    /// Whether the transfer reached its terminal success state.
    fn is_done(&self) -> bool;
}

enum GetState {
    SendRequest,
    AwaitingData { block: u16 },
    SendAck { block: u16, last: bool },
    Done,
}

/// State of one download.
///
/// `SendRequest -> AwaitingData(1) -> SendAck(1) -> AwaitingData(2) -> ...`
/// until a DATA payload shorter than [`BLOCK_SIZE`] marks the final block,
/// which still gets its ACK before the session reports done.
pub struct GetSession<W: Write> {
    remote_file: String,
    sink: W,
    state: GetState,
    bytes_written: u64,
}

impl<W: Write> GetSession<W> {
    pub fn new(remote_file: &str, sink: W) -> Self {
        Self {
            remote_file: remote_file.to_string(),
            sink,
            state: GetState::SendRequest,
            bytes_written: 0,
        }
    }

    /// Number of payload bytes written to the sink so far.
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_written
    }
}

impl<W: Write> Session for GetSession<W> {
    fn next_packet(&mut self) -> Result<Option<Vec<u8>>, TransferError> {
        match self.state {
            GetState::SendRequest => {
                let rrq = Packet::Rrq {
                    filename: self.remote_file.clone(),
                    mode: OCTET.to_string(),
                };
                // Block numbering starts at 1 for the first DATA packet.
                self.state = GetState::AwaitingData { block: 1 };
                rrq.serialize().map(Some)
            }
            GetState::SendAck { block, last } => {
                self.state = if last {
                    GetState::Done
                } else {
                    GetState::AwaitingData {
                        block: block.wrapping_add(1),
                    }
                };
                Packet::Ack(block).serialize().map(Some)
            }
            GetState::AwaitingData { .. } | GetState::Done => Ok(None),
        }
    }

    fn process(&mut self, datagram: &[u8]) -> Result<(), TransferError> {
        let expected = match self.state {
            GetState::AwaitingData { block } => block,
            _ => {
                return Err(TransferError::MalformedPacket(
                    "no datagram expected in the current state".to_string(),
                ));
            }
        };

        match Packet::deserialize(datagram)? {
            Packet::Data { block_num, data } => {
                if block_num != expected {
                    return Err(TransferError::Sequence {
                        expected,
                        got: block_num,
                    });
                }

                self.sink.write_all(&data).map_err(TransferError::Storage)?;
                self.bytes_written += data.len() as u64;

                let last = data.len() < BLOCK_SIZE;
                log::debug!("received block {} ({} bytes)", block_num, data.len());
                self.state = GetState::SendAck {
                    block: block_num,
                    last,
                };
                Ok(())
            }
            other => Err(TransferError::MalformedPacket(format!(
                "expected DATA, got {}",
                other.name()
            ))),
        }
    }

    fn is_done(&self) -> bool {
        matches!(self.state, GetState::Done)
    }
}

enum PutState {
    SendRequest,
    SendData { block: u16 },
    AwaitingAck { block: u16, last: bool },
    Done,
}

/// State of one upload.
///
/// `SendRequest -> AwaitingAck(0) -> SendData(1) -> AwaitingAck(1) -> ...`
/// A source read shorter than [`BLOCK_SIZE`] marks the final block; a source
/// whose length is an exact multiple of the block size produces a trailing
/// zero-length block. The session is done only once the final block's ACK
/// arrives.
pub struct PutSession<R: Read> {
    remote_file: String,
    source: R,
    state: PutState,
    bytes_read: u64,
}

impl<R: Read> PutSession<R> {
    pub fn new(remote_file: &str, source: R) -> Self {
        Self {
            remote_file: remote_file.to_string(),
            source,
            state: PutState::SendRequest,
            bytes_read: 0,
        }
    }

    /// Number of payload bytes read from the source so far.
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: Read> Session for PutSession<R> {
    fn next_packet(&mut self) -> Result<Option<Vec<u8>>, TransferError> {
        match self.state {
            PutState::SendRequest => {
                let wrq = Packet::Wrq {
                    filename: self.remote_file.clone(),
                    mode: OCTET.to_string(),
                };
                // The server acknowledges a WRQ with ACK 0.
                self.state = PutState::AwaitingAck {
                    block: 0,
                    last: false,
                };
                wrq.serialize().map(Some)
            }
            PutState::SendData { block } => {
                let mut chunk = vec![0u8; BLOCK_SIZE];
                let filled = read_block(&mut self.source, &mut chunk)?;
                chunk.truncate(filled);

                let last = filled < BLOCK_SIZE;
                self.bytes_read += filled as u64;
                log::debug!("sending block {} ({} bytes)", block, filled);

                let data = Packet::Data {
                    block_num: block,
                    data: chunk,
                };
                self.state = PutState::AwaitingAck { block, last };
                data.serialize().map(Some)
            }
            PutState::AwaitingAck { .. } | PutState::Done => Ok(None),
        }
    }

    fn process(&mut self, datagram: &[u8]) -> Result<(), TransferError> {
        let (expected, last) = match self.state {
            PutState::AwaitingAck { block, last } => (block, last),
            _ => {
                return Err(TransferError::MalformedPacket(
                    "no datagram expected in the current state".to_string(),
                ));
            }
        };

        match Packet::deserialize(datagram)? {
            Packet::Ack(block_num) => {
                if block_num != expected {
                    return Err(TransferError::Sequence {
                        expected,
                        got: block_num,
                    });
                }

                self.state = if last {
                    PutState::Done
                } else {
                    PutState::SendData {
                        block: expected.wrapping_add(1),
                    }
                };
                Ok(())
            }
            other => Err(TransferError::MalformedPacket(format!(
                "expected ACK, got {}",
                other.name()
            ))),
        }
    }

    fn is_done(&self) -> bool {
        matches!(self.state, PutState::Done)
    }
}

/// Fill `buf` from the source, stopping only at EOF.
///
/// `Read::read` may return short for pipe-backed sources; a short read must
/// not be mistaken for the final block.
fn read_block<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize, TransferError> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(count) => filled += count,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransferError::Storage(e)),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use super::*;

    fn data_packet(block_num: u16, len: usize) -> Vec<u8> {
        Packet::Data {
            block_num,
            data: vec![0xAB; len],
        }
        .serialize()
        .unwrap()
    }

    fn ack_packet(block_num: u16) -> Vec<u8> {
        Packet::Ack(block_num).serialize().unwrap()
    }

    #[test]
    fn get_downloads_three_blocks() {
        let mut sink = Vec::new();
        let mut session = GetSession::new("file.bin", &mut sink);

        let rrq = session.next_packet().unwrap().unwrap();
        assert_eq!(
            Packet::deserialize(&rrq).unwrap(),
            Packet::Rrq {
                filename: "file.bin".to_string(),
                mode: OCTET.to_string(),
            }
        );

        let mut acks = Vec::new();
        for (block, len) in [(1u16, 512usize), (2, 512), (3, 300)] {
            session.process(&data_packet(block, len)).unwrap();
            let ack = session.next_packet().unwrap().unwrap();
            acks.push(Packet::deserialize(&ack).unwrap());
        }

        assert_eq!(
            acks,
            vec![Packet::Ack(1), Packet::Ack(2), Packet::Ack(3)]
        );
        assert!(session.is_done());
        assert_eq!(session.bytes_transferred(), 512 + 512 + 300);
        drop(session);
        assert_eq!(sink.len(), 1324);
    }

    #[test]
    fn get_is_not_done_after_full_final_sized_block() {
        let mut session = GetSession::new("file.bin", Vec::new());
        session.next_packet().unwrap();
        session.process(&data_packet(1, 512)).unwrap();
        session.next_packet().unwrap();
        assert!(!session.is_done());
    }

    #[test]
    fn get_rejects_block_number_skip() {
        let mut session = GetSession::new("file.bin", Vec::new());
        session.next_packet().unwrap();
        session.process(&data_packet(1, 512)).unwrap();
        session.next_packet().unwrap();

        // Block 3 arrives where 2 is expected.
        let err = session.process(&data_packet(3, 512)).unwrap_err();
        assert!(matches!(
            err,
            TransferError::Sequence {
                expected: 2,
                got: 3
            }
        ));
        // The bad packet earns no ACK.
        assert!(session.next_packet().unwrap().is_none());
        assert!(!session.is_done());
    }

    #[test]
    fn get_rejects_ack_where_data_expected() {
        let mut session = GetSession::new("file.bin", Vec::new());
        session.next_packet().unwrap();
        let err = session.process(&ack_packet(1)).unwrap_err();
        assert!(matches!(err, TransferError::MalformedPacket(_)));
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn get_sink_failure_is_storage_error() {
        let mut session = GetSession::new("file.bin", FailingWriter);
        session.next_packet().unwrap();
        let err = session.process(&data_packet(1, 100)).unwrap_err();
        assert!(matches!(err, TransferError::Storage(_)));
        // No ACK after a failed write.
        assert!(session.next_packet().unwrap().is_none());
    }

    #[test]
    fn put_exact_multiple_sends_trailing_empty_block() {
        let source = Cursor::new(vec![0x42u8; 1024]);
        let mut session = PutSession::new("up.bin", source);

        let wrq = session.next_packet().unwrap().unwrap();
        assert_eq!(
            Packet::deserialize(&wrq).unwrap(),
            Packet::Wrq {
                filename: "up.bin".to_string(),
                mode: OCTET.to_string(),
            }
        );

        session.process(&ack_packet(0)).unwrap();

        let mut blocks = Vec::new();
        for expected_block in [1u16, 2, 3] {
            let bytes = session.next_packet().unwrap().unwrap();
            match Packet::deserialize(&bytes).unwrap() {
                Packet::Data { block_num, data } => {
                    assert_eq!(block_num, expected_block);
                    blocks.push(data.len());
                }
                other => panic!("expected DATA, got {}", other.name()),
            }
            assert!(!session.is_done());
            session.process(&ack_packet(expected_block)).unwrap();
        }

        // 1024 bytes is an exact multiple of 512: two full blocks plus a
        // zero-length terminator.
        assert_eq!(blocks, vec![512, 512, 0]);
        assert!(session.is_done());
        assert_eq!(session.bytes_transferred(), 1024);
    }

    #[test]
    fn put_short_final_block_ends_transfer() {
        let source = Cursor::new(vec![0x17u8; 700]);
        let mut session = PutSession::new("up.bin", source);

        session.next_packet().unwrap();
        session.process(&ack_packet(0)).unwrap();

        let first = session.next_packet().unwrap().unwrap();
        assert!(matches!(
            Packet::deserialize(&first).unwrap(),
            Packet::Data { block_num: 1, data } if data.len() == 512
        ));
        session.process(&ack_packet(1)).unwrap();

        let second = session.next_packet().unwrap().unwrap();
        assert!(matches!(
            Packet::deserialize(&second).unwrap(),
            Packet::Data { block_num: 2, data } if data.len() == 188
        ));
        assert!(!session.is_done());
        session.process(&ack_packet(2)).unwrap();
        assert!(session.is_done());
    }

    #[test]
    fn put_rejects_wrong_ack_number() {
        let source = Cursor::new(vec![0u8; 600]);
        let mut session = PutSession::new("up.bin", source);

        session.next_packet().unwrap();
        session.process(&ack_packet(0)).unwrap();
        session.next_packet().unwrap();

        let err = session.process(&ack_packet(2)).unwrap_err();
        assert!(matches!(
            err,
            TransferError::Sequence {
                expected: 1,
                got: 2
            }
        ));
    }

    #[test]
    fn put_rejects_data_where_ack_expected() {
        let source = Cursor::new(vec![0u8; 10]);
        let mut session = PutSession::new("up.bin", source);

        session.next_packet().unwrap();
        let err = session.process(&data_packet(1, 4)).unwrap_err();
        assert!(matches!(err, TransferError::MalformedPacket(_)));
    }

    /// Reader that hands out data one byte at a time.
    struct TrickleReader {
        data: Vec<u8>,
        pos: usize,
    }

    impl Read for TrickleReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos == self.data.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn put_short_reads_do_not_truncate_blocks() {
        let source = TrickleReader {
            data: vec![0x55; 600],
            pos: 0,
        };
        let mut session = PutSession::new("up.bin", source);

        session.next_packet().unwrap();
        session.process(&ack_packet(0)).unwrap();

        let first = session.next_packet().unwrap().unwrap();
        assert!(matches!(
            Packet::deserialize(&first).unwrap(),
            Packet::Data { block_num: 1, data } if data.len() == 512
        ));
    }
}
