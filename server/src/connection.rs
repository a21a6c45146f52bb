//! Buffered, non-blocking connection to a single client.
//!
//! Reads are reassembled into whole records in the inbound queue and writes are
//! staged in the outbound queue until the socket reports it can take them.
//! The socket is edge-triggered, so the connection remembers whether it is
//! still readable or writable until an operation returns `WouldBlock`.

use crate::buffer::{ByteQueue, BUFFER_SIZE};
use crate::error::ConnectionError;
use log::warn;
use shared::{Message, RECORD_SIZE};
use std::io::{self, Read, Write};

/// Consecutive empty reads tolerated before the peer is considered gone.
pub const STALL_LIMIT: u32 = 3;

#[derive(Debug)]
pub struct Connection<S> {
    stream: S,
    inbound: ByteQueue,
    outbound: ByteQueue,
    stalls: u32,
    readable: bool,
    writable: bool,
}

impl<S> Connection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            inbound: ByteQueue::new(BUFFER_SIZE),
            outbound: ByteQueue::new(BUFFER_SIZE),
            stalls: 0,
            readable: false,
            writable: false,
        }
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn has_outbound(&self) -> bool {
        !self.outbound.is_empty()
    }

    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    /// Bytes of a partially received record.
    pub fn inbound_len(&self) -> usize {
        self.inbound.len()
    }

    pub fn stalls(&self) -> u32 {
        self.stalls
    }

    pub fn is_readable(&self) -> bool {
        self.readable
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn mark_readable(&mut self) {
        self.readable = true;
    }

    pub fn mark_writable(&mut self) {
        self.writable = true;
    }

    /// True while the connection has readiness that has not been used up.
    pub fn has_pending_work(&self) -> bool {
        self.readable || (self.writable && self.has_outbound())
    }
}

impl<S: Write> Connection<S> {
    /// Queues one message for sending. Fails without queueing anything when
    /// the outbound buffer has no room for another record.
    pub fn enqueue(&mut self, message: &Message) -> Result<(), ConnectionError> {
        let record = shared::encode(message)?;
        if !self.outbound.push(&record) {
            return Err(ConnectionError::Backpressure {
                queued: self.outbound.len(),
                needed: record.len(),
            });
        }
        Ok(())
    }

    /// Makes a single write attempt with everything queued and keeps whatever
    /// the socket did not accept. Returns the number of bytes sent.
    pub fn flush(&mut self) -> Result<usize, ConnectionError> {
        if self.outbound.is_empty() {
            return Ok(0);
        }

        match self.stream.write(self.outbound.as_slice()) {
            Ok(0) => {
                warn!(
                    "Zero-byte write on a writable socket, {} bytes still queued",
                    self.outbound.len()
                );
                Ok(0)
            }
            Ok(sent) => {
                self.outbound.consume(sent);
                Ok(sent)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.writable = false;
                Ok(0)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl<S: Read> Connection<S> {
    /// Reads towards the end of the current record. Returns the message once a
    /// whole record has arrived, `None` if more bytes are needed.
    ///
    /// Never reads past a record boundary, so a message is fully handled
    /// before any byte of the next one is taken off the socket.
    pub fn receive(&mut self) -> Result<Option<Message>, ConnectionError> {
        let mut chunk = [0u8; RECORD_SIZE];

        loop {
            let wanted = RECORD_SIZE - self.inbound.len();
            match self.stream.read(&mut chunk[..wanted]) {
                Ok(0) if self.inbound.is_empty() => {
                    self.stalls += 1;
                    if self.stalls >= STALL_LIMIT {
                        return Err(ConnectionError::Stalled(self.stalls));
                    }
                    return Ok(None);
                }
                Ok(0) => {
                    return Err(ConnectionError::Closed {
                        pending: self.inbound.len(),
                    });
                }
                Ok(read) => {
                    self.stalls = 0;
                    self.inbound.push(&chunk[..read]);

                    if self.inbound.len() == RECORD_SIZE {
                        let decoded = shared::decode(self.inbound.as_slice());
                        self.inbound.clear();
                        return Ok(Some(decoded?));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.readable = false;
                    return Ok(None);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}
