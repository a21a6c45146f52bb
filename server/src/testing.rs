//! In-memory stream for exercising connections without sockets.

use shared::{decode, Message, RECORD_SIZE};
use std::collections::VecDeque;
use std::io::{self, Read, Write};

/// One scripted outcome of a `read` call.
#[derive(Debug, Clone)]
pub enum Step {
    Data(Vec<u8>),
    Eof,
    Block,
    Fail(io::ErrorKind),
}

#[derive(Debug, Default)]
pub struct MockStream {
    reads: VecDeque<Step>,
    pub written: Vec<u8>,
    /// Most bytes a single `write` call accepts.
    pub write_limit: Option<usize>,
    pub write_error: Option<io::ErrorKind>,
}

impl MockStream {
    pub fn with_reads(reads: Vec<Step>) -> Self {
        Self {
            reads: reads.into(),
            ..Self::default()
        }
    }

    /// Decodes everything written so far.
    pub fn messages(&self) -> Vec<Message> {
        self.written
            .chunks(RECORD_SIZE)
            .map(|record| decode(record).expect("written record decodes"))
            .collect()
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            Some(Step::Data(mut bytes)) => {
                let count = bytes.len().min(buf.len());
                buf[..count].copy_from_slice(&bytes[..count]);
                if count < bytes.len() {
                    let rest = bytes.split_off(count);
                    self.reads.push_front(Step::Data(rest));
                }
                Ok(count)
            }
            Some(Step::Eof) => Ok(0),
            Some(Step::Fail(kind)) => Err(kind.into()),
            Some(Step::Block) | None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(kind) = self.write_error {
            return Err(kind.into());
        }
        let count = self.write_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        self.written.extend_from_slice(&buf[..count]);
        Ok(count)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
