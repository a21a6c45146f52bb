use crate::error::ClientError;
use crate::game::{ClientGame, Progress};
use crate::input::Command;
use log::{debug, info};
use shared::{decode, encode, Message, Outcome, RECORD_SIZE};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// How a client session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    Quit,
    Rejected,
    Finished(Outcome),
    Disconnected,
}

/// Reassembles fixed-size records from a byte stream.
///
/// Partial records are kept between calls, so `next` may be cancelled (for
/// example by `tokio::select!`) without losing bytes.
#[derive(Debug)]
pub struct RecordReader {
    record: [u8; RECORD_SIZE],
    filled: usize,
}

impl Default for RecordReader {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordReader {
    pub fn new() -> Self {
        Self {
            record: [0; RECORD_SIZE],
            filled: 0,
        }
    }

    /// Next whole message, or `None` once the peer closes the stream at a
    /// record boundary.
    pub async fn next<R: AsyncRead + Unpin>(
        &mut self,
        reader: &mut R,
    ) -> Result<Option<Message>, ClientError> {
        while self.filled < RECORD_SIZE {
            let read = reader.read(&mut self.record[self.filled..]).await?;
            if read == 0 {
                if self.filled == 0 {
                    return Ok(None);
                }
                return Err(ClientError::Truncated(self.filled));
            }
            self.filled += read;
        }

        self.filled = 0;
        Ok(Some(decode(&self.record)?))
    }
}

pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &Message,
) -> Result<(), ClientError> {
    let record = encode(message)?;
    writer.write_all(&record).await?;
    writer.flush().await?;
    Ok(())
}

/// Interactive client connected to a game server
pub struct Client<S> {
    stream: S,
    records: RecordReader,
    game: ClientGame,
}

impl Client<TcpStream> {
    pub async fn connect(host: &str, port: u16) -> Result<Self, ClientError> {
        info!("Connecting to {}:{}...", host, port);
        let stream = TcpStream::connect((host, port)).await?;
        info!("Connected to {}", stream.peer_addr()?);
        Ok(Self::new(stream))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            records: RecordReader::new(),
            game: ClientGame::new(),
        }
    }

    /// Plays until the game ends, the player quits or the server goes away.
    /// Commands are read line by line from `input`, text for the player is
    /// written to `out`.
    pub async fn run<I, O>(&mut self, input: I, out: &mut O) -> Result<Ending, ClientError>
    where
        I: AsyncBufRead + Unpin,
        O: Write,
    {
        let mut lines = input.lines();

        loop {
            tokio::select! {
                biased;

                received = self.records.next(&mut self.stream) => {
                    let Some(message) = received? else {
                        info!("Server closed the connection");
                        return Ok(Ending::Disconnected);
                    };
                    debug!("Received {}", message.kind());

                    let mut screen = Vec::new();
                    let progress = self.game.apply(&message, &mut screen);
                    for line in screen {
                        writeln!(out, "{}", line)?;
                    }
                    out.flush()?;

                    match progress {
                        Progress::Continue => {}
                        Progress::Rejected => return Ok(Ending::Rejected),
                        Progress::Finished(outcome) => return Ok(Ending::Finished(outcome)),
                    }
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        return Ok(Ending::Quit);
                    };
                    let Some(message) = Command::parse(&line).to_message(self.game.identity()) else {
                        return Ok(Ending::Quit);
                    };
                    debug!("Sending {}", message.kind());
                    write_message(&mut self.stream, &message).await?;
                }
            }
        }
    }
}
