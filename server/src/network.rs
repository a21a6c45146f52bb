//! Server network layer: a single-threaded readiness loop over TCP
//!
//! One `mio::Poll` watches the listener and every client socket. Sockets are
//! registered once, edge-triggered, and each connection remembers whether it is
//! still readable or writable until an operation reports `WouldBlock`. The
//! poll only blocks when none of that remembered readiness has work left.
//!
//! Every iteration does a bounded amount of work:
//! 1. flush all writable connections that have queued bytes
//! 2. accept one connection, or else read from one readable connection
//! 3. broadcast status if a turn completed or a role changed
//!
//! The loop ends once the game is over and the last client has left.

use crate::config::ServerConfig;
use crate::error::{CapacityError, ConnectionError, ServerError};
use crate::game::GameState;
use crate::handler;
use crate::registry::Registry;
use crate::session::Session;
use log::{debug, error, info, warn};
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use shared::{ClientId, Message};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::time::Duration;

const LISTENER: Token = Token(0);
const EVENT_CAPACITY: usize = 128;

/// Game server bound to a listening socket
pub struct Server {
    poll: Poll,
    events: Events,
    listener: TcpListener,
    /// Pending connections may be waiting in the backlog
    listener_ready: bool,
    session: Session<TcpStream>,
}

impl Server {
    /// Binds the listening socket and prepares an empty game.
    pub fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let poll = Poll::new()?;
        let mut listener = TcpListener::bind(config.address)?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;

        let registry = Registry::new(config.max_connections, config.identity_space, config.policy);
        let game = GameState::new(config.heap_size, config.variant, config.players);
        info!(
            "Server listening on {} ({} game, {} players, heaps of {})",
            listener.local_addr()?,
            config.variant,
            config.players,
            config.heap_size
        );

        Ok(Server {
            poll,
            events: Events::with_capacity(EVENT_CAPACITY),
            listener,
            listener_ready: false,
            session: Session::new(registry, game),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves clients until the game is over and everybody has disconnected.
    pub fn run(mut self) -> Result<(), ServerError> {
        loop {
            self.wait()?;

            self.session.flush_ready();
            if self.listener_ready {
                self.accept();
            } else {
                self.service_one();
            }
            self.session.broadcast_status();

            if self.session.finished() {
                break;
            }
        }

        info!("Game over and all clients have left, shutting down");
        Ok(())
    }

    fn has_pending_work(&self) -> bool {
        self.listener_ready
            || self
                .session
                .registry()
                .iter()
                .any(|(_, connection)| connection.has_pending_work())
    }

    /// Waits for readiness and records it. Does not block while earlier
    /// readiness still has work.
    fn wait(&mut self) -> Result<(), ServerError> {
        let timeout = self.has_pending_work().then_some(Duration::ZERO);

        if let Err(e) = self.poll.poll(&mut self.events, timeout) {
            if e.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            error!("Poll failed: {}", e);
            return Err(e.into());
        }

        for event in self.events.iter() {
            if event.token() == LISTENER {
                self.listener_ready = true;
                continue;
            }

            let Ok(id) = ClientId::try_from(event.token().0) else {
                continue;
            };
            let Some(connection) = self.session.registry_mut().get_mut(id) else {
                continue;
            };
            if event.is_readable() || event.is_read_closed() || event.is_error() {
                connection.mark_readable();
            }
            if event.is_writable() || event.is_write_closed() {
                connection.mark_writable();
            }
        }
        Ok(())
    }

    /// Accepts a single pending connection.
    fn accept(&mut self) {
        let (stream, peer) = match self.listener.accept() {
            Ok(accepted) => accepted,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.listener_ready = false;
                return;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                self.listener_ready = false;
                return;
            }
        };

        let id = match self.session.admit(stream) {
            Ok(id) => id,
            Err((err, stream)) => {
                reject(stream, peer, err);
                return;
            }
        };

        let Some(connection) = self.session.registry_mut().get_mut(id) else {
            return;
        };
        let token = Token(id as usize);
        if let Err(e) = self.poll.registry().register(
            connection.stream_mut(),
            token,
            Interest::READABLE | Interest::WRITABLE,
        ) {
            error!("Failed to register client {} ({}): {}", id, peer, e);
            self.session.disconnect(id);
            return;
        }
        debug!("Client {} is {}", id, peer);
    }

    /// Reads from the lowest-numbered readable connection, handling at most
    /// one message.
    fn service_one(&mut self) {
        let Some(id) = self
            .session
            .registry()
            .iter()
            .find(|(_, connection)| connection.is_readable())
            .map(|(id, _)| id)
        else {
            return;
        };

        let received = match self.session.registry_mut().get_mut(id) {
            Some(connection) => connection.receive(),
            None => return,
        };

        match received {
            Ok(Some(message)) => {
                debug!("Client {} sent {}", id, message.kind());
                handler::dispatch(&mut self.session, id, message);
            }
            Ok(None) => {}
            Err(ConnectionError::Codec(e)) => {
                warn!("Undecodable record from client {}: {}", id, e);
                self.session.disconnect(id);
            }
            Err(e) => {
                info!("Dropping client {}: {}", id, e);
                self.session.disconnect(id);
            }
        }
    }
}

/// Tells a client there is no room and closes the connection.
fn reject(mut stream: TcpStream, peer: SocketAddr, reason: CapacityError) {
    warn!("Rejecting connection from {}: {}", peer, reason);

    let record = match shared::encode(&Message::rejected()) {
        Ok(record) => record,
        Err(e) => {
            error!("Failed to encode rejection: {}", e);
            return;
        }
    };
    match stream.write(&record) {
        Ok(sent) if sent == record.len() => {}
        Ok(sent) => warn!("Only {} bytes of the rejection reached {}", sent, peer),
        Err(e) => warn!("Failed to send rejection to {}: {}", peer, e),
    }
}
