//! Game session: every live connection together with the game they share.
//!
//! The session is the only place that changes membership. Admitting a client
//! seats it in the game and sends its welcome; dropping a client frees its slot
//! and reshuffles roles. Status broadcasts are deferred until the event loop
//! asks for them, so several changes in one iteration produce one broadcast.

use crate::connection::Connection;
use crate::error::CapacityError;
use crate::game::GameState;
use crate::registry::Registry;
use log::{debug, info, warn};
use shared::{ClientId, Message};
use std::io::Write;

pub struct Session<S> {
    registry: Registry<S>,
    game: GameState,
    /// A turn was processed since the last broadcast
    turn_done: bool,
    /// Some client's role changed since the last broadcast
    status_needed: bool,
}

impl<S> Session<S> {
    pub fn new(registry: Registry<S>, game: GameState) -> Self {
        Self {
            registry,
            game,
            turn_done: false,
            status_needed: false,
        }
    }

    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<S> {
        &mut self.registry
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut GameState {
        &mut self.game
    }

    pub fn mark_turn_done(&mut self) {
        self.turn_done = true;
    }

    pub fn needs_broadcast(&self) -> bool {
        self.turn_done || self.status_needed
    }

    /// The game is over and everybody has left.
    pub fn finished(&self) -> bool {
        self.game.is_finished() && self.registry.is_empty()
    }

    /// Drops a client. Does nothing if it is already gone.
    pub fn disconnect(&mut self, id: ClientId) -> Option<Connection<S>> {
        let connection = self.registry.remove(id)?;
        self.game.leave(id);
        self.status_needed = true;
        info!(
            "Client {} disconnected ({} connections remaining)",
            id,
            self.registry.len()
        );
        Some(connection)
    }
}

impl<S: Write> Session<S> {
    /// Registers a new client, seats it and queues its welcome and first
    /// status. When there is no room the stream is handed back so the caller
    /// can reject it.
    pub fn admit(&mut self, stream: S) -> Result<ClientId, (CapacityError, S)> {
        let id = match self.registry.reserve() {
            Ok(id) => id,
            Err(err) => return Err((err, stream)),
        };
        self.registry.occupy(id, Connection::new(stream));

        let holder_before = self.game.current_turn();
        let role = self.game.join(id);
        let holder_after = self.game.current_turn();
        if holder_after != holder_before && holder_after != Some(id) {
            self.status_needed = true;
        }
        info!("Client {} connected as {:?}", id, role);

        let welcome = Message::Welcome {
            variant: Some(self.game.variant()),
            capacity: self.game.capacity() as i8,
            identity: id,
            role,
        };
        if self.send(id, &welcome) {
            if let Some(status) = self.game.status_for(id) {
                self.send(id, &status);
            }
        }
        Ok(id)
    }

    /// Queues a message for one client, dropping the client if that fails.
    /// Returns whether the message was queued.
    pub fn send(&mut self, id: ClientId, message: &Message) -> bool {
        let Some(connection) = self.registry.get_mut(id) else {
            return false;
        };
        match connection.enqueue(message) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to queue {} for client {}: {}", message.kind(), id, e);
                self.disconnect(id);
                false
            }
        }
    }

    /// Sends every client its own status if anything changed since the last
    /// broadcast. Clients that cannot take it are dropped, and the broadcast
    /// repeats until the roles stop changing.
    pub fn broadcast_status(&mut self) {
        while self.needs_broadcast() {
            self.turn_done = false;
            self.status_needed = false;

            let mut failed = Vec::new();
            for (id, connection) in self.registry.iter_mut() {
                let Some(status) = self.game.status_for(id) else {
                    continue;
                };
                if let Err(e) = connection.enqueue(&status) {
                    warn!("Failed to queue status for client {}: {}", id, e);
                    failed.push(id);
                }
            }
            debug!("Broadcast status to {} clients", self.registry.len());

            for id in failed {
                self.disconnect(id);
            }
        }
    }

    /// Flushes every connection that is writable and has something queued.
    /// Connections whose socket fails are dropped.
    pub fn flush_ready(&mut self) {
        let mut failed = Vec::new();
        for (id, connection) in self.registry.iter_mut() {
            if !connection.is_writable() || !connection.has_outbound() {
                continue;
            }
            if let Err(e) = connection.flush() {
                warn!("Write to client {} failed: {}", id, e);
                failed.push(id);
            }
        }
        for id in failed {
            self.disconnect(id);
        }
    }
}
