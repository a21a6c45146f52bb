//! # Nim Game Server Library
//!
//! This library provides the authoritative server for multiplayer Nim. It owns
//! the four heaps, decides whose turn it is, validates every move and keeps
//! each connected client informed of the game from its own point of view.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Game State
//! All moves are validated and applied here. Clients only ever see the heaps
//! through `Status` messages, which carry each client's own role and, once the
//! game has ended, its outcome.
//!
//! ### Client Management
//! Handles the complete lifecycle of client connections:
//! - Identity assignment under a connection limit and an identity space
//! - Seating as player or spectator, and promotion when a player leaves
//! - Rejection of connections beyond capacity
//! - Disconnection on socket errors, stalled peers and malformed records
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! One thread drives every socket through a single `mio::Poll`. There are no
//! locks and no per-client tasks; each iteration does a bounded amount of
//! work, so one busy client cannot monopolise the server.
//!
//! ### Fixed-Size Records over TCP
//! Every message is one `shared::RECORD_SIZE` byte record. Connections
//! reassemble records from partial reads and stage writes in a bounded
//! outbound queue, so a slow reader is dropped rather than growing memory.
//!
//! ## Module Organization
//!
//! - `buffer`: bounded byte queue used for both directions of a connection
//! - `connection`: one non-blocking socket with its inbound and outbound queues
//! - `registry`: identity slots and allocation policies
//! - `game`: heaps, seats, turn order, move validation and outcomes
//! - `session`: admission, disconnection and status broadcasts
//! - `handler`: interpretation of chat and turn requests
//! - `network`: the readiness loop tying everything to real sockets
//! - `config`: command line and validated server configuration
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//! use shared::GameVariant;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Two players, heaps of ten, regular rules, default port
//!     let config = ServerConfig::new(2, 10, GameVariant::Normal)?;
//!     let server = Server::bind(&config)?;
//!
//!     // Returns once the game is over and every client has left
//!     server.run()?;
//!     Ok(())
//! }
//! ```

pub mod buffer;
pub mod config;
pub mod connection;
pub mod error;
pub mod game;
pub mod handler;
pub mod network;
pub mod registry;
pub mod session;

#[cfg(test)]
mod testing;
