//! # Nim Game Client Library
//!
//! This library provides the interactive terminal client for multiplayer Nim.
//! It connects to a game server over TCP, turns typed commands into protocol
//! messages and prints what the server reports back.
//!
//! ## Architecture Overview
//!
//! The client is a single tokio task that waits on two sources at once: whole
//! records arriving from the server and lines typed by the player. The server
//! is authoritative; the client keeps only its own identity and whether it is
//! currently watching, which it needs to announce a promotion to player.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Applies server messages to the local view and decides when the session is
//! over (rejection or end of game).
//!
//! ### Input Module (`input`)
//! Parses player commands:
//! - `A 3` takes three from heap A (heaps A to D)
//! - `MSG 2 hello` chats with client 2, `MSG -1 hello` with everybody
//! - `Q` quits
//!
//! Lines that match none of these are still sent, as a move the server will
//! reject as illegal.
//!
//! ### Network Module (`network`)
//! Record framing over the TCP stream and the main client loop.
//!
//! ### Rendering Module (`rendering`)
//! The text printed for each kind of server message.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::{Client, Ending};
//! use tokio::io::BufReader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("127.0.0.1", 6325).await?;
//!
//!     let input = BufReader::new(tokio::io::stdin());
//!     let ending = client.run(input, &mut std::io::stdout()).await?;
//!     if ending == Ending::Disconnected {
//!         println!("Disconnected from server");
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
