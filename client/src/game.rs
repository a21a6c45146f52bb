//! Client-side view of the game, driven by server messages

use crate::rendering;
use log::{debug, info};
use shared::{ClientId, Message, Outcome, Role, INVALID_CLIENT};

/// What the client should do after a server message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Rejected,
    Finished(Outcome),
}

#[derive(Debug, Default)]
pub struct ClientGame {
    identity: Option<ClientId>,
    spectator: bool,
}

impl ClientGame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Own identity, or -1 before the welcome arrived.
    pub fn identity(&self) -> ClientId {
        self.identity.unwrap_or(INVALID_CLIENT)
    }

    pub fn is_spectator(&self) -> bool {
        self.spectator
    }

    /// Applies one server message, appending the text to show to `screen`.
    pub fn apply(&mut self, message: &Message, screen: &mut Vec<String>) -> Progress {
        match message {
            Message::Welcome {
                variant: Some(variant),
                capacity,
                identity,
                role,
            } if !message.is_rejection() => {
                info!("Joined as client {} ({:?})", identity, role);
                self.identity = Some(*identity);
                self.spectator = !role.is_player();
                screen.extend(rendering::welcome(*variant, *capacity, *identity, *role));
            }
            Message::Welcome { .. } => {
                screen.push(rendering::REJECTED.to_string());
                return Progress::Rejected;
            }
            Message::Status {
                heaps,
                role,
                outcome,
            } => {
                screen.push(rendering::heaps(heaps));

                if self.spectator && role.is_player() && *outcome == Outcome::NotFinished {
                    screen.push(rendering::NOW_PLAYING.to_string());
                    self.spectator = false;
                }
                if *role == Role::CurrentTurn {
                    screen.push(rendering::YOUR_TURN.to_string());
                } else if let Some(line) = rendering::outcome(*outcome) {
                    screen.push(line.to_string());
                    return Progress::Finished(*outcome);
                }
            }
            Message::TurnResponse { result } => {
                screen.push(rendering::turn_result(*result).to_string());
            }
            Message::Chat { source, text, .. } => {
                screen.push(rendering::chat(*source, text));
            }
            Message::TurnRequest { .. } => {
                debug!("Ignoring {} from server", message.kind());
            }
        }
        Progress::Continue
    }
}
