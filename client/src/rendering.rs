//! Text shown to the player for each server message.

use shared::{ChatText, ClientId, GameVariant, Outcome, Role, TurnResult, HEAP_COUNT};

pub const YOUR_TURN: &str = "Your turn:";
pub const NOW_PLAYING: &str = "You are now playing!";
pub const REJECTED: &str = "Client rejected: too many clients are already connected";
pub const DISCONNECTED: &str = "Disconnected from server";

pub fn welcome(variant: GameVariant, capacity: i8, identity: ClientId, role: Role) -> Vec<String> {
    let seat = if role.is_player() {
        "You are playing"
    } else {
        "You are only viewing"
    };
    vec![
        format!("This is a {} game", variant),
        format!("Number of players is {}", capacity),
        format!("You are client {}", identity),
        seat.to_string(),
    ]
}

pub fn heaps(heaps: &[u16; HEAP_COUNT]) -> String {
    let sizes: Vec<String> = heaps.iter().map(u16::to_string).collect();
    format!("Heap sizes are {}", sizes.join(", "))
}

pub fn turn_result(result: TurnResult) -> &'static str {
    match result {
        TurnResult::Legal => "Move accepted",
        TurnResult::Illegal => "Illegal move",
        TurnResult::NotYourTurn => "Move rejected: this is not your turn",
    }
}

pub fn chat(source: ClientId, text: &ChatText) -> String {
    format!("{}: {}", source, text)
}

/// Final line of a finished game.
pub fn outcome(outcome: Outcome) -> Option<&'static str> {
    match outcome {
        Outcome::Win => Some("You win!"),
        Outcome::Lose => Some("You lose!"),
        Outcome::Watched => Some("Game over!"),
        Outcome::NotFinished => None,
    }
}
