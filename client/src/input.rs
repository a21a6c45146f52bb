//! Parsing of the lines a player types into protocol messages

use shared::{ChatText, ClientId, Message, BROADCAST};

/// Heap and amount sent for a line that could not be understood. The server
/// treats it like any other illegal move.
pub const INVALID_HEAP: i8 = 25;
pub const INVALID_AMOUNT: i16 = -1;

const HEAP_LETTERS: &str = "ABCD";
const CHAT_PREFIX: &str = "MSG ";
const QUIT: &str = "Q";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `<heap letter> <amount>`, e.g. `B 3`
    Turn { heap: i8, amount: i16 },
    /// `MSG <id> <text>`, id -1 reaches everybody
    Chat { destination: ClientId, text: ChatText },
    Quit,
    Invalid,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);

        if line == QUIT {
            return Command::Quit;
        }
        if let Some(rest) = line.strip_prefix(CHAT_PREFIX) {
            return Self::parse_chat(rest);
        }
        Self::parse_turn(line)
    }

    fn parse_chat(rest: &str) -> Self {
        let Some((destination, text)) = rest.split_once(' ') else {
            return Command::Invalid;
        };
        match destination.parse::<ClientId>() {
            Ok(destination) if destination > 0 || destination == BROADCAST => Command::Chat {
                destination,
                text: ChatText::truncated(text),
            },
            _ => Command::Invalid,
        }
    }

    fn parse_turn(line: &str) -> Self {
        let Some((letter, amount)) = line.split_once(' ') else {
            return Command::Invalid;
        };

        let mut chars = letter.chars();
        let (Some(letter), None) = (chars.next(), chars.next()) else {
            return Command::Invalid;
        };
        let Some(heap) = HEAP_LETTERS.find(letter.to_ascii_uppercase()) else {
            return Command::Invalid;
        };

        match amount.trim().parse::<i16>() {
            Ok(amount) => Command::Turn {
                heap: heap as i8,
                amount,
            },
            Err(_) => Command::Invalid,
        }
    }

    /// Message to send for this command, `None` for quitting.
    pub fn to_message(&self, identity: ClientId) -> Option<Message> {
        match self {
            Command::Turn { heap, amount } => Some(Message::TurnRequest {
                heap: *heap,
                amount: *amount,
            }),
            Command::Chat { destination, text } => Some(Message::Chat {
                source: identity,
                destination: *destination,
                text: text.clone(),
            }),
            Command::Invalid => Some(Message::TurnRequest {
                heap: INVALID_HEAP,
                amount: INVALID_AMOUNT,
            }),
            Command::Quit => None,
        }
    }
}
