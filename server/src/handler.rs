//! Dispatch of decoded client messages.

use crate::session::Session;
use log::debug;
use shared::{ChatText, ClientId, Message, TurnResult, BROADCAST};
use std::io::Write;

/// Handles one message from `sender`. Replies and relayed chat are only
/// queued; the event loop flushes them.
pub fn dispatch<S: Write>(session: &mut Session<S>, sender: ClientId, message: Message) {
    match message {
        Message::Chat {
            destination, text, ..
        } => relay_chat(session, sender, destination, text),
        Message::TurnRequest { heap, amount } => {
            let result = session.game_mut().play(sender, heap, amount);
            if result != TurnResult::NotYourTurn {
                session.mark_turn_done();
            }
            session.send(sender, &Message::TurnResponse { result });
        }
        other => {
            debug!("Client {} sent unexpected {}", sender, other.kind());
            session.send(
                sender,
                &Message::TurnResponse {
                    result: TurnResult::NotYourTurn,
                },
            );
        }
    }
}

fn relay_chat<S: Write>(
    session: &mut Session<S>,
    sender: ClientId,
    destination: ClientId,
    text: ChatText,
) {
    let recipients = if destination == BROADCAST {
        session.registry().ids()
    } else if session.registry().contains(destination) {
        vec![destination]
    } else {
        debug!("Chat from {} to unknown client {} dropped", sender, destination);
        return;
    };

    debug!("Chat from {} to {} recipients", sender, recipients.len());
    let chat = Message::Chat {
        source: sender,
        destination,
        text,
    };
    for id in recipients {
        session.send(id, &chat);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;
    use crate::registry::{AllocationPolicy, Registry};
    use crate::testing::MockStream;
    use shared::{GameVariant, Role};

    fn session_with(clients: usize, players: usize) -> Session<MockStream> {
        let mut session = Session::new(
            Registry::new(9, 25, AllocationPolicy::LowestFree),
            GameState::new(3, GameVariant::Normal, players),
        );
        for _ in 0..clients {
            session.admit(MockStream::default()).unwrap();
        }
        for id in session.registry().ids() {
            inbox(&mut session, id);
        }
        session
    }

    fn inbox(session: &mut Session<MockStream>, id: ClientId) -> Vec<Message> {
        let conn = session.registry_mut().get_mut(id).unwrap();
        conn.mark_writable();
        while conn.has_outbound() {
            conn.flush().unwrap();
        }
        let messages = conn.stream().messages();
        conn.stream_mut().written.clear();
        messages
    }

    fn chat(destination: ClientId, text: &str) -> Message {
        Message::Chat {
            source: 0,
            destination,
            text: ChatText::new(text).unwrap(),
        }
    }

    #[test]
    fn test_direct_chat_reaches_only_destination() {
        let mut session = session_with(5, 2);

        dispatch(&mut session, 5, chat(3, "hi"));

        for id in [1, 2, 4, 5] {
            assert!(inbox(&mut session, id).is_empty(), "client {}", id);
        }
        assert_eq!(
            inbox(&mut session, 3),
            vec![Message::Chat {
                source: 5,
                destination: 3,
                text: ChatText::new("hi").unwrap(),
            }]
        );
    }

    #[test]
    fn test_broadcast_chat_includes_sender() {
        let mut session = session_with(5, 2);

        dispatch(&mut session, 5, chat(BROADCAST, "all"));

        for id in 1..=5 {
            let received = inbox(&mut session, id);
            assert_eq!(received.len(), 1, "client {}", id);
            assert!(matches!(
                received[0],
                Message::Chat {
                    source: 5,
                    destination: BROADCAST,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_chat_to_missing_client_is_dropped() {
        let mut session = session_with(2, 2);
        dispatch(&mut session, 1, chat(7, "anyone?"));
        assert!(inbox(&mut session, 1).is_empty());
        assert!(inbox(&mut session, 2).is_empty());
    }

    #[test]
    fn test_turn_request_from_holder() {
        let mut session = session_with(2, 2);

        dispatch(&mut session, 1, Message::TurnRequest { heap: 0, amount: 3 });

        assert_eq!(
            inbox(&mut session, 1),
            vec![Message::TurnResponse {
                result: TurnResult::Legal
            }]
        );
        assert!(session.needs_broadcast());
        assert_eq!(session.game().heaps(), [0, 3, 3, 3]);
        assert_eq!(session.game().role(2), Some(Role::CurrentTurn));
    }

    #[test]
    fn test_illegal_turn_completes_turn() {
        let mut session = session_with(2, 2);

        dispatch(&mut session, 1, Message::TurnRequest { heap: 25, amount: -1 });

        assert_eq!(
            inbox(&mut session, 1),
            vec![Message::TurnResponse {
                result: TurnResult::Illegal
            }]
        );
        assert!(session.needs_broadcast());
        assert_eq!(session.game().current_turn(), Some(2));
    }

    #[test]
    fn test_turn_request_out_of_turn() {
        let mut session = session_with(3, 2);

        dispatch(&mut session, 3, Message::TurnRequest { heap: 0, amount: 1 });

        assert_eq!(
            inbox(&mut session, 3),
            vec![Message::TurnResponse {
                result: TurnResult::NotYourTurn
            }]
        );
        assert!(!session.needs_broadcast());
        assert_eq!(session.game().heaps(), [3, 3, 3, 3]);
    }

    #[test]
    fn test_unexpected_message_kind() {
        let mut session = session_with(1, 2);

        dispatch(
            &mut session,
            1,
            Message::TurnResponse {
                result: TurnResult::Legal,
            },
        );

        assert_eq!(
            inbox(&mut session, 1),
            vec![Message::TurnResponse {
                result: TurnResult::NotYourTurn
            }]
        );
        assert_eq!(session.game().current_turn(), Some(1));
    }
}
