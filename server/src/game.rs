//! Authoritative Nim game state: heaps, seats and turn order.
//!
//! Roles are derived rather than stored: every seated client is either a
//! player or a spectator, and at most one player holds the turn. Keeping the
//! turn in a single field makes "exactly one current-turn holder" hold by
//! construction.

use log::{debug, info};
use shared::{ClientId, GameVariant, Message, Outcome, Role, TurnResult, HEAP_COUNT, MAX_TAKE};
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seat {
    Player,
    Spectator,
}

/// Whether taking `amount` from heap `heap` is allowed.
pub fn is_legal(heap: i8, amount: i16, heaps: &[u16; HEAP_COUNT]) -> bool {
    if heap < 0 || heap as usize >= HEAP_COUNT {
        return false;
    }
    if amount <= 0 || amount > MAX_TAKE {
        return false;
    }
    heaps[heap as usize] >= amount as u16
}

#[derive(Debug, Clone)]
pub struct GameState {
    heaps: [u16; HEAP_COUNT],
    variant: GameVariant,
    capacity: usize,
    seats: BTreeMap<ClientId, Seat>,
    turn: Option<ClientId>,
    /// Player whose move emptied the last heap
    last_mover: Option<ClientId>,
}

impl GameState {
    pub fn new(heap_size: u16, variant: GameVariant, capacity: usize) -> Self {
        Self {
            heaps: [heap_size; HEAP_COUNT],
            variant,
            capacity,
            seats: BTreeMap::new(),
            turn: None,
            last_mover: None,
        }
    }

    pub fn heaps(&self) -> [u16; HEAP_COUNT] {
        self.heaps
    }

    pub fn variant(&self) -> GameVariant {
        self.variant
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_finished(&self) -> bool {
        self.heaps.iter().all(|&heap| heap == 0)
    }

    pub fn current_turn(&self) -> Option<ClientId> {
        self.turn
    }

    pub fn last_mover(&self) -> Option<ClientId> {
        self.last_mover
    }

    pub fn player_count(&self) -> usize {
        self.seats.values().filter(|&&seat| seat == Seat::Player).count()
    }

    pub fn role(&self, id: ClientId) -> Option<Role> {
        let seat = self.seats.get(&id)?;
        Some(match seat {
            Seat::Spectator => Role::Spectator,
            Seat::Player if self.turn == Some(id) => Role::CurrentTurn,
            Seat::Player => Role::Waiting,
        })
    }

    /// Seats a new client. It plays if there is room, otherwise it watches.
    pub fn join(&mut self, id: ClientId) -> Role {
        let seat = if self.player_count() < self.capacity {
            Seat::Player
        } else {
            Seat::Spectator
        };
        self.seats.insert(id, seat);
        self.fill_vacant_turn();

        let role = self.role(id).unwrap_or(Role::Spectator);
        debug!("Client {} joined as {:?}", id, role);
        role
    }

    /// Removes a client, refilling player seats from the spectators and
    /// passing the turn on if the client held it. Returns false if the client
    /// was not seated.
    pub fn leave(&mut self, id: ClientId) -> bool {
        if self.seats.remove(&id).is_none() {
            return false;
        }

        self.promote_spectators();
        if self.turn == Some(id) {
            self.turn = None;
            self.pass_turn_after(id);
        }
        self.fill_vacant_turn();
        true
    }

    /// Applies a move from `id`. Any move by the turn holder, legal or not,
    /// uses up the turn.
    pub fn play(&mut self, id: ClientId, heap: i8, amount: i16) -> TurnResult {
        if self.turn != Some(id) {
            return TurnResult::NotYourTurn;
        }

        let result = if is_legal(heap, amount, &self.heaps) {
            self.heaps[heap as usize] -= amount as u16;
            debug!("Client {} took {} from heap {}: {:?}", id, amount, heap, self.heaps);
            TurnResult::Legal
        } else {
            debug!("Client {} made an illegal move ({}, {})", id, heap, amount);
            TurnResult::Illegal
        };

        self.turn = None;
        if self.is_finished() {
            self.last_mover = Some(id);
            info!("Game over, client {} took the last unit", id);
        } else {
            self.pass_turn_after(id);
        }
        result
    }

    /// End-of-game outcome as seen by `id`.
    pub fn outcome(&self, id: ClientId) -> Outcome {
        if !self.is_finished() {
            return Outcome::NotFinished;
        }
        match self.seats.get(&id) {
            Some(Seat::Player) => {
                let took_last = self.last_mover == Some(id);
                match (self.variant, took_last) {
                    (GameVariant::Normal, true) | (GameVariant::Misere, false) => Outcome::Lose,
                    (GameVariant::Normal, false) | (GameVariant::Misere, true) => Outcome::Win,
                }
            }
            Some(Seat::Spectator) | None => Outcome::Watched,
        }
    }

    /// Status message describing the game from `id`'s point of view.
    pub fn status_for(&self, id: ClientId) -> Option<Message> {
        Some(Message::Status {
            heaps: self.heaps,
            role: self.role(id)?,
            outcome: self.outcome(id),
        })
    }

    fn promote_spectators(&mut self) {
        let mut players = self.player_count();
        for (id, seat) in self.seats.iter_mut() {
            if players >= self.capacity {
                break;
            }
            if *seat == Seat::Spectator {
                *seat = Seat::Player;
                players += 1;
                info!("Spectator {} promoted to player", id);
            }
        }
    }

    /// Gives the turn to the first player after `previous` in identity order,
    /// wrapping around. `previous` itself comes last if it is still seated.
    fn pass_turn_after(&mut self, previous: ClientId) {
        let after = self.seats.range((Excluded(previous), Unbounded));
        let before = self.seats.range(..=previous);
        self.turn = after
            .chain(before)
            .find(|(_, &seat)| seat == Seat::Player)
            .map(|(&id, _)| id);
    }

    fn fill_vacant_turn(&mut self) {
        if self.turn.is_some() || self.is_finished() {
            return;
        }
        self.turn = self
            .seats
            .iter()
            .find(|(_, &seat)| seat == Seat::Player)
            .map(|(&id, _)| id);
    }
}
