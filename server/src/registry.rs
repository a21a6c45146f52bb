//! Connection registry for the game server
//!
//! Connections live in a fixed table of identity slots. Two independent limits
//! apply: how many connections may be active at once, and how many identities
//! exist at all. With the default allocation policy a freed identity is handed
//! out again, so the identity limit only matters under the monotonic policy,
//! where every identity is used once and the table slowly fills up as clients
//! come and go.

use crate::connection::Connection;
use crate::error::CapacityError;
use log::debug;
use shared::ClientId;

pub const DEFAULT_MAX_CONNECTIONS: usize = 9;
pub const DEFAULT_IDENTITY_SPACE: usize = 25;
/// Upper bound for the identity space, identities must fit the wire type.
pub const MAX_IDENTITY_SPACE: usize = 100;

/// How identities are picked for new connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationPolicy {
    /// Reuse the lowest identity not currently held.
    #[default]
    LowestFree,
    /// Never hand out an identity twice.
    Monotonic,
}

/// Fixed-capacity table of connections indexed by client identity
///
/// Identities start at 1. Iteration is always in ascending identity order,
/// which the game relies on for turn order and broadcast order.
pub struct Registry<S> {
    slots: Vec<Option<Connection<S>>>,
    active: usize,
    max_connections: usize,
    policy: AllocationPolicy,
    /// Next never-used slot index for the monotonic policy
    next_unused: usize,
}

impl<S> Registry<S> {
    pub fn new(max_connections: usize, identity_space: usize, policy: AllocationPolicy) -> Self {
        let identity_space = identity_space.min(MAX_IDENTITY_SPACE);
        Self {
            slots: (0..identity_space).map(|_| None).collect(),
            active: 0,
            max_connections,
            policy,
            next_unused: 0,
        }
    }

    /// Fails when the active-connection limit is reached.
    pub fn check_room(&self) -> Result<(), CapacityError> {
        if self.active >= self.max_connections {
            return Err(CapacityError::ConnectionLimit(self.max_connections));
        }
        Ok(())
    }

    /// Picks the identity for the next connection. Under the monotonic policy
    /// the identity is consumed even if it is never inserted.
    pub fn allocate(&mut self) -> Result<ClientId, CapacityError> {
        let exhausted = CapacityError::IdentitySpace(self.slots.len());

        let index = match self.policy {
            AllocationPolicy::LowestFree => self
                .slots
                .iter()
                .position(Option::is_none)
                .ok_or(exhausted)?,
            AllocationPolicy::Monotonic => {
                if self.next_unused >= self.slots.len() {
                    return Err(exhausted);
                }
                self.next_unused += 1;
                self.next_unused - 1
            }
        };

        Ok(Self::identity(index))
    }

    /// Checks both limits and picks the identity the next connection will be
    /// stored under.
    pub fn reserve(&mut self) -> Result<ClientId, CapacityError> {
        self.check_room()?;
        self.allocate()
    }

    /// Stores a connection under an identity obtained from `reserve`.
    pub fn occupy(&mut self, id: ClientId, connection: Connection<S>) {
        let Some(slot) = Self::index(id).and_then(|index| self.slots.get_mut(index)) else {
            return;
        };
        if slot.replace(connection).is_none() {
            self.active += 1;
        }
        debug!("Registered client {} ({} active)", id, self.active);
    }

    /// Checks both limits, allocates an identity and stores the connection.
    pub fn insert(&mut self, connection: Connection<S>) -> Result<ClientId, CapacityError> {
        let id = self.reserve()?;
        self.occupy(id, connection);
        Ok(id)
    }

    /// Frees the slot and hands the connection back for dropping.
    pub fn remove(&mut self, id: ClientId) -> Option<Connection<S>> {
        let connection = Self::index(id)
            .and_then(|index| self.slots.get_mut(index))
            .and_then(Option::take)?;
        self.active -= 1;
        Some(connection)
    }

    pub fn get(&self, id: ClientId) -> Option<&Connection<S>> {
        Self::index(id)
            .and_then(|index| self.slots.get(index))
            .and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut Connection<S>> {
        Self::index(id)
            .and_then(|index| self.slots.get_mut(index))
            .and_then(Option::as_mut)
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.get(id).is_some()
    }

    /// Identities of all active connections, ascending.
    pub fn ids(&self) -> Vec<ClientId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClientId, &Connection<S>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|conn| (Self::identity(index), conn)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ClientId, &mut Connection<S>)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_mut().map(|conn| (Self::identity(index), conn)))
    }

    /// Number of active connections.
    pub fn len(&self) -> usize {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    pub fn identity_space(&self) -> usize {
        self.slots.len()
    }

    fn identity(index: usize) -> ClientId {
        (index + 1) as ClientId
    }

    fn index(id: ClientId) -> Option<usize> {
        if id < 1 {
            return None;
        }
        Some(id as usize - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockStream;

    fn conn() -> Connection<MockStream> {
        Connection::new(MockStream::default())
    }

    #[test]
    fn test_registry_creation() {
        let registry: Registry<MockStream> = Registry::new(9, 25, AllocationPolicy::LowestFree);
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.max_connections(), 9);
        assert_eq!(registry.identity_space(), 25);
    }

    #[test]
    fn test_insert_assigns_ascending_identities() {
        let mut registry = Registry::new(3, 25, AllocationPolicy::LowestFree);
        assert_eq!(registry.insert(conn()).unwrap(), 1);
        assert_eq!(registry.insert(conn()).unwrap(), 2);
        assert_eq!(registry.insert(conn()).unwrap(), 3);
        assert_eq!(registry.ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_connection_limit() {
        let mut registry = Registry::new(2, 25, AllocationPolicy::LowestFree);
        registry.insert(conn()).unwrap();
        registry.insert(conn()).unwrap();

        assert_eq!(
            registry.check_room(),
            Err(CapacityError::ConnectionLimit(2))
        );
        assert_eq!(
            registry.insert(conn()).unwrap_err(),
            CapacityError::ConnectionLimit(2)
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lowest_free_reuses_identities() {
        let mut registry = Registry::new(3, 25, AllocationPolicy::LowestFree);
        registry.insert(conn()).unwrap();
        registry.insert(conn()).unwrap();
        registry.insert(conn()).unwrap();

        assert!(registry.remove(2).is_some());
        assert!(!registry.contains(2));
        assert_eq!(registry.insert(conn()).unwrap(), 2);
    }

    #[test]
    fn test_monotonic_exhausts_identity_space() {
        let mut registry = Registry::new(2, 3, AllocationPolicy::Monotonic);
        assert_eq!(registry.insert(conn()).unwrap(), 1);
        registry.remove(1);
        assert_eq!(registry.insert(conn()).unwrap(), 2);
        registry.remove(2);
        assert_eq!(registry.insert(conn()).unwrap(), 3);
        registry.remove(3);

        // Plenty of connection room, but no identities left
        assert!(registry.check_room().is_ok());
        assert_eq!(
            registry.insert(conn()).unwrap_err(),
            CapacityError::IdentitySpace(3)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_identity_space_limit_with_reuse() {
        let mut registry = Registry::new(5, 2, AllocationPolicy::LowestFree);
        registry.insert(conn()).unwrap();
        registry.insert(conn()).unwrap();
        assert_eq!(
            registry.insert(conn()).unwrap_err(),
            CapacityError::IdentitySpace(2)
        );
    }

    #[test]
    fn test_remove_nonexistent() {
        let mut registry: Registry<MockStream> = Registry::new(2, 25, AllocationPolicy::LowestFree);
        assert!(registry.remove(7).is_none());
        assert!(registry.remove(-1).is_none());
        assert!(registry.remove(100).is_none());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_iteration_is_ascending() {
        let mut registry = Registry::new(5, 25, AllocationPolicy::LowestFree);
        for _ in 0..5 {
            registry.insert(conn()).unwrap();
        }
        registry.remove(1);
        registry.remove(4);

        let ids: Vec<ClientId> = registry.iter_mut().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 3, 5]);
        assert!(registry.get(3).is_some());
        assert!(registry.get_mut(4).is_none());
    }
}
