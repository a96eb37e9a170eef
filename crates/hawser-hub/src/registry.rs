//! Bidirectional contract↔socket subscription relation.
//!
//! Both directions of the relation live behind a single lock so every
//! mutation lands on the two sides atomically: a socket appears in a
//! contract's subscriber set if and only if the contract appears in that
//! socket's membership set. Contracts with no remaining subscribers are
//! pruned from the map.

use std::collections::{HashMap, HashSet};

use hawser_core::ids::{ContractId, SocketId};
use parking_lot::RwLock;

#[derive(Default)]
struct Relation {
    /// contract → sockets subscribed to it.
    subscribers: HashMap<ContractId, HashSet<SocketId>>,
    /// socket → contracts it is subscribed to.
    memberships: HashMap<SocketId, HashSet<ContractId>>,
}

/// Tracks which socket is subscribed to which contract log.
#[derive(Default)]
pub struct SubscriberRegistry {
    relation: RwLock<Relation>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the pair to both sides. Returns `false` if it was already present.
    pub fn subscribe(&self, socket_id: &SocketId, contract_id: &ContractId) -> bool {
        let mut relation = self.relation.write();
        let added = relation
            .memberships
            .entry(socket_id.clone())
            .or_default()
            .insert(contract_id.clone());
        if added {
            let _ = relation
                .subscribers
                .entry(contract_id.clone())
                .or_default()
                .insert(socket_id.clone());
        }
        added
    }

    /// Remove the pair from both sides. Returns `false` if it was not present.
    pub fn unsubscribe(&self, socket_id: &SocketId, contract_id: &ContractId) -> bool {
        let mut relation = self.relation.write();
        let mut removed = false;
        let mut membership_emptied = false;
        if let Some(contracts) = relation.memberships.get_mut(socket_id) {
            removed = contracts.remove(contract_id);
            membership_emptied = contracts.is_empty();
        }
        if !removed {
            return false;
        }
        if membership_emptied {
            let _ = relation.memberships.remove(socket_id);
        }
        let mut subscribers_emptied = false;
        if let Some(sockets) = relation.subscribers.get_mut(contract_id) {
            let _ = sockets.remove(socket_id);
            subscribers_emptied = sockets.is_empty();
        }
        if subscribers_emptied {
            let _ = relation.subscribers.remove(contract_id);
        }
        true
    }

    /// Remove the socket from every contract it was subscribed to.
    ///
    /// Returns each removed contract together with the subscribers that
    /// remain, which is exactly what the departure notifications need.
    pub fn drop_socket(&self, socket_id: &SocketId) -> Vec<(ContractId, Vec<SocketId>)> {
        let mut relation = self.relation.write();
        let Some(contracts) = relation.memberships.remove(socket_id) else {
            return Vec::new();
        };
        let mut departed = Vec::with_capacity(contracts.len());
        for contract_id in contracts {
            let mut remaining = Vec::new();
            let mut emptied = false;
            if let Some(sockets) = relation.subscribers.get_mut(&contract_id) {
                let _ = sockets.remove(socket_id);
                remaining = sockets.iter().cloned().collect();
                emptied = sockets.is_empty();
            }
            if emptied {
                let _ = relation.subscribers.remove(&contract_id);
            }
            departed.push((contract_id, remaining));
        }
        departed
    }

    /// Snapshot of the sockets currently subscribed to a contract.
    #[must_use]
    pub fn subscribers_of(&self, contract_id: &ContractId) -> Vec<SocketId> {
        self.relation
            .read()
            .subscribers
            .get(contract_id)
            .map(|sockets| sockets.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of the contracts a socket is currently subscribed to.
    #[must_use]
    pub fn contracts_of(&self, socket_id: &SocketId) -> Vec<ContractId> {
        self.relation
            .read()
            .memberships
            .get(socket_id)
            .map(|contracts| contracts.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether the pair is currently present.
    #[must_use]
    pub fn is_subscribed(&self, socket_id: &SocketId, contract_id: &ContractId) -> bool {
        self.relation
            .read()
            .memberships
            .get(socket_id)
            .is_some_and(|contracts| contracts.contains(contract_id))
    }

    /// Number of contracts with at least one subscriber.
    #[must_use]
    pub fn contract_count(&self) -> usize {
        self.relation.read().subscribers.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
