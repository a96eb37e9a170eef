//! Subscription intent bookkeeping: pending requests and confirmed
//! memberships.

use std::collections::HashSet;

use hawser_core::ids::ContractId;
use hawser_core::message::Message;

/// Tracks what the client asked for and what the hub acknowledged.
///
/// An identifier sits in at most one pending set at a time; asking for the
/// opposite cancels the not-yet-sent intent. Confirmed membership changes
/// only on a `success` response.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionLedger {
    confirmed: HashSet<ContractId>,
    pending_subs: HashSet<ContractId>,
    pending_unsubs: HashSet<ContractId>,
}

impl SubscriptionLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record the intent to subscribe. Returns whether a `sub` frame should
    /// go out now (false when an identical request is already pending).
    pub(crate) fn request_sub(&mut self, contract_id: &ContractId) -> bool {
        let send_now = !self.pending_subs.contains(contract_id);
        let _ = self.pending_unsubs.remove(contract_id);
        let _ = self.pending_subs.insert(contract_id.clone());
        send_now
    }

    /// Record the intent to unsubscribe, mirroring
    /// [`request_sub`](Self::request_sub).
    pub(crate) fn request_unsub(&mut self, contract_id: &ContractId) -> bool {
        let send_now = !self.pending_unsubs.contains(contract_id);
        let _ = self.pending_subs.remove(contract_id);
        let _ = self.pending_unsubs.insert(contract_id.clone());
        send_now
    }

    /// The hub acknowledged a subscription.
    pub(crate) fn confirm_sub(&mut self, contract_id: &ContractId) {
        let _ = self.pending_subs.remove(contract_id);
        let _ = self.confirmed.insert(contract_id.clone());
    }

    /// The hub acknowledged an unsubscription.
    pub(crate) fn confirm_unsub(&mut self, contract_id: &ContractId) {
        let _ = self.pending_unsubs.remove(contract_id);
        let _ = self.confirmed.remove(contract_id);
    }

    /// Requests to replay on a fresh socket: everything still unacknowledged.
    pub(crate) fn resend_queue(&self) -> Vec<Message> {
        let mut queue = Vec::with_capacity(self.pending_subs.len() + self.pending_unsubs.len());
        queue.extend(sorted(&self.pending_subs).into_iter().map(Message::sub_request));
        queue.extend(sorted(&self.pending_unsubs).into_iter().map(Message::unsub_request));
        queue
    }

    pub(crate) fn clear(&mut self) {
        self.confirmed.clear();
        self.pending_subs.clear();
        self.pending_unsubs.clear();
    }

    pub(crate) fn confirmed(&self) -> Vec<ContractId> {
        sorted(&self.confirmed)
    }

    pub(crate) fn pending_subs(&self) -> Vec<ContractId> {
        sorted(&self.pending_subs)
    }

    pub(crate) fn pending_unsubs(&self) -> Vec<ContractId> {
        sorted(&self.pending_unsubs)
    }
}

fn sorted(set: &HashSet<ContractId>) -> Vec<ContractId> {
    let mut ids: Vec<ContractId> = set.iter().cloned().collect();
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    ids
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(s: &str) -> ContractId {
        ContractId::from(s)
    }

    #[test]
    fn first_request_sends_repeat_does_not() {
        let mut ledger = SubscriptionLedger::new();
        assert!(ledger.request_sub(&cid("c1")));
        assert!(!ledger.request_sub(&cid("c1")));
        assert_eq!(ledger.pending_subs(), vec![cid("c1")]);
    }

    #[test]
    fn sub_then_unsub_leaves_only_pending_unsub() {
        let mut ledger = SubscriptionLedger::new();
        assert!(ledger.request_sub(&cid("c1")));
        assert!(ledger.request_unsub(&cid("c1")));
        assert!(ledger.pending_subs().is_empty());
        assert_eq!(ledger.pending_unsubs(), vec![cid("c1")]);
        assert!(ledger.confirmed().is_empty());
    }

    #[test]
    fn unsub_then_sub_cancels_the_unsub() {
        let mut ledger = SubscriptionLedger::new();
        assert!(ledger.request_unsub(&cid("c1")));
        assert!(ledger.request_sub(&cid("c1")));
        assert_eq!(ledger.pending_subs(), vec![cid("c1")]);
        assert!(ledger.pending_unsubs().is_empty());
    }

    #[test]
    fn confirm_sub_moves_pending_to_confirmed() {
        let mut ledger = SubscriptionLedger::new();
        let _ = ledger.request_sub(&cid("c1"));
        ledger.confirm_sub(&cid("c1"));
        assert!(ledger.pending_subs().is_empty());
        assert_eq!(ledger.confirmed(), vec![cid("c1")]);
    }

    #[test]
    fn confirm_unsub_drops_membership() {
        let mut ledger = SubscriptionLedger::new();
        let _ = ledger.request_sub(&cid("c1"));
        ledger.confirm_sub(&cid("c1"));
        let _ = ledger.request_unsub(&cid("c1"));
        ledger.confirm_unsub(&cid("c1"));
        assert!(ledger.confirmed().is_empty());
        assert!(ledger.pending_unsubs().is_empty());
    }

    #[test]
    fn confirmed_membership_untouched_while_requests_pend() {
        let mut ledger = SubscriptionLedger::new();
        let _ = ledger.request_sub(&cid("c1"));
        ledger.confirm_sub(&cid("c1"));
        // A new unsubscribe intent does not eject the confirmed entry.
        let _ = ledger.request_unsub(&cid("c1"));
        assert_eq!(ledger.confirmed(), vec![cid("c1")]);
    }

    #[test]
    fn resend_queue_replays_unacknowledged_requests_only() {
        let mut ledger = SubscriptionLedger::new();
        let _ = ledger.request_sub(&cid("a"));
        ledger.confirm_sub(&cid("a"));
        let _ = ledger.request_sub(&cid("b"));
        let _ = ledger.request_unsub(&cid("z"));

        let queue = ledger.resend_queue();
        assert_eq!(
            queue,
            vec![
                Message::sub_request(cid("b")),
                Message::unsub_request(cid("z")),
            ]
        );
    }

    #[test]
    fn clear_empties_every_set() {
        let mut ledger = SubscriptionLedger::new();
        let _ = ledger.request_sub(&cid("a"));
        ledger.confirm_sub(&cid("a"));
        let _ = ledger.request_sub(&cid("b"));
        let _ = ledger.request_unsub(&cid("c"));
        ledger.clear();
        assert!(ledger.confirmed().is_empty());
        assert!(ledger.pending_subs().is_empty());
        assert!(ledger.pending_unsubs().is_empty());
        assert!(ledger.resend_queue().is_empty());
    }
}
