// Path: crates/state/src/statekey.rs

//! State-key construction for the keyed trie.
//!
//! Every world-state component is addressed by a 31-octet key whose first
//! octet is the component index; service-local entries blend the service
//! identifier into the following octets. These constructors are the single
//! source of truth for key layout, so no other module hand-assembles keys.

use marmalade_types::primitives::ServiceId;

/// The length of a state key, in octets.
pub const STATE_KEY_LEN: usize = 31;

/// A 31-octet trie key.
pub type StateKey = [u8; STATE_KEY_LEN];

/// Component indices, in the canonical ordering the merklization relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Component {
    /// Per-core eligible authorizer pools.
    AuthPool = 1,
    /// Per-core pending authorizer queues.
    AuthQueue = 2,
    /// Recent block history and the accumulation-log commitment.
    Recent = 3,
    /// The Safrole component: pending set, ring root, seal keys, accumulator.
    Safrole = 4,
    /// The entropy pool.
    Entropy = 5,
    /// Validators staged to become active next epoch.
    StagingSet = 6,
    /// Validators eligible to author this epoch.
    ActiveSet = 7,
    /// Validators of the previous epoch.
    PreviousSet = 8,
    /// Per-core work reports pending availability.
    Reports = 9,
    /// The most recent accumulation output root.
    LastAccOut = 10,
    /// The timeslot of the most recent imported block.
    TheTime = 11,
    /// Privileged service identifiers.
    Privileges = 12,
    /// Service accounts.
    Accounts = 13,
    /// Dispute verdict sets and offenders.
    Disputes = 14,
    /// Per-validator and per-core activity counters.
    Activity = 15,
    /// Per-core queues of reports ready to accumulate.
    Ready = 16,
    /// Per-slot sets of accumulated work-package hashes.
    Accumulated = 17,
}

impl Component {
    /// All components in canonical order.
    pub const ALL: [Component; 17] = [
        Component::AuthPool,
        Component::AuthQueue,
        Component::Recent,
        Component::Safrole,
        Component::Entropy,
        Component::StagingSet,
        Component::ActiveSet,
        Component::PreviousSet,
        Component::Reports,
        Component::LastAccOut,
        Component::TheTime,
        Component::Privileges,
        Component::Accounts,
        Component::Disputes,
        Component::Activity,
        Component::Ready,
        Component::Accumulated,
    ];

    /// The component's index octet.
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// The trie key of a top-level component.
pub fn component_key(component: Component) -> StateKey {
    let mut key = [0u8; STATE_KEY_LEN];
    key[0] = component.index();
    key
}

/// The trie key of a single service account within the accounts subtrie.
///
/// The service identifier's little-endian octets are interleaved into the
/// leading key octets so numerically adjacent services spread across the
/// trie.
pub fn service_key(service: ServiceId) -> StateKey {
    let mut key = [0u8; STATE_KEY_LEN];
    key[0] = 255;
    let id = service.0.to_le_bytes();
    key[1] = id[0];
    key[3] = id[1];
    key[5] = id[2];
    key[7] = id[3];
    key
}
