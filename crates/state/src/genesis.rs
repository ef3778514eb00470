// Path: crates/state/src/genesis.rs

//! Genesis state construction from a chain spec.
//!
//! The genesis world is the pre-state of the first block: empty pools and
//! queues, a zeroed entropy pool, all four validator sets equal to the
//! genesis keys, and a fallback seal schedule (there was no prior epoch to
//! collect tickets in). The genesis state root computed here is what the
//! first imported block's `priorStateRoot` must equal.

use crate::components::{
    AccumulatedLog, ActivityRecords, AuthPools, AuthQueues, CoreReports, DisputesRecords,
    EntropyPool, ReadyQueues, RecentHistory, SafroleComponent, SealKeys, WorldState,
};
use marmalade_types::config::ChainSpec;
use marmalade_types::primitives::{OpaqueHash, ServiceId};
use marmalade_types::privileges::Privileges;
use marmalade_types::validators::{ValidatorKeys, ValidatorSet};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds the genesis world state.
///
/// `epoch_root` is the Bandersnatch ring commitment over the genesis keys;
/// the caller computes it through its crypto provider since ring math is a
/// capability, not kernel logic.
pub fn genesis_state(
    spec: &ChainSpec,
    validators: &[ValidatorKeys],
    epoch_root: OpaqueHash,
) -> WorldState {
    let count = spec.num_validators as usize;
    let cores = spec.num_cores as usize;
    let set = ValidatorSet::padded(validators.to_vec(), count);
    let entropy = EntropyPool::default();
    let seal_keys = SealKeys::fallback_from_entropy(
        &entropy.entropy2,
        &set.0.iter().map(|keys| keys.bandersnatch).collect::<Vec<_>>(),
        spec.epoch_duration,
    );

    WorldState {
        auth_pool: Arc::new(AuthPools(vec![Vec::new(); cores])),
        auth_queue: Arc::new(AuthQueues(vec![
            vec![OpaqueHash::ZERO; spec.auth_queue_size as usize];
            cores
        ])),
        recent: Arc::new(RecentHistory::default()),
        safrole: Arc::new(SafroleComponent {
            pending_set: set.clone(),
            epoch_root,
            seal_keys,
            ticket_accumulator: Vec::new(),
        }),
        entropy: Arc::new(entropy),
        staging_set: Arc::new(set.clone()),
        active_set: Arc::new(set.clone()),
        previous_set: Arc::new(set),
        reports: Arc::new(CoreReports(vec![None; cores])),
        last_acc_out: OpaqueHash::ZERO,
        the_time: 0,
        privileges: Arc::new(Privileges {
            manager: ServiceId(0),
            delegator: ServiceId(0),
            registrar: ServiceId(0),
            assigners: vec![ServiceId(0); cores],
            always_accumulate: BTreeMap::new(),
        }),
        accounts: Arc::new(BTreeMap::new()),
        disputes: Arc::new(DisputesRecords::default()),
        activity: Arc::new(ActivityRecords::zeroed(spec)),
        ready: Arc::new(ReadyQueues(vec![Vec::new(); cores])),
        accumulated: Arc::new(AccumulatedLog::empty(spec)),
    }
}

/// Deterministic validator keys for development chains: validator `i` gets
/// key material derived from its index.
pub fn dev_validators(spec: &ChainSpec) -> Vec<ValidatorKeys> {
    (0..spec.num_validators)
        .map(|index| {
            let tag = index as u8 + 1;
            ValidatorKeys {
                bandersnatch: [tag; 32],
                ed25519: [tag; 32],
                bls: [tag; 144],
                metadata: [0u8; 128],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_root_is_reproducible() {
        let spec = ChainSpec::tiny();
        let validators = dev_validators(&spec);
        let a = genesis_state(&spec, &validators, OpaqueHash::ZERO);
        let b = genesis_state(&spec, &validators, OpaqueHash::ZERO);
        assert_eq!(a.state_root(&spec), b.state_root(&spec));
    }

    #[test]
    fn genesis_root_depends_on_validator_keys() {
        let spec = ChainSpec::tiny();
        let mut validators = dev_validators(&spec);
        let base = genesis_state(&spec, &validators, OpaqueHash::ZERO).state_root(&spec);
        validators[0].ed25519 = [0xEE; 32];
        let changed = genesis_state(&spec, &validators, OpaqueHash::ZERO).state_root(&spec);
        assert_ne!(base, changed);
    }

    #[test]
    fn genesis_starts_in_fallback_mode() {
        let spec = ChainSpec::tiny();
        let state = genesis_state(&spec, &dev_validators(&spec), OpaqueHash::ZERO);
        assert!(!state.safrole.seal_keys.is_ticketed());
        assert_eq!(state.the_time, 0);
        assert!(state.recent.blocks.is_empty());
    }
}
