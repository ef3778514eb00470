// Path: crates/state/src/components.rs

//! The world-state structure and its per-component types.
//!
//! The seventeen components are held behind per-component `Arc`s: cloning a
//! [`WorldState`] for a transition is cheap, and the first mutation of a
//! component in the working copy detaches it from the committed state
//! (`Arc::make_mut`). The committed handle is therefore never observable
//! mid-transition.
//!
//! Component encodings take the chain spec where a cardinality is a
//! protocol constant (validator sets, per-core vectors, the accumulated
//! ring); everything else is context-free.

use crate::statekey::{component_key, service_key, Component};
use crate::trie::{merklize, INLINE_DICT_MAX};
use marmalade_types::block::{TicketBody, WorkReport};
use marmalade_types::codec::{
    decode_bounded_vec, decode_dict, decode_fixed_seq, encode_dict, JamDecode, JamEncode,
};
use marmalade_types::config::ChainSpec;
use marmalade_types::error::{CodecError, StateError};
use marmalade_types::primitives::{
    BandersnatchKey, Ed25519Key, Entropy, OpaqueHash, ServiceId, StateRootHash, TimeSlot,
    WorkPackageHash,
};
use marmalade_types::privileges::Privileges;
use marmalade_types::service::ServiceAccount;
use marmalade_types::validators::ValidatorSet;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Per-core pools of currently eligible authorizer hashes.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct AuthPools(pub Vec<Vec<OpaqueHash>>);

impl AuthPools {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        for pool in &self.0 {
            pool.encode_to(dest);
        }
    }

    fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        let mut pools = Vec::with_capacity(spec.num_cores as usize);
        for _ in 0..spec.num_cores {
            pools.push(decode_bounded_vec(input, spec.auth_pool_size as usize)?);
        }
        Ok(AuthPools(pools))
    }
}

/// Per-core fixed-length queues of pending authorizer hashes; zero-hash
/// slots denote empty positions.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct AuthQueues(pub Vec<Vec<OpaqueHash>>);

impl AuthQueues {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        for queue in &self.0 {
            for hash in queue {
                hash.encode_to(dest);
            }
        }
    }

    fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        let mut queues = Vec::with_capacity(spec.num_cores as usize);
        for _ in 0..spec.num_cores {
            queues.push(decode_fixed_seq(input, spec.auth_queue_size as usize)?);
        }
        Ok(AuthQueues(queues))
    }
}

/// One entry of recent block history.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RecentBlock {
    /// The block's header hash.
    pub header_hash: OpaqueHash,
    /// The post-state root committed by the block.
    pub state_root: StateRootHash,
    /// Work packages reported in the block.
    pub reported: Vec<WorkPackageHash>,
}

impl JamEncode for RecentBlock {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.header_hash.encode_to(dest);
        self.state_root.encode_to(dest);
        self.reported.encode_to(dest);
    }
}

impl JamDecode for RecentBlock {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(RecentBlock {
            header_hash: OpaqueHash::decode(input)?,
            state_root: StateRootHash::decode(input)?,
            reported: Vec::<WorkPackageHash>::decode(input)?,
        })
    }
}

/// Bounded history of recent blocks plus the accumulation-log super-peak.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct RecentHistory {
    /// Recent blocks, oldest first, bounded by the spec's history size.
    pub blocks: Vec<RecentBlock>,
    /// The super-peak commitment over the accumulation output log.
    pub log_peak: OpaqueHash,
}

impl RecentHistory {
    /// True when `hash` is a known recent header hash.
    pub fn contains(&self, hash: &OpaqueHash) -> bool {
        self.blocks.iter().any(|block| block.header_hash == *hash)
    }

    /// Appends an entry, evicting the oldest beyond `bound`.
    pub fn push(&mut self, block: RecentBlock, bound: usize) {
        self.blocks.push(block);
        if self.blocks.len() > bound {
            let excess = self.blocks.len() - bound;
            self.blocks.drain(..excess);
        }
    }

    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.blocks.encode_to(dest);
        self.log_peak.encode_to(dest);
    }

    fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(RecentHistory {
            blocks: decode_bounded_vec(input, spec.recent_history_size as usize)?,
            log_peak: OpaqueHash::decode(input)?,
        })
    }
}

/// The sealing schedule for the current epoch.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SealKeys {
    /// Ticket mode: one accepted ticket per slot, outside-in sequenced.
    Tickets(Vec<TicketBody>),
    /// Fallback mode: one Bandersnatch key per slot from the fallback
    /// schedule.
    Fallback(Vec<BandersnatchKey>),
}

impl SealKeys {
    /// True in ticket mode.
    pub fn is_ticketed(&self) -> bool {
        matches!(self, SealKeys::Tickets(_))
    }

    /// The fallback schedule: one key per slot, drawn from `keys` by the
    /// entropy keystream.
    pub fn fallback_from_entropy(
        entropy2: &Entropy,
        keys: &[BandersnatchKey],
        epoch_len: u32,
    ) -> SealKeys {
        let sequence = (0..epoch_len)
            .map(|slot| {
                let index =
                    marmalade_crypto::keystream::draw_index(&entropy2.0, slot, keys.len() as u64);
                keys.get(index as usize).copied().unwrap_or([0u8; 32])
            })
            .collect();
        SealKeys::Fallback(sequence)
    }

    fn encode_to(&self, dest: &mut Vec<u8>) {
        match self {
            SealKeys::Tickets(tickets) => {
                dest.push(0x00);
                for ticket in tickets {
                    ticket.encode_to(dest);
                }
            }
            SealKeys::Fallback(keys) => {
                dest.push(0x01);
                for key in keys {
                    key.encode_to(dest);
                }
            }
        }
    }

    fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        let slots = spec.epoch_duration as usize;
        match u8::decode(input)? {
            0x00 => Ok(SealKeys::Tickets(decode_fixed_seq(input, slots)?)),
            0x01 => Ok(SealKeys::Fallback(decode_fixed_seq(input, slots)?)),
            other => Err(CodecError::BadBoolean(other)),
        }
    }
}

/// The Safrole component: everything the sealing protocol carries across
/// blocks besides the entropy pool and the three rotating validator sets.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SafroleComponent {
    /// The set that becomes active at the next epoch boundary after
    /// staging; tickets are drawn against it.
    pub pending_set: ValidatorSet,
    /// The Bandersnatch ring root over the staging set.
    pub epoch_root: OpaqueHash,
    /// The seal-key schedule for the current epoch.
    pub seal_keys: SealKeys,
    /// Accepted tickets for the next epoch, ascending by identifier.
    pub ticket_accumulator: Vec<TicketBody>,
}

impl SafroleComponent {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.pending_set.encode_to(dest);
        self.epoch_root.encode_to(dest);
        self.seal_keys.encode_to(dest);
        self.ticket_accumulator.encode_to(dest);
    }

    fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(SafroleComponent {
            pending_set: ValidatorSet::decode_fixed(input, spec.num_validators as usize)?,
            epoch_root: OpaqueHash::decode(input)?,
            seal_keys: SealKeys::decode(spec, input)?,
            ticket_accumulator: decode_bounded_vec(input, spec.epoch_duration as usize)?,
        })
    }
}

/// The entropy pool: the live accumulator and three epoch-delayed values.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct EntropyPool {
    /// The accumulator mixed on every imported block.
    pub accumulator: Entropy,
    /// The accumulator frozen at the last epoch boundary.
    pub entropy1: Entropy,
    /// Frozen two boundaries ago; seeds ticket contexts and the shuffle.
    pub entropy2: Entropy,
    /// Frozen three boundaries ago; seeds seal verification contexts.
    pub entropy3: Entropy,
}

impl EntropyPool {
    /// The epoch-boundary rotation: the accumulator is frozen into
    /// `entropy1` and the older values shift down.
    pub fn rotate(&mut self) {
        self.entropy3 = self.entropy2;
        self.entropy2 = self.entropy1;
        self.entropy1 = self.accumulator;
    }

    /// Mixes a VRF output into the accumulator.
    pub fn accumulate(&mut self, vrf_output: &[u8; 32]) {
        self.accumulator =
            marmalade_crypto::hash::blake2b_256_concat(&[&self.accumulator.0, vrf_output]);
    }

    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.accumulator.encode_to(dest);
        self.entropy1.encode_to(dest);
        self.entropy2.encode_to(dest);
        self.entropy3.encode_to(dest);
    }

    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(EntropyPool {
            accumulator: Entropy::decode(input)?,
            entropy1: Entropy::decode(input)?,
            entropy2: Entropy::decode(input)?,
            entropy3: Entropy::decode(input)?,
        })
    }
}

/// A work report awaiting availability on a core.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PendingReport {
    /// The guaranteed report.
    pub report: WorkReport,
    /// The timeslot the guarantee was imported in.
    pub reported_at: TimeSlot,
}

impl JamEncode for PendingReport {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.report.encode_to(dest);
        self.reported_at.encode_to(dest);
    }
}

impl JamDecode for PendingReport {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(PendingReport {
            report: WorkReport::decode(input)?,
            reported_at: TimeSlot::decode(input)?,
        })
    }
}

/// Per-core outstanding reports (at most one per core).
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct CoreReports(pub Vec<Option<PendingReport>>);

impl CoreReports {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        for slot in &self.0 {
            slot.encode_to(dest);
        }
    }

    fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(CoreReports(decode_fixed_seq(
            input,
            spec.num_cores as usize,
        )?))
    }
}

/// The dispute records: judged report hashes and offending keys.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct DisputesRecords {
    /// Reports judged valid.
    pub good: BTreeSet<OpaqueHash>,
    /// Reports judged invalid.
    pub bad: BTreeSet<OpaqueHash>,
    /// Reports with a split verdict.
    pub wonky: BTreeSet<OpaqueHash>,
    /// Ed25519 keys of validators judged offenders.
    pub offenders: BTreeSet<Ed25519Key>,
}

impl DisputesRecords {
    /// True when the report hash has already received any verdict.
    pub fn already_judged(&self, target: &OpaqueHash) -> bool {
        self.good.contains(target) || self.bad.contains(target) || self.wonky.contains(target)
    }

    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.good.encode_to(dest);
        self.bad.encode_to(dest);
        self.wonky.encode_to(dest);
        self.offenders.encode_to(dest);
    }

    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(DisputesRecords {
            good: BTreeSet::decode(input)?,
            bad: BTreeSet::decode(input)?,
            wonky: BTreeSet::decode(input)?,
            offenders: BTreeSet::decode(input)?,
        })
    }
}

/// A single validator's activity counters for the current epoch.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ValidatorActivity {
    /// Blocks authored.
    pub blocks: u32,
    /// Tickets introduced in authored blocks.
    pub tickets: u32,
    /// Preimages introduced in authored blocks.
    pub preimage_count: u32,
    /// Total octets of those preimages.
    pub preimage_size: u32,
    /// Guarantee credentials contributed.
    pub guarantees: u32,
    /// Availability assurances contributed.
    pub assurances: u32,
}

impl JamEncode for ValidatorActivity {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.blocks.encode_to(dest);
        self.tickets.encode_to(dest);
        self.preimage_count.encode_to(dest);
        self.preimage_size.encode_to(dest);
        self.guarantees.encode_to(dest);
        self.assurances.encode_to(dest);
    }
}

impl JamDecode for ValidatorActivity {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(ValidatorActivity {
            blocks: u32::decode(input)?,
            tickets: u32::decode(input)?,
            preimage_count: u32::decode(input)?,
            preimage_size: u32::decode(input)?,
            guarantees: u32::decode(input)?,
            assurances: u32::decode(input)?,
        })
    }
}

/// A single core's activity counters for the current epoch.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CoreActivity {
    /// Reports guaranteed onto the core.
    pub guaranteed: u32,
    /// Reports that reached availability.
    pub assured: u32,
    /// Reports accumulated into service state.
    pub accumulated: u32,
}

impl JamEncode for CoreActivity {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.guaranteed.encode_to(dest);
        self.assured.encode_to(dest);
        self.accumulated.encode_to(dest);
    }
}

impl JamDecode for CoreActivity {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(CoreActivity {
            guaranteed: u32::decode(input)?,
            assured: u32::decode(input)?,
            accumulated: u32::decode(input)?,
        })
    }
}

/// Per-validator and per-core counters, reset at each epoch boundary.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ActivityRecords {
    /// One entry per validator, indexed like the active set.
    pub validators: Vec<ValidatorActivity>,
    /// One entry per core.
    pub cores: Vec<CoreActivity>,
}

impl ActivityRecords {
    /// Fresh zeroed counters for the spec's cardinalities.
    pub fn zeroed(spec: &ChainSpec) -> Self {
        ActivityRecords {
            validators: vec![ValidatorActivity::default(); spec.num_validators as usize],
            cores: vec![CoreActivity::default(); spec.num_cores as usize],
        }
    }

    fn encode_to(&self, dest: &mut Vec<u8>) {
        for validator in &self.validators {
            validator.encode_to(dest);
        }
        for core in &self.cores {
            core.encode_to(dest);
        }
    }

    fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(ActivityRecords {
            validators: decode_fixed_seq(input, spec.num_validators as usize)?,
            cores: decode_fixed_seq(input, spec.num_cores as usize)?,
        })
    }
}

/// A report queued for accumulation with its unresolved dependencies.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ReadyRecord {
    /// The available report.
    pub report: WorkReport,
    /// Work packages whose accumulation this report waits on.
    pub dependencies: Vec<WorkPackageHash>,
}

impl JamEncode for ReadyRecord {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.report.encode_to(dest);
        self.dependencies.encode_to(dest);
    }
}

impl JamDecode for ReadyRecord {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(ReadyRecord {
            report: WorkReport::decode(input)?,
            dependencies: Vec::<WorkPackageHash>::decode(input)?,
        })
    }
}

/// Per-core queues of reports ready to accumulate.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ReadyQueues(pub Vec<Vec<ReadyRecord>>);

impl ReadyQueues {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        for queue in &self.0 {
            queue.encode_to(dest);
        }
    }

    fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        let mut queues = Vec::with_capacity(spec.num_cores as usize);
        for _ in 0..spec.num_cores {
            queues.push(Vec::<ReadyRecord>::decode(input)?);
        }
        Ok(ReadyQueues(queues))
    }
}

/// A ring buffer of accumulated work-package hashes, one set per slot of
/// the current epoch.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct AccumulatedLog(pub Vec<BTreeSet<WorkPackageHash>>);

impl AccumulatedLog {
    /// An empty log sized to the epoch length.
    pub fn empty(spec: &ChainSpec) -> Self {
        AccumulatedLog(vec![BTreeSet::new(); spec.epoch_duration as usize])
    }

    /// True when `package` was accumulated at any retained slot.
    pub fn contains(&self, package: &WorkPackageHash) -> bool {
        self.0.iter().any(|slot| slot.contains(package))
    }

    fn encode_to(&self, dest: &mut Vec<u8>) {
        for slot in &self.0 {
            slot.encode_to(dest);
        }
    }

    fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(AccumulatedLog(decode_fixed_seq(
            input,
            spec.epoch_duration as usize,
        )?))
    }
}

/// The seventeen-component world state.
///
/// Components are individually reference-counted; see the module
/// documentation for the copy-on-write discipline.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct WorldState {
    /// C(1): per-core eligible authorizers.
    pub auth_pool: Arc<AuthPools>,
    /// C(2): per-core pending authorizer queues.
    pub auth_queue: Arc<AuthQueues>,
    /// C(3): recent block history.
    pub recent: Arc<RecentHistory>,
    /// C(4): the Safrole component.
    pub safrole: Arc<SafroleComponent>,
    /// C(5): the entropy pool.
    pub entropy: Arc<EntropyPool>,
    /// C(6): validators staged for the next epoch.
    pub staging_set: Arc<ValidatorSet>,
    /// C(7): validators authoring the current epoch.
    pub active_set: Arc<ValidatorSet>,
    /// C(8): validators of the previous epoch.
    pub previous_set: Arc<ValidatorSet>,
    /// C(9): per-core reports pending availability.
    pub reports: Arc<CoreReports>,
    /// C(10): the last accumulation output root.
    pub last_acc_out: OpaqueHash,
    /// C(11): the timeslot of the most recent imported block.
    pub the_time: TimeSlot,
    /// C(12): privileged services.
    pub privileges: Arc<Privileges>,
    /// C(13): service accounts.
    pub accounts: Arc<BTreeMap<ServiceId, ServiceAccount>>,
    /// C(14): dispute records.
    pub disputes: Arc<DisputesRecords>,
    /// C(15): activity counters.
    pub activity: Arc<ActivityRecords>,
    /// C(16): per-core ready queues.
    pub ready: Arc<ReadyQueues>,
    /// C(17): per-slot accumulated package hashes.
    pub accumulated: Arc<AccumulatedLog>,
}

impl WorldState {
    /// Checks the structural invariants the transition functions rely on.
    pub fn check_invariants(&self, spec: &ChainSpec) -> Result<(), StateError> {
        let validators = spec.num_validators as usize;
        let cores = spec.num_cores as usize;
        let fail = |message: String| Err(StateError::InvariantViolated(message));
        if self.active_set.len() != validators || self.staging_set.len() != validators {
            return fail(format!(
                "validator set cardinality: active {}, staging {}, expected {}",
                self.active_set.len(),
                self.staging_set.len(),
                validators
            ));
        }
        if self.privileges.assigners.len() != cores {
            return fail(format!(
                "assigner cardinality {} != core count {}",
                self.privileges.assigners.len(),
                cores
            ));
        }
        if self.accumulated.0.len() != spec.epoch_duration as usize {
            return fail(format!(
                "accumulated ring length {} != epoch length {}",
                self.accumulated.0.len(),
                spec.epoch_duration
            ));
        }
        for (core, queue) in self.auth_queue.0.iter().enumerate() {
            if queue.len() != spec.auth_queue_size as usize {
                return fail(format!("auth queue length for core {}", core));
            }
        }
        Ok(())
    }

    /// Encodes a single component canonically.
    pub fn encode_component(&self, spec: &ChainSpec, component: Component) -> Vec<u8> {
        let mut out = Vec::new();
        match component {
            Component::AuthPool => self.auth_pool.encode_to(&mut out),
            Component::AuthQueue => self.auth_queue.encode_to(&mut out),
            Component::Recent => self.recent.encode_to(&mut out),
            Component::Safrole => self.safrole.encode_to(&mut out),
            Component::Entropy => self.entropy.encode_to(&mut out),
            Component::StagingSet => self.staging_set.encode_to(&mut out),
            Component::ActiveSet => self.active_set.encode_to(&mut out),
            Component::PreviousSet => self.previous_set.encode_to(&mut out),
            Component::Reports => self.reports.encode_to(&mut out),
            Component::LastAccOut => self.last_acc_out.encode_to(&mut out),
            Component::TheTime => self.the_time.encode_to(&mut out),
            Component::Privileges => self.privileges.encode_to(spec, &mut out),
            Component::Accounts => self.encode_accounts(&mut out),
            Component::Disputes => self.disputes.encode_to(&mut out),
            Component::Activity => self.activity.encode_to(&mut out),
            Component::Ready => self.ready.encode_to(&mut out),
            Component::Accumulated => self.accumulated.encode_to(&mut out),
        }
        out
    }

    // Small account maps encode inline; large ones commit to a sub-trie
    // root so the top-level leaf stays bounded.
    fn encode_accounts(&self, dest: &mut Vec<u8>) {
        if self.accounts.len() <= INLINE_DICT_MAX {
            dest.push(0x00);
            encode_dict(self.accounts.as_ref(), dest);
        } else {
            dest.push(0x01);
            let encoded: Vec<(ServiceId, Vec<u8>)> = self
                .accounts
                .iter()
                .map(|(id, account)| (*id, account.encode()))
                .collect();
            let root = merklize(
                encoded
                    .iter()
                    .map(|(id, bytes)| (service_key(*id), bytes.as_slice())),
            );
            root.encode_to(dest);
        }
    }

    /// Decodes the accounts component produced by [`Self::encode_accounts`].
    ///
    /// Only the inline form can be reconstructed from its encoding alone;
    /// the trie-rooted form requires the account bodies from storage.
    pub fn decode_accounts(
        input: &mut &[u8],
    ) -> Result<Option<BTreeMap<ServiceId, ServiceAccount>>, CodecError> {
        match u8::decode(input)? {
            0x00 => Ok(Some(decode_dict(input)?)),
            0x01 => {
                OpaqueHash::decode(input)?;
                Ok(None)
            }
            other => Err(CodecError::BadBoolean(other)),
        }
    }

    /// Computes the merkle root over all seventeen components.
    pub fn state_root(&self, spec: &ChainSpec) -> StateRootHash {
        let encoded: Vec<(Component, Vec<u8>)> = Component::ALL
            .iter()
            .map(|component| (*component, self.encode_component(spec, *component)))
            .collect();
        merklize(
            encoded
                .iter()
                .map(|(component, bytes)| (component_key(*component), bytes.as_slice())),
        )
    }

    /// Decodes a top-level component payload, returning the re-encoded
    /// canonical bytes for divergence checks.
    pub fn reencode_component(
        spec: &ChainSpec,
        component: Component,
        bytes: &[u8],
    ) -> Result<Vec<u8>, CodecError> {
        let mut cursor = bytes;
        let reencoded = match component {
            Component::AuthPool => {
                let mut out = Vec::new();
                AuthPools::decode(spec, &mut cursor)?.encode_to(&mut out);
                out
            }
            Component::AuthQueue => {
                let mut out = Vec::new();
                AuthQueues::decode(spec, &mut cursor)?.encode_to(&mut out);
                out
            }
            Component::Recent => {
                let mut out = Vec::new();
                RecentHistory::decode(spec, &mut cursor)?.encode_to(&mut out);
                out
            }
            Component::Safrole => {
                let mut out = Vec::new();
                SafroleComponent::decode(spec, &mut cursor)?.encode_to(&mut out);
                out
            }
            Component::Entropy => {
                let mut out = Vec::new();
                EntropyPool::decode(&mut cursor)?.encode_to(&mut out);
                out
            }
            Component::StagingSet | Component::ActiveSet | Component::PreviousSet => {
                let set =
                    ValidatorSet::decode_fixed(&mut cursor, spec.num_validators as usize)?;
                set.encode()
            }
            Component::Reports => {
                let mut out = Vec::new();
                CoreReports::decode(spec, &mut cursor)?.encode_to(&mut out);
                out
            }
            Component::LastAccOut => OpaqueHash::decode(&mut cursor)?.encode(),
            Component::TheTime => TimeSlot::decode(&mut cursor)?.encode(),
            Component::Privileges => {
                let mut out = Vec::new();
                Privileges::decode(spec, &mut cursor)?.encode_to(spec, &mut out);
                out
            }
            Component::Accounts => {
                // Either form re-encodes from its own tag.
                let tag = cursor;
                Self::decode_accounts(&mut cursor)?;
                tag[..tag.len() - cursor.len()].to_vec()
            }
            Component::Disputes => {
                let mut out = Vec::new();
                DisputesRecords::decode(&mut cursor)?.encode_to(&mut out);
                out
            }
            Component::Activity => {
                let mut out = Vec::new();
                ActivityRecords::decode(spec, &mut cursor)?.encode_to(&mut out);
                out
            }
            Component::Ready => {
                let mut out = Vec::new();
                ReadyQueues::decode(spec, &mut cursor)?.encode_to(&mut out);
                out
            }
            Component::Accumulated => {
                let mut out = Vec::new();
                AccumulatedLog::decode(spec, &mut cursor)?.encode_to(&mut out);
                out
            }
        };
        if !cursor.is_empty() {
            return Err(CodecError::LengthMismatch {
                expected: bytes.len() - cursor.len(),
                got: bytes.len(),
            });
        }
        Ok(reencoded)
    }
}
