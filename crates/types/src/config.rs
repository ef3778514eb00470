// Path: crates/types/src/config.rs

//! The static chain-spec configuration surface.
//!
//! The chain spec is loaded once at startup and never mutated; every
//! protocol constant the engines consume is derived from it. The serde
//! surface is presentation-level (JSON chain-spec files); consensus code
//! only ever sees the validated [`ChainSpec`].

use crate::error::SpecError;
use serde::{Deserialize, Serialize};

/// The protocol revision the node speaks.
///
/// The privileges component changed layout between 0.7.0 and 0.7.1; the
/// revision is always an explicit parameter, never inferred from payload
/// shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProtocolVersion {
    /// The 0.7.0 layout: no registrar, legacy field order.
    #[serde(rename = "0.7.0")]
    V0_7_0,
    /// The current 0.7.1 layout.
    #[serde(rename = "0.7.1")]
    #[default]
    V0_7_1,
}

/// The static configuration of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChainSpec {
    /// The protocol revision in force.
    #[serde(default)]
    pub protocol_version: ProtocolVersion,
    /// The number of cores.
    pub num_cores: u16,
    /// The number of validators.
    pub num_validators: u16,
    /// The number of slots in an epoch.
    pub epoch_duration: u32,
    /// The contest prefix of an epoch during which tickets are accepted.
    pub contest_duration: u32,
    /// The number of slots between guarantor-assignment rotations.
    pub rotation_period: u32,
    /// The ticket attempts each validator may make per epoch.
    pub tickets_per_validator: u8,
    /// The largest number of tickets a single extrinsic may carry.
    pub max_tickets_per_extrinsic: u16,
    /// The gas allowance for all accumulation in a block.
    pub max_block_gas: u64,
    /// The gas allowance for a single refine invocation.
    pub max_refine_gas: u64,
    /// Slots after which an unreferenced preimage may be expunged.
    pub preimage_expunge_period: u32,
    /// Wall-clock seconds per slot.
    pub slot_duration: u32,
    /// The largest acceptable work-package bundle, in octets.
    pub max_bundle_size: u32,
    /// The per-core authorizer queue length.
    #[serde(default = "default_auth_queue_size")]
    pub auth_queue_size: u32,
    /// The per-core authorizer pool bound.
    #[serde(default = "default_auth_pool_size")]
    pub auth_pool_size: u32,
    /// The number of recent blocks retained for parent checks.
    #[serde(default = "default_recent_history_size")]
    pub recent_history_size: u32,
}

fn default_auth_queue_size() -> u32 {
    80
}
fn default_auth_pool_size() -> u32 {
    8
}
fn default_recent_history_size() -> u32 {
    crate::MAX_RECENT_HISTORY as u32
}

impl ChainSpec {
    /// A small spec for development chains and tests: 6 validators, 2
    /// cores, 12-slot epochs with a 10-slot contest.
    pub fn tiny() -> Self {
        ChainSpec {
            protocol_version: ProtocolVersion::V0_7_1,
            num_cores: 2,
            num_validators: 6,
            epoch_duration: 12,
            contest_duration: 10,
            rotation_period: 4,
            tickets_per_validator: 3,
            max_tickets_per_extrinsic: 16,
            max_block_gas: 3_500_000_000,
            max_refine_gas: 5_000_000_000,
            preimage_expunge_period: 19_200,
            slot_duration: 6,
            max_bundle_size: 13_794_305,
            auth_queue_size: 80,
            auth_pool_size: 8,
            recent_history_size: 24,
        }
    }

    /// The full production parameterization: 1023 validators, 341 cores,
    /// 600-slot epochs with a 500-slot contest.
    pub fn full() -> Self {
        ChainSpec {
            protocol_version: ProtocolVersion::V0_7_1,
            num_cores: 341,
            num_validators: 1023,
            epoch_duration: 600,
            contest_duration: 500,
            rotation_period: 10,
            tickets_per_validator: 2,
            max_tickets_per_extrinsic: 16,
            max_block_gas: 3_500_000_000,
            max_refine_gas: 5_000_000_000,
            preimage_expunge_period: 19_200,
            slot_duration: 6,
            max_bundle_size: 13_794_305,
            auth_queue_size: 80,
            auth_pool_size: 8,
            recent_history_size: 24,
        }
    }

    /// Validates cross-field constraints the type system cannot express.
    pub fn validate(&self) -> Result<(), SpecError> {
        fn nonzero(name: &'static str, value: u64) -> Result<(), SpecError> {
            if value == 0 {
                return Err(SpecError::InvalidParameter {
                    name,
                    reason: "must be non-zero".into(),
                });
            }
            Ok(())
        }
        nonzero("numCores", self.num_cores as u64)?;
        nonzero("numValidators", self.num_validators as u64)?;
        nonzero("epochDuration", self.epoch_duration as u64)?;
        nonzero("rotationPeriod", self.rotation_period as u64)?;
        nonzero("slotDuration", self.slot_duration as u64)?;
        if self.contest_duration >= self.epoch_duration {
            return Err(SpecError::InvalidParameter {
                name: "contestDuration",
                reason: format!(
                    "must be below epochDuration ({} >= {})",
                    self.contest_duration, self.epoch_duration
                ),
            });
        }
        if (self.num_validators as usize) < 3 {
            return Err(SpecError::InvalidParameter {
                name: "numValidators",
                reason: "at least three validators are required".into(),
            });
        }
        Ok(())
    }

    /// The supermajority size used by dispute verdicts.
    pub fn judgment_quorum(&self) -> usize {
        2 * self.num_validators as usize / 3 + 1
    }

    /// The epoch index of a slot under this spec.
    pub fn epoch_of(&self, slot: u32) -> u32 {
        slot / self.epoch_duration
    }

    /// The phase of a slot within its epoch under this spec.
    pub fn phase_of(&self, slot: u32) -> u32 {
        slot % self.epoch_duration
    }

    /// The octet length of a per-core availability bitfield.
    pub fn avail_bitfield_len(&self) -> usize {
        (self.num_cores as usize + 7) / 8
    }
}
