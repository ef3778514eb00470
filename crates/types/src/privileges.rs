// Path: crates/types/src/privileges.rs

//! The privileged-service record and its version-gated encoding.

use crate::codec::{decode_dict, decode_fixed_seq, encode_dict, JamDecode, JamEncode};
use crate::config::{ChainSpec, ProtocolVersion};
use crate::error::CodecError;
use crate::primitives::{Gas, ServiceId};
use std::collections::BTreeMap;

/// The services granted protocol-level authority.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Privileges {
    /// The manager service, able to alter the privileged set itself.
    pub manager: ServiceId,
    /// The delegator service, able to set the staging validator set.
    pub delegator: ServiceId,
    /// The registrar service, able to mint service identifiers.
    ///
    /// Absent on the wire before protocol 0.7.1; defaults to the manager.
    pub registrar: ServiceId,
    /// Per-core assigner services, able to set that core's authorizer queue.
    pub assigners: Vec<ServiceId>,
    /// Services accumulated every block regardless of reports, with the gas
    /// each is granted.
    pub always_accumulate: BTreeMap<ServiceId, Gas>,
}

impl Privileges {
    /// Appends the encoding prescribed by the spec's protocol version.
    ///
    /// The layout changed at 0.7.1 (registrar inserted, assigners moved);
    /// the version is an explicit parameter and is never inferred from the
    /// payload shape.
    pub fn encode_to(&self, spec: &ChainSpec, dest: &mut Vec<u8>) {
        match spec.protocol_version {
            ProtocolVersion::V0_7_1 => {
                self.manager.encode_to(dest);
                self.delegator.encode_to(dest);
                self.registrar.encode_to(dest);
                for assigner in &self.assigners {
                    assigner.encode_to(dest);
                }
                encode_dict(&self.always_accumulate, dest);
            }
            ProtocolVersion::V0_7_0 => {
                self.manager.encode_to(dest);
                for assigner in &self.assigners {
                    assigner.encode_to(dest);
                }
                self.delegator.encode_to(dest);
                encode_dict(&self.always_accumulate, dest);
            }
        }
    }

    /// Decodes the layout prescribed by the spec's protocol version.
    pub fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        let cores = spec.num_cores as usize;
        match spec.protocol_version {
            ProtocolVersion::V0_7_1 => Ok(Privileges {
                manager: ServiceId::decode(input)?,
                delegator: ServiceId::decode(input)?,
                registrar: ServiceId::decode(input)?,
                assigners: decode_fixed_seq(input, cores)?,
                always_accumulate: decode_dict(input)?,
            }),
            ProtocolVersion::V0_7_0 => {
                let manager = ServiceId::decode(input)?;
                let assigners = decode_fixed_seq(input, cores)?;
                let delegator = ServiceId::decode(input)?;
                Ok(Privileges {
                    manager,
                    delegator,
                    // The legacy layout has no registrar; authority stays
                    // with the manager until a 0.7.1 transition assigns one.
                    registrar: manager,
                    assigners,
                    always_accumulate: decode_dict(input)?,
                })
            }
        }
    }
}
