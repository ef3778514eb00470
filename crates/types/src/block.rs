// Path: crates/types/src/block.rs

//! Block, header, and extrinsic structures with their canonical encodings.
//!
//! A handful of header and extrinsic fields encode as fixed sequences whose
//! lengths come from the chain spec (epoch length, validator count, core
//! count), so the decoders here take the spec as a parameter instead of
//! implementing context-free [`JamDecode`]. Encoders never need the spec:
//! a well-formed value already carries the right cardinalities.

use crate::codec::{
    decode_bounded_vec, decode_compact, decode_fixed_seq, encode_compact, JamDecode, JamEncode,
};
use crate::config::ChainSpec;
use crate::error::CodecError;
use crate::primitives::{
    BandersnatchSignature, CoreIndex, Ed25519Key, Ed25519Signature, Entropy, HeaderHash,
    OpaqueHash, ServiceId, StateRootHash, TimeSlot, ValidatorIndex, WorkPackageHash,
};
use crate::validators::ValidatorSet;

/// A seal ticket: the VRF output identifier and the attempt it came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TicketBody {
    /// The 32-octet VRF output identifying the ticket.
    pub id: OpaqueHash,
    /// The attempt index the producer used (below `ticketsPerValidator`).
    pub entry_index: u8,
}

impl JamEncode for TicketBody {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.id.encode_to(dest);
        dest.push(self.entry_index);
    }
}

impl JamDecode for TicketBody {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(TicketBody {
            id: OpaqueHash::decode(input)?,
            entry_index: u8::decode(input)?,
        })
    }
}

/// The abbreviated validator identity published in an epoch mark.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EpochMarkValidator {
    /// The validator's Bandersnatch key.
    pub bandersnatch: [u8; 32],
    /// The validator's Ed25519 key.
    pub ed25519: Ed25519Key,
}

impl JamEncode for EpochMarkValidator {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        dest.extend_from_slice(&self.bandersnatch);
        dest.extend_from_slice(&self.ed25519);
    }
}

impl JamDecode for EpochMarkValidator {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(EpochMarkValidator {
            bandersnatch: <[u8; 32]>::decode(input)?,
            ed25519: <[u8; 32]>::decode(input)?,
        })
    }
}

/// The header field announcing an epoch boundary.
///
/// `entropy1` is the pre-rotation value; `validators` is the post-rotation
/// staging set that will author the epoch after next.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EpochMark {
    /// The entropy accumulator at the boundary.
    pub entropy_accumulator: Entropy,
    /// The pre-rotation `entropy1`.
    pub entropy1: Entropy,
    /// The post-rotation staging set, abbreviated to its signing keys.
    pub validators: Vec<EpochMarkValidator>,
}

impl EpochMark {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.entropy_accumulator.encode_to(dest);
        self.entropy1.encode_to(dest);
        // Fixed sequence: the validator count is a chain-spec constant.
        for validator in &self.validators {
            validator.encode_to(dest);
        }
    }

    fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(EpochMark {
            entropy_accumulator: Entropy::decode(input)?,
            entropy1: Entropy::decode(input)?,
            validators: decode_fixed_seq(input, spec.num_validators as usize)?,
        })
    }
}

/// A block header.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Header {
    /// The hash of the parent header.
    pub parent: HeaderHash,
    /// The state root after applying the parent block.
    pub prior_state_root: StateRootHash,
    /// The hash of this block's extrinsic.
    pub extrinsic_hash: OpaqueHash,
    /// The timeslot this block claims.
    pub timeslot: TimeSlot,
    /// Present exactly on the first block of an epoch.
    pub epoch_mark: Option<EpochMark>,
    /// Present exactly on the block that crosses the contest tail with a
    /// full ticket accumulator; the outside-in sealing sequence.
    pub winners_mark: Option<Vec<TicketBody>>,
    /// Ed25519 keys newly judged offenders in this block.
    pub offenders_mark: Vec<Ed25519Key>,
    /// The author's index into the active validator set.
    pub author_index: ValidatorIndex,
    /// The entropy-contributing VRF signature.
    pub vrf_sig: BandersnatchSignature,
    /// The seal binding the block to its author.
    pub seal_sig: BandersnatchSignature,
}

impl Header {
    /// Appends the canonical encoding, including the seal.
    pub fn encode_to(&self, dest: &mut Vec<u8>) {
        self.encode_unsigned_to(dest);
        self.seal_sig.encode_to(dest);
    }

    /// Returns the canonical encoding, including the seal.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_to(&mut out);
        out
    }

    /// Returns the unsigned-header encoding: everything but the seal.
    ///
    /// Seals and VRF signatures are taken over this encoding.
    pub fn encode_unsigned(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_unsigned_to(&mut out);
        out
    }

    fn encode_unsigned_to(&self, dest: &mut Vec<u8>) {
        self.parent.encode_to(dest);
        self.prior_state_root.encode_to(dest);
        self.extrinsic_hash.encode_to(dest);
        self.timeslot.encode_to(dest);
        match &self.epoch_mark {
            None => dest.push(0x00),
            Some(mark) => {
                dest.push(0x01);
                mark.encode_to(dest);
            }
        }
        match &self.winners_mark {
            None => dest.push(0x00),
            Some(tickets) => {
                dest.push(0x01);
                // Fixed sequence of epoch-length tickets.
                for ticket in tickets {
                    ticket.encode_to(dest);
                }
            }
        }
        self.offenders_mark.encode_to(dest);
        self.author_index.encode_to(dest);
        self.vrf_sig.encode_to(dest);
    }

    /// Decodes a header under the given chain spec.
    pub fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        let parent = HeaderHash::decode(input)?;
        let prior_state_root = StateRootHash::decode(input)?;
        let extrinsic_hash = OpaqueHash::decode(input)?;
        let timeslot = TimeSlot::decode(input)?;
        let epoch_mark = match u8::decode(input)? {
            0x00 => None,
            0x01 => Some(EpochMark::decode(spec, input)?),
            other => return Err(CodecError::BadBoolean(other)),
        };
        let winners_mark = match u8::decode(input)? {
            0x00 => None,
            0x01 => Some(decode_fixed_seq(input, spec.epoch_duration as usize)?),
            other => return Err(CodecError::BadBoolean(other)),
        };
        let offenders_mark = decode_bounded_vec(input, spec.num_validators as usize)?;
        Ok(Header {
            parent,
            prior_state_root,
            extrinsic_hash,
            timeslot,
            epoch_mark,
            winners_mark,
            offenders_mark,
            author_index: ValidatorIndex::decode(input)?,
            vrf_sig: BandersnatchSignature::decode(input)?,
            seal_sig: BandersnatchSignature::decode(input)?,
        })
    }
}

/// A ticket submission: the attempt index and its ring VRF proof.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TicketEnvelope {
    /// The attempt index (below `ticketsPerValidator`).
    pub attempt: u8,
    /// The ring VRF proof over `X_ticket ‖ entropy2 ‖ attempt`.
    pub signature: BandersnatchSignature,
}

impl JamEncode for TicketEnvelope {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        dest.push(self.attempt);
        self.signature.encode_to(dest);
    }
}

impl JamDecode for TicketEnvelope {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(TicketEnvelope {
            attempt: u8::decode(input)?,
            signature: BandersnatchSignature::decode(input)?,
        })
    }
}

/// A preimage provision for a requesting service.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Preimage {
    /// The service that solicited the preimage.
    pub requester: ServiceId,
    /// The preimage octets.
    pub blob: Vec<u8>,
}

impl JamEncode for Preimage {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.requester.encode_to(dest);
        self.blob.encode_to(dest);
    }
}

impl JamDecode for Preimage {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(Preimage {
            requester: ServiceId::decode(input)?,
            blob: Vec::<u8>::decode(input)?,
        })
    }
}

/// The on-chain summary of a refined work package.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct WorkReport {
    /// The hash of the work package this report refines.
    pub package_hash: WorkPackageHash,
    /// The core the package was refined on.
    pub core_index: CoreIndex,
    /// The authorizer that admitted the package.
    pub authorizer_hash: OpaqueHash,
    /// The service whose state the report accumulates into.
    pub service: ServiceId,
    /// The refinement output committed for accumulation.
    pub output: Vec<u8>,
}

impl JamEncode for WorkReport {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.package_hash.encode_to(dest);
        self.core_index.encode_to(dest);
        self.authorizer_hash.encode_to(dest);
        self.service.encode_to(dest);
        self.output.encode_to(dest);
    }
}

impl JamDecode for WorkReport {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(WorkReport {
            package_hash: WorkPackageHash::decode(input)?,
            core_index: CoreIndex::decode(input)?,
            authorizer_hash: OpaqueHash::decode(input)?,
            service: ServiceId::decode(input)?,
            output: Vec::<u8>::decode(input)?,
        })
    }
}

/// A guarantor's endorsement of a work report.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GuaranteeCredential {
    /// The signing validator's index.
    pub validator_index: ValidatorIndex,
    /// The Ed25519 signature over `X_guarantee ‖ report_hash`.
    pub signature: Ed25519Signature,
}

impl JamEncode for GuaranteeCredential {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.validator_index.encode_to(dest);
        self.signature.encode_to(dest);
    }
}

impl JamDecode for GuaranteeCredential {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(GuaranteeCredential {
            validator_index: ValidatorIndex::decode(input)?,
            signature: Ed25519Signature::decode(input)?,
        })
    }
}

/// A guaranteed work report with its co-guarantor credentials.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ReportGuarantee {
    /// The guaranteed report.
    pub report: WorkReport,
    /// The slot the guarantee was produced in.
    pub slot: TimeSlot,
    /// Credentials in ascending validator-index order.
    pub credentials: Vec<GuaranteeCredential>,
}

impl JamEncode for ReportGuarantee {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.report.encode_to(dest);
        self.slot.encode_to(dest);
        self.credentials.encode_to(dest);
    }
}

impl JamDecode for ReportGuarantee {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(ReportGuarantee {
            report: WorkReport::decode(input)?,
            slot: TimeSlot::decode(input)?,
            credentials: Vec::<GuaranteeCredential>::decode(input)?,
        })
    }
}

/// A validator's attestation that it holds its shards of pending reports.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AvailAssurance {
    /// The parent-block anchor the bitfield refers to.
    pub anchor: HeaderHash,
    /// One bit per core, set when the validator holds that core's shards.
    pub bitfield: Vec<u8>,
    /// The asserting validator's index.
    pub validator_index: ValidatorIndex,
    /// The Ed25519 signature over the anchored bitfield.
    pub signature: Ed25519Signature,
}

impl AvailAssurance {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.anchor.encode_to(dest);
        // Fixed-length bitfield: ceil(numCores / 8) octets.
        dest.extend_from_slice(&self.bitfield);
        self.validator_index.encode_to(dest);
        self.signature.encode_to(dest);
    }

    fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(AvailAssurance {
            anchor: HeaderHash::decode(input)?,
            bitfield: crate::codec::take(input, spec.avail_bitfield_len())?.to_vec(),
            validator_index: ValidatorIndex::decode(input)?,
            signature: Ed25519Signature::decode(input)?,
        })
    }
}

/// A single validator's vote on a report's validity.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Judgment {
    /// True for valid, false for invalid.
    pub vote: bool,
    /// The judging validator's index.
    pub index: ValidatorIndex,
    /// The Ed25519 signature over the vote.
    pub signature: Ed25519Signature,
}

impl JamEncode for Judgment {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.vote.encode_to(dest);
        self.index.encode_to(dest);
        self.signature.encode_to(dest);
    }
}

impl JamDecode for Judgment {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(Judgment {
            vote: bool::decode(input)?,
            index: ValidatorIndex::decode(input)?,
            signature: Ed25519Signature::decode(input)?,
        })
    }
}

/// A supermajority verdict on a disputed work report.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Verdict {
    /// The hash of the disputed report.
    pub target: OpaqueHash,
    /// The epoch the judging set was drawn from.
    pub age: u32,
    /// Exactly `judgment_quorum()` judgments, ascending by validator index.
    pub votes: Vec<Judgment>,
}

impl Verdict {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.target.encode_to(dest);
        self.age.encode_to(dest);
        // Fixed sequence: the quorum size is a chain-spec constant.
        for vote in &self.votes {
            vote.encode_to(dest);
        }
    }

    fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(Verdict {
            target: OpaqueHash::decode(input)?,
            age: u32::decode(input)?,
            votes: decode_fixed_seq(input, spec.judgment_quorum())?,
        })
    }
}

/// A validator that guaranteed a report judged invalid.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Culprit {
    /// The hash of the offending report.
    pub target: OpaqueHash,
    /// The culprit's Ed25519 key.
    pub key: Ed25519Key,
    /// The culprit's own guarantee signature, proving involvement.
    pub signature: Ed25519Signature,
}

impl JamEncode for Culprit {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.target.encode_to(dest);
        dest.extend_from_slice(&self.key);
        self.signature.encode_to(dest);
    }
}

impl JamDecode for Culprit {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(Culprit {
            target: OpaqueHash::decode(input)?,
            key: <[u8; 32]>::decode(input)?,
            signature: Ed25519Signature::decode(input)?,
        })
    }
}

/// A validator whose judgment contradicted the verdict.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Fault {
    /// The hash of the report in question.
    pub target: OpaqueHash,
    /// The vote the faulty validator cast.
    pub vote: bool,
    /// The faulty validator's Ed25519 key.
    pub key: Ed25519Key,
    /// The contradicting judgment signature.
    pub signature: Ed25519Signature,
}

impl JamEncode for Fault {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        self.target.encode_to(dest);
        self.vote.encode_to(dest);
        dest.extend_from_slice(&self.key);
        self.signature.encode_to(dest);
    }
}

impl JamDecode for Fault {
    fn decode(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(Fault {
            target: OpaqueHash::decode(input)?,
            vote: bool::decode(input)?,
            key: <[u8; 32]>::decode(input)?,
            signature: Ed25519Signature::decode(input)?,
        })
    }
}

/// The disputes extrinsic: three consecutive variable sequences.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct DisputesExtrinsic {
    /// Supermajority verdicts.
    pub verdicts: Vec<Verdict>,
    /// Guarantors of reports judged invalid.
    pub culprits: Vec<Culprit>,
    /// Judges whose votes contradicted the verdict.
    pub faults: Vec<Fault>,
}

impl DisputesExtrinsic {
    fn encode_to(&self, dest: &mut Vec<u8>) {
        encode_compact(self.verdicts.len() as u64, dest);
        for verdict in &self.verdicts {
            verdict.encode_to(dest);
        }
        self.culprits.encode_to(dest);
        self.faults.encode_to(dest);
    }

    fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        let verdict_count = decode_compact(input)? as usize;
        let mut verdicts = Vec::with_capacity(verdict_count.min(64));
        for _ in 0..verdict_count {
            verdicts.push(Verdict::decode(spec, input)?);
        }
        Ok(DisputesExtrinsic {
            verdicts,
            culprits: Vec::<Culprit>::decode(input)?,
            faults: Vec::<Fault>::decode(input)?,
        })
    }

    /// True when no disputes material is present.
    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty() && self.culprits.is_empty() && self.faults.is_empty()
    }
}

/// The six extrinsic sections of a block.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Extrinsic {
    /// Safrole ticket submissions.
    pub tickets: Vec<TicketEnvelope>,
    /// Preimage provisions.
    pub preimages: Vec<Preimage>,
    /// Guaranteed work reports.
    pub guarantees: Vec<ReportGuarantee>,
    /// Availability assurances.
    pub assurances: Vec<AvailAssurance>,
    /// Dispute verdicts and offender evidence.
    pub disputes: DisputesExtrinsic,
    /// Reserved for future protocol extensions; must currently be empty.
    pub reserved: Vec<u8>,
}

impl Extrinsic {
    /// Returns the canonical encoding.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_to(&mut out);
        out
    }

    /// Appends the canonical encoding to `dest`.
    pub fn encode_to(&self, dest: &mut Vec<u8>) {
        self.tickets.encode_to(dest);
        self.preimages.encode_to(dest);
        self.guarantees.encode_to(dest);
        encode_compact(self.assurances.len() as u64, dest);
        for assurance in &self.assurances {
            assurance.encode_to(dest);
        }
        self.disputes.encode_to(dest);
        self.reserved.encode_to(dest);
    }

    /// Decodes an extrinsic under the given chain spec.
    pub fn decode(spec: &ChainSpec, input: &mut &[u8]) -> Result<Self, CodecError> {
        let tickets = decode_bounded_vec(input, spec.max_tickets_per_extrinsic as usize)?;
        let preimages = Vec::<Preimage>::decode(input)?;
        let guarantees = decode_bounded_vec(input, spec.num_cores as usize)?;
        let assurance_count = decode_compact(input)? as usize;
        if assurance_count > spec.num_validators as usize {
            return Err(CodecError::LengthMismatch {
                expected: spec.num_validators as usize,
                got: assurance_count,
            });
        }
        let mut assurances = Vec::with_capacity(assurance_count);
        for _ in 0..assurance_count {
            assurances.push(AvailAssurance::decode(spec, input)?);
        }
        Ok(Extrinsic {
            tickets,
            preimages,
            guarantees,
            assurances,
            disputes: DisputesExtrinsic::decode(spec, input)?,
            reserved: Vec::<u8>::decode(input)?,
        })
    }
}

/// A complete block: header plus extrinsic.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Block {
    /// The block header.
    pub header: Header,
    /// The block extrinsic.
    pub extrinsic: Extrinsic,
}

impl Block {
    /// Returns the wire encoding `encode(Header) ‖ encode(Extrinsic)`.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.header.encode();
        self.extrinsic.encode_to(&mut out);
        out
    }

    /// Decodes a block under the given chain spec, requiring exact
    /// consumption of the input.
    pub fn decode_all(spec: &ChainSpec, bytes: &[u8]) -> Result<Self, CodecError> {
        let mut cursor = bytes;
        let header = Header::decode(spec, &mut cursor)?;
        let extrinsic = Extrinsic::decode(spec, &mut cursor)?;
        if !cursor.is_empty() {
            return Err(CodecError::LengthMismatch {
                expected: bytes.len() - cursor.len(),
                got: bytes.len(),
            });
        }
        Ok(Block { header, extrinsic })
    }
}
