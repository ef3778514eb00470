// Path: crates/types/src/error/mod.rs
//! Core error types for the Marmalade kernel.
//!
//! Every fallible operation in the workspace returns one of these tagged
//! enums; failure is never signalled through sentinel values or ambient
//! mechanisms.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised by the canonical JAM codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The input ended before the value was fully decoded.
    #[error("Unexpected end of input")]
    Truncated,
    /// A compact integer was not encoded in its minimal mode.
    #[error("Compact integer not in minimal form")]
    Overlong,
    /// A length did not match what the context prescribes.
    #[error("Length mismatch. Expected {expected}, got {got}")]
    LengthMismatch {
        /// The length the context requires.
        expected: usize,
        /// The length actually observed.
        got: usize,
    },
    /// A boolean octet was neither `0x00` nor `0x01`.
    #[error("Invalid boolean octet {0:#04x}")]
    BadBoolean(u8),
    /// Dictionary keys were not in strictly ascending lexicographic order.
    #[error("Dictionary keys out of order")]
    DictKeyDisorder,
    /// A value exceeded the range of its fixed-width encoding.
    #[error("Value does not fit the fixed-width encoding")]
    Overflow,
}

impl ErrorCode for CodecError {
    fn code(&self) -> &'static str {
        match self {
            Self::Truncated => "CODEC_TRUNCATED",
            Self::Overlong => "CODEC_OVERLONG",
            Self::LengthMismatch { .. } => "CODEC_LENGTH_MISMATCH",
            Self::BadBoolean(_) => "CODEC_BAD_BOOLEAN",
            Self::DictKeyDisorder => "CODEC_DICT_KEY_DISORDER",
            Self::Overflow => "CODEC_OVERFLOW",
        }
    }
}

/// Errors raised while validating a candidate block header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// The header's timeslot does not advance past the most recent block.
    #[error("Timeslot {got} does not advance past {latest}")]
    BadSlot {
        /// The most recently imported timeslot.
        latest: u32,
        /// The timeslot carried by the candidate header.
        got: u32,
    },
    /// The header's parent hash is not in recent history (or genesis).
    #[error("Unknown parent hash {0}")]
    BadParent(String),
    /// The header's prior state root does not match the current world state.
    #[error("Prior state root mismatch. Expected {expected}, got {got}")]
    BadPriorStateRoot {
        /// The root of the current world state.
        expected: String,
        /// The root claimed by the header.
        got: String,
    },
    /// The epoch mark is missing, spurious, or carries wrong content.
    #[error("Invalid epoch mark: {0}")]
    InvalidEpochMark(String),
    /// The winners mark is missing, spurious, or carries wrong content.
    #[error("Invalid tickets mark: {0}")]
    InvalidTicketsMark(String),
    /// The offenders mark fails length or membership plausibility checks.
    #[error("Invalid offenders mark: {0}")]
    InvalidOffendersMark(String),
    /// The author index is outside the active validator set.
    #[error("Author index {got} out of bounds for {count} validators")]
    InvalidAuthorIndex {
        /// The number of validators in the active set.
        count: usize,
        /// The index carried by the header.
        got: u16,
    },
    /// The seal signature failed verification against the slot's seal key.
    #[error("Seal signature verification failed")]
    BadSealSignature,
    /// The entropy VRF signature failed verification.
    #[error("VRF signature verification failed")]
    BadVrfSignature,
    /// The author's key does not own the slot's seal key.
    #[error("Author does not hold the seal key for this slot")]
    UnexpectedAuthor,
    /// The block's extrinsic hash does not commit to its extrinsic.
    #[error("Extrinsic hash mismatch")]
    BadExtrinsicHash,
    /// A codec failure while re-encoding header material.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ErrorCode for HeaderError {
    fn code(&self) -> &'static str {
        match self {
            Self::BadSlot { .. } => "HEADER_BAD_SLOT",
            Self::BadParent(_) => "HEADER_BAD_PARENT",
            Self::BadPriorStateRoot { .. } => "HEADER_BAD_PRIOR_STATE_ROOT",
            Self::InvalidEpochMark(_) => "HEADER_INVALID_EPOCH_MARK",
            Self::InvalidTicketsMark(_) => "HEADER_INVALID_TICKETS_MARK",
            Self::InvalidOffendersMark(_) => "HEADER_INVALID_OFFENDERS_MARK",
            Self::InvalidAuthorIndex { .. } => "HEADER_INVALID_AUTHOR_INDEX",
            Self::BadSealSignature => "HEADER_BAD_SEAL_SIGNATURE",
            Self::BadVrfSignature => "HEADER_BAD_VRF_SIGNATURE",
            Self::UnexpectedAuthor => "HEADER_UNEXPECTED_AUTHOR",
            Self::BadExtrinsicHash => "HEADER_BAD_EXTRINSIC_HASH",
            Self::Codec(e) => e.code(),
        }
    }
}

/// Rejection reasons for Safrole ticket submissions.
///
/// The variants form a disjoint taxonomy: exactly one applies to any
/// rejected ticket.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TicketError {
    /// Tickets were submitted outside the contest prefix of the epoch.
    #[error("Ticket submitted outside the contest period")]
    BadSlot,
    /// The ticket's attempt index is at or above the per-validator limit.
    #[error("Ticket attempt {got} exceeds limit {limit}")]
    BadTicketAttempt {
        /// The configured per-validator attempt limit.
        limit: u8,
        /// The attempt index carried by the ticket.
        got: u8,
    },
    /// The ring VRF proof did not verify against the epoch ring root.
    #[error("Ticket ring proof verification failed")]
    BadTicketProof,
    /// Tickets in the extrinsic were not sorted by VRF output.
    #[error("Tickets not in ascending VRF-output order")]
    BadTicketOrder,
    /// The ticket is already present in the accumulator.
    #[error("Duplicate ticket")]
    DuplicateTicket,
    /// More tickets were submitted than the extrinsic permits.
    #[error("Unexpected ticket: {0}")]
    UnexpectedTicket(String),
}

impl ErrorCode for TicketError {
    fn code(&self) -> &'static str {
        match self {
            Self::BadSlot => "TICKET_BAD_SLOT",
            Self::BadTicketAttempt { .. } => "TICKET_BAD_ATTEMPT",
            Self::BadTicketProof => "TICKET_BAD_PROOF",
            Self::BadTicketOrder => "TICKET_BAD_ORDER",
            Self::DuplicateTicket => "TICKET_DUPLICATE",
            Self::UnexpectedTicket(_) => "TICKET_UNEXPECTED",
        }
    }
}

/// Errors raised by the deterministic core-assignment procedure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    /// A validator index is outside the configured validator count.
    #[error("Validator index {got} out of bounds for {count} validators")]
    InvalidValidatorIndex {
        /// The configured validator count.
        count: usize,
        /// The offending index.
        got: u16,
    },
    /// A core index is outside the configured core count.
    #[error("Core index {got} out of bounds for {count} cores")]
    InvalidCoreIndex {
        /// The configured core count.
        count: usize,
        /// The offending index.
        got: u16,
    },
    /// The entropy input was not exactly 32 octets.
    #[error("Entropy must be 32 octets, got {0}")]
    InvalidEntropyLength(usize),
    /// A guarantor signature failed verification.
    #[error("Guarantor signature from validator {0} failed verification")]
    BadGuarantorSignature(u16),
    /// A report lacked signatures from the full co-guarantor group.
    #[error("Incomplete guarantor group for core {core}: {got}/{need} signatures")]
    IncompleteGuarantorGroup {
        /// The core the report targets.
        core: u16,
        /// The number of valid signatures presented.
        got: usize,
        /// The number of co-guarantors assigned to the core.
        need: usize,
    },
}

impl ErrorCode for AssignmentError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidValidatorIndex { .. } => "ASSIGN_INVALID_VALIDATOR_INDEX",
            Self::InvalidCoreIndex { .. } => "ASSIGN_INVALID_CORE_INDEX",
            Self::InvalidEntropyLength(_) => "ASSIGN_INVALID_ENTROPY_LENGTH",
            Self::BadGuarantorSignature(_) => "ASSIGN_BAD_GUARANTOR_SIGNATURE",
            Self::IncompleteGuarantorGroup { .. } => "ASSIGN_INCOMPLETE_GROUP",
        }
    }
}

/// Errors related to the state tree or the state service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The requested component or key was not found in the state.
    #[error("Key not found in state")]
    KeyNotFound,
    /// A component failed an internal invariant check.
    #[error("Invariant violated: {0}")]
    InvariantViolated(String),
    /// An error occurred during state deserialization.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The transition's parent state is no longer the committed state.
    #[error("Transition does not extend the committed state")]
    NoOpenTransition,
    /// The decoded state disagrees with its recomputed merkle root.
    ///
    /// This is fatal corruption; callers abort after a final telemetry event.
    #[error("State root divergence. Expected {expected}, recomputed {got}")]
    RootDivergence {
        /// The committed root.
        expected: String,
        /// The recomputed root.
        got: String,
    },
}

impl ErrorCode for StateError {
    fn code(&self) -> &'static str {
        match self {
            Self::KeyNotFound => "STATE_KEY_NOT_FOUND",
            Self::InvariantViolated(_) => "STATE_INVARIANT_VIOLATED",
            Self::Decode(_) => "STATE_DECODE_ERROR",
            Self::NoOpenTransition => "STATE_NO_OPEN_TRANSITION",
            Self::RootDivergence { .. } => "STATE_ROOT_DIVERGENCE",
        }
    }
}

/// Terminal results of a PVM invocation that did not produce output.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PvmError {
    /// The invocation exhausted its gas allowance.
    #[error("Out of gas")]
    OutOfGas,
    /// The guest program trapped.
    #[error("Guest panic")]
    Panic,
    /// The invocation was malformed or the service code was unavailable.
    #[error("Bad invocation")]
    Bad,
    /// The produced output exceeded the configured size bound.
    #[error("Output too big")]
    Big,
}

impl PvmError {
    /// Collapses all non-out-of-gas terminal results to [`PvmError::Bad`],
    /// preserving `Big` which is distinguished by the protocol.
    pub fn collapse(self) -> Self {
        match self {
            Self::OutOfGas => Self::OutOfGas,
            Self::Big => Self::Big,
            Self::Panic | Self::Bad => Self::Bad,
        }
    }
}

impl ErrorCode for PvmError {
    fn code(&self) -> &'static str {
        match self {
            Self::OutOfGas => "PVM_OOG",
            Self::Panic => "PVM_PANIC",
            Self::Bad => "PVM_BAD",
            Self::Big => "PVM_BIG",
        }
    }
}

/// Errors raised while loading or validating a chain spec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// A numeric parameter is zero or otherwise out of its legal range.
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// The chain-spec field name.
        name: &'static str,
        /// Why the value is rejected.
        reason: String,
    },
    /// The spec names a protocol version this build does not understand.
    #[error("Unsupported protocol version {0}")]
    UnsupportedVersion(String),
}

impl ErrorCode for SpecError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "SPEC_INVALID_PARAMETER",
            Self::UnsupportedVersion(_) => "SPEC_UNSUPPORTED_VERSION",
        }
    }
}

/// Errors raised while authoring a block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorError {
    /// The slot's seal authority does not belong to the local key.
    #[error("Slot {0} is not sealed by the local key")]
    NotOurSlot(u32),
    /// The local key is not in the active validator set.
    #[error("Local key is not an active validator")]
    UnknownKey,
    /// A capability backend failed while signing.
    #[error("Signing backend failure: {0}")]
    Backend(String),
}

impl ErrorCode for AuthorError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotOurSlot(_) => "AUTHOR_NOT_OUR_SLOT",
            Self::UnknownKey => "AUTHOR_UNKNOWN_KEY",
            Self::Backend(_) => "AUTHOR_BACKEND_FAILURE",
        }
    }
}

/// Errors raised by the telemetry client.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The underlying transport failed.
    #[error("Telemetry transport error: {0}")]
    Transport(String),
    /// An event payload could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ErrorCode for TelemetryError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TELEMETRY_TRANSPORT_ERROR",
            Self::Codec(e) => e.code(),
        }
    }
}

/// The top-level error produced by block import.
///
/// Wraps the stage-specific taxonomies so the importer can surface a single
/// tagged reason per rejected block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// The header failed one of the pre-transition checks.
    #[error(transparent)]
    Header(#[from] HeaderError),
    /// A ticket in the extrinsic was rejected.
    #[error(transparent)]
    Ticket(#[from] TicketError),
    /// A guarantee failed core-assignment or signature checks.
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    /// The block or an extrinsic element failed to decode.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The state service rejected the transition.
    #[error(transparent)]
    State(#[from] StateError),
    /// A preimage in the extrinsic was unsolicited, duplicated, or out of
    /// order.
    #[error("Invalid preimage: {0}")]
    BadPreimage(String),
    /// A guarantee targeted an engaged core, a stale slot, or a known
    /// package.
    #[error("Invalid guarantee: {0}")]
    BadGuarantee(String),
    /// An availability assurance failed its anchor or signature checks.
    #[error("Invalid assurance: {0}")]
    BadAssurance(String),
    /// A dispute verdict, culprit, or fault was malformed.
    #[error("Invalid dispute: {0}")]
    BadDispute(String),
    /// A capability backend failed (crypto provider, persistence).
    ///
    /// Not a validation verdict: the block could not be judged at all.
    #[error("Capability backend failure: {0}")]
    Backend(String),
}

impl ErrorCode for ImportError {
    fn code(&self) -> &'static str {
        match self {
            Self::Header(e) => e.code(),
            Self::Ticket(e) => e.code(),
            Self::Assignment(e) => e.code(),
            Self::Codec(e) => e.code(),
            Self::State(e) => e.code(),
            Self::BadPreimage(_) => "IMPORT_BAD_PREIMAGE",
            Self::BadGuarantee(_) => "IMPORT_BAD_GUARANTEE",
            Self::BadAssurance(_) => "IMPORT_BAD_ASSURANCE",
            Self::BadDispute(_) => "IMPORT_BAD_DISPUTE",
            Self::Backend(_) => "IMPORT_BACKEND_FAILURE",
        }
    }
}
