// Path: crates/telemetry/src/jip3.rs

//! The JIP-3 wire format and client.
//!
//! A telemetry message is `encode[4]{size_LE} ‖ content`, where content is
//! `compact{timestamp_us} ‖ compact{event_type} ‖ payload`. A connection
//! opens with a node-info preamble carrying the peer's identity; the
//! preamble is sent exactly once per logical session. Reconnection after a
//! transport failure MUST NOT resend it, so the client tracks
//! `node_info_sent` separately from connection state.

use marmalade_types::codec::{encode_blob, encode_compact, JamEncode};
use marmalade_types::error::TelemetryError;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// Event types carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    /// A block passed verification.
    BlockVerified {
        /// Correlates the verification with later events for the block.
        event_id: u64,
    },
    /// A verified block finished execution.
    BlockExecuted {
        /// The event id of the matching `BlockVerified`.
        event_id: u64,
        /// Gas spent accumulating.
        accumulation_gas: u64,
    },
    /// A block was rejected.
    BlockVerificationFailed {
        /// The importing event id.
        event_id: u64,
        /// The tagged rejection reason's stable code.
        reason: String,
    },
    /// The node detected fatal state corruption and is about to abort.
    Fatal {
        /// The corruption description.
        reason: String,
    },
}

impl TelemetryEvent {
    fn event_type(&self) -> u64 {
        match self {
            TelemetryEvent::BlockVerified { .. } => 100,
            TelemetryEvent::BlockExecuted { .. } => 101,
            TelemetryEvent::BlockVerificationFailed { .. } => 102,
            TelemetryEvent::Fatal { .. } => 199,
        }
    }

    fn payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            TelemetryEvent::BlockVerified { event_id } => {
                encode_compact(*event_id, &mut out);
            }
            TelemetryEvent::BlockExecuted {
                event_id,
                accumulation_gas,
            } => {
                encode_compact(*event_id, &mut out);
                encode_compact(*accumulation_gas, &mut out);
            }
            TelemetryEvent::BlockVerificationFailed { event_id, reason } => {
                encode_compact(*event_id, &mut out);
                encode_blob(reason.as_bytes(), &mut out);
            }
            TelemetryEvent::Fatal { reason } => {
                encode_blob(reason.as_bytes(), &mut out);
            }
        }
        out
    }

    /// Frames the event for the wire.
    pub fn encode_message(&self, timestamp_us: u64) -> Vec<u8> {
        let mut content = Vec::new();
        encode_compact(timestamp_us, &mut content);
        encode_compact(self.event_type(), &mut content);
        content.extend_from_slice(&self.payload());
        frame(&content)
    }
}

/// The once-per-connection node identification preamble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    /// The telemetry protocol version.
    pub protocol_version: u32,
    /// The node's 32-octet peer identifier.
    pub peer_id: [u8; 32],
    /// The node's address: IPv6 octets and port.
    pub peer_address: ([u8; 16], u16),
    /// Free-form node capability flags.
    pub node_flags: [u8; 4],
    /// The implementation name, at most 32 octets.
    pub impl_name: String,
    /// The implementation version, at most 32 octets.
    pub impl_version: String,
    /// Additional information, at most 512 octets.
    pub additional_info: String,
}

impl NodeInfo {
    /// Frames the preamble for the wire, clamping the free-form strings to
    /// their declared bounds.
    pub fn encode_message(&self) -> Vec<u8> {
        let mut content = Vec::new();
        self.protocol_version.encode_to(&mut content);
        content.extend_from_slice(&self.peer_id);
        content.extend_from_slice(&self.peer_address.0);
        self.peer_address.1.encode_to(&mut content);
        content.extend_from_slice(&self.node_flags);
        encode_clamped(&self.impl_name, 32, &mut content);
        encode_clamped(&self.impl_version, 32, &mut content);
        encode_clamped(&self.additional_info, 512, &mut content);
        frame(&content)
    }
}

fn encode_clamped(value: &str, bound: usize, dest: &mut Vec<u8>) {
    let bytes = value.as_bytes();
    encode_blob(&bytes[..bytes.len().min(bound)], dest);
}

// `encode[4]{size_LE} ‖ content`.
fn frame(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + content.len());
    (content.len() as u32).encode_to(&mut out);
    out.extend_from_slice(content);
    out
}

/// The telemetry client.
///
/// Connection management is lazy: each send ensures a live transport,
/// reconnecting with a capped backoff. The node-info preamble goes out on
/// the first successful connection of the session and is never repeated,
/// even across reconnects.
pub struct TelemetryClient {
    endpoint: String,
    node_info: NodeInfo,
    stream: Option<TcpStream>,
    node_info_sent: bool,
    backoff: Duration,
}

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

impl TelemetryClient {
    /// Creates a client for `endpoint`; nothing connects until the first
    /// send.
    pub fn new(endpoint: impl Into<String>, node_info: NodeInfo) -> Self {
        TelemetryClient {
            endpoint: endpoint.into(),
            node_info,
            stream: None,
            node_info_sent: false,
            backoff: INITIAL_BACKOFF,
        }
    }

    /// True once the preamble has gone out this session.
    pub fn node_info_sent(&self) -> bool {
        self.node_info_sent
    }

    /// True while a transport is held.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Sends one event, (re)connecting as needed.
    pub async fn send(
        &mut self,
        event: &TelemetryEvent,
        timestamp_us: u64,
    ) -> Result<(), TelemetryError> {
        self.ensure_connected().await?;
        let message = event.encode_message(timestamp_us);
        if let Err(error) = self.write_all(&message).await {
            // One reconnect attempt per send; steady failures surface to
            // the caller, who treats telemetry as best-effort.
            warn!(target: "telemetry", %error, "send failed; reconnecting");
            self.stream = None;
            self.ensure_connected().await?;
            self.write_all(&message).await?;
        }
        Ok(())
    }

    async fn ensure_connected(&mut self) -> Result<(), TelemetryError> {
        if self.stream.is_some() {
            return Ok(());
        }
        tokio::time::sleep(self.backoff_delay()).await;
        let stream = TcpStream::connect(&self.endpoint)
            .await
            .map_err(|e| TelemetryError::Transport(e.to_string()))?;
        self.stream = Some(stream);
        self.backoff = INITIAL_BACKOFF;
        debug!(target: "telemetry", endpoint = %self.endpoint, "connected");

        // The preamble is per-session, not per-connection: a reconnect
        // after backoff continues the same session and must not repeat it.
        if !self.node_info_sent {
            let preamble = self.node_info.encode_message();
            self.write_all(&preamble).await?;
            self.node_info_sent = true;
        }
        Ok(())
    }

    fn backoff_delay(&mut self) -> Duration {
        if self.node_info_sent {
            let delay = self.backoff;
            self.backoff = (self.backoff * 2).min(MAX_BACKOFF);
            delay
        } else {
            // First connection of the session: no need to wait.
            Duration::ZERO
        }
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), TelemetryError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| TelemetryError::Transport("not connected".into()))?;
        stream
            .write_all(bytes)
            .await
            .map_err(|e| TelemetryError::Transport(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| TelemetryError::Transport(e.to_string()))
    }
}
