// Path: crates/api/src/events.rs

//! Kernel event definitions and the subscription surface.
//!
//! Events are emitted by the importer after the corresponding state is
//! committed, in import order. Subscribers receive them in-order through a
//! broadcast channel; a lagging subscriber loses old events rather than
//! back-pressuring the importer.

use marmalade_types::primitives::{EpochIndex, HeaderHash, StateRootHash, TimeSlot};
use tokio::sync::broadcast;

/// An ordered notification from the import pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelEvent {
    /// An epoch boundary was crossed during import.
    EpochTransition {
        /// The epoch now in force.
        epoch: EpochIndex,
        /// The first slot of the new epoch.
        first_slot: TimeSlot,
    },
    /// A block passed validation and its transition was applied.
    BlockImported {
        /// The imported header's hash.
        header_hash: HeaderHash,
        /// The imported block's timeslot.
        timeslot: TimeSlot,
    },
    /// The post-state of an imported block was committed.
    StateCommitted {
        /// The committed state root.
        state_root: StateRootHash,
    },
}

/// The in-order event fan-out used by the importer.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<KernelEvent>,
}

impl EventBus {
    /// Creates a bus retaining up to `capacity` undelivered events per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        EventBus { sender }
    }

    /// Emits an event to all current subscribers.
    ///
    /// Emission with no subscribers is not an error; events are
    /// notifications, not commands.
    pub fn emit(&self, event: KernelEvent) {
        let _ = self.sender.send(event);
    }

    /// Opens a new subscription starting at the next emitted event.
    pub fn subscribe(&self) -> broadcast::Receiver<KernelEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        EventBus::new(1024)
    }
}
