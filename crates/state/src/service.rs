// Path: crates/state/src/service.rs

//! The state service owning the world state.
//!
//! All mutation flows through here. A block import opens a [`Transition`],
//! works on a copy-on-write snapshot, and hands it back to either
//! [`StateService::commit`] or [`StateService::abort`]. The committed state
//! is only ever replaced wholesale, so a rejected block leaves no trace.
//! Dropping a transition anywhere (including at a cancelled suspension
//! point) simply discards the working copy; the service itself holds no
//! record of it.

use crate::components::WorldState;
use crate::statekey::Component;
use marmalade_types::config::ChainSpec;
use marmalade_types::error::StateError;
use marmalade_types::primitives::StateRootHash;
use tracing::{debug, warn};

/// An in-flight state transition.
///
/// Holds the working copy of the world. A transition is pinned to the
/// committed state it was opened from; once any transition commits, every
/// other transition from the same parent is stale and can no longer commit.
#[derive(Debug)]
pub struct Transition {
    /// The mutable working state.
    pub working: WorldState,
    /// The root of the state this transition started from.
    pub parent_root: StateRootHash,
    generation: u64,
}

/// The exclusive owner of the committed world state.
#[derive(Debug)]
pub struct StateService {
    spec: ChainSpec,
    current: WorldState,
    // Root of `current`, cached because merklization is the expensive part
    // of the import hot path and the committed state only changes here.
    root: StateRootHash,
    // Bumped on every commit; pairs a Transition with its parent state.
    generation: u64,
}

impl StateService {
    /// Wraps an initial world state (usually genesis).
    pub fn new(spec: ChainSpec, initial: WorldState) -> Self {
        let root = initial.state_root(&spec);
        StateService {
            spec,
            current: initial,
            root,
            generation: 0,
        }
    }

    /// The chain spec the service validates against.
    pub fn spec(&self) -> &ChainSpec {
        &self.spec
    }

    /// The committed world state.
    pub fn current(&self) -> &WorldState {
        &self.current
    }

    /// The root of the committed world state.
    pub fn state_root(&self) -> StateRootHash {
        self.root
    }

    /// The canonical encoding of a committed component.
    pub fn get_component(&self, component: Component) -> Vec<u8> {
        self.current.encode_component(&self.spec, component)
    }

    /// Opens a transition over a snapshot of the committed state.
    pub fn begin_transition(&self) -> Transition {
        Transition {
            working: self.current.clone(),
            parent_root: self.root,
            generation: self.generation,
        }
    }

    /// Commits a transition, atomically replacing the world state.
    ///
    /// Persistence may block, so commit is a suspension point; the
    /// in-memory swap itself happens last and never partially. A transition
    /// whose parent state has since been replaced is rejected.
    pub async fn commit(&mut self, transition: Transition) -> Result<StateRootHash, StateError> {
        if transition.generation != self.generation {
            return Err(StateError::NoOpenTransition);
        }
        transition.working.check_invariants(&self.spec)?;
        let root = transition.working.state_root(&self.spec);
        self.current = transition.working;
        self.root = root;
        self.generation += 1;
        debug!(target: "state", root = %root, "state committed");
        Ok(root)
    }

    /// Aborts a transition, discarding the working state.
    ///
    /// Equivalent to dropping it; the explicit form exists so rejection
    /// sites read as what they are.
    pub fn abort(&self, transition: Transition) {
        warn!(target: "state", parent_root = %transition.parent_root, "transition aborted");
        drop(transition);
    }

    /// Recomputes the committed root and checks it against the cache.
    ///
    /// A mismatch means the in-memory state diverged from its commitment,
    /// which is fatal corruption.
    pub fn verify_integrity(&self) -> Result<(), StateError> {
        let recomputed = self.current.state_root(&self.spec);
        if recomputed != self.root {
            return Err(StateError::RootDivergence {
                expected: self.root.to_string(),
                got: recomputed.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::{dev_validators, genesis_state};
    use marmalade_types::primitives::OpaqueHash;
    use std::sync::Arc;

    fn service() -> StateService {
        let spec = ChainSpec::tiny();
        let state = genesis_state(&spec, &dev_validators(&spec), OpaqueHash::ZERO);
        StateService::new(spec, state)
    }

    #[tokio::test]
    async fn commit_replaces_the_state_and_root() {
        let mut service = service();
        let before = service.state_root();
        let mut transition = service.begin_transition();
        transition.working.the_time = 5;
        let after = service.commit(transition).await.unwrap();
        assert_ne!(before, after);
        assert_eq!(service.state_root(), after);
        assert_eq!(service.current().the_time, 5);
    }

    #[tokio::test]
    async fn abort_leaves_the_prior_state_untouched() {
        let mut service = service();
        let before = service.state_root();
        let mut transition = service.begin_transition();
        transition.working.the_time = 99;
        Arc::make_mut(&mut transition.working.entropy).accumulate(&[1u8; 32]);
        service.abort(transition);
        assert_eq!(service.state_root(), before);
        assert_eq!(service.current().the_time, 0);
        // A fresh transition still commits afterwards.
        let transition = service.begin_transition();
        service.commit(transition).await.unwrap();
    }

    #[tokio::test]
    async fn stale_transition_cannot_commit() {
        let mut service = service();
        let stale = service.begin_transition();
        let fresh = service.begin_transition();
        service.commit(fresh).await.unwrap();
        assert!(matches!(
            service.commit(stale).await,
            Err(StateError::NoOpenTransition)
        ));
    }

    #[tokio::test]
    async fn dropped_transition_does_not_wedge_the_service() {
        let mut service = service();
        {
            let _cancelled = service.begin_transition();
            // Dropped here, as when an import is cancelled mid-await.
        }
        let transition = service.begin_transition();
        service.commit(transition).await.unwrap();
    }

    #[test]
    fn integrity_check_passes_on_a_healthy_service() {
        service().verify_integrity().unwrap();
    }

    #[tokio::test]
    async fn invariant_violations_fail_the_commit() {
        let mut service = service();
        let mut transition = service.begin_transition();
        Arc::make_mut(&mut transition.working.staging_set).0.pop();
        assert!(matches!(
            service.commit(transition).await,
            Err(StateError::InvariantViolated(_))
        ));
    }
}
