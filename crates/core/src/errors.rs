use thiserror::Error;

use crate::gate::GateTransitionError;
use crate::session::StoreError;
use crate::tools::ToolError;

/// Opaque failure from the reasoning backend. The proposer is a remote
/// collaborator; callers only ever see a single error condition.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("proposer call failed: {0}")]
pub struct ProposerError(pub String);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Gate(#[from] GateTransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Proposer(#[from] ProposerError),
    #[error("thread `{thread_id}` already has a decision outstanding")]
    DecisionOutstanding { thread_id: String },
    #[error("thread `{thread_id}` has no plan in review")]
    NoPlanInReview { thread_id: String },
}

#[cfg(test)]
mod tests {
    use crate::errors::{EngineError, ProposerError};
    use crate::gate::{GateState, GateTransitionError};
    use crate::gate::GateEvent;

    #[test]
    fn gate_error_maps_transparently() {
        let engine_error = EngineError::from(GateTransitionError::InvalidTransition {
            state: GateState::AwaitingProposal,
            event: GateEvent::DecisionApproved,
        });

        assert!(engine_error.to_string().contains("invalid transition"));
    }

    #[test]
    fn proposer_error_reads_as_single_failure_condition() {
        let engine_error = EngineError::from(ProposerError("backend timeout".to_owned()));
        assert_eq!(engine_error.to_string(), "proposer call failed: backend timeout");
    }
}
