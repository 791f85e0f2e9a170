use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateKind {
    ToolApproval,
    PlanReview,
}

/// Position of a thread inside the approval workflow. `AwaitingDecision`
/// is the single suspension point: the thread stays there, across process
/// ticks, until an operator decision arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateState {
    AwaitingProposal,
    AwaitingDecision,
    Executing,
    Revising,
    Rejected,
    Terminal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateEvent {
    ProposalEmitted,
    AnswerEmitted,
    DecisionApproved,
    DecisionRejected,
    DecisionModified,
    ToolCompleted,
    ToolFailed,
    RevisionStarted,
    TurnClosed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateAction {
    RenderReview,
    ExecuteTool,
    InvokeProposer,
    CloseTurn,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: GateState,
    pub to: GateState,
    pub event: GateEvent,
    pub actions: Vec<GateAction>,
}
