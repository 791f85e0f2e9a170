use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::action::ProposedAction;
use crate::domain::plan::Plan;
use crate::gate::states::{GateAction, GateEvent, GateKind, GateState, TransitionOutcome};

pub trait GateDefinition {
    fn kind(&self) -> GateKind;
    fn initial_state(&self) -> GateState;
    fn transition(
        &self,
        current: &GateState,
        event: &GateEvent,
    ) -> Result<TransitionOutcome, GateTransitionError>;
}

/// Gate for single tool calls: approve executes the stored call, reject
/// closes the turn, modify sends the proposer back around.
#[derive(Clone, Debug, Default)]
pub struct ToolApprovalGate;

impl GateDefinition for ToolApprovalGate {
    fn kind(&self) -> GateKind {
        GateKind::ToolApproval
    }

    fn initial_state(&self) -> GateState {
        GateState::AwaitingProposal
    }

    fn transition(
        &self,
        current: &GateState,
        event: &GateEvent,
    ) -> Result<TransitionOutcome, GateTransitionError> {
        transition_tool_approval(current, event)
    }
}

/// Gate for plan review: approve is terminal, reject regenerates a fresh
/// plan instead of closing the turn.
#[derive(Clone, Debug, Default)]
pub struct PlanReviewGate;

impl GateDefinition for PlanReviewGate {
    fn kind(&self) -> GateKind {
        GateKind::PlanReview
    }

    fn initial_state(&self) -> GateState {
        GateState::AwaitingProposal
    }

    fn transition(
        &self,
        current: &GateState,
        event: &GateEvent,
    ) -> Result<TransitionOutcome, GateTransitionError> {
        transition_plan_review(current, event)
    }
}

pub struct GateEngine<G> {
    gate: G,
}

impl<G> GateEngine<G>
where
    G: GateDefinition,
{
    pub fn new(gate: G) -> Self {
        Self { gate }
    }

    pub fn kind(&self) -> GateKind {
        self.gate.kind()
    }

    pub fn initial_state(&self) -> GateState {
        self.gate.initial_state()
    }

    pub fn apply(
        &self,
        current: &GateState,
        event: &GateEvent,
    ) -> Result<TransitionOutcome, GateTransitionError> {
        self.gate.transition(current, event)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: &GateState,
        event: &GateEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, GateTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit.thread_id.clone(),
                        audit.correlation_id.clone(),
                        "gate.transition_applied",
                        AuditCategory::Gate,
                        audit.actor.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", format!("{:?}", outcome.from))
                    .with_metadata("to", format!("{:?}", outcome.to))
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit.thread_id.clone(),
                        audit.correlation_id.clone(),
                        "gate.transition_rejected",
                        AuditCategory::Gate,
                        audit.actor.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for GateEngine<ToolApprovalGate> {
    fn default() -> Self {
        Self::new(ToolApprovalGate)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GateTransitionError {
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: GateState, event: GateEvent },
}

fn transition_tool_approval(
    current: &GateState,
    event: &GateEvent,
) -> Result<TransitionOutcome, GateTransitionError> {
    use GateAction::{CloseTurn, ExecuteTool, InvokeProposer, RenderReview};
    use GateEvent::{
        AnswerEmitted, DecisionApproved, DecisionModified, DecisionRejected, ProposalEmitted,
        RevisionStarted, ToolCompleted, ToolFailed, TurnClosed,
    };
    use GateState::{
        AwaitingDecision, AwaitingProposal, Executing, Rejected, Revising, Terminal,
    };

    let (to, actions) = match (current, event) {
        (AwaitingProposal, ProposalEmitted) => (AwaitingDecision, vec![RenderReview]),
        (AwaitingProposal, AnswerEmitted) => (Terminal, Vec::new()),
        (AwaitingDecision, DecisionApproved) => (Executing, vec![ExecuteTool]),
        (AwaitingDecision, DecisionRejected) => (Rejected, vec![CloseTurn]),
        (AwaitingDecision, DecisionModified) => (Revising, Vec::new()),
        (Executing, ToolCompleted) => (AwaitingProposal, vec![InvokeProposer]),
        (Executing, ToolFailed) => (Terminal, Vec::new()),
        (Revising, RevisionStarted) => (AwaitingProposal, vec![InvokeProposer]),
        (Rejected, TurnClosed) => (Terminal, Vec::new()),
        _ => {
            return Err(GateTransitionError::InvalidTransition {
                state: *current,
                event: *event,
            });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: *event, actions })
}

fn transition_plan_review(
    current: &GateState,
    event: &GateEvent,
) -> Result<TransitionOutcome, GateTransitionError> {
    use GateAction::{CloseTurn, InvokeProposer, RenderReview};
    use GateEvent::{
        DecisionApproved, DecisionModified, DecisionRejected, ProposalEmitted, RevisionStarted,
    };
    use GateState::{AwaitingDecision, AwaitingProposal, Revising, Terminal};

    let (to, actions) = match (current, event) {
        (AwaitingProposal, ProposalEmitted) => (AwaitingDecision, vec![RenderReview]),
        (AwaitingDecision, DecisionApproved) => (Terminal, vec![CloseTurn]),
        (AwaitingDecision, DecisionRejected) => (Revising, vec![InvokeProposer]),
        (AwaitingDecision, DecisionModified) => (Revising, vec![InvokeProposer]),
        (Revising, RevisionStarted) => (AwaitingProposal, vec![InvokeProposer]),
        _ => {
            return Err(GateTransitionError::InvalidTransition {
                state: *current,
                event: *event,
            });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: *event, actions })
}

/// Human-readable review text for a pending tool call: name, arguments,
/// rationale, and the accepted decision tokens.
pub fn render_review_prompt(action: &ProposedAction) -> String {
    let arguments = serde_json::to_string_pretty(&action.arguments)
        .unwrap_or_else(|_| "{}".to_string());

    let mut prompt = String::new();
    prompt.push_str("Tool approval required\n\n");
    prompt.push_str(&format!("Tool: {}\n", action.tool_name));
    prompt.push_str(&format!("Arguments:\n{arguments}\n"));
    if !action.rationale.trim().is_empty() {
        prompt.push_str(&format!("\nRationale: {}\n", action.rationale.trim()));
    }
    prompt.push_str("\nApprove? [a]pprove / [r]eject / [m]odify");
    prompt
}

/// Review text for a drafted plan, mirroring the tool prompt's shape.
pub fn render_plan_review(plan: &Plan) -> String {
    format!(
        "Current Plan\n--------------------------\n{}\n\nActions:\n[a] Approve\n[r] Reject (generate new plan)\n[m] Modify (provide feedback)",
        plan.body
    )
}
