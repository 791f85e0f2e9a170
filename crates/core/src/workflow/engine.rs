use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::action::ProposedAction;
use crate::domain::decision::Decision;
use crate::domain::message::{Message, ThreadId, ToolCallRequest};
use crate::errors::{EngineError, ProposerError};
use crate::gate::{render_review_prompt, GateEngine, GateEvent, GateState, ToolApprovalGate};
use crate::session::{InMemoryThreadStore, ThreadState};
use crate::tools::ToolRegistry;

/// What the proposer produced for one turn: either a terminal answer
/// (no tool calls) or an answer plus candidate tool calls.
#[derive(Clone, Debug, PartialEq)]
pub struct Proposal {
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl Proposal {
    pub fn answer(content: impl Into<String>) -> Self {
        Self { content: content.into(), tool_calls: Vec::new() }
    }

    pub fn with_calls(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self { content: content.into(), tool_calls }
    }
}

/// The reasoning boundary. Implementations receive the full history plus
/// optional operator feedback and must not mutate anything on failure.
#[async_trait]
pub trait ActionProposer: Send + Sync {
    async fn propose(
        &self,
        history: &[Message],
        feedback: Option<&str>,
    ) -> Result<Proposal, ProposerError>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum TurnOutcome {
    /// The proposer answered without requesting a tool; the turn is done.
    Completed { reply: String },
    /// A tool call awaits an operator decision; the thread is checkpointed
    /// at the suspension point.
    Suspended { review_prompt: String },
    /// The operator rejected the pending call; nothing executed.
    Rejected,
    /// A decision arrived but nothing was pending; nothing changed.
    NothingPending,
}

/// Drives proposer -> approval gate -> tool execution for one thread at a
/// time. Suspension is a checkpoint in the store, not a blocked task: the
/// decision may arrive on a later tick or from another caller entirely.
pub struct ConversationEngine<P> {
    proposer: P,
    registry: ToolRegistry,
    store: Arc<InMemoryThreadStore>,
    gate: GateEngine<ToolApprovalGate>,
    audit: Arc<dyn AuditSink>,
}

impl<P> ConversationEngine<P>
where
    P: ActionProposer,
{
    pub fn new(
        proposer: P,
        registry: ToolRegistry,
        store: Arc<InMemoryThreadStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { proposer, registry, store, gate: GateEngine::default(), audit }
    }

    pub fn store(&self) -> &Arc<InMemoryThreadStore> {
        &self.store
    }

    /// Starts (or continues) a turn with operator input. Returns either a
    /// finished reply or the review prompt for a suspended tool call.
    pub async fn submit(
        &self,
        thread_id: &ThreadId,
        user_text: &str,
    ) -> Result<TurnOutcome, EngineError> {
        let mut state = self.store.checkout_or_create(thread_id).await;

        if state.gate == GateState::AwaitingDecision {
            return Err(EngineError::DecisionOutstanding { thread_id: thread_id.0.clone() });
        }
        // A closed turn does not close the thread; new input opens a new turn.
        if matches!(state.gate, GateState::Terminal | GateState::Rejected) {
            state.gate = self.gate.initial_state();
        }

        // Stage the user message so a proposer failure leaves no trace.
        let mut staged = state.messages.clone();
        staged.push(Message::user(user_text));
        let proposal = self.proposer.propose(&staged, None).await?;
        state.messages = staged;

        let correlation_id = Uuid::new_v4().to_string();
        self.apply_proposal(&mut state, proposal, &correlation_id)
    }

    /// Restores the checkpoint for the thread and applies the decision.
    /// Re-sending a decision after it has been consumed is a no-op.
    pub async fn resume(
        &self,
        thread_id: &ThreadId,
        decision: Decision,
    ) -> Result<TurnOutcome, EngineError> {
        let mut state = self.store.checkout(thread_id).await?;

        if state.gate != GateState::AwaitingDecision || state.pending_action.is_none() {
            return Ok(TurnOutcome::NothingPending);
        }

        let correlation_id = Uuid::new_v4().to_string();
        let context = self.audit_context(&state, &correlation_id);

        match decision {
            Decision::Approve => {
                let outcome = self.gate.apply_with_audit(
                    &state.gate,
                    &GateEvent::DecisionApproved,
                    self.audit.as_ref(),
                    &context,
                )?;
                state.gate = outcome.to;

                let Some(action) = state.take_pending() else {
                    return Ok(TurnOutcome::NothingPending);
                };

                match self.registry.execute(&action.tool_name, &action.arguments).await {
                    Ok(result) => {
                        self.audit.emit(
                            AuditEvent::new(
                                context.thread_id.clone(),
                                correlation_id.clone(),
                                "tool.executed",
                                AuditCategory::Tool,
                                context.actor.clone(),
                                AuditOutcome::Success,
                            )
                            .with_metadata("tool", action.tool_name.clone()),
                        );
                        state.messages.push(Message::tool_result(&action.tool_name, result));

                        let outcome = self.gate.apply_with_audit(
                            &state.gate,
                            &GateEvent::ToolCompleted,
                            self.audit.as_ref(),
                            &context,
                        )?;
                        state.gate = outcome.to;

                        let proposal = self.proposer.propose(&state.messages, None).await?;
                        self.apply_proposal(&mut state, proposal, &correlation_id)
                    }
                    Err(error) => {
                        self.audit.emit(
                            AuditEvent::new(
                                context.thread_id.clone(),
                                correlation_id.clone(),
                                "tool.failed",
                                AuditCategory::Tool,
                                context.actor.clone(),
                                AuditOutcome::Failed,
                            )
                            .with_metadata("tool", action.tool_name.clone())
                            .with_metadata("error", error.to_string()),
                        );
                        let outcome = self.gate.apply_with_audit(
                            &state.gate,
                            &GateEvent::ToolFailed,
                            self.audit.as_ref(),
                            &context,
                        )?;
                        state.gate = outcome.to;
                        Err(EngineError::Tool(error))
                    }
                }
            }
            Decision::Reject => {
                let outcome = self.gate.apply_with_audit(
                    &state.gate,
                    &GateEvent::DecisionRejected,
                    self.audit.as_ref(),
                    &context,
                )?;
                state.gate = outcome.to;
                state.pending_action = None;

                let outcome = self.gate.apply_with_audit(
                    &state.gate,
                    &GateEvent::TurnClosed,
                    self.audit.as_ref(),
                    &context,
                )?;
                state.gate = outcome.to;
                Ok(TurnOutcome::Rejected)
            }
            Decision::Modify { feedback } => {
                // Proposer runs first: if it fails, the pending action and
                // the gate position survive for a safe retry.
                let proposal = self.proposer.propose(&state.messages, Some(&feedback)).await?;

                let outcome = self.gate.apply_with_audit(
                    &state.gate,
                    &GateEvent::DecisionModified,
                    self.audit.as_ref(),
                    &context,
                )?;
                state.gate = outcome.to;
                state.pending_action = None;

                let outcome = self.gate.apply_with_audit(
                    &state.gate,
                    &GateEvent::RevisionStarted,
                    self.audit.as_ref(),
                    &context,
                )?;
                state.gate = outcome.to;

                self.apply_proposal(&mut state, proposal, &correlation_id)
            }
        }
    }

    pub async fn reset(&self, thread_id: &ThreadId) -> Result<(), EngineError> {
        self.store.reset(thread_id).await?;
        Ok(())
    }

    fn apply_proposal(
        &self,
        state: &mut ThreadState,
        proposal: Proposal,
        correlation_id: &str,
    ) -> Result<TurnOutcome, EngineError> {
        let context = self.audit_context(state, correlation_id);

        let assistant = Message::assistant(proposal.content.clone(), proposal.tool_calls.clone());
        let origin_message_id = assistant.id().clone();
        state.messages.push(assistant);

        let mut calls = proposal.tool_calls;
        if calls.is_empty() {
            let outcome = self.gate.apply_with_audit(
                &state.gate,
                &GateEvent::AnswerEmitted,
                self.audit.as_ref(),
                &context,
            )?;
            state.gate = outcome.to;
            return Ok(TurnOutcome::Completed { reply: proposal.content });
        }

        // Observed single-tool-per-turn behavior: only the first candidate
        // call is reviewed, the rest are dropped.
        let dropped = calls.len().saturating_sub(1);
        if dropped > 0 {
            tracing::warn!(
                event_name = "gate.extra_tool_calls_dropped",
                thread_id = %state.thread_id,
                correlation_id = %correlation_id,
                dropped,
                "only the first proposed tool call is submitted for review"
            );
        }

        let action =
            ProposedAction::from_call(calls.remove(0), origin_message_id, proposal.content);
        let review_prompt = render_review_prompt(&action);
        state.set_pending(action)?;

        let outcome = self.gate.apply_with_audit(
            &state.gate,
            &GateEvent::ProposalEmitted,
            self.audit.as_ref(),
            &context,
        )?;
        state.gate = outcome.to;

        Ok(TurnOutcome::Suspended { review_prompt })
    }

    fn audit_context(&self, state: &ThreadState, correlation_id: &str) -> AuditContext {
        AuditContext::new(
            Some(state.thread_id.0.clone()),
            correlation_id.to_string(),
            "conversation-engine",
        )
    }
}
