use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::decision::Decision;
use crate::domain::message::{Message, ThreadId};
use crate::domain::plan::{Plan, EMPTY_TASK_PLAN};
use crate::errors::{EngineError, ProposerError};
use crate::gate::{render_plan_review, GateEngine, GateEvent, GateState, PlanReviewGate};
use crate::session::{InMemoryThreadStore, ThreadState};

/// The planning side of the reasoning boundary: drafts a plan for a task
/// and revises it against operator feedback.
#[async_trait]
pub trait PlanProposer: Send + Sync {
    async fn draft(&self, task: &str) -> Result<String, ProposerError>;

    async fn revise(
        &self,
        task: &str,
        previous_plan: &str,
        feedback: &str,
    ) -> Result<String, ProposerError>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlanOutcome {
    /// The plan is suspended at review, waiting for a decision.
    InReview { plan: Plan, review_prompt: String },
    /// The operator approved; the plan is final for this thread.
    Approved { plan: Plan },
}

/// Plan-review variant of the approval loop: draft -> review ->
/// {approve, reject/regenerate, modify/regenerate}. Unlike the tool gate,
/// reject here produces a fresh plan rather than closing the turn.
pub struct PlanningEngine<P> {
    planner: P,
    store: Arc<InMemoryThreadStore>,
    gate: GateEngine<PlanReviewGate>,
    audit: Arc<dyn AuditSink>,
}

impl<P> PlanningEngine<P>
where
    P: PlanProposer,
{
    pub fn new(planner: P, store: Arc<InMemoryThreadStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { planner, store, gate: GateEngine::new(PlanReviewGate), audit }
    }

    pub fn store(&self) -> &Arc<InMemoryThreadStore> {
        &self.store
    }

    /// Drafts a plan for the task and suspends at review. A blank task
    /// short-circuits to an error plan without calling the backend.
    pub async fn start(
        &self,
        thread_id: &ThreadId,
        task: &str,
    ) -> Result<PlanOutcome, EngineError> {
        let mut state = self.store.checkout_or_create(thread_id).await;

        if state.gate == GateState::AwaitingDecision {
            return Err(EngineError::DecisionOutstanding { thread_id: thread_id.0.clone() });
        }
        if state.gate == GateState::Terminal {
            state.gate = self.gate.initial_state();
        }

        let correlation_id = Uuid::new_v4().to_string();

        let plan = if task.trim().is_empty() {
            Plan::error_for_empty_task()
        } else {
            let body = self.planner.draft(task).await?;
            Plan::drafted(task, body)
        };

        self.suspend_for_review(&mut state, plan, &correlation_id)
    }

    /// Applies the operator decision to the plan in review.
    pub async fn review(
        &self,
        thread_id: &ThreadId,
        decision: Decision,
    ) -> Result<PlanOutcome, EngineError> {
        let mut state = self.store.checkout(thread_id).await?;

        if state.gate != GateState::AwaitingDecision {
            return Err(EngineError::NoPlanInReview { thread_id: thread_id.0.clone() });
        }
        let Some(plan) = state.plan.clone() else {
            return Err(EngineError::NoPlanInReview { thread_id: thread_id.0.clone() });
        };

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

                let mut plan = plan;
                plan.approved = true;
                state.plan = Some(plan.clone());

                self.audit.emit(
                    AuditEvent::new(
                        context.thread_id.clone(),
                        correlation_id,
                        "plan.approved",
                        AuditCategory::Plan,
                        context.actor.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("revision", plan.revision.to_string()),
                );

                Ok(PlanOutcome::Approved { plan })
            }
            Decision::Reject => {
                self.regenerate(&mut state, plan, GateEvent::DecisionRejected, "reject", &correlation_id)
                    .await
            }
            Decision::Modify { feedback } => {
                self.regenerate(
                    &mut state,
                    plan,
                    GateEvent::DecisionModified,
                    &feedback,
                    &correlation_id,
                )
                .await
            }
        }
    }

    pub async fn reset(&self, thread_id: &ThreadId) -> Result<(), EngineError> {
        self.store.reset(thread_id).await?;
        Ok(())
    }

    async fn regenerate(
        &self,
        state: &mut ThreadState,
        plan: Plan,
        event: GateEvent,
        feedback: &str,
        correlation_id: &str,
    ) -> Result<PlanOutcome, EngineError> {
        // The planner runs before any state change so a backend failure
        // leaves the review exactly where it was.
        let body = if plan.task.trim().is_empty() {
            EMPTY_TASK_PLAN.to_string()
        } else {
            self.planner.revise(&plan.task, &plan.body, feedback).await?
        };

        let context = self.audit_context(state, correlation_id);
        let outcome =
            self.gate.apply_with_audit(&state.gate, &event, self.audit.as_ref(), &context)?;
        state.gate = outcome.to;

        let outcome = self.gate.apply_with_audit(
            &state.gate,
            &GateEvent::RevisionStarted,
            self.audit.as_ref(),
            &context,
        )?;
        state.gate = outcome.to;

        self.audit.emit(
            AuditEvent::new(
                context.thread_id.clone(),
                correlation_id.to_string(),
                "plan.revision_requested",
                AuditCategory::Plan,
                context.actor.clone(),
                AuditOutcome::Success,
            )
            .with_metadata("feedback", feedback.to_string()),
        );

        let revised = plan.revised(body, feedback);
        self.suspend_for_review(state, revised, correlation_id)
    }

    fn suspend_for_review(
        &self,
        state: &mut ThreadState,
        plan: Plan,
        correlation_id: &str,
    ) -> Result<PlanOutcome, EngineError> {
        let context = self.audit_context(state, correlation_id);

        let note = if plan.is_error() {
            plan.body.clone()
        } else {
            format!("Generated Plan:\n{}", plan.body)
        };
        state.messages.push(Message::assistant(note, Vec::new()));
        state.plan = Some(plan.clone());

        let outcome = self.gate.apply_with_audit(
            &state.gate,
            &GateEvent::ProposalEmitted,
            self.audit.as_ref(),
            &context,
        )?;
        state.gate = outcome.to;

        let review_prompt = render_plan_review(&plan);
        Ok(PlanOutcome::InReview { plan, review_prompt })
    }

    fn audit_context(&self, state: &ThreadState, correlation_id: &str) -> AuditContext {
        AuditContext::new(
            Some(state.thread_id.0.clone()),
            correlation_id.to_string(),
            "planning-engine",
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::audit::InMemoryAuditSink;
    use crate::domain::decision::Decision;
    use crate::domain::message::ThreadId;
    use crate::errors::{EngineError, ProposerError};
    use crate::gate::GateState;
    use crate::session::InMemoryThreadStore;

    use super::{PlanOutcome, PlanProposer, PlanningEngine};

    /// Counts backend calls and records the feedback handed to `revise`.
    #[derive(Default)]
    struct CountingPlanner {
        drafts: AtomicUsize,
        revisions: AtomicUsize,
        fail_next: AtomicUsize,
        feedback_seen: Mutex<Vec<String>>,
    }

    impl CountingPlanner {
        fn calls(&self) -> (usize, usize) {
            (self.drafts.load(Ordering::SeqCst), self.revisions.load(Ordering::SeqCst))
        }
    }

    #[async_trait]
    impl PlanProposer for Arc<CountingPlanner> {
        async fn draft(&self, task: &str) -> Result<String, ProposerError> {
            if self.fail_next.swap(0, Ordering::SeqCst) > 0 {
                return Err(ProposerError("backend unavailable".to_string()));
            }
            self.drafts.fetch_add(1, Ordering::SeqCst);
            Ok(format!("1. Work on: {task} (1d)\nSuccess criterion: done"))
        }

        async fn revise(
            &self,
            task: &str,
            _previous_plan: &str,
            feedback: &str,
        ) -> Result<String, ProposerError> {
            self.revisions.fetch_add(1, Ordering::SeqCst);
            self.feedback_seen.lock().expect("lock").push(feedback.to_string());
            Ok(format!("1. Revised work on: {task} (1d)\nChanges: applied feedback"))
        }
    }

    fn engine() -> (PlanningEngine<Arc<CountingPlanner>>, Arc<CountingPlanner>) {
        let planner = Arc::new(CountingPlanner::default());
        let engine = PlanningEngine::new(
            planner.clone(),
            Arc::new(InMemoryThreadStore::new()),
            Arc::new(InMemoryAuditSink::default()),
        );
        (engine, planner)
    }

    #[tokio::test]
    async fn empty_task_routes_to_review_without_calling_the_backend() {
        let (engine, planner) = engine();
        let thread = ThreadId("p-empty".to_string());

        let outcome = engine.start(&thread, "   ").await.expect("start");
        let PlanOutcome::InReview { plan, review_prompt } = outcome else {
            panic!("expected review");
        };

        assert!(plan.body.starts_with("ERROR: No task provided."));
        assert!(review_prompt.contains("ERROR: No task provided."));
        assert_eq!(planner.calls(), (0, 0), "backend must not be called for an empty task");
    }

    #[tokio::test]
    async fn drafted_plan_suspends_then_approve_is_terminal() {
        let (engine, planner) = engine();
        let thread = ThreadId("p-approve".to_string());

        let outcome = engine.start(&thread, "ship the release").await.expect("start");
        let PlanOutcome::InReview { plan, review_prompt } = outcome else {
            panic!("expected review");
        };
        assert!(review_prompt.contains("[a] Approve"));
        assert_eq!(plan.revision, 0);

        let outcome = engine.review(&thread, Decision::Approve).await.expect("approve");
        let PlanOutcome::Approved { plan } = outcome else {
            panic!("expected approval");
        };
        assert!(plan.approved);
        assert_eq!(planner.calls(), (1, 0));
        assert_eq!(
            engine.store().gate_state(&thread).await.expect("gate"),
            GateState::Terminal
        );
    }

    #[tokio::test]
    async fn reject_regenerates_a_fresh_plan() {
        let (engine, planner) = engine();
        let thread = ThreadId("p-reject".to_string());

        engine.start(&thread, "ship the release").await.expect("start");
        let outcome = engine.review(&thread, Decision::Reject).await.expect("reject");

        let PlanOutcome::InReview { plan, .. } = outcome else {
            panic!("reject must land back in review");
        };
        assert_eq!(plan.revision, 1);
        assert_eq!(plan.last_feedback.as_deref(), Some("reject"));
        assert_eq!(planner.calls(), (1, 1));
    }

    #[tokio::test]
    async fn modify_passes_feedback_verbatim_to_the_reviser() {
        let (engine, planner) = engine();
        let thread = ThreadId("p-modify".to_string());

        engine.start(&thread, "ship the release").await.expect("start");
        let outcome = engine
            .review(&thread, Decision::Modify { feedback: "add a rollback step".to_string() })
            .await
            .expect("modify");

        let PlanOutcome::InReview { plan, .. } = outcome else {
            panic!("modify must land back in review");
        };
        assert_eq!(plan.last_feedback.as_deref(), Some("add a rollback step"));
        assert_eq!(
            planner.feedback_seen.lock().expect("lock").as_slice(),
            &["add a rollback step".to_string()]
        );
    }

    #[tokio::test]
    async fn rejecting_an_error_plan_never_reaches_the_backend() {
        let (engine, planner) = engine();
        let thread = ThreadId("p-error-loop".to_string());

        engine.start(&thread, "").await.expect("start");
        let outcome = engine.review(&thread, Decision::Reject).await.expect("reject");

        let PlanOutcome::InReview { plan, .. } = outcome else {
            panic!("expected review");
        };
        assert!(plan.body.starts_with("ERROR: No task provided."));
        assert_eq!(planner.calls(), (0, 0));
    }

    #[tokio::test]
    async fn draft_failure_leaves_the_thread_untouched() {
        let (engine, planner) = engine();
        planner.fail_next.store(1, std::sync::atomic::Ordering::SeqCst);
        let thread = ThreadId("p-fail".to_string());

        let error = engine.start(&thread, "ship it").await.expect_err("backend down");
        assert!(matches!(error, EngineError::Proposer(_)));
        assert!(engine.store().history(&thread).await.expect("history").is_empty());

        let outcome = engine.start(&thread, "ship it").await.expect("retry");
        assert!(matches!(outcome, PlanOutcome::InReview { .. }));
    }

    #[tokio::test]
    async fn review_without_a_plan_is_a_typed_error() {
        let (engine, _) = engine();
        let thread = ThreadId("p-none".to_string());
        engine.store().create(&thread).await;

        let error = engine.review(&thread, Decision::Approve).await.expect_err("no plan");
        assert!(matches!(error, EngineError::NoPlanInReview { .. }));
    }
}
