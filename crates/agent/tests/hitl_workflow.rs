use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use greenlight_agent::llm::LlmClient;
use greenlight_agent::planner::LlmPlanner;
use greenlight_agent::proposer::LlmProposer;
use greenlight_core::{
    ConversationEngine, Decision, DecisionKind, DecisionTokens, InMemoryAuditSink,
    InMemoryThreadStore, Message, PlanOutcome, PlanningEngine, ThreadId, ToolRegistry, TurnOutcome,
};

/// Chat backend that replays canned replies and counts calls.
#[derive(Default)]
struct ScriptedClient {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
}

impl ScriptedClient {
    fn with_replies(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|reply| reply.to_string()).collect()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().expect("lock")
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
        *self.calls.lock().expect("lock") += 1;
        match self.replies.lock().expect("lock").pop_front() {
            Some(reply) => Ok(reply),
            None => bail!("scripted client ran out of replies"),
        }
    }
}

fn conversation_engine(
    client: Arc<ScriptedClient>,
) -> (ConversationEngine<LlmProposer<Arc<ScriptedClient>>>, Arc<InMemoryThreadStore>) {
    let registry = ToolRegistry::with_builtins(2025);
    let proposer = LlmProposer::new(client, registry.specs());
    let store = Arc::new(InMemoryThreadStore::new());
    let engine = ConversationEngine::new(
        proposer,
        registry,
        store.clone(),
        Arc::new(InMemoryAuditSink::default()),
    );
    (engine, store)
}

fn decision_from_token(tokens: &DecisionTokens, raw: &str, feedback: &str) -> Decision {
    match tokens.classify(raw) {
        DecisionKind::Approve => Decision::Approve,
        DecisionKind::Reject => Decision::Reject,
        DecisionKind::Modify => Decision::Modify { feedback: feedback.to_string() },
    }
}

const MULTIPLY_REPLY: &str = "I will multiply the numbers.\n\n```tool_calls\n[{\"name\": \"multiply_numbers\", \"arguments\": {\"x\": 2.0, \"y\": 3.0}}]\n```";

#[tokio::test]
async fn yes_token_approves_and_appends_the_tool_result() {
    let client = ScriptedClient::with_replies(&[MULTIPLY_REPLY, "2 times 3 is 6."]);
    let (engine, store) = conversation_engine(client.clone());
    let tokens = DecisionTokens::default();
    let thread = ThreadId("w-approve".to_string());

    let outcome = engine.submit(&thread, "what is 2 * 3?").await.expect("submit");
    let TurnOutcome::Suspended { review_prompt } = outcome else {
        panic!("expected suspension, got {outcome:?}");
    };
    assert!(review_prompt.contains("Tool: multiply_numbers"));

    let decision = decision_from_token(&tokens, "yes", "");
    let outcome = engine.resume(&thread, decision).await.expect("resume");
    assert_eq!(outcome, TurnOutcome::Completed { reply: "2 times 3 is 6.".to_string() });

    let history = store.history(&thread).await.expect("history");
    let tool_result = history
        .iter()
        .find_map(|message| match message {
            Message::ToolResult { tool_name, content, .. } => {
                Some((tool_name.clone(), content.clone()))
            }
            _ => None,
        })
        .expect("tool result appended");
    assert_eq!(tool_result.0, "multiply_numbers");
    assert_eq!(tool_result.1, serde_json::json!(6.0));

    assert_eq!(client.calls(), 2, "proposer called once before and once after execution");
}

#[tokio::test]
async fn unrecognized_token_is_treated_as_reject() {
    let client = ScriptedClient::with_replies(&[MULTIPLY_REPLY]);
    let (engine, store) = conversation_engine(client.clone());
    let tokens = DecisionTokens::default();
    let thread = ThreadId("w-qqq".to_string());

    engine.submit(&thread, "what is 2 * 3?").await.expect("submit");

    let decision = decision_from_token(&tokens, "qqq", "");
    let outcome = engine.resume(&thread, decision).await.expect("resume");
    assert_eq!(outcome, TurnOutcome::Rejected);

    let history = store.history(&thread).await.expect("history");
    assert!(
        !history.iter().any(|message| message.role() == "tool"),
        "no tool may run on an unrecognized token"
    );
    assert_eq!(client.calls(), 1, "rejection must not call the backend again");
}

#[tokio::test]
async fn modify_token_collects_feedback_and_revises() {
    let client = ScriptedClient::with_replies(&[MULTIPLY_REPLY, "Fine, I added instead: 5."]);
    let (engine, store) = conversation_engine(client.clone());
    let tokens = DecisionTokens::default();
    let thread = ThreadId("w-modify".to_string());

    engine.submit(&thread, "what is 2 * 3?").await.expect("submit");

    let decision = decision_from_token(&tokens, "m", "use addition instead");
    let outcome = engine.resume(&thread, decision).await.expect("resume");
    assert_eq!(
        outcome,
        TurnOutcome::Completed { reply: "Fine, I added instead: 5.".to_string() }
    );

    let history = store.history(&thread).await.expect("history");
    assert!(!history.iter().any(|message| message.role() == "tool"));
}

#[tokio::test]
async fn replayed_approve_does_not_execute_twice() {
    let client = ScriptedClient::with_replies(&[MULTIPLY_REPLY, "2 times 3 is 6."]);
    let (engine, store) = conversation_engine(client);
    let thread = ThreadId("w-replay".to_string());

    engine.submit(&thread, "what is 2 * 3?").await.expect("submit");
    engine.resume(&thread, Decision::Approve).await.expect("first approve");

    let outcome = engine.resume(&thread, Decision::Approve).await.expect("second approve");
    assert_eq!(outcome, TurnOutcome::NothingPending);

    let history = store.history(&thread).await.expect("history");
    let tool_runs = history.iter().filter(|message| message.role() == "tool").count();
    assert_eq!(tool_runs, 1);
}

#[tokio::test]
async fn empty_task_plan_never_reaches_the_backend() {
    let client = ScriptedClient::with_replies(&[]);
    let planner = LlmPlanner::new(client.clone());
    let engine = PlanningEngine::new(
        planner,
        Arc::new(InMemoryThreadStore::new()),
        Arc::new(InMemoryAuditSink::default()),
    );
    let thread = ThreadId("w-empty-task".to_string());

    let outcome = engine.start(&thread, "").await.expect("start");
    let PlanOutcome::InReview { plan, .. } = outcome else {
        panic!("expected review");
    };

    assert!(plan.body.starts_with("ERROR: No task provided."));
    assert_eq!(client.calls(), 0, "the reasoning backend must not be called");
}

#[tokio::test]
async fn plan_review_loop_drafts_revises_and_approves() {
    let client = ScriptedClient::with_replies(&[
        "1. Tag the build (1h)\nSuccess criterion: tagged",
        "1. Tag the build (1h)\n2. Roll back on failure (1h)\nChanges: added rollback\nRationale: safer",
    ]);
    let planner = LlmPlanner::new(client.clone());
    let engine = PlanningEngine::new(
        planner,
        Arc::new(InMemoryThreadStore::new()),
        Arc::new(InMemoryAuditSink::default()),
    );
    let tokens = DecisionTokens::default();
    let thread = ThreadId("w-plan".to_string());

    let outcome = engine.start(&thread, "ship the release").await.expect("start");
    assert!(matches!(outcome, PlanOutcome::InReview { .. }));

    let decision = decision_from_token(&tokens, "edit", "add a rollback step");
    let outcome = engine.review(&thread, decision).await.expect("modify");
    let PlanOutcome::InReview { plan, .. } = outcome else {
        panic!("expected revised plan in review");
    };
    assert_eq!(plan.revision, 1);
    assert!(plan.body.contains("Roll back on failure"));

    let outcome = engine.review(&thread, Decision::Approve).await.expect("approve");
    let PlanOutcome::Approved { plan } = outcome else {
        panic!("expected approval");
    };
    assert!(plan.approved);
    assert_eq!(client.calls(), 2);
}
