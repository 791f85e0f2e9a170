pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod gate;
pub mod session;
pub mod tools;
pub mod workflow;

pub use audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink,
    TracingAuditSink,
};
pub use domain::action::ProposedAction;
pub use domain::decision::{Decision, DecisionKind, DecisionTokens};
pub use domain::message::{Message, MessageId, ThreadId, ToolCallRequest};
pub use domain::plan::{Plan, EMPTY_TASK_PLAN};
pub use errors::{EngineError, ProposerError};
pub use gate::{
    render_plan_review, render_review_prompt, GateEngine, GateEvent, GateState,
    GateTransitionError, PlanReviewGate, ToolApprovalGate,
};
pub use session::{InMemoryThreadStore, StoreError, ThreadState};
pub use tools::{
    AddNumbers, CalculateFactorial, MultiplyNumbers, ParamKind, ParamSpec, ParsePubmedQuery, Tool,
    ToolError, ToolRegistry, ToolSpec,
};
pub use workflow::{
    ActionProposer, ConversationEngine, PlanOutcome, PlanProposer, PlanningEngine, Proposal,
    TurnOutcome,
};
