pub mod engine;
pub mod states;

pub use engine::{
    render_plan_review, render_review_prompt, GateDefinition, GateEngine, GateTransitionError,
    PlanReviewGate, ToolApprovalGate,
};
pub use states::{GateAction, GateEvent, GateKind, GateState, TransitionOutcome};
