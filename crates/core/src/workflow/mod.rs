pub mod engine;
pub mod planning;

pub use engine::{ActionProposer, ConversationEngine, Proposal, TurnOutcome};
pub use planning::{PlanOutcome, PlanProposer, PlanningEngine};
