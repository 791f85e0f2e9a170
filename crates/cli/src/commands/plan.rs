use std::sync::Arc;

use greenlight_agent::{HttpLlmClient, LlmPlanner};
use greenlight_core::config::{AppConfig, LoadOptions};
use greenlight_core::{
    Decision, DecisionKind, InMemoryThreadStore, PlanOutcome, PlanningEngine, ThreadId,
    TracingAuditSink,
};

use super::{read_line, CommandResult};

pub async fn run(task: String) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("plan", "config_validation", error.to_string(), 2)
        }
    };
    crate::init_logging(&config);

    let client = match HttpLlmClient::from_config(&config.llm) {
        Ok(client) => client,
        Err(error) => return CommandResult::failure("plan", "llm_client", error.to_string(), 2),
    };

    let engine = PlanningEngine::new(
        LlmPlanner::new(client),
        Arc::new(InMemoryThreadStore::new()),
        Arc::new(TracingAuditSink),
    );

    let tokens = config.decisions.tokens();
    let thread_id = ThreadId::random();

    let mut outcome = match engine.start(&thread_id, &task).await {
        Ok(outcome) => outcome,
        Err(error) => return CommandResult::failure("plan", "planner", error.to_string(), 1),
    };

    loop {
        match outcome {
            PlanOutcome::Approved { plan } => {
                println!("Plan approved:\n{}", plan.body);
                return CommandResult::success("plan", "plan approved");
            }
            PlanOutcome::InReview { review_prompt, .. } => {
                println!("\n{review_prompt}");
                let Some(raw) = read_line("decision> ") else {
                    return CommandResult::success("plan", "review closed");
                };

                let decision = match tokens.classify(&raw) {
                    DecisionKind::Approve => Decision::Approve,
                    DecisionKind::Reject => Decision::Reject,
                    DecisionKind::Modify => {
                        let Some(feedback) =
                            read_line("Enter your feedback for plan revision: ")
                        else {
                            return CommandResult::success("plan", "review closed");
                        };
                        Decision::Modify { feedback }
                    }
                };

                outcome = match engine.review(&thread_id, decision).await {
                    Ok(outcome) => outcome,
                    Err(error) => {
                        return CommandResult::failure("plan", "planner", error.to_string(), 1)
                    }
                };
            }
        }
    }
}
