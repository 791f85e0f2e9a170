use std::sync::Arc;

use chrono::{Datelike, Utc};

use greenlight_agent::{HttpLlmClient, LlmProposer, WebSearchTool};
use greenlight_core::config::{AppConfig, LoadOptions};
use greenlight_core::{
    ConversationEngine, Decision, DecisionKind, InMemoryThreadStore, ThreadId, ToolRegistry,
    TracingAuditSink, TurnOutcome,
};

use super::{read_line, CommandResult};

pub async fn run(thread: Option<String>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("chat", "config_validation", error.to_string(), 2)
        }
    };
    crate::init_logging(&config);

    let client = match HttpLlmClient::from_config(&config.llm) {
        Ok(client) => client,
        Err(error) => return CommandResult::failure("chat", "llm_client", error.to_string(), 2),
    };

    let mut registry = ToolRegistry::with_builtins(Utc::now().year());
    if config.search.enabled {
        match WebSearchTool::from_config(&config.search) {
            Ok(tool) => registry.register(tool),
            Err(error) => {
                return CommandResult::failure("chat", "search_client", error.to_string(), 2)
            }
        }
    }

    let proposer = LlmProposer::new(client, registry.specs());
    let engine = ConversationEngine::new(
        proposer,
        registry,
        Arc::new(InMemoryThreadStore::new()),
        Arc::new(TracingAuditSink),
    );

    let tokens = config.decisions.tokens();
    let thread_id = thread.map(ThreadId).unwrap_or_else(ThreadId::random);
    engine.store().create(&thread_id).await;

    println!("greenlight chat - thread {thread_id}");
    println!("The agent asks for your approval before executing tools.");
    println!("Commands: /reset clears the thread, /quit exits.");

    while let Some(line) = read_line("> ") {
        let line = line.trim().to_string();
        match line.as_str() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                if let Err(error) = engine.reset(&thread_id).await {
                    eprintln!("error: {error}");
                } else {
                    println!("Thread reset. You can ask a new question.");
                }
                continue;
            }
            _ => {}
        }

        let mut outcome = match engine.submit(&thread_id, &line).await {
            Ok(outcome) => outcome,
            Err(error) => {
                eprintln!("error: {error}");
                continue;
            }
        };

        loop {
            match outcome {
                TurnOutcome::Completed { reply } => {
                    println!("{reply}");
                    break;
                }
                TurnOutcome::Rejected => {
                    println!("Tool execution rejected. You can ask a new question.");
                    break;
                }
                TurnOutcome::NothingPending => break,
                TurnOutcome::Suspended { review_prompt } => {
                    println!("\n{review_prompt}");
                    let Some(raw) = read_line("decision> ") else {
                        return CommandResult::success("chat", "session closed");
                    };

                    let decision = match tokens.classify(&raw) {
                        DecisionKind::Approve => Decision::Approve,
                        DecisionKind::Reject => Decision::Reject,
                        DecisionKind::Modify => {
                            let Some(feedback) = read_line("Enter your feedback for revision: ")
                            else {
                                return CommandResult::success("chat", "session closed");
                            };
                            Decision::Modify { feedback }
                        }
                    };

                    outcome = match engine.resume(&thread_id, decision).await {
                        Ok(outcome) => outcome,
                        Err(error) => {
                            eprintln!("error: {error}");
                            break;
                        }
                    };
                }
            }
        }
    }

    CommandResult::success("chat", "session closed")
}
