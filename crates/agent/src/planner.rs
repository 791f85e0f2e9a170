use async_trait::async_trait;

use greenlight_core::{PlanProposer, ProposerError};

use crate::llm::LlmClient;
use crate::prompts;

/// Plan drafting/revision over the chat-completions backend.
pub struct LlmPlanner<C> {
    client: C,
}

impl<C> LlmPlanner<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C> PlanProposer for LlmPlanner<C>
where
    C: LlmClient,
{
    async fn draft(&self, task: &str) -> Result<String, ProposerError> {
        self.client
            .complete(prompts::PLANNER_SYSTEM_PROMPT, &prompts::initial_plan_prompt(task))
            .await
            .map_err(|error| ProposerError(error.to_string()))
    }

    async fn revise(
        &self,
        task: &str,
        previous_plan: &str,
        feedback: &str,
    ) -> Result<String, ProposerError> {
        self.client
            .complete(
                prompts::PLANNER_SYSTEM_PROMPT,
                &prompts::revision_plan_prompt(task, previous_plan, feedback),
            )
            .await
            .map_err(|error| ProposerError(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::Result;
    use async_trait::async_trait;
    use greenlight_core::PlanProposer;

    use crate::llm::LlmClient;

    use super::LlmPlanner;

    /// Records every prompt pair it receives and echoes a fixed plan.
    #[derive(Default)]
    struct RecordingClient {
        prompts: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl LlmClient for RecordingClient {
        async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
            self.prompts
                .lock()
                .expect("lock")
                .push((system_prompt.to_string(), user_prompt.to_string()));
            Ok("1. Do the work (1d)\nSuccess criterion: done".to_string())
        }
    }

    #[tokio::test]
    async fn draft_sends_the_task_in_the_initial_prompt() {
        let planner = LlmPlanner::new(RecordingClient::default());
        let body = planner.draft("ship the release").await.expect("draft");

        assert!(body.starts_with("1."));
        let prompts = planner.client.prompts.lock().expect("lock");
        let (system, user) = &prompts[0];
        assert!(system.contains("professional planner assistant"));
        assert!(user.contains("TASK TO ACCOMPLISH: ship the release"));
    }

    #[tokio::test]
    async fn revise_sends_previous_plan_and_feedback_verbatim() {
        let planner = LlmPlanner::new(RecordingClient::default());
        planner
            .revise("ship the release", "1. Tag (1h)", "add a rollback step")
            .await
            .expect("revise");

        let prompts = planner.client.prompts.lock().expect("lock");
        let (_, user) = &prompts[0];
        assert!(user.contains("Previous plan:\n1. Tag (1h)"));
        assert!(user.contains("User feedback:\nadd a rollback step"));
    }
}
