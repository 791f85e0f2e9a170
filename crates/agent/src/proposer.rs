use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use greenlight_core::{ActionProposer, Message, Proposal, ProposerError, ToolCallRequest, ToolSpec};

use crate::llm::LlmClient;
use crate::prompts;

const TOOL_FENCE: &str = "```tool_calls";

/// Turns chat-completions replies into action proposals. The reply may end
/// with a fenced `tool_calls` block; a malformed block degrades to a plain
/// answer rather than failing the turn.
pub struct LlmProposer<C> {
    client: C,
    tool_specs: Vec<ToolSpec>,
}

impl<C> LlmProposer<C> {
    pub fn new(client: C, tool_specs: Vec<ToolSpec>) -> Self {
        Self { client, tool_specs }
    }
}

#[async_trait]
impl<C> ActionProposer for LlmProposer<C>
where
    C: LlmClient,
{
    async fn propose(
        &self,
        history: &[Message],
        feedback: Option<&str>,
    ) -> Result<Proposal, ProposerError> {
        let system = prompts::agent_system_prompt(&self.tool_specs);
        let prompt = prompts::conversation_prompt(history, feedback);

        let reply = self
            .client
            .complete(&system, &prompt)
            .await
            .map_err(|error| ProposerError(error.to_string()))?;

        Ok(parse_reply(&reply))
    }
}

#[derive(Debug, Deserialize)]
struct RawToolCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Map<String, Value>,
}

/// Splits a model reply into prose and tool calls. Returns a plain answer
/// when no fence is present or the fenced JSON does not parse.
pub fn parse_reply(reply: &str) -> Proposal {
    let Some(fence_start) = reply.find(TOOL_FENCE) else {
        return Proposal::answer(reply.trim());
    };

    let block_start = fence_start + TOOL_FENCE.len();
    let Some(block_len) = reply[block_start..].find("```") else {
        tracing::warn!(
            event_name = "proposer.unterminated_tool_fence",
            "tool_calls fence was never closed; treating reply as a plain answer"
        );
        return Proposal::answer(reply.trim());
    };

    let block = reply[block_start..block_start + block_len].trim();
    let content = format!(
        "{}{}",
        reply[..fence_start].trim_end(),
        reply[block_start + block_len + 3..].trim_end()
    )
    .trim()
    .to_string();

    match serde_json::from_str::<Vec<RawToolCall>>(block) {
        Ok(raw_calls) => {
            let tool_calls = raw_calls
                .into_iter()
                .map(|raw| ToolCallRequest { tool_name: raw.name, arguments: raw.arguments })
                .collect();
            Proposal::with_calls(content, tool_calls)
        }
        Err(error) => {
            tracing::warn!(
                event_name = "proposer.malformed_tool_block",
                error = %error,
                "tool_calls block did not parse; treating reply as a plain answer"
            );
            Proposal::answer(reply.trim())
        }
    }
}
