use greenlight_core::{Message, ToolSpec};

pub const PLANNER_SYSTEM_PROMPT: &str = "You are a professional planner assistant. \
Create plans that directly address the specific task provided. \
Do NOT create generic project management plans.";

const AGENT_SYSTEM_PREAMBLE: &str = "You are a helpful assistant that explains what it does. \
You may request exactly one tool call per reply. To request a tool call, end your reply with a \
fenced block:\n\n```tool_calls\n[{\"name\": \"<tool>\", \"arguments\": {..}}]\n```\n\n\
If no tool is needed, answer directly without a fenced block.";

/// System prompt for the tool-calling agent, listing the registered tools
/// and their parameter schemas.
pub fn agent_system_prompt(tool_specs: &[ToolSpec]) -> String {
    let mut prompt = String::from(AGENT_SYSTEM_PREAMBLE);
    prompt.push_str("\n\nAvailable tools:\n");
    for spec in tool_specs {
        let params = spec
            .params
            .iter()
            .map(|param| {
                format!(
                    "{}{}: {:?}",
                    param.name,
                    if param.required { "" } else { "?" },
                    param.kind
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        prompt.push_str(&format!("- {} ({params}): {}\n", spec.name, spec.description));
    }
    prompt
}

/// Renders the conversation transcript, with optional operator feedback
/// from a modify decision appended verbatim.
pub fn conversation_prompt(history: &[Message], feedback: Option<&str>) -> String {
    let mut prompt = String::from("Conversation so far:\n");

    for message in history {
        match message {
            Message::User { content, .. } => {
                prompt.push_str(&format!("User: {content}\n"));
            }
            Message::Assistant { content, proposed_calls, .. } => {
                prompt.push_str(&format!("Assistant: {content}\n"));
                for call in proposed_calls {
                    prompt.push_str(&format!("  (requested tool: {})\n", call.tool_name));
                }
            }
            Message::ToolResult { tool_name, content, .. } => {
                prompt.push_str(&format!("Tool result ({tool_name}): {content}\n"));
            }
        }
    }

    if let Some(feedback) = feedback {
        prompt.push_str(&format!(
            "\nThe operator declined the last proposed tool call with this feedback:\n{feedback}\n\
             Revise your approach accordingly.\n"
        ));
    }

    prompt.push_str("\nRespond to the latest user message.");
    prompt
}

pub fn initial_plan_prompt(task: &str) -> String {
    format!(
        "TASK TO ACCOMPLISH: {task}\n\n\
         Create a specific plan for the task above. Do NOT create a generic project plan.\n\n\
         Requirements:\n\
         - Provide 4-8 numbered steps\n\
         - Each step must be ONE imperative sentence starting with a verb\n\
         - Include realistic time estimates (e.g., 1w, 3d, 2h)\n\
         - Steps must directly address the specific task\n\
         - End with one-line success criterion\n\n\
         Output format:\n\
         1. <step> (<duration>)\n\
         ...\n\
         Success criterion: <outcome>"
    )
}

pub fn revision_plan_prompt(task: &str, previous_plan: &str, feedback: &str) -> String {
    format!(
        "TASK TO ACCOMPLISH: {task}\n\n\
         Previous plan:\n{previous_plan}\n\n\
         User feedback:\n{feedback}\n\n\
         Instructions:\n\
         1. Revise the plan based on user feedback.\n\
         2. Provide 3-7 numbered steps (each step must be ONE imperative sentence, <=120 chars).\n\
         3. After the plan, list any \"Changes\" made (added/removed/reordered steps).\n\
         4. End with a one-sentence rationale.\n\n\
         Output format (exact):\n\
         <NUMBERED PLAN>\n\
         Changes: <summary of edits>\n\
         Rationale: <one sentence>"
    )
}
