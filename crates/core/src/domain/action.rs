use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::message::{MessageId, ToolCallRequest};

/// A tool call waiting for an operator decision. Produced by the proposer,
/// consumed exactly once by the approval gate; immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProposedAction {
    pub tool_name: String,
    pub arguments: serde_json::Map<String, Value>,
    pub origin_message_id: MessageId,
    pub rationale: String,
}

impl ProposedAction {
    pub fn from_call(
        call: ToolCallRequest,
        origin_message_id: MessageId,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: call.tool_name,
            arguments: call.arguments,
            origin_message_id,
            rationale: rationale.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::domain::message::{MessageId, ToolCallRequest};

    use super::ProposedAction;

    #[test]
    fn from_call_carries_arguments_unchanged() {
        let call = ToolCallRequest {
            tool_name: "multiply_numbers".to_string(),
            arguments: json!({"x": 2.0, "y": 3.0}).as_object().cloned().unwrap_or_default(),
        };
        let origin = MessageId::random();

        let action = ProposedAction::from_call(call.clone(), origin.clone(), "multiplying");

        assert_eq!(action.tool_name, "multiply_numbers");
        assert_eq!(action.arguments, call.arguments);
        assert_eq!(action.origin_message_id, origin);
        assert_eq!(action.rationale, "multiplying");
    }
}
