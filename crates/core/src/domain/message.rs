use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// A single tool invocation the reasoning model asked for, before any
/// approval has been granted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool_name: String,
    pub arguments: serde_json::Map<String, Value>,
}

/// One entry in a conversation thread. Each variant carries only the
/// fields that role actually needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    User {
        id: MessageId,
        content: String,
        at: DateTime<Utc>,
    },
    Assistant {
        id: MessageId,
        content: String,
        proposed_calls: Vec<ToolCallRequest>,
        at: DateTime<Utc>,
    },
    ToolResult {
        id: MessageId,
        tool_name: String,
        content: Value,
        at: DateTime<Utc>,
    },
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User { id: MessageId::random(), content: content.into(), at: Utc::now() }
    }

    pub fn assistant(content: impl Into<String>, proposed_calls: Vec<ToolCallRequest>) -> Self {
        Self::Assistant {
            id: MessageId::random(),
            content: content.into(),
            proposed_calls,
            at: Utc::now(),
        }
    }

    pub fn tool_result(tool_name: impl Into<String>, content: Value) -> Self {
        Self::ToolResult {
            id: MessageId::random(),
            tool_name: tool_name.into(),
            content,
            at: Utc::now(),
        }
    }

    pub fn id(&self) -> &MessageId {
        match self {
            Self::User { id, .. } | Self::Assistant { id, .. } | Self::ToolResult { id, .. } => id,
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
            Self::ToolResult { .. } => "tool",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Message, ToolCallRequest};

    #[test]
    fn message_variants_tag_by_role() {
        let user = Message::user("what is 2 * 3?");
        let assistant = Message::assistant(
            "I will multiply the numbers.",
            vec![ToolCallRequest {
                tool_name: "multiply_numbers".to_string(),
                arguments: json!({"x": 2.0, "y": 3.0})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            }],
        );
        let tool = Message::tool_result("multiply_numbers", json!(6.0));

        assert_eq!(user.role(), "user");
        assert_eq!(assistant.role(), "assistant");
        assert_eq!(tool.role(), "tool");
    }

    #[test]
    fn serde_round_trip_preserves_tool_call_payload() {
        let message = Message::assistant(
            "calling a tool",
            vec![ToolCallRequest {
                tool_name: "add_numbers".to_string(),
                arguments: json!({"x": 1.5, "y": 2.5})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            }],
        );

        let encoded = serde_json::to_string(&message).expect("serialize");
        assert!(encoded.contains("\"role\":\"assistant\""));

        let decoded: Message = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded, message);
    }

    #[test]
    fn ids_are_unique_per_message() {
        let first = Message::user("one");
        let second = Message::user("one");
        assert_ne!(first.id(), second.id());
    }
}
