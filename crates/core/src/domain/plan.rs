use serde::{Deserialize, Serialize};

pub const EMPTY_TASK_PLAN: &str =
    "ERROR: No task provided. Please provide a task in the input.";

/// A multi-step plan under operator review. Owned by the thread; the
/// planner rewrites `body` on each revision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub task: String,
    pub body: String,
    pub approved: bool,
    pub last_feedback: Option<String>,
    pub revision: u32,
}

impl Plan {
    pub fn drafted(task: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            body: body.into(),
            approved: false,
            last_feedback: None,
            revision: 0,
        }
    }

    /// Plan emitted when the operator supplied no task; routed straight to
    /// review without touching the reasoning backend.
    pub fn error_for_empty_task() -> Self {
        Self::drafted(String::new(), EMPTY_TASK_PLAN)
    }

    pub fn is_error(&self) -> bool {
        self.body.starts_with("ERROR:")
    }

    pub fn revised(&self, body: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self {
            task: self.task.clone(),
            body: body.into(),
            approved: false,
            last_feedback: Some(feedback.into()),
            revision: self.revision + 1,
        }
    }
}
