use serde::{Deserialize, Serialize};

/// An operator ruling on a pending action or plan. Ephemeral: exists only
/// for a single suspend/resume cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
    Modify { feedback: String },
}

/// Coarse classification of a raw decision token, before any feedback has
/// been collected for the modify branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecisionKind {
    Approve,
    Reject,
    Modify,
}

/// Recognized decision tokens, enumerated per deployment. Matching is
/// case-insensitive; anything unrecognized classifies as reject.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionTokens {
    pub approve: Vec<String>,
    pub reject: Vec<String>,
    pub modify: Vec<String>,
}

impl Default for DecisionTokens {
    fn default() -> Self {
        Self {
            approve: ["yes", "y", "approve", "a"].map(str::to_string).to_vec(),
            reject: ["no", "n", "reject", "r"].map(str::to_string).to_vec(),
            modify: ["m", "modify", "edit"].map(str::to_string).to_vec(),
        }
    }
}

impl DecisionTokens {
    pub fn classify(&self, raw: &str) -> DecisionKind {
        let token = raw.trim().to_ascii_lowercase();

        if self.approve.iter().any(|candidate| candidate.eq_ignore_ascii_case(&token)) {
            return DecisionKind::Approve;
        }
        if self.modify.iter().any(|candidate| candidate.eq_ignore_ascii_case(&token)) {
            return DecisionKind::Modify;
        }

        // Explicit reject tokens and unrecognized input both land here:
        // an unknown token must never approve anything.
        DecisionKind::Reject
    }
}
