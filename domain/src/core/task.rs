//! Task value object

use serde::{Deserialize, Serialize};

/// The instruction every panel worker receives.
///
/// Construction goes through [`Task::try_new`] so a run can never start
/// with a blank instruction. The text itself is opaque to the
/// orchestrator; topologies extend it when building worker prompts but
/// never rewrite it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    content: String,
}

impl Task {
    /// Create a task, rejecting empty or whitespace-only content.
    pub fn try_new(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            None
        } else {
            Some(Self { content })
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
