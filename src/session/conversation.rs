use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::models::ChatMessage;

/// Ordered, append-only log of the turns exchanged in one conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
    created_at: DateTime<Local>,
    updated_at: DateTime<Local>,
}

impl ConversationHistory {
    /// Create an empty conversation history
    pub fn new() -> Self {
        let now = Local::now();
        Self {
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append one turn
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.updated_at = Local::now();
    }

    /// Copy of every turn, in send order
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }

    /// Forget every turn and restart the clock
    pub fn clear(&mut self) {
        self.messages.clear();
        let now = Local::now();
        self.created_at = now;
        self.updated_at = now;
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get a summary for display
    pub fn summary(&self) -> String {
        let duration = self.updated_at.signed_duration_since(self.created_at);
        let minutes = duration.num_minutes();
        let seconds = duration.num_seconds() % 60;

        format!(
            "{} messages | started {} | {}m {}s",
            self.messages.len(),
            self.created_at.format("%Y-%m-%d %H:%M"),
            minutes,
            seconds
        )
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}
