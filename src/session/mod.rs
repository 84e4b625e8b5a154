/// Session management module - Gateway

mod classifier;
mod conversation;
mod manager;
mod retry;
mod state;

pub use classifier::{ErrorClassifier, Recovery};
pub use conversation::ConversationHistory;
pub use manager::SessionManager;
pub use retry::RetryPolicy;
pub use state::SessionStatus;
