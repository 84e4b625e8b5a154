pub mod app;
pub mod cli;
pub mod constants;
pub mod models;
pub mod runtime;
pub mod session;
pub mod utils;

pub use app::{load_config, Config};
pub use models::{BackendSession, ChatBackend, ChatMessage, GeminiBackend, ModelFactory};
pub use session::{ConversationHistory, ErrorClassifier, RetryPolicy, SessionManager, SessionStatus};
pub use utils::{BackendError, ChatError, InitializationError};
