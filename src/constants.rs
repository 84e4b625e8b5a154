/// Constants module to avoid magic numbers in the codebase

// Network Configuration
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

// Timeouts
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 3;

// Session initialization retries (3 retries after the first attempt)
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const RETRY_BASE_DELAY_MS: u64 = 1000;

// Default Model Configuration
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_P: f32 = 0.8;
pub const DEFAULT_TOP_K: u32 = 40;

// Candidate finish reasons that mean the reply was withheld by a safety filter
pub const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

// User-facing fallback texts
pub const CONNECTIVITY_APOLOGY: &str =
    "I apologize, but I am having trouble connecting to the AI service. Please try again in a moment.";
pub const CONTENT_POLICY_APOLOGY: &str =
    "I apologize, but I cannot provide a response to that query due to content safety restrictions.";

pub const DEFAULT_GREETING: &str = "Hi! I'm your AI assistant. How can I help you today?";

/// Hidden priming message sent as the first turn of every backend session.
pub const SYSTEM_CONTEXT: &str = "You are the shopping assistant for Project Bolt, an online \
marketplace for EV charging products and a partner network of charging stations.

You can help customers with:
- Finding and comparing charging products
- Locating charging stations and understanding their pricing
- Cart, checkout and order status questions
- Account and sign-in troubleshooting

You can help partners with:
- Onboarding and registering a charging station
- Listing stations, ports and per-kWh pricing
- Ordering equipment from the partner store

Keep answers short, friendly and accurate. If you do not know something \
about a specific order or station, say so and suggest contacting support.";
