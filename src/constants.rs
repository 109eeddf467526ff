// Upstream API Constants
pub const UPSTREAM_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const DEFAULT_MODEL: &str = "openai/gpt-oss-20b:free";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 500;

// Proxy Constants
pub const CHAT_ROUTE: &str = "/api/chat";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:3000";

// Session Store Constants
pub const DEFAULT_SESSION_STORE_URL: &str = "http://127.0.0.1:4000";
pub const PROFILE_PATH: &str = "/auth/profile";
pub const DOCUMENTS_PATH: &str = "/documents";

// Local persisted state keys
pub const HISTORY_KEY: &str = "chatMessages";
pub const TOKEN_KEY: &str = "token";

// Free-tier upstream models reject anything longer than this many characters.
pub const MAX_DOCUMENT_CHARS: usize = 131_872;

// Prompt framing
pub const DOCUMENT_PREFIX: &str = "PDF Content:\n";
pub const QUESTION_SEPARATOR: &str = "\n\nQuestion:\n";
pub const NO_RESPONSE: &str = "No response";

// Notifications
pub const DOCUMENT_LOAD_FAILED: &str = "Failed to load document!";
pub const DOCUMENT_LIST_FAILED: &str = "Failed to load documents";
