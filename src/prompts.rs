//! Prompts sent to the vision model.
//!
//! Callers can override either prompt via
//! [`crate::config::DescribeConfig::system_prompt`] and
//! [`crate::config::DescribeConfig::user_prompt`]; the constants here are
//! used only when no override is provided.

/// Default system instruction: one sentence, nothing more.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Describe the image in one sentence.";

/// Default text that accompanies the image in the user message.
pub const DEFAULT_USER_PROMPT: &str = "Describe the image.";
