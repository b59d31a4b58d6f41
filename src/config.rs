//! Configuration types for image description.
//!
//! All description behaviour is controlled through [`DescribeConfig`], built
//! via its [`DescribeConfigBuilder`]. The same config is shared by the HTTP
//! server, the in-process CLI path and library callers.

use crate::error::DescribeError;
use crate::prompts::{DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT};
use serde::{Deserialize, Serialize};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Provider used when none is configured.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Configuration for describing an image.
///
/// Built via [`DescribeConfig::builder()`] or using
/// [`DescribeConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_img2txt::{ArtifactPolicy, DescribeConfig};
///
/// let config = DescribeConfig::builder()
///     .model("gpt-4o-mini")
///     .temperature(0.2)
///     .artifacts(ArtifactPolicy::Sibling)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gpt-4o-mini");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescribeConfig {
    /// LLM provider name (e.g. "openai", "anthropic", "ollama"). Default: "openai".
    pub provider_name: String,

    /// LLM model identifier. Default: "gpt-4o".
    pub model: String,

    /// Sampling temperature. Default: 0.0, i.e. as deterministic as the
    /// provider allows.
    pub temperature: f32,

    /// Maximum tokens the model may generate. `None` leaves the provider default.
    pub max_tokens: Option<usize>,

    /// Custom system prompt. If None, uses [`DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Custom text sent alongside the image. If None, uses [`DEFAULT_USER_PROMPT`].
    pub user_prompt: Option<String>,

    /// Where the normalized PNG of a JPEG input is written and whether it is
    /// cleaned up. Default: [`ArtifactPolicy::Scoped`].
    pub artifacts: ArtifactPolicy,

    /// Upper bound on a single model call in seconds. 0 disables the bound
    /// and leaves timing to the HTTP transport. Default: 0.
    pub api_timeout_secs: u64,

    /// Tidy the model's reply (strip code fences and wrapping quotes,
    /// collapse whitespace). Default: false, the reply is returned verbatim.
    pub clean_output: bool,
}

impl Default for DescribeConfig {
    fn default() -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: None,
            system_prompt: None,
            user_prompt: None,
            artifacts: ArtifactPolicy::default(),
            api_timeout_secs: 0,
            clean_output: false,
        }
    }
}

impl DescribeConfig {
    /// Create a new builder for `DescribeConfig`.
    pub fn builder() -> DescribeConfigBuilder {
        DescribeConfigBuilder {
            config: Self::default(),
        }
    }

    /// The system prompt in effect.
    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    /// The user prompt in effect.
    pub fn user_prompt(&self) -> &str {
        self.user_prompt.as_deref().unwrap_or(DEFAULT_USER_PROMPT)
    }
}

/// Builder for [`DescribeConfig`].
#[derive(Debug)]
pub struct DescribeConfigBuilder {
    config: DescribeConfig,
}

impl DescribeConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn user_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.user_prompt = Some(prompt.into());
        self
    }

    pub fn artifacts(mut self, policy: ArtifactPolicy) -> Self {
        self.config.artifacts = policy;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn clean_output(mut self, enabled: bool) -> Self {
        self.config.clean_output = enabled;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DescribeConfig, DescribeError> {
        let c = &self.config;
        if c.provider_name.trim().is_empty() {
            return Err(DescribeError::InvalidConfig(
                "Provider name must not be empty".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(DescribeError::InvalidConfig(
                "Model must not be empty".into(),
            ));
        }
        if c.max_tokens == Some(0) {
            return Err(DescribeError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What happens to the PNG produced when a JPEG input is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArtifactPolicy {
    /// Write into a private temporary directory that is removed when the
    /// request finishes, fails or is dropped. (default)
    #[default]
    Scoped,
    /// Write `<stem>.png` next to the source and keep it. Repeated requests
    /// overwrite the same file.
    Sibling,
}
