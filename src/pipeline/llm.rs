//! VLM interaction: build the vision request and call the model.
//!
//! The model sits behind the [`VisionModel`] trait so the HTTP layer and the
//! tests never depend on a live provider. [`ProviderModel`] is the production
//! implementation backed by an `edgequake-llm` provider.
//!
//! No retry: one request, one model call.

use crate::config::DescribeConfig;
use crate::error::DescribeError;
use crate::pipeline::postprocess::clean_description;
use async_trait::async_trait;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

pub use edgequake_llm::{ChatMessage, CompletionOptions, ImageData};

/// A chat-completion backend able to look at images.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Send `messages` and return the text of the first completion choice.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, DescribeError>;
}

/// [`VisionModel`] backed by an `edgequake-llm` provider.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl ProviderModel {
    /// Wrap a pre-built provider.
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }

    /// Build the provider named in `config`, checking its credential in the
    /// process environment first.
    ///
    /// Call once at startup: a missing key fails here instead of on the
    /// first request.
    pub fn from_config(config: &DescribeConfig) -> Result<Self, DescribeError> {
        Self::from_config_with_lookup(config, |var| std::env::var(var).ok())
    }

    /// Like [`ProviderModel::from_config`], reading credentials through
    /// `lookup` instead of the environment.
    pub fn from_config_with_lookup<F>(
        config: &DescribeConfig,
        lookup: F,
    ) -> Result<Self, DescribeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        check_credentials(&config.provider_name, lookup)?;

        let provider = ProviderFactory::create_llm_provider(&config.provider_name, &config.model)
            .map_err(|e| DescribeError::ProviderNotConfigured {
                provider: config.provider_name.clone(),
                hint: format!("{e}"),
            })?;

        info!(
            "Using provider '{}' with model '{}'",
            config.provider_name, config.model
        );
        Ok(Self::new(
            provider,
            format!("{}/{}", config.provider_name, config.model),
        ))
    }
}

#[async_trait]
impl VisionModel for ProviderModel {
    fn name(&self) -> &str {
        &self.label
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, DescribeError> {
        let response = self
            .provider
            .chat(messages, Some(options))
            .await
            .map_err(|e| DescribeError::Upstream {
                message: format!("{}", e),
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.label, response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Environment variable holding the API key for `provider`.
///
/// `None` for local providers that need no key and for names this crate
/// does not know; the provider factory has the final word on those.
pub fn credential_var(provider: &str) -> Option<&'static str> {
    match provider.to_ascii_lowercase().as_str() {
        "openai" => Some("OPENAI_API_KEY"),
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        "gemini" => Some("GEMINI_API_KEY"),
        "mistral" => Some("MISTRAL_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        "xai" => Some("XAI_API_KEY"),
        "azure" => Some("AZURE_OPENAI_API_KEY"),
        _ => None,
    }
}

/// Fail with [`DescribeError::MissingCredentials`] when the provider's key
/// is absent or blank according to `lookup`.
pub fn check_credentials<F>(provider: &str, lookup: F) -> Result<(), DescribeError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(var) = credential_var(provider) else {
        return Ok(());
    };
    match lookup(var) {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(DescribeError::MissingCredentials {
            var: var.to_string(),
        }),
    }
}

/// Build the request: the system instruction, then one user turn carrying
/// the prompt text and the image.
pub fn build_messages(config: &DescribeConfig, image: ImageData) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(config.system_prompt()),
        ChatMessage::user_with_images(config.user_prompt(), vec![image]),
    ]
}

/// Build `CompletionOptions` from the describe config.
fn build_options(config: &DescribeConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}

/// Ask `model` for a description of `image`.
///
/// # Errors
/// - whatever the model returns (normally [`DescribeError::Upstream`])
/// - [`DescribeError::Timeout`] when `api_timeout_secs` elapses first
/// - [`DescribeError::EmptyResponse`] when the reply is blank
///
/// The reply is returned exactly as the model wrote it unless
/// `clean_output` is set.
pub async fn request_description(
    model: &dyn VisionModel,
    image: ImageData,
    config: &DescribeConfig,
) -> Result<String, DescribeError> {
    let start = Instant::now();
    let messages = build_messages(config, image);
    let options = build_options(config);

    let raw = if config.api_timeout_secs > 0 {
        let secs = config.api_timeout_secs;
        timeout(Duration::from_secs(secs), model.complete(&messages, &options))
            .await
            .map_err(|_| DescribeError::Timeout { secs })??
    } else {
        model.complete(&messages, &options).await?
    };

    let description = if config.clean_output {
        clean_description(&raw)
    } else {
        raw
    };
    if description.trim().is_empty() {
        return Err(DescribeError::EmptyResponse {
            model: config.model.clone(),
        });
    }

    debug!(
        "{}: {} chars in {:?}",
        model.name(),
        description.len(),
        start.elapsed()
    );
    Ok(description)
}
