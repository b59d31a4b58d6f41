//! Describe entry points: path in, one sentence out.
//!
//! [`Describer`] owns the model handle and the config, so the HTTP server,
//! the CLI and library callers all run exactly the same sequence:
//! normalize → encode → model call.

use crate::config::DescribeConfig;
use crate::error::DescribeError;
use crate::pipeline::llm::{self, ProviderModel, VisionModel};
use crate::pipeline::{encode, normalize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Runs the describe pipeline against one [`VisionModel`].
///
/// Cheap to share: wrap it in an `Arc` and hand it to every request.
pub struct Describer {
    model: Arc<dyn VisionModel>,
    config: DescribeConfig,
}

impl fmt::Debug for Describer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Describer")
            .field("model", &self.model.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Describer {
    /// Use a pre-built model (tests, custom middleware).
    pub fn new(model: Arc<dyn VisionModel>, config: DescribeConfig) -> Self {
        Self { model, config }
    }

    /// Build the provider named in `config`.
    ///
    /// # Errors
    /// [`DescribeError::MissingCredentials`] when the provider's API key is
    /// not set, [`DescribeError::ProviderNotConfigured`] when the factory
    /// rejects the provider/model pair.
    pub fn from_config(config: DescribeConfig) -> Result<Self, DescribeError> {
        let model = ProviderModel::from_config(&config)?;
        Ok(Self::new(Arc::new(model), config))
    }

    /// Like [`Describer::from_config`], reading credentials through `lookup`.
    pub fn from_config_with_lookup<F>(
        config: DescribeConfig,
        lookup: F,
    ) -> Result<Self, DescribeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model = ProviderModel::from_config_with_lookup(&config, lookup)?;
        Ok(Self::new(Arc::new(model), config))
    }

    pub fn config(&self) -> &DescribeConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Describe the image at `path` in one sentence.
    ///
    /// JPEG inputs are re-encoded as PNG first; where that PNG lives is
    /// governed by [`DescribeConfig::artifacts`]. Every call reaches the
    /// model; nothing is cached.
    pub async fn describe(&self, path: impl AsRef<Path>) -> Result<String, DescribeError> {
        let start = Instant::now();
        let path = path.as_ref();
        info!("Describing {}", path.display());

        // ── Step 1: Normalize format ─────────────────────────────────────
        let image = normalize::normalize(path, self.config.artifacts).await?;

        // ── Step 2: Encode for transport ─────────────────────────────────
        let data = encode::encode_image(&image).await?;

        // ── Step 3: Ask the model ────────────────────────────────────────
        let description =
            llm::request_description(self.model.as_ref(), data, &self.config).await?;

        info!(
            "Described {} in {}ms",
            path.display(),
            start.elapsed().as_millis()
        );
        // `image` drops here, removing any scoped artifact.
        Ok(description)
    }
}

/// Synchronous wrapper around [`Describer::describe`].
///
/// Creates a temporary tokio runtime internally.
pub fn describe_sync(
    describer: &Describer,
    path: impl AsRef<Path>,
) -> Result<String, DescribeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DescribeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(describer.describe(path))
}
