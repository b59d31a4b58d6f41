//! Error types for the edgequake-img2txt library.
//!
//! A single tagged enum, [`DescribeError`], covers every way a description
//! request can fail. Variants are grouped by where the failure originates:
//!
//! * **Input**: the caller sent no image path.
//! * **Configuration**: no credential, unknown provider, invalid settings.
//! * **Read / Decode**: the image could not be read, decoded or re-encoded.
//! * **Upstream**: the vision model call failed, timed out or came back empty.
//!
//! The HTTP layer answers 400 for input errors and 500 for everything else
//! (see [`crate::server::status_code`]). The `Display` text is always the
//! `error` field of the JSON body; [`DescribeError::kind`] goes to the log.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-img2txt library.
#[derive(Debug, Error)]
pub enum DescribeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The request carried no `image_path`, or an empty one.
    #[error("Image path is required")]
    MissingImagePath,

    // ── Config errors ─────────────────────────────────────────────────────
    /// The credential environment variable for the provider is unset or blank.
    #[error("API key not found in environment variables.\nSet {var} before starting the service.")]
    MissingCredentials { var: String },

    /// The provider factory refused to build the named provider.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Image errors ──────────────────────────────────────────────────────
    /// The image file could not be opened or read.
    #[error("Failed to read image '{}': {source}", .path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a valid image in the format implied by the extension.
    #[error("Failed to decode image '{}': {detail}", .path.display())]
    Decode { path: PathBuf, detail: String },

    /// The normalized PNG could not be written.
    #[error("Failed to write normalized image '{}': {detail}", .path.display())]
    ArtifactWrite { path: PathBuf, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The vision model call failed (network, authentication, bad response).
    #[error("LLM API error: {message}")]
    Upstream { message: String },

    /// The model answered with no text at all.
    #[error("Model '{model}' returned an empty description")]
    EmptyResponse { model: String },

    /// The model did not answer within the configured timeout.
    #[error("LLM API call timed out after {secs}s")]
    Timeout { secs: u64 },

    // ── Client errors ─────────────────────────────────────────────────────
    /// The describe-image server could not be reached.
    #[error("Failed to reach '{url}': {reason}")]
    RequestFailed { url: String, reason: String },

    /// The describe-image server answered with an error body.
    #[error("API error: {message}")]
    Remote { status: u16, message: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DescribeError {
    /// Short, stable label for the failure class, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            DescribeError::MissingImagePath => "input",
            DescribeError::MissingCredentials { .. }
            | DescribeError::ProviderNotConfigured { .. }
            | DescribeError::InvalidConfig(_) => "configuration",
            DescribeError::ImageRead { .. } => "read",
            DescribeError::Decode { .. } | DescribeError::ArtifactWrite { .. } => "decode",
            DescribeError::Upstream { .. }
            | DescribeError::EmptyResponse { .. }
            | DescribeError::Timeout { .. }
            | DescribeError::RequestFailed { .. }
            | DescribeError::Remote { .. } => "upstream",
            DescribeError::Internal(_) => "internal",
        }
    }
}
