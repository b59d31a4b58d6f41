//! Image encoding: file bytes → base64 wrapped in `ImageData`.
//!
//! VLM APIs accept images as base64 data-URIs embedded in the JSON request
//! body. The provider assembles `data:<mime>;base64,<payload>` from the
//! `ImageData` built here; the payload lives only as long as the request.

use crate::error::DescribeError;
use crate::pipeline::normalize::NormalizedImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use tracing::debug;

/// Read the normalized image from disk and encode it for the model request.
///
/// # Errors
/// [`DescribeError::ImageRead`] when the file is missing or unreadable.
pub async fn encode_image(image: &NormalizedImage) -> Result<ImageData, DescribeError> {
    let path = image.path();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DescribeError::ImageRead {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(encode_bytes(&bytes, image.mime_type()))
}

/// Standard-alphabet base64 of `bytes`, tagged with `mime_type`.
pub fn encode_bytes(bytes: &[u8], mime_type: &str) -> ImageData {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded image → {} bytes base64 ({})", b64.len(), mime_type);
    ImageData::new(b64, mime_type)
}
