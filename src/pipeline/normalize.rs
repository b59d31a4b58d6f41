//! Format normalization: re-encode legacy JPEG inputs as PNG.
//!
//! The model request always declares the canonical PNG type for converted
//! images, so a JPEG must be decoded and losslessly re-encoded first. Every
//! other extension passes through untouched: `normalize(p).path() == p`.
//!
//! Where the PNG lands is decided by [`ArtifactPolicy`]. `Scoped` keeps it in
//! a `TempDir` owned by the returned [`NormalizedImage`], so the file is gone
//! as soon as the request drops it, even on an early `?` return or when the
//! request future is cancelled.

use crate::config::ArtifactPolicy;
use crate::error::DescribeError;
use image::ImageFormat;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Extensions (lower-case, no dot) that are converted before transport.
pub const LEGACY_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// MIME type declared for converted images and for unknown extensions.
pub const CANONICAL_MIME: &str = "image/png";

/// The image that will actually be sent: either the caller's file or a
/// freshly written PNG.
#[derive(Debug)]
pub enum NormalizedImage {
    /// Not a legacy format; the caller's path is used as-is.
    Original(PathBuf),
    /// Re-encoded PNG. When `_temp_dir` is `Some`, the directory (and the
    /// PNG inside it) is deleted on drop.
    Converted {
        path: PathBuf,
        _temp_dir: Option<TempDir>,
    },
}

impl NormalizedImage {
    /// Path of the file to read for transport.
    pub fn path(&self) -> &Path {
        match self {
            NormalizedImage::Original(p) => p,
            NormalizedImage::Converted { path, .. } => path,
        }
    }

    /// MIME type to declare in the request envelope.
    pub fn mime_type(&self) -> &'static str {
        match self {
            NormalizedImage::Original(p) => mime_type_for(p),
            NormalizedImage::Converted { .. } => CANONICAL_MIME,
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, NormalizedImage::Converted { .. })
    }
}

/// Lower-cased extension of `path`, if any.
fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// True when the extension (case-insensitive) is on the legacy allow-list.
pub fn is_legacy_format(path: &Path) -> bool {
    extension_of(path)
        .map(|ext| LEGACY_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// `photo.JPG` → `photo.png`, in the same directory.
pub fn sibling_path(path: &Path) -> PathBuf {
    path.with_extension("png")
}

/// MIME type for a pass-through file, derived from its extension.
///
/// Unknown extensions fall back to [`CANONICAL_MIME`].
pub fn mime_type_for(path: &Path) -> &'static str {
    match extension_of(path).as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => CANONICAL_MIME,
    }
}

/// Normalize `path` for transport.
///
/// Non-legacy paths return immediately without touching the disk; the
/// existence of the file is checked later, when it is read.
///
/// # Errors
/// - [`DescribeError::ImageRead`] if the JPEG cannot be read
/// - [`DescribeError::Decode`] if its bytes are not a valid JPEG
/// - [`DescribeError::ArtifactWrite`] if the PNG cannot be written
pub async fn normalize(
    path: &Path,
    policy: ArtifactPolicy,
) -> Result<NormalizedImage, DescribeError> {
    if !is_legacy_format(path) {
        debug!("No conversion needed: {}", path.display());
        return Ok(NormalizedImage::Original(path.to_path_buf()));
    }

    let source = path.to_path_buf();
    tokio::task::spawn_blocking(move || normalize_blocking(&source, policy))
        .await
        .map_err(|e| DescribeError::Internal(format!("Normalize task panicked: {}", e)))?
}

/// Blocking implementation: read, decode as JPEG, write PNG.
fn normalize_blocking(
    source: &Path,
    policy: ArtifactPolicy,
) -> Result<NormalizedImage, DescribeError> {
    let bytes = std::fs::read(source).map_err(|e| DescribeError::ImageRead {
        path: source.to_path_buf(),
        source: e,
    })?;

    let img = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).map_err(|e| {
        DescribeError::Decode {
            path: source.to_path_buf(),
            detail: e.to_string(),
        }
    })?;

    let (target, temp_dir) = match policy {
        ArtifactPolicy::Sibling => (sibling_path(source), None),
        ArtifactPolicy::Scoped => {
            let dir = TempDir::new().map_err(|e| DescribeError::ArtifactWrite {
                path: std::env::temp_dir(),
                detail: e.to_string(),
            })?;
            let mut name: OsString = source
                .file_stem()
                .map(|s| s.to_os_string())
                .unwrap_or_else(|| OsString::from("image"));
            name.push(".png");
            (dir.path().join(name), Some(dir))
        }
    };

    img.save_with_format(&target, ImageFormat::Png)
        .map_err(|e| DescribeError::ArtifactWrite {
            path: target.clone(),
            detail: e.to_string(),
        })?;

    info!(
        "Converted {} → {} ({}x{})",
        source.display(),
        target.display(),
        img.width(),
        img.height()
    );

    Ok(NormalizedImage::Converted {
        path: target,
        _temp_dir: temp_dir,
    })
}
