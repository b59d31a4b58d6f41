//! Pipeline stages for describing an image.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! normalize ──▶ encode ──▶ llm ──▶ [postprocess]
//! (JPEG→PNG)   (base64)   (VLM)   (opt-in cleanup)
//! ```
//!
//! 1. [`normalize`] — re-encode legacy JPEG inputs as lossless PNG; runs in
//!    `spawn_blocking` because decoding is CPU-bound
//! 2. [`encode`]    — read the file and base64-wrap it for the request body
//! 3. [`llm`]       — build the two-message request and call the model; the
//!    only stage with network I/O
//! 4. [`postprocess`] — trim wrapping quotes, fences and stray whitespace;
//!    only when `clean_output` is set, otherwise the reply is returned as-is

pub mod encode;
pub mod llm;
pub mod normalize;
pub mod postprocess;
