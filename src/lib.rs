//! # edgequake-img2txt
//!
//! Describe a local image in one sentence using a Vision Language Model.
//!
//! The crate is a small HTTP service (`POST /describe-image`), a CLI
//! (`img2txt`) and a library, all running the same pipeline:
//!
//! ```text
//! image path
//!  │
//!  ├─ 1. Normalize  JPEG → lossless PNG (spawn_blocking); other formats pass through
//!  ├─ 2. Encode     file bytes → base64 ImageData
//!  ├─ 3. VLM        one chat call: system instruction + prompt + image
//!  └─ 4. Polish     strip quotes / fences / stray whitespace
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_img2txt::{DescribeConfig, Describer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads OPENAI_API_KEY; fails right here if it is missing.
//!     let describer = Describer::from_config(DescribeConfig::default())?;
//!     let sentence = describer.describe("holiday.jpg").await?;
//!     println!("{sentence}");
//!     Ok(())
//! }
//! ```
//!
//! ## Serving
//!
//! ```rust,no_run
//! use edgequake_img2txt::{server, AppState, DescribeConfig, Describer};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let describer = Describer::from_config(DescribeConfig::default())?;
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//! server::serve(listener, AppState::new(describer)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2txt` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod describe;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::DescribeClient;
pub use config::{ArtifactPolicy, DescribeConfig, DescribeConfigBuilder};
pub use describe::{describe_sync, Describer};
pub use error::DescribeError;
pub use pipeline::llm::{ProviderModel, VisionModel};
pub use pipeline::normalize::{normalize, NormalizedImage};
pub use server::{AppState, DescribeRequest, DescribeResponse, ErrorBody};
