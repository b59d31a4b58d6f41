//! CLI binary for edgequake-img2txt.
//!
//! A thin shim over the library crate: `serve` runs the HTTP service,
//! `describe` runs the pipeline in-process, `request` talks to a running
//! server.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_img2txt::client::DEFAULT_SERVER_URL;
use edgequake_img2txt::{
    server, AppState, ArtifactPolicy, DescribeClient, DescribeConfig, DescribeResponse, Describer,
};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"
EXAMPLES:
  # Start the service on the default address
  OPENAI_API_KEY=sk-... img2txt serve

  # ...or keep the key in ./.env (OPENAI_API_KEY=sk-...)
  img2txt serve --bind 0.0.0.0:5000

  # Describe one image without a server
  img2txt describe ./photos/beach.jpg

  # Ask a running server (path is resolved on the server)
  img2txt request /srv/images/beach.jpg --url http://127.0.0.1:5000

NOTES:
  JPEG inputs are converted to PNG before upload. By default the PNG lives in
  a temporary directory and is removed after the request; pass
  --keep-artifacts to write it next to the source instead.
"#;

/// Describe images in one sentence using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "img2txt",
    version,
    about = "Describe images in one sentence using Vision LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "IMG2TXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "IMG2TXT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (POST /describe-image).
    Serve {
        /// Address to listen on.
        #[arg(long, env = "IMG2TXT_BIND", default_value = "127.0.0.1:5000")]
        bind: SocketAddr,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Describe a local image in-process and print the sentence.
    Describe {
        /// Path to the image.
        image: PathBuf,

        /// Print `{"description": ...}` instead of plain text.
        #[arg(long, env = "IMG2TXT_JSON")]
        json: bool,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Send a path to a running img2txt server.
    Request {
        /// Image path as seen by the server.
        image: String,

        /// Server base URL.
        #[arg(long, env = "IMG2TXT_URL", default_value = DEFAULT_SERVER_URL)]
        url: String,

        /// Whole-request timeout in seconds.
        #[arg(long, env = "IMG2TXT_REQUEST_TIMEOUT", default_value_t = 120)]
        timeout: u64,
    },
}

/// Flags shared by every command that talks to a model directly.
#[derive(Args, Debug)]
struct ModelArgs {
    /// LLM model ID (e.g. gpt-4o, gpt-4o-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "IMG2TXT_MODEL", default_value = "gpt-4o")]
    model: String,

    /// LLM provider: openai, anthropic, gemini, mistral, azure, ollama.
    #[arg(long, env = "IMG2TXT_PROVIDER", default_value = "openai")]
    provider: String,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "IMG2TXT_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Max LLM output tokens (provider default when unset).
    #[arg(long, env = "IMG2TXT_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Per-call LLM timeout in seconds; 0 leaves it to the HTTP transport.
    #[arg(long, env = "IMG2TXT_API_TIMEOUT", default_value_t = 0)]
    api_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "IMG2TXT_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Write converted PNGs next to their JPEG source and keep them.
    #[arg(long, env = "IMG2TXT_KEEP_ARTIFACTS")]
    keep_artifacts: bool,

    /// Strip code fences and quotes from the reply and collapse whitespace.
    #[arg(long, env = "IMG2TXT_CLEAN")]
    clean: bool,
}

impl ModelArgs {
    fn to_config(&self) -> Result<DescribeConfig> {
        let mut builder = DescribeConfig::builder()
            .provider_name(&self.provider)
            .model(&self.model)
            .temperature(self.temperature)
            .api_timeout_secs(self.api_timeout)
            .clean_output(self.clean)
            .artifacts(if self.keep_artifacts {
                ArtifactPolicy::Sibling
            } else {
                ArtifactPolicy::Scoped
            });

        if let Some(n) = self.max_tokens {
            builder = builder.max_tokens(n);
        }
        if let Some(ref path) = self.system_prompt {
            let prompt = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read system prompt from {}", path.display()))?;
            builder = builder.system_prompt(prompt.trim());
        }

        Ok(builder.build()?)
    }

    fn describer(&self) -> Result<Describer> {
        let config = self.to_config()?;
        Describer::from_config(config).context("Vision model is not usable")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A `.env` in the working directory may carry the provider key.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve { bind, model } => {
            // Credential problems stop the process before the port opens.
            let describer = model.describer()?;
            let listener = TcpListener::bind(bind)
                .await
                .with_context(|| format!("Failed to bind {bind}"))?;
            server::serve_with_shutdown(listener, AppState::new(describer), shutdown_signal())
                .await
                .context("HTTP server failed")?;
            info!("Server stopped");
        }
        Command::Describe { image, json, model } => {
            let describer = model.describer()?;
            let description = describer.describe(&image).await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&DescribeResponse { description })?
                );
            } else {
                println!("{description}");
            }
        }
        Command::Request { image, url, timeout } => {
            let client = DescribeClient::with_timeout(&url, timeout)?;
            let description = client.describe(&image).await?;
            println!("{description}");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Ctrl-C received, shutting down");
    }
}
