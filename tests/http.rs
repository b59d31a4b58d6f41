//! HTTP integration tests for `POST /describe-image`.
//!
//! A real server is bound to an ephemeral loopback port and driven with
//! `reqwest`. The vision model is a stub that counts its invocations, so no
//! network access or API key is needed.
//!
//! Run with:
//!   cargo test --test http

use async_trait::async_trait;
use edgequake_img2txt::pipeline::llm::{ChatMessage, CompletionOptions};
use edgequake_img2txt::{
    server, AppState, ArtifactPolicy, DescribeClient, DescribeConfig, DescribeError, Describer,
    VisionModel,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// What the stub model does when called.
enum Reply {
    Text(&'static str),
    Fail(fn() -> DescribeError),
}

struct StubModel {
    reply: Reply,
    calls: AtomicUsize,
}

impl StubModel {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionModel for StubModel {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<String, DescribeError> {
        assert_eq!(messages.len(), 2, "system + user turn expected");
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Text(t) => Ok(t.to_string()),
            Reply::Fail(make) => Err(make()),
        }
    }
}

/// Start a server on 127.0.0.1:0 and return its base URL.
async fn spawn_server(model: Arc<StubModel>, policy: ArtifactPolicy) -> String {
    let config = DescribeConfig::builder()
        .artifacts(policy)
        .build()
        .expect("valid config");
    let state = AppState::new(Describer::new(model, config));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        server::serve(listener, state).await.expect("server");
    });
    format!("http://{addr}")
}

async fn post_json(base: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{base}/describe-image"))
        .json(&body)
        .send()
        .await
        .expect("request");
    let status = resp.status().as_u16();
    (status, resp.json().await.expect("json body"))
}

fn write_jpeg(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let img = RgbImage::from_fn(32, 24, |x, y| Rgb([(x * 8) as u8, (y * 10) as u8, 200]));
    DynamicImage::ImageRgb8(img)
        .save_with_format(&path, ImageFormat::Jpeg)
        .expect("write jpeg");
    path
}

fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 0, 0])))
        .save_with_format(&path, ImageFormat::Png)
        .expect("write png");
    path
}

// ── Success path ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn png_is_described_with_200() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(dir.path(), "red.png");
    let model = StubModel::new(Reply::Text("A solid red square."));
    let base = spawn_server(model.clone(), ArtifactPolicy::Scoped).await;

    let (status, body) = post_json(&base, json!({ "image_path": png })).await;

    assert_eq!(status, 200);
    assert_eq!(body["description"], "A solid red square.");
    assert!(body.get("error").is_none());
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn jpeg_twice_makes_two_upstream_calls_and_overwrites_sibling() {
    let dir = tempfile::tempdir().unwrap();
    let jpg = write_jpeg(dir.path(), "gradient.jpg");
    let model = StubModel::new(Reply::Text("A blue gradient."));
    let base = spawn_server(model.clone(), ArtifactPolicy::Sibling).await;

    let (first, _) = post_json(&base, json!({ "image_path": jpg })).await;
    assert_eq!(first, 200);
    let sibling = dir.path().join("gradient.png");
    assert!(sibling.exists(), "sibling PNG written on first call");

    let (second, body) = post_json(&base, json!({ "image_path": jpg })).await;
    assert_eq!(second, 200, "existing sibling must be overwritten, not fail");
    assert_eq!(body["description"], "A blue gradient.");
    assert_eq!(model.calls(), 2, "no caching between identical requests");
    assert!(image::open(&sibling).is_ok());
}

#[tokio::test]
async fn scoped_jpeg_leaves_directory_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let jpg = write_jpeg(dir.path(), "holiday.JPEG");
    let model = StubModel::new(Reply::Text("A holiday snapshot."));
    let base = spawn_server(model.clone(), ArtifactPolicy::Scoped).await;

    let (status, _) = post_json(&base, json!({ "image_path": jpg })).await;
    assert_eq!(status, 200);

    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1, "only the source JPEG remains");
}

// ── Input errors ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_or_empty_path_is_400_without_upstream_call() {
    let model = StubModel::new(Reply::Text("unused"));
    let base = spawn_server(model.clone(), ArtifactPolicy::Scoped).await;

    for body in [json!({}), json!({ "image_path": "" }), json!({ "image_path": null })] {
        let (status, reply) = post_json(&base, body).await;
        assert_eq!(status, 400);
        assert_eq!(reply, json!({ "error": "Image path is required" }));
    }
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn non_json_body_is_400() {
    let model = StubModel::new(Reply::Text("unused"));
    let base = spawn_server(model.clone(), ArtifactPolicy::Scoped).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/describe-image"))
        .body("image_path=/tmp/x.png")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Image path is required");
    assert_eq!(model.calls(), 0);
}

// ── Downstream errors ────────────────────────────────────────────────────────

#[tokio::test]
async fn nonexistent_path_is_500_with_read_message() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("ghost.png");
    let model = StubModel::new(Reply::Text("unused"));
    let base = spawn_server(model.clone(), ArtifactPolicy::Scoped).await;

    let (status, body) = post_json(&base, json!({ "image_path": missing })).await;

    assert_eq!(status, 500);
    let msg = body["error"].as_str().unwrap();
    assert!(msg.contains("Failed to read image"), "got: {msg}");
    assert!(msg.contains("ghost.png"), "got: {msg}");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn nonexistent_jpeg_is_500_too() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("ghost.jpg");
    let model = StubModel::new(Reply::Text("unused"));
    let base = spawn_server(model.clone(), ArtifactPolicy::Sibling).await;

    let (status, body) = post_json(&base, json!({ "image_path": missing })).await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("Failed to read image"));
}

#[tokio::test]
async fn corrupt_jpeg_is_500_with_decode_message() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("broken.jpg");
    std::fs::write(&bad, b"\xff\xd8 not really").unwrap();
    let model = StubModel::new(Reply::Text("unused"));
    let base = spawn_server(model.clone(), ArtifactPolicy::Sibling).await;

    let (status, body) = post_json(&base, json!({ "image_path": bad })).await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("Failed to decode image"));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn rejected_api_key_is_500_with_provider_message() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(dir.path(), "key.png");
    let model = StubModel::new(Reply::Fail(|| DescribeError::Upstream {
        message: "401 Unauthorized: Incorrect API key provided".into(),
    }));
    let base = spawn_server(model.clone(), ArtifactPolicy::Scoped).await;

    let (status, body) = post_json(&base, json!({ "image_path": png })).await;
    assert_eq!(status, 500);
    let msg = body["error"].as_str().unwrap();
    assert!(msg.contains("Incorrect API key"), "got: {msg}");
}

#[tokio::test]
async fn upstream_failure_is_500_with_verbatim_message() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(dir.path(), "net.png");
    let model = StubModel::new(Reply::Fail(|| DescribeError::Upstream {
        message: "connection reset by peer".into(),
    }));
    let base = spawn_server(model.clone(), ArtifactPolicy::Scoped).await;

    let (status, body) = post_json(&base, json!({ "image_path": png })).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "LLM API error: connection reset by peer");
    assert_eq!(model.calls(), 1, "no retry");
}

#[tokio::test]
async fn description_is_returned_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(dir.path(), "sign.png");
    let model = StubModel::new(Reply::Text("A  sign\nreads hi."));
    let base = spawn_server(model.clone(), ArtifactPolicy::Scoped).await;

    let (status, body) = post_json(&base, json!({ "image_path": png })).await;
    assert_eq!(status, 200);
    assert_eq!(body["description"], "A  sign\nreads hi.");
}

// ── Misc routes & client ─────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let base = spawn_server(StubModel::new(Reply::Text("x")), ArtifactPolicy::Scoped).await;
    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn client_round_trips_description_and_error() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(dir.path(), "client.png");
    let base = spawn_server(
        StubModel::new(Reply::Text("A tiny red tile.")),
        ArtifactPolicy::Scoped,
    )
    .await;
    let client = DescribeClient::new(&base);

    let ok = client.describe(png.to_str().unwrap()).await.unwrap();
    assert_eq!(ok, "A tiny red tile.");

    match client.describe("").await.unwrap_err() {
        DescribeError::Remote { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Image path is required");
        }
        other => panic!("expected Remote error, got {other:?}"),
    }
}
