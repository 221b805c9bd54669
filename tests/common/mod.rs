//! Shared test harness for integration tests.
//!
//! [`TestHarness`] owns a temporary output root and an [`AppContext`] whose
//! extraction, transcription and summarization stages are deterministic
//! stubs. Report rendering uses the real document renderer.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mt_av::ToolRegistry;
use mt_core::config::Config;
use mt_core::{Error, Stage};
use mt_pipeline::stages::DocumentRenderer;
use mt_pipeline::{
    AudioExtractor, JobWorkspace, PipelineDriver, Stages, Summarizer, SummarySettings,
    TranscribeSettings, Transcriber,
};
use mt_server::context::{AppContext, SummarizerFactory};
use mt_server::router::build_router;
use tempfile::TempDir;

pub const TRANSCRIPT: &str = "Alice: Welcome everyone.\n\nBob: The budget is approved.";
pub const SUMMARY: &str = "The budget was approved.";

/// Deterministic stand-in for the external stages.
#[derive(Default)]
pub struct StubStages {
    pub extract_calls: AtomicUsize,
    pub transcribe_calls: AtomicUsize,
    pub summarize_calls: AtomicUsize,
    /// Stage that should fail, if any.
    pub fail_at: Option<Stage>,
    /// Return blank text from the transcriber.
    pub silent: bool,
}

#[async_trait]
impl AudioExtractor for StubStages {
    async fn extract(&self, input: &Path, output: &Path, _overwrite: bool) -> mt_core::Result<()> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(Stage::Extract) {
            return Err(Error::Extraction("ffmpeg failed: moov atom not found".into()));
        }
        std::fs::copy(input, output)?;
        Ok(())
    }
}

#[async_trait]
impl Transcriber for StubStages {
    async fn transcribe(&self, audio: &Path, _: &TranscribeSettings) -> mt_core::Result<String> {
        self.transcribe_calls.fetch_add(1, Ordering::SeqCst);
        assert!(audio.is_file(), "transcriber got a missing file");
        if self.fail_at == Some(Stage::Transcribe) {
            return Err(Error::Transcription("whisper crashed".into()));
        }
        if self.silent {
            return Ok(String::new());
        }
        Ok(TRANSCRIPT.into())
    }
}

#[async_trait]
impl Summarizer for StubStages {
    async fn summarize(&self, _: &str, _: &SummarySettings) -> mt_core::Result<String> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(Stage::Summarize) {
            return Err(Error::Summarization("HTTP 500 from completion service".into()));
        }
        Ok(SUMMARY.into())
    }
}

/// Hands out the harness stubs as the per-request summarizer.
pub struct StubSummarizers(pub Arc<StubStages>);

impl SummarizerFactory for StubSummarizers {
    fn summarizer(
        &self,
        _: Option<&str>,
        _: Option<&str>,
    ) -> mt_core::Result<Arc<dyn Summarizer>> {
        Ok(self.0.clone())
    }
}

pub struct TestHarness {
    pub root: TempDir,
    pub stubs: Arc<StubStages>,
    pub ctx: AppContext,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_stubs(StubStages::default())
    }

    pub fn with_stubs(stubs: StubStages) -> Self {
        let root = tempfile::tempdir().expect("failed to create temp dir");
        let mut config = Config::default();
        config.server.host = "127.0.0.1".into();
        config.server.port = 0;
        config.server.output_dir = root.path().join("outputs");
        config.server.scratch_dir = Some(root.path().join("scratch"));

        let workspace = JobWorkspace::new(&config.server.output_dir)
            .expect("failed to create output root")
            .with_scratch_root(config.server.scratch_dir.clone());
        let stubs = Arc::new(stubs);

        let ctx = AppContext {
            config: Arc::new(config),
            tools: Arc::new(ToolRegistry::default()),
            workspace: Arc::new(workspace),
            extractor: stubs.clone(),
            transcriber: stubs.clone(),
            renderer: Arc::new(DocumentRenderer),
            summarizers: Arc::new(StubSummarizers(stubs.clone())),
        };
        Self { root, stubs, ctx }
    }

    pub fn output_root(&self) -> PathBuf {
        self.root.path().join("outputs")
    }

    /// Number of entries left under `outputs/` and `scratch/`.
    pub fn leftovers(&self) -> (usize, usize) {
        let count = |dir: PathBuf| std::fs::read_dir(dir).map(|rd| rd.count()).unwrap_or(0);
        (
            count(self.output_root()),
            count(self.root.path().join("scratch")),
        )
    }

    /// A driver wired to the stubs.
    pub fn driver(&self) -> PipelineDriver {
        let stages = Stages::new(
            self.ctx.extractor.clone(),
            self.ctx.transcriber.clone(),
            self.stubs.clone(),
            self.ctx.renderer.clone(),
        );
        PipelineDriver::new(self.ctx.workspace.clone(), stages)
    }

    pub fn router(&self) -> axum::Router {
        build_router(self.ctx.clone())
    }

    /// Serve the router on a random local port.
    pub async fn serve(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        addr
    }
}
