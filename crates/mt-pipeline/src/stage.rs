//! Stage ports.
//!
//! Each pipeline stage is a trait so the driver can be exercised with any
//! combination of real and substitute implementations. Implementations hold
//! no per-job state and are shared across concurrent jobs.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use mt_ai::SummarySettings;
use mt_core::config::{TranscriptionConfig, DEFAULT_TRANSCRIPTION_MODEL};
use mt_core::ReportFormat;

/// Pulls the audio track out of a video container.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    async fn extract(&self, input: &Path, output: &Path, overwrite: bool) -> mt_core::Result<()>;
}

/// Per-run transcription parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscribeSettings {
    pub model: String,
    /// `None` lets the model detect the language.
    pub language: Option<String>,
    /// Device preference; `auto` is resolved at transcription time.
    pub device: String,
}

impl Default for TranscribeSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_TRANSCRIPTION_MODEL.into(),
            language: None,
            device: "auto".into(),
        }
    }
}

impl From<&TranscriptionConfig> for TranscribeSettings {
    fn from(cfg: &TranscriptionConfig) -> Self {
        Self {
            model: cfg.model.clone(),
            language: None,
            device: cfg.device.clone(),
        }
    }
}

/// Turns an audio file into transcript text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path, settings: &TranscribeSettings) -> mt_core::Result<String>;
}

/// Condenses a transcript.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &str, settings: &SummarySettings) -> mt_core::Result<String>;
}

/// Serializes transcript and summary into a report document.
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    async fn render(
        &self,
        transcript: &str,
        summary: &str,
        format: ReportFormat,
    ) -> mt_core::Result<Vec<u8>>;
}

/// The four stage implementations used by one driver.
#[derive(Clone)]
pub struct Stages {
    pub extractor: Arc<dyn AudioExtractor>,
    pub transcriber: Arc<dyn Transcriber>,
    pub summarizer: Arc<dyn Summarizer>,
    pub renderer: Arc<dyn ReportRenderer>,
}

impl Stages {
    pub fn new(
        extractor: Arc<dyn AudioExtractor>,
        transcriber: Arc<dyn Transcriber>,
        summarizer: Arc<dyn Summarizer>,
        renderer: Arc<dyn ReportRenderer>,
    ) -> Self {
        Self {
            extractor,
            transcriber,
            summarizer,
            renderer,
        }
    }
}

impl std::fmt::Debug for Stages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stages").finish_non_exhaustive()
    }
}
