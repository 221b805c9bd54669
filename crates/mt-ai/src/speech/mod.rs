//! Speech-to-text.
//!
//! A [`SpeechEngine`] turns an audio file into raw text. [`transcribe_audio`]
//! wraps any engine with the rules every transcription must obey: the input
//! must be an existing `.wav` or `.mp3`, and an empty result is a failure.

mod openai;
mod whisper_cli;

use std::path::Path;

use async_trait::async_trait;
use mt_core::{AudioFormat, Error};

pub use openai::OpenAiSpeechEngine;
pub use whisper_cli::WhisperCliEngine;

/// Parameters for one transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    /// Model name, e.g. `small` or `whisper-1`.
    pub model: String,
    /// Language code; `None` lets the model detect it.
    pub language: Option<String>,
    /// Concrete device (`cpu`, `cuda`, `cuda:1`); see [`resolve_device`].
    pub device: String,
}

impl SpeechRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            language: None,
            device: "cpu".into(),
        }
    }

    pub fn language(mut self, language: Option<String>) -> Self {
        self.language = language.filter(|l| !l.trim().is_empty());
        self
    }

    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Whether half-precision inference should be used.
    pub fn fp16(&self) -> bool {
        self.device.starts_with("cuda")
    }
}

/// A backend capable of transcribing an audio file.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    /// Transcribe `audio`. Implementations return the raw text; trimming
    /// and empty checks happen in [`transcribe_audio`].
    async fn transcribe(&self, audio: &Path, request: &SpeechRequest) -> mt_core::Result<String>;
}

/// Resolve a device preference to a concrete device.
///
/// Anything other than `auto` (or nothing) is passed through unchanged.
/// `auto` picks `cuda` when an NVIDIA driver is visible on `PATH`.
pub fn resolve_device(preferred: Option<&str>) -> String {
    match preferred.map(str::trim) {
        Some(p) if !p.is_empty() && !p.eq_ignore_ascii_case("auto") => p.to_string(),
        _ if which::which("nvidia-smi").is_ok() => "cuda".into(),
        _ => "cpu".into(),
    }
}

/// Transcribe `audio` with `engine`, returning trimmed, non-empty text.
pub async fn transcribe_audio(
    engine: &dyn SpeechEngine,
    audio: &Path,
    request: &SpeechRequest,
) -> mt_core::Result<String> {
    if !tokio::fs::try_exists(audio).await.unwrap_or(false) {
        return Err(Error::Transcription(format!(
            "audio file does not exist: {}",
            audio.display()
        )));
    }
    AudioFormat::from_path(audio)?;

    tracing::info!(
        engine = engine.name(),
        model = %request.model,
        device = %request.device,
        language = request.language.as_deref().unwrap_or("auto"),
        "transcribing {}",
        audio.display()
    );

    let text = engine.transcribe(audio, request).await?;
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Transcription(format!(
            "{} returned no text",
            engine.name()
        )));
    }

    tracing::debug!(chars = text.len(), "transcription finished");
    Ok(text.to_string())
}
