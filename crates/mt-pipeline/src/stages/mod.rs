//! Default stage adapters backed by the real collaborators.

mod completion;
mod document;
mod ffmpeg;
mod speech;

use std::path::PathBuf;
use std::sync::Arc;

use mt_ai::{OpenAiSpeechEngine, SpeechEngine, WhisperCliEngine};
use mt_av::{ToolConfig, ToolRegistry};
use mt_core::config::{Config, SpeechBackend};
use mt_core::Error;

use crate::stage::{Stages, Summarizer};

pub use completion::CompletionSummarizer;
pub use document::DocumentRenderer;
pub use ffmpeg::FfmpegExtractor;
pub use speech::SpeechTranscriber;

/// Pick the speech engine named by `transcription.backend`.
///
/// A missing whisper binary is not fatal here; the failure surfaces when a
/// job reaches the transcription stage.
pub fn speech_engine(config: &Config, tools: &ToolRegistry) -> mt_core::Result<Arc<dyn SpeechEngine>> {
    match config.transcription.backend {
        SpeechBackend::Whisper => {
            let engine = WhisperCliEngine::from_registry(tools).unwrap_or_else(|e| {
                tracing::warn!("{e}; transcription will fail until whisper is installed");
                WhisperCliEngine::new(ToolConfig {
                    name: "whisper".into(),
                    path: PathBuf::from("whisper"),
                    timeout_secs: Some(config.tools.timeout_secs).filter(|&s| s > 0),
                })
            });
            Ok(Arc::new(engine))
        }
        SpeechBackend::OpenAi => {
            let t = &config.transcription;
            let key = t
                .api_key
                .clone()
                .or_else(|| config.summary.api_key.clone())
                .ok_or_else(|| {
                    Error::Validation("transcription backend 'openai' requires an api_key".into())
                })?;
            let base = t.base_url.clone().or_else(|| config.summary.base_url.clone());
            Ok(Arc::new(OpenAiSpeechEngine::new(key, base)))
        }
    }
}

/// The production stage set: ffmpeg, the configured speech engine, the
/// given summarizer, and the document renderer.
pub fn default_stages(
    config: &Config,
    tools: Arc<ToolRegistry>,
    summarizer: Arc<dyn Summarizer>,
) -> mt_core::Result<Stages> {
    let engine = speech_engine(config, &tools)?;
    Ok(Stages::new(
        Arc::new(FfmpegExtractor::new(tools)),
        Arc::new(SpeechTranscriber::new(engine)),
        summarizer,
        Arc::new(DocumentRenderer),
    ))
}
