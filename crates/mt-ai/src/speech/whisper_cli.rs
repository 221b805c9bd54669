use std::path::Path;

use async_trait::async_trait;
use mt_av::{ToolConfig, ToolRegistry};
use mt_core::Error;

use super::{SpeechEngine, SpeechRequest};

/// Runs the `whisper` command-line tool locally.
///
/// Whisper writes `<stem>.txt` into an output directory; the engine points
/// that at a private temporary directory and reads the file back.
#[derive(Debug, Clone)]
pub struct WhisperCliEngine {
    whisper: ToolConfig,
}

impl WhisperCliEngine {
    pub fn new(whisper: ToolConfig) -> Self {
        Self { whisper }
    }

    /// Build from a registry; fails if whisper was not discovered.
    pub fn from_registry(tools: &ToolRegistry) -> mt_core::Result<Self> {
        Ok(Self::new(tools.require("whisper")?.clone()))
    }

    fn args(audio: &Path, output_dir: &Path, request: &SpeechRequest) -> Vec<String> {
        let mut args = vec![
            audio.to_string_lossy().into_owned(),
            "--model".into(),
            request.model.clone(),
            "--device".into(),
            request.device.clone(),
            "--output_format".into(),
            "txt".into(),
            "--output_dir".into(),
            output_dir.to_string_lossy().into_owned(),
            "--verbose".into(),
            "False".into(),
        ];
        if let Some(ref language) = request.language {
            args.push("--language".into());
            args.push(language.clone());
        }
        if !request.fp16() {
            args.push("--fp16".into());
            args.push("False".into());
        }
        args
    }
}

#[async_trait]
impl SpeechEngine for WhisperCliEngine {
    fn name(&self) -> &'static str {
        "whisper"
    }

    async fn transcribe(&self, audio: &Path, request: &SpeechRequest) -> mt_core::Result<String> {
        let output_dir = tempfile::Builder::new()
            .prefix("whisper-")
            .tempdir()
            .map_err(|e| Error::Transcription(format!("cannot create output dir: {e}")))?;

        self.whisper
            .command()
            .args(Self::args(audio, output_dir.path(), request))
            .execute()
            .await
            .map_err(|e| match e {
                Error::Tool { message, .. } => Error::Transcription(format!("whisper failed: {message}")),
                other => other,
            })?;

        let stem = audio
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".into());
        let transcript = output_dir.path().join(format!("{stem}.txt"));

        tokio::fs::read_to_string(&transcript).await.map_err(|e| {
            Error::Transcription(format!(
                "whisper produced no transcript at {}: {e}",
                transcript.display()
            ))
        })
    }
}
