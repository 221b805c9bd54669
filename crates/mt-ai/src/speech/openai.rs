use std::path::Path;

use async_trait::async_trait;
use mt_core::{AudioFormat, Error};
use reqwest::multipart;

use super::{SpeechEngine, SpeechRequest};
use crate::DEFAULT_OPENAI_BASE_URL;

/// Transcribes through an OpenAI-compatible `/audio/transcriptions` endpoint.
///
/// The request's `device` is ignored; inference happens server-side.
#[derive(Debug, Clone)]
pub struct OpenAiSpeechEngine {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiSpeechEngine {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SpeechEngine for OpenAiSpeechEngine {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn transcribe(&self, audio: &Path, request: &SpeechRequest) -> mt_core::Result<String> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let mime = match AudioFormat::from_path(audio)? {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
        };
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".into());
        let bytes = tokio::fs::read(audio).await?;

        let file_part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| Error::Transcription(format!("mime: {e}")))?;

        let mut form = multipart::Form::new()
            .text("model", request.model.clone())
            .text("response_format", "text")
            .part("file", file_part);
        if let Some(ref language) = request.language {
            form = form.text("language", language.clone());
        }

        tracing::debug!(model = %request.model, "sending audio to {url}");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Transcription(format!("request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::Transcription(format!("status {status}: {body}")));
        }

        response
            .text()
            .await
            .map_err(|e| Error::Transcription(format!("body: {e}")))
    }
}
