//! Transcript summarization through a text-completion service.

mod openai;

use async_trait::async_trait;
use mt_core::config::{
    SummaryConfig, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_SUMMARY_MODEL, DEFAULT_SUMMARY_PROMPT,
};
use mt_core::Error;
use serde::{Deserialize, Serialize};

pub use openai::OpenAiClient;

/// Prefix of the user message that carries the transcript.
const USER_PREFIX: &str = "Please summarize the following transcript:\n\n";

/// One completion call: a system prompt, a user message, and a length cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_message: String,
    pub max_output_tokens: u32,
}

/// A remote text-completion service.
///
/// Implementations are immutable after construction and shared across jobs.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> mt_core::Result<String>;
}

/// Per-run summarization parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySettings {
    pub model: String,
    pub prompt: String,
    pub max_output_tokens: u32,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_SUMMARY_MODEL.into(),
            prompt: DEFAULT_SUMMARY_PROMPT.into(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl From<&SummaryConfig> for SummarySettings {
    fn from(cfg: &SummaryConfig) -> Self {
        Self {
            model: cfg.model.clone(),
            prompt: cfg.prompt.clone(),
            max_output_tokens: cfg.max_output_tokens,
        }
    }
}

/// Summarize `transcript`.
///
/// A blank transcript is rejected before any remote call. The reply is
/// trimmed; an empty reply is an [`Error::Summarization`].
pub async fn summarize_text(
    client: &dyn CompletionClient,
    transcript: &str,
    settings: &SummarySettings,
) -> mt_core::Result<String> {
    let transcript = transcript.trim();
    if transcript.is_empty() {
        return Err(Error::Summarization(
            "transcript is empty; nothing to summarize".into(),
        ));
    }

    let request = CompletionRequest {
        model: settings.model.clone(),
        system_prompt: settings.prompt.clone(),
        user_message: format!("{USER_PREFIX}{transcript}"),
        max_output_tokens: settings.max_output_tokens,
    };

    tracing::info!(
        model = %request.model,
        max_output_tokens = request.max_output_tokens,
        chars = transcript.len(),
        "requesting summary"
    );

    let summary = client.complete(&request).await?;
    let summary = summary.trim();
    if summary.is_empty() {
        return Err(Error::Summarization(
            "the summarization service returned an empty response".into(),
        ));
    }

    Ok(summary.to_string())
}
