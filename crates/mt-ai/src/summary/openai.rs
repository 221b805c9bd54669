use async_trait::async_trait;
use mt_core::Error;
use serde::{Deserialize, Serialize};

use super::{CompletionClient, CompletionRequest};
use crate::DEFAULT_OPENAI_BASE_URL;

/// Client for the OpenAI Responses API (`POST {base}/responses`).
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build a client from optional explicit credentials.
    ///
    /// Missing values fall back to `OPENAI_API_KEY` and `OPENAI_BASE_URL`.
    /// A missing key is an [`Error::Summarization`].
    pub fn from_credentials(api_key: Option<&str>, base_url: Option<&str>) -> mt_core::Result<Self> {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let key = non_blank(api_key.map(str::to_string))
            .or_else(|| non_blank(std::env::var("OPENAI_API_KEY").ok()))
            .ok_or_else(|| {
                Error::Summarization(
                    "no API key provided and OPENAI_API_KEY is not set".into(),
                )
            })?;
        let base = non_blank(base_url.map(str::to_string))
            .or_else(|| non_blank(std::env::var("OPENAI_BASE_URL").ok()));

        Ok(Self::new(key, base))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: [InputMessage<'a>; 2],
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct InputMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsesReply {
    output_text: Option<String>,
    output: Vec<OutputItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OutputItem {
    content: Vec<ContentItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContentItem {
    #[serde(rename = "type")]
    kind: String,
    text: String,
}

impl ResponsesReply {
    /// `output_text` when the service provides it, otherwise every
    /// `output_text` content item concatenated.
    fn into_text(self) -> String {
        if let Some(text) = self.output_text {
            return text;
        }
        self.output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|c| c.kind == "output_text")
            .map(|c| c.text)
            .collect()
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> mt_core::Result<String> {
        let url = format!("{}/responses", self.base_url);
        let body = ResponsesRequest {
            model: &request.model,
            input: [
                InputMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                InputMessage {
                    role: "user",
                    content: &request.user_message,
                },
            ],
            max_output_tokens: request.max_output_tokens,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Summarization(format!("request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::Summarization(format!("status {status}: {body}")));
        }

        let reply: ResponsesReply = response
            .json()
            .await
            .map_err(|e| Error::Summarization(format!("malformed response: {e}")))?;

        Ok(reply.into_text())
    }
}
