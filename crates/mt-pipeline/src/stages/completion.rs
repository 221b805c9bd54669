use std::sync::Arc;

use async_trait::async_trait;
use mt_ai::{summarize_text, CompletionClient, SummarySettings};

use crate::stage::Summarizer;

/// Summarizes through an injected, immutable [`CompletionClient`].
#[derive(Clone)]
pub struct CompletionSummarizer {
    client: Arc<dyn CompletionClient>,
}

impl CompletionSummarizer {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Summarizer for CompletionSummarizer {
    async fn summarize(&self, transcript: &str, settings: &SummarySettings) -> mt_core::Result<String> {
        summarize_text(self.client.as_ref(), transcript, settings).await
    }
}
