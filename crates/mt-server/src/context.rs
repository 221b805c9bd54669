//! Application context shared by all handlers via Axum state.

use std::sync::Arc;

use mt_ai::OpenAiClient;
use mt_av::ToolRegistry;
use mt_core::config::Config;
use mt_pipeline::stages::{self, CompletionSummarizer, DocumentRenderer, FfmpegExtractor, SpeechTranscriber};
use mt_pipeline::{
    AudioExtractor, JobWorkspace, PipelineDriver, ReportRenderer, Stages, Summarizer, Transcriber,
};

/// Builds the summarizer for one request from its optional credentials.
///
/// Summarization credentials may differ per request, so the client is
/// constructed per run and injected into the driver.
pub trait SummarizerFactory: Send + Sync {
    fn summarizer(
        &self,
        api_key: Option<&str>,
        base_url: Option<&str>,
    ) -> mt_core::Result<Arc<dyn Summarizer>>;
}

/// Builds OpenAI Responses API clients, falling back to configured
/// credentials.
#[derive(Debug, Clone, Default)]
pub struct OpenAiSummarizers {
    api_key: Option<String>,
    base_url: Option<String>,
}

impl OpenAiSummarizers {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.summary.api_key.clone(),
            base_url: config.summary.base_url.clone(),
        }
    }
}

impl SummarizerFactory for OpenAiSummarizers {
    fn summarizer(
        &self,
        api_key: Option<&str>,
        base_url: Option<&str>,
    ) -> mt_core::Result<Arc<dyn Summarizer>> {
        let client = OpenAiClient::from_credentials(
            api_key.or(self.api_key.as_deref()),
            base_url.or(self.base_url.as_deref()),
        )?;
        Ok(Arc::new(CompletionSummarizer::new(Arc::new(client))))
    }
}

/// Shared state. Cloning is cheap: every field is an `Arc`.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub tools: Arc<ToolRegistry>,
    pub workspace: Arc<JobWorkspace>,
    pub extractor: Arc<dyn AudioExtractor>,
    pub transcriber: Arc<dyn Transcriber>,
    pub renderer: Arc<dyn ReportRenderer>,
    pub summarizers: Arc<dyn SummarizerFactory>,
}

impl AppContext {
    /// Production context: discovered tools, the configured speech engine,
    /// and OpenAI summarizers.
    pub fn from_config(config: Config, tools: Arc<ToolRegistry>) -> mt_core::Result<Self> {
        let workspace = JobWorkspace::new(&config.server.output_dir)?
            .with_scratch_root(config.server.scratch_dir.clone());
        let engine = stages::speech_engine(&config, &tools)?;

        Ok(Self {
            summarizers: Arc::new(OpenAiSummarizers::from_config(&config)),
            extractor: Arc::new(FfmpegExtractor::new(tools.clone())),
            transcriber: Arc::new(SpeechTranscriber::new(engine)),
            renderer: Arc::new(DocumentRenderer),
            workspace: Arc::new(workspace),
            config: Arc::new(config),
            tools,
        })
    }

    /// A driver whose summarization stage uses `summarizer`.
    pub fn driver(&self, summarizer: Arc<dyn Summarizer>) -> PipelineDriver {
        let stages = Stages::new(
            self.extractor.clone(),
            self.transcriber.clone(),
            summarizer,
            self.renderer.clone(),
        );
        PipelineDriver::new(self.workspace.clone(), stages)
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("output_root", &self.workspace.output_root())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_key_wins_over_missing_config() {
        let factory = OpenAiSummarizers::default();
        assert!(factory.summarizer(Some("sk-test"), None).is_ok());
    }

    #[test]
    fn configured_key_is_used() {
        let mut config = Config::default();
        config.summary.api_key = Some("sk-config".into());
        let factory = OpenAiSummarizers::from_config(&config);
        assert!(factory.summarizer(None, Some("http://localhost:9")).is_ok());
    }
}
