use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use mt_av::ToolRegistry;

use crate::stage::AudioExtractor;

/// Extracts audio with the ffmpeg found in the tool registry.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    tools: Arc<ToolRegistry>,
}

impl FfmpegExtractor {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    async fn extract(&self, input: &Path, output: &Path, overwrite: bool) -> mt_core::Result<()> {
        mt_av::extract_audio(&self.tools, input, output, overwrite).await
    }
}
