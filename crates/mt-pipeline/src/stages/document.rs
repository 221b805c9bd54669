use async_trait::async_trait;
use mt_core::{Error, ReportFormat};

use crate::stage::ReportRenderer;

/// Renders with [`mt_report`] on the blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentRenderer;

#[async_trait]
impl ReportRenderer for DocumentRenderer {
    async fn render(
        &self,
        transcript: &str,
        summary: &str,
        format: ReportFormat,
    ) -> mt_core::Result<Vec<u8>> {
        let transcript = transcript.to_owned();
        let summary = summary.to_owned();
        tokio::task::spawn_blocking(move || mt_report::render(format, &transcript, &summary))
            .await
            .map_err(|e| Error::Render(format!("render task failed: {e}")))?
    }
}
