//! Upload-and-process endpoint.

use axum::extract::{Multipart, State};
use axum::Extension;
use axum::Json;
use bytes::Bytes;
use mt_core::config::Config;
use mt_core::{Error, ReportFormat};
use mt_pipeline::{PipelineConfig, RunContext, SummarySettings, TranscribeSettings, Upload};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// Success body of `POST /api/process`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub job_id: String,
    pub transcript: String,
    pub summary: String,
    pub report_ref: String,
    pub report_url: String,
}

/// Raw multipart form. Every text field is optional.
#[derive(Debug, Default)]
struct ProcessForm {
    file: Option<(String, Bytes)>,
    whisper_model: Option<String>,
    language: Option<String>,
    summary_model: Option<String>,
    api_key: Option<String>,
    api_base: Option<String>,
    report_format: Option<String>,
    prompt: Option<String>,
    summary_max_tokens: Option<String>,
}

impl ProcessForm {
    async fn read(multipart: &mut Multipart) -> mt_core::Result<Self> {
        let bad = |e: axum::extract::multipart::MultipartError| {
            Error::Validation(format!("malformed multipart body: {e}"))
        };
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(bad)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(bad)?;
                form.file = Some((file_name, data));
                continue;
            }

            let value = field.text().await.map_err(bad)?;
            let slot = match name.as_str() {
                "whisperModel" => &mut form.whisper_model,
                "language" => &mut form.language,
                "summaryModel" => &mut form.summary_model,
                "apiKey" => &mut form.api_key,
                "apiBase" => &mut form.api_base,
                "reportFormat" => &mut form.report_format,
                "prompt" => &mut form.prompt,
                "summaryMaxTokens" => &mut form.summary_max_tokens,
                other => {
                    tracing::debug!(field = other, "ignoring unknown form field");
                    continue;
                }
            };
            *slot = non_blank(value);
        }
        Ok(form)
    }

    /// Split into the upload and the per-run configuration, applying
    /// defaults from `config`.
    fn into_run(self, config: &Config) -> mt_core::Result<(Upload, PipelineConfig)> {
        let (file_name, data) = self
            .file
            .ok_or_else(|| Error::Validation("no file part in request".into()))?;
        if file_name.trim().is_empty() {
            return Err(Error::Validation("no file selected".into()));
        }

        let report_format = match self.report_format {
            Some(raw) => raw.parse::<ReportFormat>()?,
            None => ReportFormat::default(),
        };

        let max_output_tokens = self
            .summary_max_tokens
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(config.summary.max_output_tokens);

        let run = PipelineConfig {
            transcription: TranscribeSettings {
                model: self
                    .whisper_model
                    .unwrap_or_else(|| config.transcription.model.clone()),
                language: self.language,
                device: config.transcription.device.clone(),
            },
            summary: SummarySettings {
                model: self
                    .summary_model
                    .unwrap_or_else(|| config.summary.model.clone()),
                prompt: self.prompt.unwrap_or_else(|| config.summary.prompt.clone()),
                max_output_tokens,
            },
            report_format,
        };
        Ok((Upload::from_bytes(file_name, data), run))
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `POST /api/process`: run one upload through the whole pipeline.
///
/// The run happens on its own task. If the client goes away, the run is
/// cancelled at the next stage boundary and cleans up after itself.
pub async fn process(
    State(ctx): State<AppContext>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>, AppError> {
    let with_id = |e: Error| AppError::new(e).with_request_id(request_id.clone());

    let form = ProcessForm::read(&mut multipart).await.map_err(with_id)?;
    let api_key = form.api_key.clone();
    let api_base = form.api_base.clone();
    let (upload, run_config) = form.into_run(&ctx.config).map_err(with_id)?;

    // Reject bad extensions and missing credentials before any job exists.
    mt_core::MediaKind::classify(&upload.file_name).map_err(with_id)?;
    let summarizer = ctx
        .summarizers
        .summarizer(api_key.as_deref(), api_base.as_deref())
        .map_err(with_id)?;
    let driver = ctx.driver(summarizer);

    tracing::info!(
        file_name = %upload.file_name,
        format = %run_config.report_format,
        whisper_model = %run_config.transcription.model,
        "processing upload"
    );

    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    let run_ctx = RunContext::new().with_cancellation(token);
    let handle =
        tokio::spawn(async move { driver.run(upload, &run_config, &run_ctx).await });
    let result = handle
        .await
        .map_err(|e| with_id(Error::Internal(format!("pipeline task failed: {e}"))))?
        .map_err(with_id)?;
    guard.disarm();

    Ok(Json(ProcessResponse {
        job_id: result.job_id.to_string(),
        report_url: format!("/api/reports/{}", result.report_ref),
        transcript: result.transcript,
        summary: result.summary,
        report_ref: result.report_ref,
    }))
}
