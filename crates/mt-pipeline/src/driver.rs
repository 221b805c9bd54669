//! The pipeline driver.
//!
//! [`PipelineDriver::run`] takes one upload through the fixed stage order
//! as an explicit [`Job`] state machine. A job either ends `Succeeded` with
//! three published artifacts in its durable directory, or `Failed` with the
//! durable directory removed. The scratch directory never outlives the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use mt_core::config::Config;
use mt_core::{extension_of, Error, MediaKind, ReportFormat, Stage};

use crate::context::RunContext;
use crate::job::Job;
use crate::publisher::{self, JobResult};
use crate::stage::{Stages, TranscribeSettings};
use crate::workspace::JobWorkspace;
use mt_ai::SummarySettings;

/// Where the uploaded bytes come from.
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// Bytes already in memory (an HTTP multipart field).
    Bytes(Bytes),
    /// A file on local disk; it is copied, never moved.
    Path(PathBuf),
}

/// One media file submitted for processing.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied name; only its extension is used.
    pub file_name: String,
    pub source: UploadSource,
}

impl Upload {
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            source: UploadSource::Bytes(bytes.into()),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            file_name,
            source: UploadSource::Path(path),
        }
    }
}

/// Immutable per-run options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub transcription: TranscribeSettings,
    pub summary: SummarySettings,
    pub report_format: ReportFormat,
}

impl PipelineConfig {
    /// Defaults taken from the application configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            transcription: TranscribeSettings::from(&config.transcription),
            summary: SummarySettings::from(&config.summary),
            report_format: ReportFormat::default(),
        }
    }

    /// Builder: set the report format.
    pub fn with_report_format(mut self, format: ReportFormat) -> Self {
        self.report_format = format;
        self
    }
}

/// Runs uploads through the stages.
#[derive(Debug, Clone)]
pub struct PipelineDriver {
    workspace: Arc<JobWorkspace>,
    stages: Stages,
}

/// Stage output carried from the scratch scope to the publisher.
struct Artifacts {
    transcript: String,
    summary: String,
    report: Vec<u8>,
}

/// Percentage bookkeeping for progress reports.
struct Progress<'a> {
    ctx: &'a RunContext,
    total: usize,
    done: usize,
}

impl Progress<'_> {
    fn completed(&mut self, stage: Stage) {
        self.done += 1;
        let pct = (self.done as f32 / self.total as f32) * 100.0;
        self.ctx.progress.send(pct, stage.label());
        tracing::info!("[{:.0}%] Completed: {}", pct, stage.label());
    }
}

impl PipelineDriver {
    pub fn new(workspace: Arc<JobWorkspace>, stages: Stages) -> Self {
        Self { workspace, stages }
    }

    pub fn workspace(&self) -> &JobWorkspace {
        &self.workspace
    }

    pub fn stages(&self) -> &Stages {
        &self.stages
    }

    /// Process one upload end to end.
    ///
    /// Validation failures are returned before any directory exists. Any
    /// later failure removes the job directory and is returned tagged with
    /// the stage that failed, if a stage was running.
    pub async fn run(
        &self,
        upload: Upload,
        config: &PipelineConfig,
        ctx: &RunContext,
    ) -> mt_core::Result<JobResult> {
        let kind = MediaKind::classify(&upload.file_name)?;
        let ext = extension_of(&upload.file_name)
            .ok_or_else(|| Error::Validation(format!("no extension: {}", upload.file_name)))?;
        if let UploadSource::Path(ref path) = upload.source {
            if !path.is_file() {
                return Err(Error::Validation(format!(
                    "input file not found: {}",
                    path.display()
                )));
            }
        }

        let mut job = self.workspace.create_job().await?;
        let job_guard = self.workspace.guard_job(job.id());
        tracing::info!(job_id = %job.id(), file_name = %upload.file_name, ?kind, "job created");

        let job_ref = &mut job;
        let source = upload.source;
        let outcome = self
            .workspace
            .with_scratch(move |scratch| {
                self.run_stages(job_ref, scratch, source, kind, ext, config, ctx)
            })
            .await;

        let result = match outcome {
            Ok(artifacts) => self.finish(&mut job, artifacts, config.report_format).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(result) => {
                job_guard.disarm();
                ctx.progress.send(100.0, "Finalizing");
                tracing::info!(job_id = %job.id(), report = %result.report_ref, "[100%] Finalizing");
                Ok(result)
            }
            Err(err) => {
                tracing::error!(job_id = %job.id(), stage = ?err.stage(), "job failed: {err}");
                job.fail(err.stage(), err.to_string());
                if let Err(e) = self.workspace.discard_job(job.id()).await {
                    tracing::warn!(job_id = %job.id(), "cleanup after failure failed: {e}");
                }
                job_guard.disarm();
                Err(err)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_stages(
        &self,
        job: &mut Job,
        scratch: PathBuf,
        source: UploadSource,
        kind: MediaKind,
        ext: String,
        config: &PipelineConfig,
        ctx: &RunContext,
    ) -> mt_core::Result<Artifacts> {
        let mut progress = Progress {
            ctx,
            total: if kind.needs_extraction() { 4 } else { 3 },
            done: 0,
        };

        let input = scratch.join(format!("input.{ext}"));
        stage_upload(source, &input).await?;

        let audio = match kind {
            MediaKind::Video => {
                enter(job, Stage::Extract, ctx)?;
                let audio = scratch.join("audio.wav");
                self.stages
                    .extractor
                    .extract(&input, &audio, true)
                    .await
                    .map_err(|e| e.in_stage(Stage::Extract))?;
                progress.completed(Stage::Extract);
                audio
            }
            MediaKind::Audio(format) => {
                let audio = scratch.join(format!("audio.{}", format.extension()));
                tokio::fs::rename(&input, &audio).await.map_err(|e| {
                    Error::Workspace(format!("cannot stage audio {}: {e}", audio.display()))
                })?;
                audio
            }
        };

        enter(job, Stage::Transcribe, ctx)?;
        let transcript = self
            .stages
            .transcriber
            .transcribe(&audio, &config.transcription)
            .await
            .and_then(|t| non_empty(t, || Error::Transcription("empty transcript".into())))
            .map_err(|e| e.in_stage(Stage::Transcribe))?;
        progress.completed(Stage::Transcribe);

        enter(job, Stage::Summarize, ctx)?;
        let summary = self
            .stages
            .summarizer
            .summarize(&transcript, &config.summary)
            .await
            .and_then(|s| non_empty(s, || Error::Summarization("empty summary".into())))
            .map_err(|e| e.in_stage(Stage::Summarize))?;
        progress.completed(Stage::Summarize);

        enter(job, Stage::Render, ctx)?;
        let report = self
            .stages
            .renderer
            .render(&transcript, &summary, config.report_format)
            .await
            .and_then(|bytes| {
                if bytes.is_empty() {
                    Err(Error::Render("renderer produced no output".into()))
                } else {
                    Ok(bytes)
                }
            })
            .map_err(|e| e.in_stage(Stage::Render))?;
        progress.completed(Stage::Render);

        Ok(Artifacts {
            transcript,
            summary,
            report,
        })
    }

    async fn finish(
        &self,
        job: &mut Job,
        artifacts: Artifacts,
        format: ReportFormat,
    ) -> mt_core::Result<JobResult> {
        let result = publisher::publish(
            job,
            artifacts.transcript,
            artifacts.summary,
            artifacts.report,
            format,
        )
        .await?;
        job.succeed()?;
        Ok(result)
    }
}

/// Check for cancellation, then move the job into `stage`.
fn enter(job: &mut Job, stage: Stage, ctx: &RunContext) -> mt_core::Result<()> {
    ctx.ensure_active(stage)?;
    job.advance(stage)?;
    tracing::info!(job_id = %job.id(), %stage, "Starting: {}", stage.label());
    Ok(())
}

fn non_empty(text: String, err: impl FnOnce() -> Error) -> mt_core::Result<String> {
    if text.trim().is_empty() {
        Err(err())
    } else {
        Ok(text)
    }
}

async fn stage_upload(source: UploadSource, dest: &Path) -> mt_core::Result<()> {
    let written = match source {
        UploadSource::Bytes(bytes) => tokio::fs::write(dest, &bytes).await,
        UploadSource::Path(path) => tokio::fs::copy(&path, dest).await.map(|_| ()),
    };
    written.map_err(|e| Error::Workspace(format!("cannot stage upload: {e}")))
}
