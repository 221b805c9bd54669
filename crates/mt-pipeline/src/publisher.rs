//! Persisting a finished job.
//!
//! The publisher writes the three artifacts of a successful run into the
//! job's durable directory and builds the [`JobResult`] returned to callers.
//! Each file is written to a temporary sibling and renamed into place, so a
//! reader never observes a half-written artifact.

use std::io::Write;
use std::path::{Path, PathBuf};

use mt_core::{Error, JobId, ReportFormat, SUMMARY_FILE, TRANSCRIPT_FILE};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::job::Job;

/// The immutable success payload of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub job_id: JobId,
    pub transcript: String,
    pub summary: String,
    /// `{job_id}/{report file name}`, relative to the output root.
    pub report_ref: String,
    pub report_format: ReportFormat,
}

impl JobResult {
    /// File name of the report inside the job directory.
    pub fn report_file_name(&self) -> &'static str {
        self.report_format.file_name()
    }
}

/// Write `transcript.txt`, `summary.txt` and `report.{ext}` into the job
/// directory and return the result payload.
pub async fn publish(
    job: &Job,
    transcript: String,
    summary: String,
    report: Vec<u8>,
    format: ReportFormat,
) -> mt_core::Result<JobResult> {
    let dir = job.dir().to_path_buf();
    let files: Vec<(&'static str, Vec<u8>)> = vec![
        (TRANSCRIPT_FILE, transcript.clone().into_bytes()),
        (SUMMARY_FILE, summary.clone().into_bytes()),
        (format.file_name(), report),
    ];

    tokio::task::spawn_blocking(move || {
        for (name, bytes) in files {
            write_atomic(&dir, name, &bytes)?;
        }
        Ok::<_, Error>(())
    })
    .await
    .map_err(|e| Error::Workspace(format!("publish task failed: {e}")))??;

    tracing::debug!(job_id = %job.id(), format = %format.extension(), "artifacts published");

    Ok(JobResult {
        job_id: job.id().clone(),
        transcript,
        summary,
        report_ref: format!("{}/{}", job.id(), format.file_name()),
        report_format: format,
    })
}

fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> mt_core::Result<PathBuf> {
    let target = dir.join(name);
    let ws_err = |e: std::io::Error| {
        Error::Workspace(format!("cannot write {}: {e}", target.display()))
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(ws_err)?;
    tmp.write_all(bytes).map_err(ws_err)?;
    tmp.as_file().sync_all().map_err(ws_err)?;
    tmp.persist(&target).map_err(|e| ws_err(e.error))?;
    Ok(target)
}
