//! # mt-report
//!
//! Report serializers. Both formats carry the same structure: a timestamped
//! title, the summary section, and the full transcript with one paragraph
//! per transcript line (blank lines preserved as vertical space).
//!
//! Rendering is synchronous and CPU-bound; async callers should run it on a
//! blocking thread.

mod docx;
mod pdf;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use mt_core::ReportFormat;

/// Heading of the summary section.
pub const SUMMARY_HEADING: &str = "Summary";

/// Heading of the transcript section.
pub const TRANSCRIPT_HEADING: &str = "Full Transcript";

/// Everything a report shows.
#[derive(Debug, Clone)]
pub struct Report<'a> {
    pub title: String,
    pub summary: &'a str,
    pub transcript: &'a str,
}

impl<'a> Report<'a> {
    /// A report titled with the current local time.
    pub fn new(transcript: &'a str, summary: &'a str) -> Self {
        Self::at(Local::now(), transcript, summary)
    }

    pub fn at(when: DateTime<Local>, transcript: &'a str, summary: &'a str) -> Self {
        Self {
            title: report_title(when),
            summary,
            transcript,
        }
    }
}

/// `MediaTranscript Summary Report (YYYY-mm-dd HH:MM)`.
pub fn report_title(when: DateTime<Local>) -> String {
    format!(
        "MediaTranscript Summary Report ({})",
        when.format("%Y-%m-%d %H:%M")
    )
}

/// Render `report` in the requested format.
pub fn render_report(report: &Report<'_>, format: ReportFormat) -> mt_core::Result<Vec<u8>> {
    let bytes = match format {
        ReportFormat::Docx => docx::render(report)?,
        ReportFormat::Pdf => pdf::render(report)?,
    };
    tracing::debug!(%format, bytes = bytes.len(), "report rendered");
    Ok(bytes)
}

/// Render a report for `transcript` and `summary`, titled with the current time.
pub fn render(format: ReportFormat, transcript: &str, summary: &str) -> mt_core::Result<Vec<u8>> {
    render_report(&Report::new(transcript, summary), format)
}

/// Force `path` to carry the extension of `format`.
pub fn normalize_output_path(path: &Path, format: ReportFormat) -> PathBuf {
    match mt_core::extension_of(path) {
        Some(ext) if ext == format.extension() => path.to_path_buf(),
        _ => path.with_extension(format.extension()),
    }
}
