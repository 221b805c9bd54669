//! Media-domain enums: upload classification, audio formats, report formats.
//!
//! All enums serialize in lowercase (via `serde(rename_all = "lowercase")`) and
//! implement `Display` manually for consistent string representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::Error;

/// Container extensions that must go through audio extraction.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "flv", "wmv"];

/// Extensions that are already audio and skip extraction.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3"];

/// File name of the persisted transcript inside a job directory.
pub const TRANSCRIPT_FILE: &str = "transcript.txt";

/// File name of the persisted summary inside a job directory.
pub const SUMMARY_FILE: &str = "summary.txt";

/// Lowercased extension of `path`, without the leading dot.
pub fn extension_of(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

// ---------------------------------------------------------------------------
// MediaKind
// ---------------------------------------------------------------------------

/// How an upload enters the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A video container; audio must be extracted first.
    Video,
    /// Already an audio file in a supported format.
    Audio(AudioFormat),
}

impl MediaKind {
    /// Classify an upload by its file extension (case-insensitive).
    ///
    /// Anything outside the accepted video and audio sets is a
    /// [`Error::Validation`].
    pub fn classify(file_name: impl AsRef<Path>) -> Result<Self, Error> {
        let file_name = file_name.as_ref();
        let ext = extension_of(file_name).unwrap_or_default();

        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(Self::Video);
        }
        if let Ok(format) = ext.parse::<AudioFormat>() {
            return Ok(Self::Audio(format));
        }

        Err(Error::Validation(format!(
            "unsupported file type '{}' (accepted: {}, {})",
            file_name.display(),
            VIDEO_EXTENSIONS.join(", "),
            AUDIO_EXTENSIONS.join(", ")
        )))
    }

    /// Whether this upload needs the extraction stage.
    pub fn needs_extraction(&self) -> bool {
        matches!(self, Self::Video)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio(format) => write!(f, "audio/{format}"),
        }
    }
}

// ---------------------------------------------------------------------------
// AudioFormat
// ---------------------------------------------------------------------------

/// Audio formats accepted by the transcription stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }

    /// Determine the format from a path's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        extension_of(path)
            .unwrap_or_default()
            .parse()
            .map_err(|_| {
                Error::Validation(format!(
                    "unsupported audio format '{}' (expected .wav or .mp3)",
                    path.display()
                ))
            })
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "wav" => Ok(Self::Wav),
            "mp3" => Ok(Self::Mp3),
            other => Err(Error::Validation(format!("unsupported audio format: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// ReportFormat
// ---------------------------------------------------------------------------

/// Output document format of the rendered report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Docx,
    Pdf,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    /// Deterministic report file name inside a job directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Docx => "report.docx",
            Self::Pdf => "report.pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            other => Err(Error::Validation(format!(
                "unsupported report format: {other:?} (expected docx or pdf)"
            ))),
        }
    }
}

/// Content type served for a job artifact, chosen by file extension.
pub fn content_type_for(file_name: impl AsRef<Path>) -> &'static str {
    match extension_of(file_name).as_deref() {
        Some("docx") => ReportFormat::Docx.content_type(),
        Some("pdf") => ReportFormat::Pdf.content_type(),
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
