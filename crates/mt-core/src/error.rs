//! Unified error type for the MediaTranscript application.
//!
//! All crates funnel their failures into [`Error`], which carries enough context
//! for API handlers to derive an HTTP status code via [`Error::http_status`]
//! and, for pipeline failures, the stage that failed via [`Error::stage`].

use std::fmt;

use crate::stage::Stage;

/// Unified error type covering all failure modes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "job", "report").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Request data failed validation (bad extension, missing file,
    /// unsupported report format).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A job or scratch directory could not be created, written, or removed.
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// Audio extraction failed.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Speech-to-text failed or produced no text.
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// The summarization service failed or returned nothing.
    #[error("Summarization error: {0}")]
    Summarization(String),

    /// The report could not be serialized.
    #[error("Render error: {0}")]
    Render(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (ffmpeg, whisper, etc.) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// The run was cancelled at a stage boundary.
    #[error("Cancelled before {0}")]
    Cancelled(Stage),

    /// A pipeline stage failed; wraps the originating error.
    #[error("{stage} stage failed: {source}")]
    Pipeline {
        /// The stage that failed.
        stage: Stage,
        /// The originating error.
        #[source]
        source: Box<Error>,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::Workspace(_) => 500,
            Error::Extraction(_) => 500,
            Error::Transcription(_) => 500,
            Error::Summarization(_) => 500,
            Error::Render(_) => 500,
            Error::Io { .. } => 500,
            Error::Tool { .. } => 502,
            Error::Cancelled(_) => 500,
            Error::Pipeline { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::Validation(_) => "validation_error",
            Error::Workspace(_) => "workspace_error",
            Error::Extraction(_) => "extraction_error",
            Error::Transcription(_) => "transcription_error",
            Error::Summarization(_) => "summarization_error",
            Error::Render(_) => "render_error",
            Error::Io { .. } => "io_error",
            Error::Tool { .. } => "tool_error",
            Error::Cancelled(_) => "cancelled",
            Error::Pipeline { .. } => "pipeline_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// The pipeline stage this error is tagged with, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Pipeline { stage, .. } => Some(*stage),
            Error::Cancelled(stage) => Some(*stage),
            _ => None,
        }
    }

    /// The innermost error, unwrapping any stage tag.
    pub fn root(&self) -> &Error {
        match self {
            Error::Pipeline { source, .. } => source.root(),
            other => other,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Tag an error with the stage it came from. Already-tagged errors keep
    /// their original stage.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            tagged @ (Error::Pipeline { .. } | Error::Cancelled(_)) => tagged,
            other => Error::Pipeline {
                stage,
                source: Box::new(other),
            },
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
