//! The four pipeline stages, in execution order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One transformation step of the processing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extract,
    Transcribe,
    Summarize,
    Render,
}

impl Stage {
    /// All stages in the fixed order the pipeline runs them.
    pub const ALL: [Stage; 4] = [
        Stage::Extract,
        Stage::Transcribe,
        Stage::Summarize,
        Stage::Render,
    ];

    /// Human-readable step label used in progress reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Extract => "Extracting audio",
            Self::Transcribe => "Transcribing",
            Self::Summarize => "Summarizing",
            Self::Render => "Rendering report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extract => write!(f, "extract"),
            Self::Transcribe => write!(f, "transcribe"),
            Self::Summarize => write!(f, "summarize"),
            Self::Render => write!(f, "render"),
        }
    }
}
