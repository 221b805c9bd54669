//! Job lifecycle state machine.
//!
//! ```text
//! Pending -> [Extracting] -> Transcribing -> Summarizing -> Rendering -> Succeeded
//!    \____________\_______________\_______________\____________\-----> Failed
//! ```
//!
//! Only `Extracting` may be skipped. `Succeeded` and `Failed` are absorbing.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use mt_core::{Error, JobId, Stage};
use serde::Serialize;

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Extracting,
    Transcribing,
    Summarizing,
    Rendering,
    Succeeded,
    Failed {
        /// The stage that failed; `None` for workspace or publishing failures.
        stage: Option<Stage>,
        message: String,
    },
}

impl JobState {
    /// The running state for `stage`.
    pub fn running(stage: Stage) -> Self {
        match stage {
            Stage::Extract => Self::Extracting,
            Stage::Transcribe => Self::Transcribing,
            Stage::Summarize => Self::Summarizing,
            Stage::Render => Self::Rendering,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed { .. })
    }

    /// Position in the linear order; `None` for terminal states.
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Extracting => Some(1),
            Self::Transcribing => Some(2),
            Self::Summarizing => Some(3),
            Self::Rendering => Some(4),
            Self::Succeeded | Self::Failed { .. } => None,
        }
    }
}

/// One pipeline execution.
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    dir: PathBuf,
    state: JobState,
    created_at: DateTime<Local>,
}

impl Job {
    pub(crate) fn new(id: JobId, dir: PathBuf) -> Self {
        Self {
            id,
            dir,
            state: JobState::Pending,
            created_at: Local::now(),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// The durable output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// Move into the running state for `stage`.
    ///
    /// Stages must be entered in order, each exactly once; only the
    /// extraction stage may be skipped.
    pub fn advance(&mut self, stage: Stage) -> mt_core::Result<()> {
        let next = JobState::running(stage);
        let allowed = match (self.state.rank(), next.rank()) {
            (Some(0), Some(to)) => to == 1 || to == 2,
            (Some(from), Some(to)) => to == from + 1,
            _ => false,
        };
        if !allowed {
            return Err(self.invalid(&next));
        }
        self.state = next;
        Ok(())
    }

    /// Mark the job succeeded; only valid once rendering has run.
    pub fn succeed(&mut self) -> mt_core::Result<()> {
        if self.state != JobState::Rendering {
            return Err(self.invalid(&JobState::Succeeded));
        }
        self.state = JobState::Succeeded;
        Ok(())
    }

    /// Mark the job failed. A job that already reached a terminal state
    /// keeps it.
    pub fn fail(&mut self, stage: Option<Stage>, message: impl Into<String>) {
        if self.state.is_terminal() {
            tracing::warn!(job_id = %self.id, state = ?self.state, "ignoring failure of finished job");
            return;
        }
        self.state = JobState::Failed {
            stage,
            message: message.into(),
        };
    }

    fn invalid(&self, to: &JobState) -> Error {
        Error::Internal(format!(
            "job {}: invalid transition {:?} -> {:?}",
            self.id, self.state, to
        ))
    }
}
