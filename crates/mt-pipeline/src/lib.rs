//! # mt-pipeline
//!
//! Orchestration of one media-to-report job.
//!
//! This crate provides:
//!
//! - **Stage ports** ([`stage`]) -- [`AudioExtractor`], [`Transcriber`],
//!   [`Summarizer`], and [`ReportRenderer`], each independently replaceable.
//! - **Default adapters** ([`stages`]) -- ffmpeg, speech engine, completion
//!   client, and document renderer implementations of those ports.
//! - **[`JobWorkspace`]** -- durable per-job directories and scoped scratch
//!   space.
//! - **[`PipelineDriver`]** -- runs the stages in fixed order as an explicit
//!   state machine, cleaning up everything on failure.
//! - **[`publisher`]** -- persists the results of a successful run.

pub mod context;
pub mod driver;
pub mod job;
pub mod publisher;
pub mod stage;
pub mod stages;
pub mod workspace;

pub use context::{ProgressSender, RunContext};
pub use driver::{PipelineConfig, PipelineDriver, Upload, UploadSource};
pub use publisher::JobResult;
pub use job::{Job, JobState};
pub use stage::{AudioExtractor, ReportRenderer, Stages, Summarizer, TranscribeSettings, Transcriber};
pub use workspace::{JobDirGuard, JobWorkspace};

pub use mt_ai::SummarySettings;
