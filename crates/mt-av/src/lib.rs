//! # mt-av
//!
//! External audio tooling for the MediaTranscript pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg,
//!   the whisper CLI, and nvidia-smi.
//! - **Command execution** ([`ToolCommand`]) -- async builder with an optional
//!   timeout for running external processes.
//! - **Audio extraction** ([`extract_audio`]) -- strip the audio track out of
//!   a video container into 16 kHz mono WAV or VBR MP3.

pub mod command;
pub mod extract;
pub mod tools;

pub use command::{ToolCommand, ToolOutput};
pub use extract::{build_ffmpeg_args, extract_audio};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
