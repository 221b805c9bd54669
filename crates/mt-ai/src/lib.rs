//! # mt-ai
//!
//! Model-backed stages of the MediaTranscript pipeline.
//!
//! - **Speech-to-text** ([`speech`]) -- the [`SpeechEngine`] port with a
//!   local whisper CLI engine and an OpenAI-compatible HTTP engine, plus
//!   [`transcribe_audio`] which enforces input and output rules around any
//!   engine.
//! - **Summarization** ([`summary`]) -- the [`CompletionClient`] port, an
//!   [`OpenAiClient`] for the Responses API, and [`summarize_text`].

pub mod speech;
pub mod summary;

pub use speech::{
    resolve_device, transcribe_audio, OpenAiSpeechEngine, SpeechEngine, SpeechRequest,
    WhisperCliEngine,
};
pub use summary::{
    summarize_text, CompletionClient, CompletionRequest, OpenAiClient, SummarySettings,
};

/// Base URL used when neither the caller nor `OPENAI_BASE_URL` supplies one.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
