//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the server, external tools, transcription, and
//! summarization. Every section defaults sensibly so a completely empty `{}`
//! file is valid. A handful of environment variables override the file after
//! loading (see [`Config::apply_env_overrides`]).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

/// System prompt used when a request does not supply its own.
pub const DEFAULT_SUMMARY_PROMPT: &str = "You are a professional summarization assistant. \
Produce a concise, well-structured summary that keeps the key information, \
highlighting the main topics, the important points, and any action items.";

/// Summarization model used when neither the request, the config file, nor
/// `OPENAI_MODEL` names one.
pub const DEFAULT_SUMMARY_MODEL: &str = "gpt-4o-mini";

/// Speech model used when the request does not name one.
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "small";

/// Default cap on summary length, in output tokens.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 256;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub tools: ToolsConfig,
    pub transcription: TranscriptionConfig,
    pub summary: SummaryConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    ///
    /// This is intentionally string-based so the caller can read the file
    /// however it sees fit.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    ///
    /// | Variable                     | Field                          |
    /// |------------------------------|--------------------------------|
    /// | `OPENAI_API_KEY`             | `summary.api_key`              |
    /// | `OPENAI_BASE_URL`            | `summary.base_url`             |
    /// | `OPENAI_MODEL`               | `summary.model`                |
    /// | `MEDIATRANSCRIPT_OUTPUT_DIR` | `server.output_dir`            |
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.summary.api_key = Some(key);
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.summary.base_url = Some(url);
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.summary.model = model;
        }
        if let Some(dir) = get("MEDIATRANSCRIPT_OUTPUT_DIR") {
            self.server.output_dir = PathBuf::from(dir);
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.server.max_upload_bytes == 0 {
            warnings.push("server.max_upload_bytes is 0; every upload will be rejected".into());
        }

        if self.summary.api_key.is_none() {
            warnings.push(
                "summary.api_key is not set; requests must supply apiKey or OPENAI_API_KEY must be set"
                    .into(),
            );
        }

        if self.summary.max_output_tokens == 0 {
            warnings.push("summary.max_output_tokens is 0".into());
        }

        let devices = ["auto", "cpu", "cuda"];
        if !devices.contains(&self.transcription.device.as_str()) {
            warnings.push(format!(
                "transcription.device '{}' is not a recognized device (valid: {})",
                self.transcription.device,
                devices.join(", ")
            ));
        }

        if self.transcription.backend == SpeechBackend::OpenAi
            && self.transcription.api_key.is_none()
            && self.summary.api_key.is_none()
        {
            warnings.push(
                "transcription.backend is 'openai' but no api_key is configured".into(),
            );
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Root under which one durable directory per job is created.
    pub output_dir: PathBuf,
    /// Parent for per-run scratch directories; the OS temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            output_dir: PathBuf::from("outputs"),
            scratch_dir: None,
            max_upload_bytes: 1024 * 1024 * 1024,
        }
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub whisper_path: Option<PathBuf>,
    /// Per-invocation timeout for external tools; `0` disables it.
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            whisper_path: None,
            timeout_secs: 4 * 60 * 60,
        }
    }
}

/// Which speech-to-text engine backs the transcription stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechBackend {
    /// The local `whisper` command-line tool.
    #[default]
    Whisper,
    /// An OpenAI-compatible `/audio/transcriptions` endpoint.
    #[serde(rename = "openai")]
    OpenAi,
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub backend: SpeechBackend,
    pub model: String,
    /// `auto`, `cpu`, or `cuda`.
    pub device: String,
    /// Credentials for the `openai` backend; fall back to the summary ones.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            backend: SpeechBackend::default(),
            model: DEFAULT_TRANSCRIPTION_MODEL.into(),
            device: "auto".into(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Summarization service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub model: String,
    pub prompt: String,
    pub max_output_tokens: u32,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_SUMMARY_MODEL.into(),
            prompt: DEFAULT_SUMMARY_PROMPT.into(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            api_key: None,
            base_url: None,
        }
    }
}
