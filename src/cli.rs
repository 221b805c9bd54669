use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediatranscript")]
#[command(author, version, about = "Transcribe media files and produce summary reports")]
pub struct Cli {
    /// Path to config file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server with the upload API
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one media file through the whole pipeline and print the result
    Process {
        /// Video or audio file to process
        #[arg(required = true)]
        file: PathBuf,

        /// Report format: docx or pdf
        #[arg(short, long, default_value = "docx")]
        format: String,

        /// Whisper model name
        #[arg(long)]
        whisper_model: Option<String>,

        /// Spoken language; detected automatically when omitted
        #[arg(long)]
        language: Option<String>,

        /// Summarization model
        #[arg(long)]
        summary_model: Option<String>,

        /// System prompt for the summarizer
        #[arg(long)]
        prompt: Option<String>,

        /// Upper bound on summary length, in tokens
        #[arg(long)]
        max_output_tokens: Option<u32>,

        /// API key for the summarization service
        #[arg(long)]
        api_key: Option<String>,

        /// Base URL of an OpenAI-compatible API
        #[arg(long)]
        base_url: Option<String>,

        /// Directory that receives the job folder (overrides config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Extract the audio track of a video file with ffmpeg
    Extract {
        #[arg(short, long)]
        input: PathBuf,

        /// Output audio file (.wav or .mp3)
        #[arg(short, long)]
        output: PathBuf,

        /// Replace the output file if it exists
        #[arg(long)]
        overwrite: bool,
    },

    /// Transcribe an audio file to text
    Transcribe {
        /// Audio file (.wav or .mp3)
        #[arg(short, long)]
        input: PathBuf,

        /// Transcript text file to write
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long)]
        model: Option<String>,

        #[arg(short, long)]
        language: Option<String>,

        /// cpu, cuda, or auto
        #[arg(short, long)]
        device: Option<String>,
    },

    /// Summarize a transcript text file
    Summarize {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long)]
        model: Option<String>,

        #[arg(short, long)]
        prompt: Option<String>,

        #[arg(long)]
        api_key: Option<String>,

        #[arg(long)]
        base_url: Option<String>,

        #[arg(long)]
        max_output_tokens: Option<u32>,
    },

    /// Render a report document from transcript and summary files
    Report {
        #[arg(short, long)]
        transcript: PathBuf,

        #[arg(short, long)]
        summary: PathBuf,

        /// Output document; the suffix is adjusted to the format
        #[arg(short, long)]
        output: PathBuf,

        /// docx or pdf
        #[arg(short, long, default_value = "docx")]
        format: String,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
