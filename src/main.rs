mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use mt_ai::{OpenAiClient, SpeechRequest, SummarySettings};
use mt_av::ToolRegistry;
use mt_core::config::Config;
use mt_core::ReportFormat;
use mt_pipeline::stages::{self, CompletionSummarizer};
use mt_pipeline::{
    JobWorkspace, PipelineConfig, PipelineDriver, ProgressSender, RunContext, TranscribeSettings,
    Upload,
};
use tokio_util::sync::CancellationToken;

/// Arguments of the `process` subcommand that shape the run.
struct ProcessArgs {
    format: String,
    whisper_model: Option<String>,
    language: Option<String>,
    summary_model: Option<String>,
    prompt: Option<String>,
    max_output_tokens: Option<u32>,
    api_key: Option<String>,
    base_url: Option<String>,
}

fn load_config(path: Option<&Path>) -> Config {
    let mut config = Config::load_or_default(path);
    config.apply_env_overrides();
    config
}

async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting MediaTranscript server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );
    mt_server::start(config).await?;
    Ok(())
}

async fn process_file(config: Config, file: &Path, args: ProcessArgs) -> Result<()> {
    let format: ReportFormat = args.format.parse()?;

    let mut run = PipelineConfig::from_config(&config).with_report_format(format);
    if let Some(model) = args.whisper_model {
        run.transcription.model = model;
    }
    run.transcription.language = args.language.filter(|l| !l.trim().is_empty());
    if let Some(model) = args.summary_model {
        run.summary.model = model;
    }
    if let Some(prompt) = args.prompt {
        run.summary.prompt = prompt;
    }
    if let Some(max) = args.max_output_tokens.filter(|&n| n > 0) {
        run.summary.max_output_tokens = max;
    }

    let client = OpenAiClient::from_credentials(
        args.api_key.as_deref().or(config.summary.api_key.as_deref()),
        args.base_url.as_deref().or(config.summary.base_url.as_deref()),
    )?;
    let summarizer = Arc::new(CompletionSummarizer::new(Arc::new(client)));

    let tools = Arc::new(ToolRegistry::discover(&config.tools));
    let workspace = JobWorkspace::new(&config.server.output_dir)?
        .with_scratch_root(config.server.scratch_dir.clone());
    let driver = PipelineDriver::new(
        Arc::new(workspace),
        stages::default_stages(&config, tools, summarizer)?,
    );

    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted; stopping after the current stage...");
            on_signal.cancel();
        }
    });
    let ctx = RunContext::new()
        .with_cancellation(token)
        .with_progress(ProgressSender::new(|pct, step| {
            eprintln!("[{pct:>3.0}%] {step}");
        }));

    tracing::info!("Processing file: {}", file.display());
    let result = driver.run(Upload::from_path(file), &run, &ctx).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    eprintln!(
        "Report: {}",
        driver
            .workspace()
            .output_root()
            .join(&result.report_ref)
            .display()
    );
    Ok(())
}

async fn extract(config: Config, input: &Path, output: &Path, overwrite: bool) -> Result<()> {
    let tools = ToolRegistry::discover(&config.tools);
    mt_av::extract_audio(&tools, input, output, overwrite).await?;
    println!("Audio written to {}", output.display());
    Ok(())
}

async fn transcribe(
    mut config: Config,
    input: &Path,
    output: &Path,
    model: Option<String>,
    language: Option<String>,
    device: Option<String>,
) -> Result<()> {
    if let Some(device) = device {
        config.transcription.device = device;
    }
    let mut settings = TranscribeSettings::from(&config.transcription);
    if let Some(model) = model {
        settings.model = model;
    }

    let tools = ToolRegistry::discover(&config.tools);
    let engine = stages::speech_engine(&config, &tools)?;
    let request = SpeechRequest::new(settings.model)
        .language(language)
        .device(mt_ai::resolve_device(Some(&settings.device)));
    tracing::info!(
        engine = engine.name(),
        model = %request.model,
        device = %request.device,
        "transcribing {}",
        input.display()
    );

    let transcript = mt_ai::transcribe_audio(engine.as_ref(), input, &request).await?;
    write_text(output, &transcript).await?;
    println!("Transcript written to {}", output.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn summarize(
    config: Config,
    input: &Path,
    output: &Path,
    model: Option<String>,
    prompt: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    max_output_tokens: Option<u32>,
) -> Result<()> {
    let transcript = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("cannot read transcript {}", input.display()))?;

    let mut settings = SummarySettings::from(&config.summary);
    if let Some(model) = model {
        settings.model = model;
    }
    if let Some(prompt) = prompt {
        settings.prompt = prompt;
    }
    if let Some(max) = max_output_tokens.filter(|&n| n > 0) {
        settings.max_output_tokens = max;
    }

    let client = OpenAiClient::from_credentials(
        api_key.as_deref().or(config.summary.api_key.as_deref()),
        base_url.as_deref().or(config.summary.base_url.as_deref()),
    )?;
    let summary = mt_ai::summarize_text(&client, &transcript, &settings).await?;
    write_text(output, &summary).await?;
    println!("Summary written to {}", output.display());
    Ok(())
}

async fn report(transcript: &Path, summary: &Path, output: &Path, format: &str) -> Result<()> {
    let format: ReportFormat = format.parse()?;
    let transcript = tokio::fs::read_to_string(transcript)
        .await
        .with_context(|| format!("cannot read transcript {}", transcript.display()))?;
    let summary = tokio::fs::read_to_string(summary)
        .await
        .with_context(|| format!("cannot read summary {}", summary.display()))?;

    let output = mt_report::normalize_output_path(output, format);
    let bytes = tokio::task::spawn_blocking(move || mt_report::render(format, &transcript, &summary))
        .await??;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&output, bytes)
        .await
        .with_context(|| format!("cannot write {}", output.display()))?;
    println!("Report written to {}", output.display());
    Ok(())
}

async fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("cannot write {}", path.display()))
}

fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let tools = ToolRegistry::discover(&config.tools);
    let mut all_ok = true;

    for tool in tools.check_all() {
        let status = if tool.available {
            "✓"
        } else if tool.optional {
            "-"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("cannot read {}", p.display()))?;
            let config = Config::from_json(&contents)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Output dir: {}", config.server.output_dir.display());
    println!(
        "  Transcription: {:?} model={} device={}",
        config.transcription.backend, config.transcription.model, config.transcription.device
    );
    println!(
        "  Summary: model={} max_output_tokens={}",
        config.summary.model, config.summary.max_output_tokens
    );
    for warning in config.validate() {
        println!("  warning: {warning}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise pick levels from --verbose.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediatranscript=trace,mt_pipeline=trace,mt_ai=debug,mt_av=debug,mt_server=debug,tower_http=debug".to_string()
        } else {
            "mediatranscript=info,mt_pipeline=info,mt_ai=info,mt_av=info,mt_server=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(serve(load_config(config_path), host, port))
        }
        Commands::Process {
            file,
            format,
            whisper_model,
            language,
            summary_model,
            prompt,
            max_output_tokens,
            api_key,
            base_url,
            output_dir,
        } => {
            let mut config = load_config(config_path);
            if let Some(dir) = output_dir {
                config.server.output_dir = dir;
            }
            let args = ProcessArgs {
                format,
                whisper_model,
                language,
                summary_model,
                prompt,
                max_output_tokens,
                api_key,
                base_url,
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(process_file(config, &file, args))
        }
        Commands::Extract {
            input,
            output,
            overwrite,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(extract(load_config(config_path), &input, &output, overwrite))
        }
        Commands::Transcribe {
            input,
            output,
            model,
            language,
            device,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(transcribe(
                load_config(config_path),
                &input,
                &output,
                model,
                language,
                device,
            ))
        }
        Commands::Summarize {
            input,
            output,
            model,
            prompt,
            api_key,
            base_url,
            max_output_tokens,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(summarize(
                load_config(config_path),
                &input,
                &output,
                model,
                prompt,
                api_key,
                base_url,
                max_output_tokens,
            ))
        }
        Commands::Report {
            transcript,
            summary,
            output,
            format,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(report(&transcript, &summary, &output, &format))
        }
        Commands::CheckTools => check_tools(&load_config(config_path)),
        Commands::Validate { config } => {
            let path = config.or_else(|| config_path.map(Path::to_path_buf));
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediatranscript {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
