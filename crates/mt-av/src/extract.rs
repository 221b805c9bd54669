//! Audio extraction from video containers via ffmpeg.

use std::path::Path;

use mt_core::{extension_of, AudioFormat, Error};

use crate::tools::ToolRegistry;

/// Build the ffmpeg argument list (without the program itself).
///
/// The codec parameters follow the target extension: 16 kHz mono 16-bit PCM
/// for `.wav`, VBR MP3 (quality 2) for `.mp3`. Any other extension is a
/// validation error.
pub fn build_ffmpeg_args(input: &Path, output: &Path, overwrite: bool) -> mt_core::Result<Vec<String>> {
    let format = match extension_of(output).as_deref() {
        Some("wav") => AudioFormat::Wav,
        Some("mp3") => AudioFormat::Mp3,
        _ => {
            return Err(Error::Validation(format!(
                "output extension must be .wav or .mp3: {}",
                output.display()
            )))
        }
    };

    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-vn".into(),
    ];

    let codec: &[&str] = match format {
        AudioFormat::Wav => &["-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"],
        AudioFormat::Mp3 => &["-codec:a", "libmp3lame", "-qscale:a", "2"],
    };
    args.extend(codec.iter().map(|s| s.to_string()));

    args.push(if overwrite { "-y" } else { "-n" }.into());
    args.push(output.to_string_lossy().into_owned());
    Ok(args)
}

/// Extract the audio track of `input` into `output`.
///
/// # Errors
///
/// - [`Error::Extraction`] if `input` is missing or not a regular file, or
///   ffmpeg exits non-zero (message carries ffmpeg's stderr).
/// - [`Error::Validation`] for an unsupported output extension.
/// - [`Error::Tool`] if ffmpeg is not installed.
pub async fn extract_audio(
    tools: &ToolRegistry,
    input: &Path,
    output: &Path,
    overwrite: bool,
) -> mt_core::Result<()> {
    let meta = tokio::fs::metadata(input)
        .await
        .map_err(|_| Error::Extraction(format!("input file does not exist: {}", input.display())))?;
    if !meta.is_file() {
        return Err(Error::Extraction(format!(
            "input path is not a file: {}",
            input.display()
        )));
    }

    let args = build_ffmpeg_args(input, output, overwrite)?;
    let ffmpeg = tools.require("ffmpeg")?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        "extracting audio"
    );

    ffmpeg
        .command()
        .args(args)
        .execute()
        .await
        .map_err(|e| match e {
            Error::Tool { message, .. } => Error::Extraction(format!("ffmpeg failed: {message}")),
            other => other,
        })?;

    Ok(())
}
