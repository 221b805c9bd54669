//! Pipeline integration tests
//!
//! Drives whole jobs through the pipeline with stub extraction,
//! transcription and summarization and the real document renderer.

mod common;

use std::io::{Cursor, Read};
use std::sync::atomic::Ordering;

use assert_matches::assert_matches;
use common::{StubStages, TestHarness, SUMMARY, TRANSCRIPT};
use mt_core::{Error, ReportFormat, Stage, SUMMARY_FILE, TRANSCRIPT_FILE};
use mt_pipeline::{PipelineConfig, RunContext, Upload};

fn config(format: ReportFormat) -> PipelineConfig {
    PipelineConfig::default().with_report_format(format)
}

fn pdf_text(bytes: &[u8]) -> String {
    let doc = lopdf::Document::load_mem(bytes).unwrap();
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    doc.extract_text(&pages).unwrap()
}

fn docx_xml(bytes: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

#[tokio::test]
async fn test_video_upload_produces_pdf_report() {
    let h = TestHarness::new();
    let upload = Upload::from_bytes("clip.mp4", &b"\x00\x00\x00\x18ftypisom"[..]);

    let result = h
        .driver()
        .run(upload, &config(ReportFormat::Pdf), &RunContext::new())
        .await
        .unwrap();

    assert_eq!(result.transcript, TRANSCRIPT);
    assert_eq!(result.summary, SUMMARY);
    assert!(result.report_ref.ends_with("report.pdf"));
    assert_eq!(h.stubs.extract_calls.load(Ordering::SeqCst), 1);

    let dir = h.output_root().join(result.job_id.as_str());
    assert_eq!(std::fs::read_to_string(dir.join(TRANSCRIPT_FILE)).unwrap(), TRANSCRIPT);
    assert_eq!(std::fs::read_to_string(dir.join(SUMMARY_FILE)).unwrap(), SUMMARY);

    let text = pdf_text(&std::fs::read(dir.join("report.pdf")).unwrap());
    for needle in ["Alice: Welcome everyone.", "Bob: The budget is approved.", SUMMARY] {
        assert!(text.contains(needle), "missing {needle:?}");
    }
    assert_eq!(h.leftovers(), (1, 0));
}

#[tokio::test]
async fn test_audio_upload_skips_extraction() {
    let h = TestHarness::new();
    let upload = Upload::from_bytes("voice.wav", &b"RIFF\x24\x00\x00\x00WAVE"[..]);

    let result = h
        .driver()
        .run(upload, &PipelineConfig::default(), &RunContext::new())
        .await
        .unwrap();

    assert_eq!(h.stubs.extract_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.stubs.transcribe_calls.load(Ordering::SeqCst), 1);
    assert!(result.report_ref.ends_with("report.docx"));

    let report = h.output_root().join(&result.report_ref);
    let xml = docx_xml(&std::fs::read(report).unwrap());
    assert!(xml.contains("Bob: The budget is approved."));
    assert!(xml.contains(SUMMARY));
}

#[tokio::test]
async fn test_unsupported_extension_is_rejected_without_job() {
    let h = TestHarness::new();
    let upload = Upload::from_bytes("recording.ogg", &b"OggS"[..]);

    let err = h
        .driver()
        .run(upload, &PipelineConfig::default(), &RunContext::new())
        .await
        .unwrap_err();

    assert_matches!(err, Error::Validation(_));
    assert_eq!(h.leftovers(), (0, 0));
    assert_eq!(h.stubs.transcribe_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_transcript_fails_and_cleans_up() {
    let h = TestHarness::with_stubs(StubStages {
        silent: true,
        ..StubStages::default()
    });
    let upload = Upload::from_bytes("clip.mov", &b"moov"[..]);

    let err = h
        .driver()
        .run(upload, &PipelineConfig::default(), &RunContext::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Transcribe));
    assert_matches!(err.root(), Error::Transcription(_));
    assert_eq!(h.stubs.summarize_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.leftovers(), (0, 0));
}

#[tokio::test]
async fn test_stage_failures_leave_nothing_behind() {
    for stage in [Stage::Extract, Stage::Transcribe, Stage::Summarize] {
        let h = TestHarness::with_stubs(StubStages {
            fail_at: Some(stage),
            ..StubStages::default()
        });
        let upload = Upload::from_bytes("talk.mkv", &b"\x1a\x45\xdf\xa3"[..]);

        let err = h
            .driver()
            .run(upload, &config(ReportFormat::Pdf), &RunContext::new())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(stage));
        assert_eq!(h.leftovers(), (0, 0), "leftovers after {stage} failure");
    }
}

#[tokio::test]
async fn test_local_file_upload() {
    let h = TestHarness::new();
    let input = h.root.path().join("Meeting Notes.MP3");
    std::fs::write(&input, b"ID3\x04").unwrap();

    let result = h
        .driver()
        .run(Upload::from_path(input.clone()), &PipelineConfig::default(), &RunContext::new())
        .await
        .unwrap();

    assert!(input.is_file(), "local input must not be consumed");
    assert!(h.output_root().join(&result.report_ref).is_file());
}

#[tokio::test]
async fn test_discard_is_idempotent() {
    let h = TestHarness::new();
    let upload = Upload::from_bytes("a.wav", &b"RIFF"[..]);
    let result = h
        .driver()
        .run(upload, &PipelineConfig::default(), &RunContext::new())
        .await
        .unwrap();

    let ws = h.ctx.workspace.clone();
    ws.discard_job(&result.job_id).await.unwrap();
    ws.discard_job(&result.job_id).await.unwrap();
    assert_eq!(h.leftovers(), (0, 0));
}
