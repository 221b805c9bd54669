//! Word document rendering.

use std::io::Cursor;

use docx_rs::{BreakType, Docx, Paragraph, Run, Style, StyleType};
use mt_core::Error;

use crate::{Report, SUMMARY_HEADING, TRANSCRIPT_HEADING};

const TITLE_STYLE: &str = "Heading1";
const SECTION_STYLE: &str = "Heading2";

fn heading(text: &str, style: &str) -> Paragraph {
    Paragraph::new()
        .add_run(Run::new().add_text(text))
        .style(style)
}

/// Summary text as one paragraph, line breaks kept.
fn summary_paragraph(summary: &str) -> Paragraph {
    let mut run = Run::new();
    for (i, line) in summary.lines().enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    Paragraph::new().add_run(run)
}

pub(crate) fn render(report: &Report<'_>) -> mt_core::Result<Vec<u8>> {
    let mut doc = Docx::new()
        .add_style(
            Style::new(TITLE_STYLE, StyleType::Paragraph)
                .name("Heading 1")
                .size(32)
                .bold(),
        )
        .add_style(
            Style::new(SECTION_STYLE, StyleType::Paragraph)
                .name("Heading 2")
                .size(26)
                .bold(),
        )
        .add_paragraph(heading(&report.title, TITLE_STYLE))
        .add_paragraph(heading(SUMMARY_HEADING, SECTION_STYLE))
        .add_paragraph(summary_paragraph(report.summary))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
        .add_paragraph(heading(TRANSCRIPT_HEADING, SECTION_STYLE));

    for line in report.transcript.lines() {
        let line = line.trim();
        let paragraph = if line.is_empty() {
            Paragraph::new().add_run(Run::new().add_break(BreakType::TextWrapping))
        } else {
            Paragraph::new().add_run(Run::new().add_text(line))
        };
        doc = doc.add_paragraph(paragraph);
    }

    let mut buf = Cursor::new(Vec::new());
    doc.build()
        .pack(&mut buf)
        .map_err(|e| Error::Render(format!("docx packaging failed: {e}")))?;
    Ok(buf.into_inner())
}
