//! Paginated PDF rendering with the built-in Helvetica fonts.
//!
//! Text is laid out line by line on A4 pages: long paragraphs are wrapped
//! greedily on word boundaries and a new page starts whenever the next line
//! would cross the bottom margin. Characters outside WinAnsi (Latin-1) are
//! replaced with `?` because the base-14 fonts cannot show them.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use mt_core::Error;

use crate::{Report, SUMMARY_HEADING, TRANSCRIPT_HEADING};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 56.7;
const TEXT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

#[derive(Clone, Copy)]
struct TextStyle {
    font: &'static str,
    size: f32,
    leading: f32,
    space_after: f32,
    color: [f32; 3],
}

const TITLE: TextStyle = TextStyle {
    font: BOLD,
    size: 18.0,
    leading: 22.0,
    space_after: 18.0,
    color: [0.173, 0.243, 0.314],
};

const SECTION: TextStyle = TextStyle {
    font: BOLD,
    size: 14.0,
    leading: 18.0,
    space_after: 12.0,
    color: [0.122, 0.380, 0.553],
};

const BODY: TextStyle = TextStyle {
    font: REGULAR,
    size: 11.0,
    leading: 16.0,
    space_after: 8.0,
    color: [0.0, 0.0, 0.0],
};

/// Approximate Helvetica advance width of `c`, in em.
fn char_width(c: char) -> f32 {
    match c {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' | ' ' | 'I' | 'f' | 't' | 'r' => 0.28,
        'm' | 'w' | 'M' | 'W' => 0.83,
        'A'..='Z' => 0.67,
        _ => 0.56,
    }
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(char_width).sum::<f32>() * size
}

/// Greedy word wrap to `width` points. Words wider than a line are split.
fn wrap(text: &str, size: f32, width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, size) <= width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for c in word.chars() {
            if !current.is_empty() && text_width(&current, size) + char_width(c) * size > width {
                lines.push(std::mem::take(&mut current));
            }
            current.push(c);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// WinAnsi bytes for `text`; unmappable characters become `?`.
fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            0x20..=0x7e | 0xa0..=0xff => u32::from(c) as u8,
            _ => b'?',
        })
        .collect()
}

/// Accumulates page content streams.
struct Layout {
    pages: Vec<Vec<Operation>>,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.pages.push(Vec::new());
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn line(&mut self, text: &str, style: TextStyle) {
        self.ensure_room(style.leading);
        self.y -= style.leading;
        let [r, g, b] = style.color;
        let ops = [
            Operation::new("BT", vec![]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("Tf", vec![style.font.into(), style.size.into()]),
            Operation::new("Td", vec![MARGIN.into(), self.y.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_latin1(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ];
        if let Some(page) = self.pages.last_mut() {
            page.extend(ops);
        }
    }

    fn paragraph(&mut self, text: &str, style: TextStyle) {
        let lines = wrap(text, style.size, TEXT_WIDTH);
        if lines.is_empty() {
            // Blank paragraph keeps its vertical space.
            self.ensure_room(style.leading);
            self.y -= style.leading;
        }
        for line in lines {
            self.line(&line, style);
        }
        self.y -= style.space_after;
    }

    fn space(&mut self, height: f32) {
        self.y -= height;
    }
}

fn layout(report: &Report<'_>) -> Layout {
    let mut layout = Layout::new();
    layout.paragraph(&report.title, TITLE);

    layout.paragraph(SUMMARY_HEADING, SECTION);
    for line in report.summary.lines() {
        layout.paragraph(line, BODY);
    }
    layout.space(28.35);

    layout.paragraph(TRANSCRIPT_HEADING, SECTION);
    for line in report.transcript.lines() {
        layout.paragraph(line, BODY);
    }
    layout
}

fn add_font(doc: &mut Document, base: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    })
}

pub(crate) fn render(report: &Report<'_>) -> mt_core::Result<Vec<u8>> {
    let pdf_err = |e: lopdf::Error| Error::Render(format!("pdf encoding failed: {e}"));

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = add_font(&mut doc, "Helvetica");
    let bold = add_font(&mut doc, "Helvetica-Bold");
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular,
            BOLD => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for operations in layout(report).pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().map_err(pdf_err)?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| Error::Render(format!("pdf write failed: {e}")))?;
    Ok(buf)
}
