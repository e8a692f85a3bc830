//! Summary PDF rendering.
//!
//! Summaries are laid out as a single Helvetica text block on A4 pages: 10 mm side and top
//! margins, a 10 mm line pitch, and an automatic page break once a line would enter the 15 mm
//! bottom margin. Helvetica is one of the PDF base-14 fonts, so nothing is embedded and text is
//! encoded with WinAnsi; characters outside that table are rendered as `?`.
//!
//! The finished document is written to a transient file whose lifetime is tied to
//! [`SummaryPdf`], so it is removed once the response body that streams it is dropped.

use futures_core::Stream;
use lopdf::{
    Document, Object, Stream as PdfStream, StringFormat,
    content::{Content, Operation},
    dictionary,
};
use std::io::Write;
use tempfile::TempPath;
use thiserror::Error;
use tokio::io::AsyncReadExt;

const MM: f32 = 72.0 / 25.4;
const PAGE_WIDTH: f32 = 210.0 * MM;
const PAGE_HEIGHT: f32 = 297.0 * MM;
const MARGIN: f32 = 10.0 * MM;
const BOTTOM_MARGIN: f32 = 15.0 * MM;
const LINE_HEIGHT: f32 = 10.0 * MM;
const CELL_PADDING: f32 = 1.0 * MM;
const FONT_SIZE: f32 = 12.0;
const FONT_NAME: &[u8] = b"F1";
const STREAM_CHUNK: usize = 8 * 1024;

/// Errors raised while rendering or reading back a summary PDF.
#[derive(Debug, Error)]
pub enum PdfError {
    /// lopdf rejected the document structure.
    #[error("PDF encoding failed: {0}")]
    Encode(#[from] lopdf::Error),
    /// The transient file could not be created, written, or read.
    #[error("PDF file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A rendered summary on disk, deleted when dropped.
#[derive(Debug)]
pub struct SummaryPdf {
    path: TempPath,
}

impl SummaryPdf {
    /// Lay out `text` and write it to a fresh temporary `.pdf` file.
    ///
    /// This does blocking file I/O; async callers should run it on the blocking pool.
    pub fn render(text: &str) -> Result<Self, PdfError> {
        let bytes = render_pdf(text)?;
        let mut file = tempfile::Builder::new()
            .prefix("docqa-summary-")
            .suffix(".pdf")
            .tempfile()?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    /// Size of the rendered file in bytes.
    pub async fn len(&self) -> Result<u64, PdfError> {
        Ok(tokio::fs::metadata(&self.path).await?.len())
    }

    /// Open the file and turn it into a chunked byte stream.
    ///
    /// The stream owns the temporary path, so the file is removed once the stream is dropped.
    pub async fn into_stream(
        self,
    ) -> Result<impl Stream<Item = Result<Vec<u8>, std::io::Error>> + Send + 'static, PdfError>
    {
        let file = tokio::fs::File::open(&self.path).await?;
        Ok(stream_file(file, self.path))
    }
}

fn stream_file(
    mut file: tokio::fs::File,
    path: TempPath,
) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> + Send + 'static {
    async_stream::try_stream! {
        let _path = path;
        let mut buffer = vec![0_u8; STREAM_CHUNK];
        loop {
            let read = file.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            yield buffer[..read].to_vec();
        }
    }
}

/// Render `text` to PDF bytes.
pub fn render_pdf(text: &str) -> Result<Vec<u8>, PdfError> {
    let lines = wrap_text(text, PAGE_WIDTH - 2.0 * MARGIN - 2.0 * CELL_PADDING);
    let pages = paginate(&lines);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for page in &pages {
        let content = Content {
            operations: page_operations(page),
        };
        let content_id = doc.add_object(PdfStream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// A line of encoded text positioned on a page.
struct PlacedLine<'a> {
    top: f32,
    text: &'a [u8],
}

fn page_operations(lines: &[PlacedLine<'_>]) -> Vec<Operation> {
    let mut operations = Vec::with_capacity(lines.len() * 5);
    for line in lines.iter().filter(|line| !line.text.is_empty()) {
        // Baseline sits in the middle of the cell, like a vertically centred single-line cell.
        let baseline = PAGE_HEIGHT - (line.top + 0.5 * LINE_HEIGHT + 0.3 * FONT_SIZE);
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(FONT_NAME.to_vec()), Object::Real(FONT_SIZE)],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Real(MARGIN + CELL_PADDING), Object::Real(baseline)],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(line.text.to_vec(), StringFormat::Literal)],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    operations
}

fn paginate(lines: &[Vec<u8>]) -> Vec<Vec<PlacedLine<'_>>> {
    let mut pages = vec![Vec::new()];
    let mut top = MARGIN;
    for line in lines {
        if top + LINE_HEIGHT > PAGE_HEIGHT - BOTTOM_MARGIN {
            pages.push(Vec::new());
            top = MARGIN;
        }
        if let Some(page) = pages.last_mut() {
            page.push(PlacedLine { top, text: line });
        }
        top += LINE_HEIGHT;
    }
    pages
}

/// Greedy word wrap in WinAnsi bytes. Paragraph breaks are kept; over-long words are split.
fn wrap_text(text: &str, max_width: f32) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let encoded = encode_win_ansi(paragraph.trim_end_matches('\r'));
        let mut line: Vec<u8> = Vec::new();
        let mut line_width = 0.0_f32;

        for word in encoded
            .split(|byte| *byte == b' ')
            .filter(|word| !word.is_empty())
        {
            let word_width = text_width(word);
            let space_width = if line.is_empty() { 0.0 } else { char_width(b' ') };

            if line_width + space_width + word_width <= max_width {
                if !line.is_empty() {
                    line.push(b' ');
                }
                line.extend_from_slice(word);
                line_width += space_width + word_width;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0.0;
            }

            for &byte in word {
                let width = char_width(byte);
                if line_width + width > max_width && !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                    line_width = 0.0;
                }
                line.push(byte);
                line_width += width;
            }
        }
        lines.push(line);
    }
    lines
}

fn text_width(text: &[u8]) -> f32 {
    text.iter().map(|byte| char_width(*byte)).sum()
}

/// Helvetica advance width in points at [`FONT_SIZE`].
fn char_width(byte: u8) -> f32 {
    #[rustfmt::skip]
    const ASCII_WIDTHS: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
        1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
        667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
        333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
        556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
    ];
    let units = match byte {
        32..=126 => ASCII_WIDTHS[usize::from(byte - 32)],
        _ => 556,
    };
    f32::from(units) * FONT_SIZE / 1000.0
}

fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\t' => b' ',
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            ch if ch.is_control() => b' ',
            ch => match u8::try_from(u32::from(ch)) {
                Ok(byte) if !(0x80..=0x9F).contains(&byte) => byte,
                _ => b'?',
            },
        })
        .collect()
}
