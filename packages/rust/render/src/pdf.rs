//! PDF rendering and text extraction on top of `lopdf`.
//!
//! Layout: A4 page, fixed margins, optional logo in the top-left corner,
//! a centered bold title, then the body wrapped to the text width. The body
//! flows onto new pages when it runs past the bottom margin.

use coursecraft_shared::{CourseCraftError, DocumentFormat, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat, dictionary};
use tracing::{debug, instrument};

use crate::DocumentStyle;
use crate::jpeg::{JpegInfo, probe_jpeg};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 28;
const LOGO_WIDTH: i64 = 85;
/// Space reserved above the title whether or not a logo is drawn.
const HEADER_HEIGHT: i64 = 85;
const TITLE_SIZE: i64 = 16;
const TITLE_LEADING: i64 = 20;
const TITLE_GAP: i64 = 28;
const BODY_SIZE: i64 = 12;
const BODY_LEADING: i64 = 16;
const BODY_WIDTH: i64 = PAGE_WIDTH - 2 * MARGIN;

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :;<=>?@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [\]^_`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {|}~
];

/// Render `text` as a PDF document.
#[instrument(skip_all, fields(chars = text.len(), logo = style.branding.is_some()))]
pub fn render_pdf(text: &str, style: &DocumentStyle) -> Result<Vec<u8>> {
    let logo = match style.branding.as_deref() {
        Some(bytes) => Some((
            bytes,
            probe_jpeg(bytes).ok_or_else(|| {
                CourseCraftError::render(DocumentFormat::Pdf, "branding image is not a readable JPEG")
            })?,
        )),
        None => None,
    };

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font_dict("Helvetica"));
    let bold_id = doc.add_object(font_dict("Helvetica-Bold"));

    let mut xobjects = Dictionary::new();
    if let Some((bytes, info)) = &logo {
        let image_id = doc.add_object(image_stream(bytes, info));
        xobjects.set("Im1", image_id);
    }

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
        "XObject" => xobjects,
    });

    let pages = layout_pages(text, &style.title, logo.as_ref().map(|(_, info)| *info));
    debug!(pages = pages.len(), "pdf layout complete");

    let mut kids = Vec::with_capacity(pages.len());
    for operations in pages {
        let encoded = Content { operations }
            .encode()
            .map_err(|e| CourseCraftError::render(DocumentFormat::Pdf, format!("content encoding failed: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => name("Page"),
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => name("Pages"),
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => name("Catalog"),
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(encode_win_ansi(&style.title), StringFormat::Literal),
        "Producer" => Object::String(b"CourseCraft".to_vec(), StringFormat::Literal),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| CourseCraftError::render(DocumentFormat::Pdf, format!("write failed: {e}")))?;
    Ok(buf)
}

/// Extract the text of every page of a PDF.
#[instrument(skip_all, fields(size = bytes.len()))]
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| CourseCraftError::validation(format!("not a readable PDF: {e}")))?;

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Ok(String::new());
    }

    doc.extract_text(&page_numbers)
        .map_err(|e| CourseCraftError::validation(format!("PDF text extraction failed: {e}")))
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Lay out logo, title and body into per-page operation lists.
fn layout_pages(text: &str, title: &str, logo: Option<JpegInfo>) -> Vec<Vec<Operation>> {
    let mut pages = vec![Vec::new()];
    let top = PAGE_HEIGHT - MARGIN;
    let mut y = top - HEADER_HEIGHT;

    if let Some(info) = logo {
        let height = LOGO_WIDTH * i64::from(info.height) / i64::from(info.width);
        pages[0].extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(LOGO_WIDTH),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(height),
                    Object::Integer(MARGIN),
                    Object::Integer(top - height),
                ],
            ),
            Operation::new("Do", vec![name("Im1")]),
            Operation::new("Q", vec![]),
        ]);
        y = y.min(top - height - TITLE_GAP / 2);
    }

    for (i, line) in title_lines(title).iter().enumerate() {
        y -= if i == 0 { TITLE_SIZE } else { TITLE_LEADING };
        let x = ((PAGE_WIDTH - bold_width(line)) / 2).max(MARGIN);
        pages[0].extend(text_ops("F2", TITLE_SIZE, x, y, line));
    }
    y -= TITLE_GAP;

    for line in wrap_text(text, BODY_SIZE, BODY_WIDTH) {
        if y - BODY_LEADING < MARGIN {
            pages.push(Vec::new());
            y = top;
        }
        y -= BODY_LEADING;
        if !line.is_empty() {
            if let Some(page) = pages.last_mut() {
                page.extend(text_ops("F1", BODY_SIZE, MARGIN, y, &line));
            }
        }
    }

    pages
}

/// Greedy word wrap. Explicit newlines are kept; words wider than the line
/// are split by character.
fn wrap_text(text: &str, size: i64, max_width: i64) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\t', "    ");
    let mut lines = Vec::new();

    for raw_line in normalized.split('\n') {
        let mut current = String::new();
        for word in raw_line.split(' ').filter(|w| !w.is_empty()) {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(&candidate, size) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for ch in word.chars() {
                current.push(ch);
                if text_width(&current, size) > max_width {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                }
            }
        }
        lines.push(current);
    }

    lines
}

/// Title wrapped so every line fits the text width in the bold face.
fn title_lines(title: &str) -> Vec<String> {
    wrap_text(title, TITLE_SIZE, BODY_WIDTH * 100 / 105)
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect()
}

/// Helvetica-Bold runs about 5% wider than the regular metrics.
fn bold_width(text: &str) -> i64 {
    text_width(text, TITLE_SIZE) * 105 / 100
}

/// Approximate rendered width of `text` in points.
fn text_width(text: &str, size: i64) -> i64 {
    let units: i64 = text
        .chars()
        .map(|ch| {
            let code = ch as u32;
            if (32..=126).contains(&code) {
                i64::from(HELVETICA_WIDTHS[(code - 32) as usize])
            } else {
                556
            }
        })
        .sum();
    units * size / 1000
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

fn font_dict(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => name("Font"),
        "Subtype" => name("Type1"),
        "BaseFont" => name(base_font),
        "Encoding" => name("WinAnsiEncoding"),
    }
}

fn image_stream(bytes: &[u8], info: &JpegInfo) -> Stream {
    let color_space = match info.components {
        1 => "DeviceGray",
        4 => "DeviceCMYK",
        _ => "DeviceRGB",
    };
    Stream::new(
        dictionary! {
            "Type" => name("XObject"),
            "Subtype" => name("Image"),
            "Width" => i64::from(info.width),
            "Height" => i64::from(info.height),
            "ColorSpace" => name(color_space),
            "BitsPerComponent" => 8_i64,
            "Filter" => name("DCTDecode"),
        },
        bytes.to_vec(),
    )
    .with_compression(false)
}

fn text_ops(font: &str, size: i64, x: i64, y: i64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![name(font), Object::Integer(size)]),
        Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

/// Encode text for the standard fonts' WinAnsiEncoding; unmappable
/// characters become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' => ch as u8,
            '\u{A0}'..='\u{FF}' => ch as u32 as u8,
            '€' => 0x80,
            '…' => 0x85,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}
