//! Document renderers: generated text in, document bytes out.
//!
//! - [`render_pdf`]: A4 PDF with optional logo, centered title and wrapped body
//! - [`render_docx`]: Word document with optional logo, heading and body paragraph
//! - [`render_pptx`]: slide deck built from `Title: body` blocks
//! - [`render_csv`]: validated and normalized CSV table
//!
//! Everything is built in memory. A renderer either returns the complete
//! document or an error naming itself; no partial output escapes.

mod csv_table;
mod docx;
mod jpeg;
mod ooxml;
mod pdf;
mod pptx;

use coursecraft_shared::{DocumentFormat, RenderedDocument, Result};
use tracing::{info, instrument};

pub use csv_table::{CsvTable, render_csv};
pub use docx::render_docx;
pub use pdf::{extract_pdf_text, render_pdf};
pub use pptx::{BlockPolicy, SlideBlock, SlideOutline, parse_outline, render_pptx};

/// Presentation settings shared by all renderers.
#[derive(Debug, Clone)]
pub struct DocumentStyle {
    /// Heading line (PDF/Word) or deck title (slides).
    pub title: String,
    /// Subtitle on the slide deck's title slide.
    pub subtitle: String,
    /// Optional JPEG logo for PDF and Word output.
    pub branding: Option<Vec<u8>>,
}

impl Default for DocumentStyle {
    fn default() -> Self {
        Self {
            title: "Research Content Response".into(),
            subtitle: String::new(),
            branding: None,
        }
    }
}

/// Render `text` into `format`.
#[instrument(skip(text, style), fields(chars = text.len()))]
pub fn render(text: &str, format: DocumentFormat, style: &DocumentStyle) -> Result<RenderedDocument> {
    let bytes = match format {
        DocumentFormat::Pdf => render_pdf(text, style)?,
        DocumentFormat::Docx => render_docx(text, style)?,
        DocumentFormat::Pptx => render_pptx(text, &style.title, &style.subtitle)?,
        DocumentFormat::Csv => render_csv(text)?,
    };
    info!(%format, size = bytes.len(), "document rendered");
    Ok(RenderedDocument::new(format, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_matches_format() {
        let style = DocumentStyle::default();

        let pdf = render("Body text", DocumentFormat::Pdf, &style).unwrap();
        assert_eq!(pdf.format, DocumentFormat::Pdf);
        assert!(pdf.bytes.starts_with(b"%PDF"));

        let docx = render("Body text", DocumentFormat::Docx, &style).unwrap();
        assert!(docx.bytes.starts_with(b"PK"));

        let csv = render("a,b\n1,2\n", DocumentFormat::Csv, &style).unwrap();
        assert_eq!(csv.file_name(), "data.csv");
    }

    #[test]
    fn csv_dispatch_rejects_prose() {
        let style = DocumentStyle::default();
        assert!(render("Sorry, I can only answer medical questions.", DocumentFormat::Csv, &style).is_err());
    }
}
