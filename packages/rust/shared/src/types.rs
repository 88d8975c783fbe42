//! Core domain types for CourseCraft.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A domain-scoped question submitted by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Subject area the answer must stay within (e.g. "Cardiology").
    pub domain: String,
    /// The user's question or topic.
    pub text: String,
}

impl Query {
    pub fn new(domain: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ContentKind
// ---------------------------------------------------------------------------

/// Shape of generated text, which also decides the renderers that accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    FreeText,
    CsvTable,
    SlideOutline,
}

impl ContentKind {
    /// Document formats this kind of content can be rendered into.
    /// The first entry is the default.
    pub fn formats(&self) -> &'static [DocumentFormat] {
        match self {
            Self::FreeText => &[DocumentFormat::Pdf, DocumentFormat::Docx],
            Self::CsvTable => &[DocumentFormat::Csv],
            Self::SlideOutline => &[DocumentFormat::Pptx],
        }
    }

    /// Whether `format` is an accepted renderer for this kind.
    pub fn accepts(&self, format: DocumentFormat) -> bool {
        self.formats().contains(&format)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FreeText => "free_text",
            Self::CsvTable => "csv_table",
            Self::SlideOutline => "slide_outline",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GeneratedContent
// ---------------------------------------------------------------------------

/// Text produced by the completion endpoint for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub text: String,
    pub kind: ContentKind,
    pub source_query: Query,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedContent {
    pub fn new(text: impl Into<String>, kind: ContentKind, source_query: Query) -> Self {
        Self {
            text: text.into(),
            kind,
            source_query,
            generated_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// SearchResult
// ---------------------------------------------------------------------------

/// A single web search hit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Binary document formats the renderers produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Pptx,
    Csv,
}

impl DocumentFormat {
    /// Fixed filename used for this format inside a package.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Pdf => "content.pdf",
            Self::Docx => "response.docx",
            Self::Pptx => "presentation.pptx",
            Self::Csv => "data.csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::Csv => "text/csv",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Csv => "csv",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = crate::CourseCraftError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" | "word" => Ok(Self::Docx),
            "pptx" | "ppt" | "slides" => Ok(Self::Pptx),
            "csv" => Ok(Self::Csv),
            other => Err(crate::CourseCraftError::validation(format!(
                "unknown document format '{other}': expected pdf, docx, pptx or csv"
            ))),
        }
    }
}

/// Output of a renderer, owned by the package assembler until sealed.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

impl RenderedDocument {
    pub fn new(format: DocumentFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    /// Filename under which this document is stored in a package.
    pub fn file_name(&self) -> &'static str {
        self.format.file_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_kind_format_table() {
        assert!(ContentKind::FreeText.accepts(DocumentFormat::Pdf));
        assert!(ContentKind::FreeText.accepts(DocumentFormat::Docx));
        assert!(!ContentKind::FreeText.accepts(DocumentFormat::Csv));
        assert_eq!(ContentKind::CsvTable.formats(), &[DocumentFormat::Csv]);
        assert_eq!(ContentKind::SlideOutline.formats()[0], DocumentFormat::Pptx);
    }

    #[test]
    fn document_format_file_names() {
        assert_eq!(DocumentFormat::Pdf.file_name(), "content.pdf");
        assert_eq!(DocumentFormat::Docx.file_name(), "response.docx");
        assert_eq!(DocumentFormat::Csv.file_name(), "data.csv");
    }

    #[test]
    fn document_format_parses() {
        assert_eq!("PDF".parse::<DocumentFormat>().unwrap(), DocumentFormat::Pdf);
        assert_eq!("word".parse::<DocumentFormat>().unwrap(), DocumentFormat::Docx);
        assert!("odt".parse::<DocumentFormat>().is_err());
    }

    #[test]
    fn search_result_missing_fields_default() {
        let parsed: SearchResult = serde_json::from_str(r#"{"title":"Only a title"}"#).unwrap();
        assert_eq!(parsed.title, "Only a title");
        assert!(parsed.link.is_empty());
        assert!(parsed.snippet.is_empty());
    }

    #[test]
    fn generated_content_serialization() {
        let content = GeneratedContent::new(
            "Stents reduce restenosis.",
            ContentKind::FreeText,
            Query::new("Cardiology", "recent stent trials"),
        );
        let json = serde_json::to_string(&content).expect("serialize");
        assert!(json.contains(r#""kind":"free_text""#));
        let parsed: GeneratedContent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.source_query.domain, "Cardiology");
    }
}
