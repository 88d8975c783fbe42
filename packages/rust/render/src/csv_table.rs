//! CSV tables produced by the generation step.
//!
//! Models often wrap tables in a Markdown fence or drift into prose; the
//! table is validated before anything is exported.

use std::sync::LazyLock;

use coursecraft_shared::{CourseCraftError, DocumentFormat, Result};
use regex::Regex;
use tracing::instrument;

/// A parsed CSV table with a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Parse `text` as a header plus at least one data row.
    pub fn parse(text: &str) -> Result<Self> {
        let body = strip_fence(text);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| CourseCraftError::format(format!("unreadable CSV header: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.iter().all(String::is_empty) {
            return Err(CourseCraftError::format("CSV has no header row"));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| CourseCraftError::format(format!("malformed CSV row: {e}")))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        if rows.is_empty() {
            return Err(CourseCraftError::format("CSV has no data rows"));
        }

        Ok(Self { headers, rows })
    }

    /// Serialize back to CSV with `\n` line endings.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let write_err = |e: csv::Error| CourseCraftError::render(DocumentFormat::Csv, e.to_string());

        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(&self.headers).map_err(write_err)?;
        for row in &self.rows {
            writer.write_record(row).map_err(write_err)?;
        }
        writer
            .into_inner()
            .map_err(|e| CourseCraftError::render(DocumentFormat::Csv, e.to_string()))
    }
}

/// Validate and normalize generated CSV text.
#[instrument(skip_all, fields(chars = text.len()))]
pub fn render_csv(text: &str) -> Result<Vec<u8>> {
    CsvTable::parse(text)?.to_csv()
}

/// Remove a surrounding Markdown code fence, if any.
fn strip_fence(text: &str) -> &str {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)^\s*```[\w-]*[ \t]*\r?\n(.*?)\r?\n?[ \t]*```\s*$").expect("valid regex")
    });

    match FENCE_RE.captures(text).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}
