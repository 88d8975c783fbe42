//! Shared plumbing for Office Open XML containers (DOCX, PPTX).
//!
//! An OOXML file is a zip of XML parts. Parts are collected in memory and
//! only zipped when the whole document has been built.

use std::borrow::Cow;
use std::io::{Cursor, Write};

use coursecraft_shared::{CourseCraftError, DocumentFormat, Result};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub(crate) const RELS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-package.relationships+xml";

/// EMUs per inch.
pub(crate) const EMU_PER_INCH: i64 = 914_400;

/// Escape text for use in XML content or attribute values.
pub(crate) fn escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Fail with a render error if `text` holds a character XML 1.0 cannot
/// represent (most C0 controls, U+FFFE, U+FFFF).
pub(crate) fn ensure_xml_text(format: DocumentFormat, what: &str, text: &str) -> Result<()> {
    match text.char_indices().find(|(_, ch)| !is_xml_char(*ch)) {
        Some((offset, ch)) => Err(CourseCraftError::render(
            format,
            format!("{what} contains U+{:04X} at byte {offset}, which XML cannot carry", ch as u32),
        )),
        None => Ok(()),
    }
}

fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// A relationship entry in a `.rels` part.
pub(crate) struct Relationship<'a> {
    pub id: &'a str,
    pub rel_type: &'a str,
    pub target: &'a str,
}

/// Render a `.rels` part.
pub(crate) fn relationships_xml(rels: &[Relationship<'_>]) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            rel.id,
            rel.rel_type,
            escape(rel.target)
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Parts of one OOXML document, in write order.
pub(crate) struct OoxmlParts {
    format: DocumentFormat,
    defaults: Vec<(&'static str, &'static str)>,
    overrides: Vec<(String, &'static str)>,
    parts: Vec<(String, Vec<u8>)>,
}

impl OoxmlParts {
    pub(crate) fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            defaults: vec![("rels", RELS_CONTENT_TYPE), ("xml", "application/xml")],
            overrides: Vec::new(),
            parts: Vec::new(),
        }
    }

    /// Register a default content type for an extension.
    pub(crate) fn default_type(&mut self, extension: &'static str, content_type: &'static str) {
        if !self.defaults.iter().any(|(ext, _)| *ext == extension) {
            self.defaults.push((extension, content_type));
        }
    }

    /// Add an XML part with an explicit content type override.
    pub(crate) fn typed_part(&mut self, name: &str, content_type: &'static str, xml: String) {
        self.overrides.push((format!("/{name}"), content_type));
        self.parts.push((name.to_string(), xml.into_bytes()));
    }

    /// Add a part whose content type comes from its extension.
    pub(crate) fn part(&mut self, name: &str, bytes: Vec<u8>) {
        self.parts.push((name.to_string(), bytes));
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (extension, content_type) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{extension}" ContentType="{content_type}"/>"#
            ));
        }
        for (part_name, content_type) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{part_name}" ContentType="{content_type}"/>"#
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    /// Zip all parts, `[Content_Types].xml` first.
    pub(crate) fn finish(self) -> Result<Vec<u8>> {
        let format = self.format;
        let zip_err = |e: zip::result::ZipError| CourseCraftError::render(format, format!("zip write failed: {e}"));
        let io_err = |e: std::io::Error| CourseCraftError::render(format, format!("zip write failed: {e}"));

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        writer
            .start_file("[Content_Types].xml", options)
            .map_err(zip_err)?;
        writer
            .write_all(self.content_types_xml().as_bytes())
            .map_err(io_err)?;

        for (name, bytes) in &self.parts {
            writer.start_file(name.as_str(), options).map_err(zip_err)?;
            writer.write_all(bytes).map_err(io_err)?;
        }

        let cursor = writer.finish().map_err(zip_err)?;
        Ok(cursor.into_inner())
    }
}

/// Entry names and contents of an OOXML file, for tests.
#[cfg(test)]
pub(crate) fn read_parts(bytes: &[u8]) -> std::collections::BTreeMap<String, String> {
    use std::io::Read;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("open zip");
    let mut parts = std::collections::BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).expect("zip entry");
        let mut content = Vec::new();
        file.read_to_end(&mut content).expect("read entry");
        parts.insert(
            file.name().to_string(),
            String::from_utf8_lossy(&content).into_owned(),
        );
    }
    parts
}
