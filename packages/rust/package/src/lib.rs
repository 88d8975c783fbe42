//! SCORM package assembly.
//!
//! Rendered documents go in, one sealed zip comes out:
//!
//! ```text
//! scorm_package.zip
//! ├── content.pdf        (or response.docx / data.csv / presentation.pptx)
//! ├── <extra files>
//! ├── imsmanifest.xml    lists every other entry
//! └── index.html         launch page
//! ```
//!
//! The archive is built entirely in memory and only handed out once sealed.

mod manifest;
mod viewer;

use std::collections::BTreeSet;
use std::io::{Cursor, Read, Write};

use coursecraft_shared::{CourseCraftError, RenderedDocument, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

pub use manifest::{MANIFEST_FILE, ManifestMeta};
pub use viewer::VIEWER_FILE;

/// Suggested download name for a sealed package.
pub const PACKAGE_FILE_NAME: &str = "scorm_package.zip";
pub const PACKAGE_MIME_TYPE: &str = "application/zip";

/// An additional file shipped alongside the documents.
#[derive(Debug, Clone)]
pub struct ExtraFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ExtraFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// A finished archive.
#[derive(Debug, Clone)]
pub struct SealedPackage {
    pub bytes: Vec<u8>,
    /// Entry names in archive order.
    pub entries: Vec<String>,
    pub file_name: String,
    pub mime_type: &'static str,
    /// Hex SHA-256 of `bytes`.
    pub sha256: String,
}

/// Assemble documents and extra files into a SCORM package.
///
/// The first document is the primary one: a PDF is embedded in the launch
/// page, other formats are linked for download.
#[instrument(skip_all, fields(documents = documents.len(), extras = extra_files.len()))]
pub fn assemble(
    documents: &[RenderedDocument],
    meta: &ManifestMeta,
    extra_files: &[ExtraFile],
) -> Result<SealedPackage> {
    let primary = documents
        .first()
        .ok_or_else(|| CourseCraftError::Assembly("package needs at least one document".into()))?;

    let mut names: Vec<&str> = Vec::with_capacity(documents.len() + extra_files.len() + 2);
    for doc in documents {
        push_unique(&mut names, doc.file_name())?;
    }
    for extra in extra_files {
        if extra.name == MANIFEST_FILE || extra.name == VIEWER_FILE {
            return Err(CourseCraftError::Assembly(format!(
                "extra file {} collides with a reserved name",
                extra.name
            )));
        }
        if !is_safe_entry_name(&extra.name) {
            return Err(CourseCraftError::Assembly(format!(
                "invalid extra file name {:?}",
                extra.name
            )));
        }
        push_unique(&mut names, &extra.name)?;
    }

    let document_names: Vec<&str> = documents.iter().map(RenderedDocument::file_name).collect();
    let mut manifest_files = names.clone();
    manifest_files.push(VIEWER_FILE);
    let manifest = manifest::manifest_xml(meta, VIEWER_FILE, &manifest_files);
    let viewer = viewer::index_html(meta, primary.format, &document_names);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries = Vec::with_capacity(names.len() + 2);

    for doc in documents {
        write_entry(&mut writer, doc.file_name(), &doc.bytes)?;
        entries.push(doc.file_name().to_string());
    }
    for extra in extra_files {
        write_entry(&mut writer, &extra.name, &extra.bytes)?;
        entries.push(extra.name.clone());
    }
    write_entry(&mut writer, MANIFEST_FILE, manifest.as_bytes())?;
    entries.push(MANIFEST_FILE.to_string());
    write_entry(&mut writer, VIEWER_FILE, viewer.as_bytes())?;
    entries.push(VIEWER_FILE.to_string());

    let bytes = writer
        .finish()
        .map_err(|e| CourseCraftError::Assembly(format!("failed to seal archive: {e}")))?
        .into_inner();
    let sha256 = hex_digest(&bytes);

    info!(entries = entries.len(), size = bytes.len(), %sha256, "package sealed");

    Ok(SealedPackage {
        bytes,
        entries,
        file_name: PACKAGE_FILE_NAME.to_string(),
        mime_type: PACKAGE_MIME_TYPE,
        sha256,
    })
}

/// Reopen a package and check that its manifest references exactly the
/// other entries. Returns the entry names.
#[instrument(skip_all, fields(size = bytes.len()))]
pub fn validate_package(bytes: &[u8]) -> Result<BTreeSet<String>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| CourseCraftError::validation(format!("not a zip archive: {e}")))?;

    let entries: BTreeSet<String> = archive.file_names().map(str::to_string).collect();
    if let Some(bad) = entries.iter().find(|name| !is_safe_entry_name(name)) {
        return Err(CourseCraftError::validation(format!("unsafe entry name {bad:?}")));
    }
    if !entries.contains(VIEWER_FILE) {
        return Err(CourseCraftError::validation(format!("missing {VIEWER_FILE}")));
    }

    let manifest_xml = {
        let mut file = archive
            .by_name(MANIFEST_FILE)
            .map_err(|_| CourseCraftError::validation(format!("missing {MANIFEST_FILE}")))?;
        let mut xml = String::new();
        file.read_to_string(&mut xml)
            .map_err(|e| CourseCraftError::validation(format!("unreadable {MANIFEST_FILE}: {e}")))?;
        xml
    };

    let refs = manifest::manifest_file_refs(&manifest_xml)?;
    let expected: BTreeSet<String> = entries
        .iter()
        .filter(|name| name.as_str() != MANIFEST_FILE)
        .cloned()
        .collect();

    if refs != expected {
        let missing: Vec<_> = expected.difference(&refs).cloned().collect();
        let dangling: Vec<_> = refs.difference(&expected).cloned().collect();
        return Err(CourseCraftError::validation(format!(
            "manifest mismatch: unreferenced entries {missing:?}, references without entries {dangling:?}"
        )));
    }

    debug!(entries = entries.len(), "package manifest consistent");
    Ok(entries)
}

/// Hex SHA-256 of `bytes`.
pub fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Relative, `/`-separated, no empty or `.`/`..` components, no trailing `/`.
fn is_safe_entry_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('\\')
        && !name.contains(':')
        && name
            .split('/')
            .all(|part| !part.is_empty() && part != "." && part != "..")
}

fn push_unique<'a>(names: &mut Vec<&'a str>, name: &'a str) -> Result<()> {
    if names.contains(&name) {
        return Err(CourseCraftError::Assembly(format!("duplicate file name {name}")));
    }
    names.push(name);
    Ok(())
}

fn write_entry(writer: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, bytes: &[u8]) -> Result<()> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    writer
        .start_file(name, options)
        .map_err(|e| CourseCraftError::Assembly(format!("failed to add {name}: {e}")))?;
    writer
        .write_all(bytes)
        .map_err(|e| CourseCraftError::Assembly(format!("failed to write {name}: {e}")))
}
