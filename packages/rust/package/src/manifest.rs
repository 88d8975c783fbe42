//! `imsmanifest.xml` generation and parsing.

use std::collections::BTreeSet;

use coursecraft_shared::{CourseCraftError, Result};
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use uuid::Uuid;

pub const MANIFEST_FILE: &str = "imsmanifest.xml";

/// Descriptive metadata written into the manifest and the viewer page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestMeta {
    /// Package title, used for the organization item and the viewer heading.
    pub title: String,
    /// Prefix of the organization, item and resource identifiers.
    pub identifier_prefix: String,
    pub domain: String,
    pub topic: Option<String>,
    pub query: Option<String>,
    /// Text shown in the viewer when the primary document cannot be embedded.
    pub preview_text: Option<String>,
}

impl ManifestMeta {
    /// Metadata with a fresh `coursecraft-<uuid>` identifier prefix.
    pub fn new(title: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            identifier_prefix: format!("coursecraft-{}", Uuid::now_v7()),
            domain: domain.into(),
            topic: None,
            query: None,
            preview_text: None,
        }
    }

    pub fn with_identifier_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.identifier_prefix = prefix.into();
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_preview_text(mut self, text: impl Into<String>) -> Self {
        self.preview_text = Some(text.into());
        self
    }
}

/// Build a SCORM 1.2 manifest whose single resource launches `launch` and
/// lists every file in `files`.
pub(crate) fn manifest_xml(meta: &ManifestMeta, launch: &str, files: &[&str]) -> String {
    let prefix = escape(meta.identifier_prefix.as_str());
    let title = escape(meta.title.as_str());
    let file_entries: String = files
        .iter()
        .map(|f| format!("\n      <file href=\"{}\"/>", escape(*f)))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest identifier="{prefix}" version="1.0"
  xmlns="http://www.imsproject.org/xsd/imscp_rootv1p1p2"
  xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_rootv1p2"
  xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
  xsi:schemaLocation="http://www.imsproject.org/xsd/imscp_rootv1p1p2 imscp_rootv1p1p2.xsd http://www.adlnet.org/xsd/adlcp_rootv1p2 adlcp_rootv1p2.xsd">
  <metadata>
    <schema>ADL SCORM</schema>
    <schemaversion>1.2</schemaversion>
  </metadata>
  <organizations default="{prefix}-ORG-1">
    <organization identifier="{prefix}-ORG-1">
      <title>{title}</title>
      <item identifier="{prefix}-ITEM-1" identifierref="{prefix}-RES-1">
        <title>{title}</title>
      </item>
    </organization>
  </organizations>
  <resources>
    <resource identifier="{prefix}-RES-1" type="webcontent" adlcp:scormtype="sco" href="{launch}">{file_entries}
    </resource>
  </resources>
</manifest>
"#,
        launch = escape(launch),
    )
}

/// Collect every `<file href>` from a manifest.
pub(crate) fn manifest_file_refs(xml: &str) -> Result<BTreeSet<String>> {
    let mut reader = Reader::from_str(xml);
    let mut refs = BTreeSet::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"file" => {
                let attr = e
                    .try_get_attribute("href")
                    .map_err(|err| CourseCraftError::validation(format!("bad manifest attribute: {err}")))?
                    .ok_or_else(|| CourseCraftError::validation("manifest <file> without href"))?;
                let href = attr
                    .unescape_value()
                    .map_err(|err| CourseCraftError::validation(format!("bad manifest href: {err}")))?;
                refs.insert(href.into_owned());
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(CourseCraftError::validation(format!(
                    "manifest is not well-formed XML at byte {}: {err}",
                    reader.error_position()
                )));
            }
        }
    }

    Ok(refs)
}
