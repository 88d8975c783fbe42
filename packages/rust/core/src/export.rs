//! Rendering and packaging of generated content.
//!
//! Needs no network access, so it is usable without API credentials.

use coursecraft_package::{ManifestMeta, assemble};
use coursecraft_render::{DocumentStyle, render, render_pptx};
use coursecraft_shared::{
    AppConfig, ContentKind, CourseCraftError, DocumentFormat, GeneratedContent, RenderedDocument,
    Result,
};
use tracing::{info, instrument};

use crate::delivery::{Delivery, ExportOptions};

/// Turns [`GeneratedContent`] into deliverable files.
#[derive(Debug, Clone)]
pub struct Exporter {
    style: DocumentStyle,
}

impl Exporter {
    pub fn new(style: DocumentStyle) -> Self {
        Self { style }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(Self::style_from_config(config)?))
    }

    /// Document style from the `[branding]` section, logo loaded from disk.
    pub fn style_from_config(config: &AppConfig) -> Result<DocumentStyle> {
        Ok(DocumentStyle {
            title: config.branding.title.clone(),
            subtitle: config.branding.subtitle.clone(),
            branding: config.branding.load_logo()?,
        })
    }

    pub fn style(&self) -> &DocumentStyle {
        &self.style
    }

    /// Render `content` as `format` and wrap it in a SCORM package.
    ///
    /// The format must be one the content kind maps to.
    #[instrument(skip_all, fields(kind = %content.kind, %format))]
    pub fn export(
        &self,
        content: &GeneratedContent,
        format: DocumentFormat,
        options: &ExportOptions,
    ) -> Result<Delivery> {
        if !content.kind.accepts(format) {
            return Err(CourseCraftError::validation(format!(
                "{} content cannot be exported as {format}",
                content.kind
            )));
        }

        let document = render(&content.text, format, &self.style)?;
        let meta = self.manifest_meta(content, format, options);
        let package = assemble(&[document], &meta, &options.extra_files)?;

        info!(file = %package.file_name, sha256 = %package.sha256, "export ready");
        Ok(package.into())
    }

    /// Render a slide outline as a bare `.pptx`, without packaging.
    #[instrument(skip_all)]
    pub fn export_slides_raw(&self, content: &GeneratedContent) -> Result<Delivery> {
        if content.kind != ContentKind::SlideOutline {
            return Err(CourseCraftError::validation(format!(
                "{} content cannot be exported as a slide deck",
                content.kind
            )));
        }
        let bytes = render_pptx(&content.text, &self.style.title, &self.style.subtitle)?;
        Ok(RenderedDocument::new(DocumentFormat::Pptx, bytes).into())
    }

    fn manifest_meta(
        &self,
        content: &GeneratedContent,
        format: DocumentFormat,
        options: &ExportOptions,
    ) -> ManifestMeta {
        let mut meta = ManifestMeta::new(
            self.style.title.as_str(),
            content.source_query.domain.as_str(),
        )
        .with_query(content.source_query.text.as_str());

        if let Some(prefix) = &options.identifier_prefix {
            meta = meta.with_identifier_prefix(prefix.as_str());
        }
        if let Some(topic) = &options.topic {
            meta = meta.with_topic(topic.as_str());
        }
        // Word files cannot be embedded, so the launch page shows the text.
        if format == DocumentFormat::Docx {
            meta = meta.with_preview_text(content.text.as_str());
        }
        meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursecraft_package::ExtraFile;
    use coursecraft_shared::Query;

    fn content(text: &str, kind: ContentKind) -> GeneratedContent {
        GeneratedContent::new(text, kind, Query::new("Cardiology", "recent stent trials"))
    }

    #[test]
    fn same_prefix_gives_identical_packages() {
        let exporter = Exporter::new(DocumentStyle::default());
        let options = ExportOptions {
            identifier_prefix: Some("fixed".into()),
            ..ExportOptions::default()
        };
        let text = content("Body", ContentKind::FreeText);

        let a = exporter.export(&text, DocumentFormat::Docx, &options).unwrap();
        let b = exporter.export(&text, DocumentFormat::Docx, &options).unwrap();
        assert_eq!(a.bytes, b.bytes);
    }

    #[test]
    fn extras_and_topic_reach_the_package() {
        let exporter = Exporter::new(DocumentStyle::default());
        let options = ExportOptions {
            topic: Some("Interventional cardiology".into()),
            extra_files: vec![ExtraFile::new("notes.txt", b"notes".to_vec())],
            ..ExportOptions::default()
        };
        let delivery = exporter
            .export(&content("Body", ContentKind::FreeText), DocumentFormat::Pdf, &options)
            .unwrap();

        let entries = coursecraft_package::validate_package(&delivery.bytes).unwrap();
        assert!(entries.contains("notes.txt"));
        assert!(entries.contains("content.pdf"));
    }

    #[test]
    fn invalid_csv_never_becomes_a_package() {
        let exporter = Exporter::new(DocumentStyle::default());
        let err = exporter
            .export(
                &content("I only answer medical questions.", ContentKind::CsvTable),
                DocumentFormat::Csv,
                &ExportOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, CourseCraftError::Format { .. }));
    }
}
