//! What the workflows hand to the delivery boundary.

use coursecraft_package::{ExtraFile, SealedPackage};
use coursecraft_shared::RenderedDocument;

/// Bytes ready to be saved or downloaded.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub bytes: Vec<u8>,
    /// Suggested file name.
    pub file_name: String,
    pub mime_type: &'static str,
}

impl From<SealedPackage> for Delivery {
    fn from(package: SealedPackage) -> Self {
        Self {
            bytes: package.bytes,
            file_name: package.file_name,
            mime_type: package.mime_type,
        }
    }
}

impl From<RenderedDocument> for Delivery {
    fn from(doc: RenderedDocument) -> Self {
        Self {
            file_name: doc.file_name().to_string(),
            mime_type: doc.format.mime_type(),
            bytes: doc.bytes,
        }
    }
}

/// Per-export packaging options.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Topic line shown on the launch page.
    pub topic: Option<String>,
    /// Fixed identifier prefix; a fresh one is generated when unset.
    pub identifier_prefix: Option<String>,
    /// Additional files to ship in the package.
    pub extra_files: Vec<ExtraFile>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursecraft_shared::DocumentFormat;

    #[test]
    fn raw_document_delivery_uses_fixed_name() {
        let delivery = Delivery::from(RenderedDocument::new(DocumentFormat::Pptx, vec![1]));
        assert_eq!(delivery.file_name, "presentation.pptx");
        assert_eq!(
            delivery.mime_type,
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        );
    }
}
