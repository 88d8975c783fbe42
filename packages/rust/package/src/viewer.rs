//! `index.html` launch page.

use coursecraft_shared::DocumentFormat;
use quick_xml::escape::escape;

use crate::manifest::ManifestMeta;

pub const VIEWER_FILE: &str = "index.html";

/// Launch page: embeds a PDF primary document, links anything else.
pub(crate) fn index_html(meta: &ManifestMeta, primary: DocumentFormat, documents: &[&str]) -> String {
    let title = escape(meta.title.as_str());
    let primary_name = escape(primary.file_name());

    let mut details = format!(
        "    <p><strong>Domain:</strong> {}</p>\n",
        escape(meta.domain.as_str())
    );
    if let Some(topic) = &meta.topic {
        details.push_str(&format!(
            "    <p><strong>Topic:</strong> {}</p>\n",
            escape(topic.as_str())
        ));
    }
    if let Some(query) = &meta.query {
        details.push_str(&format!(
            "    <p><strong>Query:</strong> {}</p>\n",
            escape(query.as_str())
        ));
    }

    let main = match primary {
        DocumentFormat::Pdf => format!(
            r#"    <iframe src="{primary_name}" width="100%" height="600px" title="{title}"></iframe>"#
        ),
        _ => format!(r#"    <p><a href="{primary_name}" download>Download {primary_name}</a></p>"#),
    };

    let preview = meta
        .preview_text
        .as_deref()
        .map(|text| {
            let body = escape(text.replace("\r\n", "\n").as_str()).replace('\n', "<br>\n");
            format!("    <div class=\"preview\">\n{body}\n    </div>\n")
        })
        .unwrap_or_default();

    let others: String = documents
        .iter()
        .filter(|name| **name != primary.file_name())
        .map(|name| {
            let name = escape(*name);
            format!("      <li><a href=\"{name}\" download>{name}</a></li>\n")
        })
        .collect();
    let others = if others.is_empty() {
        String::new()
    } else {
        format!("    <ul>\n{others}    </ul>\n")
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>{title}</title>
  </head>
  <body>
    <h1>{title}</h1>
{details}{main}
{preview}{others}  </body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> ManifestMeta {
        ManifestMeta::new("Research Content Response", "Cardiology").with_query("recent stent trials")
    }

    #[test]
    fn pdf_is_embedded() {
        let html = index_html(&meta(), DocumentFormat::Pdf, &["content.pdf"]);
        assert!(html.contains(r#"<iframe src="content.pdf""#));
        assert!(html.contains("Cardiology"));
        assert!(html.contains("recent stent trials"));
        assert!(!html.contains("<ul>"));
    }

    #[test]
    fn other_formats_are_linked() {
        let meta = meta().with_preview_text("line one\nline <two>");
        let html = index_html(&meta, DocumentFormat::Docx, &["response.docx"]);
        assert!(!html.contains("<iframe"));
        assert!(html.contains(r#"<a href="response.docx" download>"#));
        assert!(html.contains("line one<br>\nline &lt;two&gt;"));
    }

    #[test]
    fn secondary_documents_are_listed() {
        let html = index_html(&meta(), DocumentFormat::Pdf, &["content.pdf", "data.csv"]);
        assert!(html.contains(r#"<li><a href="data.csv" download>data.csv</a></li>"#));
    }
}
