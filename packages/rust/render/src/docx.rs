//! Word (`.docx`) rendering.

use coursecraft_shared::{CourseCraftError, DocumentFormat, Result};
use tracing::instrument;

use crate::DocumentStyle;
use crate::jpeg::probe_jpeg;
use crate::ooxml::{
    EMU_PER_INCH, OoxmlParts, Relationship, XML_DECLARATION, ensure_xml_text, escape,
    relationships_xml,
};

const DOCUMENT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const STYLES_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const STYLES_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const LOGO_REL_ID: &str = "rId2";
/// Logo width in EMU (1.5in).
const LOGO_WIDTH_EMU: i64 = EMU_PER_INCH * 3 / 2;

const STYLES_XML: &str = r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="0"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:color w:val="2F5496"/><w:sz w:val="32"/></w:rPr></w:style></w:styles>"#;

/// Render `text` as a Word document.
///
/// Layout is: optional logo, an empty paragraph, the title as a level-1
/// heading, another empty paragraph, then the whole body as one paragraph
/// with line breaks where the text has newlines.
#[instrument(skip_all, fields(chars = text.len(), logo = style.branding.is_some()))]
pub fn render_docx(text: &str, style: &DocumentStyle) -> Result<Vec<u8>> {
    ensure_xml_text(DocumentFormat::Docx, "title", &style.title)?;
    ensure_xml_text(DocumentFormat::Docx, "body", text)?;

    let mut parts = OoxmlParts::new(DocumentFormat::Docx);
    let mut doc_rels = vec![Relationship {
        id: "rId1",
        rel_type: STYLES_REL,
        target: "styles.xml",
    }];

    let mut body = String::new();
    if let Some(logo) = style.branding.as_deref() {
        let info = probe_jpeg(logo).ok_or_else(|| {
            CourseCraftError::render(DocumentFormat::Docx, "branding image is not a readable JPEG")
        })?;
        let height_emu = LOGO_WIDTH_EMU * i64::from(info.height) / i64::from(info.width);
        body.push_str(&logo_paragraph(LOGO_WIDTH_EMU, height_emu));
        parts.default_type("jpeg", "image/jpeg");
        parts.part("word/media/logo.jpeg", logo.to_vec());
        doc_rels.push(Relationship {
            id: LOGO_REL_ID,
            rel_type: IMAGE_REL,
            target: "media/logo.jpeg",
        });
    }

    body.push_str("<w:p/>");
    body.push_str(&format!(
        r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape(&style.title)
    ));
    body.push_str("<w:p/>");
    body.push_str(&body_paragraph(text));

    let document = format!(
        r#"{XML_DECLARATION}<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#
    );

    parts.part(
        "_rels/.rels",
        relationships_xml(&[Relationship {
            id: "rId1",
            rel_type: OFFICE_DOCUMENT_REL,
            target: "word/document.xml",
        }])
        .into_bytes(),
    );
    parts.typed_part("word/document.xml", DOCUMENT_CONTENT_TYPE, document);
    parts.typed_part(
        "word/styles.xml",
        STYLES_CONTENT_TYPE,
        format!("{XML_DECLARATION}{STYLES_XML}"),
    );
    parts.part(
        "word/_rels/document.xml.rels",
        relationships_xml(&doc_rels).into_bytes(),
    );

    parts.finish()
}

/// One paragraph holding the whole body; newlines become `<w:br/>`.
fn body_paragraph(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let mut runs = String::new();
    for (i, line) in normalized.split('\n').enumerate() {
        if i > 0 {
            runs.push_str("<w:br/>");
        }
        if !line.is_empty() {
            runs.push_str(&format!(
                r#"<w:t xml:space="preserve">{}</w:t>"#,
                escape(line)
            ));
        }
    }
    format!("<w:p><w:r>{runs}</w:r></w:p>")
}

fn logo_paragraph(cx: i64, cy: i64) -> String {
    format!(
        r#"<w:p><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="1" name="Logo"/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="logo.jpeg"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{LOGO_REL_ID}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
    )
}
