//! Slide deck (`.pptx`) rendering from `Title: body` blocks.

use coursecraft_shared::{CourseCraftError, DocumentFormat, Result};
use tracing::{debug, instrument, warn};

use crate::ooxml::{
    OoxmlParts, Relationship, XML_DECLARATION, ensure_xml_text, escape, relationships_xml,
};

const PRESENTATION_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const MASTER_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const LAYOUT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const SLIDE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const THEME_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const NAMESPACES: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const SLIDE_WIDTH: i64 = 9_144_000;
const SLIDE_HEIGHT: i64 = 6_858_000;

/// Body text size in hundredths of a point.
const BODY_FONT_SIZE: u32 = 2000;
const BODY_TYPEFACE: &str = "Calibri (Body)";

/// What to do with a block that has no `:` separating title from body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockPolicy {
    /// Drop the block and count it in [`SlideOutline::skipped`].
    #[default]
    SkipMalformedBlock,
    /// Fail the whole parse with a format error.
    RejectMalformedBlock,
}

/// One content slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideBlock {
    pub title: String,
    pub body: String,
}

/// Parsed slide outline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlideOutline {
    pub slides: Vec<SlideBlock>,
    /// Non-blank blocks dropped for lacking a colon.
    pub skipped: usize,
}

/// Split `content` into slide blocks.
///
/// Blocks are separated by a blank line. Each block is split at its first
/// colon into title and body, both trimmed, so `Ratio: 2:1` has the body
/// `2:1`. Blank blocks are ignored.
pub fn parse_outline(content: &str, policy: BlockPolicy) -> Result<SlideOutline> {
    let normalized = content.replace("\r\n", "\n");
    let mut outline = SlideOutline::default();

    for block in normalized.split("\n\n") {
        if block.trim().is_empty() {
            continue;
        }
        match block.split_once(':') {
            Some((title, body)) => outline.slides.push(SlideBlock {
                title: title.trim().to_string(),
                body: body.trim().to_string(),
            }),
            None => match policy {
                BlockPolicy::SkipMalformedBlock => outline.skipped += 1,
                BlockPolicy::RejectMalformedBlock => {
                    return Err(CourseCraftError::format(format!(
                        "slide block has no title separator: {:?}",
                        block.trim()
                    )));
                }
            },
        }
    }

    Ok(outline)
}

/// Render a deck: a title slide followed by one slide per outline block.
#[instrument(skip_all, fields(chars = content.len()))]
pub fn render_pptx(content: &str, title: &str, subtitle: &str) -> Result<Vec<u8>> {
    ensure_xml_text(DocumentFormat::Pptx, "title", title)?;
    ensure_xml_text(DocumentFormat::Pptx, "subtitle", subtitle)?;
    ensure_xml_text(DocumentFormat::Pptx, "slide content", content)?;

    let outline = parse_outline(content, BlockPolicy::SkipMalformedBlock)?;
    if outline.skipped > 0 {
        warn!(skipped = outline.skipped, "dropped slide blocks without a title");
    }
    debug!(slides = outline.slides.len(), "slide outline parsed");

    let mut parts = OoxmlParts::new(DocumentFormat::Pptx);

    parts.part(
        "_rels/.rels",
        relationships_xml(&[Relationship {
            id: "rId1",
            rel_type: &format!("{REL_BASE}/officeDocument"),
            target: "ppt/presentation.xml",
        }])
        .into_bytes(),
    );

    let mut slides = vec![title_slide_xml(title, subtitle)];
    slides.extend(outline.slides.iter().map(content_slide_xml));

    parts.typed_part(
        "ppt/presentation.xml",
        PRESENTATION_CONTENT_TYPE,
        presentation_xml(slides.len()),
    );
    parts.part(
        "ppt/_rels/presentation.xml.rels",
        presentation_rels_xml(slides.len()).into_bytes(),
    );

    parts.typed_part(
        "ppt/slideMasters/slideMaster1.xml",
        MASTER_CONTENT_TYPE,
        slide_master_xml(),
    );
    let layout_rel = format!("{REL_BASE}/slideLayout");
    let theme_rel = format!("{REL_BASE}/theme");
    parts.part(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        relationships_xml(&[
            Relationship {
                id: "rId1",
                rel_type: &layout_rel,
                target: "../slideLayouts/slideLayout1.xml",
            },
            Relationship {
                id: "rId2",
                rel_type: &layout_rel,
                target: "../slideLayouts/slideLayout2.xml",
            },
            Relationship {
                id: "rId3",
                rel_type: &theme_rel,
                target: "../theme/theme1.xml",
            },
        ])
        .into_bytes(),
    );

    let master_rel = format!("{REL_BASE}/slideMaster");
    for (index, layout) in [title_layout_xml(), content_layout_xml()].into_iter().enumerate() {
        let n = index + 1;
        parts.typed_part(
            &format!("ppt/slideLayouts/slideLayout{n}.xml"),
            LAYOUT_CONTENT_TYPE,
            layout,
        );
        parts.part(
            &format!("ppt/slideLayouts/_rels/slideLayout{n}.xml.rels"),
            relationships_xml(&[Relationship {
                id: "rId1",
                rel_type: &master_rel,
                target: "../slideMasters/slideMaster1.xml",
            }])
            .into_bytes(),
        );
    }

    parts.typed_part("ppt/theme/theme1.xml", THEME_CONTENT_TYPE, theme_xml());

    for (index, slide) in slides.into_iter().enumerate() {
        let n = index + 1;
        let layout = if index == 0 {
            "../slideLayouts/slideLayout1.xml"
        } else {
            "../slideLayouts/slideLayout2.xml"
        };
        parts.typed_part(&format!("ppt/slides/slide{n}.xml"), SLIDE_CONTENT_TYPE, slide);
        parts.part(
            &format!("ppt/slides/_rels/slide{n}.xml.rels"),
            relationships_xml(&[Relationship {
                id: "rId1",
                rel_type: &layout_rel,
                target: layout,
            }])
            .into_bytes(),
        );
    }

    parts.finish()
}

// ---------------------------------------------------------------------------
// Package parts
// ---------------------------------------------------------------------------

fn presentation_xml(slide_count: usize) -> String {
    let slide_ids: String = (0..slide_count)
        .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 3))
        .collect();
    format!(
        r#"{XML_DECLARATION}<p:presentation {NAMESPACES} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{slide_ids}</p:sldIdLst><p:sldSz cx="{SLIDE_WIDTH}" cy="{SLIDE_HEIGHT}" type="screen4x3"/><p:notesSz cx="{SLIDE_HEIGHT}" cy="{SLIDE_WIDTH}"/></p:presentation>"#
    )
}

fn presentation_rels_xml(slide_count: usize) -> String {
    let master = format!("{REL_BASE}/slideMaster");
    let theme = format!("{REL_BASE}/theme");
    let slide = format!("{REL_BASE}/slide");
    let ids: Vec<String> = (0..slide_count).map(|i| format!("rId{}", i + 3)).collect();
    let targets: Vec<String> = (0..slide_count)
        .map(|i| format!("slides/slide{}.xml", i + 1))
        .collect();

    let mut rels = vec![
        Relationship {
            id: "rId1",
            rel_type: &master,
            target: "slideMasters/slideMaster1.xml",
        },
        Relationship {
            id: "rId2",
            rel_type: &theme,
            target: "theme/theme1.xml",
        },
    ];
    rels.extend(ids.iter().zip(&targets).map(|(id, target)| Relationship {
        id,
        rel_type: &slide,
        target,
    }));
    relationships_xml(&rels)
}

/// Placeholder shape. `xfrm` is given explicitly so slides render without
/// inheriting positions.
fn placeholder(id: u32, name: &str, ph: &str, (x, y, cx, cy): (i64, i64, i64, i64), body: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{ph}</p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/>{body}</p:txBody></p:sp>"#
    )
}

fn shape_tree(shapes: &str) -> String {
    format!(
        r#"<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>{shapes}</p:spTree></p:cSld>"#
    )
}

const TITLE_BOX: (i64, i64, i64, i64) = (685_800, 2_130_425, 7_772_400, 1_470_025);
const SUBTITLE_BOX: (i64, i64, i64, i64) = (1_371_600, 3_886_200, 6_400_800, 1_752_600);
const HEADING_BOX: (i64, i64, i64, i64) = (457_200, 274_638, 8_229_600, 1_143_000);
const BODY_BOX: (i64, i64, i64, i64) = (457_200, 1_600_200, 8_229_600, 4_525_963);

fn simple_paragraph(text: &str) -> String {
    if text.is_empty() {
        return "<a:p/>".to_string();
    }
    format!(r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#, escape(text))
}

fn body_paragraphs(body: &str) -> String {
    let lines: Vec<&str> = body.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return "<a:p/>".to_string();
    }
    lines
        .into_iter()
        .map(|line| {
            format!(
                r#"<a:p><a:pPr algn="l"/><a:r><a:rPr lang="en-US" sz="{BODY_FONT_SIZE}" dirty="0"><a:latin typeface="{BODY_TYPEFACE}"/></a:rPr><a:t>{}</a:t></a:r></a:p>"#,
                escape(line)
            )
        })
        .collect()
}

fn slide_xml(shapes: &str) -> String {
    format!(
        r#"{XML_DECLARATION}<p:sld {NAMESPACES}>{}<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        shape_tree(shapes)
    )
}

fn title_slide_xml(title: &str, subtitle: &str) -> String {
    let shapes = placeholder(2, "Title 1", r#"<p:ph type="ctrTitle"/>"#, TITLE_BOX, &simple_paragraph(title))
        + &placeholder(3, "Subtitle 2", r#"<p:ph type="subTitle" idx="1"/>"#, SUBTITLE_BOX, &simple_paragraph(subtitle));
    slide_xml(&shapes)
}

fn content_slide_xml(block: &SlideBlock) -> String {
    let shapes = placeholder(2, "Title 1", r#"<p:ph type="title"/>"#, HEADING_BOX, &simple_paragraph(&block.title))
        + &placeholder(3, "Content Placeholder 2", r#"<p:ph idx="1"/>"#, BODY_BOX, &body_paragraphs(&block.body));
    slide_xml(&shapes)
}

fn title_layout_xml() -> String {
    let shapes = placeholder(2, "Title 1", r#"<p:ph type="ctrTitle"/>"#, TITLE_BOX, "<a:p/>")
        + &placeholder(3, "Subtitle 2", r#"<p:ph type="subTitle" idx="1"/>"#, SUBTITLE_BOX, "<a:p/>");
    format!(
        r#"{XML_DECLARATION}<p:sldLayout {NAMESPACES} type="title" preserve="1">{}<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        shape_tree(&shapes).replacen("<p:cSld>", r#"<p:cSld name="Title Slide">"#, 1)
    )
}

fn content_layout_xml() -> String {
    let shapes = placeholder(2, "Title 1", r#"<p:ph type="title"/>"#, HEADING_BOX, "<a:p/>")
        + &placeholder(3, "Content Placeholder 2", r#"<p:ph idx="1"/>"#, BODY_BOX, "<a:p/>");
    format!(
        r#"{XML_DECLARATION}<p:sldLayout {NAMESPACES} type="obj" preserve="1">{}<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        shape_tree(&shapes).replacen("<p:cSld>", r#"<p:cSld name="Title and Content">"#, 1)
    )
}

fn slide_master_xml() -> String {
    let shapes = placeholder(2, "Title Placeholder 1", r#"<p:ph type="title"/>"#, HEADING_BOX, "<a:p/>")
        + &placeholder(3, "Text Placeholder 2", r#"<p:ph type="body" idx="1"/>"#, BODY_BOX, "<a:p/>");
    format!(
        r#"{XML_DECLARATION}<p:sldMaster {NAMESPACES}>{}<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/><p:sldLayoutId id="2147483650" r:id="rId2"/></p:sldLayoutIdLst><p:txStyles><p:titleStyle><a:lvl1pPr algn="ctr"><a:defRPr sz="4400"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/></a:defRPr></a:lvl1pPr></p:titleStyle><p:bodyStyle><a:lvl1pPr marL="0" indent="0"><a:buNone/><a:defRPr sz="{BODY_FONT_SIZE}"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:bodyStyle><p:otherStyle><a:lvl1pPr><a:defRPr><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:otherStyle></p:txStyles></p:sldMaster>"#,
        shape_tree(&shapes)
    )
}

fn theme_xml() -> String {
    let colors = [
        ("dk1", r#"<a:sysClr val="windowText" lastClr="000000"/>"#),
        ("lt1", r#"<a:sysClr val="window" lastClr="FFFFFF"/>"#),
        ("dk2", r#"<a:srgbClr val="1F497D"/>"#),
        ("lt2", r#"<a:srgbClr val="EEECE1"/>"#),
        ("accent1", r#"<a:srgbClr val="4F81BD"/>"#),
        ("accent2", r#"<a:srgbClr val="C0504D"/>"#),
        ("accent3", r#"<a:srgbClr val="9BBB59"/>"#),
        ("accent4", r#"<a:srgbClr val="8064A2"/>"#),
        ("accent5", r#"<a:srgbClr val="4BACC6"/>"#),
        ("accent6", r#"<a:srgbClr val="F79646"/>"#),
        ("hlink", r#"<a:srgbClr val="0000FF"/>"#),
        ("folHlink", r#"<a:srgbClr val="800080"/>"#),
    ];
    let color_scheme: String = colors
        .iter()
        .map(|(slot, value)| format!("<a:{slot}>{value}</a:{slot}>"))
        .collect();

    let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = format!(r#"<a:ln w="9525">{solid}</a:ln>"#);
    let fills = solid.repeat(3);
    let lines = line.repeat(3);
    let effects = "<a:effectStyle><a:effectLst/></a:effectStyle>".repeat(3);

    format!(
        r#"{XML_DECLARATION}<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements><a:clrScheme name="Office">{color_scheme}</a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst>{fills}</a:fillStyleLst><a:lnStyleLst>{lines}</a:lnStyleLst><a:effectStyleLst>{effects}</a:effectStyleLst><a:bgFillStyleLst>{fills}</a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#
    )
}
