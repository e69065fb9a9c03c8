//! Serialize a `Deck` to a `.pptx` package.
//!
//! The package is the minimal set of Office Open XML parts PowerPoint and
//! LibreOffice accept: one master, one blank layout, a theme built from the
//! configured colors and fonts, then one part per slide and per image. XML is
//! written by hand; every user-supplied string goes through `xml_escape`.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{error, info};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::deck::{Align, Anchor, Deck, Frame, MediaFormat, MediaId, Paragraph, Picture, Rgb, Shape, Slide, TextBox};
use crate::domain::Theme;
use crate::error::{AppError, EXIT_RENDER};

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

/// First relationship id used for slides in `presentation.xml.rels`.
const FIRST_SLIDE_RID: usize = 6;
const BULLET_MARGIN: i64 = 285_750;

/// Write `deck` to `path`. A partially written file is removed on failure.
pub fn write_pptx(deck: &Deck, theme: &Theme, path: &Path) -> Result<(), AppError> {
    let result = File::create(path)
        .map_err(|e| format!("Failed to create '{}': {e}", path.display()))
        .and_then(|file| {
            let mut out = BufWriter::new(file);
            write_package(deck, theme, &mut out, Utc::now())?;
            out.flush()
                .map_err(|e| format!("Failed to flush '{}': {e}", path.display()))
        });

    match result {
        Ok(()) => {
            info!(
                "Deck written - path={}, slides={}, images={}",
                path.display(),
                deck.slides().len(),
                deck.media_items().len()
            );
            Ok(())
        }
        Err(message) => {
            error!("{message}");
            let _ = std::fs::remove_file(path);
            Err(AppError::new(EXIT_RENDER, message))
        }
    }
}

/// Write the whole package into any seekable sink.
pub fn write_package<W: Write + Seek>(
    deck: &Deck,
    theme: &Theme,
    sink: W,
    created: DateTime<Utc>,
) -> Result<W, String> {
    let mut zip = zip::ZipWriter::new(sink);

    add_part(&mut zip, "[Content_Types].xml", content_types(deck).as_bytes())?;
    add_part(&mut zip, "_rels/.rels", ROOT_RELS.as_bytes())?;
    add_part(&mut zip, "docProps/core.xml", core_props(deck, created).as_bytes())?;
    add_part(&mut zip, "docProps/app.xml", app_props(deck).as_bytes())?;
    add_part(&mut zip, "ppt/presentation.xml", presentation(deck).as_bytes())?;
    add_part(&mut zip, "ppt/_rels/presentation.xml.rels", presentation_rels(deck).as_bytes())?;
    add_part(&mut zip, "ppt/presProps.xml", PRES_PROPS.as_bytes())?;
    add_part(&mut zip, "ppt/viewProps.xml", VIEW_PROPS.as_bytes())?;
    add_part(&mut zip, "ppt/tableStyles.xml", TABLE_STYLES.as_bytes())?;
    add_part(&mut zip, "ppt/slideMasters/slideMaster1.xml", slide_master(theme).as_bytes())?;
    add_part(&mut zip, "ppt/slideMasters/_rels/slideMaster1.xml.rels", SLIDE_MASTER_RELS.as_bytes())?;
    add_part(&mut zip, "ppt/slideLayouts/slideLayout1.xml", slide_layout().as_bytes())?;
    add_part(&mut zip, "ppt/slideLayouts/_rels/slideLayout1.xml.rels", SLIDE_LAYOUT_RELS.as_bytes())?;
    add_part(&mut zip, "ppt/theme/theme1.xml", theme_xml(theme).as_bytes())?;

    for (idx, slide) in deck.slides().iter().enumerate() {
        let rels = SlideRels::collect(slide);
        let n = idx + 1;
        add_part(&mut zip, &format!("ppt/slides/slide{n}.xml"), slide_xml(slide, &rels).as_bytes())?;
        add_part(&mut zip, &format!("ppt/slides/_rels/slide{n}.xml.rels"), rels.to_xml(deck).as_bytes())?;
    }

    for (idx, media) in deck.media_items().iter().enumerate() {
        add_part(&mut zip, &media_part(idx, media.format), &media.bytes)?;
    }

    zip.finish().map_err(|e| format!("Failed to finish package: {e}"))
}

fn add_part<W: Write + Seek>(zip: &mut zip::ZipWriter<W>, name: &str, bytes: &[u8]) -> Result<(), String> {
    // Fixed timestamp so identical decks produce identical packages.
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());
    zip.start_file(name, options)
        .map_err(|e| format!("Failed to add '{name}' to package: {e}"))?;
    zip.write_all(bytes)
        .map_err(|e| format!("Failed to write '{name}': {e}"))
}

fn media_part(idx: usize, format: MediaFormat) -> String {
    format!("ppt/media/image{}.{}", idx + 1, format.extension())
}

/* -------------------------------------------------------------------------- */
/* Package-level parts                                                        */
/* -------------------------------------------------------------------------- */

fn content_types(deck: &Deck) -> String {
    let mut out = String::from(XML_DECL);
    out.push_str("<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">");
    out.push_str("<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>");
    out.push_str("<Default Extension=\"xml\" ContentType=\"application/xml\"/>");

    let mut formats: Vec<MediaFormat> = Vec::new();
    for media in deck.media_items() {
        if !formats.contains(&media.format) {
            formats.push(media.format);
        }
    }
    for format in formats {
        let _ = write!(
            out,
            "<Default Extension=\"{}\" ContentType=\"{}\"/>",
            format.extension(),
            format.content_type()
        );
    }

    let overrides = [
        ("/ppt/presentation.xml", "presentationml.presentation.main+xml"),
        ("/ppt/slideMasters/slideMaster1.xml", "presentationml.slideMaster+xml"),
        ("/ppt/slideLayouts/slideLayout1.xml", "presentationml.slideLayout+xml"),
        ("/ppt/theme/theme1.xml", "theme+xml"),
        ("/ppt/presProps.xml", "presentationml.presProps+xml"),
        ("/ppt/viewProps.xml", "presentationml.viewProps+xml"),
        ("/ppt/tableStyles.xml", "presentationml.tableStyles+xml"),
        ("/docProps/app.xml", "extended-properties+xml"),
    ];
    for (part, kind) in overrides {
        let _ = write!(
            out,
            "<Override PartName=\"{part}\" ContentType=\"application/vnd.openxmlformats-officedocument.{kind}\"/>"
        );
    }
    out.push_str("<Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>");
    for n in 1..=deck.slides().len() {
        let _ = write!(
            out,
            "<Override PartName=\"/ppt/slides/slide{n}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>"
        );
    }
    out.push_str("</Types>");
    out
}

const ROOT_RELS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"ppt/presentation.xml\"/>",
    "<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>",
    "<Relationship Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties\" Target=\"docProps/app.xml\"/>",
    "</Relationships>"
);

fn core_props(deck: &Deck, created: DateTime<Utc>) -> String {
    let stamp = created.to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        "{XML_DECL}<cp:coreProperties \
         xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" \
         xmlns:dcterms=\"http://purl.org/dc/terms/\" \
         xmlns:dcmitype=\"http://purl.org/dc/dcmitype/\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
         <dc:title>{title}</dc:title>\
         <dc:creator>media-deck</dc:creator>\
         <cp:lastModifiedBy>media-deck</cp:lastModifiedBy>\
         <cp:revision>1</cp:revision>\
         <dcterms:created xsi:type=\"dcterms:W3CDTF\">{stamp}</dcterms:created>\
         <dcterms:modified xsi:type=\"dcterms:W3CDTF\">{stamp}</dcterms:modified>\
         </cp:coreProperties>",
        title = xml_escape(&deck.title),
    )
}

fn app_props(deck: &Deck) -> String {
    format!(
        "{XML_DECL}<Properties \
         xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\" \
         xmlns:vt=\"http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes\">\
         <Application>media-deck</Application>\
         <PresentationFormat>On-screen Show (4:3)</PresentationFormat>\
         <Slides>{}</Slides>\
         </Properties>",
        deck.slides().len()
    )
}

fn presentation(deck: &Deck) -> String {
    let mut out = String::from(XML_DECL);
    let _ = write!(
        out,
        "<p:presentation xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\" saveSubsetFonts=\"1\">"
    );
    out.push_str("<p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>");
    out.push_str("<p:sldIdLst>");
    for idx in 0..deck.slides().len() {
        let _ = write!(
            out,
            "<p:sldId id=\"{}\" r:id=\"rId{}\"/>",
            256 + idx,
            FIRST_SLIDE_RID + idx
        );
    }
    out.push_str("</p:sldIdLst>");
    let size_type = if deck.width * 3 == deck.height * 4 { " type=\"screen4x3\"" } else { "" };
    let _ = write!(
        out,
        "<p:sldSz cx=\"{}\" cy=\"{}\"{size_type}/><p:notesSz cx=\"6858000\" cy=\"9144000\"/>",
        deck.width, deck.height
    );
    out.push_str("</p:presentation>");
    out
}

fn presentation_rels(deck: &Deck) -> String {
    let mut out = String::from(XML_DECL);
    let _ = write!(out, "<Relationships xmlns=\"{NS_RELS}\">");
    let fixed = [
        ("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
        ("rId2", "presProps", "presProps.xml"),
        ("rId3", "viewProps", "viewProps.xml"),
        ("rId4", "theme", "theme/theme1.xml"),
        ("rId5", "tableStyles", "tableStyles.xml"),
    ];
    for (id, kind, target) in fixed {
        let _ = write!(out, "<Relationship Id=\"{id}\" Type=\"{REL}/{kind}\" Target=\"{target}\"/>");
    }
    for idx in 0..deck.slides().len() {
        let _ = write!(
            out,
            "<Relationship Id=\"rId{}\" Type=\"{REL}/slide\" Target=\"slides/slide{}.xml\"/>",
            FIRST_SLIDE_RID + idx,
            idx + 1
        );
    }
    out.push_str("</Relationships>");
    out
}

const PRES_PROPS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    "<p:presentationPr xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" ",
    "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" ",
    "xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\"/>"
);

const VIEW_PROPS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    "<p:viewPr xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" ",
    "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" ",
    "xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\">",
    "<p:gridSpacing cx=\"76200\" cy=\"76200\"/></p:viewPr>"
);

const TABLE_STYLES: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    "<a:tblStyleLst xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" ",
    "def=\"{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}\"/>"
);

const SP_TREE_HEADER: &str = concat!(
    "<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>",
    "<p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/>",
    "<a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>"
);

fn slide_master(theme: &Theme) -> String {
    let mut out = String::from(XML_DECL);
    let _ = write!(out, "<p:sldMaster xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\">");
    let _ = write!(
        out,
        "<p:cSld><p:bg><p:bgRef idx=\"1001\"><a:schemeClr val=\"bg1\"/></p:bgRef></p:bg>\
         <p:spTree>{SP_TREE_HEADER}</p:spTree></p:cSld>"
    );
    out.push_str(
        "<p:clrMap bg1=\"lt1\" tx1=\"dk1\" bg2=\"lt2\" tx2=\"dk2\" accent1=\"accent1\" accent2=\"accent2\" \
         accent3=\"accent3\" accent4=\"accent4\" accent5=\"accent5\" accent6=\"accent6\" hlink=\"hlink\" folHlink=\"folHlink\"/>",
    );
    out.push_str("<p:sldLayoutIdLst><p:sldLayoutId id=\"2147483649\" r:id=\"rId1\"/></p:sldLayoutIdLst>");
    let level = |size: f32, face: &str| {
        format!(
            "<a:lvl1pPr><a:defRPr sz=\"{}\"><a:latin typeface=\"{face}\"/></a:defRPr></a:lvl1pPr>",
            hundredths(size)
        )
    };
    let _ = write!(
        out,
        "<p:txStyles><p:titleStyle>{}</p:titleStyle><p:bodyStyle>{}</p:bodyStyle><p:otherStyle>{}</p:otherStyle></p:txStyles>",
        level(theme.title_size, "+mj-lt"),
        level(theme.body_size, "+mn-lt"),
        level(theme.caption_size, "+mn-lt"),
    );
    out.push_str("</p:sldMaster>");
    out
}

fn slide_layout() -> String {
    format!(
        "{XML_DECL}<p:sldLayout xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\" type=\"blank\" preserve=\"1\">\
         <p:cSld name=\"Blank\"><p:spTree>{SP_TREE_HEADER}</p:spTree></p:cSld>\
         <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"
    )
}

const SLIDE_MASTER_RELS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout\" Target=\"../slideLayouts/slideLayout1.xml\"/>",
    "<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme\" Target=\"../theme/theme1.xml\"/>",
    "</Relationships>"
);

const SLIDE_LAYOUT_RELS: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster\" Target=\"../slideMasters/slideMaster1.xml\"/>",
    "</Relationships>"
);

fn theme_xml(t: &Theme) -> String {
    let clr = |name: &str, rgb: Rgb| format!("<a:{name}><a:srgbClr val=\"{}\"/></a:{name}>", rgb.hex());
    let font = |name: &str, face: &str| {
        format!(
            "<a:{name}><a:latin typeface=\"{}\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:{name}>",
            xml_escape(face)
        )
    };
    let solid = "<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>";

    let mut out = String::from(XML_DECL);
    let _ = write!(out, "<a:theme xmlns:a=\"{NS_A}\" name=\"Deck Theme\"><a:themeElements>");
    out.push_str("<a:clrScheme name=\"Deck\">");
    out.push_str(&clr("dk1", Rgb::new(0, 0, 0)));
    out.push_str(&clr("lt1", Rgb::WHITE));
    out.push_str(&clr("dk2", t.primary_color));
    out.push_str(&clr("lt2", Rgb::new(0xE7, 0xE6, 0xE6)));
    out.push_str(&clr("accent1", t.primary_color));
    out.push_str(&clr("accent2", t.accent_color));
    out.push_str(&clr("accent3", t.secondary_color));
    out.push_str(&clr("accent4", Rgb::new(0xFF, 0xC0, 0x00)));
    out.push_str(&clr("accent5", Rgb::new(0x70, 0xAD, 0x47)));
    out.push_str(&clr("accent6", Rgb::new(0xED, 0x7D, 0x31)));
    out.push_str(&clr("hlink", t.accent_color));
    out.push_str(&clr("folHlink", t.secondary_color));
    out.push_str("</a:clrScheme>");

    out.push_str("<a:fontScheme name=\"Deck\">");
    out.push_str(&font("majorFont", &t.title_font));
    out.push_str(&font("minorFont", &t.body_font));
    out.push_str("</a:fontScheme>");

    out.push_str("<a:fmtScheme name=\"Deck\"><a:fillStyleLst>");
    for _ in 0..3 {
        out.push_str(solid);
    }
    out.push_str("</a:fillStyleLst><a:lnStyleLst>");
    for w in [6350, 12700, 19050] {
        let _ = write!(out, "<a:ln w=\"{w}\">{solid}</a:ln>");
    }
    out.push_str("</a:lnStyleLst><a:effectStyleLst>");
    for _ in 0..3 {
        out.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    out.push_str("</a:effectStyleLst><a:bgFillStyleLst>");
    for _ in 0..3 {
        out.push_str(solid);
    }
    out.push_str("</a:bgFillStyleLst></a:fmtScheme>");
    out.push_str("</a:themeElements></a:theme>");
    out
}

/* -------------------------------------------------------------------------- */
/* Slides                                                                     */
/* -------------------------------------------------------------------------- */

/// Relationship ids for one slide: `rId1` is the layout, then images, then
/// hyperlinks.
struct SlideRels {
    media: Vec<MediaId>,
    links: Vec<String>,
}

impl SlideRels {
    fn collect(slide: &Slide) -> Self {
        let mut media = Vec::new();
        for pic in slide.pictures() {
            if !media.contains(&pic.media) {
                media.push(pic.media);
            }
        }
        let links = slide.links().into_iter().map(str::to_string).collect();
        Self { media, links }
    }

    fn media_rid(&self, id: MediaId) -> Option<String> {
        self.media.iter().position(|m| *m == id).map(|i| format!("rId{}", i + 2))
    }

    fn link_rid(&self, link: &str) -> Option<String> {
        self.links
            .iter()
            .position(|l| l == link)
            .map(|i| format!("rId{}", i + 2 + self.media.len()))
    }

    fn to_xml(&self, deck: &Deck) -> String {
        let mut out = String::from(XML_DECL);
        let _ = write!(out, "<Relationships xmlns=\"{NS_RELS}\">");
        let _ = write!(
            out,
            "<Relationship Id=\"rId1\" Type=\"{REL}/slideLayout\" Target=\"../slideLayouts/slideLayout1.xml\"/>"
        );
        for (i, id) in self.media.iter().enumerate() {
            let format = deck.media(*id).map(|m| m.format).unwrap_or(MediaFormat::Png);
            let target = media_part(id.0, format);
            let _ = write!(
                out,
                "<Relationship Id=\"rId{}\" Type=\"{REL}/image\" Target=\"../{}\"/>",
                i + 2,
                target.trim_start_matches("ppt/")
            );
        }
        for (i, link) in self.links.iter().enumerate() {
            let _ = write!(
                out,
                "<Relationship Id=\"rId{}\" Type=\"{REL}/hyperlink\" Target=\"{}\" TargetMode=\"External\"/>",
                i + 2 + self.media.len(),
                xml_escape(link)
            );
        }
        out.push_str("</Relationships>");
        out
    }
}

fn slide_xml(slide: &Slide, rels: &SlideRels) -> String {
    let mut out = String::from(XML_DECL);
    let _ = write!(out, "<p:sld xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\"><p:cSld>");
    out.push_str("<p:spTree>");
    out.push_str(SP_TREE_HEADER);

    for (idx, shape) in slide.shapes.iter().enumerate() {
        // id 1 is the group itself.
        let id = idx + 2;
        match shape {
            Shape::Rect { name, frame, fill } => {
                let _ = write!(
                    out,
                    "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"{}\"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>\
                     <p:spPr>{}<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom>{}<a:ln><a:noFill/></a:ln></p:spPr></p:sp>",
                    xml_escape(name),
                    xfrm(frame),
                    solid_fill(*fill)
                );
            }
            Shape::Text(tb) => write_text_box(&mut out, id, tb, rels),
            Shape::Picture(pic) => write_picture(&mut out, id, pic, rels),
        }
    }

    out.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
    out
}

fn xfrm(frame: &Frame) -> String {
    format!(
        "<a:xfrm><a:off x=\"{}\" y=\"{}\"/><a:ext cx=\"{}\" cy=\"{}\"/></a:xfrm>",
        frame.x, frame.y, frame.cx, frame.cy
    )
}

fn solid_fill(rgb: Rgb) -> String {
    format!("<a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill>", rgb.hex())
}

fn write_text_box(out: &mut String, id: usize, tb: &TextBox, rels: &SlideRels) {
    let fill = tb.fill.map(solid_fill).unwrap_or_else(|| "<a:noFill/>".to_string());
    let anchor = match tb.anchor {
        Anchor::Top => "t",
        Anchor::Middle => "ctr",
        Anchor::Bottom => "b",
    };
    let _ = write!(
        out,
        "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"{}\"/><p:cNvSpPr txBox=\"1\"/><p:nvPr/></p:nvSpPr>\
         <p:spPr>{}<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom>{fill}</p:spPr>\
         <p:txBody><a:bodyPr wrap=\"square\" lIns=\"91440\" tIns=\"45720\" rIns=\"91440\" bIns=\"45720\" anchor=\"{anchor}\">\
         <a:normAutofit/></a:bodyPr><a:lstStyle/>",
        xml_escape(&tb.name),
        xfrm(&tb.frame)
    );
    if tb.paragraphs.is_empty() {
        out.push_str("<a:p/>");
    }
    for p in &tb.paragraphs {
        write_paragraph(out, p, rels);
    }
    out.push_str("</p:txBody></p:sp>");
}

fn write_paragraph(out: &mut String, p: &Paragraph, rels: &SlideRels) {
    let algn = match p.align {
        Align::Left => "l",
        Align::Center => "ctr",
        Align::Right => "r",
    };
    let (mar_l, indent) = if p.bullet {
        (BULLET_MARGIN, -BULLET_MARGIN)
    } else if p.indented {
        (BULLET_MARGIN, 0)
    } else {
        (0, 0)
    };
    let _ = write!(out, "<a:p><a:pPr algn=\"{algn}\" marL=\"{mar_l}\" indent=\"{indent}\">");
    if p.space_before > 0.0 {
        let _ = write!(
            out,
            "<a:spcBef><a:spcPts val=\"{}\"/></a:spcBef>",
            hundredths(p.space_before)
        );
    }
    if p.bullet {
        out.push_str("<a:buFont typeface=\"Arial\"/><a:buChar char=\"&#8226;\"/>");
    } else {
        out.push_str("<a:buNone/>");
    }
    out.push_str("</a:pPr>");

    for run in &p.runs {
        let _ = write!(out, "<a:r><a:rPr lang=\"en-US\" sz=\"{}\"", hundredths(run.size));
        if run.bold {
            out.push_str(" b=\"1\"");
        }
        if run.italic {
            out.push_str(" i=\"1\"");
        }
        out.push_str(" dirty=\"0\">");
        if let Some(color) = run.color {
            out.push_str(&solid_fill(color));
        }
        if let Some(font) = &run.font {
            let _ = write!(out, "<a:latin typeface=\"{}\"/>", xml_escape(font));
        }
        if let Some(rid) = run.link.as_deref().and_then(|l| rels.link_rid(l)) {
            let _ = write!(out, "<a:hlinkClick r:id=\"{rid}\"/>");
        }
        let _ = write!(out, "</a:rPr><a:t>{}</a:t></a:r>", xml_escape(&run.text));
    }
    out.push_str("</a:p>");
}

fn write_picture(out: &mut String, id: usize, pic: &Picture, rels: &SlideRels) {
    let Some(rid) = rels.media_rid(pic.media) else {
        return;
    };
    let _ = write!(
        out,
        "<p:pic><p:nvPicPr><p:cNvPr id=\"{id}\" name=\"{}\" descr=\"{}\"/>\
         <p:cNvPicPr><a:picLocks noChangeAspect=\"1\"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>\
         <p:blipFill><a:blip r:embed=\"{rid}\"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>\
         <p:spPr>{}<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></p:spPr></p:pic>",
        xml_escape(&pic.name),
        xml_escape(&pic.description),
        xfrm(&pic.frame)
    );
}

/// Points to the hundredths DrawingML uses for sizes and spacing.
fn hundredths(points: f32) -> i64 {
    (points * 100.0).round() as i64
}

/// Escape text for element content and attribute values. Characters XML 1.0
/// cannot carry at all are dropped.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}
