//! Close-time serialization.
//!
//! Object layout, in writing order:
//!
//! 1. `/Pages` root and the shared resource dictionary, both reserved up front
//!    as objects 1 and 2
//! 2. page attachment file specifications
//! 3. each page followed by its content stream
//! 4. graphics states, fonts, images, templates, spot colors, layers and
//!    document attachments
//! 5. outline, `/Encrypt`, `/Info`, output intents, XMP and the catalog
//!
//! Page `n` is always object `first + 2 * (n - 1)`, which lets links point
//! at pages that are not written yet.

use super::{oriented, Document};
use crate::encryption::Protection;
use crate::error::{Error, Result};
use crate::fonts::encoding::{hex_string, utf8_to_utf16be};
use crate::fonts::widths::{cid_to_gid_map, cid_width_runs, cid_widths_object, simple_widths, to_unicode_cmap};
use crate::fonts::{FontDefinition, FontKind, FontProgram, LoadedFont};
use crate::geometry::Size;
use crate::object::{Dict, Object};
use crate::writer::embedded_files::build_names_tree;
use crate::writer::{compress_data, ColorSpace, PdfWriter, PdfWriterConfig};
use chrono::Utc;
use md5::{Digest, Md5};
use uuid::Uuid;

use super::metadata::fixed;

/// Serialize `doc` into a complete PDF file.
pub(super) fn write_document(doc: &mut Document) -> Result<Vec<u8>> {
    substitute_alias(doc);
    let minor = pdf_minor(doc);
    let config = PdfWriterConfig::default()
        .with_version(format!("1.{}", minor))
        .with_compress(doc.config.compress)
        .with_sort_keys(doc.config.catalog_sort);
    let mut w = PdfWriter::new(config);

    let file_id = file_id(doc);
    if let Some(req) = &doc.protection {
        let owner = if req.owner_password.is_empty() {
            Uuid::new_v4().simple().to_string().into_bytes()
        } else {
            req.owner_password.clone()
        };
        let protection = Protection::new(req.algorithm, req.permissions, &req.user_password, &owner, &file_id)?;
        w.set_protection(protection);
    }

    let pages_obj = w.reserve();
    let resources_obj = w.reserve();

    let mut page_files = Vec::with_capacity(doc.pages.len());
    for page in &doc.pages {
        let mut objs = Vec::with_capacity(page.attachments.len());
        for attachment in &page.attachments {
            objs.push(attachment.file.write(&mut w)?);
        }
        page_files.push(objs);
    }

    let first_page = w.object_count() + 1;
    let page_obj = |n: usize| first_page + 2 * (n.max(1) as u32 - 1);
    write_pages(&mut w, doc, pages_obj, resources_obj, &page_files, minor, page_obj)?;
    write_pages_root(&mut w, doc, pages_obj, page_obj);
    let written = write_resources(&mut w, doc, resources_obj)?;

    let outlines = doc.outline.write(&mut w, page_obj);
    let encrypt = w
        .protection()
        .map(|p| p.encrypt_dict())
        .map(|d| w.put_unencrypted_object(&d));
    let info = w.put_object(&doc.info.to_dict(fixed(Utc::now())));

    let mut intents = Vec::with_capacity(doc.output_intents.len());
    for intent in &doc.output_intents {
        intents.push(Object::reference(intent.write(&mut w)?));
    }
    let metadata = match &doc.xmp {
        Some(packet) => {
            let mut d = Dict::new();
            d.insert("Type".into(), Object::name("Metadata"));
            d.insert("Subtype".into(), Object::name("XML"));
            Some(w.put_stream_object(d, packet, false)?)
        },
        None => None,
    };

    let mut catalog = Dict::new();
    catalog.insert("Type".into(), Object::name("Catalog"));
    catalog.insert("Pages".into(), Object::reference(pages_obj));
    if let Some(action) = doc.zoom.open_action(page_obj(1)) {
        catalog.insert("OpenAction".into(), action);
    }
    if let Some(layout) = doc.layout.page_layout() {
        catalog.insert("PageLayout".into(), Object::name(layout));
    }
    if let Some(lang) = &doc.lang {
        catalog.insert("Lang".into(), Object::text(lang));
    }
    if let Some(root) = outlines {
        catalog.insert("Outlines".into(), Object::reference(root));
        catalog.insert("PageMode".into(), Object::name("UseOutlines"));
    }
    if !written.files.is_empty() {
        catalog.insert(
            "Names".into(),
            Object::dict([("EmbeddedFiles", Object::Dictionary(build_names_tree(&written.files)))]),
        );
    }
    if !doc.layers.is_empty() {
        catalog.insert("OCProperties".into(), doc.layers.oc_properties(&written.layers));
        if doc.layers.open_pane {
            catalog.insert("PageMode".into(), Object::name("UseOC"));
        }
    }
    if !intents.is_empty() {
        catalog.insert("OutputIntents".into(), Object::Array(intents));
    }
    if let Some(n) = metadata {
        catalog.insert("Metadata".into(), Object::reference(n));
    }
    let root = w.put_object(&catalog);

    let mut trailer = Dict::new();
    trailer.insert("Root".into(), Object::reference(root));
    trailer.insert("Info".into(), Object::reference(info));
    trailer.insert(
        "ID".into(),
        Object::Array(vec![Object::String(file_id.clone()), Object::String(file_id)]),
    );
    if let Some(n) = encrypt {
        trailer.insert("Encrypt".into(), Object::reference(n));
    }
    log::debug!("Serialized {} objects", w.object_count());
    w.finish(trailer)
}

/// Object numbers the catalog refers to.
struct WrittenResources {
    files: Vec<u32>,
    layers: Vec<u32>,
}

fn write_pages(
    w: &mut PdfWriter,
    doc: &Document,
    pages_obj: u32,
    resources_obj: u32,
    page_files: &[Vec<u32>],
    minor: u8,
    page_obj: impl Fn(usize) -> u32,
) -> Result<()> {
    let default_size = oriented(doc.default_orientation, doc.default_size_pt);
    let k = doc.surface.k;
    let dest = |id: usize| {
        let target = doc.links.get(id)?;
        let page = target.page.checked_sub(1).and_then(|i| doc.pages.get(i))?;
        Some((page_obj(target.page), page.size_pt.h - target.y * k))
    };

    for (i, page) in doc.pages.iter().enumerate() {
        let n = w.new_obj();
        if n != page_obj(i + 1) {
            return Err(Error::Structural(format!("page {} written as object {}", i + 1, n)));
        }
        let mut d = Dict::new();
        d.insert("Type".into(), Object::name("Page"));
        d.insert("Parent".into(), Object::reference(pages_obj));
        if !same_size(page.size_pt, default_size) {
            d.insert("MediaBox".into(), media_box(page.size_pt));
        }
        for page_box in &page.boxes {
            let r = page_box.rect;
            d.insert(
                page_box.kind.pdf_key().into(),
                Object::reals(&[round2(r.x), round2(r.y), round2(r.x + r.w), round2(r.y + r.h)]),
            );
        }
        d.insert("Resources".into(), Object::reference(resources_obj));

        let mut annots: Vec<Object> = page
            .links
            .iter()
            .filter_map(|link| link.annotation(dest))
            .map(Object::Dictionary)
            .collect();
        let files = page_files.get(i).map(Vec::as_slice).unwrap_or_default();
        annots.extend(page.attachments.iter().zip(files).map(|(a, &fs)| {
            Object::dict([
                ("Type", Object::name("Annot")),
                ("Subtype", Object::name("FileAttachment")),
                (
                    "Rect",
                    Object::reals(&[round2(a.x), round2(a.y), round2(a.x + a.w), round2(a.y - a.h)]),
                ),
                ("Border", Object::integers([0, 0, 0])),
                ("FS", Object::reference(fs)),
            ])
        }));
        if !annots.is_empty() {
            d.insert("Annots".into(), Object::Array(annots));
        }
        if minor > 3 {
            d.insert(
                "Group".into(),
                Object::dict([
                    ("Type", Object::name("Group")),
                    ("S", Object::name("Transparency")),
                    ("CS", Object::name("DeviceRGB")),
                ]),
            );
        }
        d.insert("Contents".into(), Object::reference(n + 1));
        w.put_dict(&d);
        w.end_obj();
        w.put_stream_object(Dict::new(), &page.content, true)?;
    }
    Ok(())
}

fn write_pages_root(w: &mut PdfWriter, doc: &Document, pages_obj: u32, page_obj: impl Fn(usize) -> u32) {
    let kids: Vec<Object> = (1..=doc.pages.len()).map(|n| Object::reference(page_obj(n))).collect();
    let mut d = Dict::new();
    d.insert("Type".into(), Object::name("Pages"));
    d.insert("Kids".into(), Object::Array(kids));
    d.insert("Count".into(), Object::Integer(doc.pages.len() as i64));
    d.insert(
        "MediaBox".into(),
        media_box(oriented(doc.default_orientation, doc.default_size_pt)),
    );
    w.begin_obj(pages_obj);
    w.put_dict(&d);
    w.end_obj();
}

fn write_resources(w: &mut PdfWriter, doc: &Document, resources_obj: u32) -> Result<WrittenResources> {
    let registry = &doc.registry;

    let mut gstates = Dict::new();
    for (i, gs) in registry.ext_gstates().iter().enumerate() {
        let mut d = Dict::new();
        d.insert("Type".into(), Object::name("ExtGState"));
        d.insert("ca".into(), Object::Real(gs.alpha));
        d.insert("CA".into(), Object::Real(gs.alpha));
        d.insert("BM".into(), Object::name(gs.blend.as_pdf_name()));
        gstates.insert(format!("GS{}", i + 1), Object::reference(w.put_object(&d)));
    }

    let mut fonts = Dict::new();
    for font in registry.fonts() {
        let n = put_font(w, font)?;
        fonts.insert(font.resource_name(), Object::reference(n));
    }

    let mut xobjects = Dict::new();
    for image in registry.images() {
        let info = &image.info;
        let smask = match (info.soft_mask_dict(), &info.soft_mask) {
            (Some(d), Some(data)) => Some(w.put_stream_object(d, data, false)?),
            _ => None,
        };
        let palette = if info.color_space == ColorSpace::Indexed && !info.palette.is_empty() {
            Some(w.put_stream_object(Dict::new(), &info.palette, true)?)
        } else {
            None
        };
        let n = w.put_stream_object(info.xobject_dict(palette, smask), &info.data, false)?;
        xobjects.insert(image.resource_name(), Object::reference(n));
    }
    for template in registry.templates() {
        let size = template.size_pt;
        let mut d = Dict::new();
        d.insert("Type".into(), Object::name("XObject"));
        d.insert("Subtype".into(), Object::name("Form"));
        d.insert("BBox".into(), Object::reals(&[0.0, 0.0, round2(size.w), round2(size.h)]));
        d.insert("Resources".into(), Object::reference(resources_obj));
        let n = w.put_stream_object(d, &template.content, true)?;
        xobjects.insert(template.resource_name(), Object::reference(n));
    }

    let mut color_spaces = Dict::new();
    for spot in registry.spot_colors().iter() {
        let n = w.new_obj();
        w.put_value(&spot.color_space());
        w.end_obj();
        color_spaces.insert(spot.resource_name(), Object::reference(n));
    }

    let layers = doc.layers.write(w);
    let mut files = Vec::with_capacity(doc.attachments.len());
    for file in &doc.attachments {
        files.push(file.write(w)?);
    }

    let mut d = Dict::new();
    d.insert(
        "ProcSet".into(),
        Object::Array(
            ["PDF", "Text", "ImageB", "ImageC", "ImageI"]
                .into_iter()
                .map(Object::name)
                .collect(),
        ),
    );
    for (key, entries) in [
        ("Font", fonts),
        ("XObject", xobjects),
        ("ExtGState", gstates),
        ("ColorSpace", color_spaces),
    ] {
        if !entries.is_empty() {
            d.insert(key.into(), Object::Dictionary(entries));
        }
    }
    if !layers.is_empty() {
        d.insert("Properties".into(), doc.layers.properties(&layers));
    }
    w.begin_obj(resources_obj);
    w.put_dict(&d);
    w.end_obj();

    Ok(WrittenResources { files, layers })
}

/// Write every object of `font` and return the number of its font dictionary.
fn put_font(w: &mut PdfWriter, font: &LoadedFont) -> Result<u32> {
    let def = &font.def;
    match def.kind {
        FontKind::Core => {
            let mut d = Dict::new();
            d.insert("Type".into(), Object::name("Font"));
            d.insert("BaseFont".into(), Object::name(def.name.as_str()));
            d.insert("Subtype".into(), Object::name("Type1"));
            if def.name != "Symbol" && def.name != "ZapfDingbats" {
                d.insert("Encoding".into(), Object::name("WinAnsiEncoding"));
            }
            Ok(w.put_object(&d))
        },
        FontKind::TrueType | FontKind::Type1 => put_simple_font(w, font),
        FontKind::Utf8 => put_utf8_font(w, font),
    }
}

fn put_simple_font(w: &mut PdfWriter, font: &LoadedFont) -> Result<u32> {
    let def = &font.def;
    let file = match &font.program {
        FontProgram::TrueType(data) => {
            let mut d = Dict::new();
            d.insert("Length1".into(), Object::Integer(data.len() as i64));
            Some(("FontFile2", w.put_stream_object(d, data, true)?))
        },
        FontProgram::Type1(program) => {
            let mut d = Dict::new();
            d.insert("Length1".into(), Object::Integer(program.size1 as i64));
            d.insert("Length2".into(), Object::Integer(program.size2 as i64));
            Some(("FontFile", w.put_stream_object(d, &program.data, true)?))
        },
        FontProgram::None => None,
    };
    let descriptor = w.put_object(&font_descriptor(def, &def.name, file));

    let encoding = if def.diff.is_empty() {
        Object::name("WinAnsiEncoding")
    } else {
        let mut d = Dict::new();
        d.insert("Type".into(), Object::name("Encoding"));
        d.insert("BaseEncoding".into(), Object::name("WinAnsiEncoding"));
        d.insert("Differences".into(), differences_array(&def.diff));
        Object::reference(w.put_object(&d))
    };

    let subtype = if def.kind == FontKind::Type1 { "Type1" } else { "TrueType" };
    let mut d = Dict::new();
    d.insert("Type".into(), Object::name("Font"));
    d.insert("BaseFont".into(), Object::name(def.name.as_str()));
    d.insert("Subtype".into(), Object::name(subtype));
    d.insert("FirstChar".into(), Object::Integer(32));
    d.insert("LastChar".into(), Object::Integer(255));
    d.insert("Widths".into(), simple_widths(&def.widths));
    d.insert("FontDescriptor".into(), Object::reference(descriptor));
    d.insert("Encoding".into(), encoding);
    Ok(w.put_object(&d))
}

fn put_utf8_font(w: &mut PdfWriter, font: &LoadedFont) -> Result<u32> {
    let def = &font.def;
    let ttf = font
        .ttf
        .as_ref()
        .ok_or_else(|| Error::Font(format!("UTF-8 font {} has no font program", def.name)))?;
    let subset = font.used.subset(ttf)?;
    log::debug!(
        "Subset {}: {} runes, {} -> {} bytes",
        def.name,
        font.used.len(),
        ttf.raw_data().len(),
        subset.data.len()
    );
    let name = format!("{}+{}", subset.tag, def.name);

    let mut d = Dict::new();
    d.insert("Length1".into(), Object::Integer(subset.data.len() as i64));
    d.insert("Filter".into(), Object::name("FlateDecode"));
    let font_file = w.put_stream_object(d, &compress_data(&subset.data)?, false)?;

    let mut d = Dict::new();
    d.insert("Filter".into(), Object::name("FlateDecode"));
    let cid_map = w.put_stream_object(d, &compress_data(&cid_to_gid_map(&subset.cid_to_gid))?, false)?;

    let runes: Vec<u32> = font.used.used_runes().iter().copied().filter(|&r| r != 0).collect();
    let cmap = to_unicode_cmap(runes.iter().copied());
    let to_unicode = w.put_stream_object(Dict::new(), cmap.as_bytes(), true)?;

    let descriptor = w.put_object(&font_descriptor(def, &name, Some(("FontFile2", font_file))));

    let missing = def.desc.missing_width.max(0) as u32;
    let widths: Vec<(u32, u32)> = runes
        .iter()
        .map(|&r| (r, ttf.char_width(r).map(u32::from).unwrap_or(missing)))
        .collect();
    let mut d = Dict::new();
    d.insert("Type".into(), Object::name("Font"));
    d.insert("Subtype".into(), Object::name("CIDFontType2"));
    d.insert("BaseFont".into(), Object::name(name.as_str()));
    d.insert(
        "CIDSystemInfo".into(),
        Object::dict([
            ("Registry", Object::text("Adobe")),
            ("Ordering", Object::text("UCS")),
            ("Supplement", Object::Integer(0)),
        ]),
    );
    d.insert("FontDescriptor".into(), Object::reference(descriptor));
    d.insert("W".into(), cid_widths_object(&cid_width_runs(&widths)));
    d.insert("DW".into(), Object::Integer(missing as i64));
    d.insert("CIDToGIDMap".into(), Object::reference(cid_map));
    let cid_font = w.put_object(&d);

    let mut d = Dict::new();
    d.insert("Type".into(), Object::name("Font"));
    d.insert("Subtype".into(), Object::name("Type0"));
    d.insert("BaseFont".into(), Object::name(name.as_str()));
    d.insert("Encoding".into(), Object::name("Identity-H"));
    d.insert("DescendantFonts".into(), Object::Array(vec![Object::reference(cid_font)]));
    d.insert("ToUnicode".into(), Object::reference(to_unicode));
    Ok(w.put_object(&d))
}

fn font_descriptor(def: &FontDefinition, name: &str, file: Option<(&str, u32)>) -> Dict {
    let desc = &def.desc;
    let bbox = desc.font_bbox;
    let mut d = Dict::new();
    d.insert("Type".into(), Object::name("FontDescriptor"));
    d.insert("FontName".into(), Object::name(name));
    d.insert("Flags".into(), Object::Integer(desc.flags as i64));
    d.insert(
        "FontBBox".into(),
        Object::integers([bbox.xmin, bbox.ymin, bbox.xmax, bbox.ymax].map(i64::from)),
    );
    d.insert("ItalicAngle".into(), Object::Integer(desc.italic_angle as i64));
    d.insert("Ascent".into(), Object::Integer(desc.ascent as i64));
    d.insert("Descent".into(), Object::Integer(desc.descent as i64));
    d.insert("CapHeight".into(), Object::Integer(desc.cap_height as i64));
    d.insert("StemV".into(), Object::Integer(desc.stem_v as i64));
    d.insert("MissingWidth".into(), Object::Integer(desc.missing_width as i64));
    if let Some((key, n)) = file {
        d.insert(key.into(), Object::reference(n));
    }
    d
}

/// `/Differences` array from a definition's `"128 /Euro 130 /quotesinglbase"`
/// style string.
fn differences_array(diff: &str) -> Object {
    Object::Array(
        diff.split_whitespace()
            .filter_map(|token| match token.strip_prefix('/') {
                Some(name) => Some(Object::name(name)),
                None => token.parse::<i64>().ok().map(Object::Integer),
            })
            .collect(),
    )
}

/// Replace the page-count alias in every page, in literal and UTF-16BE hex form.
fn substitute_alias(doc: &mut Document) {
    let Some(alias) = doc.alias_nb_pages.clone() else {
        return;
    };
    let nb = doc.pages.len().to_string();
    let hex_alias = hex_string(&utf8_to_utf16be(&alias, false)).into_bytes();
    let hex_nb = hex_string(&utf8_to_utf16be(&nb, false)).into_bytes();
    let mut hex_used = false;
    for page in doc.pages.iter_mut() {
        page.content = replace_all(&page.content, alias.as_bytes(), nb.as_bytes());
        if find(&page.content, &hex_alias).is_some() {
            hex_used = true;
            page.content = replace_all(&page.content, &hex_alias, &hex_nb);
        }
    }
    if hex_used {
        for font in doc.registry.fonts_mut().filter(|f| f.is_utf8()) {
            font.used.use_text(&nb);
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack.windows(needle.len()).position(|win| win == needle)
}

fn replace_all(data: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut rest = data;
    while let Some(pos) = find(rest, from) {
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(to);
        rest = &rest[pos + from.len()..];
    }
    out.extend_from_slice(rest);
    out
}

/// Lowest 1.x minor version able to carry the document's features.
fn pdf_minor(doc: &Document) -> u8 {
    let mut minor = 3;
    let alpha = !doc.registry.ext_gstates().is_empty()
        || doc.registry.images().any(|i| i.info.soft_mask.is_some());
    if alpha || !doc.output_intents.is_empty() {
        minor = 4;
    }
    if !doc.layers.is_empty() {
        minor = 5;
    }
    if let Some(req) = &doc.protection {
        minor = minor.max(req.algorithm.min_pdf_minor());
    }
    minor
}

/// Trailer `/ID`: an MD5 of the page content for reproducible output,
/// random otherwise.
fn file_id(doc: &Document) -> Vec<u8> {
    if !doc.config.deterministic_id {
        return Uuid::new_v4().as_bytes().to_vec();
    }
    let mut hasher = Md5::new();
    for page in &doc.pages {
        hasher.update(&page.content);
    }
    if let Some(title) = &doc.info.title {
        hasher.update(title.value.as_bytes());
    }
    hasher.finalize().to_vec()
}

fn media_box(size: Size) -> Object {
    Object::reals(&[0.0, 0.0, round2(size.w), round2(size.h)])
}

fn same_size(a: Size, b: Size) -> bool {
    (a.w - b.w).abs() < 0.01 && (a.h - b.h).abs() < 0.01
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::config::DocumentConfig;
    use crate::encryption::{Algorithm, Permissions};

    #[test]
    fn test_replace_all() {
        assert_eq!(replace_all(b"a{nb}b{nb}", b"{nb}", b"12"), b"a12b12".to_vec());
        assert_eq!(replace_all(b"plain", b"{nb}", b"1"), b"plain".to_vec());
        assert_eq!(replace_all(b"x", b"", b"1"), b"x".to_vec());
    }

    #[test]
    fn test_differences_array() {
        assert_eq!(
            differences_array("128 /Euro 130 /quotesinglbase"),
            Object::Array(vec![
                Object::Integer(128),
                Object::name("Euro"),
                Object::Integer(130),
                Object::name("quotesinglbase"),
            ])
        );
    }

    #[test]
    fn test_version_follows_features() {
        let mut doc = Document::new(DocumentConfig::testing());
        doc.add_page();
        assert_eq!(pdf_minor(&doc), 3);
        doc.set_alpha(0.5, "");
        assert_eq!(pdf_minor(&doc), 4);
        doc.add_layer("L", true);
        assert_eq!(pdf_minor(&doc), 5);
        doc.set_protection_with(Algorithm::Aes128, Permissions::PRINT, "", "");
        assert_eq!(pdf_minor(&doc), 6);
    }

    #[test]
    fn test_alias_substitution() {
        let mut doc = Document::new(DocumentConfig::testing());
        doc.alias_nb_pages("");
        doc.add_page();
        doc.out("({nb})");
        doc.add_page();
        substitute_alias(&mut doc);
        let content = String::from_utf8_lossy(&doc.pages[0].content).into_owned();
        assert!(content.contains("(2)\n"));
        assert!(!content.contains("{nb}"));
    }

    #[test]
    fn test_deterministic_file_id() {
        let mut a = Document::new(DocumentConfig::testing());
        a.add_page();
        let mut b = Document::new(DocumentConfig::testing());
        b.add_page();
        assert_eq!(file_id(&a), file_id(&b));
        assert_eq!(file_id(&a).len(), 16);
    }
}
