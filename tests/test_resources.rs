//! Integration tests for shared resources and document structure: images,
//! spot colors, transparency, links, outlines, layers, templates,
//! attachments and catalog metadata.

mod common;

use common::{count, doc_with_page, text};
use pdf_quill::prelude::*;
use std::io::Cursor;

fn png(alpha: u8) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([200, 20, 20, alpha]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageOutputFormat::Png)
        .unwrap();
    out
}

fn rgb_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 2, image::Rgb([20, 20, 200]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageOutputFormat::Png)
        .unwrap();
    out
}

fn gray_png() -> Vec<u8> {
    let img = image::GrayImage::from_pixel(3, 3, image::Luma([90]));
    let mut out = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageOutputFormat::Png)
        .unwrap();
    out
}

mod image_tests {
    use super::*;

    #[test]
    fn test_opaque_png_is_drawn() {
        let mut doc = doc_with_page();
        let opts = ImageOptions::with_type("png");
        doc.register_image_bytes("logo", &rgb_png(), &opts);
        doc.image("logo", 10.0, 10.0, 40.0, 0.0, false, &opts, None);
        assert!(doc.ok(), "{:?}", doc.error());
        let pdf = doc.output_bytes().unwrap();
        let s = text(&pdf);
        assert!(s.contains("/I1 Do"));
        assert!(s.contains("/Subtype /Image"));
        assert!(!s.contains("/SMask"));
        assert!(pdf.starts_with(b"%PDF-1.3"));
    }

    #[test]
    fn test_alpha_png_gets_soft_mask() {
        let mut doc = doc_with_page();
        let opts = ImageOptions::default();
        doc.register_image_bytes("ghost", &png(100), &opts);
        doc.image("ghost", 10.0, 10.0, 0.0, 0.0, false, &opts, None);
        let pdf = doc.output_bytes().unwrap();
        let s = text(&pdf);
        assert!(s.contains("/SMask"));
        assert!(s.contains("/ColorSpace /DeviceGray"));
        assert!(pdf.starts_with(b"%PDF-1.4"));
    }

    #[test]
    fn test_image_aspect_ratio_kept() {
        let mut doc = doc_with_page();
        let opts = ImageOptions::default();
        doc.register_image_bytes("wide", &png(255), &opts);
        let (w, h) = doc.image_size("wide").unwrap();
        assert!((w / h - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_flow_image_moves_y() {
        let mut doc = doc_with_page();
        let opts = ImageOptions::default();
        doc.register_image_bytes("gray", &gray_png(), &opts);
        let y0 = doc.y();
        doc.image("gray", -1.0, 0.0, 30.0, 30.0, true, &opts, None);
        assert!((doc.y() - y0 - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_image_under_two_names_shares_object() {
        let mut doc = doc_with_page();
        let opts = ImageOptions::default();
        let data = png(255);
        doc.register_image_bytes("a", &data, &opts);
        doc.register_image_bytes("b", &data, &opts);
        doc.image("a", 10.0, 10.0, 10.0, 0.0, false, &opts, None);
        doc.image("b", 30.0, 10.0, 10.0, 0.0, false, &opts, None);
        let s = text(&doc.output_bytes().unwrap());
        assert_eq!(count(&s, "/Subtype /Image"), 1);
        assert_eq!(count(&s, "/I1 Do"), 2);
    }

    #[test]
    fn test_unsupported_image_type() {
        let mut doc = doc_with_page();
        doc.register_image_bytes("x", b"BM not an image", &ImageOptions::with_type("bmp"));
        assert!(matches!(doc.error(), Some(Error::Image(_))));
    }

    #[test]
    fn test_missing_image_file() {
        let mut doc = doc_with_page();
        doc.image("/nonexistent/picture.png", 0.0, 0.0, 10.0, 10.0, false, &ImageOptions::default(), None);
        assert!(matches!(doc.error(), Some(Error::Image(_))));
    }
}

mod color_tests {
    use super::*;

    #[test]
    fn test_spot_color_resources() {
        let mut doc = doc_with_page();
        doc.add_spot_color("PANTONE 145 CVC", 0, 42, 100, 25);
        doc.set_fill_spot_color("PANTONE 145 CVC", 50);
        doc.rect(10.0, 10.0, 20.0, 20.0, "F");
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("/CS1 cs 0.500 scn"));
        assert!(s.contains("/Separation /PANTONE#20145#20CVC /DeviceCMYK"));
        assert!(s.contains("/C1 [0 0.42 1 0.25]"));
    }

    #[test]
    fn test_duplicate_spot_color_keeps_first() {
        let mut doc = doc_with_page();
        doc.add_spot_color("PANTONE 145 CVC", 0, 42, 100, 25);
        doc.add_spot_color("PANTONE 145 CVC", 1, 1, 1, 1);
        assert!(matches!(doc.error(), Some(Error::DuplicateSpotColor(_))));
        let spot = doc.registry().spot_color("PANTONE 145 CVC").unwrap();
        assert_eq!(spot.cmyk, [0, 42, 100, 25]);
    }

    #[test]
    fn test_unknown_spot_color() {
        let mut doc = doc_with_page();
        doc.set_draw_spot_color("nope", 100);
        assert!(matches!(doc.error(), Some(Error::UnknownSpotColor(_))));
    }

    #[test]
    fn test_alpha_adds_ext_gstate() {
        let mut doc = doc_with_page();
        doc.set_alpha(0.4, "Multiply");
        doc.rect(10.0, 10.0, 20.0, 20.0, "F");
        doc.set_alpha(0.4, "Multiply");
        let pdf = doc.output_bytes().unwrap();
        let s = text(&pdf);
        assert_eq!(count(&s, "/GS1 gs"), 2);
        assert!(s.contains("/BM /Multiply"));
        assert!(s.contains("/ca 0.4"));
        assert!(!s.contains("/GS2"));
        assert!(pdf.starts_with(b"%PDF-1.4"));
    }

    #[test]
    fn test_bad_blend_mode() {
        let mut doc = doc_with_page();
        doc.set_alpha(0.5, "Sparkle");
        assert!(matches!(doc.error(), Some(Error::Render(_))));
    }
}

mod navigation_tests {
    use super::*;

    #[test]
    fn test_internal_link_points_at_target_page() {
        let mut doc = doc_with_page();
        doc.set_font("Helvetica", "", 12.0);
        let link = doc.add_link();
        doc.write_linkid(6.0, "go to page 2", link);
        doc.add_page();
        doc.set_link(link, 0.0, None);
        let s = text(&doc.output_bytes().unwrap());
        // page 2 is object 5
        assert!(s.contains("/Dest [5 0 R /XYZ 0 841.89 null]"), "{}", s);
    }

    #[test]
    fn test_unset_link_is_dropped() {
        let mut doc = doc_with_page();
        doc.set_font("Helvetica", "", 12.0);
        let link = doc.add_link();
        doc.write_linkid(6.0, "nowhere", link);
        let s = text(&doc.output_bytes().unwrap());
        assert!(!s.contains("/Subtype /Link"));
    }

    #[test]
    fn test_set_unknown_link_fails() {
        let mut doc = doc_with_page();
        doc.set_link(42, 0.0, None);
        assert!(matches!(doc.error(), Some(Error::Structural(_))));
    }

    #[test]
    fn test_outline_tree() {
        let mut doc = doc_with_page();
        doc.bookmark("Chapter 1", 0, 0.0);
        doc.bookmark("Section 1.1", 1, 20.0);
        doc.add_page();
        doc.bookmark("Chapter 2", 0, 0.0);
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("/Type /Outlines"));
        assert!(s.contains("/PageMode /UseOutlines"));
        assert_eq!(count(&s, "/Title "), 3);
    }

    #[test]
    fn test_display_mode() {
        let mut doc = doc_with_page();
        doc.set_display_mode("fullpage", "single");
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("/OpenAction [3 0 R /Fit]"));
        assert!(s.contains("/PageLayout /SinglePage"));
    }

    #[test]
    fn test_bad_display_mode() {
        let mut doc = doc_with_page();
        doc.set_display_mode("huge", "");
        assert!(matches!(doc.error(), Some(Error::Configuration(_))));
    }
}

mod structure_tests {
    use super::*;

    #[test]
    fn test_layers() {
        let mut doc = doc_with_page();
        let shown = doc.add_layer("Shown", true);
        let hidden = doc.add_layer("Hidden", false);
        doc.begin_layer(shown);
        doc.rect(10.0, 10.0, 10.0, 10.0, "D");
        doc.begin_layer(hidden);
        doc.rect(30.0, 10.0, 10.0, 10.0, "D");
        doc.end_layer();
        doc.open_layer_pane();
        let pdf = doc.output_bytes().unwrap();
        let s = text(&pdf);
        assert!(pdf.starts_with(b"%PDF-1.5"));
        assert_eq!(count(&s, " BDC"), 2);
        assert_eq!(count(&s, "EMC"), 2);
        assert!(s.contains("/OCProperties"));
        assert!(s.contains("/Type /OCG"));
        assert!(s.contains("/OFF ["));
        assert!(s.contains("/PageMode /UseOC"));
    }

    #[test]
    fn test_template_is_form_xobject() {
        let mut doc = doc_with_page();
        let tpl = doc.create_template(Size::new(30.0, 10.0), |t| {
            t.set_font("Helvetica", "", 8.0);
            t.text(1.0, 6.0, "stamp");
        });
        doc.use_template(tpl);
        doc.add_page();
        doc.use_template_scaled(tpl, 20.0, 20.0, 60.0, 20.0);
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("/Subtype /Form"));
        assert!(s.contains("(stamp) Tj"));
        assert_eq!(count(&s, "/TPL1 Do"), 2);
    }

    #[test]
    fn test_attachments() {
        let mut doc = doc_with_page();
        doc.set_attachments(vec![EmbeddedFile::new("notes.txt", b"hello").with_description("notes")]);
        doc.add_attachment_annotation(EmbeddedFile::new("data.csv", b"a,b\n1,2\n"), 10.0, 10.0, 20.0, 10.0);
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("/EmbeddedFiles"));
        assert!(s.contains("(Attachment0001)"));
        assert!(s.contains("/Subtype /FileAttachment"));
        assert_eq!(count(&s, "/Type /Filespec"), 2);
    }

    #[test]
    fn test_metadata_entries() {
        let mut doc = doc_with_page();
        doc.set_title("Report", false);
        doc.set_author("Büro", true);
        doc.set_lang("de-DE");
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("/Title (Report)"));
        assert!(s.contains("/Author <FEFF004200FC0072006F>"));
        assert!(s.contains("/Lang (de-DE)"));
    }

    #[test]
    fn test_output_intent_raises_version() {
        let mut doc = doc_with_page();
        doc.add_output_intent(OutputIntent::new(OutputIntentSubtype::PdfA1, "sRGB", "sRGB IEC61966-2.1", b"icc"));
        let pdf = doc.output_bytes().unwrap();
        assert!(pdf.starts_with(b"%PDF-1.4"));
        assert!(text(&pdf).contains("/OutputIntents"));
    }

    #[test]
    fn test_xmp_metadata_stream() {
        let mut doc = doc_with_page();
        let packet = br#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?><x:xmpmeta xmlns:x="adobe:ns:meta/"></x:xmpmeta><?xpacket end="w"?>"#;
        doc.set_xmp_metadata(packet);
        assert!(doc.ok(), "{:?}", doc.error());
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("/Subtype /XML"));
        assert!(s.contains("adobe:ns:meta/"));
    }

    #[test]
    fn test_generated_xmp_follows_info() {
        let mut doc = doc_with_page();
        doc.set_title("Quarterly", false);
        doc.set_author("Ops", false);
        doc.generate_xmp_metadata();
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("/Subtype /XML"));
        assert!(s.contains("<rdf:li xml:lang=\"x-default\">Quarterly</rdf:li>"));
        assert!(s.contains("<rdf:li>Ops</rdf:li>"));
        assert!(s.contains("<xmp:CreateDate>2000-01-01T00:00:00+00:00</xmp:CreateDate>"));
    }

    #[test]
    fn test_malformed_xmp_rejected() {
        let mut doc = doc_with_page();
        doc.set_xmp_metadata(b"<x:xmpmeta><rdf:RDF></x:xmpmeta>");
        assert!(matches!(doc.error(), Some(Error::Configuration(_))));
    }
}
