//! End-to-end tests for serialized documents.
//!
//! Covers the overall file layout, cross-reference offsets, page size
//! handling, page count aliases and writing to disk.

mod common;

use common::{count, doc_with_page, init_logging, text, xref_offsets};
use pdf_quill::prelude::*;

mod layout_tests {
    use super::*;

    #[test]
    fn test_hello_world() {
        init_logging();
        let mut doc = Document::new(DocumentConfig::new());
        doc.add_page();
        doc.set_font("Arial", "B", 16.0);
        doc.cell(40.0, 10.0, "Hello World!");
        let pdf = doc.output_bytes().unwrap();
        let s = text(&pdf);

        assert!(pdf.starts_with(b"%PDF-1."));
        assert!(s.contains("/Type /Catalog"));
        assert!(s.contains("/Type /Pages"));
        assert!(s.contains("/Type /Font"));
        assert!(s.contains("/BaseFont /Helvetica-Bold"));
        assert!(pdf.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn test_uncompressed_content_is_readable() {
        let mut doc = doc_with_page();
        doc.set_font("Courier", "", 12.0);
        doc.text(10.0, 20.0, "plain text");
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("/F1 12.00 Tf"));
        assert!(s.contains("(plain text) Tj"));
        assert!(!s.contains("/FlateDecode"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let mut doc = doc_with_page();
        doc.set_font("Times", "I", 11.0);
        doc.multi_cell(0.0, 5.0, &"Lorem ipsum dolor sit amet. ".repeat(80), "", "J", false);
        doc.add_page();
        doc.bookmark("Second", 0, -1.0);
        let pdf = doc.output_bytes().unwrap();

        let offsets = xref_offsets(&pdf);
        assert!(offsets.len() > 6);
        for (i, &offset) in offsets.iter().enumerate() {
            let marker = format!("{} 0 obj\n", i + 1);
            assert!(
                pdf[offset..].starts_with(marker.as_bytes()),
                "object {} not at offset {}",
                i + 1,
                offset
            );
        }
    }

    #[test]
    fn test_object_numbers_are_unique_and_dense() {
        let mut doc = doc_with_page();
        doc.set_font("Helvetica", "", 10.0);
        doc.cell(20.0, 5.0, "x");
        let pdf = doc.output_bytes().unwrap();
        let s = text(&pdf);

        let re = regex::Regex::new(r"(?m)^(\d+) 0 obj$").unwrap();
        let mut numbers: Vec<u32> = re.captures_iter(&s).map(|c| c[1].parse().unwrap()).collect();
        let total = numbers.len();
        numbers.sort_unstable();
        numbers.dedup();
        assert_eq!(numbers.len(), total);
        assert_eq!(numbers, (1..=total as u32).collect::<Vec<_>>());
        assert!(s.contains(&format!("/Size {}", total + 1)));
    }

    #[test]
    fn test_pages_root_lists_every_page() {
        let mut doc = doc_with_page();
        doc.add_page();
        doc.add_page();
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("/Count 3"));
        assert!(s.contains("/Kids [3 0 R 5 0 R 7 0 R]"));
        assert_eq!(count(&s, "/Parent 1 0 R"), 3);
    }
}

mod page_format_tests {
    use super::*;

    #[test]
    fn test_default_size_has_no_page_media_box() {
        let mut doc = doc_with_page();
        let s = text(&doc.output_bytes().unwrap());
        // A4 portrait, only on the pages root
        assert_eq!(count(&s, "/MediaBox [0 0 595.28 841.89]"), 1);
    }

    #[test]
    fn test_landscape_page_gets_own_media_box() {
        let mut doc = doc_with_page();
        doc.add_page_format(Orientation::Landscape, Size::new(210.0, 297.0));
        assert_eq!(doc.page_count(), 2);
        let size = doc.page_size_at(2).unwrap();
        assert!(size.w > size.h);
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("/MediaBox [0 0 841.89 595.28]"));
    }

    #[test]
    fn test_custom_page_size_in_inches() {
        init_logging();
        let config = DocumentConfig::testing()
            .with_unit(Unit::Inch)
            .with_page_size(PageSize::Custom(Size::new(4.0, 6.0)));
        let mut doc = Document::new(config);
        doc.add_page();
        let size = doc.page_size();
        assert!((size.w - 4.0).abs() < 1e-9);
        assert!((size.h - 6.0).abs() < 1e-9);
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("/MediaBox [0 0 288 432]"));
    }

    #[test]
    fn test_crop_box_written_per_page() {
        init_logging();
        let mut doc = Document::new(DocumentConfig::testing().with_unit(Unit::Point));
        doc.add_page();
        doc.set_page_box(PageBoxKind::Crop, 10.0, 10.0, 100.0, 200.0);
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("/CropBox [10 10 110 210]"));
    }
}

mod alias_tests {
    use super::*;

    #[test]
    fn test_alias_replaced_with_page_count() {
        let mut doc = doc_with_page();
        doc.alias_nb_pages("");
        doc.set_font("Helvetica", "", 10.0);
        doc.cell(0.0, 10.0, "Page 1/{nb}");
        doc.add_page();
        doc.cell(0.0, 10.0, "Page 2/{nb}");
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("(Page 1/2) Tj"));
        assert!(s.contains("(Page 2/2) Tj"));
        assert!(!s.contains("{nb}"));
    }

    #[test]
    fn test_custom_alias() {
        let mut doc = doc_with_page();
        doc.alias_nb_pages("%total%");
        doc.set_font("Helvetica", "", 10.0);
        doc.cell(0.0, 10.0, "of %total%");
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("(of 1) Tj"));
    }

    #[test]
    fn test_footer_prints_on_every_page() {
        let mut doc = Document::new(DocumentConfig::testing());
        doc.alias_nb_pages("");
        doc.set_footer_func(|d| {
            d.set_y(-15.0);
            d.set_font("Helvetica", "I", 8.0);
            let label = format!("Page {}/{{nb}}", d.page_no());
            d.cell_format(0.0, 10.0, &label, "", LineBreak::Right, "C", false, None);
        });
        doc.add_page();
        doc.add_page();
        doc.add_page();
        let s = text(&doc.output_bytes().unwrap());
        for n in 1..=3 {
            assert!(s.contains(&format!("(Page {}/3) Tj", n)));
        }
    }
}

mod output_tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_output_file_and_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let mut doc = doc_with_page();
        doc.set_font("Courier", "", 10.0);
        doc.write(5.0, "Written to disk.");
        doc.output_file_and_close(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.3"));
        assert!(bytes.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn test_output_to_writer_matches_bytes() {
        let mut doc = doc_with_page();
        let mut sink = Vec::new();
        doc.output(&mut sink).unwrap();
        assert_eq!(sink, doc.output_bytes().unwrap());
    }

    #[test]
    fn test_testing_profile_is_reproducible() {
        let build = || {
            let mut doc = doc_with_page();
            doc.set_title("Same", false);
            doc.set_font("Helvetica", "", 12.0);
            doc.cell(50.0, 10.0, "same every time");
            doc.output_bytes().unwrap()
        };
        let a = build();
        let b = build();
        assert_eq!(a, b);
        let s = text(&a);
        assert!(s.contains("/CreationDate (D:20000101000000+00'00')"));
    }

    #[test]
    fn test_empty_document_gets_one_page() {
        init_logging();
        let mut doc = Document::new(DocumentConfig::testing());
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("/Count 1"));
    }

    #[test]
    fn test_compressed_output_uses_flate() {
        init_logging();
        let mut doc = Document::new(DocumentConfig::new());
        doc.add_page();
        let s = text(&doc.output_bytes().unwrap());
        assert!(s.contains("/Filter /FlateDecode"));
    }
}
