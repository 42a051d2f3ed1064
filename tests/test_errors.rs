//! Integration tests for the sticky document error.

mod common;

use common::{doc_with_page, init_logging, text};
use pdf_quill::prelude::*;

#[test]
fn test_first_error_is_kept() {
    let mut doc = doc_with_page();
    doc.set_font("Garamond", "", 12.0);
    doc.set_draw_spot_color("missing", 100);
    doc.set_alpha(0.5, "Sparkle");
    assert!(!doc.ok());
    assert!(matches!(doc.error(), Some(Error::Font(_))));
}

#[test]
fn test_operations_are_ignored_after_an_error() {
    let mut doc = doc_with_page();
    doc.set_font("Helvetica", "", 12.0);
    doc.cell(20.0, 10.0, "before");
    doc.set_font("Garamond", "", 12.0);
    let pages = doc.page_count();
    doc.cell(20.0, 10.0, "after");
    doc.add_page();
    assert_eq!(doc.page_count(), pages);

    let err = doc.output_bytes().unwrap_err();
    assert!(matches!(err, Error::Font(_)));
}

#[test]
fn test_setters_are_ignored_after_an_error() {
    let mut doc = doc_with_page();
    let link_before = doc.add_link();
    let (x, y) = doc.xy();
    let margins = doc.margins();
    doc.set_font("Garamond", "", 12.0);

    let ghost_layer = doc.add_layer("Ghost", true);
    assert_eq!(doc.add_link(), link_before + 1);
    assert_eq!(doc.add_link(), link_before + 1);
    doc.set_title("GhostTitle", false);
    doc.set_author("GhostAuthor", false);
    doc.set_margins(50.0, 50.0, 50.0);
    doc.set_auto_page_break(false, 0.0);
    doc.set_xy(90.0, 90.0);
    doc.ln(30.0);
    doc.set_compression(true);
    doc.set_protection(Permissions::PRINT, "user", "owner");
    assert_eq!(doc.xy(), (x, y));
    assert_eq!(doc.margins(), margins);
    assert!(doc.auto_page_break().0);

    doc.clear_error();
    assert_eq!(doc.add_layer("Real", true), ghost_layer);
    let s = text(&doc.output_bytes().unwrap());
    assert!(!s.contains("Ghost"));
    assert!(s.contains("(Real)"));
    assert!(!s.contains("/Encrypt"));
    assert!(!s.contains("/FlateDecode"));
}

#[test]
fn test_cleared_error_allows_output() {
    let mut doc = doc_with_page();
    doc.set_font("Garamond", "", 12.0);
    doc.clear_error();
    doc.set_font("Helvetica", "", 12.0);
    doc.cell(20.0, 10.0, "recovered");
    let s = text(&doc.output_bytes().unwrap());
    assert!(s.contains("(recovered) Tj"));
}

#[test]
fn test_drawing_without_page_fails() {
    init_logging();
    let mut doc = Document::new(DocumentConfig::testing());
    doc.rect(10.0, 10.0, 5.0, 5.0, "D");
    assert!(matches!(doc.error(), Some(Error::Structural(_))));
}

#[test]
fn test_unbalanced_clip_end() {
    let mut doc = doc_with_page();
    doc.clip_end();
    assert!(matches!(doc.error(), Some(Error::Structural(_))));
}

#[test]
fn test_open_clip_fails_on_close() {
    let mut doc = doc_with_page();
    doc.clip_rect(10.0, 10.0, 50.0, 50.0, false);
    let err = doc.output_bytes().unwrap_err();
    assert!(matches!(err, Error::Structural(_)));
}

#[test]
fn test_open_transform_fails_on_close() {
    let mut doc = doc_with_page();
    doc.transform_begin();
    assert!(matches!(doc.output_bytes(), Err(Error::Structural(_))));
}

#[test]
fn test_invalid_page_size() {
    init_logging();
    let config = DocumentConfig::testing().with_page_size(PageSize::Named("B52".to_string()));
    assert!(matches!(Document::try_new(config.clone()), Err(Error::Configuration(_))));
    let doc = Document::new(config);
    assert!(matches!(doc.error(), Some(Error::Configuration(_))));
}
