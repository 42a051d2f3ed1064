//! Helpers shared by the integration tests.

#![allow(dead_code)]

pub mod ttf_builder;

use pdf_quill::prelude::*;
use regex::bytes::Regex;

/// Route `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Uncompressed, reproducible document with one page open.
pub fn doc_with_page() -> Document {
    init_logging();
    let mut doc = Document::new(DocumentConfig::testing());
    doc.add_page();
    doc
}

/// Lossy text view of PDF bytes.
pub fn text(pdf: &[u8]) -> String {
    String::from_utf8_lossy(pdf).into_owned()
}

/// Byte offsets from the cross-reference table, index = object number - 1.
pub fn xref_offsets(pdf: &[u8]) -> Vec<usize> {
    let start = Regex::new(r"startxref\n(\d+)\n%%EOF\n$").unwrap();
    let caps = start.captures(pdf).expect("startxref");
    let xref_at: usize = std::str::from_utf8(&caps[1]).unwrap().parse().unwrap();
    let entry = Regex::new(r"(\d{10}) 00000 n \n").unwrap();
    entry
        .captures_iter(&pdf[xref_at..])
        .map(|c| std::str::from_utf8(&c[1]).unwrap().parse().unwrap())
        .collect()
}

/// Number of times `needle` occurs in `haystack`.
pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}
