//! Embedded files (attachments), PDF 32000-1:2008 §7.11.4.
//!
//! Each attachment becomes an `/EmbeddedFile` stream plus a `/Filespec`
//! dictionary. Document-level attachments are listed in the catalog's
//! `/EmbeddedFiles` name tree; page-level ones are referenced from
//! `/FileAttachment` annotations.

use crate::error::Result;
use crate::object::{Dict, Object};
use crate::writer::pdf_writer::PdfWriter;
use md5::{Digest, Md5};

/// A file to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedFile {
    /// File name shown by the viewer
    pub name: String,
    /// Optional description
    pub description: String,
    /// File content
    pub data: Vec<u8>,
}

impl EmbeddedFile {
    /// Create an attachment; the content is copied.
    pub fn new(name: impl Into<String>, data: &[u8]) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            data: data.to_vec(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Stream dictionary without `/Length` and `/Filter`.
    pub fn build_stream_dict(&self) -> Dict {
        let mut d = Dict::new();
        d.insert("Type".into(), Object::name("EmbeddedFile"));
        d.insert(
            "Params".into(),
            Object::dict([
                ("CheckSum", Object::String(md5_hash(&self.data))),
                ("Size", Object::Integer(self.data.len() as i64)),
            ]),
        );
        d
    }

    /// File specification referring to the stream object.
    pub fn build_filespec(&self, stream_obj: u32) -> Dict {
        let mut d = Dict::new();
        d.insert("Type".into(), Object::name("Filespec"));
        d.insert("F".into(), Object::unicode(&self.name));
        d.insert("UF".into(), Object::unicode(&self.name));
        d.insert("EF".into(), Object::dict([("F", Object::reference(stream_obj))]));
        if !self.description.is_empty() {
            d.insert("Desc".into(), Object::unicode(&self.description));
        }
        d
    }

    /// Write the stream and the file specification; returns the
    /// specification's object number.
    pub fn write(&self, w: &mut PdfWriter) -> Result<u32> {
        let stream = w.put_stream_object(self.build_stream_dict(), &self.data, true)?;
        Ok(w.put_object(&self.build_filespec(stream)))
    }
}

/// `/EmbeddedFiles` name tree node for already written file specifications.
///
/// Keys are zero-padded so that their byte order matches insertion order.
pub fn build_names_tree(filespecs: &[u32]) -> Dict {
    let mut names = Vec::with_capacity(filespecs.len() * 2);
    for (i, &n) in filespecs.iter().enumerate() {
        names.push(Object::text(&format!("Attachment{:04}", i + 1)));
        names.push(Object::reference(n));
    }
    let mut d = Dict::new();
    d.insert("Names".into(), Object::Array(names));
    d
}

/// MD5 digest of `data`.
fn md5_hash(data: &[u8]) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::pdf_writer::PdfWriterConfig;

    #[test]
    fn test_md5_hash() {
        let hash = md5_hash(b"test data");
        assert_eq!(hash.len(), 16);
        assert_eq!(hash, md5_hash(b"test data"));
        assert_ne!(hash, md5_hash(b"different data"));
    }

    #[test]
    fn test_write_file() {
        let file = EmbeddedFile::new("notes.txt", b"hello").with_description("Notes");
        let mut w = PdfWriter::new(PdfWriterConfig::default().with_compress(false));
        let spec = file.write(&mut w).unwrap();
        assert_eq!(spec, 2);
        let bytes = w.finish(Dict::new()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Size 5"));
        assert!(text.contains("stream\nhello\nendstream"));
        assert!(text.contains("/Type /Filespec /F (notes.txt) /UF (notes.txt) /EF <</F 1 0 R>> /Desc (Notes)"));
    }

    #[test]
    fn test_names_tree_keys_sorted() {
        let specs: Vec<u32> = (1..=12).collect();
        let tree = build_names_tree(&specs);
        let Object::Array(names) = &tree["Names"] else {
            panic!("names must be an array");
        };
        let keys: Vec<&Object> = names.iter().step_by(2).collect();
        let mut sorted = keys.clone();
        sorted.sort_by_key(|o| match o {
            Object::String(s) => s.clone(),
            _ => Vec::new(),
        });
        assert_eq!(keys, sorted);
    }
}
