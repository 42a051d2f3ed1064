//! Sequential PDF byte writer.
//!
//! Objects are appended to a single buffer in the order they are produced.
//! [`PdfWriter::new_obj`] hands out strictly increasing object numbers and
//! records the byte offset of each `"<n> 0 obj"` marker at the moment it is
//! written, so the cross-reference table always matches the bytes on disk.

use crate::encryption::Protection;
use crate::error::{Error, Result};
use crate::object::{Dict, Object};
use crate::writer::object_serializer::ObjectSerializer;
use std::io::Write;

/// Flate-compress `data` with zlib framing.
pub fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Writer configuration.
#[derive(Debug, Clone)]
pub struct PdfWriterConfig {
    /// PDF version written in the header, e.g. "1.3"
    pub version: String,
    /// Flate-compress streams
    pub compress: bool,
    /// Sort dictionary keys
    pub sort_keys: bool,
}

impl Default for PdfWriterConfig {
    fn default() -> Self {
        Self {
            version: "1.3".to_string(),
            compress: true,
            sort_keys: false,
        }
    }
}

impl PdfWriterConfig {
    /// Set the header version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Enable or disable compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Enable or disable sorted dictionary keys.
    pub fn with_sort_keys(mut self, sort: bool) -> Self {
        self.sort_keys = sort;
        self
    }
}

/// Append-only PDF writer with offset bookkeeping.
pub struct PdfWriter {
    config: PdfWriterConfig,
    buffer: Vec<u8>,
    /// Byte offset per object number; index 0 is the free-list head
    offsets: Vec<Option<usize>>,
    /// Highest object number handed out
    n: u32,
    /// Object currently being written, used for string/stream encryption
    current: u32,
    serializer: ObjectSerializer,
    protection: Option<Protection>,
}

impl PdfWriter {
    /// Create a writer and emit the header.
    pub fn new(config: PdfWriterConfig) -> Self {
        let serializer = if config.sort_keys {
            ObjectSerializer::sorted()
        } else {
            ObjectSerializer::new()
        };
        let mut writer = Self {
            config,
            buffer: Vec::new(),
            offsets: vec![None],
            n: 0,
            current: 0,
            serializer,
            protection: None,
        };
        writer.put_header();
        writer
    }

    fn put_header(&mut self) {
        let header = format!("%PDF-{}\n", self.config.version);
        self.buffer.extend_from_slice(header.as_bytes());
        self.buffer.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n\n");
    }

    /// Encrypt every string and stream written from now on.
    pub fn set_protection(&mut self, protection: Protection) {
        self.protection = Some(protection);
    }

    /// Active protection handler.
    pub fn protection(&self) -> Option<&Protection> {
        self.protection.as_ref()
    }

    /// Whether streams are compressed.
    pub fn compress(&self) -> bool {
        self.config.compress
    }

    /// Highest object number handed out so far.
    pub fn object_count(&self) -> u32 {
        self.n
    }

    /// Current length of the output.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Hand out the next object number without writing anything.
    pub fn reserve(&mut self) -> u32 {
        self.n += 1;
        self.offsets.push(None);
        self.n
    }

    /// Start a new object with the next number.
    pub fn new_obj(&mut self) -> u32 {
        let n = self.reserve();
        self.begin_obj(n);
        n
    }

    /// Start writing a previously reserved object.
    pub fn begin_obj(&mut self, n: u32) {
        if let Some(slot) = self.offsets.get_mut(n as usize) {
            *slot = Some(self.buffer.len());
        }
        self.current = n;
        let marker = format!("{} 0 obj\n", n);
        self.buffer.extend_from_slice(marker.as_bytes());
    }

    /// Close the current object; the body already ends with a newline.
    pub fn end_obj(&mut self) {
        self.buffer.extend_from_slice(b"endobj\n\n");
        self.current = 0;
    }

    /// Append raw text followed by a newline.
    pub fn out(&mut self, s: &str) {
        self.buffer.extend_from_slice(s.as_bytes());
        self.buffer.push(b'\n');
    }

    /// Append raw bytes.
    pub fn out_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    fn crypt(&self) -> Option<(&Protection, u32)> {
        self.protection.as_ref().map(|p| (p, self.current))
    }

    /// Serialize a dictionary into the current object.
    pub fn put_dict(&mut self, dict: &Dict) {
        let mut out = Vec::new();
        self.serializer.write_dict(&mut out, dict, self.crypt());
        self.buffer.extend_from_slice(&out);
        self.buffer.push(b'\n');
    }

    /// Serialize any object value into the current object.
    pub fn put_value(&mut self, obj: &Object) {
        let mut out = Vec::new();
        self.serializer.write_object(&mut out, obj, self.crypt());
        self.buffer.extend_from_slice(&out);
        self.buffer.push(b'\n');
    }

    /// Write a complete dictionary object and return its number.
    pub fn put_object(&mut self, dict: &Dict) -> u32 {
        let n = self.new_obj();
        self.put_dict(dict);
        self.end_obj();
        n
    }

    /// Write a dictionary object whose strings are never encrypted (`/Encrypt`).
    pub fn put_unencrypted_object(&mut self, dict: &Dict) -> u32 {
        let n = self.new_obj();
        let mut out = Vec::new();
        self.serializer.write_dict(&mut out, dict, None);
        self.buffer.extend_from_slice(&out);
        self.buffer.push(b'\n');
        self.end_obj();
        n
    }

    /// Write `stream ... endstream` for the current object, encrypting the data
    /// when protection is active. The caller's dictionary must already hold
    /// the final `/Length`.
    fn put_stream_body(&mut self, data: &[u8]) {
        let body = match &self.protection {
            Some(p) => p.encrypt(data, self.current),
            None => data.to_vec(),
        };
        self.buffer.extend_from_slice(b"stream\n");
        self.buffer.extend_from_slice(&body);
        self.buffer.extend_from_slice(b"\nendstream\n");
    }

    /// Length of `data` once encrypted.
    fn encrypted_len(&self, len: usize) -> usize {
        match &self.protection {
            Some(p) if p.algorithm().is_aes() => 16 + (len / 16 + 1) * 16,
            _ => len,
        }
    }

    /// Write a stream into the current object.
    ///
    /// When `compress` is set and the writer compresses, the data is deflated
    /// and `/Filter /FlateDecode` added. `/Length` is filled in here.
    pub fn put_stream(&mut self, mut dict: Dict, data: &[u8], compress: bool) -> Result<()> {
        let payload = if compress && self.config.compress {
            dict.insert("Filter".into(), Object::name("FlateDecode"));
            compress_data(data)?
        } else {
            data.to_vec()
        };
        let len = self.encrypted_len(payload.len());
        dict.insert("Length".into(), Object::Integer(len as i64));
        self.put_dict(&dict);
        self.put_stream_body(&payload);
        Ok(())
    }

    /// Write a complete stream object and return its number.
    pub fn put_stream_object(&mut self, dict: Dict, data: &[u8], compress: bool) -> Result<u32> {
        let n = self.new_obj();
        self.put_stream(dict, data, compress)?;
        self.end_obj();
        Ok(n)
    }

    /// Write the xref table, trailer and `%%EOF`, returning the file bytes.
    pub fn finish(mut self, trailer: Dict) -> Result<Vec<u8>> {
        let missing: Vec<usize> = self
            .offsets
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, o)| o.is_none())
            .map(|(i, _)| i)
            .collect();
        if !missing.is_empty() {
            return Err(Error::Structural(format!(
                "objects reserved but never written: {:?}",
                missing
            )));
        }

        let xref_offset = self.buffer.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", self.n + 1);
        for offset in self.offsets.iter().skip(1).flatten() {
            xref.push_str(&format!("{:010} 00000 n \n", offset));
        }
        self.buffer.extend_from_slice(xref.as_bytes());

        self.current = 0;
        let mut trailer = trailer;
        trailer.insert("Size".into(), Object::Integer(self.n as i64 + 1));
        self.buffer.extend_from_slice(b"trailer\n");
        let mut out = Vec::new();
        // Trailer strings (the file ID) are never encrypted.
        self.serializer.write_dict(&mut out, &trailer, None);
        self.buffer.extend_from_slice(&out);
        self.buffer.extend_from_slice(format!("\nstartxref\n{}\n%%EOF\n", xref_offset).as_bytes());
        Ok(self.buffer)
    }

    /// Recorded offsets, index = object number.
    pub fn offsets(&self) -> &[Option<usize>] {
        &self.offsets
    }
}
