//! PDF object serialization.
//!
//! Writes [`Object`] values in PDF syntax. Strings are passed through the
//! active [`Protection`] handler, keyed by the number of the object that
//! contains them.

use crate::encryption::Protection;
use crate::object::{Dict, Object};

/// Serializer for PDF objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectSerializer {
    /// Emit dictionary keys in sorted order instead of insertion order
    sort_keys: bool,
}

/// String encryption context: the handler and the enclosing object number.
pub type Crypt<'a> = Option<(&'a Protection, u32)>;

impl ObjectSerializer {
    /// Create a serializer that keeps insertion order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a serializer that sorts dictionary keys.
    pub fn sorted() -> Self {
        Self { sort_keys: true }
    }

    /// Serialize an object to bytes without encryption.
    pub fn serialize(&self, obj: &Object) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_object(&mut buf, obj, None);
        buf
    }

    /// Serialize an object to a string (for tests and debugging).
    pub fn serialize_to_string(&self, obj: &Object) -> String {
        String::from_utf8_lossy(&self.serialize(obj)).into_owned()
    }

    /// Append `obj` to `out`.
    pub fn write_object(&self, out: &mut Vec<u8>, obj: &Object, crypt: Crypt<'_>) {
        match obj {
            Object::Null => out.extend_from_slice(b"null"),
            Object::Boolean(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
            Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
            Object::Real(r) => out.extend_from_slice(format_real(*r).as_bytes()),
            Object::String(s) => match crypt {
                Some((handler, obj_num)) => write_string(out, &handler.encrypt(s, obj_num)),
                None => write_string(out, s),
            },
            Object::Name(n) => write_name(out, n),
            Object::Array(arr) => {
                out.push(b'[');
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    self.write_object(out, item, crypt);
                }
                out.push(b']');
            },
            Object::Dictionary(dict) => self.write_dict(out, dict, crypt),
            Object::Reference(r) => out.extend_from_slice(r.to_string().as_bytes()),
        }
    }

    /// Append a dictionary to `out`.
    pub fn write_dict(&self, out: &mut Vec<u8>, dict: &Dict, crypt: Crypt<'_>) {
        out.extend_from_slice(b"<<");
        let mut keys: Vec<&String> = dict.keys().collect();
        if self.sort_keys {
            keys.sort();
        }
        for key in keys {
            if let Some(value) = dict.get(key) {
                write_name(out, key);
                out.push(b' ');
                self.write_object(out, value, crypt);
                out.push(b' ');
            }
        }
        if out.last() == Some(&b' ') {
            out.pop();
        }
        out.extend_from_slice(b">>");
    }
}

/// Format a real with up to five decimals and no trailing zeros.
pub fn format_real(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let formatted = format!("{:.5}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Literal string syntax for printable data, hex syntax otherwise.
fn write_string(out: &mut Vec<u8>, data: &[u8]) {
    let printable = data
        .iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..=0x7E).contains(&b));

    if printable {
        out.push(b'(');
        out.extend_from_slice(&escape_literal(data));
        out.push(b')');
    } else {
        out.push(b'<');
        for byte in data {
            out.extend_from_slice(format!("{:02X}", byte).as_bytes());
        }
        out.push(b'>');
    }
}

/// Escape `\`, `(`, `)` and carriage return for a literal string body.
pub fn escape_literal(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 8);
    for &byte in data {
        match byte {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'(' => out.extend_from_slice(b"\\("),
            b')' => out.extend_from_slice(b"\\)"),
            b'\r' => out.extend_from_slice(b"\\r"),
            _ => out.push(byte),
        }
    }
    out
}

/// Write a name, escaping delimiters and non-regular bytes as `#xx`.
fn write_name(out: &mut Vec<u8>, name: &str) {
    out.push(b'/');
    for byte in name.bytes() {
        match byte {
            b'!'..=b'~'
                if !matches!(
                    byte,
                    b'#' | b'%' | b'(' | b')' | b'/' | b'<' | b'>' | b'[' | b']' | b'{' | b'}'
                ) =>
            {
                out.push(byte)
            },
            _ => out.extend_from_slice(format!("#{:02X}", byte).as_bytes()),
        }
    }
}
