//! PDF object values.
//!
//! Every dictionary the serializer emits is first built as an [`Object`] and
//! then written by [`ObjectSerializer`](crate::writer::ObjectSerializer).
//! Dictionaries keep insertion order; the serializer may sort them.

use indexmap::IndexMap;

/// Ordered PDF dictionary.
pub type Dict = IndexMap<String, Object>;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array), encrypted on output when protection is active
    String(Vec<u8>),
    /// Name (written with a leading /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(Dict),
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl Object {
    /// Create a Name object.
    pub fn name(s: impl Into<String>) -> Object {
        Object::Name(s.into())
    }

    /// Create a String object from text, taken byte for byte.
    pub fn text(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec())
    }

    /// PDF text string: ASCII as is, anything else as BOM + UTF-16BE.
    pub fn unicode(s: &str) -> Object {
        Object::String(crate::fonts::encoding::pdf_text_string(s))
    }

    /// Reference to object `id`, generation 0.
    pub fn reference(id: u32) -> Object {
        Object::Reference(ObjectRef::new(id, 0))
    }

    /// Array of reals.
    pub fn reals(values: &[f64]) -> Object {
        Object::Array(values.iter().map(|v| Object::Real(*v)).collect())
    }

    /// Array of integers.
    pub fn integers<I: IntoIterator<Item = i64>>(values: I) -> Object {
        Object::Array(values.into_iter().map(Object::Integer).collect())
    }

    /// Dictionary from `(key, value)` pairs, in order.
    pub fn dict<'a, I: IntoIterator<Item = (&'a str, Object)>>(entries: I) -> Object {
        Object::Dictionary(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    /// Try to cast to dictionary.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Try to cast to dictionary, mutably.
    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }
}

impl From<i64> for Object {
    fn from(v: i64) -> Self {
        Object::Integer(v)
    }
}

impl From<u32> for Object {
    fn from(v: u32) -> Self {
        Object::Integer(v as i64)
    }
}

impl From<usize> for Object {
    fn from(v: usize) -> Self {
        Object::Integer(v as i64)
    }
}

impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Object::Real(v)
    }
}

impl From<bool> for Object {
    fn from(v: bool) -> Self {
        Object::Boolean(v)
    }
}

impl From<ObjectRef> for Object {
    fn from(r: ObjectRef) -> Self {
        Object::Reference(r)
    }
}

impl From<Dict> for Object {
    fn from(d: Dict) -> Self {
        Object::Dictionary(d)
    }
}

impl From<Vec<Object>> for Object {
    fn from(v: Vec<Object>) -> Self {
        Object::Array(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_ref_display() {
        assert_eq!(ObjectRef::new(12, 0).to_string(), "12 0 R");
    }

    #[test]
    fn test_dict_keeps_insertion_order() {
        let obj = Object::dict([("Type", Object::name("Page")), ("Parent", Object::reference(1))]);
        let keys: Vec<_> = obj.as_dict().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["Type", "Parent"]);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Object::from(3u32), Object::Integer(3));
        assert_eq!(Object::from(true), Object::Boolean(true));
        assert_eq!(Object::reals(&[0.0, 1.5]), Object::Array(vec![Object::Real(0.0), Object::Real(1.5)]));
    }
}
