//! Optional content groups (layers), PDF 32000-1:2008 §8.11.
//!
//! Content between `begin_layer` and `end_layer` is wrapped in an
//! `/OC /OC<n> BDC ... EMC` marked-content sequence that refers to the
//! layer's OCG through the shared `/Properties` resource.

use crate::object::{Dict, Object};
use crate::writer::pdf_writer::PdfWriter;

/// A single optional content group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    /// Name shown in the viewer's layer pane
    pub name: String,
    /// Initial visibility
    pub visible: bool,
}

/// All layers of a document.
#[derive(Debug, Clone, Default)]
pub struct LayerSet {
    layers: Vec<Layer>,
    /// Open the layer pane when the document is displayed
    pub open_pane: bool,
}

impl LayerSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a layer and return its id.
    pub fn add(&mut self, name: impl Into<String>, visible: bool) -> usize {
        self.layers.push(Layer {
            name: name.into(),
            visible,
        });
        self.layers.len() - 1
    }

    /// Look up a layer.
    pub fn get(&self, id: usize) -> Option<&Layer> {
        self.layers.get(id)
    }

    /// Returns true if no layer was defined.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Resource name of layer `id`, without the slash.
    pub fn resource_name(id: usize) -> String {
        format!("OC{}", id)
    }

    /// Write one OCG object per layer, returning their numbers in id order.
    pub fn write(&self, w: &mut PdfWriter) -> Vec<u32> {
        self.layers
            .iter()
            .map(|layer| {
                let mut d = Dict::new();
                d.insert("Type".into(), Object::name("OCG"));
                d.insert("Name".into(), Object::unicode(&layer.name));
                w.put_object(&d)
            })
            .collect()
    }

    /// `/Properties` resource entry.
    pub fn properties(&self, objs: &[u32]) -> Object {
        Object::Dictionary(
            objs.iter()
                .enumerate()
                .map(|(i, &n)| (Self::resource_name(i), Object::reference(n)))
                .collect(),
        )
    }

    /// Catalog `/OCProperties` entry.
    pub fn oc_properties(&self, objs: &[u32]) -> Object {
        let refs: Vec<Object> = objs.iter().map(|&n| Object::reference(n)).collect();
        let off: Vec<Object> = self
            .layers
            .iter()
            .zip(objs)
            .filter(|(layer, _)| !layer.visible)
            .map(|(_, &n)| Object::reference(n))
            .collect();

        let mut d = Dict::new();
        if !off.is_empty() {
            d.insert("OFF".into(), Object::Array(off));
        }
        d.insert("Order".into(), Object::Array(refs.clone()));
        Object::dict([("OCGs", Object::Array(refs)), ("D", Object::Dictionary(d))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::object_serializer::ObjectSerializer;
    use crate::writer::pdf_writer::PdfWriterConfig;

    #[test]
    fn test_layers_written_in_order() {
        let mut set = LayerSet::new();
        assert_eq!(set.add("Ink", true), 0);
        assert_eq!(set.add("Notes", false), 1);
        let mut w = PdfWriter::new(PdfWriterConfig::default());
        let objs = set.write(&mut w);
        assert_eq!(objs, vec![1, 2]);

        let s = ObjectSerializer::new();
        assert_eq!(s.serialize_to_string(&set.properties(&objs)), "<</OC0 1 0 R /OC1 2 0 R>>");
        assert_eq!(
            s.serialize_to_string(&set.oc_properties(&objs)),
            "<</OCGs [1 0 R 2 0 R] /D <</OFF [2 0 R] /Order [1 0 R 2 0 R]>>>>"
        );
    }
}
