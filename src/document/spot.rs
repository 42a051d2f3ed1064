//! Named spot (Separation) colors with a CMYK fallback.

use crate::error::{Error, Result};
use crate::object::{Dict, Object};
use indexmap::IndexMap;

/// A registered spot color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotColor {
    /// 1-based id; the resource name is `/CS<id>`
    pub id: usize,
    /// Ink name, e.g. `PANTONE 145 CVC`
    pub name: String,
    /// Alternate CMYK components, each 0-100
    pub cmyk: [u8; 4],
}

impl SpotColor {
    /// Resource name without the slash.
    pub fn resource_name(&self) -> String {
        format!("CS{}", self.id)
    }

    /// `[/Separation /name /DeviceCMYK <<tint transform>>]`
    pub fn color_space(&self) -> Object {
        let c1: Vec<f64> = self.cmyk.iter().map(|&v| v as f64 / 100.0).collect();
        let mut function = Dict::new();
        function.insert("Range".into(), Object::reals(&[0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]));
        function.insert("C0".into(), Object::reals(&[0.0, 0.0, 0.0, 0.0]));
        function.insert("C1".into(), Object::reals(&c1));
        function.insert("FunctionType".into(), Object::Integer(2));
        function.insert("Domain".into(), Object::reals(&[0.0, 1.0]));
        function.insert("N".into(), Object::Integer(1));
        Object::Array(vec![
            Object::name("Separation"),
            Object::name(self.name.clone()),
            Object::name("DeviceCMYK"),
            Object::Dictionary(function),
        ])
    }
}

/// Spot colors keyed by name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct SpotColors {
    colors: IndexMap<String, SpotColor>,
}

impl SpotColors {
    /// Register a new ink. Components are clamped to 0-100; a name that is
    /// already registered is an error and leaves the original untouched.
    pub fn add(&mut self, name: &str, c: u8, m: u8, y: u8, k: u8) -> Result<&SpotColor> {
        if self.colors.contains_key(name) {
            return Err(Error::DuplicateSpotColor(name.to_string()));
        }
        let id = self.colors.len() + 1;
        let color = SpotColor {
            id,
            name: name.to_string(),
            cmyk: [c.min(100), m.min(100), y.min(100), k.min(100)],
        };
        let entry = self.colors.entry(name.to_string()).or_insert(color);
        Ok(&*entry)
    }

    /// Look up an ink by name.
    pub fn get(&self, name: &str) -> Result<&SpotColor> {
        self.colors
            .get(name)
            .ok_or_else(|| Error::UnknownSpotColor(name.to_string()))
    }

    /// All inks in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SpotColor> {
        self.colors.values()
    }

    /// Returns true if no ink was registered.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
