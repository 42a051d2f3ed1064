//! Link annotations and internal link destinations.

use crate::object::{Dict, Object};

/// Where a clickable area leads.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    /// Internal link id returned by `add_link`
    Internal(usize),
    /// External URI
    Uri(String),
}

/// Destination of an internal link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkDest {
    /// 1-based page
    pub page: usize,
    /// Vertical position in user units from the top of the page
    pub y: f64,
}

/// A clickable area on a page, in points with the PDF bottom-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLink {
    pub x: f64,
    /// Top edge
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub target: LinkTarget,
}

/// Internal link table. Ids start at 1.
#[derive(Debug, Clone, Default)]
pub struct Links {
    dests: Vec<Option<LinkDest>>,
}

impl Links {
    /// Allocate a link id without a destination.
    pub fn add(&mut self) -> usize {
        self.dests.push(None);
        self.dests.len()
    }

    /// Number of allocated ids.
    pub fn len(&self) -> usize {
        self.dests.len()
    }

    /// Returns true if no id was allocated.
    pub fn is_empty(&self) -> bool {
        self.dests.is_empty()
    }

    /// Set the destination of link `id`. Returns false for unknown ids.
    pub fn set(&mut self, id: usize, dest: LinkDest) -> bool {
        match id.checked_sub(1).and_then(|i| self.dests.get_mut(i)) {
            Some(slot) => {
                *slot = Some(dest);
                true
            },
            None => false,
        }
    }

    /// Destination of link `id`, if set.
    pub fn get(&self, id: usize) -> Option<LinkDest> {
        id.checked_sub(1).and_then(|i| self.dests.get(i)).copied().flatten()
    }
}

impl PageLink {
    /// `/Link` annotation dictionary.
    ///
    /// `dest` resolves an internal link to the target page's object number
    /// and the destination's y in points from the bottom. Internal links
    /// without a destination produce `None`.
    pub fn annotation(&self, dest: impl Fn(usize) -> Option<(u32, f64)>) -> Option<Dict> {
        let mut d = Dict::new();
        d.insert("Type".into(), Object::name("Annot"));
        d.insert("Subtype".into(), Object::name("Link"));
        d.insert(
            "Rect".into(),
            Object::reals(&[
                round2(self.x),
                round2(self.y),
                round2(self.x + self.w),
                round2(self.y - self.h),
            ]),
        );
        d.insert("Border".into(), Object::integers([0, 0, 0]));
        match &self.target {
            LinkTarget::Uri(uri) => {
                d.insert(
                    "A".into(),
                    Object::dict([("S", Object::name("URI")), ("URI", Object::text(uri))]),
                );
            },
            LinkTarget::Internal(id) => {
                let Some((page_obj, y)) = dest(*id) else {
                    log::warn!("Internal link {} has no destination and is dropped", id);
                    return None;
                };
                d.insert(
                    "Dest".into(),
                    Object::Array(vec![
                        Object::reference(page_obj),
                        Object::name("XYZ"),
                        Object::Integer(0),
                        Object::Real(round2(y)),
                        Object::Null,
                    ]),
                );
            },
        }
        Some(d)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::ObjectSerializer;

    #[test]
    fn test_link_ids_start_at_one() {
        let mut links = Links::default();
        assert_eq!(links.add(), 1);
        assert_eq!(links.add(), 2);
        assert!(links.get(1).is_none());
        assert!(links.set(2, LinkDest { page: 3, y: 10.0 }));
        assert!(!links.set(0, LinkDest { page: 1, y: 0.0 }));
        assert!(!links.set(9, LinkDest { page: 1, y: 0.0 }));
        assert_eq!(links.get(2).unwrap().page, 3);
    }

    #[test]
    fn test_uri_annotation() {
        let link = PageLink {
            x: 10.0,
            y: 800.0,
            w: 50.0,
            h: 12.0,
            target: LinkTarget::Uri("https://example.com".to_string()),
        };
        let d = link.annotation(|_| None).unwrap();
        let text = ObjectSerializer::new().serialize_to_string(&Object::Dictionary(d));
        assert_eq!(
            text,
            "<</Type /Annot /Subtype /Link /Rect [10 800 60 788] /Border [0 0 0] /A <</S /URI /URI (https://example.com)>>>>"
        );
    }

    #[test]
    fn test_internal_annotation() {
        let link = PageLink {
            x: 0.0,
            y: 100.0,
            w: 10.0,
            h: 10.0,
            target: LinkTarget::Internal(1),
        };
        let d = link.annotation(|id| (id == 1).then_some((5, 700.123))).unwrap();
        assert_eq!(
            d["Dest"],
            Object::Array(vec![
                Object::reference(5),
                Object::name("XYZ"),
                Object::Integer(0),
                Object::Real(700.12),
                Object::Null
            ])
        );
        let dangling = PageLink {
            target: LinkTarget::Internal(2),
            ..link
        };
        assert!(dangling.annotation(|_| None).is_none());
    }
}
