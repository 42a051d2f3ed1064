//! Document outline (bookmarks), PDF 32000-1:2008 §12.3.3.
//!
//! Bookmarks are recorded flat, in document order, with a nesting level.
//! The tree links (parent, first, last, prev, next) are indices into that
//! flat list and are only computed when the outline is written, after every
//! page object number is known.

use crate::object::{Dict, Object};
use crate::writer::pdf_writer::PdfWriter;
use std::collections::HashMap;

/// One bookmark.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineItem {
    /// Display title
    pub title: String,
    /// Nesting level, 0 for top-level entries
    pub level: usize,
    /// 1-based target page
    pub page: usize,
    /// Target y in points from the bottom of the page
    pub y: f64,
}

/// Tree links of one item, as indices into the item list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutlineLinks {
    /// `None` means the outline root
    pub parent: Option<usize>,
    pub first: Option<usize>,
    pub last: Option<usize>,
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

/// Flat bookmark arena.
#[derive(Debug, Clone, Default)]
pub struct OutlineBuilder {
    items: Vec<OutlineItem>,
}

impl OutlineBuilder {
    /// Create an empty outline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bookmark.
    pub fn add(&mut self, item: OutlineItem) {
        self.items.push(item);
    }

    /// Recorded bookmarks.
    pub fn items(&self) -> &[OutlineItem] {
        &self.items
    }

    /// Returns true if there are no bookmarks.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Compute the tree links.
    ///
    /// An item's parent is the most recent item one level up. Levels that
    /// jump by more than one attach to whatever item was last seen at the
    /// level just above, or to the root.
    pub fn resolve(&self) -> Vec<OutlineLinks> {
        let mut links = vec![OutlineLinks::default(); self.items.len()];
        let mut last_at_level: HashMap<usize, usize> = HashMap::new();
        let mut level = 0;

        for (i, item) in self.items.iter().enumerate() {
            if item.level > 0 {
                let parent = item.level.checked_sub(1).and_then(|l| last_at_level.get(&l).copied());
                links[i].parent = parent;
                if let Some(p) = parent {
                    links[p].last = Some(i);
                    if item.level > level || links[p].first.is_none() {
                        links[p].first = Some(i);
                    }
                }
            }
            if item.level <= level && i > 0 {
                if let Some(&prev) = last_at_level.get(&item.level) {
                    links[prev].next = Some(i);
                    links[i].prev = Some(prev);
                }
            }
            last_at_level.insert(item.level, i);
            // Deeper levels end when a shallower item starts
            last_at_level.retain(|&l, _| l <= item.level);
            level = item.level;
        }
        links
    }

    /// Write every item plus the `/Outlines` root and return the root's
    /// object number. `page_obj` maps a 1-based page to its object number.
    pub fn write(&self, w: &mut PdfWriter, page_obj: impl Fn(usize) -> u32) -> Option<u32> {
        if self.items.is_empty() {
            return None;
        }
        let links = self.resolve();
        let base = w.object_count() + 1;
        let root = base + self.items.len() as u32;
        let obj = |i: usize| Object::reference(base + i as u32);

        for (item, link) in self.items.iter().zip(&links) {
            let mut d = Dict::new();
            d.insert("Title".into(), Object::unicode(&item.title));
            d.insert(
                "Parent".into(),
                link.parent.map(obj).unwrap_or_else(|| Object::reference(root)),
            );
            for (key, target) in [
                ("Prev", link.prev),
                ("Next", link.next),
                ("First", link.first),
                ("Last", link.last),
            ] {
                if let Some(t) = target {
                    d.insert(key.into(), obj(t));
                }
            }
            d.insert(
                "Dest".into(),
                Object::Array(vec![
                    Object::reference(page_obj(item.page)),
                    Object::name("XYZ"),
                    Object::Integer(0),
                    Object::Real(item.y),
                    Object::Null,
                ]),
            );
            d.insert("Count".into(), Object::Integer(0));
            w.put_object(&d);
        }

        let top: Vec<usize> = (0..self.items.len()).filter(|&i| links[i].parent.is_none()).collect();
        let mut d = Dict::new();
        d.insert("Type".into(), Object::name("Outlines"));
        if let (Some(&first), Some(&last)) = (top.first(), top.last()) {
            d.insert("First".into(), obj(first));
            d.insert("Last".into(), obj(last));
        }
        d.insert("Count".into(), Object::Integer(top.len() as i64));
        let n = w.put_object(&d);
        log::debug!("Wrote outline with {} entries as object {}", self.items.len(), n);
        Some(n)
    }
}
