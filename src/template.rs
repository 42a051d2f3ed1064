//! Reusable content drawn once and placed any number of times.
//!
//! A [`Template`] is a sub-canvas with its own size and content stream. It
//! shares the owning document's [`Registry`], so fonts, images and spot
//! colors used inside it land in the same resource dictionary, and finished
//! templates are written as Form XObjects. Templates never break pages and
//! ignore links.
//!
//! ```
//! use pdf_quill::prelude::*;
//!
//! let mut doc = Document::new(DocumentConfig::testing());
//! let badge = doc.create_template(Size::new(40.0, 20.0), |tpl| {
//!     tpl.set_font("Helvetica", "B", 10.0);
//!     tpl.rect(0.0, 0.0, 40.0, 20.0, "D");
//!     tpl.text(2.0, 12.0, "Badge");
//! });
//! doc.add_page();
//! doc.use_template_scaled(badge, 10.0, 10.0, 80.0, 40.0);
//! assert!(doc.ok());
//! ```

use crate::canvas::{Canvas, Surface};
use crate::document::links::PageLink;
use crate::document::registry::{Registry, TemplateRecord};
use crate::error::{Error, Result};

/// A sub-canvas recording a Form XObject.
#[derive(Debug)]
pub struct Template<'a> {
    id: usize,
    surface: Surface,
    registry: &'a mut Registry,
    buffer: Vec<u8>,
}

impl<'a> Template<'a> {
    pub(crate) fn new(id: usize, surface: Surface, registry: &'a mut Registry) -> Self {
        Self {
            id,
            surface,
            registry,
            buffer: Vec::new(),
        }
    }

    /// Template id, also used in the `/TPL<id>` resource name.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Content recorded so far.
    pub fn content(&self) -> &[u8] {
        &self.buffer
    }

    /// Close the template; clipping and transformations must be balanced.
    pub(crate) fn finish(self) -> Result<TemplateRecord> {
        if self.surface.clip_nest > 0 || self.surface.transform_nest > 0 {
            return Err(Error::Structural(format!(
                "template {} ends with {} open clip and {} open transformation contexts",
                self.id, self.surface.clip_nest, self.surface.transform_nest
            )));
        }
        Ok(TemplateRecord {
            id: self.id,
            size: self.surface.page_size,
            size_pt: self.surface.page_size_pt,
            content: self.buffer,
        })
    }
}

impl Canvas for Template<'_> {
    fn surface(&self) -> &Surface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    fn registry(&self) -> &Registry {
        self.registry
    }

    fn registry_mut(&mut self) -> &mut Registry {
        self.registry
    }

    fn write_content(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    fn has_page(&self) -> bool {
        true
    }

    fn page_no(&self) -> usize {
        1
    }

    fn accept_page_break(&mut self) -> bool {
        false
    }

    fn perform_page_break(&mut self) {}

    fn add_page_link(&mut self, _link: PageLink) {
        log::debug!("Link inside template {} ignored", self.id);
    }
}
