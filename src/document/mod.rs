//! The root document.
//!
//! A [`Document`] owns the page list, the lifecycle state machine and every
//! document-level setting (metadata, links, outline, layers, attachments,
//! protection). Drawing and text operations come from the [`Canvas`],
//! [`Draw`](crate::canvas::Draw) and [`TextLayout`](crate::canvas::TextLayout)
//! traits, which templates implement too.
//!
//! Errors are sticky: the first failure is stored and every later call is a
//! no-op until [`Document::clear_error`] is called. [`Document::output`] and
//! friends hand the pending error back instead of producing bytes.
//!
//! ```
//! use pdf_quill::prelude::*;
//!
//! let mut doc = Document::new(DocumentConfig::testing());
//! doc.add_page();
//! doc.set_font("Arial", "B", 16.0);
//! doc.cell(40.0, 10.0, "Hello World!");
//! let pdf = doc.output_bytes().unwrap();
//! assert!(pdf.starts_with(b"%PDF-1."));
//! ```

pub mod links;
pub mod metadata;
pub mod registry;
pub mod spot;
mod serialize;

use crate::canvas::{Canvas, Surface};
use crate::config::{DocumentConfig, Orientation};
use crate::encryption::{Algorithm, Permissions};
use crate::error::{Error, Result};
use crate::fonts::FontStyle;
use crate::geometry::{PageBox, PageBoxKind, Rect, Size};
use crate::writer::xmp_metadata::{validate_xmp, XmpMetadata, XmpWriter};
use crate::writer::{ContentStreamOp, EmbeddedFile, LayerSet, OutlineBuilder, OutlineItem};
use chrono::{DateTime, Utc};
use links::{LinkDest, Links, PageLink};
use metadata::{fixed, Info, InfoText, LayoutMode, OutputIntent, ZoomMode};
use registry::Registry;
use std::io::{Read, Write};
use std::path::Path;

/// Callback run at the top or bottom of every page.
pub type PageFunc = Box<dyn FnMut(&mut Document) + Send>;

/// Predicate deciding whether an automatic page break happens.
pub type AcceptPageBreakFunc = Box<dyn FnMut(&mut Document) -> bool + Send>;

/// Lifecycle of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// Created; no page added yet
    Open,
    /// A page is being written
    Page,
    /// Serialized; nothing can be added
    Closed,
}

/// A file attached to a page through a `/FileAttachment` annotation.
#[derive(Debug, Clone)]
pub(crate) struct PageAttachment {
    pub file: EmbeddedFile,
    /// Rectangle in points; `y` is the top edge from the bottom of the page
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Content and overrides of one page.
#[derive(Debug, Clone)]
pub(crate) struct PageData {
    pub content: Vec<u8>,
    /// Oriented size in points
    pub size_pt: Size,
    pub orientation: Orientation,
    pub boxes: Vec<PageBox>,
    pub links: Vec<PageLink>,
    pub attachments: Vec<PageAttachment>,
}

#[derive(Debug, Clone)]
pub(crate) struct ProtectionRequest {
    pub algorithm: Algorithm,
    pub permissions: Permissions,
    pub user_password: Vec<u8>,
    pub owner_password: Vec<u8>,
}

/// A PDF document under construction.
pub struct Document {
    config: DocumentConfig,
    state: DocumentState,
    surface: Surface,
    registry: Registry,
    pages: Vec<PageData>,
    /// Current 1-based page, 0 before the first page
    page: usize,
    default_orientation: Orientation,
    /// Default size in points, portrait
    default_size_pt: Size,
    default_boxes: Vec<PageBox>,
    header: Option<PageFunc>,
    footer: Option<PageFunc>,
    accept_page_break_fn: Option<AcceptPageBreakFunc>,
    links: Links,
    outline: OutlineBuilder,
    layers: LayerSet,
    current_layer: Option<usize>,
    attachments: Vec<EmbeddedFile>,
    info: Info,
    lang: Option<String>,
    zoom: ZoomMode,
    layout: LayoutMode,
    xmp: Option<Vec<u8>>,
    output_intents: Vec<OutputIntent>,
    alias_nb_pages: Option<String>,
    protection: Option<ProtectionRequest>,
    buffer: Vec<u8>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("state", &self.state)
            .field("pages", &self.pages.len())
            .field("page", &self.page)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn oriented(orientation: Orientation, portrait: Size) -> Size {
    match orientation {
        Orientation::Portrait => portrait,
        Orientation::Landscape => portrait.swapped(),
    }
}

impl Document {
    /// Create a document.
    ///
    /// An invalid page size is stored as the pending error and the document
    /// falls back to A4; use [`try_new`](Self::try_new) to get it directly.
    pub fn new(config: DocumentConfig) -> Self {
        match config.page_size.to_points(config.unit) {
            Ok(size) => Self::with_size(config, size),
            Err(e) => {
                let fallback = Size::new(595.28, 841.89);
                let mut doc = Self::with_size(config, fallback);
                doc.set_error(e);
                doc
            },
        }
    }

    /// Create a document, failing on an invalid configuration.
    pub fn try_new(config: DocumentConfig) -> Result<Self> {
        let size = config.page_size.to_points(config.unit)?;
        Ok(Self::with_size(config, size))
    }

    fn with_size(config: DocumentConfig, portrait_pt: Size) -> Self {
        let orientation = config.orientation;
        let surface = Surface::new(config.unit, orientation, oriented(orientation, portrait_pt));
        let registry = Registry::new(config.font_dir.clone(), config.loader.clone());
        let creation = config.creation_date.map(fixed);
        let info = Info {
            producer: config.producer.clone(),
            creation_date: creation,
            mod_date: config.mod_date.map(fixed).or(creation),
            ..Info::default()
        };
        log::debug!(
            "New document: {:?} {}x{} pt, unit {}",
            orientation,
            portrait_pt.w,
            portrait_pt.h,
            config.unit.as_str()
        );
        Self {
            config,
            state: DocumentState::Open,
            surface,
            registry,
            pages: Vec::new(),
            page: 0,
            default_orientation: orientation,
            default_size_pt: portrait_pt,
            default_boxes: Vec::new(),
            header: None,
            footer: None,
            accept_page_break_fn: None,
            links: Links::default(),
            outline: OutlineBuilder::new(),
            layers: LayerSet::new(),
            current_layer: None,
            attachments: Vec::new(),
            info,
            lang: None,
            zoom: ZoomMode::default(),
            layout: LayoutMode::default(),
            xmp: None,
            output_intents: Vec::new(),
            alias_nb_pages: None,
            protection: None,
            buffer: Vec::new(),
        }
    }

    /// Construction options.
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Lifecycle state.
    pub fn state(&self) -> DocumentState {
        self.state
    }

    // Error state

    /// Remove and return the pending error, re-enabling the document.
    pub fn take_error(&mut self) -> Option<Error> {
        self.registry.error.take()
    }

    /// Discard the pending error.
    pub fn clear_error(&mut self) {
        self.registry.error = None;
    }

    // Pages

    /// Start a page with the default orientation and size.
    ///
    /// The footer of the previous page and the header of the new one run
    /// here. Font, line width and colors carry over to the new page.
    pub fn add_page(&mut self) {
        let orientation = self.default_orientation;
        let size = oriented(orientation, self.default_size_pt);
        self.add_page_oriented(orientation, size);
    }

    /// Start a page with its own orientation and portrait `size` in user units.
    pub fn add_page_format(&mut self, orientation: Orientation, size: Size) {
        if size.is_empty() {
            self.set_error(Error::Configuration(format!("invalid page size {}x{}", size.w, size.h)));
            return;
        }
        let size_pt = size.to_points(self.surface.unit);
        self.add_page_oriented(orientation, oriented(orientation, size_pt));
    }

    fn add_page_oriented(&mut self, orientation: Orientation, size_pt: Size) {
        if !self.ok() {
            return;
        }
        if self.state == DocumentState::Closed {
            self.set_error(Error::Structural("cannot add a page to a closed document".to_string()));
            return;
        }
        let saved = self.surface.clone();
        if self.page > 0 {
            self.run_footer();
            self.end_page();
        }
        self.begin_page(orientation, size_pt);
        self.restore_style(&saved);
        self.put_initial_state();
        self.run_header();
        self.reapply_style(&saved);
    }

    fn begin_page(&mut self, orientation: Orientation, size_pt: Size) {
        self.pages.push(PageData {
            content: Vec::new(),
            size_pt,
            orientation,
            boxes: self.default_boxes.clone(),
            links: Vec::new(),
            attachments: Vec::new(),
        });
        self.page = self.pages.len();
        self.state = DocumentState::Page;
        let s = &mut self.surface;
        s.orientation = orientation;
        s.page_size_pt = size_pt;
        s.page_size = Size::new(size_pt.w / s.k, size_pt.h / s.k);
        s.page_break_trigger = s.page_size.h - s.b_margin;
        s.x = s.l_margin;
        s.y = s.t_margin;
        log::debug!("Started page {} ({}x{} pt)", self.page, size_pt.w, size_pt.h);
    }

    fn end_page(&mut self) {
        self.end_layer();
    }

    /// Copy the style of `saved` back without emitting operators.
    fn restore_style(&mut self, saved: &Surface) {
        let s = &mut self.surface;
        s.line_width = saved.line_width;
        s.font_family = saved.font_family.clone();
        s.font_style = saved.font_style;
        s.underline = saved.underline;
        s.strikeout = saved.strikeout;
        s.font_size_pt = saved.font_size_pt;
        s.font_size = saved.font_size;
        s.current_font = saved.current_font.clone();
        s.draw_color = saved.draw_color.clone();
        s.fill_color = saved.fill_color.clone();
        s.text_color = saved.text_color.clone();
        s.color_flag = saved.color_flag;
    }

    /// Re-emit whatever the header changed.
    fn reapply_style(&mut self, saved: &Surface) {
        if self.surface.line_width != saved.line_width {
            self.set_line_width(saved.line_width);
        }
        if saved.current_font.is_some() {
            let mut style = saved.font_style.key_suffix().to_string();
            if saved.underline {
                style.push('U');
            }
            if saved.strikeout {
                style.push('S');
            }
            self.set_font(&saved.font_family, &style, saved.font_size_pt);
        }
        if self.surface.draw_color != saved.draw_color {
            self.apply_draw_color(saved.draw_color.clone());
        }
        if self.surface.fill_color != saved.fill_color {
            self.apply_fill_color(saved.fill_color.clone());
        }
        self.surface.text_color = saved.text_color.clone();
        self.surface.color_flag = saved.color_flag;
    }

    fn run_header(&mut self) {
        if let Some(mut f) = self.header.take() {
            self.surface.in_header = true;
            f(self);
            self.surface.in_header = false;
            if self.header.is_none() {
                self.header = Some(f);
            }
        }
    }

    fn run_footer(&mut self) {
        if let Some(mut f) = self.footer.take() {
            self.surface.in_footer = true;
            f(self);
            self.surface.in_footer = false;
            if self.footer.is_none() {
                self.footer = Some(f);
            }
        }
    }

    /// Resume writing on page `n` (1-based). Out-of-range numbers are ignored.
    pub fn set_page(&mut self, n: usize) {
        if !self.ok() || self.state != DocumentState::Page {
            return;
        }
        let Some(page) = n.checked_sub(1).and_then(|i| self.pages.get(i)) else {
            return;
        };
        let (orientation, size_pt) = (page.orientation, page.size_pt);
        self.end_layer();
        self.page = n;
        let s = &mut self.surface;
        s.orientation = orientation;
        s.page_size_pt = size_pt;
        s.page_size = Size::new(size_pt.w / s.k, size_pt.h / s.k);
        s.page_break_trigger = s.page_size.h - s.b_margin;
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Size of page `n` (1-based) in user units.
    pub fn page_size_at(&self, n: usize) -> Option<Size> {
        let k = self.surface.k;
        n.checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .map(|p| Size::new(p.size_pt.w / k, p.size_pt.h / k))
    }

    /// Set a crop, bleed, trim or art box in user units.
    ///
    /// Applies to the current page, or to every later page when no page
    /// has been added yet.
    pub fn set_page_box(&mut self, kind: PageBoxKind, x: f64, y: f64, w: f64, h: f64) {
        if !self.ok() {
            return;
        }
        let k = self.surface.k;
        let page_box = PageBox {
            kind,
            rect: Rect::new(x * k, y * k, w * k, h * k),
        };
        let boxes = match self.page.checked_sub(1).and_then(|i| self.pages.get_mut(i)) {
            Some(page) => &mut page.boxes,
            None => &mut self.default_boxes,
        };
        boxes.retain(|b| b.kind != kind);
        boxes.push(page_box);
    }

    /// Replace `alias` (default `{nb}`) with the page count when the
    /// document is closed.
    pub fn alias_nb_pages(&mut self, alias: &str) {
        if !self.ok() {
            return;
        }
        let alias = if alias.is_empty() { "{nb}" } else { alias };
        self.alias_nb_pages = Some(alias.to_string());
    }

    // Callbacks

    /// Run `f` at the top of every page.
    pub fn set_header_func(&mut self, f: impl FnMut(&mut Document) + Send + 'static) {
        if !self.ok() {
            return;
        }
        self.header = Some(Box::new(f));
    }

    /// Run `f` at the bottom of every page, including the last one on close.
    pub fn set_footer_func(&mut self, f: impl FnMut(&mut Document) + Send + 'static) {
        if !self.ok() {
            return;
        }
        self.footer = Some(Box::new(f));
    }

    /// Decide automatic page breaks with `f` instead of the auto-break flag.
    ///
    /// Returning false suppresses the break; the callback may move the
    /// position (for example to the next column) before doing so.
    pub fn set_accept_page_break_func(&mut self, f: impl FnMut(&mut Document) -> bool + Send + 'static) {
        if !self.ok() {
            return;
        }
        self.accept_page_break_fn = Some(Box::new(f));
    }

    // Fonts

    /// Register a font from a JSON definition file in the font directory.
    pub fn add_font(&mut self, family: &str, style: &str, definition_file: &str) {
        if !self.ok() {
            return;
        }
        let result = self
            .registry
            .read_font_file(definition_file)
            .and_then(|json| self.registry.add_font_from_json(family, FontStyle::parse(style).face(), &json, None));
        self.check(result);
    }

    /// Register a font from a JSON definition and an optional font program.
    pub fn add_font_from_json(&mut self, family: &str, style: &str, json: &[u8], font_file: Option<&[u8]>) {
        if !self.ok() {
            return;
        }
        let result = self
            .registry
            .add_font_from_json(family, FontStyle::parse(style).face(), json, font_file);
        self.check(result);
    }

    /// Register a font from a reader yielding its JSON definition.
    pub fn add_font_from_reader(&mut self, family: &str, style: &str, mut reader: impl Read) {
        if !self.ok() {
            return;
        }
        let mut json = Vec::new();
        if let Err(e) = reader.read_to_end(&mut json) {
            self.set_error(e.into());
            return;
        }
        self.add_font_from_json(family, style, &json, None);
    }

    /// Embed a TrueType font with 8-bit WinAnsi encoding.
    pub fn add_truetype_font(&mut self, family: &str, style: &str, data: &[u8]) {
        if !self.ok() {
            return;
        }
        let result = self
            .registry
            .add_truetype_font(family, FontStyle::parse(style).face(), data);
        self.check(result);
    }

    /// Embed a Type1 font from AFM metrics and a PFB program.
    pub fn add_type1_font(&mut self, family: &str, style: &str, afm: &[u8], pfb: &[u8]) {
        if !self.ok() {
            return;
        }
        let result = self
            .registry
            .add_type1_font(family, FontStyle::parse(style).face(), afm, pfb);
        self.check(result);
    }

    /// Embed a subset TrueType font for full Unicode text, read from the
    /// font directory.
    pub fn add_utf8_font(&mut self, family: &str, style: &str, file: &str) {
        if !self.ok() {
            return;
        }
        let result = self
            .registry
            .add_utf8_font(family, FontStyle::parse(style).face(), file);
        self.check(result);
    }

    /// Embed a subset TrueType font for full Unicode text.
    pub fn add_utf8_font_from_bytes(&mut self, family: &str, style: &str, data: &[u8]) {
        if !self.ok() {
            return;
        }
        let result = self
            .registry
            .add_utf8_font_from_bytes(family, FontStyle::parse(style).face(), data);
        self.check(result);
    }

    /// Directory searched for fonts given by relative path.
    pub fn set_font_location(&mut self, dir: impl Into<std::path::PathBuf>) {
        if !self.ok() {
            return;
        }
        self.registry.set_font_dir(dir);
    }

    // Links and outline

    /// Allocate an internal link id; point it somewhere with [`set_link`](Self::set_link).
    ///
    /// After an error nothing is allocated and the id that would have been
    /// assigned is returned.
    pub fn add_link(&mut self) -> usize {
        if !self.ok() {
            return self.links.len() + 1;
        }
        self.links.add()
    }

    /// Point link `id` at `y` (negative: current y) on `page` (`None`:
    /// current page).
    pub fn set_link(&mut self, id: usize, y: f64, page: Option<usize>) {
        if !self.ok() {
            return;
        }
        let y = if y < 0.0 { self.surface.y } else { y };
        let page = page.unwrap_or(self.page);
        if !self.links.set(id, LinkDest { page, y }) {
            self.set_error(Error::Structural(format!("link {} does not exist", id)));
        }
    }

    /// Add an outline entry for the current page at `y` (negative: current y).
    pub fn bookmark(&mut self, text: &str, level: usize, y: f64) {
        if !self.ok() {
            return;
        }
        let y = if y < 0.0 { self.surface.y } else { y };
        let s = &self.surface;
        self.outline.add(OutlineItem {
            title: text.to_string(),
            level,
            page: self.page,
            y: (s.page_size.h - y) * s.k,
        });
    }

    // Layers

    /// Define an optional content group and return its id.
    pub fn add_layer(&mut self, name: &str, visible: bool) -> usize {
        if !self.ok() {
            return self.layers.len();
        }
        self.layers.add(name, visible)
    }

    /// Put following content in layer `id`; ends any open layer first.
    pub fn begin_layer(&mut self, id: usize) {
        if !self.ok() {
            return;
        }
        self.end_layer();
        if self.layers.get(id).is_none() {
            self.set_error(Error::Structural(format!("layer {} does not exist", id)));
            return;
        }
        self.put_op(ContentStreamOp::BeginOptionalContent(LayerSet::resource_name(id)));
        self.current_layer = Some(id);
    }

    /// Close the open layer, if any.
    pub fn end_layer(&mut self) {
        if !self.ok() {
            return;
        }
        if self.current_layer.take().is_some() {
            self.put_op(ContentStreamOp::EndMarkedContent);
        }
    }

    /// Show the layer panel when the document is opened.
    pub fn open_layer_pane(&mut self) {
        if !self.ok() {
            return;
        }
        self.layers.open_pane = true;
    }

    // Attachments

    /// Replace the document-level attachments.
    pub fn set_attachments(&mut self, files: Vec<EmbeddedFile>) {
        if !self.ok() {
            return;
        }
        self.attachments = files;
    }

    /// Attach `file` to the current page behind a clickable area in user units.
    pub fn add_attachment_annotation(&mut self, file: EmbeddedFile, x: f64, y: f64, w: f64, h: f64) {
        if !self.ok() {
            return;
        }
        let s = &self.surface;
        let attachment = PageAttachment {
            file,
            x: x * s.k,
            y: s.page_size_pt.h - y * s.k,
            w: w * s.k,
            h: h * s.k,
        };
        match self.page.checked_sub(1).and_then(|i| self.pages.get_mut(i)) {
            Some(page) => page.attachments.push(attachment),
            None => self.set_error(Error::Structural("cannot attach a file without a page".to_string())),
        }
    }

    // Metadata

    /// Document title; `utf8` writes it as UTF-16BE.
    pub fn set_title(&mut self, title: &str, utf8: bool) {
        if !self.ok() {
            return;
        }
        self.info.title = Some(InfoText::new(title, utf8));
    }

    /// Document subject.
    pub fn set_subject(&mut self, subject: &str, utf8: bool) {
        if !self.ok() {
            return;
        }
        self.info.subject = Some(InfoText::new(subject, utf8));
    }

    /// Document author.
    pub fn set_author(&mut self, author: &str, utf8: bool) {
        if !self.ok() {
            return;
        }
        self.info.author = Some(InfoText::new(author, utf8));
    }

    /// Keywords, separated by spaces.
    pub fn set_keywords(&mut self, keywords: &str, utf8: bool) {
        if !self.ok() {
            return;
        }
        self.info.keywords = Some(InfoText::new(keywords, utf8));
    }

    /// Application that created the content.
    pub fn set_creator(&mut self, creator: &str, utf8: bool) {
        if !self.ok() {
            return;
        }
        self.info.creator = Some(InfoText::new(creator, utf8));
    }

    /// Value of the `/Producer` entry.
    pub fn set_producer(&mut self, producer: &str) {
        if !self.ok() {
            return;
        }
        self.info.producer = producer.to_string();
    }

    /// Creation date; also the modification date unless one is set.
    pub fn set_creation_date(&mut self, date: DateTime<Utc>) {
        if !self.ok() {
            return;
        }
        self.info.creation_date = Some(fixed(date));
    }

    /// Modification date.
    pub fn set_modification_date(&mut self, date: DateTime<Utc>) {
        if !self.ok() {
            return;
        }
        self.info.mod_date = Some(fixed(date));
    }

    /// Natural language of the document, e.g. `en-US`.
    pub fn set_lang(&mut self, lang: &str) {
        if !self.ok() {
            return;
        }
        self.lang = Some(lang.to_string());
    }

    /// Initial zoom (`fullpage`, `fullwidth`, `real`, `default` or a
    /// percentage) and layout (`single`, `continuous`, `two`, `default`).
    pub fn set_display_mode(&mut self, zoom: &str, layout: &str) {
        if !self.ok() {
            return;
        }
        let parsed = zoom.parse::<ZoomMode>().and_then(|z| layout.parse::<LayoutMode>().map(|l| (z, l)));
        if let Some((zoom, layout)) = self.check(parsed) {
            self.zoom = zoom;
            self.layout = layout;
        }
    }

    /// Embed `packet` as the document's XMP metadata stream.
    pub fn set_xmp_metadata(&mut self, packet: &[u8]) {
        if !self.ok() {
            return;
        }
        if self.check(validate_xmp(packet)).is_some() {
            self.xmp = Some(packet.to_vec());
        }
    }

    /// Embed an XMP packet generated from the information set so far.
    pub fn generate_xmp_metadata(&mut self) {
        if !self.ok() {
            return;
        }
        let value = |t: &Option<InfoText>| t.as_ref().map(|t| t.value.clone());
        let created = self.info.creation_date.unwrap_or_else(|| fixed(Utc::now()));
        let metadata = XmpMetadata {
            title: value(&self.info.title),
            creators: value(&self.info.author).into_iter().collect(),
            description: value(&self.info.subject),
            keywords: value(&self.info.keywords),
            creator_tool: value(&self.info.creator),
            producer: Some(self.info.producer.clone()).filter(|p| !p.is_empty()),
            create_date: Some(created.to_rfc3339()),
            modify_date: Some(self.info.mod_date.unwrap_or(created).to_rfc3339()),
            language: self.lang.clone(),
        };
        self.xmp = Some(XmpWriter::new(metadata).build_bytes());
    }

    /// Add an output intent; raises the file version to 1.4.
    pub fn add_output_intent(&mut self, intent: OutputIntent) {
        if !self.ok() {
            return;
        }
        self.output_intents.push(intent);
    }

    /// Turn Flate compression of streams on or off.
    pub fn set_compression(&mut self, compress: bool) {
        if !self.ok() {
            return;
        }
        self.config.compress = compress;
    }

    /// Write dictionary keys in sorted order.
    pub fn set_catalog_sort(&mut self, sort: bool) {
        if !self.ok() {
            return;
        }
        self.config.catalog_sort = sort;
    }

    // Protection

    /// Protect the document with 40-bit RC4.
    ///
    /// An empty owner password is replaced by a random one.
    pub fn set_protection(&mut self, permissions: Permissions, user_password: &str, owner_password: &str) {
        self.set_protection_with(Algorithm::Rc4_40, permissions, user_password, owner_password);
    }

    /// Protect the document with `algorithm`; [`Algorithm::None`] removes
    /// protection.
    pub fn set_protection_with(
        &mut self,
        algorithm: Algorithm,
        permissions: Permissions,
        user_password: &str,
        owner_password: &str,
    ) {
        if !self.ok() {
            return;
        }
        if algorithm == Algorithm::None {
            self.protection = None;
            return;
        }
        self.protection = Some(ProtectionRequest {
            algorithm,
            permissions,
            user_password: user_password.as_bytes().to_vec(),
            owner_password: owner_password.as_bytes().to_vec(),
        });
    }

    // Output

    /// Finish the document: run the last footer and serialize.
    ///
    /// Adds a page if none exists. Calling it again does nothing. Open
    /// clipping or transformation contexts are an error.
    pub fn close(&mut self) {
        if self.state == DocumentState::Closed || !self.ok() {
            return;
        }
        if self.surface.clip_nest > 0 {
            self.set_error(Error::Structural("clip procedure must be explicitly ended".to_string()));
            return;
        }
        if self.surface.transform_nest > 0 {
            self.set_error(Error::Structural(
                "transformation procedure must be explicitly ended".to_string(),
            ));
            return;
        }
        if self.page == 0 {
            self.add_page();
            if !self.ok() {
                return;
            }
        }
        self.run_footer();
        self.end_page();
        if !self.ok() {
            return;
        }
        match serialize::write_document(self) {
            Ok(bytes) => {
                log::info!("Closed document: {} pages, {} bytes", self.pages.len(), bytes.len());
                self.buffer = bytes;
            },
            Err(e) => self.set_error(e),
        }
        self.state = DocumentState::Closed;
    }

    fn finished_bytes(&mut self) -> Result<&[u8]> {
        self.close();
        if let Some(e) = self.take_error() {
            return Err(e);
        }
        if self.buffer.is_empty() {
            return Err(Error::Structural("document produced no output".to_string()));
        }
        Ok(&self.buffer)
    }

    /// Close the document and write it to `w`.
    ///
    /// A pending error is removed from the document and returned instead.
    pub fn output(&mut self, w: &mut impl Write) -> Result<()> {
        let bytes = self.finished_bytes()?;
        w.write_all(bytes)?;
        Ok(())
    }

    /// Close the document and return its bytes.
    pub fn output_bytes(&mut self) -> Result<Vec<u8>> {
        self.finished_bytes().map(<[u8]>::to_vec)
    }

    /// Close the document and write it to `path` through the configured loader.
    pub fn output_file_and_close(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let loader = self.config.loader.clone();
        let bytes = self.finished_bytes()?;
        loader.write_file(path.as_ref(), bytes)?;
        log::info!("Wrote {}", path.as_ref().display());
        Ok(())
    }

    fn current_page_mut(&mut self) -> Option<&mut PageData> {
        self.page.checked_sub(1).and_then(|i| self.pages.get_mut(i))
    }
}

impl Canvas for Document {
    fn surface(&self) -> &Surface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    fn registry(&self) -> &Registry {
        &self.registry
    }

    fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    fn write_content(&mut self, data: &[u8]) {
        match self.state {
            DocumentState::Page => {
                if let Some(page) = self.current_page_mut() {
                    page.content.extend_from_slice(data);
                }
            },
            DocumentState::Open => {
                self.set_error(Error::Structural("no page has been added yet".to_string()));
            },
            DocumentState::Closed => {
                self.set_error(Error::Structural("document is closed".to_string()));
            },
        }
    }

    fn has_page(&self) -> bool {
        self.state == DocumentState::Page
    }

    fn page_no(&self) -> usize {
        self.page
    }

    fn accept_page_break(&mut self) -> bool {
        match self.accept_page_break_fn.take() {
            Some(mut f) => {
                let accept = f(self);
                if self.accept_page_break_fn.is_none() {
                    self.accept_page_break_fn = Some(f);
                }
                accept
            },
            None => self.surface.auto_page_break,
        }
    }

    fn perform_page_break(&mut self) {
        let orientation = self.surface.orientation;
        let size = self.surface.page_size_pt;
        self.add_page_oriented(orientation, size);
    }

    fn add_page_link(&mut self, link: PageLink) {
        match self.current_page_mut() {
            Some(page) => page.links.push(link),
            None => self.set_error(Error::Structural("cannot add a link without a page".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Draw, LineBreak, TextLayout};
    use crate::geometry::Unit;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn doc() -> Document {
        Document::new(DocumentConfig::testing())
    }

    fn page_text(doc: &Document, n: usize) -> String {
        String::from_utf8_lossy(&doc.pages[n - 1].content).into_owned()
    }

    #[test]
    fn test_invalid_page_size_is_sticky() {
        let config = DocumentConfig::testing().with_page_size(crate::config::PageSize::Named("B12".into()));
        assert!(Document::try_new(config.clone()).is_err());
        let mut d = Document::new(config);
        assert!(matches!(d.error(), Some(Error::Configuration(_))));
        d.add_page();
        assert_eq!(d.page_count(), 0);
    }

    #[test]
    fn test_drawing_without_page_fails() {
        let mut d = doc();
        d.out("0 0 m");
        assert!(matches!(d.error(), Some(Error::Structural(_))));
    }

    #[test]
    fn test_add_page_resets_position_and_keeps_font() {
        let mut d = doc();
        d.add_page();
        d.set_font("helvetica", "B", 14.0);
        d.set_draw_color(255, 0, 0);
        d.set_xy(50.0, 80.0);
        d.add_page();
        assert_eq!(d.page_no(), 2);
        assert_eq!(d.xy(), (d.surface.l_margin, d.surface.t_margin));
        let second = page_text(&d, 2);
        assert!(second.contains("BT /F1 14.00 Tf ET"));
        assert!(second.contains("1.000 0.000 0.000 RG"));
    }

    #[test]
    fn test_header_and_footer_flags() {
        let seen = Arc::new(AtomicUsize::new(0));
        let footer_seen = seen.clone();
        let mut d = doc();
        d.set_header_func(|d| {
            assert!(d.surface().in_header);
            d.set_font("courier", "", 8.0);
            d.cell(0.0, 5.0, "header");
        });
        d.set_footer_func(move |d| {
            assert!(d.surface().in_footer);
            footer_seen.fetch_add(1, Ordering::SeqCst);
        });
        d.add_page();
        d.add_page();
        d.close();
        assert!(d.ok(), "{:?}", d.error());
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert!(!d.surface.in_header);
        assert!(page_text(&d, 2).contains("(header) Tj"));
    }

    #[test]
    fn test_accept_page_break_callback_can_refuse() {
        let mut d = doc();
        d.set_accept_page_break_func(|d| {
            d.set_y(20.0);
            false
        });
        d.add_page();
        d.set_font("courier", "", 12.0);
        for _ in 0..100 {
            d.cell_format(10.0, 10.0, "x", "", LineBreak::NextLine, "", false, None);
        }
        assert!(d.ok());
        assert_eq!(d.page_count(), 1);
    }

    #[test]
    fn test_set_page_resumes_earlier_page() {
        let mut d = Document::new(DocumentConfig::testing().with_unit(Unit::Point));
        d.add_page();
        d.add_page_format(Orientation::Landscape, Size::new(100.0, 200.0));
        assert_eq!(d.page_size_at(2), Some(Size::new(200.0, 100.0)));
        d.set_page(1);
        assert_eq!(d.page_no(), 1);
        d.out("% back on one");
        assert!(page_text(&d, 1).contains("% back on one"));
        d.set_page(7);
        assert_eq!(d.page_no(), 1);
    }

    #[test]
    fn test_unbalanced_clip_fails_close() {
        let mut d = doc();
        d.add_page();
        d.clip_rect(0.0, 0.0, 10.0, 10.0, false);
        d.close();
        assert!(matches!(d.error(), Some(Error::Structural(_))));
        assert_ne!(d.state(), DocumentState::Closed);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut d = doc();
        d.close();
        assert_eq!(d.page_count(), 1);
        let first = d.buffer.clone();
        d.close();
        assert_eq!(d.buffer, first);
        assert!(first.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn test_output_returns_pending_error() {
        let mut d = doc();
        d.add_page();
        d.set_font("nosuchfont", "", 10.0);
        let err = d.output_bytes().unwrap_err();
        assert!(matches!(err, Error::Font(_)));
    }

    #[test]
    fn test_links_and_bookmarks() {
        let mut d = Document::new(DocumentConfig::testing().with_unit(Unit::Point));
        d.add_page();
        let id = d.add_link();
        d.set_link(id, 100.0, None);
        d.link(10.0, 10.0, 20.0, 20.0, id);
        d.bookmark("Start", 0, -1.0);
        assert_eq!(d.pages[0].links.len(), 1);
        assert_eq!(d.outline.items()[0].page, 1);
        d.set_link(99, 0.0, None);
        assert!(d.error().is_some());
    }

    #[test]
    fn test_layers_emit_marked_content() {
        let mut d = doc();
        let id = d.add_layer("Notes", false);
        d.add_page();
        d.begin_layer(id);
        d.begin_layer(id);
        d.end_layer();
        assert_eq!(page_text(&d, 1).matches("/OC /OC0 BDC").count(), 2);
        assert_eq!(page_text(&d, 1).matches("EMC").count(), 2);
    }

    #[test]
    fn test_page_box_before_first_page_is_default() {
        let mut d = Document::new(DocumentConfig::testing().with_unit(Unit::Point));
        d.set_page_box(PageBoxKind::Crop, 10.0, 10.0, 100.0, 100.0);
        d.add_page();
        d.add_page();
        assert_eq!(d.pages[1].boxes.len(), 1);
        d.set_page_box(PageBoxKind::Crop, 0.0, 0.0, 50.0, 50.0);
        assert_eq!(d.pages[1].boxes[0].rect.w, 50.0);
        assert_eq!(d.pages[0].boxes[0].rect.w, 100.0);
    }
}
