//! Drawing surface shared by documents and templates.
//!
//! A [`Canvas`] is anything that owns a content buffer, a graphics [`Surface`]
//! (position, margins, colors, font state) and access to the shared
//! [`Registry`]. [`Document`](crate::Document) and
//! [`Template`](crate::template::Template) both implement it, so every
//! drawing and text call is written once:
//!
//! - [`Canvas`]: state, colors, fonts, links and templates
//! - [`Draw`]: shapes, paths, clipping, transforms and images
//! - [`TextLayout`]: text, cells, multi-line cells and flowing text
//!
//! Every provided method is a no-op while the sticky error is set.

mod draw;
mod text;

pub use draw::Draw;
pub use text::{LineBreak, TextLayout};

use crate::config::Orientation;
use crate::document::links::{LinkTarget, PageLink};
use crate::document::registry::Registry;
use crate::error::{Error, Result};
use crate::fonts::{core_fonts, font_key, FontStyle, LoadedFont};
use crate::geometry::{Size, Unit};
use crate::template::Template;
use crate::writer::content_stream::op_bytes;
use crate::writer::{BlendMode, ContentStreamOp, LineCap, LineJoin};

/// A draw, fill or text color.
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    /// Gray level 0-1
    Gray(f64),
    /// RGB components 0-1
    Rgb(f64, f64, f64),
    /// Registered spot color and tint 0-1
    Spot { resource: String, tint: f64 },
}

impl Default for Color {
    fn default() -> Self {
        Color::Gray(0.0)
    }
}

impl Color {
    /// Color from 8-bit components; equal components give a gray level.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        if r == g && g == b {
            Color::Gray(r as f64 / 255.0)
        } else {
            Color::Rgb(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
        }
    }

    /// 8-bit RGB components; spot colors report black.
    pub fn to_rgb(&self) -> (u8, u8, u8) {
        let c = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        match self {
            Color::Gray(g) => (c(*g), c(*g), c(*g)),
            Color::Rgb(r, g, b) => (c(*r), c(*g), c(*b)),
            Color::Spot { .. } => (0, 0, 0),
        }
    }

    /// Operator selecting this color for filling.
    pub fn fill_op(&self) -> ContentStreamOp {
        match self {
            Color::Gray(g) => ContentStreamOp::SetFillColorGray(*g),
            Color::Rgb(r, g, b) => ContentStreamOp::SetFillColorRGB(*r, *g, *b),
            Color::Spot { resource, tint } => ContentStreamOp::SetFillSpot(resource.clone(), *tint),
        }
    }

    /// Operator selecting this color for stroking.
    pub fn stroke_op(&self) -> ContentStreamOp {
        match self {
            Color::Gray(g) => ContentStreamOp::SetStrokeColorGray(*g),
            Color::Rgb(r, g, b) => ContentStreamOp::SetStrokeColorRGB(*r, *g, *b),
            Color::Spot { resource, tint } => ContentStreamOp::SetStrokeSpot(resource.clone(), *tint),
        }
    }

    fn is_black(&self) -> bool {
        *self == Color::Gray(0.0)
    }
}

/// Graphics and layout state of one canvas.
///
/// Lengths are in user units unless the field name ends in `_pt`.
#[derive(Debug, Clone)]
pub struct Surface {
    pub unit: Unit,
    /// Points per user unit
    pub k: f64,
    pub orientation: Orientation,
    /// Current page size
    pub page_size: Size,
    pub page_size_pt: Size,
    pub l_margin: f64,
    pub t_margin: f64,
    pub r_margin: f64,
    pub b_margin: f64,
    /// Padding inside cells
    pub c_margin: f64,
    pub x: f64,
    pub y: f64,
    /// Height of the last printed cell
    pub lasth: f64,
    pub line_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    /// Dash lengths in points
    pub dash_array: Vec<f64>,
    pub dash_phase: f64,
    pub font_family: String,
    /// Bold/italic part of the style
    pub font_style: FontStyle,
    pub underline: bool,
    pub strikeout: bool,
    pub font_size_pt: f64,
    pub font_size: f64,
    /// Registry key of the current font
    pub current_font: Option<String>,
    /// Multiplier for the font's underline thickness
    pub underline_thickness: f64,
    pub draw_color: Color,
    pub fill_color: Color,
    pub text_color: Color,
    /// Fill and text colors differ
    pub color_flag: bool,
    /// Word spacing
    pub ws: f64,
    pub auto_page_break: bool,
    pub page_break_trigger: f64,
    pub in_header: bool,
    pub in_footer: bool,
    pub rtl: bool,
    pub clip_nest: usize,
    pub transform_nest: usize,
    pub alpha: f64,
    pub blend: BlendMode,
}

impl Surface {
    /// Default state for a page of `page_size_pt` points.
    ///
    /// Margins are 1 cm, the cell margin a tenth of that, and the automatic
    /// page break triggers 2 cm above the bottom edge.
    pub fn new(unit: Unit, orientation: Orientation, page_size_pt: Size) -> Self {
        let k = unit.scale_factor();
        let margin = 28.35 / k;
        let page_size = Size::new(page_size_pt.w / k, page_size_pt.h / k);
        Self {
            unit,
            k,
            orientation,
            page_size,
            page_size_pt,
            l_margin: margin,
            t_margin: margin,
            r_margin: margin,
            b_margin: 2.0 * margin,
            c_margin: margin / 10.0,
            x: margin,
            y: margin,
            lasth: 0.0,
            line_width: 0.567 / k,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            dash_array: Vec::new(),
            dash_phase: 0.0,
            font_family: String::new(),
            font_style: FontStyle::empty(),
            underline: false,
            strikeout: false,
            font_size_pt: 12.0,
            font_size: 12.0 / k,
            current_font: None,
            underline_thickness: 1.0,
            draw_color: Color::default(),
            fill_color: Color::default(),
            text_color: Color::default(),
            color_flag: false,
            ws: 0.0,
            auto_page_break: true,
            page_break_trigger: page_size.h - 2.0 * margin,
            in_header: false,
            in_footer: false,
            rtl: false,
            clip_nest: 0,
            transform_nest: 0,
            alpha: 1.0,
            blend: BlendMode::Normal,
        }
    }

    /// State for a template of `size` user units drawn from `parent`.
    ///
    /// Font, colors and line style carry over; the template has its own page
    /// size and never breaks pages.
    pub fn for_template(parent: &Surface, size: Size) -> Self {
        let mut s = parent.clone();
        s.page_size = size;
        s.page_size_pt = Size::new(size.w * s.k, size.h * s.k);
        s.x = s.l_margin;
        s.y = s.t_margin;
        s.auto_page_break = false;
        s.page_break_trigger = size.h - s.b_margin;
        s.in_header = false;
        s.in_footer = false;
        s.clip_nest = 0;
        s.transform_nest = 0;
        s.ws = 0.0;
        s
    }

    /// Page width in user units.
    pub fn w(&self) -> f64 {
        self.page_size.w
    }

    /// Page height in user units.
    pub fn h(&self) -> f64 {
        self.page_size.h
    }

    /// Convert a user-space y (top-left origin) to PDF points.
    pub fn y_pt(&self, y: f64) -> f64 {
        (self.page_size.h - y) * self.k
    }

    pub(crate) fn update_color_flag(&mut self) {
        self.color_flag = self.fill_color != self.text_color;
    }
}

/// Operations shared by documents and templates.
pub trait Canvas {
    /// Graphics state.
    fn surface(&self) -> &Surface;

    /// Graphics state, mutably.
    fn surface_mut(&mut self) -> &mut Surface;

    /// Shared resources and the sticky error.
    fn registry(&self) -> &Registry;

    /// Shared resources, mutably.
    fn registry_mut(&mut self) -> &mut Registry;

    /// Append bytes to the current content stream.
    fn write_content(&mut self, data: &[u8]);

    /// Returns true once content can be written.
    fn has_page(&self) -> bool;

    /// Current 1-based page number; 0 before the first page.
    fn page_no(&self) -> usize;

    /// Whether an automatic page break may happen now.
    fn accept_page_break(&mut self) -> bool;

    /// Start a new page with the current orientation and size.
    fn perform_page_break(&mut self);

    /// Record a clickable area on the current page.
    fn add_page_link(&mut self, link: PageLink);

    // Error state

    /// Returns true while no error is pending.
    fn ok(&self) -> bool {
        self.registry().error.is_none()
    }

    /// The pending error, if any.
    fn error(&self) -> Option<&Error> {
        self.registry().error.as_ref()
    }

    /// Store `err` unless an earlier error is pending.
    fn set_error(&mut self, err: Error) {
        self.registry_mut().set_error(err);
    }

    /// Store the error of `result`, returning its value.
    fn check<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.set_error(e);
                None
            },
        }
    }

    // Raw output

    /// Append a line of raw operator text.
    fn out(&mut self, s: &str) {
        let mut line = Vec::with_capacity(s.len() + 1);
        line.extend_from_slice(s.as_bytes());
        line.push(b'\n');
        self.write_content(&line);
    }

    /// Append operators on one line, separated by spaces.
    fn put_ops(&mut self, ops: &[ContentStreamOp]) {
        let mut line = Vec::new();
        for (i, op) in ops.iter().enumerate() {
            if i > 0 {
                line.push(b' ');
            }
            op.write_to(&mut line);
        }
        line.push(b'\n');
        self.write_content(&line);
    }

    /// Append one operator line.
    fn put_op(&mut self, op: ContentStreamOp) {
        let mut line = op_bytes(&op);
        line.push(b'\n');
        self.write_content(&line);
    }

    /// Append raw operator text to the current page.
    fn raw_write_str(&mut self, s: &str) {
        if self.ok() {
            self.out(s);
        }
    }

    /// Points per user unit.
    fn k(&self) -> f64 {
        self.surface().k
    }

    /// Emit the state every new page or template starts with.
    fn put_initial_state(&mut self) {
        let s = self.surface().clone();
        let mut ops = Vec::new();
        if s.line_cap != LineCap::Butt {
            ops.push(ContentStreamOp::SetLineCap(s.line_cap));
        }
        if s.line_join != LineJoin::Miter {
            ops.push(ContentStreamOp::SetLineJoin(s.line_join));
        }
        ops.push(ContentStreamOp::SetLineWidth(s.line_width * s.k));
        if !s.dash_array.is_empty() {
            ops.push(ContentStreamOp::SetDashPattern(s.dash_array.clone(), s.dash_phase));
        }
        self.put_ops(&ops);
        if let Some(font) = self.current_font() {
            let name = font.resource_name();
            self.put_ops(&[
                ContentStreamOp::BeginText,
                ContentStreamOp::SetFont(name, s.font_size_pt),
                ContentStreamOp::EndText,
            ]);
        }
        if !s.draw_color.is_black() {
            self.put_op(s.draw_color.stroke_op());
        }
        if !s.fill_color.is_black() {
            self.put_op(s.fill_color.fill_op());
        }
    }

    // Margins and position

    /// Set left, top and right margins; a negative right margin copies the left.
    fn set_margins(&mut self, left: f64, top: f64, right: f64) {
        if !self.ok() {
            return;
        }
        let s = self.surface_mut();
        s.l_margin = left;
        s.t_margin = top;
        s.r_margin = if right < 0.0 { left } else { right };
    }

    /// Set the left margin, moving x right if it now lies inside the margin.
    fn set_left_margin(&mut self, margin: f64) {
        if !self.ok() {
            return;
        }
        let has_page = self.has_page();
        let s = self.surface_mut();
        s.l_margin = margin;
        if has_page && s.x < margin {
            s.x = margin;
        }
    }

    /// Set the top margin.
    fn set_top_margin(&mut self, margin: f64) {
        if !self.ok() {
            return;
        }
        self.surface_mut().t_margin = margin;
    }

    /// Set the right margin.
    fn set_right_margin(&mut self, margin: f64) {
        if !self.ok() {
            return;
        }
        self.surface_mut().r_margin = margin;
    }

    /// Set the cell padding.
    fn set_cell_margin(&mut self, margin: f64) {
        if !self.ok() {
            return;
        }
        self.surface_mut().c_margin = margin;
    }

    /// Cell padding.
    fn cell_margin(&self) -> f64 {
        self.surface().c_margin
    }

    /// Left, top, right and bottom margins.
    fn margins(&self) -> (f64, f64, f64, f64) {
        let s = self.surface();
        (s.l_margin, s.t_margin, s.r_margin, s.b_margin)
    }

    /// Enable or disable automatic page breaks `margin` above the bottom edge.
    fn set_auto_page_break(&mut self, auto: bool, margin: f64) {
        if !self.ok() {
            return;
        }
        let s = self.surface_mut();
        s.auto_page_break = auto;
        s.b_margin = margin;
        s.page_break_trigger = s.page_size.h - margin;
    }

    /// Automatic page break flag and bottom margin.
    fn auto_page_break(&self) -> (bool, f64) {
        (self.surface().auto_page_break, self.surface().b_margin)
    }

    /// Current page size in user units.
    fn page_size(&self) -> Size {
        self.surface().page_size
    }

    /// Current x.
    fn x(&self) -> f64 {
        self.surface().x
    }

    /// Current y.
    fn y(&self) -> f64 {
        self.surface().y
    }

    /// Current x and y.
    fn xy(&self) -> (f64, f64) {
        (self.surface().x, self.surface().y)
    }

    /// Set x; negative values count from the right edge.
    fn set_x(&mut self, x: f64) {
        if !self.ok() {
            return;
        }
        let s = self.surface_mut();
        s.x = if x >= 0.0 { x } else { s.page_size.w + x };
    }

    /// Set y and move x back to the left margin; negative values count from
    /// the bottom edge.
    fn set_y(&mut self, y: f64) {
        if !self.ok() {
            return;
        }
        let s = self.surface_mut();
        s.x = s.l_margin;
        s.y = if y >= 0.0 { y } else { s.page_size.h + y };
    }

    /// Set y, then x.
    fn set_xy(&mut self, x: f64, y: f64) {
        self.set_y(y);
        self.set_x(x);
    }

    /// Line feed: x back to the left margin, y down by `h`, or by the last
    /// cell height when `h` is negative.
    fn ln(&mut self, h: f64) {
        if !self.ok() {
            return;
        }
        let s = self.surface_mut();
        s.x = s.l_margin;
        s.y += if h < 0.0 { s.lasth } else { h };
    }

    /// Switch to right-to-left text for UTF-8 fonts.
    fn rtl(&mut self) {
        if !self.ok() {
            return;
        }
        self.surface_mut().rtl = true;
    }

    /// Switch back to left-to-right text.
    fn ltr(&mut self) {
        if !self.ok() {
            return;
        }
        self.surface_mut().rtl = false;
    }

    // Colors

    /// Set the stroke color.
    fn set_draw_color(&mut self, r: u8, g: u8, b: u8) {
        self.apply_draw_color(Color::from_rgb(r, g, b));
    }

    /// Set the fill color.
    fn set_fill_color(&mut self, r: u8, g: u8, b: u8) {
        self.apply_fill_color(Color::from_rgb(r, g, b));
    }

    /// Set the text color.
    fn set_text_color(&mut self, r: u8, g: u8, b: u8) {
        self.apply_text_color(Color::from_rgb(r, g, b));
    }

    /// Stroke color.
    fn draw_color(&self) -> Color {
        self.surface().draw_color.clone()
    }

    /// Fill color.
    fn fill_color(&self) -> Color {
        self.surface().fill_color.clone()
    }

    /// Text color.
    fn text_color(&self) -> Color {
        self.surface().text_color.clone()
    }

    /// Set the stroke color from a [`Color`].
    fn apply_draw_color(&mut self, color: Color) {
        if !self.ok() {
            return;
        }
        self.surface_mut().draw_color = color.clone();
        if self.has_page() {
            self.put_op(color.stroke_op());
        }
    }

    /// Set the fill color from a [`Color`].
    fn apply_fill_color(&mut self, color: Color) {
        if !self.ok() {
            return;
        }
        let s = self.surface_mut();
        s.fill_color = color.clone();
        s.update_color_flag();
        if self.has_page() {
            self.put_op(color.fill_op());
        }
    }

    /// Set the text color from a [`Color`]; applied when text is drawn.
    fn apply_text_color(&mut self, color: Color) {
        if !self.ok() {
            return;
        }
        let s = self.surface_mut();
        s.text_color = color;
        s.update_color_flag();
    }

    /// Register a spot color with its CMYK fallback (components 0-100).
    fn add_spot_color(&mut self, name: &str, c: u8, m: u8, y: u8, k: u8) {
        if !self.ok() {
            return;
        }
        let result = self.registry_mut().add_spot_color(name, c, m, y, k);
        self.check(result);
    }

    /// Spot color `name` at `tint` percent.
    fn spot_color(&mut self, name: &str, tint: u8) -> Option<Color> {
        let result = self.registry().spot_color(name).map(|spot| Color::Spot {
            resource: spot.resource_name(),
            tint: tint.min(100) as f64 / 100.0,
        });
        self.check(result)
    }

    /// Stroke with a registered spot color.
    fn set_draw_spot_color(&mut self, name: &str, tint: u8) {
        if !self.ok() {
            return;
        }
        if let Some(color) = self.spot_color(name, tint) {
            self.apply_draw_color(color);
        }
    }

    /// Fill with a registered spot color.
    fn set_fill_spot_color(&mut self, name: &str, tint: u8) {
        if !self.ok() {
            return;
        }
        if let Some(color) = self.spot_color(name, tint) {
            self.apply_fill_color(color);
        }
    }

    /// Draw text with a registered spot color.
    fn set_text_spot_color(&mut self, name: &str, tint: u8) {
        if !self.ok() {
            return;
        }
        if let Some(color) = self.spot_color(name, tint) {
            self.apply_text_color(color);
        }
    }

    /// Set fill and stroke opacity (0-1) and the blend mode (empty means
    /// `Normal`).
    fn set_alpha(&mut self, alpha: f64, blend_mode: &str) {
        if !self.ok() {
            return;
        }
        let Some(blend) = BlendMode::from_name(blend_mode) else {
            self.set_error(Error::Render(format!("unrecognized blend mode \"{}\"", blend_mode)));
            return;
        };
        if !(0.0..=1.0).contains(&alpha) {
            self.set_error(Error::Render(format!("alpha value (0.0 - 1.0) is out of range: {:.3}", alpha)));
            return;
        }
        let s = self.surface_mut();
        s.alpha = alpha;
        s.blend = blend;
        let index = self.registry_mut().ext_gstate(alpha, blend);
        self.put_op(ContentStreamOp::SetExtGState(format!("GS{}", index)));
    }

    /// Current opacity and blend mode.
    fn alpha(&self) -> (f64, BlendMode) {
        (self.surface().alpha, self.surface().blend)
    }

    // Line style

    /// Set the line width.
    fn set_line_width(&mut self, width: f64) {
        if !self.ok() {
            return;
        }
        self.surface_mut().line_width = width;
        if self.has_page() {
            self.put_op(ContentStreamOp::SetLineWidth(width * self.k()));
        }
    }

    /// Line width.
    fn line_width(&self) -> f64 {
        self.surface().line_width
    }

    /// Set the cap style: `butt`, `round` or `square`.
    fn set_line_cap_style(&mut self, style: &str) {
        if !self.ok() {
            return;
        }
        let cap = LineCap::parse(style).unwrap_or_default();
        self.surface_mut().line_cap = cap;
        if self.has_page() {
            self.put_op(ContentStreamOp::SetLineCap(cap));
        }
    }

    /// Set the join style: `miter`, `round` or `bevel`.
    fn set_line_join_style(&mut self, style: &str) {
        if !self.ok() {
            return;
        }
        let join = LineJoin::parse(style).unwrap_or_default();
        self.surface_mut().line_join = join;
        if self.has_page() {
            self.put_op(ContentStreamOp::SetLineJoin(join));
        }
    }

    /// Set the dash pattern in user units; an empty array draws solid lines.
    fn set_dash_pattern(&mut self, dash_array: &[f64], phase: f64) {
        if !self.ok() {
            return;
        }
        let k = self.k();
        let scaled: Vec<f64> = dash_array.iter().map(|v| v * k).collect();
        let s = self.surface_mut();
        s.dash_array = scaled.clone();
        s.dash_phase = phase * k;
        if self.has_page() {
            self.put_op(ContentStreamOp::SetDashPattern(scaled, phase * k));
        }
    }

    // Fonts

    /// Current font, if one was set.
    fn current_font(&self) -> Option<&LoadedFont> {
        let key = self.surface().current_font.as_ref()?;
        self.registry().font(key)
    }

    /// Returns true if the current font is a UTF-8 font.
    fn is_current_utf8(&self) -> bool {
        self.current_font().map(|f| f.is_utf8()).unwrap_or(false)
    }

    /// Select a font.
    ///
    /// An empty family keeps the current one; `size` 0 keeps the current
    /// size. `arial` falls back to `helvetica` unless a font was registered
    /// under that name, and the symbolic core fonts ignore the style. Core
    /// fonts are registered on first use.
    fn set_font(&mut self, family: &str, style: &str, size: f64) {
        if !self.ok() {
            return;
        }
        let mut family = if family.is_empty() {
            self.surface().font_family.clone()
        } else {
            family.to_lowercase()
        };
        let flags = FontStyle::parse(style);
        let mut face = flags.face();
        let mut underline = flags.contains(FontStyle::UNDERLINE);
        let mut strikeout = flags.contains(FontStyle::STRIKEOUT);
        if !self.registry().has_font(&font_key(&family, face)) {
            family = core_fonts::resolve_family(&family);
        }
        if core_fonts::is_symbolic_family(&family) {
            face = FontStyle::empty();
            underline = false;
            strikeout = false;
        }
        let size = if size == 0.0 { self.surface().font_size_pt } else { size };

        let key = font_key(&family, face);
        if !self.registry().has_font(&key) {
            if core_fonts::is_core_family(&family) {
                let result = self.registry_mut().add_core_font(&key);
                if self.check(result).is_none() {
                    return;
                }
            } else {
                self.set_error(Error::Font(format!("undefined font: {} {}", family, style)));
                return;
            }
        }

        let k = self.k();
        let s = self.surface_mut();
        s.underline = underline;
        s.strikeout = strikeout;
        if s.current_font.as_deref() == Some(key.as_str()) && s.font_size_pt == size {
            return;
        }
        s.font_family = family;
        s.font_style = face;
        s.font_size_pt = size;
        s.font_size = size / k;
        s.current_font = Some(key);
        self.put_font();
    }

    /// Emit the current font selection if a page is open.
    fn put_font(&mut self) {
        if !self.has_page() {
            return;
        }
        let size = self.surface().font_size_pt;
        if let Some(name) = self.current_font().map(|f| f.resource_name()) {
            self.put_ops(&[
                ContentStreamOp::BeginText,
                ContentStreamOp::SetFont(name, size),
                ContentStreamOp::EndText,
            ]);
        }
    }

    /// Set the font size in points.
    fn set_font_size(&mut self, size: f64) {
        if !self.ok() || self.surface().font_size_pt == size {
            return;
        }
        let k = self.k();
        let s = self.surface_mut();
        s.font_size_pt = size;
        s.font_size = size / k;
        self.put_font();
    }

    /// Set the font size in user units.
    fn set_font_unit_size(&mut self, size: f64) {
        let k = self.k();
        self.set_font_size(size * k);
    }

    /// Change the style of the current family.
    fn set_font_style(&mut self, style: &str) {
        let family = self.surface().font_family.clone();
        self.set_font(&family, style, 0.0);
    }

    /// Font size in points and in user units.
    fn font_size(&self) -> (f64, f64) {
        (self.surface().font_size_pt, self.surface().font_size)
    }

    /// Scale the underline thickness of every font.
    fn set_underline_thickness(&mut self, factor: f64) {
        if !self.ok() {
            return;
        }
        self.surface_mut().underline_thickness = factor;
    }

    /// Width of `text` in 1/1000 em of the current font.
    fn string_symbol_width(&self, text: &str) -> u32 {
        self.current_font().map(|f| f.text_width(text)).unwrap_or(0)
    }

    /// Width of `text` in user units for the current font and size.
    fn string_width(&self, text: &str) -> f64 {
        self.string_symbol_width(text) as f64 * self.surface().font_size / 1000.0
    }

    /// Set the word spacing in user units.
    fn set_word_spacing(&mut self, space: f64) {
        if !self.ok() {
            return;
        }
        self.surface_mut().ws = space;
        let k = self.k();
        self.put_op(ContentStreamOp::SetWordSpacing(space * k));
    }

    /// Encode `text` for the current font and mark its runes as used.
    ///
    /// UTF-8 fonts reverse the text in right-to-left mode.
    fn encode_text(&mut self, text: &str) -> Result<Vec<u8>> {
        let ordered = self.visual_order(text);
        self.encode_exact(&ordered)
    }

    /// Returns `text` reversed when right-to-left mode applies to the
    /// current font.
    fn visual_order(&self, text: &str) -> String {
        if self.surface().rtl && self.is_current_utf8() {
            text.chars().rev().collect()
        } else {
            text.to_string()
        }
    }

    /// Encode `text` for the current font as given, marking its runes.
    fn encode_exact(&mut self, text: &str) -> Result<Vec<u8>> {
        let key = self
            .surface()
            .current_font
            .clone()
            .ok_or_else(|| Error::Render("font has not been set; unable to render text".to_string()))?;
        self.registry_mut()
            .font_mut(&key)
            .ok_or_else(|| Error::Font(format!("undefined font: {}", key)))?
            .encode(text)
    }

    // Links

    /// Put a clickable area leading to internal link `link`.
    fn link(&mut self, x: f64, y: f64, w: f64, h: f64, link: usize) {
        self.link_area(x, y, w, h, LinkTarget::Internal(link));
    }

    /// Put a clickable area leading to `url`.
    fn link_string(&mut self, x: f64, y: f64, w: f64, h: f64, url: &str) {
        self.link_area(x, y, w, h, LinkTarget::Uri(url.to_string()));
    }

    /// Put a clickable area, in user units.
    fn link_area(&mut self, x: f64, y: f64, w: f64, h: f64, target: LinkTarget) {
        if !self.ok() {
            return;
        }
        let s = self.surface();
        let link = PageLink {
            x: x * s.k,
            y: s.page_size_pt.h - y * s.k,
            w: w * s.k,
            h: h * s.k,
            target,
        };
        self.add_page_link(link);
    }

    // Templates

    /// Record a template of `size` user units and return its id, or 0 if
    /// the canvas has an error.
    ///
    /// The template starts with this canvas's font, colors and line style.
    /// Templates can be created inside templates.
    fn create_template<F>(&mut self, size: Size, build: F) -> usize
    where
        Self: Sized,
        F: FnOnce(&mut Template<'_>),
    {
        if !self.ok() {
            return 0;
        }
        let surface = Surface::for_template(self.surface(), size);
        let id = self.registry_mut().next_template_id();
        let mut template = Template::new(id, surface, self.registry_mut());
        template.put_initial_state();
        build(&mut template);
        match template.finish() {
            Ok(record) => {
                self.registry_mut().add_template(record);
                id
            },
            Err(e) => {
                self.set_error(e);
                0
            },
        }
    }

    /// Draw template `id` at the top-left corner in its own size.
    fn use_template(&mut self, id: usize) {
        let Some(size) = self.registry().template(id).map(|t| t.size) else {
            self.set_error(Error::Structural(format!("template {} does not exist", id)));
            return;
        };
        self.use_template_scaled(id, 0.0, 0.0, size.w, size.h);
    }

    /// Draw template `id` with its top-left corner at `(x, y)`, scaled to
    /// `w` x `h`.
    fn use_template_scaled(&mut self, id: usize, x: f64, y: f64, w: f64, h: f64) {
        if !self.ok() {
            return;
        }
        if !self.has_page() {
            self.set_error(Error::Structural("cannot use a template without a page".to_string()));
            return;
        }
        let found = self
            .registry()
            .template(id)
            .map(|t| (t.resource_name(), t.size.w, t.size.h));
        let Some((name, tw, th)) = found else {
            self.set_error(Error::Structural(format!("template {} does not exist", id)));
            return;
        };
        if tw <= 0.0 || th <= 0.0 {
            self.set_error(Error::Structural(format!("template {} has an empty size", id)));
            return;
        }
        let s = self.surface();
        let (sx, sy) = (w / tw, h / th);
        let (tx, ty) = (x * s.k, (s.page_size.h - y - h) * s.k);
        self.put_ops(&[
            ContentStreamOp::SaveState,
            ContentStreamOp::Transform(sx, 0.0, 0.0, sy, tx, ty),
            ContentStreamOp::PaintXObject(name),
            ContentStreamOp::RestoreState,
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_rgb() {
        assert_eq!(Color::from_rgb(0, 0, 0), Color::Gray(0.0));
        assert_eq!(Color::from_rgb(255, 0, 0), Color::Rgb(1.0, 0.0, 0.0));
        assert_eq!(Color::from_rgb(10, 20, 30).to_rgb(), (10, 20, 30));
    }

    #[test]
    fn test_color_ops() {
        let spot = Color::Spot {
            resource: "CS1".into(),
            tint: 0.5,
        };
        assert_eq!(op_bytes(&spot.fill_op()), b"/CS1 cs 0.500 scn");
        assert_eq!(op_bytes(&spot.stroke_op()), b"/CS1 CS 0.500 SCN");
        assert_eq!(op_bytes(&Color::Gray(0.0).stroke_op()), b"0.000 G");
    }

    #[test]
    fn test_surface_defaults() {
        let s = Surface::new(Unit::Millimeter, Orientation::Portrait, Size::new(595.28, 841.89));
        assert!((s.l_margin - 10.0).abs() < 1e-3);
        assert!((s.c_margin - 1.0).abs() < 1e-3);
        assert!((s.page_break_trigger - (s.h() - 20.0)).abs() < 1e-3);
        assert!((s.y_pt(0.0) - 841.89).abs() < 1e-9);
    }

    #[test]
    fn test_template_surface() {
        let mut parent = Surface::new(Unit::Point, Orientation::Portrait, Size::new(600.0, 800.0));
        parent.ws = 2.0;
        parent.in_header = true;
        let t = Surface::for_template(&parent, Size::new(100.0, 50.0));
        assert_eq!(t.page_size_pt, Size::new(100.0, 50.0));
        assert!(!t.auto_page_break);
        assert!(!t.in_header);
        assert_eq!(t.ws, 0.0);
    }
}
