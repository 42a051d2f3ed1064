//! Text placement: single strings, cells, wrapped cells and flowing text.

use super::Canvas;
use crate::document::links::LinkTarget;
use crate::error::Error;
use crate::writer::{ContentStreamOp, TextArrayItem};

/// Where the position goes after a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineBreak {
    /// To the right of the cell
    #[default]
    Right,
    /// To the start of the next line
    NextLine,
    /// Below the cell, keeping x
    Below,
}

/// Text operations available on every [`Canvas`].
pub trait TextLayout: Canvas {
    /// Print `text` with its baseline starting at `(x, y)`.
    fn text(&mut self, x: f64, y: f64, text: &str) {
        if !self.ok() {
            return;
        }
        let mut x = x;
        let ordered = self.visual_order(text);
        if self.surface().rtl && self.is_current_utf8() {
            x -= self.string_width(&ordered);
        }
        let encoded = self.encode_exact(&ordered);
        let Some(encoded) = self.check(encoded) else {
            return;
        };
        let (k, h) = (self.k(), self.surface().h());
        let s = self.surface().clone();
        let mut ops = Vec::new();
        if s.color_flag {
            ops.push(ContentStreamOp::SaveState);
            ops.push(s.text_color.fill_op());
        }
        ops.extend([
            ContentStreamOp::BeginText,
            ContentStreamOp::MoveText(x * k, (h - y) * k),
            ContentStreamOp::ShowText(encoded),
            ContentStreamOp::EndText,
        ]);
        if s.underline && !text.is_empty() {
            ops.push(self.underline_rect(x, y, text));
            ops.push(ContentStreamOp::Fill);
        }
        if s.strikeout && !text.is_empty() {
            ops.push(self.strikeout_rect(x, y, text));
            ops.push(ContentStreamOp::Fill);
        }
        if s.color_flag {
            ops.push(ContentStreamOp::RestoreState);
        }
        self.put_ops(&ops);
    }

    #[doc(hidden)]
    fn underline_rect(&self, x: f64, y: f64, text: &str) -> ContentStreamOp {
        let s = self.surface();
        let (up, ut) = self
            .current_font()
            .map(|f| (f.def.underline_position as f64, f.def.underline_thickness as f64))
            .unwrap_or((-100.0, 50.0));
        let ut = ut * s.underline_thickness;
        let w = self.string_width(text) + s.ws * blank_count(text) as f64;
        ContentStreamOp::Rectangle(
            x * s.k,
            (s.h() - (y - up / 1000.0 * s.font_size)) * s.k,
            w * s.k,
            -ut / 1000.0 * s.font_size_pt,
        )
    }

    #[doc(hidden)]
    fn strikeout_rect(&self, x: f64, y: f64, text: &str) -> ContentStreamOp {
        let s = self.surface();
        let (up, ut) = self
            .current_font()
            .map(|f| (f.def.underline_position as f64, f.def.underline_thickness as f64))
            .unwrap_or((-100.0, 50.0));
        let w = self.string_width(text) + s.ws * blank_count(text) as f64;
        ContentStreamOp::Rectangle(
            x * s.k,
            (s.h() - (y + 4.0 * up / 1000.0 * s.font_size)) * s.k,
            w * s.k,
            -ut / 1000.0 * s.font_size_pt,
        )
    }

    /// Left-aligned cell with no border that leaves the position to its right.
    fn cell(&mut self, w: f64, h: f64, text: &str) {
        self.cell_format(w, h, text, "", LineBreak::Right, "L", false, None);
    }

    /// Print a rectangular cell with optional border, fill, text and link.
    ///
    /// A width of 0 extends the cell to the right margin. `border` is empty,
    /// `"1"` for a full frame, or any of `L`, `T`, `R`, `B`. `align` combines
    /// one of `L`, `C`, `R` with one of `T`, `M`, `B`, `A` (baseline);
    /// the default is left and middle. When the cell would cross the page
    /// break trigger a new page is started first, keeping x and the word
    /// spacing.
    #[allow(clippy::too_many_arguments)]
    fn cell_format(
        &mut self,
        w: f64,
        h: f64,
        text: &str,
        border: &str,
        ln: LineBreak,
        align: &str,
        fill: bool,
        link: Option<LinkTarget>,
    ) {
        if !self.ok() {
            return;
        }
        if self.current_font().is_none() {
            self.set_error(Error::Render("font has not been set; unable to render text".to_string()));
            return;
        }
        let border = border.to_ascii_uppercase();
        let align = align.to_ascii_uppercase();
        let k = self.k();

        let (x, y, ws, trigger, in_hf) = {
            let s = self.surface();
            (s.x, s.y, s.ws, s.page_break_trigger, s.in_header || s.in_footer)
        };
        if y + h > trigger && !in_hf && self.accept_page_break() {
            if ws > 0.0 {
                self.surface_mut().ws = 0.0;
                self.put_op(ContentStreamOp::SetWordSpacing(0.0));
            }
            self.perform_page_break();
            if !self.ok() {
                return;
            }
            self.surface_mut().x = x;
            if ws > 0.0 {
                self.surface_mut().ws = ws;
                self.put_op(ContentStreamOp::SetWordSpacing(ws * k));
            }
        }

        let s = self.surface().clone();
        let w = if w == 0.0 { s.w() - s.r_margin - s.x } else { w };
        let mut ops = Vec::new();

        if h > 0.0 && (fill || border == "1") {
            let op = match (fill, border == "1") {
                (true, true) => ContentStreamOp::FillStroke,
                (true, false) => ContentStreamOp::Fill,
                _ => ContentStreamOp::Stroke,
            };
            ops.push(ContentStreamOp::Rectangle(s.x * k, (s.h() - s.y) * k, w * k, -h * k));
            ops.push(op);
        }
        if !border.is_empty() && border != "1" {
            let left = s.x * k;
            let top = (s.h() - s.y) * k;
            let right = (s.x + w) * k;
            let bottom = (s.h() - (s.y + h)) * k;
            let mut side = |from: (f64, f64), to: (f64, f64)| {
                ops.push(ContentStreamOp::MoveTo(from.0, from.1));
                ops.push(ContentStreamOp::LineTo(to.0, to.1));
                ops.push(ContentStreamOp::Stroke);
            };
            if border.contains('L') {
                side((left, top), (left, bottom));
            }
            if border.contains('T') {
                side((left, top), (right, top));
            }
            if border.contains('R') {
                side((right, top), (right, bottom));
            }
            if border.contains('B') {
                side((left, bottom), (right, bottom));
            }
        }

        let mut link_area = None;
        if !text.is_empty() {
            let sw = self.string_width(text);
            let dx = if align.contains('R') {
                w - s.c_margin - sw
            } else if align.contains('C') {
                (w - sw) / 2.0
            } else {
                s.c_margin
            };
            let dy = if align.contains('T') {
                (s.font_size - h) / 2.0
            } else if align.contains('B') {
                (h - s.font_size) / 2.0
            } else if align.contains('A') {
                let (ascent, descent) = self
                    .current_font()
                    .map(|f| (f.def.desc.ascent as f64, f.def.desc.descent as f64))
                    .unwrap_or((0.0, 0.0));
                let descent = if descent == 0.0 {
                    -0.19 * s.font_size
                } else {
                    descent * s.font_size / (ascent - descent)
                };
                (h - s.font_size) / 2.0 - descent
            } else {
                0.0
            };

            if s.color_flag {
                ops.push(ContentStreamOp::SaveState);
                ops.push(s.text_color.fill_op());
            }
            let baseline = s.y + dy + 0.5 * h + 0.3 * s.font_size;
            let tx = (s.x + dx) * k;
            let ty = (s.h() - baseline) * k;
            let utf8 = self.is_current_utf8();
            if utf8 && (s.ws != 0.0 || align == "J") {
                let ordered = self.visual_order(text);
                let wmax = (w - 2.0 * s.c_margin) * 1000.0 / s.font_size;
                let str_size = self.string_symbol_width(&ordered) as f64;
                let tokens: Vec<&str> = ordered.split(' ').collect();
                let shift = if tokens.len() > 1 {
                    (wmax - str_size) / (tokens.len() - 1) as f64
                } else {
                    0.0
                };
                let space = self.encode_exact(" ");
                let Some(space) = self.check(space) else {
                    return;
                };
                let mut items = Vec::with_capacity(tokens.len() * 3);
                for (i, token) in tokens.iter().enumerate() {
                    if i > 0 {
                        items.push(TextArrayItem::Adjustment(-shift));
                        items.push(TextArrayItem::Text(space.clone()));
                    }
                    let encoded = self.encode_exact(token);
                    let Some(encoded) = self.check(encoded) else {
                        return;
                    };
                    items.push(TextArrayItem::Text(encoded));
                }
                ops.extend([
                    ContentStreamOp::BeginText,
                    ContentStreamOp::SetWordSpacing(0.0),
                    ContentStreamOp::MoveText(tx, ty),
                    ContentStreamOp::ShowTextArray(items),
                    ContentStreamOp::EndText,
                ]);
            } else {
                let encoded = self.encode_text(text);
                let Some(encoded) = self.check(encoded) else {
                    return;
                };
                ops.extend([
                    ContentStreamOp::BeginText,
                    ContentStreamOp::MoveText(tx, ty),
                    ContentStreamOp::ShowText(encoded),
                    ContentStreamOp::EndText,
                ]);
            }
            if s.underline {
                ops.push(self.underline_rect(s.x + dx, baseline, text));
                ops.push(ContentStreamOp::Fill);
            }
            if s.strikeout {
                ops.push(self.strikeout_rect(s.x + dx, baseline, text));
                ops.push(ContentStreamOp::Fill);
            }
            if s.color_flag {
                ops.push(ContentStreamOp::RestoreState);
            }
            if let Some(target) = link {
                link_area = Some((
                    s.x + dx,
                    s.y + dy + 0.5 * h - 0.5 * s.font_size,
                    sw,
                    s.font_size,
                    target,
                ));
            }
        }

        if !ops.is_empty() {
            self.put_ops(&ops);
        }
        if let Some((lx, ly, lw, lh, target)) = link_area {
            self.link_area(lx, ly, lw, lh, target);
        }

        let s = self.surface_mut();
        s.lasth = h;
        match ln {
            LineBreak::Right => s.x += w,
            LineBreak::NextLine => {
                s.y += h;
                s.x = s.l_margin;
            },
            LineBreak::Below => s.y += h,
        }
    }

    /// Print `text` wrapped into lines of width `w` (0 extends to the right
    /// margin), each `h` high.
    ///
    /// Lines break at spaces and CJK ideographs, or anywhere when a word is
    /// longer than a line. `align` is `L`, `C`, `R` or `J` (the default),
    /// where justification stretches every line except the last one of each
    /// paragraph. A `"1"` border frames the whole block.
    fn multi_cell(&mut self, w: f64, h: f64, text: &str, border: &str, align: &str, fill: bool) {
        if !self.ok() {
            return;
        }
        let Some(widths) = self.char_widths(text) else {
            return;
        };
        let align = if align.is_empty() { "J".to_string() } else { align.to_ascii_uppercase() };
        let utf8 = self.is_current_utf8();
        let rtl = self.surface().rtl;
        let s = self.surface().clone();
        let w = if w == 0.0 { s.w() - s.r_margin - s.x } else { w };
        let wmax = (w - 2.0 * s.c_margin) * 1000.0 / s.font_size;

        let (chars, widths) = strip_text(text, widths);
        let nb = chars.len();
        let slice = |from: usize, to: usize| chars[from..to].iter().collect::<String>();

        let border_all = border.to_ascii_uppercase();
        let (mut b, b2) = if border_all.is_empty() {
            (String::new(), String::new())
        } else if border_all == "1" {
            ("LRT".to_string(), "LR".to_string())
        } else {
            let mut b2 = String::new();
            if border_all.contains('L') {
                b2.push('L');
            }
            if border_all.contains('R') {
                b2.push('R');
            }
            let b = if border_all.contains('T') { format!("{}T", b2) } else { b2.clone() };
            (b, b2)
        };
        let border_bottom = border_all == "1" || border_all.contains('B');
        let flush_align = if rtl { "R" } else { "L" };

        let mut sep: Option<usize> = None;
        let (mut i, mut j) = (0usize, 0usize);
        let (mut l, mut ls) = (0.0f64, 0.0f64);
        let mut ns = 0usize;
        let mut nl = 1usize;
        while i < nb {
            let c = chars[i];
            if c == '\n' {
                self.reset_word_spacing();
                let line_align = if utf8 && align == "J" { flush_align } else { align.as_str() };
                self.cell_format(w, h, &slice(j, i), &b, LineBreak::Below, line_align, fill, None);
                i += 1;
                sep = None;
                j = i;
                l = 0.0;
                ns = 0;
                nl += 1;
                if !border_all.is_empty() && nl == 2 {
                    b = b2.clone();
                }
                continue;
            }
            if c == ' ' || is_han(c) {
                sep = Some(i);
                ls = l;
                ns += 1;
            }
            l += widths[i] as f64;
            if l > wmax {
                // A Han break point at the line start cannot split anything.
                match sep.filter(|&at| at > j || chars[at] == ' ') {
                    None => {
                        if i == j {
                            i += 1;
                        }
                        self.reset_word_spacing();
                        self.cell_format(w, h, &slice(j, i), &b, LineBreak::Below, &align, fill, None);
                    },
                    Some(at) => {
                        if align == "J" {
                            let ws = if ns > 1 {
                                (wmax - ls) / 1000.0 * s.font_size / (ns - 1) as f64
                            } else {
                                0.0
                            };
                            self.surface_mut().ws = ws;
                            self.put_op(ContentStreamOp::SetWordSpacing(ws * s.k));
                        }
                        self.cell_format(w, h, &slice(j, at), &b, LineBreak::Below, &align, fill, None);
                        // Spaces are consumed by the break; ideographs start the next line.
                        i = if chars[at] == ' ' { at + 1 } else { at };
                    },
                }
                sep = None;
                j = i;
                l = 0.0;
                ns = 0;
                nl += 1;
                if !border_all.is_empty() && nl == 2 {
                    b = b2.clone();
                }
            } else {
                i += 1;
            }
        }

        self.reset_word_spacing();
        if border_bottom {
            b.push('B');
        }
        let last_align = if align == "J" {
            if utf8 && rtl {
                "R"
            } else {
                "L"
            }
        } else {
            align.as_str()
        };
        self.cell_format(w, h, &slice(j, i), &b, LineBreak::Below, last_align, fill, None);
        let s = self.surface_mut();
        s.x = s.l_margin;
    }

    #[doc(hidden)]
    fn reset_word_spacing(&mut self) {
        if self.surface().ws > 0.0 {
            self.surface_mut().ws = 0.0;
            self.put_op(ContentStreamOp::SetWordSpacing(0.0));
        }
    }

    #[doc(hidden)]
    fn char_widths(&mut self, text: &str) -> Option<Vec<u32>> {
        match self.current_font() {
            Some(font) => Some(text.chars().map(|c| font.char_width(c)).collect()),
            None => {
                self.set_error(Error::Render("font has not been set; unable to render text".to_string()));
                None
            },
        }
    }

    /// Flowing text from the current position, wrapping at the right margin
    /// and continuing from the left margin; lines are `h` high.
    fn write(&mut self, h: f64, text: &str) {
        self.write_link(h, text, None);
    }

    /// Flowing text linked to internal link `link`.
    fn write_linkid(&mut self, h: f64, text: &str, link: usize) {
        self.write_link(h, text, Some(LinkTarget::Internal(link)));
    }

    /// Flowing text linked to `url`.
    fn write_linkstring(&mut self, h: f64, text: &str, url: &str) {
        self.write_link(h, text, Some(LinkTarget::Uri(url.to_string())));
    }

    #[doc(hidden)]
    fn write_link(&mut self, h: f64, text: &str, link: Option<LinkTarget>) {
        if !self.ok() {
            return;
        }
        let Some(widths) = self.char_widths(text) else {
            return;
        };
        let filtered: Vec<(char, u32)> = text.chars().zip(widths).filter(|(c, _)| *c != '\r').collect();
        let chars: Vec<char> = filtered.iter().map(|(c, _)| *c).collect();
        let widths: Vec<u32> = filtered.iter().map(|(_, w)| *w).collect();
        let slice = |from: usize, to: usize| chars[from..to].iter().collect::<String>();
        let nb = chars.len();

        if self.is_current_utf8() && nb == 1 && chars[0] == ' ' {
            let sw = self.string_width(" ");
            self.surface_mut().x += sw;
            return;
        }

        let line_width = |s: &super::Surface| {
            let w = s.w() - s.r_margin - s.x;
            (w, (w - 2.0 * s.c_margin) * 1000.0 / s.font_size)
        };
        let (mut w, mut wmax) = line_width(self.surface());
        let mut sep: Option<usize> = None;
        let (mut i, mut j) = (0usize, 0usize);
        let mut l = 0.0f64;
        let mut nl = 1usize;
        while i < nb {
            if !self.ok() {
                return;
            }
            let c = chars[i];
            if c == '\n' {
                self.cell_format(w, h, &slice(j, i), "", LineBreak::Below, "", false, link.clone());
                i += 1;
                sep = None;
                j = i;
                l = 0.0;
                if nl == 1 {
                    let s = self.surface_mut();
                    s.x = s.l_margin;
                    (w, wmax) = line_width(self.surface());
                }
                nl += 1;
                continue;
            }
            if c == ' ' {
                sep = Some(i);
            }
            l += widths[i] as f64;
            if l > wmax {
                match sep {
                    None => {
                        let s = self.surface();
                        if s.x > s.l_margin {
                            let s = self.surface_mut();
                            s.x = s.l_margin;
                            s.y += h;
                            (w, wmax) = line_width(self.surface());
                            i = j;
                            l = 0.0;
                            nl += 1;
                            continue;
                        }
                        if i == j {
                            i += 1;
                        }
                        self.cell_format(w, h, &slice(j, i), "", LineBreak::Below, "", false, link.clone());
                    },
                    Some(at) => {
                        self.cell_format(w, h, &slice(j, at), "", LineBreak::Below, "", false, link.clone());
                        i = at + 1;
                    },
                }
                sep = None;
                j = i;
                l = 0.0;
                if nl == 1 {
                    let s = self.surface_mut();
                    s.x = s.l_margin;
                    (w, wmax) = line_width(self.surface());
                }
                nl += 1;
            } else {
                i += 1;
            }
        }
        if i != j {
            let fs = self.surface().font_size;
            self.cell_format(l / 1000.0 * fs, h, &slice(j, nb), "", LineBreak::Right, "", false, link);
        }
    }

    /// Flowing text aligned `L`, `C` or `R` inside a column of `width`
    /// starting at the left margin (0 spans both margins).
    fn write_aligned(&mut self, width: f64, line_height: f64, text: &str, align: &str) {
        if !self.ok() {
            return;
        }
        let (l_margin, _, r_margin, _) = self.margins();
        let page_w = self.surface().w();
        let width = if width == 0.0 { page_w - (l_margin + r_margin) } else { width };
        let lines = self.split_lines(text, width);
        let c_margin = self.surface().c_margin;
        for (n, line) in lines.iter().enumerate() {
            if n > 0 {
                self.ln(line_height);
            }
            let line_w = self.string_width(line);
            match align.to_ascii_uppercase().as_str() {
                "C" => {
                    self.set_left_margin(l_margin + (width - line_w) / 2.0);
                    self.write(line_height, line);
                    self.set_left_margin(l_margin);
                },
                "R" => {
                    self.set_left_margin(l_margin + (width - line_w) - 2.01 * c_margin);
                    self.write(line_height, line);
                    self.set_left_margin(l_margin);
                },
                _ => {
                    self.set_right_margin(page_w - l_margin - width);
                    self.write(line_height, line);
                    self.set_right_margin(r_margin);
                },
            }
        }
    }

    /// Split `text` into lines that fit in a cell of width `w`.
    ///
    /// Lines break after spaces, tabs and newlines; trailing newlines are
    /// dropped.
    fn split_lines(&self, text: &str, w: f64) -> Vec<String> {
        let Some(font) = self.current_font() else {
            return Vec::new();
        };
        let s = self.surface();
        let wmax = ((w - 2.0 * s.c_margin) * 1000.0 / s.font_size).ceil();
        let widths: Vec<u32> = text.chars().map(|c| font.char_width(c)).collect();
        let (chars, widths) = strip_text(text, widths);
        let nb = chars.len();

        let mut lines = Vec::new();
        let mut sep: Option<usize> = None;
        let (mut i, mut j) = (0usize, 0usize);
        let mut l = 0.0f64;
        while i < nb {
            let c = chars[i];
            l += widths[i] as f64;
            if c == ' ' || c == '\t' || c == '\n' {
                sep = Some(i);
            }
            if c == '\n' || l > wmax {
                let end = match sep {
                    None => {
                        if i == j {
                            i += 1;
                        }
                        i
                    },
                    Some(at) => {
                        i = at + 1;
                        at
                    },
                };
                lines.push(chars[j..end].iter().collect());
                sep = None;
                j = i;
                l = 0.0;
            } else {
                i += 1;
            }
        }
        if i != j {
            lines.push(chars[j..i].iter().collect());
        }
        lines
    }
}

impl<T: Canvas + ?Sized> TextLayout for T {}

/// Drop carriage returns and trailing newlines, keeping widths aligned.
fn strip_text(text: &str, widths: Vec<u32>) -> (Vec<char>, Vec<u32>) {
    let mut chars = Vec::with_capacity(widths.len());
    let mut kept = Vec::with_capacity(widths.len());
    for (c, w) in text.chars().zip(widths) {
        if c != '\r' {
            chars.push(c);
            kept.push(w);
        }
    }
    while chars.last() == Some(&'\n') {
        chars.pop();
        kept.pop();
    }
    (chars, kept)
}

fn blank_count(text: &str) -> usize {
    text.chars().filter(|&c| c == ' ').count()
}

/// Han ideographs, which allow a line break without a space.
fn is_han(c: char) -> bool {
    matches!(c as u32,
        0x2E80..=0x2E99
        | 0x2E9B..=0x2EF3
        | 0x2F00..=0x2FD5
        | 0x3005
        | 0x3007
        | 0x3021..=0x3029
        | 0x3038..=0x303B
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xF900..=0xFA6D
        | 0xFA70..=0xFAD9
        | 0x20000..=0x2FA1F)
}
