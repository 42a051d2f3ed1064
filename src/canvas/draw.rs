//! Shapes, paths, clipping, transformations and images.

use super::Canvas;
use crate::document::links::LinkTarget;
use crate::error::Error;
use crate::geometry::Point;
use crate::writer::{paint_op, ContentStreamOp, ImageOptions};
use std::f64::consts::{PI, SQRT_2};

/// Bezier control distance for a quarter circle of radius 1.
const KAPPA: f64 = 4.0 / 3.0 * (SQRT_2 - 1.0);

/// Graphics operations available on every [`Canvas`].
///
/// Coordinates are user units with the origin at the top-left corner.
/// Style strings are `"D"` (stroke), `"F"` (fill), `"DF"`/`"FD"` (both),
/// with a trailing `*` for the even-odd rule.
pub trait Draw: Canvas {
    /// Straight line between two points.
    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        if !self.ok() {
            return;
        }
        let (k, h) = (self.k(), self.surface().h());
        self.put_ops(&[
            ContentStreamOp::MoveTo(x1 * k, (h - y1) * k),
            ContentStreamOp::LineTo(x2 * k, (h - y2) * k),
            ContentStreamOp::Stroke,
        ]);
    }

    /// Rectangle with its top-left corner at `(x, y)`.
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &str) {
        if !self.ok() {
            return;
        }
        let (k, ph) = (self.k(), self.surface().h());
        self.put_ops(&[
            ContentStreamOp::Rectangle(x * k, (ph - y) * k, w * k, -h * k),
            paint_op(style),
        ]);
    }

    /// Rectangle with rounded corners.
    ///
    /// `corners` lists the rounded corners: `1` top-left, `2` top-right,
    /// `3` bottom-right, `4` bottom-left.
    fn rounded_rect(&mut self, x: f64, y: f64, w: f64, h: f64, r: f64, corners: &str, style: &str) {
        let radius = |c: char| if corners.contains(c) { r } else { 0.0 };
        self.rounded_rect_ext(x, y, w, h, radius('1'), radius('2'), radius('3'), radius('4'), style);
    }

    /// Rectangle with an individual radius per corner (top-left, top-right,
    /// bottom-right, bottom-left).
    #[allow(clippy::too_many_arguments)]
    fn rounded_rect_ext(&mut self, x: f64, y: f64, w: f64, h: f64, tl: f64, tr: f64, br: f64, bl: f64, style: &str) {
        if !self.ok() {
            return;
        }
        let mut ops = vec![ContentStreamOp::SaveState];
        ops.extend(self.rounded_rect_path(x, y, w, h, tl, tr, br, bl));
        ops.push(paint_op(style));
        ops.push(ContentStreamOp::RestoreState);
        self.put_ops(&ops);
    }

    #[doc(hidden)]
    #[allow(clippy::too_many_arguments)]
    fn rounded_rect_path(
        &self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        tl: f64,
        tr: f64,
        br: f64,
        bl: f64,
    ) -> Vec<ContentStreamOp> {
        let (k, ph) = (self.k(), self.surface().h());
        let pt = |x: f64, y: f64| (x * k, (ph - y) * k);
        let curve = |x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64| {
            let (a, b) = pt(x1, y1);
            let (c, d) = pt(x2, y2);
            let (e, f) = pt(x3, y3);
            ContentStreamOp::CurveTo(a, b, c, d, e, f)
        };
        let mut ops = Vec::new();
        let (mx, my) = pt(x + tl, y);
        ops.push(ContentStreamOp::MoveTo(mx, my));

        let (xc, yc) = (x + w - tr, y + tr);
        let (lx, ly) = pt(xc, y);
        ops.push(ContentStreamOp::LineTo(lx, ly));
        if tr != 0.0 {
            ops.push(curve(xc + tr * KAPPA, yc - tr, xc + tr, yc - tr * KAPPA, xc + tr, yc));
        }

        let (xc, yc) = (x + w - br, y + h - br);
        let (lx, ly) = pt(x + w, yc);
        ops.push(ContentStreamOp::LineTo(lx, ly));
        if br != 0.0 {
            ops.push(curve(xc + br, yc + br * KAPPA, xc + br * KAPPA, yc + br, xc, yc + br));
        }

        let (xc, yc) = (x + bl, y + h - bl);
        let (lx, ly) = pt(xc, y + h);
        ops.push(ContentStreamOp::LineTo(lx, ly));
        if bl != 0.0 {
            ops.push(curve(xc - bl * KAPPA, yc + bl, xc - bl, yc + bl * KAPPA, xc - bl, yc));
        }

        let (xc, yc) = (x + tl, y + tl);
        let (lx, ly) = pt(x, yc);
        ops.push(ContentStreamOp::LineTo(lx, ly));
        if tl != 0.0 {
            ops.push(curve(xc - tl, yc - tl * KAPPA, xc - tl * KAPPA, yc - tl, xc, yc - tl));
        }
        ops
    }

    /// Circle centered at `(x, y)`.
    fn circle(&mut self, x: f64, y: f64, r: f64, style: &str) {
        self.ellipse(x, y, r, r, 0.0, style);
    }

    /// Ellipse centered at `(x, y)`, rotated counter-clockwise by
    /// `deg_rotate` degrees.
    fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64, deg_rotate: f64, style: &str) {
        self.arc(x, y, rx, ry, deg_rotate, 0.0, 360.0, style);
    }

    /// Elliptical arc from `deg_start` to `deg_end`, counter-clockwise from
    /// the positive x axis.
    #[allow(clippy::too_many_arguments)]
    fn arc(&mut self, x: f64, y: f64, rx: f64, ry: f64, deg_rotate: f64, deg_start: f64, deg_end: f64, style: &str) {
        if !self.ok() {
            return;
        }
        self.arc_ops(x, y, rx, ry, deg_rotate, deg_start, deg_end, Some(style));
    }

    /// Continue the current path with an elliptical arc.
    ///
    /// A straight line joins the current point to the start of the arc; the
    /// current point ends at the end of the arc.
    #[allow(clippy::too_many_arguments)]
    fn arc_to(&mut self, x: f64, y: f64, rx: f64, ry: f64, deg_rotate: f64, deg_start: f64, deg_end: f64) {
        if !self.ok() {
            return;
        }
        self.arc_ops(x, y, rx, ry, deg_rotate, deg_start, deg_end, None);
    }

    #[doc(hidden)]
    #[allow(clippy::too_many_arguments)]
    fn arc_ops(
        &mut self,
        x: f64,
        y: f64,
        rx: f64,
        ry: f64,
        deg_rotate: f64,
        deg_start: f64,
        deg_end: f64,
        style: Option<&str>,
    ) {
        let (k, ph) = (self.k(), self.surface().h());
        let (mut cx, mut cy) = (x * k, (ph - y) * k);
        let (rx, ry) = (rx * k, ry * k);
        let segments = (((deg_end - deg_start) as i64) / 60).max(2);
        let start = deg_start * PI / 180.0;
        let total = (deg_end - deg_start) * PI / 180.0;
        let dt = total / segments as f64;
        let dtm = dt / 3.0;

        if deg_rotate != 0.0 {
            let a = -deg_rotate * PI / 180.0;
            self.put_ops(&[
                ContentStreamOp::SaveState,
                ContentStreamOp::Transform(a.cos(), -a.sin(), a.sin(), a.cos(), cx, cy),
            ]);
            cx = 0.0;
            cy = 0.0;
        }

        let mut t = start;
        let mut a0 = cx + rx * t.cos();
        let mut b0 = cy + ry * t.sin();
        let mut c0 = -rx * t.sin();
        let mut d0 = ry * t.cos();
        if style.is_none() {
            let (sx, sy) = (a0 / k, ph - b0 / k);
            let s = self.surface();
            if s.x != sx || s.y != sy {
                self.line_to(sx, sy);
            }
        } else {
            self.put_op(ContentStreamOp::MoveTo(a0, b0));
        }
        for j in 1..=segments {
            t = j as f64 * dt + start;
            let a1 = cx + rx * t.cos();
            let b1 = cy + ry * t.sin();
            let c1 = -rx * t.sin();
            let d1 = ry * t.cos();
            self.put_op(ContentStreamOp::CurveTo(
                a0 + c0 * dtm,
                b0 + d0 * dtm,
                a1 - c1 * dtm,
                b1 - d1 * dtm,
                a1,
                b1,
            ));
            a0 = a1;
            b0 = b1;
            c0 = c1;
            d0 = d1;
            if style.is_none() {
                let s = self.surface_mut();
                s.x = a1 / k;
                s.y = ph - b1 / k;
            }
        }
        if let Some(style) = style {
            self.put_op(paint_op(style));
        }
        if deg_rotate != 0.0 {
            self.put_op(ContentStreamOp::RestoreState);
        }
    }

    /// Closed polygon through `points`.
    fn polygon(&mut self, points: &[Point], style: &str) {
        if !self.ok() || points.is_empty() {
            return;
        }
        let mut ops = self.polygon_path(points);
        ops.push(paint_op(style));
        self.put_ops(&ops);
    }

    #[doc(hidden)]
    fn polygon_path(&self, points: &[Point]) -> Vec<ContentStreamOp> {
        let (k, ph) = (self.k(), self.surface().h());
        let mut ops = Vec::with_capacity(points.len() + 1);
        for (i, p) in points.iter().enumerate() {
            let (x, y) = (p.x * k, (ph - p.y) * k);
            ops.push(if i == 0 {
                ContentStreamOp::MoveTo(x, y)
            } else {
                ContentStreamOp::LineTo(x, y)
            });
        }
        ops.push(ContentStreamOp::ClosePath);
        ops
    }

    /// Closed figure of cubic Bézier segments.
    ///
    /// `points` starts with the first anchor, followed by groups of three
    /// points: two control points and the next anchor.
    fn beziergon(&mut self, points: &[Point], style: &str) {
        if !self.ok() || points.is_empty() {
            return;
        }
        let (k, ph) = (self.k(), self.surface().h());
        let p = |pt: &Point| (pt.x * k, (ph - pt.y) * k);
        let (x0, y0) = p(&points[0]);
        let mut ops = vec![ContentStreamOp::MoveTo(x0, y0)];
        for chunk in points[1..].chunks_exact(3) {
            let (a, b) = p(&chunk[0]);
            let (c, d) = p(&chunk[1]);
            let (e, f) = p(&chunk[2]);
            ops.push(ContentStreamOp::CurveTo(a, b, c, d, e, f));
        }
        ops.push(paint_op(style));
        self.put_ops(&ops);
    }

    /// Quadratic Bézier curve from `(x0, y0)` to `(x1, y1)` with control
    /// point `(cx, cy)`.
    #[allow(clippy::too_many_arguments)]
    fn curve(&mut self, x0: f64, y0: f64, cx: f64, cy: f64, x1: f64, y1: f64, style: &str) {
        if !self.ok() {
            return;
        }
        let (k, h) = (self.k(), self.surface().h());
        self.put_op(ContentStreamOp::MoveTo(x0 * k, (h - y0) * k));
        self.put_ops(&[
            ContentStreamOp::CurveToV(cx * k, (h - cy) * k, x1 * k, (h - y1) * k),
            paint_op(style),
        ]);
    }

    /// Cubic Bézier curve from `(x0, y0)` to `(x1, y1)`.
    #[allow(clippy::too_many_arguments)]
    fn curve_bezier_cubic(
        &mut self,
        x0: f64,
        y0: f64,
        cx0: f64,
        cy0: f64,
        cx1: f64,
        cy1: f64,
        x1: f64,
        y1: f64,
        style: &str,
    ) {
        if !self.ok() {
            return;
        }
        let (k, h) = (self.k(), self.surface().h());
        self.put_op(ContentStreamOp::MoveTo(x0 * k, (h - y0) * k));
        self.put_ops(&[
            ContentStreamOp::CurveTo(cx0 * k, (h - cy0) * k, cx1 * k, (h - cy1) * k, x1 * k, (h - y1) * k),
            paint_op(style),
        ]);
    }

    // Paths

    /// Start a new path at `(x, y)`.
    fn move_to(&mut self, x: f64, y: f64) {
        if !self.ok() {
            return;
        }
        let (k, h) = (self.k(), self.surface().h());
        self.put_op(ContentStreamOp::MoveTo(x * k, (h - y) * k));
        let s = self.surface_mut();
        s.x = x;
        s.y = y;
    }

    /// Straight segment to `(x, y)`.
    fn line_to(&mut self, x: f64, y: f64) {
        if !self.ok() {
            return;
        }
        let (k, h) = (self.k(), self.surface().h());
        self.put_op(ContentStreamOp::LineTo(x * k, (h - y) * k));
        let s = self.surface_mut();
        s.x = x;
        s.y = y;
    }

    /// Quadratic segment to `(x, y)` with control point `(cx, cy)`.
    fn curve_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        if !self.ok() {
            return;
        }
        let (k, h) = (self.k(), self.surface().h());
        self.put_op(ContentStreamOp::CurveToV(cx * k, (h - cy) * k, x * k, (h - y) * k));
        let s = self.surface_mut();
        s.x = x;
        s.y = y;
    }

    /// Cubic segment to `(x, y)`.
    fn curve_bezier_cubic_to(&mut self, cx0: f64, cy0: f64, cx1: f64, cy1: f64, x: f64, y: f64) {
        if !self.ok() {
            return;
        }
        let (k, h) = (self.k(), self.surface().h());
        self.put_op(ContentStreamOp::CurveTo(
            cx0 * k,
            (h - cy0) * k,
            cx1 * k,
            (h - cy1) * k,
            x * k,
            (h - y) * k,
        ));
        let s = self.surface_mut();
        s.x = x;
        s.y = y;
    }

    /// Close the current subpath.
    fn close_path(&mut self) {
        if self.ok() {
            self.put_op(ContentStreamOp::ClosePath);
        }
    }

    /// Paint the current path.
    fn draw_path(&mut self, style: &str) {
        if self.ok() {
            self.put_op(paint_op(style));
        }
    }

    // Clipping

    /// Begin clipping to a rectangle; `outline` also strokes it.
    fn clip_rect(&mut self, x: f64, y: f64, w: f64, h: f64, outline: bool) {
        if !self.ok() {
            return;
        }
        self.surface_mut().clip_nest += 1;
        let (k, ph) = (self.k(), self.surface().h());
        self.put_ops(&[
            ContentStreamOp::SaveState,
            ContentStreamOp::Rectangle(x * k, (ph - y) * k, w * k, -h * k),
            ContentStreamOp::Clip,
            clip_paint(outline),
        ]);
    }

    /// Begin clipping to a rounded rectangle.
    #[allow(clippy::too_many_arguments)]
    fn clip_rounded_rect(&mut self, x: f64, y: f64, w: f64, h: f64, r: f64, outline: bool) {
        if !self.ok() {
            return;
        }
        self.surface_mut().clip_nest += 1;
        let mut ops = vec![ContentStreamOp::SaveState];
        ops.extend(self.rounded_rect_path(x, y, w, h, r, r, r, r));
        ops.push(ContentStreamOp::Clip);
        ops.push(clip_paint(outline));
        self.put_ops(&ops);
    }

    /// Begin clipping to an ellipse centered at `(x, y)`.
    fn clip_ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64, outline: bool) {
        if !self.ok() {
            return;
        }
        self.surface_mut().clip_nest += 1;
        let (k, h) = (self.k(), self.surface().h());
        let lx = KAPPA * rx;
        let ly = KAPPA * ry;
        let p = |x: f64, y: f64| (x * k, (h - y) * k);
        let curve = |a: (f64, f64), b: (f64, f64), c: (f64, f64)| ContentStreamOp::CurveTo(a.0, a.1, b.0, b.1, c.0, c.1);
        let (sx, sy) = p(x + rx, y);
        self.put_ops(&[
            ContentStreamOp::SaveState,
            ContentStreamOp::MoveTo(sx, sy),
            curve(p(x + rx, y - ly), p(x + lx, y - ry), p(x, y - ry)),
            curve(p(x - lx, y - ry), p(x - rx, y - ly), p(x - rx, y)),
            curve(p(x - rx, y + ly), p(x - lx, y + ry), p(x, y + ry)),
            curve(p(x + lx, y + ry), p(x + rx, y + ly), p(x + rx, y)),
            ContentStreamOp::Clip,
            clip_paint(outline),
        ]);
    }

    /// Begin clipping to a circle.
    fn clip_circle(&mut self, x: f64, y: f64, r: f64, outline: bool) {
        self.clip_ellipse(x, y, r, r, outline);
    }

    /// Begin clipping to a polygon.
    fn clip_polygon(&mut self, points: &[Point], outline: bool) {
        if !self.ok() || points.is_empty() {
            return;
        }
        self.surface_mut().clip_nest += 1;
        let mut ops = vec![ContentStreamOp::SaveState];
        ops.extend(self.polygon_path(points));
        ops.push(ContentStreamOp::Clip);
        ops.push(clip_paint(outline));
        self.put_ops(&ops);
    }

    /// Begin clipping to the outline of `text` drawn at `(x, y)`.
    fn clip_text(&mut self, x: f64, y: f64, text: &str, outline: bool) {
        if !self.ok() {
            return;
        }
        let encoded = self.encode_text(text);
        let Some(encoded) = self.check(encoded) else {
            return;
        };
        self.surface_mut().clip_nest += 1;
        let (k, h) = (self.k(), self.surface().h());
        self.put_ops(&[
            ContentStreamOp::SaveState,
            ContentStreamOp::BeginText,
            ContentStreamOp::MoveText(x * k, (h - y) * k),
            ContentStreamOp::SetTextRenderMode(if outline { 5 } else { 7 }),
            ContentStreamOp::ShowText(encoded),
            ContentStreamOp::EndText,
        ]);
    }

    /// End the innermost clipping region.
    fn clip_end(&mut self) {
        if !self.ok() {
            return;
        }
        if self.surface().clip_nest == 0 {
            self.set_error(Error::Structural(
                "error attempting to end clip operation out of sequence".to_string(),
            ));
            return;
        }
        self.surface_mut().clip_nest -= 1;
        self.put_op(ContentStreamOp::RestoreState);
    }

    // Transformations

    /// Begin a transformation context.
    fn transform_begin(&mut self) {
        if !self.ok() {
            return;
        }
        self.surface_mut().transform_nest += 1;
        self.put_op(ContentStreamOp::SaveState);
    }

    /// Apply a raw matrix inside a transformation context.
    fn transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        if !self.ok() {
            return;
        }
        if self.surface().transform_nest == 0 {
            self.set_error(Error::Structural("transformation context is not active".to_string()));
            return;
        }
        self.put_op(ContentStreamOp::Transform(a, b, c, d, e, f));
    }

    /// Scale by percentages around `(x, y)`.
    fn transform_scale(&mut self, sx: f64, sy: f64, x: f64, y: f64) {
        if !self.ok() {
            return;
        }
        if sx == 0.0 || sy == 0.0 {
            self.set_error(Error::Render("scale factor cannot be zero".to_string()));
            return;
        }
        let (k, h) = (self.k(), self.surface().h());
        let (sx, sy) = (sx / 100.0, sy / 100.0);
        let (x, y) = (x * k, (h - y) * k);
        self.transform(sx, 0.0, 0.0, sy, x * (1.0 - sx), y * (1.0 - sy));
    }

    /// Scale horizontally around `(x, y)`.
    fn transform_scale_x(&mut self, sx: f64, x: f64, y: f64) {
        self.transform_scale(sx, 100.0, x, y);
    }

    /// Scale vertically around `(x, y)`.
    fn transform_scale_y(&mut self, sy: f64, x: f64, y: f64) {
        self.transform_scale(100.0, sy, x, y);
    }

    /// Scale both axes by the same percentage around `(x, y)`.
    fn transform_scale_xy(&mut self, s: f64, x: f64, y: f64) {
        self.transform_scale(s, s, x, y);
    }

    /// Mirror across the vertical line through `x`.
    fn transform_mirror_horizontal(&mut self, x: f64) {
        let y = self.surface().y;
        self.transform_scale(-100.0, 100.0, x, y);
    }

    /// Mirror across the horizontal line through `y`.
    fn transform_mirror_vertical(&mut self, y: f64) {
        let x = self.surface().x;
        self.transform_scale(100.0, -100.0, x, y);
    }

    /// Mirror through the point `(x, y)`.
    fn transform_mirror_point(&mut self, x: f64, y: f64) {
        self.transform_scale(-100.0, -100.0, x, y);
    }

    /// Mirror across the line through `(x, y)` at `angle` degrees.
    fn transform_mirror_line(&mut self, angle: f64, x: f64, y: f64) {
        self.transform_scale(-100.0, 100.0, x, y);
        self.transform_rotate(-2.0 * (angle - 90.0), x, y);
    }

    /// Move by `(tx, ty)` user units.
    fn transform_translate(&mut self, tx: f64, ty: f64) {
        let k = self.k();
        self.transform(1.0, 0.0, 0.0, 1.0, tx * k, -ty * k);
    }

    /// Move horizontally.
    fn transform_translate_x(&mut self, tx: f64) {
        self.transform_translate(tx, 0.0);
    }

    /// Move vertically.
    fn transform_translate_y(&mut self, ty: f64) {
        self.transform_translate(0.0, ty);
    }

    /// Rotate counter-clockwise by `angle` degrees around `(x, y)`.
    fn transform_rotate(&mut self, angle: f64, x: f64, y: f64) {
        let (k, h) = (self.k(), self.surface().h());
        let (x, y) = (x * k, (h - y) * k);
        let a = angle * PI / 180.0;
        let (c, s) = (a.cos(), a.sin());
        self.transform(c, s, -s, c, x + s * y - c * x, y - c * y - s * x);
    }

    /// Skew by the given angles (each strictly between -90 and 90 degrees)
    /// around `(x, y)`.
    fn transform_skew(&mut self, angle_x: f64, angle_y: f64, x: f64, y: f64) {
        if !self.ok() {
            return;
        }
        if angle_x <= -90.0 || angle_x >= 90.0 || angle_y <= -90.0 || angle_y >= 90.0 {
            self.set_error(Error::Render("skew values must be between -90° and 90°".to_string()));
            return;
        }
        let (k, h) = (self.k(), self.surface().h());
        let (x, y) = (x * k, (h - y) * k);
        let tb = (angle_y * PI / 180.0).tan();
        let tc = (angle_x * PI / 180.0).tan();
        self.transform(1.0, tb, tc, 1.0, -tc * y, -tb * x);
    }

    /// Skew horizontally.
    fn transform_skew_x(&mut self, angle_x: f64, x: f64, y: f64) {
        self.transform_skew(angle_x, 0.0, x, y);
    }

    /// Skew vertically.
    fn transform_skew_y(&mut self, angle_y: f64, x: f64, y: f64) {
        self.transform_skew(0.0, angle_y, x, y);
    }

    /// End the innermost transformation context.
    fn transform_end(&mut self) {
        if !self.ok() {
            return;
        }
        if self.surface().transform_nest == 0 {
            self.set_error(Error::Structural(
                "error attempting to end transformation operation out of sequence".to_string(),
            ));
            return;
        }
        self.surface_mut().transform_nest -= 1;
        self.put_op(ContentStreamOp::RestoreState);
    }

    // Images

    /// Register image bytes under `name` without drawing them.
    fn register_image_bytes(&mut self, name: &str, data: &[u8], options: &ImageOptions) {
        if !self.ok() {
            return;
        }
        let result = self.registry_mut().register_image(name, data, options).map(|_| ());
        self.check(result);
    }

    /// Register the image file at `path` without drawing it.
    fn register_image_file(&mut self, path: &str, options: &ImageOptions) {
        if !self.ok() {
            return;
        }
        let result = self.registry_mut().register_image_file(path, options).map(|_| ());
        self.check(result);
    }

    /// Natural size of a registered image in user units.
    fn image_size(&self, name: &str) -> Option<(f64, f64)> {
        let k = self.k();
        self.registry().image(name).map(|img| img.info.extent(k))
    }

    /// Draw image `name` with its top-left corner at `(x, y)`.
    ///
    /// An image not yet registered is read from the file `name`. A zero
    /// width and height draw at natural size; one zero dimension keeps the
    /// aspect ratio; -1 means the image's own resolution and other negative
    /// values a resolution in dpi. In `flow` mode the image goes at the
    /// current y, breaking the page if needed, and y moves below it.
    #[allow(clippy::too_many_arguments)]
    fn image(
        &mut self,
        name: &str,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        flow: bool,
        options: &ImageOptions,
        link: Option<LinkTarget>,
    ) {
        if !self.ok() {
            return;
        }
        let existing = self
            .registry()
            .image(name)
            .map(|img| (img.resource_name(), img.info.width, img.info.height, img.info.dpi));
        let placed = match existing {
            Some(found) => Ok(found),
            None => self
                .registry_mut()
                .register_image_file(name, options)
                .map(|img| (img.resource_name(), img.info.width, img.info.height, img.info.dpi)),
        };
        let Some((resource, pw, ph, dpi)) = self.check(placed) else {
            return;
        };
        let k = self.k();
        let (pw, ph) = (pw as f64, ph as f64);
        let (mut w, mut h) = (w, h);
        if w == 0.0 && h == 0.0 {
            w = -dpi;
            h = -dpi;
        }
        if w == -1.0 {
            w = -dpi;
        }
        if h == -1.0 {
            h = -dpi;
        }
        if w < 0.0 {
            w = -pw * 72.0 / w / k;
        }
        if h < 0.0 {
            h = -ph * 72.0 / h / k;
        }
        if w == 0.0 {
            w = h * pw / ph;
        }
        if h == 0.0 {
            h = w * ph / pw;
        }

        let mut y = y;
        if flow {
            let s = self.surface();
            if s.y + h > s.page_break_trigger && !s.in_header && !s.in_footer && self.accept_page_break() {
                let x2 = self.surface().x;
                self.perform_page_break();
                self.surface_mut().x = x2;
            }
            let s = self.surface_mut();
            y = s.y;
            s.y += h;
        }
        let mut x = x;
        if !options.allow_negative_position && x < 0.0 {
            x = self.surface().x;
        }
        let page_h = self.surface().h();
        self.put_ops(&[
            ContentStreamOp::SaveState,
            ContentStreamOp::Transform(w * k, 0.0, 0.0, h * k, x * k, (page_h - (y + h)) * k),
            ContentStreamOp::PaintXObject(resource),
            ContentStreamOp::RestoreState,
        ]);
        if let Some(target) = link {
            self.link_area(x, y, w, h, target);
        }
    }
}

impl<T: Canvas + ?Sized> Draw for T {}

fn clip_paint(outline: bool) -> ContentStreamOp {
    if outline {
        ContentStreamOp::Stroke
    } else {
        ContentStreamOp::EndPath
    }
}
