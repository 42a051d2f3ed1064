//! PDF content stream operators.
//!
//! Drawing and text calls are assembled from [`ContentStreamOp`] values and
//! written with fixed precision: two decimals for coordinates, three for
//! colors and word spacing, five for transformation and curve operands.
//! Text operands arrive already encoded by the font (a literal `(...)` or
//! hex `<...>` string), so the builder never re-encodes them.

/// Operations that can be added to a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentStreamOp {
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Concatenate matrix (cm)
    Transform(f64, f64, f64, f64, f64, f64),
    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,
    /// Select font resource and size in points (Tf)
    SetFont(String, f64),
    /// Move text position (Td)
    MoveText(f64, f64),
    /// Show an encoded string operand (Tj)
    ShowText(Vec<u8>),
    /// Show strings with positioning (TJ)
    ShowTextArray(Vec<TextArrayItem>),
    /// Set word spacing (Tw)
    SetWordSpacing(f64),
    /// Set text rendering mode (Tr)
    SetTextRenderMode(u8),
    /// Set fill color RGB, components 0-1 (rg)
    SetFillColorRGB(f64, f64, f64),
    /// Set stroke color RGB (RG)
    SetStrokeColorRGB(f64, f64, f64),
    /// Set fill gray (g)
    SetFillColorGray(f64),
    /// Set stroke gray (G)
    SetStrokeColorGray(f64),
    /// Select a Separation color space and tint for filling (cs scn)
    SetFillSpot(String, f64),
    /// Select a Separation color space and tint for stroking (CS SCN)
    SetStrokeSpot(String, f64),
    /// Set line width (w)
    SetLineWidth(f64),
    /// Set line cap style (J)
    SetLineCap(LineCap),
    /// Set line join style (j)
    SetLineJoin(LineJoin),
    /// Set dash pattern, already scaled to points (d)
    SetDashPattern(Vec<f64>, f64),
    /// Move to (m)
    MoveTo(f64, f64),
    /// Line to (l)
    LineTo(f64, f64),
    /// Cubic Bézier curve (c)
    CurveTo(f64, f64, f64, f64, f64, f64),
    /// Curve with first control point on the current point (v)
    CurveToV(f64, f64, f64, f64),
    /// Rectangle (re)
    Rectangle(f64, f64, f64, f64),
    /// Close path (h)
    ClosePath,
    /// Stroke (S)
    Stroke,
    /// Close and stroke (s)
    CloseStroke,
    /// Fill, non-zero winding (f)
    Fill,
    /// Fill, even-odd (f*)
    FillEvenOdd,
    /// Fill and stroke (B)
    FillStroke,
    /// Fill and stroke, even-odd (B*)
    FillStrokeEvenOdd,
    /// Close, fill and stroke (b)
    CloseFillStroke,
    /// End path without painting (n)
    EndPath,
    /// Intersect clip, non-zero winding (W)
    Clip,
    /// Intersect clip, even-odd (W*)
    ClipEvenOdd,
    /// Apply an ExtGState resource (gs)
    SetExtGState(String),
    /// Paint an XObject resource (Do)
    PaintXObject(String),
    /// Begin optional content (`/OC /name BDC`)
    BeginOptionalContent(String),
    /// End marked content (EMC)
    EndMarkedContent,
    /// Raw operator text
    Raw(String),
}

/// Line cap styles for path stroking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    /// Square butt cap (default)
    #[default]
    Butt = 0,
    /// Round cap
    Round = 1,
    /// Projecting square cap
    Square = 2,
}

impl LineCap {
    /// Parse `"butt"`, `"round"` or `"square"`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "butt" => Some(LineCap::Butt),
            "round" => Some(LineCap::Round),
            "square" => Some(LineCap::Square),
            _ => None,
        }
    }
}

/// Line join styles for path stroking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    /// Miter join (default)
    #[default]
    Miter = 0,
    /// Round join
    Round = 1,
    /// Bevel join
    Bevel = 2,
}

impl LineJoin {
    /// Parse `"miter"`, `"round"` or `"bevel"`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "miter" => Some(LineJoin::Miter),
            "round" => Some(LineJoin::Round),
            "bevel" => Some(LineJoin::Bevel),
            _ => None,
        }
    }
}

/// Blend modes for transparency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Normal blend (default)
    #[default]
    Normal,
    /// Multiply
    Multiply,
    /// Screen
    Screen,
    /// Overlay
    Overlay,
    /// Darken
    Darken,
    /// Lighten
    Lighten,
    /// Color dodge
    ColorDodge,
    /// Color burn
    ColorBurn,
    /// Hard light
    HardLight,
    /// Soft light
    SoftLight,
    /// Difference
    Difference,
    /// Exclusion
    Exclusion,
    /// Hue
    Hue,
    /// Saturation
    Saturation,
    /// Color
    Color,
    /// Luminosity
    Luminosity,
}

impl BlendMode {
    /// Get the PDF name for this blend mode.
    pub fn as_pdf_name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::Darken => "Darken",
            BlendMode::Lighten => "Lighten",
            BlendMode::ColorDodge => "ColorDodge",
            BlendMode::ColorBurn => "ColorBurn",
            BlendMode::HardLight => "HardLight",
            BlendMode::SoftLight => "SoftLight",
            BlendMode::Difference => "Difference",
            BlendMode::Exclusion => "Exclusion",
            BlendMode::Hue => "Hue",
            BlendMode::Saturation => "Saturation",
            BlendMode::Color => "Color",
            BlendMode::Luminosity => "Luminosity",
        }
    }

    /// Look up a blend mode by its PDF name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let all = [
            BlendMode::Normal,
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::Darken,
            BlendMode::Lighten,
            BlendMode::ColorDodge,
            BlendMode::ColorBurn,
            BlendMode::HardLight,
            BlendMode::SoftLight,
            BlendMode::Difference,
            BlendMode::Exclusion,
            BlendMode::Hue,
            BlendMode::Saturation,
            BlendMode::Color,
            BlendMode::Luminosity,
        ];
        if name.is_empty() {
            return Some(BlendMode::Normal);
        }
        all.into_iter().find(|m| m.as_pdf_name().eq_ignore_ascii_case(name))
    }
}

/// Item in a TJ array.
#[derive(Debug, Clone, PartialEq)]
pub enum TextArrayItem {
    /// Encoded string operand
    Text(Vec<u8>),
    /// Positioning adjustment in 1/1000 text space units (negative moves right)
    Adjustment(f64),
}

/// Painting operator for a `"D"`, `"F"`, `"DF"`/`"FD"` style string.
///
/// A trailing `*` selects the even-odd rule for filled styles. Anything
/// unrecognized strokes.
pub fn paint_op(style: &str) -> ContentStreamOp {
    match style.to_ascii_uppercase().as_str() {
        "F" => ContentStreamOp::Fill,
        "F*" => ContentStreamOp::FillEvenOdd,
        "FD" | "DF" => ContentStreamOp::FillStroke,
        "FD*" | "DF*" => ContentStreamOp::FillStrokeEvenOdd,
        _ => ContentStreamOp::Stroke,
    }
}

impl ContentStreamOp {
    /// Append the operator and its operands to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        use ContentStreamOp::*;
        let text = match self {
            SaveState => "q".to_string(),
            RestoreState => "Q".to_string(),
            Transform(a, b, c, d, e, f) => {
                format!("{:.5} {:.5} {:.5} {:.5} {:.5} {:.5} cm", a, b, c, d, e, f)
            },
            BeginText => "BT".to_string(),
            EndText => "ET".to_string(),
            SetFont(name, size) => format!("/{} {:.2} Tf", name, size),
            MoveText(x, y) => format!("{:.2} {:.2} Td", x, y),
            ShowText(encoded) => {
                out.extend_from_slice(encoded);
                out.extend_from_slice(b" Tj");
                return;
            },
            ShowTextArray(items) => {
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    match item {
                        TextArrayItem::Text(encoded) => out.extend_from_slice(encoded),
                        TextArrayItem::Adjustment(adj) => {
                            out.extend_from_slice(format!("{:.3}", adj).as_bytes())
                        },
                    }
                }
                out.extend_from_slice(b"] TJ");
                return;
            },
            SetWordSpacing(ws) => format!("{:.3} Tw", ws),
            SetTextRenderMode(mode) => format!("{} Tr", mode),
            SetFillColorRGB(r, g, b) => format!("{:.3} {:.3} {:.3} rg", r, g, b),
            SetStrokeColorRGB(r, g, b) => format!("{:.3} {:.3} {:.3} RG", r, g, b),
            SetFillColorGray(g) => format!("{:.3} g", g),
            SetStrokeColorGray(g) => format!("{:.3} G", g),
            SetFillSpot(name, tint) => format!("/{} cs {:.3} scn", name, tint),
            SetStrokeSpot(name, tint) => format!("/{} CS {:.3} SCN", name, tint),
            SetLineWidth(w) => format!("{:.2} w", w),
            SetLineCap(cap) => format!("{} J", *cap as u8),
            SetLineJoin(join) => format!("{} j", *join as u8),
            SetDashPattern(array, phase) => {
                let parts: Vec<String> = array.iter().map(|v| format!("{:.3}", v)).collect();
                format!("[{}] {:.2} d", parts.join(" "), phase)
            },
            MoveTo(x, y) => format!("{:.2} {:.2} m", x, y),
            LineTo(x, y) => format!("{:.2} {:.2} l", x, y),
            CurveTo(x1, y1, x2, y2, x3, y3) => {
                format!("{:.5} {:.5} {:.5} {:.5} {:.5} {:.5} c", x1, y1, x2, y2, x3, y3)
            },
            CurveToV(x2, y2, x3, y3) => format!("{:.5} {:.5} {:.5} {:.5} v", x2, y2, x3, y3),
            Rectangle(x, y, w, h) => format!("{:.2} {:.2} {:.2} {:.2} re", x, y, w, h),
            ClosePath => "h".to_string(),
            Stroke => "S".to_string(),
            CloseStroke => "s".to_string(),
            Fill => "f".to_string(),
            FillEvenOdd => "f*".to_string(),
            FillStroke => "B".to_string(),
            FillStrokeEvenOdd => "B*".to_string(),
            CloseFillStroke => "b".to_string(),
            EndPath => "n".to_string(),
            Clip => "W".to_string(),
            ClipEvenOdd => "W*".to_string(),
            SetExtGState(name) => format!("/{} gs", name),
            PaintXObject(name) => format!("/{} Do", name),
            BeginOptionalContent(name) => format!("/OC /{} BDC", name),
            EndMarkedContent => "EMC".to_string(),
            Raw(s) => s.clone(),
        };
        out.extend_from_slice(text.as_bytes());
    }
}

/// Builder for one line of content stream operators.
///
/// Operators are separated by single spaces; the caller decides where
/// lines end.
#[derive(Debug, Default, Clone)]
pub struct ContentStreamBuilder {
    operations: Vec<ContentStreamOp>,
}

impl ContentStreamBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation.
    pub fn op(&mut self, op: ContentStreamOp) -> &mut Self {
        self.operations.push(op);
        self
    }

    /// Add multiple operations.
    pub fn ops(&mut self, ops: impl IntoIterator<Item = ContentStreamOp>) -> &mut Self {
        self.operations.extend(ops);
        self
    }

    /// Returns true if nothing was added.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// `q`
    pub fn save_state(&mut self) -> &mut Self {
        self.op(ContentStreamOp::SaveState)
    }

    /// `Q`
    pub fn restore_state(&mut self) -> &mut Self {
        self.op(ContentStreamOp::RestoreState)
    }

    /// `re`
    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> &mut Self {
        self.op(ContentStreamOp::Rectangle(x, y, w, h))
    }

    /// `m`
    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.op(ContentStreamOp::MoveTo(x, y))
    }

    /// `l`
    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.op(ContentStreamOp::LineTo(x, y))
    }

    /// `c`
    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) -> &mut Self {
        self.op(ContentStreamOp::CurveTo(x1, y1, x2, y2, x3, y3))
    }

    /// `cm`
    pub fn transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> &mut Self {
        self.op(ContentStreamOp::Transform(a, b, c, d, e, f))
    }

    /// `BT x y Td <text> Tj ET`
    pub fn text_at(&mut self, x: f64, y: f64, encoded: Vec<u8>) -> &mut Self {
        self.ops([
            ContentStreamOp::BeginText,
            ContentStreamOp::MoveText(x, y),
            ContentStreamOp::ShowText(encoded),
            ContentStreamOp::EndText,
        ])
    }

    /// Serialize the operators separated by spaces.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (i, op) in self.operations.iter().enumerate() {
            if i > 0 {
                out.push(b' ');
            }
            op.write_to(&mut out);
        }
        out
    }
}

/// Serialize a single operator.
pub fn op_bytes(op: &ContentStreamOp) -> Vec<u8> {
    let mut out = Vec::new();
    op.write_to(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(op: ContentStreamOp) -> String {
        String::from_utf8(op_bytes(&op)).unwrap()
    }

    #[test]
    fn test_precision() {
        assert_eq!(s(ContentStreamOp::MoveTo(1.0, 2.345)), "1.00 2.35 m");
        assert_eq!(s(ContentStreamOp::SetWordSpacing(1.23456)), "1.235 Tw");
        assert_eq!(s(ContentStreamOp::SetFillColorRGB(1.0, 0.5, 0.0)), "1.000 0.500 0.000 rg");
        assert_eq!(
            s(ContentStreamOp::Transform(1.0, 0.0, 0.0, 1.0, 10.0, -5.0)),
            "1.00000 0.00000 0.00000 1.00000 10.00000 -5.00000 cm"
        );
    }

    #[test]
    fn test_text_operators() {
        assert_eq!(s(ContentStreamOp::SetFont("F1".into(), 12.0)), "/F1 12.00 Tf");
        assert_eq!(s(ContentStreamOp::ShowText(b"(Hi)".to_vec())), "(Hi) Tj");
        let tj = ContentStreamOp::ShowTextArray(vec![
            TextArrayItem::Text(b"<0041>".to_vec()),
            TextArrayItem::Adjustment(-250.0),
            TextArrayItem::Text(b"<0042>".to_vec()),
        ]);
        assert_eq!(s(tj), "[<0041> -250.000 <0042>] TJ");
    }

    #[test]
    fn test_spot_and_dash() {
        assert_eq!(s(ContentStreamOp::SetStrokeSpot("CS1".into(), 0.5)), "/CS1 CS 0.500 SCN");
        assert_eq!(s(ContentStreamOp::SetDashPattern(vec![3.0, 1.5], 0.0)), "[3.000 1.500] 0.00 d");
        assert_eq!(s(ContentStreamOp::SetDashPattern(vec![], 0.0)), "[] 0.00 d");
    }

    #[test]
    fn test_builder_joins_with_spaces() {
        let mut b = ContentStreamBuilder::new();
        b.save_state().rect(0.0, 0.0, 10.0, 20.0).op(ContentStreamOp::Clip).op(ContentStreamOp::EndPath);
        assert_eq!(b.build(), b"q 0.00 0.00 10.00 20.00 re W n");
    }

    #[test]
    fn test_paint_op() {
        assert_eq!(paint_op("F"), ContentStreamOp::Fill);
        assert_eq!(paint_op("df"), ContentStreamOp::FillStroke);
        assert_eq!(paint_op(""), ContentStreamOp::Stroke);
        assert_eq!(paint_op("F*"), ContentStreamOp::FillEvenOdd);
    }

    #[test]
    fn test_blend_mode_lookup() {
        assert_eq!(BlendMode::from_name("multiply"), Some(BlendMode::Multiply));
        assert_eq!(BlendMode::from_name(""), Some(BlendMode::Normal));
        assert_eq!(BlendMode::from_name("Sparkle"), None);
    }
}
