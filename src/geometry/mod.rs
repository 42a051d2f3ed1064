//! Units, points, sizes and page boxes.
//!
//! User-facing coordinates are expressed in a document unit (millimetres by
//! default) measured from the top-left corner of the page. The serializer
//! works in PDF points measured from the bottom-left corner; the scale factor
//! `k` returned by [`Unit::scale_factor`] converts between the two.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Measurement unit used for every user-facing coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Unit {
    /// PostScript point, 1/72 inch
    Point,
    /// Millimetre
    #[default]
    Millimeter,
    /// Centimetre
    Centimeter,
    /// Inch
    Inch,
    /// CSS pixel, 1/96 inch
    Pixel,
}

impl Unit {
    /// Number of points in one unit.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_quill::geometry::Unit;
    ///
    /// assert_eq!(Unit::Inch.scale_factor(), 72.0);
    /// assert_eq!(Unit::Point.scale_factor(), 1.0);
    /// ```
    pub fn scale_factor(self) -> f64 {
        match self {
            Unit::Point => 1.0,
            Unit::Millimeter => 72.0 / 25.4,
            Unit::Centimeter => 72.0 / 2.54,
            Unit::Inch => 72.0,
            Unit::Pixel => 72.0 / 96.0,
        }
    }

    /// Short name as accepted by [`Unit::from_str`].
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Point => "pt",
            Unit::Millimeter => "mm",
            Unit::Centimeter => "cm",
            Unit::Inch => "in",
            Unit::Pixel => "px",
        }
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pt" | "point" => Ok(Unit::Point),
            "" | "mm" | "millimeter" => Ok(Unit::Millimeter),
            "cm" | "centimeter" => Ok(Unit::Centimeter),
            "in" | "inch" => Ok(Unit::Inch),
            "px" | "pixel" => Ok(Unit::Pixel),
            other => Err(Error::Configuration(format!("incorrect unit {}", other))),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert a value in points to the given unit.
pub fn points_to_units(unit: Unit, points: f64) -> f64 {
    points / unit.scale_factor()
}

/// Convert a value in the given unit to points.
pub fn units_to_points(unit: Unit, value: f64) -> f64 {
    value * unit.scale_factor()
}

/// A 2D point in user space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert both coordinates from points to `unit`.
    pub fn to_units(self, unit: Unit) -> Self {
        Self::new(points_to_units(unit, self.x), points_to_units(unit, self.y))
    }

    /// Convert both coordinates from `unit` to points.
    pub fn to_points(self, unit: Unit) -> Self {
        Self::new(units_to_points(unit, self.x), units_to_points(unit, self.y))
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Width
    pub w: f64,
    /// Height
    pub h: f64,
}

impl Size {
    /// Create a new size.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_quill::geometry::Size;
    ///
    /// let a4 = Size::new(595.28, 841.89);
    /// assert_eq!(a4.swapped().w, 841.89);
    /// ```
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    /// Width and height exchanged, as used for landscape pages.
    pub fn swapped(self) -> Self {
        Self::new(self.h, self.w)
    }

    /// Convert from points to `unit`.
    pub fn to_units(self, unit: Unit) -> Self {
        Self::new(points_to_units(unit, self.w), points_to_units(unit, self.h))
    }

    /// Convert from `unit` to points.
    pub fn to_points(self, unit: Unit) -> Self {
        Self::new(units_to_points(unit, self.w), units_to_points(unit, self.h))
    }

    /// Returns true if either dimension is not strictly positive.
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }
}

/// A rectangle given by its top-left corner and dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// X coordinate of the top-left corner
    pub x: f64,
    /// Y coordinate of the top-left corner
    pub y: f64,
    /// Width
    pub w: f64,
    /// Height
    pub h: f64,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Returns true if the point lies inside or on the edge of the rectangle.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// Page boundary boxes that may be overridden per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageBoxKind {
    /// Visible region (`/CropBox`)
    Crop,
    /// Production clip region (`/BleedBox`)
    Bleed,
    /// Finished page (`/TrimBox`)
    Trim,
    /// Meaningful content (`/ArtBox`)
    Art,
}

impl PageBoxKind {
    /// PDF dictionary key for the box.
    pub fn pdf_key(self) -> &'static str {
        match self {
            PageBoxKind::Crop => "CropBox",
            PageBoxKind::Bleed => "BleedBox",
            PageBoxKind::Trim => "TrimBox",
            PageBoxKind::Art => "ArtBox",
        }
    }
}

impl FromStr for PageBoxKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().trim_end_matches("box") {
            "crop" => Ok(PageBoxKind::Crop),
            "bleed" => Ok(PageBoxKind::Bleed),
            "trim" => Ok(PageBoxKind::Trim),
            "art" => Ok(PageBoxKind::Art),
            _ => Err(Error::Configuration(format!("unknown page box {}", s))),
        }
    }
}

/// A page box override in points, written as `[x y x+w y+h]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    /// Which box this is
    pub kind: PageBoxKind,
    /// Box rectangle in points
    pub rect: Rect,
}

/// Look up a named page size, returned in points as portrait.
pub fn named_page_size(name: &str) -> Option<Size> {
    let size = match name.to_ascii_lowercase().as_str() {
        "a1" => Size::new(1683.78, 2383.94),
        "a2" => Size::new(1190.55, 1683.78),
        "a3" => Size::new(841.89, 1190.55),
        "a4" => Size::new(595.28, 841.89),
        "a5" => Size::new(420.94, 595.28),
        "a6" => Size::new(297.64, 420.94),
        "letter" => Size::new(612.0, 792.0),
        "legal" => Size::new(612.0, 1008.0),
        "tabloid" => Size::new(792.0, 1224.0),
        _ => return None,
    };
    Some(size)
}
