//! Document construction options.
//!
//! Everything that would otherwise be a process-wide default (compression,
//! catalog sorting, a frozen creation date for reproducible output) is carried
//! here and handed to [`Document::new`](crate::Document::new).

use crate::error::{Error, Result};
use crate::geometry::{named_page_size, Size, Unit};
use crate::io::{default_loader, SharedLoader};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Height greater than width
    #[default]
    Portrait,
    /// Width greater than height
    Landscape,
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "p" | "portrait" => Ok(Orientation::Portrait),
            "l" | "landscape" => Ok(Orientation::Landscape),
            other => Err(Error::Configuration(format!("incorrect orientation: {}", other))),
        }
    }
}

/// Page dimensions, either a standard name or explicit dimensions.
#[derive(Debug, Clone, PartialEq)]
pub enum PageSize {
    /// Standard size such as `"A4"` or `"Letter"`
    Named(String),
    /// Explicit portrait size in document units
    Custom(Size),
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::Named("A4".to_string())
    }
}

impl PageSize {
    /// Resolve to a portrait size in points.
    pub fn to_points(&self, unit: Unit) -> Result<Size> {
        match self {
            PageSize::Named(name) => named_page_size(name)
                .ok_or_else(|| Error::Configuration(format!("unknown page size {}", name))),
            PageSize::Custom(size) => {
                if size.is_empty() {
                    return Err(Error::Configuration(format!(
                        "invalid page size {}x{}",
                        size.w, size.h
                    )));
                }
                Ok(size.to_points(unit))
            },
        }
    }
}

/// Options for a new document.
#[derive(Clone)]
pub struct DocumentConfig {
    /// Default page orientation
    pub orientation: Orientation,
    /// User unit for every coordinate
    pub unit: Unit,
    /// Default page size
    pub page_size: PageSize,
    /// Directory searched for font files given by relative path
    pub font_dir: PathBuf,
    /// Flate-compress page content and embedded resources
    pub compress: bool,
    /// Emit dictionary keys in sorted order where the order is free
    pub catalog_sort: bool,
    /// Frozen creation date; `None` means "now"
    pub creation_date: Option<DateTime<Utc>>,
    /// Frozen modification date; `None` means the creation date
    pub mod_date: Option<DateTime<Utc>>,
    /// Value of the `/Producer` info entry
    pub producer: String,
    /// Derive the trailer `/ID` from document content only
    pub deterministic_id: bool,
    /// File access capability
    pub loader: SharedLoader,
}

impl fmt::Debug for DocumentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentConfig")
            .field("orientation", &self.orientation)
            .field("unit", &self.unit)
            .field("page_size", &self.page_size)
            .field("font_dir", &self.font_dir)
            .field("compress", &self.compress)
            .field("catalog_sort", &self.catalog_sort)
            .field("creation_date", &self.creation_date)
            .field("mod_date", &self.mod_date)
            .field("producer", &self.producer)
            .field("deterministic_id", &self.deterministic_id)
            .finish_non_exhaustive()
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentConfig {
    /// Portrait A4 in millimetres with compression enabled.
    pub fn new() -> Self {
        Self {
            orientation: Orientation::Portrait,
            unit: Unit::Millimeter,
            page_size: PageSize::default(),
            font_dir: PathBuf::from("."),
            compress: true,
            catalog_sort: false,
            creation_date: None,
            mod_date: None,
            producer: format!("pdf_quill {}", crate::VERSION),
            deterministic_id: false,
            loader: default_loader(),
        }
    }

    /// Reproducible profile for golden-file tests.
    ///
    /// Uncompressed, sorted, dated 2000-01-01 00:00:00 UTC and with a
    /// content-derived file identifier.
    pub fn testing() -> Self {
        let fixed = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).single();
        Self {
            compress: false,
            catalog_sort: true,
            creation_date: fixed,
            mod_date: fixed,
            deterministic_id: true,
            ..Self::new()
        }
    }

    /// Set the default orientation.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the user unit.
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    /// Set the default page size.
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the font directory.
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dir = dir.into();
        self
    }

    /// Enable or disable Flate compression.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Enable or disable sorted catalog output.
    pub fn with_catalog_sort(mut self, sort: bool) -> Self {
        self.catalog_sort = sort;
        self
    }

    /// Freeze the creation date.
    pub fn with_creation_date(mut self, date: DateTime<Utc>) -> Self {
        self.creation_date = Some(date);
        self
    }

    /// Freeze the modification date.
    pub fn with_mod_date(mut self, date: DateTime<Utc>) -> Self {
        self.mod_date = Some(date);
        self
    }

    /// Set the producer string.
    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = producer.into();
        self
    }

    /// Replace the file access capability.
    pub fn with_loader(mut self, loader: SharedLoader) -> Self {
        self.loader = loader;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_parse() {
        assert_eq!("L".parse::<Orientation>().unwrap(), Orientation::Landscape);
        assert_eq!("portrait".parse::<Orientation>().unwrap(), Orientation::Portrait);
        assert!("sideways".parse::<Orientation>().is_err());
    }

    #[test]
    fn test_page_size_resolution() {
        let letter = PageSize::Named("letter".into()).to_points(Unit::Millimeter).unwrap();
        assert_eq!(letter, Size::new(612.0, 792.0));

        let custom = PageSize::Custom(Size::new(1.0, 2.0)).to_points(Unit::Inch).unwrap();
        assert_eq!(custom, Size::new(72.0, 144.0));

        assert!(PageSize::Named("folio".into()).to_points(Unit::Point).is_err());
        assert!(PageSize::Custom(Size::new(0.0, 2.0)).to_points(Unit::Point).is_err());
    }

    #[test]
    fn test_testing_profile() {
        let cfg = DocumentConfig::testing();
        assert!(!cfg.compress);
        assert!(cfg.catalog_sort);
        assert!(cfg.deterministic_id);
        assert_eq!(cfg.creation_date, Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).single());
    }

    #[test]
    fn test_builder_setters() {
        let cfg = DocumentConfig::new()
            .with_unit(Unit::Point)
            .with_orientation(Orientation::Landscape)
            .with_compression(false)
            .with_producer("unit test");
        assert_eq!(cfg.unit, Unit::Point);
        assert_eq!(cfg.orientation, Orientation::Landscape);
        assert!(!cfg.compress);
        assert_eq!(cfg.producer, "unit test");
    }
}
