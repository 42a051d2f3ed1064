//! Document information, viewer preferences and output intents.

use crate::error::{Error, Result};
use crate::fonts::encoding::utf8_to_utf16be;
use crate::object::{Dict, Object};
use crate::writer::pdf_writer::PdfWriter;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::str::FromStr;

/// One `/Info` text entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoText {
    pub value: String,
    /// Write as UTF-16BE; otherwise as ISO-8859-1
    pub utf8: bool,
}

impl InfoText {
    /// Create an entry.
    pub fn new(value: &str, utf8: bool) -> Self {
        Self {
            value: value.to_string(),
            utf8,
        }
    }

    /// String object for the entry.
    pub fn to_object(&self) -> Object {
        if self.utf8 {
            Object::String(utf8_to_utf16be(&self.value, true))
        } else {
            Object::String(
                self.value
                    .chars()
                    .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
                    .collect(),
            )
        }
    }
}

/// Document information dictionary contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Info {
    pub title: Option<InfoText>,
    pub subject: Option<InfoText>,
    pub author: Option<InfoText>,
    pub keywords: Option<InfoText>,
    pub creator: Option<InfoText>,
    pub producer: String,
    pub creation_date: Option<DateTime<FixedOffset>>,
    pub mod_date: Option<DateTime<FixedOffset>>,
}

impl Info {
    /// `/Info` dictionary; `now` fills in missing dates.
    pub fn to_dict(&self, now: DateTime<FixedOffset>) -> Dict {
        let mut d = Dict::new();
        if !self.producer.is_empty() {
            d.insert("Producer".into(), Object::unicode(&self.producer));
        }
        for (key, entry) in [
            ("Title", &self.title),
            ("Subject", &self.subject),
            ("Author", &self.author),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
        ] {
            if let Some(text) = entry {
                d.insert(key.into(), text.to_object());
            }
        }
        let created = self.creation_date.unwrap_or(now);
        d.insert("CreationDate".into(), Object::text(&pdf_date(&created)));
        d.insert(
            "ModDate".into(),
            Object::text(&pdf_date(&self.mod_date.unwrap_or(created))),
        );
        d
    }
}

/// `D:YYYYMMDDHHmmSS+hh'mm'`
pub fn pdf_date(dt: &DateTime<FixedOffset>) -> String {
    let offset = dt.offset().fix().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let minutes = offset.abs() / 60;
    format!(
        "D:{}{}{:02}'{:02}'",
        dt.format("%Y%m%d%H%M%S"),
        sign,
        minutes / 60,
        minutes % 60
    )
}

/// ISO 8601 form used inside XMP packets.
pub fn xmp_date(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339()
}

/// UTC timestamp as a fixed-offset date.
pub fn fixed(dt: DateTime<Utc>) -> DateTime<FixedOffset> {
    dt.into()
}

/// Initial zoom of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ZoomMode {
    /// Viewer default
    #[default]
    Default,
    /// Whole page visible
    FullPage,
    /// Page width fills the window
    FullWidth,
    /// 100 %
    Real,
    /// Explicit percentage
    Percent(f64),
}

impl FromStr for ZoomMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "default" => Ok(ZoomMode::Default),
            "fullpage" => Ok(ZoomMode::FullPage),
            "fullwidth" => Ok(ZoomMode::FullWidth),
            "real" => Ok(ZoomMode::Real),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|v| *v > 0.0)
                .map(ZoomMode::Percent)
                .ok_or_else(|| Error::Configuration(format!("incorrect zoom display mode: {}", s))),
        }
    }
}

/// Initial page layout of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    /// Viewer default
    #[default]
    Default,
    /// One page at a time
    Single,
    /// Pages in one scrolling column
    Continuous,
    /// Two columns, odd pages left
    Two,
}

impl FromStr for LayoutMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "default" => Ok(LayoutMode::Default),
            "single" | "singlepage" => Ok(LayoutMode::Single),
            "continuous" | "onecolumn" => Ok(LayoutMode::Continuous),
            "two" | "twocolumnleft" => Ok(LayoutMode::Two),
            _ => Err(Error::Configuration(format!("incorrect layout display mode: {}", s))),
        }
    }
}

impl ZoomMode {
    /// `/OpenAction` destination for the first page.
    pub fn open_action(&self, first_page: u32) -> Option<Object> {
        let page = Object::reference(first_page);
        let dest = match self {
            ZoomMode::Default => return None,
            ZoomMode::FullPage => vec![page, Object::name("Fit")],
            ZoomMode::FullWidth => vec![page, Object::name("FitH"), Object::Null],
            ZoomMode::Real => vec![page, Object::name("XYZ"), Object::Null, Object::Null, Object::Integer(1)],
            ZoomMode::Percent(p) => {
                vec![page, Object::name("XYZ"), Object::Null, Object::Null, Object::Real(p / 100.0)]
            },
        };
        Some(Object::Array(dest))
    }
}

impl LayoutMode {
    /// `/PageLayout` name.
    pub fn page_layout(&self) -> Option<&'static str> {
        match self {
            LayoutMode::Default => None,
            LayoutMode::Single => Some("SinglePage"),
            LayoutMode::Continuous => Some("OneColumn"),
            LayoutMode::Two => Some("TwoColumnLeft"),
        }
    }
}

/// Output intent subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputIntentSubtype {
    /// PDF/A-1
    #[default]
    PdfA1,
    /// PDF/X
    PdfX,
    /// PDF/E-1
    PdfE1,
}

impl OutputIntentSubtype {
    /// `/S` value.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            OutputIntentSubtype::PdfA1 => "GTS_PDFA1",
            OutputIntentSubtype::PdfX => "GTS_PDFX",
            OutputIntentSubtype::PdfE1 => "ISO_PDFE1",
        }
    }
}

/// Output intent with its ICC profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputIntent {
    pub subtype: OutputIntentSubtype,
    /// e.g. `sRGB IEC61966-2.1`
    pub output_condition_identifier: String,
    pub info: String,
    /// ICC profile bytes
    pub icc: Vec<u8>,
    /// Color components of the profile
    pub components: u8,
}

impl OutputIntent {
    /// RGB output intent; the profile bytes are copied.
    pub fn new(subtype: OutputIntentSubtype, identifier: &str, info: &str, icc: &[u8]) -> Self {
        Self {
            subtype,
            output_condition_identifier: identifier.to_string(),
            info: info.to_string(),
            icc: icc.to_vec(),
            components: 3,
        }
    }

    /// Write the profile stream and the intent dictionary; returns the
    /// intent's object number.
    pub fn write(&self, w: &mut PdfWriter) -> Result<u32> {
        let mut profile = Dict::new();
        profile.insert("N".into(), Object::Integer(self.components as i64));
        let icc = w.put_stream_object(profile, &self.icc, true)?;

        let mut d = Dict::new();
        d.insert("Type".into(), Object::name("OutputIntent"));
        d.insert("S".into(), Object::name(self.subtype.pdf_name()));
        d.insert(
            "OutputConditionIdentifier".into(),
            Object::unicode(&self.output_condition_identifier),
        );
        if !self.info.is_empty() {
            d.insert("Info".into(), Object::unicode(&self.info));
        }
        d.insert("DestOutputProfile".into(), Object::reference(icc));
        Ok(w.put_object(&d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pdf_date() {
        let utc = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(pdf_date(&fixed(utc)), "D:20000101000000+00'00'");
        let tz = FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap();
        let local = tz.with_ymd_and_hms(2021, 6, 30, 23, 59, 58).unwrap();
        assert_eq!(pdf_date(&local), "D:20210630235958-05'30'");
    }

    #[test]
    fn test_info_text_encodings() {
        assert_eq!(InfoText::new("Café", false).to_object(), Object::String(b"Caf\xE9".to_vec()));
        assert_eq!(
            InfoText::new("é", true).to_object(),
            Object::String(vec![0xFE, 0xFF, 0x00, 0xE9])
        );
    }

    #[test]
    fn test_info_dict_dates_default_to_now() {
        let now = fixed(Utc.with_ymd_and_hms(2020, 2, 3, 4, 5, 6).unwrap());
        let info = Info {
            title: Some(InfoText::new("T", true)),
            producer: "p".to_string(),
            ..Default::default()
        };
        let d = info.to_dict(now);
        assert_eq!(d["CreationDate"], Object::text("D:20200203040506+00'00'"));
        assert_eq!(d["ModDate"], d["CreationDate"]);
        assert!(d.contains_key("Title"));
        assert!(!d.contains_key("Author"));
    }

    #[test]
    fn test_display_modes() {
        assert_eq!("fullpage".parse::<ZoomMode>().unwrap(), ZoomMode::FullPage);
        assert_eq!("150".parse::<ZoomMode>().unwrap(), ZoomMode::Percent(150.0));
        assert!("huge".parse::<ZoomMode>().is_err());
        assert_eq!("two".parse::<LayoutMode>().unwrap().page_layout(), Some("TwoColumnLeft"));
        assert!(ZoomMode::Default.open_action(3).is_none());
        assert_eq!(
            ZoomMode::Percent(150.0).open_action(3),
            Some(Object::Array(vec![
                Object::reference(3),
                Object::name("XYZ"),
                Object::Null,
                Object::Null,
                Object::Real(1.5)
            ]))
        );
    }
}
