//! Normalized font definitions.
//!
//! A [`FontDefinition`] is what the document keeps for every loaded font,
//! whatever its source: a base-14 core font, a TrueType or Type1 font
//! embedded with 8-bit WinAnsi encoding, or a UTF-8 TrueType font written
//! as a Type0 composite. The serde field names match the JSON font
//! definition files produced by common PDF font converters, so such files
//! load directly.

use crate::error::{Error, Result};
use crate::fonts::encoding::cp1252_to_char;
use crate::fonts::truetype_parser::TrueTypeFont;
use serde::{Deserialize, Serialize};

/// Font descriptor flag: fixed pitch.
pub const FLAG_FIXED_PITCH: u32 = 1;
/// Font descriptor flag: symbolic character set.
pub const FLAG_SYMBOLIC: u32 = 1 << 2;
/// Font descriptor flag: standard Latin character set.
pub const FLAG_NONSYMBOLIC: u32 = 1 << 5;
/// Font descriptor flag: italic.
pub const FLAG_ITALIC: u32 = 1 << 6;
/// Font descriptor flag: force bold.
pub const FLAG_FORCE_BOLD: u32 = 1 << 18;

/// How the font is written to the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FontKind {
    /// Base-14 font, never embedded
    #[default]
    Core,
    /// Embedded Type1 program (PFB segments)
    Type1,
    /// Embedded TrueType with 8-bit WinAnsi encoding
    TrueType,
    /// Embedded, subset TrueType as Type0/Identity-H
    #[serde(rename = "UTF8")]
    Utf8,
}

/// Font bounding box in glyph space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FontBox {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

/// Metrics written to the `/FontDescriptor` dictionary, in 1/1000 em.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FontDescriptor {
    pub ascent: i32,
    pub descent: i32,
    pub cap_height: i32,
    pub flags: u32,
    #[serde(rename = "FontBBox")]
    pub font_bbox: FontBox,
    pub italic_angle: i32,
    #[serde(rename = "StemV")]
    pub stem_v: i32,
    pub missing_width: i32,
}

/// A loaded font family/style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FontDefinition {
    /// Output kind
    #[serde(rename = "Tp")]
    pub kind: FontKind,
    /// PostScript name (`/BaseFont`)
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Desc")]
    pub desc: FontDescriptor,
    /// Underline position
    #[serde(rename = "Up")]
    pub underline_position: i32,
    /// Underline thickness
    #[serde(rename = "Ut")]
    pub underline_thickness: i32,
    /// Widths by 8-bit code; empty for UTF-8 fonts
    #[serde(rename = "Cw")]
    pub widths: Vec<u16>,
    /// Encoding name, `cp1252` for WinAnsi
    #[serde(rename = "Enc")]
    pub encoding: String,
    /// `/Differences` body relative to WinAnsi
    #[serde(rename = "Diff")]
    pub diff: String,
    /// Font program file name, resolved against the font directory
    #[serde(rename = "File")]
    pub file: String,
    /// Type1 clear-text segment length
    #[serde(rename = "Size1")]
    pub size1: u32,
    /// Type1 binary segment length
    #[serde(rename = "Size2")]
    pub size2: u32,
    /// TrueType program length before compression
    #[serde(rename = "OriginalSize")]
    pub original_size: u32,
}

impl FontDefinition {
    /// Decode a JSON font definition.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let def: FontDefinition = serde_json::from_slice(data)?;
        def.validate()?;
        Ok(def)
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check invariants that every non-UTF-8 definition must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Font("font definition has no name".to_string()));
        }
        if self.kind != FontKind::Utf8 && self.widths.len() != 256 {
            return Err(Error::Font(format!(
                "font definition {} has {} widths, expected 256",
                self.name,
                self.widths.len()
            )));
        }
        Ok(())
    }

    /// Build a definition from a parsed TrueType font.
    ///
    /// With `utf8` the result describes a Type0 font whose widths come from
    /// the font itself; otherwise a 256-entry WinAnsi width table is built.
    pub fn from_truetype(font: &TrueTypeFont, utf8: bool) -> Self {
        let italic_angle = font.italic_angle.round() as i32;
        let missing_width = font.glyph_width(0) as i32;

        let mut flags = if utf8 { FLAG_SYMBOLIC } else { FLAG_NONSYMBOLIC };
        if font.fixed_pitch {
            flags |= FLAG_FIXED_PITCH;
        }
        if italic_angle != 0 {
            flags |= FLAG_ITALIC;
        }
        if font.bold {
            flags |= FLAG_FORCE_BOLD;
        }

        let desc = FontDescriptor {
            ascent: font.scale(font.ascender as i32),
            descent: font.scale(font.descender as i32),
            cap_height: font.scale(font.cap_height as i32),
            flags,
            font_bbox: FontBox {
                xmin: font.scale(font.bbox[0] as i32),
                ymin: font.scale(font.bbox[1] as i32),
                xmax: font.scale(font.bbox[2] as i32),
                ymax: font.scale(font.bbox[3] as i32),
            },
            italic_angle,
            stem_v: font.stem_v(),
            missing_width,
        };

        let widths = if utf8 {
            Vec::new()
        } else {
            (0u8..=255)
                .map(|code| {
                    cp1252_to_char(code)
                        .and_then(|c| font.char_width(c as u32))
                        .unwrap_or(missing_width as u16)
                })
                .collect()
        };

        Self {
            kind: if utf8 { FontKind::Utf8 } else { FontKind::TrueType },
            name: font.postscript_name.clone(),
            desc,
            underline_position: font.scale(font.underline_position as i32),
            underline_thickness: font.scale(font.underline_thickness as i32),
            widths,
            encoding: if utf8 { String::new() } else { "cp1252".to_string() },
            diff: String::new(),
            file: String::new(),
            size1: 0,
            size2: 0,
            original_size: font.raw_data().len() as u32,
        }
    }

    /// Width of 8-bit code `code` in 1/1000 em.
    pub fn code_width(&self, code: u8) -> u16 {
        self.widths.get(code as usize).copied().unwrap_or(0)
    }

    /// Returns true if the font is written as a Type0 composite font.
    pub fn is_utf8(&self) -> bool {
        self.kind == FontKind::Utf8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::ttf_builder::TestFont;

    #[test]
    fn test_json_round_trip_field_names() {
        let json = br#"{
            "Tp": "TrueType",
            "Name": "DejaVuSans",
            "Desc": {"Ascent": 928, "Descent": -236, "CapHeight": 928, "Flags": 32,
                     "FontBBox": {"Xmin": -1021, "Ymin": -463, "Xmax": 1793, "Ymax": 1232},
                     "ItalicAngle": 0, "StemV": 70, "MissingWidth": 600},
            "Up": -63, "Ut": 44,
            "Cw": [600],
            "Enc": "cp1252", "Diff": "", "File": "DejaVuSans.z",
            "Size1": 0, "Size2": 0, "OriginalSize": 757076
        }"#;
        let short: std::result::Result<FontDefinition, _> = serde_json::from_slice(json);
        let def = short.unwrap();
        assert_eq!(def.kind, FontKind::TrueType);
        assert_eq!(def.desc.font_bbox.xmin, -1021);
        assert_eq!(def.desc.stem_v, 70);
        assert!(matches!(FontDefinition::from_json(json), Err(Error::Font(_))));

        let text = def.to_json().unwrap();
        assert!(text.contains("\"Tp\":\"TrueType\""));
        assert!(text.contains("\"FontBBox\""));
        assert!(text.contains("\"OriginalSize\":757076"));
    }

    #[test]
    fn test_utf8_kind_name() {
        let json = br#"{"Tp":"UTF8","Name":"Noto","Cw":[]}"#;
        let def = FontDefinition::from_json(json).unwrap();
        assert!(def.is_utf8());
    }

    #[test]
    fn test_from_truetype_8bit() {
        let bytes = TestFont::new(&[('A', 600), (' ', 250), ('€', 700)]).build();
        let font = TrueTypeFont::parse(&bytes).unwrap();
        let def = FontDefinition::from_truetype(&font, false);
        assert_eq!(def.kind, FontKind::TrueType);
        assert_eq!(def.widths.len(), 256);
        assert_eq!(def.code_width(b'A'), 600);
        assert_eq!(def.code_width(0x80), 700);
        assert_eq!(def.code_width(b'Z'), 500);
        assert_eq!(def.desc.flags & FLAG_NONSYMBOLIC, FLAG_NONSYMBOLIC);
        assert_eq!(def.desc.ascent, 800);
        assert_eq!(def.desc.cap_height, 700);
        assert_eq!(def.desc.missing_width, 500);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_from_truetype_utf8_flags() {
        let bytes = TestFont::new(&[('A', 600)]).bold().build();
        let font = TrueTypeFont::parse(&bytes).unwrap();
        let def = FontDefinition::from_truetype(&font, true);
        assert!(def.is_utf8());
        assert!(def.widths.is_empty());
        assert_eq!(def.desc.flags, FLAG_SYMBOLIC | FLAG_FORCE_BOLD);
    }
}
