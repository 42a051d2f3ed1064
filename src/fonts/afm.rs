//! Type1 fonts: AFM metrics and PFB font programs.
//!
//! The AFM file supplies the name, bounding box and per-glyph widths keyed
//! by glyph name; widths are placed into a 256-entry table by looking up
//! the WinAnsi glyph name of every code. The PFB file is split into its
//! clear-text and binary segments, whose lengths become `/Length1` and
//! `/Length2` of the embedded `/FontFile`.

use crate::error::{Error, Result};
use crate::fonts::definition::{
    FontBox, FontDefinition, FontDescriptor, FontKind, FLAG_FIXED_PITCH, FLAG_ITALIC,
    FLAG_NONSYMBOLIC, FLAG_SYMBOLIC,
};
use crate::fonts::encoding::glyph_name;
use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// Metrics parsed from an AFM file.
#[derive(Debug, Clone, Default)]
pub struct AfmFont {
    pub font_name: String,
    pub weight: String,
    pub italic_angle: f64,
    pub fixed_pitch: bool,
    pub bbox: [i32; 4],
    pub underline_position: i32,
    pub underline_thickness: i32,
    pub cap_height: Option<i32>,
    pub ascender: Option<i32>,
    pub descender: Option<i32>,
    pub std_vw: Option<i32>,
    /// `CharacterSet Special` or `EncodingScheme FontSpecific`
    pub symbolic: bool,
    /// Advance widths by glyph name
    pub widths: HashMap<String, u16>,
}

impl AfmFont {
    /// Parse AFM text.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(data);
        let mut afm = AfmFont::default();
        let mut in_metrics = false;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("Comment") {
                continue;
            }
            if in_metrics {
                if line.starts_with("EndCharMetrics") {
                    in_metrics = false;
                } else {
                    afm.parse_char_metric(line);
                }
                continue;
            }

            let (key, value) = match line.split_once(char::is_whitespace) {
                Some((k, v)) => (k, v.trim()),
                None => (line, ""),
            };
            match key {
                "FontName" => afm.font_name = value.to_string(),
                "Weight" => afm.weight = value.to_string(),
                "ItalicAngle" => afm.italic_angle = value.parse().unwrap_or(0.0),
                "IsFixedPitch" => afm.fixed_pitch = value == "true",
                "FontBBox" => {
                    let nums: Vec<i32> = value.split_whitespace().filter_map(parse_int).collect();
                    if nums.len() == 4 {
                        afm.bbox = [nums[0], nums[1], nums[2], nums[3]];
                    }
                },
                "UnderlinePosition" => afm.underline_position = parse_int(value).unwrap_or(-100),
                "UnderlineThickness" => afm.underline_thickness = parse_int(value).unwrap_or(50),
                "CapHeight" => afm.cap_height = parse_int(value),
                "Ascender" => afm.ascender = parse_int(value),
                "Descender" => afm.descender = parse_int(value),
                "StdVW" => afm.std_vw = parse_int(value),
                "CharacterSet" => afm.symbolic |= value == "Special",
                "EncodingScheme" => afm.symbolic |= value == "FontSpecific",
                "StartCharMetrics" => in_metrics = true,
                _ => {},
            }
        }

        if afm.font_name.is_empty() {
            return Err(Error::Font("AFM file has no FontName".to_string()));
        }
        log::debug!("Parsed AFM {} with {} glyph widths", afm.font_name, afm.widths.len());
        Ok(afm)
    }

    /// `C 65 ; WX 667 ; N A ; B ...`
    fn parse_char_metric(&mut self, line: &str) {
        let mut width = None;
        let mut name = None;
        for field in line.split(';') {
            let mut parts = field.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("WX"), Some(w)) | (Some("W0X"), Some(w)) => width = parse_int(w),
                (Some("N"), Some(n)) => name = Some(n.to_string()),
                _ => {},
            }
        }
        if let (Some(w), Some(n)) = (width, name) {
            self.widths.insert(n, w.max(0) as u16);
        }
    }

    fn is_bold(&self) -> bool {
        let w = self.weight.to_lowercase();
        w.contains("bold") || w.contains("black")
    }

    /// Build the definition of this font embedded as a Type1 font.
    pub fn to_definition(&self, program: &Type1Program) -> FontDefinition {
        let missing_width = self.widths.get(".notdef").copied().unwrap_or(0);
        let widths: Vec<u16> = (0u8..=255)
            .map(|code| self.widths.get(glyph_name(code)).copied().unwrap_or(missing_width))
            .collect();

        let mut flags = if self.symbolic { FLAG_SYMBOLIC } else { FLAG_NONSYMBOLIC };
        if self.fixed_pitch {
            flags |= FLAG_FIXED_PITCH;
        }
        if self.italic_angle != 0.0 {
            flags |= FLAG_ITALIC;
        }
        let ascent = self.ascender.unwrap_or(self.bbox[3]);

        FontDefinition {
            kind: FontKind::Type1,
            name: self.font_name.clone(),
            desc: FontDescriptor {
                ascent,
                descent: self.descender.unwrap_or(self.bbox[1]),
                cap_height: self.cap_height.unwrap_or(ascent),
                flags,
                font_bbox: FontBox {
                    xmin: self.bbox[0],
                    ymin: self.bbox[1],
                    xmax: self.bbox[2],
                    ymax: self.bbox[3],
                },
                italic_angle: self.italic_angle.round() as i32,
                stem_v: self.std_vw.unwrap_or(if self.is_bold() { 120 } else { 70 }),
                missing_width: missing_width as i32,
            },
            underline_position: self.underline_position,
            underline_thickness: self.underline_thickness,
            widths,
            encoding: "cp1252".to_string(),
            diff: String::new(),
            file: String::new(),
            size1: program.size1,
            size2: program.size2,
            original_size: program.data.len() as u32,
        }
    }
}

fn parse_int(s: &str) -> Option<i32> {
    s.parse::<f64>().ok().map(|v| v.round() as i32)
}

/// Type1 font program with its segment lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type1Program {
    /// Clear-text segment followed by the binary segment
    pub data: Vec<u8>,
    /// Clear-text length
    pub size1: u32,
    /// Binary length
    pub size2: u32,
}

/// Split a PFB file into clear-text and binary parts.
///
/// PFB files are a sequence of segments `0x80 type len(u32 LE) data`,
/// type 1 = ASCII, 2 = binary, 3 = end of file.
pub fn parse_pfb(data: &[u8]) -> Result<Type1Program> {
    if data.first() != Some(&0x80) {
        return Err(Error::Font("Type1 font file is not in PFB format".to_string()));
    }
    let mut r = Cursor::new(data);
    let mut ascii = Vec::new();
    let mut binary = Vec::new();
    loop {
        let marker = r.read_u8().map_err(|_| Error::Font("truncated PFB file".to_string()))?;
        if marker != 0x80 {
            return Err(Error::Font(format!("invalid PFB segment marker {:#04X}", marker)));
        }
        let kind = r.read_u8().map_err(|_| Error::Font("truncated PFB file".to_string()))?;
        if kind == 3 {
            break;
        }
        let len = r
            .read_u32::<LittleEndian>()
            .map_err(|_| Error::Font("truncated PFB segment header".to_string()))?;
        let mut segment = vec![0u8; len as usize];
        r.read_exact(&mut segment)
            .map_err(|_| Error::Font("truncated PFB segment".to_string()))?;
        match kind {
            1 if binary.is_empty() => ascii.extend_from_slice(&segment),
            // Trailing cleartext (zeros and cleartomark) is not embedded
            1 => {},
            2 => binary.extend_from_slice(&segment),
            other => return Err(Error::Font(format!("unknown PFB segment type {}", other))),
        }
        if r.position() as usize >= data.len() {
            break;
        }
    }
    if ascii.is_empty() || binary.is_empty() {
        return Err(Error::Font("PFB file lacks a clear-text or binary segment".to_string()));
    }
    let size1 = ascii.len() as u32;
    let size2 = binary.len() as u32;
    ascii.extend_from_slice(&binary);
    Ok(Type1Program {
        data: ascii,
        size1,
        size2,
    })
}
