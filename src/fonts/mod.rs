//! Font loading, metrics and embedding.
//!
//! Every font the document uses is held as a [`LoadedFont`]: a normalized
//! [`FontDefinition`] plus whatever is needed to embed it later (the
//! TrueType program, a Type1 program, or nothing for the base-14 fonts).
//! UTF-8 fonts also track the runes actually drawn so that only those
//! glyphs are embedded.

pub mod afm;
pub mod core_fonts;
pub mod definition;
pub mod encoding;
pub mod font_subsetter;
pub mod truetype_parser;
pub mod widths;

#[cfg(test)]
#[path = "../../tests/common/ttf_builder.rs"]
pub(crate) mod ttf_builder;

pub use afm::{parse_pfb, AfmFont, Type1Program};
pub use definition::{FontDefinition, FontDescriptor, FontKind};
pub use font_subsetter::{FontSubsetter, SubsetFont};
pub use truetype_parser::TrueTypeFont;

use crate::error::{Error, Result};
use crate::fonts::encoding::{encode_cp1252, hex_string};
use crate::writer::object_serializer::escape_literal;
use bitflags::bitflags;

bitflags! {
    /// Font style flags as accepted by `set_font`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontStyle: u8 {
        /// `B`
        const BOLD = 1;
        /// `I`
        const ITALIC = 1 << 1;
        /// `U`, drawn as a rectangle under the text
        const UNDERLINE = 1 << 2;
        /// `S`, drawn as a rectangle through the text
        const STRIKEOUT = 1 << 3;
    }
}

impl FontStyle {
    /// Parse a style string made of `B`, `I`, `U` and `S` in any case and order.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_quill::fonts::FontStyle;
    ///
    /// assert_eq!(FontStyle::parse("ib"), FontStyle::BOLD | FontStyle::ITALIC);
    /// assert_eq!(FontStyle::parse(""), FontStyle::empty());
    /// ```
    pub fn parse(style: &str) -> Self {
        let mut flags = FontStyle::empty();
        for ch in style.chars() {
            match ch.to_ascii_uppercase() {
                'B' => flags |= FontStyle::BOLD,
                'I' => flags |= FontStyle::ITALIC,
                'U' => flags |= FontStyle::UNDERLINE,
                'S' => flags |= FontStyle::STRIKEOUT,
                _ => {},
            }
        }
        flags
    }

    /// The part of the style that selects a font face.
    pub fn face(self) -> Self {
        self & (FontStyle::BOLD | FontStyle::ITALIC)
    }

    /// Face suffix used in font keys: `""`, `"B"`, `"I"` or `"BI"`.
    pub fn key_suffix(self) -> &'static str {
        let face = self.face();
        if face == FontStyle::BOLD | FontStyle::ITALIC {
            "BI"
        } else if face == FontStyle::BOLD {
            "B"
        } else if face == FontStyle::ITALIC {
            "I"
        } else {
            ""
        }
    }
}

/// Font registry key for `family` (lowercase) in the given face.
pub fn font_key(family: &str, style: FontStyle) -> String {
    format!("{}{}", family.to_lowercase(), style.key_suffix())
}

/// Embeddable font program.
#[derive(Debug, Clone, Default)]
pub enum FontProgram {
    /// Base-14 font, nothing embedded
    #[default]
    None,
    /// Complete TrueType file, embedded as `/FontFile2`
    TrueType(Vec<u8>),
    /// Type1 program, embedded as `/FontFile`
    Type1(Type1Program),
}

/// A font registered with a document.
#[derive(Debug, Clone)]
pub struct LoadedFont {
    /// 1-based index; the resource name is `/F<index>`
    pub index: usize,
    /// Normalized metrics
    pub def: FontDefinition,
    /// Font program to embed
    pub program: FontProgram,
    /// Parsed font, kept for UTF-8 fonts
    pub ttf: Option<TrueTypeFont>,
    /// Runes drawn so far (UTF-8 fonts)
    pub used: FontSubsetter,
}

impl LoadedFont {
    /// Wrap a definition.
    pub fn new(index: usize, def: FontDefinition, program: FontProgram) -> Self {
        Self {
            index,
            def,
            program,
            ttf: None,
            used: FontSubsetter::new(),
        }
    }

    /// UTF-8 font backed by a parsed TrueType file.
    pub fn utf8(index: usize, ttf: TrueTypeFont) -> Self {
        let def = FontDefinition::from_truetype(&ttf, true);
        Self {
            index,
            def,
            program: FontProgram::None,
            ttf: Some(ttf),
            used: FontSubsetter::new(),
        }
    }

    /// Resource name without the leading slash.
    pub fn resource_name(&self) -> String {
        format!("F{}", self.index)
    }

    /// Returns true for Type0/Identity-H fonts.
    pub fn is_utf8(&self) -> bool {
        self.def.is_utf8()
    }

    /// Width of `ch` in 1/1000 em.
    ///
    /// Characters outside an 8-bit font's encoding measure 0; characters a
    /// UTF-8 font lacks measure as its missing width.
    pub fn char_width(&self, ch: char) -> u32 {
        match &self.ttf {
            Some(ttf) if self.is_utf8() => ttf
                .char_width(ch as u32)
                .map(u32::from)
                .unwrap_or(self.def.desc.missing_width.max(0) as u32),
            _ => encoding::char_to_cp1252(ch)
                .map(|code| self.def.code_width(code) as u32)
                .unwrap_or(0),
        }
    }

    /// Width of `text` in 1/1000 em.
    pub fn text_width(&self, text: &str) -> u32 {
        text.chars().map(|ch| self.char_width(ch)).sum()
    }

    /// Encode `text` as a PDF string operand and mark its runes as used.
    ///
    /// UTF-8 fonts produce a hex string of UTF-16BE code units (CID =
    /// Unicode); 8-bit fonts produce a literal cp1252 string.
    pub fn encode(&mut self, text: &str) -> Result<Vec<u8>> {
        if self.is_utf8() {
            let mut units = Vec::with_capacity(text.len() * 2);
            for ch in text.chars() {
                let cp = ch as u32;
                if cp > 0xFFFF {
                    return Err(Error::Render(format!(
                        "character U+{:X} is outside the Basic Multilingual Plane",
                        cp
                    )));
                }
                self.used.use_char(cp);
                units.extend_from_slice(&(cp as u16).to_be_bytes());
            }
            Ok(format!("<{}>", hex_string(&units)).into_bytes())
        } else {
            let bytes = encode_cp1252(text).map_err(|ch| {
                Error::Render(format!("character {:?} is not available in font {}", ch, self.def.name))
            })?;
            let mut out = Vec::with_capacity(bytes.len() + 2);
            out.push(b'(');
            out.extend_from_slice(&escape_literal(&bytes));
            out.push(b')');
            Ok(out)
        }
    }
}
