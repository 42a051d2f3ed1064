//! TrueType font parser for PDF embedding.
//!
//! Reads the tables needed to describe and embed a TrueType font:
//! `head`, `hhea`, `maxp`, `hmtx`, `cmap`, `name`, `OS/2` and `post`.
//! All fields are big-endian and every table is located by its absolute
//! offset from the start of the file, so parsing is seek-based.
//!
//! Only outline fonts with a `0x00010000` (or Apple `true`) signature are
//! accepted; CFF-flavoured OpenType (`OTTO`) and collections are rejected.

use crate::error::{Error, Result};
use byteorder::{BigEndian, ReadBytesExt};
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Seek, SeekFrom};

/// Tables every parsed font must carry.
const REQUIRED_TABLES: [&str; 8] = ["head", "hhea", "maxp", "hmtx", "cmap", "name", "OS/2", "post"];

/// Characters that may not appear in a PDF font name.
const ILLEGAL_NAME_CHARS: &str = "(){}<>/%[] ";

/// Location of one table in the font file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    /// Absolute byte offset
    pub offset: u32,
    /// Length in bytes
    pub length: u32,
}

/// Big-endian cursor that turns short reads into font errors.
struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        self.cursor.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn skip(&mut self, n: i64) -> Result<()> {
        self.cursor.seek(SeekFrom::Current(n))?;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.cursor.position()
    }

    fn u16(&mut self) -> Result<u16> {
        self.cursor
            .read_u16::<BigEndian>()
            .map_err(|_| Error::Font(format!("unexpected end of font data at {}", self.position())))
    }

    fn i16(&mut self) -> Result<i16> {
        self.cursor
            .read_i16::<BigEndian>()
            .map_err(|_| Error::Font(format!("unexpected end of font data at {}", self.position())))
    }

    fn u32(&mut self) -> Result<u32> {
        self.cursor
            .read_u32::<BigEndian>()
            .map_err(|_| Error::Font(format!("unexpected end of font data at {}", self.position())))
    }

    fn tag(&mut self) -> Result<String> {
        let raw = self.u32()?;
        Ok(String::from_utf8_lossy(&raw.to_be_bytes()).into_owned())
    }
}

/// Parsed TrueType font.
///
/// Owns a copy of the font file so the caller's buffer is never shared.
/// Lengths are in font design units unless a method says otherwise.
#[derive(Debug, Clone)]
pub struct TrueTypeFont {
    data: Vec<u8>,
    tables: HashMap<String, TableRecord>,
    /// PostScript name with illegal characters removed
    pub postscript_name: String,
    /// Design units per em
    pub units_per_em: u16,
    /// Font bounding box (xMin, yMin, xMax, yMax)
    pub bbox: [i16; 4],
    /// Typographic ascender
    pub ascender: i16,
    /// Typographic descender (negative)
    pub descender: i16,
    /// Cap height; the ascender when `OS/2` is older than version 2
    pub cap_height: i16,
    /// Italic angle in degrees
    pub italic_angle: f64,
    /// Underline position
    pub underline_position: i16,
    /// Underline thickness
    pub underline_thickness: i16,
    /// Monospaced font
    pub fixed_pitch: bool,
    /// `fsSelection` bold bit
    pub bold: bool,
    /// `fsType` permits embedding
    pub embeddable: bool,
    /// `usWeightClass`
    pub weight_class: u16,
    /// `indexToLocFormat` (0 short, 1 long)
    pub index_to_loc_format: i16,
    /// `numberOfHMetrics`
    pub number_of_h_metrics: u16,
    /// Advance width per glyph index
    advance_widths: Vec<u16>,
    /// Unicode BMP code point to glyph index
    char_to_glyph: BTreeMap<u32, u16>,
}

impl TrueTypeFont {
    /// Parse a TrueType font from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 12 {
            return Err(Error::Font("font file is empty or truncated".to_string()));
        }
        let mut r = Reader::new(data);

        match r.u32()? {
            0x0001_0000 | 0x7472_7565 => {},
            0x4F54_544F => {
                return Err(Error::UnsupportedFontFormat(
                    "OpenType fonts with CFF outlines (OTTO) are not supported".to_string(),
                ))
            },
            0x7474_6366 => {
                return Err(Error::UnsupportedFontFormat("TrueType collections are not supported".to_string()))
            },
            other => return Err(Error::Font(format!("not a TrueType font (signature {:#010X})", other))),
        }

        let num_tables = r.u16()?;
        r.skip(6)?;
        let mut tables = HashMap::new();
        for _ in 0..num_tables {
            let tag = r.tag()?;
            let _checksum = r.u32()?;
            let offset = r.u32()?;
            let length = r.u32()?;
            if offset as usize + length as usize > data.len() {
                return Err(Error::Font(format!("table '{}' extends past end of file", tag)));
            }
            tables.insert(tag, TableRecord { offset, length });
        }
        for tag in REQUIRED_TABLES {
            if !tables.contains_key(tag) {
                return Err(Error::FontTableNotFound(tag.to_string()));
            }
        }

        let mut font = Self {
            data: data.to_vec(),
            tables,
            postscript_name: String::new(),
            units_per_em: 1000,
            bbox: [0; 4],
            ascender: 0,
            descender: 0,
            cap_height: 0,
            italic_angle: 0.0,
            underline_position: 0,
            underline_thickness: 0,
            fixed_pitch: false,
            bold: false,
            embeddable: true,
            weight_class: 400,
            index_to_loc_format: 0,
            number_of_h_metrics: 0,
            advance_widths: Vec::new(),
            char_to_glyph: BTreeMap::new(),
        };

        // Parse against the owned copy; the reader borrows only `data`.
        let mut r = Reader::new(data);
        font.parse_head(&mut r)?;
        let num_glyphs = font.parse_maxp(&mut r)?;
        font.parse_hhea(&mut r)?;
        font.parse_hmtx(&mut r, num_glyphs)?;
        font.parse_cmap(&mut r)?;
        font.parse_name(&mut r)?;
        font.parse_os2(&mut r)?;
        font.parse_post(&mut r)?;

        log::debug!(
            "Parsed TrueType font {} ({} glyphs, {} mapped chars, {} units/em)",
            font.postscript_name,
            num_glyphs,
            font.char_to_glyph.len(),
            font.units_per_em
        );
        Ok(font)
    }

    fn seek_table(&self, r: &mut Reader<'_>, tag: &str, offset: u32) -> Result<()> {
        let record = self
            .tables
            .get(tag)
            .ok_or_else(|| Error::FontTableNotFound(tag.to_string()))?;
        r.seek(record.offset as u64 + offset as u64)
    }

    fn parse_head(&mut self, r: &mut Reader<'_>) -> Result<()> {
        self.seek_table(r, "head", 12)?;
        let magic = r.u32()?;
        if magic != 0x5F0F_3CF5 {
            return Err(Error::Font(format!("invalid head table magic number {:#010X}", magic)));
        }
        r.skip(2)?;
        self.units_per_em = r.u16()?;
        if self.units_per_em == 0 {
            return Err(Error::Font("unitsPerEm is zero".to_string()));
        }
        self.seek_table(r, "head", 36)?;
        for v in self.bbox.iter_mut() {
            *v = r.i16()?;
        }
        self.seek_table(r, "head", 50)?;
        self.index_to_loc_format = r.i16()?;
        Ok(())
    }

    fn parse_maxp(&mut self, r: &mut Reader<'_>) -> Result<u16> {
        self.seek_table(r, "maxp", 4)?;
        r.u16()
    }

    fn parse_hhea(&mut self, r: &mut Reader<'_>) -> Result<()> {
        self.seek_table(r, "hhea", 4)?;
        self.ascender = r.i16()?;
        self.descender = r.i16()?;
        self.seek_table(r, "hhea", 34)?;
        self.number_of_h_metrics = r.u16()?;
        if self.number_of_h_metrics == 0 {
            return Err(Error::Font("numberOfHMetrics is zero".to_string()));
        }
        Ok(())
    }

    /// Widths past `numberOfHMetrics` repeat the last explicit advance.
    fn parse_hmtx(&mut self, r: &mut Reader<'_>, num_glyphs: u16) -> Result<()> {
        self.seek_table(r, "hmtx", 0)?;
        let explicit = self.number_of_h_metrics.min(num_glyphs.max(1));
        let mut widths = Vec::with_capacity(num_glyphs as usize);
        for _ in 0..explicit {
            widths.push(r.u16()?);
            r.skip(2)?;
        }
        let last = widths.last().copied().unwrap_or(0);
        widths.resize(num_glyphs.max(explicit) as usize, last);
        self.advance_widths = widths;
        Ok(())
    }

    fn parse_cmap(&mut self, r: &mut Reader<'_>) -> Result<()> {
        self.seek_table(r, "cmap", 2)?;
        let num_subtables = r.u16()?;
        let mut subtable = None;
        for _ in 0..num_subtables {
            let platform = r.u16()?;
            let encoding = r.u16()?;
            let offset = r.u32()?;
            if platform == 3 && encoding == 1 {
                subtable = Some(offset);
                break;
            }
        }
        let offset = subtable.ok_or(Error::NoUnicodeCmap)?;

        self.seek_table(r, "cmap", offset)?;
        let format = r.u16()?;
        if format != 4 {
            return Err(Error::Font(format!(
                "unsupported cmap subtable format {} for platform 3 encoding 1",
                format
            )));
        }
        r.skip(4)?;
        let seg_count = (r.u16()? / 2) as usize;
        r.skip(6)?;

        let mut end_codes = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            end_codes.push(r.u16()?);
        }
        r.skip(2)?;
        let mut start_codes = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            start_codes.push(r.u16()?);
        }
        let mut deltas = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            deltas.push(r.u16()?);
        }
        let range_offsets_pos = r.position();
        let mut range_offsets = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            range_offsets.push(r.u16()?);
        }

        for seg in 0..seg_count {
            let (start, end, delta, range_offset) =
                (start_codes[seg], end_codes[seg], deltas[seg], range_offsets[seg]);
            if start > end {
                continue;
            }
            for code in start..=end {
                if code == 0xFFFF {
                    break;
                }
                let glyph = if range_offset == 0 {
                    code.wrapping_add(delta)
                } else {
                    let addr = range_offsets_pos
                        + seg as u64 * 2
                        + range_offset as u64
                        + (code - start) as u64 * 2;
                    r.seek(addr)?;
                    match r.u16()? {
                        0 => 0,
                        g => g.wrapping_add(delta),
                    }
                };
                if glyph != 0 {
                    self.char_to_glyph.insert(code as u32, glyph);
                }
            }
        }
        Ok(())
    }

    fn parse_name(&mut self, r: &mut Reader<'_>) -> Result<()> {
        self.seek_table(r, "name", 2)?;
        let count = r.u16()?;
        let string_offset = r.u16()? as u32;
        let mut found = None;
        for _ in 0..count {
            let platform = r.u16()?;
            let _encoding = r.u16()?;
            let _language = r.u16()?;
            let name_id = r.u16()?;
            let length = r.u16()? as u32;
            let offset = r.u16()? as u32;
            if name_id == 6 {
                found = Some((platform, offset, length));
                if platform == 3 {
                    break;
                }
            }
        }
        let (platform, offset, length) = found.ok_or(Error::MissingPostScriptName)?;

        self.seek_table(r, "name", string_offset + offset)?;
        let start = r.position() as usize;
        let raw = self
            .data
            .get(start..start + length as usize)
            .ok_or_else(|| Error::Font("name record extends past end of file".to_string()))?;
        let decoded = if platform == 3 || platform == 0 {
            let units: Vec<u16> = raw.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
            String::from_utf16_lossy(&units)
        } else {
            raw.iter().map(|&b| b as char).collect()
        };
        let name: String = decoded
            .chars()
            .filter(|c| *c != '\0' && !ILLEGAL_NAME_CHARS.contains(*c))
            .collect();
        if name.is_empty() {
            return Err(Error::MissingPostScriptName);
        }
        self.postscript_name = name;
        Ok(())
    }

    fn parse_os2(&mut self, r: &mut Reader<'_>) -> Result<()> {
        self.seek_table(r, "OS/2", 0)?;
        let version = r.u16()?;
        r.skip(2)?;
        self.weight_class = r.u16()?;
        r.skip(2)?;
        let fs_type = r.u16()?;
        self.embeddable = fs_type & 0x0002 == 0 && fs_type & 0x0200 == 0;

        self.seek_table(r, "OS/2", 62)?;
        let fs_selection = r.u16()?;
        self.bold = fs_selection & 0x0020 != 0;
        r.skip(4)?;
        let typo_ascender = r.i16()?;
        let typo_descender = r.i16()?;
        if typo_ascender != 0 || typo_descender != 0 {
            self.ascender = typo_ascender;
            self.descender = typo_descender;
        }
        self.cap_height = if version >= 2 {
            self.seek_table(r, "OS/2", 88)?;
            r.i16()?
        } else {
            self.ascender
        };
        Ok(())
    }

    fn parse_post(&mut self, r: &mut Reader<'_>) -> Result<()> {
        self.seek_table(r, "post", 4)?;
        let whole = r.i16()? as f64;
        let frac = r.u16()? as f64 / 65536.0;
        self.italic_angle = whole + frac;
        self.underline_position = r.i16()?;
        self.underline_thickness = r.i16()?;
        self.fixed_pitch = r.u32()? != 0;
        Ok(())
    }

    /// Raw font file.
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes of table `tag`, if present.
    pub fn table(&self, tag: &str) -> Option<&[u8]> {
        let record = self.tables.get(tag)?;
        let start = record.offset as usize;
        self.data.get(start..start + record.length as usize)
    }

    /// Number of glyphs in the font.
    pub fn num_glyphs(&self) -> u16 {
        self.advance_widths.len() as u16
    }

    /// Glyph index for a code point.
    pub fn glyph_id(&self, codepoint: u32) -> Option<u16> {
        self.char_to_glyph.get(&codepoint).copied()
    }

    /// Unicode to glyph map, ordered by code point.
    pub fn char_map(&self) -> &BTreeMap<u32, u16> {
        &self.char_to_glyph
    }

    /// Advance width of a glyph in design units.
    pub fn glyph_advance(&self, glyph_id: u16) -> u16 {
        self.advance_widths
            .get(glyph_id as usize)
            .or_else(|| self.advance_widths.last())
            .copied()
            .unwrap_or(0)
    }

    /// Convert a design-unit value to the 1000-unit glyph space.
    pub fn scale(&self, value: i32) -> i32 {
        (value as f64 * 1000.0 / self.units_per_em as f64).round() as i32
    }

    /// Width of a glyph in 1/1000 em.
    pub fn glyph_width(&self, glyph_id: u16) -> u16 {
        self.scale(self.glyph_advance(glyph_id) as i32) as u16
    }

    /// Width of a character in 1/1000 em, `None` if the font has no glyph.
    pub fn char_width(&self, codepoint: u32) -> Option<u16> {
        self.glyph_id(codepoint).map(|gid| self.glyph_width(gid))
    }

    /// `StemV` estimate from the weight class.
    pub fn stem_v(&self) -> i32 {
        let ratio = self.weight_class as f64 / 65.0;
        50 + (ratio * ratio) as i32
    }
}
