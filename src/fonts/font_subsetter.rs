//! Font subsetting for PDF embedding.
//!
//! Tracks the Unicode code points a UTF-8 font actually renders and, at
//! serialization time, rebuilds a TrueType file holding only those glyphs
//! (plus `.notdef` and any composite components). Glyph IDs are renumbered
//! contiguously from 0; the `CIDToGIDMap` written for the font uses the new
//! numbers. Subset fonts are named with a six-letter tag, e.g.
//! `ABCDEF+FontName`.

use crate::error::{Error, Result};
use crate::fonts::truetype_parser::TrueTypeFont;
use md5::{Digest, Md5};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Used-rune tracker for one UTF-8 font.
#[derive(Debug, Default, Clone)]
pub struct FontSubsetter {
    used_runes: BTreeSet<u32>,
}

/// Result of subsetting a font.
#[derive(Debug, Clone)]
pub struct SubsetFont {
    /// Rebuilt TrueType file
    pub data: Vec<u8>,
    /// Six-letter subset tag
    pub tag: String,
    /// Original glyph ID to new glyph ID
    pub gid_remap: HashMap<u16, u16>,
    /// Used code point to new glyph ID; runes the font cannot render are absent
    pub cid_to_gid: BTreeMap<u32, u16>,
}

impl FontSubsetter {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a code point as used. Code point 0 is never recorded.
    pub fn use_char(&mut self, codepoint: u32) {
        if codepoint != 0 {
            self.used_runes.insert(codepoint);
        }
    }

    /// Record every character of `text`.
    pub fn use_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.use_char(ch as u32);
        }
    }

    /// Used code points in ascending order.
    pub fn used_runes(&self) -> &BTreeSet<u32> {
        &self.used_runes
    }

    /// Number of used code points.
    pub fn len(&self) -> usize {
        self.used_runes.len()
    }

    /// Returns true if nothing has been rendered.
    pub fn is_empty(&self) -> bool {
        self.used_runes.is_empty()
    }

    /// Six-letter tag derived from an MD5 digest of the rune set, stable
    /// across builds and platforms.
    pub fn subset_tag(&self) -> String {
        let mut hasher = Md5::new();
        for rune in &self.used_runes {
            hasher.update(rune.to_be_bytes());
        }
        let digest = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        Self::hash_to_tag(u64::from_be_bytes(head))
    }

    fn hash_to_tag(hash: u64) -> String {
        let mut tag = String::with_capacity(6);
        let mut h = hash;
        for _ in 0..6 {
            tag.push(((h % 26) as u8 + b'A') as char);
            h /= 26;
        }
        tag
    }

    /// Build the subset font for the recorded runes.
    pub fn subset(&self, font: &TrueTypeFont) -> Result<SubsetFont> {
        let glyf = font
            .table("glyf")
            .ok_or_else(|| Error::FontTableNotFound("glyf".to_string()))?;
        let loca = font
            .table("loca")
            .ok_or_else(|| Error::FontTableNotFound("loca".to_string()))?;
        let head = font
            .table("head")
            .ok_or_else(|| Error::FontTableNotFound("head".to_string()))?;
        let hhea = font
            .table("hhea")
            .ok_or_else(|| Error::FontTableNotFound("hhea".to_string()))?;
        let hmtx = font
            .table("hmtx")
            .ok_or_else(|| Error::FontTableNotFound("hmtx".to_string()))?;
        let maxp = font
            .table("maxp")
            .ok_or_else(|| Error::FontTableNotFound("maxp".to_string()))?;

        let mut needed: BTreeSet<u16> = BTreeSet::new();
        needed.insert(0);
        for rune in &self.used_runes {
            if let Some(gid) = font.glyph_id(*rune) {
                needed.insert(gid);
            }
        }

        let loca_offsets = parse_loca(loca, font.index_to_loc_format, font.num_glyphs());
        let direct: Vec<u16> = needed.iter().copied().collect();
        for gid in direct {
            collect_composite_deps(glyf, &loca_offsets, gid, &mut needed);
        }

        let gid_remap: HashMap<u16, u16> = needed
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, new as u16))
            .collect();

        let cid_to_gid: BTreeMap<u32, u16> = self
            .used_runes
            .iter()
            .filter_map(|&rune| {
                let old = font.glyph_id(rune)?;
                gid_remap.get(&old).map(|&new| (rune, new))
            })
            .collect();

        let (new_glyf, new_offsets) = rebuild_glyf(glyf, &loca_offsets, &needed, &gid_remap);
        let loca_format: i16 = if new_glyf.len() > 0x1FFFE { 1 } else { 0 };
        let cmap_entries: Vec<(u16, u16)> = cid_to_gid
            .iter()
            .filter(|(rune, _)| **rune <= 0xFFFF)
            .map(|(&rune, &gid)| (rune as u16, gid))
            .collect();

        let mut tables: Vec<([u8; 4], Vec<u8>)> = vec![
            (*b"cmap", build_cmap_format4(&cmap_entries)),
            (*b"glyf", new_glyf),
            (*b"head", rebuild_head(head, loca_format)),
            (*b"hhea", rebuild_hhea(hhea, needed.len() as u16)),
            (*b"hmtx", rebuild_hmtx(hmtx, &needed, font.number_of_h_metrics as usize)),
            (*b"loca", build_loca(&new_offsets, loca_format)),
            (*b"maxp", rebuild_maxp(maxp, needed.len() as u16)),
            (*b"post", build_post_format3(font)),
        ];
        for tag in [b"name", b"OS/2", b"cvt ", b"fpgm", b"prep"] {
            if let Some(data) = font.table(&String::from_utf8_lossy(tag)) {
                tables.push((*tag, data.to_vec()));
            }
        }
        tables.sort_by_key(|(tag, _)| *tag);

        let data = write_ttf_file(&mut tables);
        log::debug!(
            "Subset {}: {} runes, {} of {} glyphs, {} -> {} bytes",
            font.postscript_name,
            self.used_runes.len(),
            needed.len(),
            font.num_glyphs(),
            font.raw_data().len(),
            data.len()
        );

        Ok(SubsetFont {
            data,
            tag: self.subset_tag(),
            gid_remap,
            cid_to_gid,
        })
    }
}

fn parse_loca(data: &[u8], format: i16, num_glyphs: u16) -> Vec<u32> {
    let count = num_glyphs as usize + 1;
    let mut offsets: Vec<u32> = Vec::with_capacity(count);
    for i in 0..count {
        let value = if format == 0 {
            data.get(i * 2..i * 2 + 2).map(|b| read_u16(b, 0) as u32 * 2)
        } else {
            data.get(i * 4..i * 4 + 4).map(|b| read_u32(b, 0))
        };
        let fallback = offsets.last().copied().unwrap_or(0);
        offsets.push(value.unwrap_or(fallback));
    }
    offsets
}

/// Walk the component records of a composite glyph.
fn for_each_component(glyph: &[u8], mut f: impl FnMut(usize, u16)) {
    let mut pos = 10;
    loop {
        if pos + 4 > glyph.len() {
            break;
        }
        let flags = read_u16(glyph, pos);
        f(pos + 2, read_u16(glyph, pos + 2));
        pos += 4;
        pos += if flags & 0x0001 != 0 { 4 } else { 2 };
        if flags & 0x0008 != 0 {
            pos += 2;
        } else if flags & 0x0040 != 0 {
            pos += 4;
        } else if flags & 0x0080 != 0 {
            pos += 8;
        }
        if flags & 0x0020 == 0 {
            break;
        }
    }
}

fn glyph_slice<'a>(glyf: &'a [u8], loca: &[u32], gid: u16) -> Option<&'a [u8]> {
    let idx = gid as usize;
    let start = *loca.get(idx)? as usize;
    let end = (*loca.get(idx + 1)? as usize).min(glyf.len());
    if start >= end {
        return None;
    }
    Some(&glyf[start..end])
}

fn collect_composite_deps(glyf: &[u8], loca: &[u32], gid: u16, needed: &mut BTreeSet<u16>) {
    let glyph = match glyph_slice(glyf, loca, gid) {
        Some(g) if g.len() >= 10 && read_i16(g, 0) < 0 => g,
        _ => return,
    };
    let mut found = Vec::new();
    for_each_component(glyph, |_, component| found.push(component));
    for component in found {
        if needed.insert(component) {
            collect_composite_deps(glyf, loca, component, needed);
        }
    }
}

fn rebuild_glyf(
    glyf: &[u8],
    loca: &[u32],
    needed: &BTreeSet<u16>,
    gid_remap: &HashMap<u16, u16>,
) -> (Vec<u8>, Vec<u32>) {
    let mut out = Vec::new();
    let mut offsets = Vec::with_capacity(needed.len() + 1);
    for &old in needed {
        offsets.push(out.len() as u32);
        let Some(glyph) = glyph_slice(glyf, loca, old) else {
            continue;
        };
        let mut glyph = glyph.to_vec();
        if glyph.len() >= 10 && read_i16(&glyph, 0) < 0 {
            let mut rewrites = Vec::new();
            for_each_component(&glyph, |pos, component| {
                if let Some(&new) = gid_remap.get(&component) {
                    rewrites.push((pos, new));
                }
            });
            for (pos, new) in rewrites {
                write_u16(&mut glyph, pos, new);
            }
        }
        out.extend_from_slice(&glyph);
        while out.len() % 4 != 0 {
            out.push(0);
        }
    }
    offsets.push(out.len() as u32);
    (out, offsets)
}

fn build_loca(offsets: &[u32], format: i16) -> Vec<u8> {
    let mut data = Vec::with_capacity(offsets.len() * 4);
    for &offset in offsets {
        if format == 0 {
            data.extend_from_slice(&((offset / 2) as u16).to_be_bytes());
        } else {
            data.extend_from_slice(&offset.to_be_bytes());
        }
    }
    data
}

/// Every kept glyph gets a full metric record.
fn rebuild_hmtx(hmtx: &[u8], needed: &BTreeSet<u16>, num_h_metrics: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(needed.len() * 4);
    let last = num_h_metrics.saturating_sub(1);
    for &old in needed {
        let idx = old as usize;
        let advance_at = idx.min(last) * 4;
        let lsb_at = if idx < num_h_metrics {
            idx * 4 + 2
        } else {
            num_h_metrics * 4 + (idx - num_h_metrics) * 2
        };
        data.extend_from_slice(hmtx.get(advance_at..advance_at + 2).unwrap_or(&[0, 0]));
        data.extend_from_slice(hmtx.get(lsb_at..lsb_at + 2).unwrap_or(&[0, 0]));
    }
    data
}

/// A (3,1) format-4 cmap with one segment per contiguous run.
fn build_cmap_format4(char_to_gid: &[(u16, u16)]) -> Vec<u8> {
    let mut segments: Vec<(u16, u16, Vec<u16>)> = Vec::new();
    for &(ch, gid) in char_to_gid {
        if ch == 0xFFFF {
            continue;
        }
        if let Some(last) = segments.last_mut() {
            if ch == last.1 + 1 {
                last.1 = ch;
                last.2.push(gid);
                continue;
            }
        }
        segments.push((ch, ch, vec![gid]));
    }
    segments.push((0xFFFF, 0xFFFF, vec![0]));

    let seg_count = segments.len() as u16;
    let entry_selector = 15 - seg_count.leading_zeros() as u16;
    let search_range = (1u16 << entry_selector) * 2;
    let range_shift = (seg_count * 2).saturating_sub(search_range);

    let mut glyph_ids: Vec<u16> = Vec::new();
    let mut deltas: Vec<u16> = Vec::new();
    let mut range_offsets: Vec<u16> = Vec::new();
    for (i, (start, _, gids)) in segments.iter().enumerate() {
        if *start == 0xFFFF {
            deltas.push(1);
            range_offsets.push(0);
        } else if gids.len() == 1 {
            deltas.push(gids[0].wrapping_sub(*start));
            range_offsets.push(0);
        } else {
            deltas.push(0);
            range_offsets.push(((segments.len() - i) as u16 + glyph_ids.len() as u16) * 2);
            glyph_ids.extend_from_slice(gids);
        }
    }

    let length = 16 + seg_count as usize * 8 + glyph_ids.len() * 2;
    let mut sub = Vec::with_capacity(length);
    for v in [4, length as u16, 0, seg_count * 2, search_range, entry_selector, range_shift] {
        sub.extend_from_slice(&v.to_be_bytes());
    }
    for (_, end, _) in &segments {
        sub.extend_from_slice(&end.to_be_bytes());
    }
    sub.extend_from_slice(&0u16.to_be_bytes());
    for (start, _, _) in &segments {
        sub.extend_from_slice(&start.to_be_bytes());
    }
    for v in deltas.iter().chain(range_offsets.iter()).chain(glyph_ids.iter()) {
        sub.extend_from_slice(&v.to_be_bytes());
    }

    let mut cmap = Vec::with_capacity(12 + sub.len());
    for v in [0u16, 1, 3, 1] {
        cmap.extend_from_slice(&v.to_be_bytes());
    }
    cmap.extend_from_slice(&12u32.to_be_bytes());
    cmap.extend_from_slice(&sub);
    cmap
}

fn rebuild_head(head: &[u8], loca_format: i16) -> Vec<u8> {
    let mut out = head.to_vec();
    out.resize(out.len().max(54), 0);
    write_u32(&mut out, 8, 0);
    write_u16(&mut out, 50, loca_format as u16);
    out
}

fn rebuild_hhea(hhea: &[u8], num_glyphs: u16) -> Vec<u8> {
    let mut out = hhea.to_vec();
    out.resize(out.len().max(36), 0);
    write_u16(&mut out, 34, num_glyphs);
    out
}

/// Hinting limits stay those of the source font since `fpgm`, `prep`
/// and `cvt ` are copied unchanged.
fn rebuild_maxp(maxp: &[u8], num_glyphs: u16) -> Vec<u8> {
    let mut out = maxp.to_vec();
    out.resize(out.len().max(6), 0);
    write_u16(&mut out, 4, num_glyphs);
    out
}

/// Format 3 `post`: no glyph names, metrics kept from the source font.
fn build_post_format3(font: &TrueTypeFont) -> Vec<u8> {
    let mut data = vec![0u8; 32];
    write_u32(&mut data, 0, 0x0003_0000);
    if let Some(post) = font.table("post") {
        if post.len() >= 16 {
            data[4..16].copy_from_slice(&post[4..16]);
        }
    }
    data
}

fn write_ttf_file(tables: &mut [([u8; 4], Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let entry_selector = 15 - num_tables.max(1).leading_zeros() as u16;
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = (num_tables * 16).saturating_sub(search_range);

    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    for v in [num_tables, search_range, entry_selector, range_shift] {
        out.extend_from_slice(&v.to_be_bytes());
    }

    for (_, data) in tables.iter_mut() {
        while data.len() % 4 != 0 {
            data.push(0);
        }
    }

    let mut offset = 12 + tables.len() * 16;
    let mut head_offset = None;
    for (tag, data) in tables.iter() {
        if tag == b"head" {
            head_offset = Some(offset);
        }
        out.extend_from_slice(tag);
        out.extend_from_slice(&table_checksum(data).to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += data.len();
    }
    for (_, data) in tables.iter() {
        out.extend_from_slice(data);
    }

    // checkSumAdjustment covers the whole file with the field itself zeroed.
    if let Some(head) = head_offset {
        let adjustment = 0xB1B0_AFBAu32.wrapping_sub(table_checksum(&out));
        write_u32(&mut out, head + 8, adjustment);
    }
    out
}

fn table_checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

fn read_i16(data: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

fn write_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::ttf_builder::TestFont;

    fn font() -> TrueTypeFont {
        let bytes = TestFont::new(&[('A', 600), ('B', 650), ('C', 700), ('D', 750), ('é', 600)])
            .with_composite('Å', 600, 1)
            .build();
        TrueTypeFont::parse(&bytes).unwrap()
    }

    #[test]
    fn test_use_text_skips_rune_zero() {
        let mut s = FontSubsetter::new();
        s.use_text("AB\0A");
        assert_eq!(s.used_runes().iter().copied().collect::<Vec<_>>(), vec![0x41, 0x42]);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_subset_tag_is_stable() {
        let mut a = FontSubsetter::new();
        a.use_text("Hello");
        let mut b = FontSubsetter::new();
        b.use_text("oHell");
        assert_eq!(a.subset_tag(), b.subset_tag());
        assert_eq!(a.subset_tag().len(), 6);
        assert!(a.subset_tag().chars().all(|c| c.is_ascii_uppercase()));
        assert_eq!(a.subset_tag(), "HHPDCN");
    }

    #[test]
    fn test_maxp_keeps_source_limits() {
        let bytes = TestFont::new(&[('A', 600), ('B', 650), ('C', 700)]).hinted().build();
        let font = TrueTypeFont::parse(&bytes).unwrap();
        let source = font.table("maxp").unwrap().to_vec();
        let mut s = FontSubsetter::new();
        s.use_text("B");
        let subset = s.subset(&font).unwrap();

        let rebuilt = TrueTypeFont::parse(&subset.data).unwrap();
        let maxp = rebuilt.table("maxp").unwrap();
        assert_eq!(maxp.len(), 32);
        assert_eq!(read_u16(maxp, 4), 2);
        assert_eq!(&maxp[..4], &source[..4]);
        assert_eq!(&maxp[6..], &source[6..]);
        // maxStackElements
        assert_eq!(read_u16(maxp, 24), 1024);
    }

    #[test]
    fn test_subset_keeps_only_used_glyphs() {
        let font = font();
        let mut s = FontSubsetter::new();
        s.use_text("CA");
        let subset = s.subset(&font).unwrap();

        // .notdef, A, C
        assert_eq!(subset.gid_remap.len(), 3);
        assert_eq!(subset.cid_to_gid.get(&('A' as u32)), Some(&1));
        assert_eq!(subset.cid_to_gid.get(&('C' as u32)), Some(&2));

        let face = ttf_parser::Face::parse(&subset.data, 0).unwrap();
        assert_eq!(face.number_of_glyphs(), 3);
        let c = face.glyph_index('C').unwrap();
        assert_eq!(c.0, 2);
        assert_eq!(face.glyph_hor_advance(c), Some(700));
        assert!(face.glyph_index('B').is_none());
    }

    #[test]
    fn test_composite_components_are_kept() {
        let font = font();
        let mut s = FontSubsetter::new();
        s.use_text("Å");
        let subset = s.subset(&font).unwrap();
        // .notdef, A (component), Å
        assert_eq!(subset.gid_remap.len(), 3);
        assert!(subset.gid_remap.contains_key(&1));
        let face = ttf_parser::Face::parse(&subset.data, 0).unwrap();
        assert_eq!(face.number_of_glyphs(), 3);
    }

    #[test]
    fn test_unknown_runes_are_dropped() {
        let font = font();
        let mut s = FontSubsetter::new();
        s.use_text("A\u{4E2D}");
        let subset = s.subset(&font).unwrap();
        assert!(subset.cid_to_gid.contains_key(&0x41));
        assert!(!subset.cid_to_gid.contains_key(&0x4E2D));
    }

    #[test]
    fn test_file_checksum_adjustment() {
        let font = font();
        let mut s = FontSubsetter::new();
        s.use_text("ABD");
        let subset = s.subset(&font).unwrap();
        assert_eq!(table_checksum(&subset.data), 0xB1B0_AFBA);
    }

    #[test]
    fn test_cmap_ranges_round_trip() {
        let entries = [(0x41u16, 1u16), (0x42, 2), (0x43, 3), (0x60, 4)];
        let cmap = build_cmap_format4(&entries);
        assert_eq!(read_u16(&cmap, 12), 4);
        // segments: 0x41-0x43, 0x60, 0xFFFF
        assert_eq!(read_u16(&cmap, 12 + 6), 6);
    }

    #[test]
    fn test_missing_glyf_table() {
        let bytes = TestFont::new(&[('A', 600)]).without_table("glyf").build();
        let font = TrueTypeFont::parse(&bytes).unwrap();
        let mut s = FontSubsetter::new();
        s.use_text("A");
        assert!(matches!(s.subset(&font), Err(Error::FontTableNotFound(ref t)) if t == "glyf"));
    }
}
