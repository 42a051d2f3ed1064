//! Width arrays and CID mapping streams for embedded fonts.
//!
//! 8-bit fonts get a flat `/Widths` array for codes 32-255. UTF-8 (Type0)
//! fonts get a CID `/W` array in which runs of equal widths collapse to
//! `start end width` triples and varying runs become `start [w0 w1 ...]`,
//! plus a 64K-entry `CIDToGIDMap` and a `ToUnicode` CMap.

use crate::object::Object;
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Codes covered by a simple font's `/Widths` array.
pub const FIRST_CHAR: u8 = 32;
/// Last code covered by a simple font's `/Widths` array.
pub const LAST_CHAR: u8 = 255;

/// `/Widths` for codes [`FIRST_CHAR`]..=[`LAST_CHAR`] of a 256-entry table.
pub fn simple_widths(cw: &[u16]) -> Object {
    Object::integers(
        (FIRST_CHAR as usize..=LAST_CHAR as usize).map(|code| cw.get(code).copied().unwrap_or(0) as i64),
    )
}

/// One entry of a CID `/W` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidthRun {
    /// `start end width`: every CID in the range has the same width
    Range {
        /// First CID
        start: u32,
        /// Last CID
        end: u32,
        /// Shared width
        width: u32,
    },
    /// `start [w0 w1 ...]`: consecutive CIDs with individual widths
    List {
        /// First CID
        start: u32,
        /// Widths from `start` onwards
        widths: Vec<u32>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Index(usize),
    Interval,
}

/// Ordered (key, value) list with linear lookup: integer keys for widths in
/// insertion order plus an optional `Interval` marker that counts towards
/// the entry count while a run is being built.
#[derive(Debug, Clone, Default)]
struct OrderedPairs {
    entries: Vec<(Key, u32)>,
}

impl OrderedPairs {
    fn with(values: &[u32]) -> Self {
        let mut pairs = Self::default();
        for &v in values {
            pairs.push(v);
        }
        pairs
    }

    fn position(&self, key: Key) -> Option<usize> {
        self.entries.iter().position(|(k, _)| *k == key)
    }

    fn push(&mut self, value: u32) {
        let next = (0..).find(|n| self.position(Key::Index(*n)).is_none()).unwrap_or(0);
        self.entries.push((Key::Index(next), value));
    }

    fn set(&mut self, key: Key, value: u32) {
        match self.position(key) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    fn get(&self, key: Key) -> u32 {
        self.position(key).map(|i| self.entries[i].1).unwrap_or(0)
    }

    fn remove(&mut self, key: Key) {
        if let Some(i) = self.position(key) {
            self.entries.remove(i);
        }
    }

    fn pop(&mut self) {
        self.entries.pop();
    }

    fn has_interval(&self) -> bool {
        self.position(Key::Interval).is_some()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn values(&self) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|(k, _)| *k != Key::Interval)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Append `other`'s widths, keeping only the first interval marker.
    fn merge(&self, other: &OrderedPairs) -> OrderedPairs {
        let mut out = self.clone();
        for (key, value) in &other.entries {
            match key {
                Key::Interval => {
                    if !out.has_interval() {
                        out.set(Key::Interval, *value);
                    }
                },
                Key::Index(_) => out.push(*value),
            }
        }
        out
    }
}

/// Compact `(cid, width)` pairs, sorted by CID, into `/W` runs.
///
/// CID 0 and zero widths are skipped; a width of 65535 means zero. Short
/// equal-width runs (two entries) that directly follow another run are
/// merged into it rather than opening a range of their own.
pub fn cid_width_runs(widths: &[(u32, u32)]) -> Vec<WidthRun> {
    let mut ranges: IndexMap<u32, OrderedPairs> = IndexMap::new();
    let mut range_id = 0u32;
    let mut prev_cid: i64 = -2;
    let mut prev_width: i64 = -1;
    let mut interval = false;

    for &(cid, width) in widths {
        if cid == 0 || width == 0 {
            continue;
        }
        let width = if width == 65535 { 0 } else { width };

        if cid as i64 == prev_cid + 1 {
            if width as i64 == prev_width {
                let first = ranges.get(&range_id).map(|r| r.get(Key::Index(0))).unwrap_or(0);
                if width == first {
                    if let Some(r) = ranges.get_mut(&range_id) {
                        r.push(width);
                    }
                } else {
                    if let Some(r) = ranges.get_mut(&range_id) {
                        r.pop();
                    }
                    range_id = prev_cid as u32;
                    ranges.insert(range_id, OrderedPairs::with(&[prev_width as u32, width]));
                }
                interval = true;
                if let Some(r) = ranges.get_mut(&range_id) {
                    r.set(Key::Interval, 1);
                }
            } else {
                if interval {
                    range_id = cid;
                    ranges.insert(range_id, OrderedPairs::with(&[width]));
                } else if let Some(r) = ranges.get_mut(&range_id) {
                    r.push(width);
                }
                interval = false;
            }
        } else {
            range_id = cid;
            ranges.insert(range_id, OrderedPairs::with(&[width]));
            interval = false;
        }
        prev_cid = cid as i64;
        prev_width = width as i64;
    }

    let mut keys: Vec<u32> = ranges.keys().copied().collect();
    let mut previous_key = 0u32;
    let mut next_key: i64 = -1;
    let mut is_interval = false;
    let mut g = 0;
    while g < keys.len() {
        let key = keys[g];
        let ws = ranges.get(&key).cloned().unwrap_or_default();
        let cws = ws.len() as i64;
        if key as i64 == next_key && !is_interval && (!ws.has_interval() || cws < 4) {
            let mut current = ws.clone();
            current.remove(Key::Interval);
            if let Some(prev) = ranges.get(&previous_key) {
                let merged = prev.merge(&current);
                ranges.insert(previous_key, merged);
            }
            keys.remove(g);
        } else {
            g += 1;
            previous_key = key;
        }
        next_key = key as i64 + cws;
        if ws.has_interval() {
            is_interval = cws > 3;
            if let Some(r) = ranges.get_mut(&key) {
                r.remove(Key::Interval);
            }
            next_key -= 1;
        } else {
            is_interval = false;
        }
    }

    keys.iter()
        .filter_map(|k| ranges.get(k).map(|r| (*k, r.values())))
        .filter(|(_, values)| !values.is_empty())
        .map(|(start, values)| {
            if values.iter().all(|w| *w == values[0]) {
                WidthRun::Range {
                    start,
                    end: start + values.len() as u32 - 1,
                    width: values[0],
                }
            } else {
                WidthRun::List { start, widths: values }
            }
        })
        .collect()
}

/// Flatten runs into the `/W` array object.
pub fn cid_widths_object(runs: &[WidthRun]) -> Object {
    let mut items = Vec::new();
    for run in runs {
        match run {
            WidthRun::Range { start, end, width } => {
                items.push(Object::from(*start));
                items.push(Object::from(*end));
                items.push(Object::from(*width));
            },
            WidthRun::List { start, widths } => {
                items.push(Object::from(*start));
                items.push(Object::integers(widths.iter().map(|w| *w as i64)));
            },
        }
    }
    Object::Array(items)
}

/// Two big-endian bytes per CID (0..=0xFFFF) giving the glyph index.
pub fn cid_to_gid_map(cid_to_gid: &BTreeMap<u32, u16>) -> Vec<u8> {
    let mut map = vec![0u8; 2 * 0x10000];
    for (&cid, &gid) in cid_to_gid {
        if cid <= 0xFFFF {
            let at = cid as usize * 2;
            map[at..at + 2].copy_from_slice(&gid.to_be_bytes());
        }
    }
    map
}

/// `ToUnicode` CMap mapping each used CID back to its code point.
pub fn to_unicode_cmap<I: IntoIterator<Item = u32>>(cids: I) -> String {
    let mut cmap = String::new();
    cmap.push_str("/CIDInit /ProcSet findresource begin\n");
    cmap.push_str("12 dict begin\n");
    cmap.push_str("begincmap\n");
    cmap.push_str("/CIDSystemInfo\n");
    cmap.push_str("<</Registry (Adobe)\n");
    cmap.push_str("/Ordering (UCS)\n");
    cmap.push_str("/Supplement 0\n");
    cmap.push_str(">> def\n");
    cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
    cmap.push_str("/CMapType 2 def\n");
    cmap.push_str("1 begincodespacerange\n");
    cmap.push_str("<0000> <FFFF>\n");
    cmap.push_str("endcodespacerange\n");

    let mut cids: Vec<u32> = cids.into_iter().filter(|c| *c != 0 && *c <= 0xFFFF).collect();
    cids.sort_unstable();
    cids.dedup();
    for chunk in cids.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for cid in chunk {
            cmap.push_str(&format!("<{:04X}> <{:04X}>\n", cid, cid));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str("endcmap\n");
    cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
    cmap.push_str("end\n");
    cmap.push_str("end");
    cmap
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::ObjectSerializer;

    fn run(pairs: &[(u32, u32)]) -> Vec<WidthRun> {
        cid_width_runs(pairs)
    }

    #[test]
    fn test_equal_run_becomes_triple() {
        let runs = run(&[(65, 500), (66, 500), (67, 500), (68, 500)]);
        assert_eq!(
            runs,
            vec![WidthRun::Range {
                start: 65,
                end: 68,
                width: 500
            }]
        );
    }

    #[test]
    fn test_mixed_run_becomes_list() {
        let runs = run(&[(65, 500), (66, 600), (67, 700)]);
        assert_eq!(
            runs,
            vec![WidthRun::List {
                start: 65,
                widths: vec![500, 600, 700]
            }]
        );
    }

    #[test]
    fn test_list_then_interval() {
        let runs = run(&[(65, 500), (66, 600), (67, 600), (68, 600)]);
        assert_eq!(
            runs,
            vec![
                WidthRun::List {
                    start: 65,
                    widths: vec![500]
                },
                WidthRun::Range {
                    start: 66,
                    end: 68,
                    width: 600
                },
            ]
        );
    }

    #[test]
    fn test_short_interval_merges_into_previous() {
        let runs = run(&[(65, 500), (66, 600), (67, 600), (68, 700)]);
        assert_eq!(
            runs,
            vec![WidthRun::List {
                start: 65,
                widths: vec![500, 600, 600, 700]
            }]
        );
    }

    #[test]
    fn test_gaps_start_new_runs() {
        let runs = run(&[(32, 250), (65, 600), (66, 600), (67, 600), (0x4E2D, 1000)]);
        assert_eq!(runs.len(), 3);
        assert_eq!(
            runs[1],
            WidthRun::Range {
                start: 65,
                end: 67,
                width: 600
            }
        );
        assert_eq!(
            runs[2],
            WidthRun::List {
                start: 0x4E2D,
                widths: vec![1000]
            }
        );
    }

    #[test]
    fn test_zero_cid_and_width_skipped() {
        let runs = run(&[(0, 500), (1, 0), (2, 400)]);
        assert_eq!(
            runs,
            vec![WidthRun::List {
                start: 2,
                widths: vec![400]
            }]
        );
    }

    #[test]
    fn test_widths_object_layout() {
        let runs = run(&[(65, 500), (66, 500), (67, 500), (90, 300), (91, 400)]);
        let text = ObjectSerializer::new().serialize_to_string(&cid_widths_object(&runs));
        assert_eq!(text, "[65 67 500 90 [300 400]]");
    }

    #[test]
    fn test_simple_widths_range() {
        let cw: Vec<u16> = (0..256).map(|i| i as u16).collect();
        match simple_widths(&cw) {
            Object::Array(items) => {
                assert_eq!(items.len(), 224);
                assert_eq!(items[0], Object::Integer(32));
                assert_eq!(items[223], Object::Integer(255));
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cid_to_gid_map() {
        let mut m = BTreeMap::new();
        m.insert(0x41, 1u16);
        m.insert(0x20AC, 0x0102);
        let bytes = cid_to_gid_map(&m);
        assert_eq!(bytes.len(), 131_072);
        assert_eq!(&bytes[0x82..0x84], &[0, 1]);
        assert_eq!(&bytes[0x4158..0x415A], &[0x01, 0x02]);
        assert_eq!(&bytes[0..2], &[0, 0]);
    }

    #[test]
    fn test_to_unicode_chunks() {
        let cmap = to_unicode_cmap(1..=150u32);
        assert!(cmap.contains("100 beginbfchar"));
        assert!(cmap.contains("50 beginbfchar"));
        assert!(cmap.contains("<0041> <0041>"));
        assert!(cmap.starts_with("/CIDInit /ProcSet findresource begin"));
        assert!(cmap.ends_with("end\nend"));
    }
}
