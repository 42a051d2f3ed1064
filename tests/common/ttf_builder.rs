//! Builds small but structurally complete TrueType fonts for tests.
//!
//! Glyph 0 is an empty `.notdef`; every mapped character gets a simple
//! three-point outline. Shared by the crate's unit tests and the
//! integration tests so no binary fixtures are needed.

#![allow(dead_code)]

/// Description of a font to build.
#[derive(Debug, Clone)]
pub struct TestFont {
    chars: Vec<(char, u16)>,
    composites: Vec<(char, u16, u16)>,
    notdef_width: u16,
    h_metrics: Option<u16>,
    units_per_em: u16,
    signature: u32,
    fs_type: u16,
    hinted: bool,
    bold: bool,
    name: String,
    omit: Vec<String>,
    cmap_platform: (u16, u16),
    cmap_format: u16,
}

impl TestFont {
    /// Font mapping each `(char, advance)` pair to its own glyph.
    pub fn new(chars: &[(char, u16)]) -> Self {
        let mut chars = chars.to_vec();
        chars.sort_by_key(|(c, _)| *c);
        Self {
            chars,
            composites: Vec::new(),
            notdef_width: 500,
            h_metrics: None,
            units_per_em: 1000,
            signature: 0x0001_0000,
            fs_type: 0,
            hinted: false,
            bold: false,
            name: "TestSans-Regular".to_string(),
            omit: Vec::new(),
            cmap_platform: (3, 1),
            cmap_format: 4,
        }
    }

    /// Printable ASCII with a fixed advance plus a few Latin-1 letters.
    pub fn latin(advance: u16) -> Self {
        let chars: Vec<(char, u16)> = (0x20u8..0x7F)
            .map(|b| (b as char, if b == b' ' { advance / 2 } else { advance }))
            .chain(['é', 'ü', '€', '中', '文'].iter().map(|&c| (c, advance)))
            .collect();
        Self::new(&chars)
    }

    /// Add a composite glyph for `ch` built from glyph `component`.
    pub fn with_composite(mut self, ch: char, advance: u16, component: u16) -> Self {
        self.composites.push((ch, advance, component));
        self
    }

    pub fn with_h_metrics(mut self, n: u16) -> Self {
        self.h_metrics = Some(n);
        self
    }

    pub fn with_units_per_em(mut self, upem: u16) -> Self {
        self.units_per_em = upem;
        self
    }

    pub fn with_signature(mut self, signature: u32) -> Self {
        self.signature = signature;
        self
    }

    pub fn with_fs_type(mut self, fs_type: u16) -> Self {
        self.fs_type = fs_type;
        self
    }

    /// Write a version 1.0 `maxp` with TrueType hinting limits.
    pub fn hinted(mut self) -> Self {
        self.hinted = true;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn without_table(mut self, tag: &str) -> Self {
        self.omit.push(tag.to_string());
        self
    }

    pub fn with_cmap_platform(mut self, platform: u16, encoding: u16) -> Self {
        self.cmap_platform = (platform, encoding);
        self
    }

    pub fn with_cmap_format(mut self, format: u16) -> Self {
        self.cmap_format = format;
        self
    }

    fn num_glyphs(&self) -> u16 {
        (1 + self.chars.len() + self.composites.len()) as u16
    }

    fn advances(&self) -> Vec<u16> {
        std::iter::once(self.notdef_width)
            .chain(self.chars.iter().map(|(_, w)| *w))
            .chain(self.composites.iter().map(|(_, w, _)| *w))
            .collect()
    }

    fn mapping(&self) -> Vec<(u16, u16)> {
        let mut map: Vec<(u16, u16)> = self
            .chars
            .iter()
            .enumerate()
            .map(|(i, (c, _))| (*c as u32 as u16, i as u16 + 1))
            .collect();
        let base = 1 + self.chars.len() as u16;
        for (i, (c, _, _)) in self.composites.iter().enumerate() {
            map.push((*c as u32 as u16, base + i as u16));
        }
        map.sort();
        map
    }

    /// Serialize the font.
    pub fn build(&self) -> Vec<u8> {
        let (glyf, loca) = self.glyf_and_loca();
        let mut tables: Vec<(&str, Vec<u8>)> = vec![
            ("OS/2", self.os2()),
            ("cmap", self.cmap()),
            ("glyf", glyf),
            ("head", self.head()),
            ("hhea", self.hhea()),
            ("hmtx", self.hmtx()),
            ("loca", loca),
            ("maxp", self.maxp()),
            ("name", self.name_table()),
            ("post", self.post()),
        ];
        tables.retain(|(tag, _)| !self.omit.iter().any(|o| o == tag));

        let mut out = Vec::new();
        put_u32(&mut out, self.signature);
        put_u16(&mut out, tables.len() as u16);
        put_u16(&mut out, 128);
        put_u16(&mut out, 3);
        put_u16(&mut out, (tables.len() as u16 * 16).saturating_sub(128));

        let mut offset = 12 + tables.len() * 16;
        let mut body = Vec::new();
        for (tag, data) in &tables {
            out.extend_from_slice(tag.as_bytes());
            put_u32(&mut out, 0);
            put_u32(&mut out, offset as u32);
            put_u32(&mut out, data.len() as u32);
            let mut padded = data.clone();
            while padded.len() % 4 != 0 {
                padded.push(0);
            }
            offset += padded.len();
            body.extend_from_slice(&padded);
        }
        out.extend_from_slice(&body);
        out
    }

    fn head(&self) -> Vec<u8> {
        let mut t = Vec::new();
        put_u32(&mut t, 0x0001_0000);
        put_u32(&mut t, 0x0001_0000);
        put_u32(&mut t, 0);
        put_u32(&mut t, 0x5F0F_3CF5);
        put_u16(&mut t, 0x000B);
        put_u16(&mut t, self.units_per_em);
        t.extend_from_slice(&[0u8; 16]);
        for v in [0i16, -200, 1000, 800] {
            put_i16(&mut t, v);
        }
        put_u16(&mut t, if self.bold { 1 } else { 0 });
        put_u16(&mut t, 8);
        put_i16(&mut t, 2);
        put_i16(&mut t, 1);
        put_i16(&mut t, 0);
        t
    }

    fn hhea(&self) -> Vec<u8> {
        let mut t = Vec::new();
        put_u32(&mut t, 0x0001_0000);
        put_i16(&mut t, 800);
        put_i16(&mut t, -200);
        put_i16(&mut t, 0);
        put_u16(&mut t, self.advances().iter().copied().max().unwrap_or(0));
        t.extend_from_slice(&[0u8; 6]);
        put_i16(&mut t, 1);
        t.extend_from_slice(&[0u8; 14]);
        put_u16(&mut t, self.h_metrics.unwrap_or(self.num_glyphs()));
        t
    }

    fn maxp(&self) -> Vec<u8> {
        let mut t = Vec::new();
        if !self.hinted {
            put_u32(&mut t, 0x0000_5000);
            put_u16(&mut t, self.num_glyphs());
            return t;
        }
        put_u32(&mut t, 0x0001_0000);
        put_u16(&mut t, self.num_glyphs());
        // maxPoints .. maxComponentDepth
        for v in [1200, 40, 3400, 120, 2, 48, 96, 210, 0, 1024, 4096, 12, 3] {
            put_u16(&mut t, v);
        }
        t
    }

    fn hmtx(&self) -> Vec<u8> {
        let n = self.h_metrics.unwrap_or(self.num_glyphs()) as usize;
        let mut t = Vec::new();
        for (i, w) in self.advances().iter().enumerate() {
            if i < n {
                put_u16(&mut t, *w);
            }
            put_i16(&mut t, 0);
        }
        t
    }

    fn cmap(&self) -> Vec<u8> {
        let mut sub = Vec::new();
        if self.cmap_format == 4 {
            let mut segments: Vec<(u16, u16)> = self.mapping();
            segments.push((0xFFFF, 0));
            let seg_count = segments.len() as u16;
            put_u16(&mut sub, 4);
            put_u16(&mut sub, 16 + seg_count * 8);
            put_u16(&mut sub, 0);
            put_u16(&mut sub, seg_count * 2);
            put_u16(&mut sub, 2);
            put_u16(&mut sub, 0);
            put_u16(&mut sub, seg_count * 2 - 2);
            for (c, _) in &segments {
                put_u16(&mut sub, *c);
            }
            put_u16(&mut sub, 0);
            for (c, _) in &segments {
                put_u16(&mut sub, *c);
            }
            for (c, g) in &segments {
                let delta = if *c == 0xFFFF { 1 } else { g.wrapping_sub(*c) };
                put_u16(&mut sub, delta);
            }
            for _ in &segments {
                put_u16(&mut sub, 0);
            }
        } else {
            put_u16(&mut sub, self.cmap_format);
            put_u16(&mut sub, 10);
            put_u16(&mut sub, 0);
            put_u16(&mut sub, 0);
            put_u16(&mut sub, 0);
        }

        let mut t = Vec::new();
        put_u16(&mut t, 0);
        put_u16(&mut t, 1);
        put_u16(&mut t, self.cmap_platform.0);
        put_u16(&mut t, self.cmap_platform.1);
        put_u32(&mut t, 12);
        t.extend_from_slice(&sub);
        t
    }

    fn name_table(&self) -> Vec<u8> {
        let encoded: Vec<u8> = self.name.encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
        let mut t = Vec::new();
        put_u16(&mut t, 0);
        put_u16(&mut t, 1);
        put_u16(&mut t, 18);
        for v in [3u16, 1, 0x0409, 6, encoded.len() as u16, 0] {
            put_u16(&mut t, v);
        }
        t.extend_from_slice(&encoded);
        t
    }

    fn os2(&self) -> Vec<u8> {
        let mut t = vec![0u8; 96];
        t[0..2].copy_from_slice(&4u16.to_be_bytes());
        t[4..6].copy_from_slice(&(if self.bold { 700u16 } else { 400u16 }).to_be_bytes());
        t[8..10].copy_from_slice(&self.fs_type.to_be_bytes());
        let selection: u16 = if self.bold { 0x0020 } else { 0x0040 };
        t[62..64].copy_from_slice(&selection.to_be_bytes());
        t[68..70].copy_from_slice(&800i16.to_be_bytes());
        t[70..72].copy_from_slice(&(-200i16).to_be_bytes());
        t[88..90].copy_from_slice(&700i16.to_be_bytes());
        t
    }

    fn post(&self) -> Vec<u8> {
        let mut t = vec![0u8; 32];
        t[0..4].copy_from_slice(&0x0003_0000u32.to_be_bytes());
        t[8..10].copy_from_slice(&(-100i16).to_be_bytes());
        t[10..12].copy_from_slice(&50i16.to_be_bytes());
        t
    }

    fn glyf_and_loca(&self) -> (Vec<u8>, Vec<u8>) {
        let mut glyf = Vec::new();
        let mut loca = Vec::new();
        put_u32(&mut loca, 0);
        put_u32(&mut loca, 0);
        for (_, advance) in &self.chars {
            let w = *advance as i16;
            put_i16(&mut glyf, 1);
            for v in [0i16, 0, w, 700] {
                put_i16(&mut glyf, v);
            }
            put_u16(&mut glyf, 2);
            put_u16(&mut glyf, 0);
            glyf.extend_from_slice(&[0x01, 0x01, 0x01]);
            for v in [0i16, w, -(w / 2)] {
                put_i16(&mut glyf, v);
            }
            for v in [0i16, 0, 700] {
                put_i16(&mut glyf, v);
            }
            while glyf.len() % 4 != 0 {
                glyf.push(0);
            }
            put_u32(&mut loca, glyf.len() as u32);
        }
        for (_, advance, component) in &self.composites {
            put_i16(&mut glyf, -1);
            for v in [0i16, 0, *advance as i16, 700] {
                put_i16(&mut glyf, v);
            }
            put_u16(&mut glyf, 0x0003);
            put_u16(&mut glyf, *component);
            put_i16(&mut glyf, 10);
            put_i16(&mut glyf, 0);
            while glyf.len() % 4 != 0 {
                glyf.push(0);
            }
            put_u32(&mut loca, glyf.len() as u32);
        }
        (glyf, loca)
    }
}

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn put_i16(out: &mut Vec<u8>, v: i16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}
