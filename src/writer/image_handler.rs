//! Image handling for PDF generation.
//!
//! Images become Image XObjects (PDF 32000-1:2008 §8.9). Each format is
//! turned into an [`ImageInfo`] that already holds the stream bytes exactly
//! as they will be embedded:
//!
//! - **JPEG**: passed through with `DCTDecode`.
//! - **PNG**: 8-bit non-interlaced files pass their IDAT data through with a
//!   PNG predictor; alpha channels are split into a soft mask. Deeper or
//!   interlaced files are decoded and re-encoded.
//! - **GIF**: decoded to RGB(A) and re-encoded like a PNG.

use crate::error::{Error, Result};
use crate::object::{Dict, Object};
use crate::writer::pdf_writer::compress_data;
use flate2::read::ZlibDecoder;
use sha1::{Digest, Sha1};
use std::io::Read;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Color space for image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Grayscale (1 component per pixel)
    DeviceGray,
    /// RGB color (3 components per pixel)
    DeviceRGB,
    /// CMYK color (4 components per pixel)
    DeviceCMYK,
    /// Palette lookup into RGB
    Indexed,
}

impl ColorSpace {
    /// Get the number of color components.
    pub fn components(&self) -> u8 {
        match self {
            ColorSpace::DeviceGray | ColorSpace::Indexed => 1,
            ColorSpace::DeviceRGB => 3,
            ColorSpace::DeviceCMYK => 4,
        }
    }

    /// Get the PDF name for this color space.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceCMYK => "DeviceCMYK",
            ColorSpace::Indexed => "Indexed",
        }
    }
}

/// Image registration options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageOptions {
    /// `"jpg"`, `"jpeg"`, `"png"` or `"gif"`; empty means infer from the
    /// file extension or the content
    pub image_type: String,
    /// Use the resolution stored in the file instead of 72 dpi
    pub read_dpi: bool,
    /// Keep negative x coordinates instead of using the current x
    pub allow_negative_position: bool,
}

impl ImageOptions {
    /// Options for an explicit image type.
    pub fn with_type(image_type: impl Into<String>) -> Self {
        Self {
            image_type: image_type.into(),
            ..Self::default()
        }
    }

    /// Read the resolution from the file.
    pub fn with_read_dpi(mut self, read: bool) -> Self {
        self.read_dpi = read;
        self
    }

    /// Allow negative x coordinates.
    pub fn with_allow_negative_position(mut self, allow: bool) -> Self {
        self.allow_negative_position = allow;
        self
    }
}

/// Image type for a MIME type such as `image/png`.
pub fn image_type_from_mime(mime: &str) -> Option<&'static str> {
    match mime.trim().to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/jpg" | "image/jpeg" | "image/pjpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Image type from magic bytes.
pub fn detect_image_type(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(PNG_SIGNATURE) {
        Some("png")
    } else if data.starts_with(&[0xFF, 0xD8]) {
        Some("jpg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("gif")
    } else {
        None
    }
}

/// Stream-ready image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Color space
    pub color_space: ColorSpace,
    /// Bits per component
    pub bits_per_component: u8,
    /// `DCTDecode` or `FlateDecode`
    pub filter: &'static str,
    /// True when the Flate data carries PNG row predictors
    pub predictor: bool,
    /// Stream data, already encoded with `filter`
    pub data: Vec<u8>,
    /// Flate-compressed, predicted alpha channel
    pub soft_mask: Option<Vec<u8>>,
    /// RGB palette for indexed images
    pub palette: Vec<u8>,
    /// Color-key transparency values
    pub transparency: Vec<u8>,
    /// Resolution used for natural size
    pub dpi: f64,
    /// SHA-1 of every field, hex
    pub hash: String,
}

impl ImageInfo {
    /// Parse image bytes of the given type (`"jpg"`, `"png"`, `"gif"`).
    pub fn parse(data: &[u8], image_type: &str, options: &ImageOptions) -> Result<Self> {
        let kind = match image_type.to_ascii_lowercase().as_str() {
            "" => detect_image_type(data)
                .ok_or_else(|| Error::Image("unable to determine image type".to_string()))?,
            "jpg" | "jpeg" => "jpg",
            "png" => "png",
            "gif" => "gif",
            other => return Err(Error::Image(format!("unsupported image type: {}", other))),
        };

        let (mut info, stored_dpi) = match kind {
            "jpg" => parse_jpeg(data)?,
            "png" => parse_png(data)?,
            _ => (decode_with_image_crate(data, image::ImageFormat::Gif)?, None),
        };
        info.dpi = match stored_dpi {
            Some(dpi) if options.read_dpi && dpi > 0.0 => dpi,
            _ => 72.0,
        };
        info.hash = info.compute_hash();
        log::debug!(
            "Parsed {} image {}x{} ({}, {} bpc)",
            kind,
            info.width,
            info.height,
            info.color_space.pdf_name(),
            info.bits_per_component
        );
        Ok(info)
    }

    fn empty(width: u32, height: u32, color_space: ColorSpace) -> Self {
        Self {
            width,
            height,
            color_space,
            bits_per_component: 8,
            filter: "FlateDecode",
            predictor: true,
            data: Vec::new(),
            soft_mask: None,
            palette: Vec::new(),
            transparency: Vec::new(),
            dpi: 72.0,
            hash: String::new(),
        }
    }

    fn compute_hash(&self) -> String {
        let mut h = Sha1::new();
        h.update(self.width.to_be_bytes());
        h.update(self.height.to_be_bytes());
        h.update(self.color_space.pdf_name());
        h.update([self.bits_per_component, self.predictor as u8]);
        h.update(self.filter);
        h.update(&self.data);
        if let Some(mask) = &self.soft_mask {
            h.update(mask);
        }
        h.update(&self.palette);
        h.update(&self.transparency);
        h.update(self.dpi.to_be_bytes());
        h.finalize().iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Natural size in user units for scale factor `k`.
    pub fn extent(&self, k: f64) -> (f64, f64) {
        (self.width_units(k), self.height_units(k))
    }

    /// Natural width in user units.
    pub fn width_units(&self, k: f64) -> f64 {
        self.width as f64 * 72.0 / self.dpi / k
    }

    /// Natural height in user units.
    pub fn height_units(&self, k: f64) -> f64 {
        self.height as f64 * 72.0 / self.dpi / k
    }

    fn decode_parms(&self, colors: u8) -> Object {
        Object::dict([
            ("Predictor", Object::Integer(15)),
            ("Colors", Object::Integer(colors as i64)),
            ("BitsPerComponent", Object::Integer(self.bits_per_component as i64)),
            ("Columns", Object::Integer(self.width as i64)),
        ])
    }

    /// Image XObject dictionary without `/Length`.
    pub fn xobject_dict(&self, palette_obj: Option<u32>, smask_obj: Option<u32>) -> Dict {
        let mut d = Dict::new();
        d.insert("Type".into(), Object::name("XObject"));
        d.insert("Subtype".into(), Object::name("Image"));
        d.insert("Width".into(), Object::Integer(self.width as i64));
        d.insert("Height".into(), Object::Integer(self.height as i64));
        let cs = match (self.color_space, palette_obj) {
            (ColorSpace::Indexed, Some(pal)) => Object::Array(vec![
                Object::name("Indexed"),
                Object::name("DeviceRGB"),
                Object::Integer((self.palette.len() / 3) as i64 - 1),
                Object::reference(pal),
            ]),
            (cs, _) => Object::name(cs.pdf_name()),
        };
        d.insert("ColorSpace".into(), cs);
        if self.color_space == ColorSpace::DeviceCMYK {
            d.insert("Decode".into(), Object::reals(&[1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]));
        }
        d.insert("BitsPerComponent".into(), Object::Integer(self.bits_per_component as i64));
        d.insert("Filter".into(), Object::name(self.filter));
        if self.predictor {
            d.insert("DecodeParms".into(), self.decode_parms(self.color_space.components()));
        }
        if !self.transparency.is_empty() {
            let mask: Vec<i64> = self
                .transparency
                .iter()
                .flat_map(|&v| [v as i64, v as i64])
                .collect();
            d.insert("Mask".into(), Object::integers(mask));
        }
        if let Some(n) = smask_obj {
            d.insert("SMask".into(), Object::reference(n));
        }
        d
    }

    /// Soft mask XObject dictionary without `/Length`.
    pub fn soft_mask_dict(&self) -> Option<Dict> {
        self.soft_mask.as_ref().map(|_| {
            let mut d = Dict::new();
            d.insert("Type".into(), Object::name("XObject"));
            d.insert("Subtype".into(), Object::name("Image"));
            d.insert("Width".into(), Object::Integer(self.width as i64));
            d.insert("Height".into(), Object::Integer(self.height as i64));
            d.insert("ColorSpace".into(), Object::name("DeviceGray"));
            d.insert("BitsPerComponent".into(), Object::Integer(8));
            d.insert("Filter".into(), Object::name("FlateDecode"));
            d.insert("DecodeParms".into(), self.decode_parms(1));
            d
        })
    }

    /// Aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }
}

/// JPEG: dimensions and components from the SOF marker, density from JFIF.
fn parse_jpeg(data: &[u8]) -> Result<(ImageInfo, Option<f64>)> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return Err(Error::Image("not a valid JPEG file".to_string()));
    }

    let mut dpi = None;
    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        pos += 2;
        if marker == 0xFF || marker == 0x00 || (0xD0..=0xD7).contains(&marker) {
            continue;
        }
        if pos + 2 > data.len() {
            break;
        }
        let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        let segment = &data[pos..(pos + length).min(data.len())];

        // APP0 JFIF: units, x density, y density
        if marker == 0xE0 && segment.len() >= 14 && &segment[2..7] == b"JFIF\0" {
            let units = segment[9];
            let x_density = u16::from_be_bytes([segment[10], segment[11]]) as f64;
            dpi = match units {
                1 => Some(x_density),
                2 => Some(x_density * 2.54),
                _ => None,
            };
        }

        if matches!(
            marker,
            0xC0 | 0xC1 | 0xC2 | 0xC3 | 0xC5 | 0xC6 | 0xC7 | 0xC9 | 0xCA | 0xCB | 0xCD | 0xCE | 0xCF
        ) {
            if segment.len() < 8 {
                return Err(Error::Image("truncated JPEG header".to_string()));
            }
            let precision = segment[2];
            let height = u16::from_be_bytes([segment[3], segment[4]]) as u32;
            let width = u16::from_be_bytes([segment[5], segment[6]]) as u32;
            let color_space = match segment[7] {
                1 => ColorSpace::DeviceGray,
                3 => ColorSpace::DeviceRGB,
                4 => ColorSpace::DeviceCMYK,
                n => return Err(Error::Image(format!("unsupported JPEG component count {}", n))),
            };
            let mut info = ImageInfo::empty(width, height, color_space);
            info.bits_per_component = precision;
            info.filter = "DCTDecode";
            info.predictor = false;
            info.data = data.to_vec();
            return Ok((info, dpi));
        }
        pos += length;
    }

    Err(Error::Image("could not find JPEG dimensions".to_string()))
}

/// PNG chunk walk; falls back to full decoding for what PDF predictors
/// cannot express directly.
fn parse_png(data: &[u8]) -> Result<(ImageInfo, Option<f64>)> {
    if !data.starts_with(PNG_SIGNATURE) {
        return Err(Error::Image("not a PNG file".to_string()));
    }
    let corrupt = || Error::Image("corrupt PNG stream".to_string());

    let mut pos = PNG_SIGNATURE.len();
    let mut header: Option<[u8; 13]> = None;
    let mut palette = Vec::new();
    let mut trns = Vec::new();
    let mut idat = Vec::new();
    let mut dpi = None;

    while pos + 8 <= data.len() {
        let len = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        let tag = &data[pos + 4..pos + 8];
        let body = data.get(pos + 8..pos + 8 + len).ok_or_else(corrupt)?;
        match tag {
            b"IHDR" => {
                let ihdr: [u8; 13] = body.try_into().map_err(|_| corrupt())?;
                header = Some(ihdr);
            },
            b"PLTE" => palette = body.to_vec(),
            b"tRNS" => trns = body.to_vec(),
            b"IDAT" => idat.extend_from_slice(body),
            b"pHYs" if body.len() >= 9 && body[8] == 1 => {
                let ppm = u32::from_be_bytes([body[0], body[1], body[2], body[3]]) as f64;
                dpi = Some((ppm * 0.0254).round());
            },
            b"IEND" => break,
            _ => {},
        }
        pos += 12 + len;
    }

    let ihdr = header.ok_or_else(|| Error::Image("PNG file has no IHDR chunk".to_string()))?;
    let width = u32::from_be_bytes([ihdr[0], ihdr[1], ihdr[2], ihdr[3]]);
    let height = u32::from_be_bytes([ihdr[4], ihdr[5], ihdr[6], ihdr[7]]);
    let bpc = ihdr[8];
    let color_type = ihdr[9];
    if ihdr[10] != 0 {
        return Err(Error::Image("unknown PNG compression method".to_string()));
    }
    if ihdr[11] != 0 {
        return Err(Error::Image("unknown PNG filter method".to_string()));
    }

    if bpc > 8 || ihdr[12] != 0 {
        log::debug!("Decoding PNG (depth {}, interlace {}) instead of passing it through", bpc, ihdr[12]);
        return Ok((decode_with_image_crate(data, image::ImageFormat::Png)?, dpi));
    }

    let color_space = match color_type {
        0 | 4 => ColorSpace::DeviceGray,
        2 | 6 => ColorSpace::DeviceRGB,
        3 => ColorSpace::Indexed,
        other => return Err(Error::Image(format!("unknown PNG color type {}", other))),
    };
    if color_type == 3 && palette.is_empty() {
        return Err(Error::Image("indexed PNG is missing its palette".to_string()));
    }

    let mut info = ImageInfo::empty(width, height, color_space);
    info.bits_per_component = bpc;
    info.palette = palette;
    info.transparency = match color_type {
        0 if trns.len() >= 2 => vec![trns[1]],
        2 if trns.len() >= 6 => vec![trns[1], trns[3], trns[5]],
        3 => trns.iter().position(|&a| a == 0).map(|i| vec![i as u8]).unwrap_or_default(),
        _ => Vec::new(),
    };

    if color_type >= 4 {
        if bpc != 8 {
            return Err(Error::Image("alpha PNG must use 8-bit depth".to_string()));
        }
        let mut raw = Vec::new();
        ZlibDecoder::new(idat.as_slice())
            .read_to_end(&mut raw)
            .map_err(|e| Error::Image(format!("PNG data does not inflate: {}", e)))?;
        let colors = if color_type == 4 { 1 } else { 3 };
        let (color, alpha) = split_alpha(&raw, width as usize, height as usize, colors)?;
        info.data = compress_data(&color)?;
        info.soft_mask = Some(compress_data(&alpha)?);
    } else {
        info.data = idat;
    }
    Ok((info, dpi))
}

/// Split interleaved color+alpha rows, keeping each row's filter byte.
///
/// PNG filters work per byte with a stride of one pixel, so the filtered
/// bytes of each channel stay valid after the split.
fn split_alpha(raw: &[u8], width: usize, height: usize, colors: usize) -> Result<(Vec<u8>, Vec<u8>)> {
    let stride = width * (colors + 1);
    if raw.len() < height * (stride + 1) {
        return Err(Error::Image("PNG data is shorter than its dimensions".to_string()));
    }
    let mut color = Vec::with_capacity(height * (width * colors + 1));
    let mut alpha = Vec::with_capacity(height * (width + 1));
    for row in raw.chunks_exact(stride + 1).take(height) {
        color.push(row[0]);
        alpha.push(row[0]);
        for px in row[1..].chunks_exact(colors + 1) {
            color.extend_from_slice(&px[..colors]);
            alpha.push(px[colors]);
        }
    }
    Ok((color, alpha))
}

/// Prefix every row with filter type 0 so the predictor applies.
fn unfiltered_rows(pixels: &[u8], row_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() + pixels.len() / row_len.max(1));
    for row in pixels.chunks(row_len.max(1)) {
        out.push(0);
        out.extend_from_slice(row);
    }
    out
}

/// Decode to 8-bit pixels with the `image` crate and re-encode.
fn decode_with_image_crate(data: &[u8], format: image::ImageFormat) -> Result<ImageInfo> {
    use image::GenericImageView;

    let img = image::load_from_memory_with_format(data, format)
        .map_err(|e| Error::Image(format!("failed to decode image: {}", e)))?;
    let (width, height) = img.dimensions();
    let w = width as usize;

    let (color_space, pixels, alpha) = match img.color() {
        image::ColorType::L8 | image::ColorType::L16 => {
            (ColorSpace::DeviceGray, img.to_luma8().into_raw(), None)
        },
        image::ColorType::La8 | image::ColorType::La16 => {
            let la = img.to_luma_alpha8();
            let mut gray = Vec::with_capacity(w * height as usize);
            let mut alpha = Vec::with_capacity(w * height as usize);
            for p in la.pixels() {
                gray.push(p.0[0]);
                alpha.push(p.0[1]);
            }
            (ColorSpace::DeviceGray, gray, Some(alpha))
        },
        image::ColorType::Rgb8 | image::ColorType::Rgb16 => {
            (ColorSpace::DeviceRGB, img.to_rgb8().into_raw(), None)
        },
        _ => {
            let rgba = img.to_rgba8();
            let mut rgb = Vec::with_capacity(w * height as usize * 3);
            let mut alpha = Vec::with_capacity(w * height as usize);
            for p in rgba.pixels() {
                rgb.extend_from_slice(&p.0[..3]);
                alpha.push(p.0[3]);
            }
            // Fully opaque images need no mask
            let alpha = if alpha.iter().all(|&a| a == 255) { None } else { Some(alpha) };
            (ColorSpace::DeviceRGB, rgb, alpha)
        },
    };

    let mut info = ImageInfo::empty(width, height, color_space);
    info.data = compress_data(&unfiltered_rows(&pixels, w * color_space.components() as usize))?;
    info.soft_mask = alpha
        .map(|a| compress_data(&unfiltered_rows(&a, w)))
        .transpose()?;
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(tag: &[u8], body: &[u8]) -> Vec<u8> {
        let mut out = (body.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(tag);
        out.extend_from_slice(body);
        let mut crc_input = tag.to_vec();
        crc_input.extend_from_slice(body);
        out.extend_from_slice(&crc32fast::hash(&crc_input).to_be_bytes());
        out
    }

    fn png(width: u32, height: u32, color_type: u8, extra: &[Vec<u8>], rows: &[u8]) -> Vec<u8> {
        let mut ihdr = width.to_be_bytes().to_vec();
        ihdr.extend_from_slice(&height.to_be_bytes());
        ihdr.extend_from_slice(&[8, color_type, 0, 0, 0]);
        let mut out = PNG_SIGNATURE.to_vec();
        out.extend(chunk(b"IHDR", &ihdr));
        for c in extra {
            out.extend_from_slice(c);
        }
        out.extend(chunk(b"IDAT", &compress_data(rows).unwrap()));
        out.extend(chunk(b"IEND", &[]));
        out
    }

    #[test]
    fn test_rgb_png_passthrough() {
        let data = png(2, 1, 2, &[], &[0, 255, 0, 0, 0, 0, 255]);
        let info = ImageInfo::parse(&data, "png", &ImageOptions::default()).unwrap();
        assert_eq!((info.width, info.height), (2, 1));
        assert_eq!(info.color_space, ColorSpace::DeviceRGB);
        assert!(info.predictor);
        assert!(info.soft_mask.is_none());
        let dict = info.xobject_dict(None, None);
        let parms = dict["DecodeParms"].as_dict().unwrap();
        assert_eq!(parms["Colors"], Object::Integer(3));
        assert_eq!(parms["Columns"], Object::Integer(2));
    }

    #[test]
    fn test_rgba_png_splits_alpha() {
        let data = png(1, 2, 6, &[], &[0, 10, 20, 30, 128, 2, 1, 1, 1, 7]);
        let info = ImageInfo::parse(&data, "", &ImageOptions::default()).unwrap();
        let mut color = Vec::new();
        ZlibDecoder::new(info.data.as_slice()).read_to_end(&mut color).unwrap();
        assert_eq!(color, vec![0, 10, 20, 30, 2, 1, 1, 1]);
        let mut alpha = Vec::new();
        ZlibDecoder::new(info.soft_mask.as_ref().unwrap().as_slice())
            .read_to_end(&mut alpha)
            .unwrap();
        assert_eq!(alpha, vec![0, 128, 2, 7]);
        assert!(info.soft_mask_dict().is_some());
        assert_eq!(info.xobject_dict(None, Some(9))["SMask"], Object::reference(9));
    }

    #[test]
    fn test_indexed_png_with_transparency() {
        let extra = vec![chunk(b"PLTE", &[0, 0, 0, 255, 255, 255]), chunk(b"tRNS", &[255, 0])];
        let data = png(2, 1, 3, &extra, &[0, 0, 1]);
        let info = ImageInfo::parse(&data, "png", &ImageOptions::default()).unwrap();
        assert_eq!(info.color_space, ColorSpace::Indexed);
        assert_eq!(info.transparency, vec![1]);
        let dict = info.xobject_dict(Some(4), None);
        assert_eq!(
            dict["ColorSpace"],
            Object::Array(vec![
                Object::name("Indexed"),
                Object::name("DeviceRGB"),
                Object::Integer(1),
                Object::reference(4),
            ])
        );
        assert_eq!(dict["Mask"], Object::integers([1, 1]));
    }

    #[test]
    fn test_indexed_png_without_palette_fails() {
        let data = png(1, 1, 3, &[], &[0, 0]);
        assert!(matches!(ImageInfo::parse(&data, "png", &ImageOptions::default()), Err(Error::Image(_))));
    }

    #[test]
    fn test_png_dpi_only_when_requested() {
        let mut phys = 3780u32.to_be_bytes().to_vec();
        phys.extend_from_slice(&3780u32.to_be_bytes());
        phys.push(1);
        let data = png(1, 1, 0, &[chunk(b"pHYs", &phys)], &[0, 0]);
        let plain = ImageInfo::parse(&data, "png", &ImageOptions::default()).unwrap();
        assert_eq!(plain.dpi, 72.0);
        let read = ImageInfo::parse(&data, "png", &ImageOptions::default().with_read_dpi(true)).unwrap();
        assert_eq!(read.dpi, 96.0);
        assert_ne!(plain.hash, read.hash);
    }

    #[test]
    fn test_jpeg_header() {
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xE0, 0, 16]);
        data.extend_from_slice(b"JFIF\0");
        data.extend_from_slice(&[1, 1, 1, 0, 150, 0, 150, 0, 0]);
        data.extend_from_slice(&[0xFF, 0xC0, 0, 11, 8, 0, 20, 0, 30, 3, 1, 0x11, 0]);
        data.extend_from_slice(&[0xFF, 0xD9]);
        let info = ImageInfo::parse(&data, "jpeg", &ImageOptions::default().with_read_dpi(true)).unwrap();
        assert_eq!((info.width, info.height), (30, 20));
        assert_eq!(info.filter, "DCTDecode");
        assert_eq!(info.dpi, 150.0);
        assert_eq!(info.data, data);
        assert!(!info.xobject_dict(None, None).contains_key("DecodeParms"));
    }

    #[test]
    fn test_gif_is_reencoded() {
        let mut img = image::RgbaImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut bytes, image::ImageFormat::Gif)
            .unwrap();
        let info = ImageInfo::parse(bytes.get_ref(), "gif", &ImageOptions::default()).unwrap();
        assert_eq!((info.width, info.height), (2, 2));
        assert_eq!(info.color_space, ColorSpace::DeviceRGB);
        assert!(info.predictor);
    }

    #[test]
    fn test_same_content_same_hash() {
        let data = png(1, 1, 0, &[], &[0, 42]);
        let a = ImageInfo::parse(&data, "png", &ImageOptions::default()).unwrap();
        let b = ImageInfo::parse(&data, "", &ImageOptions::default()).unwrap();
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.hash.len(), 40);
    }

    #[test]
    fn test_extent_and_mime() {
        let data = png(72, 144, 0, &[], &vec![0u8; 144 * 73]);
        let info = ImageInfo::parse(&data, "png", &ImageOptions::default()).unwrap();
        let (w, h) = info.extent(72.0 / 25.4);
        assert!((w - 25.4).abs() < 1e-9);
        assert!((h - 50.8).abs() < 1e-9);
        assert_eq!(image_type_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(image_type_from_mime("text/plain"), None);
        assert!(matches!(ImageInfo::parse(&data, "bmp", &ImageOptions::default()), Err(Error::Image(_))));
    }
}
