//! Resources shared by a document and every template drawn into it.
//!
//! Fonts, images, templates, spot colors and graphics states are registered
//! here once and written to the single shared resource dictionary at close.
//! The sticky error slot lives here too, so a failure inside a template
//! stops the owning document.

use crate::document::spot::{SpotColor, SpotColors};
use crate::error::{Error, Result};
use crate::fonts::{
    core_fonts, font_key, parse_pfb, AfmFont, FontDefinition, FontKind, FontProgram, FontStyle,
    LoadedFont, TrueTypeFont,
};
use crate::geometry::Size;
use crate::io::SharedLoader;
use crate::writer::{BlendMode, ImageInfo, ImageOptions};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// An image registered with the document.
#[derive(Debug, Clone)]
pub struct RegisteredImage {
    /// 1-based index; the resource name is `/I<index>`
    pub index: usize,
    pub info: ImageInfo,
}

impl RegisteredImage {
    /// Resource name without the slash.
    pub fn resource_name(&self) -> String {
        format!("I{}", self.index)
    }
}

/// A finished template, written as a Form XObject.
#[derive(Debug, Clone)]
pub struct TemplateRecord {
    /// Template id; the resource name is `/TPL<id>`
    pub id: usize,
    /// Size in user units
    pub size: Size,
    /// Size in points, used for `/BBox`
    pub size_pt: Size,
    /// Content stream
    pub content: Vec<u8>,
}

impl TemplateRecord {
    /// Resource name without the slash.
    pub fn resource_name(&self) -> String {
        format!("TPL{}", self.id)
    }
}

/// Transparency state written as an ExtGState resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtGState {
    pub alpha: f64,
    pub blend: BlendMode,
}

/// Registries and the sticky error slot.
pub struct Registry {
    fonts: IndexMap<String, LoadedFont>,
    images: IndexMap<String, RegisteredImage>,
    image_names: HashMap<String, String>,
    templates: Vec<TemplateRecord>,
    next_template_id: usize,
    spot_colors: SpotColors,
    ext_gstates: Vec<ExtGState>,
    font_dir: PathBuf,
    loader: SharedLoader,
    pub(crate) error: Option<Error>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("fonts", &self.fonts.keys().collect::<Vec<_>>())
            .field("images", &self.images.len())
            .field("templates", &self.templates.len())
            .field("font_dir", &self.font_dir)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Empty registry reading files through `loader`.
    pub fn new(font_dir: PathBuf, loader: SharedLoader) -> Self {
        Self {
            fonts: IndexMap::new(),
            images: IndexMap::new(),
            image_names: HashMap::new(),
            templates: Vec::new(),
            next_template_id: 1,
            spot_colors: SpotColors::default(),
            ext_gstates: Vec::new(),
            font_dir,
            loader,
            error: None,
        }
    }

    /// Store `err` unless an earlier error is pending.
    pub fn set_error(&mut self, err: Error) {
        if self.error.is_none() {
            log::warn!("Document error: {}", err);
            self.error = Some(err);
        }
    }

    /// File access capability.
    pub fn loader(&self) -> &SharedLoader {
        &self.loader
    }

    /// Directory searched for relative font files.
    pub fn font_dir(&self) -> &Path {
        &self.font_dir
    }

    /// Change the font directory.
    pub fn set_font_dir(&mut self, dir: impl Into<PathBuf>) {
        self.font_dir = dir.into();
    }

    fn resolve_path(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.font_dir.join(path)
        }
    }

    /// Read a file relative to the font directory.
    pub fn read_font_file(&self, file: &str) -> Result<Vec<u8>> {
        let path = self.resolve_path(file);
        self.loader
            .read_file(&path)
            .map_err(|e| Error::Font(format!("unable to read font file {}: {}", path.display(), e)))
    }

    // Fonts

    /// Registered font under `key`.
    pub fn font(&self, key: &str) -> Option<&LoadedFont> {
        self.fonts.get(key)
    }

    /// Registered font under `key`, mutably.
    pub fn font_mut(&mut self, key: &str) -> Option<&mut LoadedFont> {
        self.fonts.get_mut(key)
    }

    /// All fonts in registration order.
    pub fn fonts(&self) -> impl Iterator<Item = &LoadedFont> {
        self.fonts.values()
    }

    pub(crate) fn fonts_mut(&mut self) -> impl Iterator<Item = &mut LoadedFont> {
        self.fonts.values_mut()
    }

    /// Returns true if a font is registered under `key`.
    pub fn has_font(&self, key: &str) -> bool {
        self.fonts.contains_key(key)
    }

    fn insert_font(&mut self, key: String, def: FontDefinition, program: FontProgram) {
        let index = self.fonts.len() + 1;
        log::debug!("Registered font {} as F{} ({:?})", def.name, index, def.kind);
        self.fonts.insert(key, LoadedFont::new(index, def, program));
    }

    /// Register the base-14 font stored under `key`.
    pub fn add_core_font(&mut self, key: &str) -> Result<()> {
        if self.fonts.contains_key(key) {
            return Ok(());
        }
        let def = core_fonts::core_definition(key)
            .ok_or_else(|| Error::Font(format!("undefined font: {}", key)))?;
        self.insert_font(key.to_string(), def, FontProgram::None);
        Ok(())
    }

    /// Register a font from a JSON definition.
    ///
    /// `font_file` holds the font program; when `None`, the definition's
    /// `File` entry is read from the font directory. Core definitions need
    /// no program.
    pub fn add_font_from_json(
        &mut self,
        family: &str,
        style: FontStyle,
        json: &[u8],
        font_file: Option<&[u8]>,
    ) -> Result<()> {
        let key = font_key(family, style);
        if self.fonts.contains_key(&key) {
            return Ok(());
        }
        let def = FontDefinition::from_json(json)?;
        if def.is_utf8() {
            return Err(Error::Font(format!(
                "definition {} describes a UTF-8 font; load the TrueType file instead",
                def.name
            )));
        }
        let program = match def.kind {
            FontKind::Core => FontProgram::None,
            kind => {
                let data = match font_file {
                    Some(bytes) => bytes.to_vec(),
                    None if !def.file.is_empty() => self.read_font_file(&def.file)?,
                    None => {
                        return Err(Error::Font(format!("font {} has no font file", def.name)));
                    },
                };
                if kind == FontKind::Type1 {
                    FontProgram::Type1(parse_pfb(&data)?)
                } else {
                    FontProgram::TrueType(data)
                }
            },
        };
        self.insert_font(key, def, program);
        Ok(())
    }

    /// Register a TrueType font embedded with 8-bit WinAnsi encoding.
    pub fn add_truetype_font(&mut self, family: &str, style: FontStyle, data: &[u8]) -> Result<()> {
        let key = font_key(family, style);
        if self.fonts.contains_key(&key) {
            return Ok(());
        }
        let ttf = TrueTypeFont::parse(data)?;
        check_embeddable(&ttf)?;
        let def = FontDefinition::from_truetype(&ttf, false);
        self.insert_font(key, def, FontProgram::TrueType(data.to_vec()));
        Ok(())
    }

    /// Register a Type1 font from AFM metrics and a PFB program.
    pub fn add_type1_font(&mut self, family: &str, style: FontStyle, afm: &[u8], pfb: &[u8]) -> Result<()> {
        let key = font_key(family, style);
        if self.fonts.contains_key(&key) {
            return Ok(());
        }
        let metrics = AfmFont::parse(afm)?;
        let program = parse_pfb(pfb)?;
        let def = metrics.to_definition(&program);
        self.insert_font(key, def, FontProgram::Type1(program));
        Ok(())
    }

    /// Register a TrueType font written as a Type0 font with subsetting.
    pub fn add_utf8_font_from_bytes(&mut self, family: &str, style: FontStyle, data: &[u8]) -> Result<()> {
        let key = font_key(family, style);
        if self.fonts.contains_key(&key) {
            return Ok(());
        }
        let ttf = TrueTypeFont::parse(data)?;
        check_embeddable(&ttf)?;
        let index = self.fonts.len() + 1;
        log::debug!("Registered UTF-8 font {} as F{}", ttf.postscript_name, index);
        self.fonts.insert(key, LoadedFont::utf8(index, ttf));
        Ok(())
    }

    /// Like [`add_utf8_font_from_bytes`](Self::add_utf8_font_from_bytes),
    /// reading `file` from the font directory.
    pub fn add_utf8_font(&mut self, family: &str, style: FontStyle, file: &str) -> Result<()> {
        if self.fonts.contains_key(&font_key(family, style)) {
            return Ok(());
        }
        let data = self.read_font_file(file)?;
        self.add_utf8_font_from_bytes(family, style, &data)
    }

    // Images

    /// Parse and register an image under `name`.
    ///
    /// A name already registered returns the existing entry; identical
    /// content under a new name shares the existing XObject.
    pub fn register_image(&mut self, name: &str, data: &[u8], options: &ImageOptions) -> Result<&RegisteredImage> {
        if let Some(hash) = self.image_names.get(name).cloned() {
            if self.images.contains_key(&hash) {
                return Ok(&self.images[&hash]);
            }
        }
        let info = ImageInfo::parse(data, &options.image_type, options)?;
        let hash = info.hash.clone();
        self.image_names.insert(name.to_string(), hash.clone());
        let index = self.images.len() + 1;
        let image = self
            .images
            .entry(hash)
            .or_insert_with(|| RegisteredImage { index, info });
        Ok(&*image)
    }

    /// Register an image read from `path` through the loader.
    pub fn register_image_file(&mut self, path: &str, options: &ImageOptions) -> Result<&RegisteredImage> {
        if !self.image_names.contains_key(path) {
            let data = self
                .loader
                .read_file(Path::new(path))
                .map_err(|e| Error::Image(format!("unable to read image {}: {}", path, e)))?;
            let mut options = options.clone();
            if options.image_type.is_empty() {
                options.image_type = Path::new(path)
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
            }
            return self.register_image(path, &data, &options);
        }
        self.register_image(path, &[], options)
    }

    /// Image registered under `name`.
    pub fn image(&self, name: &str) -> Option<&RegisteredImage> {
        self.image_names.get(name).and_then(|hash| self.images.get(hash))
    }

    /// All distinct images in registration order.
    pub fn images(&self) -> impl Iterator<Item = &RegisteredImage> {
        self.images.values()
    }

    // Templates

    /// Reserve the next template id.
    pub fn next_template_id(&mut self) -> usize {
        let id = self.next_template_id;
        self.next_template_id += 1;
        id
    }

    /// Store a finished template.
    pub fn add_template(&mut self, record: TemplateRecord) {
        log::debug!("Template {} finished ({} bytes)", record.id, record.content.len());
        self.templates.push(record);
    }

    /// Template by id.
    pub fn template(&self, id: usize) -> Option<&TemplateRecord> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// All finished templates.
    pub fn templates(&self) -> &[TemplateRecord] {
        &self.templates
    }

    // Spot colors

    /// Register a spot color.
    pub fn add_spot_color(&mut self, name: &str, c: u8, m: u8, y: u8, k: u8) -> Result<()> {
        self.spot_colors.add(name, c, m, y, k).map(|_| ())
    }

    /// Spot color by name.
    pub fn spot_color(&self, name: &str) -> Result<&SpotColor> {
        self.spot_colors.get(name)
    }

    /// All spot colors.
    pub fn spot_colors(&self) -> &SpotColors {
        &self.spot_colors
    }

    // Graphics states

    /// 1-based index of the graphics state for `alpha` and `blend`,
    /// registering it on first use.
    pub fn ext_gstate(&mut self, alpha: f64, blend: BlendMode) -> usize {
        let key = |s: &ExtGState| (s.blend, format!("{:.3}", s.alpha));
        let wanted = ExtGState { alpha, blend };
        if let Some(pos) = self.ext_gstates.iter().position(|s| key(s) == key(&wanted)) {
            return pos + 1;
        }
        self.ext_gstates.push(wanted);
        self.ext_gstates.len()
    }

    /// All graphics states; index `i` is `/GS<i+1>`.
    pub fn ext_gstates(&self) -> &[ExtGState] {
        &self.ext_gstates
    }
}

/// OS/2 `fsType` bits 1 (restricted licence) and 9 (bitmap only) forbid embedding.
fn check_embeddable(ttf: &TrueTypeFont) -> Result<()> {
    if ttf.embeddable {
        Ok(())
    } else {
        Err(Error::Font(format!("font {} does not permit embedding", ttf.postscript_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::ttf_builder::TestFont;
    use crate::io::default_loader;

    fn registry() -> Registry {
        Registry::new(PathBuf::from("."), default_loader())
    }

    #[test]
    fn test_core_font_indexes() {
        let mut r = registry();
        r.add_core_font("helvetica").unwrap();
        r.add_core_font("timesB").unwrap();
        r.add_core_font("helvetica").unwrap();
        assert_eq!(r.font("helvetica").unwrap().index, 1);
        assert_eq!(r.font("timesB").unwrap().resource_name(), "F2");
        assert!(matches!(r.add_core_font("comic"), Err(Error::Font(_))));
    }

    #[test]
    fn test_first_error_wins() {
        let mut r = registry();
        r.set_error(Error::Render("first".into()));
        r.set_error(Error::Render("second".into()));
        assert!(r.error.as_ref().unwrap().to_string().contains("first"));
    }

    #[test]
    fn test_utf8_font_registration() {
        let mut r = registry();
        let data = TestFont::latin(600).build();
        r.add_utf8_font_from_bytes("Test", FontStyle::empty(), &data).unwrap();
        assert!(r.font("test").unwrap().is_utf8());
        r.add_truetype_font("Test", FontStyle::BOLD, &data).unwrap();
        assert_eq!(r.font("testB").unwrap().def.kind, FontKind::TrueType);
        assert!(r.add_utf8_font_from_bytes("Bad", FontStyle::empty(), b"OTTO").is_err());
    }

    #[test]
    fn test_non_embeddable_fonts_are_rejected() {
        let mut r = registry();
        let restricted = TestFont::latin(500).with_fs_type(0x0002).build();
        let err = r.add_utf8_font_from_bytes("r", FontStyle::empty(), &restricted).unwrap_err();
        assert!(err.is_font_error());
        let bitmap = TestFont::latin(500).with_fs_type(0x0200).build();
        assert!(r.add_truetype_font("b", FontStyle::empty(), &bitmap).is_err());
        assert!(r.font("r").is_none());
        assert!(r.font("b").is_none());

        let editable = TestFont::latin(500).with_fs_type(0x0008).build();
        r.add_utf8_font_from_bytes("e", FontStyle::empty(), &editable).unwrap();
    }

    #[test]
    fn test_missing_font_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = Registry::new(dir.path().to_path_buf(), default_loader());
        let err = r.add_utf8_font("x", FontStyle::empty(), "missing.ttf").unwrap_err();
        assert!(err.is_font_error());
    }

    #[test]
    fn test_ext_gstate_dedup() {
        let mut r = registry();
        assert_eq!(r.ext_gstate(0.5, BlendMode::Normal), 1);
        assert_eq!(r.ext_gstate(0.5, BlendMode::Multiply), 2);
        assert_eq!(r.ext_gstate(0.5004, BlendMode::Normal), 1);
        assert_eq!(r.ext_gstates().len(), 2);
    }

    #[test]
    fn test_template_ids() {
        let mut r = registry();
        assert_eq!(r.next_template_id(), 1);
        assert_eq!(r.next_template_id(), 2);
        r.add_template(TemplateRecord {
            id: 2,
            size: Size::new(10.0, 10.0),
            size_pt: Size::new(28.35, 28.35),
            content: Vec::new(),
        });
        assert_eq!(r.template(2).unwrap().resource_name(), "TPL2");
        assert!(r.template(1).is_none());
    }
}
