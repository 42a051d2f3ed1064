//! Error types for the PDF generator.
//!
//! Every fallible operation in the crate returns [`Result`]. Public drawing and
//! text calls on a [`Document`](crate::Document) never return errors directly;
//! they store the first failure in the document's sticky error slot instead.

/// Result type alias for PDF generation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or serializing a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid unit, orientation or page size given at construction time
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Undefined font or unreadable/malformed font data
    #[error("Font error: {0}")]
    Font(String),

    /// Font file is not a TrueType outline font (e.g. OTTO/CFF)
    #[error("Unsupported font format: {0}")]
    UnsupportedFontFormat(String),

    /// Required TrueType table is missing
    #[error("Font table not found: {0}")]
    FontTableNotFound(String),

    /// Font has no Windows Unicode BMP cmap subtable
    #[error("Font has no Unicode (3,1) cmap subtable")]
    NoUnicodeCmap,

    /// Font has no PostScript name record
    #[error("Font has no PostScript name")]
    MissingPostScriptName,

    /// Unsupported or corrupt image
    #[error("Image error: {0}")]
    Image(String),

    /// Text rendered without a font, or a character outside the font's range
    #[error("Render error: {0}")]
    Render(String),

    /// Unbalanced clip/transform nesting or invalid document state
    #[error("Structural error: {0}")]
    Structural(String),

    /// Spot color registered twice under the same name
    #[error("Spot color already registered: {0}")]
    DuplicateSpotColor(String),

    /// Spot color referenced before registration
    #[error("Spot color not registered: {0}")]
    UnknownSpotColor(String),

    /// Encryption setup failure
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Font definition JSON could not be decoded
    #[error("Font definition error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true for the font-loading family of errors.
    pub fn is_font_error(&self) -> bool {
        matches!(
            self,
            Error::Font(_)
                | Error::UnsupportedFontFormat(_)
                | Error::FontTableNotFound(_)
                | Error::NoUnicodeCmap
                | Error::MissingPostScriptName
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_table_not_found_error() {
        let err = Error::FontTableNotFound("hmtx".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Font table not found"));
        assert!(msg.contains("hmtx"));
        assert!(err.is_font_error());
    }

    #[test]
    fn test_duplicate_spot_color_error() {
        let err = Error::DuplicateSpotColor("PANTONE 145 CVC".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("PANTONE 145 CVC"));
        assert!(!err.is_font_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.ttf");
        let err: Error = io.into();
        assert!(format!("{}", err).contains("missing.ttf"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
