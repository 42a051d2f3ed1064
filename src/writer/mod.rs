//! Low-level PDF output.
//!
//! ```text
//! Canvas calls (text, cells, shapes)
//!     ↓
//! [ContentStreamOp] (operators → page content bytes)
//!     ↓
//! [PdfWriter] (numbered objects, streams, xref, trailer)
//!     ↓
//! [ObjectSerializer] (dictionaries, arrays, strings)
//!     ↓
//! PDF bytes
//! ```
//!
//! The resource builders ([`ImageInfo`], [`OutlineBuilder`], [`LayerSet`],
//! [`EmbeddedFile`], [`XmpWriter`]) produce dictionaries and streams that the
//! document serializer hands to the [`PdfWriter`].

pub mod content_stream;
pub mod embedded_files;
pub mod image_handler;
pub mod layers;
pub mod object_serializer;
pub mod outline_builder;
pub mod pdf_writer;
pub mod xmp_metadata;

pub use content_stream::{
    paint_op, BlendMode, ContentStreamBuilder, ContentStreamOp, LineCap, LineJoin, TextArrayItem,
};
pub use embedded_files::EmbeddedFile;
pub use image_handler::{image_type_from_mime, ColorSpace, ImageInfo, ImageOptions};
pub use layers::{Layer, LayerSet};
pub use object_serializer::ObjectSerializer;
pub use outline_builder::{OutlineBuilder, OutlineItem};
pub use pdf_writer::{compress_data, PdfWriter, PdfWriterConfig};
pub use xmp_metadata::{XmpMetadata, XmpWriter};
