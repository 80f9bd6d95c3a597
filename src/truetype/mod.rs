//! TrueType and TrueType collection fonts: reading metrics and writing
//! embeddable (optionally subset) font programs.

pub mod cmap;
pub mod directory;
mod font;
pub mod glyf;
pub mod subset;
pub mod tables;

pub use directory::{TableDirectory, TableRecord, parse_font_path};
pub use font::{
    DEFAULT_CID_WIDTH, FontMetrics, FontStream, TrueTypeFont, WidthRun, prepare_widths,
};

/// How much of a font to embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingPolicy {
    /// The whole font program.
    Full,
    /// Only the glyphs the document uses.
    #[default]
    Subset,
}

/// The PDF font type a TrueType font is written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// A simple font with single-byte codes (`/Subtype /TrueType`).
    TrueType,
    /// A descendant of a Type 0 font addressed by glyph id (`/Subtype /CIDFontType2`).
    CidType2,
}
