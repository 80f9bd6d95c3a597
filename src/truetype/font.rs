use std::collections::BTreeSet;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use font_types::Tag;
use log::{debug, info, warn};

use crate::encoding::PdfEncoding;
use crate::error::Error;
use crate::filter::{self, DEFAULT_COMPRESSION, Stream};
use crate::source::FontSource;
use crate::table_tags::{
    CID_FONT_TABLES, CMAP, FULL_FONT_TABLES, GLYF, HEAD, HHEA, HMTX, LOCA, MAXP, NAME, OS2, POST,
    SIMPLE_FONT_TABLES,
};
use crate::truetype::cmap::{Cmap, CmapEntry, CodeMap};
use crate::truetype::directory::{TableDirectory, font_offset, parse_font_path};
use crate::truetype::tables::{
    Head, Hhea, Hmtx, Os2, Post, parse_loca, parse_num_glyphs, parse_postscript_name,
};
use crate::truetype::{EmbeddingPolicy, FontKind, glyf, subset};

/// Default `/DW` of a CID font.
pub const DEFAULT_CID_WIDTH: u16 = 1000;

const FLAG_FIXED_PITCH: u32 = 1;
const FLAG_SYMBOLIC: u32 = 1 << 2;
const FLAG_NONSYMBOLIC: u32 = 1 << 5;
const FLAG_ITALIC: u32 = 1 << 6;
const FLAG_FORCE_BOLD: u32 = 1 << 18;

const STEM_WIDTH: i32 = 80;

/// Font descriptor values in PDF glyph space (1000 units per em).
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    pub ascent: i32,
    pub descent: i32,
    pub cap_height: i32,
    pub avg_width: i32,
    pub max_width: i32,
    pub italic_angle: f32,
    /// `[x_min, y_min, x_max, y_max]`
    pub bbox: [i32; 4],
    /// PDF font descriptor `/Flags`.
    pub flags: u32,
    pub stem_v: i32,
    pub stem_h: i32,
    pub underline_position: i32,
    pub underline_thickness: i32,
}

/// One group of a CID font `/W` array: widths of consecutive glyphs from `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidthRun {
    pub start: u32,
    pub widths: Vec<u16>,
}

impl fmt::Display for WidthRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.start)?;
        for (i, width) in self.widths.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{width}")?;
        }
        f.write_str("]")
    }
}

/// A font program ready to be embedded, Flate-compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontStream {
    pub stream: Stream,
    /// Length of the uncompressed font program (`/Length1`).
    pub length1: usize,
}

/// A TrueType font loaded for use in a PDF document.
///
/// The font owns its data source for its whole lifetime; a file-backed font
/// keeps the file open until it is dropped. Text written with the font is
/// recorded so that [`create_stream`](TrueTypeFont::create_stream) can embed
/// only the glyphs that were used.
pub struct TrueTypeFont {
    source: FontSource,
    directory: TableDirectory,
    kind: FontKind,
    policy: EmbeddingPolicy,
    encoding: PdfEncoding,

    head: Head,
    os2: Os2,
    num_glyphs: u16,
    hmtx: Hmtx,
    cmap: Cmap,
    postscript_name: Option<String>,
    metrics: FontMetrics,

    used_glyphs: BTreeSet<u32>,
    used_codes: BTreeSet<u8>,
}

impl TrueTypeFont {
    /// Load a font file. A collection member is selected with a `.ttc,N` or
    /// `.ttcN` suffix on the path.
    pub fn open(path: &str, kind: FontKind, policy: EmbeddingPolicy) -> Result<Self, Error> {
        let (path, index) = parse_font_path(path);
        let source = FontSource::open(path)?;
        debug!("loading {path} (collection index {index:?})");
        Self::load(source, index, kind, policy)
    }

    pub fn from_bytes(
        data: Vec<u8>,
        index: Option<u32>,
        kind: FontKind,
        policy: EmbeddingPolicy,
    ) -> Result<Self, Error> {
        Self::load(FontSource::from(data), index, kind, policy)
    }

    pub fn load(
        source: FontSource,
        index: Option<u32>,
        kind: FontKind,
        policy: EmbeddingPolicy,
    ) -> Result<Self, Error> {
        let offset = font_offset(&source, index)?;
        let directory = TableDirectory::read(&source, offset)?;
        directory.check_required()?;

        let read = |tag: Tag| -> Result<Vec<u8>, Error> {
            let record = directory.require(tag)?;
            source.read_range(record.offset, record.length)
        };
        let read_optional = |tag: Tag| -> Result<Option<Vec<u8>>, Error> {
            match directory.get(tag) {
                Some(record) => source.read_range(record.offset, record.length).map(Some),
                None => Ok(None),
            }
        };

        let head = Head::parse(&read(HEAD)?)?;
        let hhea = Hhea::parse(&read(HHEA)?)?;
        let os2 = Os2::parse(&read(OS2)?)?;
        let num_glyphs = parse_num_glyphs(&read(MAXP)?)?;
        let hmtx = Hmtx::parse(&read(HMTX)?, hhea.number_of_h_metrics, num_glyphs)?;
        let post = match read_optional(POST)? {
            Some(data) => Post::parse(&data)?,
            None => Post::from_caret(&hhea),
        };

        let units_per_em = head.units_per_em;
        let cmap = match read_optional(CMAP)? {
            Some(data) => Cmap::parse(&data, |glyph| scaled_width(&hmtx, units_per_em, glyph))?,
            None if kind == FontKind::TrueType => return Err(Error::TableNotPresent(CMAP)),
            None => Cmap::default(),
        };
        let postscript_name = match read_optional(NAME)? {
            Some(data) => parse_postscript_name(&data)?,
            None => None,
        };

        let encoding = match kind {
            FontKind::CidType2 => PdfEncoding::IdentityH,
            FontKind::TrueType if cmap.is_symbolic() => PdfEncoding::FontSpecific,
            FontKind::TrueType => PdfEncoding::WinAnsi,
        };
        let metrics = compute_metrics(&head, &hhea, &os2, &post, &cmap);

        debug!(
            "loaded {} with {num_glyphs} glyphs, {units_per_em} units per em",
            postscript_name.as_deref().unwrap_or("unnamed font")
        );

        Ok(TrueTypeFont {
            source,
            directory,
            kind,
            policy,
            encoding,
            head,
            os2,
            num_glyphs,
            hmtx,
            cmap,
            postscript_name,
            metrics,
            used_glyphs: BTreeSet::from([0]),
            used_codes: BTreeSet::new(),
        })
    }

    /// Use `encoding` for the single-byte codes of a simple font.
    pub fn with_encoding(mut self, encoding: PdfEncoding) -> Self {
        if self.kind == FontKind::TrueType && encoding.is_single_byte() {
            self.encoding = encoding;
        } else {
            warn!("ignoring {} for a {:?} font", encoding.name(), self.kind);
        }
        self
    }

    pub fn kind(&self) -> FontKind {
        self.kind
    }

    pub fn policy(&self) -> EmbeddingPolicy {
        self.policy
    }

    pub fn encoding(&self) -> PdfEncoding {
        self.encoding
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    pub fn directory(&self) -> &TableDirectory {
        &self.directory
    }

    pub fn postscript_name(&self) -> Option<&str> {
        self.postscript_name.as_deref()
    }

    pub fn num_glyphs(&self) -> u16 {
        self.num_glyphs
    }

    pub fn units_per_em(&self) -> u16 {
        self.head.units_per_em
    }

    pub fn is_symbolic(&self) -> bool {
        self.cmap.is_symbolic()
    }

    /// Whether the `OS/2` licensing bits allow embedding.
    pub fn is_embeddable(&self) -> bool {
        self.os2.allows_embedding()
    }

    /// Glyphs recorded so far. Glyph 0 is always present.
    pub fn used_glyphs(&self) -> &BTreeSet<u32> {
        &self.used_glyphs
    }

    /// Advance width of `glyph` in PDF glyph space.
    ///
    /// Glyphs past the end of `hmtx` take the width of glyph 0.
    pub fn glyph_width(&self, glyph: u32) -> u16 {
        scaled_width(&self.hmtx, self.head.units_per_em, glyph)
    }

    /// The glyph and width `c` maps to through the font's `cmap`.
    pub fn glyph_for_char(&self, c: char) -> Option<CmapEntry> {
        if self.cmap.is_symbolic() {
            return lookup(&self.cmap.windows_symbol, c as u32);
        }
        if self.cmap.windows_unicode.is_some() {
            return lookup(&self.cmap.windows_unicode, c as u32);
        }
        let code = PdfEncoding::MacRoman.to_code(c)?;
        lookup(&self.cmap.mac_roman, code as u32)
    }

    /// The glyph behind a single-byte code of a simple font.
    pub fn glyph_for_code(&self, code: u8) -> Option<CmapEntry> {
        match self.encoding {
            PdfEncoding::FontSpecific => lookup(&self.cmap.windows_symbol, code as u32)
                .or_else(|| lookup(&self.cmap.mac_roman, code as u32)),
            encoding => self.glyph_for_char(encoding.to_unicode(code)?),
        }
    }

    /// Width of `c` in PDF glyph space, 0 when the font has no glyph for it.
    pub fn char_width(&self, c: char) -> u16 {
        self.glyph_for_char(c).map_or(0, |entry| entry.width)
    }

    /// Record glyphs drawn by other means than [`encode_text`](Self::encode_text).
    pub fn mark_used_glyphs(&mut self, glyphs: impl IntoIterator<Item = u32>) {
        self.used_glyphs.extend(glyphs);
    }

    /// Convert `text` to content-stream bytes and record the glyphs it uses.
    ///
    /// Simple fonts produce one byte per character in the font's encoding. CID
    /// fonts produce two-byte glyph ids. Characters that cannot be shown are
    /// dropped.
    pub fn encode_text(&mut self, text: &str) -> Vec<u8> {
        match self.kind {
            FontKind::TrueType => {
                let bytes = self.encoding.encode(text);
                for &code in &bytes {
                    self.used_codes.insert(code);
                    if let Some(entry) = self.glyph_for_code(code) {
                        self.used_glyphs.insert(entry.glyph);
                    }
                }
                bytes
            }
            FontKind::CidType2 => {
                let mut bytes = Vec::with_capacity(text.len() * 2);
                for c in text.chars() {
                    match self.glyph_for_char(c) {
                        Some(entry) => {
                            self.used_glyphs.insert(entry.glyph);
                            bytes.extend_from_slice(&(entry.glyph as u16).to_be_bytes());
                        }
                        None => debug!("no glyph for {c:?}, dropping it"),
                    }
                }
                bytes
            }
        }
    }

    /// `(first_char, last_char, widths)` over the single-byte codes used so
    /// far, the `/FirstChar`, `/LastChar` and `/Widths` of a simple font.
    /// Unused codes inside the range have width 0. With no codes used the
    /// range is empty.
    pub fn simple_widths(&self) -> (u8, u8, Vec<u16>) {
        let (Some(&first), Some(&last)) = (self.used_codes.first(), self.used_codes.last()) else {
            return (0, 0, Vec::new());
        };
        let widths = (first..=last)
            .map(|code| {
                if self.used_codes.contains(&code) {
                    self.glyph_for_code(code).map_or(0, |entry| entry.width)
                } else {
                    0
                }
            })
            .collect();
        (first, last, widths)
    }

    /// The `/W` runs of a CID font for the glyphs used so far.
    pub fn cid_widths(&self) -> Vec<WidthRun> {
        let glyphs: Vec<(u32, u16)> = self
            .used_glyphs
            .iter()
            .map(|&glyph| (glyph, self.glyph_width(glyph)))
            .collect();
        prepare_widths(&glyphs, DEFAULT_CID_WIDTH)
    }

    /// A deterministic six-letter tag naming the current glyph subset.
    pub fn subset_tag(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.used_glyphs.hash(&mut hasher);
        let mut hash = hasher.finish();

        let mut tag = String::with_capacity(6);
        for _ in 0..6 {
            tag.push((b'A' + (hash % 26) as u8) as char);
            hash /= 26;
        }
        tag
    }

    /// The `/BaseFont` name, prefixed with the subset tag for subset fonts.
    pub fn base_font(&self) -> String {
        let name = self.postscript_name.as_deref().unwrap_or("Untitled");
        match self.policy {
            EmbeddingPolicy::Subset => format!("{}+{name}", self.subset_tag()),
            EmbeddingPolicy::Full => name.to_string(),
        }
    }

    /// Serialize the font program according to the embedding policy.
    pub fn font_program(&self) -> Result<Vec<u8>, Error> {
        match self.policy {
            EmbeddingPolicy::Full => {
                subset::write_full(&self.source, &self.directory, &FULL_FONT_TABLES)
            }
            EmbeddingPolicy::Subset => self.subset_program(),
        }
    }

    fn subset_program(&self) -> Result<Vec<u8>, Error> {
        let glyf_record = self.directory.require(GLYF)?;
        let loca_record = self.directory.require(LOCA)?;
        let long_offsets = self.head.has_long_offsets();

        let loca_data = self
            .source
            .read_range(loca_record.offset, loca_record.length)?;
        let loca = parse_loca(&loca_data, long_offsets, self.num_glyphs)?;
        let glyf_data = self
            .source
            .read_range(glyf_record.offset, glyf_record.length)?;

        let glyphs = glyf::close_over_components(&glyf_data, &loca, self.used_glyphs.iter().copied())?;
        debug!(
            "subsetting to {} of {} glyphs",
            glyphs.len(),
            self.num_glyphs
        );

        let glyf_and_loca = subset::subset_glyf(&glyf_data, &loca, &glyphs, long_offsets)?;
        let order: &[Tag] = match self.kind {
            FontKind::CidType2 => &CID_FONT_TABLES,
            FontKind::TrueType => &SIMPLE_FONT_TABLES,
        };
        subset::write_subset(&self.source, &self.directory, order, glyf_and_loca)
    }

    /// The compressed font program, or `None` when the font's license forbids
    /// embedding. The font can still be used; readers substitute it.
    pub fn create_stream(&self) -> Result<Option<FontStream>, Error> {
        if !self.is_embeddable() {
            info!(
                "{} may not be embedded",
                self.postscript_name.as_deref().unwrap_or("font")
            );
            return Ok(None);
        }

        let program = self.font_program()?;
        let length1 = program.len();
        let mut stream = Stream::new(program);
        filter::encode(&mut stream, &[], true, DEFAULT_COMPRESSION)?;
        Ok(Some(FontStream { stream, length1 }))
    }
}

/// Group non-default widths into runs of consecutive glyph ids.
///
/// Glyphs whose width equals `default_width` are left out, which also ends
/// the current run.
pub fn prepare_widths(glyphs: &[(u32, u16)], default_width: u16) -> Vec<WidthRun> {
    let mut sorted = glyphs.to_vec();
    sorted.sort_unstable_by_key(|&(glyph, _)| glyph);
    sorted.dedup_by_key(|&mut (glyph, _)| glyph);

    let mut runs: Vec<WidthRun> = Vec::new();
    let mut last_glyph = None;
    for (glyph, width) in sorted {
        if width == default_width {
            continue;
        }
        let extends_run = last_glyph.is_some_and(|last: u32| last + 1 == glyph);
        if extends_run {
            if let Some(run) = runs.last_mut() {
                run.widths.push(width);
            }
        } else {
            runs.push(WidthRun {
                start: glyph,
                widths: vec![width],
            });
        }
        last_glyph = Some(glyph);
    }
    runs
}

fn scaled_width(hmtx: &Hmtx, units_per_em: u16, glyph: u32) -> u16 {
    let advance = match hmtx.advance(glyph) {
        Some(advance) => advance,
        None => {
            warn!("glyph {glyph} has no horizontal metrics, using the width of glyph 0");
            hmtx.advance(0).unwrap_or(0)
        }
    };
    (advance as u32 * 1000 / units_per_em as u32).min(u16::MAX as u32) as u16
}

fn scale(value: i16, units_per_em: u16) -> i32 {
    value as i32 * 1000 / units_per_em as i32
}

fn lookup(map: &Option<CodeMap>, code: u32) -> Option<CmapEntry> {
    map.as_ref()?.get(&code).copied()
}

fn compute_metrics(head: &Head, hhea: &Hhea, os2: &Os2, post: &Post, cmap: &Cmap) -> FontMetrics {
    let units_per_em = head.units_per_em;
    let (ascender, descender) = if os2.typo_ascender == 0 && os2.typo_descender == 0 {
        (hhea.ascender, hhea.descender)
    } else {
        (os2.typo_ascender, os2.typo_descender)
    };
    let cap_height = os2
        .cap_height
        .unwrap_or((units_per_em as i32 * 7 / 10) as i16);

    let mut flags = if cmap.is_symbolic() {
        FLAG_SYMBOLIC
    } else {
        FLAG_NONSYMBOLIC
    };
    if post.is_fixed_pitch {
        flags |= FLAG_FIXED_PITCH;
    }
    if head.mac_style & Head::MAC_STYLE_ITALIC != 0 {
        flags |= FLAG_ITALIC;
    }
    if head.mac_style & Head::MAC_STYLE_BOLD != 0 {
        flags |= FLAG_FORCE_BOLD;
    }

    FontMetrics {
        ascent: scale(ascender, units_per_em),
        descent: scale(descender, units_per_em),
        cap_height: scale(cap_height, units_per_em),
        avg_width: scale(os2.x_avg_char_width, units_per_em),
        max_width: (hhea.advance_width_max as u32 * 1000 / units_per_em as u32) as i32,
        italic_angle: post.italic_angle,
        bbox: [
            scale(head.x_min, units_per_em),
            scale(head.y_min, units_per_em),
            scale(head.x_max, units_per_em),
            scale(head.y_max, units_per_em),
        ],
        flags,
        stem_v: STEM_WIDTH,
        stem_h: STEM_WIDTH,
        underline_position: scale(post.underline_position, units_per_em),
        underline_thickness: scale(post.underline_thickness, units_per_em),
    }
}
