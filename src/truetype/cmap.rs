//! Character-code to glyph mapping from the `cmap` table.
//!
//! Three subtables are of interest: Mac Roman (platform 1, encoding 0),
//! Windows Symbol (3, 0) and Windows Unicode BMP (3, 1). Each may use format
//! 0, 4 or 6; other formats are skipped.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::buffer::ByteCursor;
use crate::error::{Error, bail_if};
use crate::table_tags::CMAP;

/// A mapped character: its glyph and advance width in PDF glyph space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmapEntry {
    pub glyph: u32,
    pub width: u16,
}

pub type CodeMap = BTreeMap<u32, CmapEntry>;

#[derive(Debug, Clone, Default)]
pub struct Cmap {
    pub mac_roman: Option<CodeMap>,
    pub windows_symbol: Option<CodeMap>,
    pub windows_unicode: Option<CodeMap>,
}

impl Cmap {
    /// Parse the relevant subtables, attaching `width_of(glyph)` to every entry.
    pub fn parse(data: &[u8], width_of: impl Fn(u32) -> u16) -> Result<Self, Error> {
        Self::read(data, &width_of).map_err(|err| err.in_table(CMAP))
    }

    fn read(data: &[u8], width_of: &dyn Fn(u32) -> u16) -> Result<Self, Error> {
        let mut cursor = ByteCursor::new(data);
        let _version = cursor.read_u16()?;
        let num_tables = cursor.read_u16()?;

        let mut cmap = Cmap::default();
        for _ in 0..num_tables {
            let platform = cursor.read_u16()?;
            let encoding = cursor.read_u16()?;
            let offset = cursor.read_u32()? as usize;

            let slot = match (platform, encoding) {
                (1, 0) => &mut cmap.mac_roman,
                (3, 0) => &mut cmap.windows_symbol,
                (3, 1) => &mut cmap.windows_unicode,
                _ => continue,
            };
            if slot.is_some() {
                continue;
            }

            let symbolic = (platform, encoding) == (3, 0);
            if let Some(glyphs) = read_subtable(data, offset, symbolic)? {
                debug!(
                    "cmap ({platform}, {encoding}) maps {} codes",
                    glyphs.len()
                );
                *slot = Some(
                    glyphs
                        .into_iter()
                        .map(|(code, glyph)| {
                            let width = width_of(glyph);
                            (code, CmapEntry { glyph, width })
                        })
                        .collect(),
                );
            }
        }

        Ok(cmap)
    }

    /// A font is symbolic when it only maps through the Windows Symbol subtable.
    pub fn is_symbolic(&self) -> bool {
        self.windows_symbol.is_some() && self.windows_unicode.is_none()
    }
}

/// Parse the subtable at `offset`, returning `None` for an unsupported format.
pub(crate) fn read_subtable(
    data: &[u8],
    offset: usize,
    symbolic: bool,
) -> Result<Option<BTreeMap<u32, u32>>, Error> {
    let mut cursor = ByteCursor::at(data, offset)?;
    let format = cursor.read_u16()?;
    let subtable = &data[offset..];

    let glyphs = match format {
        0 => read_format_0(subtable)?,
        4 => read_format_4(subtable, symbolic)?,
        6 => read_format_6(subtable)?,
        _ => {
            warn!("skipping cmap subtable in unsupported format {format}");
            return Ok(None);
        }
    };
    Ok(Some(glyphs))
}

/// Byte encoding table: 256 one-byte glyph ids.
fn read_format_0(subtable: &[u8]) -> Result<BTreeMap<u32, u32>, Error> {
    let glyph_ids = ByteCursor::at(subtable, 6)?.read_bytes(256)?;
    Ok(glyph_ids
        .iter()
        .enumerate()
        .filter(|&(_, &glyph)| glyph != 0)
        .map(|(code, &glyph)| (code as u32, glyph as u32))
        .collect())
}

/// Segment mapping to delta values.
fn read_format_4(subtable: &[u8], symbolic: bool) -> Result<BTreeMap<u32, u32>, Error> {
    let mut cursor = ByteCursor::at(subtable, 6)?;
    let seg_count = cursor.read_u16()? as usize / 2;
    bail_if!(
        seg_count == 0,
        Error::MalformedTable {
            tag: CMAP,
            reason: "format 4 subtable has no segments",
        }
    );

    let end_codes = 14;
    let start_codes = end_codes + seg_count * 2 + 2; // reservedPad
    let id_deltas = start_codes + seg_count * 2;
    let id_range_offsets = id_deltas + seg_count * 2;

    let read_u16 = |position: usize| ByteCursor::at(subtable, position)?.read_u16();

    let mut glyphs = BTreeMap::new();
    for segment in 0..seg_count {
        let end = read_u16(end_codes + segment * 2)?;
        let start = read_u16(start_codes + segment * 2)?;
        let delta = read_u16(id_deltas + segment * 2)?;
        let range_offset_position = id_range_offsets + segment * 2;
        let range_offset = read_u16(range_offset_position)?;

        for code in start..=end {
            if code == 0xFFFF {
                break;
            }

            let glyph = if range_offset == 0 {
                code.wrapping_add(delta)
            } else {
                // The offset is relative to the idRangeOffset entry itself.
                let position = range_offset_position
                    + range_offset as usize
                    + (code - start) as usize * 2;
                match read_u16(position) {
                    Ok(0) => 0,
                    Ok(glyph) => glyph.wrapping_add(delta),
                    Err(_) => {
                        warn!("cmap segment for {start:#06x}..={end:#06x} points outside the table");
                        break;
                    }
                }
            };

            if glyph == 0 {
                continue;
            }
            if symbolic && code & 0xFF00 == 0xF000 {
                glyphs.insert((code & 0xFF) as u32, glyph as u32);
            }
            glyphs.insert(code as u32, glyph as u32);
        }
    }

    Ok(glyphs)
}

/// Trimmed table mapping: a dense run of codes starting at `firstCode`.
fn read_format_6(subtable: &[u8]) -> Result<BTreeMap<u32, u32>, Error> {
    let mut cursor = ByteCursor::at(subtable, 6)?;
    let first_code = cursor.read_u16()? as u32;
    let entry_count = cursor.read_u16()? as u32;

    let mut glyphs = BTreeMap::new();
    for code in first_code..first_code + entry_count {
        let glyph = cursor.read_u16()?;
        if glyph != 0 {
            glyphs.insert(code, glyph as u32);
        }
    }
    Ok(glyphs)
}
