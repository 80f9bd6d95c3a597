//! Glyph outlines: locating glyphs in `glyf` and following composite references.

use std::collections::BTreeSet;
use std::ops::Range;

use log::{debug, warn};

use crate::buffer::ByteCursor;
use crate::error::Error;
use crate::table_tags::GLYF;

const FLAG_ARG_1_AND_2_ARE_WORDS: u16 = 1 << 0;
const FLAG_WE_HAVE_A_SCALE: u16 = 1 << 3;
const FLAG_MORE_COMPONENTS: u16 = 1 << 5;
const FLAG_WE_HAVE_AN_X_AND_Y_SCALE: u16 = 1 << 6;
const FLAG_WE_HAVE_A_TWO_BY_TWO: u16 = 1 << 7;

// numberOfContours followed by the glyph bounding box.
const GLYPH_HEADER_SIZE: usize = 10;

/// The byte range of `glyph` in `glyf`, or `None` for a glyph past the end of `loca`.
/// Empty glyphs (such as a space) have an empty range.
pub fn glyph_range(loca: &[u32], glyph: u32) -> Option<Range<usize>> {
    let glyph = glyph as usize;
    let start = *loca.get(glyph)? as usize;
    let end = *loca.get(glyph + 1)? as usize;
    Some(start..end.max(start))
}

/// Glyph ids referenced by the composite glyph stored in `outline`.
/// Simple and empty glyphs reference nothing.
pub fn component_glyphs(outline: &[u8]) -> Result<Vec<u32>, Error> {
    if outline.is_empty() {
        return Ok(Vec::new());
    }

    let mut cursor = ByteCursor::new(outline);
    let contours = cursor.read_i16()?;
    if contours >= 0 {
        return Ok(Vec::new());
    }

    cursor.seek(GLYPH_HEADER_SIZE)?;
    let mut components = Vec::new();
    let mut flags = FLAG_MORE_COMPONENTS;
    while flags & FLAG_MORE_COMPONENTS != 0 {
        flags = cursor.read_u16()?;
        components.push(cursor.read_u16()? as u32);

        let mut skip = if flags & FLAG_ARG_1_AND_2_ARE_WORDS != 0 {
            4
        } else {
            2
        };
        if flags & FLAG_WE_HAVE_A_SCALE != 0 {
            skip += 2;
        } else if flags & FLAG_WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            skip += 4;
        } else if flags & FLAG_WE_HAVE_A_TWO_BY_TWO != 0 {
            skip += 8;
        }
        cursor.skip(skip)?;
    }

    Ok(components)
}

/// Every glyph needed to draw `seeds`: the seeds, glyph 0, and all glyphs
/// their composites reference, directly or through other composites.
///
/// Glyph ids past the end of `loca` are dropped with a warning. Each glyph is
/// visited once, so a composite that refers back to itself terminates.
pub fn close_over_components(
    glyf: &[u8],
    loca: &[u32],
    seeds: impl IntoIterator<Item = u32>,
) -> Result<BTreeSet<u32>, Error> {
    let mut used = BTreeSet::new();
    let mut pending: Vec<u32> = std::iter::once(0).chain(seeds).collect();

    while let Some(glyph) = pending.pop() {
        if used.contains(&glyph) {
            continue;
        }
        let Some(range) = glyph_range(loca, glyph) else {
            warn!("glyph {glyph} is past the end of loca, skipping");
            continue;
        };
        let outline = glyf.get(range).ok_or(Error::MalformedTable {
            tag: GLYF,
            reason: "glyph extends past the end of glyf",
        })?;

        used.insert(glyph);
        let components = component_glyphs(outline).map_err(|err| err.in_table(GLYF))?;
        pending.extend(components.into_iter().filter(|c| !used.contains(c)));
    }

    debug!("glyph closure holds {} glyphs", used.len());
    Ok(used)
}
