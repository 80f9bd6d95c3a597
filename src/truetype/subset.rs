//! Writing an embeddable sfnt: the whole font, or only the glyphs in use.

use std::collections::BTreeSet;

use bytes::BufMut;
use font_types::Tag;
use log::debug;

use crate::error::Error;
use crate::source::FontSource;
use crate::table_tags::{ENTRY_SELECTORS, GLYF, HEAD, LOCA};
use crate::truetype::directory::{CHECKSUM_ADJUSTMENT_OFFSET, TableDirectory};
use crate::{Round4, compute_checksum};

const SFNT_VERSION: u32 = 0x0001_0000;
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

/// Rebuilt `glyf` and `loca` holding only the used glyphs.
///
/// Glyph ids are preserved: `loca` keeps one entry per glyph of the original
/// font and unused glyphs become empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyfAndLoca {
    pub glyf: Vec<u8>,
    pub loca: Vec<u8>,
}

/// Copy the outlines of `glyphs` into a new `glyf` and describe them in a new
/// `loca` in the same offset format as the original.
pub fn subset_glyf(
    glyf: &[u8],
    loca: &[u32],
    glyphs: &BTreeSet<u32>,
    long_offsets: bool,
) -> Result<GlyfAndLoca, Error> {
    let mut new_glyf = Vec::with_capacity(glyf.len() / 4);
    let mut new_offsets = Vec::with_capacity(loca.len());

    for (glyph, bounds) in loca.windows(2).enumerate() {
        new_offsets.push(new_glyf.len() as u32);
        if !glyphs.contains(&(glyph as u32)) {
            continue;
        }
        let (start, end) = (bounds[0] as usize, bounds[1] as usize);
        if end <= start {
            continue;
        }
        let outline = glyf.get(start..end).ok_or(Error::MalformedTable {
            tag: GLYF,
            reason: "glyph extends past the end of glyf",
        })?;
        new_glyf.extend_from_slice(outline);
        // Short offsets address 16-bit words.
        if !long_offsets && new_glyf.len() % 2 != 0 {
            new_glyf.push(0);
        }
    }
    new_offsets.push(new_glyf.len() as u32);
    new_glyf.resize(Round4!(new_glyf.len()), 0);

    let mut new_loca = Vec::with_capacity(new_offsets.len() * 4);
    for offset in new_offsets {
        if long_offsets {
            new_loca.put_u32(offset);
        } else {
            new_loca.put_u16((offset / 2) as u16);
        }
    }
    new_loca.resize(Round4!(new_loca.len()), 0);

    Ok(GlyfAndLoca {
        glyf: new_glyf,
        loca: new_loca,
    })
}

/// Write a font holding the tables of `order` that the font has, with `glyf`
/// and `loca` replaced by `glyf_and_loca`.
pub fn write_subset(
    source: &FontSource,
    directory: &TableDirectory,
    order: &[Tag],
    glyf_and_loca: GlyfAndLoca,
) -> Result<Vec<u8>, Error> {
    let GlyfAndLoca { glyf, loca } = glyf_and_loca;
    let mut glyf = Some(glyf);
    let mut loca = Some(loca);

    let mut tables = Vec::with_capacity(order.len());
    for &tag in order {
        let body = match tag {
            GLYF => glyf.take().unwrap_or_default(),
            LOCA => loca.take().unwrap_or_default(),
            _ => match directory.get(tag) {
                Some(record) => source.read_range(record.offset, record.length)?,
                None => continue,
            },
        };
        tables.push((tag, body));
    }

    Ok(assemble(tables))
}

/// Write every table of `order` the font has, unchanged.
pub fn write_full(
    source: &FontSource,
    directory: &TableDirectory,
    order: &[Tag],
) -> Result<Vec<u8>, Error> {
    directory.require(GLYF)?;
    directory.require(LOCA)?;

    let mut tables = Vec::with_capacity(order.len());
    for &tag in order {
        if let Some(record) = directory.get(tag) {
            tables.push((tag, source.read_range(record.offset, record.length)?));
        }
    }

    Ok(assemble(tables))
}

/// Lay out an sfnt: header, table directory in the given order, then the
/// 4-byte aligned table bodies. Checksums are computed here and `head`'s
/// `checkSumAdjustment` is set so the whole font sums to the magic value.
pub(crate) fn assemble(mut tables: Vec<(Tag, Vec<u8>)>) -> Vec<u8> {
    let num_tables = tables.len();
    let entry_selector = ENTRY_SELECTORS
        .get(num_tables)
        .copied()
        .unwrap_or_else(|| num_tables.max(1).ilog2() as u16);
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = (num_tables as u16 * 16).saturating_sub(search_range);

    let header_size = 12 + 16 * num_tables;
    let body_size: usize = tables.iter().map(|(_, body)| Round4!(body.len())).sum();
    let mut out = Vec::with_capacity(header_size + body_size);

    out.put_u32(SFNT_VERSION);
    out.put_u16(num_tables as u16);
    out.put_u16(search_range);
    out.put_u16(entry_selector);
    out.put_u16(range_shift);

    let mut offset = header_size;
    let mut head_offset = None;
    for (tag, body) in tables.iter_mut() {
        if *tag == HEAD && body.len() >= CHECKSUM_ADJUSTMENT_OFFSET + 4 {
            body[CHECKSUM_ADJUSTMENT_OFFSET..CHECKSUM_ADJUSTMENT_OFFSET + 4].fill(0);
            head_offset = Some(offset);
        }

        out.put_slice(&tag.to_be_bytes());
        out.put_u32(compute_checksum(body));
        out.put_u32(offset as u32);
        out.put_u32(body.len() as u32);
        offset += Round4!(body.len());
    }

    for (_, body) in &tables {
        out.extend_from_slice(body);
        out.resize(Round4!(out.len()), 0);
    }

    // Update 'head' checkSumAdjustment. It was zeroed above and the whole font
    // has been written, so its sum is the font checksum.
    if let Some(head_offset) = head_offset {
        let adjustment = CHECKSUM_MAGIC.wrapping_sub(compute_checksum(&out));
        let position = head_offset + CHECKSUM_ADJUSTMENT_OFFSET;
        out[position..position + 4].copy_from_slice(&adjustment.to_be_bytes());
    }

    debug!("wrote sfnt with {num_tables} tables, {} bytes", out.len());
    out
}
