//! The sfnt header, the table directory and TrueType collection headers.

use std::collections::BTreeMap;

use bytes::Buf;
use font_types::Tag;
use log::debug;

use crate::compute_checksum;
use crate::error::{Error, bail, bail_if};
use crate::source::FontSource;
use crate::table_tags::{HEAD, OTTO_TAG, REQUIRED_TABLES, TRUE_TAG, TTC_TAG};

const SFNT_HEADER_SIZE: u32 = 12;
const TABLE_RECORD_SIZE: u32 = 16;
const TRUETYPE_VERSION: u32 = 0x0001_0000;

/// Byte offset of `checkSumAdjustment` within `head`.
pub(crate) const CHECKSUM_ADJUSTMENT_OFFSET: usize = 8;

/// One entry of the table directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    pub tag: Tag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// The tables of one font, keyed by tag.
#[derive(Debug, Clone, Default)]
pub struct TableDirectory {
    tables: BTreeMap<Tag, TableRecord>,
}

/// Split a font path into the file path and the collection index it selects.
///
/// Both `fonts/x.ttc,1` and `fonts/x.ttc1` select font 1 of `fonts/x.ttc`.
/// Any other path is returned unchanged with no index.
pub fn parse_font_path(path: &str) -> (&str, Option<u32>) {
    // ASCII lowercasing keeps byte offsets intact.
    let lower = path.to_ascii_lowercase();
    if let Some(position) = lower.rfind(".ttc") {
        let end = position + 4;
        let suffix = path[end..].strip_prefix(',').unwrap_or(&path[end..]);
        if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = suffix.parse() {
                return (&path[..end], Some(index));
            }
        }
    }
    (path, None)
}

/// Locate the sfnt header of the font to load.
///
/// For a collection, `index` picks the font (font 0 when absent) and is
/// checked against the collection's font count. An index given for a file that
/// is not a collection is an error.
pub fn font_offset(source: &FontSource, index: Option<u32>) -> Result<u32, Error> {
    let header = source.read_range(0, SFNT_HEADER_SIZE.min(source.len() as u32))?;
    let mut input = &header[..];
    let tag = Tag::from_u32(input.try_get_u32()?);

    if tag != TTC_TAG {
        bail_if!(
            index.is_some(),
            Error::BadFontFormat("font index given for a file that is not a collection")
        );
        return Ok(0);
    }

    let _version = input.try_get_u32()?;
    let count = input.try_get_u32()?;
    let index = index.unwrap_or(0);
    bail_if!(index >= count, Error::InvalidTtcIndex { index, count });

    let entry = index
        .checked_mul(4)
        .and_then(|position| position.checked_add(SFNT_HEADER_SIZE))
        .and_then(|position| source.read_range(position, 4).ok())
        .ok_or(Error::BadFontFormat("truncated collection header"))?;
    let offset = (&entry[..]).try_get_u32()?;
    debug!("collection font {index} of {count} starts at {offset}");
    Ok(offset)
}

impl TableDirectory {
    /// Read the sfnt header and table directory at `offset`.
    pub fn read(source: &FontSource, offset: u32) -> Result<Self, Error> {
        let header = source
            .read_range(offset, SFNT_HEADER_SIZE)
            .map_err(|_| Error::BadFontFormat("truncated sfnt header"))?;
        let mut input = &header[..];

        let version = input.try_get_u32()?;
        if Tag::from_u32(version) == OTTO_TAG {
            bail!(Error::BadFontFormat("CFF outlines are not TrueType"));
        }
        bail_if!(
            version != TRUETYPE_VERSION && Tag::from_u32(version) != TRUE_TAG,
            Error::BadFontFormat("unknown sfnt version")
        );

        let num_tables = input.try_get_u16()?;
        let records = source
            .read_range(
                offset.saturating_add(SFNT_HEADER_SIZE),
                num_tables as u32 * TABLE_RECORD_SIZE,
            )
            .map_err(|_| Error::BadFontFormat("truncated table directory"))?;

        let mut input = &records[..];
        let mut tables = BTreeMap::new();
        for _ in 0..num_tables {
            let record = TableRecord {
                tag: Tag::from_u32(input.try_get_u32()?),
                checksum: input.try_get_u32()?,
                offset: input.try_get_u32()?,
                length: input.try_get_u32()?,
            };
            bail_if!(
                record.offset as u64 + record.length as u64 > source.len(),
                Error::MalformedTable {
                    tag: record.tag,
                    reason: "table extends past the end of the file",
                }
            );
            bail_if!(
                tables.insert(record.tag, record).is_some(),
                Error::BadFontFormat("duplicate table tag")
            );
        }

        debug!("read {} table records", tables.len());
        Ok(TableDirectory { tables })
    }

    /// Build a directory from records, as when parsing freshly written font data.
    pub fn from_records(records: impl IntoIterator<Item = TableRecord>) -> Self {
        TableDirectory {
            tables: records.into_iter().map(|r| (r.tag, r)).collect(),
        }
    }

    /// Parse the directory of in-memory font data starting at byte 0.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let mut input = data;
        let version = input.try_get_u32()?;
        bail_if!(
            version != TRUETYPE_VERSION && Tag::from_u32(version) != TRUE_TAG,
            Error::BadFontFormat("unknown sfnt version")
        );
        let num_tables = input.try_get_u16()?;
        input.try_get_u16()?;
        input.try_get_u16()?;
        input.try_get_u16()?;

        let mut tables = BTreeMap::new();
        for _ in 0..num_tables {
            let record = TableRecord {
                tag: Tag::from_u32(input.try_get_u32()?),
                checksum: input.try_get_u32()?,
                offset: input.try_get_u32()?,
                length: input.try_get_u32()?,
            };
            bail_if!(
                record.offset as u64 + record.length as u64 > data.len() as u64,
                Error::MalformedTable {
                    tag: record.tag,
                    reason: "table extends past the end of the file",
                }
            );
            bail_if!(
                tables.insert(record.tag, record).is_some(),
                Error::BadFontFormat("duplicate table tag")
            );
        }
        Ok(TableDirectory { tables })
    }

    pub fn get(&self, tag: Tag) -> Option<&TableRecord> {
        self.tables.get(&tag)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.tables.contains_key(&tag)
    }

    /// The record for `tag`, or a [`Error::TableNotPresent`] naming it.
    pub fn require(&self, tag: Tag) -> Result<&TableRecord, Error> {
        self.get(tag).ok_or(Error::TableNotPresent(tag))
    }

    /// Fail on the first table every font must have that this one lacks.
    pub fn check_required(&self) -> Result<(), Error> {
        for tag in REQUIRED_TABLES {
            self.require(tag)?;
        }
        Ok(())
    }

    /// Table records in tag order.
    pub fn iter(&self) -> impl Iterator<Item = &TableRecord> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Recompute every table checksum over `data` and compare it with the
    /// stored one. `head` is summed with `checkSumAdjustment` taken as zero.
    pub fn verify_checksums(&self, data: &[u8]) -> Result<(), Error> {
        for record in self.iter() {
            let start = record.offset as usize;
            let end = start + record.length as usize;
            bail_if!(
                end > data.len(),
                Error::MalformedTable {
                    tag: record.tag,
                    reason: "table extends past the end of the file",
                }
            );

            let checksum = table_checksum(record.tag, &data[start..end]);
            bail_if!(
                checksum != record.checksum,
                Error::MalformedTable {
                    tag: record.tag,
                    reason: "checksum mismatch",
                }
            );
        }
        Ok(())
    }
}

/// The directory checksum of a table body.
pub(crate) fn table_checksum(tag: Tag, table: &[u8]) -> u32 {
    let checksum = compute_checksum(table);
    if tag == HEAD && table.len() >= CHECKSUM_ADJUSTMENT_OFFSET + 4 {
        let adjustment = &table[CHECKSUM_ADJUSTMENT_OFFSET..CHECKSUM_ADJUSTMENT_OFFSET + 4];
        checksum.wrapping_sub(u32::from_be_bytes([
            adjustment[0],
            adjustment[1],
            adjustment[2],
            adjustment[3],
        ]))
    } else {
        checksum
    }
}
