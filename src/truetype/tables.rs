//! Parsers for the fixed-layout tables a PDF font descriptor is built from.

use log::warn;

use crate::buffer::ByteCursor;
use crate::encoding::PdfEncoding;
use crate::error::{Error, bail_if};
use crate::table_tags::{HEAD, HHEA, HMTX, LOCA, MAXP, NAME, OS2, POST};

/// The parts of `head` this crate reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Head {
    pub units_per_em: u16,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    /// 0 for 16-bit `loca` offsets, 1 for 32-bit offsets.
    pub index_to_loc_format: i16,
}

impl Head {
    pub const MAC_STYLE_BOLD: u16 = 1 << 0;
    pub const MAC_STYLE_ITALIC: u16 = 1 << 1;

    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        Self::read(data).map_err(|err| err.in_table(HEAD))
    }

    fn read(data: &[u8]) -> Result<Self, Error> {
        let mut cursor = ByteCursor::at(data, 18)?;
        let units_per_em = cursor.read_u16()?;
        bail_if!(
            units_per_em == 0,
            Error::MalformedTable {
                tag: HEAD,
                reason: "unitsPerEm is zero",
            }
        );

        cursor.seek(36)?;
        let x_min = cursor.read_i16()?;
        let y_min = cursor.read_i16()?;
        let x_max = cursor.read_i16()?;
        let y_max = cursor.read_i16()?;
        let mac_style = cursor.read_u16()?;

        cursor.seek(50)?;
        let index_to_loc_format = cursor.read_i16()?;

        Ok(Head {
            units_per_em,
            x_min,
            y_min,
            x_max,
            y_max,
            mac_style,
            index_to_loc_format,
        })
    }

    pub fn has_long_offsets(&self) -> bool {
        self.index_to_loc_format != 0
    }
}

/// The horizontal header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hhea {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub number_of_h_metrics: u16,
}

impl Hhea {
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        Self::read(data).map_err(|err| err.in_table(HHEA))
    }

    fn read(data: &[u8]) -> Result<Self, Error> {
        let mut cursor = ByteCursor::at(data, 4)?;
        let ascender = cursor.read_i16()?;
        let descender = cursor.read_i16()?;
        let line_gap = cursor.read_i16()?;
        let advance_width_max = cursor.read_u16()?;

        cursor.seek(18)?;
        let caret_slope_rise = cursor.read_i16()?;
        let caret_slope_run = cursor.read_i16()?;

        cursor.seek(34)?;
        let number_of_h_metrics = cursor.read_u16()?;

        Ok(Hhea {
            ascender,
            descender,
            line_gap,
            advance_width_max,
            caret_slope_rise,
            caret_slope_run,
            number_of_h_metrics,
        })
    }
}

/// The `OS/2` fields used for metrics and embedding permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Os2 {
    pub version: u16,
    pub x_avg_char_width: i16,
    pub weight_class: u16,
    pub fs_type: u16,
    pub typo_ascender: i16,
    pub typo_descender: i16,
    pub typo_line_gap: i16,
    pub win_ascent: u16,
    pub win_descent: u16,
    /// Only present from version 2 on.
    pub cap_height: Option<i16>,
}

/// Length of a version 0 `OS/2` table that includes the typographic metrics.
const OS2_V0_LENGTH: usize = 78;

impl Os2 {
    /// `fsType` bit for "restricted license embedding".
    pub const FS_TYPE_RESTRICTED: u16 = 0x0002;

    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        Self::read(data).map_err(|err| err.in_table(OS2))
    }

    fn read(data: &[u8]) -> Result<Self, Error> {
        let mut cursor = ByteCursor::new(data);
        let version = cursor.read_u16()?;
        let x_avg_char_width = cursor.read_i16()?;
        let weight_class = cursor.read_u16()?;
        cursor.skip(2)?; // usWidthClass
        let fs_type = cursor.read_u16()?;

        // Early version 0 tables end before the typographic metrics, which
        // then read as 0 and the hhea values are used instead.
        let (typo_ascender, typo_descender, typo_line_gap, win_ascent, win_descent) =
            if data.len() >= OS2_V0_LENGTH {
                cursor.seek(68)?;
                (
                    cursor.read_i16()?,
                    cursor.read_i16()?,
                    cursor.read_i16()?,
                    cursor.read_u16()?,
                    cursor.read_u16()?,
                )
            } else {
                warn!("OS/2 table has no typographic metrics ({} bytes)", data.len());
                (0, 0, 0, 0, 0)
            };

        let cap_height = if version >= 2 {
            cursor.seek(88)?;
            Some(cursor.read_i16()?)
        } else {
            None
        };

        Ok(Os2 {
            version,
            x_avg_char_width,
            weight_class,
            fs_type,
            typo_ascender,
            typo_descender,
            typo_line_gap,
            win_ascent,
            win_descent,
            cap_height,
        })
    }

    pub fn allows_embedding(&self) -> bool {
        self.fs_type & Self::FS_TYPE_RESTRICTED == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Post {
    /// Degrees counter-clockwise from vertical.
    pub italic_angle: f32,
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub is_fixed_pitch: bool,
}

impl Post {
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        Self::read(data).map_err(|err| err.in_table(POST))
    }

    fn read(data: &[u8]) -> Result<Self, Error> {
        let mut cursor = ByteCursor::at(data, 4)?;
        let mantissa = cursor.read_i16()?;
        let fraction = cursor.read_u16()?;
        let underline_position = cursor.read_i16()?;
        let underline_thickness = cursor.read_i16()?;
        let is_fixed_pitch = cursor.read_u32()? != 0;

        Ok(Post {
            italic_angle: mantissa as f32 + fraction as f32 / 16384.0,
            underline_position,
            underline_thickness,
            is_fixed_pitch,
        })
    }

    /// Stand-in for fonts without `post`, slanted by the `hhea` caret.
    pub fn from_caret(hhea: &Hhea) -> Self {
        let angle = -(hhea.caret_slope_run as f32).atan2(hhea.caret_slope_rise as f32);
        Post {
            italic_angle: angle.to_degrees(),
            underline_position: 0,
            underline_thickness: 0,
            is_fixed_pitch: false,
        }
    }
}

pub fn parse_num_glyphs(maxp: &[u8]) -> Result<u16, Error> {
    ByteCursor::at(maxp, 4)
        .and_then(|mut cursor| cursor.read_u16())
        .map_err(|err| err.in_table(MAXP))
}

/// Advance widths in font units, one per glyph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hmtx {
    advances: Vec<u16>,
}

impl Hmtx {
    pub fn parse(data: &[u8], number_of_h_metrics: u16, num_glyphs: u16) -> Result<Self, Error> {
        Self::read(data, number_of_h_metrics, num_glyphs).map_err(|err| err.in_table(HMTX))
    }

    fn read(data: &[u8], number_of_h_metrics: u16, num_glyphs: u16) -> Result<Self, Error> {
        let mut cursor = ByteCursor::new(data);

        // A single metric record: every glyph has the same advance.
        if data.len() == 4 {
            let advance = cursor.read_u16()?;
            return Ok(Hmtx {
                advances: vec![advance; num_glyphs.max(1) as usize],
            });
        }

        bail_if!(
            number_of_h_metrics == 0,
            Error::MalformedTable {
                tag: HMTX,
                reason: "numberOfHMetrics is zero",
            }
        );

        let mut advances = Vec::with_capacity(num_glyphs.max(number_of_h_metrics) as usize);
        for _ in 0..number_of_h_metrics {
            advances.push(cursor.read_u16()?);
            cursor.skip(2)?; // lsb
        }

        // Glyphs past numberOfHMetrics reuse the last advance.
        let last = advances[advances.len() - 1];
        advances.resize(advances.len().max(num_glyphs as usize), last);

        Ok(Hmtx { advances })
    }

    pub fn advance(&self, glyph: u32) -> Option<u16> {
        self.advances.get(glyph as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.advances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advances.is_empty()
    }
}

/// Read `num_glyphs + 1` glyph offsets, scaling short offsets by two.
///
/// A table that ends early yields the offsets that are present.
pub fn parse_loca(data: &[u8], long_offsets: bool, num_glyphs: u16) -> Result<Vec<u32>, Error> {
    let entry_size = if long_offsets { 4 } else { 2 };
    let wanted = num_glyphs as usize + 1;
    let available = data.len() / entry_size;
    bail_if!(
        available < 2,
        Error::MalformedTable {
            tag: LOCA,
            reason: "fewer than two offsets",
        }
    );
    if available < wanted {
        warn!("loca has {available} entries, expected {wanted}");
    }

    let mut cursor = ByteCursor::new(data);
    let mut offsets = Vec::with_capacity(wanted.min(available));
    for _ in 0..wanted.min(available) {
        let offset = if long_offsets {
            cursor.read_u32()
        } else {
            cursor.read_u16().map(|offset| offset as u32 * 2)
        }
        .map_err(|err| err.in_table(LOCA))?;
        offsets.push(offset);
    }

    Ok(offsets)
}

/// The PostScript name (name ID 6), preferring the Windows Unicode record.
pub fn parse_postscript_name(data: &[u8]) -> Result<Option<String>, Error> {
    read_postscript_name(data).map_err(|err| err.in_table(NAME))
}

fn read_postscript_name(data: &[u8]) -> Result<Option<String>, Error> {
    const POSTSCRIPT_NAME_ID: u16 = 6;

    let mut cursor = ByteCursor::new(data);
    let _format = cursor.read_u16()?;
    let count = cursor.read_u16()?;
    let string_offset = cursor.read_u16()? as usize;

    let mut mac_name = None;
    for _ in 0..count {
        let platform = cursor.read_u16()?;
        let _encoding = cursor.read_u16()?;
        let _language = cursor.read_u16()?;
        let name_id = cursor.read_u16()?;
        let length = cursor.read_u16()? as usize;
        let offset = cursor.read_u16()? as usize;
        if name_id != POSTSCRIPT_NAME_ID {
            continue;
        }

        let Ok(bytes) = ByteCursor::at(data, string_offset + offset)
            .and_then(|mut cursor| cursor.read_bytes(length))
        else {
            warn!("PostScript name record for platform {platform} lies outside the name table");
            continue;
        };
        match platform {
            3 | 0 => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                return Ok(Some(String::from_utf16_lossy(&units)));
            }
            1 if mac_name.is_none() => mac_name = Some(PdfEncoding::MacRoman.decode(bytes)),
            _ => {}
        }
    }

    Ok(mac_name)
}

#[cfg(test)]
mod tests {
    use bytes::BufMut;
    use pretty_assertions::assert_eq;

    use super::*;

    fn head(units_per_em: u16, mac_style: u16, loc_format: i16) -> Vec<u8> {
        let mut out = vec![0u8; 18];
        out.put_u16(units_per_em);
        out.resize(36, 0);
        out.put_i16(-100);
        out.put_i16(-200);
        out.put_i16(900);
        out.put_i16(800);
        out.put_u16(mac_style);
        out.resize(50, 0);
        out.put_i16(loc_format);
        out.put_i16(0);
        out
    }

    #[test]
    fn head_fields() {
        let parsed = Head::parse(&head(2048, Head::MAC_STYLE_ITALIC, 1)).unwrap();
        assert_eq!(parsed.units_per_em, 2048);
        assert_eq!((parsed.x_min, parsed.y_max), (-100, 800));
        assert!(parsed.has_long_offsets());
        assert_eq!(parsed.mac_style, 2);
    }

    #[test]
    fn truncated_head_names_table() {
        let err = Head::parse(&head(1000, 0, 0)[..40]).unwrap_err();
        assert!(matches!(err, Error::MalformedTable { tag, .. } if tag == HEAD));
        assert!(Head::parse(&head(0, 0, 0)).is_err());
    }

    #[test]
    fn old_os2_has_no_cap_height() {
        let mut data = vec![0u8; 78];
        data[1] = 1;
        data[9] = 0x02;
        let os2 = Os2::parse(&data).unwrap();
        assert_eq!(os2.cap_height, None);
        assert!(!os2.allows_embedding());

        let mut data = vec![0u8; 96];
        data[1] = 2;
        data[88..90].copy_from_slice(&700i16.to_be_bytes());
        let os2 = Os2::parse(&data).unwrap();
        assert_eq!(os2.cap_height, Some(700));
        assert!(os2.allows_embedding());
    }

    #[test]
    fn short_os2_has_no_typo_metrics() {
        let mut data = vec![0u8; 68];
        data[2..4].copy_from_slice(&500i16.to_be_bytes());
        let os2 = Os2::parse(&data).unwrap();
        assert_eq!(os2.x_avg_char_width, 500);
        assert_eq!((os2.typo_ascender, os2.typo_descender), (0, 0));
        assert_eq!(os2.cap_height, None);

        assert!(Os2::parse(&data[..8]).is_err());
    }

    #[test]
    fn post_italic_angle_fraction() {
        let mut data = vec![0, 3, 0, 0];
        data.put_i16(-12);
        data.put_u16(0x2000);
        data.put_i16(-75);
        data.put_i16(50);
        data.put_u32(1);
        let post = Post::parse(&data).unwrap();
        assert_eq!(post.italic_angle, -11.5);
        assert_eq!(post.underline_position, -75);
        assert!(post.is_fixed_pitch);
    }

    #[test]
    fn hmtx_repeats_last_advance() {
        let mut data = vec![];
        for (advance, lsb) in [(500u16, 0i16), (600, 10)] {
            data.put_u16(advance);
            data.put_i16(lsb);
        }
        data.put_i16(5);
        data.put_i16(6);
        let hmtx = Hmtx::parse(&data, 2, 4).unwrap();
        assert_eq!(hmtx.len(), 4);
        assert_eq!(hmtx.advance(1), Some(600));
        assert_eq!(hmtx.advance(3), Some(600));
        assert_eq!(hmtx.advance(4), None);
    }

    #[test]
    fn monospaced_hmtx() {
        let hmtx = Hmtx::parse(&[0x02, 0x58, 0, 0], 1, 3).unwrap();
        assert_eq!(hmtx.len(), 3);
        assert_eq!(hmtx.advance(2), Some(600));
    }

    #[test]
    fn loca_formats() {
        let short = [0, 0, 0, 5, 0, 5, 0, 12];
        assert_eq!(parse_loca(&short, false, 3).unwrap(), vec![0, 10, 10, 24]);

        let mut long = vec![];
        for offset in [0u32, 100, 70000] {
            long.put_u32(offset);
        }
        assert_eq!(parse_loca(&long, true, 2).unwrap(), vec![0, 100, 70000]);
        assert_eq!(parse_loca(&long, true, 5).unwrap().len(), 3);
    }

    #[test]
    fn postscript_name_prefers_windows() {
        let mac = b"MacName";
        let windows: Vec<u8> = "WinName".encode_utf16().flat_map(u16::to_be_bytes).collect();

        let mut data = vec![];
        data.put_u16(0);
        data.put_u16(2);
        data.put_u16(6 + 2 * 12);
        for (platform, length, offset) in [(1u16, mac.len(), 0), (3, windows.len(), mac.len())] {
            data.put_u16(platform);
            data.put_u16(if platform == 3 { 1 } else { 0 });
            data.put_u16(0);
            data.put_u16(6);
            data.put_u16(length as u16);
            data.put_u16(offset as u16);
        }
        data.put_slice(mac);
        data.put_slice(&windows);

        assert_eq!(parse_postscript_name(&data).unwrap().as_deref(), Some("WinName"));
        // The Windows record points past the end, so the Mac record is used.
        assert_eq!(
            parse_postscript_name(&data[..6 + 24 + 7]).unwrap().as_deref(),
            Some("MacName")
        );
        assert_eq!(parse_postscript_name(&data[..6 + 24 + 3]).unwrap(), None);
        assert!(parse_postscript_name(&data[..20]).is_err());
    }
}
