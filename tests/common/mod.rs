//! A writer for small TrueType fonts with known contents.

#![allow(dead_code)]

use bytes::BufMut;
use font_types::Tag;
use pdfcodec::compute_checksum;

pub const NOTDEF: u16 = 0;
pub const SPACE: u16 = 1;
pub const A: u16 = 2;
pub const B: u16 = 3;
pub const C: u16 = 4;
pub const DIAERESIS: u16 = 5;
pub const A_DIAERESIS: u16 = 6;
pub const RING: u16 = 7;
pub const WIDE: u16 = 8;

const FLAG_ARG_1_AND_2_ARE_WORDS: u16 = 1 << 0;
const FLAG_MORE_COMPONENTS: u16 = 1 << 5;

/// A font description. [`FontBuilder::new`] gives a nine-glyph font where
/// `Ä` is a composite of `A`, the diaeresis and a ring.
#[derive(Clone)]
pub struct FontBuilder {
    pub units_per_em: u16,
    pub mac_style: u16,
    pub fs_type: u16,
    pub os2_version: u16,
    pub cap_height: i16,
    pub fixed_pitch: bool,
    pub long_loca: bool,
    /// Outline and advance width of each glyph.
    pub glyphs: Vec<(Vec<u8>, u16)>,
    /// Character code to glyph.
    pub cmap: Vec<(u16, u16)>,
    /// Write the cmap as a Windows Symbol subtable instead of Unicode.
    pub symbol: bool,
    pub name: Option<String>,
    pub omit: Vec<Tag>,
}

impl FontBuilder {
    pub fn new() -> Self {
        FontBuilder {
            units_per_em: 1000,
            mac_style: 0,
            fs_type: 0,
            os2_version: 2,
            cap_height: 700,
            fixed_pitch: false,
            long_loca: false,
            glyphs: vec![
                (simple_glyph(1), 500),
                (vec![], 250),
                (simple_glyph(2), 600),
                (simple_glyph(3), 650),
                (simple_glyph(4), 700),
                (simple_glyph(5), 300),
                (composite_glyph(&[A, DIAERESIS, RING]), 600),
                (simple_glyph(7), 300),
                (simple_glyph(8), 1000),
            ],
            cmap: vec![
                (0x20, SPACE),
                (0x41, A),
                (0x42, B),
                (0x43, C),
                (0xC4, A_DIAERESIS),
                (0x4E2D, WIDE),
            ],
            symbol: false,
            name: Some("Synthetic-Regular".to_string()),
            omit: vec![],
        }
    }

    pub fn without(mut self, tag: &[u8; 4]) -> Self {
        self.omit.push(Tag::new(tag));
        self
    }

    /// The font file.
    pub fn build(&self) -> Vec<u8> {
        self.build_at(0)
    }

    /// The font, with table offsets relative to a file in which it starts at `start`.
    pub fn build_at(&self, start: u32) -> Vec<u8> {
        let mut tables = self.tables();
        tables.retain(|(tag, _)| !self.omit.contains(tag));
        tables.sort_by_key(|(tag, _)| *tag);

        let num_tables = tables.len() as u16;
        let selector = (num_tables as u32).ilog2() as u16;
        let mut out = vec![];
        out.put_u32(0x0001_0000);
        out.put_u16(num_tables);
        out.put_u16((1 << selector) * 16);
        out.put_u16(selector);
        out.put_u16(num_tables * 16 - (1 << selector) * 16);

        let mut offset = start as usize + 12 + 16 * tables.len();
        for (tag, body) in &tables {
            out.put_slice(&tag.to_be_bytes());
            out.put_u32(compute_checksum(body));
            out.put_u32(offset as u32);
            out.put_u32(body.len() as u32);
            offset += round4(body.len());
        }
        for (_, body) in &tables {
            out.put_slice(body);
            out.resize(round4(out.len()), 0);
        }
        out
    }

    pub fn glyf_and_loca(&self) -> (Vec<u8>, Vec<u8>) {
        let mut glyf = vec![];
        let mut offsets = vec![0u32];
        for (outline, _) in &self.glyphs {
            glyf.put_slice(outline);
            glyf.resize(round4(glyf.len()), 0);
            offsets.push(glyf.len() as u32);
        }
        let mut loca = vec![];
        for offset in offsets {
            if self.long_loca {
                loca.put_u32(offset);
            } else {
                loca.put_u16((offset / 2) as u16);
            }
        }
        (glyf, loca)
    }

    fn tables(&self) -> Vec<(Tag, Vec<u8>)> {
        let (glyf, loca) = self.glyf_and_loca();
        let mut tables = vec![
            (Tag::new(b"head"), self.head()),
            (Tag::new(b"hhea"), self.hhea()),
            (Tag::new(b"maxp"), self.maxp()),
            (Tag::new(b"OS/2"), self.os2()),
            (Tag::new(b"hmtx"), self.hmtx()),
            (Tag::new(b"cmap"), self.cmap()),
            (Tag::new(b"post"), self.post()),
            (Tag::new(b"glyf"), glyf),
            (Tag::new(b"loca"), loca),
            (Tag::new(b"cvt "), vec![0, 10, 0, 20]),
            (Tag::new(b"fpgm"), vec![0xB0, 0x01, 0x2C]),
            (Tag::new(b"prep"), vec![0xB8, 0x01]),
        ];
        if let Some(name) = &self.name {
            tables.push((Tag::new(b"name"), name_table(name)));
        }
        tables
    }

    fn head(&self) -> Vec<u8> {
        let mut out = vec![];
        out.put_u32(0x0001_0000);
        out.put_u32(0x0001_0000); // fontRevision
        out.put_u32(0); // checkSumAdjustment
        out.put_u32(0x5F0F_3CF5);
        out.put_u16(0); // flags
        out.put_u16(self.units_per_em);
        out.put_bytes(0, 16); // created, modified
        out.put_i16(-50);
        out.put_i16(-200);
        out.put_i16(1000);
        out.put_i16(900);
        out.put_u16(self.mac_style);
        out.put_u16(8); // lowestRecPPEM
        out.put_i16(2); // fontDirectionHint
        out.put_i16(self.long_loca as i16);
        out.put_i16(0);
        out
    }

    fn hhea(&self) -> Vec<u8> {
        let mut out = vec![];
        out.put_u32(0x0001_0000);
        out.put_i16(850);
        out.put_i16(-250);
        out.put_i16(100);
        out.put_u16(self.glyphs.iter().map(|(_, w)| *w).max().unwrap_or(0));
        out.put_bytes(0, 6); // minLsb, minRsb, xMaxExtent
        out.put_i16(1); // caretSlopeRise
        out.put_i16(0); // caretSlopeRun
        out.put_bytes(0, 12);
        out.put_u16(self.glyphs.len() as u16);
        out
    }

    fn maxp(&self) -> Vec<u8> {
        let mut out = vec![];
        out.put_u32(0x0000_5000);
        out.put_u16(self.glyphs.len() as u16);
        out
    }

    fn os2(&self) -> Vec<u8> {
        let mut out = vec![];
        out.put_u16(self.os2_version);
        out.put_i16(550); // xAvgCharWidth
        out.put_u16(400); // usWeightClass
        out.put_u16(5); // usWidthClass
        out.put_u16(self.fs_type);
        out.resize(68, 0);
        if self.os2_version == 0 {
            // Early Apple fonts end the table here.
            return out;
        }
        out.put_i16(800); // sTypoAscender
        out.put_i16(-200); // sTypoDescender
        out.put_i16(90);
        out.put_u16(900); // usWinAscent
        out.put_u16(250); // usWinDescent
        out.resize(86, 0);
        if self.os2_version >= 2 {
            out.put_i16(500); // sxHeight
            out.put_i16(self.cap_height);
            out.put_bytes(0, 6);
        }
        out
    }

    fn hmtx(&self) -> Vec<u8> {
        let mut out = vec![];
        for (_, advance) in &self.glyphs {
            out.put_u16(*advance);
            out.put_i16(10);
        }
        out
    }

    fn post(&self) -> Vec<u8> {
        let mut out = vec![];
        out.put_u32(0x0003_0000);
        let italic_angle: i16 = if self.mac_style & 2 != 0 { -12 } else { 0 };
        out.put_i16(italic_angle);
        out.put_u16(0);
        out.put_i16(-100);
        out.put_i16(50);
        out.put_u32(self.fixed_pitch as u32);
        out.put_bytes(0, 16);
        out
    }

    fn cmap(&self) -> Vec<u8> {
        let mut mapping = self.cmap.clone();
        if self.symbol {
            for (code, _) in mapping.iter_mut() {
                *code = 0xF000 | (*code & 0xFF);
            }
        }
        mapping.sort();

        let seg_count = mapping.len() + 1;
        let mut subtable = vec![];
        subtable.put_u16(4);
        subtable.put_u16((16 + seg_count * 8) as u16);
        subtable.put_u16(0);
        subtable.put_u16(seg_count as u16 * 2);
        subtable.put_bytes(0, 6);
        for &(code, _) in &mapping {
            subtable.put_u16(code);
        }
        subtable.put_u16(0xFFFF);
        subtable.put_u16(0);
        for &(code, _) in &mapping {
            subtable.put_u16(code);
        }
        subtable.put_u16(0xFFFF);
        for &(code, glyph) in &mapping {
            subtable.put_u16(glyph.wrapping_sub(code));
        }
        subtable.put_u16(1);
        subtable.put_bytes(0, seg_count * 2);

        let mut out = vec![];
        out.put_u16(0);
        out.put_u16(1);
        out.put_u16(3);
        out.put_u16(if self.symbol { 0 } else { 1 });
        out.put_u32(12);
        out.put_slice(&subtable);
        out
    }
}

fn name_table(name: &str) -> Vec<u8> {
    let utf16: Vec<u8> = name.encode_utf16().flat_map(u16::to_be_bytes).collect();
    let mut out = vec![];
    out.put_u16(0);
    out.put_u16(1);
    out.put_u16(6 + 12);
    out.put_u16(3);
    out.put_u16(1);
    out.put_u16(0x409);
    out.put_u16(6);
    out.put_u16(utf16.len() as u16);
    out.put_u16(0);
    out.put_slice(&utf16);
    out
}

/// A simple one-contour glyph whose bounding box is filled with `marker`.
pub fn simple_glyph(marker: u8) -> Vec<u8> {
    let mut out = vec![];
    out.put_i16(1);
    out.put_bytes(marker, 8);
    out.put_u16(0); // endPtsOfContours
    out.put_u16(0); // instructionLength
    out.put_u8(0x37);
    out.put_u8(10);
    out.put_u8(10);
    out
}

pub fn composite_glyph(components: &[u16]) -> Vec<u8> {
    let mut out = vec![];
    out.put_i16(-1);
    out.put_bytes(0, 8);
    for (i, &glyph) in components.iter().enumerate() {
        let more = if i + 1 < components.len() {
            FLAG_MORE_COMPONENTS
        } else {
            0
        };
        out.put_u16(FLAG_ARG_1_AND_2_ARE_WORDS | more);
        out.put_u16(glyph);
        out.put_i16(0);
        out.put_i16(i as i16 * 100);
    }
    out
}

/// A TrueType collection holding `fonts` in order.
pub fn collection(fonts: &[FontBuilder]) -> Vec<u8> {
    let mut out = vec![];
    out.put_slice(b"ttcf");
    out.put_u32(0x0001_0000);
    out.put_u32(fonts.len() as u32);
    let header_len = 12 + 4 * fonts.len();
    out.resize(header_len, 0);

    for (i, font) in fonts.iter().enumerate() {
        let start = out.len();
        out[12 + 4 * i..16 + 4 * i].copy_from_slice(&(start as u32).to_be_bytes());
        out.extend_from_slice(&font.build_at(start as u32));
        out.resize(round4(out.len()), 0);
    }
    out
}

/// Glyph ids whose outline in a `glyf`/`loca` pair is not empty.
pub fn glyphs_with_outlines(font: &[u8]) -> Vec<u32> {
    use pdfcodec::truetype::{TableDirectory, tables};

    let directory = TableDirectory::parse(font).unwrap();
    let table = |tag: &[u8; 4]| {
        let record = directory.get(Tag::new(tag)).unwrap();
        &font[record.offset as usize..][..record.length as usize]
    };
    let head = tables::Head::parse(table(b"head")).unwrap();
    let num_glyphs = tables::parse_num_glyphs(table(b"maxp")).unwrap();
    let offsets = tables::parse_loca(table(b"loca"), head.has_long_offsets(), num_glyphs).unwrap();

    offsets
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[1] > pair[0])
        .map(|(glyph, _)| glyph as u32)
        .collect()
}

fn round4(value: usize) -> usize {
    (value + 3) & !3
}
