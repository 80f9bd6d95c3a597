/* Copyright 2014 Google Inc. All Rights Reserved.

   Distributed under MIT license.
   See file LICENSE for detail or copy at https://opensource.org/licenses/MIT
*/

//! Font table tags

use font_types::Tag;

pub const CMAP: Tag = Tag::new(b"cmap");
pub const CVT: Tag = Tag::new(b"cvt ");
pub const FPGM: Tag = Tag::new(b"fpgm");
pub const GLYF: Tag = Tag::new(b"glyf");
pub const HEAD: Tag = Tag::new(b"head");
pub const HHEA: Tag = Tag::new(b"hhea");
pub const HMTX: Tag = Tag::new(b"hmtx");
pub const LOCA: Tag = Tag::new(b"loca");
pub const MAXP: Tag = Tag::new(b"maxp");
pub const NAME: Tag = Tag::new(b"name");
pub const OS2: Tag = Tag::new(b"OS/2");
pub const POST: Tag = Tag::new(b"post");
pub const PREP: Tag = Tag::new(b"prep");

pub const TTC_TAG: Tag = Tag::new(b"ttcf");
pub const OTTO_TAG: Tag = Tag::new(b"OTTO");
pub const TRUE_TAG: Tag = Tag::new(b"true");

/// Tables every loadable font must carry.
pub static REQUIRED_TABLES: [Tag; 6] = [HEAD, HHEA, OS2, LOCA, HMTX, MAXP];

/// Tables written into a CID (Type 0) font program. The PDF CIDToGIDMap
/// addresses glyphs directly, so no cmap is needed.
pub static CID_FONT_TABLES: [Tag; 9] = [CVT, FPGM, GLYF, HEAD, HHEA, HMTX, LOCA, MAXP, PREP];

/// Tables written into a simple TrueType font program.
pub static SIMPLE_FONT_TABLES: [Tag; 10] =
    [CMAP, CVT, FPGM, GLYF, HEAD, HHEA, HMTX, LOCA, MAXP, PREP];

/// Tables written when the whole font is embedded.
pub static FULL_FONT_TABLES: [Tag; 12] = [
    OS2, CMAP, CVT, FPGM, GLYF, HEAD, HHEA, HMTX, LOCA, MAXP, NAME, PREP,
];

/// `entrySelector` (floor(log2(n))) for a table directory of `n` tables.
pub static ENTRY_SELECTORS: [u16; 21] = [
    0, 0, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3, 3, 3, 4, 4, 4, 4, 4,
];
