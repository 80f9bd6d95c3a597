//! Binary codecs behind a PDF writer: stream filters and TrueType font subsetting.
//!
//! The [`filter`] module decodes and encodes stream data for the `FlateDecode`
//! (with PNG and TIFF predictors), `RunLengthDecode`, `ASCII85Decode` and
//! `ASCIIHexDecode` filters. The [`truetype`] module loads TrueType fonts and
//! TrueType collections, exposes their metrics in PDF glyph space and writes
//! the embeddable font program, either complete or restricted to the glyphs a
//! document actually used.

#![allow(clippy::needless_range_loop)]

pub mod buffer;
pub mod encoding;
pub mod error;
pub mod filter;
pub mod source;
pub mod table_tags;
pub mod truetype;

pub use encoding::PdfEncoding;
pub use error::{Error, ErrorKind};
pub use filter::{DecodeParams, Filter, Stream};
pub use truetype::{EmbeddingPolicy, FontKind, FontMetrics, TrueTypeFont};

// Round a value up to the nearest multiple of 4. Don't round the value in the
// case that rounding up overflows.
//
// Implemented as a macro to make it generic over the type without horrible type bounds
macro_rules! Round4 {
    ($value:expr) => {
        match $value.checked_add(3) {
            Some(value_plus_3) => value_plus_3 & !3,
            None => $value,
        }
    };
}
pub(crate) use Round4;

/// Compute the sfnt checksum of `buf`: the wrapping sum of its big-endian
/// 32-bit words, with a trailing partial word padded with zeroes.
pub fn compute_checksum(buf: &[u8]) -> u32 {
    let mut checksum: u32 = 0;
    let mut iter = buf.chunks_exact(4);
    for chunk in &mut iter {
        checksum = checksum.wrapping_add(u32::from_be_bytes([
            chunk[0], chunk[1], chunk[2], chunk[3],
        ]));
    }

    let remainder = iter.remainder();
    match *remainder {
        [a, b, c] => {
            checksum = checksum.wrapping_add(u32::from_be_bytes([a, b, c, 0]));
        }
        [a, b] => {
            checksum = checksum.wrapping_add(u32::from_be_bytes([a, b, 0, 0]));
        }
        [a] => {
            checksum = checksum.wrapping_add(u32::from_be_bytes([a, 0, 0, 0]));
        }
        [] => {}
        _ => unreachable!("chunk size was 4 so remainder will be a slice of length 3 or smaller"),
    };

    checksum
}
