//! PDF stream filters.
//!
//! A [`Stream`] carries its payload together with the names of the filters
//! applied to it, in the order a reader has to undo them. [`decode`] walks
//! that chain front to back; [`encode`] applies new filters and prepends
//! their names, so the most recently applied filter is always first.

mod ascii_85;
mod ascii_hex;
mod flate;
mod predictor;
mod run_length;

use log::{debug, warn};

use crate::error::Error;

pub const ASCII_HEX_DECODE: &str = "ASCIIHexDecode";
pub const ASCII_HEX_DECODE_ABBREVIATION: &str = "AHx";
pub const ASCII85_DECODE: &str = "ASCII85Decode";
pub const ASCII85_DECODE_ABBREVIATION: &str = "A85";
pub const FLATE_DECODE: &str = "FlateDecode";
pub const FLATE_DECODE_ABBREVIATION: &str = "Fl";
pub const RUN_LENGTH_DECODE: &str = "RunLengthDecode";
pub const RUN_LENGTH_DECODE_ABBREVIATION: &str = "RL";

/// Flate compression level used when the caller has no preference.
pub const DEFAULT_COMPRESSION: u32 = 6;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Filter {
    AsciiHexDecode,
    Ascii85Decode,
    FlateDecode,
    RunLengthDecode,
}

impl Filter {
    /// Resolve a filter name, accepting the abbreviations allowed in inline images.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            ASCII_HEX_DECODE | ASCII_HEX_DECODE_ABBREVIATION => Ok(Filter::AsciiHexDecode),
            ASCII85_DECODE | ASCII85_DECODE_ABBREVIATION => Ok(Filter::Ascii85Decode),
            FLATE_DECODE | FLATE_DECODE_ABBREVIATION => Ok(Filter::FlateDecode),
            RUN_LENGTH_DECODE | RUN_LENGTH_DECODE_ABBREVIATION => Ok(Filter::RunLengthDecode),
            _ => {
                warn!("unknown filter: {name}");

                Err(Error::UnsupportedFilter(name.to_string()))
            }
        }
    }

    /// The name written into a stream's `/Filter` entry.
    pub fn name(&self) -> &'static str {
        match self {
            Filter::AsciiHexDecode => ASCII_HEX_DECODE,
            Filter::Ascii85Decode => ASCII85_DECODE,
            Filter::FlateDecode => FLATE_DECODE,
            Filter::RunLengthDecode => RUN_LENGTH_DECODE,
        }
    }

    pub fn decode(&self, data: &[u8], params: Option<&DecodeParams>) -> Result<Vec<u8>, Error> {
        match self {
            Filter::AsciiHexDecode => ascii_hex::decode(data),
            Filter::Ascii85Decode => ascii_85::decode(data),
            Filter::FlateDecode => flate::decode(data, params),
            Filter::RunLengthDecode => run_length::decode(data),
        }
    }

    pub fn encode(&self, data: &[u8], compression_level: u32) -> Result<Vec<u8>, Error> {
        match self {
            Filter::AsciiHexDecode => Ok(ascii_hex::encode(data)),
            Filter::Ascii85Decode => Ok(ascii_85::encode(data)),
            Filter::FlateDecode => flate::encode(data, compression_level),
            Filter::RunLengthDecode => Ok(run_length::encode(data)),
        }
    }
}

/// The `/DecodeParms` entries understood by the Flate predictor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecodeParams {
    /// 1 for none, 2 for the TIFF predictor, 10..=15 for PNG predictors.
    pub predictor: u8,
    pub colors: u8,
    pub bits_per_component: u8,
    pub columns: usize,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
        }
    }
}

impl DecodeParams {
    /// PNG row prediction over single-byte samples, `columns` per row.
    pub fn png(columns: usize) -> Self {
        Self {
            predictor: 15,
            columns,
            ..Self::default()
        }
    }

    fn bits_per_pixel(&self) -> usize {
        self.bits_per_component as usize * self.colors as usize
    }

    /// Distance in bytes to the corresponding byte of the pixel on the left.
    pub(crate) fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel().div_ceil(8).max(1)
    }

    /// Bytes per row, excluding a PNG tag byte.
    pub(crate) fn row_length(&self) -> Result<usize, Error> {
        self.columns
            .checked_mul(self.bits_per_pixel())
            .map(|bits| bits.div_ceil(8))
            .ok_or(Error::filter(FLATE_DECODE, "predictor row too long"))
    }
}

/// A stream payload together with its filter chain.
///
/// `filters` holds the `/Filter` entry: one name for a single filter, several
/// for an array. `decode_params[i]` belongs to `filters[i]`; missing trailing
/// entries mean "no parameters".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stream {
    pub data: Vec<u8>,
    pub filters: Vec<String>,
    pub decode_params: Vec<Option<DecodeParams>>,
}

impl Stream {
    /// An unfiltered stream.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// A stream whose data has already been passed through `filters`,
    /// listed in decode order.
    pub fn with_filters<I, S>(data: Vec<u8>, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            data,
            filters: filters.into_iter().map(Into::into).collect(),
            decode_params: Vec::new(),
        }
    }

    pub fn with_decode_params(mut self, index: usize, params: DecodeParams) -> Self {
        if self.decode_params.len() <= index {
            self.decode_params.resize(index + 1, None);
        }
        self.decode_params[index] = Some(params);
        self
    }

    pub fn params_for(&self, index: usize) -> Option<&DecodeParams> {
        self.decode_params.get(index).and_then(Option::as_ref)
    }

    pub fn is_filtered(&self) -> bool {
        !self.filters.is_empty()
    }
}

/// Undo every filter of `stream`, in the order the names are listed.
pub fn decode(stream: &Stream) -> Result<Vec<u8>, Error> {
    if !stream.is_filtered() {
        return Ok(stream.data.clone());
    }

    debug!("decoding stream through {:?}", stream.filters);

    let mut data = stream.data.clone();
    for (index, name) in stream.filters.iter().enumerate() {
        let filter = Filter::from_name(name)?;
        data = filter.decode(&data, stream.params_for(index))?;
    }

    Ok(data)
}

/// Apply `filters` to `stream` in list order and record them in its metadata.
///
/// With an empty `filters` list and `add_default_if_absent` set, the stream
/// is Flate-compressed.
pub fn encode(
    stream: &mut Stream,
    filters: &[Filter],
    add_default_if_absent: bool,
    compression_level: u32,
) -> Result<(), Error> {
    let default = [Filter::FlateDecode];
    let filters = if filters.is_empty() && add_default_if_absent {
        &default[..]
    } else {
        filters
    };

    for filter in filters {
        stream.data = filter.encode(&stream.data, compression_level)?;
        stream.filters.insert(0, filter.name().to_string());
        if !stream.decode_params.is_empty() {
            stream.decode_params.insert(0, None);
        }
    }

    Ok(())
}

/// PDF white-space characters.
pub(crate) fn is_white_space_character(byte: u8) -> bool {
    matches!(byte, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}
