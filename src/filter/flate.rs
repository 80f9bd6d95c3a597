use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;

use crate::error::Error;
use crate::filter::{DecodeParams, FLATE_DECODE, predictor};

pub(crate) fn decode(data: &[u8], params: Option<&DecodeParams>) -> Result<Vec<u8>, Error> {
    // Some writers omit the zlib header, so fall back to a raw deflate stream.
    let inflated = zlib(data)
        .or_else(|| deflate(data))
        .ok_or(Error::filter(FLATE_DECODE, "invalid deflate data"))?;

    match params {
        Some(params) => predictor::apply(inflated, params),
        None => Ok(inflated),
    }
}

pub(crate) fn encode(data: &[u8], compression_level: u32) -> Result<Vec<u8>, Error> {
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(data.len() / 2),
        Compression::new(compression_level.min(9)),
    );
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zlib(data: &[u8]) -> Option<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len() * 2);
    ZlibDecoder::new(data).read_to_end(&mut output).ok()?;
    Some(output)
}

fn deflate(data: &[u8]) -> Option<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len() * 2);
    DeflateDecoder::new(data).read_to_end(&mut output).ok()?;
    Some(output)
}
