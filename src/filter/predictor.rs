//! Undoing the PNG and TIFF row predictors applied before Flate compression.

use crate::error::{Error, bail, bail_if};
use crate::filter::{DecodeParams, FLATE_DECODE};

const PNG_NONE: u8 = 0;
const PNG_SUB: u8 = 1;
const PNG_UP: u8 = 2;
const PNG_AVERAGE: u8 = 3;
const PNG_PAETH: u8 = 4;

pub(crate) fn apply(data: Vec<u8>, params: &DecodeParams) -> Result<Vec<u8>, Error> {
    match params.predictor {
        1 => Ok(data),
        2 => tiff(data, params),
        10..=15 => png(&data, params),
        predictor => Err(Error::UnsupportedPredictor {
            predictor,
            bits_per_component: params.bits_per_component,
        }),
    }
}

/// Every PNG row starts with a tag byte naming the filter used for that row,
/// so the encoder's predictor number (10..=15) does not matter here.
fn png(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>, Error> {
    let bpp = params.bytes_per_pixel();
    let row_length = params.row_length()?;
    bail_if!(row_length == 0, Error::filter(FLATE_DECODE, "predictor row is empty"));
    bail_if!(
        row_length >= data.len(),
        Error::filter(FLATE_DECODE, "predictor row too long")
    );

    let stride = row_length + 1;
    bail_if!(
        data.len() % stride != 0,
        Error::filter(FLATE_DECODE, "incomplete predictor row")
    );

    let mut out = Vec::with_capacity(data.len() / stride * row_length);
    let mut prior = vec![0u8; row_length];

    for row in data.chunks_exact(stride) {
        let (tag, encoded) = (row[0], &row[1..]);
        let mut current = encoded.to_vec();

        match tag {
            PNG_NONE => {}
            PNG_SUB => {
                for i in bpp..row_length {
                    current[i] = current[i].wrapping_add(current[i - bpp]);
                }
            }
            PNG_UP => {
                for i in 0..row_length {
                    current[i] = current[i].wrapping_add(prior[i]);
                }
            }
            PNG_AVERAGE => {
                for i in 0..row_length {
                    let left = if i >= bpp { current[i - bpp] } else { 0 };
                    let average = (left as u16 + prior[i] as u16) / 2;
                    current[i] = current[i].wrapping_add(average as u8);
                }
            }
            PNG_PAETH => {
                for i in 0..row_length {
                    let (left, upper_left) = if i >= bpp {
                        (current[i - bpp], prior[i - bpp])
                    } else {
                        (0, 0)
                    };
                    current[i] = current[i].wrapping_add(paeth(left, prior[i], upper_left));
                }
            }
            _ => bail!(Error::filter(FLATE_DECODE, "unknown PNG predictor tag")),
        }

        out.extend_from_slice(&current);
        prior = current;
    }

    Ok(out)
}

/// Pick whichever neighbour is closest to `a + b - c`, preferring a, then b, then c.
fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

fn tiff(mut data: Vec<u8>, params: &DecodeParams) -> Result<Vec<u8>, Error> {
    bail_if!(
        params.bits_per_component != 8,
        Error::UnsupportedPredictor {
            predictor: params.predictor,
            bits_per_component: params.bits_per_component,
        }
    );

    let bpp = params.bytes_per_pixel();
    let row_length = params.row_length()?;
    bail_if!(row_length == 0, Error::filter(FLATE_DECODE, "predictor row is empty"));
    bail_if!(
        row_length > data.len(),
        Error::filter(FLATE_DECODE, "predictor row too long")
    );
    bail_if!(
        data.len() % row_length != 0,
        Error::filter(FLATE_DECODE, "incomplete predictor row")
    );

    for row in data.chunks_exact_mut(row_length) {
        for i in bpp..row_length {
            row[i] = row[i].wrapping_add(row[i - bpp]);
        }
    }

    Ok(data)
}
