use log::warn;

use crate::buffer::ByteCursor;
use crate::error::Error;
use crate::filter::{RUN_LENGTH_DECODE, is_white_space_character};

const END_OF_DATA: u8 = 128;
const MAX_RUN: usize = 128;

pub(crate) fn decode(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut reader = ByteCursor::new(data);
    let mut decoded = vec![];

    loop {
        let Ok(length) = reader.read_u8() else {
            warn!("run-length stream has no end-of-data marker");
            return Ok(decoded);
        };

        match length {
            END_OF_DATA => break,
            0..=127 => {
                let literal = reader
                    .read_bytes(length as usize + 1)
                    .map_err(|_| Error::filter(RUN_LENGTH_DECODE, "truncated literal run"))?;
                decoded.extend_from_slice(literal);
            }
            _ => {
                let byte = reader
                    .read_u8()
                    .map_err(|_| Error::filter(RUN_LENGTH_DECODE, "truncated repeat run"))?;
                decoded.resize(decoded.len() + 257 - length as usize, byte);
            }
        }
    }

    if !reader.remaining_slice().iter().all(|&b| is_white_space_character(b)) {
        warn!("ignoring data after run-length end-of-data marker");
    }

    Ok(decoded)
}

/// Encode `data` as alternating literal and repeat runs, each at most 128 bytes long.
pub(crate) fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / MAX_RUN + 2);
    let mut literal_start = 0;
    let mut i = 0;

    while i < data.len() {
        let run = data[i..]
            .iter()
            .take(MAX_RUN)
            .take_while(|&&b| b == data[i])
            .count();

        if run >= 2 {
            flush_literal(&data[literal_start..i], &mut out);
            out.push((257 - run) as u8);
            out.push(data[i]);
            i += run;
            literal_start = i;
        } else {
            i += 1;
            if i - literal_start == MAX_RUN {
                flush_literal(&data[literal_start..i], &mut out);
                literal_start = i;
            }
        }
    }

    flush_literal(&data[literal_start..], &mut out);
    out.push(END_OF_DATA);
    out
}

fn flush_literal(literal: &[u8], out: &mut Vec<u8>) {
    if !literal.is_empty() {
        out.push((literal.len() - 1) as u8);
        out.extend_from_slice(literal);
    }
}
