use crate::error::{Error, bail_if};
use crate::filter::{ASCII_HEX_DECODE, is_white_space_character};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

pub(crate) fn decode(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut decoded = Vec::with_capacity(data.len() / 2);
    let mut high_nibble: Option<u8> = None;
    let mut rest: Option<&[u8]> = None;

    for (i, &byte) in data.iter().enumerate() {
        match byte {
            b'>' => {
                rest = Some(&data[i + 1..]);
                break;
            }
            b if is_white_space_character(b) => {}
            b => {
                let value =
                    val(b).ok_or(Error::filter(ASCII_HEX_DECODE, "illegal character"))?;
                match high_nibble.take() {
                    Some(high) => decoded.push(high << 4 | value),
                    None => high_nibble = Some(value),
                }
            }
        }
    }

    let Some(rest) = rest else {
        return Err(Error::filter(ASCII_HEX_DECODE, "missing > terminator"));
    };
    bail_if!(
        !rest.iter().all(|&b| is_white_space_character(b)),
        Error::filter(ASCII_HEX_DECODE, "data after > terminator")
    );

    // An odd final digit behaves as if followed by 0.
    if let Some(high) = high_nibble {
        decoded.push(high << 4);
    }

    Ok(decoded)
}

pub(crate) fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 2 + 1);
    for &byte in data {
        out.push(HEX_DIGITS[(byte >> 4) as usize]);
        out.push(HEX_DIGITS[(byte & 0x0F) as usize]);
    }
    out.push(b'>');
    out
}

fn val(c: u8) -> Option<u8> {
    match c {
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'0'..=b'9' => Some(c - b'0'),
        _ => None,
    }
}
