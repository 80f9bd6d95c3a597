//! A codec for ASCII-85-encoded streams.

use arrayvec::ArrayVec;

use crate::error::{Error, bail, bail_if};
use crate::filter::{ASCII85_DECODE, is_white_space_character};

const FIRST_DIGIT: u8 = b'!';
const LAST_DIGIT: u8 = b'u';

/// Decode a ASCII-85-encoded stream.
pub(crate) fn decode(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut decoded = Vec::with_capacity(data.len() / 5 * 4 + 4);
    let mut group: ArrayVec<u8, 5> = ArrayVec::new();
    let mut bytes = data.iter().copied();
    let mut terminated = false;

    while let Some(byte) = bytes.next() {
        match byte {
            b'~' => {
                bail_if!(
                    bytes.next() != Some(b'>'),
                    Error::filter(ASCII85_DECODE, "malformed ~> terminator")
                );
                terminated = true;
                break;
            }
            b'z' => {
                bail_if!(
                    !group.is_empty(),
                    Error::filter(ASCII85_DECODE, "z inside a group")
                );
                decoded.extend_from_slice(&[0; 4]);
            }
            FIRST_DIGIT..=LAST_DIGIT => {
                group.push(byte - FIRST_DIGIT);
                if group.is_full() {
                    decoded.extend_from_slice(&word_85(&group)?);
                    group.clear();
                }
            }
            b if is_white_space_character(b) => {}
            _ => bail!(Error::filter(ASCII85_DECODE, "illegal character")),
        }
    }

    bail_if!(
        !terminated,
        Error::filter(ASCII85_DECODE, "missing ~> terminator")
    );

    match group.len() {
        0 => {}
        1 => bail!(Error::filter(ASCII85_DECODE, "dangling final character")),
        len => {
            // Pad with the highest digit; only the first len - 1 bytes are meaningful.
            while !group.is_full() {
                group.push(LAST_DIGIT - FIRST_DIGIT);
            }
            decoded.extend_from_slice(&word_85(&group)?[..len - 1]);
        }
    }

    Ok(decoded)
}

fn word_85(digits: &[u8]) -> Result<[u8; 4], Error> {
    let value = digits
        .iter()
        .fold(0u64, |acc, &digit| acc * 85 + digit as u64);
    // 85^5 > 256^4, the result might not fit in an u32.
    let value = u32::try_from(value)
        .map_err(|_| Error::filter(ASCII85_DECODE, "group value out of range"))?;
    Ok(value.to_be_bytes())
}

/// Encode `data`, writing `z` for all-zero groups and terminating with `~>`.
pub(crate) fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 4 * 5 + 7);

    for chunk in data.chunks(4) {
        if chunk == [0; 4] {
            out.push(b'z');
            continue;
        }

        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        let digits = digits_85(u32::from_be_bytes(word));
        // A partial group of n bytes needs only n + 1 digits.
        out.extend_from_slice(&digits[..chunk.len() + 1]);
    }

    out.extend_from_slice(b"~>");
    out
}

fn digits_85(mut value: u32) -> [u8; 5] {
    let mut digits = [0u8; 5];
    for digit in digits.iter_mut().rev() {
        *digit = (value % 85) as u8 + FIRST_DIGIT;
        value /= 85;
    }
    digits
}
