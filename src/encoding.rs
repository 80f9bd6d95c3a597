//! Text encodings used to turn strings into content-stream bytes.

/// The encodings a font can be written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PdfEncoding {
    /// `WinAnsiEncoding`, Windows code page 1252.
    WinAnsi,
    /// `MacRomanEncoding`.
    MacRoman,
    /// Bytes are glyph codes of a symbolic font; only the low byte of a character is kept.
    FontSpecific,
    /// `Identity-H`: two bytes per code, big-endian.
    IdentityH,
}

// Code points for 0x80..=0x9F in WinAnsiEncoding. 0 marks an unused code.
#[rustfmt::skip]
static WIN_ANSI_HIGH: [u16; 32] = [
    0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021,
    0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0, 0x017D, 0,
    0, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014,
    0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0, 0x017E, 0x0178,
];

// Code points for 0x80..=0xFF in MacRomanEncoding.
#[rustfmt::skip]
static MAC_ROMAN_HIGH: [u16; 128] = [
    0x00C4, 0x00C5, 0x00C7, 0x00C9, 0x00D1, 0x00D6, 0x00DC, 0x00E1,
    0x00E0, 0x00E2, 0x00E4, 0x00E3, 0x00E5, 0x00E7, 0x00E9, 0x00E8,
    0x00EA, 0x00EB, 0x00ED, 0x00EC, 0x00EE, 0x00EF, 0x00F1, 0x00F3,
    0x00F2, 0x00F4, 0x00F6, 0x00F5, 0x00FA, 0x00F9, 0x00FB, 0x00FC,
    0x2020, 0x00B0, 0x00A2, 0x00A3, 0x00A7, 0x2022, 0x00B6, 0x00DF,
    0x00AE, 0x00A9, 0x2122, 0x00B4, 0x00A8, 0x2260, 0x00C6, 0x00D8,
    0x221E, 0x00B1, 0x2264, 0x2265, 0x00A5, 0x00B5, 0x2202, 0x2211,
    0x220F, 0x03C0, 0x222B, 0x00AA, 0x00BA, 0x03A9, 0x00E6, 0x00F8,
    0x00BF, 0x00A1, 0x00AC, 0x221A, 0x0192, 0x2248, 0x2206, 0x00AB,
    0x00BB, 0x2026, 0x00A0, 0x00C0, 0x00C3, 0x00D5, 0x0152, 0x0153,
    0x2013, 0x2014, 0x201C, 0x201D, 0x2018, 0x2019, 0x00F7, 0x25CA,
    0x00FF, 0x0178, 0x2044, 0x20AC, 0x2039, 0x203A, 0xFB01, 0xFB02,
    0x2021, 0x00B7, 0x201A, 0x201E, 0x2030, 0x00C2, 0x00CA, 0x00C1,
    0x00CB, 0x00C8, 0x00CD, 0x00CE, 0x00CF, 0x00CC, 0x00D3, 0x00D4,
    0xF8FF, 0x00D2, 0x00DA, 0x00DB, 0x00D9, 0x0131, 0x02C6, 0x02DC,
    0x00AF, 0x02D8, 0x02D9, 0x02DA, 0x00B8, 0x02DD, 0x02DB, 0x02C7,
];

impl PdfEncoding {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "WinAnsiEncoding" | "Cp1252" => Some(PdfEncoding::WinAnsi),
            "MacRomanEncoding" | "MacRoman" => Some(PdfEncoding::MacRoman),
            "FontSpecific" => Some(PdfEncoding::FontSpecific),
            "Identity-H" => Some(PdfEncoding::IdentityH),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PdfEncoding::WinAnsi => "WinAnsiEncoding",
            PdfEncoding::MacRoman => "MacRomanEncoding",
            PdfEncoding::FontSpecific => "FontSpecific",
            PdfEncoding::IdentityH => "Identity-H",
        }
    }

    pub fn is_single_byte(&self) -> bool {
        !matches!(self, PdfEncoding::IdentityH)
    }

    /// The Unicode code point of a single-byte code, if the code is mapped.
    pub fn to_unicode(&self, code: u8) -> Option<char> {
        let code_point = match (self, code) {
            (PdfEncoding::WinAnsi, 0x80..=0x9F) => WIN_ANSI_HIGH[(code - 0x80) as usize] as u32,
            (PdfEncoding::MacRoman, 0x80..=0xFF) => MAC_ROMAN_HIGH[(code - 0x80) as usize] as u32,
            _ => code as u32,
        };
        match code_point {
            0 if code != 0 => None,
            code_point => char::from_u32(code_point),
        }
    }

    /// The single-byte code for `c`, if this encoding can represent it.
    pub fn to_code(&self, c: char) -> Option<u8> {
        let code_point = c as u32;
        match self {
            PdfEncoding::FontSpecific => Some(code_point as u8),
            PdfEncoding::IdentityH => None,
            PdfEncoding::WinAnsi => match code_point {
                0..=0x7F | 0xA0..=0xFF => Some(code_point as u8),
                _ => position(&WIN_ANSI_HIGH, code_point),
            },
            PdfEncoding::MacRoman => match code_point {
                0..=0x7F => Some(code_point as u8),
                _ => position(&MAC_ROMAN_HIGH, code_point),
            },
        }
    }

    /// Encode `text`. Characters the encoding cannot represent are dropped.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            PdfEncoding::IdentityH => text
                .encode_utf16()
                .flat_map(|unit| unit.to_be_bytes())
                .collect(),
            _ => text.chars().filter_map(|c| self.to_code(c)).collect(),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            PdfEncoding::IdentityH => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            _ => bytes.iter().filter_map(|&b| self.to_unicode(b)).collect(),
        }
    }
}

fn position(table: &[u16], code_point: u32) -> Option<u8> {
    if code_point == 0 || code_point > u16::MAX as u32 {
        return None;
    }
    table
        .iter()
        .position(|&entry| entry as u32 == code_point)
        .map(|index| 0x80 + index as u8)
}
