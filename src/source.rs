//! Owned access to the bytes of a font program.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Error, bail_if, usize_will_overflow};

/// Where a font's bytes live.
///
/// A file-backed source keeps its handle open for as long as the source is
/// alive and closes it when dropped. Reads go through `&File`, so callers
/// only need a shared borrow to re-read a table.
pub enum FontSource {
    File { file: File, len: u64 },
    Memory(Vec<u8>),
}

impl FontSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(FontSource::File { file, len })
    }

    pub fn len(&self) -> u64 {
        match self {
            FontSource::File { len, .. } => *len,
            FontSource::Memory(data) => data.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read `length` bytes starting at `offset`.
    pub fn read_range(&self, offset: u32, length: u32) -> Result<Vec<u8>, Error> {
        let (start, length) = (offset as usize, length as usize);
        bail_if!(
            usize_will_overflow(start, length) || (start + length) as u64 > self.len(),
            Error::Truncated
        );

        match self {
            FontSource::File { file, .. } => {
                let mut reader = file;
                reader.seek(SeekFrom::Start(start as u64))?;
                let mut out = vec![0; length];
                reader.read_exact(&mut out)?;
                Ok(out)
            }
            FontSource::Memory(data) => Ok(data[start..start + length].to_vec()),
        }
    }
}

impl From<Vec<u8>> for FontSource {
    fn from(data: Vec<u8>) -> Self {
        FontSource::Memory(data)
    }
}
