/* Copyright 2013 Google Inc. All Rights Reserved.

   Distributed under MIT license.
   See file LICENSE for detail or copy at https://opensource.org/licenses/MIT
*/

//! Bounds-checked big-endian reads over a byte slice with an explicit offset.

use font_types::Tag;

use crate::error::{Error, bail_if, usize_will_overflow};

/// A read position over borrowed font data.
///
/// Every read checks bounds and advances the offset only on success, so a
/// failed read leaves the cursor where it was. Random access is done by
/// creating a cursor [`at`](ByteCursor::at) an offset or by [`seek`](ByteCursor::seek)ing.
#[derive(Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl bytes::Buf for ByteCursor<'_> {
    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    fn chunk(&self) -> &[u8] {
        self.remaining_slice()
    }

    fn advance(&mut self, cnt: usize) {
        if self.skip(cnt).is_err() {
            panic!("Tried to advance past the end of the buffer");
        }
    }
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteCursor { data, offset: 0 }
    }

    /// A cursor over `data` positioned at `offset`.
    pub fn at(data: &'a [u8], offset: usize) -> Result<Self, Error> {
        bail_if!(offset > data.len(), Error::Truncated);
        Ok(ByteCursor { data, offset })
    }

    pub fn seek(&mut self, offset: usize) -> Result<(), Error> {
        bail_if!(offset > self.data.len(), Error::Truncated);
        self.offset = offset;
        Ok(())
    }

    pub fn skip(&mut self, n_bytes: usize) -> Result<(), Error> {
        bail_if!(
            usize_will_overflow(self.offset, n_bytes) || self.offset + n_bytes > self.data.len(),
            Error::Truncated
        );
        self.offset += n_bytes;
        Ok(())
    }

    pub fn read_bytes(&mut self, n_bytes: usize) -> Result<&'a [u8], Error> {
        bail_if!(
            usize_will_overflow(self.offset, n_bytes) || self.offset + n_bytes > self.data.len(),
            Error::Truncated
        );
        let bytes = &self.data[self.offset..self.offset + n_bytes];
        self.offset += n_bytes;
        Ok(bytes)
    }

    #[inline(always)]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut array = [0; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.read_array::<1>()?[0])
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16, Error> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    #[inline]
    pub fn read_tag(&mut self) -> Result<Tag, Error> {
        Ok(Tag::from_be_bytes(self.read_array()?))
    }

    pub fn remaining_slice(&self) -> &'a [u8] {
        self.data.get(self.offset..).unwrap_or_default()
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}
