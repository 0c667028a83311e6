use zerocopy::FromBytes;

use crate::error::{CwaError, Section};

/// Forward-only reader over a byte slice.
///
/// Every read is checked against the end of the slice before any byte is
/// touched, so a count field can never drive a read past the buffer.
#[derive(Debug)]
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Take the next `len` bytes, or fail with `Truncated` without advancing.
    pub(crate) fn take(&mut self, len: usize, section: Section) -> Result<&'a [u8], CwaError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or(CwaError::Truncated {
                section,
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Read one fixed-size wire record.
    pub(crate) fn read<T: FromBytes>(&mut self, section: Section) -> Result<T, CwaError> {
        let offset = self.pos;
        let bytes = self.take(size_of::<T>(), section)?;
        T::read_from_bytes(bytes).map_err(|_| CwaError::Truncated {
            section,
            offset,
            needed: size_of::<T>(),
            available: bytes.len(),
        })
    }

    /// Read `count` consecutive fixed-size records, checking the whole run up front.
    pub(crate) fn read_array<T: FromBytes>(
        &mut self,
        count: usize,
        section: Section,
    ) -> Result<Vec<T>, CwaError> {
        let record_size = size_of::<T>();
        let offset = self.pos;
        let needed = count.checked_mul(record_size).ok_or(CwaError::Truncated {
            section,
            offset,
            needed: usize::MAX,
            available: self.remaining(),
        })?;
        let bytes = self.take(needed, section)?;

        bytes
            .chunks_exact(record_size)
            .map(|chunk| {
                T::read_from_bytes(chunk).map_err(|_| CwaError::Truncated {
                    section,
                    offset,
                    needed,
                    available: bytes.len(),
                })
            })
            .collect()
    }
}
