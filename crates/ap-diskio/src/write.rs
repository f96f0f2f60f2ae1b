//! Byte-oriented writing.
use crate::{msg2err, Error};

/// Write to a disk at a certain byte offset.
pub trait Write {
    /// Write some byte buffer. Returning zero means end of disk.
    fn write_bytes(&self, offset: u64, buf: &[u8]) -> Result<usize, Error>;
    /// Discard a region and return the bytes successfully discarded.
    fn discard(&self, offset: u64, len: u64) -> Result<u64, Error>;
}

/// Trait extension to simplify writing.
pub trait WriteExt {
    /// Write the whole buffer.
    fn write_exact(&self, offset: u64, buf: &[u8]) -> Result<(), Error>;
    /// Discard a whole area.
    fn discard_all(&self, offset: u64, len: u64) -> Result<(), Error>;
}

impl<T: Write + ?Sized> WriteExt for T {
    fn write_exact(&self, offset: u64, buf: &[u8]) -> Result<(), Error> {
        let mut done = 0;
        while done != buf.len() {
            match self.write_bytes(offset + done as u64, &buf[done..])? {
                0 => return Err(msg2err!(PartialWriteError)),
                n => done += n,
            }
        }
        Ok(())
    }

    fn discard_all(&self, mut offset: u64, len: u64) -> Result<(), Error> {
        let end = offset.saturating_add(len);
        while offset < end {
            match self.discard(offset, end - offset)? {
                0 => return Err(msg2err!(PartialWriteError)),
                n => offset += n,
            }
        }
        Ok(())
    }
}

/// An exact write could only be partially done.
#[derive(Debug)]
pub struct PartialWriteError;

impl core::fmt::Display for PartialWriteError {
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> Result<(), core::fmt::Error> {
        write!(fmt, "{:?}", self)
    }
}
