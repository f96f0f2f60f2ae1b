//! Byte-oriented reading.
use crate::{msg2err, Error};

/// Read from a certain byte offset into a buffer.
pub trait Read {
    /// Read into some byte buffer. Returning zero means end of disk.
    fn read_bytes(&self, offset: u64, buf: &mut [u8]) -> Result<usize, Error>;
}

/// Extension methods to make users easier.
pub trait ReadExt {
    /// Fill the whole buffer.
    fn read_exact(&self, offset: u64, buf: &mut [u8]) -> Result<(), Error>;
}

impl<T: Read + ?Sized> ReadExt for T {
    fn read_exact(&self, offset: u64, buf: &mut [u8]) -> Result<(), Error> {
        let mut n = 0;
        while n != buf.len() {
            match self.read_bytes(offset + n as u64, &mut buf[n..])? {
                0 => return Err(msg2err!(PartialReadError)),
                c => n += c,
            }
        }
        Ok(())
    }
}

/// An exact read could only be partially done.
#[derive(Debug)]
pub struct PartialReadError;

impl core::fmt::Display for PartialReadError {
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> Result<(), core::fmt::Error> {
        write!(fmt, "{:?}", self)
    }
}
