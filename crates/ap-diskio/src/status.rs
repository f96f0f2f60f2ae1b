//! Drive status and operation results.

use crate::{msg2err, Error};

bitflags::bitflags! {
    /// Status of a physical drive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DStatus: u8 {
        /// The drive has not been initialized.
        const NOINIT = 0x01;
        /// No medium in the drive.
        const NODISK = 0x02;
        /// The medium is write protected.
        const PROTECT = 0x04;
    }
}

impl DStatus {
    /// The drive is initialized and holds a medium.
    pub fn is_ready(self) -> bool {
        !self.intersects(Self::NOINIT | Self::NODISK)
    }
}

/// Result of a disk operation.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DResult {
    /// Successful.
    Ok = 0,
    /// R/W error.
    Error = 1,
    /// Write protected.
    WrPrt = 2,
    /// Not ready.
    NotRdy = 3,
    /// Invalid parameter.
    ParErr = 4,
}

impl DResult {
    /// Turn anything but `Ok` into an error.
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Self::Ok => Ok(()),
            res => Err(msg2err!(DiskError(res))),
        }
    }
}

/// A disk operation did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskError(pub DResult);

impl core::fmt::Display for DiskError {
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> Result<(), core::fmt::Error> {
        let msg = match self.0 {
            DResult::Ok => "ok",
            DResult::Error => "read/write error",
            DResult::WrPrt => "write protected",
            DResult::NotRdy => "not ready",
            DResult::ParErr => "invalid parameter",
        };
        write!(fmt, "{msg}")
    }
}
