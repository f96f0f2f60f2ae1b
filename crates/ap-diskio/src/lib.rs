//! The alpico lower-layer disk I/O interfaces.
//!
//! A filesystem talks to its media through [`DiskIo`], addressing sectors
//! on numbered physical drives. Existing card drivers implement
//! [`MmcDriver`] and get attached to the filesystem by some glue.
#![no_std]

/// Physical drive number.
pub type Pdrv = u8;

/// Sector address in LBA.
pub type Lba = u64;

/// Error when accessing a drive.
pub type Error = anyhow::Error;

/// The sector size of MMC/SD cards in SPI mode.
pub const SECTOR_SIZE: usize = 512;

pub mod ioctl;
mod read;
mod status;
mod transfer;
mod view;
mod write;

pub use ioctl::{CardType, Ioctl};
pub use read::*;
pub use status::*;
pub use transfer::{transfer_range, trim_range};
pub use view::DriveView;
pub use write::*;

/// The lower-layer API a filesystem expects from its disks.
pub trait DiskIo {
    /// Get the drive status.
    fn status(&mut self, pdrv: Pdrv) -> DStatus;

    /// Initialize the drive.
    fn initialize(&mut self, pdrv: Pdrv) -> DStatus;

    /// Read `count` sectors starting at `sector` into the buffer.
    fn read(&mut self, pdrv: Pdrv, buf: &mut [u8], sector: Lba, count: u32) -> DResult;

    /// Write `count` sectors starting at `sector` from the buffer.
    fn write(&mut self, pdrv: Pdrv, buf: &[u8], sector: Lba, count: u32) -> DResult;

    /// Miscellaneous drive controls.
    fn ioctl(&mut self, pdrv: Pdrv, request: Ioctl<'_>) -> DResult;
}

/// An existing SD/MMC control module.
///
/// The driver keeps track of the slot it talks to. All data calls go to the
/// currently selected slot.
pub trait MmcDriver {
    /// The slot of the last access.
    fn slot(&self) -> Pdrv;

    /// Select the slot for the following calls.
    fn set_slot(&mut self, slot: Pdrv);

    /// Wait until the selected card releases the SPI bus.
    fn wait_busy_spi(&mut self);

    /// Status of the selected card.
    fn status(&mut self) -> DStatus;

    /// Initialize the selected card.
    fn initialize(&mut self) -> DStatus;

    /// Read sectors from the selected card.
    fn read(&mut self, buf: &mut [u8], sector: Lba, count: u32) -> DResult;

    /// Write sectors to the selected card.
    fn write(&mut self, buf: &[u8], sector: Lba, count: u32) -> DResult;

    /// Control codes for the selected card.
    fn ioctl(&mut self, request: Ioctl<'_>) -> DResult;
}

/// Check for errors including the location as context.
#[macro_export]
macro_rules! check {
    ($v: expr) => { $v.map_err(|e| e.context($crate::ErrorCtx((file!(), line!()))))? }
}

/// Convert into an error type including the context.
#[macro_export]
macro_rules! msg2err {
    ($v: expr) => { $crate::Error::msg($v).context($crate::ErrorCtx((file!(), line!()))) }
}

/// A container for file! and line! Error context
pub struct ErrorCtx(pub (&'static str, u32));
impl core::fmt::Display for ErrorCtx {
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> Result<(), core::fmt::Error> {
        write!(fmt, "{}:{}", self.0.0, self.0.1)
    }
}
