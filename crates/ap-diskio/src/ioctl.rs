//! Control requests.
//!
//! Every request carries the buffer the driver fills, so the driver can not
//! write more than the caller expects.

use crate::Lba;

/// A control request to a drive.
#[derive(Debug)]
pub enum Ioctl<'a> {
    /// Complete pending write processes.
    Sync,
    /// Number of available sectors.
    GetSectorCount(&'a mut Lba),
    /// Sector size in bytes.
    GetSectorSize(&'a mut u16),
    /// Erase block size in units of sectors.
    GetBlockSize(&'a mut u32),
    /// The sectors from `start` to `end` inclusive are no longer used.
    Trim { start: Lba, end: Lba },
    /// Card type flags.
    MmcGetType(&'a mut u8),
    /// The CSD register.
    MmcGetCsd(&'a mut [u8; 16]),
    /// The CID register.
    MmcGetCid(&'a mut [u8; 16]),
    /// The OCR register.
    MmcGetOcr(&'a mut [u8; 4]),
    /// The SD status.
    MmcGetSdStat(&'a mut [u8; 64]),
}

impl Ioctl<'_> {
    /// The numeric control code of the request.
    pub fn code(&self) -> u8 {
        match self {
            Self::Sync => 0,
            Self::GetSectorCount(_) => 1,
            Self::GetSectorSize(_) => 2,
            Self::GetBlockSize(_) => 3,
            Self::Trim { .. } => 4,
            Self::MmcGetType(_) => 10,
            Self::MmcGetCsd(_) => 11,
            Self::MmcGetCid(_) => 12,
            Self::MmcGetOcr(_) => 13,
            Self::MmcGetSdStat(_) => 14,
        }
    }
}

bitflags::bitflags! {
    /// Card type as reported by [`Ioctl::MmcGetType`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CardType: u8 {
        /// MMC version 3.
        const MMC = 0x01;
        /// SD version 1.
        const SD1 = 0x02;
        /// SD version 2.
        const SD2 = 0x04;
        /// Sector addressing.
        const BLOCK = 0x08;
        /// SDHC/SDXC.
        const SDHC = Self::SD2.bits() | Self::BLOCK.bits();
    }
}
