//! A single card stored in memory.

use ap_diskio::{transfer_range, trim_range, CardType, DResult, DStatus, Ioctl, Lba, SECTOR_SIZE};
use core::ops::Range;

/// An SD card whose sectors live in an external slice.
pub struct MemoryCard<'a> {
    /// The sectors. A trailing partial sector is not used.
    data: &'a mut [u8],
    /// Status without the write protection.
    status: DStatus,
    /// The write-protect switch.
    protect: bool,
    typ: CardType,
    /// The card is still programming the last write.
    pub(crate) busy: bool,
}

impl<'a> MemoryCard<'a> {
    /// An uninitialized SDHC card using the data as backing store.
    pub fn new(data: &'a mut [u8]) -> Self {
        Self {
            data,
            status: DStatus::NOINIT,
            protect: false,
            typ: CardType::SDHC,
            busy: false,
        }
    }

    /// Set the write-protect switch.
    pub fn protect(self, v: bool) -> Self {
        Self { protect: v, ..self }
    }

    /// The card type to report.
    pub fn card_type(self, v: CardType) -> Self {
        Self { typ: v, ..self }
    }

    /// Number of sectors.
    pub fn sectors(&self) -> Lba {
        (self.data.len() / SECTOR_SIZE) as Lba
    }

    /// The raw contents.
    pub fn data(&self) -> &[u8] {
        self.data
    }

    /// Is a write still in progress?
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub(crate) fn media_changed(&mut self) {
        self.status.insert(DStatus::NOINIT);
        self.busy = false;
    }

    pub(crate) fn status(&self) -> DStatus {
        if self.protect {
            self.status | DStatus::PROTECT
        } else {
            self.status
        }
    }

    pub(crate) fn initialize(&mut self) -> DStatus {
        self.status.remove(DStatus::NOINIT);
        self.status()
    }

    /// Validate a transfer and return the byte range.
    fn range(&self, len: usize, sector: Lba, count: u32) -> Result<Range<usize>, DResult> {
        let r = transfer_range(self.status, self.sectors(), len, sector, count)?;
        Ok(r.start as usize..r.end as usize)
    }

    pub(crate) fn read(&mut self, buf: &mut [u8], sector: Lba, count: u32) -> DResult {
        match self.range(buf.len(), sector, count) {
            Ok(r) => {
                buf[..r.len()].copy_from_slice(&self.data[r]);
                DResult::Ok
            }
            Err(e) => e,
        }
    }

    pub(crate) fn write(&mut self, buf: &[u8], sector: Lba, count: u32) -> DResult {
        let r = match self.range(buf.len(), sector, count) {
            Ok(r) => r,
            Err(e) => return e,
        };
        if self.protect {
            return DResult::WrPrt;
        }
        let n = r.len();
        self.data[r].copy_from_slice(&buf[..n]);
        self.busy = true;
        DResult::Ok
    }

    pub(crate) fn ioctl(&mut self, request: Ioctl<'_>) -> DResult {
        if self.status.contains(DStatus::NOINIT) {
            return DResult::NotRdy;
        }
        match request {
            Ioctl::Sync => self.busy = false,
            Ioctl::GetSectorCount(n) => *n = self.sectors(),
            Ioctl::GetSectorSize(n) => *n = SECTOR_SIZE as u16,
            Ioctl::GetBlockSize(n) => *n = 1,
            Ioctl::Trim { start, end } => {
                let r = match trim_range(self.sectors(), start, end) {
                    Ok(r) => r,
                    Err(e) => return e,
                };
                if self.protect {
                    return DResult::WrPrt;
                }
                self.data[r.start as usize..r.end as usize].fill(0);
                self.busy = true;
            }
            Ioctl::MmcGetType(n) => *n = self.typ.bits(),
            // there are no card registers in memory
            Ioctl::MmcGetCsd(_) | Ioctl::MmcGetCid(_) | Ioctl::MmcGetOcr(_) | Ioctl::MmcGetSdStat(_) => {
                return DResult::ParErr
            }
        }
        DResult::Ok
    }
}
