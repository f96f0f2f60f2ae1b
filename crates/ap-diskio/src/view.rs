//! Byte access to a single drive.

use crate::{DiskIo, Error, Ioctl, Lba, Pdrv, Read, Write, SECTOR_SIZE};
use core::cell::{Cell, RefCell};

/// A drive of a [`DiskIo`] seen as a flat array of bytes.
///
/// Unaligned accesses go through a single sector buffer.
pub struct DriveView<'a> {
    disk: RefCell<&'a mut dyn DiskIo>,
    pdrv: Pdrv,
    sectors: Cell<Option<Lba>>,
}

impl<'a> DriveView<'a> {
    /// View the drive `pdrv` of the disk.
    pub fn new(disk: &'a mut dyn DiskIo, pdrv: Pdrv) -> Self {
        Self {
            disk: RefCell::new(disk),
            pdrv,
            sectors: Cell::new(None),
        }
    }

    /// Number of sectors on the drive, asked once.
    pub fn sector_count(&self) -> Result<Lba, Error> {
        if let Some(n) = self.sectors.get() {
            return Ok(n);
        }
        let mut n = 0;
        self.disk
            .borrow_mut()
            .ioctl(self.pdrv, Ioctl::GetSectorCount(&mut n))
            .into_result()?;
        self.sectors.set(Some(n));
        Ok(n)
    }

    /// Size of the drive in bytes.
    pub fn size(&self) -> Result<u64, Error> {
        Ok(self.sector_count()? * SECTOR_SIZE as u64)
    }

    /// How many whole sectors fit into `len` bytes starting at `sector`.
    fn whole_sectors(&self, sector: Lba, len: usize) -> Result<u32, Error> {
        let left = self.sector_count()? - sector;
        let n = core::cmp::min((len / SECTOR_SIZE) as u64, left);
        Ok(core::cmp::min(n, u32::MAX as u64) as u32)
    }

    fn read_sectors(&self, buf: &mut [u8], sector: Lba, count: u32) -> Result<(), Error> {
        self.disk.borrow_mut().read(self.pdrv, buf, sector, count).into_result()
    }

    fn write_sectors(&self, buf: &[u8], sector: Lba, count: u32) -> Result<(), Error> {
        self.disk.borrow_mut().write(self.pdrv, buf, sector, count).into_result()
    }
}

impl Read for DriveView<'_> {
    fn read_bytes(&self, offset: u64, buf: &mut [u8]) -> Result<usize, Error> {
        let sector = offset / SECTOR_SIZE as u64;
        if buf.is_empty() || sector >= self.sector_count()? {
            return Ok(0);
        }
        let skip = (offset % SECTOR_SIZE as u64) as usize;
        if skip == 0 && buf.len() >= SECTOR_SIZE {
            let count = self.whole_sectors(sector, buf.len())?;
            let n = count as usize * SECTOR_SIZE;
            self.read_sectors(&mut buf[..n], sector, count)?;
            return Ok(n);
        }
        let mut tmp = [0u8; SECTOR_SIZE];
        self.read_sectors(&mut tmp, sector, 1)?;
        let n = core::cmp::min(SECTOR_SIZE - skip, buf.len());
        buf[..n].copy_from_slice(&tmp[skip..skip + n]);
        Ok(n)
    }
}

impl Write for DriveView<'_> {
    fn write_bytes(&self, offset: u64, buf: &[u8]) -> Result<usize, Error> {
        let sector = offset / SECTOR_SIZE as u64;
        if buf.is_empty() || sector >= self.sector_count()? {
            return Ok(0);
        }
        let skip = (offset % SECTOR_SIZE as u64) as usize;
        if skip == 0 && buf.len() >= SECTOR_SIZE {
            let count = self.whole_sectors(sector, buf.len())?;
            let n = count as usize * SECTOR_SIZE;
            self.write_sectors(&buf[..n], sector, count)?;
            return Ok(n);
        }

        // read-modify-write a partial sector
        let mut tmp = [0u8; SECTOR_SIZE];
        self.read_sectors(&mut tmp, sector, 1)?;
        let n = core::cmp::min(SECTOR_SIZE - skip, buf.len());
        tmp[skip..skip + n].copy_from_slice(&buf[..n]);
        self.write_sectors(&tmp, sector, 1)?;
        Ok(n)
    }

    /// Only whole sectors are trimmed. Partial sectors at the edges keep
    /// their data but count as discarded.
    fn discard(&self, offset: u64, len: u64) -> Result<u64, Error> {
        let size = self.size()?;
        if offset >= size {
            return Ok(0);
        }
        let len = core::cmp::min(len, size - offset);
        let start = offset.div_ceil(SECTOR_SIZE as u64);
        let end = (offset + len) / SECTOR_SIZE as u64;
        if start < end {
            self.disk
                .borrow_mut()
                .ioctl(self.pdrv, Ioctl::Trim { start, end: end - 1 })
                .into_result()?;
        }
        Ok(len)
    }
}
