use ap_diskio::{transfer_range, trim_range, CardType, DResult, DStatus, Error, Ioctl, Lba, SECTOR_SIZE};
use std::fs::File;
use std::os::fd::AsRawFd;

/// An SD card backed by a disk image.
pub struct ImageCard {
    file: File,
    readonly: bool,
    sectors: Lba,
    /// Status without the write protection.
    status: DStatus,
    /// Writes not yet synced to the image.
    dirty: bool,
}

impl ImageCard {
    /// Open an image file. A trailing partial sector is ignored.
    pub fn open(filename: &str, readonly: bool) -> Result<Self, Error> {
        let file = File::options()
            .read(true)
            .write(!readonly)
            .open(filename)
            .map_err(|e| Error::from(e).context(format!("open {filename}")))?;
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            readonly,
            sectors: len / SECTOR_SIZE as u64,
            status: DStatus::NOINIT,
            dirty: false,
        })
    }

    /// Number of sectors.
    pub fn sectors(&self) -> Lba {
        self.sectors
    }

    /// Are there writes not yet synced?
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn media_changed(&mut self) {
        self.status.insert(DStatus::NOINIT);
    }

    pub(crate) fn status(&self) -> DStatus {
        if self.readonly {
            self.status | DStatus::PROTECT
        } else {
            self.status
        }
    }

    pub(crate) fn initialize(&mut self) -> DStatus {
        self.status.remove(DStatus::NOINIT);
        self.status()
    }

    /// Push pending writes to the image.
    pub(crate) fn flush(&mut self) -> DResult {
        if !self.dirty {
            return DResult::Ok;
        }
        if unsafe { libc::fdatasync(self.file.as_raw_fd()) } == -1 {
            log::warn!("fdatasync: {}", std::io::Error::last_os_error());
            return DResult::Error;
        }
        self.dirty = false;
        DResult::Ok
    }

    pub(crate) fn read(&mut self, buf: &mut [u8], sector: Lba, count: u32) -> DResult {
        let r = match transfer_range(self.status, self.sectors, buf.len(), sector, count) {
            Ok(r) => r,
            Err(e) => return e,
        };
        let buf = &mut buf[..(r.end - r.start) as usize];
        let mut n = 0;
        while n != buf.len() {
            let res = unsafe {
                libc::pread(
                    self.file.as_raw_fd(),
                    buf[n..].as_mut_ptr() as *mut libc::c_void,
                    buf.len() - n,
                    (r.start + n as u64) as libc::off_t,
                )
            };
            match res {
                -1 => {
                    log::warn!("pread sector {sector}: {}", std::io::Error::last_os_error());
                    return DResult::Error;
                }
                // the image shrunk
                0 => return DResult::Error,
                c => n += c as usize,
            }
        }
        DResult::Ok
    }

    pub(crate) fn write(&mut self, buf: &[u8], sector: Lba, count: u32) -> DResult {
        let r = match transfer_range(self.status, self.sectors, buf.len(), sector, count) {
            Ok(r) => r,
            Err(e) => return e,
        };
        if self.readonly {
            return DResult::WrPrt;
        }
        self.dirty = true;
        self.pwrite_all(&buf[..(r.end - r.start) as usize], r.start)
    }

    fn pwrite_all(&mut self, buf: &[u8], offset: u64) -> DResult {
        let mut n = 0;
        while n != buf.len() {
            let res = unsafe {
                libc::pwrite(
                    self.file.as_raw_fd(),
                    buf[n..].as_ptr() as *const libc::c_void,
                    buf.len() - n,
                    (offset + n as u64) as libc::off_t,
                )
            };
            match res {
                -1 => {
                    log::warn!("pwrite at {offset:#x}: {}", std::io::Error::last_os_error());
                    return DResult::Error;
                }
                0 => return DResult::Error,
                c => n += c as usize,
            }
        }
        DResult::Ok
    }

    /// Punch a hole or, where the filesystem can not, write zeros.
    fn trim(&mut self, start: Lba, end: Lba) -> DResult {
        let r = match trim_range(self.sectors, start, end) {
            Ok(r) => r,
            Err(e) => return e,
        };
        if self.readonly {
            return DResult::WrPrt;
        }
        self.dirty = true;
        let res = unsafe {
            libc::fallocate(
                self.file.as_raw_fd(),
                libc::FALLOC_FL_PUNCH_HOLE | libc::FALLOC_FL_KEEP_SIZE,
                r.start as libc::off_t,
                (r.end - r.start) as libc::off_t,
            )
        };
        if res == 0 {
            return DResult::Ok;
        }
        log::debug!("fallocate: {}", std::io::Error::last_os_error());
        let zero = [0u8; SECTOR_SIZE];
        for offset in (r.start..r.end).step_by(SECTOR_SIZE) {
            match self.pwrite_all(&zero, offset) {
                DResult::Ok => {}
                e => return e,
            }
        }
        DResult::Ok
    }

    pub(crate) fn ioctl(&mut self, request: Ioctl<'_>) -> DResult {
        if self.status.contains(DStatus::NOINIT) {
            return DResult::NotRdy;
        }
        match request {
            Ioctl::Sync => return self.flush(),
            Ioctl::GetSectorCount(n) => *n = self.sectors,
            Ioctl::GetSectorSize(n) => *n = SECTOR_SIZE as u16,
            Ioctl::GetBlockSize(n) => *n = 1,
            Ioctl::Trim { start, end } => return self.trim(start, end),
            Ioctl::MmcGetType(n) => *n = CardType::SDHC.bits(),
            Ioctl::MmcGetCsd(_) | Ioctl::MmcGetCid(_) | Ioctl::MmcGetOcr(_) | Ioctl::MmcGetSdStat(_) => {
                return DResult::ParErr
            }
        }
        DResult::Ok
    }
}
