//! Glue functions attaching an existing SD/MMC control module to the
//! disk I/O interface.
//!
//! All operations forward to the driver after selecting the drive. Arguments
//! and results pass through unchanged.
#![no_std]

use ap_diskio::{DResult, DStatus, DiskIo, Ioctl, Lba, MmcDriver, Pdrv};

/// Writing is compiled out. [`DiskIo::write`] then answers `WrPrt`.
pub const READONLY: bool = cfg!(feature = "readonly");

/// Disk I/O on top of an SD/MMC driver with one or more card slots on a
/// shared SPI bus.
pub struct SdcGlue<M: MmcDriver> {
    driver: M,
}

impl<M: MmcDriver> SdcGlue<M> {
    /// Attach the driver.
    pub fn new(driver: M) -> Self {
        Self { driver }
    }

    /// The attached driver.
    pub fn driver(&self) -> &M {
        &self.driver
    }

    /// The attached driver, mutable.
    pub fn driver_mut(&mut self) -> &mut M {
        &mut self.driver
    }

    /// Detach the driver.
    pub fn into_inner(self) -> M {
        self.driver
    }

    /// Prepare the drive access.
    ///
    /// A card in the other slot might still be busy and block the SPI bus,
    /// so wait before switching.
    fn prep(&mut self, pdrv: Pdrv) {
        let current = self.driver.slot();
        if current != pdrv {
            log::trace!("slot {current} -> {pdrv}");
            self.driver.wait_busy_spi();
        }
        self.driver.set_slot(pdrv);
    }

    /// Get the drive status.
    pub fn disk_status(&mut self, pdrv: Pdrv) -> DStatus {
        self.prep(pdrv);
        self.driver.status()
    }

    /// Initialize a drive.
    pub fn disk_initialize(&mut self, pdrv: Pdrv) -> DStatus {
        self.prep(pdrv);
        self.driver.initialize()
    }

    /// Read sectors.
    pub fn disk_read(&mut self, pdrv: Pdrv, buf: &mut [u8], sector: Lba, count: u32) -> DResult {
        self.prep(pdrv);
        self.driver.read(buf, sector, count)
    }

    /// Write sectors.
    #[cfg(not(feature = "readonly"))]
    pub fn disk_write(&mut self, pdrv: Pdrv, buf: &[u8], sector: Lba, count: u32) -> DResult {
        self.prep(pdrv);
        self.driver.write(buf, sector, count)
    }

    /// Miscellaneous functions.
    #[cfg(feature = "ioctl")]
    pub fn disk_ioctl(&mut self, pdrv: Pdrv, request: Ioctl<'_>) -> DResult {
        self.prep(pdrv);
        self.driver.ioctl(request)
    }
}

impl<M: MmcDriver> DiskIo for SdcGlue<M> {
    fn status(&mut self, pdrv: Pdrv) -> DStatus {
        self.disk_status(pdrv)
    }

    fn initialize(&mut self, pdrv: Pdrv) -> DStatus {
        self.disk_initialize(pdrv)
    }

    fn read(&mut self, pdrv: Pdrv, buf: &mut [u8], sector: Lba, count: u32) -> DResult {
        self.disk_read(pdrv, buf, sector, count)
    }

    #[cfg(not(feature = "readonly"))]
    fn write(&mut self, pdrv: Pdrv, buf: &[u8], sector: Lba, count: u32) -> DResult {
        self.disk_write(pdrv, buf, sector, count)
    }

    #[cfg(feature = "readonly")]
    fn write(&mut self, _pdrv: Pdrv, _buf: &[u8], _sector: Lba, _count: u32) -> DResult {
        DResult::WrPrt
    }

    #[cfg(feature = "ioctl")]
    fn ioctl(&mut self, pdrv: Pdrv, request: Ioctl<'_>) -> DResult {
        self.disk_ioctl(pdrv, request)
    }

    #[cfg(not(feature = "ioctl"))]
    fn ioctl(&mut self, _pdrv: Pdrv, _request: Ioctl<'_>) -> DResult {
        DResult::ParErr
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use std::vec::Vec;

    #[derive(Debug, PartialEq, Eq)]
    enum Call {
        Wait(Pdrv),
        Status,
        Init,
        Read(Lba, u32),
        Write(Lba, u32),
        Ioctl(u8),
    }

    /// Records every call together with the slot it went to.
    struct Recorder {
        slot: Pdrv,
        calls: Vec<(Pdrv, Call)>,
    }

    impl Recorder {
        fn new() -> Self {
            Self { slot: 0, calls: Vec::new() }
        }
        fn push(&mut self, call: Call) {
            self.calls.push((self.slot, call));
        }
    }

    impl MmcDriver for Recorder {
        fn slot(&self) -> Pdrv {
            self.slot
        }
        fn set_slot(&mut self, slot: Pdrv) {
            self.slot = slot;
        }
        fn wait_busy_spi(&mut self) {
            let slot = self.slot;
            self.push(Call::Wait(slot));
        }
        fn status(&mut self) -> DStatus {
            self.push(Call::Status);
            DStatus::NOINIT | DStatus::PROTECT
        }
        fn initialize(&mut self) -> DStatus {
            self.push(Call::Init);
            DStatus::PROTECT
        }
        fn read(&mut self, buf: &mut [u8], sector: Lba, count: u32) -> DResult {
            self.push(Call::Read(sector, count));
            buf.fill(0xa5);
            DResult::NotRdy
        }
        fn write(&mut self, buf: &[u8], sector: Lba, count: u32) -> DResult {
            assert!(buf.iter().all(|x| *x == 0x5a));
            self.push(Call::Write(sector, count));
            DResult::WrPrt
        }
        fn ioctl(&mut self, request: Ioctl<'_>) -> DResult {
            self.push(Call::Ioctl(request.code()));
            if let Ioctl::GetSectorCount(n) = request {
                *n = 77;
            }
            DResult::Ok
        }
    }

    #[test]
    fn results_pass_through() {
        let mut glue = SdcGlue::new(Recorder::new());
        assert_eq!(glue.disk_status(0), DStatus::NOINIT | DStatus::PROTECT);
        assert_eq!(glue.disk_initialize(0), DStatus::PROTECT);

        let mut buf = [0u8; 1024];
        assert_eq!(glue.disk_read(0, &mut buf, 0x1234_5678_9a, 2), DResult::NotRdy);
        assert!(buf.iter().all(|x| *x == 0xa5));

        #[cfg(not(feature = "readonly"))]
        assert_eq!(glue.disk_write(0, &[0x5a; 512], 9, 1), DResult::WrPrt);

        #[cfg(feature = "ioctl")]
        {
            let mut n = 0;
            assert_eq!(glue.disk_ioctl(0, Ioctl::GetSectorCount(&mut n)), DResult::Ok);
            assert_eq!(n, 77);
        }

        let calls = glue.into_inner().calls;
        assert!(calls.contains(&(0, Call::Read(0x1234_5678_9a, 2))));
        assert!(!calls.iter().any(|(_, c)| matches!(c, Call::Wait(_))));
    }

    #[test]
    fn wait_only_when_switching() {
        let mut glue = SdcGlue::new(Recorder::new());
        glue.disk_status(0);
        glue.disk_status(1);
        glue.disk_status(1);
        glue.disk_initialize(0);
        glue.disk_status(0);

        let calls = glue.into_inner().calls;
        assert_eq!(
            calls,
            [
                (0, Call::Status),
                (0, Call::Wait(0)),
                (1, Call::Status),
                (1, Call::Status),
                (1, Call::Wait(1)),
                (0, Call::Init),
                (0, Call::Status),
            ]
        );
    }

    #[cfg(feature = "ioctl")]
    #[test]
    fn every_operation_selects_the_drive() {
        let mut glue = SdcGlue::new(Recorder::new());
        let mut buf = [0u8; 512];
        glue.disk_read(3, &mut buf, 5, 1);
        assert_eq!(glue.driver().slot(), 3);
        glue.disk_ioctl(2, Ioctl::Sync);
        assert_eq!(glue.driver().slot(), 2);

        let calls = glue.into_inner().calls;
        assert_eq!(calls[0], (0, Call::Wait(0)));
        assert_eq!(calls[1], (3, Call::Read(5, 1)));
        assert_eq!(calls[2], (3, Call::Wait(3)));
        assert_eq!(calls[3], (2, Call::Ioctl(0)));
    }

    #[test]
    fn trait_write_follows_the_build() {
        let mut glue = SdcGlue::new(Recorder::new());
        assert_eq!(DiskIo::write(&mut glue, 0, &[0x5a; 512], 4, 1), DResult::WrPrt);
        let wrote = glue.into_inner().calls.contains(&(0, Call::Write(4, 1)));
        assert_eq!(wrote, !READONLY);
    }

    #[cfg(feature = "readonly")]
    #[test]
    fn readonly_never_writes() {
        let mut glue = SdcGlue::new(Recorder::new());
        assert_eq!(DiskIo::write(&mut glue, 0, &[0x5a; 512], 0, 1), DResult::WrPrt);
        assert!(glue.into_inner().calls.is_empty());
    }

    #[cfg(not(feature = "ioctl"))]
    #[test]
    fn requests_without_ioctl() {
        let mut glue = SdcGlue::new(Recorder::new());
        let mut n = 0;
        assert_eq!(DiskIo::ioctl(&mut glue, 1, Ioctl::GetSectorCount(&mut n)), DResult::ParErr);
        assert_eq!(n, 0);
        assert!(glue.into_inner().calls.is_empty());
    }
}
