//! In-memory SD/MMC cards.
//!
//! Provides an SD control module with several card slots on one simulated
//! SPI bus. Useful as RAM disk and to check how the glue handles the bus.
#![no_std]

use ap_diskio::{DResult, DStatus, Ioctl, Lba, MmcDriver, Pdrv};

mod card;
pub use card::MemoryCard;

/// A card socket per slot, sharing one bus.
pub struct MemorySlots<'a, const N: usize> {
    cards: [Option<MemoryCard<'a>>; N],
    /// The currently selected slot.
    slot: Pdrv,
    /// Number of busy waits.
    waits: usize,
    /// Slot switches while the previous card was still busy.
    collisions: usize,
}

impl<const N: usize> Default for MemorySlots<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> MemorySlots<'a, N> {
    /// All slots empty, slot zero selected.
    pub fn new() -> Self {
        Self {
            cards: core::array::from_fn(|_| None),
            slot: 0,
            waits: 0,
            collisions: 0,
        }
    }

    /// Put a card into a slot and return the previous one.
    ///
    /// The card needs to be initialized again. A slot beyond `N` drops the card.
    pub fn insert(&mut self, slot: Pdrv, mut card: MemoryCard<'a>) -> Option<MemoryCard<'a>> {
        card.media_changed();
        self.cards.get_mut(slot as usize)?.replace(card)
    }

    /// Remove the card from a slot.
    pub fn eject(&mut self, slot: Pdrv) -> Option<MemoryCard<'a>> {
        self.cards.get_mut(slot as usize)?.take()
    }

    /// The card in a slot.
    pub fn card(&self, slot: Pdrv) -> Option<&MemoryCard<'a>> {
        self.cards.get(slot as usize)?.as_ref()
    }

    /// How often the bus was waited for.
    pub fn waits(&self) -> usize {
        self.waits
    }

    /// How often a slot was selected while another card still held the bus.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    fn current(&mut self) -> Result<&mut MemoryCard<'a>, DResult> {
        match self.cards.get_mut(self.slot as usize) {
            None => Err(DResult::ParErr),
            Some(None) => Err(DResult::NotRdy),
            Some(Some(card)) => Ok(card),
        }
    }
}

impl<const N: usize> MmcDriver for MemorySlots<'_, N> {
    fn slot(&self) -> Pdrv {
        self.slot
    }

    fn set_slot(&mut self, slot: Pdrv) {
        if slot != self.slot && self.card(self.slot).is_some_and(|c| c.is_busy()) {
            log::warn!("slot {} selected while slot {} is busy", slot, self.slot);
            self.collisions += 1;
        }
        self.slot = slot;
    }

    fn wait_busy_spi(&mut self) {
        self.waits += 1;
        if let Ok(card) = self.current() {
            card.busy = false;
        }
    }

    fn status(&mut self) -> DStatus {
        match self.current() {
            Ok(card) => card.status(),
            Err(_) => DStatus::NOINIT | DStatus::NODISK,
        }
    }

    fn initialize(&mut self) -> DStatus {
        match self.current() {
            Ok(card) => card.initialize(),
            Err(_) => DStatus::NOINIT | DStatus::NODISK,
        }
    }

    fn read(&mut self, buf: &mut [u8], sector: Lba, count: u32) -> DResult {
        match self.current() {
            Ok(card) => card.read(buf, sector, count),
            Err(e) => e,
        }
    }

    fn write(&mut self, buf: &[u8], sector: Lba, count: u32) -> DResult {
        match self.current() {
            Ok(card) => card.write(buf, sector, count),
            Err(e) => e,
        }
    }

    fn ioctl(&mut self, request: Ioctl<'_>) -> DResult {
        match self.current() {
            Ok(card) => card.ioctl(request),
            Err(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_diskio::{CardType, SECTOR_SIZE};

    #[test]
    fn empty_slots() {
        let mut slots = MemorySlots::<2>::new();
        assert_eq!(slots.initialize(), DStatus::NOINIT | DStatus::NODISK);
        let mut buf = [0u8; SECTOR_SIZE];
        assert_eq!(slots.read(&mut buf, 0, 1), DResult::NotRdy);
        slots.set_slot(7);
        assert_eq!(slots.read(&mut buf, 0, 1), DResult::ParErr);
        assert_eq!(slots.status(), DStatus::NOINIT | DStatus::NODISK);
    }

    #[test]
    fn needs_initialize() {
        let mut data = [0u8; 4 * SECTOR_SIZE];
        let mut slots = MemorySlots::<1>::new();
        slots.insert(0, MemoryCard::new(&mut data));
        let mut buf = [0u8; SECTOR_SIZE];
        assert_eq!(slots.status(), DStatus::NOINIT);
        assert_eq!(slots.read(&mut buf, 0, 1), DResult::NotRdy);
        assert_eq!(slots.initialize(), DStatus::empty());
        assert_eq!(slots.read(&mut buf, 0, 1), DResult::Ok);
    }

    #[test]
    fn parameters() {
        let mut data = [0u8; 4 * SECTOR_SIZE];
        let mut slots = MemorySlots::<1>::new();
        slots.insert(0, MemoryCard::new(&mut data));
        slots.initialize();
        let mut buf = [0u8; 2 * SECTOR_SIZE];
        assert_eq!(slots.read(&mut buf, 0, 0), DResult::ParErr);
        assert_eq!(slots.read(&mut buf, 0, 3), DResult::ParErr);
        assert_eq!(slots.read(&mut buf, 3, 2), DResult::Error);
        assert_eq!(slots.read(&mut buf, Lba::MAX, 1), DResult::Error);
        assert_eq!(slots.read(&mut buf, 2, 2), DResult::Ok);
    }

    #[test]
    fn write_protect() {
        let mut data = [0u8; 4 * SECTOR_SIZE];
        let mut slots = MemorySlots::<1>::new();
        slots.insert(0, MemoryCard::new(&mut data).protect(true));
        assert_eq!(slots.initialize(), DStatus::PROTECT);
        assert_eq!(slots.write(&[1; SECTOR_SIZE], 0, 1), DResult::WrPrt);
        assert_eq!(slots.ioctl(Ioctl::Trim { start: 0, end: 1 }), DResult::WrPrt);
        assert!(slots.card(0).unwrap().data().iter().all(|x| *x == 0));
    }

    #[test]
    fn writes_make_the_card_busy() {
        let mut data = [0u8; 4 * SECTOR_SIZE];
        let mut slots = MemorySlots::<2>::new();
        slots.insert(0, MemoryCard::new(&mut data));
        slots.initialize();
        assert_eq!(slots.write(&[7; SECTOR_SIZE], 1, 1), DResult::Ok);
        assert!(slots.card(0).unwrap().is_busy());

        // switching without waiting
        slots.set_slot(1);
        assert_eq!(slots.collisions(), 1);

        slots.set_slot(0);
        slots.wait_busy_spi();
        assert!(!slots.card(0).unwrap().is_busy());
        slots.set_slot(1);
        assert_eq!(slots.collisions(), 1);
        assert_eq!(slots.waits(), 1);
        assert_eq!(slots.card(0).unwrap().data()[SECTOR_SIZE], 7);
    }

    #[test]
    fn control_codes() {
        let mut data = [0xffu8; 6 * SECTOR_SIZE + 100];
        let mut slots = MemorySlots::<1>::new();
        slots.insert(0, MemoryCard::new(&mut data).card_type(CardType::SD1));
        assert_eq!(slots.ioctl(Ioctl::Sync), DResult::NotRdy);
        slots.initialize();

        let mut count = 0;
        let mut size = 0;
        let mut typ = 0;
        let mut csd = [0u8; 16];
        assert_eq!(slots.ioctl(Ioctl::GetSectorCount(&mut count)), DResult::Ok);
        assert_eq!(slots.ioctl(Ioctl::GetSectorSize(&mut size)), DResult::Ok);
        assert_eq!(slots.ioctl(Ioctl::MmcGetType(&mut typ)), DResult::Ok);
        assert_eq!((count, size, typ), (6, 512, CardType::SD1.bits()));
        assert_eq!(slots.ioctl(Ioctl::MmcGetCsd(&mut csd)), DResult::ParErr);

        assert_eq!(slots.ioctl(Ioctl::Trim { start: 1, end: 6 }), DResult::ParErr);
        assert_eq!(slots.ioctl(Ioctl::Trim { start: 1, end: 2 }), DResult::Ok);
        let data = slots.card(0).unwrap().data();
        assert_eq!(data[SECTOR_SIZE - 1], 0xff);
        assert!(data[SECTOR_SIZE..3 * SECTOR_SIZE].iter().all(|x| *x == 0));
        assert_eq!(data[3 * SECTOR_SIZE], 0xff);
    }

    #[test]
    fn media_change() {
        let mut a = [1u8; SECTOR_SIZE];
        let mut b = [2u8; SECTOR_SIZE];
        let mut slots = MemorySlots::<1>::new();
        slots.insert(0, MemoryCard::new(&mut a));
        slots.initialize();
        let old = slots.insert(0, MemoryCard::new(&mut b));
        assert_eq!(old.map(|c| c.data()[0]), Some(1));
        assert_eq!(slots.status(), DStatus::NOINIT);
        assert!(slots.eject(0).is_some());
        assert_eq!(slots.status(), DStatus::NOINIT | DStatus::NODISK);
    }
}
