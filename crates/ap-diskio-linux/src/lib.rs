//! Linux specific SD/MMC driver.
//!
//! Every slot holds a disk image instead of a card. Writes count as busy
//! until they are synced, so waiting for the bus flushes the image.

use ap_diskio::{DResult, DStatus, Error, Ioctl, Lba, MmcDriver, Pdrv};

mod card;
pub use card::ImageCard;

/// Card slots holding disk images.
#[derive(Default)]
pub struct ImageSlots {
    cards: Vec<Option<ImageCard>>,
    slot: Pdrv,
}

impl ImageSlots {
    /// Create `n` empty slots.
    pub fn new(n: usize) -> Self {
        Self {
            cards: (0..n).map(|_| None).collect(),
            slot: 0,
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Are there no slots at all?
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Put a card into a slot, adding slots as needed. Returns the previous card.
    pub fn insert(&mut self, slot: Pdrv, mut card: ImageCard) -> Option<ImageCard> {
        let index = slot as usize;
        if index >= self.cards.len() {
            self.cards.resize_with(index + 1, || None);
        }
        card.media_changed();
        self.cards[index].replace(card)
    }

    /// Open an image into a slot.
    pub fn open(&mut self, slot: Pdrv, filename: &str, readonly: bool) -> Result<(), Error> {
        let card = ImageCard::open(filename, readonly)?;
        log::debug!("slot {slot}: {filename} with {} sectors", card.sectors());
        self.insert(slot, card);
        Ok(())
    }

    /// Remove the card from a slot.
    pub fn eject(&mut self, slot: Pdrv) -> Option<ImageCard> {
        self.cards.get_mut(slot as usize)?.take()
    }

    /// The card in a slot.
    pub fn card(&self, slot: Pdrv) -> Option<&ImageCard> {
        self.cards.get(slot as usize)?.as_ref()
    }

    fn current(&mut self) -> Result<&mut ImageCard, DResult> {
        match self.cards.get_mut(self.slot as usize) {
            None => Err(DResult::ParErr),
            Some(None) => Err(DResult::NotRdy),
            Some(Some(card)) => Ok(card),
        }
    }
}

impl MmcDriver for ImageSlots {
    fn slot(&self) -> Pdrv {
        self.slot
    }

    fn set_slot(&mut self, slot: Pdrv) {
        self.slot = slot;
    }

    fn wait_busy_spi(&mut self) {
        if let Ok(card) = self.current() {
            if card.flush() != DResult::Ok {
                log::warn!("slot {}: flush failed", self.slot);
            }
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
