//! Checks shared by card drivers.

use crate::{DResult, DStatus, Lba, SECTOR_SIZE};
use core::ops::Range;

/// Validate a sector transfer the way SD control modules do.
///
/// Returns the byte range on the medium or the result to report.
pub fn transfer_range(status: DStatus, sectors: Lba, len: usize, sector: Lba, count: u32) -> Result<Range<u64>, DResult> {
    if count == 0 {
        return Err(DResult::ParErr);
    }
    if status.contains(DStatus::NOINIT) {
        return Err(DResult::NotRdy);
    }
    let bytes = count as u64 * SECTOR_SIZE as u64;
    if (len as u64) < bytes {
        return Err(DResult::ParErr);
    }
    match sector.checked_add(count as Lba) {
        Some(end) if end <= sectors => {}
        _ => return Err(DResult::Error),
    }
    let start = sector * SECTOR_SIZE as u64;
    Ok(start..start + bytes)
}

/// Validate a trim request covering `start..=end`.
pub fn trim_range(sectors: Lba, start: Lba, end: Lba) -> Result<Range<u64>, DResult> {
    if start > end || end >= sectors {
        return Err(DResult::ParErr);
    }
    Ok(start * SECTOR_SIZE as u64..(end + 1) * SECTOR_SIZE as u64)
}
