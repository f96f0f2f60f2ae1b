//! Hex-dump sectors of a slot.

use ap_diskio::{check, msg2err, Error, SECTOR_SIZE};
use ap_diskio_examples::{init_logger, open_slots, sector_range, slot_specs};
use ap_diskio_sdc::SdcGlue;
use gumdrop::Options;

#[derive(Debug, Options)]
struct CommandOptions {
    /// Print the help message.
    help: bool,

    /// Verbose output.
    verbose: bool,

    /// JSON file describing the slots.
    #[options(meta = "FILE")]
    config: Option<String>,

    /// The slot to read from.
    #[options(meta = "N")]
    drive: u8,

    /// The first sector.
    #[options(meta = "LBA")]
    sector: u64,

    /// Number of sectors.
    #[options(meta = "N", default = "1")]
    count: u32,

    /// Disk images per slot. Append ':ro' for read-only.
    #[options(free)]
    images: Vec<String>,
}

fn dump(offset: u64, data: &[u8]) {
    for (i, line) in data.chunks(16).enumerate() {
        let hex: Vec<_> = line.iter().map(|b| format!("{b:02x}")).collect();
        let text: String = line
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        println!("{:08x}  {:<47}  {text}", offset + (i * 16) as u64, hex.join(" "));
    }
}

fn main() -> Result<(), Error> {
    let opts = CommandOptions::parse_args_default_or_exit();
    init_logger(opts.verbose);
    let specs = slot_specs(&opts.images, opts.config.as_deref())?;
    let mut glue = SdcGlue::new(open_slots(&specs)?);

    let status = glue.disk_initialize(opts.drive);
    if !status.is_ready() {
        return Err(msg2err!(format!("drive {}: {status:?}", opts.drive)));
    }
    let mut buf = [0u8; SECTOR_SIZE];
    for sector in sector_range(opts.sector, opts.count as u64)? {
        check!(glue.disk_read(opts.drive, &mut buf, sector, 1).into_result());
        dump(sector * SECTOR_SIZE as u64, &buf);
    }
    Ok(())
}
