//! Copy sectors between two slots.
//!
//! Every sector is read from one drive and written to the other, so the
//! bus switches drives twice per sector.

use ap_diskio::{check, msg2err, DiskIo, Error, Ioctl, SECTOR_SIZE};
use ap_diskio_examples::{init_logger, open_slots, sector_range, slot_specs};
use ap_diskio_sdc::{SdcGlue, READONLY};
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

    /// The source slot.
    #[options(meta = "N", default = "0")]
    from: u8,

    /// The destination slot.
    #[options(meta = "N", default = "1")]
    to: u8,

    /// First sector to copy.
    #[options(meta = "LBA")]
    sector: u64,

    /// First sector to write. Defaults to the source sector.
    #[options(meta = "LBA")]
    dest: Option<u64>,

    /// Number of sectors. Zero copies up to the end of the source.
    #[options(meta = "N")]
    count: u64,

    /// Disk images per slot. Append ':ro' for read-only.
    #[options(free)]
    images: Vec<String>,
}

fn main() -> Result<(), Error> {
    let opts = CommandOptions::parse_args_default_or_exit();
    init_logger(opts.verbose);
    if READONLY {
        return Err(msg2err!("built without write support"));
    }
    let specs = slot_specs(&opts.images, opts.config.as_deref())?;
    let mut glue = SdcGlue::new(open_slots(&specs)?);

    for pdrv in [opts.from, opts.to] {
        let status = glue.disk_initialize(pdrv);
        if !status.is_ready() {
            return Err(msg2err!(format!("drive {pdrv}: {status:?}")));
        }
    }
    let mut sectors = 0;
    check!(glue.disk_ioctl(opts.from, Ioctl::GetSectorCount(&mut sectors)).into_result());
    let count = match opts.count {
        0 => sectors.saturating_sub(opts.sector),
        n => n,
    };
    let src = sector_range(opts.sector, count)?;
    let dst = sector_range(opts.dest.unwrap_or(opts.sector), count)?;

    let mut buf = [0u8; SECTOR_SIZE];
    for (from, to) in src.zip(dst) {
        check!(glue.disk_read(opts.from, &mut buf, from, 1).into_result());
        check!(glue.write(opts.to, &buf, to, 1).into_result());
    }
    check!(glue.disk_ioctl(opts.to, Ioctl::Sync).into_result());
    log::info!("copied {count} sectors from drive {} to drive {}", opts.from, opts.to);
    println!("{count}");
    Ok(())
}
