//! Initialize every slot and show what the driver reports.

use ap_diskio::{check, CardType, Error, Ioctl, Pdrv};
use ap_diskio_examples::{init_logger, open_slots, slot_specs};
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

    /// Disk images per slot. Append ':ro' for read-only.
    #[options(free)]
    images: Vec<String>,
}

fn main() -> Result<(), Error> {
    let opts = CommandOptions::parse_args_default_or_exit();
    init_logger(opts.verbose);
    let specs = slot_specs(&opts.images, opts.config.as_deref())?;
    let mut glue = SdcGlue::new(open_slots(&specs)?);

    for (pdrv, spec) in (0..=Pdrv::MAX).zip(&specs) {
        let status = glue.disk_initialize(pdrv);
        let name = spec.as_ref().map(|s| s.image.as_str()).unwrap_or("-");
        if !status.is_ready() {
            println!("{pdrv}\t{name}\t{status:?}");
            continue;
        }
        let mut sectors = 0;
        let mut size = 0;
        let mut typ = 0;
        check!(glue.disk_ioctl(pdrv, Ioctl::GetSectorCount(&mut sectors)).into_result());
        check!(glue.disk_ioctl(pdrv, Ioctl::GetSectorSize(&mut size)).into_result());
        check!(glue.disk_ioctl(pdrv, Ioctl::MmcGetType(&mut typ)).into_result());
        println!(
            "{pdrv}\t{name}\t{status:?}\t{sectors}\t{size}\t{:?}",
            CardType::from_bits_truncate(typ)
        );
    }
    Ok(())
}
