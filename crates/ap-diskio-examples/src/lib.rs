//! Shared helpers of the example applications.
//!
//! Slots are given as free arguments `image[:ro]` or by a JSON file:
//!
//! ```json
//! {"slots": [{"image": "a.img", "readonly": false}, null, "b.img:ro"]}
//! ```

use ap_diskio::{check, msg2err, Error, Lba, Pdrv};
use ap_diskio_linux::ImageSlots;
use std::ops::Range;
use serde_json::Value;

/// What goes into a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSpec {
    pub image: String,
    pub readonly: bool,
}

impl SlotSpec {
    /// Parse `image[:ro]`.
    pub fn parse(arg: &str) -> Self {
        match arg.strip_suffix(":ro") {
            Some(image) => Self {
                image: image.to_string(),
                readonly: true,
            },
            None => Self {
                image: arg.to_string(),
                readonly: false,
            },
        }
    }
}

/// Parse a JSON slot table. `null` leaves a slot empty.
pub fn parse_config(data: &[u8]) -> Result<Vec<Option<SlotSpec>>, Error> {
    let root: Value = serde_json::from_slice(data).map_err(|e| msg2err!(e))?;
    let slots = root
        .get("slots")
        .and_then(Value::as_array)
        .ok_or(msg2err!("no slots array"))?;
    slots
        .iter()
        .enumerate()
        .map(|(i, v)| -> Result<Option<SlotSpec>, Error> {
            match v {
                Value::Null => Ok(None),
                Value::String(s) => Ok(Some(SlotSpec::parse(s))),
                Value::Object(o) => {
                    let image = o
                        .get("image")
                        .and_then(Value::as_str)
                        .ok_or(msg2err!(format!("slot {i}: no image")))?;
                    let readonly = match o.get("readonly") {
                        None => false,
                        Some(x) => x.as_bool().ok_or(msg2err!(format!("slot {i}: readonly is not a bool")))?,
                    };
                    Ok(Some(SlotSpec {
                        image: image.to_string(),
                        readonly,
                    }))
                }
                _ => Err(msg2err!(format!("slot {i}: invalid entry"))),
            }
        })
        .collect()
}

/// Collect the slots from an optional config file followed by the free arguments.
pub fn slot_specs(images: &[String], config: Option<&str>) -> Result<Vec<Option<SlotSpec>>, Error> {
    let mut res = match config {
        Some(filename) => {
            let data = std::fs::read(filename).map_err(|e| Error::from(e).context(format!("read {filename}")))?;
            check!(parse_config(&data))
        }
        None => Vec::new(),
    };
    res.extend(images.iter().map(|x| Some(SlotSpec::parse(x))));
    if res.len() > Pdrv::MAX as usize + 1 {
        return Err(msg2err!("too many slots"));
    }
    Ok(res)
}

/// Open all images into their slots.
pub fn open_slots(specs: &[Option<SlotSpec>]) -> Result<ImageSlots, Error> {
    let mut slots = ImageSlots::new(specs.len());
    for (pdrv, spec) in (0..=Pdrv::MAX).zip(specs) {
        if let Some(spec) = spec {
            check!(slots.open(pdrv, &spec.image, spec.readonly));
        }
    }
    Ok(slots)
}

/// The sectors `first..first + count`.
pub fn sector_range(first: Lba, count: u64) -> Result<Range<Lba>, Error> {
    let end = first.checked_add(count).ok_or(msg2err!("sector range overflows"))?;
    Ok(first..end)
}

/// Log to stderr, filtered by `RUST_LOG`.
pub fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
