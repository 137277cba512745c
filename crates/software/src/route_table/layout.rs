//! Persisted image of the route table.
//!
//! ```text
//! addr 0      magic, u16 little-endian (0x4D52)
//! addr 2      format version (2)
//! addr 3      route count (0..=16)
//! addr 4 + 56 * i
//!    +0       source vendor ID, u16 LE
//!    +2       source product ID, u16 LE
//!    +4       destination vendor ID, u16 LE
//!    +6       destination product ID, u16 LE
//!    +8       source name, 24 bytes NUL-padded
//!    +32      destination name, 24 bytes NUL-padded
//! ```
//!
//! Only `count` records are written; bytes past the last record are left as they were.

use super::Route;
use crate::{configuration::MAX_ROUTES, device::DeviceId, storage::Storage, text};
use tinyvec::ArrayVec;

const MAGIC: u16 = 0x4D52;
const VERSION: u8 = 2;

const MAGIC_ADDR: usize = 0;
const VERSION_ADDR: usize = 2;
const COUNT_ADDR: usize = 3;
const RECORDS_ADDR: usize = 4;

const NAME_FIELD_LEN: usize = 24;
const NAMES_OFFSET: usize = 8;
const RECORD_LEN: usize = NAMES_OFFSET + 2 * NAME_FIELD_LEN;

/// Bytes of storage a full table occupies.
pub const IMAGE_LEN: usize = RECORDS_ADDR + MAX_ROUTES * RECORD_LEN;

/// Reasons a stored image is rejected on load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigCorrupt {
    /// The magic number is missing: storage is blank or holds something else.
    #[error("bad magic {0:#06x}")]
    BadMagic(u16),
    /// The image was written by an incompatible firmware version.
    #[error("unsupported version {0}")]
    BadVersion(u8),
    /// The route count exceeds the table's capacity.
    #[error("route count {0} exceeds capacity")]
    BadCount(u8),
    /// Two records share a key.
    #[error("duplicate route at record {0}")]
    DuplicateKey(u8),
}

pub(super) fn read(storage: &impl Storage) -> Result<ArrayVec<[Route; MAX_ROUTES]>, ConfigCorrupt> {
    let magic = read_u16(storage, MAGIC_ADDR);
    if magic != MAGIC {
        return Err(ConfigCorrupt::BadMagic(magic));
    }
    let version = storage.read_byte(VERSION_ADDR);
    if version != VERSION {
        return Err(ConfigCorrupt::BadVersion(version));
    }
    let count = storage.read_byte(COUNT_ADDR);
    if usize::from(count) > MAX_ROUTES {
        return Err(ConfigCorrupt::BadCount(count));
    }

    let mut routes = ArrayVec::<[Route; MAX_ROUTES]>::new();
    for i in 0..count {
        let route = read_record(storage, RECORDS_ADDR + usize::from(i) * RECORD_LEN);
        if routes.iter().any(|existing| existing.key() == route.key()) {
            return Err(ConfigCorrupt::DuplicateKey(i));
        }
        routes.push(route);
    }
    Ok(routes)
}

pub(super) fn write(routes: &[Route], storage: &mut impl Storage) {
    let routes = &routes[..routes.len().min(MAX_ROUTES)];

    write_u16(storage, MAGIC_ADDR, MAGIC);
    storage.write_byte(VERSION_ADDR, VERSION);
    // bounded by MAX_ROUTES above
    storage.write_byte(COUNT_ADDR, routes.len() as u8);

    for (i, route) in routes.iter().enumerate() {
        write_record(storage, RECORDS_ADDR + i * RECORD_LEN, route);
    }
}

fn read_record(storage: &impl Storage, base: usize) -> Route {
    let mut names = [0_u8; 2 * NAME_FIELD_LEN];
    for (i, byte) in names.iter_mut().enumerate() {
        *byte = storage.read_byte(base + NAMES_OFFSET + i);
    }
    let (source_name, dest_name) = names.split_at(NAME_FIELD_LEN);

    Route {
        source: DeviceId::new(read_u16(storage, base), read_u16(storage, base + 2)),
        source_name: text::decode_fixed(source_name),
        dest: DeviceId::new(read_u16(storage, base + 4), read_u16(storage, base + 6)),
        dest_name: text::decode_fixed(dest_name),
        active: true,
    }
}

fn write_record(storage: &mut impl Storage, base: usize, route: &Route) {
    write_u16(storage, base, route.source.vendor_id);
    write_u16(storage, base + 2, route.source.product_id);
    write_u16(storage, base + 4, route.dest.vendor_id);
    write_u16(storage, base + 6, route.dest.product_id);

    let mut names = [0_u8; 2 * NAME_FIELD_LEN];
    let (source_name, dest_name) = names.split_at_mut(NAME_FIELD_LEN);
    text::encode_fixed(&route.source_name, source_name);
    text::encode_fixed(&route.dest_name, dest_name);
    for (i, &byte) in names.iter().enumerate() {
        storage.write_byte(base + NAMES_OFFSET + i, byte);
    }
}

fn read_u16(storage: &impl Storage, addr: usize) -> u16 {
    u16::from_le_bytes([storage.read_byte(addr), storage.read_byte(addr + 1)])
}

fn write_u16(storage: &mut impl Storage, addr: usize, value: u16) {
    let [lo, hi] = value.to_le_bytes();
    storage.write_byte(addr, lo);
    storage.write_byte(addr + 1, hi);
}
