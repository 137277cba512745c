//! Persists the route table in the last sector of on-chip flash.

use defmt::{info, warn};
use embassy_stm32::flash::{Blocking, Flash, WRITE_SIZE};
use midi_hub_lib::{
    route_table::IMAGE_LEN,
    storage::{MemoryStorage, Storage},
};

/// Offset (from the start of flash) of sector 11, the last 256 KiB sector of the STM32F767ZI in single-bank mode.
const SECTOR_START: u32 = 0x1C_0000;
const SECTOR_END: u32 = 0x20_0000;

/// Flash can only be programmed in whole words.
const PADDED_LEN: usize = IMAGE_LEN.next_multiple_of(WRITE_SIZE);

/// EEPROM emulation over a flash sector.
///
/// Flash can't be rewritten byte by byte, so reads and writes go to a RAM mirror; [`Storage::commit`] erases the sector
/// and programs the whole mirror back.
pub struct FlashEeprom<'d> {
    flash: Flash<'d, Blocking>,
    mirror: MemoryStorage<PADDED_LEN>,
}

impl<'d> FlashEeprom<'d> {
    /// Constructs a [`FlashEeprom`], filling the mirror from flash.
    pub fn new(flash: Flash<'d, Blocking>) -> Self {
        let mut eeprom = Self {
            flash,
            mirror: MemoryStorage::new(),
        };
        if let Err(e) = eeprom
            .flash
            .blocking_read(SECTOR_START, eeprom.mirror.as_bytes_mut())
        {
            // an erased mirror reads as an empty route table
            warn!("Could not read route sector: {}", e);
        }
        eeprom
    }
}

impl Storage for FlashEeprom<'_> {
    fn read_byte(&self, addr: usize) -> u8 {
        self.mirror.read_byte(addr)
    }

    fn write_byte(&mut self, addr: usize, value: u8) {
        self.mirror.write_byte(addr, value);
    }

    fn commit(&mut self) {
        if let Err(e) = self.flash.blocking_erase(SECTOR_START, SECTOR_END) {
            warn!("Could not erase route sector: {}", e);
            return;
        }
        match self
            .flash
            .blocking_write(SECTOR_START, self.mirror.as_bytes())
        {
            Ok(()) => info!("Routes written to flash"),
            Err(e) => warn!("Could not write route sector: {}", e),
        }
    }
}

