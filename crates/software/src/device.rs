use crate::{configuration::MAX_MIDI_DEVICES, text};
use heapless::String;

/// Maximum length in bytes of a device name as reported by the USB host.
pub const DEVICE_NAME_LEN: usize = 31;

/// A device's name, as reported by its USB product string.
pub type DeviceName = String<DEVICE_NAME_LEN>;

/// The stable identity of a USB device: its vendor and product IDs (VID:PID).
///
/// Routes are keyed by identity so they survive re-plugging a device into another port.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId {
    /// USB vendor ID.
    pub vendor_id: u16,
    /// USB product ID.
    pub product_id: u16,
}

impl DeviceId {
    /// Constructs a [`DeviceId`].
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

/// An attached device: its identity plus a human-readable name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceRef {
    /// Identity used for routing and persistence.
    pub id: DeviceId,
    /// Display name, truncated to [`DEVICE_NAME_LEN`] bytes.
    pub name: DeviceName,
}

impl DeviceRef {
    /// Constructs a [`DeviceRef`], truncating `name` as needed.
    pub fn new(vendor_id: u16, product_id: u16, name: &str) -> Self {
        Self {
            id: DeviceId::new(vendor_id, product_id),
            name: text::truncate(name),
        }
    }
}

/// A transient index into the device directory.
///
/// Slots are reused as devices come and go, so a slot is only ever a hint about where a device currently lives. It
/// must never be persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Slot(pub u8);

impl Slot {
    /// The slot's position in the directory.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// Read-only view of the devices currently attached to the hub.
pub trait DeviceDirectory {
    /// Number of slots, connected or not.
    fn slot_count(&self) -> usize;

    /// Returns `true` if a device currently occupies `slot`.
    fn is_connected(&self, slot: Slot) -> bool;

    /// Returns the device occupying `slot`, if any.
    fn info(&self, slot: Slot) -> Option<DeviceRef>;

    /// Returns the slot of the first connected device with the given identity.
    fn find_slot(&self, id: DeviceId) -> Option<Slot>;
}

/// Iterates over the slots of `devices` which currently hold a device, in slot order.
pub fn connected_slots(devices: &dyn DeviceDirectory) -> impl Iterator<Item = Slot> + '_ {
    (0..devices.slot_count())
        .filter_map(|i| u8::try_from(i).ok().map(Slot))
        .filter(|&slot| devices.is_connected(slot))
}

/// Change in the set of attached devices.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceEvent {
    /// A device was attached to the given slot.
    Connected(Slot, DeviceRef),
    /// The device in the given slot was detached. The reference describes the device as it was before removal.
    Disconnected(Slot, DeviceRef),
}

/// A fixed table of device slots, filled in by the USB host driver as devices enumerate.
#[derive(Clone, Debug, Default)]
pub struct SlotDirectory {
    slots: [Option<DeviceRef>; MAX_MIDI_DEVICES],
}

impl SlotDirectory {
    /// Constructs an empty [`SlotDirectory`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a device enumerated in `slot`.
    ///
    /// The device is named after its USB product string; when the device doesn't report one, it is named after its
    /// VID:PID instead. Returns `None` if the slot is out of range or already held by the same device.
    pub fn attach(&mut self, slot: Slot, id: DeviceId, product: Option<&str>) -> Option<DeviceEvent> {
        let entry = self.slots.get_mut(slot.index())?;
        if entry.as_ref().is_some_and(|device| device.id == id) {
            return None;
        }

        let name = match product {
            Some(product) if !product.is_empty() => text::truncate(product),
            _ => text::format(format_args!(
                "Device {:04X}:{:04X}",
                id.vendor_id, id.product_id
            )),
        };
        let device = DeviceRef { id, name };
        info!(
            "Device {} attached to slot {}",
            device.name.as_str(),
            slot.0
        );
        *entry = Some(device.clone());
        Some(DeviceEvent::Connected(slot, device))
    }

    /// Records that the device in `slot` went away. Returns `None` if the slot was already empty.
    pub fn detach(&mut self, slot: Slot) -> Option<DeviceEvent> {
        let device = self.slots.get_mut(slot.index())?.take()?;
        info!(
            "Device {} detached from slot {}",
            device.name.as_str(),
            slot.0
        );
        Some(DeviceEvent::Disconnected(slot, device))
    }

    /// Number of slots currently holding a device.
    pub fn connected_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}

impl DeviceDirectory for SlotDirectory {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn is_connected(&self, slot: Slot) -> bool {
        matches!(self.slots.get(slot.index()), Some(Some(_)))
    }

    fn info(&self, slot: Slot) -> Option<DeviceRef> {
        self.slots.get(slot.index())?.clone()
    }

    fn find_slot(&self, id: DeviceId) -> Option<Slot> {
        self.slots
            .iter()
            .position(|entry| entry.as_ref().is_some_and(|device| device.id == id))
            .and_then(|i| u8::try_from(i).ok())
            .map(Slot)
    }
}
