use super::{ListCursor, Outcome};
use crate::{
    configuration::MAX_MIDI_DEVICES,
    device::{DeviceDirectory, DeviceId, DeviceRef, connected_slots},
    input::InputEvent,
    render::{BACK, Frame, Row},
};
use heapless::Vec;

/// A selectable list of the connected devices, followed by "Back". Shared by both device-choosing steps of the
/// add-route wizard.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct DevicePicker {
    cursor: ListCursor,
    candidates: Vec<DeviceRef, MAX_MIDI_DEVICES>,
}

/// What the user did with the picker.
pub(crate) enum Picked {
    Device(DeviceRef),
    Nothing(Outcome),
}

impl DevicePicker {
    /// Re-reads the connected devices, leaving out `exclude`. Returns `true` if the list changed. When it shrank, the
    /// cursor is clamped to it.
    pub(crate) fn refresh(&mut self, devices: &dyn DeviceDirectory, exclude: Option<DeviceId>) -> bool {
        let candidates = connected_slots(devices)
            .filter_map(|slot| devices.info(slot))
            .filter(|device| Some(device.id) != exclude)
            .take(MAX_MIDI_DEVICES)
            .collect::<Vec<_, MAX_MIDI_DEVICES>>();
        if candidates == self.candidates {
            return false;
        }

        if candidates.len() < self.candidates.len() {
            self.cursor.clamp(candidates.len());
        }
        self.candidates = candidates;
        true
    }

    pub(crate) fn reset(&mut self) {
        self.cursor.reset();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Adds a row per candidate plus "Back" to `frame`.
    pub(crate) fn render_into(&self, frame: &mut Frame) {
        for device in &self.candidates {
            frame.row(Row::centered(&device.name));
        }
        frame.row(Row::centered(BACK));
        frame.selected = self.cursor.selected();
    }

    pub(crate) fn handle_input(&mut self, event: InputEvent) -> Picked {
        let items = self.candidates.len();
        match event {
            InputEvent::Enter if self.cursor.on_back(items) => Picked::Nothing(Outcome::Back),
            InputEvent::Enter => match self.candidates.get(self.cursor.selected()) {
                Some(device) => Picked::Device(device.clone()),
                None => Picked::Nothing(Outcome::Ignored),
            },
            _ if self.cursor.step(event, items) => Picked::Nothing(Outcome::Redraw),
            _ => Picked::Nothing(Outcome::Ignored),
        }
    }
}
