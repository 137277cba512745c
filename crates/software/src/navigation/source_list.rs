use super::{
    Outcome, PageContext, PageId, Screen,
    device_picker::{DevicePicker, Picked},
};
use crate::{input::InputEvent, render::Frame, text};

/// First step of the add-route wizard: lists every connected device as a potential source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SourceList {
    picker: DevicePicker,
}

impl Screen for SourceList {
    fn enter(&mut self, ctx: &mut PageContext) {
        self.picker.reset();
        self.picker.refresh(ctx.devices, None);
    }

    fn update(&mut self, ctx: &mut PageContext) -> bool {
        self.picker.refresh(ctx.devices, None)
    }

    fn render(&self, _ctx: &PageContext) -> Frame {
        let mut frame = Frame::new("Select Source");
        if self.picker.is_empty() {
            frame.line(text::truncate("No MIDI devices connected"));
        }
        self.picker.render_into(&mut frame);
        frame
    }

    fn handle_input(&mut self, event: InputEvent, ctx: &mut PageContext) -> Outcome {
        match self.picker.handle_input(event) {
            Picked::Device(device) => {
                debug!("Source {} chosen", device.name.as_str());
                ctx.wizard.source = Some(device);
                ctx.wizard.dest = None;
                Outcome::Navigate(PageId::DestList)
            }
            Picked::Nothing(outcome) => outcome,
        }
    }
}
