use super::{
    Outcome, PageContext, PageId, Screen,
    device_picker::{DevicePicker, Picked},
};
use crate::{device::DeviceId, input::InputEvent, render::Frame, text};

/// Second step of the add-route wizard: lists every connected device other than the chosen source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DestList {
    picker: DevicePicker,
}

impl Screen for DestList {
    fn enter(&mut self, ctx: &mut PageContext) {
        self.picker.reset();
        self.picker.refresh(ctx.devices, source_id(ctx));
    }

    fn update(&mut self, ctx: &mut PageContext) -> bool {
        self.picker.refresh(ctx.devices, source_id(ctx))
    }

    fn render(&self, ctx: &PageContext) -> Frame {
        let source = ctx.wizard.source.as_ref().map_or("", |device| device.name.as_str());

        let mut frame = Frame::new("Select Destination");
        frame.line(text::format(format_args!("From: {source}")));
        if self.picker.is_empty() {
            frame.line(text::truncate("No other devices connected"));
        }
        self.picker.render_into(&mut frame);
        frame
    }

    fn handle_input(&mut self, event: InputEvent, ctx: &mut PageContext) -> Outcome {
        match self.picker.handle_input(event) {
            Picked::Device(device) => {
                debug!("Destination {} chosen", device.name.as_str());
                ctx.wizard.dest = Some(device);
                Outcome::Navigate(PageId::ConfirmRoute)
            }
            Picked::Nothing(outcome) => outcome,
        }
    }
}

fn source_id(ctx: &PageContext) -> Option<DeviceId> {
    ctx.wizard.source.as_ref().map(|device| device.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        device::{DeviceRef, Slot},
        navigation::tests::*,
        render::BACK,
    };

    fn entered(fx: &mut Fixture, source: DeviceRef) -> DestList {
        fx.wizard.source = Some(source);
        let mut page = DestList::default();
        page.enter(&mut fx.ctx());
        page
    }

    #[test]
    fn excludes_source() {
        let mut fx = Fixture::new();
        let page = entered(&mut fx, DeviceRef::new(0x5678, 0x0002, "Synth"));
        let frame = page.render(&fx.ctx());
        assert_eq!("Select Destination", frame.header.as_str());
        assert_eq!("From: Synth", frame.lines[0].as_str());
        assert_eq!(&["Keyboard", "Drums", BACK][..], labels(&frame).as_slice());
    }

    #[test]
    fn exclusion_is_by_identity_not_slot() {
        let mut fx = Fixture::new();
        // Synth moves to another port after being chosen
        fx.devices.detach(Slot(1));
        fx.devices.attach(Slot(5), SYNTH, Some("Synth"));
        let page = entered(&mut fx, DeviceRef::new(0x5678, 0x0002, "Synth"));
        assert_eq!(&["Keyboard", "Drums", BACK][..], labels(&page.render(&fx.ctx())).as_slice());
    }

    #[test]
    fn only_source_connected() {
        let mut fx = Fixture::new();
        fx.devices.detach(Slot(1));
        fx.devices.detach(Slot(2));
        let page = entered(&mut fx, DeviceRef::new(0x1234, 0x0001, "Keyboard"));
        let frame = page.render(&fx.ctx());
        assert_eq!("No other devices connected", frame.lines[1].as_str());
        assert_eq!(&[BACK][..], labels(&frame).as_slice());
    }

    #[test]
    fn choosing_writes_wizard() {
        let mut fx = Fixture::new();
        let mut page = entered(&mut fx, DeviceRef::new(0x1234, 0x0001, "Keyboard"));
        page.handle_input(InputEvent::Down, &mut fx.ctx());
        assert_eq!(
            Outcome::Navigate(PageId::ConfirmRoute),
            page.handle_input(InputEvent::Enter, &mut fx.ctx())
        );
        assert_eq!(Some(DRUMS), fx.wizard.dest.as_ref().map(|device| device.id));
    }

    #[test]
    fn new_device_redraws() {
        let mut fx = Fixture::new();
        let mut page = entered(&mut fx, DeviceRef::new(0x1234, 0x0001, "Keyboard"));
        assert!(!page.update(&mut fx.ctx()));
        fx.devices.attach(Slot(4), DeviceId::new(1, 2), Some("Sampler"));
        assert!(page.update(&mut fx.ctx()), "A new candidate should trigger a redraw");
    }
}
