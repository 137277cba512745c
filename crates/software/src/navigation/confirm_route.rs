use super::{Outcome, PageContext, Screen, confirm};
use crate::{device::DeviceRef, input::InputEvent, render::Frame, text, timed_queue::Message};

/// Last step of the add-route wizard: asks whether to create the chosen route.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfirmRoute {
    yes_selected: bool,
}

impl Default for ConfirmRoute {
    fn default() -> Self {
        Self { yes_selected: true }
    }
}

impl Screen for ConfirmRoute {
    fn enter(&mut self, _ctx: &mut PageContext) {
        self.yes_selected = true;
    }

    fn update(&mut self, _ctx: &mut PageContext) -> bool {
        false
    }

    fn render(&self, ctx: &PageContext) -> Frame {
        let mut frame = Frame::new("Confirm Route");
        frame
            .line(text::format(format_args!("Route: {}", name(&ctx.wizard.source))))
            .line(text::format(format_args!("    -> {}", name(&ctx.wizard.dest))));
        frame.overlay = Some(confirm(
            "Create this route?",
            "Yes, create route",
            "No, cancel",
            self.yes_selected,
        ));
        frame
    }

    fn handle_input(&mut self, event: InputEvent, ctx: &mut PageContext) -> Outcome {
        match event {
            InputEvent::Up | InputEvent::Down => {
                self.yes_selected = !self.yes_selected;
                Outcome::Redraw
            }
            InputEvent::Enter if self.yes_selected => {
                let (Some(source), Some(dest)) = (&ctx.wizard.source, &ctx.wizard.dest) else {
                    warn!("Route confirmed without a complete selection");
                    return Outcome::Back;
                };

                let message: Message = match ctx.routes.add_route(source, dest) {
                    Ok(()) => text::truncate("Route created"),
                    Err(e) => {
                        info!("Route not created: {}", e);
                        text::format(format_args!("{e}"))
                    }
                };
                ctx.notify(&message);
                Outcome::ReturnToMenu
            }
            InputEvent::Enter => Outcome::Back,
            InputEvent::None => Outcome::Ignored,
        }
    }
}

fn name(device: &Option<DeviceRef>) -> &str {
    device.as_ref().map_or("", |device| device.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{configuration::MAX_ROUTES, navigation::tests::*, render::Overlay};

    fn entered(fx: &mut Fixture) -> ConfirmRoute {
        fx.wizard.source = Some(DeviceRef::new(0x1234, 0x0001, "Keyboard"));
        fx.wizard.dest = Some(DeviceRef::new(0x5678, 0x0002, "Synth"));
        let mut page = ConfirmRoute::default();
        page.enter(&mut fx.ctx());
        page
    }

    #[test]
    fn render_shows_route_and_prompt() {
        let mut fx = Fixture::new();
        let page = entered(&mut fx);
        let frame = page.render(&fx.ctx());
        assert_eq!("Confirm Route", frame.header.as_str());
        assert_eq!("Route: Keyboard", frame.lines[0].as_str());
        assert_eq!("    -> Synth", frame.lines[1].as_str());
        assert_eq!(
            Some(confirm("Create this route?", "Yes, create route", "No, cancel", true)),
            frame.overlay,
            "Yes should be preselected"
        );
    }

    #[test]
    fn up_and_down_toggle() {
        let mut fx = Fixture::new();
        let mut page = entered(&mut fx);
        page.handle_input(InputEvent::Down, &mut fx.ctx());
        assert!(matches!(
            page.render(&fx.ctx()).overlay,
            Some(Overlay::Confirm { yes_selected: false, .. })
        ));
        page.handle_input(InputEvent::Up, &mut fx.ctx());
        assert!(matches!(
            page.render(&fx.ctx()).overlay,
            Some(Overlay::Confirm { yes_selected: true, .. })
        ));
    }

    #[test]
    fn yes_creates_route() {
        let mut fx = Fixture::new();
        let mut page = entered(&mut fx);
        assert_eq!(Outcome::ReturnToMenu, page.handle_input(InputEvent::Enter, &mut fx.ctx()));
        assert!(fx.routes.should_route(KEYBOARD, SYNTH));
        assert_eq!(Some("Route created"), fx.notifications.current());
    }

    #[test]
    fn yes_on_duplicate_reports() {
        let mut fx = Fixture::new();
        let mut page = entered(&mut fx);
        page.handle_input(InputEvent::Enter, &mut fx.ctx());
        page.handle_input(InputEvent::Enter, &mut fx.ctx());
        assert_eq!(1, fx.routes.len());
        assert!(fx.notifications.iter().eq(["Route created", "Route already exists"]));
    }

    #[test]
    fn yes_on_full_table_reports() {
        let mut fx = Fixture::new();
        for n in 0..MAX_ROUTES as u16 {
            fx.routes
                .add_route(&DeviceRef::new(n, n, "In"), &DeviceRef::new(n, n + 1, "Out"))
                .unwrap();
        }
        let mut page = entered(&mut fx);
        assert_eq!(Outcome::ReturnToMenu, page.handle_input(InputEvent::Enter, &mut fx.ctx()));
        assert_eq!(Some("Max routes reached!"), fx.notifications.current());
    }

    #[test]
    fn no_goes_back_one_level() {
        let mut fx = Fixture::new();
        let mut page = entered(&mut fx);
        page.handle_input(InputEvent::Down, &mut fx.ctx());
        assert_eq!(Outcome::Back, page.handle_input(InputEvent::Enter, &mut fx.ctx()));
        assert!(fx.routes.is_empty());
        assert!(fx.notifications.is_empty());
    }
}
