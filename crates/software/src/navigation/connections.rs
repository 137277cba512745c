use super::{ListCursor, Outcome, PageContext, Screen, confirm};
use crate::{
    device::{DeviceDirectory, DeviceId},
    input::InputEvent,
    render::{BACK, Frame, Label, Row},
    route_table::Route,
    text,
};

/// Lists the configured routes and lets the user delete them.
///
/// Each endpoint is marked "(off)" while no device with its identity is attached. Choosing a route opens a delete
/// prompt on the same page rather than a page of its own.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Connections {
    cursor: ListCursor,
    deleting: bool,
    yes_selected: bool,
    /// Route count and endpoint availability when last checked
    seen: (usize, u32),
}

impl Default for Connections {
    fn default() -> Self {
        Self {
            cursor: ListCursor::default(),
            deleting: false,
            yes_selected: true,
            seen: (0, 0),
        }
    }
}

impl Screen for Connections {
    fn enter(&mut self, ctx: &mut PageContext) {
        *self = Self::default();
        self.seen = availability(ctx.routes.routes(), ctx.devices);
    }

    fn update(&mut self, ctx: &mut PageContext) -> bool {
        let seen = availability(ctx.routes.routes(), ctx.devices);
        if seen == self.seen {
            return false;
        }
        if seen.0 < self.seen.0 {
            self.cursor.clamp(seen.0);
        }
        self.seen = seen;
        true
    }

    fn render(&self, ctx: &PageContext) -> Frame {
        let routes = ctx.routes.routes();

        if let Some(route) = routes.get(self.cursor.selected()).filter(|_| self.deleting) {
            let mut frame = Frame::new("Delete Route?");
            frame.line(text::format(format_args!(
                "{} -> {}",
                route.source_name, route.dest_name
            )));
            frame.overlay = Some(confirm(
                "Delete this route?",
                "Yes, delete",
                "No, cancel",
                self.yes_selected,
            ));
            return frame;
        }

        let mut frame = Frame::new("Connections");
        if routes.is_empty() {
            frame.line(text::truncate("No routes configured"));
        }
        for route in routes {
            frame.row(describe(route, ctx.devices));
        }
        frame.row(Row::centered(BACK));
        frame.selected = self.cursor.selected();
        frame
    }

    fn handle_input(&mut self, event: InputEvent, ctx: &mut PageContext) -> Outcome {
        let count = ctx.routes.routes().len();

        if self.deleting {
            return match event {
                InputEvent::Up | InputEvent::Down => {
                    self.yes_selected = !self.yes_selected;
                    Outcome::Redraw
                }
                InputEvent::Enter => {
                    if self.yes_selected {
                        if let Err(e) = ctx.routes.remove_by_index(self.cursor.selected()) {
                            warn!("Could not delete route: {}", e);
                        }
                        self.cursor.clamp(ctx.routes.routes().len());
                    }
                    self.deleting = false;
                    Outcome::Redraw
                }
                InputEvent::None => Outcome::Ignored,
            };
        }

        match event {
            InputEvent::Enter if self.cursor.on_back(count) => Outcome::Back,
            InputEvent::Enter => {
                self.deleting = true;
                self.yes_selected = true;
                Outcome::Redraw
            }
            _ if self.cursor.step(event, count) => Outcome::Redraw,
            _ => Outcome::Ignored,
        }
    }
}

/// Builds a route's row, flagging endpoints which aren't currently attached.
fn describe(route: &Route, devices: &dyn DeviceDirectory) -> Row {
    let endpoint = |name: &str, id: DeviceId| -> Label {
        if devices.find_slot(id).is_some() {
            text::truncate(name)
        } else {
            text::format(format_args!("{name} (off)"))
        }
    };
    Row {
        left: endpoint(route.source_name.as_str(), route.source),
        center: text::truncate("->"),
        right: endpoint(route.dest_name.as_str(), route.dest),
    }
}

/// Summarizes what the list looks like: the number of routes, plus a bit per endpoint which is attached.
fn availability(routes: &[Route], devices: &dyn DeviceDirectory) -> (usize, u32) {
    let online = routes
        .iter()
        .flat_map(|route| [route.source, route.dest])
        .enumerate()
        .filter(|&(_, id)| devices.find_slot(id).is_some())
        .fold(0_u32, |bits, (i, _)| bits | 1_u32.checked_shl(i as u32).unwrap_or(0));
    (routes.len(), online)
}
