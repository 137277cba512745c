use super::{ListCursor, Outcome, PageContext, PageId, Screen};
use crate::{
    input::InputEvent,
    render::{Frame, Row},
};

const ENTRIES: [(&str, PageId); 2] = [
    ("Add Route", PageId::SourceList),
    ("View Connections", PageId::Connections),
];

/// The top-level menu.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MainMenu {
    cursor: ListCursor,
}

impl Screen for MainMenu {
    fn enter(&mut self, _ctx: &mut PageContext) {
        self.cursor.reset();
    }

    fn update(&mut self, _ctx: &mut PageContext) -> bool {
        false
    }

    fn render(&self, _ctx: &PageContext) -> Frame {
        let mut frame = Frame::new("Main Menu");
        for (label, _) in ENTRIES {
            frame.row(Row::centered(label));
        }
        frame.selected = self.cursor.selected();
        frame
    }

    fn handle_input(&mut self, event: InputEvent, _ctx: &mut PageContext) -> Outcome {
        if event == InputEvent::Enter {
            return ENTRIES
                .get(self.cursor.selected())
                .map_or(Outcome::Ignored, |&(_, page)| Outcome::Navigate(page));
        }

        // no Back row here, so the cursor ranges over one fewer entry
        if self.cursor.step(event, ENTRIES.len() - 1) {
            Outcome::Redraw
        } else {
            Outcome::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::tests::*;

    #[test]
    fn render_and_select() {
        let mut fx = Fixture::new();
        let mut page = MainMenu::default();
        page.enter(&mut fx.ctx());

        let frame = page.render(&fx.ctx());
        assert_eq!("Main Menu", frame.header.as_str());
        assert_eq!(&["Add Route", "View Connections"][..], labels(&frame).as_slice());
        assert_eq!(0, frame.selected);

        assert_eq!(
            Outcome::Ignored,
            page.handle_input(InputEvent::Up, &mut fx.ctx()),
            "Already at the top"
        );
        assert_eq!(Outcome::Redraw, page.handle_input(InputEvent::Down, &mut fx.ctx()));
        assert_eq!(
            Outcome::Ignored,
            page.handle_input(InputEvent::Down, &mut fx.ctx()),
            "Already at the bottom"
        );
        assert_eq!(
            Outcome::Navigate(PageId::Connections),
            page.handle_input(InputEvent::Enter, &mut fx.ctx()),
            "Expected left but got right"
        );
    }

    #[test]
    fn add_route_starts_wizard() {
        let mut fx = Fixture::new();
        let mut page = MainMenu::default();
        assert_eq!(
            Outcome::Navigate(PageId::SourceList),
            page.handle_input(InputEvent::Enter, &mut fx.ctx())
        );
    }
}
