//! The rendering model shared by every display.
//!
//! Pages describe what should be on screen as a [`Frame`] of text rows; a [`Surface`] decides how that looks on a
//! particular display. Nothing outside a surface ever deals in pixels or cursor positions.

use crate::{sleep::Bounce, text, timed_queue::Message};
use heapless::{String, Vec};

mod terminal;
pub use terminal::TerminalSurface;

/// Maximum length in bytes of any single piece of text in a [`Frame`].
pub const LABEL_LEN: usize = 48;

/// A piece of text in a [`Frame`].
pub type Label = String<LABEL_LEN>;

/// Maximum number of informational lines above the rows.
pub const MAX_LINES: usize = 3;

/// Maximum number of selectable rows: one per route plus "Back", with room to spare.
pub const MAX_ROWS: usize = 18;

/// The hint shown at the bottom of every page.
pub const FOOTER: &str = "W/S: navigate, E: select";

/// The row which leaves a list page.
pub const BACK: &str = "<- Back";

/// A selectable row, made of up to three aligned fields. Empty fields are simply not drawn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Row {
    /// Left-aligned text.
    pub left: Label,
    /// Centered text.
    pub center: Label,
    /// Right-aligned text.
    pub right: Label,
}

impl Row {
    /// A row with only centered text, as used for plain menu entries.
    pub fn centered(label: &str) -> Self {
        Self {
            center: text::truncate(label),
            ..Self::default()
        }
    }

    /// A row with all three fields.
    pub fn new(left: &str, center: &str, right: &str) -> Self {
        Self {
            left: text::truncate(left),
            center: text::truncate(center),
            right: text::truncate(right),
        }
    }
}

/// Something drawn over the page.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Overlay {
    /// A two-way choice. Input goes to the dialog rather than the rows underneath.
    Confirm {
        /// The question being asked.
        question: Label,
        /// Text of the affirmative option.
        yes: Label,
        /// Text of the negative option.
        no: Label,
        /// Whether the affirmative option is selected.
        yes_selected: bool,
    },
    /// A transient notification.
    Toast(Message),
}

/// Everything a page wants on screen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Page title.
    pub header: Label,
    /// Informational text shown between the header and the rows.
    pub lines: Vec<Label, MAX_LINES>,
    /// Selectable rows.
    pub rows: Vec<Row, MAX_ROWS>,
    /// Index of the selected row. Ignored when there are no rows.
    pub selected: usize,
    /// Hint shown at the bottom of the page.
    pub footer: Label,
    /// What, if anything, is drawn over the page.
    pub overlay: Option<Overlay>,
}

impl Frame {
    /// Constructs a [`Frame`] with the given header and the standard footer.
    pub fn new(header: &str) -> Self {
        Self {
            header: text::truncate(header),
            footer: text::truncate(FOOTER),
            ..Self::default()
        }
    }

    /// Adds an informational line. Lines beyond [`MAX_LINES`] are dropped.
    pub fn line(&mut self, line: Label) -> &mut Self {
        if self.lines.push(line).is_err() {
            warn!("Frame line dropped");
        }
        self
    }

    /// Adds a selectable row. Rows beyond [`MAX_ROWS`] are dropped.
    pub fn row(&mut self, row: Row) -> &mut Self {
        if self.rows.push(row).is_err() {
            warn!("Frame row dropped");
        }
        self
    }

    /// Returns the text of the toast overlay, if one is present.
    pub fn toast(&self) -> Option<&str> {
        match &self.overlay {
            Some(Overlay::Toast(message)) => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Whether a surface has finished presenting a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DrawStatus {
    /// The frame, including any toast, has been shown in full.
    Complete,
    /// A toast is still animating (e.g. scrolling); the frame should be drawn again on the next tick.
    Animating,
}

/// A display the hub can draw on.
pub trait Surface {
    /// Draws `frame`, replacing whatever was on screen.
    fn draw(&mut self, frame: &Frame) -> DrawStatus;

    /// Draws one frame of the screensaver.
    fn draw_screensaver(&mut self, bounce: &Bounce);

    /// Powers the display down.
    fn display_off(&mut self);

    /// Powers the display back up. The caller redraws immediately afterwards.
    fn display_on(&mut self);
}

impl<T: Surface + ?Sized> Surface for &mut T {
    fn draw(&mut self, frame: &Frame) -> DrawStatus {
        (**self).draw(frame)
    }

    fn draw_screensaver(&mut self, bounce: &Bounce) {
        (**self).draw_screensaver(bounce)
    }

    fn display_off(&mut self) {
        (**self).display_off()
    }

    fn display_on(&mut self) {
        (**self).display_on()
    }
}
