//! A [`Surface`] for ANSI serial terminals.

use super::{DrawStatus, Frame, Overlay, Row, Surface};
use crate::sleep::Bounce;
use core::fmt::{self, Write};

const CLEAR: &str = "\x1b[2J\x1b[H";
const INVERSE: &str = "\x1b[7m";
const RESET: &str = "\x1b[0m";
const NEWLINE: &str = "\r\n";

/// Draws frames as plain text on an ANSI terminal.
///
/// Every frame clears the screen and is written out in full. Toasts are shown in inverse video and are complete as soon
/// as they're written. The screensaver block is drawn as a single character, with the pixel field scaled down to
/// 64x16 character cells.
pub struct TerminalSurface<W> {
    out: W,
}

impl<W: Write> TerminalSurface<W> {
    /// Constructs a [`TerminalSurface`] writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// The underlying writer.
    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Consumes the surface, returning the underlying writer.
    pub fn into_writer(self) -> W {
        self.out
    }

    fn write_frame(&mut self, frame: &Frame) -> fmt::Result {
        let out = &mut self.out;
        write!(out, "{CLEAR}{NEWLINE}=== MIDI HUB: {} ==={NEWLINE}{NEWLINE}", frame.header)?;

        for line in &frame.lines {
            write!(out, "{line}{NEWLINE}")?;
        }
        if !frame.lines.is_empty() {
            out.write_str(NEWLINE)?;
        }

        let dialog = matches!(frame.overlay, Some(Overlay::Confirm { .. }));
        for (i, row) in frame.rows.iter().enumerate() {
            let marker = if !dialog && i == frame.selected { "> " } else { "  " };
            out.write_str(marker)?;
            write_row(out, row)?;
            out.write_str(NEWLINE)?;
        }

        if let Some(Overlay::Confirm {
            question,
            yes,
            no,
            yes_selected,
        }) = &frame.overlay
        {
            let (yes_marker, no_marker) = if *yes_selected { ("> ", "  ") } else { ("  ", "> ") };
            write!(
                out,
                "{question}{NEWLINE}{NEWLINE}{yes_marker}{yes}{NEWLINE}{no_marker}{no}{NEWLINE}"
            )?;
        }

        write!(out, "{NEWLINE}[{}]{NEWLINE}", frame.footer)?;

        if let Some(toast) = frame.toast() {
            write!(out, "{INVERSE} {toast} {RESET}{NEWLINE}")?;
        }
        Ok(())
    }
}

fn write_row(out: &mut impl Write, row: &Row) -> fmt::Result {
    let mut first = true;
    for field in [&row.left, &row.center, &row.right] {
        if field.is_empty() {
            continue;
        }
        if !first {
            out.write_char(' ')?;
        }
        out.write_str(field)?;
        first = false;
    }
    Ok(())
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn draw(&mut self, frame: &Frame) -> DrawStatus {
        if self.write_frame(frame).is_err() {
            warn!("Terminal write failed");
        }
        DrawStatus::Complete
    }

    fn draw_screensaver(&mut self, bounce: &Bounce) {
        let row = bounce.y / 4 + 1;
        let column = bounce.x / 2 + 1;
        if write!(self.out, "{CLEAR}\x1b[{row};{column}H#").is_err() {
            warn!("Terminal write failed");
        }
    }

    fn display_off(&mut self) {
        let _ = self.out.write_str(CLEAR);
    }

    fn display_on(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{render::Label, text};
    use heapless::String;

    type Screen = String<1024>;

    fn label(s: &str) -> Label {
        text::truncate(s)
    }

    fn draw(frame: &Frame) -> Screen {
        let mut surface = TerminalSurface::new(Screen::new());
        assert_eq!(DrawStatus::Complete, surface.draw(frame));
        surface.into_writer()
    }

    #[test]
    fn menu_with_selection_marker() {
        let mut frame = Frame::new("Main Menu");
        frame.row(Row::centered("Add Route")).row(Row::centered("View Connections"));
        frame.selected = 1;

        assert_eq!(
            "\x1b[2J\x1b[H\r\n=== MIDI HUB: Main Menu ===\r\n\r\n  Add Route\r\n> View Connections\r\n\r\n\
             [W/S: navigate, E: select]\r\n",
            draw(&frame).as_str(),
            "Expected left but got right"
        );
    }

    #[test]
    fn row_fields_are_joined() {
        let mut frame = Frame::new("Connections");
        frame.row(Row::new("Keyboard", "->", "Synth (off)"));
        assert!(draw(&frame).contains("> Keyboard -> Synth (off)\r\n"));
    }

    #[test]
    fn lines_precede_rows() {
        let mut frame = Frame::new("Select Source");
        frame.line(label("No MIDI devices connected")).row(Row::centered("<- Back"));
        assert!(draw(&frame).contains("No MIDI devices connected\r\n\r\n> <- Back\r\n"));
    }

    #[test]
    fn confirmation_dialog() {
        let mut frame = Frame::new("Confirm Route");
        frame.overlay = Some(Overlay::Confirm {
            question: label("Create this route?"),
            yes: label("Yes, create route"),
            no: label("No, cancel"),
            yes_selected: false,
        });
        assert!(
            draw(&frame).contains("Create this route?\r\n\r\n  Yes, create route\r\n> No, cancel\r\n"),
            "No should be selected"
        );
    }

    #[test]
    fn toast_in_inverse_video() {
        let mut frame = Frame::new("Main Menu");
        frame.overlay = Some(Overlay::Toast(text::truncate("Route created")));
        assert!(draw(&frame).ends_with("\x1b[7m Route created \x1b[0m\r\n"));
    }

    #[test]
    fn screensaver_scales_position() {
        let mut surface = TerminalSurface::new(Screen::new());
        let mut bounce = Bounce::new(embassy_time::Instant::from_millis(0));
        bounce.x = 20;
        bounce.y = 8;
        surface.draw_screensaver(&bounce);
        assert_eq!("\x1b[2J\x1b[H\x1b[3;11H#", surface.writer().as_str());
    }
}
