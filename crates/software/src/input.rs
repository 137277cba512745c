//! User input.
//!
//! The menus understand exactly three actions, whatever the physical control: move up, move down, and select. This
//! module turns the raw signals of the supported controls (a serial console and a push-button rotary encoder) into
//! those actions.

use embassy_time::{Duration, Instant};
use heapless::Deque;

/// How long an unfinished ANSI escape sequence is waited on before it is abandoned.
pub const ESCAPE_TIMEOUT: Duration = Duration::from_millis(50);

/// Minimum time between two encoder clicks for the second to count.
pub const CLICK_DEBOUNCE: Duration = Duration::from_millis(200);

const ESC: u8 = 0x1B;

/// A discrete user action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    /// Nothing happened.
    #[default]
    None,
    /// Move the selection up (towards the start of the list).
    Up,
    /// Move the selection down (towards the end of the list).
    Down,
    /// Activate the selected item.
    Enter,
}

impl InputEvent {
    /// Returns `true` for anything other than [`InputEvent::None`].
    pub fn is_some(self) -> bool {
        self != InputEvent::None
    }
}

/// A polled source of [`InputEvent`]s.
pub trait InputSource {
    /// Returns the next pending event, or [`InputEvent::None`]. At most one event is produced per call.
    fn poll(&mut self, now: Instant) -> InputEvent;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Escape {
    Idle,
    /// Received ESC, waiting on `[`
    Started(Instant),
    /// Received ESC `[`, waiting on the final byte
    Csi(Instant),
}

/// Decodes console keystrokes, one byte at a time.
///
/// | Keys                    | Event   |
/// |-------------------------|---------|
/// | `w`, `W`, ↑             | Up      |
/// | `s`, `S`, ↓             | Down    |
/// | `e`, `E`, Return, →     | Enter   |
///
/// Everything else is ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialDecoder {
    escape: Escape,
}

impl Default for SerialDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialDecoder {
    /// Constructs a [`SerialDecoder`].
    pub const fn new() -> Self {
        Self {
            escape: Escape::Idle,
        }
    }

    /// Feeds one received byte, returning the event it completes (if any).
    pub fn feed(&mut self, byte: u8, now: Instant) -> InputEvent {
        self.expire(now);

        match self.escape {
            Escape::Started(since) => {
                if byte == b'[' {
                    self.escape = Escape::Csi(since);
                    return InputEvent::None;
                }
                // not a CSI sequence after all; treat the byte as an ordinary key
                self.escape = Escape::Idle;
            }
            Escape::Csi(_) => {
                self.escape = Escape::Idle;
                return match byte {
                    b'A' => InputEvent::Up,
                    b'B' => InputEvent::Down,
                    b'C' => InputEvent::Enter,
                    _ => InputEvent::None,
                };
            }
            Escape::Idle => {}
        }

        match byte {
            ESC => {
                self.escape = Escape::Started(now);
                InputEvent::None
            }
            b'w' | b'W' => InputEvent::Up,
            b's' | b'S' => InputEvent::Down,
            b'e' | b'E' | b'\r' | b'\n' => InputEvent::Enter,
            _ => InputEvent::None,
        }
    }

    /// Abandons an escape sequence which has been pending for longer than [`ESCAPE_TIMEOUT`].
    pub fn expire(&mut self, now: Instant) {
        if let Escape::Started(since) | Escape::Csi(since) = self.escape {
            if now >= since + ESCAPE_TIMEOUT {
                trace!("Abandoning escape sequence");
                self.escape = Escape::Idle;
            }
        }
    }
}

/// An [`InputSource`] fed by a serial console.
///
/// Received bytes are buffered with [`receive`](Self::receive) and decoded lazily: each [`poll`](InputSource::poll)
/// consumes bytes only until one event is decoded, so input typed ahead is delivered one event per loop iteration. When
/// the buffer is full, further bytes are dropped.
#[derive(Clone, Debug)]
pub struct SerialInput<const N: usize = 32> {
    bytes: Deque<u8, N>,
    decoder: SerialDecoder,
}

impl<const N: usize> Default for SerialInput<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SerialInput<N> {
    /// Constructs a [`SerialInput`] with an empty buffer.
    pub fn new() -> Self {
        Self {
            bytes: Deque::new(),
            decoder: SerialDecoder::new(),
        }
    }

    /// Buffers bytes received from the console. Returns the number of bytes accepted.
    pub fn receive(&mut self, bytes: &[u8]) -> usize {
        let accepted = bytes
            .iter()
            .take_while(|&&byte| self.bytes.push_back(byte).is_ok())
            .count();
        if accepted < bytes.len() {
            warn!("Console buffer full, dropped {} bytes", bytes.len() - accepted);
        }
        accepted
    }
}

impl<const N: usize> InputSource for SerialInput<N> {
    fn poll(&mut self, now: Instant) -> InputEvent {
        self.decoder.expire(now);
        while let Some(byte) = self.bytes.pop_front() {
            let event = self.decoder.feed(byte, now);
            if event.is_some() {
                return event;
            }
        }
        InputEvent::None
    }
}

/// Turns samples of a push-button rotary encoder into events.
///
/// Clockwise rotation moves down the list and counter-clockwise rotation moves up; the count's direction of travel is
/// all that matters, so a fast spin still produces a single event per sample. Clicks closer together than
/// [`CLICK_DEBOUNCE`] are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderInput {
    last_count: i16,
    last_click: Option<Instant>,
}

impl EncoderInput {
    /// Constructs an [`EncoderInput`] given the encoder's count at startup.
    pub const fn new(count: i16) -> Self {
        Self {
            last_count: count,
            last_click: None,
        }
    }

    /// Processes one sample of the encoder: its running count and whether it was clicked since the last sample. A
    /// click takes precedence over rotation.
    pub fn sample(&mut self, count: i16, clicked: bool, now: Instant) -> InputEvent {
        if clicked && self.last_click.is_none_or(|last| now >= last + CLICK_DEBOUNCE) {
            self.last_click = Some(now);
            return InputEvent::Enter;
        }

        // the count is free-running, so compare with wrapping arithmetic
        let diff = count.wrapping_sub(self.last_count);
        self.last_count = count;
        match diff {
            0 => InputEvent::None,
            d if d > 0 => InputEvent::Down,
            _ => InputEvent::Up,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn decode(bytes: &[u8]) -> heapless::Vec<InputEvent, 16> {
        let mut decoder = SerialDecoder::new();
        bytes
            .iter()
            .map(|&byte| decoder.feed(byte, at(0)))
            .filter(|event| event.is_some())
            .collect()
    }

    #[test]
    fn letter_keys() {
        assert_eq!(
            &[
                InputEvent::Up,
                InputEvent::Up,
                InputEvent::Down,
                InputEvent::Down,
                InputEvent::Enter,
                InputEvent::Enter
            ][..],
            decode(b"wWsSeE").as_slice(),
            "Expected left but got right"
        );
    }

    #[test]
    fn return_and_newline_select() {
        assert_eq!(&[InputEvent::Enter, InputEvent::Enter][..], decode(b"\r\n").as_slice());
    }

    #[test]
    fn arrow_keys() {
        assert_eq!(
            &[InputEvent::Up, InputEvent::Down, InputEvent::Enter][..],
            decode(b"\x1b[A\x1b[B\x1b[C").as_slice(),
            "Expected left but got right"
        );
    }

    #[test]
    fn other_bytes_are_ignored() {
        assert!(decode(b"xyz 123\x1b[D").is_empty(), "Expected no events");
    }

    #[test]
    fn broken_escape_falls_back_to_plain_key() {
        assert_eq!(&[InputEvent::Up][..], decode(b"\x1bw").as_slice());
    }

    #[test]
    fn stale_escape_is_abandoned() {
        let mut decoder = SerialDecoder::new();
        assert_eq!(InputEvent::None, decoder.feed(ESC, at(0)));
        assert_eq!(InputEvent::None, decoder.feed(b'[', at(10)));
        // the sequence timed out, so 'A' is no longer an arrow
        assert_eq!(InputEvent::None, decoder.feed(b'A', at(50)));
        assert_eq!(InputEvent::Down, decoder.feed(b's', at(51)));
    }

    #[test]
    fn escape_within_timeout_completes() {
        let mut decoder = SerialDecoder::new();
        decoder.feed(ESC, at(0));
        decoder.feed(b'[', at(20));
        assert_eq!(InputEvent::Down, decoder.feed(b'B', at(49)));
    }

    #[test]
    fn serial_input_yields_one_event_per_poll() {
        let mut input = SerialInput::<8>::new();
        assert_eq!(3, input.receive(b"wxs"));
        assert_eq!(InputEvent::Up, input.poll(at(0)));
        assert_eq!(InputEvent::Down, input.poll(at(1)));
        assert_eq!(InputEvent::None, input.poll(at(2)));
    }

    #[test]
    fn serial_input_drops_overflow() {
        let mut input = SerialInput::<2>::new();
        assert_eq!(2, input.receive(b"wsw"));
        assert_eq!(InputEvent::Up, input.poll(at(0)));
        assert_eq!(InputEvent::Down, input.poll(at(0)));
        assert_eq!(InputEvent::None, input.poll(at(0)));
    }

    #[test]
    fn serial_input_escape_split_across_receives() {
        let mut input = SerialInput::<8>::new();
        input.receive(b"\x1b[");
        assert_eq!(InputEvent::None, input.poll(at(0)));
        input.receive(b"A");
        assert_eq!(InputEvent::Up, input.poll(at(5)));
    }

    #[test]
    fn encoder_rotation() {
        let mut encoder = EncoderInput::new(10);
        assert_eq!(InputEvent::None, encoder.sample(10, false, at(0)));
        assert_eq!(InputEvent::Down, encoder.sample(13, false, at(1)), "Clockwise moves down");
        assert_eq!(InputEvent::Up, encoder.sample(12, false, at(2)), "Counter-clockwise moves up");
    }

    #[test]
    fn encoder_rotation_wraps() {
        let mut encoder = EncoderInput::new(i16::MAX);
        assert_eq!(InputEvent::Down, encoder.sample(i16::MIN, false, at(0)));
    }

    #[test]
    fn encoder_click_is_debounced() {
        let mut encoder = EncoderInput::new(0);
        assert_eq!(InputEvent::Enter, encoder.sample(0, true, at(1_000)));
        assert_eq!(InputEvent::None, encoder.sample(0, true, at(1_100)), "Bounce should be ignored");
        assert_eq!(InputEvent::Enter, encoder.sample(0, true, at(1_200)));
    }
}
