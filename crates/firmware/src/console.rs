//! The serial console: the ST-LINK virtual COM port, which doubles as the hub's display and keyboard.

use core::fmt;
use embassy_stm32::{mode::Async, usart::UartTx};

/// Adapts the transmit half of the console UART to [`fmt::Write`] so a
/// [`TerminalSurface`][midi_hub_lib::render::TerminalSurface] can draw on it.
pub struct ConsoleWriter<'d> {
    tx: UartTx<'d, Async>,
}

impl<'d> ConsoleWriter<'d> {
    pub fn new(tx: UartTx<'d, Async>) -> Self {
        Self { tx }
    }
}

impl fmt::Write for ConsoleWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // frames are small and the loop has nothing else to do while one goes out
        self.tx.blocking_write(s.as_bytes()).map_err(|_| fmt::Error)
    }
}
