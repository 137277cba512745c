//! MIDI Hub is [Embassy](https://embassy.dev)-based firmware for a standalone USB MIDI routing hub. The firmware runs on
//! the [Nucleo-F767ZI development board](https://www.st.com/en/evaluation-tools/nucleo-f767zi.html), which is powered
//! by an F7-series STM32 microcontroller.
//!
//! Several USB MIDI class devices plug into the hub, and traffic flows between them according to routes the user
//! defines on the device itself: no host computer is involved. Routes are created and deleted through a small menu,
//! which is driven either by a push-button rotary encoder or by a serial terminal attached to the ST-LINK virtual COM
//! port. The terminal also mirrors the display. Routes are kept in flash and survive power cycles.
//!
//! The menu system, the route table, and the power management all live in `midi_hub_lib`; this crate only wires them to
//! the board's peripherals.

#![no_std]
#![no_main]

mod console;
mod storage;

use crate::{console::ConsoleWriter, storage::FlashEeprom};
use defmt::*;
use embassy_executor::Spawner;
use embassy_futures::select::{Either3, select3};
use embassy_stm32::{
    Config, bind_interrupts,
    exti::ExtiInput,
    flash::{Blocking, Flash},
    gpio::Pull,
    mode::Async,
    peripherals::{self, TIM4},
    time::Hertz,
    timer::qei::{Qei, QeiPin},
    usart::{self, RingBufferedUartRx, Uart, UartTx},
};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embassy_time::{Instant, Ticker};
use midi_hub_lib::{
    configuration::HubConfig,
    device::SlotDirectory,
    hub::Hub,
    input::{EncoderInput, InputEvent, InputSource, SerialInput},
    render::TerminalSurface,
};
use static_cell::StaticCell;

use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(
    #[doc(hidden)]
    struct Irqs {
        USART3 => usart::InterruptHandler<peripherals::USART3>;
    }
);

/// Signals a press of the encoder's push button.
static CLICK: Signal<CriticalSectionRawMutex, ()> = Signal::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Initializing MIDI Hub");

    let mut config = Config::default();
    {
        use embassy_stm32::rcc::*;
        // hse: high-speed external clock
        config.rcc.hse = Some(Hse {
            freq: Hertz(8_000_000),
            mode: HseMode::Bypass,
        });

        // pll: phase-locked loop, crucial for dividing clock
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL216,
            divp: Some(PllPDiv::DIV2), // 8mhz / 4 * 216 / 2 = 216Mhz
            // the 48MHz clock for USB OTG is derived from PLLQ
            divq: Some(PllQDiv::DIV9), // 8mhz / 4 * 216 / 9 = 48Mhz
            divr: None,
        });
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.mux.clk48sel = mux::Clk48sel::PLL1_Q;
    }
    let p = embassy_stm32::init(config);

    // USART3 on PD8/PD9 is wired to the ST-LINK, which exposes it to the host as a virtual COM port
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = 115_200;
    let uart = unwrap!(Uart::new(
        p.USART3,
        p.PD9,
        p.PD8,
        Irqs,
        p.DMA1_CH3,
        p.DMA1_CH1,
        uart_config,
    ));
    let (tx, rx) = uart.split();
    static RX_BUFFER: StaticCell<[u8; 128]> = StaticCell::new();
    let rx = rx.into_ring_buffered(RX_BUFFER.init([0; 128]));

    // the encoder's quadrature outputs go to TIM4 channels 1 and 2, its push button to the user button's EXTI line
    let encoder = Qei::new(p.TIM4, QeiPin::new(p.PD12), QeiPin::new(p.PD13));
    let button = ExtiInput::new(p.PC13, p.EXTI13, Pull::None);
    unwrap!(spawner.spawn(click_task(button)));

    let flash = Flash::new_blocking(p.FLASH);
    unwrap!(spawner.spawn(hub_task(tx, rx, encoder, flash)));
}

/// Forwards encoder button presses to the hub task.
#[embassy_executor::task]
async fn click_task(mut button: ExtiInput<'static>) -> ! {
    loop {
        button.wait_for_rising_edge().await;
        CLICK.signal(());
    }
}

/// Task responsible for the control loop: input, menu, power management, and drawing.
///
/// The loop runs once per refresh interval, and additionally whenever console bytes or a click arrive so that input
/// feels immediate.
#[embassy_executor::task]
async fn hub_task(
    tx: UartTx<'static, Async>,
    mut rx: RingBufferedUartRx<'static>,
    encoder: Qei<'static, TIM4>,
    flash: Flash<'static, Blocking>,
) -> ! {
    let config = HubConfig::default();
    let mut hub = Hub::new(FlashEeprom::new(flash), config, Instant::now());
    let mut surface = TerminalSurface::new(ConsoleWriter::new(tx));
    let mut serial = SerialInput::<128>::new();
    let mut knob = EncoderInput::new(encoder.count() as i16);

    // TODO: attach devices here once embassy-stm32 has a USB host driver for OTG_HS; until then the directory stays
    // empty and routes can only be managed, not exercised
    let devices = SlotDirectory::new();

    let mut ticker = Ticker::every(config.refresh_interval);
    let mut buf = [0; 64];
    loop {
        let clicked = match select3(rx.read(&mut buf), ticker.next(), CLICK.wait()).await {
            Either3::First(Ok(n)) => {
                serial.receive(&buf[..n]);
                false
            }
            Either3::First(Err(e)) => {
                warn!("Console read failed: {}", e);
                false
            }
            Either3::Second(()) => false,
            Either3::Third(()) => true,
        };

        let now = Instant::now();
        let event = match serial.poll(now) {
            InputEvent::None => knob.sample(encoder.count() as i16, clicked, now),
            event => event,
        };
        hub.poll(event, &devices, &mut surface, now);
    }
}
