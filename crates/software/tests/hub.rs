//! Drives a whole [`Hub`] the way the firmware does: keystrokes from a serial console in, ANSI text out.

use embassy_time::Instant;
use midi_hub_lib::{
    configuration::{HubConfig, MAX_ROUTES},
    device::{DeviceId, Slot, SlotDirectory},
    hub::Hub,
    input::{InputEvent, InputSource, SerialInput},
    navigation::PageId,
    render::TerminalSurface,
    route_table::IMAGE_LEN,
    sleep::SleepState,
    storage::MemoryStorage,
};

const KEYBOARD: DeviceId = DeviceId::new(0x1234, 0x0001);
const SYNTH: DeviceId = DeviceId::new(0x5678, 0x0002);

struct Console {
    hub: Hub<MemoryStorage<IMAGE_LEN>>,
    devices: SlotDirectory,
    input: SerialInput,
    screen: TerminalSurface<String>,
    now: u64,
}

impl Console {
    fn new(devices: &[(DeviceId, &str)]) -> Self {
        let mut directory = SlotDirectory::new();
        for (slot, (id, name)) in devices.iter().enumerate() {
            directory.attach(Slot(slot as u8), *id, Some(*name));
        }
        let mut console = Self {
            hub: Hub::new(MemoryStorage::new(), HubConfig::default(), Instant::from_millis(0)),
            devices: directory,
            input: SerialInput::new(),
            screen: TerminalSurface::new(String::new()),
            now: 0,
        };
        console.tick();
        console
    }

    /// Runs one loop iteration 10 ms after the previous one.
    fn tick(&mut self) {
        let now = Instant::from_millis(self.now);
        let event = self.input.poll(now);
        self.hub.poll(event, &self.devices, &mut self.screen, now);
        self.now += 10;
    }

    fn tick_at(&mut self, ms: u64, event: InputEvent) {
        self.now = ms;
        let now = Instant::from_millis(ms);
        self.hub.poll(event, &self.devices, &mut self.screen, now);
    }

    /// Types `keys` and runs the loop until every keystroke has been handled.
    fn type_keys(&mut self, keys: &str) {
        self.screen = TerminalSurface::new(String::new());
        self.input.receive(keys.as_bytes());
        for _ in 0..keys.len() {
            self.tick();
        }
    }

    /// The text most recently drawn, from the last screen clear onward.
    fn screen(&self) -> &str {
        let output = self.screen.writer().as_str();
        output.rsplit("\x1b[2J\x1b[H").next().unwrap_or(output)
    }

    /// Walks the add-route wizard, choosing the `source`th device and then the `dest`th of the remaining ones.
    fn add_route(&mut self, source: usize, dest: usize) {
        let keys = format!("e{}e{}ee", "s".repeat(source), "s".repeat(dest));
        self.type_keys(&keys);
    }
}

fn five_devices() -> Vec<(DeviceId, String)> {
    (0..5)
        .map(|n| (DeviceId::new(0x1000 + n, n), format!("Device {n}")))
        .collect()
}

#[test]
fn wizard_round_trip() {
    let mut console = Console::new(&[(KEYBOARD, "Keyboard"), (SYNTH, "Synth")]);
    assert!(console.screen().contains("=== MIDI HUB: Main Menu ==="));

    console.type_keys("e");
    assert_eq!(PageId::SourceList, console.hub.navigator().current());
    assert!(console.screen().contains("> Keyboard"), "Keyboard should be selected first");

    console.type_keys("e");
    assert!(console.screen().contains("From: Keyboard"));
    assert!(!console.screen().contains("  Keyboard"), "The source can't also be the destination");

    console.type_keys("e");
    assert_eq!(PageId::ConfirmRoute, console.hub.navigator().current());
    assert!(console.screen().contains("Create this route?"));
    assert!(console.screen().contains("> Yes, create route"));

    console.type_keys("e");
    assert_eq!(PageId::MainMenu, console.hub.navigator().current(), "Expected left but got right");
    assert_eq!(0, console.hub.navigator().depth());
    assert!(console.screen().contains("\x1b[7m Route created \x1b[0m"));
    assert!(console.hub.should_route(KEYBOARD, SYNTH));
    assert!(!console.hub.should_route(SYNTH, KEYBOARD));
}

#[test]
fn arrow_keys_navigate() {
    let mut console = Console::new(&[(KEYBOARD, "Keyboard"), (SYNTH, "Synth")]);
    console.type_keys("\x1b[B\x1b[C");
    assert_eq!(PageId::Connections, console.hub.navigator().current());
    assert!(console.screen().contains("No routes configured"));
}

#[test]
fn duplicate_and_full_are_reported() {
    let devices = five_devices();
    let devices = devices
        .iter()
        .map(|(id, name)| (*id, name.as_str()))
        .collect::<Vec<_>>();
    let mut console = Console::new(&devices);

    console.add_route(0, 0);
    console.add_route(0, 0);
    assert_eq!(1, console.hub.routes().len());
    assert!(
        console
            .hub
            .navigator()
            .notifications()
            .iter()
            .eq(["Route created", "Route already exists"]),
        "Expected the duplicate to be reported after the first creation"
    );

    // every other ordered pair of the five devices, less one
    for source in 0..5 {
        for dest in 0..4 {
            if (source, dest) != (0, 0) && console.hub.routes().len() < MAX_ROUTES {
                console.add_route(source, dest);
            }
        }
    }
    assert_eq!(MAX_ROUTES, console.hub.routes().len());
    assert!(
        !console.hub.should_route(devices[4].0, devices[3].0),
        "Last pair should not have fit"
    );

    console.add_route(4, 3);
    assert_eq!(MAX_ROUTES, console.hub.routes().len());
    assert!(
        console.hub.navigator().notifications().iter().any(|m| m == "Max routes reached!"),
        "Expected the full table to be reported"
    );
}

#[test]
fn screensaver_and_wake() {
    let mut console = Console::new(&[(KEYBOARD, "Keyboard"), (SYNTH, "Synth")]);

    console.tick_at(29_990, InputEvent::None);
    assert_eq!(SleepState::Active, console.hub.sleep_state());
    console.tick_at(30_000, InputEvent::None);
    assert_eq!(SleepState::Screensaver, console.hub.sleep_state());

    console.screen = TerminalSurface::new(String::new());
    console.tick_at(30_050, InputEvent::Enter);
    assert_eq!(SleepState::Active, console.hub.sleep_state());
    assert_eq!(
        PageId::MainMenu,
        console.hub.navigator().current(),
        "The waking keystroke should be consumed"
    );
    assert!(console.screen().contains("=== MIDI HUB: Main Menu ==="), "Menu should be redrawn");
}

#[test]
fn deleting_a_route() {
    let mut console = Console::new(&[(KEYBOARD, "Keyboard"), (SYNTH, "Synth")]);
    console.add_route(0, 0);
    console.add_route(1, 0);
    assert_eq!(2, console.hub.routes().len());

    console.type_keys("se");
    assert!(console.screen().contains("> Keyboard -> Synth"));
    console.type_keys("e");
    assert!(console.screen().contains("Delete this route?"));
    console.type_keys("e");

    assert_eq!(1, console.hub.routes().len());
    assert!(!console.hub.should_route(KEYBOARD, SYNTH));
    assert!(console.hub.should_route(SYNTH, KEYBOARD));
    assert!(console.screen().contains("> Synth -> Keyboard"));
}
