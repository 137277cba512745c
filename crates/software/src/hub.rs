use crate::{
    configuration::HubConfig,
    device::{DeviceDirectory, DeviceEvent, DeviceId},
    input::InputEvent,
    navigation::Navigator,
    render::{DrawStatus, Surface},
    route_table::RouteTable,
    sleep::{SleepController, SleepState},
    storage::Storage,
    text,
    timed_queue::{Message, TimedMessageQueue},
};
use embassy_time::Instant;

/// Owns everything the hub keeps between loop iterations: the routes, the menu state, and the display's power state.
///
/// The firmware constructs one [`Hub`] at startup and calls [`poll`](Self::poll) once per tick; the MIDI transport asks
/// [`should_route`](Self::should_route) before forwarding a packet.
pub struct Hub<S> {
    routes: RouteTable<S>,
    navigator: Navigator,
    sleep: SleepController,
    config: HubConfig,
}

impl<S: Storage> Hub<S> {
    /// Constructs a [`Hub`] showing the main menu, with routes loaded from `storage`.
    pub fn new(storage: S, config: HubConfig, now: Instant) -> Self {
        let mut routes = RouteTable::new(storage);
        routes.load();

        Self {
            routes,
            navigator: Navigator::with_notifications(TimedMessageQueue::with_expiry(
                config.notification_duration,
                config.notification_expiry,
            )),
            sleep: SleepController::new(&config, now),
            config,
        }
    }

    /// Runs one iteration of the control loop.
    ///
    /// An input which wakes the display does nothing else.
    pub fn poll(
        &mut self,
        event: InputEvent,
        devices: &dyn DeviceDirectory,
        surface: &mut impl Surface,
        now: Instant,
    ) {
        let mut event = event;
        if event.is_some() {
            if let Some(previous) = self.sleep.activity(now) {
                if previous == SleepState::DeepSleep {
                    surface.display_on();
                }
                self.navigator.request_redraw();
                event = InputEvent::None;
            }
        }

        self.navigator.handle_input(event, &mut self.routes, devices, now);
        self.navigator.update(&mut self.routes, devices, now);

        match self.sleep.update(now) {
            Some(SleepState::Screensaver) => surface.draw_screensaver(self.sleep.bounce()),
            Some(SleepState::DeepSleep) => surface.display_off(),
            Some(SleepState::Active) | None => {}
        }

        match self.sleep.state() {
            SleepState::Active => self.draw(devices, surface, now),
            SleepState::Screensaver => {
                if self.sleep.animate(now) {
                    surface.draw_screensaver(self.sleep.bounce());
                }
            }
            SleepState::DeepSleep => {}
        }
    }

    fn draw(&mut self, devices: &dyn DeviceDirectory, surface: &mut impl Surface, now: Instant) {
        let Some(frame) = self.navigator.render(&mut self.routes, devices, now) else {
            return;
        };

        match surface.draw(&frame) {
            DrawStatus::Complete => {
                if frame.toast().is_some() {
                    self.navigator.notification_shown();
                }
            }
            DrawStatus::Animating => self.navigator.request_redraw(),
        }
    }

    /// Tells the user a device came or went. Pages listing devices pick up the change on the next
    /// [`poll`](Self::poll).
    pub fn device_event(&mut self, event: &DeviceEvent, now: Instant) {
        let message: Message = match event {
            DeviceEvent::Connected(_, device) => text::format(format_args!("{} connected", device.name)),
            DeviceEvent::Disconnected(_, device) => text::format(format_args!("{} disconnected", device.name)),
        };
        self.navigator.notify(&message, now);
    }

    /// Returns `true` if traffic from `source` may be forwarded to `dest`.
    pub fn should_route(&self, source: DeviceId, dest: DeviceId) -> bool {
        self.routes.should_route(source, dest)
    }

    /// The route table.
    pub fn routes(&self) -> &RouteTable<S> {
        &self.routes
    }

    /// The menu state.
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// The display's power state.
    pub fn sleep_state(&self) -> SleepState {
        self.sleep.state()
    }

    /// The settings the hub was constructed with.
    pub fn config(&self) -> &HubConfig {
        &self.config
    }
}
