//! Display power management.
//!
//! After a period without user activity the display switches to a screensaver, and after a further period it is
//! switched off entirely. Any activity wakes it straight back up.

use crate::configuration::{HubConfig, is_disabled};
use embassy_time::{Duration, Instant};

/// Width of the field the screensaver block bounces around in, in pixels.
pub const FIELD_WIDTH: i16 = 128;

/// Height of the field the screensaver block bounces around in, in pixels.
pub const FIELD_HEIGHT: i16 = 64;

/// Side length of the screensaver block, in pixels.
pub const BLOCK_SIZE: i16 = 3;

/// Time between steps of the screensaver animation.
pub const STEP_INTERVAL: Duration = Duration::from_millis(30);

/// Margin kept between the block's starting position and the edges of the field.
const START_MARGIN: i16 = 10;

/// The display's power state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepState {
    /// Normal operation: menus are shown.
    Active,
    /// Idle: the bouncing-block animation is shown.
    Screensaver,
    /// Idle for a long time: the display is powered off.
    DeepSleep,
}

/// The screensaver animation: a small block moving diagonally and reflecting off the edges of the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bounce {
    /// Horizontal position of the block's top-left corner.
    pub x: i16,
    /// Vertical position of the block's top-left corner.
    pub y: i16,
    dx: i16,
    dy: i16,
    last_step: Instant,
}

impl Bounce {
    /// Starts an animation at `now`.
    ///
    /// The starting position and direction are derived from `now`, so that successive screensavers don't all trace the
    /// same path.
    pub fn new(now: Instant) -> Self {
        let seed = now.as_millis();
        let span_x = (FIELD_WIDTH - 2 * START_MARGIN) as u64;
        let span_y = (FIELD_HEIGHT - 2 * START_MARGIN) as u64;
        Self {
            x: START_MARGIN + (seed % span_x) as i16,
            y: START_MARGIN + ((seed / span_x) % span_y) as i16,
            dx: if seed & 0b01 == 0 { 1 } else { -1 },
            dy: if seed & 0b10 == 0 { 1 } else { -1 },
            last_step: now,
        }
    }

    /// Advances the animation by however many whole steps have elapsed since the last one. Returns `true` if the block
    /// moved.
    pub fn advance(&mut self, now: Instant) -> bool {
        let mut moved = false;
        while now >= self.last_step + STEP_INTERVAL {
            self.last_step += STEP_INTERVAL;
            self.step();
            moved = true;
        }
        moved
    }

    fn step(&mut self) {
        self.x += self.dx;
        self.y += self.dy;

        let max_x = FIELD_WIDTH - BLOCK_SIZE;
        if self.x <= 0 || self.x >= max_x {
            self.dx = -self.dx;
            self.x = self.x.clamp(0, max_x);
        }
        let max_y = FIELD_HEIGHT - BLOCK_SIZE;
        if self.y <= 0 || self.y >= max_y {
            self.dy = -self.dy;
            self.y = self.y.clamp(0, max_y);
        }
    }
}

/// Tracks user activity and moves the display between [`SleepState`]s.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SleepController {
    state: SleepState,
    sleep_timeout: Duration,
    deep_sleep_timeout: Duration,
    last_activity: Instant,
    /// When the current state was entered
    since: Instant,
    bounce: Bounce,
}

impl SleepController {
    /// Constructs a [`SleepController`] in the [`SleepState::Active`] state, treating `now` as the last activity.
    pub fn new(config: &HubConfig, now: Instant) -> Self {
        Self {
            state: SleepState::Active,
            sleep_timeout: config.sleep_timeout,
            deep_sleep_timeout: config.deep_sleep_timeout,
            last_activity: now,
            since: now,
            bounce: Bounce::new(now),
        }
    }

    /// The current state.
    pub fn state(&self) -> SleepState {
        self.state
    }

    /// The screensaver animation. Only meaningful while in [`SleepState::Screensaver`].
    pub fn bounce(&self) -> &Bounce {
        &self.bounce
    }

    /// Records user activity at `now`.
    ///
    /// Returns the state the display woke from, if it wasn't [`SleepState::Active`]; the caller must then redraw the
    /// display in full (and power it back on, after deep sleep).
    pub fn activity(&mut self, now: Instant) -> Option<SleepState> {
        self.last_activity = now;
        match self.state {
            SleepState::Active => None,
            previous => {
                info!("Waking from {}", previous);
                self.enter(SleepState::Active, now);
                Some(previous)
            }
        }
    }

    /// Moves to the next state if its timeout has passed. Returns the new state on a transition.
    pub fn update(&mut self, now: Instant) -> Option<SleepState> {
        let next = match self.state {
            SleepState::Active
                if !is_disabled(self.sleep_timeout) && now >= self.last_activity + self.sleep_timeout =>
            {
                SleepState::Screensaver
            }
            SleepState::Screensaver
                if !is_disabled(self.deep_sleep_timeout) && now >= self.since + self.deep_sleep_timeout =>
            {
                SleepState::DeepSleep
            }
            _ => return None,
        };

        info!("Entering {}", next);
        self.enter(next, now);
        Some(next)
    }

    /// Steps the screensaver animation. Returns `true` if it needs redrawing.
    pub fn animate(&mut self, now: Instant) -> bool {
        self.state == SleepState::Screensaver && self.bounce.advance(now)
    }

    fn enter(&mut self, state: SleepState, now: Instant) {
        if state == SleepState::Screensaver {
            self.bounce = Bounce::new(now);
        }
        self.state = state;
        self.since = now;
    }
}
