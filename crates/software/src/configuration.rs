//! This module contains the hub's fixed limits and the timing settings which shape its user interface.

use crate::timed_queue::Expiry;
use embassy_time::Duration;

/// Maximum number of routes the table holds (and persists).
pub const MAX_ROUTES: usize = 16;

/// Number of device slots the USB host side exposes.
pub const MAX_MIDI_DEVICES: usize = 8;

/// Number of notifications that may wait for display before the oldest is evicted.
pub const MAX_NOTIFICATIONS: usize = 8;

/// Depth of the navigation back-stack. The add-route wizard is exactly three pages deep, so anything beyond this is a
/// defect rather than a user action.
pub const MAX_STACK_DEPTH: usize = 4;

/// Timing settings for the user interface.
///
/// The defaults are the values the hub ships with. Setting either sleep timeout to [`Duration::MIN`] (zero) disables
/// that transition entirely, e.g. for installations where the display should never blank.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HubConfig {
    /// Idle time before the screensaver starts.
    pub sleep_timeout: Duration,
    /// Time spent in the screensaver before the display is switched off.
    pub deep_sleep_timeout: Duration,
    /// How long each notification stays on screen.
    pub notification_duration: Duration,
    /// Whether a notification may leave the screen before the display has shown it in full.
    pub notification_expiry: Expiry,
    /// Interval between iterations of the control loop.
    pub refresh_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            sleep_timeout: Duration::from_secs(30),
            deep_sleep_timeout: Duration::from_secs(600),
            notification_duration: Duration::from_secs(2),
            notification_expiry: Expiry::Timed,
            refresh_interval: Duration::from_millis(100),
        }
    }
}

/// Returns `true` if `duration` is zero, i.e. if the transition it governs is disabled.
pub(crate) fn is_disabled(duration: Duration) -> bool {
    duration.as_ticks() == 0
}
