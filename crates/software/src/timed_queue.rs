//! Provides [`TimedMessageQueue`], a bounded FIFO of short notifications which are shown one at a time, each for a
//! limited time.
//!
//! Only the head of the queue is ever on screen. Entries leave the queue in exactly two ways: the head expires, or the
//! oldest entry is evicted to make room for a new one.

use crate::{configuration::MAX_NOTIFICATIONS, text};
use embassy_time::{Duration, Instant};
use heapless::{Deque, String};

/// Maximum length in bytes of a notification.
pub const MESSAGE_LEN: usize = 63;

/// A single notification.
pub type Message = String<MESSAGE_LEN>;

/// When the head of the queue is allowed to expire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Expiry {
    /// As soon as its deadline passes.
    Timed,
    /// Once its deadline passes *and* the display has reported showing it in full (see
    /// [`TimedMessageQueue::mark_shown`]). A long message which has to scroll may therefore outlive its deadline.
    UntilShown,
}

/// A bounded FIFO of notifications, each displayed for a fixed duration.
#[derive(Clone, Debug)]
pub struct TimedMessageQueue<const N: usize = MAX_NOTIFICATIONS> {
    messages: Deque<Message, N>,
    duration: Duration,
    expiry: Expiry,
    /// When the current head expires; `None` exactly when the queue is empty
    deadline: Option<Instant>,
    shown: bool,
}

#[cfg(feature = "defmt")]
impl<const N: usize> defmt::Format for TimedMessageQueue<N> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "TimedMessageQueue {{ ");
        defmt::write!(fmt, "messages: [");
        for (i, message) in self.messages.iter().enumerate() {
            if i == 0 {
                defmt::write!(fmt, " ");
            } else {
                defmt::write!(fmt, ", ");
            }
            defmt::write!(fmt, "{=str}", message.as_str());
        }
        defmt::write!(fmt, " ], deadline: {}", self.deadline);
        defmt::write!(fmt, " }}");
    }
}

impl<const N: usize> TimedMessageQueue<N> {
    /// Constructs a queue whose entries each stay at the head for `duration`.
    pub fn new(duration: Duration) -> Self {
        Self::with_expiry(duration, Expiry::Timed)
    }

    /// Constructs a queue for modal toasts: the head stays until `duration` has passed and the display has shown it
    /// completely.
    pub fn modal(duration: Duration) -> Self {
        Self::with_expiry(duration, Expiry::UntilShown)
    }

    /// Constructs a queue whose head expires according to `expiry`.
    pub fn with_expiry(duration: Duration, expiry: Expiry) -> Self {
        Self {
            messages: Deque::new(),
            duration,
            expiry,
            deadline: None,
            shown: false,
        }
    }

    /// Appends a notification, truncated to [`MESSAGE_LEN`] bytes.
    ///
    /// When the queue is full the oldest entry is evicted first. When the queue was empty, the new entry becomes the head
    /// and its deadline starts at `now`. An evicted head hands its remaining time on to the entry behind it.
    pub fn enqueue(&mut self, message: &str, now: Instant) {
        if self.messages.is_full() {
            if let Some(evicted) = self.messages.pop_front() {
                debug!("Evicting notification {=str}", evicted.as_str());
            }
            self.shown = false;
        }
        if self.messages.is_empty() {
            self.deadline = Some(now + self.duration);
            self.shown = false;
        }
        // cannot fail: room was made above
        let _ = self.messages.push_back(text::truncate(message));
    }

    /// The notification currently on display, if any.
    pub fn current(&self) -> Option<&str> {
        self.messages.front().map(Message::as_str)
    }

    /// Records that the display has shown the current head completely. Only meaningful for [`Expiry::UntilShown`].
    pub fn mark_shown(&mut self) {
        if !self.messages.is_empty() {
            self.shown = true;
        }
    }

    /// Drops the head if it has expired, starting a fresh deadline for the next entry. Returns `true` if the head
    /// changed, in which case the display needs redrawing.
    pub fn update(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        if now < deadline || (self.expiry == Expiry::UntilShown && !self.shown) {
            return false;
        }

        self.messages.pop_front();
        self.shown = false;
        self.deadline = if self.messages.is_empty() {
            None
        } else {
            Some(now + self.duration)
        };
        true
    }

    /// Iterates over the pending notifications, head first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(Message::as_str)
    }

    /// Number of pending notifications.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if no notification is pending.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SECONDS: Duration = Duration::from_secs(2);

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn first_enqueue_becomes_head() {
        let mut queue = TimedMessageQueue::<8>::new(TWO_SECONDS);
        assert_eq!(None, queue.current());
        queue.enqueue("Route created", at(0));
        assert_eq!(Some("Route created"), queue.current(), "Expected left but got right");
    }

    #[test]
    fn nine_into_eight_drops_only_the_first() {
        let mut queue = TimedMessageQueue::<8>::new(TWO_SECONDS);
        let messages = ["1", "2", "3", "4", "5", "6", "7", "8", "9"];
        for message in messages {
            queue.enqueue(message, at(0));
        }

        assert_eq!(8, queue.len(), "Expected left but got right");
        assert!(queue.iter().eq(messages[1..].iter().copied()), "Remaining entries should keep their order");
    }

    #[test]
    fn head_expires_at_deadline() {
        let mut queue = TimedMessageQueue::<8>::new(TWO_SECONDS);
        queue.enqueue("a", at(1_000));
        queue.enqueue("b", at(1_500));

        assert!(!queue.update(at(2_999)), "Head should still be live");
        assert_eq!(Some("a"), queue.current());

        assert!(queue.update(at(3_000)), "Head should expire exactly at its deadline");
        assert_eq!(Some("b"), queue.current());
    }

    #[test]
    fn next_head_gets_a_fresh_deadline() {
        let mut queue = TimedMessageQueue::<8>::new(TWO_SECONDS);
        queue.enqueue("a", at(0));
        queue.enqueue("b", at(0));

        // a late poll: b's time starts from when a was actually dropped
        assert!(queue.update(at(5_000)));
        assert!(!queue.update(at(6_999)), "b should get a full duration");
        assert!(queue.update(at(7_000)));
        assert!(queue.is_empty());
        assert!(!queue.update(at(100_000)), "An empty queue never changes");
    }

    #[test]
    fn enqueue_does_not_extend_live_head() {
        let mut queue = TimedMessageQueue::<8>::new(TWO_SECONDS);
        queue.enqueue("a", at(0));
        queue.enqueue("b", at(1_900));
        assert!(queue.update(at(2_000)), "Enqueueing behind the head must not delay it");
    }

    #[test]
    fn long_message_is_truncated() {
        let mut queue = TimedMessageQueue::<8>::new(TWO_SECONDS);
        let long = core::str::from_utf8(&[b'x'; 100]).unwrap();
        queue.enqueue(long, at(0));
        assert_eq!(Some(&long[..MESSAGE_LEN]), queue.current());
    }

    #[test]
    fn modal_waits_until_shown() {
        let mut queue = TimedMessageQueue::<8>::modal(TWO_SECONDS);
        queue.enqueue("A long message that scrolls", at(0));

        assert!(!queue.update(at(10_000)), "Modal head must wait for the display");
        queue.mark_shown();
        assert!(queue.update(at(10_000)), "Shown and past its deadline");
        assert!(queue.is_empty());
    }

    #[test]
    fn modal_shown_early_still_waits_for_deadline() {
        let mut queue = TimedMessageQueue::<8>::modal(TWO_SECONDS);
        queue.enqueue("short", at(0));
        queue.mark_shown();
        assert!(!queue.update(at(1_000)), "Deadline has not passed yet");
        assert!(queue.update(at(2_000)));
    }

    #[test]
    fn shown_flag_belongs_to_one_head() {
        let mut queue = TimedMessageQueue::<8>::modal(TWO_SECONDS);
        queue.enqueue("a", at(0));
        queue.enqueue("b", at(0));
        queue.mark_shown();
        assert!(queue.update(at(2_000)));
        assert!(!queue.update(at(10_000)), "b has not been shown yet");
    }
}
