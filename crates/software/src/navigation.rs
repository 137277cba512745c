//! The menu system: a small stack-based state machine of pages.
//!
//! Each page owns only its local state (mostly a selection index). Everything else a page needs is lent to it for the
//! duration of a call through [`PageContext`], and a page never navigates by itself: it returns an [`Outcome`] which the
//! [`Navigator`] applies.

use crate::{
    configuration::MAX_STACK_DEPTH,
    device::{DeviceDirectory, DeviceRef},
    input::InputEvent,
    render::{Frame, Overlay},
    route_table::RouteStore,
    text,
    timed_queue::TimedMessageQueue,
};
use embassy_time::{Duration, Instant};
use enum_dispatch::enum_dispatch;
use heapless::Vec;

mod confirm_route;
mod connections;
mod dest_list;
mod device_picker;
mod main_menu;
mod source_list;

pub use confirm_route::ConfirmRoute;
pub use connections::Connections;
pub use dest_list::DestList;
pub use main_menu::MainMenu;
pub use source_list::SourceList;

/// Identifies a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PageId {
    /// The top-level menu.
    MainMenu,
    /// First step of the add-route wizard: pick the device MIDI flows from.
    SourceList,
    /// Second step of the add-route wizard: pick the device MIDI flows to.
    DestList,
    /// Last step of the add-route wizard: confirm the new route.
    ConfirmRoute,
    /// The list of configured routes, from which routes can be deleted.
    Connections,
}

/// What the [`Navigator`] should do after a page has handled input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Nothing changed.
    Ignored,
    /// The page's state changed; redraw it.
    Redraw,
    /// Push the current page and enter another.
    Navigate(PageId),
    /// Return to the previous page.
    Back,
    /// Unwind the add-route wizard back to the main menu.
    ReturnToMenu,
}

/// The devices chosen so far in the add-route wizard.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WizardSelection {
    /// The device MIDI will flow from.
    pub source: Option<DeviceRef>,
    /// The device MIDI will flow to.
    pub dest: Option<DeviceRef>,
}

/// Everything outside a page that the page may look at or change.
pub struct PageContext<'a> {
    /// The route table.
    pub routes: &'a mut dyn RouteStore,
    /// The devices currently attached.
    pub devices: &'a dyn DeviceDirectory,
    /// The add-route wizard's choices so far.
    pub wizard: &'a mut WizardSelection,
    /// Notifications for the user.
    pub notifications: &'a mut TimedMessageQueue,
    /// The current time.
    pub now: Instant,
}

impl PageContext<'_> {
    /// Queues a notification for the user.
    pub fn notify(&mut self, message: &str) {
        self.notifications.enqueue(message, self.now);
    }
}

/// The lifecycle every page implements.
#[enum_dispatch(Page)]
pub trait Screen {
    /// Called when the page becomes the current page. Resets local state.
    fn enter(&mut self, ctx: &mut PageContext);

    /// Called when the page stops being the current page.
    fn exit(&mut self, _ctx: &mut PageContext) {}

    /// Polls for changes in external state. Returns `true` if the page needs redrawing.
    fn update(&mut self, ctx: &mut PageContext) -> bool;

    /// Describes the page's current appearance. Must not change any state.
    fn render(&self, ctx: &PageContext) -> Frame;

    /// Reacts to user input. The only place a page changes state on the user's behalf.
    fn handle_input(&mut self, event: InputEvent, ctx: &mut PageContext) -> Outcome;
}

/// Every page, as a single type.
#[enum_dispatch]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Page {
    /// See [`PageId::MainMenu`].
    MainMenu(MainMenu),
    /// See [`PageId::SourceList`].
    SourceList(SourceList),
    /// See [`PageId::DestList`].
    DestList(DestList),
    /// See [`PageId::ConfirmRoute`].
    ConfirmRoute(ConfirmRoute),
    /// See [`PageId::Connections`].
    Connections(Connections),
}

impl Page {
    /// Identifies this page.
    pub fn id(&self) -> PageId {
        match self {
            Page::MainMenu(_) => PageId::MainMenu,
            Page::SourceList(_) => PageId::SourceList,
            Page::DestList(_) => PageId::DestList,
            Page::ConfirmRoute(_) => PageId::ConfirmRoute,
            Page::Connections(_) => PageId::Connections,
        }
    }
}

impl From<PageId> for Page {
    fn from(id: PageId) -> Self {
        match id {
            PageId::MainMenu => MainMenu::default().into(),
            PageId::SourceList => SourceList::default().into(),
            PageId::DestList => DestList::default().into(),
            PageId::ConfirmRoute => ConfirmRoute::default().into(),
            PageId::Connections => Connections::default().into(),
        }
    }
}

/// A cursor over a list of selectable rows: `items` entries followed by a final "Back" row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct ListCursor {
    selected: usize,
}

impl ListCursor {
    pub(crate) fn selected(self) -> usize {
        self.selected
    }

    /// Returns `true` if the "Back" row is selected.
    pub(crate) fn on_back(self, items: usize) -> bool {
        self.selected == items
    }

    pub(crate) fn reset(&mut self) {
        self.selected = 0;
    }

    /// Moves the cursor by `event` over `items` entries plus "Back". Returns `true` if it moved.
    pub(crate) fn step(&mut self, event: InputEvent, items: usize) -> bool {
        match event {
            InputEvent::Up if self.selected > 0 => {
                self.selected -= 1;
                true
            }
            InputEvent::Down if self.selected < items => {
                self.selected += 1;
                true
            }
            _ => false,
        }
    }

    /// Keeps the cursor within a list which now has `items` entries: past the end it moves to the last entry, and
    /// with no entries it rests on the first row (which is then "Back").
    pub(crate) fn clamp(&mut self, items: usize) {
        if items == 0 {
            self.selected = 0;
        } else if self.selected >= items {
            self.selected = items - 1;
        }
    }
}

/// Builds the overlay for a yes/no prompt.
pub(crate) fn confirm(question: &str, yes: &str, no: &str, yes_selected: bool) -> Overlay {
    Overlay::Confirm {
        question: text::truncate(question),
        yes: text::truncate(yes),
        no: text::truncate(no),
        yes_selected,
    }
}

/// Owns the current page, the back-stack, and the state shared between pages.
pub struct Navigator {
    page: Page,
    stack: Vec<PageId, MAX_STACK_DEPTH>,
    wizard: WizardSelection,
    notifications: TimedMessageQueue,
    dirty: bool,
}

/// Lends a [`PageContext`] built from the navigator's own state plus the collaborators passed in.
macro_rules! context {
    ($self:ident, $routes:expr, $devices:expr, $now:expr) => {
        PageContext {
            routes: $routes,
            devices: $devices,
            wizard: &mut $self.wizard,
            notifications: &mut $self.notifications,
            now: $now,
        }
    };
}

impl Navigator {
    /// Constructs a [`Navigator`] showing the main menu, with notifications lasting `notification_duration`.
    pub fn new(notification_duration: Duration) -> Self {
        Self::with_notifications(TimedMessageQueue::new(notification_duration))
    }

    /// Constructs a [`Navigator`] showing the main menu and using the given notification queue.
    pub fn with_notifications(notifications: TimedMessageQueue) -> Self {
        Self {
            page: PageId::MainMenu.into(),
            stack: Vec::new(),
            wizard: WizardSelection::default(),
            notifications,
            dirty: true,
        }
    }

    /// The current page.
    pub fn current(&self) -> PageId {
        self.page.id()
    }

    /// Number of pages on the back-stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The add-route wizard's choices so far.
    pub fn wizard(&self) -> &WizardSelection {
        &self.wizard
    }

    /// Pending notifications.
    pub fn notifications(&self) -> &TimedMessageQueue {
        &self.notifications
    }

    /// Queues a notification and redraws so it is shown.
    pub fn notify(&mut self, message: &str, now: Instant) {
        self.notifications.enqueue(message, now);
        self.dirty = true;
    }

    /// Records that the display has shown the current notification in full.
    pub fn notification_shown(&mut self) {
        self.notifications.mark_shown();
    }

    /// Forces the next [`render`](Self::render) to produce a frame.
    pub fn request_redraw(&mut self) {
        self.dirty = true;
    }

    /// Returns `true` if the next [`render`](Self::render) will produce a frame.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Leaves the current page for `id`, remembering the current page so [`go_back`](Self::go_back) can return to it.
    pub fn navigate_to(
        &mut self,
        id: PageId,
        routes: &mut dyn RouteStore,
        devices: &dyn DeviceDirectory,
        now: Instant,
    ) {
        let current = self.page.id();
        debug!("Navigating from {} to {}", current, id);

        self.page.exit(&mut context!(self, &mut *routes, devices, now));
        if self.stack.push(current).is_err() {
            error!("Navigation stack overflow; {} will not be returned to", current);
            debug_assert!(false, "navigation stack overflow");
        }
        self.enter(id, routes, devices, now);
    }

    /// Returns to the previous page. Does nothing at the bottom of the stack.
    pub fn go_back(&mut self, routes: &mut dyn RouteStore, devices: &dyn DeviceDirectory, now: Instant) {
        let Some(previous) = self.stack.pop() else {
            return;
        };
        debug!("Going back from {} to {}", self.page.id(), previous);

        self.page.exit(&mut context!(self, &mut *routes, devices, now));
        self.enter(previous, routes, devices, now);
    }

    fn enter(&mut self, id: PageId, routes: &mut dyn RouteStore, devices: &dyn DeviceDirectory, now: Instant) {
        self.page = id.into();
        self.page.enter(&mut context!(self, routes, devices, now));
        self.dirty = true;
    }

    /// Passes `event` to the current page and applies the outcome.
    pub fn handle_input(
        &mut self,
        event: InputEvent,
        routes: &mut dyn RouteStore,
        devices: &dyn DeviceDirectory,
        now: Instant,
    ) {
        if !event.is_some() {
            return;
        }

        let queued = self.notifications.len();
        let outcome = self
            .page
            .handle_input(event, &mut context!(self, &mut *routes, devices, now));
        if self.notifications.len() != queued {
            self.dirty = true;
        }

        match outcome {
            Outcome::Ignored => {}
            Outcome::Redraw => self.dirty = true,
            Outcome::Navigate(id) => self.navigate_to(id, routes, devices, now),
            Outcome::Back => self.go_back(routes, devices, now),
            Outcome::ReturnToMenu => {
                // the wizard is exactly three pages deep
                for _ in 0..3 {
                    self.go_back(&mut *routes, devices, now);
                }
            }
        }
    }

    /// Expires notifications and lets the current page poll for external changes.
    pub fn update(&mut self, routes: &mut dyn RouteStore, devices: &dyn DeviceDirectory, now: Instant) {
        if self.notifications.update(now) {
            self.dirty = true;
        }
        if self.page.update(&mut context!(self, routes, devices, now)) {
            self.dirty = true;
        }
    }

    /// Describes the screen, if it has changed since the last call.
    ///
    /// The current notification, if any, is shown as a toast unless the page is showing a dialog.
    pub fn render(
        &mut self,
        routes: &mut dyn RouteStore,
        devices: &dyn DeviceDirectory,
        now: Instant,
    ) -> Option<Frame> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;

        let mut frame = self.page.render(&context!(self, routes, devices, now));
        if frame.overlay.is_none() {
            frame.overlay = self
                .notifications
                .current()
                .map(|message| Overlay::Toast(text::truncate(message)));
        }
        Some(frame)
    }
}
