//! The persistent table of permitted source→destination device pairs.
//!
//! A route names two devices by USB identity (VID:PID). The table is deliberately explicit: when it is empty nothing
//! is routed at all, and a route only matches its exact source and destination, without wildcards.

use crate::{
    configuration::MAX_ROUTES,
    device::{DeviceId, DeviceRef},
    storage::Storage,
    text,
};
use heapless::String;
use tinyvec::ArrayVec;

mod layout;
pub use layout::{ConfigCorrupt, IMAGE_LEN};

/// Maximum length in bytes of a device name stored alongside a route.
///
/// Each name occupies a 24-byte field in storage, one byte of which is reserved for the terminator.
pub const STORED_NAME_LEN: usize = 23;

/// A device name as stored in a route.
pub type StoredName = String<STORED_NAME_LEN>;

/// Uniquely identifies a [`Route`] within the table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RouteKey {
    /// Identity of the device MIDI flows from.
    pub source: DeviceId,
    /// Identity of the device MIDI flows to.
    pub dest: DeviceId,
}

/// A permitted source→destination pairing.
///
/// Names are kept only so routes can be listed while their devices are unplugged; they play no part in matching.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Route {
    /// Identity of the device MIDI flows from.
    pub source: DeviceId,
    /// Name of the source device when the route was created.
    pub source_name: StoredName,
    /// Identity of the device MIDI flows to.
    pub dest: DeviceId,
    /// Name of the destination device when the route was created.
    pub dest_name: StoredName,
    /// Whether the slot holds a live route. Always `true` for routes in the table.
    pub active: bool,
}

impl Route {
    /// Constructs a [`Route`] between two devices, truncating their names to [`STORED_NAME_LEN`].
    pub fn new(source: &DeviceRef, dest: &DeviceRef) -> Self {
        Self {
            source: source.id,
            source_name: text::truncate(&source.name),
            dest: dest.id,
            dest_name: text::truncate(&dest.name),
            active: true,
        }
    }

    /// Returns this route's [`RouteKey`].
    pub fn key(&self) -> RouteKey {
        RouteKey {
            source: self.source,
            dest: self.dest,
        }
    }
}

/// Reasons a route mutation may be refused.
///
/// The messages double as the notification text shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RouteError {
    /// A route with the same key already exists.
    #[error("Route already exists")]
    Duplicate,
    /// The table already holds [`MAX_ROUTES`] routes.
    #[error("Max routes reached!")]
    Full,
    /// No route matches the given key or index.
    #[error("Route not found")]
    NotFound,
}

/// The mutations and queries the menu pages need, object-safe so pages can hold any table as `&mut dyn RouteStore`.
pub trait RouteStore {
    /// Adds a route from `source` to `dest`. See [`RouteTable::add_route`].
    fn add_route(&mut self, source: &DeviceRef, dest: &DeviceRef) -> Result<(), RouteError>;

    /// Removes the route at `index`. See [`RouteTable::remove_by_index`].
    fn remove_by_index(&mut self, index: usize) -> Result<Route, RouteError>;

    /// All routes, in insertion order.
    fn routes(&self) -> &[Route];
}

/// An ordered, deduplicated, bounded set of [`Route`]s which persists itself.
///
/// Every mutation rewrites storage before returning. Writes are synchronous, so callers should expect mutations to
/// take as long as the underlying store needs; that's acceptable because mutations are rare and user-initiated.
pub struct RouteTable<S> {
    routes: ArrayVec<[Route; MAX_ROUTES]>,
    storage: S,
}

impl<S: Storage> RouteTable<S> {
    /// Constructs an empty [`RouteTable`] backed by `storage`. Call [`load`](Self::load) to restore persisted routes.
    pub fn new(storage: S) -> Self {
        Self {
            routes: ArrayVec::new(),
            storage,
        }
    }

    /// Replaces the table's contents with the routes held in storage.
    ///
    /// Fails closed: if storage holds anything other than a well-formed table of the current format version, the table
    /// ends up empty. It is never partially populated.
    pub fn load(&mut self) {
        match layout::read(&self.storage) {
            Ok(routes) => {
                info!("Loaded {} routes", routes.len());
                self.routes = routes;
            }
            Err(reason) => {
                warn!("Discarding stored routes: {}", reason);
                self.routes.clear();
            }
        }
    }

    /// Writes the whole table to storage.
    pub fn save(&mut self) {
        layout::write(&self.routes, &mut self.storage);
        self.storage.commit();
        debug!("Saved {} routes", self.routes.len());
    }

    /// Adds a route from `source` to `dest` and persists the table.
    pub fn add_route(&mut self, source: &DeviceRef, dest: &DeviceRef) -> Result<(), RouteError> {
        let route = Route::new(source, dest);
        if self.position(route.key()).is_some() {
            return Err(RouteError::Duplicate);
        }
        if self.routes.len() >= MAX_ROUTES {
            return Err(RouteError::Full);
        }

        info!(
            "Adding route {} -> {}",
            route.source_name.as_str(),
            route.dest_name.as_str()
        );
        self.routes.push(route);
        self.save();
        Ok(())
    }

    /// Removes the route matching `key` and persists the table. Returns the removed route.
    pub fn remove_route(&mut self, key: RouteKey) -> Result<Route, RouteError> {
        let index = self.position(key).ok_or(RouteError::NotFound)?;
        self.remove_by_index(index)
    }

    /// Removes the route at `index` and persists the table. Later routes shift down one place, keeping their order.
    pub fn remove_by_index(&mut self, index: usize) -> Result<Route, RouteError> {
        if index >= self.routes.len() {
            return Err(RouteError::NotFound);
        }

        let route = self.routes.remove(index);
        info!(
            "Removed route {} -> {}",
            route.source_name.as_str(),
            route.dest_name.as_str()
        );
        self.save();
        Ok(route)
    }

    /// Removes every route and persists the (empty) table.
    pub fn clear_all(&mut self) {
        self.routes.clear();
        self.save();
    }

    /// Returns `true` if a route matching `key` exists.
    pub fn has_route(&self, key: RouteKey) -> bool {
        self.position(key).is_some()
    }

    /// Decides whether MIDI from `source` may flow to `dest`.
    ///
    /// An empty table routes nothing: absence of configuration never means "route everything".
    pub fn should_route(&self, source: DeviceId, dest: DeviceId) -> bool {
        !self.routes.is_empty() && self.has_route(RouteKey { source, dest })
    }

    /// Returns the route at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }

    /// Number of routes in the table.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if the table holds no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterates over the routes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// The store backing this table.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn position(&self, key: RouteKey) -> Option<usize> {
        self.routes.iter().position(|route| route.key() == key)
    }
}

impl<S: Storage> RouteStore for RouteTable<S> {
    fn add_route(&mut self, source: &DeviceRef, dest: &DeviceRef) -> Result<(), RouteError> {
        RouteTable::add_route(self, source, dest)
    }

    fn remove_by_index(&mut self, index: usize) -> Result<Route, RouteError> {
        RouteTable::remove_by_index(self, index)
    }

    fn routes(&self) -> &[Route] {
        self.routes.as_slice()
    }
}
