//! Owners and liveness.
//!
//! An owner is any host entity (a door, a UI panel, a scene actor) that groups
//! subscriptions for bulk teardown. The bus only stores its [`OwnerId`]; whether
//! the entity still exists is answered by a host-supplied [`Liveness`] check.

use crate::error::EventBusError;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Opaque, non-owning reference to a subscription owner.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(NonZeroU64);

impl OwnerId {
    /// Wraps a host entity id.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidArgument`] for `0`, which is reserved.
    pub fn try_new(raw: u64) -> Result<Self, EventBusError> {
        NonZeroU64::new(raw)
            .map(Self)
            .ok_or_else(|| EventBusError::invalid_argument("owner id 0 is reserved"))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerId({})", self.0)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocates fresh owner ids for hosts without their own entity ids.
#[derive(Debug)]
pub struct OwnerIds {
    next: AtomicU64,
}

impl OwnerIds {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    /// Returns the next unused id.
    ///
    /// # Panics
    /// Panics if the `u64` space is exhausted.
    pub fn next(&self) -> OwnerId {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        OwnerId(NonZeroU64::new(raw).expect("owner id space exhausted"))
    }
}

impl Default for OwnerIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Host-supplied answer to "does this owner still exist?".
///
/// Owners the implementation knows nothing about must be reported alive; the bus
/// only reclaims owners that are explicitly classified dead.
pub trait Liveness: Send + Sync {
    fn is_alive(&self, owner: OwnerId) -> bool;
}

impl<F> Liveness for F
where
    F: Fn(OwnerId) -> bool + Send + Sync,
{
    fn is_alive(&self, owner: OwnerId) -> bool {
        self(owner)
    }
}

/// [`Liveness`] backed by weak references to `Arc`-managed host entities.
///
/// An owner is dead once every strong reference to its entity has been dropped.
///
/// # Example
///
/// ```rust
/// use ember_event_bus::{Liveness, LivenessTable, OwnerIds};
/// use std::sync::Arc;
///
/// struct Door;
///
/// let ids = OwnerIds::new();
/// let table = LivenessTable::new();
///
/// let door = Arc::new(Door);
/// let owner = ids.next();
/// table.track(owner, &door);
/// assert!(table.is_alive(owner));
///
/// drop(door);
/// assert!(!table.is_alive(owner));
/// ```
#[derive(Clone, Default)]
pub struct LivenessTable {
    entries: Arc<RwLock<FxHashMap<OwnerId, Weak<dyn Any + Send + Sync>>>>,
}

impl LivenessTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `entity` as `owner`, replacing any previous entity for that id.
    pub fn track<T: Any + Send + Sync>(&self, owner: OwnerId, entity: &Arc<T>) {
        let weak = Arc::downgrade(entity);
        let weak: Weak<dyn Any + Send + Sync> = weak;
        self.entries.write().insert(owner, weak);
    }

    /// Stops tracking `owner`. Returns `true` if it was tracked.
    pub fn forget(&self, owner: OwnerId) -> bool {
        self.entries.write().remove(&owner).is_some()
    }

    /// Drops entries whose entity is gone. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, weak| weak.strong_count() > 0);
        before - entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Liveness for LivenessTable {
    fn is_alive(&self, owner: OwnerId) -> bool {
        self.entries.read().get(&owner).is_none_or(|weak| weak.strong_count() > 0)
    }
}

impl fmt::Debug for LivenessTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LivenessTable").field("tracked", &self.len()).finish()
    }
}
