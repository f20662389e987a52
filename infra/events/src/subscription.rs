use crate::event::EventKind;
use crate::registry::Registry;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// Process-unique id of one registration.
///
/// Re-subscribing a handler after it was removed yields a new id, so an old
/// [`Subscription`] can never cancel the newer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cancellable token for exactly one registration.
///
/// Dropping a `Subscription` does **not** unsubscribe; the registration lives until
/// [`Subscription::cancel`], an explicit unsubscribe, owner teardown, or
/// [`EventBus::clear`](crate::EventBus::clear). Use [`Subscription::into_guard`] for
/// scope-bound registrations.
pub struct Subscription {
    target: Option<Target>,
    cancelled: AtomicBool,
}

struct Target {
    id: SubscriptionId,
    kind: EventKind,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, kind: EventKind, registry: Weak<Mutex<Registry>>) -> Self {
        Self { target: Some(Target { id, kind, registry }), cancelled: AtomicBool::new(false) }
    }

    /// A handle that refers to no registration. Cancelling it does nothing.
    #[must_use]
    pub const fn noop() -> Self {
        Self { target: None, cancelled: AtomicBool::new(true) }
    }

    /// Id of the registration, `None` for a no-op handle.
    #[must_use]
    pub fn id(&self) -> Option<SubscriptionId> {
        self.target.as_ref().map(|t| t.id)
    }

    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.target.is_none()
    }

    /// Whether the registration is still present on the bus.
    ///
    /// Becomes `false` after cancellation and after any other removal path
    /// (unsubscribe, owner teardown, sweep, clear).
    #[must_use]
    pub fn is_active(&self) -> bool {
        let Some(target) = &self.target else {
            return false;
        };
        !self.cancelled.load(Ordering::Acquire)
            && target.registry.upgrade().is_some_and(|reg| reg.lock().is_live(target.id))
    }

    /// Removes the registration this handle was issued for.
    ///
    /// Idempotent: returns `true` only on the call that actually removed it.
    pub fn cancel(&self) -> bool {
        let Some(target) = &self.target else {
            return false;
        };
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }
        let Some(registry) = target.registry.upgrade() else {
            return false;
        };

        let removed = registry.lock().remove(target.id);
        trace!(event = target.kind.name(), subscription = %target.id, removed, "Subscription cancelled");
        removed
    }

    /// Converts the handle into a guard that cancels on drop.
    #[must_use = "dropping the guard cancels the subscription immediately"]
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard { inner: Some(self) }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(t) => f
                .debug_struct("Subscription")
                .field("id", &t.id)
                .field("kind", &t.kind)
                .field("cancelled", &self.cancelled.load(Ordering::Relaxed))
                .finish(),
            None => f.write_str("Subscription(noop)"),
        }
    }
}

/// Scope guard around a [`Subscription`]; cancels it when dropped.
#[derive(Debug)]
pub struct SubscriptionGuard {
    inner: Option<Subscription>,
}

impl SubscriptionGuard {
    /// Disarms the guard and hands the subscription back.
    #[must_use]
    pub fn release(mut self) -> Subscription {
        self.inner.take().unwrap_or_else(Subscription::noop)
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(sub) = self.inner.take() {
            sub.cancel();
        }
    }
}
