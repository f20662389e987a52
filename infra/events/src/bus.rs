use crate::dispatch::{self, DispatchReport};
use crate::error::EventBusError;
use crate::event::{Event, EventKind};
use crate::handler::{Handler, HandlerKey, HandlerRef};
use crate::owner::{Liveness, OwnerId};
use crate::registry::{ErasedHandler, Registry};
use crate::subscription::Subscription;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// A synchronous, thread-safe publish/subscribe hub keyed by payload type.
///
/// Handlers run on the publishing thread, in registration order, against a snapshot
/// of the list taken when `publish` starts. The registry lock is never held while a
/// handler runs, so handlers may subscribe, unsubscribe, publish or clear re-entrantly.
///
/// Cloning is cheap and every clone refers to the same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
    liveness: Option<Arc<dyn Liveness>>,
}

/// Builder for [`EventBus`].
#[derive(Default)]
pub struct EventBusBuilder {
    liveness: Option<Arc<dyn Liveness>>,
}

impl EventBusBuilder {
    /// Installs the liveness check used by [`EventBus::cleanup_dead_owners`].
    #[must_use]
    pub fn liveness(mut self, liveness: impl Liveness + 'static) -> Self {
        self.liveness = Some(Arc::new(liveness));
        self
    }

    #[must_use]
    pub fn build(self) -> EventBus {
        EventBus { registry: Arc::default(), liveness: self.liveness }
    }
}

impl EventBus {
    /// Creates an empty bus with no liveness check installed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::default()
    }

    /// Registers a handler with no owner.
    ///
    /// The handler is wrapped in a fresh allocation, so it can only be removed through the
    /// returned [`Subscription`] or [`EventBus::clear`]. Use [`EventBus::subscribe_ref`]
    /// to keep an identity for [`EventBus::unsubscribe`].
    ///
    /// # Examples
    /// ```rust
    /// use ember_event_bus::EventBus;
    /// use std::sync::atomic::{AtomicU32, Ordering};
    /// use std::sync::Arc;
    ///
    /// struct LeverPulled;
    ///
    /// let bus = EventBus::new();
    /// let pulls = Arc::new(AtomicU32::new(0));
    /// let counter = Arc::clone(&pulls);
    /// let sub = bus.subscribe(move |_: &LeverPulled| {
    ///     counter.fetch_add(1, Ordering::Relaxed);
    /// });
    ///
    /// bus.publish(LeverPulled);
    /// assert!(sub.cancel());
    /// bus.publish(LeverPulled);
    /// assert_eq!(pulls.load(Ordering::Relaxed), 1);
    /// ```
    pub fn subscribe<E: Event>(&self, handler: impl Handler<E>) -> Subscription {
        let handler: HandlerRef<E> = Arc::new(handler);
        self.subscribe_ref(&handler, None)
    }

    /// Registers a fresh handler under `owner`.
    pub fn subscribe_owned<E: Event>(&self, handler: impl Handler<E>, owner: OwnerId) -> Subscription {
        let handler: HandlerRef<E> = Arc::new(handler);
        self.subscribe_ref(&handler, Some(owner))
    }

    /// Registers a shared handler, optionally under an owner.
    ///
    /// A handler that is already registered for `E` is not added again: a warning is
    /// logged and a no-op [`Subscription`] is returned. The existing registration keeps
    /// its original owner.
    pub fn subscribe_ref<E: Event>(
        &self,
        handler: &HandlerRef<E>,
        owner: Option<OwnerId>,
    ) -> Subscription {
        self.try_subscribe(handler, owner).unwrap_or_else(|err| {
            warn!(event = EventKind::of::<E>().name(), owner = ?owner, error = %err, "Subscription ignored");
            Subscription::noop()
        })
    }

    /// Like [`EventBus::subscribe_ref`], but reports duplicates to the caller.
    ///
    /// # Errors
    /// Returns [`EventBusError::DuplicateSubscription`] if `handler` is already
    /// registered for `E`.
    pub fn try_subscribe<E: Event>(
        &self,
        handler: &HandlerRef<E>,
        owner: Option<OwnerId>,
    ) -> Result<Subscription, EventBusError> {
        let kind = EventKind::of::<E>();
        let erased: ErasedHandler = Arc::new(Arc::clone(handler));

        let id = self.registry.lock().insert(kind, HandlerKey::of(handler), erased, owner).ok_or_else(
            || EventBusError::DuplicateSubscription {
                message: "handler is already registered".into(),
                context: Some(kind.name().into()),
            },
        )?;

        trace!(event = kind.name(), subscription = %id, owner = ?owner, "Handler subscribed");
        Ok(Subscription::new(id, kind, Arc::downgrade(&self.registry)))
    }

    /// Removes `handler` from the `E` list. Returns `false` if it was not registered.
    pub fn unsubscribe<E: Event>(&self, handler: &HandlerRef<E>) -> bool {
        let kind = EventKind::of::<E>();
        let removed = self.registry.lock().remove_handler(kind.id(), HandlerKey::of(handler));
        match removed {
            Some(id) => {
                trace!(event = kind.name(), subscription = %id, "Handler unsubscribed");
                true
            },
            None => false,
        }
    }

    /// Removes every registration made under `owner`, across all event kinds.
    ///
    /// Returns the number of registrations removed.
    pub fn unsubscribe_all(&self, owner: OwnerId) -> usize {
        let removed = self.registry.lock().remove_owner(owner);
        if removed > 0 {
            debug!(%owner, removed, "Owner unsubscribed");
        }
        removed
    }

    /// Delivers `event` to every handler currently registered for `E`.
    ///
    /// Never fails. Handler errors and panics are contained, logged, and collected in
    /// the returned [`DispatchReport`]; the remaining handlers still run.
    pub fn publish<E: Event>(&self, event: E) -> DispatchReport {
        self.publish_ref(&event)
    }

    /// Borrowing variant of [`EventBus::publish`].
    pub fn publish_ref<E: Event>(&self, event: &E) -> DispatchReport {
        let kind = EventKind::of::<E>();
        let snapshot = self.registry.lock().snapshot(kind.id());
        let mut report = DispatchReport::default();

        if snapshot.is_empty() {
            trace!(event = kind.name(), "Event dropped: no subscribers");
            return report;
        }

        for (id, handler) in &snapshot {
            // Entries removed by an earlier handler in this dispatch are not called.
            if !self.registry.lock().is_live(*id) {
                report.skipped += 1;
                continue;
            }
            dispatch::invoke(kind, *id, handler, event, &mut report);
        }

        trace!(
            event = kind.name(),
            invoked = report.invoked,
            skipped = report.skipped,
            failed = report.failures.len(),
            "Event dispatched"
        );
        report
    }

    /// Runs the installed liveness check and tears down every dead owner.
    ///
    /// Returns the number of owners reclaimed, `0` if no check is installed.
    pub fn cleanup_dead_owners(&self) -> usize {
        match &self.liveness {
            Some(liveness) => self.cleanup_dead_owners_with(liveness.as_ref()),
            None => {
                debug!("No liveness check installed; sweep skipped");
                0
            },
        }
    }

    /// Tears down every tracked owner for which `liveness` reports `false`.
    ///
    /// The check runs without the registry lock held, so it may itself use the bus.
    pub fn cleanup_dead_owners_with(&self, liveness: &dyn Liveness) -> usize {
        let owners = self.registry.lock().owners();
        let dead: Vec<OwnerId> = owners.into_iter().filter(|owner| !liveness.is_alive(*owner)).collect();
        if dead.is_empty() {
            trace!("Sweep found no dead owners");
            return 0;
        }

        let (reclaimed, removed) = {
            let mut registry = self.registry.lock();
            dead.iter().fold((0_usize, 0_usize), |(owners, subs), owner| {
                match registry.remove_owner(*owner) {
                    0 => (owners, subs),
                    n => (owners + 1, subs + n),
                }
            })
        };

        if reclaimed > 0 {
            info!(owners = reclaimed, subscriptions = removed, "Reclaimed subscriptions of dead owners");
        }
        reclaimed
    }

    /// Drops every registration and owner record.
    ///
    /// Returns the number of registrations dropped. Outstanding [`Subscription`]s become
    /// inert and new registrations never reuse their ids.
    pub fn clear(&self) -> usize {
        let dropped = self.registry.lock().clear();
        debug!(dropped, "Event bus cleared");
        dropped
    }

    /// Number of handlers currently registered for `E`.
    #[must_use]
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.registry.lock().count(EventKind::of::<E>().id())
    }

    /// Number of live registrations made under `owner`.
    #[must_use]
    pub fn owner_subscription_count(&self, owner: OwnerId) -> usize {
        self.registry.lock().owner_count(owner)
    }

    /// Number of owners with at least one live registration.
    #[must_use]
    pub fn tracked_owner_count(&self) -> usize {
        self.registry.lock().owner_len()
    }

    /// Number of event kinds with at least one handler.
    #[must_use]
    pub fn kind_count(&self) -> usize {
        self.registry.lock().kind_len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.lock().len() == 0
    }
}

impl fmt::Debug for EventBusBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBusBuilder").field("liveness", &self.liveness.is_some()).finish()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("EventBus")
            .field("kinds", &registry.kind_names())
            .field("subscriptions", &registry.len())
            .field("owners", &registry.owner_len())
            .field("liveness", &self.liveness.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Ping;

    fn owner(raw: u64) -> OwnerId {
        OwnerId::try_new(raw).unwrap()
    }

    #[test]
    fn test_builder_debug_shows_liveness() {
        assert_eq!(format!("{:?}", EventBus::builder()), "EventBusBuilder { liveness: false }");
        let builder = EventBus::builder().liveness(|_: OwnerId| true);
        assert_eq!(format!("{builder:?}"), "EventBusBuilder { liveness: true }");
    }

    #[test]
    fn test_try_subscribe_reports_duplicate() {
        let bus = EventBus::new();
        let h: HandlerRef<Ping> = Arc::new(|_: &Ping| {});

        assert!(bus.try_subscribe(&h, None).is_ok());
        let err = bus.try_subscribe(&h, Some(owner(1))).unwrap_err();
        assert_eq!(err.as_label(), "duplicate_subscription");
        assert_eq!(bus.tracked_owner_count(), 0);
    }

    #[test]
    fn test_duplicate_returns_noop_handle() {
        let bus = EventBus::new();
        let h: HandlerRef<Ping> = Arc::new(|_: &Ping| {});

        let first = bus.subscribe_ref(&h, None);
        let second = bus.subscribe_ref(&h, None);

        assert!(second.is_noop());
        assert!(!second.cancel());
        assert!(first.is_active());
        assert_eq!(bus.subscriber_count::<Ping>(), 1);
    }

    #[test]
    fn test_cleanup_without_liveness_is_noop() {
        let bus = EventBus::new();
        bus.subscribe_owned(|_: &Ping| {}, owner(3));
        assert_eq!(bus.cleanup_dead_owners(), 0);
        assert_eq!(bus.owner_subscription_count(owner(3)), 1);
    }

    #[test]
    fn test_builder_liveness_is_used() {
        let bus = EventBus::builder().liveness(|o: OwnerId| o.get() % 2 == 0).build();
        bus.subscribe_owned(|_: &Ping| {}, owner(1));
        bus.subscribe_owned(|_: &Ping| {}, owner(2));

        assert_eq!(bus.cleanup_dead_owners(), 1);
        assert_eq!(bus.tracked_owner_count(), 1);
        assert_eq!(bus.owner_subscription_count(owner(2)), 1);
    }

    #[test]
    fn test_clones_share_registry() {
        let bus = EventBus::new();
        let other = bus.clone();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        other.subscribe(move |_: &Ping| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(bus.publish(Ping).invoked, 1);
        assert_eq!(hits.load(Ordering::Relaxed), 1);
        assert!(format!("{bus:?}").contains("Ping"));
    }
}
