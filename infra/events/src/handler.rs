use crate::event::Event;
use std::borrow::Cow;
use std::fmt::Display;
use std::sync::Arc;

/// Result of a single handler invocation.
///
/// `Err` carries the failure detail that ends up in the bus diagnostics.
pub type HandlerOutcome = Result<(), Cow<'static, str>>;

/// A single-argument callback that receives payloads of one event kind.
///
/// Implemented for every `Fn(&E)` closure returning `()` or `Result<(), impl Display>`,
/// so most callers never name this trait directly.
///
/// # Example
///
/// ```rust
/// use ember_event_bus::{EventBus, Handler, HandlerRef};
/// use std::sync::Arc;
///
/// struct Damage(i32);
///
/// let bus = EventBus::new();
/// let on_damage: HandlerRef<Damage> = Arc::new(|d: &Damage| {
///     if d.0 < 0 { Err(format!("negative damage {}", d.0)) } else { Ok(()) }
/// });
/// let _sub = bus.subscribe_ref(&on_damage, None);
///
/// let report = bus.publish(Damage(-3));
/// assert_eq!(report.failures.len(), 1);
/// ```
pub trait Handler<E: Event>: Send + Sync + 'static {
    fn handle(&self, event: &E) -> HandlerOutcome;
}

/// Shared reference to a registered handler.
///
/// The identity of a handler is the `Arc` allocation: clones of the same `HandlerRef`
/// are the same handler, two separately created `Arc`s are different handlers even if
/// they wrap identical closures.
pub type HandlerRef<E> = Arc<dyn Handler<E>>;

/// Conversion of a closure's return value into a [`HandlerOutcome`].
pub trait IntoHandlerOutcome {
    fn into_outcome(self) -> HandlerOutcome;
}

impl IntoHandlerOutcome for () {
    #[inline]
    fn into_outcome(self) -> HandlerOutcome {
        Ok(())
    }
}

impl<Err: Display> IntoHandlerOutcome for Result<(), Err> {
    #[inline]
    fn into_outcome(self) -> HandlerOutcome {
        self.map_err(|e| Cow::Owned(e.to_string()))
    }
}

impl<E, F, R> Handler<E> for F
where
    E: Event,
    F: Fn(&E) -> R + Send + Sync + 'static,
    R: IntoHandlerOutcome,
{
    #[inline]
    fn handle(&self, event: &E) -> HandlerOutcome {
        self(event).into_outcome()
    }
}

/// Identity of a handler allocation, used for duplicate detection and removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HandlerKey(usize);

impl HandlerKey {
    pub(crate) fn of<E: Event>(handler: &HandlerRef<E>) -> Self {
        Self(Arc::as_ptr(handler).cast::<()>() as usize)
    }

    #[cfg(test)]
    pub(crate) fn of_erased(handler: &Arc<dyn std::any::Any + Send + Sync>) -> Self {
        Self(Arc::as_ptr(handler).cast::<()>() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tick(u32);

    #[test]
    fn test_closure_outcomes() {
        let unit: HandlerRef<Tick> = Arc::new(|_: &Tick| {});
        assert!(unit.handle(&Tick(1)).is_ok());

        let failing: HandlerRef<Tick> =
            Arc::new(|t: &Tick| if t.0 > 1 { Err("too late") } else { Ok(()) });
        assert!(failing.handle(&Tick(1)).is_ok());
        assert_eq!(failing.handle(&Tick(2)).unwrap_err(), "too late");
    }

    #[test]
    fn test_key_follows_allocation_identity() {
        let a: HandlerRef<Tick> = Arc::new(|_: &Tick| {});
        let b: HandlerRef<Tick> = Arc::new(|_: &Tick| {});

        assert_eq!(HandlerKey::of(&a), HandlerKey::of(&Arc::clone(&a)));
        assert_ne!(HandlerKey::of(&a), HandlerKey::of(&b));
    }
}
