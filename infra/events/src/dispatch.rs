use crate::error::EventBusError;
use crate::event::{Event, EventKind};
use crate::handler::HandlerRef;
use crate::registry::ErasedHandler;
use crate::subscription::SubscriptionId;
use std::any::Any;
use std::borrow::Cow;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::error;

/// Outcome of one `publish` call.
///
/// Publishing never fails; this report exists so callers and tests can observe
/// what happened to each handler in the snapshot.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Handlers that were called, whether or not they failed.
    pub invoked: usize,
    /// Snapshot entries not called: removed earlier in the same dispatch, or mistyped.
    pub skipped: usize,
    /// One [`EventBusError::HandlerFailure`] or [`EventBusError::TypeMismatch`] per faulty entry.
    pub failures: Vec<EventBusError>,
}

impl DispatchReport {
    /// `true` if every invoked handler returned successfully and nothing was mistyped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Handlers that ran to completion without failing.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        let failed =
            self.failures.iter().filter(|f| matches!(f, EventBusError::HandlerFailure { .. })).count();
        self.invoked.saturating_sub(failed)
    }
}

/// Calls one snapshotted handler with per-call fault isolation.
pub(crate) fn invoke<E: Event>(
    kind: EventKind,
    id: SubscriptionId,
    erased: &ErasedHandler,
    event: &E,
    report: &mut DispatchReport,
) {
    let Some(handler) = erased.downcast_ref::<HandlerRef<E>>() else {
        let err = EventBusError::TypeMismatch {
            message: format!("subscription {id} cannot handle {kind}").into(),
            context: None,
        };
        error!(event = kind.name(), subscription = %id, error = %err, "Handler skipped");
        report.skipped += 1;
        report.failures.push(err);
        return;
    };

    report.invoked += 1;
    let detail = match catch_unwind(AssertUnwindSafe(|| handler.handle(event))) {
        Ok(Ok(())) => return,
        Ok(Err(detail)) => detail,
        Err(payload) => Cow::Owned(format!("panicked: {}", panic_message(payload.as_ref()))),
    };

    let err = EventBusError::HandlerFailure { message: detail, context: Some(kind.name().into()) };
    error!(event = kind.name(), subscription = %id, error = %err, "Event handler failed");
    report.failures.push(err);
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Alarm(&'static str);

    fn erase(handler: HandlerRef<Alarm>) -> ErasedHandler {
        Arc::new(handler)
    }

    #[test]
    fn test_panic_is_contained() {
        let erased = erase(Arc::new(|a: &Alarm| -> Result<(), String> {
            panic!("alarm {} exploded", a.0)
        }));
        let mut report = DispatchReport::default();

        invoke(EventKind::of::<Alarm>(), SubscriptionId::new(1), &erased, &Alarm("red"), &mut report);

        assert_eq!(report.invoked, 1);
        assert_eq!(report.succeeded(), 0);
        let msg = report.failures[0].to_string();
        assert!(msg.contains("panicked: alarm red exploded"), "{msg}");
        assert!(msg.contains("Alarm"), "failure should name the event kind: {msg}");
    }

    #[test]
    fn test_mistyped_entry_is_skipped() {
        let erased: ErasedHandler = Arc::new(String::from("not a handler"));
        let mut report = DispatchReport::default();

        invoke(EventKind::of::<Alarm>(), SubscriptionId::new(2), &erased, &Alarm("blue"), &mut report);

        assert_eq!(report.invoked, 0);
        assert_eq!(report.skipped, 1);
        assert!(matches!(report.failures[0], EventBusError::TypeMismatch { .. }));
    }

    #[test]
    fn test_error_outcome_is_reported() {
        let erased = erase(Arc::new(|_: &Alarm| Err::<(), _>("sensor offline")));
        let mut report = DispatchReport::default();

        invoke(EventKind::of::<Alarm>(), SubscriptionId::new(3), &erased, &Alarm("green"), &mut report);

        assert_eq!(report.invoked, 1);
        assert!(!report.is_clean());
        assert!(report.failures[0].to_string().ends_with("sensor offline"));
    }
}
