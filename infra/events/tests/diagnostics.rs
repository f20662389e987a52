use ember_event_bus::{EventBus, HandlerRef, OwnerId};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

#[derive(Debug)]
struct Bolt;

/// Collects formatted log lines in memory.
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn output(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn captured(run: impl FnOnce()) -> String {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::TRACE)
        .finish();

    tracing::subscriber::with_default(subscriber, run);
    capture.output()
}

#[test]
fn duplicate_subscription_logs_warning() {
    let logs = captured(|| {
        let bus = EventBus::new();
        let handler: HandlerRef<Bolt> = Arc::new(|_: &Bolt| {});
        let _first = bus.subscribe_ref(&handler, None);
        let second = bus.subscribe_ref(&handler, Some(OwnerId::try_new(4).unwrap()));
        assert!(second.is_noop());
    });

    let line = logs.lines().find(|l| l.contains("Subscription ignored")).expect("warning line");
    assert!(line.contains("WARN"), "{line}");
    assert!(line.contains("Bolt"), "{line}");
}

#[test]
fn handler_failure_logs_error_and_siblings_run() {
    let logs = captured(|| {
        let bus = EventBus::new();
        bus.subscribe(|_: &Bolt| -> Result<(), String> { Err("fuse blown".to_owned()) });
        bus.subscribe(|_: &Bolt| {});

        let report = bus.publish(Bolt);
        assert_eq!(report.invoked, 2);
        assert_eq!(report.failures.len(), 1);
    });

    let line = logs.lines().find(|l| l.contains("Event handler failed")).expect("error line");
    assert!(line.contains("ERROR"), "{line}");
    assert!(line.contains("fuse blown"), "{line}");
    assert_eq!(logs.matches("Event handler failed").count(), 1);
}

#[test]
fn clean_publish_logs_no_errors() {
    let logs = captured(|| {
        let bus = EventBus::new();
        bus.subscribe(|_: &Bolt| {});
        assert!(bus.publish(Bolt).is_clean());
    });

    assert!(!logs.contains("ERROR"), "{logs}");
    assert!(!logs.contains("WARN"), "{logs}");
}
