use ember_event_bus::{EventBus, HandlerRef, OwnerId};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

const HANDLERS: usize = 6;

struct Ping;

#[derive(Debug, Clone)]
enum Op {
    Subscribe(usize, Option<u64>),
    Unsubscribe(usize),
    DropOwner(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..HANDLERS, proptest::option::of(1..4_u64)).prop_map(|(h, o)| Op::Subscribe(h, o)),
        1 => (0..HANDLERS).prop_map(Op::Unsubscribe),
        1 => (1..4_u64).prop_map(Op::DropOwner),
    ]
}

fn handlers(log: &Arc<Mutex<Vec<usize>>>) -> Vec<HandlerRef<Ping>> {
    (0..HANDLERS)
        .map(|idx| {
            let log = Arc::clone(log);
            let handler: HandlerRef<Ping> = Arc::new(move |_: &Ping| log.lock().push(idx));
            handler
        })
        .collect()
}

fn owner(raw: u64) -> OwnerId {
    OwnerId::try_new(raw).unwrap()
}

proptest! {
    #[test]
    fn registry_matches_ordered_model(ops in proptest::collection::vec(op(), 0..64)) {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let pool = handlers(&log);
        let mut model: Vec<(usize, Option<u64>)> = Vec::new();

        for op in ops {
            match op {
                Op::Subscribe(h, o) => {
                    let sub = bus.subscribe_ref(&pool[h], o.map(owner));
                    let duplicate = model.iter().any(|(m, _)| *m == h);
                    prop_assert_eq!(sub.is_noop(), duplicate);
                    if !duplicate {
                        model.push((h, o));
                    }
                },
                Op::Unsubscribe(h) => {
                    let present = model.iter().any(|(m, _)| *m == h);
                    prop_assert_eq!(bus.unsubscribe(&pool[h]), present);
                    model.retain(|(m, _)| *m != h);
                },
                Op::DropOwner(o) => {
                    let expected = model.iter().filter(|(_, mo)| *mo == Some(o)).count();
                    prop_assert_eq!(bus.unsubscribe_all(owner(o)), expected);
                    model.retain(|(_, mo)| *mo != Some(o));
                },
            }
        }

        let owners: BTreeSet<u64> = model.iter().filter_map(|(_, o)| *o).collect();
        prop_assert_eq!(bus.subscriber_count::<Ping>(), model.len());
        prop_assert_eq!(bus.tracked_owner_count(), owners.len());

        let report = bus.publish(Ping);
        prop_assert_eq!(report.invoked, model.len());
        let expected: Vec<usize> = model.iter().map(|(h, _)| *h).collect();
        prop_assert_eq!(&*log.lock(), &expected);
    }

    #[test]
    fn cleanup_removes_exactly_dead_owners(
        assignments in proptest::collection::vec(1..6_u64, 1..24),
        dead in proptest::collection::btree_set(1..6_u64, 0..5),
    ) {
        let dead = Arc::new(dead);
        let probe = Arc::clone(&dead);
        let bus = EventBus::builder().liveness(move |o: OwnerId| !probe.contains(&o.get())).build();

        for raw in &assignments {
            bus.subscribe_owned(|_: &Ping| {}, owner(*raw));
        }

        let present: BTreeSet<u64> = assignments.iter().copied().collect();
        let reclaimed = present.intersection(&dead).count();
        prop_assert_eq!(bus.cleanup_dead_owners(), reclaimed);

        for raw in &present {
            let expected = if dead.contains(raw) {
                0
            } else {
                assignments.iter().filter(|a| *a == raw).count()
            };
            prop_assert_eq!(bus.owner_subscription_count(owner(*raw)), expected);
        }
    }
}
