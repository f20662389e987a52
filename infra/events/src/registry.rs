//! Bookkeeping behind the bus: per-kind handler lists, the record table and the owner index.
//!
//! ## Invariants
//! - A kind list never holds two entries with the same [`HandlerKey`].
//! - Every live [`SubscriptionId`] has exactly one entry in its kind list and one
//!   record; a record with an owner is mirrored exactly once in `owners`.
//! - Empty kind lists and empty owner vectors are removed eagerly.
//!
//! All mutation goes through [`Registry::insert`] and [`Registry::remove`] /
//! [`Registry::remove_owner`], so both sides of the owner mirror change together.

use crate::event::EventKind;
use crate::handler::HandlerKey;
use crate::owner::OwnerId;
use crate::subscription::SubscriptionId;
use fxhash::FxHashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// A `HandlerRef<E>` with its payload type erased. Downcast back at dispatch.
pub(crate) type ErasedHandler = Arc<dyn Any + Send + Sync>;

struct Entry {
    id: SubscriptionId,
    key: HandlerKey,
    handler: ErasedHandler,
}

struct KindList {
    kind: EventKind,
    entries: Vec<Entry>,
}

#[derive(Clone, Copy)]
struct Record {
    kind: TypeId,
    owner: Option<OwnerId>,
}

#[derive(Default)]
pub(crate) struct Registry {
    kinds: FxHashMap<TypeId, KindList>,
    records: FxHashMap<SubscriptionId, Record>,
    owners: FxHashMap<OwnerId, Vec<SubscriptionId>>,
    next_id: u64,
}

impl Registry {
    pub(crate) fn contains(&self, kind: TypeId, key: HandlerKey) -> bool {
        self.kinds.get(&kind).is_some_and(|list| list.entries.iter().any(|e| e.key == key))
    }

    /// Appends a registration. Returns `None` if `(kind, key)` is already present.
    pub(crate) fn insert(
        &mut self,
        kind: EventKind,
        key: HandlerKey,
        handler: ErasedHandler,
        owner: Option<OwnerId>,
    ) -> Option<SubscriptionId> {
        if self.contains(kind.id(), key) {
            return None;
        }

        self.next_id += 1;
        let id = SubscriptionId::new(self.next_id);

        self.kinds
            .entry(kind.id())
            .or_insert_with(|| KindList { kind, entries: Vec::new() })
            .entries
            .push(Entry { id, key, handler });
        self.records.insert(id, Record { kind: kind.id(), owner });
        if let Some(owner) = owner {
            self.owners.entry(owner).or_default().push(id);
        }

        Some(id)
    }

    /// Removes one registration from every structure that references it.
    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let Some(record) = self.records.remove(&id) else {
            return false;
        };

        self.detach_from_kind(record.kind, id);
        if let Some(owner) = record.owner
            && let Some(ids) = self.owners.get_mut(&owner)
        {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.owners.remove(&owner);
            }
        }
        true
    }

    /// Removes the registration of `key` under `kind`, if any.
    pub(crate) fn remove_handler(&mut self, kind: TypeId, key: HandlerKey) -> Option<SubscriptionId> {
        let id = self.kinds.get(&kind)?.entries.iter().find(|e| e.key == key)?.id;
        self.remove(id).then_some(id)
    }

    /// Removes every registration made under `owner`, then the owner itself.
    pub(crate) fn remove_owner(&mut self, owner: OwnerId) -> usize {
        let Some(ids) = self.owners.remove(&owner) else {
            return 0;
        };

        let mut removed = 0;
        for id in ids {
            if let Some(record) = self.records.remove(&id) {
                self.detach_from_kind(record.kind, id);
                removed += 1;
            }
        }
        removed
    }

    fn detach_from_kind(&mut self, kind: TypeId, id: SubscriptionId) {
        let Some(list) = self.kinds.get_mut(&kind) else {
            return;
        };
        if let Some(pos) = list.entries.iter().position(|e| e.id == id) {
            list.entries.remove(pos);
        }
        if list.entries.is_empty() {
            self.kinds.remove(&kind);
        }
    }

    /// Copies the current handler list of `kind`, in registration order.
    pub(crate) fn snapshot(&self, kind: TypeId) -> Vec<(SubscriptionId, ErasedHandler)> {
        self.kinds.get(&kind).map_or_else(Vec::new, |list| {
            list.entries.iter().map(|e| (e.id, Arc::clone(&e.handler))).collect()
        })
    }

    pub(crate) fn is_live(&self, id: SubscriptionId) -> bool {
        self.records.contains_key(&id)
    }

    pub(crate) fn count(&self, kind: TypeId) -> usize {
        self.kinds.get(&kind).map_or(0, |list| list.entries.len())
    }

    pub(crate) fn owner_count(&self, owner: OwnerId) -> usize {
        self.owners.get(&owner).map_or(0, Vec::len)
    }

    pub(crate) fn owners(&self) -> Vec<OwnerId> {
        self.owners.keys().copied().collect()
    }

    pub(crate) fn owner_len(&self) -> usize {
        self.owners.len()
    }

    pub(crate) fn kind_len(&self) -> usize {
        self.kinds.len()
    }

    pub(crate) fn kind_names(&self) -> Vec<&'static str> {
        self.kinds.values().map(|list| list.kind.name()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// Drops everything. The id counter survives so stale handles never match new registrations.
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.records.len();
        self.kinds.clear();
        self.records.clear();
        self.owners.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;
    struct Pong;

    fn handler() -> (HandlerKey, ErasedHandler) {
        let erased: ErasedHandler = Arc::new(0_u8);
        let key = HandlerKey::of_erased(&erased);
        (key, erased)
    }

    fn owner(raw: u64) -> OwnerId {
        OwnerId::try_new(raw).unwrap()
    }

    fn assert_consistent(reg: &Registry) {
        let listed: usize = reg.kinds.values().map(|l| l.entries.len()).sum();
        assert_eq!(listed, reg.records.len(), "kind lists and records diverged");
        assert!(reg.kinds.values().all(|l| !l.entries.is_empty()), "empty kind list kept");
        assert!(reg.owners.values().all(|ids| !ids.is_empty()), "empty owner entry kept");

        for (owner, ids) in &reg.owners {
            for id in ids {
                assert_eq!(reg.records.get(id).and_then(|r| r.owner), Some(*owner));
            }
        }
        let owned = reg.records.values().filter(|r| r.owner.is_some()).count();
        let mirrored: usize = reg.owners.values().map(Vec::len).sum();
        assert_eq!(owned, mirrored, "owner index is not a mirror of owned records");
    }

    #[test]
    fn test_duplicate_is_rejected_even_with_other_owner() {
        let mut reg = Registry::default();
        let (key, h) = handler();

        assert!(reg.insert(EventKind::of::<Ping>(), key, Arc::clone(&h), None).is_some());
        assert!(reg.insert(EventKind::of::<Ping>(), key, Arc::clone(&h), Some(owner(1))).is_none());
        assert!(reg.insert(EventKind::of::<Pong>(), key, h, None).is_some());

        assert_eq!(reg.count(TypeId::of::<Ping>()), 1);
        assert_eq!(reg.owner_len(), 0);
        assert_consistent(&reg);
    }

    #[test]
    fn test_remove_cleans_both_sides() {
        let mut reg = Registry::default();
        let (k1, h1) = handler();
        let (k2, h2) = handler();
        let a = reg.insert(EventKind::of::<Ping>(), k1, h1, Some(owner(1))).unwrap();
        let b = reg.insert(EventKind::of::<Ping>(), k2, h2, Some(owner(1))).unwrap();

        assert!(reg.remove(a));
        assert!(!reg.remove(a));
        assert_eq!(reg.owner_count(owner(1)), 1);
        assert_consistent(&reg);

        assert!(reg.remove(b));
        assert_eq!(reg.kind_len(), 0);
        assert_eq!(reg.owner_len(), 0);
        assert_consistent(&reg);
    }

    #[test]
    fn test_remove_owner_spans_kinds() {
        let mut reg = Registry::default();
        let (k1, h1) = handler();
        let (k2, h2) = handler();
        let (k3, h3) = handler();
        reg.insert(EventKind::of::<Ping>(), k1, h1, Some(owner(1)));
        reg.insert(EventKind::of::<Pong>(), k2, h2, Some(owner(1)));
        let kept = reg.insert(EventKind::of::<Ping>(), k3, h3, Some(owner(2))).unwrap();

        assert_eq!(reg.remove_owner(owner(1)), 2);
        assert_eq!(reg.remove_owner(owner(1)), 0);
        assert!(reg.is_live(kept));
        assert_eq!(reg.count(TypeId::of::<Pong>()), 0);
        assert_eq!(reg.owners(), vec![owner(2)]);
        assert_consistent(&reg);
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let mut reg = Registry::default();
        let ids: Vec<_> = (0..4)
            .map(|_| {
                let (k, h) = handler();
                reg.insert(EventKind::of::<Ping>(), k, h, None).unwrap()
            })
            .collect();

        let snap: Vec<_> = reg.snapshot(TypeId::of::<Ping>()).into_iter().map(|(id, _)| id).collect();
        assert_eq!(snap, ids);
    }

    #[test]
    fn test_clear_keeps_id_counter() {
        let mut reg = Registry::default();
        let (k, h) = handler();
        let first = reg.insert(EventKind::of::<Ping>(), k, Arc::clone(&h), Some(owner(9))).unwrap();

        assert_eq!(reg.clear(), 1);
        assert_eq!(reg.len(), 0);
        assert_consistent(&reg);

        let second = reg.insert(EventKind::of::<Ping>(), k, h, None).unwrap();
        assert_ne!(first, second);
    }
}
