use std::any::{Any, TypeId};
use std::fmt;

/// Marker trait for payloads that can be published on the [`EventBus`](crate::EventBus).
///
/// Any type that is `Send + Sync + 'static` automatically implements this trait.
pub trait Event: Any + Send + Sync + 'static {}
impl<T: Any + Send + Sync + 'static> Event for T {}

/// Routing identity of an event payload type.
///
/// Two payloads reach the same handlers if and only if they have the same concrete
/// type. There is no hierarchy: a handler for `Damage` never sees `CriticalDamage`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKind {
    id: TypeId,
    name: &'static str,
}

impl EventKind {
    #[must_use]
    pub fn of<E: Event>() -> Self {
        Self { id: TypeId::of::<E>(), name: std::any::type_name::<E>() }
    }

    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Type name of the payload, for diagnostics only.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventKind").field(&self.name).finish()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
