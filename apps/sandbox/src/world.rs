use ember_event_bus::{EventBus, LivenessTable, OwnerIds};

/// Process-lifetime services shared by every scene.
///
/// The bus is created once and reset with [`EventBus::clear`] at scene transitions;
/// entities receive the world explicitly instead of reaching for a global.
#[derive(Debug)]
pub struct World {
    pub bus: EventBus,
    pub liveness: LivenessTable,
    pub ids: OwnerIds,
}

impl World {
    #[must_use]
    pub fn new() -> Self {
        let liveness = LivenessTable::new();
        let bus = EventBus::builder().liveness(liveness.clone()).build();
        Self { bus, liveness, ids: OwnerIds::new() }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
