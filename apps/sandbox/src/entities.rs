//! Scene entities that talk to each other only through the bus.
//!
//! Chain of reactions: [`Lever`] → `LeverPulled` → [`Door`] → `DoorOpened` →
//! [`Generator`] → `PowerChanged` → [`CameraShake`].

use crate::events::{Damage, DoorOpened, LeverPulled, PowerChanged};
use crate::world::World;
use ember_event_bus::{DispatchReport, OwnerId, Subscription, SubscriptionGuard};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tracing::debug;

const GENERATOR_STEP: u32 = 100;
const POWER_TRAUMA: u32 = 5;

/// Publishes `LeverPulled`; has no subscriptions of its own.
#[derive(Debug)]
pub struct Lever {
    id: u32,
    pulls: AtomicU32,
}

impl Lever {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self { id, pulls: AtomicU32::new(0) }
    }

    pub fn pull(&self, world: &World) -> DispatchReport {
        self.pulls.fetch_add(1, Ordering::Relaxed);
        world.bus.publish(LeverPulled { lever: self.id })
    }

    #[must_use]
    pub fn pulls(&self) -> u32 {
        self.pulls.load(Ordering::Relaxed)
    }
}

/// Opens when its lever is pulled. Subscribes under its own owner id and never
/// unsubscribes: destroying a door leaves the cleanup to the liveness sweeper.
#[derive(Debug)]
pub struct Door {
    owner: OwnerId,
    lever: u32,
    opened: AtomicU32,
}

impl Door {
    pub fn spawn(world: &World, lever: u32) -> Arc<Self> {
        let door = Arc::new(Self { owner: world.ids.next(), lever, opened: AtomicU32::new(0) });
        world.liveness.track(door.owner, &door);

        let weak = Arc::downgrade(&door);
        let bus = world.bus.clone();
        world.bus.subscribe_owned(
            move |e: &LeverPulled| -> Result<(), String> {
                let door = weak.upgrade().ok_or_else(|| format!("door wired to lever {} is gone", e.lever))?;
                if e.lever != door.lever {
                    return Ok(());
                }
                door.opened.fetch_add(1, Ordering::Relaxed);
                debug!(door = %door.owner, lever = e.lever, "Door opened");
                bus.publish(DoorOpened { door: door.owner });
                Ok(())
            },
            door.owner,
        );
        door
    }

    #[must_use]
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    #[must_use]
    pub fn opened(&self) -> u32 {
        self.opened.load(Ordering::Relaxed)
    }
}

/// Powers up whenever a door opens. Shuts down explicitly through `unsubscribe_all`.
#[derive(Debug)]
pub struct Generator {
    owner: OwnerId,
    output: AtomicU32,
    online: AtomicBool,
}

impl Generator {
    pub fn spawn(world: &World) -> Arc<Self> {
        let generator = Arc::new(Self {
            owner: world.ids.next(),
            output: AtomicU32::new(0),
            online: AtomicBool::new(false),
        });
        world.liveness.track(generator.owner, &generator);

        let weak = Arc::downgrade(&generator);
        let bus = world.bus.clone();
        world.bus.subscribe_owned(
            move |_: &DoorOpened| {
                let Some(generator) = weak.upgrade() else {
                    return;
                };
                generator.online.store(true, Ordering::Relaxed);
                let output = generator.output.fetch_add(GENERATOR_STEP, Ordering::Relaxed) + GENERATOR_STEP;
                bus.publish(PowerChanged { online: true, output });
            },
            generator.owner,
        );
        generator
    }

    /// Drops every registration of this generator and announces the outage.
    /// Returns the number of registrations removed.
    pub fn shutdown(&self, world: &World) -> usize {
        let removed = world.bus.unsubscribe_all(self.owner);
        self.online.store(false, Ordering::Relaxed);
        world.bus.publish(PowerChanged { online: false, output: 0 });
        removed
    }

    #[must_use]
    pub fn output(&self) -> u32 {
        self.output.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }
}

/// Accumulates screen-shake trauma from damage and power surges.
///
/// Holds its subscriptions through handles instead of an owner id: damage can be
/// muted on demand, and the power guard unsubscribes when the camera is dropped.
#[derive(Debug)]
pub struct CameraShake {
    trauma: Arc<AtomicU32>,
    damage: Subscription,
    _power: SubscriptionGuard,
}

impl CameraShake {
    #[must_use]
    pub fn spawn(world: &World) -> Self {
        let trauma = Arc::new(AtomicU32::new(0));

        let sink = Arc::clone(&trauma);
        let damage = world.bus.subscribe(move |d: &Damage| -> Result<(), String> {
            let amount = u32::try_from(d.amount).map_err(|_| format!("negative damage {}", d.amount))?;
            sink.fetch_add(amount, Ordering::Relaxed);
            Ok(())
        });

        let sink = Arc::clone(&trauma);
        let power = world
            .bus
            .subscribe(move |p: &PowerChanged| {
                if p.online {
                    sink.fetch_add(POWER_TRAUMA, Ordering::Relaxed);
                }
            })
            .into_guard();

        Self { trauma, damage, _power: power }
    }

    /// Stops reacting to damage. Returns `false` if already muted.
    pub fn mute_damage(&self) -> bool {
        self.damage.cancel()
    }

    #[must_use]
    pub fn trauma(&self) -> u32 {
        self.trauma.load(Ordering::Relaxed)
    }
}
