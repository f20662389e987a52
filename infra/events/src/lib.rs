//! # Event Bus
//!
//! A synchronous, type-safe publish/subscribe hub for loosely coupled game and
//! simulation components.
//!
//! ## Overview
//!
//! Components register handlers for a payload type and publish payloads without
//! knowing who listens. Registrations may carry an [`OwnerId`]; everything an owner
//! registered can be torn down in one call, and a [`LivenessSweeper`] reclaims
//! registrations of owners that were destroyed without cleaning up.
//!
//! ## Features
//!
//! * **Type-Safe**: Events are identified by their Rust type.
//! * **Snapshot dispatch**: Handlers may subscribe, unsubscribe, publish or clear while
//!   a dispatch is in progress.
//! * **Fault isolation**: A failing or panicking handler never stops the others.
//! * **Owner cleanup**: [`EventBus::unsubscribe_all`], [`EventBus::cleanup_dead_owners`].
//! * **Fast lookup**: `FxHashMap` + `parking_lot::Mutex`.
//!
//! # Example
//!
//! ```rust
//! use ember_event_bus::{EventBus, LivenessTable, OwnerIds};
//! use std::sync::Arc;
//!
//! struct LeverPulled { lever: u32 }
//! struct Door;
//!
//! let ids = OwnerIds::new();
//! let table = LivenessTable::new();
//! let bus = EventBus::builder().liveness(table.clone()).build();
//!
//! let door = Arc::new(Door);
//! let owner = ids.next();
//! table.track(owner, &door);
//! bus.subscribe_owned(|e: &LeverPulled| assert_eq!(e.lever, 7), owner);
//!
//! assert_eq!(bus.publish(LeverPulled { lever: 7 }).invoked, 1);
//!
//! // The door is destroyed without unsubscribing; a sweep reclaims its handler.
//! drop(door);
//! assert_eq!(bus.cleanup_dead_owners(), 1);
//! assert_eq!(bus.publish(LeverPulled { lever: 7 }).invoked, 0);
//! ```

mod bus;
mod config;
mod dispatch;
mod error;
mod event;
mod handler;
mod owner;
mod registry;
mod subscription;
mod sweeper;

pub use bus::{EventBus, EventBusBuilder};
pub use config::{
    DEFAULT_SWEEP_INTERVAL_SECONDS, EventBusConfig, MAX_SWEEP_INTERVAL_SECONDS, SweeperConfig,
};
pub use dispatch::DispatchReport;
pub use error::{EventBusError, EventBusErrorExt};
pub use event::{Event, EventKind};
pub use handler::{Handler, HandlerOutcome, HandlerRef, IntoHandlerOutcome};
pub use owner::{Liveness, LivenessTable, OwnerId, OwnerIds};
pub use subscription::{Subscription, SubscriptionGuard, SubscriptionId};
pub use sweeper::{LivenessSweeper, SweeperHandle};
