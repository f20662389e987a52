//! # Sandbox
//!
//! A small scene host for the Ember event bus. Each scene wires a lever, a door,
//! a generator and a camera together purely through events, then destroys some of
//! them the careless way so the liveness sweeper and scene-transition `clear` have
//! something to reclaim.

pub mod args;
pub mod config;
pub mod entities;
pub mod events;
pub mod scene;
pub mod world;

pub use crate::config::{
    AppConfig, ConfigError, MAX_FRAMES_PER_SCENE, SandboxConfig, load_config, load_config_from,
};
pub use crate::scene::{Scene, SceneReport, run_frames, run_realtime};
pub use crate::world::World;
