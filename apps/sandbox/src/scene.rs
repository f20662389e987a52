use crate::config::AppConfig;
use crate::entities::{CameraShake, Door, Generator, Lever};
use crate::events::Damage;
use crate::world::World;
use ember_event_bus::{DispatchReport, EventBusError, LivenessSweeper};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const LEVER_ID: u32 = 1;
const HIT: i32 = 5;
const BAD_HIT: i32 = -3;

/// What happened during one scene.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SceneReport {
    pub scene: u32,
    pub frames: u32,
    pub published: usize,
    pub invoked: usize,
    pub failures: usize,
    pub swept_owners: usize,
    pub unsubscribed: usize,
    pub cleared: usize,
    pub doors_opened: u32,
    pub trauma: u32,
}

/// A scripted scene: a lever, a door wired to it, a generator and a camera.
///
/// Script, as fractions of the scene length:
/// - every twelfth: the lever is pulled;
/// - every sixth: damage is dealt (one malformed hit at the midpoint);
/// - one third: the door is destroyed without unsubscribing;
/// - one half: the generator shuts down and unsubscribes;
/// - two thirds: the camera mutes damage.
#[derive(Debug)]
pub struct Scene {
    lever: Lever,
    door: Option<Arc<Door>>,
    generator: Option<Arc<Generator>>,
    camera: CameraShake,
    doors_opened: u32,
    report: SceneReport,
}

impl Scene {
    #[must_use]
    pub fn load(world: &World, scene: u32, frames: u32) -> Self {
        let door = Door::spawn(world, LEVER_ID);
        let generator = Generator::spawn(world);
        let camera = CameraShake::spawn(world);
        debug!(scene, subscriptions = ?world.bus, "Scene loaded");

        Self {
            lever: Lever::new(LEVER_ID),
            door: Some(door),
            generator: Some(generator),
            camera,
            doors_opened: 0,
            report: SceneReport { scene, frames, ..SceneReport::default() },
        }
    }

    pub fn frame(&mut self, world: &World, n: u32) {
        let frames = self.report.frames;
        let (pull_every, hit_every) = ((frames / 12).max(1), (frames / 6).max(1));

        if n == frames / 3
            && let Some(door) = self.door.take()
        {
            self.doors_opened = door.opened();
            info!(door = %door.owner(), "Door destroyed without unsubscribing");
        }
        if n == frames / 2
            && let Some(generator) = self.generator.take()
        {
            self.report.unsubscribed += generator.shutdown(world);
            self.report.published += 1;
        }
        if n == frames * 2 / 3 && self.camera.mute_damage() {
            debug!("Camera muted damage");
        }

        if n % pull_every == 0 {
            let report = self.lever.pull(world);
            self.record(&report);
        }
        if n % hit_every == 0 {
            let amount = if n == frames / 2 { BAD_HIT } else { HIT };
            let report = world.bus.publish(Damage { amount });
            self.record(&report);
        }
    }

    pub const fn record_sweep(&mut self, reclaimed: usize) {
        self.report.swept_owners += reclaimed;
    }

    fn record(&mut self, report: &DispatchReport) {
        self.report.published += 1;
        self.report.invoked += report.invoked;
        self.report.failures += report.failures.len();
    }

    /// Tears the scene down: clears the bus and forgets dead owners.
    #[must_use]
    pub fn unload(mut self, world: &World) -> SceneReport {
        if let Some(door) = &self.door {
            self.doors_opened = door.opened();
        }
        self.report.doors_opened = self.doors_opened;
        self.report.trauma = self.camera.trauma();

        self.report.cleared = world.bus.clear();
        drop(self.camera);
        drop(self.door.take());
        drop(self.generator.take());

        let pruned = world.liveness.prune();
        info!(scene = self.report.scene, cleared = self.report.cleared, pruned, "Scene unloaded");
        self.report
    }
}

/// Runs every scene with a simulated clock, sweeping from the frame loop.
///
/// # Errors
/// Returns [`EventBusError::InvalidArgument`] for an unusable sweeper configuration.
pub fn run_frames(world: &World, config: &AppConfig) -> Result<Vec<SceneReport>, EventBusError> {
    let mut sweeper = LivenessSweeper::new(world.bus.clone(), &config.bus.sweeper)?;
    let frame = Duration::from_millis(config.sandbox.frame_millis);
    let start = Instant::now();
    let mut clock = start;

    let mut reports = Vec::new();
    for index in 0..config.sandbox.scenes {
        let mut scene = Scene::load(world, index, config.sandbox.frames_per_scene);
        for n in 0..config.sandbox.frames_per_scene {
            scene.frame(world, n);
            if let Some(reclaimed) = sweeper.tick(clock) {
                scene.record_sweep(reclaimed);
            }
            clock += frame;
        }
        reports.push(scene.unload(world));
    }
    Ok(reports)
}

/// Runs every scene paced by wall-clock frames while a background task sweeps.
///
/// # Errors
/// Returns [`EventBusError::InvalidArgument`] for an unusable sweeper configuration
/// and [`EventBusError::Internal`] if the sweeper task dies.
pub async fn run_realtime(
    world: &World,
    config: &AppConfig,
) -> Result<Vec<SceneReport>, EventBusError> {
    let sweeper = LivenessSweeper::new(world.bus.clone(), &config.bus.sweeper)?.spawn();
    let mut ticker = tokio::time::interval(Duration::from_millis(config.sandbox.frame_millis));

    let mut reports = Vec::new();
    for index in 0..config.sandbox.scenes {
        let mut scene = Scene::load(world, index, config.sandbox.frames_per_scene);
        for n in 0..config.sandbox.frames_per_scene {
            ticker.tick().await;
            scene.frame(world, n);
        }
        reports.push(scene.unload(world));
    }

    let swept = sweeper.stop().await?;
    if swept == 0 {
        warn!("Background sweeper reclaimed nothing; scenes may be shorter than the sweep interval");
    }
    info!(swept, "Background sweeper stopped");
    Ok(reports)
}
