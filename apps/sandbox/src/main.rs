use anyhow::Context;
use clap::Parser;
use ember_logger::Logger;
use ember_sandbox::args::Cli;
use ember_sandbox::{World, load_config, run_frames, run_realtime};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = load_config(&cli.config).context("Critical: Configuration is malformed")?;
    if let Some(scenes) = cli.scenes {
        cfg.sandbox.scenes = scenes;
    }
    cfg.sandbox.realtime |= cli.realtime;

    let _log = Logger::from_config(env!("CARGO_PKG_NAME"), &cfg.log)?;
    info!(scenes = cfg.sandbox.scenes, realtime = cfg.sandbox.realtime, "Sandbox starting");

    let world = World::new();
    let reports = if cfg.sandbox.realtime {
        tokio::select! {
            reports = run_realtime(&world, &cfg) => reports?,
            _ = tokio::signal::ctrl_c() => {
                info!(cleared = world.bus.clear(), "Interrupted");
                return Ok(());
            },
        }
    } else {
        run_frames(&world, &cfg)?
    };

    for report in &reports {
        info!(
            scene = report.scene,
            published = report.published,
            invoked = report.invoked,
            failures = report.failures,
            swept_owners = report.swept_owners,
            unsubscribed = report.unsubscribed,
            cleared = report.cleared,
            doors_opened = report.doors_opened,
            trauma = report.trauma,
            "Scene finished"
        );
    }
    Ok(())
}
