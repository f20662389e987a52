use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments of the sandbox binary.
#[derive(Debug, Parser)]
#[command(name = "ember-sandbox")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Drives the Ember event bus through scripted scenes")]
pub struct Cli {
    /// Configuration file; the extension may be omitted and the file may be absent
    #[arg(short, long, default_value = "sandbox")]
    pub config: PathBuf,

    /// Override the number of scenes
    #[arg(long)]
    pub scenes: Option<u32>,

    /// Pace frames in wall-clock time and sweep from a background task
    #[arg(long)]
    pub realtime: bool,
}
