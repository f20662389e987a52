use config::{Config, Environment, File, Map};
use ember_event_bus::EventBusConfig;
use ember_logger::LogConfig;
use serde::Deserialize;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

/// Prefix of environment overrides, e.g. `EMBER__SANDBOX__SCENES=5`.
pub const ENV_PREFIX: &str = "EMBER";

/// Upper bound on `frames_per_scene`; keeps the scene script's frame arithmetic in range.
pub const MAX_FRAMES_PER_SCENE: u32 = 1_000_000;

#[ember_derive::ember_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    #[error("Invalid sandbox config{}: {message}", format_context(.context))]
    Invalid { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Complete sandbox configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub bus: EventBusConfig,
    pub sandbox: SandboxConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub scenes: u32,
    pub frames_per_scene: u32,
    /// Simulated frame time; also the real pacing in realtime mode.
    pub frame_millis: u64,
    /// Pace frames in wall-clock time and sweep from a background task.
    pub realtime: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self { scenes: 3, frames_per_scene: 180, frame_millis: 16, realtime: false }
    }
}

impl AppConfig {
    fn validate(self) -> Result<Self, ConfigError> {
        if !(12..=MAX_FRAMES_PER_SCENE).contains(&self.sandbox.frames_per_scene) {
            return Err(ConfigError::Invalid {
                message: format!("frames_per_scene must be between 12 and {MAX_FRAMES_PER_SCENE}")
                    .into(),
                context: Some("sandbox".into()),
            });
        }
        if self.sandbox.frame_millis == 0 {
            return Err(ConfigError::Invalid {
                message: "frame_millis must be greater than zero".into(),
                context: Some("sandbox".into()),
            });
        }
        self.bus.sweeper.interval().map_err(|e| ConfigError::Invalid {
            message: e.to_string().into(),
            context: Some("bus.sweeper".into()),
        })?;
        Ok(self)
    }
}

/// Loads the configuration from `path` (extension optional, the file itself optional)
/// and overlays `EMBER__`-prefixed environment variables.
///
/// # Errors
/// Returns [`ConfigError::Config`] for unreadable or mistyped sources and
/// [`ConfigError::Invalid`] for values the sandbox cannot run with.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    load_config_from(path, None)
}

/// Like [`load_config`], reading overrides from `env` instead of the process
/// environment when given.
///
/// # Errors
/// See [`load_config`].
pub fn load_config_from(
    path: impl AsRef<Path>,
    env: Option<Map<String, String>>,
) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();

    let builder = Config::builder().add_source(File::from(path).required(false)).add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .convert_case(config::Case::Snake)
            .source(env),
    );

    info!("Loading config from {}", path.display());

    builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<AppConfig>()
        .context("Failed to deserialize config")?
        .validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let cfg = load_config(dir.path().join("absent")).unwrap();

        assert_eq!(cfg.sandbox, SandboxConfig::default());
        assert_eq!(cfg.bus.sweeper.interval_seconds, 30);
        assert_eq!(cfg.log.level, "info");
    }

    #[test]
    #[serial]
    fn test_file_values_are_read() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("sandbox.toml");
        fs::write(
            &file,
            "[bus.sweeper]\ninterval_seconds = 2\n\n[sandbox]\nscenes = 7\nframes_per_scene = 60\n",
        )
        .unwrap();

        let cfg = load_config(&file).unwrap();
        assert_eq!(cfg.sandbox.scenes, 7);
        assert_eq!(cfg.sandbox.frames_per_scene, 60);
        assert_eq!(cfg.bus.sweeper.interval_seconds, 2);
        assert!(cfg.bus.sweeper.enabled);
    }

    #[test]
    #[serial]
    fn test_zero_sweep_interval_is_rejected() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("sandbox.toml");
        fs::write(&file, "[bus.sweeper]\ninterval_seconds = 0\n").unwrap();

        let err = load_config(&file).unwrap_err();
        assert!(err.to_string().contains("(bus.sweeper)"), "{err}");
    }

    #[test]
    #[serial]
    fn test_frames_per_scene_bounds() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("sandbox.toml");

        for frames in [11, MAX_FRAMES_PER_SCENE + 1, u32::MAX] {
            fs::write(&file, format!("[sandbox]\nframes_per_scene = {frames}\n")).unwrap();
            let err = load_config(&file).unwrap_err();
            assert!(err.to_string().contains("frames_per_scene must be between"), "{err}");
        }

        fs::write(&file, format!("[sandbox]\nframes_per_scene = {MAX_FRAMES_PER_SCENE}\n")).unwrap();
        assert_eq!(load_config(&file).unwrap().sandbox.frames_per_scene, MAX_FRAMES_PER_SCENE);
    }
}
