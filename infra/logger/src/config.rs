use crate::error::LoggerError;
use crate::{LevelFilter, LoggerBuilder};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::rolling::Rotation;

/// Output format of log files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// How often log files roll over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(value: LogRotation) -> Self {
        match value {
            LogRotation::Minutely => Self::MINUTELY,
            LogRotation::Hourly => Self::HOURLY,
            LogRotation::Daily => Self::DAILY,
            LogRotation::Never => Self::NEVER,
        }
    }
}

/// Logging section of a host configuration file.
///
/// ```toml
/// [log]
/// level = "debug"
/// filter = "ember_event_bus=trace"
/// directory = "logs"
/// format = "json"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `trace`, `debug`, `info`, `warn`, `error` or `off`.
    pub level: String,
    pub filter: Option<String>,
    pub console: bool,
    /// File output is disabled when unset.
    pub directory: Option<PathBuf>,
    pub format: LogFormat,
    pub rotation: LogRotation,
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            filter: None,
            console: true,
            directory: None,
            format: LogFormat::default(),
            rotation: LogRotation::default(),
            max_files: 10,
        }
    }
}

impl LogConfig {
    pub(crate) fn to_builder(&self, name: String) -> Result<LoggerBuilder, LoggerError> {
        let level = LevelFilter::from_str(&self.level).map_err(|e| {
            LoggerError::InvalidConfiguration {
                message: format!("Invalid level '{}': {e}", self.level).into(),
                context: Some("log.level".into()),
            }
        })?;

        let mut builder = LoggerBuilder::new(name)
            .level(level)
            .console(self.console)
            .format(self.format)
            .rotation(self.rotation.into())
            .max_files(self.max_files);
        if let Some(filter) = &self.filter {
            builder = builder.env_filter(filter.clone());
        }
        if let Some(directory) = &self.directory {
            builder = builder.path(directory.clone());
        }
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_keeps_defaults() {
        let cfg: LogConfig = toml::from_str(
            r#"
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.level, "debug");
        assert_eq!(cfg.format, LogFormat::Json);
        assert_eq!(cfg.rotation, LogRotation::Daily);
        assert!(cfg.console);
        assert_eq!(cfg.max_files, 10);
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let cfg = LogConfig { level: "chatty".to_owned(), ..LogConfig::default() };
        let err = cfg.to_builder("sandbox".to_owned()).unwrap_err();
        assert!(err.to_string().contains("(log.level)"), "{err}");
    }

    #[test]
    fn test_rotation_maps_to_appender() {
        assert_eq!(Rotation::from(LogRotation::Hourly), Rotation::HOURLY);
        assert_eq!(Rotation::from(LogRotation::Never), Rotation::NEVER);
    }
}
