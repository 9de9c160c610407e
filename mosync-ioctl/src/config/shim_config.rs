use std::{fs, io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use mosync_nls::Encoding;
use serde::{Deserialize, Serialize};

use crate::config::logger_config::LoggerConfig;

/// When host methods are looked up.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    /// Once, when the shim is built. Later calls consult the method table.
    #[default]
    Startup,
    /// Before every call.
    PerCall,
}

/// Main configuration of a [`crate::Shim`].
/// Please use [`ShimConfigBuilder`] if you want to build it from code.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ShimConfig {
    /// Logger configuration to use.
    pub logger_config: Option<LoggerConfig>,
    pub resolve_mode: ResolveMode,
    /// Encoding of runtime byte strings, also used to read narrowed wide strings.
    pub string_encoding: Encoding,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            logger_config: Some(Default::default()),
            resolve_mode: ResolveMode::default(),
            string_encoding: Encoding::default(),
        }
    }
}

/// `ShimConfigBuilder` is a convenience builder to create a `ShimConfig` from code.
pub struct ShimConfigBuilder {
    config: ShimConfig,
}

impl ShimConfigBuilder {
    pub fn new() -> Self {
        Self { config: Default::default() }
    }

    pub fn with_logger_config(mut self, logger_config: LoggerConfig) -> Self {
        self.config.logger_config = Some(logger_config);
        self
    }

    pub fn with_resolve_mode(mut self, mode: ResolveMode) -> Self {
        self.config.resolve_mode = mode;
        self
    }

    pub fn with_string_encoding(mut self, encoding: Encoding) -> Self {
        self.config.string_encoding = encoding;
        self
    }

    /// Retrieves the configuration built
    pub fn get(self) -> ShimConfig {
        self.config
    }
}

impl Default for ShimConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ShimConfigReader;

impl ShimConfigReader {
    pub fn read(path: impl AsRef<Path>) -> Result<ShimConfig> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("read {path:?}"))?;
        serde_json::from_str(&text).with_context(|| format!("parse {path:?}"))
    }

    /// Like [`ShimConfigReader::read`], but a missing file yields the defaults.
    pub fn read_or_default(path: impl AsRef<Path>) -> Result<ShimConfig> {
        let path = path.as_ref();
        match fs::metadata(path) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("no shim configuration at {path:?}, using defaults");
                Ok(ShimConfig::default())
            }
            _ => Self::read(path),
        }
    }

    pub fn write(path: impl AsRef<Path>, config: &ShimConfig) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(config)?;
        fs::write(path, text).with_context(|| format!("write {path:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;
    use pretty_assertions::assert_eq;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("mosync-ioctl-{}-{name}", std::process::id()))
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ShimConfig =
            serde_json::from_str(r#"{ "resolve_mode": "per_call", "string_encoding": "latin1" }"#)
                .unwrap();
        assert_eq!(config.resolve_mode, ResolveMode::PerCall);
        assert_eq!(config.string_encoding, Encoding::Latin1);
        assert_eq!(config.logger_config, Some(LoggerConfig::default()));
    }

    #[test]
    fn missing_file_is_default() {
        let config = ShimConfigReader::read_or_default(temp_path("missing.json")).unwrap();
        assert_eq!(config, ShimConfig::default());
    }

    #[test]
    fn write_then_read() {
        let path = temp_path("written.json");
        let config = ShimConfigBuilder::new()
            .with_logger_config(LoggerConfig {
                app_level_filter: LevelFilter::Trace,
                level_filter: LevelFilter::Off,
            })
            .with_resolve_mode(ResolveMode::PerCall)
            .get();
        ShimConfigReader::write(&path, &config).unwrap();
        let back = ShimConfigReader::read_or_default(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(back, config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = temp_path("broken.json");
        fs::write(&path, "{ resolve_mode: ").unwrap();
        let result = ShimConfigReader::read_or_default(&path);
        let _ = fs::remove_file(&path);
        assert!(result.is_err());
    }
}
