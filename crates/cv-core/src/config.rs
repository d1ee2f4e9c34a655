//! Configuration loading for the engine binary.
//!
//! Resolution order (highest first):
//! 1. `--config PATH`
//! 2. `--preset NAME`
//! 3. `CV_CONFIG`, then `CV_CONFIG_DIR/engine.json`
//! 4. XDG config directory
//! 5. Built-in defaults
//!
//! Whatever the source, the result is validated before it is returned, so
//! band and threshold inconsistencies fail here and never at scoring time.

use std::path::PathBuf;

use cv_common::{Error, Result};
use cv_config::preset::{get_preset, PresetName};
use cv_config::resolve::{resolve_config, ConfigPaths, ConfigSource};
use cv_config::{validate_engine_config, ConfigSnapshot, EngineConfig};

/// Options for loading configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    /// Explicit engine.json path.
    pub config_path: Option<PathBuf>,
    /// Named preset; ignored when an explicit path is given.
    pub preset: Option<PresetName>,
}

/// Validated configuration with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: EngineConfig,
    pub paths: ConfigPaths,
    pub snapshot: ConfigSnapshot,
}

impl ResolvedConfig {
    /// Wrap an in-memory configuration after validating it.
    pub fn from_config(config: EngineConfig, paths: ConfigPaths) -> Result<Self> {
        validate_engine_config(&config)?;
        let snapshot = ConfigSnapshot::capture(&config, &paths);
        Ok(Self {
            config,
            paths,
            snapshot,
        })
    }

    /// The hash recorded in dataset provenance and selection results.
    pub fn config_hash(&self) -> &str {
        &self.snapshot.config_hash
    }
}

/// Load, validate and snapshot the effective configuration.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig> {
    if options.config_path.is_none() {
        if let Some(preset) = options.preset {
            let paths = ConfigPaths {
                engine: None,
                source: ConfigSource::Preset,
            };
            return ResolvedConfig::from_config(get_preset(preset), paths);
        }
    }

    let paths = resolve_config(options.config_path.as_deref());
    let config = match &paths.engine {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Configuration(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            let config = EngineConfig::from_file(path)?;
            tracing::debug!(path = %path.display(), source = %paths.source, "config file read");
            config
        }
        None => EngineConfig::default(),
    };

    ResolvedConfig::from_config(config, paths)
}
