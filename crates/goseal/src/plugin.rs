//! Adapter for linter hosts that load analyzers as plugins.
//!
//! A host hands over its raw settings block. The plugin decodes it with the
//! same schema as `.goseal.yml` and returns ready analyzers.

use goseal_core::config::{self, LoadError, SealConfigDto};
use goseal_core::SealConfig;
use goseal_engine::SealAnalyzer;
use thiserror::Error;
use tracing::debug;

/// What a host must provide for each unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Syntax trees only.
    Syntax,
    /// Syntax trees annotated with resolved types.
    TypesInfo,
}

/// Errors raised while decoding plugin settings.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The settings do not match the configuration schema.
    #[error("failed to decode plugin settings: {0}")]
    Decode(#[from] serde_json::Error),

    /// The settings hold an invalid value.
    #[error("invalid plugin settings: {0}")]
    Config(#[from] LoadError),
}

/// Plugin entry point.
#[derive(Debug, Clone)]
pub struct Plugin {
    config: SealConfig,
}

impl Plugin {
    /// Decodes host `settings`. `null` selects the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are malformed or invalid.
    pub fn new(settings: serde_json::Value) -> Result<Self, PluginError> {
        let dto: SealConfigDto = if settings.is_null() {
            SealConfigDto::default()
        } else {
            serde_json::from_value(settings)?
        };
        let config = config::loader::load(dto)?;
        debug!("Plugin configured: {:?}", config.dialect());
        Ok(Self { config })
    }

    /// The decoded configuration.
    #[must_use]
    pub fn config(&self) -> &SealConfig {
        &self.config
    }

    /// Analyzers to register with the host.
    #[must_use]
    pub fn build_analyzers(&self) -> Vec<SealAnalyzer> {
        vec![SealAnalyzer::new(self.config.clone())]
    }

    /// The engine needs resolved types.
    #[must_use]
    pub fn load_mode(&self) -> LoadMode {
        LoadMode::TypesInfo
    }
}
