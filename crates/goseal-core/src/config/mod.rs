//! Seal policy configuration.
//!
//! # Architecture
//!
//! ```text
//! YAML / TOML / JSON text
//!   ↓ serde (DTO layer)
//! SealConfigDto
//!   ↓ validate + compile patterns (loader)
//! SealConfig (pure domain model)
//! ```
//!
//! A missing file is not an error: [`load_file`] returns the defaults.
//! Every other failure is fatal and surfaces before any unit is scanned.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod dto;
pub mod loader;
pub mod model;

pub use dto::SealConfigDto;
pub use loader::LoadError;
pub use model::{
    Dialect, EmptyTargets, InitScope, ModelError, MutationScope, ReceiverMatch, SealConfig,
    SealConfigBuilder, DEFAULT_CONSTRUCTOR_PATTERN,
};

/// Conventional config file name.
pub const DEFAULT_CONFIG_FILE: &str = ".goseal.yml";

/// Serialization format of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML (`.yml`, `.yaml`, and anything unrecognized).
    Yaml,
    /// TOML (`.toml`).
    Toml,
    /// JSON (`.json`).
    Json,
}

impl ConfigFormat {
    /// Picks the format from a file extension, defaulting to YAML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::Toml,
            Some("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Configuration errors. All of them abort the run.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Load {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The file is not well-formed for its format.
    #[error("failed to parse config file: {message}")]
    Parse {
        /// Parser message.
        message: String,
    },

    /// The file is well-formed but holds an invalid value.
    #[error("invalid config: {0}")]
    Validation(#[from] LoadError),
}

/// Parses and validates configuration text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed text and
/// [`ConfigError::Validation`] for bad values.
pub fn parse_str(content: &str, format: ConfigFormat) -> Result<SealConfig, ConfigError> {
    let dto = parse_dto(content, format)?;
    Ok(loader::load(dto)?)
}

/// Loads configuration from `path`, or the defaults if it does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] when the file exists but cannot be read,
/// and parse or validation errors as for [`parse_str`].
pub fn load_file(path: &Path) -> Result<SealConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No config at {}, using defaults", path.display());
            return Ok(SealConfig::default());
        }
        Err(e) => {
            return Err(ConfigError::Load {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    parse_str(&content, ConfigFormat::from_path(path))
}

fn parse_dto(content: &str, format: ConfigFormat) -> Result<SealConfigDto, ConfigError> {
    if content.trim().is_empty() {
        return Ok(SealConfigDto::default());
    }
    let parse_err = |message: String| ConfigError::Parse { message };
    match format {
        // A comments-only YAML document is null.
        ConfigFormat::Yaml => serde_yaml::from_str::<Option<SealConfigDto>>(content)
            .map(Option::unwrap_or_default)
            .map_err(|e| parse_err(e.to_string())),
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new(".goseal.yml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("goseal.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("goseal.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("goseal")), ConfigFormat::Yaml);
    }

    #[test]
    fn blank_and_comment_only_yaml_yield_defaults() {
        assert_eq!(parse_str("", ConfigFormat::Yaml).unwrap(), SealConfig::default());
        assert_eq!(
            parse_str("# nothing configured yet\n", ConfigFormat::Yaml).unwrap(),
            SealConfig::default()
        );
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = parse_str("init-scope: [unterminated\n", ConfigFormat::Yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn wrong_value_type_is_a_parse_error() {
        let err = parse_str(r#"{"factory-names": "^New"}"#, ConfigFormat::Json).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn bad_value_is_a_validation_error() {
        let err = parse_str("init-scope = \"nowhere\"\n", ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().starts_with("invalid config: init-scope:"));
    }
}
