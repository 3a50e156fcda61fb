//! Check command implementation.

use anyhow::{bail, Context, Result};
use goseal::config;
use goseal::frontend::CrateLoader;
use goseal::ir::Unit;
use goseal::{Runner, SealConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Arguments of `goseal check`.
#[derive(Debug)]
pub struct CheckOptions {
    /// Crate directory or single file.
    pub path: PathBuf,
    /// Pre-lowered units to analyze instead of `path`.
    pub units: Option<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
    /// Analyze units on the rayon pool.
    pub parallel: bool,
    /// Glob patterns of files to skip.
    pub exclude: Vec<String>,
}

/// A units file holds either one unit or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum UnitsFile {
    Many(Vec<Unit>),
    One(Unit),
}

/// Runs the check command.
pub fn run(options: &CheckOptions, source: &ConfigSource) -> Result<()> {
    let config = load_config(source)?;

    let (units, base) = match &options.units {
        Some(file) => (read_units(file)?, PathBuf::from(".")),
        None => (
            load_crate(&options.path, &options.exclude)?,
            source_base(&options.path),
        ),
    };

    tracing::info!("Analyzing {} units", units.len());

    let result = Runner::new(config)
        .parallel(options.parallel)
        .run(&units);

    super::output::print(&result, options.format, &base)?;

    // Exit with error code if there are errors
    if result.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(source: &ConfigSource) -> Result<SealConfig> {
    let Some(path) = source.path() else {
        return Ok(SealConfig::default());
    };
    if source.is_explicit() && !path.exists() {
        bail!("Config file not found: {}", path.display());
    }
    if source.is_global() {
        tracing::info!("Using global config: {}", path.display());
    }
    config::load_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
}

fn read_units(file: &Path) -> Result<Vec<Unit>> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read units file: {}", file.display()))?;
    parse_units(&text).with_context(|| format!("Invalid units file: {}", file.display()))
}

fn parse_units(text: &str) -> Result<Vec<Unit>> {
    Ok(match serde_json::from_str(text)? {
        UnitsFile::Many(units) => units,
        UnitsFile::One(unit) => vec![unit],
    })
}

fn load_crate(path: &Path, exclude: &[String]) -> Result<Vec<Unit>> {
    let mut loader = CrateLoader::new(path);
    for pattern in exclude {
        loader = loader
            .exclude(pattern)
            .with_context(|| format!("Invalid exclude pattern: {pattern}"))?;
    }
    let loaded = loader
        .load()
        .with_context(|| format!("Failed to load sources from {}", path.display()))?;
    for failure in &loaded.failures {
        tracing::warn!("{failure}");
    }
    Ok(loaded.units)
}

/// Directory that diagnostic paths are relative to.
fn source_base(path: &Path) -> PathBuf {
    if path.is_file() {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn units_file_accepts_a_single_unit() {
        let units = parse_units(r#"{"package": "example.com/app", "files": []}"#).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].package, "example.com/app");
    }

    #[test]
    fn units_file_accepts_a_list() {
        let units =
            parse_units(r#"[{"package": "example.com/a"}, {"package": "example.com/b"}]"#).unwrap();
        let packages: Vec<_> = units.iter().map(|u| u.package.as_str()).collect();
        assert_eq!(packages, vec!["example.com/a", "example.com/b"]);
    }

    #[test]
    fn malformed_units_file_is_an_error() {
        assert!(parse_units("{\"files\": 3}").is_err());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let source = ConfigSource::Explicit(PathBuf::from("/nonexistent/.goseal.yml"));
        assert!(load_config(&source).is_err());
    }

    #[test]
    fn invalid_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".goseal.yml");
        fs::write(&path, "init-scope: everywhere\n").unwrap();
        let err = load_config(&ConfigSource::Project(path)).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to load config"));
    }

    #[test]
    fn default_source_uses_defaults() {
        assert!(load_config(&ConfigSource::Default).is_ok());
    }

    #[test]
    fn crate_sources_are_loaded_per_module() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/lib.rs"), "pub mod a;\n").unwrap();
        fs::write(tmp.path().join("src/a.rs"), "pub struct A;\n").unwrap();
        fs::write(tmp.path().join("src/b.rs"), "pub struct B;\n").unwrap();

        let units = load_crate(tmp.path(), &["src/b.rs".to_string()]).unwrap();
        let packages: Vec<_> = units.iter().map(|u| u.package.as_str()).collect();
        assert_eq!(packages, vec!["crate", "crate::a"]);
    }

    #[test]
    fn bad_exclude_pattern_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load_crate(tmp.path(), &["[".to_string()]).is_err());
    }
}
