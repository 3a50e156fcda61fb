//! Source discovery and crate-wide lowering.

use crate::error::FrontendError;
use crate::lower::lower_file;
use crate::module_path::module_path;
use crate::symbols::SymbolTable;
use goseal_core::ir::Unit;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One source file with the module it declares.
#[derive(Debug, Clone)]
pub struct SourceText {
    /// Path as it should appear in diagnostics.
    pub path: PathBuf,
    /// Module path, e.g. `crate::domain`.
    pub module: String,
    /// File contents.
    pub text: String,
}

impl SourceText {
    /// Creates a source entry.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, module: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            module: module.into(),
            text: text.into(),
        }
    }
}

/// Units of one crate, plus the files that could not be parsed.
#[derive(Debug, Default)]
pub struct LoadedCrate {
    /// One unit per module, ordered by module path.
    pub units: Vec<Unit>,
    /// Files skipped because they failed to parse.
    pub failures: Vec<FrontendError>,
}

/// Lowers in-memory sources into units.
///
/// All files share one symbol table, so types declared in one module
/// resolve from any other. Files that fail to parse are recorded in
/// [`LoadedCrate::failures`] and do not contribute symbols.
#[must_use]
pub fn lower_sources(sources: &[SourceText]) -> LoadedCrate {
    let mut failures = Vec::new();
    let mut parsed = Vec::with_capacity(sources.len());
    for source in sources {
        match syn::parse_file(&source.text) {
            Ok(file) => parsed.push((source, file)),
            Err(e) => {
                warn!("Skipping {}: {}", source.path.display(), e);
                failures.push(FrontendError::parse(source.path.clone(), &e));
            }
        }
    }

    let symbols = SymbolTable::build(parsed.iter().map(|(s, f)| (s.module.as_str(), f)));

    let mut units: BTreeMap<&str, Unit> = BTreeMap::new();
    for (source, file) in &parsed {
        let lowered = lower_file(&symbols, &source.module, &source.path, &source.text, file);
        units
            .entry(source.module.as_str())
            .or_insert_with(|| Unit::new(source.module.clone()))
            .files
            .push(lowered);
    }

    LoadedCrate {
        units: units.into_values().collect(),
        failures,
    }
}

/// Discovers and lowers the Rust sources under a crate root.
///
/// # Example
///
/// ```ignore
/// use goseal_syn::CrateLoader;
///
/// let loaded = CrateLoader::new(".").exclude("**/generated/**")?.load()?;
/// for unit in &loaded.units {
///     println!("{}: {} files", unit.package, unit.files.len());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CrateLoader {
    root: PathBuf,
    excludes: Vec<glob::Pattern>,
}

impl CrateLoader {
    /// Creates a loader for a crate directory or a single file.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excludes: Vec::new(),
        }
    }

    /// Skips files whose root-relative path matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid glob.
    pub fn exclude(mut self, pattern: &str) -> Result<Self, FrontendError> {
        self.excludes.push(glob::Pattern::new(pattern)?);
        Ok(self)
    }

    /// The crate root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory module paths are derived from: `<root>/src` when it
    /// exists, otherwise the root itself.
    #[must_use]
    pub fn src_dir(&self) -> PathBuf {
        if self.root.is_file() {
            return self.root.parent().map(Path::to_path_buf).unwrap_or_default();
        }
        let src = self.root.join("src");
        if src.is_dir() {
            src
        } else {
            self.root.clone()
        }
    }

    /// Lists the `.rs` files to analyze, sorted.
    ///
    /// Honors `.gitignore` and the exclude patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory walk fails.
    pub fn discover(&self) -> Result<Vec<PathBuf>, FrontendError> {
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let mut builder = ignore::WalkBuilder::new(self.src_dir());
        builder.hidden(false).git_ignore(true);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("rs") {
                continue;
            }
            if self.is_excluded(path) {
                debug!("Excluding: {}", path.display());
                continue;
            }
            files.push(path.to_path_buf());
        }
        files.sort();
        Ok(files)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.excludes
            .iter()
            .any(|p| p.matches_path(relative) || p.matches_path(path))
    }

    /// Reads, parses, and lowers every discovered file.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails or a file cannot be read. Parse
    /// failures are collected in [`LoadedCrate::failures`] instead.
    pub fn load(&self) -> Result<LoadedCrate, FrontendError> {
        let src_dir = self.src_dir();
        let files = self.discover()?;
        let base = if self.root.is_file() { src_dir.clone() } else { self.root.clone() };
        info!("Loading {} source files from {}", files.len(), self.root.display());

        let mut sources = Vec::with_capacity(files.len());
        for path in files {
            let text = std::fs::read_to_string(&path).map_err(|source| FrontendError::Io {
                path: path.clone(),
                source,
            })?;
            let module = module_path(&src_dir, &path);
            let shown = path.strip_prefix(&base).map_or_else(|_| path.clone(), Path::to_path_buf);
            debug!("{} -> {}", shown.display(), module);
            sources.push(SourceText::new(shown, module, text));
        }
        Ok(lower_sources(&sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_of_one_module_share_a_unit() {
        let sources = vec![
            SourceText::new("src/lib.rs", "crate", "pub mod a;"),
            SourceText::new("src/a.rs", "crate::a", "pub struct A;"),
        ];
        let loaded = lower_sources(&sources);
        let packages: Vec<_> = loaded.units.iter().map(|u| u.package.as_str()).collect();
        assert_eq!(packages, vec!["crate", "crate::a"]);
        assert!(loaded.failures.is_empty());
    }

    #[test]
    fn parse_failures_are_collected() {
        let sources = vec![
            SourceText::new("src/lib.rs", "crate", "fn ok() {}"),
            SourceText::new("src/bad.rs", "crate::bad", "fn broken( {"),
        ];
        let loaded = lower_sources(&sources);
        assert_eq!(loaded.units.len(), 1);
        assert_eq!(loaded.failures.len(), 1);
        assert!(matches!(
            &loaded.failures[0],
            FrontendError::Parse { path, line: 1, .. } if path == Path::new("src/bad.rs")
        ));
    }
}
