//! Multi-unit driver.

use goseal_core::ir::Unit;
use goseal_core::{DiagnosticSink, LintResult, SealConfig};
use goseal_engine::{SealAnalyzer, UnitReport};
use goseal_syn::{CrateLoader, FrontendError};
use rayon::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Runs one analyzer over many units.
///
/// Results keep the order of the input units whether or not the run is
/// parallel.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    analyzer: SealAnalyzer,
    parallel: bool,
}

impl Runner {
    /// Creates a sequential runner for `config`.
    #[must_use]
    pub fn new(config: SealConfig) -> Self {
        Self {
            analyzer: SealAnalyzer::new(config),
            parallel: false,
        }
    }

    /// Analyzes units on the rayon thread pool when `parallel` is true.
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The analyzer in use.
    #[must_use]
    pub fn analyzer(&self) -> &SealAnalyzer {
        &self.analyzer
    }

    /// Analyzes every unit and collects the findings.
    #[must_use]
    pub fn run(&self, units: &[Unit]) -> LintResult {
        let reports: Vec<UnitReport> = if self.parallel {
            units
                .par_iter()
                .map(|unit| self.analyzer.check_unit(unit))
                .collect()
        } else {
            units
                .iter()
                .map(|unit| self.analyzer.check_unit(unit))
                .collect()
        };

        let mut sink = DiagnosticSink::new();
        for report in reports {
            sink.record_unit(report.files_checked, report.violations);
        }
        let result = sink.into_result();

        info!(
            "Analysis complete: {} violations in {} files ({} units)",
            result.violations.len(),
            result.files_checked,
            result.units_checked
        );
        result
    }
}

/// Loads the crate at `root` and checks it with `config`.
///
/// Files that fail to parse are logged and skipped.
///
/// # Errors
///
/// Returns an error if the sources cannot be discovered or read.
pub fn check_crate(root: impl AsRef<Path>, config: SealConfig) -> Result<LintResult, FrontendError> {
    let loaded = CrateLoader::new(root.as_ref()).load()?;
    for failure in &loaded.failures {
        warn!("{failure}");
    }
    Ok(Runner::new(config).run(&loaded.units))
}
