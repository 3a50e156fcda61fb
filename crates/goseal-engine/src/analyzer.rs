//! The `analyze(unit) -> diagnostics` entry point.

use crate::messages;
use crate::policy::decide;
use crate::resolver::resolve_site;
use crate::scanner::Scanner;
use goseal_core::ir::Unit;
use goseal_core::{SealConfig, Violation};
use tracing::debug;

/// Violations of one unit plus the number of files that were scanned.
#[derive(Debug, Default)]
pub struct UnitReport {
    /// Violations in discovery order.
    pub violations: Vec<Violation>,
    /// Files walked (generated and ignored files excluded).
    pub files_checked: usize,
}

/// Seal analyzer bound to one immutable configuration.
///
/// The analyzer holds no mutable state, so one instance can serve many
/// units, including from several threads at once.
///
/// # Example
///
/// ```ignore
/// use goseal_engine::SealAnalyzer;
///
/// let analyzer = SealAnalyzer::new(config);
/// for violation in analyzer.analyze(&unit) {
///     println!("{violation}");
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SealAnalyzer {
    config: SealConfig,
}

impl SealAnalyzer {
    /// Creates an analyzer for `config`.
    #[must_use]
    pub fn new(config: SealConfig) -> Self {
        Self { config }
    }

    /// Name of the analyzer as registered with hosts.
    #[must_use]
    pub fn name(&self) -> &'static str {
        "goseal"
    }

    /// One-line description for hosts.
    #[must_use]
    pub fn doc(&self) -> &'static str {
        "Checks that sealed structs are only constructed and mutated in allowed scopes"
    }

    /// The configuration in force.
    #[must_use]
    pub fn config(&self) -> &SealConfig {
        &self.config
    }

    /// Analyzes one unit and returns its violations in discovery order.
    #[must_use]
    pub fn analyze(&self, unit: &Unit) -> Vec<Violation> {
        self.check_unit(unit).violations
    }

    /// Analyzes one unit, also reporting how many files were scanned.
    #[must_use]
    pub fn check_unit(&self, unit: &Unit) -> UnitReport {
        let scan = Scanner::new(self.config.ignore_files()).scan(unit);
        if scan.files_scanned == 0 {
            debug!("No scannable files in {}", unit.package);
            return UnitReport::default();
        }

        let violations: Vec<Violation> = scan
            .candidates
            .iter()
            .filter_map(resolve_site)
            .filter_map(|site| {
                let decision = decide(&self.config, &site, &unit.package);
                messages::violation(&self.config, &site, decision)
            })
            .collect();

        debug!(
            "{}: {} candidates, {} violations",
            unit.package,
            scan.candidates.len(),
            violations.len()
        );
        UnitReport {
            violations,
            files_checked: scan.files_scanned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goseal_core::ir::{Expr, FuncDecl, Item, Position, SourceFile, Stmt, Type};

    #[test]
    fn all_generated_unit_is_empty() {
        let unit = Unit::new("app").with_file(
            SourceFile::new("app/zz_generated.go")
                .with_comment("// Code generated by stringer; DO NOT EDIT.")
                .with_item(Item::Func(FuncDecl::new(
                    "init",
                    vec![Stmt::Expr(Expr::literal(
                        Type::aggregate("domain", "User"),
                        vec![],
                        Position::new(5, 2),
                    ))],
                ))),
        );
        let report = SealAnalyzer::default().check_unit(&unit);
        assert!(report.violations.is_empty());
        assert_eq!(report.files_checked, 0);
    }

    #[test]
    fn unresolved_types_are_silently_skipped() {
        let lit = Expr::new(
            goseal_core::ir::ExprKind::Literal { elements: vec![] },
            Position::new(3, 4),
        );
        let unit = Unit::new("app").with_file(
            SourceFile::new("app/app.go")
                .with_item(Item::Func(FuncDecl::new("Build", vec![Stmt::Expr(lit)]))),
        );
        let report = SealAnalyzer::default().check_unit(&unit);
        assert!(report.violations.is_empty());
        assert_eq!(report.files_checked, 1);
    }
}
