//! Accumulator for violations reported during a run.

use crate::types::{LintResult, Violation};

/// Collects violations in the order sites were discovered.
///
/// The sink is owned by the driver and may span many units. It performs no
/// deduplication: every violating site contributes exactly one record.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    violations: Vec<Violation>,
    units_checked: usize,
    files_checked: usize,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one unit.
    pub fn record_unit(&mut self, files_checked: usize, violations: Vec<Violation>) {
        self.units_checked += 1;
        self.files_checked += files_checked;
        self.violations.extend(violations);
    }

    /// Consumes the sink into a [`LintResult`].
    #[must_use]
    pub fn into_result(self) -> LintResult {
        LintResult {
            violations: self.violations,
            units_checked: self.units_checked,
            files_checked: self.files_checked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, Severity};
    use std::path::PathBuf;

    fn violation(line: usize) -> Violation {
        Violation::new(
            "GS003",
            "mutation-scope",
            Severity::Error,
            Location::new(PathBuf::from("a.go"), line, 1),
            "msg",
        )
    }

    #[test]
    fn keeps_discovery_order_and_duplicates() {
        let mut sink = DiagnosticSink::new();
        sink.record_unit(1, vec![violation(9), violation(3)]);
        sink.record_unit(1, vec![violation(3)]);
        let result = sink.into_result();
        let lines: Vec<usize> = result.violations.iter().map(|v| v.location.line).collect();
        assert_eq!(lines, vec![9, 3, 3]);
    }

    #[test]
    fn into_result_carries_counters() {
        let mut sink = DiagnosticSink::new();
        sink.record_unit(2, vec![violation(1)]);
        sink.record_unit(0, vec![]);

        let result = sink.into_result();
        assert_eq!(result.units_checked, 2);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.violations.len(), 1);
    }
}
