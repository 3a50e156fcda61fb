//! Shared output formatting for lint results.

use anyhow::Result;
use goseal::{LintResult, ViolationDiagnostic};
use miette::{NamedSource, Report};
use std::path::Path;

use crate::OutputFormat;

/// Print lint results in the specified format.
///
/// `base` is the directory violation paths are relative to; the pretty
/// format reads sources from there.
pub fn print(result: &LintResult, format: OutputFormat, base: &Path) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print_compact(result),
        OutputFormat::Pretty => print_pretty(result, base),
    }
    Ok(())
}

fn print_text(result: &LintResult) {
    for violation in &result.violations {
        println!("{}", violation.format());
    }
    print_summary(result);
}

fn print_summary(result: &LintResult) {
    let (errors, warnings, infos) = result.count_by_severity();
    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}Found {} error(s), {} warning(s), {} info(s) in {} file(s) across {} unit(s)\x1b[0m",
        summary_color, errors, warnings, infos, result.files_checked, result.units_checked
    );
}

fn print_json(result: &LintResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(result: &LintResult) {
    for violation in &result.violations {
        println!("{violation}");
    }
}

fn print_pretty(result: &LintResult, base: &Path) {
    for violation in &result.violations {
        let path = base.join(&violation.location.file);
        let Ok(text) = std::fs::read_to_string(&path) else {
            tracing::debug!("Source unavailable for {}", path.display());
            println!("{violation}");
            continue;
        };

        let mut located = violation.clone();
        if let Some((offset, length)) =
            token_span(&text, violation.location.line, violation.location.column)
        {
            located.location = located.location.with_span(offset, length);
        }
        let name = violation.location.file.display().to_string();
        let report = Report::new(ViolationDiagnostic::from(&located))
            .with_source_code(NamedSource::new(name, text));
        println!("{report:?}");
    }
    print_summary(result);
}

/// Byte span of the token starting at a 1-based line and character column.
///
/// The token runs over identifier characters and is at least one character
/// long.
fn token_span(text: &str, line: usize, column: usize) -> Option<(usize, usize)> {
    let mut line_start = 0;
    for (index, content) in text.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            let (start, _) = content.char_indices().nth(column.checked_sub(1)?)?;
            let rest = &content[start..];
            let ident: usize = rest
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .map(char::len_utf8)
                .sum();
            let length = if ident == 0 {
                rest.chars().next().map_or(0, char::len_utf8)
            } else {
                ident
            };
            return Some((line_start + start, length));
        }
        line_start += content.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_span_covers_identifier() {
        let text = "fn f() {\n    let u = User { id: 1 };\n}\n";
        assert_eq!(token_span(text, 2, 13), Some((21, 4)));
    }

    #[test]
    fn token_span_falls_back_to_one_character() {
        let text = "a\n&x\n";
        assert_eq!(token_span(text, 2, 1), Some((2, 1)));
    }

    #[test]
    fn token_span_out_of_range() {
        assert_eq!(token_span("a\n", 3, 1), None);
        assert_eq!(token_span("a\n", 1, 0), None);
        assert_eq!(token_span("ab\n", 1, 9), None);
    }
}
