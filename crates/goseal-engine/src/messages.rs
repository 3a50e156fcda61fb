//! Diagnostic text for each decision.

use crate::policy::Decision;
use crate::rules::{self, RuleInfo};
use crate::scanner::{Site, SiteKind};
use goseal_core::config::{InitScope, MutationScope};
use goseal_core::{Location, SealConfig, Suggestion, Violation};

/// Builds the violation for a denied site, or `None` if it is allowed.
#[must_use]
pub fn violation(config: &SealConfig, site: &Site<'_>, decision: Decision) -> Option<Violation> {
    let (rule, message, help) = describe(config, site, decision)?;
    let location = Location::new(
        site.file.to_path_buf(),
        site.position.line,
        site.position.column,
    );
    Some(
        Violation::new(rule.code, rule.name, config.severity(), location, message)
            .with_suggestion(Suggestion::new(help)),
    )
}

fn describe(
    config: &SealConfig,
    site: &Site<'_>,
    decision: Decision,
) -> Option<(RuleInfo, String, String)> {
    let ty = site.type_name;
    let described = match (decision, site.kind) {
        (Decision::ScopeViolation, SiteKind::Construction) => (
            rules::INIT_SCOPE,
            format!(
                "direct construction of sealed struct {ty} is not allowed {}",
                init_scope_phrase(config.init_scope())
            ),
            format!("call a factory function declared in {}", site.package),
        ),
        (Decision::FactoryViolation, _) => (
            rules::FACTORY_NAMES,
            format!(
                "direct construction of sealed struct {ty} is not allowed outside factory functions (factory-names)"
            ),
            format!(
                "move the literal into a function matching {}",
                pattern_list(config)
            ),
        ),
        (Decision::ScopeViolation, SiteKind::Mutation { field }) => (
            rules::MUTATION_SCOPE,
            format!(
                "direct assignment to field {field} of sealed struct {ty} is not allowed {}",
                mutation_scope_phrase(config.mutation_scope())
            ),
            format!("assign {field} through a method on {ty}"),
        ),
        (Decision::ConstructorViolation, SiteKind::Construction) => (
            rules::CONSTRUCTORS,
            format!("direct construction of struct {ty} is prohibited, use constructor function"),
            format!("call a constructor matching {}", pattern_list(config)),
        ),
        (Decision::ConstructorViolation, SiteKind::Mutation { field }) => (
            rules::CONSTRUCTORS,
            format!(
                "direct assignment to field {field} of struct {ty} is prohibited, use constructor function"
            ),
            format!("build a new {ty} through a constructor matching {}", pattern_list(config)),
        ),
        _ => return None,
    };
    Some(described)
}

fn init_scope_phrase(scope: InitScope) -> String {
    let place = match scope {
        InitScope::SamePackage => "from outside its package",
        InitScope::InTargetPackages => "outside target packages",
        InitScope::Any => "here",
    };
    format!("{place} (init-scope: {scope})")
}

fn mutation_scope_phrase(scope: MutationScope) -> String {
    let place = match scope {
        MutationScope::Receiver => "outside its receiver methods",
        MutationScope::SamePackage => "from outside its package",
        MutationScope::InTargetPackages => "outside target packages",
        MutationScope::Never => "anywhere",
        MutationScope::Any => "here",
    };
    format!("{place} (mutation-scope: {scope})")
}

fn pattern_list(config: &SealConfig) -> String {
    config
        .factory_names()
        .iter()
        .map(|p| format!("`{}`", p.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}
