//! Pure domain model for the seal policy.
//!
//! This module contains no serde and no I/O. Every value here has already
//! been validated: scopes are closed enums and patterns are compiled.

use crate::pattern::{Pattern, PatternSet};
use crate::types::Severity;
use std::fmt;
use std::str::FromStr;

/// Errors raised while building model values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A pattern is not a valid regular expression.
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// An enumerated setting has a value outside its domain.
    #[error("unknown {key} `{value}`, expected one of: {}", .expected.join(", "))]
    UnknownValue {
        /// Setting name.
        key: &'static str,
        /// The rejected value.
        value: String,
        /// Accepted values.
        expected: &'static [&'static str],
    },
}

macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $key:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Config keyword for this value.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $( $text => Ok(Self::$variant), )+
                    _ => Err(ModelError::UnknownValue {
                        key: $key,
                        value: value.to_string(),
                        expected: &[$( $text ),+],
                    }),
                }
            }
        }
    };
}

keyword_enum! {
    /// Where literal construction of a governed type is permitted.
    InitScope, "init-scope" {
        /// Anywhere.
        Any => "any",
        /// Only inside packages matched by the target patterns.
        InTargetPackages => "in-target-packages",
        /// Only inside the declaring package.
        #[default]
        SamePackage => "same-package",
    }
}

keyword_enum! {
    /// Where direct field assignment on a governed type is permitted.
    MutationScope, "mutation-scope" {
        /// Anywhere.
        Any => "any",
        /// Only inside packages matched by the target patterns.
        InTargetPackages => "in-target-packages",
        /// Only inside methods that have a receiver.
        #[default]
        Receiver => "receiver",
        /// Only inside the declaring package.
        SamePackage => "same-package",
        /// Nowhere.
        Never => "never",
    }
}

keyword_enum! {
    /// Meaning of an empty `target-packages` list.
    ///
    /// The two lineages of the tool disagree here, so the choice is a named
    /// setting rather than an implicit rule.
    EmptyTargets, "empty-target-packages" {
        /// Every package is governed.
        #[default]
        MatchAll => "match-all",
        /// No package is governed; the policy is inert until targets are set.
        MatchNone => "match-none",
    }
}

keyword_enum! {
    /// How strictly `mutation-scope: receiver` checks the receiver.
    ReceiverMatch, "receiver-match" {
        /// Any method with a receiver may mutate any governed type.
        #[default]
        Any => "any",
        /// The receiver must be the mutated type, declared in this package.
        SameType => "same-type",
    }
}

/// Which generation of the policy language is in force.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// `init-scope` / `mutation-scope` rules.
    #[default]
    Scoped,
    /// Constructor-gated rules: construction and mutation are both allowed
    /// only inside a constructor, or anywhere in the declaring package when
    /// `allow_same_package` is set.
    Constructor {
        /// Same-package code bypasses the constructor check.
        allow_same_package: bool,
    },
}

/// Default constructor pattern of the constructor dialect.
pub const DEFAULT_CONSTRUCTOR_PATTERN: &str = "^New.*";

/// Compiled, validated seal policy. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealConfig {
    target_packages: PatternSet,
    exclude_structs: PatternSet,
    factory_names: PatternSet,
    ignore_files: PatternSet,
    init_scope: InitScope,
    mutation_scope: MutationScope,
    empty_targets: EmptyTargets,
    receiver_match: ReceiverMatch,
    dialect: Dialect,
    severity: Severity,
}

impl Default for SealConfig {
    fn default() -> Self {
        SealConfigBuilder::default().build()
    }
}

impl SealConfig {
    /// Creates a builder with every setting at its default.
    #[must_use]
    pub fn builder() -> SealConfigBuilder {
        SealConfigBuilder::default()
    }

    /// Patterns selecting governed declaring packages.
    #[must_use]
    pub fn target_packages(&self) -> &PatternSet {
        &self.target_packages
    }

    /// Patterns for type names exempt from every check.
    #[must_use]
    pub fn exclude_structs(&self) -> &PatternSet {
        &self.exclude_structs
    }

    /// Patterns for function names allowed to construct.
    #[must_use]
    pub fn factory_names(&self) -> &PatternSet {
        &self.factory_names
    }

    /// Patterns for file paths skipped entirely.
    #[must_use]
    pub fn ignore_files(&self) -> &PatternSet {
        &self.ignore_files
    }

    /// Construction scope.
    #[must_use]
    pub fn init_scope(&self) -> InitScope {
        self.init_scope
    }

    /// Mutation scope.
    #[must_use]
    pub fn mutation_scope(&self) -> MutationScope {
        self.mutation_scope
    }

    /// Meaning of an empty target list.
    #[must_use]
    pub fn empty_targets(&self) -> EmptyTargets {
        self.empty_targets
    }

    /// Receiver strictness.
    #[must_use]
    pub fn receiver_match(&self) -> ReceiverMatch {
        self.receiver_match
    }

    /// Policy dialect.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Severity attached to every violation.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Whether `package` is governed by the target patterns.
    #[must_use]
    pub fn is_target_package(&self, package: &str) -> bool {
        if self.target_packages.is_empty() {
            return self.empty_targets == EmptyTargets::MatchAll;
        }
        self.target_packages.any_match(package)
    }

    /// Whether `type_name` is exempt from every check.
    #[must_use]
    pub fn is_excluded_struct(&self, type_name: &str) -> bool {
        self.exclude_structs.any_match(type_name)
    }

    /// Whether `function_name` is an allowed factory.
    #[must_use]
    pub fn is_factory(&self, function_name: &str) -> bool {
        self.factory_names.any_match(function_name)
    }

    /// Whether the file at `path` is skipped.
    #[must_use]
    pub fn is_ignored_file(&self, path: &str) -> bool {
        self.ignore_files.any_match(path)
    }
}

/// Builder for [`SealConfig`].
#[derive(Debug, Clone, Default)]
pub struct SealConfigBuilder {
    target_packages: PatternSet,
    exclude_structs: PatternSet,
    factory_names: PatternSet,
    ignore_files: PatternSet,
    init_scope: InitScope,
    mutation_scope: MutationScope,
    empty_targets: EmptyTargets,
    receiver_match: ReceiverMatch,
    dialect: Dialect,
    severity: Option<Severity>,
}

impl SealConfigBuilder {
    /// Sets the target package patterns.
    #[must_use]
    pub fn target_packages(mut self, patterns: PatternSet) -> Self {
        self.target_packages = patterns;
        self
    }

    /// Sets the excluded struct patterns.
    #[must_use]
    pub fn exclude_structs(mut self, patterns: PatternSet) -> Self {
        self.exclude_structs = patterns;
        self
    }

    /// Sets the factory name patterns.
    #[must_use]
    pub fn factory_names(mut self, patterns: PatternSet) -> Self {
        self.factory_names = patterns;
        self
    }

    /// Sets the ignored file patterns.
    #[must_use]
    pub fn ignore_files(mut self, patterns: PatternSet) -> Self {
        self.ignore_files = patterns;
        self
    }

    /// Sets the construction scope.
    #[must_use]
    pub fn init_scope(mut self, scope: InitScope) -> Self {
        self.init_scope = scope;
        self
    }

    /// Sets the mutation scope.
    #[must_use]
    pub fn mutation_scope(mut self, scope: MutationScope) -> Self {
        self.mutation_scope = scope;
        self
    }

    /// Sets the meaning of an empty target list.
    #[must_use]
    pub fn empty_targets(mut self, empty_targets: EmptyTargets) -> Self {
        self.empty_targets = empty_targets;
        self
    }

    /// Sets receiver strictness.
    #[must_use]
    pub fn receiver_match(mut self, receiver_match: ReceiverMatch) -> Self {
        self.receiver_match = receiver_match;
        self
    }

    /// Sets the dialect.
    #[must_use]
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Sets the violation severity.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Builds the configuration.
    ///
    /// In the constructor dialect an empty factory list falls back to
    /// [`DEFAULT_CONSTRUCTOR_PATTERN`].
    #[must_use]
    pub fn build(self) -> SealConfig {
        let factory_names = match self.dialect {
            Dialect::Constructor { .. } if self.factory_names.is_empty() => {
                default_constructor_patterns()
            }
            _ => self.factory_names,
        };

        SealConfig {
            target_packages: self.target_packages,
            exclude_structs: self.exclude_structs,
            factory_names,
            ignore_files: self.ignore_files,
            init_scope: self.init_scope,
            mutation_scope: self.mutation_scope,
            empty_targets: self.empty_targets,
            receiver_match: self.receiver_match,
            dialect: self.dialect,
            severity: self.severity.unwrap_or(Severity::Error),
        }
    }
}

fn default_constructor_patterns() -> PatternSet {
    // The literal is a valid regex; an empty set is the only possible fallback.
    Pattern::new(DEFAULT_CONSTRUCTOR_PATTERN)
        .map(|p| PatternSet::from_patterns(vec![p]))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SealConfig::default();
        assert_eq!(config.init_scope(), InitScope::SamePackage);
        assert_eq!(config.mutation_scope(), MutationScope::Receiver);
        assert_eq!(config.empty_targets(), EmptyTargets::MatchAll);
        assert_eq!(config.receiver_match(), ReceiverMatch::Any);
        assert_eq!(config.dialect(), Dialect::Scoped);
        assert_eq!(config.severity(), Severity::Error);
        assert!(config.factory_names().is_empty());
        assert!(config.target_packages().is_empty());
    }

    #[test]
    fn scope_keywords_parse_and_display() {
        for scope in [
            InitScope::Any,
            InitScope::InTargetPackages,
            InitScope::SamePackage,
        ] {
            assert_eq!(scope.as_str().parse::<InitScope>().unwrap(), scope);
        }
        assert_eq!(
            "never".parse::<MutationScope>().unwrap(),
            MutationScope::Never
        );
        assert_eq!(MutationScope::InTargetPackages.to_string(), "in-target-packages");
    }

    #[test]
    fn unknown_scope_is_rejected() {
        let err = "package".parse::<InitScope>().unwrap_err();
        assert!(matches!(
            err,
            ModelError::UnknownValue { key: "init-scope", ref value, .. } if value == "package"
        ));
        assert!(err.to_string().contains("same-package"));
        assert!("receivers".parse::<MutationScope>().is_err());
    }

    #[test]
    fn empty_targets_controls_empty_list() {
        let all = SealConfig::default();
        assert!(all.is_target_package("anything"));

        let none = SealConfig::builder()
            .empty_targets(EmptyTargets::MatchNone)
            .build();
        assert!(!none.is_target_package("anything"));
    }

    #[test]
    fn non_empty_targets_ignore_empty_setting() {
        let config = SealConfig::builder()
            .target_packages(PatternSet::compile(["/domain$"]).unwrap())
            .empty_targets(EmptyTargets::MatchNone)
            .build();
        assert!(config.is_target_package("example.com/p/domain"));
        assert!(!config.is_target_package("example.com/p/app"));
    }

    #[test]
    fn constructor_dialect_defaults_factory_names() {
        let config = SealConfig::builder()
            .dialect(Dialect::Constructor {
                allow_same_package: false,
            })
            .build();
        assert!(config.is_factory("NewUser"));
        assert!(!config.is_factory("BuildUser"));
    }

    #[test]
    fn scoped_dialect_keeps_empty_factory_names() {
        let config = SealConfig::builder().build();
        assert!(!config.is_factory("NewUser"));
    }
}
