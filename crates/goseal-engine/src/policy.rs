//! Policy engine.
//!
//! [`decide`] is a pure function of the configuration, a resolved site, and
//! the package being analyzed. Evaluation order is fixed:
//!
//! 1. Targeting: the declaring package must be governed.
//! 2. Exclusion: excluded type names are always allowed.
//! 3. Construction: `init-scope`, then `factory-names`.
//! 4. Mutation: `mutation-scope` only.
//!
//! The constructor dialect replaces steps 3 and 4 with a single gate shared
//! by both kinds of site.

use crate::scanner::{Frame, Site, SiteKind};
use goseal_core::config::{Dialect, InitScope, MutationScope, ReceiverMatch};
use goseal_core::SealConfig;

/// Outcome for one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// The declaring package is not governed.
    NotApplicable,
    /// The type name matches `exclude-structs`.
    Excluded,
    /// The site satisfies every applicable rule.
    Allowed,
    /// The site is outside `init-scope` or `mutation-scope`.
    ScopeViolation,
    /// The construction is in scope but not inside a factory.
    FactoryViolation,
    /// Constructor dialect: the site is outside every constructor.
    ConstructorViolation,
}

impl Decision {
    /// Whether the site is permitted.
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::NotApplicable | Self::Excluded | Self::Allowed)
    }
}

/// Decides whether `site` is permitted inside `current_package`.
#[must_use]
pub fn decide(config: &SealConfig, site: &Site<'_>, current_package: &str) -> Decision {
    if !config.is_target_package(site.package) {
        return Decision::NotApplicable;
    }
    if config.is_excluded_struct(site.type_name) {
        return Decision::Excluded;
    }

    if let Dialect::Constructor { allow_same_package } = config.dialect() {
        return constructor_gate(config, site, current_package, allow_same_package);
    }

    match site.kind {
        SiteKind::Construction => construction(config, site, current_package),
        SiteKind::Mutation { .. } => mutation(config, site, current_package),
    }
}

fn construction(config: &SealConfig, site: &Site<'_>, current_package: &str) -> Decision {
    let in_scope = match config.init_scope() {
        InitScope::Any => true,
        InitScope::InTargetPackages => config.is_target_package(current_package),
        InitScope::SamePackage => current_package == site.package,
    };
    if !in_scope {
        return Decision::ScopeViolation;
    }

    if config.factory_names().is_empty() || in_factory(config, site) {
        Decision::Allowed
    } else {
        Decision::FactoryViolation
    }
}

fn mutation(config: &SealConfig, site: &Site<'_>, current_package: &str) -> Decision {
    let in_scope = match config.mutation_scope() {
        MutationScope::Any => true,
        MutationScope::Receiver => in_receiver(config, site, current_package),
        MutationScope::SamePackage => current_package == site.package,
        MutationScope::InTargetPackages => config.is_target_package(current_package),
        MutationScope::Never => false,
    };
    if in_scope {
        Decision::Allowed
    } else {
        Decision::ScopeViolation
    }
}

fn in_receiver(config: &SealConfig, site: &Site<'_>, current_package: &str) -> bool {
    let Some(frame) = site.context.filter(Frame::has_receiver) else {
        return false;
    };
    match config.receiver_match() {
        ReceiverMatch::Any => true,
        ReceiverMatch::SameType => {
            frame.receiver == Some(site.type_name) && current_package == site.package
        }
    }
}

fn in_factory(config: &SealConfig, site: &Site<'_>) -> bool {
    site.context.is_some_and(|frame| config.is_factory(frame.name))
}

fn constructor_gate(
    config: &SealConfig,
    site: &Site<'_>,
    current_package: &str,
    allow_same_package: bool,
) -> Decision {
    if allow_same_package && current_package == site.package {
        return Decision::Allowed;
    }
    if in_factory(config, site) {
        Decision::Allowed
    } else {
        Decision::ConstructorViolation
    }
}
