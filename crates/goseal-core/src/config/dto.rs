//! Deserialization types (DTO layer).
//!
//! These types exist solely for serde. Every field is optional so the loader
//! can tell "absent" from "empty" when it picks the dialect. They are
//! converted to [`SealConfig`](super::model::SealConfig) via the loader.

use serde::{Deserialize, Serialize};

/// Raw configuration as written in `.goseal.yml`, `goseal.toml`, or JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SealConfigDto {
    /// Patterns for governed declaring packages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_packages: Option<Vec<String>>,

    /// Constructor-dialect spelling of `target-packages`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub struct_packages: Option<Vec<String>>,

    /// Patterns for exempt type names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_structs: Option<Vec<String>>,

    /// Patterns for allowed factory functions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_names: Option<Vec<String>>,

    /// Constructor-dialect spelling of `factory-names`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructors: Option<Vec<String>>,

    /// `any`, `in-target-packages`, or `same-package`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_scope: Option<String>,

    /// `any`, `in-target-packages`, `receiver`, `same-package`, or `never`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_scope: Option<String>,

    /// Patterns for skipped file paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_files: Option<Vec<String>>,

    /// Constructor dialect: let the declaring package bypass constructors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_same_package: Option<bool>,

    /// `match-all` or `match-none`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_target_packages: Option<String>,

    /// `any` or `same-type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_match: Option<String>,

    /// `error`, `warning`, or `info`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}
