//! DTO → Domain model conversion with validation.

use crate::pattern::{Pattern, PatternSet};
use crate::types::Severity;

use super::dto::SealConfigDto;
use super::model::{
    Dialect, EmptyTargets, InitScope, ModelError, MutationScope, ReceiverMatch, SealConfig,
};

/// Errors during DTO → Domain conversion.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A field-level validation error.
    #[error("{context}: {source}")]
    Validation {
        /// Where the error occurred (e.g., "factory-names[2]").
        context: String,
        /// The underlying model error.
        source: ModelError,
    },

    /// Two settings that cannot be combined are both present.
    #[error("`{first}` cannot be combined with `{second}`")]
    Conflict {
        /// First setting.
        first: &'static str,
        /// Second setting.
        second: &'static str,
    },
}

/// Converts a [`SealConfigDto`] to a validated [`SealConfig`].
///
/// The constructor dialect is selected when the DTO uses only the older
/// keys (`constructors`, `struct-packages`, `allow-same-package`). Any of
/// `init-scope`, `mutation-scope`, `factory-names`, `target-packages` or
/// `exclude-structs` selects the scoped dialect, in which `constructors` and
/// `struct-packages` are plain aliases.
///
/// # Errors
///
/// Returns the first error encountered during conversion.
pub fn load(dto: SealConfigDto) -> Result<SealConfig, LoadError> {
    let scoped_keys = [
        ("init-scope", dto.init_scope.is_some()),
        ("mutation-scope", dto.mutation_scope.is_some()),
        ("factory-names", dto.factory_names.is_some()),
        ("target-packages", dto.target_packages.is_some()),
        ("exclude-structs", dto.exclude_structs.is_some()),
    ];
    let scoped_key = scoped_keys
        .iter()
        .find_map(|(name, present)| present.then_some(*name));
    let legacy = dto.constructors.is_some()
        || dto.struct_packages.is_some()
        || dto.allow_same_package.is_some();

    let dialect = match (scoped_key, dto.allow_same_package) {
        (Some(key), Some(_)) => {
            return Err(LoadError::Conflict {
                first: "allow-same-package",
                second: key,
            })
        }
        (None, allow) if legacy => Dialect::Constructor {
            allow_same_package: allow.unwrap_or(false),
        },
        _ => Dialect::Scoped,
    };

    let targets = pick_alias(
        dto.target_packages,
        "target-packages",
        dto.struct_packages,
        "struct-packages",
    )?;
    let factories = pick_alias(
        dto.factory_names,
        "factory-names",
        dto.constructors,
        "constructors",
    )?;

    let mut builder = SealConfig::builder()
        .dialect(dialect)
        .target_packages(compile(targets, "target-packages")?)
        .factory_names(compile(factories, "factory-names")?)
        .exclude_structs(compile(dto.exclude_structs, "exclude-structs")?)
        .ignore_files(compile(dto.ignore_files, "ignore-files")?);

    if let Some(value) = dto.init_scope {
        builder = builder.init_scope(parse_keyword::<InitScope>(&value, "init-scope")?);
    }
    if let Some(value) = dto.mutation_scope {
        builder = builder.mutation_scope(parse_keyword::<MutationScope>(&value, "mutation-scope")?);
    }
    if let Some(value) = dto.empty_target_packages {
        builder = builder.empty_targets(parse_keyword::<EmptyTargets>(
            &value,
            "empty-target-packages",
        )?);
    }
    if let Some(value) = dto.receiver_match {
        builder = builder.receiver_match(parse_keyword::<ReceiverMatch>(&value, "receiver-match")?);
    }
    if let Some(value) = dto.severity {
        builder = builder.severity(parse_severity(&value)?);
    }

    Ok(builder.build())
}

fn pick_alias(
    primary: Option<Vec<String>>,
    primary_name: &'static str,
    alias: Option<Vec<String>>,
    alias_name: &'static str,
) -> Result<Option<Vec<String>>, LoadError> {
    match (primary, alias) {
        (Some(_), Some(_)) => Err(LoadError::Conflict {
            first: primary_name,
            second: alias_name,
        }),
        (primary, alias) => Ok(primary.or(alias)),
    }
}

fn compile(patterns: Option<Vec<String>>, key: &str) -> Result<PatternSet, LoadError> {
    let compiled = patterns
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            Pattern::new(p).map_err(|e| LoadError::Validation {
                context: format!("{key}[{i}]"),
                source: e,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PatternSet::from_patterns(compiled))
}

fn parse_keyword<T>(value: &str, key: &str) -> Result<T, LoadError>
where
    T: std::str::FromStr<Err = ModelError>,
{
    value.parse().map_err(|e| LoadError::Validation {
        context: key.to_string(),
        source: e,
    })
}

fn parse_severity(value: &str) -> Result<Severity, LoadError> {
    match value {
        "error" => Ok(Severity::Error),
        "warning" => Ok(Severity::Warning),
        "info" => Ok(Severity::Info),
        _ => Err(LoadError::Validation {
            context: "severity".to_string(),
            source: ModelError::UnknownValue {
                key: "severity",
                value: value.to_string(),
                expected: &["error", "warning", "info"],
            },
        }),
    }
}
