//! Type resolver.
//!
//! Decides whether a candidate's static type is a declared struct-like type
//! and extracts its identity. Anything else is "not applicable", never an
//! error: missing, invalid, or partially checked types degrade silently.

use crate::scanner::{Candidate, Site};
use goseal_core::ir::{NamedType, Type};

/// Name and declaring package of a governed-looking type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeIdentity<'a> {
    /// Type name.
    pub name: &'a str,
    /// Declaring package path.
    pub package: &'a str,
}

/// Resolves `ty` to a declared aggregate, unwrapping one pointer level.
///
/// Returns `None` (not applicable) for primitives, interfaces, generic
/// parameters, unresolved types, universe types without a package, and
/// aliases. Aliases are never followed.
#[must_use]
pub fn resolve(ty: Option<&Type>) -> Option<TypeIdentity<'_>> {
    let ty = match ty? {
        Type::Pointer { elem } => elem.as_ref(),
        other => other,
    };
    match ty {
        Type::Named(NamedType {
            name,
            package: Some(package),
            aggregate: true,
        }) => Some(TypeIdentity { name, package }),
        _ => None,
    }
}

/// Turns a candidate into a [`Site`], or `None` if its type is not applicable.
#[must_use]
pub fn resolve_site<'a>(candidate: &Candidate<'a>) -> Option<Site<'a>> {
    let identity = resolve(candidate.ty)?;
    Some(Site {
        kind: candidate.kind,
        position: candidate.position,
        file: candidate.file,
        type_name: identity.name,
        package: identity.package,
        context: candidate.context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Type {
        Type::aggregate("example.com/domain", "User")
    }

    #[test]
    fn value_and_single_pointer_resolve_identically() {
        let by_value = user();
        let by_pointer = Type::pointer(user());
        let expected = Some(TypeIdentity {
            name: "User",
            package: "example.com/domain",
        });
        assert_eq!(resolve(Some(&by_value)), expected);
        assert_eq!(resolve(Some(&by_pointer)), expected);
    }

    #[test]
    fn only_one_pointer_level_is_unwrapped() {
        let double = Type::pointer(Type::pointer(user()));
        assert_eq!(resolve(Some(&double)), None);
    }

    #[test]
    fn aliases_are_not_followed() {
        let alias = Type::Alias {
            name: "ExportUser".to_string(),
            package: Some("example.com/domain".to_string()),
            target: Box::new(user()),
        };
        assert_eq!(resolve(Some(&alias)), None);
        assert_eq!(resolve(Some(&Type::pointer(alias))), None);
    }

    #[test]
    fn non_aggregates_are_not_applicable() {
        let cases = [
            Type::named("example.com/domain", "Status"),
            Type::basic("int"),
            Type::Interface,
            Type::TypeParam {
                name: "T".to_string(),
            },
            Type::Sequence {
                elem: Box::new(user()),
            },
            Type::Invalid,
            Type::Named(NamedType {
                name: "error".to_string(),
                package: None,
                aggregate: true,
            }),
        ];
        for ty in &cases {
            assert_eq!(resolve(Some(ty)), None, "{ty:?}");
        }
        assert_eq!(resolve(None), None);
    }
}
