//! `syn::Type` → IR [`Type`] lowering.

use crate::symbols::{path_segments, FnSig, SymbolKind, SymbolTable};
use goseal_core::ir::Type;
use syn::{GenericArgument, PathArguments, ReturnType};

const MAX_ALIAS_DEPTH: usize = 4;

const PRIMITIVES: &[&str] = &[
    "bool", "char", "str", "String", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16",
    "i32", "i64", "i128", "isize", "f32", "f64",
];

/// Declared return type of a callable, with `Result`/`Option` peeled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnInfo {
    /// The returned type, or the success type of a fallible return.
    pub ty: Type,
    /// Whether the declared type was `Result<T, _>` or `Option<T>`.
    pub fallible: bool,
}

/// Resolution context for lowering types written inside one module.
#[derive(Debug, Clone, Copy)]
pub struct TypeCx<'a> {
    /// Crate symbols.
    pub symbols: &'a SymbolTable,
    /// Module the type is written in.
    pub module: &'a str,
    /// Type parameters in scope.
    pub generics: &'a [String],
    /// What `Self` means here.
    pub self_ty: Option<&'a Type>,
}

impl<'a> TypeCx<'a> {
    /// Creates a context without generics or `Self`.
    #[must_use]
    pub fn new(symbols: &'a SymbolTable, module: &'a str) -> Self {
        Self {
            symbols,
            module,
            generics: &[],
            self_ty: None,
        }
    }

    /// Lowers `ty`, or `None` if it cannot be determined.
    #[must_use]
    pub fn lower(&self, ty: &syn::Type) -> Option<Type> {
        self.lower_at(ty, 0)
    }

    fn lower_at(&self, ty: &syn::Type, depth: usize) -> Option<Type> {
        match ty {
            syn::Type::Reference(r) => Some(Type::pointer(self.lower_at(&r.elem, depth)?)),
            syn::Type::Ptr(p) => Some(Type::pointer(self.lower_at(&p.elem, depth)?)),
            syn::Type::Paren(p) => self.lower_at(&p.elem, depth),
            syn::Type::Group(g) => self.lower_at(&g.elem, depth),
            syn::Type::Slice(s) => Some(self.sequence(&s.elem, depth)),
            syn::Type::Array(a) => Some(self.sequence(&a.elem, depth)),
            syn::Type::TraitObject(_) | syn::Type::ImplTrait(_) => Some(Type::Interface),
            syn::Type::Tuple(t) if t.elems.is_empty() => Some(Type::basic("()")),
            syn::Type::Path(p) if p.qself.is_none() => self.lower_path(&p.path, depth),
            _ => None,
        }
    }

    fn sequence(&self, elem: &syn::Type, depth: usize) -> Type {
        Type::Sequence {
            elem: Box::new(self.lower_at(elem, depth).unwrap_or(Type::Invalid)),
        }
    }

    /// Lowers a path used as a type, e.g. the path of a struct expression.
    #[must_use]
    pub fn path_type(&self, path: &syn::Path) -> Option<Type> {
        self.lower_path(path, 0)
    }

    fn lower_path(&self, path: &syn::Path, depth: usize) -> Option<Type> {
        let last = path.segments.last()?;
        let name = last.ident.to_string();

        if path.segments.len() == 1 {
            if self.generics.contains(&name) {
                return Some(Type::TypeParam { name });
            }
            if name == "Self" {
                return self.self_ty.cloned();
            }
            if PRIMITIVES.contains(&name.as_str()) {
                return Some(Type::basic(name));
            }
            match name.as_str() {
                "Box" => return Some(Type::pointer(self.lower_arg(last, 0, depth)?)),
                "Vec" | "VecDeque" => {
                    return Some(Type::Sequence {
                        elem: Box::new(self.lower_arg(last, 0, depth).unwrap_or(Type::Invalid)),
                    })
                }
                "HashMap" | "BTreeMap" => {
                    return Some(Type::Map {
                        key: Box::new(self.lower_arg(last, 0, depth).unwrap_or(Type::Invalid)),
                        value: Box::new(self.lower_arg(last, 1, depth).unwrap_or(Type::Invalid)),
                    })
                }
                _ => {}
            }
        }

        let resolved = self
            .symbols
            .resolve(self.module, &path_segments(path))?;
        match resolved.kind {
            SymbolKind::Struct => Some(Type::aggregate(resolved.module, resolved.name)),
            SymbolKind::Enum => Some(Type::named(resolved.module, resolved.name)),
            SymbolKind::Trait => Some(Type::Interface),
            SymbolKind::Alias => {
                if depth >= MAX_ALIAS_DEPTH {
                    return None;
                }
                let target = self.symbols.alias_target(&resolved.module, &resolved.name)?;
                let target = TypeCx::new(self.symbols, &resolved.module).lower_at(target, depth + 1);
                Some(Type::Alias {
                    name: resolved.name,
                    package: Some(resolved.module.clone()),
                    target: Box::new(target.unwrap_or(Type::Invalid)),
                })
            }
            SymbolKind::Fn => None,
        }
    }

    fn lower_arg(&self, segment: &syn::PathSegment, index: usize, depth: usize) -> Option<Type> {
        let arg = type_arg(segment, index)?;
        self.lower_at(arg, depth)
    }

    /// Lowers a declared return type.
    #[must_use]
    pub fn return_info(&self, output: &ReturnType) -> Option<ReturnInfo> {
        let ReturnType::Type(_, ty) = output else {
            return None;
        };
        if let syn::Type::Path(p) = ty.as_ref() {
            if let Some(last) = p.path.segments.last() {
                if matches!(last.ident.to_string().as_str(), "Result" | "Option") {
                    return Some(ReturnInfo {
                        ty: self.lower(type_arg(last, 0)?)?,
                        fallible: true,
                    });
                }
            }
        }
        Some(ReturnInfo {
            ty: self.lower(ty)?,
            fallible: false,
        })
    }

    /// Lowers the return type of `sig`, declared in this context's module.
    #[must_use]
    pub fn signature_return(&self, sig: &FnSig) -> Option<ReturnInfo> {
        let generics: Vec<String> = self
            .generics
            .iter()
            .chain(&sig.generics)
            .cloned()
            .collect();
        TypeCx {
            generics: &generics,
            ..*self
        }
        .return_info(&sig.output)
    }
}

fn type_arg(segment: &syn::PathSegment, index: usize) -> Option<&syn::Type> {
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args
        .iter()
        .filter_map(|a| match a {
            GenericArgument::Type(t) => Some(t),
            _ => None,
        })
        .nth(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn symbols() -> SymbolTable {
        let file: syn::File = parse_quote! {
            pub struct User { pub name: String }
            pub enum Status { Active }
            pub type Exposed = User;
            pub trait Repo {}
        };
        SymbolTable::build([("crate", &file)])
    }

    #[test]
    fn pointers_and_containers() {
        let t = symbols();
        let cx = TypeCx::new(&t, "crate");
        let user = Type::aggregate("crate", "User");
        let lower = |ty: syn::Type| cx.lower(&ty);

        assert_eq!(lower(parse_quote!(User)), Some(user.clone()));
        assert_eq!(lower(parse_quote!(&mut User)), Some(Type::pointer(user.clone())));
        assert_eq!(lower(parse_quote!(Box<User>)), Some(Type::pointer(user.clone())));
        assert_eq!(
            lower(parse_quote!(Vec<User>)),
            Some(Type::Sequence {
                elem: Box::new(user.clone())
            })
        );
        assert_eq!(
            lower(parse_quote!(&[User])),
            Some(Type::pointer(Type::Sequence {
                elem: Box::new(user)
            }))
        );
        assert_eq!(lower(parse_quote!(dyn Repo)), Some(Type::Interface));
        assert_eq!(lower(parse_quote!(u64)), Some(Type::basic("u64")));
        assert_eq!(lower(parse_quote!(serde_json::Value)), None);
    }

    #[test]
    fn enums_are_named_but_not_aggregate() {
        let t = symbols();
        let cx = TypeCx::new(&t, "crate");
        assert_eq!(
            cx.lower(&parse_quote!(Status)),
            Some(Type::named("crate", "Status"))
        );
    }

    #[test]
    fn aliases_keep_their_own_identity() {
        let t = symbols();
        let cx = TypeCx::new(&t, "crate");
        let Some(Type::Alias { name, target, .. }) = cx.lower(&parse_quote!(Exposed)) else {
            panic!("expected an alias");
        };
        assert_eq!(name, "Exposed");
        assert_eq!(*target, Type::aggregate("crate", "User"));
    }

    #[test]
    fn generics_and_self() {
        let t = symbols();
        let generics = vec!["T".to_string()];
        let user = Type::aggregate("crate", "User");
        let cx = TypeCx {
            generics: &generics,
            self_ty: Some(&user),
            ..TypeCx::new(&t, "crate")
        };
        assert_eq!(
            cx.lower(&parse_quote!(T)),
            Some(Type::TypeParam {
                name: "T".to_string()
            })
        );
        assert_eq!(cx.lower(&parse_quote!(&Self)), Some(Type::pointer(user)));
    }

    #[test]
    fn fallible_returns_are_peeled() {
        let t = symbols();
        let cx = TypeCx::new(&t, "crate");
        let out: ReturnType = parse_quote!(-> Result<User, String>);
        assert_eq!(
            cx.return_info(&out),
            Some(ReturnInfo {
                ty: Type::aggregate("crate", "User"),
                fallible: true
            })
        );
        let plain: ReturnType = parse_quote!(-> Box<User>);
        assert!(!cx.return_info(&plain).unwrap().fallible);
        assert_eq!(cx.return_info(&ReturnType::Default), None);
    }
}
