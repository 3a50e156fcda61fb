//! Crate-wide symbol table and path resolution.
//!
//! Built in two passes over every parsed file: the first records each
//! module's declarations and `use` items, the second resolves `impl` self
//! types so methods can be looked up by the type they belong to.

use crate::module_path::{self, CRATE};
use std::collections::{HashMap, HashSet};
use syn::{GenericParam, Generics, ImplItem, Item, ReturnType, UseTree};

const MAX_RESOLVE_DEPTH: usize = 8;

/// Shape of a struct declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructShape {
    /// `struct S { a: T }`
    Named,
    /// `struct S(T);`
    Tuple,
    /// `struct S;`
    Unit,
}

/// A declared struct.
#[derive(Debug, Clone)]
pub struct StructDef {
    /// Declaration shape.
    pub shape: StructShape,
    /// Field types by name (`"0"`, `"1"`, ... for tuple structs).
    pub fields: HashMap<String, syn::Type>,
    /// Generic parameter names.
    pub generics: Vec<String>,
}

/// A function or method signature.
#[derive(Debug, Clone)]
pub struct FnSig {
    /// Declared return type.
    pub output: ReturnType,
    /// Generic parameter names.
    pub generics: Vec<String>,
}

/// What a resolved path names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// A struct.
    Struct,
    /// An enum or union.
    Enum,
    /// A `type` alias.
    Alias,
    /// A trait.
    Trait,
    /// A free function.
    Fn,
}

/// A path resolved to its declaring module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Declaring module path.
    pub module: String,
    /// Item name.
    pub name: String,
    /// Item kind.
    pub kind: SymbolKind,
}

#[derive(Debug, Default)]
struct ModuleSymbols {
    structs: HashMap<String, StructDef>,
    enums: HashSet<String>,
    aliases: HashMap<String, syn::Type>,
    traits: HashSet<String>,
    fns: HashMap<String, FnSig>,
    children: HashSet<String>,
    uses: HashMap<String, Vec<String>>,
    globs: Vec<Vec<String>>,
}

impl ModuleSymbols {
    fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        if self.structs.contains_key(name) {
            Some(SymbolKind::Struct)
        } else if self.enums.contains(name) {
            Some(SymbolKind::Enum)
        } else if self.aliases.contains_key(name) {
            Some(SymbolKind::Alias)
        } else if self.traits.contains(name) {
            Some(SymbolKind::Trait)
        } else if self.fns.contains_key(name) {
            Some(SymbolKind::Fn)
        } else {
            None
        }
    }
}

struct PendingImpl {
    module: String,
    self_ty: syn::Type,
    methods: Vec<(String, FnSig)>,
}

/// Declarations of every module in the crate.
#[derive(Debug, Default)]
pub struct SymbolTable {
    modules: HashMap<String, ModuleSymbols>,
    methods: HashMap<(String, String), HashMap<String, FnSig>>,
}

impl SymbolTable {
    /// Builds the table from `(module path, parsed file)` pairs.
    #[must_use]
    pub fn build<'a>(files: impl IntoIterator<Item = (&'a str, &'a syn::File)>) -> Self {
        let mut table = Self::default();
        let mut pending = Vec::new();
        for (module, file) in files {
            table.collect_items(module, &file.items, &mut pending);
        }
        for imp in pending {
            let Some(owner) = type_path_segments(&imp.self_ty)
                .and_then(|segs| table.resolve(&imp.module, &segs))
            else {
                continue;
            };
            table
                .methods
                .entry((owner.module, owner.name))
                .or_default()
                .extend(imp.methods);
        }
        table
    }

    fn collect_items(&mut self, module: &str, items: &[Item], pending: &mut Vec<PendingImpl>) {
        self.modules.entry(module.to_string()).or_default();
        if let Some(parent) = module_path::parent(module) {
            if let Some(name) = module.rsplit("::").next() {
                self.modules
                    .entry(parent.to_string())
                    .or_default()
                    .children
                    .insert(name.to_string());
            }
        }

        for item in items {
            match item {
                Item::Struct(s) => {
                    let (shape, fields) = match &s.fields {
                        syn::Fields::Named(named) => (
                            StructShape::Named,
                            named
                                .named
                                .iter()
                                .filter_map(|f| Some((f.ident.as_ref()?.to_string(), f.ty.clone())))
                                .collect(),
                        ),
                        syn::Fields::Unnamed(unnamed) => (
                            StructShape::Tuple,
                            unnamed
                                .unnamed
                                .iter()
                                .enumerate()
                                .map(|(i, f)| (i.to_string(), f.ty.clone()))
                                .collect(),
                        ),
                        syn::Fields::Unit => (StructShape::Unit, HashMap::new()),
                    };
                    self.module_mut(module).structs.insert(
                        s.ident.to_string(),
                        StructDef {
                            shape,
                            fields,
                            generics: generic_names(&s.generics),
                        },
                    );
                }
                Item::Enum(e) => {
                    self.module_mut(module).enums.insert(e.ident.to_string());
                }
                Item::Union(u) => {
                    self.module_mut(module).enums.insert(u.ident.to_string());
                }
                Item::Type(t) => {
                    self.module_mut(module)
                        .aliases
                        .insert(t.ident.to_string(), (*t.ty).clone());
                }
                Item::Trait(t) => {
                    self.module_mut(module).traits.insert(t.ident.to_string());
                }
                Item::Fn(f) => {
                    self.module_mut(module)
                        .fns
                        .insert(f.sig.ident.to_string(), sig_of(&f.sig));
                }
                Item::Use(u) => {
                    let symbols = self.module_mut(module);
                    collect_use(&u.tree, &mut Vec::new(), symbols);
                }
                Item::Impl(imp) => pending.push(PendingImpl {
                    module: module.to_string(),
                    self_ty: (*imp.self_ty).clone(),
                    methods: imp
                        .items
                        .iter()
                        .filter_map(|i| match i {
                            ImplItem::Fn(f) => Some((f.sig.ident.to_string(), sig_of(&f.sig))),
                            _ => None,
                        })
                        .collect(),
                }),
                Item::Mod(m) => {
                    let child = module_path::child(module, &m.ident.to_string());
                    match &m.content {
                        Some((_, inner)) => self.collect_items(&child, inner, pending),
                        None => {
                            self.module_mut(module)
                                .children
                                .insert(m.ident.to_string());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn module_mut(&mut self, module: &str) -> &mut ModuleSymbols {
        self.modules.entry(module.to_string()).or_default()
    }

    /// Struct declared as `name` in `module`.
    #[must_use]
    pub fn struct_def(&self, module: &str, name: &str) -> Option<&StructDef> {
        self.modules.get(module)?.structs.get(name)
    }

    /// Alias target declared as `name` in `module`.
    #[must_use]
    pub fn alias_target(&self, module: &str, name: &str) -> Option<&syn::Type> {
        self.modules.get(module)?.aliases.get(name)
    }

    /// Free function `name` in `module`.
    #[must_use]
    pub fn function(&self, module: &str, name: &str) -> Option<&FnSig> {
        self.modules.get(module)?.fns.get(name)
    }

    /// Method or associated function `method` of the type `module::name`.
    #[must_use]
    pub fn method(&self, module: &str, name: &str, method: &str) -> Option<&FnSig> {
        self.methods
            .get(&(module.to_string(), name.to_string()))?
            .get(method)
    }

    /// Resolves an item path as written inside `module`.
    #[must_use]
    pub fn resolve(&self, module: &str, path: &[String]) -> Option<Resolved> {
        self.resolve_at(module, path, 0)
    }

    fn resolve_at(&self, module: &str, path: &[String], depth: usize) -> Option<Resolved> {
        if depth > MAX_RESOLVE_DEPTH {
            return None;
        }
        let (name, prefix) = path.split_last()?;
        if !prefix.is_empty() {
            let owner = self.resolve_module(module, prefix, depth)?;
            return self.lookup(&owner, name, depth);
        }

        let symbols = self.modules.get(module)?;
        if let Some(found) = self.lookup(module, name, depth) {
            return Some(found);
        }
        symbols.globs.iter().find_map(|glob| {
            let target = self.resolve_module(module, glob, depth + 1)?;
            self.lookup(&target, name, depth + 1)
        })
    }

    /// Finds `name` declared in, or re-exported by, `module`.
    fn lookup(&self, module: &str, name: &str, depth: usize) -> Option<Resolved> {
        let symbols = self.modules.get(module)?;
        if let Some(kind) = symbols.kind_of(name) {
            return Some(Resolved {
                module: module.to_string(),
                name: name.to_string(),
                kind,
            });
        }
        let target = symbols.uses.get(name)?;
        self.resolve_at(module, target, depth + 1)
    }

    /// Resolves a module path as written inside `module`.
    fn resolve_module(&self, module: &str, segments: &[String], depth: usize) -> Option<String> {
        if depth > MAX_RESOLVE_DEPTH {
            return None;
        }
        let (first, rest) = segments.split_first()?;
        let mut current = match first.as_str() {
            CRATE => CRATE.to_string(),
            "self" => module.to_string(),
            "super" => module_path::parent(module)?.to_string(),
            name => {
                let symbols = self.modules.get(module)?;
                if symbols.children.contains(name) {
                    module_path::child(module, name)
                } else if let Some(target) = symbols.uses.get(name) {
                    self.resolve_module(module, target, depth + 1)?
                } else {
                    return None;
                }
            }
        };
        for segment in rest {
            current = match segment.as_str() {
                "super" => module_path::parent(&current)?.to_string(),
                "self" => current,
                name if self.modules.get(&current)?.children.contains(name) => {
                    module_path::child(&current, name)
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

fn collect_use(tree: &UseTree, prefix: &mut Vec<String>, symbols: &mut ModuleSymbols) {
    match tree {
        UseTree::Path(p) => {
            prefix.push(p.ident.to_string());
            collect_use(&p.tree, prefix, symbols);
            prefix.pop();
        }
        UseTree::Name(n) => {
            let name = n.ident.to_string();
            if name == "self" {
                if let Some(last) = prefix.last() {
                    symbols.uses.insert(last.clone(), prefix.clone());
                }
            } else {
                let mut target = prefix.clone();
                target.push(name.clone());
                symbols.uses.insert(name, target);
            }
        }
        UseTree::Rename(r) => {
            let mut target = prefix.clone();
            if r.ident != "self" {
                target.push(r.ident.to_string());
            }
            symbols.uses.insert(r.rename.to_string(), target);
        }
        UseTree::Glob(_) => symbols.globs.push(prefix.clone()),
        UseTree::Group(g) => {
            for tree in &g.items {
                collect_use(tree, prefix, symbols);
            }
        }
    }
}

fn sig_of(sig: &syn::Signature) -> FnSig {
    FnSig {
        output: sig.output.clone(),
        generics: generic_names(&sig.generics),
    }
}

/// Names of the type parameters in `generics`.
#[must_use]
pub fn generic_names(generics: &Generics) -> Vec<String> {
    generics
        .params
        .iter()
        .filter_map(|p| match p {
            GenericParam::Type(t) => Some(t.ident.to_string()),
            _ => None,
        })
        .collect()
}

/// Path segments of a plain path type, generics dropped.
#[must_use]
pub fn type_path_segments(ty: &syn::Type) -> Option<Vec<String>> {
    match ty {
        syn::Type::Path(p) if p.qself.is_none() => Some(path_segments(&p.path)),
        syn::Type::Paren(p) => type_path_segments(&p.elem),
        syn::Type::Group(g) => type_path_segments(&g.elem),
        _ => None,
    }
}

/// Identifiers of a path, generics dropped.
#[must_use]
pub fn path_segments(path: &syn::Path) -> Vec<String> {
    path.segments.iter().map(|s| s.ident.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(files: &[(&str, &str)]) -> SymbolTable {
        let parsed: Vec<(&str, syn::File)> = files
            .iter()
            .map(|(m, src)| (*m, syn::parse_file(src).unwrap()))
            .collect();
        SymbolTable::build(parsed.iter().map(|(m, f)| (*m, f)))
    }

    fn segs(path: &str) -> Vec<String> {
        path.split("::").map(str::to_string).collect()
    }

    fn resolved(t: &SymbolTable, module: &str, path: &str) -> Option<(String, SymbolKind)> {
        t.resolve(module, &segs(path)).map(|r| (r.module, r.kind))
    }

    const LIB: &str = "pub mod domain; pub mod app;";
    const DOMAIN: &str = r"
        pub struct User { pub id: u64, pub name: String }
        pub struct Id(u64);
        pub enum Status { Active }
        pub type Alias = User;
        impl User { pub fn new() -> Self { todo!() } }
        pub mod nested { pub struct Inner; }
    ";

    #[test]
    fn resolves_local_absolute_and_relative_paths() {
        let t = table(&[("crate", LIB), ("crate::domain", DOMAIN), ("crate::app", "")]);
        let domain = Some(("crate::domain".to_string(), SymbolKind::Struct));
        assert_eq!(resolved(&t, "crate::domain", "User"), domain);
        assert_eq!(resolved(&t, "crate::app", "crate::domain::User"), domain);
        assert_eq!(resolved(&t, "crate::app", "super::domain::User"), domain);
        assert_eq!(resolved(&t, "crate", "domain::User"), domain);
        assert_eq!(
            resolved(&t, "crate::app", "crate::domain::nested::Inner"),
            Some(("crate::domain::nested".to_string(), SymbolKind::Struct))
        );
        assert_eq!(
            resolved(&t, "crate::domain", "Status").map(|r| r.1),
            Some(SymbolKind::Enum)
        );
        assert_eq!(
            resolved(&t, "crate::domain", "Alias").map(|r| r.1),
            Some(SymbolKind::Alias)
        );
    }

    #[test]
    fn resolves_through_use_items() {
        let app = r"
            use crate::domain::{self, User as Member};
            use super::domain::nested::*;
        ";
        let t = table(&[("crate", LIB), ("crate::domain", DOMAIN), ("crate::app", app)]);
        let user = Some(("crate::domain".to_string(), SymbolKind::Struct));
        assert_eq!(resolved(&t, "crate::app", "Member"), user);
        assert_eq!(resolved(&t, "crate::app", "domain::User"), user);
        assert_eq!(
            resolved(&t, "crate::app", "Inner").map(|r| r.0),
            Some("crate::domain::nested".to_string())
        );
        assert_eq!(resolved(&t, "crate::app", "User"), None);
    }

    #[test]
    fn inline_modules_see_parent_through_super_glob() {
        let src = r"
            pub struct Order { pub total: u32 }
            #[cfg(test)]
            mod tests { use super::*; }
        ";
        let t = table(&[("crate", src)]);
        assert_eq!(
            resolved(&t, "crate::tests", "Order"),
            Some(("crate".to_string(), SymbolKind::Struct))
        );
    }

    #[test]
    fn methods_are_keyed_by_resolved_owner() {
        let t = table(&[("crate", LIB), ("crate::domain", DOMAIN)]);
        assert!(t.method("crate::domain", "User", "new").is_some());
        assert!(t.method("crate::domain", "User", "missing").is_none());
        let id = t.struct_def("crate::domain", "Id").unwrap();
        assert_eq!(id.shape, StructShape::Tuple);
        assert!(id.fields.contains_key("0"));
    }

    #[test]
    fn external_paths_do_not_resolve() {
        let t = table(&[("crate", "use std::collections::HashMap;")]);
        assert_eq!(resolved(&t, "crate", "HashMap"), None);
        assert_eq!(resolved(&t, "crate", "serde::Value"), None);
    }
}
