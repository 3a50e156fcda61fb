//! Lowering of parsed Rust files into the typed tree IR.
//!
//! Types are inferred locally: parameters, annotated `let`s, literals,
//! field accesses on known structs, and calls whose declared return type
//! names a crate type. Anything else is left untyped and is therefore
//! invisible to the engine.

use crate::comments;
use crate::symbols::{generic_names, path_segments, type_path_segments, StructShape, SymbolKind, SymbolTable};
use crate::types::{ReturnInfo, TypeCx};
use goseal_core::ir::{self, Expr, ExprKind, FuncDecl, Position, Receiver, SourceFile, Stmt, Type, ValueDecl};
use proc_macro2::Span;
use std::collections::HashMap;
use std::path::Path;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{BinOp, FnArg, ImplItem, Member, Pat, Token, TraitItem, UnOp};

/// Lowers one parsed file declared as `module`.
#[must_use]
pub fn lower_file(
    symbols: &SymbolTable,
    module: &str,
    path: &Path,
    source: &str,
    file: &syn::File,
) -> SourceFile {
    let mut lowerer = Lowerer::new(symbols, module);
    lowerer.items(&file.items);
    SourceFile {
        path: path.to_path_buf(),
        comments: comments::extract(source),
        items: lowerer.out,
    }
}

fn position(span: Span) -> Position {
    let start = span.start();
    Position::new(start.line, start.column + 1)
}

fn member_name(member: &Member) -> String {
    match member {
        Member::Named(ident) => ident.to_string(),
        Member::Unnamed(index) => index.index.to_string(),
    }
}

fn receiver_name(self_ty: &syn::Type) -> String {
    type_path_segments(self_ty)
        .and_then(|segments| segments.last().cloned())
        .unwrap_or_else(|| quote::quote!(#self_ty).to_string())
}

/// Strips pointers, following aliases to their targets.
fn pointee(ty: &Type) -> &Type {
    match ty {
        Type::Pointer { elem } => pointee(elem),
        Type::Alias { target, .. } => pointee(target),
        other => other,
    }
}

fn element_type(ty: &Type) -> Option<Type> {
    match ty {
        Type::Pointer { elem } => element_type(elem).map(Type::pointer),
        Type::Sequence { elem } => Some((**elem).clone()),
        _ => None,
    }
}

fn index_type(ty: &Type) -> Option<Type> {
    match pointee(ty) {
        Type::Sequence { elem } => Some((**elem).clone()),
        Type::Map { value, .. } => Some((**value).clone()),
        _ => None,
    }
}

fn is_compound_assign(op: &BinOp) -> bool {
    matches!(
        op,
        BinOp::AddAssign(_)
            | BinOp::SubAssign(_)
            | BinOp::MulAssign(_)
            | BinOp::DivAssign(_)
            | BinOp::RemAssign(_)
            | BinOp::BitXorAssign(_)
            | BinOp::BitAndAssign(_)
            | BinOp::BitOrAssign(_)
            | BinOp::ShlAssign(_)
            | BinOp::ShrAssign(_)
    )
}

fn is_comparison(op: &BinOp) -> bool {
    matches!(
        op,
        BinOp::Eq(_)
            | BinOp::Ne(_)
            | BinOp::Lt(_)
            | BinOp::Le(_)
            | BinOp::Gt(_)
            | BinOp::Ge(_)
            | BinOp::And(_)
            | BinOp::Or(_)
    )
}

fn literal_type(lit: &syn::Lit) -> Option<Type> {
    match lit {
        syn::Lit::Str(_) => Some(Type::pointer(Type::basic("str"))),
        syn::Lit::Bool(_) => Some(Type::basic("bool")),
        syn::Lit::Char(_) => Some(Type::basic("char")),
        syn::Lit::Int(i) => Some(Type::basic(match i.suffix() {
            "" => "i32",
            suffix => suffix,
        })),
        syn::Lit::Float(f) => Some(Type::basic(match f.suffix() {
            "" => "f64",
            suffix => suffix,
        })),
        _ => None,
    }
}

/// Expression plus the success type it carries when it is a `Result` or
/// `Option` produced by a known call.
struct Lowered {
    expr: Expr,
    wrapped: Option<Type>,
}

impl From<Expr> for Lowered {
    fn from(expr: Expr) -> Self {
        Self {
            expr,
            wrapped: None,
        }
    }
}

struct Lowerer<'a> {
    symbols: &'a SymbolTable,
    module: String,
    generics: Vec<String>,
    self_ty: Option<Type>,
    scopes: Vec<HashMap<String, Option<Type>>>,
    out: Vec<ir::Item>,
    hoisted: Vec<ir::Item>,
}

impl<'a> Lowerer<'a> {
    fn new(symbols: &'a SymbolTable, module: &str) -> Self {
        Self {
            symbols,
            module: module.to_string(),
            generics: Vec::new(),
            self_ty: None,
            scopes: Vec::new(),
            out: Vec::new(),
            hoisted: Vec::new(),
        }
    }

    fn cx(&self) -> TypeCx<'_> {
        TypeCx {
            symbols: self.symbols,
            module: &self.module,
            generics: &self.generics,
            self_ty: self.self_ty.as_ref(),
        }
    }

    // ── Scopes ──

    fn bind(&mut self, name: String, ty: Option<Type>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, ty);
        }
    }

    fn local(&self, name: &str) -> Option<&Option<Type>> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn bind_pat(&mut self, pat: &Pat, ty: Option<Type>) {
        match pat {
            Pat::Ident(p) => {
                let ty = if p.by_ref.is_some() { ty.map(Type::pointer) } else { ty };
                self.bind(p.ident.to_string(), ty);
                if let Some((_, sub)) = &p.subpat {
                    self.bind_pat(sub, None);
                }
            }
            Pat::Type(p) => {
                let ty = self.cx().lower(&p.ty);
                self.bind_pat(&p.pat, ty);
            }
            Pat::Reference(p) => {
                let ty = ty.map(|t| pointee(&t).clone());
                self.bind_pat(&p.pat, ty);
            }
            Pat::Paren(p) => self.bind_pat(&p.pat, ty),
            Pat::Or(p) => {
                for case in &p.cases {
                    self.bind_pat(case, ty.clone());
                }
            }
            Pat::Struct(p) => {
                let owner = self.cx().path_type(&p.path);
                for field in &p.fields {
                    let ty = self.field_type(owner.as_ref(), &member_name(&field.member));
                    self.bind_pat(&field.pat, ty);
                }
            }
            Pat::Slice(p) => {
                let elem = ty.as_ref().and_then(element_type);
                for pat in &p.elems {
                    self.bind_pat(pat, elem.clone());
                }
            }
            Pat::Tuple(p) => {
                for pat in &p.elems {
                    self.bind_pat(pat, None);
                }
            }
            Pat::TupleStruct(p) => {
                for pat in &p.elems {
                    self.bind_pat(pat, None);
                }
            }
            _ => {}
        }
    }

    /// Binds a pattern matched against `scrutinee`, seeing through
    /// `Some(x)` and `Ok(x)`.
    fn bind_scrutinee(&mut self, pat: &Pat, scrutinee: &Lowered) {
        if let Pat::TupleStruct(p) = pat {
            let unwraps = p
                .path
                .segments
                .last()
                .is_some_and(|s| s.ident == "Some" || s.ident == "Ok");
            if unwraps && p.elems.len() == 1 {
                if let Some(inner) = p.elems.first() {
                    self.bind_pat(inner, scrutinee.wrapped.clone());
                    return;
                }
            }
        }
        self.bind_pat(pat, scrutinee.expr.ty.clone());
    }

    // ── Items ──

    fn items(&mut self, items: &[syn::Item]) {
        for item in items {
            self.item(item);
            self.out.append(&mut self.hoisted);
        }
    }

    fn item(&mut self, item: &syn::Item) {
        match item {
            syn::Item::Fn(f) => {
                let decl = self.function(&f.sig, &f.block, None);
                self.out.push(ir::Item::Func(decl));
            }
            syn::Item::Impl(imp) => self.impl_block(imp),
            syn::Item::Trait(t) => self.trait_block(t),
            syn::Item::Const(c) => self.value(&c.ident, &c.ty, &c.expr),
            syn::Item::Static(s) => self.value(&s.ident, &s.ty, &s.expr),
            syn::Item::Mod(m) => {
                if let Some((_, inner)) = &m.content {
                    let child = crate::module_path::child(&self.module, &m.ident.to_string());
                    let outer = std::mem::replace(&mut self.module, child);
                    self.items(inner);
                    self.module = outer;
                }
            }
            _ => {}
        }
    }

    /// Lowers an item declared inside a function body as a top-level item.
    fn nested_item(&mut self, item: &syn::Item) {
        let scopes = std::mem::take(&mut self.scopes);
        let outer = std::mem::take(&mut self.out);
        self.item(item);
        let nested = std::mem::replace(&mut self.out, outer);
        self.hoisted.extend(nested);
        self.scopes = scopes;
    }

    fn impl_block(&mut self, imp: &syn::ItemImpl) {
        let saved = self.generics.len();
        self.generics.extend(generic_names(&imp.generics));
        let self_ty = self.cx().lower(&imp.self_ty);
        let outer_self = std::mem::replace(&mut self.self_ty, self_ty);
        let owner = receiver_name(&imp.self_ty);

        for item in &imp.items {
            match item {
                ImplItem::Fn(f) => {
                    let decl = self.function(&f.sig, &f.block, Some(&owner));
                    self.out.push(ir::Item::Func(decl));
                }
                ImplItem::Const(c) => self.value(&c.ident, &c.ty, &c.expr),
                _ => {}
            }
        }

        self.self_ty = outer_self;
        self.generics.truncate(saved);
    }

    fn trait_block(&mut self, t: &syn::ItemTrait) {
        let saved = self.generics.len();
        self.generics.extend(generic_names(&t.generics));
        let outer_self = std::mem::replace(&mut self.self_ty, Some(Type::Interface));
        let owner = t.ident.to_string();

        for item in &t.items {
            if let TraitItem::Fn(f) = item {
                if let Some(block) = &f.default {
                    let decl = self.function(&f.sig, block, Some(&owner));
                    self.out.push(ir::Item::Func(decl));
                }
            }
        }

        self.self_ty = outer_self;
        self.generics.truncate(saved);
    }

    fn function(&mut self, sig: &syn::Signature, block: &syn::Block, owner: Option<&str>) -> FuncDecl {
        let saved = self.generics.len();
        self.generics.extend(generic_names(&sig.generics));
        self.scopes.push(HashMap::new());

        for input in &sig.inputs {
            match input {
                FnArg::Receiver(r) => {
                    let ty = self.cx().lower(&r.ty);
                    self.bind("self".to_string(), ty);
                }
                FnArg::Typed(p) => {
                    let ty = self.cx().lower(&p.ty);
                    self.bind_pat(&p.pat, ty);
                }
            }
        }
        let body = self.block(block);

        self.scopes.pop();
        self.generics.truncate(saved);

        FuncDecl {
            name: sig.ident.to_string(),
            receiver: owner.filter(|_| sig.receiver().is_some()).map(|name| Receiver {
                type_name: name.to_string(),
            }),
            body,
            position: position(sig.ident.span()),
        }
    }

    fn value(&mut self, ident: &syn::Ident, ty: &syn::Type, init: &syn::Expr) {
        let ty = self.cx().lower(ty);
        let init = self.expr(init);
        self.out.push(ir::Item::Value(ValueDecl {
            name: ident.to_string(),
            ty,
            init: Some(init),
            position: position(ident.span()),
        }));
    }

    // ── Statements ──

    fn block(&mut self, block: &syn::Block) -> Vec<Stmt> {
        self.scopes.push(HashMap::new());
        let mut out = Vec::new();
        for stmt in &block.stmts {
            self.stmt(stmt, &mut out);
        }
        self.scopes.pop();
        out
    }

    fn stmt(&mut self, stmt: &syn::Stmt, out: &mut Vec<Stmt>) {
        match stmt {
            syn::Stmt::Local(local) => self.let_stmt(local, out),
            syn::Stmt::Item(item) => self.nested_item(item),
            syn::Stmt::Expr(e, _) => out.push(self.stmt_expr(e)),
            syn::Stmt::Macro(m) => {
                let children = self.macro_args(&m.mac);
                out.push(Stmt::Expr(Expr::new(
                    ExprKind::Other { children },
                    position(m.span()),
                )));
            }
        }
    }

    fn let_stmt(&mut self, local: &syn::Local, out: &mut Vec<Stmt>) {
        let (pat, declared) = match &local.pat {
            Pat::Type(p) => (&*p.pat, self.cx().lower(&p.ty)),
            other => (other, None),
        };
        let init = local.init.as_ref().map(|init| self.lower(&init.expr));
        let diverge = local
            .init
            .as_ref()
            .and_then(|init| init.diverge.as_ref())
            .map(|(_, e)| self.stmt_expr(e));

        match (&declared, &init) {
            (None, Some(init)) => self.bind_scrutinee(pat, init),
            _ => self.bind_pat(pat, declared.clone()),
        }

        let name = match pat {
            Pat::Ident(p) => p.ident.to_string(),
            _ => "_".to_string(),
        };
        out.push(Stmt::Var(ValueDecl {
            name,
            ty: declared,
            init: init.map(|l| l.expr),
            position: position(local.span()),
        }));
        out.extend(diverge);
    }

    /// Lowers an expression that stands in statement position.
    fn stmt_expr(&mut self, e: &syn::Expr) -> Stmt {
        match e {
            syn::Expr::Assign(a) => self.assign(&a.left, &a.right, e.span()),
            syn::Expr::Binary(b) if is_compound_assign(&b.op) => {
                self.assign(&b.left, &b.right, e.span())
            }
            syn::Expr::If(i) => self.if_stmt(i),
            syn::Expr::While(w) => {
                self.scopes.push(HashMap::new());
                let cond = self.expr(&w.cond);
                let body = self.block(&w.body);
                self.scopes.pop();
                Stmt::Loop {
                    header: vec![cond],
                    body,
                }
            }
            syn::Expr::ForLoop(f) => {
                let iter = self.expr(&f.expr);
                self.scopes.push(HashMap::new());
                let elem = iter.ty.as_ref().and_then(element_type);
                self.bind_pat(&f.pat, elem);
                let body = self.block(&f.body);
                self.scopes.pop();
                Stmt::Loop {
                    header: vec![iter],
                    body,
                }
            }
            syn::Expr::Loop(l) => Stmt::Loop {
                header: Vec::new(),
                body: self.block(&l.body),
            },
            syn::Expr::Block(b) if b.label.is_none() => Stmt::Block {
                body: self.block(&b.block),
            },
            syn::Expr::Unsafe(u) => Stmt::Block {
                body: self.block(&u.block),
            },
            syn::Expr::Return(r) => Stmt::Return {
                values: r.expr.iter().map(|v| self.expr(v)).collect(),
            },
            other => Stmt::Expr(self.expr(other)),
        }
    }

    fn assign(&mut self, left: &syn::Expr, right: &syn::Expr, span: Span) -> Stmt {
        let mut targets = Vec::new();
        self.assign_targets(left, &mut targets);
        let values = match (left, right) {
            (syn::Expr::Tuple(l), syn::Expr::Tuple(r))
                if l.elems.len() == r.elems.len() && l.elems.len() > 1 =>
            {
                r.elems.iter().map(|e| self.expr(e)).collect()
            }
            (_, other) => vec![self.expr(other)],
        };
        Stmt::assign(targets, values, position(span))
    }

    /// Collects the places a destructuring assignment writes to.
    ///
    /// Struct, tuple-struct and slice patterns on the left are not
    /// literals; only their leaf places become targets.
    fn assign_targets(&mut self, left: &syn::Expr, out: &mut Vec<Expr>) {
        match left {
            syn::Expr::Tuple(t) => t.elems.iter().for_each(|e| self.assign_targets(e, out)),
            syn::Expr::Array(a) => a.elems.iter().for_each(|e| self.assign_targets(e, out)),
            syn::Expr::Paren(p) => self.assign_targets(&p.expr, out),
            syn::Expr::Struct(s) => s.fields.iter().for_each(|f| self.assign_targets(&f.expr, out)),
            syn::Expr::Call(c) => c.args.iter().for_each(|e| self.assign_targets(e, out)),
            syn::Expr::Infer(_) | syn::Expr::Range(_) => {}
            syn::Expr::Path(p) if p.qself.is_none() && is_unit_pattern(&p.path) => {}
            other => out.push(self.expr(other)),
        }
    }

    fn if_stmt(&mut self, i: &syn::ExprIf) -> Stmt {
        self.scopes.push(HashMap::new());
        let cond = self.expr(&i.cond);
        let then_branch = self.block(&i.then_branch);
        self.scopes.pop();

        let else_branch = match &i.else_branch {
            Some((_, e)) => match e.as_ref() {
                syn::Expr::Block(b) => self.block(&b.block),
                other => vec![self.stmt_expr(other)],
            },
            None => Vec::new(),
        };
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        }
    }

    // ── Expressions ──

    fn expr(&mut self, e: &syn::Expr) -> Expr {
        self.lower(e).expr
    }

    fn exprs<'e>(&mut self, exprs: impl IntoIterator<Item = &'e syn::Expr>) -> Vec<Expr> {
        exprs.into_iter().map(|e| self.expr(e)).collect()
    }

    fn other(children: Vec<Expr>, pos: Position) -> Expr {
        Expr::new(ExprKind::Other { children }, pos)
    }

    #[allow(clippy::too_many_lines)]
    fn lower(&mut self, e: &syn::Expr) -> Lowered {
        let pos = position(e.span());
        match e {
            syn::Expr::Struct(s) => self.struct_literal(s, pos).into(),
            syn::Expr::Reference(r) => {
                let operand = self.expr(&r.expr);
                let mut expr = Expr::address_of(operand);
                expr.position = pos;
                expr.into()
            }
            syn::Expr::Unary(u) => {
                let operand = self.lower(&u.expr);
                match u.op {
                    UnOp::Deref(_) => {
                        let ty = match operand.expr.ty.as_ref() {
                            Some(Type::Pointer { elem }) => Some((**elem).clone()),
                            _ => None,
                        };
                        Expr::new(
                            ExprKind::Deref {
                                operand: Box::new(operand.expr),
                            },
                            pos,
                        )
                        .with_type(ty)
                        .into()
                    }
                    _ => {
                        let ty = operand.expr.ty.clone().filter(|t| matches!(t, Type::Basic { .. }));
                        Self::other(vec![operand.expr], pos).with_type(ty).into()
                    }
                }
            }
            syn::Expr::Field(f) => {
                let base = self.expr(&f.base);
                let name = member_name(&f.member);
                let ty = self.field_type(base.ty.as_ref(), &name);
                let mut expr = Expr::field(base, name).with_type(ty);
                expr.position = pos;
                expr.into()
            }
            syn::Expr::Assign(_)
            | syn::Expr::If(_)
            | syn::Expr::While(_)
            | syn::Expr::ForLoop(_)
            | syn::Expr::Loop(_)
            | syn::Expr::Return(_) => {
                let body = vec![self.stmt_expr(e)];
                Expr::new(ExprKind::Block { body }, pos).into()
            }
            syn::Expr::Binary(b) if is_compound_assign(&b.op) => {
                let body = vec![self.stmt_expr(e)];
                Expr::new(ExprKind::Block { body }, pos).into()
            }
            syn::Expr::Binary(b) => {
                let left = self.expr(&b.left);
                let right = self.expr(&b.right);
                let ty = if is_comparison(&b.op) {
                    Some(Type::basic("bool"))
                } else {
                    left.ty.clone().filter(|t| matches!(t, Type::Basic { .. }))
                };
                Self::other(vec![left, right], pos).with_type(ty).into()
            }
            syn::Expr::Block(b) => self.block_expr(&b.block, pos),
            syn::Expr::Unsafe(u) => self.block_expr(&u.block, pos),
            syn::Expr::Const(c) => self.block_expr(&c.block, pos),
            syn::Expr::Async(a) => self.block_expr(&a.block, pos),
            syn::Expr::TryBlock(t) => self.block_expr(&t.block, pos),
            syn::Expr::Call(c) => self.call(c, pos),
            syn::Expr::MethodCall(m) => self.method_call(m, pos),
            syn::Expr::Path(p) if p.qself.is_none() => self.path_expr(&p.path, pos),
            syn::Expr::Closure(c) => {
                self.scopes.push(HashMap::new());
                for input in &c.inputs {
                    self.bind_pat(input, None);
                }
                let body = match c.body.as_ref() {
                    syn::Expr::Block(b) if b.label.is_none() => self.block(&b.block),
                    other => vec![self.stmt_expr(other)],
                };
                self.scopes.pop();
                Expr::new(ExprKind::Closure { body }, pos).into()
            }
            syn::Expr::Match(m) => {
                let scrutinee = self.lower(&m.expr);
                let mut children = Vec::new();
                for arm in &m.arms {
                    self.scopes.push(HashMap::new());
                    self.bind_scrutinee(&arm.pat, &scrutinee);
                    if let Some((_, guard)) = &arm.guard {
                        children.push(self.expr(guard));
                    }
                    children.push(self.expr(&arm.body));
                    self.scopes.pop();
                }
                children.insert(0, scrutinee.expr);
                Self::other(children, pos).into()
            }
            syn::Expr::Let(l) => {
                let scrutinee = self.lower(&l.expr);
                self.bind_scrutinee(&l.pat, &scrutinee);
                scrutinee
            }
            syn::Expr::Try(t) => {
                let inner = self.lower(&t.expr);
                let ty = inner.wrapped;
                Self::other(vec![inner.expr], pos).with_type(ty).into()
            }
            syn::Expr::Await(a) => self.lower(&a.base),
            syn::Expr::Paren(p) => self.lower(&p.expr),
            syn::Expr::Group(g) => self.lower(&g.expr),
            syn::Expr::Index(i) => {
                let base = self.expr(&i.expr);
                let index = self.expr(&i.index);
                let ty = base.ty.as_ref().and_then(index_type);
                Self::other(vec![base, index], pos).with_type(ty).into()
            }
            syn::Expr::Cast(c) => {
                let inner = self.expr(&c.expr);
                let ty = self.cx().lower(&c.ty);
                Self::other(vec![inner], pos).with_type(ty).into()
            }
            syn::Expr::Array(a) => {
                let elems = self.exprs(&a.elems);
                let ty = elems.first().map(|first| Type::Sequence {
                    elem: Box::new(first.ty.clone().unwrap_or(Type::Invalid)),
                });
                Self::other(elems, pos).with_type(ty).into()
            }
            syn::Expr::Tuple(t) => Self::other(self.exprs(&t.elems), pos).into(),
            syn::Expr::Repeat(r) => Self::other(vec![self.expr(&r.expr)], pos).into(),
            syn::Expr::Range(r) => {
                let children = self.exprs(r.start.iter().chain(&r.end).map(|e| &**e));
                Self::other(children, pos).into()
            }
            syn::Expr::Break(b) => Self::other(self.exprs(b.expr.iter().map(|e| &**e)), pos).into(),
            syn::Expr::Macro(m) => {
                let children = self.macro_args(&m.mac);
                let ty = if macro_name(&m.mac).as_deref() == Some("vec") {
                    children.first().map(|first| Type::Sequence {
                        elem: Box::new(first.ty.clone().unwrap_or(Type::Invalid)),
                    })
                } else {
                    None
                };
                Self::other(children, pos).with_type(ty).into()
            }
            syn::Expr::Lit(l) => {
                let lit = &l.lit;
                Expr::new(
                    ExprKind::Ident {
                        name: quote::quote!(#lit).to_string(),
                    },
                    pos,
                )
                .with_type(literal_type(lit))
                .into()
            }
            _ => Self::other(Vec::new(), pos).into(),
        }
    }

    fn block_expr(&mut self, block: &syn::Block, pos: Position) -> Lowered {
        let body = self.block(block);
        let tail = matches!(block.stmts.last(), Some(syn::Stmt::Expr(_, None)));
        let ty = match body.last() {
            Some(Stmt::Expr(e)) if tail => e.ty.clone(),
            _ => None,
        };
        Expr::new(ExprKind::Block { body }, pos).with_type(ty).into()
    }

    fn struct_literal(&mut self, s: &syn::ExprStruct, pos: Position) -> Expr {
        let ty = if s.qself.is_none() {
            self.cx().path_type(&s.path)
        } else {
            None
        };
        let mut elements = Vec::with_capacity(s.fields.len());
        for field in &s.fields {
            let key = Expr::new(
                ExprKind::Ident {
                    name: member_name(&field.member),
                },
                position(field.member.span()),
            );
            let value = self.expr(&field.expr);
            elements.push(Expr::key_value(key, value));
        }
        if let Some(rest) = &s.rest {
            elements.push(self.expr(rest));
        }
        Expr::new(ExprKind::Literal { elements }, pos).with_type(ty)
    }

    fn path_expr(&mut self, path: &syn::Path, pos: Position) -> Lowered {
        if let Some(ident) = path.get_ident() {
            if let Some(ty) = self.local(&ident.to_string()) {
                return Expr::new(
                    ExprKind::Ident {
                        name: ident.to_string(),
                    },
                    pos,
                )
                .with_type(ty.clone())
                .into();
            }
        }
        if let Some(ty) = self.struct_ctor(path, StructShape::Unit) {
            return Expr::literal(ty, Vec::new(), pos).into();
        }
        Expr::new(
            ExprKind::Ident {
                name: path_segments(path).join("::"),
            },
            pos,
        )
        .into()
    }

    fn call(&mut self, c: &syn::ExprCall, pos: Position) -> Lowered {
        let path = match c.func.as_ref() {
            syn::Expr::Path(p) if p.qself.is_none() => Some(&p.path),
            _ => None,
        };
        if let Some(ty) = path.and_then(|p| self.struct_ctor(p, StructShape::Tuple)) {
            let elements = self.exprs(&c.args);
            return Expr::literal(ty, elements, pos).into();
        }

        let callee = self.expr(&c.func);
        let args = self.exprs(&c.args);
        let (ty, wrapped) = match path {
            Some(p) => self.call_result(p, &args),
            None => (None, None),
        };
        Lowered {
            expr: Expr::new(
                ExprKind::Call {
                    callee: Box::new(callee),
                    args,
                },
                pos,
            )
            .with_type(ty),
            wrapped,
        }
    }

    fn call_result(&self, path: &syn::Path, args: &[Expr]) -> (Option<Type>, Option<Type>) {
        let segments = path_segments(path);
        let first_arg = || args.first().and_then(|a| a.ty.clone());
        match segments.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["Box", "new"] => return (first_arg().map(Type::pointer), None),
            ["Some"] | ["Ok"] => return (None, first_arg()),
            _ => {}
        }

        let info = match segments.split_last() {
            Some((method, owner)) if !owner.is_empty() => self
                .owner_type(owner)
                .and_then(|owner| self.method_return(&owner, method)),
            _ => self.function_return(&segments),
        };
        split_return(info)
    }

    fn method_call(&mut self, m: &syn::ExprMethodCall, pos: Position) -> Lowered {
        let receiver = self.lower(&m.receiver);
        let args = self.exprs(&m.args);
        let method = m.method.to_string();

        let (ty, wrapped) = match method.as_str() {
            "unwrap" | "expect" | "unwrap_or" | "unwrap_or_default" | "unwrap_or_else" => {
                (receiver.wrapped.clone(), None)
            }
            "clone" | "to_owned" => (
                receiver.expr.ty.as_ref().map(|t| pointee(t).clone()),
                receiver.wrapped.clone(),
            ),
            _ => split_return(
                receiver
                    .expr
                    .ty
                    .as_ref()
                    .and_then(|owner| self.method_return(owner, &method)),
            ),
        };

        let callee = Expr::field(receiver.expr, method);
        Lowered {
            expr: Expr::new(
                ExprKind::Call {
                    callee: Box::new(callee),
                    args,
                },
                pos,
            )
            .with_type(ty),
            wrapped,
        }
    }

    fn macro_args(&mut self, mac: &syn::Macro) -> Vec<Expr> {
        let Ok(args) = mac.parse_body_with(Punctuated::<syn::Expr, Token![,]>::parse_terminated)
        else {
            return Vec::new();
        };
        // Everything after the scrutinee is a pattern.
        let take = match macro_name(mac).as_deref() {
            Some("matches" | "assert_matches" | "debug_assert_matches") => 1,
            _ => args.len(),
        };
        self.exprs(args.iter().take(take))
    }

    // ── Type queries ──

    fn owner_type(&self, segments: &[String]) -> Option<Type> {
        if segments.len() == 1 && segments[0] == "Self" {
            return self.self_ty.clone();
        }
        let resolved = self.symbols.resolve(&self.module, segments)?;
        match resolved.kind {
            SymbolKind::Struct => Some(Type::aggregate(resolved.module, resolved.name)),
            SymbolKind::Enum => Some(Type::named(resolved.module, resolved.name)),
            _ => None,
        }
    }

    fn method_return(&self, owner: &Type, method: &str) -> Option<ReturnInfo> {
        let owner = pointee(owner);
        let Type::Named(named) = owner else {
            return None;
        };
        let package = named.package.as_deref()?;
        let sig = self.symbols.method(package, &named.name, method)?;
        let generics = self
            .symbols
            .struct_def(package, &named.name)
            .map(|def| def.generics.clone())
            .unwrap_or_default();
        TypeCx {
            symbols: self.symbols,
            module: package,
            generics: &generics,
            self_ty: Some(owner),
        }
        .signature_return(sig)
    }

    fn function_return(&self, segments: &[String]) -> Option<ReturnInfo> {
        let resolved = self.symbols.resolve(&self.module, segments)?;
        if resolved.kind != SymbolKind::Fn {
            return None;
        }
        let sig = self.symbols.function(&resolved.module, &resolved.name)?;
        TypeCx::new(self.symbols, &resolved.module).signature_return(sig)
    }

    fn field_type(&self, base: Option<&Type>, field: &str) -> Option<Type> {
        let Type::Named(named) = pointee(base?) else {
            return None;
        };
        if !named.aggregate {
            return None;
        }
        let package = named.package.as_deref()?;
        let def = self.symbols.struct_def(package, &named.name)?;
        let ty = def.fields.get(field)?;
        TypeCx {
            symbols: self.symbols,
            module: package,
            generics: &def.generics,
            self_ty: None,
        }
        .lower(ty)
    }

    /// Type of the struct `path` constructs when used as a tuple or unit
    /// struct expression of the given shape.
    fn struct_ctor(&self, path: &syn::Path, shape: StructShape) -> Option<Type> {
        let ty = self.cx().path_type(path)?;
        let Type::Named(named) = &ty else {
            return None;
        };
        let def = self
            .symbols
            .struct_def(named.package.as_deref()?, &named.name)?;
        (def.shape == shape).then_some(ty)
    }
}

/// Last path segment of a macro, so `std::matches!` and `matches!` agree.
fn macro_name(mac: &syn::Macro) -> Option<String> {
    mac.path.segments.last().map(|s| s.ident.to_string())
}

/// A path on the left of `=` that names a unit struct or unit variant
/// rather than a place, e.g. `Marker = m;`.
fn is_unit_pattern(path: &syn::Path) -> bool {
    path.segments
        .last()
        .and_then(|s| s.ident.to_string().chars().next())
        .is_some_and(char::is_uppercase)
}

fn split_return(info: Option<ReturnInfo>) -> (Option<Type>, Option<Type>) {
    match info {
        Some(ReturnInfo { ty, fallible: true }) => (None, Some(ty)),
        Some(ReturnInfo { ty, fallible: false }) => (Some(ty), None),
        None => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = r"
        pub struct User { pub id: u64, pub name: String, pub address: Address }
        pub struct Address { pub city: String }
        pub struct Id(pub u64);
        pub struct Marker;

        impl User {
            pub fn new(id: u64) -> Self {
                User { id, name: String::new(), address: Address { city: String::new() } }
            }
            pub fn load() -> Result<User, String> { todo!() }
            pub fn rename(&mut self, name: String) { self.name = name; }
        }
    ";

    fn lower(module: &str, src: &str, others: &[(&str, &str)]) -> SourceFile {
        let mut parsed: Vec<(String, syn::File)> = others
            .iter()
            .map(|(m, s)| ((*m).to_string(), syn::parse_file(s).unwrap()))
            .collect();
        parsed.push((module.to_string(), syn::parse_file(src).unwrap()));
        let table = SymbolTable::build(parsed.iter().map(|(m, f)| (m.as_str(), f)));
        let (_, file) = parsed.last().unwrap();
        lower_file(&table, module, Path::new("src/test.rs"), src, file)
    }

    fn func<'f>(file: &'f SourceFile, name: &str) -> &'f FuncDecl {
        file.items
            .iter()
            .find_map(|i| match i {
                ir::Item::Func(f) if f.name == name => Some(f),
                _ => None,
            })
            .unwrap()
    }

    fn var_type(f: &FuncDecl, index: usize) -> Option<Type> {
        match &f.body[index] {
            Stmt::Var(v) => v.init.as_ref().and_then(|i| i.ty.clone()),
            other => panic!("expected a let, got {other:?}"),
        }
    }

    #[test]
    fn methods_have_receivers_and_associated_functions_do_not() {
        let file = lower("crate::domain", DOMAIN, &[]);
        let rename = func(&file, "rename");
        assert_eq!(rename.receiver.as_ref().unwrap().type_name, "User");
        assert!(func(&file, "new").receiver.is_none());
        assert_eq!(rename.position.line, 12);
    }

    #[test]
    fn self_field_assignment_is_typed_through_the_receiver() {
        let file = lower("crate::domain", DOMAIN, &[]);
        let Stmt::Assign(assign) = &func(&file, "rename").body[0] else {
            panic!("expected an assignment");
        };
        let ExprKind::Field { base, field } = &assign.targets[0].kind else {
            panic!("expected a field target");
        };
        assert_eq!(field, "name");
        assert_eq!(
            base.ty,
            Some(Type::pointer(Type::aggregate("crate::domain", "User")))
        );
        assert_eq!(assign.position, Position::new(12, 54));
    }

    #[test]
    fn literal_positions_and_nested_literals() {
        let file = lower("crate::domain", DOMAIN, &[]);
        let Stmt::Expr(lit) = &func(&file, "new").body[0] else {
            panic!("expected a tail expression");
        };
        assert_eq!(lit.ty, Some(Type::aggregate("crate::domain", "User")));
        assert_eq!(lit.position, Position::new(9, 17));
        let ExprKind::Literal { elements } = &lit.kind else {
            panic!("expected a literal");
        };
        let ExprKind::KeyValue { value, .. } = &elements[2].kind else {
            panic!("expected a keyed element");
        };
        assert_eq!(value.ty, Some(Type::aggregate("crate::domain", "Address")));
    }

    #[test]
    fn local_inference_follows_calls_and_fields() {
        let app = r"
            use crate::domain::{Id, Marker, User};
            fn run() -> Result<(), String> {
                let a = User::new(1);
                let b = User::load()?;
                let c = User::load().unwrap();
                let d = &mut a.address;
                let e = Id(7);
                let f = Marker;
                let g = Box::new(User::new(2));
                Ok(())
            }
        ";
        let file = lower("crate::app", app, &[("crate", "pub mod domain; pub mod app;"), ("crate::domain", DOMAIN)]);
        let run = func(&file, "run");
        let user = Type::aggregate("crate::domain", "User");
        assert_eq!(var_type(run, 0), Some(user.clone()));
        assert_eq!(var_type(run, 1), Some(user.clone()));
        assert_eq!(var_type(run, 2), Some(user.clone()));
        assert_eq!(
            var_type(run, 3),
            Some(Type::pointer(Type::aggregate("crate::domain", "Address")))
        );
        assert_eq!(var_type(run, 4), Some(Type::aggregate("crate::domain", "Id")));
        assert_eq!(var_type(run, 5), Some(Type::aggregate("crate::domain", "Marker")));
        assert_eq!(var_type(run, 6), Some(Type::pointer(user)));
    }

    #[test]
    fn compound_and_tuple_assignments() {
        let src = r"
            struct Counter { hits: u32, misses: u32 }
            fn bump(c: &mut Counter) {
                c.hits += 1;
                (c.hits, c.misses) = (0, 0);
            }
        ";
        let file = lower("crate", src, &[]);
        let bump = func(&file, "bump");
        let Stmt::Assign(first) = &bump.body[0] else {
            panic!("expected an assignment");
        };
        assert_eq!(first.targets.len(), 1);
        let Stmt::Assign(second) = &bump.body[1] else {
            panic!("expected an assignment");
        };
        assert_eq!(second.targets.len(), 2);
        assert_eq!(second.values.len(), 2);
    }

    #[test]
    fn bare_let_has_no_initializer() {
        let src = "struct S { a: u8 }\nfn f() { let s: S; }";
        let file = lower("crate", src, &[]);
        let Stmt::Var(decl) = &func(&file, "f").body[0] else {
            panic!("expected a let");
        };
        assert_eq!(decl.name, "s");
        assert!(decl.init.is_none());
        assert_eq!(decl.ty, Some(Type::aggregate("crate", "S")));
    }

    #[test]
    fn nested_functions_are_hoisted_after_their_parent() {
        let src = "fn outer() { fn inner() {} inner(); }";
        let file = lower("crate", src, &[]);
        let names: Vec<_> = file
            .items
            .iter()
            .filter_map(|i| match i {
                ir::Item::Func(f) => Some(f.name.as_str()),
                ir::Item::Value(_) => None,
            })
            .collect();
        assert_eq!(names, vec!["outer", "inner"]);
    }

    #[test]
    fn matches_pattern_is_not_a_construction() {
        let src = r"
            struct S { a: u8 }
            fn f(s: S) -> bool { matches!(s, S { .. }) }
        ";
        let file = lower("crate", src, &[]);
        let Stmt::Expr(call) = &func(&file, "f").body[0] else {
            panic!("expected an expression");
        };
        let ExprKind::Other { children } = &call.kind else {
            panic!("expected macro arguments");
        };
        assert_eq!(children.len(), 1);
        assert!(matches!(children[0].kind, ExprKind::Ident { .. }));
    }

    #[test]
    fn std_matches_pattern_is_not_a_construction() {
        let src = r"
            struct S { a: u8 }
            fn f(s: S) -> bool { std::matches!(s, S { .. }) }
        ";
        let file = lower("crate", src, &[]);
        let Stmt::Expr(call) = &func(&file, "f").body[0] else {
            panic!("expected an expression");
        };
        let ExprKind::Other { children } = &call.kind else {
            panic!("expected macro arguments");
        };
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn destructuring_assignment_targets_only_places() {
        let src = r"
            struct Counter { hits: u32, misses: u32 }
            struct Pair(u32, u32);
            fn f(c: &mut Counter, p: Pair, q: Counter) {
                Pair(c.hits, _) = p;
                Counter { hits: c.misses, .. } = q;
            }
        ";
        let file = lower("crate", src, &[]);
        let body = &func(&file, "f").body;
        let fields: Vec<_> = body
            .iter()
            .map(|stmt| {
                let Stmt::Assign(assign) = stmt else {
                    panic!("expected an assignment");
                };
                assert_eq!(assign.targets.len(), 1);
                match &assign.targets[0].kind {
                    ExprKind::Field { field, .. } => field.as_str(),
                    other => panic!("expected a field target, got {other:?}"),
                }
            })
            .collect();
        assert_eq!(fields, vec!["hits", "misses"]);
    }

    #[test]
    fn comments_are_collected() {
        let src = "// Code generated by hand. DO NOT EDIT.\nfn f() {}";
        let file = lower("crate", src, &[]);
        assert_eq!(file.comments.len(), 1);
    }
}
