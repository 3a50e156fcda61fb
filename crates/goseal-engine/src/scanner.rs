//! Site scanner.
//!
//! Walks every file of a [`Unit`] and collects construction and mutation
//! candidates together with their lexical context. The scanner does not look
//! at the policy: it only knows which files to skip.
//!
//! # Detected Patterns
//!
//! - Literal initializers at any depth (`T{..}`, `[]T{{..}}`, `&T{..}`,
//!   map values, nested field values)
//! - Field assignments (`x.f = ..`, `x.f += ..`), one candidate per target
//!
//! # Not Detected
//!
//! - Bare declarations (`var u User`)
//! - Anything inside generated or ignored files

use goseal_core::ir::{Assign, Expr, ExprKind, Item, Position, SourceFile, Stmt, Type, Unit, ValueDecl};
use goseal_core::PatternSet;
use std::path::Path;
use tracing::debug;

/// Marker that, together with [`DO_NOT_EDIT_MARKER`], flags a generated file.
pub const GENERATED_MARKER: &str = "Code generated";

/// Marker that, together with [`GENERATED_MARKER`], flags a generated file.
pub const DO_NOT_EDIT_MARKER: &str = "DO NOT EDIT";

/// Returns true if any single comment carries both generated-file markers.
#[must_use]
pub fn is_generated(file: &SourceFile) -> bool {
    file.comments
        .iter()
        .any(|c| c.contains(GENERATED_MARKER) && c.contains(DO_NOT_EDIT_MARKER))
}

/// Enclosing named function of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Function name.
    pub name: &'a str,
    /// Receiver type name, when the function is a method.
    pub receiver: Option<&'a str>,
}

impl Frame<'_> {
    /// Whether the function is bound to an instance.
    #[must_use]
    pub fn has_receiver(&self) -> bool {
        self.receiver.is_some()
    }
}

/// What a candidate does to its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind<'a> {
    /// A literal initializer.
    Construction,
    /// An assignment to `field`.
    Mutation {
        /// Assigned field.
        field: &'a str,
    },
}

/// An unresolved site as found in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    /// Construction or mutation.
    pub kind: SiteKind<'a>,
    /// Type of the literal, or of the value the field is selected from.
    pub ty: Option<&'a Type>,
    /// Literal position, or the assignment statement's position.
    pub position: Position,
    /// File containing the candidate.
    pub file: &'a Path,
    /// Innermost enclosing named function; `None` at file scope.
    pub context: Option<Frame<'a>>,
}

/// A candidate whose type resolved to a declared aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Site<'a> {
    /// Construction or mutation.
    pub kind: SiteKind<'a>,
    /// Reported position.
    pub position: Position,
    /// File containing the site.
    pub file: &'a Path,
    /// Resolved type name.
    pub type_name: &'a str,
    /// Package declaring the type.
    pub package: &'a str,
    /// Innermost enclosing named function; `None` at file scope.
    pub context: Option<Frame<'a>>,
}

/// Result of scanning one unit.
#[derive(Debug, Default)]
pub struct Scan<'a> {
    /// Candidates in discovery order.
    pub candidates: Vec<Candidate<'a>>,
    /// Files actually walked.
    pub files_scanned: usize,
}

/// Finds candidates in a unit, skipping generated and ignored files.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'c> {
    ignore_files: &'c PatternSet,
}

impl<'c> Scanner<'c> {
    /// Creates a scanner that skips files matching `ignore_files`.
    #[must_use]
    pub fn new(ignore_files: &'c PatternSet) -> Self {
        Self { ignore_files }
    }

    /// Whether `file` is excluded from scanning.
    #[must_use]
    pub fn skips(&self, file: &SourceFile) -> bool {
        if is_generated(file) {
            debug!("Skipping generated file: {}", file.path.display());
            return true;
        }
        if self.ignore_files.any_match(&file.path.to_string_lossy()) {
            debug!("Skipping ignored file: {}", file.path.display());
            return true;
        }
        false
    }

    /// Collects every candidate of `unit` in discovery order.
    #[must_use]
    pub fn scan<'a>(&self, unit: &'a Unit) -> Scan<'a> {
        let mut scan = Scan::default();
        for file in unit.files.iter().filter(|f| !self.skips(f)) {
            let mut walker = Walker {
                file: &file.path,
                frames: Vec::new(),
                out: &mut scan.candidates,
            };
            for item in &file.items {
                walker.item(item);
            }
            scan.files_scanned += 1;
        }
        scan
    }
}

struct Walker<'a, 'o> {
    file: &'a Path,
    frames: Vec<Frame<'a>>,
    out: &'o mut Vec<Candidate<'a>>,
}

impl<'a> Walker<'a, '_> {
    fn emit(&mut self, kind: SiteKind<'a>, ty: Option<&'a Type>, position: Position) {
        self.out.push(Candidate {
            kind,
            ty,
            position,
            file: self.file,
            context: self.frames.last().copied(),
        });
    }

    fn item(&mut self, item: &'a Item) {
        match item {
            Item::Func(func) => {
                self.frames.push(Frame {
                    name: &func.name,
                    receiver: func.receiver.as_ref().map(|r| r.type_name.as_str()),
                });
                self.stmts(&func.body);
                self.frames.pop();
            }
            Item::Value(decl) => self.value_decl(decl),
        }
    }

    fn stmts(&mut self, stmts: &'a [Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::Assign(assign) => self.assign(assign),
            Stmt::Var(decl) => self.value_decl(decl),
            Stmt::Block { body } => self.stmts(body),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.expr(cond);
                self.stmts(then_branch);
                self.stmts(else_branch);
            }
            Stmt::Loop { header, body } => {
                self.exprs(header);
                self.stmts(body);
            }
            Stmt::Return { values } => self.exprs(values),
        }
    }

    fn assign(&mut self, assign: &'a Assign) {
        // The statement is reported before anything nested in it.
        for target in &assign.targets {
            if let ExprKind::Field { base, field } = &target.kind {
                self.emit(
                    SiteKind::Mutation {
                        field: field.as_str(),
                    },
                    base.ty.as_ref(),
                    assign.position,
                );
            }
        }
        self.exprs(&assign.targets);
        self.exprs(&assign.values);
    }

    fn value_decl(&mut self, decl: &'a ValueDecl) {
        // A declaration without an initializer is never a site.
        if let Some(init) = &decl.init {
            self.expr(init);
        }
    }

    fn exprs(&mut self, exprs: &'a [Expr]) {
        for expr in exprs {
            self.expr(expr);
        }
    }

    fn expr(&mut self, expr: &'a Expr) {
        match &expr.kind {
            ExprKind::Literal { elements } => {
                self.emit(SiteKind::Construction, expr.ty.as_ref(), expr.position);
                self.exprs(elements);
            }
            ExprKind::KeyValue { key, value } => {
                self.expr(key);
                self.expr(value);
            }
            ExprKind::Field { base, .. } => self.expr(base),
            ExprKind::AddressOf { operand } | ExprKind::Deref { operand } => self.expr(operand),
            ExprKind::Call { callee, args } => {
                self.expr(callee);
                self.exprs(args);
            }
            ExprKind::Ident { .. } => {}
            // Closures stay in the enclosing function's frame.
            ExprKind::Closure { body } | ExprKind::Block { body } => self.stmts(body),
            ExprKind::Other { children } => self.exprs(children),
        }
    }
}
