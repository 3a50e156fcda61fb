//! Typed syntax tree consumed by the seal engine.
//!
//! This is the contract between a language front-end and the engine. A
//! front-end parses source, resolves static types, and lowers every file of a
//! package into a [`Unit`]. The engine never builds these trees itself.
//!
//! Every [`Expr`] may carry the type the front-end resolved for it. A missing
//! type (`ty: None`) is legal and simply makes the expression invisible to
//! the engine.
//!
//! All types derive serde so that an out-of-process front-end can hand units
//! over as JSON:
//!
//! ```json
//! {
//!   "package": "example.com/app",
//!   "files": [{
//!     "path": "app/main.go",
//!     "items": [{
//!       "item": "func", "name": "Build",
//!       "body": [{
//!         "stmt": "expr",
//!         "kind": { "expr": "literal", "elements": [] },
//!         "ty": { "type": "named", "name": "User", "package": "example.com/domain", "aggregate": true },
//!         "position": { "line": 4, "column": 7 }
//!       }]
//!     }]
//!   }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Line/column position inside a source file (both 1-indexed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// All files of one package, analyzed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Path of the package being analyzed (the "current package").
    pub package: String,
    /// Files belonging to the package.
    #[serde(default)]
    pub files: Vec<SourceFile>,
}

impl Unit {
    /// Creates an empty unit for a package.
    #[must_use]
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            files: Vec::new(),
        }
    }

    /// Adds a file to the unit.
    #[must_use]
    pub fn with_file(mut self, file: SourceFile) -> Self {
        self.files.push(file);
        self
    }
}

/// A single parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path of the file as it should appear in diagnostics.
    pub path: PathBuf,
    /// Text of every comment in the file, one entry per comment.
    #[serde(default)]
    pub comments: Vec<String>,
    /// Top-level declarations.
    #[serde(default)]
    pub items: Vec<Item>,
}

impl SourceFile {
    /// Creates an empty file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            comments: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Adds a comment.
    #[must_use]
    pub fn with_comment(mut self, text: impl Into<String>) -> Self {
        self.comments.push(text.into());
        self
    }

    /// Adds a top-level item.
    #[must_use]
    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }
}

/// Top-level declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum Item {
    /// Function or method.
    Func(FuncDecl),
    /// Package-level variable, constant, or static.
    Value(ValueDecl),
}

/// A named function, optionally bound to a receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    /// Function name as written.
    pub name: String,
    /// Receiver, when the function is a method bound to an instance.
    #[serde(default)]
    pub receiver: Option<Receiver>,
    /// Statements of the body.
    #[serde(default)]
    pub body: Vec<Stmt>,
    /// Position of the declaration.
    #[serde(default)]
    pub position: Position,
}

impl FuncDecl {
    /// Creates a free function.
    #[must_use]
    pub fn new(name: impl Into<String>, body: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            receiver: None,
            body,
            position: Position::default(),
        }
    }

    /// Creates a method bound to `receiver_type`.
    #[must_use]
    pub fn method(name: impl Into<String>, receiver_type: impl Into<String>, body: Vec<Stmt>) -> Self {
        Self {
            receiver: Some(Receiver {
                type_name: receiver_type.into(),
            }),
            ..Self::new(name, body)
        }
    }
}

/// Method receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    /// Name of the receiver's base type, pointer stripped.
    pub type_name: String,
}

/// Variable declaration, with or without an initializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDecl {
    /// Bound name (`_` for blank).
    pub name: String,
    /// Declared type, if written.
    #[serde(default)]
    pub ty: Option<Type>,
    /// Initializer expression. `None` is a bare zero-value declaration.
    #[serde(default)]
    pub init: Option<Expr>,
    /// Position of the declaration.
    #[serde(default)]
    pub position: Position,
}

/// Statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    /// Expression statement.
    Expr(Expr),
    /// Assignment, plain or compound, with one or more targets.
    Assign(Assign),
    /// Local variable declaration.
    Var(ValueDecl),
    /// Nested block.
    Block {
        /// Statements of the block.
        body: Vec<Stmt>,
    },
    /// Conditional.
    If {
        /// Condition expression.
        cond: Expr,
        /// Statements run when the condition holds.
        then_branch: Vec<Stmt>,
        /// Statements run otherwise.
        #[serde(default)]
        else_branch: Vec<Stmt>,
    },
    /// Any looping construct.
    Loop {
        /// Header expressions (init, condition, iterated value).
        #[serde(default)]
        header: Vec<Expr>,
        /// Loop body.
        body: Vec<Stmt>,
    },
    /// Return statement.
    Return {
        /// Returned values.
        #[serde(default)]
        values: Vec<Expr>,
    },
}

/// Assignment statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assign {
    /// Left-hand targets.
    pub targets: Vec<Expr>,
    /// Right-hand values.
    #[serde(default)]
    pub values: Vec<Expr>,
    /// Position of the statement.
    #[serde(default)]
    pub position: Position,
}

/// Expression with its resolved static type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// Expression shape.
    pub kind: ExprKind,
    /// Type resolved by the front-end, if known.
    #[serde(default)]
    pub ty: Option<Type>,
    /// Position of the expression.
    #[serde(default)]
    pub position: Position,
}

/// Expression shapes the engine distinguishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum ExprKind {
    /// Literal initializer listing element or field values (`T{...}`).
    Literal {
        /// Element values; keyed elements use [`ExprKind::KeyValue`].
        #[serde(default)]
        elements: Vec<Expr>,
    },
    /// `key: value` element inside a literal.
    KeyValue {
        /// Key (field name, map key, or index).
        key: Box<Expr>,
        /// Value.
        value: Box<Expr>,
    },
    /// Field selection `base.field`.
    Field {
        /// Selected-from expression.
        base: Box<Expr>,
        /// Field name.
        field: String,
    },
    /// Address-of `&operand`.
    AddressOf {
        /// Operand.
        operand: Box<Expr>,
    },
    /// Dereference `*operand`.
    Deref {
        /// Operand.
        operand: Box<Expr>,
    },
    /// Call `callee(args...)`.
    Call {
        /// Called expression.
        callee: Box<Expr>,
        /// Arguments.
        #[serde(default)]
        args: Vec<Expr>,
    },
    /// Identifier reference.
    Ident {
        /// Name.
        name: String,
    },
    /// Anonymous function. Does not open a new function context.
    Closure {
        /// Body statements.
        body: Vec<Stmt>,
    },
    /// Block used in expression position.
    Block {
        /// Body statements.
        body: Vec<Stmt>,
    },
    /// Anything else; only its children matter.
    Other {
        /// Sub-expressions.
        #[serde(default)]
        children: Vec<Expr>,
    },
}

impl Expr {
    /// Creates an expression without a resolved type.
    #[must_use]
    pub fn new(kind: ExprKind, position: Position) -> Self {
        Self {
            kind,
            ty: None,
            position,
        }
    }

    /// Attaches a resolved type.
    #[must_use]
    pub fn typed(mut self, ty: Type) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Attaches an optional resolved type.
    #[must_use]
    pub fn with_type(mut self, ty: Option<Type>) -> Self {
        self.ty = ty;
        self
    }

    /// Literal initializer of type `ty`.
    #[must_use]
    pub fn literal(ty: Type, elements: Vec<Expr>, position: Position) -> Self {
        Self::new(ExprKind::Literal { elements }, position).typed(ty)
    }

    /// Identifier of type `ty`.
    #[must_use]
    pub fn ident(name: impl Into<String>, ty: Option<Type>) -> Self {
        Self::new(ExprKind::Ident { name: name.into() }, Position::default()).with_type(ty)
    }

    /// Field selection `base.field`.
    #[must_use]
    pub fn field(base: Expr, field: impl Into<String>) -> Self {
        let position = base.position;
        Self::new(
            ExprKind::Field {
                base: Box::new(base),
                field: field.into(),
            },
            position,
        )
    }

    /// `key: value` element.
    #[must_use]
    pub fn key_value(key: Expr, value: Expr) -> Self {
        let position = key.position;
        Self::new(
            ExprKind::KeyValue {
                key: Box::new(key),
                value: Box::new(value),
            },
            position,
        )
    }

    /// `&operand`, typed as a pointer to the operand's type.
    #[must_use]
    pub fn address_of(operand: Expr) -> Self {
        let position = operand.position;
        let ty = operand.ty.clone().map(Type::pointer);
        Self::new(
            ExprKind::AddressOf {
                operand: Box::new(operand),
            },
            position,
        )
        .with_type(ty)
    }

    /// Untyped expression wrapping children.
    #[must_use]
    pub fn other(children: Vec<Expr>) -> Self {
        Self::new(ExprKind::Other { children }, Position::default())
    }
}

impl Stmt {
    /// Assignment statement.
    #[must_use]
    pub fn assign(targets: Vec<Expr>, values: Vec<Expr>, position: Position) -> Self {
        Self::Assign(Assign {
            targets,
            values,
            position,
        })
    }

    /// Local variable declaration.
    #[must_use]
    pub fn var(name: impl Into<String>, ty: Option<Type>, init: Option<Expr>) -> Self {
        Self::Var(ValueDecl {
            name: name.into(),
            ty,
            init,
            position: Position::default(),
        })
    }
}

/// Static type of an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Type {
    /// Declared (named) type.
    Named(NamedType),
    /// Pointer or reference to `elem`.
    Pointer {
        /// Pointee type.
        elem: Box<Type>,
    },
    /// Alias declared as another local name for `target`.
    Alias {
        /// Alias name.
        name: String,
        /// Package declaring the alias.
        #[serde(default)]
        package: Option<String>,
        /// Aliased type.
        target: Box<Type>,
    },
    /// Generic type parameter, not yet instantiated.
    TypeParam {
        /// Parameter name.
        name: String,
    },
    /// Predeclared primitive.
    Basic {
        /// Primitive name.
        name: String,
    },
    /// Interface or trait object.
    Interface,
    /// Slice or fixed-size array of `elem`.
    Sequence {
        /// Element type.
        elem: Box<Type>,
    },
    /// Map from `key` to `value`.
    Map {
        /// Key type.
        key: Box<Type>,
        /// Value type.
        value: Box<Type>,
    },
    /// Type checking failed for this expression.
    Invalid,
}

/// Identity of a declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedType {
    /// Type name.
    pub name: String,
    /// Declaring package. `None` for predeclared/universe types.
    #[serde(default)]
    pub package: Option<String>,
    /// Whether the underlying type is a struct-like aggregate.
    #[serde(default)]
    pub aggregate: bool,
}

impl Type {
    /// Named struct-like type declared in `package`.
    #[must_use]
    pub fn aggregate(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Named(NamedType {
            name: name.into(),
            package: Some(package.into()),
            aggregate: true,
        })
    }

    /// Named non-aggregate type declared in `package`.
    #[must_use]
    pub fn named(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Named(NamedType {
            name: name.into(),
            package: Some(package.into()),
            aggregate: false,
        })
    }

    /// Pointer to `elem`.
    #[must_use]
    pub fn pointer(elem: Type) -> Self {
        Self::Pointer {
            elem: Box::new(elem),
        }
    }

    /// Predeclared primitive.
    #[must_use]
    pub fn basic(name: impl Into<String>) -> Self {
        Self::Basic { name: name.into() }
    }
}
