//! Abstract Syntax Tree node types

use super::super::errors::ExceptionKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location, 0-indexed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Span {
    pub fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// True for the placeholder span of synthesized nodes
    pub fn is_empty(&self) -> bool {
        *self == Span::default()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line + 1, self.start_col + 1)
    }
}

/// Output stream an emission is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stream {
    Out,
    Err,
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Short-circuit `&&`
    And,
    /// Short-circuit `||`
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Which exceptions a catch clause accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum CatchPattern {
    /// Catch every exception
    Any,
    /// Catch exceptions of the listed kinds
    Kinds { kinds: Vec<ExceptionKind> },
}

impl CatchPattern {
    pub fn matches(&self, kind: ExceptionKind) -> bool {
        match self {
            CatchPattern::Any => true,
            CatchPattern::Kinds { kinds } => kinds.contains(&kind),
        }
    }
}

/// One `catch` clause of a Try statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchClause {
    pub pattern: CatchPattern,
    /// Variable the caught exception is bound to inside `body`
    pub binding: String,
    pub body: Box<Stmt>,
}

/// Scoped resource declared in a Try statement header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDecl {
    pub name: String,
    /// Expression producing the path to open
    pub path: Expr,
}

/// Assignment target: a variable, optionally indexed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub var: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indices: Vec<Expr>,
}

impl Place {
    pub fn var(name: impl Into<String>) -> Self {
        Self {
            var: name.into(),
            indices: Vec::new(),
        }
    }

    /// Read the current value of this place as an expression
    pub fn to_expr(&self) -> Expr {
        let mut expr = Expr::Ident {
            name: self.var.clone(),
        };
        for index in &self.indices {
            expr = Expr::Index {
                target: Box::new(expr),
                index: Box::new(index.clone()),
            };
        }
        expr
    }
}

/// Statement AST node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Stmt {
    Block {
        body: Vec<Stmt>,
        #[serde(default, skip_serializing_if = "Span::is_empty")]
        span: Span,
    },
    Declare {
        name: String,
        init: Option<Expr>,
        #[serde(default, skip_serializing_if = "Span::is_empty")]
        span: Span,
    },
    Assign {
        place: Place,
        value: Expr,
        #[serde(default, skip_serializing_if = "Span::is_empty")]
        span: Span,
    },
    If {
        test: Expr,
        then_s: Box<Stmt>,
        else_s: Option<Box<Stmt>>,
        #[serde(default, skip_serializing_if = "Span::is_empty")]
        span: Span,
    },
    /// Condition-first loop
    While {
        label: Option<String>,
        test: Expr,
        body: Box<Stmt>,
        #[serde(default, skip_serializing_if = "Span::is_empty")]
        span: Span,
    },
    /// Condition-last loop: body runs at least once
    DoWhile {
        label: Option<String>,
        body: Box<Stmt>,
        test: Expr,
        #[serde(default, skip_serializing_if = "Span::is_empty")]
        span: Span,
    },
    /// Three-part counting loop
    For {
        label: Option<String>,
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Box<Stmt>>,
        body: Box<Stmt>,
        #[serde(default, skip_serializing_if = "Span::is_empty")]
        span: Span,
    },
    /// Iterate over the elements of a list or the characters of a string
    ForEach {
        label: Option<String>,
        binding: String,
        iterable: Expr,
        body: Box<Stmt>,
        #[serde(default, skip_serializing_if = "Span::is_empty")]
        span: Span,
    },
    Try {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        resources: Vec<ResourceDecl>,
        body: Box<Stmt>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        catches: Vec<CatchClause>,
        finally: Option<Box<Stmt>>,
        #[serde(default, skip_serializing_if = "Span::is_empty")]
        span: Span,
    },
    Return {
        value: Option<Expr>,
        #[serde(default, skip_serializing_if = "Span::is_empty")]
        span: Span,
    },
    Throw {
        value: Expr,
        #[serde(default, skip_serializing_if = "Span::is_empty")]
        span: Span,
    },
    Emit {
        stream: Stream,
        value: Option<Expr>,
        #[serde(default, skip_serializing_if = "Span::is_empty")]
        span: Span,
    },
    Expr {
        expr: Expr,
        #[serde(default, skip_serializing_if = "Span::is_empty")]
        span: Span,
    },
    Break {
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Span::is_empty")]
        span: Span,
    },
    Continue {
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Span::is_empty")]
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block { span, .. }
            | Stmt::Declare { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::DoWhile { span, .. }
            | Stmt::For { span, .. }
            | Stmt::ForEach { span, .. }
            | Stmt::Try { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Throw { span, .. }
            | Stmt::Emit { span, .. }
            | Stmt::Expr { span, .. }
            | Stmt::Break { span, .. }
            | Stmt::Continue { span, .. } => *span,
        }
    }

    /// Short name used in logs
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::Block { .. } => "Block",
            Stmt::Declare { .. } => "Declare",
            Stmt::Assign { .. } => "Assign",
            Stmt::If { .. } => "If",
            Stmt::While { .. } => "While",
            Stmt::DoWhile { .. } => "DoWhile",
            Stmt::For { .. } => "For",
            Stmt::ForEach { .. } => "ForEach",
            Stmt::Try { .. } => "Try",
            Stmt::Return { .. } => "Return",
            Stmt::Throw { .. } => "Throw",
            Stmt::Emit { .. } => "Emit",
            Stmt::Expr { .. } => "Expr",
            Stmt::Break { .. } => "Break",
            Stmt::Continue { .. } => "Continue",
        }
    }

    /// True for statements that never complete normally
    pub fn is_abrupt(&self) -> bool {
        matches!(
            self,
            Stmt::Return { .. } | Stmt::Throw { .. } | Stmt::Break { .. } | Stmt::Continue { .. }
        )
    }
}

/// Expression AST node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Expr {
    LitNull,
    LitBool {
        v: bool,
    },
    LitInt {
        v: i32,
    },
    LitStr {
        v: String,
    },
    LitList {
        elements: Vec<Expr>,
    },
    Ident {
        name: String,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Builtin or program function call
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    /// `Kind("message")`
    NewException {
        kind: ExceptionKind,
        message: Option<Box<Expr>>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    /// Property read without arguments (`x.length`, `e.message`)
    Member {
        object: Box<Expr>,
        property: String,
    },
    /// Method call (`r.readLine()`, `l.add(x)`)
    Method {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
}

/* ===================== Program ===================== */

/// A named function with positional parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Stmt,
    #[serde(default, skip_serializing_if = "Span::is_empty")]
    pub span: Span,
}

/// A loaded fixture: the functions it defines, in source order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<FunctionDef>,
}

impl Program {
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }
}
