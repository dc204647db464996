// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression AST nodes.

use crate::stmt::Stmt;
use crate::Span;

/// An expression in the AST.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// The kind of expression.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Integer literal (base already decoded)
    Int(i64),
    /// Integer literal too large for i64; kept unsigned
    UintBig(u64),
    /// Float literal
    Float(f64),
    /// Imaginary literal (interpreted as its float part)
    Imag(f64),
    /// Character literal
    Char(char),
    /// String literal (quotes stripped)
    String(String),
    /// Identifier
    Ident(String),
    /// Binary operation
    Binary {
        op: BinOp,
        x: Box<Expr>,
        y: Box<Expr>,
    },
    /// Unary operation
    Unary { op: UnaryOp, x: Box<Expr> },
    /// Function call or conversion
    Call { fun: Box<Expr>, args: Vec<Expr> },
    /// Field/method/package selector (x.sel)
    Selector { x: Box<Expr>, sel: String },
    /// Index access (x[i])
    Index { x: Box<Expr>, index: Box<Expr> },
    /// Slice expression (x[lo:hi])
    Slice {
        x: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
    },
    /// Parenthesised expression
    Paren(Box<Expr>),
    /// Function literal
    FuncLit(FuncLit),
    /// Composite literal; the head is a type expression
    CompositeLit { ty: Box<Expr>, elts: Vec<Expr> },
    /// Key-value pair inside a composite literal
    KeyValue { key: Box<Expr>, value: Box<Expr> },
    /// Type assertion x.(T); `ty` is None for the bare x.(type) form
    TypeAssert {
        x: Box<Expr>,
        ty: Option<Box<Expr>>,
    },
    /// Slice or array type ([]T, [N]T)
    ArrayType {
        len: Option<Box<Expr>>,
        elem: Box<Expr>,
    },
    /// Map type (map[K]V)
    MapType { key: Box<Expr>, value: Box<Expr> },
    /// Channel type (chan T)
    ChanType { elem: Box<Expr> },
    /// Struct type; only the empty anonymous form is a first-class value
    StructType { fields: Vec<Field> },
    /// Interface type; only the empty form is a first-class value
    InterfaceType { methods: Vec<Field> },
    /// Function type (appears in signatures of parsed packages)
    FuncType {
        params: Vec<Param>,
        results: Vec<Param>,
    },
}

/// A function literal: parameters, named results, body.
#[derive(Debug, Clone)]
pub struct FuncLit {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// A parameter or result entry. Results may be unnamed.
#[derive(Debug, Clone)]
pub struct Param {
    pub names: Vec<String>,
    pub ty: Expr,
}

/// A struct field or interface method entry.
#[derive(Debug, Clone)]
pub struct Field {
    pub names: Vec<String>,
    pub ty: Expr,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Quo,
    Rem,
    And,
    Or,
    Xor,
    AndNot,
    Shl,
    Shr,
    Eql,
    Neq,
    Lss,
    Gtr,
    Leq,
    Geq,
    LAnd,
    LOr,
}

impl BinOp {
    /// Operator text as written in source.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Quo => "/",
            BinOp::Rem => "%",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::AndNot => "&^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Eql => "==",
            BinOp::Neq => "!=",
            BinOp::Lss => "<",
            BinOp::Gtr => ">",
            BinOp::Leq => "<=",
            BinOp::Geq => ">=",
            BinOp::LAnd => "&&",
            BinOp::LOr => "||",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// +x
    Pos,
    /// -x
    Neg,
    /// !x
    Not,
    /// &x
    Addr,
    /// *x
    Deref,
    /// <-x (channel receive)
    Recv,
}
