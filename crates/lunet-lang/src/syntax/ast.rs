use std::rc::Rc;

/// Source location attached to every node for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

// ─── Top level ───────────────────────────────────────────────────────────────

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub block: Block,
}

/// `stat* retstat?`
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub ret: Option<ReturnStmt>,
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `;`
    Semicolon(Span),
    /// `break`
    Break(Span),
    /// `x = e`, `local x = e`, `t.a[k] = e`
    Assign(Assign),
    /// `if c then … elseif c then … else … end`
    If(IfStmt),
    /// `function name(a, b) … end`
    FunctionDef(Rc<FunctionDef>),
    /// `while`, `repeat`, numeric `for`, `do`
    Loop(LoopStmt),
    /// `f(a, b)` used as a statement.
    Call(Call),
    /// `print(…)` used as a statement.
    Print(Vec<Expr>, Span),
    /// `io.read(…)` used as a statement; the line is consumed and dropped.
    Read(Option<Box<Expr>>, Span),
}

#[derive(Debug, Clone)]
pub struct Assign {
    /// The parser guarantees `target.path` is empty when `local` is set.
    pub local: bool,
    pub target: VarRef,
    pub value: Expr,
    pub span: Span,
}

/// A variable with zero or more index steps: `t`, `t.x`, `t[i].y`.
#[derive(Debug, Clone)]
pub struct VarRef {
    pub name: String,
    /// `t.x` is stored as the string-literal key expression `"x"`.
    pub path: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    /// `if` followed by every `elseif`, in source order.
    pub branches: Vec<(Expr, Block)>,
    pub else_block: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub values: Vec<Expr>,
    pub span: Span,
}

/// Loop wrapper. `keyword` is the source keyword that opened the loop.
#[derive(Debug, Clone)]
pub struct LoopStmt {
    pub keyword: &'static str,
    pub kind: LoopKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum LoopKind {
    While { condition: Expr, body: Block },
    Repeat { body: Block, condition: Expr },
    NumericFor {
        var: String,
        start: Expr,
        stop: Expr,
        step: Option<Expr>,
        body: Block,
    },
    /// `do … end`: a scope, not a `break` target.
    Do(Block),
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Expr {
    Nil(Span),
    Bool(bool, Span),
    /// Literal text as written; parsed when evaluated.
    Number { text: String, kind: NumberKind, span: Span },
    StringLit(String, Span),
    Var(VarRef),
    Table(TableConstructor),
    Call(Call),
    Print(Vec<Expr>, Span),
    /// `io.read(fmt)`
    Read(Option<Box<Expr>>, Span),

    /// `a + b`, `a == b`, `a .. b`, etc.
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        span: Span,
    },

    /// `not x`, `-x`, `#x`
    UnOp {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },

    /// `(e)`: truncates a multi-value to its first value.
    Paren(Box<Expr>, Span),
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Nil(s)              => s,
            Expr::Bool(_, s)          => s,
            Expr::Number { span, .. } => span,
            Expr::StringLit(_, s)     => s,
            Expr::Var(v)              => &v.span,
            Expr::Table(t)            => &t.span,
            Expr::Call(c)             => &c.span,
            Expr::Print(_, s)         => s,
            Expr::Read(_, s)          => s,
            Expr::BinOp { span, .. }  => span,
            Expr::UnOp { span, .. }   => span,
            Expr::Paren(_, s)         => s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Integer,
    Float,
}

/// `name(args)`
#[derive(Debug, Clone)]
pub struct Call {
    pub callee: String,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TableConstructor {
    pub fields: Vec<TableField>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TableField {
    /// `None` for positional entries, which are numbered 1, 2, … in order.
    pub key: Option<Expr>,
    pub value: Expr,
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add, Sub, Mul, Div, Mod, Pow,
    Concat,
    Eq, NotEq,
    Lt, LtEq, Gt, GtEq,
    And, Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add  => "+",  BinOp::Sub   => "-",  BinOp::Mul => "*",
            BinOp::Div  => "/",  BinOp::Mod   => "%",  BinOp::Pow => "^",
            BinOp::Concat => "..",
            BinOp::Eq   => "==", BinOp::NotEq => "~=",
            BinOp::Lt   => "<",  BinOp::LtEq  => "<=",
            BinOp::Gt   => ">",  BinOp::GtEq  => ">=",
            BinOp::And  => "and", BinOp::Or   => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    Len,
}
