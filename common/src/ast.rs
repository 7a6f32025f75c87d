/// One top-level statement of a deck. `line` is where the statement starts.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `import math`
    Import { module: String, line: usize },
    /// `L0 = 2. * math.pi`
    Assign {
        name: String,
        value: Expr,
        line: usize,
    },
    /// Any other expression, in practice a record block such as `Main(...)`
    Expr { expr: Expr, line: usize },
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Stmt::Import { line, .. } | Stmt::Assign { line, .. } | Stmt::Expr { line, .. } => {
                *line
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
    List(Vec<Expr>),
    /// `base.attr`
    Attr { base: Box<Expr>, attr: String },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "**",
        }
    }
}
