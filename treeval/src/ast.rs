use itertools::Itertools;
use serde::{Deserialize, Serialize};

// --- Constants ---

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Constant {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

// --- Operators ---

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BinaryOperator {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mult => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::FloorDiv => "//",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "**",
        }
    }

    fn dump_name(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "Add",
            BinaryOperator::Sub => "Sub",
            BinaryOperator::Mult => "Mult",
            BinaryOperator::Div => "Div",
            BinaryOperator::FloorDiv => "FloorDiv",
            BinaryOperator::Mod => "Mod",
            BinaryOperator::Pow => "Pow",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnaryOperator {
    Neg,
    Pos,
}

// --- Expressions ---

/// A keyword argument at a call site (`name=value`).
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct KeywordArg {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CallExpr {
    pub func: Box<Expr>,
    pub args: Vec<Expr>,
    pub keywords: Vec<KeywordArg>,
    /// 1-based source line of the call.
    pub line: usize,
}

/// Lambda parameter with its optional default expression.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LambdaExpr {
    pub params: Vec<Param>,
    pub body: Box<Expr>,
    pub line: usize,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expr {
    Constant(Constant),
    Name(String),
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Call(CallExpr),
    Lambda(LambdaExpr),
    BinOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
}

impl Expr {
    pub fn name(id: &str) -> Self {
        Expr::Name(id.to_string())
    }

    pub fn int(n: i64) -> Self {
        Expr::Constant(Constant::Int(n))
    }

    pub fn as_call(&self) -> Option<&CallExpr> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_lambda(&self) -> Option<&LambdaExpr> {
        match self {
            Expr::Lambda(lambda) => Some(lambda),
            _ => None,
        }
    }

    /// Dotted spelling of a name or attribute chain (`np.linalg.norm`), if the
    /// expression is one.
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            Expr::Name(id) => Some(id.clone()),
            Expr::Attribute { value, attr } => value.dotted_name().map(|v| format!("{}.{}", v, attr)),
            _ => None,
        }
    }

    /// Structural dump that ignores source positions, so two trees written on
    /// different lines dump identically.
    pub fn dump(&self) -> String {
        match self {
            Expr::Constant(c) => format!("Constant(value={})", dump_constant(c)),
            Expr::Name(id) => format!("Name(id='{}')", id),
            Expr::Attribute { value, attr } => {
                format!("Attribute(value={}, attr='{}')", value.dump(), attr)
            }
            Expr::Call(call) => format!(
                "Call(func={}, args=[{}], keywords=[{}])",
                call.func.dump(),
                call.args.iter().map(Expr::dump).join(", "),
                call.keywords
                    .iter()
                    .map(|k| format!("keyword(arg='{}', value={})", k.name, k.value.dump()))
                    .join(", ")
            ),
            Expr::Lambda(lambda) => format!(
                "Lambda(args=[{}], defaults=[{}], body={})",
                lambda
                    .params
                    .iter()
                    .map(|p| format!("arg(arg='{}')", p.name))
                    .join(", "),
                lambda
                    .params
                    .iter()
                    .filter_map(|p| p.default.as_ref().map(Expr::dump))
                    .join(", "),
                lambda.body.dump()
            ),
            Expr::BinOp { left, op, right } => format!(
                "BinOp(left={}, op={}(), right={})",
                left.dump(),
                op.dump_name(),
                right.dump()
            ),
            Expr::UnaryOp { op, operand } => {
                let name = match op {
                    UnaryOperator::Neg => "USub",
                    UnaryOperator::Pos => "UAdd",
                };
                format!("UnaryOp(op={}(), operand={})", name, operand.dump())
            }
            Expr::List(items) => format!("List(elts=[{}])", items.iter().map(Expr::dump).join(", ")),
            Expr::Tuple(items) => format!("Tuple(elts=[{}])", items.iter().map(Expr::dump).join(", ")),
        }
    }
}

fn dump_constant(c: &Constant) -> String {
    match c {
        Constant::None => "None".to_string(),
        Constant::Bool(true) => "True".to_string(),
        Constant::Bool(false) => "False".to_string(),
        Constant::Int(n) => n.to_string(),
        Constant::Float(f) => format!("{:?}", f),
        Constant::Str(s) => format!("'{}'", s),
    }
}

// --- Statements ---

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ImportAlias {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportAlias {
    /// Name bound in the importing scope.
    pub fn bound_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatementKind {
    /// `import a [as b], ...`
    Import(Vec<ImportAlias>),
    /// `from module import a [as b], ...`
    ImportFrom {
        module: String,
        names: Vec<ImportAlias>,
    },
    Assign {
        target: String,
        value: Expr,
    },
    Expr(Expr),
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub line: usize,
}

#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    pub body: Vec<Statement>,
}

impl Module {
    /// Wraps a single expression as a one-statement module.
    pub fn from_expr(expr: Expr, line: usize) -> Self {
        Module {
            body: vec![Statement {
                kind: StatementKind::Expr(expr),
                line,
            }],
        }
    }

    pub fn expressions(&self) -> impl Iterator<Item = &Expr> {
        self.body.iter().filter_map(|stmt| match &stmt.kind {
            StatementKind::Assign { value, .. } => Some(value),
            StatementKind::Expr(expr) => Some(expr),
            _ => None,
        })
    }
}
