// Treeval
// Parser and tree-walking runtime for the Python subset graded programs use.
pub mod ast;
#[cfg(feature = "pest")]
pub mod parser;
pub mod runtime;

pub use ast::{CallExpr, Expr, LambdaExpr, Module};
#[cfg(feature = "pest")]
pub use parser::{errors::ParseError, parse, parse_expression};
pub use runtime::{Executor, TreeWalkingExecutor};
