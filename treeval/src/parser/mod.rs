use crate::ast::{Expr, Module};
use pest::Parser;

// Declare submodules
pub mod errors;
pub mod expressions;
pub mod toplevel;

pub use errors::ParseError;
use expressions::build_expression;
use toplevel::build_statement;

// Define the parser struct using the grammar file
#[derive(pest_derive::Parser)]
#[grammar = "treeval.pest"] // Path relative to src/
pub struct TreevalParser;

// --- Main Parsing Functions ---

/// Parse a full program (a sequence of statements).
pub fn parse(input: &str) -> Result<Module, ParseError> {
    let mut pairs = TreevalParser::parse(Rule::program, input)?;
    let program = pairs.next().ok_or_else(|| ParseError::InvalidInput {
        message: "Parse should have yielded one program rule".to_string(),
        line: 1,
    })?;

    let body = program
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(build_statement)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Module { body })
}

/// Parse a single expression, e.g. a probe template such as `lam(1, b=2)`.
pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
    let mut pairs = TreevalParser::parse(Rule::expression_input, input)?;
    let expr_pair = pairs
        .next()
        .and_then(|p| p.into_inner().find(|inner| inner.as_rule() == Rule::expression))
        .ok_or_else(|| ParseError::InvalidInput {
            message: "No expression found".to_string(),
            line: 1,
        })?;
    build_expression(expr_pair)
}
