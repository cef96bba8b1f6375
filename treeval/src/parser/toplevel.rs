use super::errors::{invalid_input_error, pair_line, ParseError};
use super::expressions::build_expression;
use super::Rule;
use crate::ast::{ImportAlias, Statement, StatementKind};
use pest::iterators::Pair;

pub(super) fn build_statement(pair: Pair<Rule>) -> Result<Statement, ParseError> {
    let line = pair_line(&pair);
    let kind = match pair.as_rule() {
        Rule::import_stmt => StatementKind::Import(
            significant(pair)
                .map(build_alias)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Rule::import_from => {
            let current = pair.clone();
            let mut inner = significant(pair);
            let module = inner
                .next()
                .ok_or_else(|| invalid_input_error("from-import without module", &current))?
                .as_str()
                .to_string();
            let names = inner.map(build_alias).collect::<Result<Vec<_>, _>>()?;
            StatementKind::ImportFrom { module, names }
        }
        Rule::assign_stmt => {
            let current = pair.clone();
            let mut inner = pair.into_inner();
            let target = inner
                .next()
                .ok_or_else(|| invalid_input_error("assignment without target", &current))?
                .as_str()
                .to_string();
            let value_pair = inner
                .next()
                .ok_or_else(|| invalid_input_error("assignment without value", &current))?;
            StatementKind::Assign {
                target,
                value: build_expression(value_pair)?,
            }
        }
        Rule::expr_stmt => {
            let current = pair.clone();
            let expr_pair = pair
                .into_inner()
                .next()
                .ok_or_else(|| invalid_input_error("empty expression statement", &current))?;
            StatementKind::Expr(build_expression(expr_pair)?)
        }
        other => {
            return Err(invalid_input_error(
                &format!("unexpected top-level rule {:?}", other),
                &pair,
            ))
        }
    };
    Ok(Statement { kind, line })
}

/// Inner pairs without keyword tokens.
fn significant(pair: Pair<Rule>) -> impl Iterator<Item = Pair<Rule>> {
    pair.into_inner()
        .filter(|p| !matches!(p.as_rule(), Rule::kw_import | Rule::kw_from | Rule::kw_as))
}

fn build_alias(pair: Pair<Rule>) -> Result<ImportAlias, ParseError> {
    let current = pair.clone();
    let mut inner = significant(pair);
    let name = inner
        .next()
        .ok_or_else(|| invalid_input_error("import without name", &current))?
        .as_str()
        .to_string();
    let alias = inner.next().map(|p| p.as_str().to_string());
    Ok(ImportAlias { name, alias })
}
