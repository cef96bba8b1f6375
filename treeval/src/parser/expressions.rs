use super::errors::{invalid_input_error, invalid_literal_error, pair_line, ParseError};
use super::Rule;
use crate::ast::{
    BinaryOperator, CallExpr, Constant, Expr, KeywordArg, LambdaExpr, Param, UnaryOperator,
};
use pest::iterators::{Pair, Pairs};

pub(super) fn build_expression(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let current = pair.clone();
    match pair.as_rule() {
        Rule::expression | Rule::group_expr => {
            let inner = pair
                .into_inner()
                .next()
                .ok_or_else(|| invalid_input_error("Expected inner expression", &current))?;
            build_expression(inner)
        }
        Rule::lambda_expr => build_lambda(pair),
        Rule::arith | Rule::term => build_binary_chain(pair),
        Rule::factor => {
            let mut inner = pair.into_inner();
            let first = inner
                .next()
                .ok_or_else(|| invalid_input_error("Empty factor", &current))?;
            if first.as_rule() != Rule::unary_op {
                return build_expression(first);
            }
            let op = match first.as_str() {
                "-" => UnaryOperator::Neg,
                _ => UnaryOperator::Pos,
            };
            let operand = inner
                .next()
                .ok_or_else(|| invalid_input_error("Unary operator without operand", &current))?;
            Ok(Expr::UnaryOp {
                op,
                operand: Box::new(build_expression(operand)?),
            })
        }
        Rule::power => {
            let mut inner = pair.into_inner();
            let base = inner
                .next()
                .ok_or_else(|| invalid_input_error("Empty power expression", &current))?;
            let base = build_expression(base)?;
            match inner.next() {
                Some(exponent) => Ok(Expr::BinOp {
                    left: Box::new(base),
                    op: BinaryOperator::Pow,
                    right: Box::new(build_expression(exponent)?),
                }),
                None => Ok(base),
            }
        }
        Rule::postfix => build_postfix(pair),
        Rule::integer => pair
            .as_str()
            .parse::<i64>()
            .map(|n| Expr::Constant(Constant::Int(n)))
            .map_err(|e| invalid_literal_error(&e.to_string(), &current)),
        Rule::float => pair
            .as_str()
            .parse::<f64>()
            .map(|f| Expr::Constant(Constant::Float(f)))
            .map_err(|e| invalid_literal_error(&e.to_string(), &current)),
        Rule::string => {
            let raw = pair
                .into_inner()
                .next()
                .map(|p| p.as_str())
                .unwrap_or_default();
            Ok(Expr::Constant(Constant::Str(unescape(raw, &current)?)))
        }
        Rule::none_lit => Ok(Expr::Constant(Constant::None)),
        Rule::true_lit => Ok(Expr::Constant(Constant::Bool(true))),
        Rule::false_lit => Ok(Expr::Constant(Constant::Bool(false))),
        Rule::identifier => Ok(Expr::Name(pair.as_str().to_string())),
        Rule::list_expr => Ok(Expr::List(build_all(pair.into_inner())?)),
        Rule::tuple_expr => Ok(Expr::Tuple(build_all(pair.into_inner())?)),
        other => Err(invalid_input_error(
            &format!("Unsupported expression rule {:?}", other),
            &current,
        )),
    }
}

fn build_all(pairs: Pairs<Rule>) -> Result<Vec<Expr>, ParseError> {
    pairs.map(build_expression).collect()
}

/// Left-associative fold over `operand (op operand)*`.
fn build_binary_chain(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let current = pair.clone();
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| invalid_input_error("Empty operator chain", &current))?;
    let mut acc = build_expression(first)?;
    while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_str() {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Sub,
            "*" => BinaryOperator::Mult,
            "/" => BinaryOperator::Div,
            "//" => BinaryOperator::FloorDiv,
            "%" => BinaryOperator::Mod,
            other => {
                return Err(invalid_input_error(
                    &format!("Unknown operator {}", other),
                    &op_pair,
                ))
            }
        };
        let rhs = inner
            .next()
            .ok_or_else(|| invalid_input_error("Operator without right operand", &op_pair))?;
        acc = Expr::BinOp {
            left: Box::new(acc),
            op,
            right: Box::new(build_expression(rhs)?),
        };
    }
    Ok(acc)
}

fn build_postfix(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let current = pair.clone();
    let line = pair_line(&pair);
    let mut inner = pair.into_inner();
    let atom = inner
        .next()
        .ok_or_else(|| invalid_input_error("Postfix expression without atom", &current))?;
    let mut acc = build_expression(atom)?;
    for trailer in inner {
        acc = match trailer.as_rule() {
            Rule::attr_trailer => {
                let attr = trailer
                    .into_inner()
                    .next()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                Expr::Attribute {
                    value: Box::new(acc),
                    attr,
                }
            }
            Rule::call_trailer => {
                let (args, keywords) = build_arguments(trailer)?;
                Expr::Call(CallExpr {
                    func: Box::new(acc),
                    args,
                    keywords,
                    line,
                })
            }
            other => {
                return Err(invalid_input_error(
                    &format!("Unexpected trailer {:?}", other),
                    &trailer,
                ))
            }
        };
    }
    Ok(acc)
}

fn build_arguments(pair: Pair<Rule>) -> Result<(Vec<Expr>, Vec<KeywordArg>), ParseError> {
    let mut args = Vec::new();
    let mut keywords: Vec<KeywordArg> = Vec::new();
    for arg in pair.into_inner() {
        if arg.as_rule() == Rule::keyword_arg {
            let current = arg.clone();
            let mut inner = arg.into_inner();
            let name = inner
                .next()
                .ok_or_else(|| invalid_input_error("Keyword argument without name", &current))?
                .as_str()
                .to_string();
            if keywords.iter().any(|k| k.name == name) {
                return Err(invalid_input_error(
                    &format!("keyword argument repeated: {}", name),
                    &current,
                ));
            }
            let value = inner
                .next()
                .ok_or_else(|| invalid_input_error("Keyword argument without value", &current))?;
            keywords.push(KeywordArg {
                name,
                value: build_expression(value)?,
            });
        } else if !keywords.is_empty() {
            return Err(invalid_input_error(
                "positional argument follows keyword argument",
                &arg,
            ));
        } else {
            args.push(build_expression(arg)?);
        }
    }
    Ok((args, keywords))
}

fn build_lambda(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let current = pair.clone();
    let line = pair_line(&pair);
    let mut params = Vec::new();
    let mut body = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::kw_lambda => {}
            Rule::param_list => {
                for param in inner.into_inner() {
                    let param_pair = param.clone();
                    let mut parts = param.into_inner();
                    let name = parts
                        .next()
                        .ok_or_else(|| invalid_input_error("Parameter without name", &param_pair))?
                        .as_str()
                        .to_string();
                    if params.iter().any(|p: &Param| p.name == name) {
                        return Err(invalid_input_error(
                            &format!("duplicate argument '{}' in function definition", name),
                            &param_pair,
                        ));
                    }
                    let default = parts.next().map(build_expression).transpose()?;
                    if default.is_none() && params.iter().any(|p: &Param| p.default.is_some()) {
                        return Err(invalid_input_error(
                            "non-default argument follows default argument",
                            &param_pair,
                        ));
                    }
                    params.push(Param { name, default });
                }
            }
            _ => body = Some(build_expression(inner)?),
        }
    }
    let body = body.ok_or_else(|| invalid_input_error("Lambda without body", &current))?;
    Ok(Expr::Lambda(LambdaExpr {
        params,
        body: Box::new(body),
        line,
    }))
}

fn unescape(raw: &str, pair: &Pair<Rule>) -> Result<String, ParseError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some(other) => {
                // Unknown escapes are kept verbatim, as Python does.
                out.push('\\');
                out.push(other);
            }
            None => return Err(invalid_literal_error("trailing backslash in string", pair)),
        }
    }
    Ok(out)
}
