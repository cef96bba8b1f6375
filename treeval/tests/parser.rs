// tests/parser.rs

use pretty_assertions::assert_eq;
use treeval::ast::{Constant, Expr, KeywordArg, StatementKind};
use treeval::runtime::{Environment, StandardLibrary, Value};
use treeval::{parse, parse_expression, Executor, ParseError, TreeWalkingExecutor};

#[test]
fn test_parse_graded_program() {
    let input = r#"
import numpy as np
from math import sqrt as root

arr = np.array([1, 2, 3])
mean = np.mean(arr)
scale = lambda x, k=2: x * k
print(round(root(mean), ndigits=2))
"#;
    let module = parse(input).expect("program should parse");
    assert_eq!(module.body.len(), 6);
    assert_eq!(module.body[0].line, 2);

    match &module.body[1].kind {
        StatementKind::ImportFrom { module, names } => {
            assert_eq!(module, "math");
            assert_eq!(names[0].bound_name(), "root");
        }
        other => panic!("Expected an import-from statement, got {:?}", other),
    }

    match &module.body[4].kind {
        StatementKind::Assign { target, value } => {
            assert_eq!(target, "scale");
            let lambda = value.as_lambda().expect("lambda on the right-hand side");
            assert_eq!(lambda.line, 7);
            assert_eq!(lambda.params[1].default, Some(Expr::int(2)));
        }
        other => panic!("Expected an assignment, got {:?}", other),
    }

    match &module.body[5].kind {
        StatementKind::Expr(expr) => {
            let print = expr.as_call().expect("print call");
            let round = print.args[0].as_call().expect("round call");
            assert_eq!(round.line, 8);
            assert_eq!(
                round.keywords,
                vec![KeywordArg {
                    name: "ndigits".to_string(),
                    value: Expr::int(2),
                }]
            );
        }
        other => panic!("Expected an expression statement, got {:?}", other),
    }
}

#[test]
fn test_dotted_callee() {
    let expr = parse_expression("np.linalg.norm(v)").unwrap();
    let call = expr.as_call().unwrap();
    assert_eq!(call.func.dotted_name(), Some("np.linalg.norm".to_string()));
    assert_eq!(parse_expression("f(x)(y)").unwrap().as_call().unwrap().func.dotted_name(), None);
}

#[test]
fn test_string_and_float_constants() {
    assert_eq!(
        parse_expression("'it\\'s'").unwrap(),
        Expr::Constant(Constant::Str("it's".to_string()))
    );
    assert_eq!(parse_expression("2.5").unwrap(), Expr::Constant(Constant::Float(2.5)));
}

#[test]
fn test_unbalanced_call_is_a_syntax_error() {
    let err = parse("x = 1\ny = (2 +\n").unwrap_err();
    assert!(matches!(err, ParseError::Syntax(_)), "{}", err);
}

#[test]
fn test_run_and_evaluate() {
    let executor = TreeWalkingExecutor::default();
    let mut env: Environment = StandardLibrary::create_global_environment();
    let module = parse("import math\nf = lambda r: math.pi * r ** 2").unwrap();
    executor.evaluator().execute(&module, &mut env).unwrap();

    let area = executor
        .evaluate(&parse_expression("round(f(2), 3)").unwrap(), &env)
        .unwrap();
    assert_eq!(area, Value::Float(12.566));
}
