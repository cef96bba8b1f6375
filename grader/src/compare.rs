use crate::equality::EqualityMode;
use crate::error::AuthoringError;
use crate::state::State;
use treeval::ast::Expr;
use treeval::runtime::Value;

/// Outcome of evaluating a student expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Value(Value),
    Failed,
}

impl Evaluation {
    /// Text used in feedback: the value's repr in backticks, or `an error`.
    pub fn describe(&self) -> String {
        match self {
            Evaluation::Value(value) => format!("`{}`", value.repr()),
            Evaluation::Failed => "an error".to_string(),
        }
    }
}

/// Result of comparing one argument. `expected` and `result` are only
/// filled when both sides were evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub matched: bool,
    pub expected: Option<String>,
    pub result: Option<String>,
}

/// Compares a student argument tree against the solution's. The student
/// side is evaluated first; its errors count as a mismatch, while an error
/// on the solution side is an authoring error.
pub fn compare_argument(
    state: &State,
    student: &Expr,
    solution: &Expr,
    mode: EqualityMode,
    do_eval: bool,
) -> Result<Comparison, AuthoringError> {
    if !do_eval {
        return Ok(Comparison {
            matched: student.dump() == solution.dump(),
            expected: None,
            result: None,
        });
    }

    let executor = state.executor();
    let evaluated = match executor.evaluate(student, &state.student.env) {
        Ok(value) => Evaluation::Value(value),
        Err(err) => {
            log::debug!("student argument raised {}", err);
            Evaluation::Failed
        }
    };
    let expected = executor
        .evaluate(solution, &state.solution.env)
        .map_err(|source| AuthoringError::SolutionEvaluation {
            expression: solution.dump(),
            source,
        })?;

    let matched = match &evaluated {
        Evaluation::Value(value) => {
            mode.values_match(value, &expected, &state.config().equivalence)
        }
        Evaluation::Failed => false,
    };
    Ok(Comparison {
        matched,
        expected: Some(expected.repr()),
        result: Some(evaluated.describe()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraderConfig;
    use pretty_assertions::assert_eq;
    use treeval::parse_expression;

    fn state() -> State {
        State::from_sources("x = 0.1\ny = 0", "x = 0.1\ny = 1", GraderConfig::default()).unwrap()
    }

    fn compare(student: &str, solution: &str, mode: EqualityMode, do_eval: bool) -> Result<Comparison, AuthoringError> {
        compare_argument(
            &state(),
            &parse_expression(student).unwrap(),
            &parse_expression(solution).unwrap(),
            mode,
            do_eval,
        )
    }

    #[test]
    fn records_expected_and_result() {
        let cmp = compare("x + 0.2", "0.3", EqualityMode::Equal, true).unwrap();
        assert!(!cmp.matched);
        assert_eq!(cmp.expected.as_deref(), Some("0.3"));
        assert_eq!(cmp.result.as_deref(), Some("`0.30000000000000004`"));
        assert!(compare("x + 0.2", "0.3", EqualityMode::Equivalent, true).unwrap().matched);
    }

    #[test]
    fn student_errors_are_contained() {
        let cmp = compare("1 / y", "1 / y", EqualityMode::Equal, true).unwrap();
        assert!(!cmp.matched);
        assert_eq!(cmp.result.as_deref(), Some("an error"));
        assert_eq!(cmp.expected.as_deref(), Some("1.0"));
    }

    #[test]
    fn solution_errors_are_authoring_errors() {
        let err = compare("1", "undefined_name", EqualityMode::Equal, true).unwrap_err();
        assert!(matches!(err, AuthoringError::SolutionEvaluation { .. }));
    }

    #[test]
    fn structural_mode_ignores_values() {
        let cmp = compare("x", "x", EqualityMode::Equal, false).unwrap();
        assert!(cmp.matched);
        assert_eq!(cmp.expected, None);
        assert!(!compare("0.1", "x", EqualityMode::Equal, false).unwrap().matched);
    }
}
