//! Comparing function signatures: argument count, names and defaults.

use crate::checks::CheckResult;
use crate::compare::Evaluation;
use crate::error::AuthoringError;
use crate::feedback::{ordinal, Outcome};
use crate::state::State;
use treeval::ast::Param;

/// What to compare, and the author's message overrides.
#[derive(Debug, Clone, Default)]
pub struct SignatureCheck<'a> {
    /// How feedback refers to the function, e.g. `the first lambda function`.
    pub name: &'a str,
    pub arg_names: bool,
    pub arg_defaults: bool,
    pub nb_args_msg: Option<&'a str>,
    pub arg_names_msg: Option<&'a str>,
    pub arg_defaults_msg: Option<&'a str>,
    /// Line reported with any failure.
    pub line: usize,
}

impl SignatureCheck<'_> {
    fn fail(&self, custom: Option<&str>, default: String) -> CheckResult {
        let message = custom.map(str::to_string).unwrap_or(default);
        Ok(Outcome::fail(message, Some(self.line)))
    }
}

pub fn compare_signature(
    state: &State,
    student: &[Param],
    solution: &[Param],
    check: &SignatureCheck<'_>,
) -> CheckResult {
    if !check.arg_names && !check.arg_defaults {
        return Ok(Outcome::Pass);
    }

    if student.len() != solution.len() {
        return check.fail(
            check.nb_args_msg,
            format!(
                "You should define {} with {} arguments, instead got {}.",
                check.name,
                solution.len(),
                student.len()
            ),
        );
    }

    if check.arg_names {
        for (position, (stud, sol)) in student.iter().zip(solution).enumerate() {
            if stud.name != sol.name {
                return check.fail(
                    check.arg_names_msg,
                    format!(
                        "In your definition of {}, the {} argument should be called `{}`, instead got `{}`.",
                        check.name,
                        ordinal(position + 1),
                        sol.name,
                        stud.name
                    ),
                );
            }
        }
    }

    if check.arg_defaults {
        let executor = state.executor();
        for (position, (stud, sol)) in student.iter().zip(solution).enumerate() {
            let prefix = format!(
                "In your definition of {}, the {} argument",
                check.name,
                ordinal(position + 1)
            );
            let expected = match &sol.default {
                Some(default) => Some(
                    executor
                        .evaluate(default, &state.solution.env)
                        .map_err(|source| AuthoringError::SolutionEvaluation {
                            expression: default.dump(),
                            source,
                        })?,
                ),
                None => None,
            };
            let actual = stud.default.as_ref().map(|default| {
                match executor.evaluate(default, &state.student.env) {
                    Ok(value) => Evaluation::Value(value),
                    Err(_) => Evaluation::Failed,
                }
            });

            let mismatch = match (&expected, &actual) {
                (None, None) => None,
                (None, Some(_)) => Some(format!("{} should have no default.", prefix)),
                (Some(expected), None) => Some(format!(
                    "{} should have `{}` as default.",
                    prefix,
                    expected.repr()
                )),
                (Some(expected), Some(Evaluation::Value(value))) if value == expected => None,
                (Some(expected), Some(actual)) => Some(format!(
                    "{} should have `{}` as default, instead got {}.",
                    prefix,
                    expected.repr(),
                    actual.describe()
                )),
            };
            if let Some(message) = mismatch {
                return check.fail(check.arg_defaults_msg, message);
            }
        }
    }

    Ok(Outcome::Pass)
}
