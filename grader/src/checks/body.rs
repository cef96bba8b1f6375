//! Running a nested check against the bodies of two function definitions.

use crate::checks::{Check, CheckResult};
use crate::error::AuthoringError;
use crate::feedback::{lowercase_first, Feedback, Outcome};
use crate::index::LambdaRecord;
use crate::state::State;
use treeval::ast::Param;
use treeval::runtime::{Environment, Executor};

/// Runs `check` on a child state whose trees are the two bodies and whose
/// environments bind each parameter to its evaluated default. With
/// `expand_message`, failures are prefixed with where they happened.
pub fn check_body(
    state: &State,
    check: &dyn Check,
    student: &LambdaRecord,
    solution: &LambdaRecord,
    name: &str,
    expand_message: bool,
) -> CheckResult {
    let executor = state.executor();
    let student_env = bind_defaults(executor, &state.student.env, &student.params, false)?;
    let solution_env = bind_defaults(executor, &state.solution.env, &solution.params, true)?;

    let mut child = state.child(
        (student.body.clone(), student.line, student_env),
        (solution.body.clone(), solution.line, solution_env),
    );
    match check.run(&mut child)? {
        Outcome::Fail(feedback) if expand_message => Ok(Outcome::Fail(Feedback {
            message: format!(
                "In your definition of {}, {}",
                name,
                lowercase_first(&feedback.message)
            ),
            line: feedback.line,
        })),
        outcome => Ok(outcome),
    }
}

/// Child scope of `env` with parameters bound to their defaults. A failing
/// student default leaves the parameter unbound; on the solution side it is
/// an authoring error.
fn bind_defaults(
    executor: &dyn Executor,
    env: &Environment,
    params: &[Param],
    is_solution: bool,
) -> Result<Environment, AuthoringError> {
    let mut scope = env.new_child();
    for param in params {
        let Some(default) = &param.default else {
            continue;
        };
        match executor.evaluate(default, env) {
            Ok(value) => scope.define(param.name.clone(), value),
            Err(source) if is_solution => {
                return Err(AuthoringError::SolutionEvaluation {
                    expression: default.dump(),
                    source,
                })
            }
            Err(err) => log::debug!("default of '{}' raised {}", param.name, err),
        }
    }
    Ok(scope)
}
