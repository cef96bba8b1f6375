//! Comparing the student's n-th lambda function with the solution's.

use crate::checks::args::{compare_signature, SignatureCheck};
use crate::checks::body::check_body;
use crate::checks::{Check, CheckResult};
use crate::error::AuthoringError;
use crate::feedback::{ordinal, Outcome};
use crate::index::LambdaRecord;
use crate::state::State;
use treeval::ast::{CallExpr, Expr};

/// Name that stands for the lambda under test in probe templates.
const PLACEHOLDER: &str = "lam";

/// Checks the `index`-th lambda: signature, body, and the results or
/// errors of calling it with author-supplied arguments.
pub struct LambdaCheck {
    index: usize,
    arg_names: bool,
    arg_defaults: bool,
    body: Option<Box<dyn Check>>,
    results: Vec<String>,
    errors: Vec<String>,
    not_called_msg: Option<String>,
    nb_args_msg: Option<String>,
    arg_names_msg: Option<String>,
    arg_defaults_msg: Option<String>,
    wrong_result_msg: Option<String>,
    no_error_msg: Option<String>,
    expand_message: Option<bool>,
}

impl LambdaCheck {
    pub fn new(index: usize) -> Self {
        LambdaCheck {
            index,
            arg_names: true,
            arg_defaults: true,
            body: None,
            results: Vec::new(),
            errors: Vec::new(),
            not_called_msg: None,
            nb_args_msg: None,
            arg_names_msg: None,
            arg_defaults_msg: None,
            wrong_result_msg: None,
            no_error_msg: None,
            expand_message: None,
        }
    }

    pub fn arg_names(mut self, check: bool) -> Self {
        self.arg_names = check;
        self
    }

    pub fn arg_defaults(mut self, check: bool) -> Self {
        self.arg_defaults = check;
        self
    }

    /// Check run against the two lambda bodies.
    pub fn body(mut self, check: impl Check + 'static) -> Self {
        self.body = Some(Box::new(check));
        self
    }

    /// Calls such as `"lam(1, 2)"` whose results must match.
    pub fn results<S: Into<String>>(mut self, calls: impl IntoIterator<Item = S>) -> Self {
        self.results = calls.into_iter().map(Into::into).collect();
        self
    }

    /// Calls that must raise an error.
    pub fn errors<S: Into<String>>(mut self, calls: impl IntoIterator<Item = S>) -> Self {
        self.errors = calls.into_iter().map(Into::into).collect();
        self
    }

    pub fn not_called_msg(mut self, msg: impl Into<String>) -> Self {
        self.not_called_msg = Some(msg.into());
        self
    }

    pub fn nb_args_msg(mut self, msg: impl Into<String>) -> Self {
        self.nb_args_msg = Some(msg.into());
        self
    }

    pub fn arg_names_msg(mut self, msg: impl Into<String>) -> Self {
        self.arg_names_msg = Some(msg.into());
        self
    }

    pub fn arg_defaults_msg(mut self, msg: impl Into<String>) -> Self {
        self.arg_defaults_msg = Some(msg.into());
        self
    }

    pub fn wrong_result_msg(mut self, msg: impl Into<String>) -> Self {
        self.wrong_result_msg = Some(msg.into());
        self
    }

    pub fn no_error_msg(mut self, msg: impl Into<String>) -> Self {
        self.no_error_msg = Some(msg.into());
        self
    }

    /// Overrides the configured `feedback.expand_message`.
    pub fn expand_message(mut self, expand: bool) -> Self {
        self.expand_message = Some(expand);
        self
    }

    fn fun_name(&self) -> String {
        format!("the {} lambda function", ordinal(self.index))
    }

    fn check_results(&self, state: &State, student: &LambdaRecord, solution: &LambdaRecord) -> CheckResult {
        let executor = state.executor();
        let fun_name = self.fun_name();
        for template in &self.results {
            let probe = parse_probe(template)?;
            let argstr = template.replace(PLACEHOLDER, "");

            let expected = executor
                .evaluate_in_process(state.solution.process(), &with_callee(&probe, &solution.node))
                .map_err(|source| AuthoringError::SolutionProbeFailed {
                    call: template.clone(),
                    source,
                })?;
            let answer = executor
                .evaluate_in_process(state.student.process(), &with_callee(&probe, &student.node));

            let message = match answer {
                Err(err) => {
                    log::debug!("result probe {} raised {}", template, err);
                    format!(
                        "Calling {} with arguments `{}` should result in `{}`, instead got an error.",
                        fun_name, argstr, expected.repr
                    )
                }
                Ok(actual) if actual.value == expected.value => continue,
                Ok(actual) => format!(
                    "Calling {} with arguments `{}` should result in `{}`, instead got `{}`.",
                    fun_name, argstr, expected.repr, actual.repr
                ),
            };
            let message = self.wrong_result_msg.clone().unwrap_or(message);
            return Ok(Outcome::fail(message, Some(student.line)));
        }
        Ok(Outcome::Pass)
    }

    /// Every template is checked; the first student call that does not
    /// raise is reported.
    fn check_errors(&self, state: &State, student: &LambdaRecord, solution: &LambdaRecord) -> CheckResult {
        let executor = state.executor();
        let fun_name = self.fun_name();
        let mut first_failure = None;
        for template in &self.errors {
            let probe = parse_probe(template)?;
            let argstr = template.replace(PLACEHOLDER, "");

            let raised = executor
                .evaluate_in_process(state.solution.process(), &with_callee(&probe, &solution.node))
                .is_err();
            if !raised {
                return Err(AuthoringError::SolutionProbeDidNotRaise {
                    call: template.clone(),
                });
            }
            let answer = executor
                .evaluate_in_process(state.student.process(), &with_callee(&probe, &student.node));
            if answer.is_ok() && first_failure.is_none() {
                let message = self.no_error_msg.clone().unwrap_or_else(|| {
                    format!(
                        "Calling {} with the arguments `{}` doesn't result in an error, but it should!",
                        fun_name, argstr
                    )
                });
                first_failure = Some(Outcome::fail(message, Some(student.line)));
            }
        }
        Ok(first_failure.unwrap_or(Outcome::Pass))
    }
}

fn parse_probe(template: &str) -> Result<CallExpr, AuthoringError> {
    let invalid = |message: String| AuthoringError::InvalidProbe {
        template: template.to_string(),
        message,
    };
    let tree = treeval::parse_expression(template).map_err(|err| invalid(err.to_string()))?;
    match tree {
        Expr::Call(call) => Ok(call),
        _ => Err(invalid("expected a call".to_string())),
    }
}

/// The probe call with its callee replaced by a lambda node.
fn with_callee(probe: &CallExpr, lambda: &Expr) -> Expr {
    Expr::Call(CallExpr {
        func: Box::new(lambda.clone()),
        ..probe.clone()
    })
}

impl Check for LambdaCheck {
    fn run(&self, state: &mut State) -> CheckResult {
        state.extract_function_calls();
        let position = self
            .index
            .checked_sub(1)
            .ok_or(AuthoringError::LambdaNotInSolution { index: self.index })?;
        let solution = state
            .solution_lambdas()
            .get(position)
            .cloned()
            .ok_or(AuthoringError::LambdaNotInSolution { index: self.index })?;
        let Some(student) = state.student_lambdas().get(position).cloned() else {
            let message = self.not_called_msg.clone().unwrap_or_else(|| {
                format!(
                    "The system wants to check the {} lambda function you defined but hasn't found it.",
                    ordinal(self.index)
                )
            });
            return Ok(Outcome::fail(message, None));
        };

        let fun_name = self.fun_name();
        let signature = SignatureCheck {
            name: &fun_name,
            arg_names: self.arg_names,
            arg_defaults: self.arg_defaults,
            nb_args_msg: self.nb_args_msg.as_deref(),
            arg_names_msg: self.arg_names_msg.as_deref(),
            arg_defaults_msg: self.arg_defaults_msg.as_deref(),
            line: student.line,
        };
        let outcome = compare_signature(state, &student.params, &solution.params, &signature)?;
        if !outcome.is_pass() {
            return Ok(outcome);
        }

        if let Some(body) = &self.body {
            let expand = self
                .expand_message
                .unwrap_or(state.config().feedback.expand_message);
            let outcome = check_body(state, body.as_ref(), &student, &solution, &fun_name, expand)?;
            if !outcome.is_pass() {
                return Ok(outcome);
            }
        }

        let outcome = self.check_results(state, &student, &solution)?;
        if !outcome.is_pass() {
            return Ok(outcome);
        }
        self.check_errors(state, &student, &solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CallCheck;
    use crate::config::GraderConfig;
    use crate::feedback::Feedback;
    use pretty_assertions::assert_eq;

    fn run(student: &str, solution: &str, check: LambdaCheck) -> CheckResult {
        let mut state = State::from_sources(student, solution, GraderConfig::default()).unwrap();
        check.run(&mut state)
    }

    #[test]
    fn missing_lambdas() {
        let outcome = run("x = 1", "lam = lambda x: x", LambdaCheck::new(1)).unwrap();
        assert_eq!(
            outcome,
            Outcome::fail(
                "The system wants to check the first lambda function you defined but hasn't found it.",
                None
            )
        );
        assert!(matches!(
            run("lam = lambda x: x", "lam = lambda x: x", LambdaCheck::new(2)),
            Err(AuthoringError::LambdaNotInSolution { index: 2 })
        ));
    }

    #[test]
    fn result_probe_reports_expected_and_actual() {
        let outcome = run(
            "lam = lambda x: x + 2",
            "lam = lambda x: x + 1",
            LambdaCheck::new(1).results(["lam(1)"]),
        )
        .unwrap();
        assert_eq!(
            outcome,
            Outcome::fail(
                "Calling the first lambda function with arguments `(1)` should result in `2`, instead got `3`.",
                Some(1)
            )
        );
    }

    #[test]
    fn result_probe_stops_at_student_error() {
        let outcome = run(
            "lam = lambda x: 1 / x",
            "lam = lambda x: x",
            LambdaCheck::new(1).results(["lam(0)", "lam(1)"]),
        )
        .unwrap();
        assert_eq!(
            outcome,
            Outcome::fail(
                "Calling the first lambda function with arguments `(0)` should result in `0`, instead got an error.",
                Some(1)
            )
        );
    }

    #[test]
    fn error_probe_requires_student_error() {
        let outcome = run(
            "lam = lambda x: x",
            "lam = lambda x: 1/x",
            LambdaCheck::new(1).errors(["lam(0)"]),
        )
        .unwrap();
        assert_eq!(
            outcome,
            Outcome::fail(
                "Calling the first lambda function with the arguments `(0)` doesn't result in an error, but it should!",
                Some(1)
            )
        );
    }

    #[test]
    fn error_probe_checks_every_template() {
        // The first template fails for the student; the second is an
        // authoring mistake that must still be caught.
        let result = run(
            "lam = lambda x: x",
            "lam = lambda x: 1/x",
            LambdaCheck::new(1).errors(["lam(0)", "lam(1)"]),
        );
        assert!(matches!(
            result,
            Err(AuthoringError::SolutionProbeDidNotRaise { call }) if call == "lam(1)"
        ));
    }

    #[test]
    fn solution_probe_failure_is_fatal() {
        assert!(matches!(
            run("lam = lambda x: x", "lam = lambda x: 1/x", LambdaCheck::new(1).results(["lam(0)"])),
            Err(AuthoringError::SolutionProbeFailed { .. })
        ));
        assert!(matches!(
            run("lam = lambda x: x", "lam = lambda x: x", LambdaCheck::new(1).results(["1 +"])),
            Err(AuthoringError::InvalidProbe { .. })
        ));
    }

    #[test]
    fn body_feedback_is_prefixed() {
        let check = LambdaCheck::new(1).body(CallCheck::new("round"));
        let outcome = run(
            "f = lambda x=1.25, n=2: round(x, 3)",
            "f = lambda x=1.25, n=2: round(x, n)",
            check,
        )
        .unwrap();
        match outcome {
            Outcome::Fail(Feedback { message, line }) => {
                assert_eq!(line, Some(1));
                assert!(message.starts_with(
                    "In your definition of the first lambda function, did you call `round()`"
                ));
                assert!(message.ends_with("The second argument seems to be incorrect. Expected `2`, but got `3`."));
            }
            Outcome::Pass => panic!("body check should fail"),
        }

        let plain = LambdaCheck::new(1)
            .body(CallCheck::new("round").args(vec![1]))
            .expand_message(false);
        let outcome = run(
            "f = lambda x=1.25, n=2: round(x, 3)",
            "f = lambda x=1.25, n=2: round(x, n)",
            plain,
        )
        .unwrap();
        match outcome {
            Outcome::Fail(feedback) => assert!(feedback.message.starts_with("Did you call `round()`")),
            Outcome::Pass => panic!("body check should fail"),
        }
    }
}
