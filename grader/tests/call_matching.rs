use grader::{AuthoringError, CallCheck, Check, GraderConfig, LambdaCheck, Outcome, State};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::sync::Arc;
use treeval::ast::Expr;
use treeval::runtime::{Environment, Evaluator, Executor, RuntimeResult, TreeWalkingExecutor, Value};

fn state(student: &str, solution: &str) -> State {
    State::from_sources(student, solution, GraderConfig::default())
        .unwrap_or_else(|e| panic!("programs should run: {}", e))
}

fn failure(outcome: Outcome) -> (String, Option<usize>) {
    match outcome {
        Outcome::Fail(feedback) => (feedback.message, feedback.line),
        Outcome::Pass => panic!("expected the check to fail"),
    }
}

/// Counts argument evaluations on top of the default executor.
#[derive(Debug, Default)]
struct CountingExecutor {
    inner: TreeWalkingExecutor,
    evaluations: Cell<usize>,
}

impl Executor for CountingExecutor {
    fn evaluate(&self, tree: &Expr, env: &Environment) -> RuntimeResult<Value> {
        self.evaluations.set(self.evaluations.get() + 1);
        self.inner.evaluate(tree, env)
    }

    fn evaluator(&self) -> &Evaluator {
        self.inner.evaluator()
    }
}

#[test]
fn test_every_solution_occurrence_is_found() {
    let solution = "print(1)\nprint(2)\nprint(3)";
    let student = "print(1)\nx = 5\nprint(2)\nprint(3)";
    let mut state = state(student, solution);
    for index in 1..=3 {
        let outcome = CallCheck::new("print").index(index).run(&mut state).unwrap();
        assert_eq!(outcome, Outcome::Pass, "occurrence {}", index);
    }
}

#[test]
fn test_not_called_ignores_argument_filters() {
    let solution = "round(2.567, ndigits=2)";
    for check in [
        CallCheck::new("round"),
        CallCheck::new("round").args(vec![0]),
        CallCheck::new("round").args(vec![]).keywords(Vec::<String>::new()),
        CallCheck::new("round").keywords(["ndigits"]),
    ] {
        let mut state = state("x = 2.57", solution);
        let (message, line) = failure(check.run(&mut state).unwrap());
        assert_eq!(message, "Have you called `round()`?");
        assert_eq!(line, None);
    }
}

#[test]
fn test_consumed_call_is_not_reused_by_another_index() {
    let mut state = state("len([1])\nlen([2])", "len([1])\nlen([1])");

    assert_eq!(CallCheck::new("len").run(&mut state).unwrap(), Outcome::Pass);

    // The first student call would match, but index 1 already consumed it.
    let (message, line) = failure(CallCheck::new("len").index(2).run(&mut state).unwrap());
    assert_eq!(line, Some(2));
    assert!(message.contains("Expected `[1]`, but got `[2]`."), "{}", message);

    // Re-running the first index still finds its own call.
    assert_eq!(CallCheck::new("len").run(&mut state).unwrap(), Outcome::Pass);
}

#[test]
fn test_failing_candidate_short_circuits() {
    let executor = Arc::new(CountingExecutor::default());
    let mut state = State::from_sources_with(
        "max(5, 2, 3)",
        "max(1, 2, 3)",
        GraderConfig::default(),
        executor.clone(),
    )
    .unwrap();

    let (message, _) = failure(CallCheck::new("max").run(&mut state).unwrap());
    assert!(message.contains("The first argument seems to be incorrect."));
    // One student and one solution evaluation for the first argument only.
    assert_eq!(executor.evaluations.get(), 2);
}

#[test]
fn test_last_attempted_candidate_is_reported() {
    let mut state = state("round(1.0, 5)\nround(3.0, 2)", "round(1.0, 2)");
    let (message, line) = failure(CallCheck::new("round").run(&mut state).unwrap());
    assert_eq!(
        message,
        "Did you call `round()` with the correct arguments? The call on line 2 has wrong arguments. \
         The first argument seems to be incorrect. Expected `1.0`, but got `3.0`."
    );
    assert_eq!(line, Some(2));
}

#[test]
fn test_equality_modes() {
    let student = "abs(0.1 + 0.2)";
    let solution = "abs(0.3)";

    let mut strict = state(student, solution);
    let (message, _) = failure(CallCheck::new("abs").run(&mut strict).unwrap());
    assert!(message.ends_with("Expected `0.3`, but got `0.30000000000000004`."));

    let mut tolerant = state(student, solution);
    let outcome = CallCheck::new("abs")
        .eq_condition("equivalent")
        .run(&mut tolerant)
        .unwrap();
    assert_eq!(outcome, Outcome::Pass);
}

#[test]
fn test_tolerance_comes_from_config() {
    let config = GraderConfig::from_toml_str("[equivalence]\natol = 0.5\n").unwrap();
    let mut state = State::from_sources("abs(1.3)", "abs(1)", config).unwrap();
    let outcome = CallCheck::new("abs")
        .eq_condition("equivalent")
        .run(&mut state)
        .unwrap();
    assert_eq!(outcome, Outcome::Pass);
}

#[test]
fn test_keyword_clause_only_for_keyword_mismatch() {
    let solution = "round(2.567, ndigits=2)";

    let mut positional = state("round(2.5, ndigits=2)", solution);
    let (message, _) = failure(CallCheck::new("round").run(&mut positional).unwrap());
    assert!(!message.contains("Keyword"), "{}", message);

    let mut keyword = state("round(2.567, ndigits=1)", solution);
    let (message, _) = failure(CallCheck::new("round").run(&mut keyword).unwrap());
    assert!(message.contains("Keyword `ndigits` seems to be incorrect."), "{}", message);
    assert!(!message.contains("argument seems"), "{}", message);
}

#[test]
fn test_structural_mode_hides_values() {
    let mut state = state("x = 1\ny = 1\nabs(x)", "x = 1\ny = 1\nabs(y)");
    let (message, _) = failure(CallCheck::new("abs").do_eval(false).run(&mut state).unwrap());
    assert_eq!(
        message,
        "Did you call `abs()` with the correct arguments? The call on line 3 has wrong arguments. \
         The first argument seems to be incorrect."
    );
}

#[test]
fn test_student_error_is_feedback_and_solution_error_is_fatal() {
    let mut student_side = state("y = 0\nabs(1 / y)", "y = 1\nabs(1 / y)");
    let (message, _) = failure(CallCheck::new("abs").run(&mut student_side).unwrap());
    assert!(message.ends_with("Expected `1.0`, but got an error."), "{}", message);

    // Inside a lambda body the solution parameter has no binding, so
    // evaluating its argument fails on the solution side.
    let mut solution_side = state("f = lambda x=1: abs(x)", "f = lambda x: abs(x)");
    let check = LambdaCheck::new(1).arg_defaults(false).body(CallCheck::new("abs"));
    assert!(matches!(
        check.run(&mut solution_side),
        Err(AuthoringError::SolutionEvaluation { expression, .. }) if expression == "Name(id='x')"
    ));
}

#[test]
fn test_integer_edge_arguments_evaluate() {
    let student = "abs(len([] * 9223372036854775807))\nabs(1 % (-9223372036854775807 - 1))";
    let solution = "abs(0)\nabs(-9223372036854775806)";
    let mut state = state(student, solution);
    assert_eq!(CallCheck::new("abs").run(&mut state).unwrap(), Outcome::Pass);
    assert_eq!(CallCheck::new("abs").index(2).run(&mut state).unwrap(), Outcome::Pass);
}
