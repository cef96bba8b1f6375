use crate::checks::Check;
use crate::error::AuthoringError;
use crate::feedback::{Feedback, Outcome};
use crate::state::State;
use serde::Serialize;

/// Final result of a grading run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub passed: bool,
    pub message: Option<String>,
    pub line: Option<usize>,
    pub checks_run: usize,
}

impl Report {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Runs checks in order and keeps the first student-facing failure.
/// Checks after a failure are skipped; authoring errors abort the run.
#[derive(Debug, Default)]
pub struct Reporter {
    checks_run: usize,
    failure: Option<Feedback>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Runs `check` unless an earlier one already failed.
    pub fn do_check(&mut self, state: &mut State, check: &dyn Check) -> Result<&Self, AuthoringError> {
        if self.failed() {
            return Ok(self);
        }
        self.checks_run += 1;
        if let Outcome::Fail(feedback) = check.run(state)? {
            log::info!("check {} failed: {}", self.checks_run, feedback.message);
            self.failure = Some(feedback);
        }
        Ok(self)
    }

    pub fn run_all(state: &mut State, checks: &[&dyn Check]) -> Result<Report, AuthoringError> {
        let mut reporter = Reporter::new();
        for check in checks {
            if reporter.do_check(state, *check)?.failed() {
                break;
            }
        }
        Ok(reporter.report())
    }

    pub fn report(&self) -> Report {
        match &self.failure {
            Some(feedback) => Report {
                passed: false,
                message: Some(feedback.message.clone()),
                line: feedback.line,
                checks_run: self.checks_run,
            },
            None => Report {
                passed: true,
                message: None,
                line: None,
                checks_run: self.checks_run,
            },
        }
    }
}
