//! Checks an exercise author can run against a [`State`].

pub mod args;
pub mod body;
pub mod call;
pub mod lambda;

pub use call::CallCheck;
pub use lambda::LambdaCheck;

use crate::error::AuthoringError;
use crate::feedback::Outcome;
use crate::state::State;

/// `Ok(Outcome::Fail(..))` is student feedback; `Err` aborts the whole check.
pub type CheckResult = Result<Outcome, AuthoringError>;

pub trait Check {
    fn run(&self, state: &mut State) -> CheckResult;
}

impl<F> Check for F
where
    F: Fn(&mut State) -> CheckResult,
{
    fn run(&self, state: &mut State) -> CheckResult {
        self(state)
    }
}
