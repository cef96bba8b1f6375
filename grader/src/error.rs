// Error types for the grading engine

use thiserror::Error;
use treeval::parser::ParseError;
use treeval::runtime::RuntimeError;

/// Defects in the solution or in the check definition itself. These abort
/// the whole check and are never shown to learners.
#[derive(Debug, Error)]
pub enum AuthoringError {
    #[error("ReferenceError: `{name}()` is not called {index} time(s) in the solution")]
    CallNotInSolution { name: String, index: usize },

    #[error("the solution call of `{name}()` has no argument at position {position}")]
    ArgumentNotInSolution { name: String, position: usize },

    #[error("the solution call of `{name}()` has no keyword argument `{keyword}`")]
    KeywordNotInSolution { name: String, keyword: String },

    #[error("evaluating `{expression}` in the solution raised {source}")]
    SolutionEvaluation {
        expression: String,
        #[source]
        source: RuntimeError,
    },

    #[error("invalid equality condition `{0}`: expected `equal` or `equivalent`")]
    InvalidEqualityCondition(String),

    #[error("the solution does not define lambda function number {index}")]
    LambdaNotInSolution { index: usize },

    #[error("calling the solution lambda with `{call}` raised {source}")]
    SolutionProbeFailed {
        call: String,
        #[source]
        source: RuntimeError,
    },

    #[error("calling the solution lambda with `{call}` does not raise an error")]
    SolutionProbeDidNotRaise { call: String },

    #[error("invalid probe `{template}`: {message}")]
    InvalidProbe { template: String, message: String },
}

/// Failures while building a program from source.
#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("failed to parse program: {0}")]
    Parse(#[from] ParseError),

    #[error("program raised {0}")]
    Runtime(#[from] RuntimeError),

    #[error("failed to start isolated process: {0}")]
    Spawn(#[from] std::io::Error),
}
