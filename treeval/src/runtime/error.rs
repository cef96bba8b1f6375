// Error handling for the tree-walking runtime

use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Runtime errors raised while evaluating a tree. Each variant corresponds to
/// a Python exception class so feedback can name it the way a learner expects.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Undefined variable
    #[error("NameError: name '{0}' is not defined")]
    UndefinedName(String),

    #[error("AttributeError: {owner} has no attribute '{attribute}'")]
    AttributeError { owner: String, attribute: String },

    /// Wrong type for operation
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Wrong number or shape of call arguments
    #[error("TypeError: {function}() {message}")]
    ArityMismatch { function: String, message: String },

    #[error("ZeroDivisionError: {0}")]
    DivisionByZero(String),

    #[error("ValueError: {0}")]
    ValueError(String),

    #[error("OverflowError: {0}")]
    Overflow(String),

    #[error("ModuleNotFoundError: No module named '{0}'")]
    ModuleNotFound(String),

    #[error("ImportError: cannot import name '{name}' from '{module}'")]
    ImportError { module: String, name: String },

    #[error("RecursionError: maximum recursion depth exceeded")]
    RecursionLimit,

    /// The isolated process serving the request is gone.
    #[error("process '{0}' terminated unexpectedly")]
    ProcessTerminated(String),
}

impl RuntimeError {
    /// Python exception class name of this error.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::UndefinedName(_) => "NameError",
            RuntimeError::AttributeError { .. } => "AttributeError",
            RuntimeError::TypeError(_) | RuntimeError::ArityMismatch { .. } => "TypeError",
            RuntimeError::DivisionByZero(_) => "ZeroDivisionError",
            RuntimeError::ValueError(_) => "ValueError",
            RuntimeError::Overflow(_) => "OverflowError",
            RuntimeError::ModuleNotFound(_) => "ModuleNotFoundError",
            RuntimeError::ImportError { .. } => "ImportError",
            RuntimeError::RecursionLimit => "RecursionError",
            RuntimeError::ProcessTerminated(_) => "ProcessError",
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::TypeError(message.into())
    }
}
