//! Treeval runtime
//!
//! Entry points for evaluating trees. The evaluator, builtins and module
//! stand-ins live in the submodules below; [`Executor`] is the seam the
//! grader evaluates through.

pub mod environment;
pub mod error;
pub mod evaluator;
pub mod module_registry;
pub mod operators;
pub mod process;
pub mod stdlib;
pub mod values;

pub use environment::Environment;
pub use error::{RuntimeError, RuntimeResult};
pub use evaluator::Evaluator;
pub use module_registry::ModuleRegistry;
pub use process::{Evaluated, IsolatedProcess};
pub use stdlib::StandardLibrary;
pub use values::{Function, Number, Value};

use crate::ast::Expr;
use std::sync::Arc;

/// Evaluation backend used by the grader.
pub trait Executor: std::fmt::Debug {
    /// Evaluates `tree` against a captured environment, in process.
    fn evaluate(&self, tree: &Expr, env: &Environment) -> RuntimeResult<Value>;

    /// Evaluates `tree` in an isolated process, answering value and repr.
    fn evaluate_in_process(&self, process: &IsolatedProcess, tree: &Expr) -> RuntimeResult<Evaluated> {
        process.evaluate(tree)
    }

    /// Evaluator used to build environments and spawn processes.
    fn evaluator(&self) -> &Evaluator;
}

/// The default executor: walks trees with an [`Evaluator`].
#[derive(Debug, Clone)]
pub struct TreeWalkingExecutor {
    evaluator: Evaluator,
}

impl TreeWalkingExecutor {
    pub fn new(evaluator: Evaluator) -> Self {
        TreeWalkingExecutor { evaluator }
    }

    /// Executor with the default modules and the given recursion limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self::new(Evaluator::new(Arc::new(ModuleRegistry::with_defaults())).with_max_depth(max_depth))
    }
}

impl Default for TreeWalkingExecutor {
    fn default() -> Self {
        Self::with_max_depth(Evaluator::DEFAULT_MAX_DEPTH)
    }
}

impl Executor for TreeWalkingExecutor {
    fn evaluate(&self, tree: &Expr, env: &Environment) -> RuntimeResult<Value> {
        self.evaluator.evaluate(tree, env)
    }

    fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }
}
