//! Grading state: the two programs under comparison, their cached indices
//! and the bookkeeping of call sites already consumed by earlier checks.

use crate::config::GraderConfig;
use crate::error::ProgramError;
use crate::index::{CallSite, Imports, LambdaRecord, ProgramIndex};
use indexmap::IndexMap;
use once_cell::unsync::OnceCell;
use std::sync::Arc;
use treeval::ast::{Expr, Module};
use treeval::runtime::{
    Environment, Executor, IsolatedProcess, RuntimeError, StandardLibrary, TreeWalkingExecutor,
};

/// A parsed program with the environment its top level produced.
#[derive(Debug, Clone)]
pub struct Program {
    pub module: Module,
    pub env: Environment,
    pub imports: Imports,
    /// Error that stopped the top level early, if it was tolerated.
    pub run_error: Option<RuntimeError>,
    process: Arc<IsolatedProcess>,
}

impl Program {
    /// Parses and runs a program; a runtime error at the top level is a
    /// `ProgramError`.
    pub fn from_source(
        name: &str,
        source: &str,
        executor: &dyn Executor,
    ) -> Result<Self, ProgramError> {
        let module = treeval::parse(source)?;
        Self::from_module(name, module, executor)
    }

    /// Like `from_source`, but a runtime error only stops execution: the
    /// environment keeps the bindings made before it.
    pub fn from_student_source(
        name: &str,
        source: &str,
        executor: &dyn Executor,
    ) -> Result<Self, ProgramError> {
        let module = treeval::parse(source)?;
        Self::run(name, module, executor, true)
    }

    /// Runs `module` and starts an isolated process over the result.
    pub fn from_module(
        name: &str,
        module: Module,
        executor: &dyn Executor,
    ) -> Result<Self, ProgramError> {
        Self::run(name, module, executor, false)
    }

    fn run(
        name: &str,
        module: Module,
        executor: &dyn Executor,
        tolerate_errors: bool,
    ) -> Result<Self, ProgramError> {
        let evaluator = executor.evaluator();
        let mut env = StandardLibrary::create_global_environment();
        let run_error = match evaluator.execute(&module, &mut env) {
            Ok(()) => None,
            Err(err) if tolerate_errors => {
                log::info!("program '{}' stopped early: {}", name, err);
                Some(err)
            }
            Err(err) => return Err(err.into()),
        };
        let imports = Imports::from_module(&module);
        let process = IsolatedProcess::spawn(name, env.clone(), evaluator.clone())?;
        Ok(Program {
            module,
            env,
            imports,
            run_error,
            process: Arc::new(process),
        })
    }

    pub fn process(&self) -> &IsolatedProcess {
        &self.process
    }

    /// A program made of one sub-tree, evaluated in `env`. Shares the
    /// parent's process and import bindings.
    fn sub_program(&self, tree: Expr, line: usize, env: Environment) -> Program {
        Program {
            module: Module::from_expr(tree, line),
            env,
            imports: self.imports.clone(),
            run_error: None,
            process: Arc::clone(&self.process),
        }
    }
}

/// Call sites consumed by earlier checks: name to check index to position.
#[derive(Debug, Clone, Default)]
pub struct MatchState {
    used: IndexMap<String, IndexMap<usize, usize>>,
}

impl MatchState {
    /// Candidate positions still available to `check_index`, in the given
    /// order. Re-running an index only offers the position it accepted before.
    pub fn get_options(
        &self,
        name: &str,
        positions: impl IntoIterator<Item = usize>,
        check_index: usize,
    ) -> Vec<usize> {
        let Some(used) = self.used.get(name) else {
            return positions.into_iter().collect();
        };
        if let Some(&accepted) = used.get(&check_index) {
            return positions.into_iter().filter(|p| *p == accepted).collect();
        }
        positions
            .into_iter()
            .filter(|p| !used.values().any(|taken| taken == p))
            .collect()
    }

    pub fn set_used(&mut self, name: &str, position: usize, check_index: usize) {
        self.used
            .entry(name.to_string())
            .or_default()
            .insert(check_index, position);
    }
}

#[derive(Debug)]
pub struct State {
    pub student: Program,
    pub solution: Program,
    config: GraderConfig,
    executor: Arc<dyn Executor>,
    student_index: OnceCell<ProgramIndex>,
    solution_index: OnceCell<ProgramIndex>,
    match_state: MatchState,
}

impl State {
    pub fn new(
        student: Program,
        solution: Program,
        config: GraderConfig,
        executor: Arc<dyn Executor>,
    ) -> Self {
        State {
            student,
            solution,
            config,
            executor,
            student_index: OnceCell::new(),
            solution_index: OnceCell::new(),
            match_state: MatchState::default(),
        }
    }

    /// Parses and runs both programs with the default executor.
    pub fn from_sources(
        student: &str,
        solution: &str,
        config: GraderConfig,
    ) -> Result<Self, ProgramError> {
        let executor = Arc::new(TreeWalkingExecutor::with_max_depth(config.runtime.max_depth));
        Self::from_sources_with(student, solution, config, executor)
    }

    pub fn from_sources_with(
        student: &str,
        solution: &str,
        config: GraderConfig,
        executor: Arc<dyn Executor>,
    ) -> Result<Self, ProgramError> {
        let student = Program::from_student_source("student", student, executor.as_ref())?;
        let solution = Program::from_source("solution", solution, executor.as_ref())?;
        Ok(Self::new(student, solution, config, executor))
    }

    pub fn config(&self) -> &GraderConfig {
        &self.config
    }

    pub fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }

    /// Builds the call-site and lambda indices of both programs. Idempotent.
    pub fn extract_function_calls(&self) {
        self.student_index();
        self.solution_index();
    }

    fn student_index(&self) -> &ProgramIndex {
        self.student_index
            .get_or_init(|| ProgramIndex::build(&self.student.module, &self.student.imports))
    }

    fn solution_index(&self) -> &ProgramIndex {
        self.solution_index
            .get_or_init(|| ProgramIndex::build(&self.solution.module, &self.solution.imports))
    }

    pub fn student_calls(&self, name: &str) -> &[CallSite] {
        self.student_index().calls_of(name)
    }

    pub fn solution_calls(&self, name: &str) -> &[CallSite] {
        self.solution_index().calls_of(name)
    }

    pub fn student_lambdas(&self) -> &[LambdaRecord] {
        &self.student_index().lambdas
    }

    pub fn solution_lambdas(&self) -> &[LambdaRecord] {
        &self.solution_index().lambdas
    }

    pub fn get_options(
        &self,
        name: &str,
        positions: impl IntoIterator<Item = usize>,
        check_index: usize,
    ) -> Vec<usize> {
        self.match_state.get_options(name, positions, check_index)
    }

    pub fn set_used(&mut self, name: &str, position: usize, check_index: usize) {
        log::debug!(
            "call {} of {}() consumed by check index {}",
            position,
            name,
            check_index
        );
        self.match_state.set_used(name, position, check_index);
    }

    /// State over two sub-trees, for checks nested inside a construct.
    /// Match state starts fresh; config and executor are shared.
    pub fn child(
        &self,
        student: (Expr, usize, Environment),
        solution: (Expr, usize, Environment),
    ) -> State {
        let (student_tree, student_line, student_env) = student;
        let (solution_tree, solution_line, solution_env) = solution;
        State::new(
            self.student.sub_program(student_tree, student_line, student_env),
            self.solution.sub_program(solution_tree, solution_line, solution_env),
            self.config.clone(),
            Arc::clone(&self.executor),
        )
    }
}
