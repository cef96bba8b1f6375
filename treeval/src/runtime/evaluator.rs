use crate::ast::{Constant, Expr, Module, StatementKind};
use crate::runtime::environment::Environment;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::module_registry::ModuleRegistry;
use crate::runtime::operators::{binary_op, unary_op};
use crate::runtime::values::{BuiltinFunction, Closure, Function, Value};
use std::sync::Arc;

/// Tree-walking evaluator for expressions and top-level statements.
#[derive(Debug, Clone)]
pub struct Evaluator {
    modules: Arc<ModuleRegistry>,
    max_depth: usize,
}

impl Evaluator {
    /// Nested function applications allowed before `RecursionError`.
    pub const DEFAULT_MAX_DEPTH: usize = 100;
    /// Highest limit accepted. In-process evaluation recurses on the
    /// caller's stack, which must hold this many applications on a default
    /// 2 MiB thread in an unoptimized build.
    pub const MAX_SUPPORTED_DEPTH: usize = 100;

    pub fn new(modules: Arc<ModuleRegistry>) -> Self {
        Evaluator {
            modules,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the recursion limit, clamped to `MAX_SUPPORTED_DEPTH`.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.min(Self::MAX_SUPPORTED_DEPTH);
        self
    }

    /// Evaluates one expression against `env`.
    pub fn evaluate(&self, expr: &Expr, env: &Environment) -> RuntimeResult<Value> {
        self.eval(expr, env, 0)
    }

    /// Runs a module's statements in order, binding names into `env`.
    pub fn execute(&self, module: &Module, env: &mut Environment) -> RuntimeResult<()> {
        for stmt in &module.body {
            match &stmt.kind {
                StatementKind::Import(names) => {
                    for alias in names {
                        let module = self.modules.import(&alias.name)?;
                        log::debug!("import {} as {}", alias.name, alias.bound_name());
                        env.define(alias.bound_name(), module);
                    }
                }
                StatementKind::ImportFrom { module, names } => {
                    let Value::Module(imported) = self.modules.import(module)? else {
                        return Err(RuntimeError::ModuleNotFound(module.clone()));
                    };
                    for alias in names {
                        let value = imported.members.get(&alias.name).cloned().ok_or_else(|| {
                            RuntimeError::ImportError {
                                module: module.clone(),
                                name: alias.name.clone(),
                            }
                        })?;
                        env.define(alias.bound_name(), value);
                    }
                }
                StatementKind::Assign { target, value } => {
                    let value = self.evaluate(value, env)?;
                    env.define(target.clone(), value);
                }
                StatementKind::Expr(expr) => {
                    self.evaluate(expr, env)?;
                }
            }
        }
        Ok(())
    }

    fn eval(&self, expr: &Expr, env: &Environment, depth: usize) -> RuntimeResult<Value> {
        match expr {
            Expr::Constant(c) => Ok(match c {
                Constant::None => Value::None,
                Constant::Bool(b) => Value::Bool(*b),
                Constant::Int(n) => Value::Int(*n),
                Constant::Float(f) => Value::Float(*f),
                Constant::Str(s) => Value::Str(s.clone()),
            }),
            Expr::Name(id) => env
                .lookup(id)
                .ok_or_else(|| RuntimeError::UndefinedName(id.clone())),
            Expr::Attribute { value, attr } => {
                let owner = self.eval(value, env, depth)?;
                match &owner {
                    Value::Module(module) => module.members.get(attr).cloned().ok_or_else(|| {
                        RuntimeError::AttributeError {
                            owner: format!("module '{}'", module.name),
                            attribute: attr.clone(),
                        }
                    }),
                    other => Err(RuntimeError::AttributeError {
                        owner: format!("'{}' object", other.type_name()),
                        attribute: attr.clone(),
                    }),
                }
            }
            Expr::Call(call) => {
                let func = self.eval(&call.func, env, depth)?;
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.eval(arg, env, depth))
                    .collect::<RuntimeResult<Vec<_>>>()?;
                let kwargs = call
                    .keywords
                    .iter()
                    .map(|kw| Ok((kw.name.clone(), self.eval(&kw.value, env, depth)?)))
                    .collect::<RuntimeResult<Vec<_>>>()?;
                self.apply(&func, args, kwargs, depth)
            }
            Expr::Lambda(lambda) => {
                let params = lambda
                    .params
                    .iter()
                    .map(|p| {
                        let default = p
                            .default
                            .as_ref()
                            .map(|d| self.eval(d, env, depth))
                            .transpose()?;
                        Ok((p.name.clone(), default))
                    })
                    .collect::<RuntimeResult<Vec<_>>>()?;
                Ok(Value::Function(Function::Closure(Arc::new(Closure {
                    params,
                    body: (*lambda.body).clone(),
                    env: Arc::new(env.clone()),
                }))))
            }
            Expr::BinOp { left, op, right } => {
                let left = self.eval(left, env, depth)?;
                let right = self.eval(right, env, depth)?;
                binary_op(*op, left, right)
            }
            Expr::UnaryOp { op, operand } => unary_op(*op, self.eval(operand, env, depth)?),
            Expr::List(items) => Ok(Value::List(self.eval_all(items, env, depth)?)),
            Expr::Tuple(items) => Ok(Value::Tuple(self.eval_all(items, env, depth)?)),
        }
    }

    fn eval_all(&self, items: &[Expr], env: &Environment, depth: usize) -> RuntimeResult<Vec<Value>> {
        items.iter().map(|item| self.eval(item, env, depth)).collect()
    }

    fn apply(
        &self,
        func: &Value,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        depth: usize,
    ) -> RuntimeResult<Value> {
        if depth >= self.max_depth {
            return Err(RuntimeError::RecursionLimit);
        }
        match func {
            Value::Function(Function::Builtin(builtin)) => {
                let args = bind_builtin_keywords(builtin, args, kwargs)?;
                if !builtin.arity.accepts(args.len()) {
                    return Err(RuntimeError::ArityMismatch {
                        function: builtin.name.clone(),
                        message: format!(
                            "takes {} arguments ({} given)",
                            builtin.arity.describe(),
                            args.len()
                        ),
                    });
                }
                (builtin.func)(args)
            }
            Value::Function(Function::Closure(closure)) => {
                let call_env = bind_arguments(closure, args, kwargs)?;
                self.eval(&closure.body, &call_env, depth + 1)
            }
            other => Err(RuntimeError::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }
}

/// Merges keyword arguments into the positional list of a builtin.
fn bind_builtin_keywords(
    builtin: &BuiltinFunction,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> RuntimeResult<Vec<Value>> {
    if kwargs.is_empty() {
        return Ok(args);
    }
    let error = |message: String| RuntimeError::ArityMismatch {
        function: builtin.name.clone(),
        message,
    };
    if builtin.keywords.is_empty() {
        return Err(error("takes no keyword arguments".to_string()));
    }

    let mut slots: Vec<Option<Value>> = args.into_iter().map(Some).collect();
    for (name, value) in kwargs {
        let position = builtin
            .keywords
            .iter()
            .position(|keyword| *keyword == name)
            .ok_or_else(|| error(format!("got an unexpected keyword argument '{}'", name)))?;
        if position >= slots.len() {
            slots.resize(position + 1, None);
        }
        if slots[position].is_some() {
            return Err(error(format!("got multiple values for argument '{}'", name)));
        }
        slots[position] = Some(value);
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(position, slot)| {
            slot.ok_or_else(|| {
                error(format!(
                    "missing required argument '{}'",
                    builtin.keywords[position]
                ))
            })
        })
        .collect()
}

const LAMBDA_NAME: &str = "<lambda>";

fn arity_error(message: String) -> RuntimeError {
    RuntimeError::ArityMismatch {
        function: LAMBDA_NAME.to_string(),
        message,
    }
}

/// Binds call arguments to a closure's parameters the way Python does:
/// positionals first, then keywords, then defaults for what is left.
fn bind_arguments(
    closure: &Closure,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> RuntimeResult<Environment> {
    let arity = closure.params.len();
    if args.len() > arity {
        return Err(arity_error(format!(
            "takes {} positional argument{} but {} {} given",
            arity,
            if arity == 1 { "" } else { "s" },
            args.len(),
            if args.len() == 1 { "was" } else { "were" }
        )));
    }

    let mut slots: Vec<Option<Value>> = args.into_iter().map(Some).collect();
    slots.resize(arity, None);

    for (name, value) in kwargs {
        let position = closure
            .params
            .iter()
            .position(|(param, _)| *param == name)
            .ok_or_else(|| arity_error(format!("got an unexpected keyword argument '{}'", name)))?;
        if slots[position].is_some() {
            return Err(arity_error(format!(
                "got multiple values for argument '{}'",
                name
            )));
        }
        slots[position] = Some(value);
    }

    let mut env = Environment::with_parent(closure.env.clone());
    let mut missing = Vec::new();
    for ((name, default), slot) in closure.params.iter().zip(slots) {
        match slot.or_else(|| default.clone()) {
            Some(value) => env.define(name.clone(), value),
            None => missing.push(format!("'{}'", name)),
        }
    }
    if !missing.is_empty() {
        return Err(arity_error(format!(
            "missing {} required positional argument{}: {}",
            missing.len(),
            if missing.len() == 1 { "" } else { "s" },
            missing.join(" and ")
        )));
    }
    Ok(env)
}
