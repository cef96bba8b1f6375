//! Importable modules.
//!
//! Graded programs may `import math` or `import numpy as np`; the registry
//! resolves those names to in-process stand-ins holding the handful of
//! functions exercises actually use.

use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::stdlib::{builtin, iterate};
use crate::runtime::values::{Arity, ModuleValue, Number, Value};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<ModuleValue>>,
}

impl ModuleRegistry {
    /// An empty registry: every import fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `math` and `numpy` modules loaded.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(math_module());
        registry.register(numpy_module());
        registry
    }

    pub fn register(&mut self, module: ModuleValue) {
        self.modules.insert(module.name.clone(), Arc::new(module));
    }

    pub fn get_module(&self, name: &str) -> Option<Arc<ModuleValue>> {
        self.modules.get(name).cloned()
    }

    pub fn import(&self, name: &str) -> RuntimeResult<Value> {
        self.get_module(name)
            .map(Value::Module)
            .ok_or_else(|| RuntimeError::ModuleNotFound(name.to_string()))
    }

    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.keys().cloned().collect();
        names.sort();
        names
    }
}

fn float_arg(function: &str, value: &Value) -> RuntimeResult<f64> {
    value.as_number().map(Number::as_f64).ok_or_else(|| {
        RuntimeError::type_error(format!(
            "{}(): must be real number, not {}",
            function,
            value.type_name()
        ))
    })
}

fn unary_math(name: &'static str, f: fn(f64) -> RuntimeResult<f64>) -> Value {
    builtin(name, Arity::Fixed(1), move |args| {
        Ok(Value::Float(f(float_arg(name, &args[0])?)?))
    })
}

fn math_module() -> ModuleValue {
    let mut members = IndexMap::new();
    members.insert("pi".to_string(), Value::Float(std::f64::consts::PI));
    members.insert("e".to_string(), Value::Float(std::f64::consts::E));
    members.insert(
        "sqrt".to_string(),
        unary_math("sqrt", |x| {
            if x < 0.0 {
                Err(RuntimeError::ValueError("math domain error".to_string()))
            } else {
                Ok(x.sqrt())
            }
        }),
    );
    members.insert("exp".to_string(), unary_math("exp", |x| Ok(x.exp())));
    members.insert(
        "log".to_string(),
        unary_math("log", |x| {
            if x <= 0.0 {
                Err(RuntimeError::ValueError("math domain error".to_string()))
            } else {
                Ok(x.ln())
            }
        }),
    );
    members.insert(
        "floor".to_string(),
        builtin("floor", Arity::Fixed(1), |args| {
            Ok(Value::Int(float_arg("floor", &args[0])?.floor() as i64))
        }),
    );
    members.insert(
        "ceil".to_string(),
        builtin("ceil", Arity::Fixed(1), |args| {
            Ok(Value::Int(float_arg("ceil", &args[0])?.ceil() as i64))
        }),
    );
    ModuleValue {
        name: "math".to_string(),
        members,
    }
}

fn numbers(function: &str, value: &Value) -> RuntimeResult<Vec<f64>> {
    iterate(function, value)?
        .iter()
        .map(|item| float_arg(function, item))
        .collect()
}

fn mean(function: &str, value: &Value) -> RuntimeResult<f64> {
    let xs = numbers(function, value)?;
    if xs.is_empty() {
        return Ok(f64::NAN);
    }
    Ok(xs.iter().sum::<f64>() / xs.len() as f64)
}

fn numpy_module() -> ModuleValue {
    let mut members = IndexMap::new();
    members.insert(
        "mean".to_string(),
        builtin("mean", Arity::Fixed(1), |args| Ok(Value::Float(mean("mean", &args[0])?))),
    );
    members.insert(
        "std".to_string(),
        builtin("std", Arity::Fixed(1), |args| {
            let xs = numbers("std", &args[0])?;
            let mu = mean("std", &args[0])?;
            let variance = xs.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / xs.len().max(1) as f64;
            Ok(Value::Float(variance.sqrt()))
        }),
    );
    members.insert(
        "sum".to_string(),
        builtin("sum", Arity::Fixed(1), |args| {
            let items = iterate("sum", &args[0])?;
            if items.iter().all(|v| matches!(v, Value::Int(_) | Value::Bool(_))) {
                items
                    .iter()
                    .filter_map(Value::as_number)
                    .try_fold(0i64, |acc, n| match n {
                        Number::Int(i) => acc.checked_add(i),
                        Number::Float(_) => None,
                    })
                    .map(Value::Int)
                    .ok_or_else(|| RuntimeError::Overflow("sum overflow".to_string()))
            } else {
                Ok(Value::Float(numbers("sum", &args[0])?.iter().sum()))
            }
        }),
    );
    members.insert(
        "sqrt".to_string(),
        builtin("sqrt", Arity::Fixed(1), |args| match &args[0] {
            Value::List(_) | Value::Tuple(_) => Ok(Value::List(
                numbers("sqrt", &args[0])?
                    .into_iter()
                    .map(|x| Value::Float(x.sqrt()))
                    .collect(),
            )),
            scalar => Ok(Value::Float(float_arg("sqrt", scalar)?.sqrt())),
        }),
    );
    members.insert(
        "array".to_string(),
        builtin("array", Arity::Fixed(1), |args| Ok(Value::List(iterate("array", &args[0])?))),
    );
    ModuleValue {
        name: "numpy".to_string(),
        members,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::values::Function;

    fn member(module: &str, name: &str) -> Value {
        let registry = ModuleRegistry::with_defaults();
        registry.get_module(module).unwrap().members[name].clone()
    }

    fn apply(f: Value, args: Vec<Value>) -> RuntimeResult<Value> {
        match f {
            Value::Function(Function::Builtin(b)) => (b.func)(args),
            other => panic!("not callable: {:?}", other),
        }
    }

    #[test]
    fn numpy_statistics() {
        let xs = Value::List(vec![Value::Int(2), Value::Int(4), Value::Int(4), Value::Int(4), Value::Int(5), Value::Int(5), Value::Int(7), Value::Int(9)]);
        assert_eq!(apply(member("numpy", "mean"), vec![xs.clone()]), Ok(Value::Float(5.0)));
        assert_eq!(apply(member("numpy", "std"), vec![xs.clone()]), Ok(Value::Float(2.0)));
        assert_eq!(apply(member("numpy", "sum"), vec![xs]), Ok(Value::Int(40)));
    }

    #[test]
    fn math_domain_errors() {
        assert!(matches!(
            apply(member("math", "sqrt"), vec![Value::Int(-1)]),
            Err(RuntimeError::ValueError(_))
        ));
        assert_eq!(apply(member("math", "floor"), vec![Value::Float(2.7)]), Ok(Value::Int(2)));
    }

    #[test]
    fn unknown_module_is_an_import_error() {
        let registry = ModuleRegistry::with_defaults();
        assert_eq!(
            registry.import("pandas").unwrap_err(),
            RuntimeError::ModuleNotFound("pandas".to_string())
        );
        assert_eq!(registry.module_names(), vec!["math".to_string(), "numpy".to_string()]);
    }
}
