//! Builtin functions available to every program.
//!
//! Only pure helpers live here: graded code must not be able to reach the
//! file system, the network or the clock through the runtime.

use crate::runtime::environment::Environment;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::operators::compare_values;
use crate::runtime::values::{Arity, BuiltinFunction, Function, Number, Value};
use std::cmp::Ordering;
use std::sync::Arc;

/// Largest list `range()` will materialise.
const MAX_RANGE_LEN: i64 = 1_000_000;

pub fn builtin(
    name: &str,
    arity: Arity,
    func: impl Fn(Vec<Value>) -> RuntimeResult<Value> + Send + Sync + 'static,
) -> Value {
    builtin_with_keywords(name, arity, &[], func)
}

/// A builtin whose leading parameters can also be passed by keyword.
pub fn builtin_with_keywords(
    name: &str,
    arity: Arity,
    keywords: &[&str],
    func: impl Fn(Vec<Value>) -> RuntimeResult<Value> + Send + Sync + 'static,
) -> Value {
    Value::Function(Function::Builtin(BuiltinFunction {
        name: name.to_string(),
        arity,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        func: Arc::new(func),
    }))
}

pub struct StandardLibrary;

impl StandardLibrary {
    /// Creates a new global environment populated with the builtins.
    pub fn create_global_environment() -> Environment {
        let mut env = Environment::new();
        Self::load_builtins(&mut env);
        env
    }

    fn load_builtins(env: &mut Environment) {
        env.define("abs", builtin("abs", Arity::Fixed(1), Self::abs));
        env.define("len", builtin("len", Arity::Fixed(1), Self::len));
        env.define("max", builtin("max", Arity::Variadic(1), |args| Self::extreme("max", args, Ordering::Greater)));
        env.define("min", builtin("min", Arity::Variadic(1), |args| Self::extreme("min", args, Ordering::Less)));
        env.define(
            "round",
            builtin_with_keywords("round", Arity::Range(1, 2), &["number", "ndigits"], Self::round),
        );
        env.define(
            "sum",
            builtin_with_keywords("sum", Arity::Range(1, 2), &["iterable", "start"], Self::sum),
        );
        env.define("str", builtin("str", Arity::Range(0, 1), Self::str));
        env.define("int", builtin("int", Arity::Range(0, 1), Self::int));
        env.define("float", builtin("float", Arity::Range(0, 1), Self::float));
        env.define("range", builtin("range", Arity::Range(1, 3), Self::range));
        env.define("list", builtin("list", Arity::Range(0, 1), Self::list));
        // Output is discarded: graded programs have no stdout.
        env.define("print", builtin("print", Arity::Variadic(0), |_| Ok(Value::None)));
    }

    fn abs(args: Vec<Value>) -> RuntimeResult<Value> {
        match args[0].as_number() {
            Some(Number::Int(n)) => n
                .checked_abs()
                .map(Value::Int)
                .ok_or_else(|| RuntimeError::Overflow("abs() overflow".to_string())),
            Some(Number::Float(f)) => Ok(Value::Float(f.abs())),
            None => Err(RuntimeError::type_error(format!(
                "bad operand type for abs(): '{}'",
                args[0].type_name()
            ))),
        }
    }

    fn len(args: Vec<Value>) -> RuntimeResult<Value> {
        match &args[0] {
            Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
            Value::List(items) | Value::Tuple(items) => Ok(Value::Int(items.len() as i64)),
            other => Err(RuntimeError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            ))),
        }
    }

    fn extreme(name: &str, args: Vec<Value>, wanted: Ordering) -> RuntimeResult<Value> {
        let items = if args.len() == 1 {
            iterate(name, &args[0])?
        } else {
            args
        };
        let mut iter = items.into_iter();
        let mut best = iter.next().ok_or_else(|| {
            RuntimeError::ValueError(format!("{}() arg is an empty sequence", name))
        })?;
        for item in iter {
            if compare_values(&item, &best)? == wanted {
                best = item;
            }
        }
        Ok(best)
    }

    fn round(args: Vec<Value>) -> RuntimeResult<Value> {
        let ndigits = match args.get(1) {
            None | Some(Value::None) => None,
            Some(Value::Int(n)) => Some(*n),
            Some(other) => {
                return Err(RuntimeError::type_error(format!(
                    "'{}' object cannot be interpreted as an integer",
                    other.type_name()
                )))
            }
        };
        match (args[0].as_number(), ndigits) {
            (Some(Number::Int(n)), _) => Ok(Value::Int(n)),
            (Some(Number::Float(f)), None) => {
                if !f.is_finite() {
                    return Err(RuntimeError::Overflow(
                        "cannot convert float infinity or NaN to integer".to_string(),
                    ));
                }
                Ok(Value::Int(round_half_even(f) as i64))
            }
            (Some(Number::Float(f)), Some(digits)) => {
                let digits = digits.clamp(-308, 308) as i32;
                let scale = 10f64.powi(digits);
                Ok(Value::Float(round_half_even(f * scale) / scale))
            }
            (None, _) => Err(RuntimeError::type_error(format!(
                "type {} doesn't define __round__ method",
                args[0].type_name()
            ))),
        }
    }

    fn sum(args: Vec<Value>) -> RuntimeResult<Value> {
        let start = args.get(1).cloned().unwrap_or(Value::Int(0));
        iterate("sum", &args[0])?
            .into_iter()
            .try_fold(start, |acc, item| {
                crate::runtime::operators::binary_op(crate::ast::BinaryOperator::Add, acc, item)
            })
    }

    fn str(args: Vec<Value>) -> RuntimeResult<Value> {
        Ok(Value::Str(args.first().map(|v| v.to_string()).unwrap_or_default()))
    }

    fn int(args: Vec<Value>) -> RuntimeResult<Value> {
        match args.first() {
            None => Ok(Value::Int(0)),
            Some(Value::Str(s)) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                RuntimeError::ValueError(format!(
                    "invalid literal for int() with base 10: {}",
                    Value::Str(s.clone()).repr()
                ))
            }),
            Some(value) => match value.as_number() {
                Some(Number::Int(n)) => Ok(Value::Int(n)),
                Some(Number::Float(f)) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
                Some(Number::Float(_)) => Err(RuntimeError::Overflow(
                    "cannot convert float infinity or NaN to integer".to_string(),
                )),
                None => Err(RuntimeError::type_error(format!(
                    "int() argument must be a string or a number, not '{}'",
                    value.type_name()
                ))),
            },
        }
    }

    fn float(args: Vec<Value>) -> RuntimeResult<Value> {
        match args.first() {
            None => Ok(Value::Float(0.0)),
            Some(Value::Str(s)) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                RuntimeError::ValueError(format!(
                    "could not convert string to float: {}",
                    Value::Str(s.clone()).repr()
                ))
            }),
            Some(value) => value
                .as_number()
                .map(|n| Value::Float(n.as_f64()))
                .ok_or_else(|| {
                    RuntimeError::type_error(format!(
                        "float() argument must be a string or a number, not '{}'",
                        value.type_name()
                    ))
                }),
        }
    }

    fn range(args: Vec<Value>) -> RuntimeResult<Value> {
        let mut bounds = Vec::with_capacity(args.len());
        for arg in &args {
            match arg {
                Value::Int(n) => bounds.push(*n),
                Value::Bool(b) => bounds.push(*b as i64),
                other => {
                    return Err(RuntimeError::type_error(format!(
                        "'{}' object cannot be interpreted as an integer",
                        other.type_name()
                    )))
                }
            }
        }
        let (start, stop, step) = match bounds.as_slice() {
            [stop] => (0, *stop, 1),
            [start, stop] => (*start, *stop, 1),
            [start, stop, step] => (*start, *stop, *step),
            _ => {
                return Err(RuntimeError::ArityMismatch {
                    function: "range".to_string(),
                    message: format!("expected 1 to 3 arguments, got {}", bounds.len()),
                })
            }
        };
        if step == 0 {
            return Err(RuntimeError::ValueError("range() arg 3 must not be zero".to_string()));
        }
        let span = if step > 0 { stop.saturating_sub(start) } else { start.saturating_sub(stop) };
        let len = if span <= 0 { 0 } else { (span - 1) / step.saturating_abs() + 1 };
        if len > MAX_RANGE_LEN {
            return Err(RuntimeError::Overflow("range too large to materialise".to_string()));
        }
        Ok(Value::List((0..len).map(|i| Value::Int(start + i * step)).collect()))
    }

    fn list(args: Vec<Value>) -> RuntimeResult<Value> {
        match args.first() {
            None => Ok(Value::List(vec![])),
            Some(value) => Ok(Value::List(iterate("list", value)?)),
        }
    }
}

/// Elements of an iterable value.
pub fn iterate(function: &str, value: &Value) -> RuntimeResult<Vec<Value>> {
    match value {
        Value::List(items) | Value::Tuple(items) => Ok(items.clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        other => Err(RuntimeError::type_error(format!(
            "{}(): '{}' object is not iterable",
            function,
            other.type_name()
        ))),
    }
}

fn round_half_even(f: f64) -> f64 {
    let rounded = f.round();
    if (f - f.trunc()).abs() == 0.5 {
        2.0 * (f / 2.0).round()
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Value>) -> RuntimeResult<Value> {
        let env = StandardLibrary::create_global_environment();
        match env.lookup(name) {
            Some(Value::Function(Function::Builtin(b))) => (b.func)(args),
            other => panic!("{} is not a builtin: {:?}", name, other),
        }
    }

    #[test]
    fn round_uses_bankers_rounding() {
        assert_eq!(call("round", vec![Value::Float(2.5)]), Ok(Value::Int(2)));
        assert_eq!(call("round", vec![Value::Float(3.5)]), Ok(Value::Int(4)));
        assert_eq!(call("round", vec![Value::Float(1.234), Value::Int(2)]), Ok(Value::Float(1.23)));
    }

    #[test]
    fn aggregates() {
        let items = Value::List(vec![Value::Int(3), Value::Float(1.5), Value::Int(2)]);
        assert_eq!(call("sum", vec![items.clone()]), Ok(Value::Float(6.5)));
        assert_eq!(call("max", vec![items.clone()]), Ok(Value::Int(3)));
        assert_eq!(call("min", vec![Value::Int(4), Value::Int(-1)]), Ok(Value::Int(-1)));
        assert!(call("max", vec![Value::List(vec![])]).is_err());
    }

    #[test]
    fn range_materialises_python_ranges() {
        assert_eq!(
            call("range", vec![Value::Int(1), Value::Int(7), Value::Int(3)]),
            Ok(Value::List(vec![Value::Int(1), Value::Int(4)]))
        );
        assert_eq!(
            call("range", vec![Value::Int(3), Value::Int(0), Value::Int(-1)]),
            Ok(Value::List(vec![Value::Int(3), Value::Int(2), Value::Int(1)]))
        );
        assert_eq!(call("range", vec![Value::Int(-2)]), Ok(Value::List(vec![])));
    }

    #[test]
    fn conversions() {
        assert_eq!(call("int", vec![Value::Str(" 42 ".into())]), Ok(Value::Int(42)));
        assert_eq!(call("int", vec![Value::Float(-2.7)]), Ok(Value::Int(-2)));
        assert_eq!(call("str", vec![Value::Float(2.0)]), Ok(Value::Str("2.0".into())));
        let err = call("int", vec![Value::Str("x".into())]).unwrap_err();
        assert_eq!(err.to_string(), "ValueError: invalid literal for int() with base 10: 'x'");
    }
}
