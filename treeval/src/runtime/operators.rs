//! Python semantics for the binary and unary operators of the tree.

use crate::ast::{BinaryOperator, UnaryOperator};
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::values::{Number, Value};
use std::cmp::Ordering;

/// Upper bound on sequence repetition results.
const MAX_REPEAT_LEN: usize = 10_000_000;

pub fn unary_op(op: UnaryOperator, operand: Value) -> RuntimeResult<Value> {
    match (op, operand.as_number()) {
        (UnaryOperator::Pos, Some(Number::Int(n))) => Ok(Value::Int(n)),
        (UnaryOperator::Pos, Some(Number::Float(f))) => Ok(Value::Float(f)),
        (UnaryOperator::Neg, Some(Number::Int(n))) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::Overflow("integer negation overflow".to_string())),
        (UnaryOperator::Neg, Some(Number::Float(f))) => Ok(Value::Float(-f)),
        (op, None) => Err(RuntimeError::type_error(format!(
            "bad operand type for unary {}: '{}'",
            match op {
                UnaryOperator::Neg => "-",
                UnaryOperator::Pos => "+",
            },
            operand.type_name()
        ))),
    }
}

pub fn binary_op(op: BinaryOperator, left: Value, right: Value) -> RuntimeResult<Value> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return numeric_op(op, a, b);
    }
    match (op, &left, &right) {
        (BinaryOperator::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (BinaryOperator::Add, Value::List(a), Value::List(b)) => {
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOperator::Add, Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::Tuple(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOperator::Mult, seq, count) | (BinaryOperator::Mult, count, seq)
            if matches!(seq, Value::Str(_) | Value::List(_) | Value::Tuple(_))
                && matches!(count, Value::Int(_) | Value::Bool(_)) =>
        {
            let times = match count.as_number() {
                Some(Number::Int(n)) => n.max(0) as usize,
                _ => 0,
            };
            repeat(seq, times)
        }
        _ => Err(unsupported(op, &left, &right)),
    }
}

fn unsupported(op: BinaryOperator, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

fn repeat(seq: &Value, times: usize) -> RuntimeResult<Value> {
    let len = match seq {
        Value::Str(s) => s.len(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        _ => 0,
    };
    if len == 0 || times == 0 {
        return Ok(match seq {
            Value::Str(_) => Value::Str(String::new()),
            Value::Tuple(_) => Value::Tuple(Vec::new()),
            _ => Value::List(Vec::new()),
        });
    }
    if len.saturating_mul(times) > MAX_REPEAT_LEN {
        return Err(RuntimeError::Overflow("repeated sequence too long".to_string()));
    }
    Ok(match seq {
        Value::Str(s) => Value::Str(s.repeat(times)),
        Value::List(items) => Value::List(repeat_items(items, times)),
        Value::Tuple(items) => Value::Tuple(repeat_items(items, times)),
        other => other.clone(),
    })
}

fn repeat_items(items: &[Value], times: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len() * times);
    for _ in 0..times {
        out.extend_from_slice(items);
    }
    out
}

fn overflow(op: BinaryOperator) -> RuntimeError {
    RuntimeError::Overflow(format!("integer overflow in '{}'", op.symbol()))
}

fn numeric_op(op: BinaryOperator, a: Number, b: Number) -> RuntimeResult<Value> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => int_op(op, x, y),
        (x, y) => float_op(op, x.as_f64(), y.as_f64()),
    }
}

fn int_op(op: BinaryOperator, x: i64, y: i64) -> RuntimeResult<Value> {
    match op {
        BinaryOperator::Add => x.checked_add(y).map(Value::Int).ok_or_else(|| overflow(op)),
        BinaryOperator::Sub => x.checked_sub(y).map(Value::Int).ok_or_else(|| overflow(op)),
        BinaryOperator::Mult => x.checked_mul(y).map(Value::Int).ok_or_else(|| overflow(op)),
        BinaryOperator::Div => float_op(op, x as f64, y as f64),
        BinaryOperator::FloorDiv | BinaryOperator::Mod if y == 0 => Err(
            RuntimeError::DivisionByZero("integer division or modulo by zero".to_string()),
        ),
        BinaryOperator::FloorDiv => {
            let quotient = x.checked_div(y).ok_or_else(|| overflow(op))?;
            if x % y != 0 && ((x < 0) != (y < 0)) {
                Ok(Value::Int(quotient - 1))
            } else {
                Ok(Value::Int(quotient))
            }
        }
        BinaryOperator::Mod => {
            // The remainder takes the divisor's sign; `r` and `y` then have
            // opposite signs, so `r + y` stays in range.
            let r = x.wrapping_rem(y);
            if r != 0 && ((r < 0) != (y < 0)) {
                Ok(Value::Int(r + y))
            } else {
                Ok(Value::Int(r))
            }
        }
        BinaryOperator::Pow => {
            if y < 0 {
                if x == 0 {
                    return Err(RuntimeError::DivisionByZero(
                        "0.0 cannot be raised to a negative power".to_string(),
                    ));
                }
                return Ok(Value::Float((x as f64).powf(y as f64)));
            }
            let exponent = u32::try_from(y).map_err(|_| overflow(op))?;
            x.checked_pow(exponent).map(Value::Int).ok_or_else(|| overflow(op))
        }
    }
}

fn float_op(op: BinaryOperator, x: f64, y: f64) -> RuntimeResult<Value> {
    let value = match op {
        BinaryOperator::Add => x + y,
        BinaryOperator::Sub => x - y,
        BinaryOperator::Mult => x * y,
        BinaryOperator::Div => {
            if y == 0.0 {
                return Err(RuntimeError::DivisionByZero("division by zero".to_string()));
            }
            x / y
        }
        BinaryOperator::FloorDiv => {
            if y == 0.0 {
                return Err(RuntimeError::DivisionByZero(
                    "float floor division by zero".to_string(),
                ));
            }
            (x / y).floor()
        }
        BinaryOperator::Mod => {
            if y == 0.0 {
                return Err(RuntimeError::DivisionByZero("float modulo".to_string()));
            }
            let r = x % y;
            if r != 0.0 && ((r < 0.0) != (y < 0.0)) {
                r + y
            } else {
                r
            }
        }
        BinaryOperator::Pow => {
            if x == 0.0 && y < 0.0 {
                return Err(RuntimeError::DivisionByZero(
                    "0.0 cannot be raised to a negative power".to_string(),
                ));
            }
            if x < 0.0 && y.fract() != 0.0 {
                return Err(RuntimeError::ValueError(
                    "negative number cannot be raised to a fractional power".to_string(),
                ));
            }
            x.powf(y)
        }
    };
    Ok(Value::Float(value))
}

/// Ordering used by `max`, `min` and friends.
pub fn compare_values(a: &Value, b: &Value) -> RuntimeResult<Ordering> {
    if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
        let ordering = match (x, y) {
            (Number::Int(x), Number::Int(y)) => Some(x.cmp(&y)),
            (x, y) => x.as_f64().partial_cmp(&y.as_f64()),
        };
        return Ok(ordering.unwrap_or(Ordering::Equal));
    }
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        _ => Err(RuntimeError::type_error(format!(
            "'<' not supported between instances of '{}' and '{}'",
            a.type_name(),
            b.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_follows_python() {
        assert_eq!(binary_op(BinaryOperator::Div, Value::Int(7), Value::Int(2)), Ok(Value::Float(3.5)));
        assert_eq!(binary_op(BinaryOperator::FloorDiv, Value::Int(-7), Value::Int(2)), Ok(Value::Int(-4)));
        assert_eq!(binary_op(BinaryOperator::Mod, Value::Int(-7), Value::Int(2)), Ok(Value::Int(1)));
        assert_eq!(binary_op(BinaryOperator::Mod, Value::Float(-1.0), Value::Float(3.0)), Ok(Value::Float(2.0)));
        assert!(matches!(
            binary_op(BinaryOperator::Div, Value::Int(1), Value::Int(0)),
            Err(RuntimeError::DivisionByZero(_))
        ));
    }

    #[test]
    fn modulo_at_the_integer_bounds() {
        let min = Value::Int(i64::MIN);
        assert_eq!(binary_op(BinaryOperator::Mod, Value::Int(1), min.clone()), Ok(Value::Int(i64::MIN + 1)));
        assert_eq!(binary_op(BinaryOperator::Mod, Value::Int(-1), min.clone()), Ok(Value::Int(-1)));
        assert_eq!(binary_op(BinaryOperator::Mod, min.clone(), Value::Int(-1)), Ok(Value::Int(0)));
        assert_eq!(binary_op(BinaryOperator::Mod, Value::Int(i64::MAX), min.clone()), Ok(Value::Int(-1)));
        assert!(matches!(
            binary_op(BinaryOperator::FloorDiv, min, Value::Int(-1)),
            Err(RuntimeError::Overflow(_))
        ));
    }

    #[test]
    fn empty_repetition_is_immediate() {
        assert_eq!(
            binary_op(BinaryOperator::Mult, Value::List(vec![]), Value::Int(i64::MAX)),
            Ok(Value::List(vec![]))
        );
        assert_eq!(
            binary_op(BinaryOperator::Mult, Value::Int(i64::MAX), Value::Tuple(vec![])),
            Ok(Value::Tuple(vec![]))
        );
        assert_eq!(
            binary_op(BinaryOperator::Mult, Value::Str("ab".into()), Value::Int(0)),
            Ok(Value::Str(String::new()))
        );
        assert!(matches!(
            binary_op(BinaryOperator::Mult, Value::List(vec![Value::Int(1)]), Value::Int(i64::MAX)),
            Err(RuntimeError::Overflow(_))
        ));
    }

    #[test]
    fn power_and_overflow() {
        assert_eq!(binary_op(BinaryOperator::Pow, Value::Int(2), Value::Int(10)), Ok(Value::Int(1024)));
        assert_eq!(binary_op(BinaryOperator::Pow, Value::Int(2), Value::Int(-1)), Ok(Value::Float(0.5)));
        assert!(matches!(
            binary_op(BinaryOperator::Pow, Value::Int(10), Value::Int(40)),
            Err(RuntimeError::Overflow(_))
        ));
    }

    #[test]
    fn sequences_concatenate_and_repeat() {
        assert_eq!(
            binary_op(BinaryOperator::Add, Value::Str("ab".into()), Value::Str("c".into())),
            Ok(Value::Str("abc".into()))
        );
        assert_eq!(
            binary_op(BinaryOperator::Mult, Value::Int(2), Value::List(vec![Value::Int(1)])),
            Ok(Value::List(vec![Value::Int(1), Value::Int(1)]))
        );
        let err = binary_op(BinaryOperator::Add, Value::Int(1), Value::Str("a".into())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: unsupported operand type(s) for +: 'int' and 'str'"
        );
    }
}
