use crate::ast::Expr;
use crate::runtime::environment::Environment;
use crate::runtime::error::RuntimeResult;
use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Function(Function),
    Module(Arc<ModuleValue>),
}

/// Number view used by arithmetic and tolerant comparison. Booleans count as
/// integers, as in Python.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Function(Function::Builtin(_)) => "builtin_function_or_method",
            Value::Function(Function::Closure(_)) => "function",
            Value::Module(_) => "module",
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(*b as i64)),
            Value::Int(n) => Some(Number::Int(*n)),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// Python `repr()` of the value.
    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => float_repr(*f),
            Value::Str(s) => string_repr(s),
            Value::List(items) => format!("[{}]", items.iter().map(Value::repr).join(", ")),
            Value::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Value::Tuple(items) => format!("({})", items.iter().map(Value::repr).join(", ")),
            Value::Function(Function::Builtin(b)) => format!("<built-in function {}>", b.name),
            Value::Function(Function::Closure(_)) => "<function <lambda>>".to_string(),
            Value::Module(m) => format!("<module '{}'>", m.name),
        }
    }
}

/// Python equality: numbers compare across int/float/bool, sequences compare
/// element-wise, functions and modules by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return match (a, b) {
                (Number::Int(x), Number::Int(y)) => x == y,
                (x, y) => x.as_f64() == y.as_f64(),
            };
        }
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Module(a), Value::Module(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.repr()),
        }
    }
}

fn float_repr(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        // Rust prints `1e20` / `1.5e-5`; Python prints `1e+20` / `1.5e-05`.
        let formatted = format!("{:e}", f);
        if let Some((mantissa, exponent)) = formatted.split_once('e') {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            return format!("{}e{}{:0>2}", mantissa, sign, digits);
        }
        return formatted;
    }
    let formatted = format!("{}", f);
    if formatted.contains('.') {
        formatted
    } else {
        format!("{}.0", formatted)
    }
}

fn string_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[derive(Clone, Debug)]
pub enum Function {
    Builtin(BuiltinFunction),
    Closure(Arc<Closure>),
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Function::Builtin(a), Function::Builtin(b)) => a.name == b.name,
            (Function::Closure(a), Function::Closure(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

pub type BuiltinFn = dyn Fn(Vec<Value>) -> RuntimeResult<Value> + Send + Sync;

#[derive(Clone)]
pub struct BuiltinFunction {
    pub name: String,
    pub arity: Arity,
    /// Parameters that may also be passed by keyword, in positional order.
    pub keywords: Vec<String>,
    pub func: Arc<BuiltinFn>,
}

impl fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("keywords", &self.keywords)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic(usize), // Minimum number of arguments
    Range(usize, usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Fixed(n) => count == n,
            Arity::Variadic(min) => count >= min,
            Arity::Range(min, max) => (min..=max).contains(&count),
        }
    }

    pub fn describe(&self) -> String {
        match *self {
            Arity::Fixed(n) => format!("exactly {}", n),
            Arity::Variadic(min) => format!("at least {}", min),
            Arity::Range(min, max) => format!("from {} to {}", min, max),
        }
    }
}

/// A lambda closed over the environment it was created in. Defaults are
/// evaluated once, at creation time.
#[derive(Debug)]
pub struct Closure {
    pub params: Vec<(String, Option<Value>)>,
    pub body: Expr,
    pub env: Arc<Environment>,
}

#[derive(Debug)]
pub struct ModuleValue {
    pub name: String,
    pub members: IndexMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn float_repr_matches_python() {
        assert_eq!(Value::Float(2.0).repr(), "2.0");
        assert_eq!(Value::Float(0.1 + 0.2).repr(), "0.30000000000000004");
        assert_eq!(Value::Float(1e20).repr(), "1e+20");
        assert_eq!(Value::Float(1.5e-5).repr(), "1.5e-05");
        assert_eq!(Value::Float(-0.5).repr(), "-0.5");
    }

    #[test]
    fn sequence_and_string_repr() {
        assert_eq!(Value::Tuple(vec![Value::Int(1)]).repr(), "(1,)");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Str("a".into()), Value::None]).repr(),
            "[1, 'a', None]"
        );
        assert_eq!(Value::Str("it's".into()).repr(), "\"it's\"");
    }

    #[test]
    fn numeric_equality_crosses_types() {
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::Bool(true), Value::Int(1));
        assert_ne!(Value::Float(0.1 + 0.2), Value::Float(0.3));
        assert_ne!(
            Value::List(vec![Value::Int(1)]),
            Value::Tuple(vec![Value::Int(1)])
        );
    }
}
