use crate::config::EquivalenceConfig;
use crate::error::AuthoringError;
use std::str::FromStr;
use treeval::runtime::Value;

/// How evaluated arguments are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EqualityMode {
    /// Python `==`.
    #[default]
    Equal,
    /// Numbers within tolerance, element-wise over sequences.
    Equivalent,
}

impl FromStr for EqualityMode {
    type Err = AuthoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(EqualityMode::Equal),
            "equivalent" => Ok(EqualityMode::Equivalent),
            other => Err(AuthoringError::InvalidEqualityCondition(other.to_string())),
        }
    }
}

impl EqualityMode {
    pub fn values_match(&self, student: &Value, solution: &Value, tol: &EquivalenceConfig) -> bool {
        match self {
            EqualityMode::Equal => student == solution,
            EqualityMode::Equivalent => is_close(student, solution, tol),
        }
    }
}

/// `|a - b| <= atol + rtol * |b|`, with `b` the solution value.
fn is_close(student: &Value, solution: &Value, tol: &EquivalenceConfig) -> bool {
    if let (Some(a), Some(b)) = (student.as_number(), solution.as_number()) {
        let (a, b) = (a.as_f64(), b.as_f64());
        if a == b {
            return true;
        }
        return (a - b).abs() <= tol.atol + tol.rtol * b.abs();
    }
    match (student, solution) {
        (Value::List(xs), Value::List(ys)) | (Value::Tuple(xs), Value::Tuple(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| is_close(x, y, tol))
        }
        _ => student == solution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(xs: &[f64]) -> Value {
        Value::List(xs.iter().map(|x| Value::Float(*x)).collect())
    }

    #[test]
    fn parses_modes() {
        assert_eq!("equal".parse::<EqualityMode>().unwrap(), EqualityMode::Equal);
        assert_eq!("equivalent".parse::<EqualityMode>().unwrap(), EqualityMode::Equivalent);
        assert!(matches!(
            "identical".parse::<EqualityMode>(),
            Err(AuthoringError::InvalidEqualityCondition(mode)) if mode == "identical"
        ));
    }

    #[test]
    fn equal_is_exact_and_equivalent_is_tolerant() {
        let tol = EquivalenceConfig::default();
        let sum = Value::Float(0.1 + 0.2);
        let third = Value::Float(0.3);
        assert!(!EqualityMode::Equal.values_match(&sum, &third, &tol));
        assert!(EqualityMode::Equivalent.values_match(&sum, &third, &tol));
        assert!(!EqualityMode::Equivalent.values_match(&Value::Float(0.31), &third, &tol));
        assert!(EqualityMode::Equal.values_match(&Value::Int(2), &Value::Float(2.0), &tol));
    }

    #[test]
    fn equivalent_recurses_into_sequences() {
        let tol = EquivalenceConfig::default();
        assert!(EqualityMode::Equivalent.values_match(
            &floats(&[0.1 + 0.2, 1.0]),
            &floats(&[0.3, 1.0]),
            &tol
        ));
        assert!(!EqualityMode::Equivalent.values_match(&floats(&[0.3]), &floats(&[0.3, 1.0]), &tol));
        assert!(!EqualityMode::Equivalent.values_match(
            &Value::Str("0.3".into()),
            &Value::Float(0.3),
            &tol
        ));
    }
}
