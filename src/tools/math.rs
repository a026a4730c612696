//! Arithmetic and string tools.

use crate::error::{Result, SleuthError};

fn overflow(op: &str, a: i64, b: i64) -> SleuthError {
    SleuthError::InvalidInput(format!("Integer overflow in {}({}, {})", op, a, b))
}

pub fn multiply(a: i64, b: i64) -> Result<i64> {
    a.checked_mul(b).ok_or_else(|| overflow("multiply", a, b))
}

pub fn add(a: i64, b: i64) -> Result<i64> {
    a.checked_add(b).ok_or_else(|| overflow("add", a, b))
}

pub fn subtract(a: i64, b: i64) -> Result<i64> {
    a.checked_sub(b).ok_or_else(|| overflow("subtract", a, b))
}

/// True division; always returns a float.
pub fn divide(a: i64, b: i64) -> Result<f64> {
    if b == 0 {
        return Err(SleuthError::InvalidInput("Cannot divide by zero.".to_string()));
    }
    Ok(a as f64 / b as f64)
}

/// Floored modulo: the result takes the sign of the divisor.
pub fn modulus(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(SleuthError::InvalidInput("Integer modulo by zero.".to_string()));
    }
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

/// Reverse a string by Unicode scalar value.
pub fn reverse_string(s: &str) -> String {
    s.chars().rev().collect()
}

/// Render a float the way the model expects to read it back (`2.0`, `3.5`).
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_arithmetic() {
        assert_eq!(add(2, 3).unwrap(), 5);
        assert_eq!(subtract(2, 3).unwrap(), -1);
        assert_eq!(multiply(-4, 3).unwrap(), -12);
    }

    #[test]
    fn test_overflow_is_error() {
        assert!(add(i64::MAX, 1).is_err());
        assert!(multiply(i64::MAX, 2).is_err());
        assert!(subtract(i64::MIN, 1).is_err());
    }

    #[test]
    fn test_divide() {
        assert_eq!(divide(7, 2).unwrap(), 3.5);
        assert_eq!(divide(-9, 3).unwrap(), -3.0);
        let err = divide(4, 0).unwrap_err();
        assert_eq!(err.to_string(), "Cannot divide by zero.");
    }

    #[test]
    fn test_modulus_follows_divisor_sign() {
        assert_eq!(modulus(7, 3).unwrap(), 1);
        assert_eq!(modulus(-7, 3).unwrap(), 2);
        assert_eq!(modulus(7, -3).unwrap(), -2);
        assert_eq!(modulus(-7, -3).unwrap(), -1);
        assert_eq!(modulus(6, 3).unwrap(), 0);
        assert_eq!(modulus(i64::MIN, -1).unwrap(), 0);
        assert!(modulus(1, 0).is_err());
    }

    #[test]
    fn test_reverse_string() {
        assert_eq!(reverse_string("abc"), "cba");
        assert_eq!(reverse_string(""), "");
        assert_eq!(reverse_string("tfel drow"), "word left");
        assert_eq!(reverse_string("héllo"), "olléh");
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(3.5), "3.5");
        assert_eq!(format_float(-0.25), "-0.25");
    }
}
