// Evaluation results. Distinct from Ast so the evaluator never has to
// decide whether a result "owns" its bytes the way the AST node that
// produced it did.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Num(f32),
    Str(String),
}

impl Value {
    pub fn as_num(&self) -> f32 {
        match self {
            Value::Num(n) => *n,
            Value::Str(s) => parse_number_loose(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(n) => f.write_str(&format_g(*n)),
            Value::Str(s) => f.write_str(s),
        }
    }
}

// Loose numeric coercion used when a string value appears where a number
// is expected (comparisons, arithmetic, assignment). Unlike
// operators::parse_number, this accepts the full range a host string
// might contain (leading whitespace, sign, exponent) since it's coercing
// already-evaluated values rather than lexing source text.
pub fn parse_number_loose(s: &str) -> f32 {
    s.trim().parse::<f32>().unwrap_or(f32::NAN)
}

// Formats a float the way C's "%g" would, with the default six
// significant digits: fixed notation in the "normal" range, scientific
// notation once the exponent falls outside [-4, precision), and
// trailing zeros (and a bare trailing '.') stripped either way.
pub fn format_g(n: f32) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if n == 0.0 {
        return "0".to_string();
    }

    const PRECISION: i32 = 6;
    let mut exp = n.abs().log10().floor() as i32;
    let mut mantissa = n / 10f32.powi(exp);
    // log10/powi round-trip can land a hair off the true exponent.
    if mantissa.abs() >= 10.0 {
        mantissa /= 10.0;
        exp += 1;
    } else if mantissa.abs() < 1.0 {
        mantissa *= 10.0;
        exp -= 1;
    }

    if exp < -4 || exp >= PRECISION {
        let mut s = format!("{:.*}", (PRECISION - 1).max(0) as usize, mantissa);
        trim_trailing_zeros(&mut s);
        format!("{}e{}{:02}", s, if exp >= 0 { "+" } else { "-" }, exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp).max(0) as usize;
        let mut s = format!("{:.*}", decimals, n);
        trim_trailing_zeros(&mut s);
        s
    }
}

fn trim_trailing_zeros(s: &mut String) {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_g_integers() {
        assert_eq!(format_g(3.0), "3");
        assert_eq!(format_g(100.0), "100");
        assert_eq!(format_g(-5.0), "-5");
    }

    #[test]
    fn format_g_fraction() {
        assert_eq!(format_g(0.1), "0.1");
        assert_eq!(format_g(3.5), "3.5");
    }

    #[test]
    fn format_g_scientific_for_large_and_small() {
        assert_eq!(format_g(12345678.0), "1.23457e+07");
        assert!(format_g(0.00001234).starts_with("1.234"));
        assert!(format_g(0.00001234).contains("e-05"));
    }

    #[test]
    fn parse_number_loose_accepts_plain_numbers_only() {
        assert_eq!(parse_number_loose("42"), 42.0);
        assert!(parse_number_loose("abc").is_nan());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn value_round_trips_through_json() {
        let v = Value::Str("hello".to_string());
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&json).unwrap(), v);
    }
}
