//! Raw stored values.
//!
//! A [`Scalar`] is a value exactly as it is stored in a source dataset: a
//! missing-value code, an encoding key or an enum member.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A raw stored value.
///
/// The JSON form is the plain JSON scalar. The text form ([`fmt::Display`]) is
/// the canonical key text used by encoding maps; [`Scalar::parse_text`] inverts
/// it exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Number(f64),
    String(String),
}

/// Largest magnitude at which every integral `f64` is still exact.
const MAX_EXACT_INTEGRAL: f64 = 9_007_199_254_740_992.0;

impl Scalar {
    /// Build a scalar from a float, keeping it as a `Number`.
    pub fn number(value: f64) -> Self {
        Scalar::Number(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Scalar::String(value.into())
    }

    /// Parse the canonical text form.
    ///
    /// Text only becomes numeric when formatting the number reproduces the
    /// same text, so `"01"` and `"1e3"` stay strings.
    pub fn parse_text(text: &str) -> Self {
        if let Ok(value) = text.parse::<i64>()
            && value.to_string() == text
        {
            return Scalar::Integer(value);
        }
        if let Ok(value) = text.parse::<f64>()
            && value.is_finite()
            && value.to_string() == text
        {
            return Scalar::Number(value);
        }
        Scalar::String(text.to_string())
    }

    /// Collapse an integral float into an integer; everything else is unchanged.
    #[must_use]
    pub fn normalized(&self) -> Self {
        match self {
            Scalar::Number(value) if is_integral(*value) => Scalar::Integer(*value as i64),
            other => other.clone(),
        }
    }

    /// Value equality, treating `1` and `1.0` as the same code.
    pub fn same_value(&self, other: &Scalar) -> bool {
        match (self.normalized(), other.normalized()) {
            (Scalar::Integer(left), Scalar::Integer(right)) => left == right,
            (Scalar::Number(left), Scalar::Number(right)) => left == right,
            (Scalar::String(left), Scalar::String(right)) => left == right,
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(value) => Some(*value as f64),
            Scalar::Number(value) => Some(*value),
            Scalar::String(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Scalar::String(_))
    }
}

fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGRAL
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Integer(value) => write!(f, "{value}"),
            Scalar::Number(value) => write!(f, "{value}"),
            Scalar::String(value) => f.write_str(value),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

/// Append `value` unless an equal value is already present.
pub fn push_unique(values: &mut Vec<Scalar>, value: Scalar) {
    if !values.iter().any(|existing| existing.same_value(&value)) {
        values.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_text_only_accepts_exact_numbers() {
        assert_eq!(Scalar::parse_text("12"), Scalar::Integer(12));
        assert_eq!(Scalar::parse_text("-3"), Scalar::Integer(-3));
        assert_eq!(Scalar::parse_text("1.5"), Scalar::Number(1.5));
        assert_eq!(Scalar::parse_text("01"), Scalar::string("01"));
        assert_eq!(Scalar::parse_text("1e3"), Scalar::string("1e3"));
        assert_eq!(Scalar::parse_text("NaN"), Scalar::string("NaN"));
        assert_eq!(Scalar::parse_text("yes"), Scalar::string("yes"));
    }

    #[test]
    fn display_round_trips_through_parse_text() {
        for scalar in [
            Scalar::Integer(7),
            Scalar::Number(2.25),
            Scalar::string("A"),
        ] {
            assert_eq!(Scalar::parse_text(&scalar.to_string()), scalar);
        }
    }

    #[test]
    fn integral_floats_compare_equal_to_integers() {
        assert!(Scalar::Number(9.0).same_value(&Scalar::Integer(9)));
        assert!(!Scalar::Number(9.5).same_value(&Scalar::Integer(9)));
        assert!(!Scalar::string("9").same_value(&Scalar::Integer(9)));
        assert_eq!(Scalar::Number(4.0).normalized(), Scalar::Integer(4));
        assert_eq!(Scalar::Number(4.5).normalized(), Scalar::Number(4.5));
    }

    #[test]
    fn json_form_is_untagged() {
        let values: Vec<Scalar> = serde_json::from_str(r#"[1, 2.5, "x"]"#).expect("parse");
        assert_eq!(
            values,
            vec![Scalar::Integer(1), Scalar::Number(2.5), Scalar::string("x")]
        );
        let json = serde_json::to_string(&values).expect("serialize");
        assert_eq!(json, r#"[1,2.5,"x"]"#);
    }

    #[test]
    fn push_unique_skips_equal_values() {
        let mut values = vec![Scalar::Integer(9)];
        push_unique(&mut values, Scalar::Number(9.0));
        push_unique(&mut values, Scalar::Integer(99));
        assert_eq!(values, vec![Scalar::Integer(9), Scalar::Integer(99)]);
    }
}
