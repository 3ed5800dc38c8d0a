//! Missing-value resolution.
//!
//! Sources may declare missing codes as discrete values and as ranges. Both
//! are flattened into one list; a range is only accepted when it covers a
//! single value.

use vlmd_model::{Scalar, push_unique};

use crate::error::ResolveError;
use crate::values::RawValue;

/// Flatten discrete missing values and ranges into one ordered list.
///
/// Discrete values come first, then collapsed ranges; duplicates are dropped.
/// A range whose endpoints differ fails with
/// [`ResolveError::UnsupportedMissingRange`].
pub fn resolve_missing_values(
    field: &str,
    discrete: &[RawValue],
    ranges: &[(RawValue, RawValue)],
) -> Result<Vec<Scalar>, ResolveError> {
    let mut resolved = Vec::with_capacity(discrete.len() + ranges.len());
    for value in discrete {
        push_unique(&mut resolved, value.to_scalar());
    }
    for (lo, hi) in ranges {
        if !same_endpoint(lo, hi) {
            return Err(ResolveError::UnsupportedMissingRange {
                field: field.to_string(),
                lo: lo.to_string(),
                hi: hi.to_string(),
            });
        }
        push_unique(&mut resolved, lo.to_scalar());
    }
    Ok(resolved)
}

fn same_endpoint(lo: &RawValue, hi: &RawValue) -> bool {
    match (lo, hi) {
        (RawValue::Number(lo), RawValue::Number(hi)) => lo == hi,
        (RawValue::Text(lo), RawValue::Text(hi)) => lo == hi,
        (RawValue::Date(lo), RawValue::Date(hi)) => lo == hi,
        (RawValue::Datetime(lo), RawValue::Datetime(hi)) => lo == hi,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn discrete_values_are_kept_in_order() {
        let resolved = resolve_missing_values(
            "q1",
            &[RawValue::Number(99.0), RawValue::Number(98.0), RawValue::Number(99.0)],
            &[],
        )
        .unwrap();
        assert_eq!(resolved, vec![Scalar::Integer(99), Scalar::Integer(98)]);
    }

    #[test]
    fn degenerate_range_collapses_to_one_value() {
        let resolved = resolve_missing_values(
            "q1",
            &[],
            &[(RawValue::Number(99.0), RawValue::Number(99.0))],
        )
        .unwrap();
        assert_eq!(resolved, vec![Scalar::Integer(99)]);
    }

    #[test]
    fn range_follows_discrete_values() {
        let resolved = resolve_missing_values(
            "q1",
            &[RawValue::Number(-1.0)],
            &[(RawValue::Number(99.0), RawValue::Number(99.0))],
        )
        .unwrap();
        assert_eq!(resolved, vec![Scalar::Integer(-1), Scalar::Integer(99)]);
    }

    #[test]
    fn real_range_is_rejected() {
        let err = resolve_missing_values(
            "income",
            &[],
            &[(RawValue::Number(97.0), RawValue::Number(99.0))],
        )
        .unwrap_err();
        match err {
            ResolveError::UnsupportedMissingRange { field, lo, hi } => {
                assert_eq!(field, "income");
                assert_eq!(lo, "97");
                assert_eq!(hi, "99");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn date_range_becomes_iso_text() {
        let date = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        let resolved = resolve_missing_values(
            "visit",
            &[],
            &[(RawValue::Date(date), RawValue::Date(date))],
        )
        .unwrap();
        assert_eq!(resolved, vec![Scalar::string("1900-01-01")]);

        let datetime = date.and_hms_opt(0, 0, 0).unwrap();
        let resolved = resolve_missing_values(
            "stamp",
            &[],
            &[(RawValue::Datetime(datetime), RawValue::Datetime(datetime))],
        )
        .unwrap();
        assert_eq!(resolved, vec![Scalar::string("1900-01-01 00:00:00")]);
    }

    #[test]
    fn empty_declarations_resolve_to_nothing() {
        assert!(resolve_missing_values("x", &[], &[]).unwrap().is_empty());
    }
}
