//! Conversion between Stata calendar numbers and chrono values.
//!
//! `%td` values count days and `%tc` values count milliseconds, both from
//! 1960-01-01 00:00:00.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// Start of the Stata calendar.
pub fn stata_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1960, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Convert a `%td` day count to a date. Fractional days are truncated.
pub fn days_to_date(days: f64) -> Option<NaiveDate> {
    if !days.is_finite() || days.abs() >= i64::MAX as f64 {
        return None;
    }
    let delta = TimeDelta::try_days(days.floor() as i64)?;
    stata_epoch().date().checked_add_signed(delta)
}

/// Convert a `%tc` millisecond count to a datetime.
pub fn millis_to_datetime(millis: f64) -> Option<NaiveDateTime> {
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    let delta = TimeDelta::try_milliseconds(millis.round() as i64)?;
    stata_epoch().checked_add_signed(delta)
}

pub fn date_to_days(date: NaiveDate) -> f64 {
    date.signed_duration_since(stata_epoch().date()).num_days() as f64
}

pub fn datetime_to_millis(datetime: NaiveDateTime) -> f64 {
    datetime.signed_duration_since(stata_epoch()).num_milliseconds() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_zero() {
        assert_eq!(millis_to_datetime(0.0), Some(stata_epoch()));
        assert_eq!(days_to_date(0.0), Some(stata_epoch().date()));
    }

    #[test]
    fn known_date() {
        // 2000-01-01 is day 14_610 of the Stata calendar.
        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        assert_eq!(date_to_days(date), 14_610.0);
        assert_eq!(days_to_date(14_610.0), Some(date));
        assert_eq!(days_to_date(-1.0), NaiveDate::from_ymd_opt(1959, 12, 31));
    }

    #[test]
    fn datetime_round_trip() {
        let datetime = NaiveDate::from_ymd_opt(2021, 6, 30)
            .unwrap()
            .and_hms_milli_opt(13, 45, 10, 250)
            .unwrap();
        assert_eq!(millis_to_datetime(datetime_to_millis(datetime)), Some(datetime));
    }

    #[test]
    fn non_finite_is_rejected() {
        assert_eq!(days_to_date(f64::NAN), None);
        assert_eq!(millis_to_datetime(f64::INFINITY), None);
    }
}
