//! Conversion between SPSS calendar numbers and chrono values.
//!
//! SPSS stores dates and datetimes as seconds since 1582-10-14 00:00:00
//! (the start of the Gregorian calendar).

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// Start of the SPSS calendar.
pub fn spss_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1582, 10, 14)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Convert SPSS seconds to a datetime, rounding to the millisecond.
pub fn seconds_to_datetime(seconds: f64) -> Option<NaiveDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    let millis = (seconds * 1000.0).round();
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    let delta = TimeDelta::try_milliseconds(millis as i64)?;
    spss_epoch().checked_add_signed(delta)
}

/// Convert SPSS seconds to a date, dropping any time of day.
pub fn seconds_to_date(seconds: f64) -> Option<NaiveDate> {
    seconds_to_datetime(seconds).map(|datetime| datetime.date())
}

pub fn datetime_to_seconds(datetime: NaiveDateTime) -> f64 {
    datetime.signed_duration_since(spss_epoch()).num_milliseconds() as f64 / 1000.0
}

pub fn date_to_seconds(date: NaiveDate) -> f64 {
    date.and_hms_opt(0, 0, 0)
        .map(datetime_to_seconds)
        .unwrap_or_default()
}
