//! Conversions from polars cells and source values to [`Scalar`]s.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use vlmd_model::Scalar;

/// Text form of calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Text form of calendar datetimes.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Days between 0001-01-01 and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A value declared by a source's metadata (missing code, range endpoint or
/// label key), before it is flattened into a [`Scalar`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Datetime(NaiveDateTime),
}

impl RawValue {
    /// Flatten into a scalar; integral numbers become integers and calendar
    /// values their text form.
    pub fn to_scalar(&self) -> Scalar {
        match self {
            RawValue::Number(value) => Scalar::Number(*value).normalized(),
            RawValue::Text(value) => Scalar::String(value.clone()),
            RawValue::Date(date) => Scalar::String(format_date(*date)),
            RawValue::Datetime(datetime) => Scalar::String(format_datetime(*datetime)),
        }
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_scalar())
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_datetime(datetime: NaiveDateTime) -> String {
    datetime.format(DATETIME_FORMAT).to_string()
}

/// Convert one polars cell; `None` for null.
pub fn any_to_scalar(value: AnyValue<'_>) -> Option<Scalar> {
    match value {
        AnyValue::Null => None,
        AnyValue::Boolean(flag) => Some(Scalar::String(flag.to_string())),
        AnyValue::Int8(v) => Some(Scalar::Integer(i64::from(v))),
        AnyValue::Int16(v) => Some(Scalar::Integer(i64::from(v))),
        AnyValue::Int32(v) => Some(Scalar::Integer(i64::from(v))),
        AnyValue::Int64(v) => Some(Scalar::Integer(v)),
        AnyValue::UInt8(v) => Some(Scalar::Integer(i64::from(v))),
        AnyValue::UInt16(v) => Some(Scalar::Integer(i64::from(v))),
        AnyValue::UInt32(v) => Some(Scalar::Integer(i64::from(v))),
        AnyValue::UInt64(v) => Some(
            i64::try_from(v)
                .map(Scalar::Integer)
                .unwrap_or(Scalar::Number(v as f64)),
        ),
        AnyValue::Float32(v) => Some(float_scalar(f64::from(v))),
        AnyValue::Float64(v) => Some(float_scalar(v)),
        AnyValue::String(s) => Some(Scalar::String(s.to_string())),
        AnyValue::StringOwned(s) => Some(Scalar::String(s.to_string())),
        AnyValue::Date(days) => days_to_date(days).map(|date| Scalar::String(format_date(date))),
        AnyValue::Datetime(value, unit, _) => timestamp_to_datetime(value, unit)
            .map(|datetime| Scalar::String(format_datetime(datetime))),
        other => Some(Scalar::String(other.to_string())),
    }
}

fn float_scalar(value: f64) -> Scalar {
    Scalar::Number(value).normalized()
}

/// Convert a polars date (days since 1970-01-01).
pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}

/// Polars date value (days since 1970-01-01) of a calendar date.
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Convert a polars datetime at the given unit.
pub fn timestamp_to_datetime(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let datetime = match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
    };
    datetime.map(|datetime| datetime.naive_utc())
}

/// Distinct non-null values of a column in first-seen order.
pub fn distinct_values(column: &Column) -> Vec<Scalar> {
    let mut values = Vec::new();
    let series = column.as_materialized_series().rechunk();
    for value in series.iter() {
        if let Some(scalar) = any_to_scalar(value) {
            vlmd_model::push_unique(&mut values, scalar);
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_values_use_iso_text() {
        let date = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        assert_eq!(
            RawValue::Date(date).to_scalar(),
            Scalar::string("2020-02-29")
        );
        let datetime = date.and_hms_opt(8, 5, 0).unwrap();
        assert_eq!(
            RawValue::Datetime(datetime).to_scalar(),
            Scalar::string("2020-02-29 08:05:00")
        );
        assert_eq!(RawValue::Number(9.0).to_scalar(), Scalar::Integer(9));
        assert_eq!(RawValue::Number(9.5).to_scalar(), Scalar::Number(9.5));
    }

    #[test]
    fn polars_days_round_trip() {
        let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        assert_eq!(days_to_date(date_to_days(date)), Some(date));
        assert_eq!(days_to_date(0), NaiveDate::from_ymd_opt(1970, 1, 1));
    }

    #[test]
    fn distinct_values_skip_nulls_and_merge_equal_numbers() {
        let column: Column =
            Series::new("a".into(), &[Some(1.0), None, Some(2.0), Some(1.0)]).into();
        assert_eq!(
            distinct_values(&column),
            vec![Scalar::Integer(1), Scalar::Integer(2)]
        );
    }
}
