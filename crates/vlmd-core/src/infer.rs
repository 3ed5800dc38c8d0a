//! Field type inference from column data.

use polars::prelude::*;
use vlmd_model::FieldType;

/// Infer the canonical type of a column from its values.
///
/// Nulls never widen the type. Floating-point columns whose non-null values
/// are all integral are reported as `integer`. A column with no non-null
/// values is a `string`.
pub fn infer_field_type(column: &Column) -> FieldType {
    if column.null_count() == column.len() {
        return FieldType::String;
    }
    match column.dtype() {
        DataType::Boolean => FieldType::Boolean,
        DataType::String => FieldType::String,
        DataType::Date => FieldType::Date,
        DataType::Datetime(_, _) => FieldType::Datetime,
        dtype if dtype.is_integer() => FieldType::Integer,
        dtype if dtype.is_float() => {
            if all_integral(column) {
                FieldType::Integer
            } else {
                FieldType::Number
            }
        }
        _ => FieldType::Other,
    }
}

fn all_integral(column: &Column) -> bool {
    let Ok(values) = column.as_materialized_series().cast(&DataType::Float64) else {
        return false;
    };
    let Ok(values) = values.f64() else {
        return false;
    };
    values
        .into_iter()
        .flatten()
        .all(|value| value.is_finite() && value.fract() == 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[Option<f64>]) -> Column {
        Series::new("x".into(), values).into()
    }

    #[test]
    fn integral_floats_are_integers() {
        assert_eq!(
            infer_field_type(&column(&[Some(1.0), None, Some(3.0)])),
            FieldType::Integer
        );
        assert_eq!(
            infer_field_type(&column(&[Some(1.0), Some(2.5)])),
            FieldType::Number
        );
    }

    #[test]
    fn all_null_column_is_string() {
        assert_eq!(
            infer_field_type(&column(&[None, None])),
            FieldType::String
        );
        let empty: Column = Series::new_empty("x".into(), &DataType::Float64).into();
        assert_eq!(infer_field_type(&empty), FieldType::String);
    }

    #[test]
    fn other_dtypes() {
        let ints: Column = Series::new("i".into(), &[1i64, 2]).into();
        assert_eq!(infer_field_type(&ints), FieldType::Integer);
        let flags: Column = Series::new("b".into(), &[true, false]).into();
        assert_eq!(infer_field_type(&flags), FieldType::Boolean);
        let text: Column = Series::new("s".into(), &["a", "b"]).into();
        assert_eq!(infer_field_type(&text), FieldType::String);
        let dates: Column = Series::new("d".into(), &[Some(18_000i32), None])
            .cast(&DataType::Date)
            .unwrap()
            .into();
        assert_eq!(infer_field_type(&dates), FieldType::Date);
        let stamps: Column = Series::new("t".into(), &[1_600_000_000_000i64])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap()
            .into();
        assert_eq!(infer_field_type(&stamps), FieldType::Datetime);
    }
}
