//! Date dimension: one row per distinct collision day.

use std::collections::BTreeSet;

use chrono::{Datelike, Weekday};

use crate::error::PipelineResult;
use crate::types::{DataSet, DataType, Field, Schema, Value};

use super::keys::date_key;

/// Schema of `collisions_dim_date`.
pub fn dim_date_schema() -> Schema {
    Schema::new(vec![
        Field::new("date_key", DataType::Int64),
        Field::new("year", DataType::Int32),
        Field::new("month", DataType::Int32),
        Field::new("day", DataType::Int32),
        Field::new("day_of_week", DataType::Utf8),
        Field::new("is_weekend", DataType::Bool),
    ])
}

/// Distinct `collision_datetime` days in ascending order.
///
/// A null timestamp contributes one all-null row, which validation rejects.
pub fn build_dim_date(curated: &DataSet) -> PipelineResult<DataSet> {
    let dt_idx = curated.column_index("collision_datetime")?;

    let mut dates = BTreeSet::new();
    let mut has_null = false;
    for row in &curated.rows {
        match row[dt_idx].as_datetime() {
            Some(dt) => {
                dates.insert(dt.date());
            }
            None => has_null = true,
        }
    }

    let mut rows: Vec<Vec<Value>> = dates
        .into_iter()
        .map(|date| {
            let weekday = date.weekday();
            vec![
                Value::Int64(date_key(date)),
                Value::Int32(date.year()),
                Value::Int32(date.month() as i32),
                Value::Int32(date.day() as i32),
                Value::Utf8(weekday_name(weekday).to_string()),
                Value::Bool(weekday.number_from_monday() >= 6),
            ]
        })
        .collect();
    if has_null {
        rows.push(vec![Value::Null; 6]);
    }

    Ok(DataSet::new(dim_date_schema(), rows))
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::build_dim_date;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn datetimes(values: Vec<Value>) -> DataSet {
        DataSet::new(
            Schema::new(vec![Field::new("collision_datetime", DataType::DateTime)]),
            values.into_iter().map(|v| vec![v]).collect(),
        )
    }

    fn at(d: u32, h: u32) -> Value {
        Value::DateTime(NaiveDate::from_ymd_opt(2023, 9, d).unwrap().and_hms_opt(h, 0, 0).unwrap())
    }

    #[test]
    fn one_sorted_row_per_day() {
        let ds = datetimes(vec![at(3, 22), at(1, 8), at(3, 7)]);
        let dim = build_dim_date(&ds).unwrap();

        assert_eq!(dim.row_count(), 2);
        assert_eq!(
            dim.rows[0],
            vec![
                Value::Int64(20230901),
                Value::Int32(2023),
                Value::Int32(9),
                Value::Int32(1),
                Value::Utf8("Friday".into()),
                Value::Bool(false),
            ]
        );
        assert_eq!(dim.rows[1][0], Value::Int64(20230903));
        assert_eq!(dim.rows[1][4], Value::Utf8("Sunday".into()));
        assert_eq!(dim.rows[1][5], Value::Bool(true));
    }

    #[test]
    fn null_timestamp_surfaces_as_null_row() {
        let dim = build_dim_date(&datetimes(vec![at(1, 8), Value::Null])).unwrap();
        assert_eq!(dim.row_count(), 2);
        assert!(dim.rows[1].iter().all(Value::is_null));
    }
}
