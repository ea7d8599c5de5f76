//! Typed values for binding, and typed row decoding back to JSON.

use crate::config::{ColumnType, ResolvedEntity};
use chrono::NaiveDate;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::Row;

/// A value that can be bound to a PostgreSQL query. Nulls keep their column type so the
/// server sees a correctly typed parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    BigInt(Option<i64>),
    Integer(Option<i32>),
    Double(Option<f64>),
    Text(Option<String>),
    Bool(Option<bool>),
    Date(Option<NaiveDate>),
}

impl SqlValue {
    pub fn null_of(column_type: &ColumnType) -> Self {
        match column_type {
            ColumnType::BigInt => SqlValue::BigInt(None),
            ColumnType::Integer => SqlValue::Integer(None),
            ColumnType::Double => SqlValue::Double(None),
            ColumnType::Text | ColumnType::Enum(_) => SqlValue::Text(None),
            ColumnType::Boolean => SqlValue::Bool(None),
            ColumnType::Date => SqlValue::Date(None),
        }
    }
}

/// Bind every parameter in order.
pub fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        query = match p {
            SqlValue::BigInt(v) => query.bind(*v),
            SqlValue::Integer(v) => query.bind(*v),
            SqlValue::Double(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.clone()),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Date(v) => query.bind(*v),
        };
    }
    query
}

/// Decode a row into a JSON object using the entity's declared column types.
pub fn row_to_json(row: &PgRow, entity: &ResolvedEntity) -> Result<Value, sqlx::Error> {
    let mut map = serde_json::Map::new();
    for col in &entity.columns {
        let name = col.name.as_str();
        let v = match &col.column_type {
            ColumnType::BigInt => row.try_get::<Option<i64>, _>(name)?.map(Value::from),
            ColumnType::Integer => row.try_get::<Option<i32>, _>(name)?.map(Value::from),
            ColumnType::Double => row
                .try_get::<Option<f64>, _>(name)?
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            ColumnType::Text | ColumnType::Enum(_) => {
                row.try_get::<Option<String>, _>(name)?.map(Value::String)
            }
            ColumnType::Boolean => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
            ColumnType::Date => row
                .try_get::<Option<NaiveDate>, _>(name)?
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
        };
        map.insert(name.to_string(), v.unwrap_or(Value::Null));
    }
    Ok(Value::Object(map))
}
