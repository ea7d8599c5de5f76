//! Input coercion: raw JSON mapping → typed column values for one entity.
//!
//! The entity's columns are the whitelist. Each supplied key is dispatched to the setter for
//! its declared type; unknown keys and the primary key are rejected before touching the store.

use crate::config::{ColumnInfo, ColumnType, ResolvedEntity};
use crate::error::AppError;
use crate::sql::SqlValue;
use chrono::NaiveDate;
use serde_json::{Map, Value};

/// Expected format for date columns.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Coerce `data` into (column, value) pairs in declared column order.
pub fn preprocess(
    entity: &ResolvedEntity,
    mut data: Map<String, Value>,
) -> Result<Vec<(String, SqlValue)>, AppError> {
    if let Some(key) = data.keys().find(|k| entity.column(k.as_str()).is_none()) {
        return Err(AppError::BadInput(format!(
            "unknown field '{}' for table '{}'",
            key, entity.table_name
        )));
    }
    if data.contains_key(&entity.pk_column) {
        return Err(AppError::BadInput(format!(
            "'{}' is generated by the server and cannot be written",
            entity.pk_column
        )));
    }
    let mut out = Vec::with_capacity(data.len());
    for col in &entity.columns {
        if let Some(v) = data.remove(&col.name) {
            out.push((col.name.clone(), coerce(col, &v)?));
        }
    }
    Ok(out)
}

/// Fail unless every required column (non-nullable, no default) is present. Used on create.
pub fn ensure_required(
    entity: &ResolvedEntity,
    values: &[(String, SqlValue)],
) -> Result<(), AppError> {
    let missing: Vec<&str> = entity
        .columns
        .iter()
        .filter(|c| c.is_required() && !values.iter().any(|(name, _)| *name == c.name))
        .map(|c| c.name.as_str())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::BadInput(format!("missing required field(s): {}", missing.join(", "))))
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(field: &str, s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| {
        AppError::BadInput(format!(
            "invalid date format for {}: '{}', expected YYYY-MM-DD",
            field, s
        ))
    })
}

fn mismatch(col: &ColumnInfo, v: &Value) -> AppError {
    AppError::BadInput(format!(
        "{} must be {}, got {}",
        col.name,
        match &col.column_type {
            ColumnType::BigInt | ColumnType::Integer => "an integer",
            ColumnType::Double => "a number",
            ColumnType::Text | ColumnType::Enum(_) => "a string",
            ColumnType::Boolean => "a boolean",
            ColumnType::Date => "a date string",
        },
        v
    ))
}

fn coerce(col: &ColumnInfo, v: &Value) -> Result<SqlValue, AppError> {
    if v.is_null() {
        if !col.nullable {
            return Err(AppError::BadInput(format!("{} cannot be null", col.name)));
        }
        return Ok(SqlValue::null_of(&col.column_type));
    }
    Ok(match &col.column_type {
        ColumnType::BigInt => SqlValue::BigInt(Some(v.as_i64().ok_or_else(|| mismatch(col, v))?)),
        ColumnType::Integer => {
            let n = v.as_i64().ok_or_else(|| mismatch(col, v))?;
            let n = i32::try_from(n)
                .map_err(|_| AppError::BadInput(format!("{} is out of range: {}", col.name, n)))?;
            SqlValue::Integer(Some(n))
        }
        ColumnType::Double => SqlValue::Double(Some(v.as_f64().ok_or_else(|| mismatch(col, v))?)),
        ColumnType::Text => SqlValue::Text(Some(v.as_str().ok_or_else(|| mismatch(col, v))?.to_string())),
        ColumnType::Boolean => SqlValue::Bool(Some(v.as_bool().ok_or_else(|| mismatch(col, v))?)),
        ColumnType::Date => {
            let s = v.as_str().ok_or_else(|| mismatch(col, v))?;
            SqlValue::Date(Some(parse_date(&col.name, s)?))
        }
        ColumnType::Enum(allowed) => {
            let s = v.as_str().ok_or_else(|| mismatch(col, v))?;
            if !allowed.iter().any(|a| a == s) {
                return Err(AppError::BadInput(format!(
                    "{} must be one of: {}",
                    col.name,
                    allowed.join(", ")
                )));
            }
            SqlValue::Text(Some(s.to_string()))
        }
    })
}
