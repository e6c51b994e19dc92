//! Copies a table into another database whose schema may differ, coercing
//! each value to the column type the target declares.

use crate::source::fields::{normalize_phone, parse_timestamp};
use crate::storage::{format_timestamp, Storage};
use crate::{Error, Result};

const NULL_STRINGS: [&str; 6] = ["", "nan", "NaN", "None", "null", "NULL"];

/// Columns holding JSON documents regardless of their declared type.
const JSON_COLUMNS: [&str; 3] = ["links", "pet_amenities", "pet_fee_variations"];

const PHONE_COLUMN: &str = "phone_number";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Boolean,
    Integer,
    BigInt,
    Real,
    Timestamp,
    Json,
    Phone,
}

impl ColumnType {
    /// Maps a declared type, SQLite or Postgres spelling, to a coercion.
    pub fn classify(column: &str, declared: &str) -> Self {
        if column == PHONE_COLUMN {
            return Self::Phone;
        }
        if JSON_COLUMNS.contains(&column) {
            return Self::Json;
        }

        let declared = declared.to_ascii_uppercase();
        if declared.contains("BOOL") {
            Self::Boolean
        } else if declared.contains("JSON") {
            Self::Json
        } else if declared.contains("DATE") || declared.contains("TIME") {
            Self::Timestamp
        } else if declared.contains("BIGINT") || declared.contains("INT8") {
            Self::BigInt
        } else if declared.contains("INT") {
            Self::Integer
        } else if ["REAL", "FLOA", "DOUB", "NUMERIC", "DECIMAL"]
            .iter()
            .any(|t| declared.contains(t))
        {
            Self::Real
        } else {
            Self::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !NULL_STRINGS.contains(v))
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn safe_text(raw: Option<&str>) -> CellValue {
    present(raw).map_or(CellValue::Null, |v| CellValue::Text(v.to_string()))
}

pub fn safe_bool(raw: Option<&str>) -> CellValue {
    present(raw).map_or(CellValue::Null, |v| {
        let v = v.to_ascii_lowercase();
        CellValue::Bool(matches!(v.as_str(), "true" | "1" | "yes" | "y"))
    })
}

pub fn safe_float(raw: Option<&str>) -> CellValue {
    present(raw)
        .and_then(parse_number)
        .map_or(CellValue::Null, CellValue::Real)
}

/// Truncates toward zero. Values outside the 32-bit range become NULL.
#[allow(clippy::cast_possible_truncation)]
pub fn safe_int4(raw: Option<&str>) -> CellValue {
    let Some(value) = present(raw).and_then(parse_number).map(f64::trunc) else {
        return CellValue::Null;
    };

    if value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        tracing::warn!(value, "Integer out of 32-bit range, storing NULL");
        return CellValue::Null;
    }

    CellValue::Integer(value as i64)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn safe_bigint(raw: Option<&str>) -> CellValue {
    present(raw)
        .and_then(parse_number)
        .map(f64::trunc)
        .filter(|v| *v >= i64::MIN as f64 && *v <= i64::MAX as f64)
        .map_or(CellValue::Null, |v| CellValue::Integer(v as i64))
}

/// Valid JSON passes through; anything else is stored as a JSON string.
pub fn safe_json_text(raw: Option<&str>) -> CellValue {
    let Some(value) = present(raw) else {
        return CellValue::Null;
    };

    if serde_json::from_str::<serde_json::Value>(value).is_ok() {
        CellValue::Text(value.to_string())
    } else {
        CellValue::Text(serde_json::Value::String(value.to_string()).to_string())
    }
}

pub fn safe_timestamp(raw: Option<&str>) -> CellValue {
    parse_timestamp(present(raw))
        .map_or(CellValue::Null, |ts| CellValue::Text(format_timestamp(&ts)))
}

pub fn coerce(column_type: ColumnType, raw: Option<&str>) -> CellValue {
    match column_type {
        ColumnType::Text => safe_text(raw),
        ColumnType::Boolean => safe_bool(raw),
        ColumnType::Integer => safe_int4(raw),
        ColumnType::BigInt => safe_bigint(raw),
        ColumnType::Real => safe_float(raw),
        ColumnType::Timestamp => safe_timestamp(raw),
        ColumnType::Json => safe_json_text(raw),
        ColumnType::Phone => {
            normalize_phone(present(raw)).map_or(CellValue::Null, CellValue::Text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub columns: Vec<String>,
    pub types: Vec<ColumnType>,
}

/// Target columns, minus `id`, that the source table also has.
pub async fn plan(from: &Storage, to: &Storage, table: &str) -> Result<TransferPlan> {
    let source_columns: Vec<String> = from
        .table_columns(table)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();

    let (columns, types): (Vec<String>, Vec<ColumnType>) = to
        .table_columns(table)
        .await?
        .into_iter()
        .filter(|c| c.name != "id" && source_columns.contains(&c.name))
        .map(|c| {
            let column_type = ColumnType::classify(&c.name, &c.declared_type);
            (c.name, column_type)
        })
        .unzip();

    if columns.is_empty() {
        return Err(Error::EmptySchema(table.to_string()));
    }

    Ok(TransferPlan { columns, types })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub columns: usize,
    pub rows: usize,
}

/// Replaces the target table's contents with the coerced source rows.
pub async fn transfer(from: &Storage, to: &Storage, table: &str) -> Result<TransferReport> {
    let plan = plan(from, to, table).await?;
    tracing::info!(table, columns = plan.columns.len(), "Transferring table");

    let rows: Vec<Vec<CellValue>> = from
        .fetch_text_rows(table, &plan.columns)
        .await?
        .into_iter()
        .map(|row| {
            plan.types
                .iter()
                .zip(row.iter())
                .map(|(column_type, raw)| coerce(*column_type, raw.as_deref()))
                .collect()
        })
        .collect();

    let inserted = to.replace_rows(table, &plan.columns, &rows).await?;
    tracing::info!(table, rows = inserted, "Transfer complete");

    Ok(TransferReport {
        columns: plan.columns.len(),
        rows: inserted,
    })
}
