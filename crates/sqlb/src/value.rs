//! Dynamically typed values exchanged with the driver.
//!
//! A [`Value`] is both a positional statement argument (it implements
//! [`ToSql`]) and a scan destination slot filled by a
//! [`RowSource`](crate::scan::RowSource). [`FromValue`] turns a scanned value back
//! into a typed record field.

use crate::error::{BoxError, SqlbError, SqlbResult};
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::error::Error;
use tokio_postgres::Row;
use tokio_postgres::types::{IsNull, ToSql, Type};
use uuid::Uuid;

/// A driver-level value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Json(serde_json::Value),
}

impl Value {
    /// Short name of the variant, used in conversion error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Uuid(_) => "uuid",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Json(_) => "json",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Decode column `idx` of a fetched row, choosing the Rust type from the
    /// column's Postgres type.
    pub fn from_row(row: &Row, idx: usize) -> SqlbResult<Value> {
        let column = &row.columns()[idx];
        let decode_err = |e: tokio_postgres::Error| SqlbError::decode(column.name(), e.to_string());

        let value = match *column.type_() {
            Type::BOOL => row.try_get::<_, Option<bool>>(idx).map_err(decode_err)?.map(Value::Bool),
            Type::INT2 => row
                .try_get::<_, Option<i16>>(idx)
                .map_err(decode_err)?
                .map(|v| Value::Int(v.into())),
            Type::INT4 => row
                .try_get::<_, Option<i32>>(idx)
                .map_err(decode_err)?
                .map(|v| Value::Int(v.into())),
            Type::INT8 => row.try_get::<_, Option<i64>>(idx).map_err(decode_err)?.map(Value::Int),
            Type::FLOAT4 => row
                .try_get::<_, Option<f32>>(idx)
                .map_err(decode_err)?
                .map(|v| Value::Float(v.into())),
            Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx).map_err(decode_err)?.map(Value::Float),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
                .try_get::<_, Option<String>>(idx)
                .map_err(decode_err)?
                .map(Value::Text),
            Type::BYTEA => row
                .try_get::<_, Option<Vec<u8>>>(idx)
                .map_err(decode_err)?
                .map(Value::Bytes),
            Type::UUID => row.try_get::<_, Option<Uuid>>(idx).map_err(decode_err)?.map(Value::Uuid),
            Type::TIMESTAMPTZ => row
                .try_get::<_, Option<DateTime<Utc>>>(idx)
                .map_err(decode_err)?
                .map(Value::Timestamp),
            Type::TIMESTAMP => row
                .try_get::<_, Option<NaiveDateTime>>(idx)
                .map_err(decode_err)?
                .map(|v| Value::Timestamp(v.and_utc())),
            Type::DATE => row
                .try_get::<_, Option<NaiveDate>>(idx)
                .map_err(decode_err)?
                .map(Value::Date),
            Type::JSON | Type::JSONB => row
                .try_get::<_, Option<serde_json::Value>>(idx)
                .map_err(decode_err)?
                .map(Value::Json),
            ref other => {
                return Err(SqlbError::decode(
                    column.name(),
                    format!("unsupported column type {other}"),
                ));
            }
        };

        Ok(value.unwrap_or(Value::Null))
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Text(v) => v.to_sql_checked(ty, out),
            Value::Bytes(v) => v.to_sql_checked(ty, out),
            Value::Uuid(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => match *ty {
                Type::TIMESTAMP => v.naive_utc().to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Date(v) => v.to_sql_checked(ty, out),
            Value::Json(v) => v.to_sql_checked(ty, out),
        }
    }

    // NULL binds to any parameter type. Non-null variants are checked
    // against the parameter type by the inner value in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

// ─── Rust → Value ───────────────────────────────────────────────────────────

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Text,
    Vec<u8> => Bytes,
    Uuid => Uuid,
    DateTime<Utc> => Timestamp,
    NaiveDate => Date,
    serde_json::Value => Json,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ─── Value → Rust ───────────────────────────────────────────────────────────

/// Conversion from a scanned [`Value`] into a record field type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, BoxError>;
}

fn mismatch(expected: &str, got: &Value) -> BoxError {
    format!("expected {expected}, got {}", got.kind()).into()
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, BoxError> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Int(v) => Ok(v),
            other => Err(mismatch("int", &other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, BoxError> {
        Ok(i32::try_from(i64::from_value(value)?)?)
    }
}

impl FromValue for i16 {
    fn from_value(value: Value) -> Result<Self, BoxError> {
        Ok(i16::try_from(i64::from_value(value)?)?)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, BoxError> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Bytes(v) => Ok(v),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Uuid(v) => Ok(v),
            Value::Text(v) => Ok(Uuid::parse_str(&v)?),
            other => Err(mismatch("uuid", &other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Timestamp(v) => Ok(v),
            other => Err(mismatch("timestamp", &other)),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Date(v) => Ok(v),
            other => Err(mismatch("date", &other)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Json(v) => Ok(v),
            Value::Null => Ok(serde_json::Value::Null),
            other => Err(mismatch("json", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_none_is_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Text("a".to_string()));
    }

    #[test]
    fn narrowing_int_conversions() {
        assert_eq!(i32::from_value(Value::Int(7)).unwrap(), 7);
        assert!(i16::from_value(Value::Int(i64::from(i16::MAX) + 1)).is_err());
    }

    #[test]
    fn mismatch_reports_both_kinds() {
        let err = String::from_value(Value::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "expected text, got int");
    }

    #[test]
    fn optional_field_accepts_null() {
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<i64>::from_value(Value::Int(3)).unwrap(),
            Some(3)
        );
    }

    #[test]
    fn int4_parameter_encoding_rejects_overflow() {
        let mut buf = BytesMut::new();
        let res = Value::Int(i64::MAX).to_sql(&Type::INT4, &mut buf);
        assert!(res.is_err());

        let mut buf = BytesMut::new();
        let res = Value::Int(42).to_sql(&Type::INT4, &mut buf).unwrap();
        assert!(matches!(res, IsNull::No));
        assert_eq!(&buf[..], &42_i32.to_be_bytes());
    }

    #[test]
    fn int_bound_to_float_parameter_is_rejected() {
        let mut buf = BytesMut::new();
        let res = Value::Int(1).to_sql_checked(&Type::FLOAT8, &mut buf);
        assert!(res.is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn float_bound_to_int_parameter_is_rejected() {
        let mut buf = BytesMut::new();
        assert!(Value::Float(1.0).to_sql_checked(&Type::INT8, &mut buf).is_err());
        assert!(Value::Bool(true).to_sql_checked(&Type::INT4, &mut buf).is_err());
        assert!(Value::from("1").to_sql_checked(&Type::INT8, &mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn matching_parameter_types_encode() {
        let mut buf = BytesMut::new();
        Value::Float(1.5).to_sql_checked(&Type::FLOAT8, &mut buf).unwrap();
        assert_eq!(&buf[..], &1.5_f64.to_be_bytes());

        let mut buf = BytesMut::new();
        Value::Float(1.5).to_sql_checked(&Type::FLOAT4, &mut buf).unwrap();
        assert_eq!(&buf[..], &1.5_f32.to_be_bytes());

        let mut buf = BytesMut::new();
        Value::Int(-3).to_sql_checked(&Type::INT2, &mut buf).unwrap();
        assert_eq!(&buf[..], &(-3_i16).to_be_bytes());

        let mut buf = BytesMut::new();
        Value::from("x").to_sql_checked(&Type::VARCHAR, &mut buf).unwrap();
        assert_eq!(&buf[..], b"x");
    }

    #[test]
    fn null_encodes_as_sql_null() {
        let mut buf = BytesMut::new();
        let res = Value::Null.to_sql(&Type::TEXT, &mut buf).unwrap();
        assert!(matches!(res, IsNull::Yes));
        assert!(buf.is_empty());
    }
}
