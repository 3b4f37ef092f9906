//! Driver-agnostic value types.
//!
//! Column values cross the driver boundary as [`Value`], a tagged variant.
//! Typed extraction goes through [`FromValue`] and, for whole rows,
//! [`FromRow`].

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{Error, Result};

// ============================================================================
// Type OIDs
// ============================================================================

/// PostgreSQL object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Oid(pub u32);

impl Oid {
    pub const BOOL: Oid = Oid(16);
    pub const BYTEA: Oid = Oid(17);
    pub const CHAR: Oid = Oid(18);
    pub const NAME: Oid = Oid(19);
    pub const INT8: Oid = Oid(20);
    pub const INT2: Oid = Oid(21);
    pub const INT4: Oid = Oid(23);
    pub const TEXT: Oid = Oid(25);
    pub const JSON: Oid = Oid(114);
    pub const FLOAT4: Oid = Oid(700);
    pub const FLOAT8: Oid = Oid(701);
    pub const BPCHAR: Oid = Oid(1042);
    pub const VARCHAR: Oid = Oid(1043);
    pub const DATE: Oid = Oid(1082);
    pub const TIME: Oid = Oid(1083);
    pub const TIMESTAMP: Oid = Oid(1114);
    pub const TIMESTAMPTZ: Oid = Oid(1184);
    pub const UUID: Oid = Oid(2950);
    pub const JSONB: Oid = Oid(3802);

    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl From<u32> for Oid {
    fn from(oid: u32) -> Self {
        Oid(oid)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Values
// ============================================================================

/// A single column value.
///
/// Date and time variants use the server's binary representation:
/// microseconds (or days) relative to 2000-01-01.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Text(String),
    Bytea(Vec<u8>),
    Uuid([u8; 16]),
    Timestamp(i64),
    Date(i32),
    Time(i64),
    Json(String),
    Raw { oid: Oid, data: Vec<u8> },
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Type OID of the value. NULL reports TEXT.
    pub fn type_oid(&self) -> Oid {
        match self {
            Value::Null | Value::Text(_) => Oid::TEXT,
            Value::Bool(_) => Oid::BOOL,
            Value::Int2(_) => Oid::INT2,
            Value::Int4(_) => Oid::INT4,
            Value::Int8(_) => Oid::INT8,
            Value::Float4(_) => Oid::FLOAT4,
            Value::Float8(_) => Oid::FLOAT8,
            Value::Bytea(_) => Oid::BYTEA,
            Value::Uuid(_) => Oid::UUID,
            Value::Timestamp(_) => Oid::TIMESTAMP,
            Value::Date(_) => Oid::DATE,
            Value::Time(_) => Oid::TIME,
            Value::Json(_) => Oid::JSONB,
            Value::Raw { oid, .. } => *oid,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOL",
            Value::Int2(_) => "INT2",
            Value::Int4(_) => "INT4",
            Value::Int8(_) => "INT8",
            Value::Float4(_) => "FLOAT4",
            Value::Float8(_) => "FLOAT8",
            Value::Text(_) => "TEXT",
            Value::Bytea(_) => "BYTEA",
            Value::Uuid(_) => "UUID",
            Value::Timestamp(_) => "TIMESTAMP",
            Value::Date(_) => "DATE",
            Value::Time(_) => "TIME",
            Value::Json(_) => "JSON",
            Value::Raw { .. } => "RAW",
        }
    }

    /// Extract a typed value.
    #[inline]
    pub fn get<T: FromValue>(&self) -> Result<T> {
        T::from_value(self)
    }
}

macro_rules! value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i16 => Int2,
    i32 => Int4,
    i64 => Int8,
    f32 => Float4,
    f64 => Float8,
    String => Text,
    Vec<u8> => Bytea,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Uuid(v.into_bytes())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// ============================================================================
// Typed extraction
// ============================================================================

/// Conversion from a column [`Value`] into a Rust type.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
}

fn mismatch<T>(value: &Value, target: &str) -> Result<T> {
    Err(Error::Type(format!(
        "cannot scan {} into {}",
        value.kind(),
        target
    )))
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(*v),
            other => mismatch(other, "bool"),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Int2(v) => Ok(i64::from(*v)),
            Value::Int4(v) => Ok(i64::from(*v)),
            Value::Int8(v) => Ok(*v),
            other => mismatch(other, "i64"),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self> {
        let wide = i64::from_value(value).or_else(|_| mismatch(value, "i32"))?;
        i32::try_from(wide).map_err(|_| Error::Type(format!("{} out of range for i32", wide)))
    }
}

impl FromValue for i16 {
    fn from_value(value: &Value) -> Result<Self> {
        let wide = i64::from_value(value).or_else(|_| mismatch(value, "i16"))?;
        i16::try_from(wide).map_err(|_| Error::Type(format!("{} out of range for i16", wide)))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float4(v) => Ok(f64::from(*v)),
            Value::Float8(v) => Ok(*v),
            other => mismatch(other, "f64"),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float4(v) => Ok(*v),
            other => mismatch(other, "f32"),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(v) | Value::Json(v) => Ok(v.clone()),
            other => mismatch(other, "String"),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bytea(v) => Ok(v.clone()),
            Value::Raw { data, .. } => Ok(data.clone()),
            other => mismatch(other, "Vec<u8>"),
        }
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Uuid(bytes) => Ok(uuid::Uuid::from_bytes(*bytes)),
            Value::Text(s) => uuid::Uuid::parse_str(s)
                .map_err(|e| Error::Type(format!("invalid UUID text: {}", e))),
            other => mismatch(other, "Uuid"),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Json(s) | Value::Text(s) => serde_json::from_str(s)
                .map_err(|e| Error::Type(format!("invalid JSON: {}", e))),
            Value::Null => Ok(serde_json::Value::Null),
            other => mismatch(other, "serde_json::Value"),
        }
    }
}

/// 2000-01-01T00:00:00Z as Unix microseconds.
const PG_EPOCH_UNIX_MICROS: i64 = 946_684_800_000_000;

/// 2000-01-01 as days from 0001-01-01 (CE day 1).
const PG_EPOCH_CE_DAYS: i32 = 730_120;

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Timestamp(micros) => micros
                .checked_add(PG_EPOCH_UNIX_MICROS)
                .and_then(DateTime::<Utc>::from_timestamp_micros)
                .ok_or_else(|| Error::Type(format!("timestamp {} out of range", micros))),
            other => mismatch(other, "DateTime<Utc>"),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self> {
        DateTime::<Utc>::from_value(value)
            .map(|ts| ts.naive_utc())
            .or_else(|_| mismatch(value, "NaiveDateTime"))
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Date(days) => days
                .checked_add(PG_EPOCH_CE_DAYS)
                .and_then(NaiveDate::from_num_days_from_ce_opt)
                .ok_or_else(|| Error::Type(format!("date {} out of range", days))),
            other => mismatch(other, "NaiveDate"),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Time(micros) => {
                let secs = u32::try_from(micros.div_euclid(1_000_000))
                    .map_err(|_| Error::Type(format!("time {} out of range", micros)))?;
                let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
                NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
                    .ok_or_else(|| Error::Type(format!("time {} out of range", micros)))
            }
            other => mismatch(other, "NaiveTime"),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Conversion from a full row of values.
pub trait FromRow: Sized {
    fn from_row(values: &[Value]) -> Result<Self>;
}

impl FromRow for Vec<Value> {
    fn from_row(values: &[Value]) -> Result<Self> {
        Ok(values.to_vec())
    }
}

macro_rules! tuple_from_row {
    ($len:expr => $($name:ident : $idx:tt),+) => {
        impl<$($name: FromValue),+> FromRow for ($($name,)+) {
            fn from_row(values: &[Value]) -> Result<Self> {
                if values.len() != $len {
                    return Err(Error::ColumnCount { expected: $len, got: values.len() });
                }
                Ok(($($name::from_value(&values[$idx])?,)+))
            }
        }
    };
}

tuple_from_row!(1 => A: 0);
tuple_from_row!(2 => A: 0, B: 1);
tuple_from_row!(3 => A: 0, B: 1, C: 2);
tuple_from_row!(4 => A: 0, B: 1, C: 2, D: 3);
tuple_from_row!(5 => A: 0, B: 1, C: 2, D: 3, E: 4);
tuple_from_row!(6 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
tuple_from_row!(7 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
tuple_from_row!(8 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
tuple_from_row!(9 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8);
tuple_from_row!(10 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9);
tuple_from_row!(11 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10);
tuple_from_row!(12 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11);

// ============================================================================
// Command tags and identifiers
// ============================================================================

/// Summary returned by the server for a non-query statement, e.g. `INSERT 0 5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CommandTag(pub String);

impl CommandTag {
    pub fn new(tag: impl Into<String>) -> Self {
        CommandTag(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of rows the statement affected, or 0 if the tag carries none.
    pub fn rows_affected(&self) -> u64 {
        let parts: Vec<&str> = self.0.split_whitespace().collect();
        match parts.as_slice() {
            ["INSERT", _, n]
            | ["UPDATE", n]
            | ["DELETE", n]
            | ["SELECT", n]
            | ["MOVE", n]
            | ["FETCH", n]
            | ["COPY", n] => n.parse().unwrap_or(0),
            _ => 0,
        }
    }
}

impl fmt::Display for CommandTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommandTag {
    fn from(tag: &str) -> Self {
        CommandTag(tag.to_string())
    }
}

/// Schema-qualified table name. Parts are lower-cased on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Identifier(Vec<String>);

impl Identifier {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Identifier(parts.into_iter().map(|p| p.as_ref().to_lowercase()).collect())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Quoted, dot-separated form suitable for embedding in SQL.
    pub fn sanitize(&self) -> String {
        self.0
            .iter()
            .map(|p| format!("\"{}\"", p.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl From<&str> for Identifier {
    /// Splits on `.`, so `"Public.Users"` becomes `["public", "users"]`.
    fn from(name: &str) -> Self {
        Identifier::new(name.split('.'))
    }
}
