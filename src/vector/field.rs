//! Attribute field types and values.
//!
//! Geometries travel alongside tabular attributes; this module carries the
//! external field-type tag space and a typed value enum for the attribute
//! side of that boundary.

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::errors::{Result, TerraneError};

/// An attribute field type. The discriminants are the external tag codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FieldType {
    Integer = 0,
    IntegerList = 1,
    Real = 2,
    RealList = 3,
    String = 4,
    StringList = 5,
    Binary = 8,
    Date = 9,
    Time = 10,
    DateTime = 11,
    Integer64 = 12,
    Integer64List = 13,
}

impl FieldType {
    /// Maps an external tag code, or `UnsupportedFieldType` for codes with
    /// no mapping (including the retired wide-string tags 6 and 7).
    pub fn from_code(code: u32) -> Result<FieldType> {
        Ok(match code {
            0 => FieldType::Integer,
            1 => FieldType::IntegerList,
            2 => FieldType::Real,
            3 => FieldType::RealList,
            4 => FieldType::String,
            5 => FieldType::StringList,
            8 => FieldType::Binary,
            9 => FieldType::Date,
            10 => FieldType::Time,
            11 => FieldType::DateTime,
            12 => FieldType::Integer64,
            13 => FieldType::Integer64List,
            tag => return Err(TerraneError::UnsupportedFieldType { tag }),
        })
    }

    pub fn code(&self) -> u32 {
        *self as u32
    }
}

/// An attribute field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    IntegerValue(i32),
    IntegerListValue(Vec<i32>),
    Integer64Value(i64),
    Integer64ListValue(Vec<i64>),
    StringValue(String),
    StringListValue(Vec<String>),
    RealValue(f64),
    RealListValue(Vec<f64>),
    DateValue(NaiveDate),
    DateTimeValue(DateTime<FixedOffset>),
}

impl FieldValue {
    /// Interpret the value as `String`.
    pub fn into_string(self) -> Option<String> {
        match self {
            FieldValue::StringValue(rv) => Some(rv),
            _ => None,
        }
    }

    /// Interpret the value as `f64`.
    pub fn into_real(self) -> Option<f64> {
        match self {
            FieldValue::RealValue(rv) => Some(rv),
            _ => None,
        }
    }

    /// Interpret the value as `i32`.
    pub fn into_int(self) -> Option<i32> {
        match self {
            FieldValue::IntegerValue(rv) => Some(rv),
            _ => None,
        }
    }

    /// Interpret the value as `i64`. Plain integers widen.
    pub fn into_int64(self) -> Option<i64> {
        match self {
            FieldValue::Integer64Value(rv) => Some(rv),
            FieldValue::IntegerValue(rv) => Some(rv as i64),
            _ => None,
        }
    }

    /// Interpret the value as `NaiveDate`. Date-times give their date part.
    pub fn into_date(self) -> Option<NaiveDate> {
        match self {
            FieldValue::DateValue(rv) => Some(rv),
            FieldValue::DateTimeValue(rv) => Some(rv.date_naive()),
            _ => None,
        }
    }

    /// Interpret the value as `DateTime`.
    pub fn into_datetime(self) -> Option<DateTime<FixedOffset>> {
        match self {
            FieldValue::DateTimeValue(rv) => Some(rv),
            _ => None,
        }
    }

    /// The field type this value stores as.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::IntegerValue(_) => FieldType::Integer,
            FieldValue::IntegerListValue(_) => FieldType::IntegerList,
            FieldValue::Integer64Value(_) => FieldType::Integer64,
            FieldValue::Integer64ListValue(_) => FieldType::Integer64List,
            FieldValue::StringValue(_) => FieldType::String,
            FieldValue::StringListValue(_) => FieldType::StringList,
            FieldValue::RealValue(_) => FieldType::Real,
            FieldValue::RealListValue(_) => FieldType::RealList,
            FieldValue::DateValue(_) => FieldType::Date,
            FieldValue::DateTimeValue(_) => FieldType::DateTime,
        }
    }
}
