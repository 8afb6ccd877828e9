//! Typed dataref value objects
//!
//! A [`DataRef`] identifies one simulator variable by name and carries exactly
//! one typed payload. The payload is a sum type, so the wire discriminant and
//! the populated value can never disagree and the simulator's `Unknown` (0)
//! discriminant is not representable at all.

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire discriminants for dataref payloads.
///
/// The values mirror X-Plane's type bitmask, but a dataref always holds a
/// single type, so this is a plain enum rather than a flag set.
#[repr(i32)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize,
)]
pub enum DataRefType {
    Int = 1,
    Float = 2,
    Double = 4,
    FloatArray = 8,
    IntArray = 16,
    Data = 32,
}

/// One typed dataref payload.
///
/// Array payloads are ordered; element order round-trips through the wire
/// format exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum DataRefValue {
    Int(i32),
    Float(f32),
    Double(f64),
    FloatArray(Vec<f32>),
    IntArray(Vec<i32>),
    Data(String),
}

impl DataRefValue {
    /// Wire discriminant for this payload.
    pub fn data_type(&self) -> DataRefType {
        match self {
            Self::Int(_) => DataRefType::Int,
            Self::Float(_) => DataRefType::Float,
            Self::Double(_) => DataRefType::Double,
            Self::FloatArray(_) => DataRefType::FloatArray,
            Self::IntArray(_) => DataRefType::IntArray,
            Self::Data(_) => DataRefType::Data,
        }
    }
}

impl fmt::Display for DataRefValue {
    /// Renders the wire value segment: scalars as-is, arrays comma-joined
    /// without brackets.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::FloatArray(vs) => {
                let joined: Vec<String> = vs.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", joined.join(","))
            }
            Self::IntArray(vs) => {
                let joined: Vec<String> = vs.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", joined.join(","))
            }
            Self::Data(s) => write!(f, "{}", s),
        }
    }
}

/// An immutable named dataref value.
///
/// Instances are created per request or per decoded reply and scoped to a
/// single round trip; the name is the only field used for correlation.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRef {
    name: String,
    value: DataRefValue,
}

impl DataRef {
    pub fn new(name: impl Into<String>, value: DataRefValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &DataRefValue {
        &self.value
    }

    pub fn data_type(&self) -> DataRefType {
        self.value.data_type()
    }
}
