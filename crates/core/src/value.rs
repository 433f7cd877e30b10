//! Value types for SnapKV
//!
//! This module defines:
//! - Value: Unified enum for all stored data
//! - VersionedValue: An immutable `(version, value)` pair in a key's history
//!
//! ## Type Rules
//!
//! - Eight variants only
//! - No implicit type coercions
//! - `Int(1) != Float(1.0)`: different variants are NEVER equal
//! - `Bytes` are not `String`
//! - Float uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value stored under a key
///
/// ## Type Equality
///
/// Different variants are NEVER equal, even if they hold the same "value":
/// - `Int(1) != Float(1.0)`
/// - `Bytes(b"hello") != String("hello")`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Array of values
    Array(Vec<Value>),
    /// Object with string keys
    Object(HashMap<String, Value>),
}

// Variant-strict equality; floats compare as f64, so NaN != NaN and -0.0 == 0.0
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Object(a), Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// The integer payload, if this is `Int`
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The string payload, if this is `String`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean payload, if this is `Bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($($source:ty => |$v:ident| $build:expr;)*) => {
        $(
            impl From<$source> for Value {
                fn from($v: $source) -> Self {
                    $build
                }
            }
        )*
    };
}

value_from! {
    () => |_unit| Value::Null;
    bool => |b| Value::Bool(b);
    i32 => |i| Value::Int(i64::from(i));
    i64 => |i| Value::Int(i);
    f64 => |f| Value::Float(f);
    &str => |s| Value::String(s.to_owned());
    String => |s| Value::String(s);
    &[u8] => |b| Value::Bytes(b.to_vec());
    Vec<u8> => |b| Value::Bytes(b);
    Vec<Value> => |items| Value::Array(items);
    HashMap<String, Value> => |fields| Value::Object(fields);
}

// ============================================================================
// VersionedValue
// ============================================================================

/// An immutable `(version, value)` pair
///
/// One entry in a key's history. The version is the commit version of the
/// transaction that installed the value. Fields are private so a
/// `VersionedValue` cannot be changed once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedValue {
    version: u64,
    value: Value,
}

impl VersionedValue {
    /// Create a new versioned value
    pub fn new(version: u64, value: Value) -> Self {
        Self { version, value }
    }

    /// Commit version that installed this value
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The stored value
    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }
}
