//! Conversions between VM values and Rust types for native argument handling.
//!
//! ```ignore
//! registry.register("java/lang/Math", "max(JJ)J", |_thread, args| {
//!     let a = i64::from_value(args[0])?;
//!     ...
//! });
//! ```

use crate::error::{AbiResult, NativeError};
use crate::value::{ObjectRef, Value};

/// Convert from a `Value` to a Rust type.
pub trait FromValue: Sized {
    /// Convert, returning an error if the value has the wrong type.
    fn from_value(value: Value) -> AbiResult<Self>;
}

/// Convert from a Rust type to a `Value`.
pub trait IntoValue {
    /// Convert to a `Value`.
    fn into_value(self) -> Value;
}

fn mismatch(expected: &str, value: Value) -> NativeError {
    NativeError::TypeMismatch {
        expected: expected.to_string(),
        got: format!("{:?}", value),
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> AbiResult<Self> {
        value.as_int().ok_or_else(|| mismatch("int", value))
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> AbiResult<Self> {
        value.as_long().ok_or_else(|| mismatch("long", value))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> AbiResult<Self> {
        value.as_float().ok_or_else(|| mismatch("float", value))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> AbiResult<Self> {
        value.as_double().ok_or_else(|| mismatch("double", value))
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> AbiResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("boolean", value))
    }
}

impl FromValue for Option<ObjectRef> {
    fn from_value(value: Value) -> AbiResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            value
                .as_object()
                .map(Some)
                .ok_or_else(|| mismatch("reference", value))
        }
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::int(self)
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::long(self)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::float(self)
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::double(self)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::bool(self)
    }
}

impl IntoValue for Option<ObjectRef> {
    fn into_value(self) -> Value {
        self.map(Value::object).unwrap_or_default()
    }
}
