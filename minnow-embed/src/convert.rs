// minnow-embed - Type conversion traits
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Type conversion between Rust and Minnow values.
//!
//! This module provides the [`IntoValue`] and [`FromValue`] traits for
//! converting between Rust types and [`Value`].
//!
//! # Built-in Conversions
//!
//! | Rust Type | Minnow Type |
//! |-----------|-------------|
//! | `()` | `null` |
//! | `bool` | `bool` |
//! | `i32`, `i64`, `usize` | `number` |
//! | `f32`, `f64` | `number` |
//! | `String`, `&str`, `Arc<str>` | constant string |
//! | `Option<T>` | `T` or `null` |
//!
//! Converting Rust strings produces *constant* strings, which need no heap
//! and are never collected. To hand a script a GC-managed string, allocate
//! it on the receiving thread with
//! [`Thread::new_string`](minnow_vm::Thread::new_string).
//!
//! Reading a value back needs the thread that owns it, because owned
//! strings live on the thread's heap; that is why [`FromValue::from_value`]
//! takes the thread.

use std::sync::Arc;

use minnow_vm::{Thread, Value};

use crate::error::{Error, Result};

/// Convert a Rust type into a Minnow [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Convert a Minnow [`Value`] into a Rust type.
pub trait FromValue: Sized {
    fn from_value(value: &Value, thread: &Thread<'_>) -> Result<Self>;
}

// ============================================================================
// IntoValue implementations
// ============================================================================

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Null
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Number(self)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Number(self as f64)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Number(self as f64)
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Number(self as f64)
    }
}

impl IntoValue for usize {
    fn into_value(self) -> Value {
        Value::Number(self as f64)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::const_string(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::const_string(self)
    }
}

impl IntoValue for Arc<str> {
    fn into_value(self) -> Value {
        Value::ConstString(self)
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(value) => value.into_value(),
            None => Value::Null,
        }
    }
}

// ============================================================================
// FromValue implementations
// ============================================================================

impl FromValue for Value {
    fn from_value(value: &Value, _thread: &Thread<'_>) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value, _thread: &Thread<'_>) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| Error::conversion("bool", value.type_name()))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value, _thread: &Thread<'_>) -> Result<Self> {
        value
            .as_number()
            .ok_or_else(|| Error::conversion("f64", value.type_name()))
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value, thread: &Thread<'_>) -> Result<Self> {
        let number = f64::from_value(value, thread)?;
        let narrowed = number as f32;
        if number.is_finite() && !narrowed.is_finite() {
            return Err(Error::conversion("f32", "number"));
        }
        Ok(narrowed)
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value, thread: &Thread<'_>) -> Result<Self> {
        let number = f64::from_value(value, thread)?;
        if number.fract() != 0.0 {
            return Err(Error::conversion("i64", "fractional number"));
        }
        Ok(number as i64)
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value, thread: &Thread<'_>) -> Result<Self> {
        let wide = i64::from_value(value, thread)?;
        i32::try_from(wide).map_err(|_| Error::conversion("i32", "number"))
    }
}

impl FromValue for usize {
    fn from_value(value: &Value, thread: &Thread<'_>) -> Result<Self> {
        let wide = i64::from_value(value, thread)?;
        usize::try_from(wide).map_err(|_| Error::conversion("usize", "number"))
    }
}

impl FromValue for String {
    fn from_value(value: &Value, thread: &Thread<'_>) -> Result<Self> {
        thread
            .value_str(value)
            .map(str::to_string)
            .ok_or_else(|| Error::conversion("String", value.type_name()))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value, thread: &Thread<'_>) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value, thread).map(Some)
        }
    }
}
