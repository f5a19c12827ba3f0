// minnow-embed - High-level embedding API for the Minnow scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # minnow-embed
//!
//! High-level embedding API for the Minnow scripting language.
//!
//! [`Engine`] wraps a compilation [`State`] with conversions between Rust
//! and script values. The lower-level pieces (threads, values, the GC, the
//! FFI signature) are re-exported from `minnow-vm` for hosts that need
//! them.

pub mod convert;
pub mod engine;
pub mod error;

pub use convert::{FromValue, IntoValue};
pub use engine::Engine;
pub use error::{Error, Result};
pub use minnow_parser::{Diagnostic, DiagnosticKind};
pub use minnow_vm::{NativeAddr, NativeProp, RuntimeError, State, Thread, Value};
