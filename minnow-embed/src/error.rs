// minnow-embed - Error type
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The embedding API's error type, folding together compile-time
//! diagnostics, runtime errors, and conversion failures.

use std::fmt;

use minnow_parser::Diagnostic;
use minnow_vm::RuntimeError;

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the [`Engine`](crate::Engine).
#[derive(Debug)]
pub enum Error {
    /// The source failed to compile.
    Compile(Diagnostic),
    /// The program failed while executing.
    Runtime(RuntimeError),
    /// No global variable with the given name.
    UndefinedGlobal(String),
    /// No script function with the given name.
    UndefinedFunction(String),
    /// A value did not convert to the requested Rust type.
    Conversion {
        expected: &'static str,
        got: &'static str,
    },
}

impl Error {
    pub fn conversion(expected: &'static str, got: &'static str) -> Self {
        Error::Conversion { expected, got }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Compile(diagnostic) => write!(f, "{}", diagnostic),
            Error::Runtime(error) => write!(f, "{}", error),
            Error::UndefinedGlobal(name) => {
                write!(f, "No global variable named '{}'", name)
            }
            Error::UndefinedFunction(name) => {
                write!(f, "No function named '{}'", name)
            }
            Error::Conversion { expected, got } => {
                write!(f, "Cannot convert {} value to {}", got, expected)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<Diagnostic> for Error {
    fn from(diagnostic: Diagnostic) -> Self {
        Error::Compile(diagnostic)
    }
}

impl From<RuntimeError> for Error {
    fn from(error: RuntimeError) -> Self {
        Error::Runtime(error)
    }
}
