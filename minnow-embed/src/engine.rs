// minnow-embed - Engine implementation
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The Engine struct - main entry point for embedding Minnow.

use std::path::Path;

use minnow_parser::Diagnostic;
use minnow_vm::{RuntimeError, State, Thread, Value};

use crate::convert::{FromValue, IntoValue};
use crate::error::{Error, Result};

/// The Minnow scripting engine.
///
/// `Engine` wraps a [`State`] with an ergonomic surface: bind Rust
/// functions and constants, compile source, spawn threads, and convert
/// values. The setup phase needs `&mut self`; running needs only `&self`,
/// so a compiled engine can back threads on several host threads at once
/// (each [`Thread`] itself stays on one host thread).
///
/// # Example
///
/// ```rust
/// use minnow_embed::Engine;
///
/// let mut engine = Engine::new();
/// engine.compile("demo", "x := 6 * 7").unwrap();
/// let thread = engine.run().unwrap();
/// let x: f64 = engine.global(&thread, "x").unwrap();
/// assert_eq!(x, 42.0);
/// ```
pub struct Engine {
    state: State,
}

impl Engine {
    /// Create an engine with an empty state. No functions are pre-bound;
    /// the host decides the script's whole foreign surface.
    pub fn new() -> Self {
        Engine {
            state: State::new(),
        }
    }

    /// Register a Rust function callable from scripts.
    ///
    /// # Example
    ///
    /// ```rust
    /// use minnow_embed::{Engine, Value};
    ///
    /// let mut engine = Engine::new();
    /// engine
    ///     .bind_function("add", |_thread, args| {
    ///         let a = args[0].as_number().unwrap_or(0.0);
    ///         let b = args[1].as_number().unwrap_or(0.0);
    ///         Ok(Value::number(a + b))
    ///     })
    ///     .unwrap();
    /// engine.compile("demo", "z := add(2, 40)").unwrap();
    /// let thread = engine.run().unwrap();
    /// assert_eq!(engine.global::<f64>(&thread, "z").unwrap(), 42.0);
    /// ```
    pub fn bind_function<F>(&mut self, name: &str, callee: F) -> Result<()>
    where
        F: for<'a> Fn(&mut Thread<'a>, &[Value]) -> std::result::Result<Value, RuntimeError>
            + Send
            + Sync
            + 'static,
    {
        self.state.bind_function(name, callee)?;
        Ok(())
    }

    /// Register a host-owned numeric constant.
    pub fn bind_const_number(&mut self, name: &str, value: f64) -> Result<()> {
        self.state.bind_const_number(name, value)?;
        Ok(())
    }

    /// Register a host-owned string constant.
    pub fn bind_const_string(&mut self, name: &str, value: &str) -> Result<()> {
        self.state.bind_const_string(name, value)?;
        Ok(())
    }

    /// Compile `source` onto the engine's state. Compiling again
    /// concatenates programs.
    pub fn compile(&mut self, label: &str, source: &str) -> Result<()> {
        self.state.compile_string(label, source)?;
        Ok(())
    }

    /// Compile a source file from disk.
    pub fn compile_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.state.compile_file(&path.as_ref().to_string_lossy())?;
        Ok(())
    }

    /// Create an idle thread over the compiled state.
    pub fn spawn(&self) -> Thread<'_> {
        Thread::new(&self.state)
    }

    /// Spawn a thread, run the program to completion, and return the
    /// finished thread for inspection.
    pub fn run(&self) -> Result<Thread<'_>> {
        let mut thread = self.spawn();
        thread.start();
        thread.run()?;
        Ok(thread)
    }

    /// Call a script function by name on the given thread.
    pub fn call(&self, thread: &mut Thread<'_>, name: &str, args: &[Value]) -> Result<Value> {
        let index = self
            .state
            .function_index(name)
            .ok_or_else(|| Error::UndefinedFunction(name.to_string()))?;
        Ok(thread.call_function(index, args)?)
    }

    /// Read a global by name, converting it to `T`.
    pub fn global<T: FromValue>(&self, thread: &Thread<'_>, name: &str) -> Result<T> {
        let index = self
            .state
            .global_index(name)
            .ok_or_else(|| Error::UndefinedGlobal(name.to_string()))?;
        let value = thread.global(index)?;
        T::from_value(&value, thread)
    }

    /// Write a global by name.
    pub fn set_global(
        &self,
        thread: &mut Thread<'_>,
        name: &str,
        value: impl IntoValue,
    ) -> Result<()> {
        let index = self
            .state
            .global_index(name)
            .ok_or_else(|| Error::UndefinedGlobal(name.to_string()))?;
        thread.set_global(index, value.into_value())?;
        Ok(())
    }

    /// Warnings accumulated by every compilation so far.
    pub fn warnings(&self) -> &[Diagnostic] {
        self.state.warnings()
    }

    /// The underlying state, for hosts that need the lower-level API.
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}
