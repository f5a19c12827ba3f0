// minnow-vm - Compilation state
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The compilation unit: bytecode, tables, and the binding/compiling API.
//!
//! A [`State`] owns the program image, the function-PC table, the
//! foreign-function table, the symbol table, and the literal pools. Hosts
//! mutate it while binding and compiling; afterwards it backs any number of
//! [`Thread`]s, which borrow it immutably, so the borrow checker enforces
//! that compilation and execution never overlap and that threads do not
//! outlive their state.
//!
//! Compiling the same state again concatenates programs: the previous
//! trailing `halt` is overwritten and the new top level runs after the old
//! one.
//!
//! [`Thread`]: crate::thread::Thread

use std::sync::Arc;

use minnow_parser::{Diagnostic, Literals, Parser, SourcePos, SymbolKind, SymbolTable};

use crate::program::Program;
use crate::thread::{RuntimeError, Thread};
use crate::value::Value;

/// A host-implemented function callable from scripts.
///
/// The callee receives the invoking thread and its argument run. It may
/// allocate on the thread, re-enter the VM via
/// [`Thread::call_function`], and fail with a [`RuntimeError`].
pub type ForeignFn = Box<
    dyn for<'a> Fn(&mut Thread<'a>, &[Value]) -> Result<Value, RuntimeError> + Send + Sync,
>;

/// A compiled program plus everything needed to bind and run it.
#[derive(Default)]
pub struct State {
    program: Program,
    function_pcs: Vec<usize>,
    foreign_functions: Vec<ForeignFn>,
    symbols: SymbolTable,
    literals: Literals,
    warnings: Vec<Diagnostic>,
    /// Set while compiling, for compiler diagnostics.
    pub(crate) current_file: Option<Arc<str>>,
    /// True when the program ends with a trailing `halt`.
    compiled: bool,
}

impl State {
    pub fn new() -> Self {
        State::default()
    }

    /// Register a foreign function under `name`. Binding the same name
    /// twice is an error.
    pub fn bind_function<F>(&mut self, name: &str, callee: F) -> Result<(), Diagnostic>
    where
        F: for<'a> Fn(&mut Thread<'a>, &[Value]) -> Result<Value, RuntimeError>
            + Send
            + Sync
            + 'static,
    {
        self.symbols.declare_foreign(name, SourcePos::native())?;
        self.foreign_functions.push(Box::new(callee));
        Ok(())
    }

    /// Register a host-owned numeric constant.
    pub fn bind_const_number(&mut self, name: &str, value: f64) -> Result<(), Diagnostic> {
        let index = self.literals.register_number(value).ok_or_else(|| {
            Diagnostic::resource(SourcePos::native(), "Too many number literals")
        })?;
        self.symbols
            .declare_const(name, minnow_parser::ConstLiteral::Number(index), SourcePos::native())?;
        Ok(())
    }

    /// Register a host-owned string constant.
    pub fn bind_const_string(&mut self, name: &str, value: &str) -> Result<(), Diagnostic> {
        let index = self.literals.register_string(value).ok_or_else(|| {
            Diagnostic::resource(SourcePos::native(), "Too many string literals")
        })?;
        self.symbols
            .declare_const(name, minnow_parser::ConstLiteral::String(index), SourcePos::native())?;
        Ok(())
    }

    /// Parse and compile `source`, labelled `file` in diagnostics. May be
    /// called repeatedly to concatenate programs onto one state.
    pub fn compile_string(&mut self, file: &str, source: &str) -> Result<(), Diagnostic> {
        let file: Arc<str> = Arc::from(file);

        // A recompile overwrites the previous trailing halt so the programs
        // concatenate.
        if self.compiled {
            self.program.truncate(self.program.len() - 1);
            self.compiled = false;
        }

        let parser = Parser::new(source, file.clone(), &mut self.symbols, &mut self.literals)?;
        let output = parser.parse_program()?;
        self.warnings.extend(output.warnings);

        self.function_pcs.resize(self.symbols.num_functions(), 0);
        self.check_foreign_bindings(&file)?;

        self.current_file = Some(file);
        let result = self.compile_program(&output.exprs);
        self.current_file = None;
        result?;

        self.compiled = true;
        self.check_initialized()
    }

    /// Compile a source file from disk.
    pub fn compile_file(&mut self, path: &str) -> Result<(), Diagnostic> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            Diagnostic::resource(
                SourcePos::new(Arc::from(path), 0),
                format!("Unable to open file '{}' for reading: {}", path, e),
            )
        })?;
        self.compile_string(path, &source)
    }

    /// Every foreign-function symbol must name a bound callee. Symbols are
    /// the source of truth for indices, so this catches a state whose
    /// tables drifted out of sync.
    fn check_foreign_bindings(&self, file: &Arc<str>) -> Result<(), Diagnostic> {
        for &id in self.symbols.globals() {
            let symbol = self.symbols.get(id);
            if let SymbolKind::ForeignFunction(index) = symbol.kind {
                if index >= self.foreign_functions.len() {
                    return Err(Diagnostic::semantic(
                        SourcePos::new(file.clone(), 0),
                        format!(
                            "Foreign function '{}' has no bound callee",
                            symbol.name
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Slot of a global variable, if `name` names one. Constants are
    /// inlined at their use sites and have no slot.
    pub fn global_index(&self, name: &str) -> Option<usize> {
        self.symbols.global_index(name)
    }

    /// Slot of a user function, if `name` names one.
    pub fn function_index(&self, name: &str) -> Option<usize> {
        self.symbols.function_index(name)
    }

    /// Warnings accumulated across every compilation on this state.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// The compiled program image.
    pub fn program(&self) -> &Program {
        &self.program
    }

    pub(crate) fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    /// Entry address of the user function at `index`.
    pub fn function_pc(&self, index: usize) -> Option<usize> {
        self.function_pcs.get(index).copied()
    }

    pub(crate) fn set_function_pc(&mut self, index: usize, pc: usize) {
        self.function_pcs[index] = pc;
    }

    /// The foreign callee at `index`.
    pub fn foreign(&self, index: usize) -> Option<&ForeignFn> {
        self.foreign_functions.get(index)
    }

    /// Number of global-variable slots threads must allocate.
    pub fn num_global_vars(&self) -> usize {
        self.symbols.num_global_vars()
    }

    /// The literal pools backing `push_number`/`push_string`.
    pub fn literals(&self) -> &Literals {
        &self.literals
    }

    pub(crate) fn literals_mut(&mut self) -> &mut Literals {
        &mut self.literals
    }

    /// The symbol table (for hosts that inspect compiled entities).
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub(crate) fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }
}
