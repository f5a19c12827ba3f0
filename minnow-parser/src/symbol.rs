// minnow-parser - Symbol table
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The per-compilation symbol table.
//!
//! Symbols live in a flat arena and are addressed by [`SymbolId`]; the
//! expression tree and the compiler refer to symbols only through ids.
//! Globals, constants, functions, and foreign functions share one global
//! list; a function's arguments and locals hang off its
//! [`SymbolKind::Function`] entry.
//!
//! Scope handling is deliberately simple: closing a scope never deletes a
//! local, it only marks it `scope_ended` so that later name lookups skip it
//! while the compiler can still reach it through stored ids. Argument slots
//! are frame-relative and negative (`-nargs + k` for argument `k`), so a
//! foreign call can view the argument run as one contiguous slice.

use crate::diagnostic::{Diagnostic, SourcePos};

/// Index of a symbol in the table's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(u32);

/// A global or local variable's compile-time bookkeeping.
#[derive(Debug, Clone)]
pub struct VarInfo {
    /// Global slot index, or frame-relative stack offset for locals
    /// (negative offsets address arguments).
    pub index: i32,
    /// Lexical scope depth the variable was declared at (0 = global).
    pub scope: u32,
    /// True once the declaring scope has closed; lookups skip such locals.
    pub scope_ended: bool,
    /// Set by the compiler when an assignment initializes the variable.
    pub initialized: bool,
}

/// The literal a constant is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstLiteral {
    /// Index into the number pool.
    Number(usize),
    /// Index into the string pool.
    String(usize),
}

/// A user function's compile-time bookkeeping.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    /// Index into the state's function-PC table.
    pub index: usize,
    pub args: Vec<SymbolId>,
    pub locals: Vec<SymbolId>,
}

#[derive(Debug, Clone)]
pub enum SymbolKind {
    Global(VarInfo),
    Local(VarInfo),
    Const(ConstLiteral),
    Function(FunctionInfo),
    /// Index into the state's foreign-function table.
    ForeignFunction(usize),
}

/// A named entity known to the compiler.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Where the symbol was declared, for diagnostics.
    pub pos: SourcePos,
}

/// Registry of every symbol in a compilation state.
#[derive(Debug, Default)]
pub struct SymbolTable {
    arena: Vec<Symbol>,
    globals: Vec<SymbolId>,
    num_global_vars: usize,
    num_functions: usize,
    num_foreign_functions: usize,
    current_function: Option<SymbolId>,
    scope_depth: u32,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.arena[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.arena[id.0 as usize]
    }

    /// Ids of every global-scope symbol, in declaration order.
    pub fn globals(&self) -> &[SymbolId] {
        &self.globals
    }

    pub fn num_global_vars(&self) -> usize {
        self.num_global_vars
    }

    pub fn num_functions(&self) -> usize {
        self.num_functions
    }

    pub fn num_foreign_functions(&self) -> usize {
        self.num_foreign_functions
    }

    /// The function whose body is currently being parsed, if any.
    pub fn current_function(&self) -> Option<SymbolId> {
        self.current_function
    }

    pub fn in_function(&self) -> bool {
        self.current_function.is_some()
    }

    pub fn begin_function(&mut self, id: SymbolId) {
        self.current_function = Some(id);
    }

    pub fn end_function(&mut self) {
        self.current_function = None;
    }

    pub fn open_scope(&mut self) {
        self.scope_depth += 1;
    }

    /// Close the innermost scope, retiring the current function's locals
    /// that were declared in it.
    pub fn close_scope(&mut self) {
        if let Some(func) = self.current_function {
            let locals = match &self.get(func).kind {
                SymbolKind::Function(info) => info.locals.clone(),
                _ => Vec::new(),
            };
            let scope_depth = self.scope_depth;
            for id in locals {
                if let SymbolKind::Local(var) = &mut self.get_mut(id).kind {
                    if var.scope == scope_depth {
                        var.scope_ended = true;
                    }
                }
            }
        }
        self.scope_depth = self.scope_depth.saturating_sub(1);
    }

    fn push(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.arena.len() as u32);
        self.arena.push(symbol);
        id
    }

    fn function_info(&self, id: SymbolId) -> Option<&FunctionInfo> {
        match &self.get(id).kind {
            SymbolKind::Function(info) => Some(info),
            _ => None,
        }
    }

    /// Resolve a variable name: the current function's live locals first,
    /// then its arguments, then globals and constants. First match wins.
    pub fn reference_variable(&self, name: &str) -> Option<SymbolId> {
        if let Some(func) = self.current_function {
            if let Some(info) = self.function_info(func) {
                for &id in &info.locals {
                    if let SymbolKind::Local(var) = &self.get(id).kind {
                        if !var.scope_ended && self.get(id).name == name {
                            return Some(id);
                        }
                    }
                }
                for &id in &info.args {
                    if self.get(id).name == name {
                        return Some(id);
                    }
                }
            }
        }

        self.globals.iter().copied().find(|&id| {
            matches!(
                self.get(id).kind,
                SymbolKind::Global(_) | SymbolKind::Const(_)
            ) && self.get(id).name == name
        })
    }

    /// Resolve a callable name among user and foreign functions.
    pub fn reference_function(&self, name: &str) -> Option<SymbolId> {
        self.globals.iter().copied().find(|&id| {
            matches!(
                self.get(id).kind,
                SymbolKind::Function(_) | SymbolKind::ForeignFunction(_)
            ) && self.get(id).name == name
        })
    }

    /// Declare a global variable. Redeclaring a global or constant name is
    /// an error.
    pub fn declare_global(&mut self, name: &str, pos: SourcePos) -> Result<SymbolId, Diagnostic> {
        if let Some(existing) = self.reference_variable(name) {
            if matches!(
                self.get(existing).kind,
                SymbolKind::Global(_) | SymbolKind::Const(_)
            ) {
                return Err(Diagnostic::semantic(
                    pos,
                    format!(
                        "Attempted to declare multiple global entities with the same name '{}'",
                        name
                    ),
                ));
            }
        }

        let id = self.push(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Global(VarInfo {
                index: self.num_global_vars as i32,
                scope: 0,
                scope_ended: false,
                initialized: false,
            }),
            pos,
        });
        self.globals.push(id);
        self.num_global_vars += 1;
        Ok(id)
    }

    /// Declare one argument of the current function. Arguments are pushed
    /// left to right, so argument `k` of `nargs` sits at frame offset
    /// `-nargs + k`.
    pub fn declare_argument(
        &mut self,
        name: &str,
        nargs: usize,
        pos: SourcePos,
    ) -> Result<SymbolId, Diagnostic> {
        let Some(func) = self.current_function else {
            return Err(Diagnostic::semantic(
                pos,
                "Arguments can only be declared inside a function",
            ));
        };

        let existing_args = match self.function_info(func) {
            Some(info) => info.args.clone(),
            None => Vec::new(),
        };
        for id in &existing_args {
            if self.get(*id).name == name {
                return Err(Diagnostic::semantic(
                    pos,
                    format!(
                        "Function '{}' takes multiple arguments with name '{}'",
                        self.get(func).name, name
                    ),
                ));
            }
        }

        let index = -(nargs as i32) + existing_args.len() as i32;
        let id = self.push(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Local(VarInfo {
                index,
                // Arguments are visible anywhere in the function.
                scope: 0,
                scope_ended: false,
                initialized: true,
            }),
            pos,
        });
        if let SymbolKind::Function(info) = &mut self.get_mut(func).kind {
            info.args.push(id);
        }
        Ok(id)
    }

    /// Declare a local in the current function and scope. A live local with
    /// the same name is an error, whatever scope it came from; a retired
    /// one may be shadowed freely.
    pub fn declare_local(&mut self, name: &str, pos: SourcePos) -> Result<SymbolId, Diagnostic> {
        let Some(func) = self.current_function else {
            return Err(Diagnostic::semantic(
                pos,
                "Locals can only be declared inside a function",
            ));
        };

        let locals = match self.function_info(func) {
            Some(info) => info.locals.clone(),
            None => Vec::new(),
        };
        for id in &locals {
            if let SymbolKind::Local(var) = &self.get(*id).kind {
                if !var.scope_ended && self.get(*id).name == name {
                    return Err(Diagnostic::semantic(
                        pos,
                        format!(
                            "Function '{}' has multiple locals in the same scope with name '{}'",
                            self.get(func).name, name
                        ),
                    ));
                }
            }
        }

        let id = self.push(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Local(VarInfo {
                index: locals.len() as i32,
                scope: self.scope_depth,
                scope_ended: false,
                initialized: false,
            }),
            pos,
        });
        if let SymbolKind::Function(info) = &mut self.get_mut(func).kind {
            info.locals.push(id);
        }
        Ok(id)
    }

    /// Declare a constant bound to a pooled literal. The name must not
    /// collide with any visible variable or constant. Constants always get
    /// global scope, even when declared inside a function.
    pub fn declare_const(
        &mut self,
        name: &str,
        literal: ConstLiteral,
        pos: SourcePos,
    ) -> Result<SymbolId, Diagnostic> {
        if self.reference_variable(name).is_some() {
            return Err(Diagnostic::semantic(
                pos,
                format!(
                    "Attempted to define constant with the same name '{}' as another value",
                    name
                ),
            ));
        }

        let id = self.push(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Const(literal),
            pos,
        });
        self.globals.push(id);
        Ok(id)
    }

    /// Declare a user function. Forward references are legal, so duplicate
    /// names are not checked here.
    pub fn declare_function(&mut self, name: &str, pos: SourcePos) -> SymbolId {
        let id = self.push(Symbol {
            name: name.to_string(),
            kind: SymbolKind::Function(FunctionInfo {
                index: self.num_functions,
                args: Vec::new(),
                locals: Vec::new(),
            }),
            pos,
        });
        self.globals.push(id);
        self.num_functions += 1;
        id
    }

    /// Declare a host-implemented function. Duplicate foreign names are an
    /// error.
    pub fn declare_foreign(&mut self, name: &str, pos: SourcePos) -> Result<SymbolId, Diagnostic> {
        for &id in &self.globals {
            if matches!(self.get(id).kind, SymbolKind::ForeignFunction(_))
                && self.get(id).name == name
            {
                return Err(Diagnostic::semantic(
                    pos,
                    format!("There is already a foreign function bound to name '{}'", name),
                ));
            }
        }

        let id = self.push(Symbol {
            name: name.to_string(),
            kind: SymbolKind::ForeignFunction(self.num_foreign_functions),
            pos,
        });
        self.globals.push(id);
        self.num_foreign_functions += 1;
        Ok(id)
    }

    /// Global-variable slot for a name, if it names a global variable.
    /// Constants do not count: they are inlined wherever they are used.
    pub fn global_index(&self, name: &str) -> Option<usize> {
        self.globals.iter().find_map(|&id| {
            let sym = self.get(id);
            match &sym.kind {
                SymbolKind::Global(var) if sym.name == name => Some(var.index as usize),
                _ => None,
            }
        })
    }

    /// Function-PC-table slot for a name, if it names a user function.
    pub fn function_index(&self, name: &str) -> Option<usize> {
        self.globals.iter().find_map(|&id| {
            let sym = self.get(id);
            match &sym.kind {
                SymbolKind::Function(info) if sym.name == name => Some(info.index),
                _ => None,
            }
        })
    }
}
