// minnow-vm - Bytecode compiler
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Code generation: a single pass over the expression tree.
//!
//! Expression-position visitors emit value-producing code; statement-position
//! visitors leave the stack balanced. Control flow lowers to forward-patched
//! jumps: emit the opcode with a zero placeholder, compile the branch, then
//! patch the placeholder with the current program length.
//!
//! A function body is bypassed at the top level by a `goto` around it; its
//! entry point (recorded in the function-PC table) starts with one
//! `push_number 0` per local to reserve frame slots.

use std::sync::Arc;

use minnow_parser::{
    BinOp, ConstLiteral, Diagnostic, Expr, ExprKind, SourcePos, SymbolId, SymbolKind, UnaryOp,
};

use crate::opcode::Opcode;
use crate::program::MAX_PROGRAM_LEN;
use crate::state::State;

impl State {
    pub(crate) fn compile_program(&mut self, exprs: &[Expr]) -> Result<(), Diagnostic> {
        for expr in exprs {
            self.compile_statement(expr)?;
        }
        self.emit(0, Opcode::Halt)
    }

    fn compile_file_label(&self) -> Arc<str> {
        self.current_file
            .clone()
            .unwrap_or_else(|| Arc::from("<unknown>"))
    }

    fn err(&self, line: u32, message: impl Into<String>) -> Diagnostic {
        Diagnostic::semantic(SourcePos::new(self.compile_file_label(), line), message)
    }

    fn emit(&mut self, line: u32, op: Opcode) -> Result<(), Diagnostic> {
        // Worst case is an opcode plus two operands.
        if self.program().len() + 9 > MAX_PROGRAM_LEN {
            return Err(Diagnostic::resource(
                SourcePos::new(self.compile_file_label(), line),
                "Program is too long",
            ));
        }
        self.program_mut().push_op(op);
        Ok(())
    }

    fn emit_int(&mut self, value: i32) {
        self.program_mut().push_int(value);
    }

    fn emit_with_int(&mut self, line: u32, op: Opcode, value: i32) -> Result<(), Diagnostic> {
        self.emit(line, op)?;
        self.emit_int(value);
        Ok(())
    }

    /// Emit a jump with a zero placeholder, returning the placeholder's
    /// offset for patching.
    fn emit_jump(&mut self, line: u32, op: Opcode) -> Result<usize, Diagnostic> {
        self.emit(line, op)?;
        let placeholder = self.program().len();
        self.emit_int(0);
        Ok(placeholder)
    }

    fn patch_jump(&mut self, placeholder: usize) {
        let target = self.program().len() as i32;
        self.program_mut().patch_int(placeholder, target);
    }

    fn register_number(&mut self, line: u32, value: f64) -> Result<i32, Diagnostic> {
        self.literals_mut().register_number(value).map(|i| i as i32).ok_or_else(|| {
            Diagnostic::resource(
                SourcePos::new(self.compile_file_label(), line),
                "Too many number literals",
            )
        })
    }

    /// Emit value-producing code for a load of `name`.
    fn compile_get_id(
        &mut self,
        line: u32,
        name: &str,
        sym: Option<SymbolId>,
    ) -> Result<(), Diagnostic> {
        let Some(id) = sym else {
            return Err(self.err(
                line,
                format!("Referencing undeclared identifier '{}'", name),
            ));
        };

        let kind = self.symbols().get(id).kind.clone();
        match kind {
            SymbolKind::Global(var) => self.emit_with_int(line, Opcode::Get, var.index),
            SymbolKind::Local(var) => self.emit_with_int(line, Opcode::GetLocal, var.index),
            SymbolKind::Const(ConstLiteral::Number(index)) => {
                self.emit_with_int(line, Opcode::PushNumber, index as i32)
            }
            SymbolKind::Const(ConstLiteral::String(index)) => {
                self.emit_with_int(line, Opcode::PushString, index as i32)
            }
            SymbolKind::Function(_) | SymbolKind::ForeignFunction(_) => Err(self.err(
                line,
                format!("Cannot use function '{}' as a value", name),
            )),
        }
    }

    /// Push the arguments left to right, then emit the call itself. The
    /// callee is resolved here so calls may precede the definition.
    fn compile_call(&mut self, line: u32, callee: &str, args: &[Expr]) -> Result<(), Diagnostic> {
        for arg in args {
            self.compile_expr(arg)?;
        }

        let Some(id) = self.symbols().reference_function(callee) else {
            return Err(self.err(
                line,
                format!("Attempted to call undefined function '{}'", callee),
            ));
        };

        match self.symbols().get(id).kind.clone() {
            SymbolKind::ForeignFunction(index) => {
                self.emit(line, Opcode::Callf)?;
                self.emit_int(args.len() as i32);
                self.emit_int(index as i32);
                Ok(())
            }
            SymbolKind::Function(info) => {
                self.emit(line, Opcode::Call)?;
                self.emit_int(args.len() as i32);
                self.emit_int(info.index as i32);
                Ok(())
            }
            _ => Err(self.err(
                line,
                format!("'{}' is not callable", callee),
            )),
        }
    }

    /// Emit value-producing code for an expression.
    fn compile_expr(&mut self, expr: &Expr) -> Result<(), Diagnostic> {
        let line = expr.line;
        match &expr.kind {
            ExprKind::Null => self.emit(line, Opcode::PushNull),
            ExprKind::Bool(true) => self.emit(line, Opcode::PushTrue),
            ExprKind::Bool(false) => self.emit(line, Opcode::PushFalse),
            ExprKind::Number(index) => {
                self.emit_with_int(line, Opcode::PushNumber, *index as i32)
            }
            ExprKind::Str(index) => self.emit_with_int(line, Opcode::PushString, *index as i32),
            ExprKind::Id { name, sym } => self.compile_get_id(line, name, *sym),

            ExprKind::Call { callee, args } => {
                self.compile_call(line, callee, args)?;
                self.emit(line, Opcode::GetRetval)
            }

            ExprKind::Binary { op, lhs, rhs } => {
                let opcode = match op {
                    BinOp::Add => Opcode::Add,
                    BinOp::Sub => Opcode::Sub,
                    BinOp::Mul => Opcode::Mul,
                    BinOp::Div => Opcode::Div,
                    BinOp::Mod => Opcode::Mod,
                    BinOp::BitAnd => Opcode::And,
                    BinOp::BitOr => Opcode::Or,
                    BinOp::Lt => Opcode::Lt,
                    BinOp::Gt => Opcode::Gt,
                    BinOp::Lte => Opcode::Lte,
                    BinOp::Gte => Opcode::Gte,
                    BinOp::Equals | BinOp::NotEquals => Opcode::Equ,
                    BinOp::LogAnd => Opcode::LogAnd,
                    BinOp::LogOr => Opcode::LogOr,
                    _ => {
                        return Err(self.err(
                            line,
                            "Found assignment when expecting expression",
                        ));
                    }
                };
                self.compile_expr(lhs)?;
                self.compile_expr(rhs)?;
                self.emit(line, opcode)?;
                if *op == BinOp::NotEquals {
                    self.emit(line, Opcode::LogNot)?;
                }
                Ok(())
            }

            ExprKind::Paren(inner) => self.compile_expr(inner),

            ExprKind::Unary { op, operand } => {
                self.compile_expr(operand)?;
                match op {
                    UnaryOp::Neg => {
                        let index = self.register_number(line, -1.0)?;
                        self.emit_with_int(line, Opcode::PushNumber, index)?;
                        self.emit(line, Opcode::Mul)
                    }
                    UnaryOp::Not => self.emit(line, Opcode::LogNot),
                    UnaryOp::Plus => Ok(()),
                }
            }

            _ => Err(self.err(line, "Got statement when expecting expression")),
        }
    }

    /// Emit stack-neutral code for a statement-position expression.
    fn compile_statement(&mut self, expr: &Expr) -> Result<(), Diagnostic> {
        let line = expr.line;
        match &expr.kind {
            ExprKind::Call { callee, args } => self.compile_call(line, callee, args),

            ExprKind::Block(body) => {
                for stmt in body {
                    self.compile_statement(stmt)?;
                }
                Ok(())
            }

            ExprKind::Binary { op, lhs, rhs } => self.compile_assignment(line, *op, lhs, rhs),

            ExprKind::Func { decl, body } => {
                let skip = self.emit_jump(line, Opcode::Goto)?;

                let (index, num_locals) = match &self.symbols().get(*decl).kind {
                    SymbolKind::Function(info) => (info.index, info.locals.len()),
                    _ => {
                        return Err(self.err(line, "Function declaration lost its symbol"));
                    }
                };
                let entry = self.program().len();
                self.set_function_pc(index, entry);

                // Reserve one frame slot per local.
                let zero = self.register_number(line, 0.0)?;
                for _ in 0..num_locals {
                    self.emit_with_int(line, Opcode::PushNumber, zero)?;
                }

                self.compile_statement(body)?;
                self.emit(line, Opcode::Return)?;
                self.patch_jump(skip);
                Ok(())
            }

            ExprKind::If { cond, body, alt } => {
                self.compile_expr(cond)?;
                let skip_body = self.emit_jump(line, Opcode::Gotoz)?;
                self.compile_statement(body)?;
                let skip_alt = self.emit_jump(line, Opcode::Goto)?;
                self.patch_jump(skip_body);
                if let Some(alt) = alt {
                    self.compile_statement(alt)?;
                }
                self.patch_jump(skip_alt);
                Ok(())
            }

            ExprKind::While { cond, body } => {
                let cond_pc = self.program().len();
                self.compile_expr(cond)?;
                let exit = self.emit_jump(line, Opcode::Gotoz)?;
                self.compile_statement(body)?;
                self.emit_with_int(line, Opcode::Goto, cond_pc as i32)?;
                self.patch_jump(exit);
                Ok(())
            }

            ExprKind::For {
                init,
                cond,
                step,
                body,
            } => {
                self.compile_statement(init)?;
                let cond_pc = self.program().len();
                self.compile_expr(cond)?;
                let exit = self.emit_jump(line, Opcode::Gotoz)?;
                self.compile_statement(body)?;
                self.compile_statement(step)?;
                self.emit_with_int(line, Opcode::Goto, cond_pc as i32)?;
                self.patch_jump(exit);
                Ok(())
            }

            ExprKind::Return(value) => match value {
                Some(value) => {
                    self.compile_expr(value)?;
                    self.emit(line, Opcode::ReturnValue)
                }
                None => self.emit(line, Opcode::Return),
            },

            _ => Err(self.err(line, "Got expression when expecting statement")),
        }
    }

    /// Statement-position binary operators: the declaration and assignment
    /// family. Anything else in statement position is an error.
    fn compile_assignment(
        &mut self,
        line: u32,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<(), Diagnostic> {
        // Constants were registered during parsing and generate no code.
        if op == BinOp::DeclareConst {
            return Ok(());
        }

        let compound = match op {
            BinOp::Assign | BinOp::Declare => None,
            BinOp::AddAssign => Some(Opcode::Add),
            BinOp::SubAssign => Some(Opcode::Sub),
            BinOp::MulAssign => Some(Opcode::Mul),
            BinOp::DivAssign => Some(Opcode::Div),
            BinOp::ModAssign => Some(Opcode::Mod),
            BinOp::AndAssign => Some(Opcode::And),
            BinOp::OrAssign => Some(Opcode::Or),
            _ => {
                return Err(self.err(line, "Invalid operation when expecting statement"));
            }
        };

        let ExprKind::Id { name, sym } = &lhs.kind else {
            return Err(self.err(line, "LHS of assignment operation must be a variable"));
        };

        match compound {
            Some(opcode) => {
                self.compile_get_id(line, name, *sym)?;
                self.compile_expr(rhs)?;
                self.emit(line, opcode)?;
            }
            None => {
                self.compile_expr(rhs)?;
            }
        }

        let Some(id) = *sym else {
            return Err(self.err(
                line,
                format!("Assigning to undeclared identifier '{}'", name),
            ));
        };

        let store = match &self.symbols().get(id).kind {
            SymbolKind::Global(var) => (Opcode::Set, var.index),
            SymbolKind::Local(var) => (Opcode::SetLocal, var.index),
            _ => {
                return Err(self.err(line, format!("Cannot assign to id '{}'", name)));
            }
        };
        self.emit_with_int(line, store.0, store.1)?;

        if let SymbolKind::Global(var) | SymbolKind::Local(var) =
            &mut self.symbols_mut().get_mut(id).kind
        {
            var.initialized = true;
        }
        Ok(())
    }

    /// Post-compilation sweep: every declared global and every function
    /// local must have been initialized by some assignment. Arguments are
    /// implicitly initialized.
    pub(crate) fn check_initialized(&self) -> Result<(), Diagnostic> {
        for &id in self.symbols().globals() {
            let symbol = self.symbols().get(id);
            match &symbol.kind {
                SymbolKind::Global(var) if !var.initialized => {
                    return Err(Diagnostic::semantic(
                        symbol.pos.clone(),
                        format!("Attempted to use uninitialized variable '{}'", symbol.name),
                    ));
                }
                SymbolKind::Function(info) => {
                    for &local_id in &info.locals {
                        let local = self.symbols().get(local_id);
                        if let SymbolKind::Local(var) = &local.kind {
                            if !var.initialized {
                                return Err(Diagnostic::semantic(
                                    local.pos.clone(),
                                    format!(
                                        "Attempted to use uninitialized variable '{}'",
                                        local.name
                                    ),
                                ));
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}
