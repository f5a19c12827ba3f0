// minnow-parser - Parser for Minnow
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Recursive descent parser with precedence climbing for binary operators.
//!
//! Parsing is not a pure function of the token stream: seeing `:=` declares
//! a local or global variable, `::` declares a constant, and `func` headers
//! declare the function and its parameters. The parser therefore borrows the
//! compilation state's [`SymbolTable`] and [`Literals`] and updates them as
//! a side effect, leaving resolved [`SymbolId`]s in the tree for the
//! compiler.

use std::sync::Arc;

use crate::diagnostic::{Diagnostic, SourcePos};
use crate::expr::{BinOp, Expr, ExprKind, UnaryOp};
use crate::lexer::Lexer;
use crate::literals::Literals;
use crate::symbol::{ConstLiteral, SymbolTable};
use crate::token::Token;

/// Most parameters a function may declare.
pub const MAX_ARGS: usize = 32;

/// Precedence level of the assignment and declaration family.
const ASSIGN_PREC: u8 = 1;

/// Everything a parse produces: the expression list plus any warnings.
#[derive(Debug)]
pub struct ParseOutput {
    pub exprs: Vec<Expr>,
    pub warnings: Vec<Diagnostic>,
}

/// The parser builds an expression tree from a token stream.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    line: u32,
    file: Arc<str>,
    symbols: &'a mut SymbolTable,
    literals: &'a mut Literals,
    warnings: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    /// Create a parser over `source`, priming the first token.
    pub fn new(
        source: &'a str,
        file: Arc<str>,
        symbols: &'a mut SymbolTable,
        literals: &'a mut Literals,
    ) -> Result<Self, Diagnostic> {
        let mut parser = Parser {
            lexer: Lexer::new(source),
            current: Token::Eof,
            line: 1,
            file,
            symbols,
            literals,
            warnings: Vec::new(),
        };
        parser.advance()?;
        Ok(parser)
    }

    /// Parse the whole source as a list of top-level expressions.
    pub fn parse_program(mut self) -> Result<ParseOutput, Diagnostic> {
        let mut exprs = Vec::new();
        while self.current != Token::Eof {
            exprs.push(self.parse_expr()?);
        }
        Ok(ParseOutput {
            exprs,
            warnings: self.warnings,
        })
    }

    fn advance(&mut self) -> Result<(), Diagnostic> {
        let file = self.file.clone();
        self.current = self
            .lexer
            .next_token()
            .map_err(|e| Diagnostic::lex(SourcePos::new(file, e.line), e.message))?;
        self.line = self.lexer.line();
        Ok(())
    }

    fn pos(&self) -> SourcePos {
        SourcePos::new(self.file.clone(), self.line)
    }

    fn error(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::parse(self.pos(), message)
    }

    fn expr(&self, kind: ExprKind) -> Expr {
        Expr::new(self.line, kind)
    }

    fn parse_expr(&mut self) -> Result<Expr, Diagnostic> {
        let factor = self.parse_factor()?;
        self.parse_bin_rhs(0, factor)
    }

    fn parse_factor(&mut self) -> Result<Expr, Diagnostic> {
        match self.current.clone() {
            Token::Null => {
                let exp = self.expr(ExprKind::Null);
                self.advance()?;
                Ok(exp)
            }

            Token::True | Token::False => {
                let exp = self.expr(ExprKind::Bool(self.current == Token::True));
                self.advance()?;
                Ok(exp)
            }

            Token::Number(value) => {
                let index = self
                    .literals
                    .register_number(value)
                    .ok_or_else(|| self.resource_error("Too many number literals"))?;
                let exp = self.expr(ExprKind::Number(index));
                self.advance()?;
                Ok(exp)
            }

            Token::Str(value) => {
                let index = self
                    .literals
                    .register_string(&value)
                    .ok_or_else(|| self.resource_error("Too many string literals"))?;
                let exp = self.expr(ExprKind::Str(index));
                self.advance()?;
                Ok(exp)
            }

            Token::LBrace => self.parse_block(),
            Token::Ident(name) => self.parse_ident(name),
            Token::Func => self.parse_func(),
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),
            Token::For => self.parse_for(),
            Token::Return => self.parse_return(),

            Token::Minus | Token::Plus | Token::Not => {
                let op = match self.current {
                    Token::Minus => UnaryOp::Neg,
                    Token::Plus => UnaryOp::Plus,
                    _ => UnaryOp::Not,
                };
                let line = self.line;
                self.advance()?;
                let operand = self.parse_factor()?;
                Ok(Expr::new(
                    line,
                    ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                ))
            }

            Token::LParen => {
                let line = self.line;
                self.advance()?;
                let inner = self.parse_expr()?;
                if self.current != Token::RParen {
                    return Err(self.error("Expected matching ')' after previous '('"));
                }
                self.advance()?;
                Ok(Expr::new(line, ExprKind::Paren(Box::new(inner))))
            }

            token => Err(self.error(format!("Unexpected token '{}'", token))),
        }
    }

    fn parse_block(&mut self) -> Result<Expr, Diagnostic> {
        let line = self.line;
        self.advance()?;
        self.symbols.open_scope();

        let mut body = Vec::new();
        while self.current != Token::RBrace {
            if self.current == Token::Eof {
                return Err(self.error("Expected '}' before end of file"));
            }
            body.push(self.parse_expr()?);
        }
        self.advance()?;

        self.symbols.close_scope();
        Ok(Expr::new(line, ExprKind::Block(body)))
    }

    fn parse_ident(&mut self, name: String) -> Result<Expr, Diagnostic> {
        let line = self.line;
        self.advance()?;

        if self.current != Token::LParen {
            let sym = self.symbols.reference_variable(&name);
            return Ok(Expr::new(line, ExprKind::Id { name, sym }));
        }

        // A call; the callee is resolved at compile time so that calls may
        // refer to functions defined later in the source.
        self.advance()?;
        let mut args = Vec::new();
        while self.current != Token::RParen {
            args.push(self.parse_expr()?);
            if self.current == Token::Comma {
                self.advance()?;
            } else if self.current != Token::RParen {
                return Err(self.error("Expected ')' after call"));
            }
        }
        self.advance()?;

        Ok(Expr::new(line, ExprKind::Call { callee: name, args }))
    }

    fn parse_func(&mut self) -> Result<Expr, Diagnostic> {
        if let Some(current) = self.symbols.current_function() {
            return Err(self.error(format!(
                "Attempted to define function inside of function '{}'",
                self.symbols.get(current).name
            )));
        }

        let line = self.line;
        self.advance()?;

        let Token::Ident(name) = self.current.clone() else {
            return Err(self.error("Function name must be an identifier"));
        };
        let decl = self.symbols.declare_function(&name, self.pos());
        self.symbols.begin_function(decl);
        self.advance()?;

        if self.current != Token::LParen {
            return Err(self.error("Expected '(' after function name"));
        }
        self.advance()?;

        let mut params = Vec::new();
        while self.current != Token::RParen {
            let Token::Ident(param) = self.current.clone() else {
                return Err(self.error("Expected identifier in function parameter list"));
            };
            if params.len() >= MAX_ARGS {
                return Err(self.error(format!("Function '{}' takes in too many args", name)));
            }
            params.push(param);
            self.advance()?;

            if self.current != Token::RParen && self.current != Token::Comma {
                return Err(self.error(
                    "Expected ')' or ',' after parameter name in function parameter list",
                ));
            }
            if self.current == Token::Comma {
                self.advance()?;
            }
        }

        for param in &params {
            self.symbols
                .declare_argument(param, params.len(), self.pos())?;
        }
        self.advance()?;

        self.symbols.open_scope();
        let body = self.parse_expr()?;
        self.symbols.close_scope();
        self.symbols.end_function();

        Ok(Expr::new(
            line,
            ExprKind::Func {
                decl,
                body: Box::new(body),
            },
        ))
    }

    fn parse_if(&mut self) -> Result<Expr, Diagnostic> {
        let line = self.line;
        self.advance()?;

        let cond = self.parse_expr()?;
        let body = self.parse_expr()?;

        let alt = if self.current == Token::Else {
            self.advance()?;
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        Ok(Expr::new(
            line,
            ExprKind::If {
                cond: Box::new(cond),
                body: Box::new(body),
                alt,
            },
        ))
    }

    fn parse_while(&mut self) -> Result<Expr, Diagnostic> {
        let line = self.line;
        self.advance()?;

        let cond = self.parse_expr()?;

        self.symbols.open_scope();
        let body = self.parse_expr()?;
        self.symbols.close_scope();

        Ok(Expr::new(
            line,
            ExprKind::While {
                cond: Box::new(cond),
                body: Box::new(body),
            },
        ))
    }

    fn parse_for(&mut self) -> Result<Expr, Diagnostic> {
        let line = self.line;
        self.advance()?;

        // Locals declared in the head are scoped to the loop.
        self.symbols.open_scope();

        let init = self.parse_expr()?;
        if self.current != Token::Semi {
            return Err(self.error("Expected ';' after for initializer"));
        }
        self.advance()?;

        let cond = self.parse_expr()?;
        if self.current != Token::Semi {
            return Err(self.error("Expected ';' after for condition"));
        }
        self.advance()?;

        let step = self.parse_expr()?;
        let body = self.parse_expr()?;

        self.symbols.close_scope();

        Ok(Expr::new(
            line,
            ExprKind::For {
                init: Box::new(init),
                cond: Box::new(cond),
                step: Box::new(step),
                body: Box::new(body),
            },
        ))
    }

    fn parse_return(&mut self) -> Result<Expr, Diagnostic> {
        let line = self.line;
        self.advance()?;

        if self.current == Token::Semi {
            self.advance()?;
            return Ok(Expr::new(line, ExprKind::Return(None)));
        }

        let value = self.parse_expr()?;
        Ok(Expr::new(line, ExprKind::Return(Some(Box::new(value)))))
    }

    /// Precedence climb over binary operators to the right of `lhs`.
    fn parse_bin_rhs(&mut self, expr_prec: u8, mut lhs: Expr) -> Result<Expr, Diagnostic> {
        loop {
            let prec = match precedence(&self.current) {
                Some(prec) if prec >= expr_prec => prec,
                _ => return Ok(lhs),
            };

            let op_token = self.current.clone();

            // ':=' declares its left-hand side before the right-hand side is
            // parsed, so the initializer can already see the new name.
            if op_token == Token::Declare {
                let pos = self.pos();
                match &mut lhs.kind {
                    ExprKind::Id { name, sym } => {
                        let id = if self.symbols.in_function() {
                            self.symbols.declare_local(name, pos)?
                        } else {
                            self.symbols.declare_global(name, pos)?
                        };
                        *sym = Some(id);
                    }
                    _ => {
                        return Err(
                            self.error("Expected identifier on the left-hand side of ':='")
                        );
                    }
                }
            }

            let line = self.line;
            self.advance()?;

            let mut rhs = self.parse_factor()?;
            if let Some(next_prec) = precedence(&self.current) {
                if next_prec > prec {
                    rhs = self.parse_bin_rhs(prec + 1, rhs)?;
                } else if next_prec == prec && prec == ASSIGN_PREC {
                    // The assignment family groups to the right.
                    rhs = self.parse_bin_rhs(prec, rhs)?;
                }
            }

            if op_token == Token::DeclareConst {
                self.declare_const(&lhs, &rhs)?;
            }

            let op = binop_for(&op_token);
            lhs = Expr::new(
                line,
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            );
        }
    }

    /// Handle `name :: literal`, registering the constant symbol.
    fn declare_const(&mut self, lhs: &Expr, rhs: &Expr) -> Result<(), Diagnostic> {
        let ExprKind::Id { name, .. } = &lhs.kind else {
            return Err(self.error("Expected identifier on the left-hand side of '::'"));
        };

        let literal = match rhs.kind {
            ExprKind::Number(index) => ConstLiteral::Number(index),
            ExprKind::Str(index) => ConstLiteral::String(index),
            _ => {
                return Err(self.error(format!(
                    "Expected number or string to be bound to constant '{}'",
                    name
                )));
            }
        };

        if self.symbols.in_function() {
            self.warnings.push(Diagnostic::semantic(
                self.pos(),
                format!(
                    "Constant '{}' declared inside a function still has global scope",
                    name
                ),
            ));
        }

        self.symbols.declare_const(name, literal, self.pos())?;
        Ok(())
    }

    fn resource_error(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::resource(self.pos(), message)
    }
}

/// Binding strength of a binary operator token, strongest last.
fn precedence(token: &Token) -> Option<u8> {
    match token {
        Token::Star | Token::Slash | Token::Percent | Token::Amp | Token::Pipe => Some(5),
        Token::Plus | Token::Minus => Some(4),
        Token::Lt
        | Token::Gt
        | Token::Lte
        | Token::Gte
        | Token::Equals
        | Token::NotEquals => Some(3),
        Token::And | Token::Or => Some(2),
        Token::Assign
        | Token::Declare
        | Token::DeclareConst
        | Token::PlusEqual
        | Token::MinusEqual
        | Token::StarEqual
        | Token::SlashEqual
        | Token::PercentEqual
        | Token::AmpEqual
        | Token::PipeEqual => Some(ASSIGN_PREC),
        _ => None,
    }
}

/// The [`BinOp`] for a token that [`precedence`] accepted.
fn binop_for(token: &Token) -> BinOp {
    match token {
        Token::Star => BinOp::Mul,
        Token::Slash => BinOp::Div,
        Token::Percent => BinOp::Mod,
        Token::Amp => BinOp::BitAnd,
        Token::Pipe => BinOp::BitOr,
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Sub,
        Token::Lt => BinOp::Lt,
        Token::Gt => BinOp::Gt,
        Token::Lte => BinOp::Lte,
        Token::Gte => BinOp::Gte,
        Token::Equals => BinOp::Equals,
        Token::NotEquals => BinOp::NotEquals,
        Token::And => BinOp::LogAnd,
        Token::Or => BinOp::LogOr,
        Token::Assign => BinOp::Assign,
        Token::Declare => BinOp::Declare,
        Token::DeclareConst => BinOp::DeclareConst,
        Token::PlusEqual => BinOp::AddAssign,
        Token::MinusEqual => BinOp::SubAssign,
        Token::StarEqual => BinOp::MulAssign,
        Token::SlashEqual => BinOp::DivAssign,
        Token::PercentEqual => BinOp::ModAssign,
        Token::AmpEqual => BinOp::AndAssign,
        Token::PipeEqual => BinOp::OrAssign,
        _ => BinOp::Assign,
    }
}
