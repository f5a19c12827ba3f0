// minnow-parser - Compile-time diagnostics
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Structured compile-time diagnostics.
//!
//! Every problem found while lexing, parsing, or compiling is reported as a
//! [`Diagnostic`] carrying its kind, message, and source position. Nothing in
//! the library prints or exits on its own; hosts decide how to surface the
//! diagnostic, typically via [`Diagnostic::render`] which reproduces the
//! classic reporter output (a window of source lines with an arrow on the
//! offending one).

use std::fmt;
use std::sync::Arc;

/// A position in a compiled source: file label plus 1-based line number.
#[derive(Debug, Clone)]
pub struct SourcePos {
    pub file: Arc<str>,
    pub line: u32,
}

impl SourcePos {
    pub fn new(file: Arc<str>, line: u32) -> Self {
        SourcePos { file, line }
    }

    /// Position used for host-side registrations (bound functions and
    /// constants), which have no script source behind them.
    pub fn native() -> Self {
        SourcePos {
            file: Arc::from("<native>"),
            line: 0,
        }
    }
}

/// The broad category of a compile-time diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Malformed token: bad escape, unterminated literal, oversized token.
    Lex,
    /// Unexpected token, unmatched delimiter, malformed declaration.
    Parse,
    /// Redeclaration, undeclared reference, const misuse, uninitialized use.
    Semantic,
    /// File-open failure or a compile-time limit exceeded.
    Resource,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Lex => write!(f, "lex error"),
            DiagnosticKind::Parse => write!(f, "parse error"),
            DiagnosticKind::Semantic => write!(f, "error"),
            DiagnosticKind::Resource => write!(f, "resource error"),
        }
    }
}

/// A compile-time diagnostic with kind, message, and position.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub pos: SourcePos,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, pos: SourcePos, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            pos,
        }
    }

    pub fn lex(pos: SourcePos, message: impl Into<String>) -> Self {
        Diagnostic::new(DiagnosticKind::Lex, pos, message)
    }

    pub fn parse(pos: SourcePos, message: impl Into<String>) -> Self {
        Diagnostic::new(DiagnosticKind::Parse, pos, message)
    }

    pub fn semantic(pos: SourcePos, message: impl Into<String>) -> Self {
        Diagnostic::new(DiagnosticKind::Semantic, pos, message)
    }

    pub fn resource(pos: SourcePos, message: impl Into<String>) -> Self {
        Diagnostic::new(DiagnosticKind::Resource, pos, message)
    }

    /// Render the diagnostic against its source text: a blank line, up to
    /// five numbered source lines (target line plus or minus two) with an
    /// arrow marker on the offending line, then `file(line): message`.
    pub fn render(&self, source: &str) -> String {
        let mut out = String::new();
        out.push('\n');

        let target = self.pos.line as i64;
        for (i, line) in source.lines().enumerate() {
            let number = i as i64 + 1;
            if (number - target).abs() < 3 {
                if number == target {
                    out.push_str(&format!("{} ->\t{}\n", number, line));
                } else {
                    out.push_str(&format!("{}\t{}\n", number, line));
                }
            }
            if number >= target + 2 {
                break;
            }
        }

        out.push('\n');
        out.push_str(&format!("{}\n", self));
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}): {}",
            self.pos.file, self.pos.line, self.message
        )
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_file_line_message() {
        let d = Diagnostic::parse(
            SourcePos::new(Arc::from("test.mnw"), 3),
            "Unexpected token )",
        );
        assert_eq!(d.to_string(), "test.mnw(3): Unexpected token )");
    }

    #[test]
    fn render_windows_the_source() {
        let source = "a := 1\nb := 2\nc :=\nd := 4\ne := 5\nf := 6\n";
        let d = Diagnostic::parse(SourcePos::new(Arc::from("t.mnw"), 3), "bad");
        let rendered = d.render(source);
        assert!(rendered.contains("1\ta := 1"));
        assert!(rendered.contains("3 ->\tc :="));
        assert!(rendered.contains("5\te := 5"));
        assert!(!rendered.contains("f := 6"));
        assert!(rendered.ends_with("t.mnw(3): bad\n"));
    }

    #[test]
    fn render_clamps_at_start_of_file() {
        let d = Diagnostic::lex(SourcePos::new(Arc::from("t.mnw"), 1), "bad");
        let rendered = d.render("only line\n");
        assert!(rendered.contains("1 ->\tonly line"));
    }
}
