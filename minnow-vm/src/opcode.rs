// minnow-vm - Bytecode instruction definitions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode instruction definitions.
//!
//! Instructions are single bytes, optionally followed by inline operands.
//! Every operand is a 32-bit little-endian two's-complement integer, so an
//! instruction occupies `1 + 4 * operand_count` bytes in the program image.

use std::fmt;

/// Bytecode instructions for the Minnow VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Push the null value.
    PushNull = 0,
    /// Push boolean true.
    PushTrue = 1,
    /// Push boolean false.
    PushFalse = 2,
    /// Push the number-pool literal named by the operand.
    PushNumber = 3,
    /// Push the string-pool literal named by the operand.
    PushString = 4,
    /// Pop and discard the top of the stack.
    Pop = 5,

    // Arithmetic on doubles; Mod/Or/And truncate their operands to i32.
    Add = 6,
    Sub = 7,
    Mul = 8,
    Div = 9,
    Mod = 10,
    Or = 11,
    And = 12,

    // Comparisons on doubles; Equ is polymorphic over the value model.
    Lt = 13,
    Lte = 14,
    Gt = 15,
    Gte = 16,
    Equ = 17,

    // Logical operators on booleans.
    LogNot = 18,
    LogAnd = 19,
    LogOr = 20,

    /// Pop a value and write it with a trailing newline to stdout.
    Print = 21,

    /// Store the popped value into the global slot named by the operand.
    Set = 22,
    /// Push the global slot named by the operand.
    Get = 23,

    /// Read a line from stdin and push it as an owned string.
    Read = 24,

    /// Unconditional jump to the operand address.
    Goto = 25,
    /// Pop a boolean and jump to the operand address when it is false.
    Gotoz = 26,

    /// Call the user function `fn` with `nargs` arguments (two operands).
    Call = 27,
    /// Return null: restore the caller's frame.
    Return = 28,
    /// Pop the return value, then restore the caller's frame.
    ReturnValue = 29,
    /// Call the foreign function `ffn` with `nargs` arguments (two operands).
    Callf = 30,

    /// Push the frame-relative slot named by the operand (negative offsets
    /// address arguments).
    GetLocal = 31,
    /// Store the popped value into the frame-relative slot.
    SetLocal = 32,

    /// Push the return-value register.
    GetRetval = 33,

    /// Stop the thread.
    Halt = 34,
}

impl Opcode {
    /// Decode a single opcode byte.
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        match byte {
            0 => Some(Opcode::PushNull),
            1 => Some(Opcode::PushTrue),
            2 => Some(Opcode::PushFalse),
            3 => Some(Opcode::PushNumber),
            4 => Some(Opcode::PushString),
            5 => Some(Opcode::Pop),
            6 => Some(Opcode::Add),
            7 => Some(Opcode::Sub),
            8 => Some(Opcode::Mul),
            9 => Some(Opcode::Div),
            10 => Some(Opcode::Mod),
            11 => Some(Opcode::Or),
            12 => Some(Opcode::And),
            13 => Some(Opcode::Lt),
            14 => Some(Opcode::Lte),
            15 => Some(Opcode::Gt),
            16 => Some(Opcode::Gte),
            17 => Some(Opcode::Equ),
            18 => Some(Opcode::LogNot),
            19 => Some(Opcode::LogAnd),
            20 => Some(Opcode::LogOr),
            21 => Some(Opcode::Print),
            22 => Some(Opcode::Set),
            23 => Some(Opcode::Get),
            24 => Some(Opcode::Read),
            25 => Some(Opcode::Goto),
            26 => Some(Opcode::Gotoz),
            27 => Some(Opcode::Call),
            28 => Some(Opcode::Return),
            29 => Some(Opcode::ReturnValue),
            30 => Some(Opcode::Callf),
            31 => Some(Opcode::GetLocal),
            32 => Some(Opcode::SetLocal),
            33 => Some(Opcode::GetRetval),
            34 => Some(Opcode::Halt),
            _ => None,
        }
    }

    /// Number of 32-bit operands following the opcode byte.
    pub fn operand_count(self) -> usize {
        match self {
            Opcode::PushNumber
            | Opcode::PushString
            | Opcode::Set
            | Opcode::Get
            | Opcode::Goto
            | Opcode::Gotoz
            | Opcode::GetLocal
            | Opcode::SetLocal => 1,
            Opcode::Call | Opcode::Callf => 2,
            _ => 0,
        }
    }

    /// Lower-case mnemonic, as used by the disassembler.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::PushNull => "push_null",
            Opcode::PushTrue => "push_true",
            Opcode::PushFalse => "push_false",
            Opcode::PushNumber => "push_number",
            Opcode::PushString => "push_string",
            Opcode::Pop => "pop",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Mod => "mod",
            Opcode::Or => "or",
            Opcode::And => "and",
            Opcode::Lt => "lt",
            Opcode::Lte => "lte",
            Opcode::Gt => "gt",
            Opcode::Gte => "gte",
            Opcode::Equ => "equ",
            Opcode::LogNot => "log_not",
            Opcode::LogAnd => "log_and",
            Opcode::LogOr => "log_or",
            Opcode::Print => "print",
            Opcode::Set => "set",
            Opcode::Get => "get",
            Opcode::Read => "read",
            Opcode::Goto => "goto",
            Opcode::Gotoz => "gotoz",
            Opcode::Call => "call",
            Opcode::Return => "return",
            Opcode::ReturnValue => "return_value",
            Opcode::Callf => "callf",
            Opcode::GetLocal => "getlocal",
            Opcode::SetLocal => "setlocal",
            Opcode::GetRetval => "get_retval",
            Opcode::Halt => "halt",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
