// minnow-vm - Bytecode compiler and virtual machine for the Minnow scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # minnow-vm
//!
//! Bytecode compiler, stack-based virtual machine, and mark-and-sweep
//! garbage collector for the Minnow scripting language.
//!
//! A [`State`] is a compilation unit: hosts bind foreign functions and
//! constants, compile source onto it (repeatedly, to concatenate programs),
//! then run it on one or more [`Thread`]s. Each thread owns its value
//! stack, call frames, globals, and GC heap; the state's bytecode and
//! tables are shared read-only.

pub mod compiler;
pub mod frame;
pub mod gc;
pub mod opcode;
pub mod program;
pub mod stack;
pub mod state;
pub mod thread;
pub mod value;

pub use frame::{CallFrame, FrameStack, THREAD_INDIR_SIZE};
pub use gc::{Handle, Heap, INIT_GC_THRESHOLD, Marker};
pub use opcode::Opcode;
pub use program::{DecodeError, Instruction, MAX_PROGRAM_LEN, Program};
pub use stack::{THREAD_STACK_SIZE, ValueStack};
pub use state::{ForeignFn, State};
pub use thread::{RuntimeError, Thread};
pub use value::{NativeAddr, NativeProp, Value};
