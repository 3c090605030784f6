//! Interpreter for a small RISC-V-flavoured assembly dialect
//!
//! Programs are plain text, one whitespace-delimited instruction per line.
//! Lines starting with `/` are comments, tokens starting with `$` are labels,
//! and execution begins at `$main`, running until the program counter walks
//! off the end of the instruction sequence.

pub mod opcode;
pub mod program;
pub mod register;
pub mod vm;
