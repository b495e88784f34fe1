//! Two-pass assembler for Core War source programs.
//!
//! Produces [`corewar_vm::Instruction`] lists and the VM's 12-byte record
//! binary format.

use anyhow as _;
use clap as _;
use tracing_subscriber as _;

/// Top-level two-pass assembler pipeline.
pub mod assembler;
pub use assembler::{assemble_source, Assembler, ListingEntry};
/// Structured assembly diagnostics.
pub mod errors;
pub use errors::{AssemblerError, AssemblerErrorKind, ErrorCollection, SourceLoc};
/// Opcode and modifier mnemonic tables.
pub mod mnemonic;
/// Pass 2 instruction decoding.
pub mod parser;
pub use parser::ParseErrorKind;
/// Pass 1 label table.
pub mod symbols;
pub use symbols::SymbolError;
/// Separator-driven line tokenizer.
pub mod tokenizer;
pub use tokenizer::{Tokenizer, TokenizerError};

#[cfg(test)]
use tempfile as _;
