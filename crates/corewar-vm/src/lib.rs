//! Deterministic two-player Core War virtual machine.
//!
//! Two programs share a circular [`Core`] of [`Instruction`] cells. Each
//! player owns a FIFO [`ProcessQueue`]; every cycle runs one process of
//! player 1 and then one of player 2 until a queue empties or the cycle
//! limit is reached.

/// Instruction cell model and tag enums.
pub mod instruction;
pub use instruction::{AddressMode, Field, Instruction, Modifier, OpCode};

/// Circular core memory and wraparound cursors.
pub mod core;
pub use crate::core::{normalize, Core, CoreError, Cursor};

/// Round parameters and named rulesets.
pub mod config;
pub use config::{
    Ruleset, VmConfig, DEFAULT_CORE_SIZE, DEFAULT_MAX_CYCLES, DEFAULT_MAX_PROCESSES,
};

/// 12-byte record binary program format.
pub mod codec;
pub use codec::{
    decode_instruction, decode_program, encode_instruction, encode_program, read_program,
    write_program, CodecError, RECORD_BYTES,
};

/// Players and process queues.
pub mod process;
pub use process::{Player, ProcessQueue};

/// Per-step reports and round outcome.
pub mod report;
pub use report::{KillCause, ProcessEvent, RoundState, StepReport};

/// Operand resolution and single-process execution.
pub mod execute;
pub use execute::{resolve_operand, step_process};

/// Two-player machine and scheduler.
pub mod vm;
pub use vm::{LoadError, VirtualMachine};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;
