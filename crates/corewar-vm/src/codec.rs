//! Compiled program binary format.
//!
//! A program is a bare sequence of fixed 12-byte records, one per
//! instruction, with no header and no length prefix:
//!
//! ```text
//! +----+-----+--------+--------+----------+----------+
//! | op | mod | a_mode | b_mode | a_val LE | b_val LE |
//! | 1  |  1  |   1    |   1    |    4     |    4     |
//! +----+-----+--------+--------+----------+----------+
//! ```
//!
//! Readers stop at end of input, at a short trailing record, or at the first
//! record carrying an unknown tag.

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::instruction::{AddressMode, Instruction, Modifier, OpCode};

/// Size in bytes of one encoded instruction.
pub const RECORD_BYTES: usize = 12;

/// Reasons a record cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CodecError {
    /// Fewer than [`RECORD_BYTES`] bytes were available.
    #[error("truncated record: {0} of 12 bytes")]
    ShortRecord(usize),
    /// Opcode tag outside the instruction set.
    #[error("unknown opcode tag {0}")]
    UnknownOpcode(u8),
    /// Modifier tag outside the modifier set.
    #[error("unknown modifier tag {0}")]
    UnknownModifier(u8),
    /// Addressing-mode tag outside the mode set.
    #[error("unknown addressing mode tag {0}")]
    UnknownAddressMode(u8),
}

/// Encodes one instruction into its fixed-size record.
#[must_use]
pub fn encode_instruction(instruction: &Instruction) -> [u8; RECORD_BYTES] {
    let mut record = [0u8; RECORD_BYTES];
    record[0] = instruction.op.as_u8();
    record[1] = instruction.modifier.as_u8();
    record[2] = instruction.a_mode.as_u8();
    record[3] = instruction.b_mode.as_u8();
    record[4..8].copy_from_slice(&instruction.a_val.to_le_bytes());
    record[8..12].copy_from_slice(&instruction.b_val.to_le_bytes());
    record
}

/// Decodes one record from the front of `bytes`.
///
/// # Errors
///
/// Returns a [`CodecError`] when fewer than [`RECORD_BYTES`] bytes remain or a
/// tag byte is out of range.
pub fn decode_instruction(bytes: &[u8]) -> Result<Instruction, CodecError> {
    let Some(record) = bytes.get(..RECORD_BYTES) else {
        return Err(CodecError::ShortRecord(bytes.len()));
    };
    let op = OpCode::from_u8(record[0]).ok_or(CodecError::UnknownOpcode(record[0]))?;
    let modifier = Modifier::from_u8(record[1]).ok_or(CodecError::UnknownModifier(record[1]))?;
    let a_mode =
        AddressMode::from_u8(record[2]).ok_or(CodecError::UnknownAddressMode(record[2]))?;
    let b_mode =
        AddressMode::from_u8(record[3]).ok_or(CodecError::UnknownAddressMode(record[3]))?;
    let a_val = u32::from_le_bytes([record[4], record[5], record[6], record[7]]);
    let b_val = u32::from_le_bytes([record[8], record[9], record[10], record[11]]);

    Ok(Instruction {
        op,
        modifier,
        a_mode,
        b_mode,
        a_val,
        b_val,
    })
}

/// Encodes a whole program into a byte buffer.
#[must_use]
pub fn encode_program(instructions: &[Instruction]) -> Vec<u8> {
    instructions.iter().flat_map(encode_instruction).collect()
}

/// Decodes records until the input is exhausted or a record is malformed.
#[must_use]
pub fn decode_program(bytes: &[u8]) -> Vec<Instruction> {
    let mut instructions = Vec::with_capacity(bytes.len() / RECORD_BYTES);
    for chunk in bytes.chunks(RECORD_BYTES) {
        match decode_instruction(chunk) {
            Ok(instruction) => instructions.push(instruction),
            Err(error) => {
                tracing::debug!(%error, decoded = instructions.len(), "stopped reading program");
                break;
            }
        }
    }
    instructions
}

/// Writes a program to `writer` in record format.
///
/// # Errors
///
/// Propagates any I/O error from `writer`.
pub fn write_program<W: Write>(writer: &mut W, instructions: &[Instruction]) -> io::Result<()> {
    for instruction in instructions {
        writer.write_all(&encode_instruction(instruction))?;
    }
    writer.flush()
}

/// Reads a program from `reader` in record format.
///
/// # Errors
///
/// Propagates I/O errors other than reaching end of input.
pub fn read_program<R: Read>(reader: &mut R) -> io::Result<Vec<Instruction>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(decode_program(&bytes))
}
