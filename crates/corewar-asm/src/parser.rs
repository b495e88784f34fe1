//! Pass 2: decoding one instruction line into an [`Instruction`].
//!
//! Grammar, after lower-casing:
//!
//! ```text
//! line    := opcode [ "." modifier ] field [ "," field ]
//! field   := [ "#" | "$" | "*" | "@" ] ( integer | label )
//! ```
//!
//! The B-field may be omitted only for `FRK` and `JMP`, where it defaults to
//! `#0`. Numbers are reduced modulo the core size; labels become the distance
//! from the current instruction to the label.

use corewar_vm::{normalize, AddressMode, Field, Instruction, OpCode};
use thiserror::Error;

use crate::mnemonic::{default_modifier, resolve_modifier, resolve_opcode};
use crate::symbols::{is_valid_label, SymbolTable};
use crate::tokenizer::Tokenizer;

/// Classification of pass 2 errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// First token is not an opcode mnemonic.
    #[error("invalid instruction '{0}'")]
    InvalidInstruction(String),
    /// Token after `.` is not a modifier mnemonic.
    #[error("invalid modifier '{0}'")]
    InvalidModifier(String),
    /// A required operand is absent.
    #[error("missing {0} operand")]
    MissingOperand(Field),
    /// Something other than `,` follows the A-field.
    #[error("expected ',' but found '{0}'")]
    ExpectedComma(String),
    /// Tokens remain after the B-field.
    #[error("too many arguments: unexpected '{0}'")]
    TooManyArguments(String),
    /// Operand names a label that is never defined.
    #[error("unknown label '{0}'")]
    UnknownLabel(String),
    /// Label used with immediate addressing.
    #[error("label '{0}' cannot be used as an immediate operand")]
    ImmediateLabel(String),
    /// Operand looks numeric but does not parse.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    /// Operand is neither a number nor a well-formed label.
    #[error("invalid operand '{0}'")]
    InvalidOperand(String),
}

/// Context shared by every line of one compilation.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    /// Labels collected in pass 1.
    pub symbols: &'a SymbolTable,
    /// Core size operands are normalized against.
    pub core_size: u32,
}

const DROPPED: &str = " \t";
const KEPT: &str = "#$*@.,";

/// Decodes the instruction at program index `index`.
///
/// # Errors
///
/// Returns the first [`ParseErrorKind`] found on the line.
pub fn parse_instruction(
    text: &str,
    index: u32,
    context: ParseContext<'_>,
) -> Result<Instruction, ParseErrorKind> {
    let mut tokens = Tokenizer::new(text, DROPPED, KEPT, true);

    let mnemonic = tokens.next_token().unwrap_or_default();
    let op = resolve_opcode(&mnemonic).ok_or(ParseErrorKind::InvalidInstruction(mnemonic))?;

    let explicit_modifier = if tokens.peek() == Some(".") {
        let _ = tokens.next_token();
        let name = tokens.next_token().unwrap_or_default();
        Some(resolve_modifier(&name).ok_or(ParseErrorKind::InvalidModifier(name))?)
    } else {
        None
    };

    let (a_mode, a_val) = parse_field(&mut tokens, Field::A, index, context)?;

    let (b_mode, b_val) = match tokens.next_token() {
        Ok(comma) if comma == "," => parse_field(&mut tokens, Field::B, index, context)?,
        Ok(other) => return Err(ParseErrorKind::ExpectedComma(other)),
        Err(_) if matches!(op, OpCode::Frk | OpCode::Jmp) => (AddressMode::Immediate, 0),
        Err(_) => return Err(ParseErrorKind::MissingOperand(Field::B)),
    };

    if let Ok(extra) = tokens.next_token() {
        return Err(ParseErrorKind::TooManyArguments(extra));
    }

    let modifier = explicit_modifier.unwrap_or_else(|| default_modifier(op, a_mode, b_mode));
    Ok(Instruction::new(op, modifier, a_mode, a_val, b_mode, b_val))
}

fn parse_field(
    tokens: &mut Tokenizer,
    field: Field,
    index: u32,
    context: ParseContext<'_>,
) -> Result<(AddressMode, u32), ParseErrorKind> {
    let missing = || ParseErrorKind::MissingOperand(field);

    let mut token = tokens.next_token().map_err(|_| missing())?;
    let mut mode = AddressMode::Direct;
    if let Some(explicit) = single_char(&token).and_then(AddressMode::from_symbol) {
        mode = explicit;
        token = tokens.next_token().map_err(|_| missing())?;
    }
    if token == "," {
        return Err(missing());
    }

    let value = parse_value(&token, mode, index, context)?;
    Ok((mode, value))
}

fn parse_value(
    token: &str,
    mode: AddressMode,
    index: u32,
    context: ParseContext<'_>,
) -> Result<u32, ParseErrorKind> {
    if token.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+') {
        let number: i64 = token
            .parse()
            .map_err(|_| ParseErrorKind::InvalidNumber(token.to_owned()))?;
        return Ok(normalize(number, context.core_size));
    }

    if !is_valid_label(token) {
        return Err(ParseErrorKind::InvalidOperand(token.to_owned()));
    }
    if mode == AddressMode::Immediate {
        return Err(ParseErrorKind::ImmediateLabel(token.to_owned()));
    }
    let symbol = context
        .symbols
        .get(token)
        .ok_or_else(|| ParseErrorKind::UnknownLabel(token.to_owned()))?;
    Ok(normalize(
        i64::from(symbol.index) - i64::from(index),
        context.core_size,
    ))
}

fn single_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    let first = chars.next()?;
    chars.next().is_none().then_some(first)
}
