//! Instruction cell model: opcodes, field modifiers, and addressing modes.
//!
//! Every core cell stores one [`Instruction`] inline. The three tag enums are
//! closed sets with stable `u8` tags; the tags double as the on-disk encoding
//! used by [`crate::codec`].

use std::fmt;

/// Operation performed by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum OpCode {
    /// Kill the executing process.
    #[default]
    Kil = 0,
    /// Fork a new process at the A-operand.
    Frk = 1,
    /// No operation.
    Nop = 2,
    /// Copy source fields (or the whole cell) into the destination.
    Mov = 3,
    /// Add source fields into destination fields.
    Add = 4,
    /// Subtract source fields from destination fields.
    Sub = 5,
    /// Multiply destination fields by source fields.
    Mul = 6,
    /// Divide destination fields by source fields.
    Div = 7,
    /// Replace destination fields with the remainder of a division.
    Mod = 8,
    /// Unconditional jump to the A-operand.
    Jmp = 9,
    /// Jump to the A-operand when the selected destination fields are zero.
    Jmz = 10,
    /// Jump to the A-operand when the selected destination fields are non-zero.
    Jmn = 11,
    /// Skip the next instruction when source and destination are equal.
    Beq = 12,
    /// Skip the next instruction when source and destination differ.
    Bne = 13,
    /// Skip the next instruction when destination fields exceed source fields.
    Blt = 14,
}

impl OpCode {
    /// All opcodes in tag order.
    pub const ALL: [Self; 15] = [
        Self::Kil,
        Self::Frk,
        Self::Nop,
        Self::Mov,
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Mod,
        Self::Jmp,
        Self::Jmz,
        Self::Jmn,
        Self::Beq,
        Self::Bne,
        Self::Blt,
    ];

    /// Returns the stable one-byte tag.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decodes a one-byte tag.
    #[must_use]
    pub const fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Kil),
            1 => Some(Self::Frk),
            2 => Some(Self::Nop),
            3 => Some(Self::Mov),
            4 => Some(Self::Add),
            5 => Some(Self::Sub),
            6 => Some(Self::Mul),
            7 => Some(Self::Div),
            8 => Some(Self::Mod),
            9 => Some(Self::Jmp),
            10 => Some(Self::Jmz),
            11 => Some(Self::Jmn),
            12 => Some(Self::Beq),
            13 => Some(Self::Bne),
            14 => Some(Self::Blt),
            _ => None,
        }
    }

    /// Upper-case assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Kil => "KIL",
            Self::Frk => "FRK",
            Self::Nop => "NOP",
            Self::Mov => "MOV",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Mod => "MOD",
            Self::Jmp => "JMP",
            Self::Jmz => "JMZ",
            Self::Jmn => "JMN",
            Self::Beq => "BEQ",
            Self::Bne => "BNE",
            Self::Blt => "BLT",
        }
    }
}

/// Field selector applied by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Modifier {
    /// A-field to A-field.
    #[default]
    A = 0,
    /// B-field to B-field.
    B = 1,
    /// Source A-field to destination B-field.
    AB = 2,
    /// Source B-field to destination A-field.
    BA = 3,
    /// Both fields, A to A and B to B.
    F = 4,
    /// Both fields crossed, A to B and B to A.
    X = 5,
    /// Whole instruction (both fields for arithmetic).
    I = 6,
}

/// Which value field of a cell an operation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// The A-value field.
    A,
    /// The B-value field.
    B,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A-field"),
            Self::B => write!(f, "B-field"),
        }
    }
}

impl Modifier {
    /// All modifiers in tag order.
    pub const ALL: [Self; 7] = [
        Self::A,
        Self::B,
        Self::AB,
        Self::BA,
        Self::F,
        Self::X,
        Self::I,
    ];

    /// Returns the stable one-byte tag.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decodes a one-byte tag.
    #[must_use]
    pub const fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::A),
            1 => Some(Self::B),
            2 => Some(Self::AB),
            3 => Some(Self::BA),
            4 => Some(Self::F),
            5 => Some(Self::X),
            6 => Some(Self::I),
            _ => None,
        }
    }

    /// Upper-case assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::AB => "AB",
            Self::BA => "BA",
            Self::F => "F",
            Self::X => "X",
            Self::I => "I",
        }
    }

    /// `(source, destination)` field pairs selected by this modifier.
    ///
    /// `I` selects the same pairs as `F`; whole-cell behavior is handled by
    /// the opcodes that define it.
    #[must_use]
    pub const fn field_pairs(self) -> &'static [(Field, Field)] {
        match self {
            Self::A => &[(Field::A, Field::A)],
            Self::B => &[(Field::B, Field::B)],
            Self::AB => &[(Field::A, Field::B)],
            Self::BA => &[(Field::B, Field::A)],
            Self::F | Self::I => &[(Field::A, Field::A), (Field::B, Field::B)],
            Self::X => &[(Field::A, Field::B), (Field::B, Field::A)],
        }
    }

    /// Destination fields selected by this modifier for single-operand tests.
    #[must_use]
    pub const fn destination_fields(self) -> &'static [Field] {
        match self {
            Self::A | Self::BA => &[Field::A],
            Self::B | Self::AB => &[Field::B],
            Self::F | Self::X | Self::I => &[Field::A, Field::B],
        }
    }
}

/// Operand addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum AddressMode {
    /// The operand is the executing instruction itself (`#`).
    #[default]
    Immediate = 0,
    /// Relative address (`$`).
    Direct = 1,
    /// Indirect through the A-field of the addressed cell (`*`).
    AIndirect = 2,
    /// Indirect through the B-field of the addressed cell (`@`).
    BIndirect = 3,
}

impl AddressMode {
    /// All addressing modes in tag order.
    pub const ALL: [Self; 4] = [
        Self::Immediate,
        Self::Direct,
        Self::AIndirect,
        Self::BIndirect,
    ];

    /// Returns the stable one-byte tag.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decodes a one-byte tag.
    #[must_use]
    pub const fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Immediate),
            1 => Some(Self::Direct),
            2 => Some(Self::AIndirect),
            3 => Some(Self::BIndirect),
            _ => None,
        }
    }

    /// Assembly prefix symbol.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Immediate => '#',
            Self::Direct => '$',
            Self::AIndirect => '*',
            Self::BIndirect => '@',
        }
    }

    /// Resolves an assembly prefix symbol.
    #[must_use]
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '#' => Some(Self::Immediate),
            '$' => Some(Self::Direct),
            '*' => Some(Self::AIndirect),
            '@' => Some(Self::BIndirect),
            _ => None,
        }
    }
}

/// One core cell.
///
/// `a_val` and `b_val` are kept in `[0, core_size)` by every producer
/// (assembler, loader, and executor). The default cell is `KIL.A #0, #0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Instruction {
    /// Operation.
    pub op: OpCode,
    /// Field modifier.
    pub modifier: Modifier,
    /// A-operand addressing mode.
    pub a_mode: AddressMode,
    /// B-operand addressing mode.
    pub b_mode: AddressMode,
    /// A-operand value.
    pub a_val: u32,
    /// B-operand value.
    pub b_val: u32,
}

impl Instruction {
    /// Builds an instruction from its six fields.
    #[must_use]
    pub const fn new(
        op: OpCode,
        modifier: Modifier,
        a_mode: AddressMode,
        a_val: u32,
        b_mode: AddressMode,
        b_val: u32,
    ) -> Self {
        Self {
            op,
            modifier,
            a_mode,
            b_mode,
            a_val,
            b_val,
        }
    }

    /// Reads one value field.
    #[must_use]
    pub const fn field(&self, field: Field) -> u32 {
        match field {
            Field::A => self.a_val,
            Field::B => self.b_val,
        }
    }

    /// Writes one value field.
    pub const fn set_field(&mut self, field: Field, value: u32) {
        match field {
            Field::A => self.a_val = value,
            Field::B => self.b_val = value,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} {}{}, {}{}",
            self.op.mnemonic(),
            self.modifier.mnemonic(),
            self.a_mode.symbol(),
            self.a_val,
            self.b_mode.symbol(),
            self.b_val
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{AddressMode, Field, Instruction, Modifier, OpCode};

    #[test]
    fn default_cell_is_kil_with_zero_fields() {
        let cell = Instruction::default();
        assert_eq!(cell.op, OpCode::Kil);
        assert_eq!(cell.modifier, Modifier::A);
        assert_eq!(cell.a_mode, AddressMode::Immediate);
        assert_eq!(cell.b_mode, AddressMode::Immediate);
        assert_eq!((cell.a_val, cell.b_val), (0, 0));
    }

    #[test]
    fn tags_roundtrip_for_every_variant() {
        for op in OpCode::ALL {
            assert_eq!(OpCode::from_u8(op.as_u8()), Some(op));
        }
        for modifier in Modifier::ALL {
            assert_eq!(Modifier::from_u8(modifier.as_u8()), Some(modifier));
        }
        for mode in AddressMode::ALL {
            assert_eq!(AddressMode::from_u8(mode.as_u8()), Some(mode));
            assert_eq!(AddressMode::from_symbol(mode.symbol()), Some(mode));
        }
    }

    #[test]
    fn unknown_tags_are_rejected() {
        assert!(OpCode::from_u8(15).is_none());
        assert!(Modifier::from_u8(7).is_none());
        assert!(AddressMode::from_u8(4).is_none());
        assert!(AddressMode::from_symbol('%').is_none());
    }

    #[test]
    fn equality_is_structural_over_all_fields() {
        let base = Instruction::new(
            OpCode::Mov,
            Modifier::I,
            AddressMode::Direct,
            2,
            AddressMode::Direct,
            0,
        );
        let mut other = base;
        assert_eq!(base, other);
        other.b_mode = AddressMode::BIndirect;
        assert_ne!(base, other);
    }

    #[test]
    fn field_accessors_select_the_right_value() {
        let mut cell = Instruction::default();
        cell.set_field(Field::A, 7);
        cell.set_field(Field::B, 9);
        assert_eq!(cell.field(Field::A), 7);
        assert_eq!(cell.field(Field::B), 9);
    }

    #[test]
    fn display_uses_mnemonics_and_mode_symbols() {
        let cell = Instruction::new(
            OpCode::Jmz,
            Modifier::BA,
            AddressMode::AIndirect,
            12,
            AddressMode::Immediate,
            0,
        );
        assert_eq!(cell.to_string(), "JMZ.BA *12, #0");
    }

    #[test]
    fn crossed_modifier_swaps_fields() {
        assert_eq!(
            Modifier::X.field_pairs(),
            &[(Field::A, Field::B), (Field::B, Field::A)]
        );
        assert_eq!(Modifier::AB.destination_fields(), &[Field::B]);
        assert_eq!(Modifier::I.destination_fields(), &[Field::A, Field::B]);
    }
}
