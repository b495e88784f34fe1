//! Mnemonic resolution derived from the VM's opcode and modifier tables.

use corewar_vm::{AddressMode, Modifier, OpCode};

/// Resolves an opcode mnemonic, ignoring case.
#[must_use]
pub fn resolve_opcode(token: &str) -> Option<OpCode> {
    OpCode::ALL
        .into_iter()
        .find(|op| op.mnemonic().eq_ignore_ascii_case(token))
}

/// Resolves a modifier mnemonic, ignoring case.
#[must_use]
pub fn resolve_modifier(token: &str) -> Option<Modifier> {
    Modifier::ALL
        .into_iter()
        .find(|modifier| modifier.mnemonic().eq_ignore_ascii_case(token))
}

/// Modifier assumed when the source omits one.
#[must_use]
pub const fn default_modifier(op: OpCode, a_mode: AddressMode, b_mode: AddressMode) -> Modifier {
    let a_immediate = matches!(a_mode, AddressMode::Immediate);
    let b_immediate = matches!(b_mode, AddressMode::Immediate);
    match op {
        OpCode::Kil | OpCode::Nop => Modifier::F,
        OpCode::Frk | OpCode::Jmp | OpCode::Jmz | OpCode::Jmn => Modifier::B,
        OpCode::Mov | OpCode::Beq | OpCode::Bne => {
            if a_immediate {
                Modifier::AB
            } else if b_immediate {
                Modifier::B
            } else {
                Modifier::I
            }
        }
        OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::Mod => {
            if a_immediate {
                Modifier::AB
            } else if b_immediate {
                Modifier::B
            } else {
                Modifier::F
            }
        }
        OpCode::Blt => {
            if a_immediate {
                Modifier::AB
            } else {
                Modifier::B
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{default_modifier, resolve_modifier, resolve_opcode};
    use corewar_vm::{AddressMode, Modifier, OpCode};
    use rstest::rstest;

    #[test]
    fn every_opcode_resolves_from_its_mnemonic() {
        for op in OpCode::ALL {
            assert_eq!(resolve_opcode(op.mnemonic()), Some(op));
            assert_eq!(resolve_opcode(&op.mnemonic().to_lowercase()), Some(op));
        }
    }

    #[test]
    fn every_modifier_resolves_from_its_mnemonic() {
        for modifier in Modifier::ALL {
            assert_eq!(resolve_modifier(modifier.mnemonic()), Some(modifier));
        }
        assert_eq!(resolve_modifier("ba"), Some(Modifier::BA));
    }

    #[test]
    fn unknown_mnemonics_return_none() {
        assert_eq!(resolve_opcode("addiu"), None);
        assert_eq!(resolve_opcode(""), None);
        assert_eq!(resolve_modifier("q"), None);
    }

    #[rstest]
    #[case(OpCode::Kil, AddressMode::Immediate, AddressMode::Immediate, Modifier::F)]
    #[case(OpCode::Nop, AddressMode::Direct, AddressMode::Direct, Modifier::F)]
    #[case(OpCode::Jmp, AddressMode::Immediate, AddressMode::Direct, Modifier::B)]
    #[case(OpCode::Jmn, AddressMode::Direct, AddressMode::Immediate, Modifier::B)]
    #[case(OpCode::Mov, AddressMode::Immediate, AddressMode::Direct, Modifier::AB)]
    #[case(OpCode::Mov, AddressMode::Direct, AddressMode::Immediate, Modifier::B)]
    #[case(OpCode::Mov, AddressMode::Direct, AddressMode::BIndirect, Modifier::I)]
    #[case(OpCode::Bne, AddressMode::AIndirect, AddressMode::Direct, Modifier::I)]
    #[case(OpCode::Add, AddressMode::Immediate, AddressMode::Immediate, Modifier::AB)]
    #[case(OpCode::Div, AddressMode::Direct, AddressMode::Immediate, Modifier::B)]
    #[case(OpCode::Mul, AddressMode::Direct, AddressMode::Direct, Modifier::F)]
    #[case(OpCode::Blt, AddressMode::Immediate, AddressMode::Direct, Modifier::AB)]
    #[case(OpCode::Blt, AddressMode::Direct, AddressMode::Direct, Modifier::B)]
    fn inferred_modifier_follows_operand_modes(
        #[case] op: OpCode,
        #[case] a_mode: AddressMode,
        #[case] b_mode: AddressMode,
        #[case] expected: Modifier,
    ) {
        assert_eq!(default_modifier(op, a_mode, b_mode), expected);
    }
}
