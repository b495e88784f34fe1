//! Pass 1: label table construction and instruction line collection.
//!
//! Walks the source line by line, strips `;` comments, records
//! `label:` definitions against the index of the next instruction, and
//! collects the text of every instruction together with its source line.

use std::collections::HashMap;

use thiserror::Error;

use crate::tokenizer::Tokenizer;

/// Label names mapped to the instruction index they designate.
pub type SymbolTable = HashMap<String, Symbol>;

/// A defined label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Index of the instruction the label precedes.
    pub index: u32,
    /// 1-indexed source line of the definition.
    pub defined_at: usize,
}

/// Error found while collecting labels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    /// A label was defined more than once.
    #[error("duplicate label '{name}' (first defined at line {first_definition})")]
    DuplicateLabel {
        /// Label name.
        name: String,
        /// Line of the first definition.
        first_definition: usize,
    },
    /// Text before `:` is not a valid identifier.
    #[error("invalid label '{0}'")]
    InvalidLabel(String),
}

/// Instruction text with the line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-indexed source line.
    pub line: usize,
    /// Instruction text with comment and label removed.
    pub text: String,
}

/// Outcome of pass 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelPass {
    /// Every label defined in the source.
    pub symbols: SymbolTable,
    /// Instruction lines in program order.
    pub lines: Vec<SourceLine>,
    /// Errors with the source line they occurred on.
    pub errors: Vec<(usize, SymbolError)>,
}

/// Returns `true` for names usable as labels.
#[must_use]
pub fn is_valid_label(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Runs pass 1 over `source`.
///
/// Label names are folded to lower case. Errors do not stop the scan.
#[must_use]
pub fn collect_labels(source: &str) -> LabelPass {
    let mut pass = LabelPass::default();
    let mut tokens = Tokenizer::new("", " \t", ":", true);

    for (number, raw) in source.lines().enumerate() {
        let line = number + 1;
        let code = strip_comment(raw).trim();
        if code.is_empty() {
            continue;
        }

        tokens.assign(code);
        let Ok(first) = tokens.next_token() else {
            continue;
        };
        if tokens.peek() != Some(":") {
            push_instruction(&mut pass, line, code);
            continue;
        }
        let _ = tokens.next_token();

        if is_valid_label(&first) {
            define(&mut pass, first, line);
        } else {
            pass.errors.push((line, SymbolError::InvalidLabel(first)));
        }

        let rest = code
            .split_once(':')
            .map_or("", |(_, rest)| rest)
            .trim();
        if !rest.is_empty() {
            push_instruction(&mut pass, line, rest);
        }
    }
    pass
}

fn strip_comment(line: &str) -> &str {
    line.find(';').map_or(line, |pos| &line[..pos])
}

#[allow(clippy::cast_possible_truncation)]
fn define(pass: &mut LabelPass, name: String, line: usize) {
    if let Some(existing) = pass.symbols.get(&name) {
        pass.errors.push((
            line,
            SymbolError::DuplicateLabel {
                name,
                first_definition: existing.defined_at,
            },
        ));
        return;
    }
    let index = pass.lines.len() as u32;
    pass.symbols.insert(
        name,
        Symbol {
            index,
            defined_at: line,
        },
    );
}

fn push_instruction(pass: &mut LabelPass, line: usize, text: &str) {
    pass.lines.push(SourceLine {
        line,
        text: text.to_owned(),
    });
}
