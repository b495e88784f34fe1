//! Top-level assembler pipeline.
//!
//! An [`Assembler`] compiles one source unit:
//!
//! 1. **Pass 1**: label collection ([`crate::symbols::collect_labels`])
//! 2. **Pass 2**: per-line decoding ([`crate::parser::parse_instruction`])
//!
//! Both passes keep going after an error so every problem in the file is
//! reported. Output is all-or-nothing: a single error discards every decoded
//! instruction.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use corewar_vm::{write_program, CoreError, Instruction, DEFAULT_CORE_SIZE};

use crate::errors::{AssemblerError, AssemblerErrorKind, ErrorCollection, SourceLoc};
use crate::parser::{parse_instruction, ParseContext};
use crate::symbols::{collect_labels, SourceLine, SymbolTable};

/// One emitted instruction with the source it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Program index of the instruction.
    pub index: u32,
    /// 1-indexed source line.
    pub line: usize,
    /// Source text of the instruction.
    pub source: String,
    /// Decoded instruction.
    pub instruction: Instruction,
}

#[derive(Debug, Clone)]
struct Source {
    name: PathBuf,
    text: String,
}

/// Compiler for one source unit.
#[derive(Debug, Clone)]
pub struct Assembler {
    core_size: u32,
    source: Option<Source>,
    symbols: SymbolTable,
    lines: Vec<SourceLine>,
    instructions: Vec<Instruction>,
    errors: ErrorCollection,
    assembled: bool,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::with_core_size(DEFAULT_CORE_SIZE)
    }
}

impl Assembler {
    /// Creates an assembler normalizing operands modulo `core_size`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSize`] when `core_size` is zero.
    pub fn new(core_size: u32) -> Result<Self, AssemblerError> {
        if core_size == 0 {
            return Err(AssemblerErrorKind::Core(CoreError::InvalidSize).into());
        }
        Ok(Self::with_core_size(core_size))
    }

    fn with_core_size(core_size: u32) -> Self {
        Self {
            core_size,
            source: None,
            symbols: SymbolTable::new(),
            lines: Vec::new(),
            instructions: Vec::new(),
            errors: ErrorCollection::new(),
            assembled: false,
        }
    }

    /// Core size operands are normalized against.
    #[must_use]
    pub const fn core_size(&self) -> u32 {
        self.core_size
    }

    /// Replaces the source unit and forgets any previous result.
    pub fn load_source(&mut self, name: impl Into<PathBuf>, text: impl Into<String>) {
        self.clear_output();
        self.source = Some(Source {
            name: name.into(),
            text: text.into(),
        });
    }

    /// Reads `path` as the source unit.
    ///
    /// # Errors
    ///
    /// Returns an I/O [`AssemblerError`] when the file cannot be read. The
    /// previously loaded source is dropped either way.
    pub fn open_file(&mut self, path: impl AsRef<Path>) -> Result<(), AssemblerError> {
        let path = path.as_ref();
        self.clear_output();
        self.source = None;
        let text = fs::read_to_string(path).map_err(|e| {
            AssemblerError::new(AssemblerErrorKind::Io(format!("{}: {e}", path.display())))
        })?;
        self.load_source(path, text);
        Ok(())
    }

    /// Compiles the loaded source.
    ///
    /// Returns `true` on success. On failure every diagnostic is available
    /// from [`errors`](Self::errors) and has been logged.
    pub fn assemble(&mut self) -> bool {
        self.clear_output();
        let Some(source) = &self.source else {
            self.errors
                .push(AssemblerError::new(AssemblerErrorKind::NoSource));
            tracing::error!("no source loaded");
            return false;
        };

        let pass = collect_labels(&source.text);
        self.errors = pass
            .errors
            .into_iter()
            .map(|(line, error)| {
                AssemblerError::new(error.into())
                    .with_location(SourceLoc::new(source.name.clone(), line))
            })
            .collect();
        self.symbols = pass.symbols;
        self.lines = pass.lines;

        let context = ParseContext {
            symbols: &self.symbols,
            core_size: self.core_size,
        };
        let mut instructions = Vec::with_capacity(self.lines.len());
        for (index, line) in (0u32..).zip(&self.lines) {
            match parse_instruction(&line.text, index, context) {
                Ok(instruction) => instructions.push(instruction),
                Err(error) => self.errors.push(
                    AssemblerError::new(error.into())
                        .with_location(SourceLoc::new(source.name.clone(), line.line)),
                ),
            }
        }

        if !self.errors.is_empty() {
            for error in &self.errors {
                tracing::error!("{error}");
            }
            self.symbols.clear();
            self.lines.clear();
            return false;
        }

        tracing::debug!(
            source = %source.name.display(),
            instructions = instructions.len(),
            labels = self.symbols.len(),
            "assembled"
        );
        self.instructions = instructions;
        self.assembled = true;
        true
    }

    /// Instructions of the last successful assembly, empty otherwise.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Diagnostics of the last assembly.
    #[must_use]
    pub const fn errors(&self) -> &ErrorCollection {
        &self.errors
    }

    /// Program index of `label`, if defined.
    #[must_use]
    pub fn label(&self, label: &str) -> Option<u32> {
        self.symbols
            .get(&label.to_lowercase())
            .map(|symbol| symbol.index)
    }

    /// Returns `true` after a successful [`assemble`](Self::assemble).
    #[must_use]
    pub const fn is_assembled(&self) -> bool {
        self.assembled
    }

    /// Source-annotated view of the assembled program.
    #[must_use]
    pub fn listing(&self) -> Vec<ListingEntry> {
        (0u32..)
            .zip(self.lines.iter().zip(&self.instructions))
            .map(|(index, (line, instruction))| ListingEntry {
                index,
                line: line.line,
                source: line.text.clone(),
                instruction: *instruction,
            })
            .collect()
    }

    /// Writes the assembled program in binary record format.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblerErrorKind::NotAssembled`] before a successful
    /// assembly, or an I/O error from `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), AssemblerError> {
        if !self.assembled {
            return Err(AssemblerErrorKind::NotAssembled.into());
        }
        write_program(writer, &self.instructions)?;
        Ok(())
    }

    /// Writes the assembled program to the file at `path`.
    ///
    /// # Errors
    ///
    /// Same as [`write_to`](Self::write_to), plus failure to create the file.
    pub fn write_binary(&self, path: impl AsRef<Path>) -> Result<(), AssemblerError> {
        if !self.assembled {
            return Err(AssemblerErrorKind::NotAssembled.into());
        }
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.write_to(&mut writer)
    }

    fn clear_output(&mut self) {
        self.symbols.clear();
        self.lines.clear();
        self.instructions.clear();
        self.errors.clear();
        self.assembled = false;
    }
}

/// Compiles `text` in one shot.
///
/// # Errors
///
/// Returns every diagnostic when the source does not assemble.
pub fn assemble_source(
    file_name: impl Into<PathBuf>,
    text: impl Into<String>,
    core_size: u32,
) -> Result<Vec<Instruction>, ErrorCollection> {
    let mut assembler = Assembler::new(core_size)
        .map_err(|error| std::iter::once(error).collect::<ErrorCollection>())?;
    assembler.load_source(file_name, text);
    if assembler.assemble() {
        Ok(assembler.instructions)
    } else {
        Err(assembler.errors)
    }
}
