//! Structured diagnostics for assembler phases.
//!
//! Every problem found while compiling is an [`AssemblerError`] carrying the
//! file and line it came from. Errors are collected rather than returned one
//! at a time so a whole file can be reported in one run:
//!
//! ```text
//! imp.red:3: error: unknown label 'lop'
//! ```

use std::fmt;
use std::path::PathBuf;

use corewar_vm::CoreError;
use thiserror::Error;

use crate::parser::ParseErrorKind;
use crate::symbols::SymbolError;

/// A source location for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLoc {
    /// Source file name.
    pub file: PathBuf,
    /// 1-indexed line number.
    pub line: usize,
}

impl SourceLoc {
    /// Creates a new source location.
    #[must_use]
    pub const fn new(file: PathBuf, line: usize) -> Self {
        Self { file, line }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// Classification of assembler errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerErrorKind {
    /// Pass 2 rejected an instruction line.
    #[error(transparent)]
    Parse(#[from] ParseErrorKind),
    /// Pass 1 rejected a label definition.
    #[error(transparent)]
    Symbol(#[from] SymbolError),
    /// Operands cannot be normalized against the requested core size.
    #[error(transparent)]
    Core(#[from] CoreError),
    /// Reading the source or writing the binary failed.
    #[error("I/O error: {0}")]
    Io(String),
    /// `assemble` was called with no source loaded.
    #[error("no source loaded")]
    NoSource,
    /// Output was requested before a successful assembly.
    #[error("program has not been assembled successfully")]
    NotAssembled,
}

/// A unified assembler error with source context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerError {
    /// The kind of error.
    pub kind: AssemblerErrorKind,
    /// Source location if available.
    pub location: Option<SourceLoc>,
}

impl AssemblerError {
    /// Creates a new assembler error.
    #[must_use]
    pub const fn new(kind: AssemblerErrorKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    /// Adds a source location to the error.
    #[must_use]
    pub fn with_location(mut self, loc: SourceLoc) -> Self {
        self.location = Some(loc);
        self
    }

    /// Formats the error for stderr output.
    #[must_use]
    pub fn format_for_stderr(&self) -> String {
        self.location.as_ref().map_or_else(
            || format!("error: {}", self.kind),
            |loc| format!("{loc}: error: {}", self.kind),
        )
    }
}

impl fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{loc}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for AssemblerError {}

impl From<AssemblerErrorKind> for AssemblerError {
    fn from(kind: AssemblerErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<std::io::Error> for AssemblerError {
    fn from(e: std::io::Error) -> Self {
        Self::new(AssemblerErrorKind::Io(e.to_string()))
    }
}

/// A collection of multiple errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCollection {
    errors: Vec<AssemblerError>,
}

impl ErrorCollection {
    /// Creates an empty error collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Adds an error to the collection.
    pub fn push(&mut self, error: AssemblerError) {
        self.errors.push(error);
    }

    /// Returns true if the collection is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns an iterator over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &AssemblerError> {
        self.errors.iter()
    }

    /// Removes every error.
    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Formats all errors for stderr output.
    #[must_use]
    pub fn format_for_stderr(&self) -> String {
        self.errors
            .iter()
            .map(AssemblerError::format_for_stderr)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns the first error, if any.
    #[must_use]
    pub fn first(&self) -> Option<&AssemblerError> {
        self.errors.first()
    }
}

impl fmt::Display for ErrorCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorCollection {}

impl FromIterator<AssemblerError> for ErrorCollection {
    fn from_iter<T: IntoIterator<Item = AssemblerError>>(iter: T) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ErrorCollection {
    type Item = &'a AssemblerError;
    type IntoIter = std::slice::Iter<'a, AssemblerError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{AssemblerError, AssemblerErrorKind, ErrorCollection, SourceLoc};
    use crate::parser::ParseErrorKind;
    use crate::symbols::SymbolError;
    use std::path::PathBuf;

    fn located(kind: AssemblerErrorKind, file: &str, line: usize) -> AssemblerError {
        AssemblerError::new(kind).with_location(SourceLoc::new(PathBuf::from(file), line))
    }

    #[test]
    fn error_without_location() {
        let error = AssemblerError::new(AssemblerErrorKind::NotAssembled);
        assert_eq!(
            error.format_for_stderr(),
            "error: program has not been assembled successfully"
        );
    }

    #[test]
    fn error_with_location_names_file_and_line() {
        let error = located(
            ParseErrorKind::UnknownLabel("lop".into()).into(),
            "imp.red",
            3,
        );
        assert_eq!(
            error.format_for_stderr(),
            "imp.red:3: error: unknown label 'lop'"
        );
        assert_eq!(error.to_string(), "imp.red:3: unknown label 'lop'");
    }

    #[test]
    fn symbol_errors_render_transparently() {
        let kind = AssemblerErrorKind::from(SymbolError::DuplicateLabel {
            name: "abc".into(),
            first_definition: 1,
        });
        assert_eq!(
            kind.to_string(),
            "duplicate label 'abc' (first defined at line 1)"
        );
    }

    #[test]
    fn collection_formats_one_error_per_line() {
        let collection: ErrorCollection = [
            located(AssemblerErrorKind::Io("a".into()), "a.red", 1),
            located(AssemblerErrorKind::Io("b".into()), "b.red", 2),
        ]
        .into_iter()
        .collect();

        assert_eq!(collection.len(), 2);
        assert_eq!(
            collection.format_for_stderr(),
            "a.red:1: error: I/O error: a\nb.red:2: error: I/O error: b"
        );
        assert_eq!(
            collection.first().map(|e| e.kind.clone()),
            Some(AssemblerErrorKind::Io("a".into()))
        );
    }

    #[test]
    fn empty_collection() {
        let mut collection = ErrorCollection::new();
        assert!(collection.is_empty());
        collection.push(AssemblerError::new(AssemblerErrorKind::NoSource));
        assert!(!collection.is_empty());
        collection.clear();
        assert_eq!(collection.len(), 0);
    }
}
