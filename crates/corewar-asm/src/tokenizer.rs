//! Lazy, restartable line tokenizer.
//!
//! Characters in the *dropped* set separate tokens and are discarded.
//! Characters in the *kept* set also separate tokens but are emitted as
//! one-character tokens of their own. Tokens are produced on demand; peeking
//! never consumes.

use thiserror::Error;

/// Error returned when reading past the last token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenizerError {
    /// No token remains in the current text.
    #[error("no token left in input")]
    OutOfRange,
}

/// Splits one line of text into tokens.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    text: String,
    dropped: Vec<char>,
    kept: Vec<char>,
    lowercase: bool,
    offset: usize,
    peeked: Option<String>,
}

impl Tokenizer {
    /// Creates a tokenizer over `text`.
    ///
    /// When `lowercase` is set, the text is folded to lower case before
    /// splitting, here and on every later [`assign`](Self::assign).
    #[must_use]
    pub fn new(text: &str, dropped: &str, kept: &str, lowercase: bool) -> Self {
        let mut tokenizer = Self {
            text: String::new(),
            dropped: dropped.chars().collect(),
            kept: kept.chars().collect(),
            lowercase,
            offset: 0,
            peeked: None,
        };
        tokenizer.assign(text);
        tokenizer
    }

    /// Replaces the text and restarts from its first token.
    pub fn assign(&mut self, text: &str) {
        self.text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_owned()
        };
        self.reset();
    }

    /// Restarts from the first token of the current text.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.peeked = None;
    }

    /// Returns `true` when another token is available.
    pub fn has_token(&mut self) -> bool {
        self.peek().is_some()
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> Option<&str> {
        if self.peeked.is_none() {
            self.peeked = self.scan();
        }
        self.peeked.as_deref()
    }

    /// Consumes and returns the next token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::OutOfRange`] when the text is exhausted.
    pub fn next_token(&mut self) -> Result<String, TokenizerError> {
        self.peeked
            .take()
            .or_else(|| self.scan())
            .ok_or(TokenizerError::OutOfRange)
    }

    /// Text remaining after the tokens consumed so far, including a peeked
    /// token.
    #[must_use]
    pub fn remainder(&self) -> &str {
        let start = self
            .peeked
            .as_ref()
            .map_or(self.offset, |token| self.offset - token.len());
        &self.text[start..]
    }

    fn scan(&mut self) -> Option<String> {
        let rest = &self.text[self.offset..];
        let skipped = rest
            .char_indices()
            .find(|(_, c)| !self.dropped.contains(c))
            .map(|(index, _)| index)?;
        let start = self.offset + skipped;
        let first = self.text[start..].chars().next()?;

        if self.kept.contains(&first) {
            self.offset = start + first.len_utf8();
            return Some(first.to_string());
        }

        let length = self.text[start..]
            .char_indices()
            .find(|(_, c)| self.dropped.contains(c) || self.kept.contains(c))
            .map_or(self.text.len() - start, |(index, _)| index);
        self.offset = start + length;
        Some(self.text[start..self.offset].to_owned())
    }
}

impl Iterator for Tokenizer {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().ok()
    }
}
