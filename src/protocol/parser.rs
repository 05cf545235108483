//! Request Line Parser
//!
//! A request is one line of whitespace-separated tokens:
//!
//! ```text
//! SET greeting "hello world"
//! HSET user name "John \"Jack\" Doe" age 30
//! ```
//!
//! Rules:
//! - Runs of whitespace outside quotes separate tokens.
//! - A double quote toggles quoting; quoted whitespace belongs to the token.
//!   Quotes may appear mid-token (`a"b c"d` is the single token `ab cd`).
//! - A backslash escapes the next character, inside or outside quotes.
//! - Empty tokens are dropped: `""` on its own yields nothing and a trailing
//!   lone backslash is ignored. An unterminated quote runs to the end of the
//!   line.
//!
//! The framing half of this module, [`LineParser`], pulls complete
//! `\n`-terminated lines out of a connection's read buffer.

use thiserror::Error;

/// Errors that can occur while framing or decoding a request line.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// The line is not valid UTF-8
    #[error("invalid UTF-8 in request")]
    InvalidUtf8,

    /// No line terminator within the allowed length
    #[error("line too long: {size} bytes (max: {max})")]
    LineTooLong { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum length of a single request line (64 KB)
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Splits a request line into tokens.
///
/// # Example
///
/// ```
/// use linekv::protocol::tokenize;
///
/// assert_eq!(
///     tokenize(r#"SET greeting "hello world""#),
///     vec!["SET", "greeting", "hello world"]
/// );
/// ```
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Extracts complete lines from a byte buffer.
#[derive(Debug, Clone)]
pub struct LineParser {
    max_line_length: usize,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser {
    pub fn new() -> Self {
        Self {
            max_line_length: MAX_LINE_LENGTH,
        }
    }

    /// Uses a custom line length limit.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self { max_line_length }
    }

    /// Attempts to take one line from the front of `buf`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some((line, consumed)))` - a complete line (without `\n` or a
    ///   trailing `\r`); the caller advances the buffer by `consumed` bytes
    /// - `Ok(None)` - no terminator yet, need more data
    /// - `Err(LineTooLong)` - no terminator within the limit
    /// - `Err(InvalidUtf8)` - the line is complete but not text; the caller
    ///   should still discard `consumed` bytes, see [`LineParser::line_end`]
    pub fn parse<'a>(&self, buf: &'a [u8]) -> ParseResult<Option<(&'a str, usize)>> {
        let Some(end) = self.line_end(buf)? else {
            return Ok(None);
        };

        let mut line = &buf[..end];
        if line.last() == Some(&b'\r') {
            line = &line[..line.len() - 1];
        }

        let line = std::str::from_utf8(line).map_err(|_| ParseError::InvalidUtf8)?;
        Ok(Some((line, end + 1)))
    }

    /// Position of the first `\n` in `buf`, checking the length limit.
    pub fn line_end(&self, buf: &[u8]) -> ParseResult<Option<usize>> {
        match buf.iter().position(|&b| b == b'\n') {
            Some(pos) if pos > self.max_line_length => Err(ParseError::LineTooLong {
                size: pos,
                max: self.max_line_length,
            }),
            Some(pos) => Ok(Some(pos)),
            None if buf.len() > self.max_line_length => Err(ParseError::LineTooLong {
                size: buf.len(),
                max: self.max_line_length,
            }),
            None => Ok(None),
        }
    }
}
