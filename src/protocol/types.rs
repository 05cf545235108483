//! Reply Types
//!
//! Every request gets exactly one [`Reply`]. Each reply type starts with a
//! prefix character:
//! - `+` Simple string (status or value)
//! - `-` Error
//! - `:` Integer
//! - `$-1` Null (absent value)
//! - `*` Array: a count line followed by that many `+item` lines
//!
//! Lines are separated by `\n`. The protocol is text-only: values are sent
//! as-is and must not contain newlines.
//!
//! ## Examples
//!
//! ```text
//! +OK
//! -ERR unknown command 'FOO'
//! :42
//! $-1
//! *2
//! +apple
//! +banana
//! ```

use std::fmt;

/// Line terminator appended after every reply
pub const LF: u8 = b'\n';

/// Reply type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: char = '+';
    pub const ERROR: char = '-';
    pub const INTEGER: char = ':';
    pub const NULL: &str = "$-1";
    pub const ARRAY: char = '*';
}

/// A reply produced by the command dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Status or string value.
    /// Format: `+<text>`
    Simple(String),

    /// Error condition.
    /// Format: `-<message>`
    Error(String),

    /// 64-bit signed integer.
    /// Format: `:<integer>`
    Integer(i64),

    /// Absent value.
    /// Format: `$-1`
    Null,

    /// List of text items.
    /// Format: `*<count>` then one `+<item>` line per item
    Array(Vec<String>),
}

impl Reply {
    /// Creates a simple string reply.
    ///
    /// # Example
    /// ```
    /// use linekv::protocol::Reply;
    /// assert_eq!(Reply::simple("hello").encode(), "+hello");
    /// ```
    pub fn simple(s: impl Into<String>) -> Self {
        Reply::Simple(s.into())
    }

    /// Creates an error reply. The message should start with `ERR`.
    pub fn error(s: impl Into<String>) -> Self {
        Reply::Error(s.into())
    }

    pub fn integer(n: i64) -> Self {
        Reply::Integer(n)
    }

    /// Creates an integer reply from a count.
    pub fn count(n: usize) -> Self {
        Reply::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }

    pub fn null() -> Self {
        Reply::Null
    }

    /// Creates an array reply.
    ///
    /// # Example
    /// ```
    /// use linekv::protocol::Reply;
    /// let reply = Reply::array(vec!["a".to_string(), "b".to_string()]);
    /// assert_eq!(reply.encode(), "*2\n+a\n+b");
    /// ```
    pub fn array(items: Vec<String>) -> Self {
        Reply::Array(items)
    }

    /// Common response for successful operations
    pub fn ok() -> Self {
        Reply::Simple("OK".to_string())
    }

    /// Common response for PING
    pub fn pong() -> Self {
        Reply::Simple("PONG".to_string())
    }

    /// Encodes the reply as text, without the final line terminator.
    pub fn encode(&self) -> String {
        match self {
            Reply::Simple(s) => format!("{}{}", prefix::SIMPLE_STRING, s),
            Reply::Error(s) => format!("{}{}", prefix::ERROR, s),
            Reply::Integer(n) => format!("{}{}", prefix::INTEGER, n),
            Reply::Null => prefix::NULL.to_string(),
            Reply::Array(items) => {
                let mut out = format!("{}{}", prefix::ARRAY, items.len());
                for item in items {
                    out.push('\n');
                    out.push(prefix::SIMPLE_STRING);
                    out.push_str(item);
                }
                out
            }
        }
    }

    /// Serializes the reply for the wire, including the trailing `\n`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the reply into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.encode().as_bytes());
        buf.push(LF);
    }

    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Reply::Null)
    }

    /// Returns true if this value is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Attempts to extract the inner integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract the inner items.
    pub fn as_array(&self) -> Option<&[String]> {
        match self {
            Reply::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Simple(s) => write!(f, "\"{}\"", s),
            Reply::Error(s) => write!(f, "(error) {}", s),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Null => write!(f, "(nil)"),
            Reply::Array(items) => {
                if items.is_empty() {
                    write!(f, "(empty array)")
                } else {
                    for (i, item) in items.iter().enumerate() {
                        writeln!(f, "{}) \"{}\"", i + 1, item)?;
                    }
                    Ok(())
                }
            }
        }
    }
}
