//! Wire Protocol
//!
//! A small line-oriented text protocol: one request per line, one reply per
//! request.
//!
//! ## Modules
//!
//! - `parser`: request tokenizer and line framing
//! - `types`: the `Reply` enum and its encoding
//!
//! ## Example
//!
//! ```
//! use linekv::protocol::{tokenize, Reply};
//!
//! let args = tokenize("LRANGE mylist 0 -1");
//! assert_eq!(args, vec!["LRANGE", "mylist", "0", "-1"]);
//!
//! let reply = Reply::array(vec!["c".into(), "b".into(), "a".into()]);
//! assert_eq!(reply.encode(), "*3\n+c\n+b\n+a");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{tokenize, LineParser, ParseError, ParseResult, MAX_LINE_LENGTH};
pub use types::Reply;
