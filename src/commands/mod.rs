//! Command Handler Module
//!
//! This module implements the command processing layer. It receives
//! tokenized request lines, executes them against the storage engine, and
//! returns replies.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  Tokenizer      │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Dispatch     │
//! │  - Validate     │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ StorageEngine   │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - Strings: `SET`, `GET`, `INCR`, `DECR`
//! - Lists: `LPUSH`, `RPUSH`, `LPOP`, `RPOP`, `LLEN`, `LRANGE`
//! - Sets: `SADD`, `SREM`, `SMEMBERS`, `SCARD`, `SISMEMBER`
//! - Hashes: `HSET`, `HGET`, `HDEL`, `HKEYS`, `HVALS`, `HGETALL`
//! - Keys: `DEL`, `EXISTS`, `EXPIRE`, `TTL`, `PERSIST`, `KEYS`, `TYPE`
//! - Server: `PING`, `DBSIZE`, `FLUSHALL`

pub mod error;
pub mod handler;

pub use error::{CommandError, CommandResult};
pub use handler::CommandHandler;
