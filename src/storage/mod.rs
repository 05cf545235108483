//! Storage Engine Module
//!
//! This module provides the typed key space, its expiration index and the
//! background expiry sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │ Mutex<KeySpace>                                       │  │
//! │  │   entries: key → Value {String|List|Set|Hash}         │  │
//! │  │   expiry:  ExpirationIndex (key → deadline)           │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │
//!              ┌─────────────┴─────────────┐
//!              │     ExpirySweeper         │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use linekv::storage::{StorageEngine, StorageError};
//! use std::time::Duration;
//!
//! let engine = StorageEngine::new();
//!
//! engine.set("greeting", "hello");
//! assert_eq!(engine.get_string("greeting"), Ok(Some("hello".to_string())));
//!
//! // A string key can't be used as a list
//! assert_eq!(
//!     engine.lpush("greeting", vec!["x".to_string()]),
//!     Err(StorageError::WrongType)
//! );
//!
//! engine.expire("greeting", Duration::from_secs(3600));
//! ```

pub mod engine;
pub mod expiry;
pub mod glob;
pub mod value;

// Re-export commonly used types
pub use engine::{StorageEngine, StorageError, StorageResult, StorageStats};
pub use expiry::{start_expiry_sweeper, ExpirationIndex, ExpiryConfig, ExpirySweeper};
pub use glob::GlobPattern;
pub use value::{Value, ValueType};
