//! Typed Values
//!
//! Every key in the store holds exactly one [`Value`]. The variant *is* the
//! type tag: there is no separate "type" field that could drift out of sync
//! with the payload.
//!
//! ```text
//! Value::String("42")
//! Value::List([a, b, c])        VecDeque, O(1) push/pop at both ends
//! Value::Set({x, y})            HashSet, no order guarantee
//! Value::Hash({field: value})   HashMap, fields unique
//! ```
//!
//! Commands that need a particular type go through the typed accessors
//! (`as_list_mut`, `as_hash`, ...), which fail with
//! [`StorageError::WrongType`] when the tag doesn't match.

use crate::storage::StorageError;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// The type tag of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    List,
    Set,
    Hash,
}

impl ValueType {
    /// Name reported by the `TYPE` command.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::List => "list",
            ValueType::Set => "set",
            ValueType::Hash => "hash",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value stored under a single key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Plain text value
    String(String),
    /// Ordered sequence, duplicates allowed
    List(VecDeque<String>),
    /// Unique members, unordered
    Set(HashSet<String>),
    /// Field → value mapping
    Hash(HashMap<String, String>),
}

impl Value {
    /// Creates a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Creates an empty list, ready to be pushed to.
    pub fn empty_list() -> Self {
        Value::List(VecDeque::new())
    }

    pub fn empty_set() -> Self {
        Value::Set(HashSet::new())
    }

    pub fn empty_hash() -> Self {
        Value::Hash(HashMap::new())
    }

    /// Returns the type tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::List(_) => ValueType::List,
            Value::Set(_) => ValueType::Set,
            Value::Hash(_) => ValueType::Hash,
        }
    }

    /// True for a list, set or hash with no elements left.
    ///
    /// Strings are never "empty collections", even when they hold `""`.
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::String(_) => false,
            Value::List(l) => l.is_empty(),
            Value::Set(s) => s.is_empty(),
            Value::Hash(h) => h.is_empty(),
        }
    }

    pub fn as_string(&self) -> Result<&str, StorageError> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(StorageError::WrongType),
        }
    }

    pub fn as_list(&self) -> Result<&VecDeque<String>, StorageError> {
        match self {
            Value::List(l) => Ok(l),
            _ => Err(StorageError::WrongType),
        }
    }

    pub fn as_list_mut(&mut self) -> Result<&mut VecDeque<String>, StorageError> {
        match self {
            Value::List(l) => Ok(l),
            _ => Err(StorageError::WrongType),
        }
    }

    pub fn as_set(&self) -> Result<&HashSet<String>, StorageError> {
        match self {
            Value::Set(s) => Ok(s),
            _ => Err(StorageError::WrongType),
        }
    }

    pub fn as_set_mut(&mut self) -> Result<&mut HashSet<String>, StorageError> {
        match self {
            Value::Set(s) => Ok(s),
            _ => Err(StorageError::WrongType),
        }
    }

    pub fn as_hash(&self) -> Result<&HashMap<String, String>, StorageError> {
        match self {
            Value::Hash(h) => Ok(h),
            _ => Err(StorageError::WrongType),
        }
    }

    pub fn as_hash_mut(&mut self) -> Result<&mut HashMap<String, String>, StorageError> {
        match self {
            Value::Hash(h) => Ok(h),
            _ => Err(StorageError::WrongType),
        }
    }
}
