//! Thread-Safe Storage Engine with Expiry Support
//!
//! This module implements the key space: a map from key to typed [`Value`]
//! plus the [`ExpirationIndex`] of per-key deadlines.
//!
//! ## Design Decisions
//!
//! 1. **One lock**: the entry map and the deadline map sit behind a single
//!    `Mutex`. A command's "check expiry, then read or mutate" sequence always
//!    runs inside one critical section, so the sweeper can never remove a key
//!    between the check and the write (and a stale write can never resurrect
//!    an expired key).
//! 2. **Passive + active expiry**: every method evicts the key it touches if
//!    its deadline has passed; [`StorageEngine::cleanup_expired`] does the same
//!    for all keys and is driven by the background sweeper.
//! 3. **Typed values**: a key holds exactly one [`Value`] variant. Collection
//!    writers create an empty collection on first use and delete the key when
//!    the collection becomes empty.
//!
//! ```text
//! ┌──────────────────── Mutex<KeySpace> ────────────────────┐
//! │  entries: HashMap<String, Value>                        │
//! │  expiry:  ExpirationIndex (HashMap<String, Instant>)    │
//! └─────────────────────────────────────────────────────────┘
//!        ▲                                   ▲
//!        │ one lock per command              │ one lock per sweep
//!  CommandHandler                       ExpirySweeper
//! ```

use crate::storage::expiry::ExpirationIndex;
use crate::storage::glob::GlobPattern;
use crate::storage::value::{Value, ValueType};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::warn;

/// Longest TTL we accept; longer ones are capped so `Instant` arithmetic can't overflow.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Errors raised by typed storage operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The key holds a different type than the operation needs
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    /// The stored string is not a base-10 64-bit integer
    #[error("value is not an integer or out of range")]
    NotAnInteger,

    /// The arithmetic result doesn't fit in 64 bits
    #[error("increment or decrement would overflow")]
    Overflow,
}

/// Result type for typed storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Entries and deadlines. Only ever accessed through the engine lock.
#[derive(Debug, Default)]
struct KeySpace {
    entries: HashMap<String, Value>,
    expiry: ExpirationIndex,
    /// Keys removed because their deadline passed (passive and active)
    expired_total: u64,
}

impl KeySpace {
    /// Removes `key` and its deadline if the deadline has passed.
    ///
    /// Returns `true` if the key was expired.
    fn evict_if_expired(&mut self, key: &str, now: Instant) -> bool {
        if !self.expiry.has_passed(key, now) {
            return false;
        }
        self.remove(key);
        self.expired_total += 1;
        true
    }

    /// Removes every key whose deadline has passed. Returns how many entries went away.
    fn evict_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        for key in self.expiry.expired_keys(now) {
            self.expiry.clear_deadline(&key);
            if self.entries.remove(&key).is_some() {
                removed += 1;
            } else {
                warn!(key = %key, "Deadline recorded for a missing key; dropping it");
            }
        }
        self.expired_total += removed as u64;
        removed
    }

    /// The value under `key`, unless absent or expired.
    fn live(&mut self, key: &str) -> Option<&mut Value> {
        if self.evict_if_expired(key, Instant::now()) {
            return None;
        }
        self.entries.get_mut(key)
    }

    /// The value under `key`, created with `create` if absent or expired.
    fn live_or_insert_with(&mut self, key: &str, create: impl FnOnce() -> Value) -> &mut Value {
        self.evict_if_expired(key, Instant::now());
        self.entries.entry(key.to_string()).or_insert_with(create)
    }

    /// Removes `key` and its deadline. Returns `true` if the key was present.
    fn remove(&mut self, key: &str) -> bool {
        self.expiry.clear_deadline(key);
        self.entries.remove(key).is_some()
    }

    /// Deletes `key` if it holds a collection with nothing left in it.
    fn remove_if_empty(&mut self, key: &str) {
        if self
            .entries
            .get(key)
            .is_some_and(Value::is_empty_collection)
        {
            self.remove(key);
        }
    }
}

/// The main storage engine.
///
/// Designed to be wrapped in an `Arc` and shared by every connection task
/// and the expiry sweeper. All methods are synchronous and take the lock once.
///
/// # Example
///
/// ```
/// use linekv::storage::StorageEngine;
/// use std::time::Duration;
///
/// let engine = StorageEngine::new();
///
/// engine.set("name", "linekv");
/// assert_eq!(engine.get_string("name"), Ok(Some("linekv".to_string())));
///
/// assert_eq!(engine.rpush("queue", vec!["a".into(), "b".into()]), Ok(2));
/// assert_eq!(engine.lpop("queue"), Ok(Some("a".to_string())));
///
/// assert!(engine.expire("name", Duration::from_secs(60)));
/// assert!(engine.ttl("name").unwrap() > 0);
/// ```
pub struct StorageEngine {
    key_space: Mutex<KeySpace>,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("StorageEngine")
            .field("keys", &stats.keys)
            .field("volatile_keys", &stats.volatile_keys)
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates an empty storage engine.
    pub fn new() -> Self {
        Self {
            key_space: Mutex::new(KeySpace::default()),
        }
    }

    /// Takes the engine lock.
    ///
    /// A command that panicked while holding the lock leaves it poisoned; the
    /// key space itself is still structurally valid, so we keep serving.
    fn lock(&self) -> MutexGuard<'_, KeySpace> {
        self.key_space.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on the live value under `key`.
    ///
    /// Returns `Ok(None)` if the key is absent or expired. If `f` leaves a
    /// collection empty, the key is deleted.
    fn with_live<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut Value) -> StorageResult<T>,
    ) -> StorageResult<Option<T>> {
        let mut space = self.lock();
        let result = match space.live(key) {
            Some(value) => f(value)?,
            None => return Ok(None),
        };
        space.remove_if_empty(key);
        Ok(Some(result))
    }

    /// Runs `f` on the value under `key`, first creating it with `create` if
    /// the key is absent or expired.
    fn with_vivified<T>(
        &self,
        key: &str,
        create: impl FnOnce() -> Value,
        f: impl FnOnce(&mut Value) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut space = self.lock();
        let result = f(space.live_or_insert_with(key, create));
        space.remove_if_empty(key);
        result
    }

    // ========================================================================
    // GENERIC KEY OPERATIONS
    // ========================================================================

    /// Returns a copy of the value under `key`, or `None` if absent or expired.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().live(key).map(|value| value.clone())
    }

    /// Stores `value` under `key`, replacing whatever was there and clearing
    /// any deadline.
    pub fn put(&self, key: &str, value: Value) {
        let mut space = self.lock();
        space.expiry.clear_deadline(key);
        space.entries.insert(key.to_string(), value);
    }

    /// Stores a string value. Shorthand for `put(key, Value::String(..))`.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.put(key, Value::string(value));
    }

    /// Deletes keys together with their deadlines.
    ///
    /// Returns how many of them were present (expired keys don't count).
    pub fn delete(&self, keys: &[String]) -> usize {
        let mut space = self.lock();
        let now = Instant::now();
        keys.iter()
            .filter(|key| !space.evict_if_expired(key, now) && space.remove(key))
            .count()
    }

    /// Checks if a key exists (and is not expired).
    pub fn exists(&self, key: &str) -> bool {
        self.lock().live(key).is_some()
    }

    /// Counts how many of the given keys exist. A key named twice counts twice.
    pub fn exists_many(&self, keys: &[String]) -> usize {
        let mut space = self.lock();
        keys.iter().filter(|key| space.live(key).is_some()).count()
    }

    /// Returns the type of the value under `key`.
    pub fn type_of(&self, key: &str) -> Option<ValueType> {
        self.lock().live(key).map(|value| value.value_type())
    }

    /// Sets `key` to expire after `ttl`, replacing any previous deadline.
    ///
    /// Returns `false` if the key doesn't exist.
    pub fn expire(&self, key: &str, ttl: Duration) -> bool {
        let mut space = self.lock();
        if space.live(key).is_none() {
            return false;
        }
        space
            .expiry
            .set_deadline(key, ttl.min(MAX_TTL), Instant::now());
        true
    }

    /// Removes the deadline from `key`.
    ///
    /// Returns `true` only if the key exists and had a deadline.
    pub fn persist(&self, key: &str) -> bool {
        let mut space = self.lock();
        space.live(key).is_some() && space.expiry.clear_deadline(key)
    }

    /// Remaining time to live in whole seconds (rounded down).
    ///
    /// - `None` if the key doesn't exist
    /// - `Some(-1)` if the key exists but has no deadline
    /// - `Some(seconds)` otherwise
    pub fn ttl(&self, key: &str) -> Option<i64> {
        let mut space = self.lock();
        let now = Instant::now();
        if space.evict_if_expired(key, now) || !space.entries.contains_key(key) {
            return None;
        }
        Some(
            space
                .expiry
                .remaining(key, now)
                .map(|left| left.as_secs() as i64)
                .unwrap_or(-1),
        )
    }

    /// Returns all live keys matching a glob pattern (see [`GlobPattern`]).
    ///
    /// **Warning**: this scans the whole key space under the lock.
    pub fn keys(&self, pattern: &str) -> Vec<String> {
        let pattern = GlobPattern::new(pattern);
        let mut space = self.lock();
        space.evict_expired(Instant::now());
        space
            .entries
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect()
    }

    /// Clears all keys and all deadlines in one step.
    pub fn flush(&self) {
        let mut space = self.lock();
        space.entries.clear();
        space.expiry.clear();
    }

    /// Returns the number of live keys.
    pub fn len(&self) -> usize {
        let mut space = self.lock();
        space.evict_expired(Instant::now());
        space.entries.len()
    }

    /// Returns true if the store holds no live keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every key whose deadline has passed.
    ///
    /// This is called by the background expiry sweeper. Returns the number of
    /// keys removed.
    pub fn cleanup_expired(&self) -> usize {
        self.lock().evict_expired(Instant::now())
    }

    /// Returns a snapshot of the store's counters. Does not expire anything.
    pub fn stats(&self) -> StorageStats {
        let space = self.lock();
        StorageStats {
            keys: space.entries.len(),
            volatile_keys: space.expiry.len(),
            expired: space.expired_total,
        }
    }

    // ========================================================================
    // STRING OPERATIONS
    // ========================================================================

    /// Returns the string stored at `key`.
    pub fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        self.with_live(key, |value| Ok(value.as_string()?.to_string()))
    }

    /// Adds `delta` to the integer stored at `key`.
    ///
    /// An absent key counts as 0. The key's deadline, if any, is kept.
    /// Nothing is written on error.
    pub fn incr_by(&self, key: &str, delta: i64) -> StorageResult<i64> {
        let mut space = self.lock();

        if let Some(value) = space.live(key) {
            let current: i64 = value
                .as_string()?
                .parse()
                .map_err(|_| StorageError::NotAnInteger)?;
            let next = current.checked_add(delta).ok_or(StorageError::Overflow)?;
            *value = Value::String(next.to_string());
            return Ok(next);
        }

        space
            .entries
            .insert(key.to_string(), Value::String(delta.to_string()));
        Ok(delta)
    }

    // ========================================================================
    // LIST OPERATIONS
    // ========================================================================

    /// Pushes each element to the head of the list in turn.
    ///
    /// `lpush(k, [a, b, c])` leaves the list as `[c, b, a, ...]`.
    /// Returns the length of the list after the push.
    pub fn lpush(&self, key: &str, elements: Vec<String>) -> StorageResult<usize> {
        self.with_vivified(key, Value::empty_list, |value| {
            let list = value.as_list_mut()?;
            for element in elements {
                list.push_front(element);
            }
            Ok(list.len())
        })
    }

    /// Appends elements to the tail of the list, in order.
    pub fn rpush(&self, key: &str, elements: Vec<String>) -> StorageResult<usize> {
        self.with_vivified(key, Value::empty_list, |value| {
            let list = value.as_list_mut()?;
            list.extend(elements);
            Ok(list.len())
        })
    }

    /// Removes and returns the head of the list. Deletes the key when the list empties.
    pub fn lpop(&self, key: &str) -> StorageResult<Option<String>> {
        self.with_live(key, |value| Ok(value.as_list_mut()?.pop_front()))
            .map(Option::flatten)
    }

    /// Removes and returns the tail of the list. Deletes the key when the list empties.
    pub fn rpop(&self, key: &str) -> StorageResult<Option<String>> {
        self.with_live(key, |value| Ok(value.as_list_mut()?.pop_back()))
            .map(Option::flatten)
    }

    /// Returns the length of the list, or 0 if the key doesn't exist.
    pub fn llen(&self, key: &str) -> StorageResult<usize> {
        self.with_live(key, |value| Ok(value.as_list()?.len()))
            .map(Option::unwrap_or_default)
    }

    /// Returns the elements between `start` and `stop`, both inclusive.
    ///
    /// Negative indices count from the end. Both ends are clamped to the last
    /// element (`start` also to 0) before slicing; `start > stop` yields an
    /// empty vector.
    pub fn lrange(&self, key: &str, start: i64, stop: i64) -> StorageResult<Vec<String>> {
        self.with_live(key, |value| Ok(list_range(value.as_list()?, start, stop)))
            .map(Option::unwrap_or_default)
    }

    // ========================================================================
    // SET OPERATIONS
    // ========================================================================

    /// Adds members to the set. Returns how many were not already present.
    pub fn sadd(&self, key: &str, members: Vec<String>) -> StorageResult<usize> {
        self.with_vivified(key, Value::empty_set, |value| {
            let set = value.as_set_mut()?;
            Ok(members
                .into_iter()
                .filter(|member| set.insert(member.clone()))
                .count())
        })
    }

    /// Removes members from the set. Returns how many were present.
    pub fn srem(&self, key: &str, members: &[String]) -> StorageResult<usize> {
        self.with_live(key, |value| {
            let set = value.as_set_mut()?;
            Ok(members.iter().filter(|member| set.remove(*member)).count())
        })
        .map(Option::unwrap_or_default)
    }

    /// Returns all members of the set, in no particular order.
    pub fn smembers(&self, key: &str) -> StorageResult<Vec<String>> {
        self.with_live(key, |value| Ok(value.as_set()?.iter().cloned().collect()))
            .map(Option::unwrap_or_default)
    }

    /// Returns the number of members in the set.
    pub fn scard(&self, key: &str) -> StorageResult<usize> {
        self.with_live(key, |value| Ok(value.as_set()?.len()))
            .map(Option::unwrap_or_default)
    }

    pub fn sismember(&self, key: &str, member: &str) -> StorageResult<bool> {
        self.with_live(key, |value| Ok(value.as_set()?.contains(member)))
            .map(Option::unwrap_or_default)
    }

    // ========================================================================
    // HASH OPERATIONS
    // ========================================================================

    /// Sets field/value pairs. Returns how many fields were newly created.
    pub fn hset(&self, key: &str, pairs: Vec<(String, String)>) -> StorageResult<usize> {
        self.with_vivified(key, Value::empty_hash, |value| {
            let hash = value.as_hash_mut()?;
            Ok(pairs
                .into_iter()
                .filter(|(field, val)| hash.insert(field.clone(), val.clone()).is_none())
                .count())
        })
    }

    pub fn hget(&self, key: &str, field: &str) -> StorageResult<Option<String>> {
        self.with_live(key, |value| Ok(value.as_hash()?.get(field).cloned()))
            .map(Option::flatten)
    }

    /// Deletes fields. Returns how many existed. Deletes the key when the hash empties.
    pub fn hdel(&self, key: &str, fields: &[String]) -> StorageResult<usize> {
        self.with_live(key, |value| {
            let hash = value.as_hash_mut()?;
            Ok(fields
                .iter()
                .filter(|field| hash.remove(*field).is_some())
                .count())
        })
        .map(Option::unwrap_or_default)
    }

    pub fn hkeys(&self, key: &str) -> StorageResult<Vec<String>> {
        self.with_live(key, |value| Ok(value.as_hash()?.keys().cloned().collect()))
            .map(Option::unwrap_or_default)
    }

    pub fn hvals(&self, key: &str) -> StorageResult<Vec<String>> {
        self.with_live(key, |value| Ok(value.as_hash()?.values().cloned().collect()))
            .map(Option::unwrap_or_default)
    }

    /// Returns all field/value pairs of the hash.
    pub fn hgetall(&self, key: &str) -> StorageResult<Vec<(String, String)>> {
        self.with_live(key, |value| {
            Ok(value
                .as_hash()?
                .iter()
                .map(|(field, val)| (field.clone(), val.clone()))
                .collect())
        })
        .map(Option::unwrap_or_default)
    }
}

/// Inclusive `[start, stop]` slice with negative-index and clamping rules.
fn list_range(list: &VecDeque<String>, start: i64, stop: i64) -> Vec<String> {
    let len = list.len() as i64;
    if len == 0 {
        return Vec::new();
    }

    let start = if start < 0 { len + start } else { start };
    let stop = if stop < 0 { len + stop } else { stop };

    // A start past the end is pulled back onto the last element
    let start = start.clamp(0, len - 1);
    let stop = stop.min(len - 1);

    if start > stop {
        return Vec::new();
    }

    list.range(start as usize..=stop as usize).cloned().collect()
}

/// Store counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Entries currently stored (including any not yet swept)
    pub keys: usize,
    /// Entries that carry a deadline
    pub volatile_keys: usize,
    /// Total keys removed by passive or active expiry
    pub expired: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_set_and_get() {
        let engine = StorageEngine::new();

        engine.set("key", "value");
        assert_eq!(engine.get("key"), Some(Value::string("value")));
        assert_eq!(engine.get_string("key"), Ok(Some("value".to_string())));
    }

    #[test]
    fn test_get_nonexistent() {
        let engine = StorageEngine::new();
        assert_eq!(engine.get("nonexistent"), None);
        assert_eq!(engine.get_string("nonexistent"), Ok(None));
    }

    #[test]
    fn test_delete() {
        let engine = StorageEngine::new();

        engine.set("a", "1");
        engine.set("b", "2");
        assert_eq!(engine.delete(&strings(&["a", "b", "c"])), 2);
        assert_eq!(engine.get("a"), None);
        assert_eq!(engine.delete(&strings(&["a"])), 0);
    }

    #[test]
    fn test_exists() {
        let engine = StorageEngine::new();

        assert!(!engine.exists("key"));
        engine.set("key", "value");
        assert!(engine.exists("key"));
        assert_eq!(engine.exists_many(&strings(&["key", "key", "nope"])), 2);
    }

    #[test]
    fn test_expiry_is_passive() {
        let engine = StorageEngine::new();

        engine.set("key", "value");
        assert!(engine.expire("key", Duration::from_millis(50)));
        assert!(engine.exists("key"));

        thread::sleep(Duration::from_millis(100));

        // No sweeper is running; every accessor still treats the key as gone
        assert_eq!(engine.ttl("key"), None);
        assert_eq!(engine.get("key"), None);
        assert!(!engine.exists("key"));
        assert_eq!(engine.type_of("key"), None);
        assert_eq!(engine.stats().expired, 1);
    }

    #[test]
    fn test_expired_key_is_recreated_fresh() {
        let engine = StorageEngine::new();

        engine.set("key", "value");
        engine.expire("key", Duration::from_millis(20));
        thread::sleep(Duration::from_millis(50));

        // Writing a list over the dead string is not a type conflict
        assert_eq!(engine.rpush("key", strings(&["a"])), Ok(1));
        assert_eq!(engine.ttl("key"), Some(-1));
    }

    #[test]
    fn test_incr() {
        let engine = StorageEngine::new();

        assert_eq!(engine.incr_by("counter", 1), Ok(1));
        assert_eq!(engine.incr_by("counter", 1), Ok(2));
        assert_eq!(engine.incr_by("down", -1), Ok(-1));

        engine.set("num", "10");
        assert_eq!(engine.incr_by("num", 1), Ok(11));

        engine.set("text", "hello");
        assert_eq!(engine.incr_by("text", 1), Err(StorageError::NotAnInteger));
        assert_eq!(engine.get_string("text"), Ok(Some("hello".to_string())));

        engine.set("max", i64::MAX.to_string());
        assert_eq!(engine.incr_by("max", 1), Err(StorageError::Overflow));

        engine.rpush("list", strings(&["a"])).unwrap();
        assert_eq!(engine.incr_by("list", 1), Err(StorageError::WrongType));
    }

    #[test]
    fn test_incr_keeps_deadline_and_set_clears_it() {
        let engine = StorageEngine::new();

        engine.set("n", "1");
        engine.expire("n", Duration::from_secs(100));
        engine.incr_by("n", 1).unwrap();
        assert!(engine.ttl("n").unwrap() > 0);

        engine.set("n", "5");
        assert_eq!(engine.ttl("n"), Some(-1));
    }

    #[test]
    fn test_ttl() {
        let engine = StorageEngine::new();

        assert_eq!(engine.ttl("nonexistent"), None);

        engine.set("persistent", "value");
        assert_eq!(engine.ttl("persistent"), Some(-1));

        engine.set("expiring", "value");
        engine.expire("expiring", Duration::from_secs(100));
        let ttl = engine.ttl("expiring").unwrap();
        assert!(ttl > 0 && ttl <= 100);
    }

    #[test]
    fn test_expire_and_persist() {
        let engine = StorageEngine::new();

        assert!(!engine.expire("missing", Duration::from_secs(60)));

        engine.set("key", "value");
        assert!(engine.expire("key", Duration::from_secs(60)));
        assert!(engine.ttl("key").unwrap() > 0);

        assert!(engine.persist("key"));
        assert!(!engine.persist("key"));
        assert_eq!(engine.ttl("key"), Some(-1));
    }

    #[test]
    fn test_huge_ttl_is_capped() {
        let engine = StorageEngine::new();

        engine.set("key", "value");
        assert!(engine.expire("key", Duration::from_secs(u64::MAX)));
        assert!(engine.ttl("key").unwrap() > 0);
    }

    #[test]
    fn test_keys_pattern() {
        let engine = StorageEngine::new();

        engine.set("hello", "1");
        engine.set("hallo", "2");
        engine.set("hxllo", "3");
        engine.set("world", "4");
        engine.sadd("hillo", strings(&["m"])).unwrap();

        assert_eq!(engine.keys("*").len(), 5);
        assert_eq!(engine.keys("h*llo").len(), 4);
        assert_eq!(engine.keys("h?llo").len(), 4);

        let mut matched = engine.keys("w*");
        matched.sort();
        assert_eq!(matched, strings(&["world"]));
    }

    #[test]
    fn test_keys_skips_expired() {
        let engine = StorageEngine::new();

        engine.set("live", "1");
        engine.set("dead", "2");
        engine.expire("dead", Duration::from_millis(10));
        thread::sleep(Duration::from_millis(30));

        assert_eq!(engine.keys("*"), strings(&["live"]));
    }

    #[test]
    fn test_flush() {
        let engine = StorageEngine::new();

        engine.set("key1", "value1");
        engine.rpush("key2", strings(&["a"])).unwrap();
        engine.expire("key1", Duration::from_secs(60));

        assert_eq!(engine.len(), 2);

        engine.flush();

        assert!(engine.is_empty());
        assert_eq!(engine.stats().volatile_keys, 0);
    }

    #[test]
    fn test_cleanup_expired() {
        let engine = StorageEngine::new();

        engine.set("key1", "value1");
        engine.set("key2", "value2");
        engine.set("key3", "value3");
        engine.expire("key1", Duration::from_millis(10));
        engine.expire("key2", Duration::from_millis(10));

        thread::sleep(Duration::from_millis(50));

        assert_eq!(engine.cleanup_expired(), 2);
        assert_eq!(engine.len(), 1);
        assert!(engine.exists("key3"));
        assert_eq!(engine.stats().volatile_keys, 0);
    }

    #[test]
    fn test_type_of() {
        let engine = StorageEngine::new();

        assert_eq!(engine.type_of("nonexistent"), None);

        engine.set("s", "value");
        engine.rpush("l", strings(&["a"])).unwrap();
        engine.sadd("z", strings(&["a"])).unwrap();
        engine
            .hset("h", vec![("f".to_string(), "v".to_string())])
            .unwrap();

        assert_eq!(engine.type_of("s"), Some(ValueType::String));
        assert_eq!(engine.type_of("l"), Some(ValueType::List));
        assert_eq!(engine.type_of("z"), Some(ValueType::Set));
        assert_eq!(engine.type_of("h"), Some(ValueType::Hash));
    }

    #[test]
    fn test_concurrent_access() {
        let engine = Arc::new(StorageEngine::new());
        let mut handles = vec![];

        for i in 0..10 {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let key = format!("key-{}-{}", i, j);
                    engine.set(&key, "value");
                    engine.get(&key);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.len(), 1000);
    }

    #[test]
    fn test_concurrent_incr_loses_no_updates() {
        let engine = Arc::new(StorageEngine::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                for _ in 0..250 {
                    engine.incr_by("counter", 1).unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.get_string("counter"), Ok(Some("2000".to_string())));
    }

    // ========================================================================
    // List Operation Tests
    // ========================================================================

    #[test]
    fn test_lpush_rpush() {
        let engine = StorageEngine::new();

        assert_eq!(engine.lpush("mylist", strings(&["a", "b", "c"])), Ok(3));
        assert_eq!(
            engine.lrange("mylist", 0, -1),
            Ok(strings(&["c", "b", "a"]))
        );

        assert_eq!(engine.rpush("mylist", strings(&["x", "y"])), Ok(5));
        assert_eq!(
            engine.lrange("mylist", 0, -1),
            Ok(strings(&["c", "b", "a", "x", "y"]))
        );

        assert_eq!(engine.rpush("other", strings(&["x", "y", "z"])), Ok(3));
        assert_eq!(engine.lrange("other", 0, -1), Ok(strings(&["x", "y", "z"])));
    }

    #[test]
    fn test_lpop_rpop() {
        let engine = StorageEngine::new();

        assert_eq!(engine.lpop("mylist"), Ok(None));
        assert_eq!(engine.rpop("mylist"), Ok(None));

        engine.rpush("mylist", strings(&["a", "b", "c"])).unwrap();

        assert_eq!(engine.lpop("mylist"), Ok(Some("a".to_string())));
        assert_eq!(engine.llen("mylist"), Ok(2));
        assert_eq!(engine.rpop("mylist"), Ok(Some("c".to_string())));
        assert_eq!(engine.llen("mylist"), Ok(1));
        assert_eq!(engine.lpop("mylist"), Ok(Some("b".to_string())));

        // List should be auto-deleted when empty
        assert!(!engine.exists("mylist"));
        assert_eq!(engine.llen("mylist"), Ok(0));
    }

    #[test]
    fn test_emptied_list_drops_its_deadline() {
        let engine = StorageEngine::new();

        engine.rpush("l", strings(&["a"])).unwrap();
        engine.expire("l", Duration::from_millis(30));
        engine.rpop("l").unwrap();
        assert_eq!(engine.stats().volatile_keys, 0);

        engine.rpush("l", strings(&["b"])).unwrap();
        thread::sleep(Duration::from_millis(60));
        assert_eq!(engine.lrange("l", 0, -1), Ok(strings(&["b"])));
    }

    #[test]
    fn test_lrange() {
        let engine = StorageEngine::new();
        engine
            .rpush("mylist", strings(&["a", "b", "c", "d", "e"]))
            .unwrap();

        assert_eq!(
            engine.lrange("mylist", 0, -1),
            Ok(strings(&["a", "b", "c", "d", "e"]))
        );
        assert_eq!(engine.lrange("mylist", 1, 3), Ok(strings(&["b", "c", "d"])));
        assert_eq!(engine.lrange("mylist", -3, -1), Ok(strings(&["c", "d", "e"])));

        // Stop past the end clamps to the last element
        assert_eq!(
            engine.lrange("mylist", 0, 100),
            Ok(strings(&["a", "b", "c", "d", "e"]))
        );
        // Start before the beginning clamps to 0
        assert_eq!(engine.lrange("mylist", -100, 1), Ok(strings(&["a", "b"])));

        assert_eq!(engine.lrange("mylist", 3, 1), Ok(vec![]));
        // Start past the end lands on the last element
        assert_eq!(engine.lrange("mylist", 5, 10), Ok(strings(&["e"])));
        assert_eq!(engine.lrange("mylist", 9, -1), Ok(strings(&["e"])));
        assert_eq!(engine.lrange("mylist", 7, 2), Ok(vec![]));
        assert_eq!(engine.lrange("mylist", 0, -100), Ok(vec![]));
        assert_eq!(engine.lrange("missing", 0, -1), Ok(vec![]));
    }

    #[test]
    fn test_wrong_type_leaves_value_untouched() {
        let engine = StorageEngine::new();

        engine.set("k", "v");
        assert_eq!(
            engine.lpush("k", strings(&["a"])),
            Err(StorageError::WrongType)
        );
        assert_eq!(engine.sadd("k", strings(&["a"])), Err(StorageError::WrongType));
        assert_eq!(
            engine.hset("k", vec![("f".to_string(), "v".to_string())]),
            Err(StorageError::WrongType)
        );
        assert_eq!(engine.llen("k"), Err(StorageError::WrongType));
        assert_eq!(engine.get_string("k"), Ok(Some("v".to_string())));

        engine.rpush("l", strings(&["a"])).unwrap();
        assert_eq!(engine.get_string("l"), Err(StorageError::WrongType));
        assert_eq!(engine.smembers("l"), Err(StorageError::WrongType));
        assert_eq!(engine.hget("l", "f"), Err(StorageError::WrongType));
    }

    // ========================================================================
    // Set and Hash Operation Tests
    // ========================================================================

    #[test]
    fn test_set_operations() {
        let engine = StorageEngine::new();

        assert_eq!(engine.sadd("s", strings(&["a", "b", "a"])), Ok(2));
        assert_eq!(engine.sadd("s", strings(&["a"])), Ok(0));
        assert_eq!(engine.scard("s"), Ok(2));
        assert_eq!(engine.sismember("s", "a"), Ok(true));
        assert_eq!(engine.sismember("s", "z"), Ok(false));
        assert_eq!(engine.sismember("missing", "a"), Ok(false));

        let mut members = engine.smembers("s").unwrap();
        members.sort();
        assert_eq!(members, strings(&["a", "b"]));

        assert_eq!(engine.srem("s", &strings(&["a", "z"])), Ok(1));
        assert_eq!(engine.srem("s", &strings(&["b"])), Ok(1));
        assert!(!engine.exists("s"));
        assert_eq!(engine.srem("s", &strings(&["b"])), Ok(0));
    }

    #[test]
    fn test_hash_operations() {
        let engine = StorageEngine::new();
        let pair = |f: &str, v: &str| (f.to_string(), v.to_string());

        assert_eq!(
            engine.hset("h", vec![pair("name", "John"), pair("age", "30")]),
            Ok(2)
        );
        assert_eq!(
            engine.hset("h", vec![pair("age", "31"), pair("city", "Oslo")]),
            Ok(1)
        );
        assert_eq!(engine.hget("h", "age"), Ok(Some("31".to_string())));
        assert_eq!(engine.hget("h", "nope"), Ok(None));
        assert_eq!(engine.hget("missing", "age"), Ok(None));

        let mut fields = engine.hkeys("h").unwrap();
        fields.sort();
        assert_eq!(fields, strings(&["age", "city", "name"]));

        let mut values = engine.hvals("h").unwrap();
        values.sort();
        assert_eq!(values, strings(&["31", "John", "Oslo"]));

        let mut all = engine.hgetall("h").unwrap();
        all.sort();
        assert_eq!(
            all,
            vec![pair("age", "31"), pair("city", "Oslo"), pair("name", "John")]
        );

        assert_eq!(engine.hdel("h", &strings(&["age", "nope"])), Ok(1));
        assert_eq!(engine.hdel("h", &strings(&["city", "name"])), Ok(2));
        assert!(!engine.exists("h"));
    }
}
