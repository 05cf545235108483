//! Command Handler Module
//!
//! This module implements every supported command. It takes a tokenized
//! request, validates it, runs it against the storage engine and turns the
//! outcome into a [`Reply`].
//!
//! ## Supported Commands
//!
//! ### String Commands
//! - `SET key value` - Set a key (drops any TTL)
//! - `GET key` - Get a string value
//! - `INCR key` / `DECR key` - Add or subtract one
//!
//! ### List Commands
//! - `LPUSH key element [element ...]` - Push each element to the head
//! - `RPUSH key element [element ...]` - Append elements to the tail
//! - `LPOP key` / `RPOP key` - Remove and return the head / tail
//! - `LLEN key` - Length of a list
//! - `LRANGE key start stop` - Inclusive range, negative indices from the end
//!
//! ### Set Commands
//! - `SADD key member [member ...]`, `SREM key member [member ...]`
//! - `SMEMBERS key`, `SCARD key`, `SISMEMBER key member`
//!
//! ### Hash Commands
//! - `HSET key field value [field value ...]`, `HGET key field`
//! - `HDEL key field [field ...]`
//! - `HKEYS key`, `HVALS key`, `HGETALL key`
//!
//! ### Key Commands
//! - `DEL key [key ...]`, `EXISTS key [key ...]`
//! - `EXPIRE key seconds`, `TTL key`, `PERSIST key`
//! - `KEYS pattern`, `TYPE key`
//!
//! ### Server Commands
//! - `PING [message]`, `DBSIZE`, `FLUSHALL`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ tokenize()  │───>│ dispatch()  │───>│  cmd_xxx()  │      │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘      │
//! │                                               │             │
//! │                                               ▼             │
//! │                                      StorageEngine          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers return `CommandResult<Reply>`; [`CommandHandler::execute`] turns
//! errors (and panics) into `-ERR ...` replies so a bad command never takes
//! the connection down.

use crate::commands::error::{CommandError, CommandResult};
use crate::protocol::{tokenize, Reply};
use crate::storage::StorageEngine;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, trace};

/// Handles commands by dispatching them to the appropriate handlers.
///
/// Cheap to clone: every connection gets its own handler sharing one engine.
#[derive(Clone)]
pub struct CommandHandler {
    storage: Arc<StorageEngine>,
}

impl CommandHandler {
    /// Creates a new command handler with the given storage engine.
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }

    /// The engine this handler executes against.
    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    /// Tokenizes and executes one request line.
    ///
    /// # Example
    ///
    /// ```
    /// use linekv::commands::CommandHandler;
    /// use linekv::storage::StorageEngine;
    /// use std::sync::Arc;
    ///
    /// let handler = CommandHandler::new(Arc::new(StorageEngine::new()));
    /// assert_eq!(handler.execute_line("SET name linekv").encode(), "+OK");
    /// assert_eq!(handler.execute_line("GET name").encode(), "+linekv");
    /// ```
    pub fn execute_line(&self, line: &str) -> Reply {
        self.execute(&tokenize(line))
    }

    /// Executes a tokenized command and returns the reply.
    ///
    /// Never panics: failures of any kind come back as error replies.
    pub fn execute(&self, args: &[String]) -> Reply {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.try_execute(args)))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                error!(error = %message, "Command handler panicked");
                Err(CommandError::Internal(message))
            });

        match result {
            Ok(reply) => reply,
            Err(e) => {
                trace!(error = %e, "Command failed");
                Reply::error(e.to_string())
            }
        }
    }

    fn try_execute(&self, args: &[String]) -> CommandResult<Reply> {
        let (name, args) = args.split_first().ok_or(CommandError::EmptyCommand)?;
        let cmd = name.to_uppercase();
        trace!(command = %cmd, args = args.len(), "Dispatching command");
        self.dispatch(&cmd, args)
    }

    /// Dispatches a command to its handler.
    fn dispatch(&self, cmd: &str, args: &[String]) -> CommandResult<Reply> {
        match cmd {
            // String commands
            "SET" => self.cmd_set(args),
            "GET" => self.cmd_get(args),
            "INCR" => self.cmd_incr(args, "incr", 1),
            "DECR" => self.cmd_incr(args, "decr", -1),

            // List commands
            "LPUSH" => self.cmd_lpush(args),
            "RPUSH" => self.cmd_rpush(args),
            "LPOP" => self.cmd_lpop(args),
            "RPOP" => self.cmd_rpop(args),
            "LLEN" => self.cmd_llen(args),
            "LRANGE" => self.cmd_lrange(args),

            // Set commands
            "SADD" => self.cmd_sadd(args),
            "SREM" => self.cmd_srem(args),
            "SMEMBERS" => self.cmd_smembers(args),
            "SCARD" => self.cmd_scard(args),
            "SISMEMBER" => self.cmd_sismember(args),

            // Hash commands
            "HSET" => self.cmd_hset(args),
            "HGET" => self.cmd_hget(args),
            "HDEL" => self.cmd_hdel(args),
            "HKEYS" => self.cmd_hkeys(args),
            "HVALS" => self.cmd_hvals(args),
            "HGETALL" => self.cmd_hgetall(args),

            // Key commands
            "DEL" => self.cmd_del(args),
            "EXISTS" => self.cmd_exists(args),
            "EXPIRE" => self.cmd_expire(args),
            "TTL" => self.cmd_ttl(args),
            "PERSIST" => self.cmd_persist(args),
            "KEYS" => self.cmd_keys(args),
            "TYPE" => self.cmd_type(args),

            // Server commands
            "PING" => self.cmd_ping(args),
            "DBSIZE" => self.cmd_dbsize(args),
            "FLUSHALL" => self.cmd_flushall(args),

            _ => Err(CommandError::UnknownCommand(cmd.to_string())),
        }
    }

    // ========================================================================
    // String Commands
    // ========================================================================

    /// SET key value
    fn cmd_set(&self, args: &[String]) -> CommandResult<Reply> {
        arity("set", args.len() == 2)?;
        self.storage.set(&args[0], args[1].as_str());
        Ok(Reply::ok())
    }

    /// GET key
    fn cmd_get(&self, args: &[String]) -> CommandResult<Reply> {
        arity("get", args.len() == 1)?;
        Ok(match self.storage.get_string(&args[0])? {
            Some(value) => Reply::simple(value),
            None => Reply::null(),
        })
    }

    /// INCR key / DECR key
    fn cmd_incr(&self, args: &[String], name: &str, delta: i64) -> CommandResult<Reply> {
        arity(name, args.len() == 1)?;
        let value = self.storage.incr_by(&args[0], delta)?;
        Ok(Reply::integer(value))
    }

    // ========================================================================
    // List Commands
    // ========================================================================

    /// LPUSH key element [element ...]
    fn cmd_lpush(&self, args: &[String]) -> CommandResult<Reply> {
        arity("lpush", args.len() >= 2)?;
        let len = self.storage.lpush(&args[0], args[1..].to_vec())?;
        Ok(Reply::count(len))
    }

    /// RPUSH key element [element ...]
    fn cmd_rpush(&self, args: &[String]) -> CommandResult<Reply> {
        arity("rpush", args.len() >= 2)?;
        let len = self.storage.rpush(&args[0], args[1..].to_vec())?;
        Ok(Reply::count(len))
    }

    /// LPOP key
    fn cmd_lpop(&self, args: &[String]) -> CommandResult<Reply> {
        arity("lpop", args.len() == 1)?;
        Ok(optional(self.storage.lpop(&args[0])?))
    }

    /// RPOP key
    fn cmd_rpop(&self, args: &[String]) -> CommandResult<Reply> {
        arity("rpop", args.len() == 1)?;
        Ok(optional(self.storage.rpop(&args[0])?))
    }

    /// LLEN key
    fn cmd_llen(&self, args: &[String]) -> CommandResult<Reply> {
        arity("llen", args.len() == 1)?;
        Ok(Reply::count(self.storage.llen(&args[0])?))
    }

    /// LRANGE key start stop
    fn cmd_lrange(&self, args: &[String]) -> CommandResult<Reply> {
        arity("lrange", args.len() == 3)?;
        let start = parse_integer(&args[1])?;
        let stop = parse_integer(&args[2])?;
        Ok(Reply::array(self.storage.lrange(&args[0], start, stop)?))
    }

    // ========================================================================
    // Set Commands
    // ========================================================================

    /// SADD key member [member ...]
    fn cmd_sadd(&self, args: &[String]) -> CommandResult<Reply> {
        arity("sadd", args.len() >= 2)?;
        let added = self.storage.sadd(&args[0], args[1..].to_vec())?;
        Ok(Reply::count(added))
    }

    /// SREM key member [member ...]
    fn cmd_srem(&self, args: &[String]) -> CommandResult<Reply> {
        arity("srem", args.len() >= 2)?;
        Ok(Reply::count(self.storage.srem(&args[0], &args[1..])?))
    }

    /// SMEMBERS key
    fn cmd_smembers(&self, args: &[String]) -> CommandResult<Reply> {
        arity("smembers", args.len() == 1)?;
        Ok(Reply::array(self.storage.smembers(&args[0])?))
    }

    /// SCARD key
    fn cmd_scard(&self, args: &[String]) -> CommandResult<Reply> {
        arity("scard", args.len() == 1)?;
        Ok(Reply::count(self.storage.scard(&args[0])?))
    }

    /// SISMEMBER key member
    fn cmd_sismember(&self, args: &[String]) -> CommandResult<Reply> {
        arity("sismember", args.len() == 2)?;
        let is_member = self.storage.sismember(&args[0], &args[1])?;
        Ok(Reply::integer(i64::from(is_member)))
    }

    // ========================================================================
    // Hash Commands
    // ========================================================================

    /// HSET key field value [field value ...]
    fn cmd_hset(&self, args: &[String]) -> CommandResult<Reply> {
        arity("hset", args.len() >= 3 && (args.len() - 1) % 2 == 0)?;
        let pairs = args[1..]
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();
        Ok(Reply::count(self.storage.hset(&args[0], pairs)?))
    }

    /// HGET key field
    fn cmd_hget(&self, args: &[String]) -> CommandResult<Reply> {
        arity("hget", args.len() == 2)?;
        Ok(optional(self.storage.hget(&args[0], &args[1])?))
    }

    /// HDEL key field [field ...]
    fn cmd_hdel(&self, args: &[String]) -> CommandResult<Reply> {
        arity("hdel", args.len() >= 2)?;
        Ok(Reply::count(self.storage.hdel(&args[0], &args[1..])?))
    }

    /// HKEYS key
    fn cmd_hkeys(&self, args: &[String]) -> CommandResult<Reply> {
        arity("hkeys", args.len() == 1)?;
        Ok(Reply::array(self.storage.hkeys(&args[0])?))
    }

    /// HVALS key
    fn cmd_hvals(&self, args: &[String]) -> CommandResult<Reply> {
        arity("hvals", args.len() == 1)?;
        Ok(Reply::array(self.storage.hvals(&args[0])?))
    }

    /// HGETALL key
    fn cmd_hgetall(&self, args: &[String]) -> CommandResult<Reply> {
        arity("hgetall", args.len() == 1)?;
        let items = self
            .storage
            .hgetall(&args[0])?
            .into_iter()
            .flat_map(|(field, value)| [field, value])
            .collect();
        Ok(Reply::array(items))
    }

    // ========================================================================
    // Key Commands
    // ========================================================================

    /// DEL key [key ...]
    fn cmd_del(&self, args: &[String]) -> CommandResult<Reply> {
        arity("del", !args.is_empty())?;
        Ok(Reply::count(self.storage.delete(args)))
    }

    /// EXISTS key [key ...]
    fn cmd_exists(&self, args: &[String]) -> CommandResult<Reply> {
        arity("exists", !args.is_empty())?;
        Ok(Reply::count(self.storage.exists_many(args)))
    }

    /// EXPIRE key seconds
    ///
    /// A non-positive TTL deletes the key right away.
    fn cmd_expire(&self, args: &[String]) -> CommandResult<Reply> {
        arity("expire", args.len() == 2)?;
        let seconds = parse_integer(&args[1])?;

        let existed = match u64::try_from(seconds) {
            Ok(secs) if secs > 0 => self
                .storage
                .expire(&args[0], Duration::from_secs(secs)),
            _ => self.storage.delete(&args[..1]) > 0,
        };

        Ok(Reply::integer(i64::from(existed)))
    }

    /// TTL key
    fn cmd_ttl(&self, args: &[String]) -> CommandResult<Reply> {
        arity("ttl", args.len() == 1)?;
        Ok(Reply::integer(self.storage.ttl(&args[0]).unwrap_or(-2)))
    }

    /// PERSIST key
    fn cmd_persist(&self, args: &[String]) -> CommandResult<Reply> {
        arity("persist", args.len() == 1)?;
        Ok(Reply::integer(i64::from(self.storage.persist(&args[0]))))
    }

    /// KEYS pattern
    fn cmd_keys(&self, args: &[String]) -> CommandResult<Reply> {
        arity("keys", args.len() == 1)?;
        Ok(Reply::array(self.storage.keys(&args[0])))
    }

    /// TYPE key
    fn cmd_type(&self, args: &[String]) -> CommandResult<Reply> {
        arity("type", args.len() == 1)?;
        let name = self
            .storage
            .type_of(&args[0])
            .map(|t| t.as_str())
            .unwrap_or("none");
        Ok(Reply::simple(name))
    }

    // ========================================================================
    // Server Commands
    // ========================================================================

    /// PING [message]
    fn cmd_ping(&self, args: &[String]) -> CommandResult<Reply> {
        arity("ping", args.len() <= 1)?;
        Ok(match args.first() {
            Some(message) => Reply::simple(message.as_str()),
            None => Reply::pong(),
        })
    }

    /// DBSIZE
    fn cmd_dbsize(&self, args: &[String]) -> CommandResult<Reply> {
        arity("dbsize", args.is_empty())?;
        Ok(Reply::count(self.storage.len()))
    }

    /// FLUSHALL
    fn cmd_flushall(&self, args: &[String]) -> CommandResult<Reply> {
        arity("flushall", args.is_empty())?;
        self.storage.flush();
        debug!("Key space flushed");
        Ok(Reply::ok())
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Fails with an arity error for `name` unless `valid` holds.
fn arity(name: &str, valid: bool) -> CommandResult<()> {
    if valid {
        Ok(())
    } else {
        Err(CommandError::Arity(name.to_string()))
    }
}

/// Parses a base-10 integer argument.
fn parse_integer(arg: &str) -> CommandResult<i64> {
    arg.parse().map_err(|_| CommandError::NotAnInteger)
}

/// `+value`, or `$-1` when there is nothing to return.
fn optional(value: Option<String>) -> Reply {
    value.map(Reply::simple).unwrap_or_else(Reply::null)
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "internal error".to_string()
    }
}
