//! Core types and shared functionality for pagelens.
//!
//! This crate provides:
//! - URL normalization and page signatures for cache keys
//! - The analysis history store and its entry builder
//! - Key-value storage backends (in-memory and SQLite)
//! - The captured JavaScript error log
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod error_log;
pub mod history;
pub mod normalize;
pub mod page;
pub mod signature;
pub mod storage;

pub use config::AppConfig;
pub use error::Error;
pub use error_log::{CapturedError, ErrorLog};
pub use history::{EntrySource, HistoryEntry, HistoryMeta, HistoryOptions, HistoryStore, SaveRequest};
pub use normalize::normalize_url;
pub use page::PageSnapshot;
pub use signature::{Signature, SignatureStrategy, compute_signature};
pub use storage::{CacheDb, KvStore, MemoryStore};
