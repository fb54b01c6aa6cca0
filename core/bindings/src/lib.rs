//! Binding interfaces for OpenHub.
//!
//! A binding is a uniform handle on one storage category (relational,
//! key-value, blob) regardless of which cloud platform supplies the real
//! implementation. This crate defines the three contracts, the request-scoped
//! [`Bindings`] container and in-memory implementations used for testing and
//! local development.
//!
//! # Design Principles
//! - Contracts only: no platform-specific logic lives here
//! - Async operations: every I/O-shaped call is async
//! - Optional capabilities are default trait methods that report
//!   "not available" instead of being absent

pub mod blob;
pub mod container;
pub mod database;
pub mod kv;
pub mod memory;

pub use blob::{
    BlobBinding, BlobHttpMetadata, BlobListOptions, BlobListResult, BlobMetadata, BlobObject,
    BlobObjectSummary, BlobPutOptions,
};
pub use container::Bindings;
pub use database::{DatabaseBinding, ExecResult, PreparedStatement, QueryResult, StatementSpec};
pub use kv::{KvBinding, KvKey, KvListOptions, KvListResult, KvPutOptions};
pub use memory::{DatabaseCall, MemoryBlob, MemoryDatabase, MemoryKv};
