//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external systems:
//! - `sqlite`: SQLite-backed key-value storage
//! - `file`: import/export documents on the filesystem
//! - `sanitize`: clinical value and identifier filtering for logs

pub mod file;
pub mod sanitize;
pub mod sqlite;

// Re-export storage error for lib.rs
pub use sqlite::StorageError;
