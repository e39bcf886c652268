//! # Infrastructure Adapters
//!
//! Implementations of the record store interface.

pub mod filesystem_records;
pub mod memory_records;

pub use filesystem_records::FilesystemRecordStore;
pub use memory_records::InMemoryRecordStore;
