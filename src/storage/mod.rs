//! Storage module for node persistence

pub mod persistence;

pub use persistence::{load_from_file, NodeSnapshot, SnapshotStorage, StorageConfig, StorageError};
