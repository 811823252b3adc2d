//! Node snapshot persistence
//!
//! Saves ledger accounts, the pending pool and the confirmation undo log
//! so a node can restart without losing collected signatures or the
//! ability to revert recent blocks.

use crate::core::{Account, InMemoryLedger, UndoData};
use crate::multisig::{PendingEntry, TransactionStateMachine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub snapshot_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".multisig_data"),
            snapshot_file: "snapshot.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Persisted node state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub accounts: Vec<Account>,
    pub pending: Vec<PendingEntry>,
    /// Undo data of retained blocks, oldest first
    #[serde(default)]
    pub undo: Vec<UndoData>,
    pub saved_at: DateTime<Utc>,
}

impl NodeSnapshot {
    /// Capture the ledger, the pending pool and the undo log
    pub fn capture(ledger: &InMemoryLedger, machine: &TransactionStateMachine) -> Self {
        Self {
            accounts: ledger.accounts(),
            pending: machine.pool().snapshot(),
            undo: machine.gateway().undo_log(),
            saved_at: Utc::now(),
        }
    }

    /// Rebuild the ledger; pending entries are re-verified on restore
    pub fn into_parts(self) -> (InMemoryLedger, Vec<PendingEntry>, Vec<UndoData>) {
        (
            InMemoryLedger::from_accounts(self.accounts),
            self.pending,
            self.undo,
        )
    }
}

/// Snapshot storage manager
pub struct SnapshotStorage {
    config: StorageConfig,
}

impl SnapshotStorage {
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    fn snapshot_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.snapshot_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.snapshot_file, index))
    }

    /// Save a snapshot to disk
    pub fn save(&self, snapshot: &NodeSnapshot) -> Result<(), StorageError> {
        let path = self.snapshot_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self.config.data_dir.join("snapshot.tmp");
        {
            let file = fs::File::create(&temp_path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, snapshot)?;
        }

        fs::rename(&temp_path, &path)?;
        log::debug!(
            "Saved snapshot with {} accounts and {} pending to {}",
            snapshot.accounts.len(),
            snapshot.pending.len(),
            path.display()
        );
        Ok(())
    }

    /// Load the snapshot from disk
    pub fn load(&self) -> Result<NodeSnapshot, StorageError> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Err(StorageError::InvalidData(
                "Snapshot file not found".to_string(),
            ));
        }
        load_from_file(&path)
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path().exists()
    }

    /// Delete the saved snapshot
    pub fn delete(&self) -> Result<(), StorageError> {
        let path = self.snapshot_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn rotate_backups(&self) -> Result<(), StorageError> {
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }
        Ok(())
    }

    /// Load a backup; 0 is the most recent
    pub fn restore_backup(&self, backup_index: usize) -> Result<NodeSnapshot, StorageError> {
        let backup_path = self.backup_path(backup_index);
        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }
        load_from_file(&backup_path)
    }

    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }
}

/// Load a snapshot from a specific file path
pub fn load_from_file(path: &Path) -> Result<NodeSnapshot, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}
