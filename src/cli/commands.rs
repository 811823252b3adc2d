//! CLI commands for the multisignature engine
//!
//! Implements all command handlers for the CLI interface.

use crate::api::{MultisigApi, SignatureRequest};
use crate::core::{AppliedBlock, ChainEvent, InMemoryLedger, Ledger, MultisignatureRequest, Transaction};
use crate::crypto::KeyPair;
use crate::multisig::{EngineConfig, KeysgroupValidator, MultisigService, TransactionStateMachine};
use crate::storage::{NodeSnapshot, SnapshotStorage, StorageConfig};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub ledger: Arc<InMemoryLedger>,
    pub machine: Arc<TransactionStateMachine>,
    pub storage: SnapshotStorage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load the node snapshot from `data_dir`, or start empty
    pub fn new(data_dir: PathBuf, config: EngineConfig) -> CliResult<Self> {
        let storage = SnapshotStorage::new(StorageConfig {
            data_dir: data_dir.clone(),
            ..Default::default()
        })?;

        let (ledger, pending, undo) = if storage.exists() {
            println!("📂 Loading existing snapshot...");
            storage.load()?.into_parts()
        } else {
            println!("🆕 Starting with an empty ledger...");
            (InMemoryLedger::new(), Vec::new(), Vec::new())
        };

        let ledger = Arc::new(ledger);
        let machine = Arc::new(TransactionStateMachine::new(config, ledger.clone()));
        machine.gateway().restore_undo(undo);
        let total = pending.len();
        let restored = machine.restore_pending(pending, Utc::now());
        if total > 0 {
            println!("   Restored {}/{} pending registrations", restored, total);
        }

        Ok(Self {
            ledger,
            machine,
            storage,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage
            .save(&NodeSnapshot::capture(&self.ledger, &self.machine))?;
        Ok(())
    }
}

/// Load the engine configuration, falling back to defaults
pub fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    match path {
        Some(path) => {
            let config = EngineConfig::from_file(path)?;
            log::info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Generate key pairs
pub fn cmd_keygen(count: u32) -> CliResult<()> {
    println!("🔐 Generated {} key pair(s):", count);
    for _ in 0..count {
        let key = KeyPair::generate();
        println!("\n   📍 Address: {}", key.address());
        println!("   🔑 Public Key: {}", key.public_key_hex());
        println!("   🗝️  Private Key: {}", key.private_key_hex());
    }
    println!("\n   ⚠️  Keep private keys secret!");
    Ok(())
}

/// Check a keysgroup without submitting anything
pub fn cmd_validate(
    config: &EngineConfig,
    sender: &str,
    min: u8,
    lifetime: u8,
    keysgroup: &[String],
) -> CliResult<()> {
    let request = MultisignatureRequest::from_raw(min, lifetime, keysgroup);
    let validator = KeysgroupValidator::from_config(config);

    println!("🔍 Validating {}-of-{} keysgroup...", min, keysgroup.len());
    match validator.validate(&request, sender) {
        Ok(()) => {
            println!("✅ Keysgroup is valid");
            println!(
                "   Fee: {}",
                config.fees.multisignature_fee(request.keysgroup.len())
            );
        }
        Err(e) => {
            println!("❌ {}", e);
        }
    }
    Ok(())
}

/// Run a full registration: submit, co-sign, confirm, persist
pub fn cmd_demo(state: &AppState, members: u8, min: u8) -> CliResult<()> {
    let api = MultisigApi::new(state.machine.clone());
    let sender = KeyPair::generate();
    let cosigners: Vec<KeyPair> = (0..members).map(|_| KeyPair::generate()).collect();

    let fee = state
        .machine
        .config()
        .fees
        .multisignature_fee(cosigners.len());
    state.ledger.credit(&sender.address(), fee.saturating_mul(2));
    println!("💰 Funded {} with {}", sender.address(), fee.saturating_mul(2));

    let keysgroup: Vec<String> = cosigners
        .iter()
        .map(|k| format!("+{}", k.public_key_hex()))
        .collect();
    let tx = Transaction::new_multisignature(
        &sender,
        MultisignatureRequest::from_raw(min, 24, &keysgroup),
        fee,
        Utc::now().timestamp(),
    )?;

    let response = api.submit_transaction(tx.clone());
    if !response.success {
        println!("❌ {}", response.message.unwrap_or_default());
        return Ok(());
    }
    println!("📤 Submitted registration {}", &tx.id[..16]);

    for (i, signer) in cosigners.iter().take(min as usize).enumerate() {
        let response = api.submit_signature(SignatureRequest {
            transaction_id: tx.id.clone(),
            public_key: signer.public_key_hex(),
            signature: tx.co_sign(signer)?,
        });
        match response.message {
            None => println!("   ✍️  Signature {}/{} accepted", i + 1, min),
            Some(message) => println!("   ❌ {}", message),
        }
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let service = MultisigService::start(state.machine.clone());
        let block = AppliedBlock::new(
            format!("demo-{}", Utc::now().timestamp_millis()),
            1,
            vec![tx.id.clone()],
        );
        service.events().send(ChainEvent::BlockApplied(block)).await?;
        service.shutdown().await;
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    match state
        .ledger
        .get_account(&sender.address())
        .and_then(|a| a.multisignature)
    {
        Some(config) => {
            println!("\n✅ Account {} is now {}", sender.address(), config.description());
            for key in &config.keys {
                println!("   └─ {}", key);
            }
        }
        None => println!("\n⏳ Registration {} is still pending", &tx.id[..16]),
    }

    state.save()?;
    println!("💾 Snapshot saved to {:?}", state.data_dir);
    Ok(())
}

/// Show accounts and the pending pool
pub fn cmd_status(state: &AppState) -> CliResult<()> {
    let accounts = state.ledger.accounts();
    println!("📒 Accounts: {}", accounts.len());
    for account in accounts.iter().take(10) {
        let kind = account
            .multisignature
            .as_ref()
            .map(|c| c.description())
            .unwrap_or_else(|| "single-key".to_string());
        println!("   {} | {} | {}", account.address, account.balance, kind);
    }

    let stats = state.machine.pool().stats();
    println!("\n📬 Pending pool");
    println!("   ├─ Registrations: {}", stats.entries);
    println!("   ├─ Ready: {}", stats.ready);
    println!("   └─ Signatures: {}", stats.signatures);

    for entry in state.machine.pool().snapshot().iter().take(10) {
        println!(
            "   {} | {}/{} | {}",
            &entry.transaction.id[..16],
            entry.signature_count(),
            entry.required(),
            entry.transaction.status
        );
    }
    Ok(())
}

/// Drop expired registrations and save
pub fn cmd_sweep(state: &AppState) -> CliResult<()> {
    let expired = state.machine.evict_expired(Utc::now());
    println!("🧹 Removed {} expired registration(s)", expired.len());
    for e in &expired {
        println!(
            "   {} expired at {} with {} signature(s)",
            &e.transaction.id[..16],
            e.expired_at.format("%Y-%m-%d %H:%M:%S"),
            e.signatures
        );
    }
    state.save()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_persists_multisignature_account() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = AppState::new(temp_dir.path().to_path_buf(), EngineConfig::default()).unwrap();
        cmd_demo(&state, 3, 2).unwrap();

        let reloaded =
            AppState::new(temp_dir.path().to_path_buf(), EngineConfig::default()).unwrap();
        let accounts = reloaded.ledger.accounts();
        assert_eq!(accounts.len(), 1);
        assert_eq!(
            accounts[0].multisignature.as_ref().map(|c| c.description()),
            Some("2-of-3".to_string())
        );
        assert_eq!(reloaded.machine.pending_count(), 0);
    }

    #[test]
    fn test_load_config_default() {
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
    }
}
