//! Keysgroup validation
//!
//! Structural checks on a proposed keysgroup and quorum. Checks run in a
//! fixed order and the first failure wins; clients rely on that order.

use crate::core::{MultisignatureRequest, Operator};
use crate::crypto::{parse_public_key, PUBLIC_KEY_LENGTH};
use crate::multisig::config::EngineConfig;
use crate::multisig::error::MultisigError;

/// Validates registration requests; pure, no I/O
#[derive(Debug, Clone)]
pub struct KeysgroupValidator {
    max_keysgroup_size: usize,
    min_lifetime: u8,
    max_lifetime: u8,
}

impl Default for KeysgroupValidator {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl KeysgroupValidator {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_keysgroup_size: config.max_keysgroup_size,
            min_lifetime: config.min_lifetime_hours,
            max_lifetime: config.max_lifetime_hours,
        }
    }

    /// Validate `request` submitted by the holder of `sender_public_key`
    ///
    /// Order:
    /// 1. keysgroup non-empty
    /// 2. sender not in keysgroup (operator ignored)
    /// 3. every member is non-empty, uses `+` and carries a valid key
    /// 4. no duplicate keys
    /// 5. `1 <= min <= keysgroup size`
    ///
    /// followed by the size and lifetime limits.
    pub fn validate(
        &self,
        request: &MultisignatureRequest,
        sender_public_key: &str,
    ) -> Result<(), MultisigError> {
        let keysgroup = &request.keysgroup;

        if keysgroup.is_empty() {
            return Err(MultisigError::EmptyKeysgroup);
        }

        if keysgroup
            .iter()
            .any(|m| m.public_key.eq_ignore_ascii_case(sender_public_key))
        {
            return Err(MultisigError::SenderInKeysgroup);
        }

        for member in keysgroup {
            if member.is_empty() {
                return Err(MultisigError::EmptyMember);
            }
            match member.operator {
                None => return Err(MultisigError::MissingOperator),
                Some(Operator::Other(c)) => return Err(MultisigError::InvalidOperator(c)),
                Some(Operator::Add) => {}
            }
            if !is_well_formed_key(&member.public_key) {
                return Err(MultisigError::InvalidMemberKey(member.public_key.clone()));
            }
        }

        let mut keys: Vec<String> = keysgroup
            .iter()
            .map(|m| m.public_key.to_ascii_lowercase())
            .collect();
        keys.sort();
        if keys.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(MultisigError::DuplicateMember);
        }

        if request.min == 0 || request.min as usize > keysgroup.len() {
            return Err(MultisigError::InvalidMinRelativeToSize);
        }

        if keysgroup.len() > self.max_keysgroup_size {
            return Err(MultisigError::KeysgroupTooLarge {
                max: self.max_keysgroup_size,
            });
        }

        if request.lifetime < self.min_lifetime || request.lifetime > self.max_lifetime {
            return Err(MultisigError::InvalidLifetime {
                min: self.min_lifetime,
                max: self.max_lifetime,
            });
        }

        Ok(())
    }
}

fn is_well_formed_key(hex_key: &str) -> bool {
    match hex::decode(hex_key) {
        Ok(bytes) => bytes.len() == PUBLIC_KEY_LENGTH && parse_public_key(&bytes).is_ok(),
        Err(_) => false,
    }
}
