//! Fee schedule
//!
//! Registration fees depend only on keysgroup size: one base fee for the
//! sender plus one per proposed co-signer.

use serde::{Deserialize, Serialize};

/// Base multisignature fee in base units (5 coins at 10^8 units per coin)
pub const MULTISIGNATURE_FEE: u64 = 500_000_000;

/// Fee constants for transaction types handled by this engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub multisignature: u64,
}

impl FeeSchedule {
    pub fn new(multisignature: u64) -> Self {
        Self { multisignature }
    }

    /// Fee for registering a keysgroup of `keysgroup_len` members
    pub fn multisignature_fee(&self, keysgroup_len: usize) -> u64 {
        self.multisignature
            .saturating_mul(keysgroup_len as u64 + 1)
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::new(MULTISIGNATURE_FEE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_grows_with_keysgroup() {
        let schedule = FeeSchedule::default();
        assert_eq!(schedule.multisignature_fee(1), 2 * MULTISIGNATURE_FEE);
        assert_eq!(schedule.multisignature_fee(3), 4 * MULTISIGNATURE_FEE);
    }

    #[test]
    fn test_fee_saturates() {
        let schedule = FeeSchedule::new(u64::MAX);
        assert_eq!(schedule.multisignature_fee(2), u64::MAX);
    }
}
