//! Player progress model.
//!
//! # Invariants
//! - `level` and `current_stage` start at 1 and never drop to 0.
//! - Every entry in `unlocked_areas` is a valid stage number (>= 1).

use crate::model::account::{AccountId, ModelValidationError};
use serde::{Deserialize, Serialize};

pub const STARTER_LEVEL: u32 = 1;
pub const STARTER_XP: u64 = 0;
pub const STARTER_COINS: u64 = 100;
pub const STARTER_STAGE: u32 = 1;

/// Game progress owned one-to-one by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub account_id: AccountId,
    pub level: u32,
    pub xp: u64,
    pub coins: u64,
    pub current_stage: u32,
    /// Stage numbers in unlock order.
    pub unlocked_areas: Vec<u32>,
}

impl Progress {
    /// Fresh-account progress: level 1, no xp, 100 coins, stage 1 unlocked.
    pub fn starter(account_id: AccountId) -> Self {
        Self {
            account_id,
            level: STARTER_LEVEL,
            xp: STARTER_XP,
            coins: STARTER_COINS,
            current_stage: STARTER_STAGE,
            unlocked_areas: vec![STARTER_STAGE],
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.level == 0 {
            return Err(ModelValidationError::ZeroOrdinal("level"));
        }
        if self.current_stage == 0 {
            return Err(ModelValidationError::ZeroOrdinal("current_stage"));
        }
        if self.unlocked_areas.contains(&0) {
            return Err(ModelValidationError::ZeroOrdinal("unlocked_areas"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Progress;
    use crate::model::account::ModelValidationError;

    #[test]
    fn starter_progress_is_valid_and_unlocks_first_stage() {
        let progress = Progress::starter(3);
        assert_eq!(progress.validate(), Ok(()));
        assert_eq!(progress.unlocked_areas, vec![1]);
    }

    #[test]
    fn zero_level_is_rejected() {
        let mut progress = Progress::starter(3);
        progress.level = 0;
        assert_eq!(
            progress.validate(),
            Err(ModelValidationError::ZeroOrdinal("level"))
        );
    }
}
