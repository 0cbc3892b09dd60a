//! Decision engine
//!
//! Maps a wallet snapshot to the single next action. Pure: no network,
//! no signing, no hidden state, so the same snapshot always yields the
//! same decision.

use std::fmt;

use super::tiers::TierTable;
use crate::config::ClaimConfig;
use crate::state::WalletSnapshot;

/// Why a wallet has nothing to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    /// Mint allowance used up at the terminal tier
    MaxTierReached,
}

impl fmt::Display for WaitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitReason::MaxTierReached => write!(f, "max tier reached"),
        }
    }
}

/// The next action for a wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Mint,
    Upgrade { required_stake: u64 },
    Wait { reason: WaitReason },
    InsufficientFunds { shortfall: u64 },
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Mint => write!(f, "mint"),
            Decision::Upgrade { required_stake } => write!(f, "upgrade (stake {})", required_stake),
            Decision::Wait { reason } => write!(f, "wait ({})", reason),
            Decision::InsufficientFunds { shortfall } => {
                write!(f, "insufficient funds (short {})", shortfall)
            }
        }
    }
}

impl Decision {
    /// Whether this decision sends a transaction
    pub fn is_actionable(&self) -> bool {
        matches!(self, Decision::Mint | Decision::Upgrade { .. })
    }
}

/// Decide the next action for a wallet
pub fn decide(snapshot: &WalletSnapshot, tiers: &TierTable) -> Decision {
    if snapshot.can_mint() {
        return Decision::Mint;
    }

    let Some(required) = tiers.threshold_to_next(snapshot.level) else {
        return Decision::Wait {
            reason: WaitReason::MaxTierReached,
        };
    };

    if snapshot.token_balance >= required {
        Decision::Upgrade {
            required_stake: required,
        }
    } else {
        Decision::InsufficientFunds {
            shortfall: required - snapshot.token_balance,
        }
    }
}

/// Amount to claim while the wallet is otherwise idle, if worth a transaction
pub fn claim_plan(snapshot: &WalletSnapshot, config: &ClaimConfig) -> Option<u64> {
    if !config.auto_claim || !snapshot.initialized {
        return None;
    }

    if snapshot.unclaimed_estimate > 0 && snapshot.unclaimed_estimate >= config.min_claim_amount {
        Some(snapshot.unclaimed_estimate)
    } else {
        None
    }
}
