//! Point-in-time views of the Ghost program, built fresh on every poll

use solana_sdk::pubkey::Pubkey;

use crate::ghost::{GhostSystemState, GhostUserSummary, MINTS_PER_LEVEL};

/// Aggregate counters from the system state account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemSnapshot {
    pub total_minted: u64,
    pub total_mint_events: u64,
    pub total_staked: u64,
    pub total_claimed: u64,
    pub unique_users: u64,
    /// Wallet count per level, index = level
    pub level_users: Vec<u64>,
}

impl From<&GhostSystemState> for SystemSnapshot {
    fn from(state: &GhostSystemState) -> Self {
        Self {
            total_minted: state.total_minted,
            total_mint_events: state.mint_count,
            total_staked: state.total_staked,
            total_claimed: state.total_claimed,
            unique_users: state.unique_users,
            level_users: state.level_users.to_vec(),
        }
    }
}

/// One wallet's progression state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSnapshot {
    pub wallet: Pubkey,
    /// Whether the wallet has a summary account (has ever minted)
    pub initialized: bool,
    pub level: u8,
    /// Mints used at the current level, always within 0..=10
    pub minted_at_level: u8,
    pub staked_amount: u64,
    pub claimed_amount: u64,
    pub unclaimed_estimate: u64,
    pub next_claim_time: Option<i64>,
    pub next_claim_amount: u64,
    /// GHOST held in the wallet's token account
    pub token_balance: u64,
    /// Whether the wallet's GHOST token account exists
    pub holding_account_exists: bool,
}

impl WalletSnapshot {
    /// State of a wallet that has never interacted with the program
    pub fn uninitialized(wallet: Pubkey) -> Self {
        Self {
            wallet,
            initialized: false,
            level: 0,
            minted_at_level: 0,
            staked_amount: 0,
            claimed_amount: 0,
            unclaimed_estimate: 0,
            next_claim_time: None,
            next_claim_amount: 0,
            token_balance: 0,
            holding_account_exists: false,
        }
    }

    /// Build from the on-chain summary; reward fields start at zero
    pub fn from_summary(wallet: Pubkey, summary: &GhostUserSummary) -> Self {
        Self {
            wallet,
            initialized: true,
            level: summary.level,
            minted_at_level: summary.minted_times.min(MINTS_PER_LEVEL),
            staked_amount: summary.staked_amount,
            claimed_amount: summary.claimed_amount,
            ..Self::uninitialized(wallet)
        }
    }

    pub fn can_mint(&self) -> bool {
        self.minted_at_level < MINTS_PER_LEVEL
    }

    pub fn mints_remaining(&self) -> u8 {
        MINTS_PER_LEVEL.saturating_sub(self.minted_at_level)
    }
}

/// Everything one fetch produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub system: SystemSnapshot,
    pub wallet: WalletSnapshot,
}
