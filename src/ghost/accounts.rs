//! Ghost program account structures
//!
//! # WARNING: These structures may change without notice
//! If deserialization fails for every wallet, the layouts below have
//! probably drifted from the deployed program.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use super::program::ACCOUNT_DISCRIMINATORS;
use crate::error::{Error, Result};

/// Number of per-level user counters kept by the system account
pub const LEVEL_SLOTS: usize = 7;

/// GhostUserSummary account - one per wallet that has ever minted
#[derive(Debug, Clone, BorshDeserialize, BorshSerialize)]
pub struct GhostUserSummary {
    /// Should match ACCOUNT_DISCRIMINATORS::USER_SUMMARY
    _discriminator: [u8; 8],

    /// Wallet this summary belongs to
    pub user: Pubkey,

    /// Current tier
    pub level: u8,

    /// Mints used at the current tier (0..=10)
    pub minted_times: u8,

    /// Lifetime GHOST minted by this wallet
    pub total_minted: u64,

    /// GHOST currently staked
    pub staked_amount: u64,

    /// Lifetime GHOST claimed
    pub claimed_amount: u64,

    /// Unix timestamp of the last reward checkpoint
    pub last_update_ts: i64,

    pub bump: u8,
}

impl GhostUserSummary {
    /// Deserialize from account data
    pub fn try_from_slice(data: &[u8]) -> Result<Self> {
        decode_account(data, ACCOUNT_DISCRIMINATORS::USER_SUMMARY, "GhostUserSummary")
    }

    #[cfg(test)]
    pub fn new_for_test(
        user: Pubkey,
        level: u8,
        minted_times: u8,
        staked_amount: u64,
        claimed_amount: u64,
    ) -> Self {
        Self {
            _discriminator: ACCOUNT_DISCRIMINATORS::USER_SUMMARY,
            user,
            level,
            minted_times,
            total_minted: 0,
            staked_amount,
            claimed_amount,
            last_update_ts: 0,
            bump: 255,
        }
    }
}

/// GhostSystemState account - global aggregate counters
#[derive(Debug, Clone, BorshDeserialize, BorshSerialize)]
pub struct GhostSystemState {
    /// Should match ACCOUNT_DISCRIMINATORS::SYSTEM_STATE
    _discriminator: [u8; 8],

    pub authority: Pubkey,

    /// Total GHOST minted across all wallets
    pub total_minted: u64,

    /// Number of mint transactions
    pub mint_count: u64,

    /// Total GHOST staked
    pub total_staked: u64,

    /// Total GHOST claimed as rewards
    pub total_claimed: u64,

    /// Wallets with a summary account
    pub unique_users: u64,

    /// Wallet count per tier
    pub level_users: [u64; LEVEL_SLOTS],

    pub bump: u8,
}

impl GhostSystemState {
    /// Deserialize from account data
    pub fn try_from_slice(data: &[u8]) -> Result<Self> {
        decode_account(data, ACCOUNT_DISCRIMINATORS::SYSTEM_STATE, "GhostSystemState")
    }

    #[cfg(test)]
    pub fn new_for_test(total_minted: u64, mint_count: u64, unique_users: u64) -> Self {
        Self {
            _discriminator: ACCOUNT_DISCRIMINATORS::SYSTEM_STATE,
            authority: Pubkey::default(),
            total_minted,
            mint_count,
            total_staked: 0,
            total_claimed: 0,
            unique_users,
            level_users: [0; LEVEL_SLOTS],
            bump: 255,
        }
    }
}

/// Check the discriminator, then borsh-decode without requiring the whole
/// buffer to be consumed (Anchor accounts are often over-allocated).
fn decode_account<T: BorshDeserialize>(
    data: &[u8],
    expected: [u8; 8],
    name: &str,
) -> Result<T> {
    if data.len() < 8 {
        return Err(Error::AccountDecode(format!(
            "{} account data too short",
            name
        )));
    }

    let discriminator: [u8; 8] = data[..8]
        .try_into()
        .map_err(|_| Error::AccountDecode(format!("Invalid {} discriminator", name)))?;

    if discriminator != expected {
        return Err(Error::AccountDecode(format!(
            "Wrong discriminator for {}: expected {:?}, got {:?}",
            name, expected, discriminator
        )));
    }

    let mut reader = data;
    T::deserialize(&mut reader)
        .map_err(|e| Error::AccountDecode(format!("Borsh decode of {} failed: {}", name, e)))
}
