//! Tier table
//!
//! Per-level constants published by the Ghost program. All amounts are
//! GHOST base units (8 decimals); reward rates are base units per second.

use crate::error::{Error, Result};

/// One tier of the progression table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierEntry {
    /// Cumulative GHOST supply at which this tier opens
    pub cumulative_supply: u64,
    /// Staking reward per second while at this tier
    pub reward_rate_per_second: u64,
    /// Stake an upgrade into this tier requires
    pub stake_threshold: u64,
}

const fn tier(cumulative_supply: u64, reward_rate_per_second: u64, stake_threshold: u64) -> TierEntry {
    TierEntry {
        cumulative_supply,
        reward_rate_per_second,
        stake_threshold,
    }
}

const UNIT: u64 = 100_000_000;

/// Published tier constants, index = level
pub const PUBLISHED_TIERS: [TierEntry; 7] = [
    tier(0, 0, 0),
    tier(1_000_000 * UNIT, 1_000, 20 * UNIT),
    tier(3_000_000 * UNIT, 2_500, 50 * UNIT),
    tier(6_000_000 * UNIT, 5_000, 110 * UNIT),
    tier(10_000_000 * UNIT, 10_000, 230 * UNIT),
    tier(15_000_000 * UNIT, 20_000, 470 * UNIT),
    tier(21_000_000 * UNIT, 40_000, 950 * UNIT),
];

/// Immutable tier table, built once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierTable {
    entries: Vec<TierEntry>,
}

impl TierTable {
    /// Build a table, rejecting empty tables and decreasing thresholds
    pub fn new(entries: Vec<TierEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::Config("Tier table is empty".to_string()));
        }
        if entries.len() > u8::MAX as usize {
            return Err(Error::Config(format!(
                "Tier table has {} levels, max is {}",
                entries.len(),
                u8::MAX
            )));
        }

        for (level, pair) in entries.windows(2).enumerate() {
            if pair[1].stake_threshold < pair[0].stake_threshold {
                return Err(Error::Config(format!(
                    "Stake threshold decreases from level {} to {}",
                    level,
                    level + 1
                )));
            }
        }

        Ok(Self { entries })
    }

    /// The table the deployed program uses
    pub fn published() -> Self {
        Self {
            entries: PUBLISHED_TIERS.to_vec(),
        }
    }

    /// Highest level in the table (the terminal tier)
    pub fn max_level(&self) -> u8 {
        (self.entries.len() - 1) as u8
    }

    pub fn is_max_level(&self, level: u8) -> bool {
        level >= self.max_level()
    }

    pub fn entry(&self, level: u8) -> Result<&TierEntry> {
        self.entries
            .get(level as usize)
            .ok_or(Error::TierOutOfRange {
                level,
                max_level: self.max_level(),
            })
    }

    /// Stake required to upgrade into `level`
    pub fn threshold(&self, level: u8) -> Result<u64> {
        Ok(self.entry(level)?.stake_threshold)
    }

    pub fn reward_rate(&self, level: u8) -> Result<u64> {
        Ok(self.entry(level)?.reward_rate_per_second)
    }

    pub fn supply_at_level(&self, level: u8) -> Result<u64> {
        Ok(self.entry(level)?.cumulative_supply)
    }

    /// Stake a wallet at `level` needs for its next upgrade; `None` at the terminal tier
    pub fn threshold_to_next(&self, level: u8) -> Option<u64> {
        let next = level.checked_add(1)?;
        self.threshold(next).ok()
    }

    /// Reward accrued in one hour at `level`
    pub fn hourly_reward(&self, level: u8) -> Result<u64> {
        Ok(self.reward_rate(level)?.saturating_mul(3_600))
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self::published()
    }
}
