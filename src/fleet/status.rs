//! Human-readable status summary for the system and a wallet

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::ghost::MINTS_PER_LEVEL;
use crate::progression::TierTable;
use crate::state::{SystemSnapshot, WalletSnapshot};

const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// Formats snapshots into log lines
#[derive(Debug, Clone)]
pub struct StatusFormatter {
    tiers: Arc<TierTable>,
    decimals: u8,
}

impl StatusFormatter {
    pub fn new(tiers: Arc<TierTable>, decimals: u8) -> Self {
        Self { tiers, decimals }
    }

    /// Token amount in whole GHOST
    pub fn tokens(&self, amount: u64) -> String {
        format_units(amount, self.decimals)
    }

    pub fn system_lines(&self, system: &SystemSnapshot) -> Vec<String> {
        let mut lines = vec![
            format!(
                "System: {} GHOST minted over {} mints, {} users",
                self.tokens(system.total_minted),
                system.total_mint_events,
                system.unique_users
            ),
            format!(
                "System: {} GHOST staked, {} GHOST claimed",
                self.tokens(system.total_staked),
                self.tokens(system.total_claimed)
            ),
        ];

        let per_level: Vec<String> = system
            .level_users
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(level, count)| format!("L{}={}", level, count))
            .collect();
        if !per_level.is_empty() {
            lines.push(format!("System: users per level {}", per_level.join(" ")));
        }

        lines
    }

    /// Wallet summary; `sol_balance` is shown when the caller has it
    pub fn wallet_lines(
        &self,
        wallet: &WalletSnapshot,
        sol_balance: Option<u64>,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        if !wallet.initialized {
            let mut lines = vec!["Wallet: not initialized (first mint pending)".to_string()];
            if let Some(lamports) = sol_balance {
                lines.push(format!("Wallet: {}", format_sol(lamports)));
            }
            return lines;
        }

        let mut lines = vec![format!(
            "Wallet: level {}/{}, {}/{} mints used",
            wallet.level,
            self.tiers.max_level(),
            wallet.minted_at_level,
            MINTS_PER_LEVEL
        )];

        let mut balances = format!(
            "Wallet: {} GHOST held, {} staked, {} claimed",
            self.tokens(wallet.token_balance),
            self.tokens(wallet.staked_amount),
            self.tokens(wallet.claimed_amount)
        );
        if let Some(lamports) = sol_balance {
            balances.push_str(&format!(", {}", format_sol(lamports)));
        }
        lines.push(balances);

        if let Ok(hourly) = self.tiers.hourly_reward(wallet.level) {
            lines.push(format!("Wallet: earning {} GHOST/hour", self.tokens(hourly)));
        }

        match self.tiers.threshold_to_next(wallet.level) {
            Some(required) => lines.push(format!(
                "Wallet: next tier needs {} GHOST staked",
                self.tokens(required)
            )),
            None => lines.push("Wallet: max tier reached".to_string()),
        }

        let mut rewards = format!(
            "Wallet: {} GHOST claimable",
            self.tokens(wallet.unclaimed_estimate)
        );
        if let Some(next) = wallet.next_claim_time {
            rewards.push_str(&format!(
                ", next claim {} ({} GHOST)",
                describe_claim_time(next, now),
                self.tokens(wallet.next_claim_amount)
            ));
        }
        lines.push(rewards);

        lines
    }
}

/// Fixed-point base units to a decimal string, trailing zeros kept at 4 places
pub fn format_units(amount: u64, decimals: u8) -> String {
    let scale = 10u64.pow(u32::from(decimals));
    let whole = amount / scale;
    let frac = amount % scale;

    if decimals <= 4 {
        return format!("{}.{:0width$}", whole, frac, width = usize::from(decimals));
    }

    // Truncate to 4 places
    let truncated = frac / 10u64.pow(u32::from(decimals) - 4);
    format!("{}.{:04}", whole, truncated)
}

pub fn format_sol(lamports: u64) -> String {
    format!("{:.4} SOL", lamports as f64 / LAMPORTS_PER_SOL)
}

/// "2025-10-09 08:53 UTC (in 12m)" or "(ready)" once the time has passed
pub fn describe_claim_time(unix_ts: i64, now: DateTime<Utc>) -> String {
    let Some(at) = DateTime::<Utc>::from_timestamp(unix_ts, 0) else {
        return format!("at unix {}", unix_ts);
    };

    let remaining = at.signed_duration_since(now);
    let when = at.format("%Y-%m-%d %H:%M UTC");

    if remaining.num_seconds() <= 0 {
        format!("{} (ready)", when)
    } else if remaining.num_hours() > 0 {
        format!(
            "{} (in {}h{:02}m)",
            when,
            remaining.num_hours(),
            remaining.num_minutes() % 60
        )
    } else {
        format!("{} (in {}m)", when, remaining.num_minutes().max(1))
    }
}
