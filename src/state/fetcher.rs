//! State fetcher
//!
//! Reads the system account, the wallet's summary account and the wallet's
//! GHOST balance concurrently, then simulates a claim to estimate accrued
//! rewards. Read-only: nothing here signs or sends.

use std::sync::Arc;

use solana_sdk::{pubkey::Pubkey, transaction::Transaction};
use tracing::{debug, warn};

use super::snapshot::{Snapshot, SystemSnapshot, WalletSnapshot};
use crate::error::{Error, Result};
use crate::ghost::{
    find_claim_event, instruction, GhostProgram, GhostSystemState, GhostUserSummary,
    MINTS_PER_LEVEL,
};
use crate::ledger::LedgerClient;
use crate::progression::TierTable;

/// Builds fresh snapshots from the ledger
pub struct StateFetcher<L: LedgerClient> {
    ledger: Arc<L>,
    program: GhostProgram,
    tiers: Arc<TierTable>,
}

impl<L: LedgerClient> StateFetcher<L> {
    pub fn new(ledger: Arc<L>, program: GhostProgram, tiers: Arc<TierTable>) -> Self {
        Self {
            ledger,
            program,
            tiers,
        }
    }

    /// Fetch a complete snapshot for one wallet
    ///
    /// A wallet without a summary account is a first-time wallet, not an
    /// error. A missing system account is.
    pub async fn fetch(&self, wallet: &Pubkey) -> Result<Snapshot> {
        let system_address = self.program.system_state();
        let summary_address = self.program.user_summary(wallet);
        let holding_address = self.program.holding_account(wallet);

        let (system_data, summary_data, token_balance) = tokio::try_join!(
            self.read_account(&system_address, "system state"),
            self.read_account(&summary_address, "user summary"),
            self.read_token_balance(&holding_address),
        )?;

        let system_data = system_data.ok_or_else(|| {
            Error::fetch(
                "system state",
                format!("account {} not found", system_address),
            )
        })?;
        let system = GhostSystemState::try_from_slice(&system_data)
            .map_err(|e| Error::fetch("system state", e))?;

        let mut snapshot = match summary_data {
            Some(data) => {
                let summary = GhostUserSummary::try_from_slice(&data)
                    .map_err(|e| Error::fetch("user summary", e))?;

                // A level outside the table means our constants are stale
                self.tiers.entry(summary.level)?;

                if summary.minted_times > MINTS_PER_LEVEL {
                    warn!(
                        "Wallet {} reports {} mints at level {}, clamping to {}",
                        wallet, summary.minted_times, summary.level, MINTS_PER_LEVEL
                    );
                }

                WalletSnapshot::from_summary(*wallet, &summary)
            }
            None => {
                debug!("No summary account for {}, treating as first mint", wallet);
                WalletSnapshot::uninitialized(*wallet)
            }
        };

        snapshot.token_balance = token_balance.unwrap_or(0);
        snapshot.holding_account_exists = token_balance.is_some();

        if snapshot.initialized {
            self.estimate_claim(&mut snapshot).await?;
        }

        Ok(Snapshot {
            system: SystemSnapshot::from(&system),
            wallet: snapshot,
        })
    }

    async fn read_account(&self, address: &Pubkey, stage: &'static str) -> Result<Option<Vec<u8>>> {
        self.ledger
            .get_account_data(address)
            .await
            .map_err(|e| Error::fetch(stage, e))
    }

    async fn read_token_balance(&self, holding_account: &Pubkey) -> Result<Option<u64>> {
        self.ledger
            .get_token_balance(holding_account)
            .await
            .map_err(|e| Error::fetch("token balance", e))
    }

    /// Simulate `ghostx_claim` and read the accrued reward from its event
    ///
    /// A program-level rejection (cooldown, nothing accrued) leaves the
    /// estimate at zero; only transport failures are errors.
    async fn estimate_claim(&self, snapshot: &mut WalletSnapshot) -> Result<()> {
        let claim = instruction::claim(&self.program, &snapshot.wallet);
        let transaction = Transaction::new_with_payer(&[claim], Some(&snapshot.wallet));

        let result = self
            .ledger
            .simulate_transaction(&transaction)
            .await
            .map_err(|e| Error::fetch("claim simulation", e))?;

        if !result.success {
            debug!(
                "Claim simulation rejected for {}: {:?}",
                snapshot.wallet, result.error
            );
            return Ok(());
        }

        match find_claim_event(&result.logs) {
            Ok(Some(event)) => {
                snapshot.unclaimed_estimate = event.amount;
                snapshot.next_claim_time = Some(event.next_claim_time);
                snapshot.next_claim_amount = event.next_claim_amount;
            }
            Ok(None) => debug!("Claim simulation for {} emitted no event", snapshot.wallet),
            Err(e) => warn!("Ignoring claim event for {}: {}", snapshot.wallet, e),
        }

        Ok(())
    }
}
