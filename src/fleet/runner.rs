//! Wallet cycle runner
//!
//! One pass for one wallet: fetch, log status, decide, act, report.
//! Every error is caught here and turned into a [`CycleOutcome`], so a bad
//! wallet never stops the rest of the fleet.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use solana_sdk::signature::Signature;
use tracing::{error, info, warn};

use super::status::StatusFormatter;
use crate::config::{ClaimConfig, Config};
use crate::error::{Error, Result};
use crate::execution::{ActionExecutor, ActionKind};
use crate::ghost::GhostProgram;
use crate::ledger::LedgerClient;
use crate::progression::{claim_plan, decide, Decision, TierTable, WaitReason};
use crate::state::{Snapshot, StateFetcher, WalletSnapshot};
use crate::wallet::Wallet;

/// Where in the cycle a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Fetch,
    Execute(ActionKind),
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleStage::Fetch => write!(f, "fetch"),
            CycleStage::Execute(action) => write!(f, "{}", action),
        }
    }
}

/// Result of one wallet cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Minted(Signature),
    Upgraded(Signature),
    Claimed { signature: Signature, amount: u64 },
    Waiting(WaitReason),
    InsufficientFunds { shortfall: u64 },
    InsufficientGas { balance: u64, required: u64 },
    Failed { stage: CycleStage, error: String },
}

impl CycleOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CycleOutcome::Failed { .. })
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            CycleOutcome::Minted(sig) | CycleOutcome::Upgraded(sig) => Some(sig),
            CycleOutcome::Claimed { signature, .. } => Some(signature),
            _ => None,
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::Minted(sig) => write!(f, "minted ({})", sig),
            CycleOutcome::Upgraded(sig) => write!(f, "upgraded ({})", sig),
            CycleOutcome::Claimed { signature, amount } => {
                write!(f, "claimed ~{} ({})", amount, signature)
            }
            CycleOutcome::Waiting(reason) => write!(f, "waiting: {}", reason),
            CycleOutcome::InsufficientFunds { shortfall } => {
                write!(f, "insufficient GHOST to upgrade, short {}", shortfall)
            }
            CycleOutcome::InsufficientGas { balance, required } => write!(
                f,
                "insufficient SOL, {} lamports < {} required",
                balance, required
            ),
            CycleOutcome::Failed { stage, error } => write!(f, "failed during {}: {}", stage, error),
        }
    }
}

/// What a read-only status pass learned about one wallet
#[derive(Debug, Clone)]
pub struct Inspection {
    pub snapshot: Snapshot,
    pub sol_balance: u64,
    pub decision: Decision,
}

/// Runs the fetch, decide, execute cycle for one wallet at a time
pub struct WalletCycleRunner<L: LedgerClient> {
    ledger: Arc<L>,
    fetcher: StateFetcher<L>,
    executor: ActionExecutor<L>,
    tiers: Arc<TierTable>,
    claim: ClaimConfig,
    status: StatusFormatter,
}

impl<L: LedgerClient> WalletCycleRunner<L> {
    pub fn new(
        ledger: Arc<L>,
        program: GhostProgram,
        tiers: Arc<TierTable>,
        config: &Config,
    ) -> Self {
        Self {
            fetcher: StateFetcher::new(ledger.clone(), program, tiers.clone()),
            executor: ActionExecutor::new(
                ledger.clone(),
                program,
                config.fees.clone(),
                config.gas.clone(),
            ),
            status: StatusFormatter::new(tiers.clone(), config.program.token_decimals),
            claim: config.claim.clone(),
            ledger,
            tiers,
        }
    }

    /// Run one cycle; never fails
    pub async fn run(&self, wallet: &Wallet) -> CycleOutcome {
        let prefix = wallet.short_address();
        info!("[{}] Starting cycle for wallet #{}", prefix, wallet.index + 1);

        let outcome = match self.cycle(wallet).await {
            Ok(outcome) => outcome,
            Err((stage, err)) => self.failure(&prefix, stage, err),
        };

        info!("[{}] Outcome: {}", prefix, outcome);
        outcome
    }

    /// Read-only view of a wallet: snapshot, SOL balance and next action
    pub async fn inspect(&self, wallet: &Wallet) -> Result<Inspection> {
        let pubkey = wallet.pubkey();

        let (snapshot, sol_balance) =
            tokio::try_join!(self.fetcher.fetch(&pubkey), self.ledger.get_balance(&pubkey))?;
        let decision = decide(&snapshot.wallet, &self.tiers);

        Ok(Inspection {
            snapshot,
            sol_balance,
            decision,
        })
    }

    pub fn formatter(&self) -> &StatusFormatter {
        &self.status
    }

    async fn cycle(&self, wallet: &Wallet) -> std::result::Result<CycleOutcome, (CycleStage, Error)> {
        let prefix = wallet.short_address();

        let snapshot = self
            .fetcher
            .fetch(&wallet.pubkey())
            .await
            .map_err(|e| (CycleStage::Fetch, e))?;
        self.log_status(&prefix, &snapshot);

        let decision = decide(&snapshot.wallet, &self.tiers);
        info!("[{}] Decision: {}", prefix, decision);

        match decision {
            Decision::Mint => self
                .act(wallet, ActionKind::Mint, &snapshot.wallet)
                .await
                .map(CycleOutcome::Minted),
            Decision::Upgrade { .. } => self
                .act(wallet, ActionKind::Upgrade, &snapshot.wallet)
                .await
                .map(CycleOutcome::Upgraded),
            Decision::Wait { reason } => {
                self.idle(wallet, &snapshot.wallet, CycleOutcome::Waiting(reason))
                    .await
            }
            Decision::InsufficientFunds { shortfall } => {
                self.idle(
                    wallet,
                    &snapshot.wallet,
                    CycleOutcome::InsufficientFunds { shortfall },
                )
                .await
            }
        }
    }

    async fn act(
        &self,
        wallet: &Wallet,
        action: ActionKind,
        snapshot: &WalletSnapshot,
    ) -> std::result::Result<Signature, (CycleStage, Error)> {
        self.executor
            .execute(action, snapshot, wallet.keypair())
            .await
            .map_err(|e| (CycleStage::Execute(action), e))
    }

    /// Claim accrued rewards while there is nothing else to do
    async fn idle(
        &self,
        wallet: &Wallet,
        snapshot: &WalletSnapshot,
        otherwise: CycleOutcome,
    ) -> std::result::Result<CycleOutcome, (CycleStage, Error)> {
        let Some(amount) = claim_plan(snapshot, &self.claim) else {
            return Ok(otherwise);
        };

        info!(
            "[{}] Claiming ~{} GHOST",
            wallet.short_address(),
            self.status.tokens(amount)
        );
        let signature = self.act(wallet, ActionKind::Claim, snapshot).await?;
        Ok(CycleOutcome::Claimed { signature, amount })
    }

    fn log_status(&self, prefix: &str, snapshot: &Snapshot) {
        for line in self.status.system_lines(&snapshot.system) {
            info!("[{}] {}", prefix, line);
        }
        for line in self
            .status
            .wallet_lines(&snapshot.wallet, None, Utc::now())
        {
            info!("[{}] {}", prefix, line);
        }
    }

    fn failure(&self, prefix: &str, stage: CycleStage, err: Error) -> CycleOutcome {
        if err.is_expected() {
            warn!("[{}] Skipping {}: {}", prefix, stage, err);
        } else if err.is_fatal() {
            error!(
                "[{}] {} failed with a configuration defect: {}",
                prefix, stage, err
            );
        } else {
            error!("[{}] {} failed: {}", prefix, stage, err);
        }
        for line in err.logs() {
            error!("[{}]   {}", prefix, line);
        }

        match err {
            Error::InsufficientGas { balance, required } => {
                CycleOutcome::InsufficientGas { balance, required }
            }
            err => CycleOutcome::Failed {
                stage,
                error: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ghost::{GhostClaimEvent, GhostUserSummary};
    use crate::ledger::mock::{ConfirmFailure, MockLedger};
    use solana_sdk::signature::Keypair;
    use tokio_test::assert_ok;

    fn runner(ledger: Arc<MockLedger>) -> WalletCycleRunner<MockLedger> {
        WalletCycleRunner::new(
            ledger,
            GhostProgram::default(),
            Arc::new(TierTable::published()),
            &Config::default(),
        )
    }

    fn setup() -> (Arc<MockLedger>, GhostProgram, Wallet) {
        let program = GhostProgram::default();
        let ledger = Arc::new(MockLedger::with_system_state(&program));
        let wallet = Wallet::from_keypair(0, Keypair::new());
        (ledger, program, wallet)
    }

    #[tokio::test]
    async fn test_first_time_wallet_mints() {
        let (ledger, _, wallet) = setup();
        ledger.set_balance(wallet.pubkey(), 100_000_000);

        let outcome = runner(ledger.clone()).run(&wallet).await;

        assert!(matches!(outcome, CycleOutcome::Minted(_)));
        let sent = ledger.sent_transactions();
        assert_eq!(sent.len(), 1);
        assert_eq!(outcome.signature(), Some(&sent[0].signatures[0]));
        // ATA creation + priority fee + mint
        assert_eq!(sent[0].message.instructions.len(), 3);
    }

    #[tokio::test]
    async fn test_upgrade_when_stake_covered() {
        let (ledger, program, wallet) = setup();
        let pubkey = wallet.pubkey();
        ledger.set_balance(pubkey, 100_000_000);
        ledger.set_user_summary(&program, &GhostUserSummary::new_for_test(pubkey, 2, 10, 0, 0));
        ledger.set_token_balance(program.holding_account(&pubkey), 11_000_000_000);

        let outcome = runner(ledger.clone()).run(&wallet).await;
        assert!(matches!(outcome, CycleOutcome::Upgraded(_)));
        assert_eq!(ledger.sent_transactions()[0].message.instructions.len(), 2);
    }

    #[tokio::test]
    async fn test_short_wallet_claims_instead() {
        let (ledger, program, wallet) = setup();
        let pubkey = wallet.pubkey();
        ledger.set_balance(pubkey, 100_000_000);
        ledger.set_user_summary(&program, &GhostUserSummary::new_for_test(pubkey, 2, 10, 0, 0));
        ledger.set_token_balance(program.holding_account(&pubkey), 10_300_000_000);
        ledger.set_claim_event(&GhostClaimEvent {
            user: pubkey,
            amount: 72_000_000,
            level: 2,
            next_claim_time: 1_760_003_600,
            next_claim_amount: 9_000_000,
        });

        let outcome = runner(ledger.clone()).run(&wallet).await;
        assert!(matches!(
            outcome,
            CycleOutcome::Claimed {
                amount: 72_000_000,
                ..
            }
        ));
        assert_eq!(ledger.sent_transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_short_wallet_without_rewards_reports_shortfall() {
        let (ledger, program, wallet) = setup();
        let pubkey = wallet.pubkey();
        ledger.set_user_summary(&program, &GhostUserSummary::new_for_test(pubkey, 2, 10, 0, 0));
        ledger.set_token_balance(program.holding_account(&pubkey), 10_300_000_000);

        let outcome = runner(ledger.clone()).run(&wallet).await;
        assert_eq!(
            outcome,
            CycleOutcome::InsufficientFunds {
                shortfall: 700_000_000
            }
        );
        assert!(!outcome.is_failure());
        assert!(ledger.sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_gas_is_not_a_failure() {
        let (ledger, _, wallet) = setup();
        ledger.set_balance(wallet.pubkey(), 1_000);

        let outcome = runner(ledger.clone()).run(&wallet).await;
        assert_eq!(
            outcome,
            CycleOutcome::InsufficientGas {
                balance: 1_000,
                required: 2_044_280
            }
        );
        assert!(!outcome.is_failure());
    }

    #[tokio::test]
    async fn test_fetch_error_is_caught() {
        let (ledger, program, wallet) = setup();
        ledger.make_unreachable(program.user_summary(&wallet.pubkey()));

        let outcome = runner(ledger).run(&wallet).await;
        match outcome {
            CycleOutcome::Failed { stage, error } => {
                assert_eq!(stage, CycleStage::Fetch);
                assert!(error.contains("user summary"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_transaction_is_caught() {
        let (ledger, _, wallet) = setup();
        ledger.set_balance(wallet.pubkey(), 100_000_000);
        ledger.reject_sends(vec!["Program log: Error: MintLimitReached".to_string()]);

        let outcome = runner(ledger).run(&wallet).await;
        assert!(outcome.is_failure());
        assert_eq!(
            outcome,
            CycleOutcome::Failed {
                stage: CycleStage::Execute(ActionKind::Mint),
                error: "Transaction failed: custom program error: 0x1770".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_failed_confirmation_is_caught() {
        let (ledger, _, wallet) = setup();
        ledger.set_balance(wallet.pubkey(), 100_000_000);
        ledger.fail_confirmations(ConfirmFailure::Rejected(vec![
            "Program log: Error: MintLimitReached".to_string(),
        ]));

        let outcome = runner(ledger.clone()).run(&wallet).await;
        assert_eq!(
            outcome,
            CycleOutcome::Failed {
                stage: CycleStage::Execute(ActionKind::Mint),
                error: "Transaction failed: custom program error: 0x1771".to_string(),
            }
        );
        assert_eq!(ledger.sent_transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_confirmation_timeout_is_caught_without_resend() {
        let (ledger, _, wallet) = setup();
        ledger.set_balance(wallet.pubkey(), 100_000_000);
        ledger.fail_confirmations(ConfirmFailure::Timeout);

        let outcome = runner(ledger.clone()).run(&wallet).await;
        match outcome {
            CycleOutcome::Failed { stage, error } => {
                assert_eq!(stage, CycleStage::Execute(ActionKind::Mint));
                assert!(error.contains("not confirmed before timeout"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(ledger.sent_transactions().len(), 1);
        assert_eq!(ledger.confirm_count(), 1);
    }

    #[tokio::test]
    async fn test_inspect_sends_nothing() {
        let (ledger, _, wallet) = setup();
        ledger.set_balance(wallet.pubkey(), 100_000_000);

        let inspection = assert_ok!(runner(ledger.clone()).inspect(&wallet).await);
        assert_eq!(inspection.decision, Decision::Mint);
        assert_eq!(inspection.sol_balance, 100_000_000);
        assert!(!inspection.snapshot.wallet.initialized);
        assert!(ledger.sent_transactions().is_empty());
    }
}
