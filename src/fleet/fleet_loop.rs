//! Fleet loop
//!
//! Explicit state machine over the wallet list:
//!
//! ```text
//! LoadingWallets -> ProcessingWallet(0) -> ... -> ProcessingWallet(n-1) -> InterRoundWait
//!       ^                                                                        |
//!       +------------------------------------------------------------------------+
//! ```
//!
//! Wallets run strictly one after another. The key file is re-read at the
//! start of every round.

use std::time::Duration;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use tracing::{error, info};

use super::runner::{CycleOutcome, WalletCycleRunner};
use crate::config::FleetConfig;
use crate::error::{Error, Result};
use crate::ledger::LedgerClient;
use crate::wallet::{Wallet, WalletSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetState {
    LoadingWallets,
    ProcessingWallet(usize),
    InterRoundWait,
}

/// Fixed pauses between wallets and between rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetTiming {
    pub wallet_delay: Duration,
    pub round_delay: Duration,
}

impl FleetTiming {
    pub fn immediate() -> Self {
        Self {
            wallet_delay: Duration::ZERO,
            round_delay: Duration::ZERO,
        }
    }
}

impl From<&FleetConfig> for FleetTiming {
    fn from(config: &FleetConfig) -> Self {
        Self {
            wallet_delay: config.wallet_delay(),
            round_delay: config.round_delay(),
        }
    }
}

/// Pacing seam so tests can run rounds without real waits
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Outcome of every wallet in one round, in key-file order
#[derive(Debug, Clone, Default)]
pub struct RoundReport {
    pub round: u64,
    pub outcomes: Vec<(Pubkey, CycleOutcome)>,
}

impl RoundReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_failure()).count()
    }

    pub fn transactions(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.signature().is_some())
            .count()
    }
}

pub struct FleetLoop<L: LedgerClient, W: WalletSource, S: Sleeper = TokioSleeper> {
    runner: WalletCycleRunner<L>,
    source: W,
    timing: FleetTiming,
    sleeper: S,
    state: FleetState,
    wallets: Vec<Wallet>,
    report: RoundReport,
    round: u64,
    loaded_once: bool,
}

impl<L: LedgerClient, W: WalletSource> FleetLoop<L, W, TokioSleeper> {
    pub fn new(runner: WalletCycleRunner<L>, source: W, timing: FleetTiming) -> Self {
        Self::with_sleeper(runner, source, timing, TokioSleeper)
    }
}

impl<L: LedgerClient, W: WalletSource, S: Sleeper> FleetLoop<L, W, S> {
    pub fn with_sleeper(
        runner: WalletCycleRunner<L>,
        source: W,
        timing: FleetTiming,
        sleeper: S,
    ) -> Self {
        Self {
            runner,
            source,
            timing,
            sleeper,
            state: FleetState::LoadingWallets,
            wallets: Vec::new(),
            report: RoundReport::default(),
            round: 0,
            loaded_once: false,
        }
    }

    pub fn state(&self) -> FleetState {
        self.state
    }

    /// Perform one transition
    ///
    /// Returns the finished round's report once `InterRoundWait` completes.
    /// Fails only when the very first load finds no usable wallets.
    pub async fn step(&mut self) -> Result<Option<RoundReport>> {
        match self.state {
            FleetState::LoadingWallets => {
                self.round += 1;
                self.report = RoundReport {
                    round: self.round,
                    outcomes: Vec::new(),
                };
                self.wallets = self.source.load();

                if self.wallets.is_empty() {
                    if !self.loaded_once {
                        return Err(Error::WalletListEmpty);
                    }
                    error!(
                        "Round {}: {} ({}), retrying next round",
                        self.round,
                        Error::WalletListEmpty,
                        self.source.describe()
                    );
                    self.state = FleetState::InterRoundWait;
                    return Ok(None);
                }

                self.loaded_once = true;
                info!(
                    "Round {}: processing {} wallets from {}",
                    self.round,
                    self.wallets.len(),
                    self.source.describe()
                );
                self.state = FleetState::ProcessingWallet(0);
                Ok(None)
            }

            FleetState::ProcessingWallet(i) => {
                let Some(wallet) = self.wallets.get(i) else {
                    self.state = FleetState::InterRoundWait;
                    return Ok(None);
                };

                let outcome = self.runner.run(wallet).await;
                self.report.outcomes.push((wallet.pubkey(), outcome));

                self.sleeper.sleep(self.timing.wallet_delay).await;

                self.state = if i + 1 < self.wallets.len() {
                    FleetState::ProcessingWallet(i + 1)
                } else {
                    FleetState::InterRoundWait
                };
                Ok(None)
            }

            FleetState::InterRoundWait => {
                info!(
                    "Round {} complete: {} wallets, {} transactions, {} failures. Next round in {:?}",
                    self.round,
                    self.report.outcomes.len(),
                    self.report.transactions(),
                    self.report.failures(),
                    self.timing.round_delay
                );

                // Drop signing keys before the idle wait
                self.wallets.clear();
                self.sleeper.sleep(self.timing.round_delay).await;

                self.state = FleetState::LoadingWallets;
                Ok(Some(std::mem::take(&mut self.report)))
            }
        }
    }

    /// Drive the state machine until the current round completes
    pub async fn run_round(&mut self) -> Result<RoundReport> {
        loop {
            if let Some(report) = self.step().await? {
                return Ok(report);
            }
        }
    }

    /// Run rounds until the process is stopped
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.run_round().await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ghost::GhostProgram;
    use crate::ledger::mock::MockLedger;
    use crate::progression::TierTable;
    use crate::wallet::KeyFile;
    use solana_sdk::signature::Keypair;
    use solana_sdk::signer::Signer;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Records requested pauses instead of waiting
    #[derive(Default, Clone)]
    struct RecordingSleeper {
        pauses: Arc<Mutex<Vec<Duration>>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.pauses.lock().unwrap().push(duration);
        }
    }

    fn runner(ledger: Arc<MockLedger>) -> WalletCycleRunner<MockLedger> {
        WalletCycleRunner::new(
            ledger,
            GhostProgram::default(),
            Arc::new(TierTable::published()),
            &Config::default(),
        )
    }

    fn write_keys(file: &mut tempfile::NamedTempFile, keys: &[&Keypair]) {
        file.as_file().set_len(0).unwrap();
        let mut handle = file.reopen().unwrap();
        writeln!(handle, "# fleet").unwrap();
        for key in keys {
            writeln!(handle, "{}", key.to_base58_string()).unwrap();
        }
    }

    fn timing() -> FleetTiming {
        FleetTiming {
            wallet_delay: Duration::from_secs(5),
            round_delay: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn test_round_runs_wallets_in_file_order() {
        let program = GhostProgram::default();
        let ledger = Arc::new(MockLedger::with_system_state(&program));
        let a = Keypair::new();
        let b = Keypair::new();
        ledger.set_balance(a.pubkey(), 100_000_000);
        ledger.set_balance(b.pubkey(), 100_000_000);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write_keys(&mut file, &[&a, &b]);

        let sleeper = RecordingSleeper::default();
        let mut fleet = FleetLoop::with_sleeper(
            runner(ledger.clone()),
            KeyFile::new(file.path()),
            timing(),
            sleeper.clone(),
        );

        let report = fleet.run_round().await.unwrap();

        assert_eq!(report.round, 1);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].0, a.pubkey());
        assert_eq!(report.outcomes[1].0, b.pubkey());
        assert_eq!(report.transactions(), 2);

        let sent = ledger.sent_transactions();
        assert_eq!(sent[0].message.account_keys[0], a.pubkey());
        assert_eq!(sent[1].message.account_keys[0], b.pubkey());

        assert_eq!(
            *sleeper.pauses.lock().unwrap(),
            vec![
                Duration::from_secs(5),
                Duration::from_secs(5),
                Duration::from_secs(30)
            ]
        );
        assert_eq!(fleet.state(), FleetState::LoadingWallets);
    }

    #[tokio::test]
    async fn test_failing_wallet_does_not_stop_the_next() {
        let program = GhostProgram::default();
        let ledger = Arc::new(MockLedger::with_system_state(&program));
        let a = Keypair::new();
        let b = Keypair::new();
        ledger.make_unreachable(program.user_summary(&a.pubkey()));
        ledger.set_balance(b.pubkey(), 100_000_000);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write_keys(&mut file, &[&a, &b]);

        let mut fleet = FleetLoop::with_sleeper(
            runner(ledger.clone()),
            KeyFile::new(file.path()),
            FleetTiming::immediate(),
            RecordingSleeper::default(),
        );

        let report = fleet.run_round().await.unwrap();
        assert!(report.outcomes[0].1.is_failure());
        assert!(matches!(report.outcomes[1].1, CycleOutcome::Minted(_)));
        assert_eq!(report.failures(), 1);
        assert_eq!(ledger.sent_transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_step_transitions() {
        let program = GhostProgram::default();
        let ledger = Arc::new(MockLedger::with_system_state(&program));
        let a = Keypair::new();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write_keys(&mut file, &[&a]);

        let mut fleet = FleetLoop::with_sleeper(
            runner(ledger),
            KeyFile::new(file.path()),
            FleetTiming::immediate(),
            RecordingSleeper::default(),
        );

        assert_eq!(fleet.state(), FleetState::LoadingWallets);
        assert!(fleet.step().await.unwrap().is_none());
        assert_eq!(fleet.state(), FleetState::ProcessingWallet(0));
        assert!(fleet.step().await.unwrap().is_none());
        assert_eq!(fleet.state(), FleetState::InterRoundWait);
        assert!(fleet.step().await.unwrap().is_some());
        assert_eq!(fleet.state(), FleetState::LoadingWallets);
    }

    #[tokio::test]
    async fn test_empty_list_on_first_load_is_fatal() {
        let ledger = Arc::new(MockLedger::new());
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write_keys(&mut file, &[]);

        let mut fleet = FleetLoop::with_sleeper(
            runner(ledger),
            KeyFile::new(file.path()),
            FleetTiming::immediate(),
            RecordingSleeper::default(),
        );

        let err = fleet.run_round().await.unwrap_err();
        assert!(matches!(err, Error::WalletListEmpty));
    }

    #[tokio::test]
    async fn test_emptied_list_retries_next_round() {
        let program = GhostProgram::default();
        let ledger = Arc::new(MockLedger::with_system_state(&program));
        let a = Keypair::new();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write_keys(&mut file, &[&a]);

        let sleeper = RecordingSleeper::default();
        let mut fleet = FleetLoop::with_sleeper(
            runner(ledger),
            KeyFile::new(file.path()),
            timing(),
            sleeper.clone(),
        );
        fleet.run_round().await.unwrap();

        // Hot-edit: every key removed between rounds
        write_keys(&mut file, &[]);
        let report = fleet.run_round().await.unwrap();
        assert_eq!(report.round, 2);
        assert!(report.outcomes.is_empty());

        // Keys restored: the loop picks them up again
        write_keys(&mut file, &[&a]);
        let report = fleet.run_round().await.unwrap();
        assert_eq!(report.round, 3);
        assert_eq!(report.outcomes.len(), 1);

        let pauses = sleeper.pauses.lock().unwrap();
        assert_eq!(
            pauses.iter().filter(|d| **d == Duration::from_secs(30)).count(),
            3
        );
    }
}
