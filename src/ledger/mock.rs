//! In-memory ledger for tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};

use super::{LedgerClient, SimulationResult};
use crate::error::{Error, Result};
use crate::ghost::{GhostClaimEvent, GhostProgram, GhostSystemState, GhostUserSummary};

/// How `confirm_transaction` fails, if it does
#[derive(Debug, Clone)]
pub enum ConfirmFailure {
    /// Landed but failed on chain, with these program logs
    Rejected(Vec<String>),
    /// Never reached the commitment level in time
    Timeout,
}

#[derive(Default)]
struct MockState {
    accounts: HashMap<Pubkey, Vec<u8>>,
    balances: HashMap<Pubkey, u64>,
    token_balances: HashMap<Pubkey, u64>,
    unreachable: HashSet<Pubkey>,
    simulations: HashMap<Pubkey, SimulationResult>,
    send_rejection: Option<Vec<String>>,
    confirm_failure: Option<ConfirmFailure>,
    confirm_calls: usize,
    sent: Vec<Transaction>,
    simulated: usize,
}

/// Ledger double with programmable accounts and failures
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<MockState>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger with the program's system state account in place
    pub fn with_system_state(program: &GhostProgram) -> Self {
        let ledger = Self::new();
        let state = GhostSystemState::new_for_test(5_000_000_000_000, 4_200, 310);
        ledger.set_account(program.system_state(), borsh::to_vec(&state).unwrap());
        ledger
    }

    pub fn set_user_summary(&self, program: &GhostProgram, summary: &GhostUserSummary) {
        self.set_account(
            program.user_summary(&summary.user),
            borsh::to_vec(summary).unwrap(),
        );
    }

    /// Make claim simulations for `event.user` emit `event`
    pub fn set_claim_event(&self, event: &GhostClaimEvent) {
        self.set_simulation(
            event.user,
            SimulationResult {
                success: true,
                error: None,
                compute_units: Some(21_000),
                logs: vec![
                    "Program log: Instruction: GhostxClaim".to_string(),
                    event.to_log_line().unwrap(),
                ],
            },
        );
    }

    pub fn set_account(&self, address: Pubkey, data: Vec<u8>) {
        self.state.lock().unwrap().accounts.insert(address, data);
    }

    pub fn set_balance(&self, address: Pubkey, lamports: u64) {
        self.state.lock().unwrap().balances.insert(address, lamports);
    }

    pub fn set_token_balance(&self, token_account: Pubkey, amount: u64) {
        self.state
            .lock()
            .unwrap()
            .token_balances
            .insert(token_account, amount);
    }

    /// Every read of this address fails as if the node were unreachable
    pub fn make_unreachable(&self, address: Pubkey) {
        self.state.lock().unwrap().unreachable.insert(address);
    }

    /// Simulation result returned for transactions paid by `fee_payer`
    pub fn set_simulation(&self, fee_payer: Pubkey, result: SimulationResult) {
        self.state
            .lock()
            .unwrap()
            .simulations
            .insert(fee_payer, result);
    }

    /// Reject every broadcast with these program logs
    pub fn reject_sends(&self, logs: Vec<String>) {
        self.state.lock().unwrap().send_rejection = Some(logs);
    }

    /// Accept broadcasts but fail every confirmation this way
    pub fn fail_confirmations(&self, failure: ConfirmFailure) {
        self.state.lock().unwrap().confirm_failure = Some(failure);
    }

    pub fn confirm_count(&self) -> usize {
        self.state.lock().unwrap().confirm_calls
    }

    pub fn sent_transactions(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn simulation_count(&self) -> usize {
        self.state.lock().unwrap().simulated
    }

    fn check_reachable(&self, address: &Pubkey) -> Result<()> {
        if self.state.lock().unwrap().unreachable.contains(address) {
            return Err(Error::Rpc(format!("connection refused reading {}", address)));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        self.check_reachable(address)?;
        Ok(self.state.lock().unwrap().accounts.get(address).cloned())
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        self.check_reachable(address)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .balances
            .get(address)
            .copied()
            .unwrap_or(0))
    }

    async fn get_token_balance(&self, token_account: &Pubkey) -> Result<Option<u64>> {
        self.check_reachable(token_account)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .token_balances
            .get(token_account)
            .copied())
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        Ok(Hash::new_unique())
    }

    async fn simulate_transaction(&self, transaction: &Transaction) -> Result<SimulationResult> {
        let fee_payer = transaction.message.account_keys[0];
        self.check_reachable(&fee_payer)?;

        let mut state = self.state.lock().unwrap();
        state.simulated += 1;
        Ok(state
            .simulations
            .get(&fee_payer)
            .cloned()
            .unwrap_or(SimulationResult {
                success: true,
                ..Default::default()
            }))
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        let mut state = self.state.lock().unwrap();
        if let Some(logs) = &state.send_rejection {
            return Err(Error::Transaction {
                message: "custom program error: 0x1770".to_string(),
                logs: logs.clone(),
            });
        }

        state.sent.push(transaction.clone());
        Ok(transaction.signatures[0])
    }

    async fn confirm_transaction(&self, signature: &Signature) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.confirm_calls += 1;

        match &state.confirm_failure {
            None => Ok(()),
            Some(ConfirmFailure::Rejected(logs)) => Err(Error::Transaction {
                message: "custom program error: 0x1771".to_string(),
                logs: logs.clone(),
            }),
            Some(ConfirmFailure::Timeout) => Err(Error::ConfirmationTimeout(signature.to_string())),
        }
    }
}
