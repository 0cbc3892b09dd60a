//! Action executor
//!
//! Turns a decision into instructions, checks the wallet can pay for them,
//! then signs, sends and confirms.

use std::fmt;
use std::sync::Arc;

use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};
use tracing::{debug, info};

use crate::config::{FeeConfig, GasConfig};
use crate::error::{Error, Result};
use crate::ghost::{instruction, GhostProgram};
use crate::ledger::LedgerClient;
use crate::state::WalletSnapshot;

/// On-chain action the executor can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Mint,
    Upgrade,
    Claim,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Mint => write!(f, "mint"),
            ActionKind::Upgrade => write!(f, "upgrade"),
            ActionKind::Claim => write!(f, "claim"),
        }
    }
}

/// Ordered instructions for one transaction
#[derive(Debug, Clone)]
pub struct InstructionSet {
    pub action: ActionKind,
    pub instructions: Vec<Instruction>,
}

impl InstructionSet {
    /// Whether the set opens the wallet's GHOST token account first
    pub fn creates_holding_account(&self) -> bool {
        self.instructions
            .iter()
            .any(|ix| ix.program_id == spl_associated_token_account::ID)
    }
}

/// Builds and submits Ghost transactions for one wallet at a time
pub struct ActionExecutor<L: LedgerClient> {
    ledger: Arc<L>,
    program: GhostProgram,
    fees: FeeConfig,
    gas: GasConfig,
}

impl<L: LedgerClient> ActionExecutor<L> {
    pub fn new(ledger: Arc<L>, program: GhostProgram, fees: FeeConfig, gas: GasConfig) -> Self {
        Self {
            ledger,
            program,
            fees,
            gas,
        }
    }

    /// Mint, creating the GHOST token account first if it does not exist yet
    pub fn build_mint(&self, snapshot: &WalletSnapshot) -> InstructionSet {
        let wallet = &snapshot.wallet;
        let mut instructions = Vec::with_capacity(3);

        if !snapshot.holding_account_exists {
            instructions.push(
                spl_associated_token_account::instruction::create_associated_token_account(
                    wallet,
                    wallet,
                    &self.program.mint,
                    &spl_token::ID,
                ),
            );
        }

        instructions.push(self.priority_fee());
        instructions.push(instruction::mint(&self.program, wallet));

        InstructionSet {
            action: ActionKind::Mint,
            instructions,
        }
    }

    /// Upgrade; the token account exists since the wallet minted to get here
    pub fn build_upgrade(&self, snapshot: &WalletSnapshot) -> InstructionSet {
        InstructionSet {
            action: ActionKind::Upgrade,
            instructions: vec![
                self.priority_fee(),
                instruction::upgrade(&self.program, &snapshot.wallet),
            ],
        }
    }

    pub fn build_claim(&self, snapshot: &WalletSnapshot) -> InstructionSet {
        InstructionSet {
            action: ActionKind::Claim,
            instructions: vec![
                self.priority_fee(),
                instruction::claim(&self.program, &snapshot.wallet),
            ],
        }
    }

    pub fn build(&self, action: ActionKind, snapshot: &WalletSnapshot) -> InstructionSet {
        match action {
            ActionKind::Mint => self.build_mint(snapshot),
            ActionKind::Upgrade => self.build_upgrade(snapshot),
            ActionKind::Claim => self.build_claim(snapshot),
        }
    }

    fn priority_fee(&self) -> Instruction {
        ComputeBudgetInstruction::set_compute_unit_price(self.fees.priority_fee_micro_lamports)
    }

    /// Lamports a wallet must hold before attempting `action`
    ///
    /// Mint budgets token account rent on top of the fee, whether or not the
    /// account already exists.
    pub fn required_lamports(&self, action: ActionKind) -> u64 {
        match action {
            ActionKind::Mint => self
                .gas
                .account_rent_lamports
                .saturating_add(self.gas.estimated_fee_lamports),
            ActionKind::Upgrade | ActionKind::Claim => self.gas.estimated_fee_lamports,
        }
    }

    /// Fail with `InsufficientGas` if the wallet cannot pay for `action`
    pub async fn check_gas(&self, wallet: &Pubkey, action: ActionKind) -> Result<u64> {
        let balance = self.ledger.get_balance(wallet).await?;
        let required = self.required_lamports(action);

        if balance < required {
            return Err(Error::InsufficientGas { balance, required });
        }

        debug!(
            "Gas check passed for {}: {} lamports >= {} required",
            wallet, balance, required
        );
        Ok(balance)
    }

    /// Sign with a fresh blockhash, broadcast and wait for confirmation
    ///
    /// Not retried here; the next round re-decides from fresh state.
    pub async fn submit(&self, set: &InstructionSet, signer: &Keypair) -> Result<Signature> {
        let blockhash = self.ledger.get_latest_blockhash().await?;

        let transaction = Transaction::new_signed_with_payer(
            &set.instructions,
            Some(&signer.pubkey()),
            &[signer],
            blockhash,
        );

        let signature = self.ledger.send_transaction(&transaction).await?;
        info!("{} transaction submitted: {}", set.action, signature);

        self.ledger.confirm_transaction(&signature).await?;
        info!("{} transaction confirmed: {}", set.action, signature);

        Ok(signature)
    }

    /// Gas check, build and submit in one step
    pub async fn execute(
        &self,
        action: ActionKind,
        snapshot: &WalletSnapshot,
        signer: &Keypair,
    ) -> Result<Signature> {
        if snapshot.wallet != signer.pubkey() {
            return Err(Error::Internal(format!(
                "Snapshot for {} cannot be signed by {}",
                snapshot.wallet,
                signer.pubkey()
            )));
        }

        self.check_gas(&snapshot.wallet, action).await?;
        let set = self.build(action, snapshot);
        self.submit(&set, signer).await
    }
}
