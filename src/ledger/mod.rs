//! Ledger access
//!
//! Everything the cycler needs from the chain goes through [`LedgerClient`],
//! so the fetch / decide / execute pipeline can run against an in-memory
//! ledger in tests.

use async_trait::async_trait;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};

use crate::error::Result;

#[cfg(test)]
pub mod mock;
pub mod rpc;

pub use rpc::RpcLedger;

/// Outcome of a read-only transaction simulation
#[derive(Debug, Clone, Default)]
pub struct SimulationResult {
    /// Whether simulation succeeded
    pub success: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Compute units consumed
    pub compute_units: Option<u64>,
    /// Logs from simulation
    pub logs: Vec<String>,
}

/// Narrow interface over the Solana RPC
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Raw account data, `None` if the account does not exist
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;

    /// Native balance in lamports
    async fn get_balance(&self, address: &Pubkey) -> Result<u64>;

    /// SPL token amount held by a token account, `None` if the account does not exist
    async fn get_token_balance(&self, token_account: &Pubkey) -> Result<Option<u64>>;

    async fn get_latest_blockhash(&self) -> Result<Hash>;

    /// Simulate without signature verification or state changes
    async fn simulate_transaction(&self, transaction: &Transaction) -> Result<SimulationResult>;

    /// Broadcast a signed transaction
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature>;

    /// Wait for a sent transaction to land; rejected transactions carry their program logs
    async fn confirm_transaction(&self, signature: &Signature) -> Result<()>;
}
