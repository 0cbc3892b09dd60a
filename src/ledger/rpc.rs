//! RPC-backed ledger client

use std::time::{Duration, Instant};

use async_trait::async_trait;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{
    RpcSendTransactionConfig, RpcSimulateTransactionConfig, RpcTransactionConfig,
};
use solana_client::rpc_request::{RpcError, RpcResponseErrorData};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, program_pack::Pack, pubkey::Pubkey,
    signature::Signature, transaction::Transaction,
};
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::UiTransactionEncoding;
use tracing::{debug, warn};

use super::{LedgerClient, SimulationResult};
use crate::config::RpcConfig;
use crate::error::{Error, Result};

/// Interval between signature status polls while confirming
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Ledger client over a Solana JSON-RPC endpoint
pub struct RpcLedger {
    client: RpcClient,
    commitment: CommitmentConfig,
    confirm_timeout: Duration,
}

impl RpcLedger {
    pub fn new(config: &RpcConfig) -> Result<Self> {
        let commitment = config.commitment_config()?;
        let client = RpcClient::new_with_timeout_and_commitment(
            config.endpoint.clone(),
            Duration::from_millis(config.timeout_ms),
            commitment,
        );

        Ok(Self {
            client,
            commitment,
            confirm_timeout: Duration::from_millis(config.confirm_timeout_ms),
        })
    }

    /// Best-effort fetch of a landed transaction's log messages
    async fn fetch_transaction_logs(&self, signature: &Signature) -> Vec<String> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };

        match self.client.get_transaction_with_config(signature, config).await {
            Ok(tx) => match tx.transaction.meta.map(|meta| meta.log_messages) {
                Some(OptionSerializer::Some(logs)) => logs,
                _ => Vec::new(),
            },
            Err(e) => {
                debug!("Could not fetch logs for {}: {}", signature, e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await?;
        Ok(response.value.map(|account| account.data))
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        self.client
            .get_balance_with_commitment(address, self.commitment)
            .await
            .map(|response| response.value)
            .map_err(|e| Error::Rpc(format!("Failed to get balance: {}", e)))
    }

    async fn get_token_balance(&self, token_account: &Pubkey) -> Result<Option<u64>> {
        let Some(data) = self.get_account_data(token_account).await? else {
            return Ok(None);
        };

        let account = spl_token::state::Account::unpack(&data).map_err(|e| {
            Error::AccountDecode(format!("Token account {}: {}", token_account, e))
        })?;
        Ok(Some(account.amount))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| Error::Rpc(format!("Failed to get blockhash: {}", e)))
    }

    async fn simulate_transaction(&self, transaction: &Transaction) -> Result<SimulationResult> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment: Some(self.commitment),
            ..Default::default()
        };

        let result = self
            .client
            .simulate_transaction_with_config(transaction, config)
            .await?;

        let success = result.value.err.is_none();
        let error = result.value.err.map(|e| e.to_string());
        let logs = result.value.logs.unwrap_or_default();
        let compute_units = result.value.units_consumed;

        if success {
            debug!("Simulation succeeded, compute units: {:?}", compute_units);
        } else {
            debug!("Simulation failed: {:?}", error);
        }

        Ok(SimulationResult {
            success,
            error,
            compute_units,
            logs,
        })
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            preflight_commitment: Some(self.commitment.commitment),
            ..Default::default()
        };

        self.client
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(rejected)
    }

    async fn confirm_transaction(&self, signature: &Signature) -> Result<()> {
        let started = Instant::now();

        loop {
            let status = self
                .client
                .get_signature_status_with_commitment(signature, self.commitment)
                .await?;

            match status {
                Some(Ok(())) => return Ok(()),
                Some(Err(e)) => {
                    let logs = self.fetch_transaction_logs(signature).await;
                    return Err(Error::Transaction {
                        message: e.to_string(),
                        logs,
                    });
                }
                None => {}
            }

            if started.elapsed() >= self.confirm_timeout {
                warn!(
                    "Transaction {} not confirmed after {}ms",
                    signature,
                    started.elapsed().as_millis()
                );
                return Err(Error::ConfirmationTimeout(signature.to_string()));
            }

            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }
}

/// Convert a send failure, keeping any program logs the node returned
fn rejected(e: ClientError) -> Error {
    let logs = match e.kind() {
        ClientErrorKind::RpcError(RpcError::RpcResponseError {
            data: RpcResponseErrorData::SendTransactionPreflightFailure(simulation),
            ..
        }) => simulation.logs.clone().unwrap_or_default(),
        _ => Vec::new(),
    };

    Error::Transaction {
        message: e.to_string(),
        logs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_without_logs() {
        let err = rejected(ClientError::from(ClientErrorKind::Custom(
            "blockhash not found".to_string(),
        )));

        match err {
            Error::Transaction { message, logs } => {
                assert!(message.contains("blockhash not found"));
                assert!(logs.is_empty());
            }
            other => panic!("Expected Transaction error, got {:?}", other),
        }
    }

    #[test]
    fn test_new_rejects_unknown_commitment() {
        let config = RpcConfig {
            commitment: "eventually".to_string(),
            ..RpcConfig::default()
        };
        assert!(RpcLedger::new(&config).is_err());
    }
}
