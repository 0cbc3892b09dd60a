//! Error types for the ghost cycler

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the ghost cycler
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    // RPC errors
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Fetch failed during {stage}: {message}")]
    Fetch { stage: &'static str, message: String },

    // Ghost program errors
    #[error("Account decode failed: {0}")]
    AccountDecode(String),

    #[error("Event decode failed: {0}")]
    EventDecode(String),

    #[error("Tier {level} out of range (max level {max_level})")]
    TierOutOfRange { level: u8, max_level: u8 },

    // Transaction errors
    #[error("Transaction failed: {message}")]
    Transaction { message: String, logs: Vec<String> },

    #[error("Transaction {0} not confirmed before timeout")]
    ConfirmationTimeout(String),

    #[error("Insufficient SOL for fees: {balance} lamports available, {required} lamports required")]
    InsufficientGas { balance: u64, required: u64 },

    // Fleet errors
    #[error("No valid private keys found in wallet list")]
    WalletListEmpty,

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Build a fetch error tagged with the read that failed
    pub fn fetch(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Error::Fetch {
            stage,
            message: err.to_string(),
        }
    }

    /// Steady-state conditions that skip a wallet for this round without counting as a failure
    pub fn is_expected(&self) -> bool {
        matches!(self, Error::InsufficientGas { .. })
    }

    /// Defects in the tier table or configuration that no retry will fix
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::TierOutOfRange { .. } | Error::Config(_) | Error::InvalidKeypair(_)
        )
    }

    /// Program logs attached to a rejected transaction
    pub fn logs(&self) -> &[String] {
        match self {
            Error::Transaction { logs, .. } => logs,
            _ => &[],
        }
    }
}

// Conversion from solana_client errors
impl From<solana_client::client_error::ClientError> for Error {
    fn from(e: solana_client::client_error::ClientError) -> Self {
        Error::Rpc(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let gas = Error::InsufficientGas {
            balance: 1_000,
            required: 2_044_280,
        };
        assert!(gas.is_expected());
        assert!(!gas.is_fatal());

        let tier = Error::TierOutOfRange {
            level: 9,
            max_level: 6,
        };
        assert!(tier.is_fatal());
        assert!(!tier.is_expected());
    }

    #[test]
    fn test_transaction_logs() {
        let err = Error::Transaction {
            message: "custom program error: 0x1771".to_string(),
            logs: vec!["Program log: MintLimitReached".to_string()],
        };
        assert_eq!(err.logs().len(), 1);
        assert!(Error::WalletListEmpty.logs().is_empty());
    }

    #[test]
    fn test_fetch_error_display() {
        let err = Error::fetch("system state", "connection refused");
        assert_eq!(
            err.to_string(),
            "Fetch failed during system state: connection refused"
        );
    }
}
